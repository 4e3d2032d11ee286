//! Witness dispatch: which variant a raw input is re-typed as, and when matching gives up.

mod common;

use tapsign::input::TaprootInput;
use tapsign::{
    ApoKeyInput, ApoLeafScriptInput, ApoScriptInput, Input, MatchOutcome, RawInput,
    SchnorrInputSignature, SigHashType, Transaction, TxError,
};

use common::{control_block, hash_type, outpoint, spending_tx, SEQUENCE};

const LEAF_SCRIPT: [u8; 1] = [0x51];

fn sig(value: u8) -> Vec<u8> {
    SchnorrInputSignature::new([0x5au8; 64], hash_type(value)).to_bytes()
}

fn raw(witness: Vec<Vec<u8>>) -> RawInput {
    RawInput::new(outpoint(0x11, 0), SEQUENCE, Vec::new(), witness)
}

fn script_witness(signatures: Vec<Vec<u8>>) -> Vec<Vec<u8>> {
    let mut witness = signatures;
    witness.push(LEAF_SCRIPT.to_vec());
    witness.push(control_block(0xc0, 1));
    witness
}

#[test]
fn dispatch_order() {
    let cases: Vec<(Vec<Vec<u8>>, &str)> = vec![
        (vec![sig(0x41)], "apo-key"),
        (vec![sig(0x43)], "apo-key"),
        (vec![sig(0x01)], "taproot-key"),
        (vec![sig(0x00)], "taproot-key"),
        (vec![sig(0x82)], "taproot-key"),
        (vec![sig(0xc1)], "raw"),
        (vec![vec![0u8; 32]], "raw"),
        (vec![], "raw"),
        (script_witness(vec![]), "taproot-script"),
        (script_witness(vec![sig(0x00), sig(0x83)]), "taproot-script"),
        (script_witness(vec![sig(0xc1)]), "apo-script"),
        (script_witness(vec![sig(0x01), sig(0xc2)]), "apo-script"),
        (script_witness(vec![sig(0x41)]), "apo-leaf-script"),
        (script_witness(vec![sig(0x42), sig(0x43)]), "apo-leaf-script"),
        (script_witness(vec![sig(0x41), sig(0xc1)]), "apo-script"),
        (script_witness(vec![vec![0u8; 70]]), "raw"),
        (vec![LEAF_SCRIPT.to_vec(), vec![0xc0; 34]], "raw"),
    ];
    for (i, (witness, expected)) in cases.into_iter().enumerate() {
        let input = Input::match_raw(raw(witness));
        assert_eq!(input.kind(), expected, "case {}", i);
    }
}

#[test]
fn script_sig_always_falls_back_to_raw() {
    for witness in [vec![sig(0x41)], vec![sig(0x01)], script_witness(vec![sig(0xc1)])] {
        let raw = RawInput::new(outpoint(0x11, 0), SEQUENCE, vec![0x00], witness);
        let input = Input::match_raw(raw.clone());
        assert_eq!(input, Input::Raw(raw));
        assert_eq!(input.script_sig(), &[0x00]);
    }
}

#[test]
fn apo_key_match_exposes_signature() {
    let input = ApoKeyInput::match_raw(&raw(vec![sig(0x41)]))
        .matched()
        .expect("APO key spend");
    assert!(input.complete());
    assert_eq!(
        input.signature().map(|s| s.to_bytes()),
        Some(sig(0x41)),
        "parsed signature keeps its encoding"
    );
    assert_eq!(input.prev_out(), &outpoint(0x11, 0));
    assert_eq!(input.sequence(), SEQUENCE);
}

#[test]
fn apo_key_match_rejections() {
    let with_script_sig = RawInput::new(outpoint(0x11, 0), SEQUENCE, vec![0x51], vec![sig(0x41)]);
    for (i, case) in [
        with_script_sig,
        raw(vec![]),
        raw(vec![sig(0x41), sig(0x41)]),
        raw(vec![vec![0u8; 66]]),
        raw(vec![sig(0x01)]),
    ]
    .iter()
    .enumerate()
    {
        assert_eq!(
            ApoKeyInput::match_raw(case),
            MatchOutcome::NotThisVariant,
            "case {}",
            i
        );
    }
}

#[test]
fn apo_script_drop_versus_abort() {
    let dropped = ApoScriptInput::match_raw(&raw(script_witness(vec![
        sig(0xc3),
        sig(0x01),
        sig(0x41),
    ])))
    .matched()
    .expect("well-formed signatures never abort");
    assert_eq!(dropped.signatures().len(), 1);
    assert_eq!(dropped.signatures()[0].hash_type().value(), 0xc3);

    let aborted = ApoScriptInput::match_raw(&raw(script_witness(vec![sig(0xc3), vec![1u8; 63]])));
    assert_eq!(
        aborted,
        MatchOutcome::Malformed(TxError::InvalidSignatureLength(63))
    );

    let mut explicit_default = sig(0xc1);
    explicit_default[64] = 0x00;
    assert_eq!(
        ApoScriptInput::match_raw(&raw(script_witness(vec![explicit_default]))),
        MatchOutcome::Malformed(TxError::InvalidSignatureHashByte(0x00))
    );
}

#[test]
fn filter_is_idempotent_on_script_inputs() {
    let input = Input::match_raw(raw(script_witness(vec![sig(0xc1), sig(0xc2), sig(0xc3)])));
    let keep = |s: &SchnorrInputSignature| !s.hash_type().is_none();
    let once = input.filter_signatures(keep);
    let twice = once.filter_signatures(keep);
    assert_eq!(once, twice);
    assert_eq!(once.witness().len(), 2 + 2);
    assert_eq!(once.witness()[2], LEAF_SCRIPT.to_vec());
}

#[test]
fn decoded_transaction_retypes_inputs() {
    let apo_key = ApoKeyInput::match_raw(&raw(vec![sig(0x41)]))
        .matched()
        .expect("APO key spend");
    let apo_script = ApoScriptInput::match_raw(&raw(script_witness(vec![sig(0xc1)])))
        .matched()
        .expect("APOAS script spend");
    let unknown = RawInput::new(outpoint(0x33, 2), 7, vec![0x00, 0x14], Vec::new());
    let tx = spending_tx(vec![
        Input::from(apo_key),
        Input::from(apo_script),
        Input::from(unknown),
    ]);

    let decoded = Transaction::from_bytes(&tx.to_bytes()).expect("decode");
    let kinds: Vec<&str> = decoded.inputs.iter().map(Input::kind).collect();
    assert_eq!(kinds, vec!["apo-key", "apo-script", "raw"]);
    assert_eq!(decoded.to_bytes(), tx.to_bytes());
    assert_eq!(decoded.inputs[2].script_sig(), &[0x00, 0x14]);
}

#[test]
fn anyprevout_script_witness_survives_reserialization() {
    let witness = script_witness(vec![sig(0x41)]);
    let tx = spending_tx(vec![Input::from(raw(witness.clone()))]);
    let bytes = tx.to_bytes();

    let decoded = Transaction::from_bytes(&bytes).expect("decode");
    assert_eq!(decoded.inputs[0].kind(), "apo-leaf-script");
    assert_eq!(decoded.inputs[0].witness(), witness);
    assert!(decoded.complete());
    assert_eq!(decoded.to_bytes(), bytes);

    let typed = ApoLeafScriptInput::match_raw(&raw(witness))
        .matched()
        .expect("ANYPREVOUT script spend");
    assert_eq!(typed.signatures().len(), 1);
    assert_eq!(typed.leaf().script(), &LEAF_SCRIPT);
}

#[test]
fn tapscript_stack_items_stay_raw() {
    // 2-of-2 CHECKSIGADD with one empty placeholder, and a hash-lock preimage.
    let multisig = vec![
        Vec::new(),
        sig(0x01),
        LEAF_SCRIPT.to_vec(),
        control_block(0xc0, 1),
    ];
    let preimage = vec![vec![0x42u8; 32], LEAF_SCRIPT.to_vec(), control_block(0xc0, 1)];
    for witness in [multisig, preimage] {
        let tx = spending_tx(vec![Input::from(raw(witness.clone()))]);
        let decoded = Transaction::from_bytes(&tx.to_bytes()).expect("decode");
        assert_eq!(decoded.inputs[0].kind(), "raw");
        assert_eq!(decoded.inputs[0].witness(), witness);
        assert_eq!(decoded.to_bytes(), tx.to_bytes());
    }
}

#[test]
fn apo_key_reports_apoas_as_wrong_field() {
    let input = ApoKeyInput::new(outpoint(0x11, 0), SEQUENCE);
    let apoas = SchnorrInputSignature::new([0x5au8; 64], hash_type(0xc1));
    assert!(apoas.hash_type().any_prev_out());
    assert_eq!(
        input.add_signature(apoas),
        Err(TxError::ForbiddenSigHashFlag(0xc1))
    );
}

#[test]
fn signature_type_carries_hash_type_for_default() {
    let default = SchnorrInputSignature::from_bytes(&sig(0x00)).expect("64-byte signature");
    assert_eq!(default.hash_type(), SigHashType::default_type());
    assert_eq!(default.encoded_len(), 64);
}
