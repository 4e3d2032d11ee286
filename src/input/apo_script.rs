//! Script-path spend signed with SIGHASH_ANYPREVOUTANYSCRIPT.
//!
//! Signatures commit to neither the outpoint, the spent amount and script, nor the leaf. Such a
//! signature can be rebound to any output whose script tree holds a compatible leaf.

use alloc::vec::Vec;

use k256::schnorr::SigningKey;

use super::{create_input_signature, script_path_parts, MatchOutcome, RawInput, TaprootInput};
use crate::consensus::{OutPoint, TxOut};
use crate::error::TxError;
use crate::sighash_type::{SigHashType, SIGHASH_ANYPREVOUTANYSCRIPT};
use crate::signature::SchnorrInputSignature;
use crate::taproot::{ControlBlock, TapLeaf};
use crate::transaction::Transaction;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApoScriptInput {
    prev_out: OutPoint,
    sequence: u32,
    leaf: TapLeaf,
    control_block: Vec<u8>,
    signatures: Vec<SchnorrInputSignature>,
}

fn check_flag(signature: &SchnorrInputSignature) -> Result<(), TxError> {
    if signature.hash_type().any_prev_out_any_script() {
        Ok(())
    } else {
        Err(TxError::MissingSigHashFlag {
            required: SIGHASH_ANYPREVOUTANYSCRIPT,
            found: signature.hash_type().value(),
        })
    }
}

impl ApoScriptInput {
    /// Unsigned input spending `leaf`. The control block must be structurally valid.
    pub fn new(
        prev_out: OutPoint,
        sequence: u32,
        leaf: TapLeaf,
        control_block: Vec<u8>,
    ) -> Result<Self, TxError> {
        ControlBlock::from_slice(&control_block)?;
        Ok(Self {
            prev_out,
            sequence,
            leaf,
            control_block,
            signatures: Vec::new(),
        })
    }

    pub fn leaf(&self) -> &TapLeaf {
        &self.leaf
    }

    pub fn control_block(&self) -> &[u8] {
        &self.control_block
    }

    pub fn signatures(&self) -> &[SchnorrInputSignature] {
        &self.signatures
    }
}

impl TaprootInput for ApoScriptInput {
    fn prev_out(&self) -> &OutPoint {
        &self.prev_out
    }

    fn sequence(&self) -> u32 {
        self.sequence
    }

    fn witness(&self) -> Vec<Vec<u8>> {
        let mut witness: Vec<Vec<u8>> = self.signatures.iter().map(|s| s.to_bytes()).collect();
        witness.push(self.leaf.script().to_vec());
        witness.push(self.control_block.clone());
        witness
    }

    fn complete(&self) -> bool {
        !self.signatures.is_empty()
    }

    /// Signatures without ANYPREVOUTANYSCRIPT are dropped. An element that does not parse as a
    /// signature fails the whole match.
    fn match_raw(raw: &RawInput) -> MatchOutcome<Self> {
        let Some((candidates, script, control_block)) = script_path_parts(raw) else {
            return MatchOutcome::NotThisVariant;
        };
        let mut signatures = Vec::with_capacity(candidates.len());
        for element in candidates {
            match SchnorrInputSignature::from_bytes(element) {
                Ok(sig) if sig.hash_type().any_prev_out_any_script() => signatures.push(sig),
                Ok(sig) => {
                    tracing::trace!(hash_type = %sig.hash_type(), "apo script: dropping signature");
                }
                Err(e) => return MatchOutcome::Malformed(e),
            }
        }
        MatchOutcome::Matched(Self {
            prev_out: *raw.prev_out(),
            sequence: raw.sequence(),
            leaf: TapLeaf::new(script.to_vec()),
            control_block: control_block.to_vec(),
            signatures,
        })
    }

    /// Forces ANYPREVOUTANYSCRIPT onto `hash_type` and appends the signature. The digest reads
    /// no previous outputs, so `prevouts` is ignored.
    fn sign(
        &self,
        tx: &Transaction,
        input_index: usize,
        key: &SigningKey,
        _prevouts: &[TxOut],
        hash_type: SigHashType,
    ) -> Result<Self, TxError> {
        let hash_type = hash_type.with_any_prev_out_any_script()?;
        let signature =
            create_input_signature(tx, input_index, key, &[], hash_type, Some(self.leaf.hash()))?;
        let mut signed = self.clone();
        signed.signatures.push(signature);
        Ok(signed)
    }

    /// Appends, keeping existing signatures.
    fn add_signature(&self, signature: SchnorrInputSignature) -> Result<Self, TxError> {
        check_flag(&signature)?;
        let mut signed = self.clone();
        signed.signatures.push(signature);
        Ok(signed)
    }

    fn filter_signatures<F: Fn(&SchnorrInputSignature) -> bool>(&self, keep: F) -> Self {
        Self {
            signatures: self.signatures.iter().filter(|s| keep(*s)).copied().collect(),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use bitcoin::hashes::Hash;

    use super::*;
    use crate::consensus::Txid;
    use crate::taproot::TAPROOT_CONTROL_MAX_NODE_COUNT;

    fn outpoint() -> OutPoint {
        OutPoint {
            txid: Txid::from_byte_array([8u8; 32]),
            vout: 0,
        }
    }

    fn control_block(first: u8, nodes: usize) -> Vec<u8> {
        let mut cb = vec![first];
        cb.extend_from_slice(&[0x02u8; 32]);
        cb.extend(core::iter::repeat(0x55u8).take(32 * nodes));
        cb
    }

    fn raw(witness: Vec<Vec<u8>>) -> RawInput {
        RawInput::new(outpoint(), 0, Vec::new(), witness)
    }

    fn sig(value: u8) -> SchnorrInputSignature {
        SchnorrInputSignature::new([2u8; 64], SigHashType::from_value(value).expect("whitelisted"))
    }

    #[test]
    fn control_block_shape_rejections() {
        let mut short = control_block(0xc0, 0);
        short.pop();
        let mut ragged = control_block(0xc0, 1);
        ragged.push(0);
        let cases = [
            short,
            ragged,
            control_block(0xc0, TAPROOT_CONTROL_MAX_NODE_COUNT + 1),
            control_block(0xc4, 1),
        ];
        for (i, cb) in cases.into_iter().enumerate() {
            assert_eq!(
                ApoScriptInput::match_raw(&raw(vec![sig(0xc1).to_bytes(), vec![0x51], cb])),
                MatchOutcome::NotThisVariant,
                "case {}",
                i
            );
        }
        for cb in [control_block(0xc1, 0), control_block(0xc0, TAPROOT_CONTROL_MAX_NODE_COUNT)] {
            assert!(
                ApoScriptInput::match_raw(&raw(vec![vec![0x51], cb])).is_matched(),
                "parity bit and maximum depth are accepted"
            );
        }
    }

    #[test]
    fn script_sig_or_short_witness_is_no_match() {
        let with_script_sig = RawInput::new(
            outpoint(),
            0,
            vec![0x00],
            vec![vec![0x51], control_block(0xc0, 0)],
        );
        assert_eq!(
            ApoScriptInput::match_raw(&with_script_sig),
            MatchOutcome::NotThisVariant
        );
        assert_eq!(
            ApoScriptInput::match_raw(&raw(vec![control_block(0xc0, 0)])),
            MatchOutcome::NotThisVariant
        );
    }

    #[test]
    fn wrong_flag_signatures_are_dropped() {
        let input = ApoScriptInput::match_raw(&raw(vec![
            sig(0xc1).to_bytes(),
            sig(0x41).to_bytes(),
            SchnorrInputSignature::new([2u8; 64], SigHashType::default_type()).to_bytes(),
            sig(0xc3).to_bytes(),
            vec![0x51],
            control_block(0xc0, 1),
        ]))
        .matched()
        .expect("match with dropped signatures");
        let kept: Vec<u8> = input.signatures().iter().map(|s| s.hash_type().value()).collect();
        assert_eq!(kept, vec![0xc1, 0xc3]);
    }

    #[test]
    fn unparseable_signature_aborts_match() {
        let mut bad_byte = sig(0xc1).to_bytes();
        bad_byte[64] = 0x44;
        assert_eq!(
            ApoScriptInput::match_raw(&raw(vec![
                sig(0xc1).to_bytes(),
                bad_byte,
                vec![0x51],
                control_block(0xc0, 0),
            ])),
            MatchOutcome::Malformed(TxError::InvalidSignatureHashByte(0x44))
        );
    }

    #[test]
    fn add_and_filter_signatures() {
        let leaf = TapLeaf::new(vec![0x51]);
        let input = ApoScriptInput::new(outpoint(), 0, leaf, control_block(0xc0, 0))
            .expect("valid control block");
        assert_eq!(
            input.add_signature(sig(0x41)),
            Err(TxError::MissingSigHashFlag {
                required: 0xc0,
                found: 0x41
            })
        );
        let two = input
            .add_signature(sig(0xc1))
            .and_then(|i| i.add_signature(sig(0xc2)))
            .expect("APOAS signatures");
        assert_eq!(two.signatures().len(), 2);

        let keep_all_mode = |s: &SchnorrInputSignature| s.hash_type().is_all();
        let once = two.filter_signatures(keep_all_mode);
        let twice = once.filter_signatures(keep_all_mode);
        assert_eq!(once, twice);
        assert_eq!(once.signatures().len(), 1);
        assert_eq!(once.leaf(), two.leaf());
        assert_eq!(once.control_block(), two.control_block());
    }
}
