//! Standard BIP-341 script-path spend.
//!
//! Only witnesses whose pre-script elements are all Schnorr signatures are typed as this
//! variant. Tapscript witnesses carrying other stack items, such as empty CHECKSIGADD
//! placeholders or hash-lock preimages, stay [`RawInput`] and are re-serialized byte for byte.

use alloc::vec::Vec;

use k256::schnorr::SigningKey;

use super::taproot_key::check_standard;
use super::{create_input_signature, script_path_parts, MatchOutcome, RawInput, TaprootInput};
use crate::consensus::{OutPoint, TxOut};
use crate::error::TxError;
use crate::sighash_type::SigHashType;
use crate::signature::SchnorrInputSignature;
use crate::taproot::{ControlBlock, TapLeaf};
use crate::transaction::Transaction;

/// Script-path input whose signatures commit to the spent outputs and the leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaprootScriptInput {
    prev_out: OutPoint,
    sequence: u32,
    leaf: TapLeaf,
    control_block: Vec<u8>,
    signatures: Vec<SchnorrInputSignature>,
}

impl TaprootScriptInput {
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

impl TaprootInput for TaprootScriptInput {
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

    /// Every element before the leaf script must be a standard signature. A witness with any
    /// ANYPREVOUT signature belongs to another variant.
    fn match_raw(raw: &RawInput) -> MatchOutcome<Self> {
        let Some((candidates, script, control_block)) = script_path_parts(raw) else {
            return MatchOutcome::NotThisVariant;
        };
        let mut signatures = Vec::with_capacity(candidates.len());
        for element in candidates {
            let signature = match SchnorrInputSignature::from_bytes(element) {
                Ok(sig) => sig,
                Err(e) => return MatchOutcome::Malformed(e),
            };
            if check_standard(signature.hash_type()).is_err() {
                tracing::trace!(
                    hash_type = %signature.hash_type(),
                    "taproot script: ANYPREVOUT signature present"
                );
                return MatchOutcome::NotThisVariant;
            }
            signatures.push(signature);
        }
        MatchOutcome::Matched(Self {
            prev_out: *raw.prev_out(),
            sequence: raw.sequence(),
            leaf: TapLeaf::new(script.to_vec()),
            control_block: control_block.to_vec(),
            signatures,
        })
    }

    /// Appends a signature over the full prevouts and this leaf.
    fn sign(
        &self,
        tx: &Transaction,
        input_index: usize,
        key: &SigningKey,
        prevouts: &[TxOut],
        hash_type: SigHashType,
    ) -> Result<Self, TxError> {
        check_standard(hash_type)?;
        let signature = create_input_signature(
            tx,
            input_index,
            key,
            prevouts,
            hash_type,
            Some(self.leaf.hash()),
        )?;
        let mut signed = self.clone();
        signed.signatures.push(signature);
        Ok(signed)
    }

    fn add_signature(&self, signature: SchnorrInputSignature) -> Result<Self, TxError> {
        check_standard(signature.hash_type())?;
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

    fn outpoint() -> OutPoint {
        OutPoint {
            txid: Txid::from_byte_array([7u8; 32]),
            vout: 2,
        }
    }

    fn control_block() -> Vec<u8> {
        let mut cb = vec![0xc0u8];
        cb.extend_from_slice(&[0x02u8; 32]);
        cb.extend_from_slice(&[0x44u8; 32]);
        cb
    }

    fn raw(witness: Vec<Vec<u8>>) -> RawInput {
        RawInput::new(outpoint(), 0, Vec::new(), witness)
    }

    #[test]
    fn unsigned_and_signed_witnesses_match() {
        let unsigned = TaprootScriptInput::match_raw(&raw(vec![vec![0x51], control_block()]))
            .matched()
            .expect("unsigned script spend");
        assert!(!unsigned.complete());
        assert_eq!(unsigned.leaf().script(), &[0x51]);

        let sig = SchnorrInputSignature::new([1u8; 64], SigHashType::default_type());
        let signed = TaprootScriptInput::match_raw(&raw(vec![
            sig.to_bytes(),
            sig.to_bytes(),
            vec![0x51],
            control_block(),
        ]))
        .matched()
        .expect("two-signature script spend");
        assert_eq!(signed.signatures().len(), 2);
        assert!(signed.complete());
        assert_eq!(signed.witness().len(), 4);
    }

    #[test]
    fn anyprevout_signature_defers_to_other_variant() {
        let apoas =
            SchnorrInputSignature::new([1u8; 64], SigHashType::from_value(0xc1).expect("0xc1"));
        let plain = SchnorrInputSignature::new([1u8; 64], SigHashType::all());
        assert_eq!(
            TaprootScriptInput::match_raw(&raw(vec![
                plain.to_bytes(),
                apoas.to_bytes(),
                vec![0x51],
                control_block()
            ])),
            MatchOutcome::NotThisVariant
        );
    }

    #[test]
    fn unparseable_signature_is_malformed() {
        assert_eq!(
            TaprootScriptInput::match_raw(&raw(vec![vec![0u8; 10], vec![0x51], control_block()])),
            MatchOutcome::Malformed(TxError::InvalidSignatureLength(10))
        );
    }

    #[test]
    fn constructor_validates_control_block() {
        let leaf = TapLeaf::new(vec![0x51]);
        assert_eq!(
            TaprootScriptInput::new(outpoint(), 0, leaf.clone(), vec![0xc0; 40]),
            Err(TxError::InvalidControlBlock(40))
        );
        let input = TaprootScriptInput::new(outpoint(), 0, leaf, control_block()).expect("valid");
        assert_eq!(
            input.add_signature(SchnorrInputSignature::new(
                [1u8; 64],
                SigHashType::from_value(0x41).expect("0x41")
            )),
            Err(TxError::ForbiddenSigHashFlag(0x41))
        );
    }
}
