//! Standard BIP-341 key-path spend.

use alloc::vec;
use alloc::vec::Vec;

use k256::schnorr::SigningKey;

use super::{create_input_signature, key_path_element, MatchOutcome, RawInput, TaprootInput};
use crate::consensus::{OutPoint, TxOut};
use crate::error::TxError;
use crate::sighash_type::SigHashType;
use crate::signature::SchnorrInputSignature;
use crate::transaction::Transaction;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaprootKeyInput {
    prev_out: OutPoint,
    sequence: u32,
    signature: Option<SchnorrInputSignature>,
}

/// Rejects hash types with either ANYPREVOUT variant in the input-commitment field.
pub(crate) fn check_standard(hash_type: SigHashType) -> Result<(), TxError> {
    if hash_type.any_prev_out() {
        Err(TxError::ForbiddenSigHashFlag(hash_type.value()))
    } else {
        Ok(())
    }
}

impl TaprootKeyInput {
    pub fn new(prev_out: OutPoint, sequence: u32) -> Self {
        Self {
            prev_out,
            sequence,
            signature: None,
        }
    }

    pub fn signature(&self) -> Option<&SchnorrInputSignature> {
        self.signature.as_ref()
    }
}

impl TaprootInput for TaprootKeyInput {
    fn prev_out(&self) -> &OutPoint {
        &self.prev_out
    }

    fn sequence(&self) -> u32 {
        self.sequence
    }

    fn witness(&self) -> Vec<Vec<u8>> {
        match &self.signature {
            Some(sig) => vec![sig.to_bytes()],
            None => Vec::new(),
        }
    }

    fn complete(&self) -> bool {
        self.signature.is_some()
    }

    fn match_raw(raw: &RawInput) -> MatchOutcome<Self> {
        let Some(element) = key_path_element(raw) else {
            return MatchOutcome::NotThisVariant;
        };
        let signature = match SchnorrInputSignature::from_bytes(element) {
            Ok(sig) => sig,
            Err(e) => {
                tracing::trace!(error = %e, "taproot key: witness element is not a signature");
                return MatchOutcome::NotThisVariant;
            }
        };
        if let Err(e) = check_standard(signature.hash_type()) {
            tracing::trace!(error = %e, "taproot key: ANYPREVOUT signature");
            return MatchOutcome::NotThisVariant;
        }
        MatchOutcome::Matched(Self {
            prev_out: *raw.prev_out(),
            sequence: raw.sequence(),
            signature: Some(signature),
        })
    }

    /// Signs with `hash_type` as given; DEFAULT yields a 64-byte signature.
    fn sign(
        &self,
        tx: &Transaction,
        input_index: usize,
        key: &SigningKey,
        prevouts: &[TxOut],
        hash_type: SigHashType,
    ) -> Result<Self, TxError> {
        check_standard(hash_type)?;
        let signature = create_input_signature(tx, input_index, key, prevouts, hash_type, None)?;
        Ok(Self {
            signature: Some(signature),
            ..self.clone()
        })
    }

    fn add_signature(&self, signature: SchnorrInputSignature) -> Result<Self, TxError> {
        check_standard(signature.hash_type())?;
        Ok(Self {
            signature: Some(signature),
            ..self.clone()
        })
    }

    fn filter_signatures<F: Fn(&SchnorrInputSignature) -> bool>(&self, keep: F) -> Self {
        match &self.signature {
            Some(sig) if !keep(sig) => Self {
                signature: None,
                ..self.clone()
            },
            _ => self.clone(),
        }
    }
}
