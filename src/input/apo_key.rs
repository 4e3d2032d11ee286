//! Key-path spend signed with SIGHASH_ANYPREVOUT.

use alloc::vec;
use alloc::vec::Vec;

use k256::schnorr::SigningKey;

use super::{
    create_input_signature, key_path_element, require_any_prev_out, MatchOutcome, RawInput,
    TaprootInput,
};
use crate::consensus::{OutPoint, TxOut};
use crate::error::TxError;
use crate::sighash_type::SigHashType;
use crate::signature::SchnorrInputSignature;
use crate::transaction::Transaction;

/// A key-path input whose signature does not commit to the outpoint it spends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApoKeyInput {
    prev_out: OutPoint,
    sequence: u32,
    signature: Option<SchnorrInputSignature>,
}

impl ApoKeyInput {
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

impl TaprootInput for ApoKeyInput {
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
                tracing::trace!(error = %e, "apo key: witness element is not a signature");
                return MatchOutcome::NotThisVariant;
            }
        };
        if let Err(e) = require_any_prev_out(&signature) {
            tracing::trace!(error = %e, "apo key: signature lacks ANYPREVOUT");
            return MatchOutcome::NotThisVariant;
        }
        MatchOutcome::Matched(Self {
            prev_out: *raw.prev_out(),
            sequence: raw.sequence(),
            signature: Some(signature),
        })
    }

    /// Always signs with the ANYPREVOUT field set, whatever `hash_type` carried.
    fn sign(
        &self,
        tx: &Transaction,
        input_index: usize,
        key: &SigningKey,
        prevouts: &[TxOut],
        hash_type: SigHashType,
    ) -> Result<Self, TxError> {
        let hash_type = hash_type.with_any_prev_out()?;
        let signature = create_input_signature(tx, input_index, key, prevouts, hash_type, None)?;
        Ok(Self {
            signature: Some(signature),
            ..self.clone()
        })
    }

    /// Replaces any existing signature.
    fn add_signature(&self, signature: SchnorrInputSignature) -> Result<Self, TxError> {
        require_any_prev_out(&signature)?;
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
