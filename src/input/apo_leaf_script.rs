//! Script-path spend signed with SIGHASH_ANYPREVOUT.
//!
//! Signatures skip the outpoint but still commit to the spent amount and script and to the
//! leaf being executed, so they rebind only to outputs with the same value and script.

use alloc::vec::Vec;

use k256::schnorr::SigningKey;

use super::{
    create_input_signature, require_any_prev_out, script_path_parts, MatchOutcome, RawInput,
    TaprootInput,
};
use crate::consensus::{OutPoint, TxOut};
use crate::error::TxError;
use crate::sighash_type::SigHashType;
use crate::signature::SchnorrInputSignature;
use crate::taproot::{ControlBlock, TapLeaf};
use crate::transaction::Transaction;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApoLeafScriptInput {
    prev_out: OutPoint,
    sequence: u32,
    leaf: TapLeaf,
    control_block: Vec<u8>,
    signatures: Vec<SchnorrInputSignature>,
}

impl ApoLeafScriptInput {
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

impl TaprootInput for ApoLeafScriptInput {
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

    /// At least one signature, every one carrying the ANYPREVOUT field. Any other hash type
    /// leaves the witness to another variant; an element that does not parse as a signature
    /// fails the match.
    fn match_raw(raw: &RawInput) -> MatchOutcome<Self> {
        let Some((candidates, script, control_block)) = script_path_parts(raw) else {
            return MatchOutcome::NotThisVariant;
        };
        if candidates.is_empty() {
            tracing::trace!("apo leaf script: no signatures");
            return MatchOutcome::NotThisVariant;
        }
        let mut signatures = Vec::with_capacity(candidates.len());
        for element in candidates {
            let signature = match SchnorrInputSignature::from_bytes(element) {
                Ok(sig) => sig,
                Err(e) => return MatchOutcome::Malformed(e),
            };
            if let Err(e) = require_any_prev_out(&signature) {
                tracing::trace!(error = %e, "apo leaf script: signature without ANYPREVOUT");
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

    /// Forces ANYPREVOUT onto `hash_type` and appends a signature over the spent output of
    /// `input_index` and this leaf.
    fn sign(
        &self,
        tx: &Transaction,
        input_index: usize,
        key: &SigningKey,
        prevouts: &[TxOut],
        hash_type: SigHashType,
    ) -> Result<Self, TxError> {
        let hash_type = hash_type.with_any_prev_out()?;
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
        require_any_prev_out(&signature)?;
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
