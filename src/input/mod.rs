//! Taproot spending inputs.
//!
//! Each variant owns its outpoint, sequence and the data its witness is built from. Variants are
//! values: signing and filtering return a new input and never touch the receiver.
//!
//! Raw inputs read from a transaction are re-typed by [`Input::match_raw`], which tries the
//! structural matchers in a fixed order:
//!
//! 1. [`ApoKeyInput`]: `[sig]` with an ANYPREVOUT hash type
//! 2. [`TaprootKeyInput`]: `[sig]` with a standard hash type
//! 3. [`TaprootScriptInput`]: `[sig.., script, control]` without ANYPREVOUT signatures
//! 4. [`ApoLeafScriptInput`]: `[sig.., script, control]`, every signature ANYPREVOUT
//! 5. [`ApoScriptInput`]: `[sig.., script, control]`, keeping ANYPREVOUTANYSCRIPT signatures
//! 6. [`RawInput`]: anything else, kept verbatim

use alloc::vec::Vec;

use k256::schnorr::SigningKey;

use crate::consensus::{taproot_sighash, OutPoint, TxOut};
use crate::error::TxError;
use crate::sighash_type::{InputCommitment, SigHashType, SIGHASH_ANYPREVOUT};
use crate::signature::{sign_digest, SchnorrInputSignature};
use crate::taproot::ControlBlock;
use crate::transaction::Transaction;

mod apo_key;
mod apo_leaf_script;
mod apo_script;
mod raw;
mod taproot_key;
mod taproot_script;

pub use apo_key::ApoKeyInput;
pub use apo_leaf_script::ApoLeafScriptInput;
pub use apo_script::ApoScriptInput;
pub use raw::RawInput;
pub use taproot_key::TaprootKeyInput;
pub use taproot_script::TaprootScriptInput;

// -----------------------------------------------------------------------------
// Matching
// -----------------------------------------------------------------------------

/// Result of matching a raw input against one variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome<T> {
    Matched(T),
    /// The witness does not have this variant's shape.
    NotThisVariant,
    /// The shape fits but an element that must be a signature does not parse.
    Malformed(TxError),
}

impl<T> MatchOutcome<T> {
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> MatchOutcome<U> {
        match self {
            MatchOutcome::Matched(v) => MatchOutcome::Matched(f(v)),
            MatchOutcome::NotThisVariant => MatchOutcome::NotThisVariant,
            MatchOutcome::Malformed(e) => MatchOutcome::Malformed(e),
        }
    }

    pub fn matched(self) -> Option<T> {
        match self {
            MatchOutcome::Matched(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_matched(&self) -> bool {
        matches!(self, MatchOutcome::Matched(_))
    }
}

/// Splits a script-path witness into `(signatures, leaf script, control block)`.
///
/// `None` when script-sig is set, fewer than two elements are present or the control block is
/// structurally invalid.
pub(crate) fn script_path_parts(raw: &RawInput) -> Option<(&[Vec<u8>], &[u8], &[u8])> {
    if !raw.script_sig().is_empty() {
        tracing::trace!("script path: non-empty script-sig");
        return None;
    }
    let witness = raw.witness();
    if witness.len() < 2 {
        tracing::trace!(len = witness.len(), "script path: witness too short");
        return None;
    }
    let (signatures, tail) = witness.split_at(witness.len() - 2);
    let (script, control_block) = (&tail[0], &tail[1]);
    if let Err(e) = ControlBlock::from_slice(control_block) {
        tracing::trace!(error = %e, "script path: control block rejected");
        return None;
    }
    Some((signatures, script.as_slice(), control_block.as_slice()))
}

/// The single element of a key-path witness, when script-sig is empty.
pub(crate) fn key_path_element(raw: &RawInput) -> Option<&[u8]> {
    if !raw.script_sig().is_empty() {
        tracing::trace!("key path: non-empty script-sig");
        return None;
    }
    match raw.witness() {
        [element] => Some(element.as_slice()),
        witness => {
            tracing::trace!(len = witness.len(), "key path: witness is not a single element");
            None
        }
    }
}

/// Accepts exactly the ANYPREVOUT input-commitment field. ANYPREVOUTANYSCRIPT has bit 6 set too,
/// so it is reported as the wrong field rather than a missing flag.
pub(crate) fn require_any_prev_out(signature: &SchnorrInputSignature) -> Result<(), TxError> {
    let found = signature.hash_type().value();
    match signature.hash_type().input_commitment() {
        InputCommitment::AnyPrevOut => Ok(()),
        InputCommitment::AnyPrevOutAnyScript => Err(TxError::ForbiddenSigHashFlag(found)),
        InputCommitment::AllInputs | InputCommitment::AnyoneCanPay => {
            Err(TxError::MissingSigHashFlag {
                required: SIGHASH_ANYPREVOUT,
                found,
            })
        }
    }
}

// -----------------------------------------------------------------------------
// Signing
// -----------------------------------------------------------------------------

/// Computes the sighash for `input_index` under `hash_type` and signs it with `key`.
///
/// Every variant signs through here; the variant decides `hash_type` and `leaf_hash`.
pub fn create_input_signature(
    tx: &Transaction,
    input_index: usize,
    key: &SigningKey,
    prevouts: &[TxOut],
    hash_type: SigHashType,
    leaf_hash: Option<&[u8; 32]>,
) -> Result<SchnorrInputSignature, TxError> {
    let digest = taproot_sighash(tx, input_index, prevouts, hash_type, leaf_hash)?;
    let signature = sign_digest(key, &digest)?;
    tracing::debug!(
        input_index,
        hash_type = %hash_type,
        script_path = leaf_hash.is_some(),
        "created input signature"
    );
    Ok(SchnorrInputSignature::new(signature, hash_type))
}

/// Operations shared by the typed (signable) variants.
pub trait TaprootInput: Sized {
    fn prev_out(&self) -> &OutPoint;

    fn sequence(&self) -> u32;

    /// Witness stack this input serializes to.
    fn witness(&self) -> Vec<Vec<u8>>;

    fn complete(&self) -> bool;

    fn match_raw(raw: &RawInput) -> MatchOutcome<Self>;

    /// Signs `tx` at `input_index`. The variant may rewrite the input-commitment field of
    /// `hash_type`; the output-selection mode is kept.
    fn sign(
        &self,
        tx: &Transaction,
        input_index: usize,
        key: &SigningKey,
        prevouts: &[TxOut],
        hash_type: SigHashType,
    ) -> Result<Self, TxError>;

    fn add_signature(&self, signature: SchnorrInputSignature) -> Result<Self, TxError>;

    /// Keeps only the signatures `keep` accepts.
    fn filter_signatures<F: Fn(&SchnorrInputSignature) -> bool>(&self, keep: F) -> Self;
}

// -----------------------------------------------------------------------------
// Input
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    ApoKey(ApoKeyInput),
    TaprootKey(TaprootKeyInput),
    TaprootScript(TaprootScriptInput),
    ApoLeafScript(ApoLeafScriptInput),
    ApoScript(ApoScriptInput),
    Raw(RawInput),
}

macro_rules! signable {
    ($self:expr, $inner:ident => $body:expr, $raw:ident => $fallback:expr) => {
        match $self {
            Input::ApoKey($inner) => $body,
            Input::TaprootKey($inner) => $body,
            Input::TaprootScript($inner) => $body,
            Input::ApoLeafScript($inner) => $body,
            Input::ApoScript($inner) => $body,
            Input::Raw($raw) => $fallback,
        }
    };
}

impl Input {
    /// Re-types a raw input, trying each variant in priority order.
    pub fn match_raw(raw: RawInput) -> Input {
        if let Some(input) = try_variant::<ApoKeyInput>(&raw, "apo-key") {
            return Input::ApoKey(input);
        }
        if let Some(input) = try_variant::<TaprootKeyInput>(&raw, "taproot-key") {
            return Input::TaprootKey(input);
        }
        if let Some(input) = try_variant::<TaprootScriptInput>(&raw, "taproot-script") {
            return Input::TaprootScript(input);
        }
        if let Some(input) = try_variant::<ApoLeafScriptInput>(&raw, "apo-leaf-script") {
            return Input::ApoLeafScript(input);
        }
        if let Some(input) = try_variant::<ApoScriptInput>(&raw, "apo-script") {
            return Input::ApoScript(input);
        }
        tracing::trace!(prev_out = %raw.prev_out(), "keeping input as raw");
        Input::Raw(raw)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Input::ApoKey(_) => "apo-key",
            Input::TaprootKey(_) => "taproot-key",
            Input::TaprootScript(_) => "taproot-script",
            Input::ApoLeafScript(_) => "apo-leaf-script",
            Input::ApoScript(_) => "apo-script",
            Input::Raw(_) => "raw",
        }
    }

    pub fn prev_out(&self) -> &OutPoint {
        signable!(self, i => i.prev_out(), r => r.prev_out())
    }

    pub fn sequence(&self) -> u32 {
        signable!(self, i => i.sequence(), r => r.sequence())
    }

    /// Typed variants never carry a script-sig.
    pub fn script_sig(&self) -> &[u8] {
        signable!(self, _i => &[], r => r.script_sig())
    }

    pub fn witness(&self) -> Vec<Vec<u8>> {
        signable!(self, i => i.witness(), r => r.witness().to_vec())
    }

    pub fn complete(&self) -> bool {
        signable!(self, i => i.complete(), r => r.complete())
    }

    pub fn sign(
        &self,
        tx: &Transaction,
        input_index: usize,
        key: &SigningKey,
        prevouts: &[TxOut],
        hash_type: SigHashType,
    ) -> Result<Input, TxError> {
        Ok(match self {
            Input::ApoKey(i) => Input::ApoKey(i.sign(tx, input_index, key, prevouts, hash_type)?),
            Input::TaprootKey(i) => {
                Input::TaprootKey(i.sign(tx, input_index, key, prevouts, hash_type)?)
            }
            Input::TaprootScript(i) => {
                Input::TaprootScript(i.sign(tx, input_index, key, prevouts, hash_type)?)
            }
            Input::ApoLeafScript(i) => {
                Input::ApoLeafScript(i.sign(tx, input_index, key, prevouts, hash_type)?)
            }
            Input::ApoScript(i) => {
                Input::ApoScript(i.sign(tx, input_index, key, prevouts, hash_type)?)
            }
            Input::Raw(_) => return Err(TxError::UnsignableInput),
        })
    }

    pub fn add_signature(&self, signature: SchnorrInputSignature) -> Result<Input, TxError> {
        Ok(match self {
            Input::ApoKey(i) => Input::ApoKey(i.add_signature(signature)?),
            Input::TaprootKey(i) => Input::TaprootKey(i.add_signature(signature)?),
            Input::TaprootScript(i) => Input::TaprootScript(i.add_signature(signature)?),
            Input::ApoLeafScript(i) => Input::ApoLeafScript(i.add_signature(signature)?),
            Input::ApoScript(i) => Input::ApoScript(i.add_signature(signature)?),
            Input::Raw(_) => return Err(TxError::UnsignableInput),
        })
    }

    /// Raw inputs are returned unchanged.
    pub fn filter_signatures<F: Fn(&SchnorrInputSignature) -> bool>(&self, keep: F) -> Input {
        match self {
            Input::ApoKey(i) => Input::ApoKey(i.filter_signatures(keep)),
            Input::TaprootKey(i) => Input::TaprootKey(i.filter_signatures(keep)),
            Input::TaprootScript(i) => Input::TaprootScript(i.filter_signatures(keep)),
            Input::ApoLeafScript(i) => Input::ApoLeafScript(i.filter_signatures(keep)),
            Input::ApoScript(i) => Input::ApoScript(i.filter_signatures(keep)),
            Input::Raw(r) => Input::Raw(r.clone()),
        }
    }
}

fn try_variant<T: TaprootInput>(raw: &RawInput, kind: &str) -> Option<T> {
    match T::match_raw(raw) {
        MatchOutcome::Matched(input) => {
            tracing::trace!(kind, prev_out = %raw.prev_out(), "input matched");
            Some(input)
        }
        MatchOutcome::NotThisVariant => None,
        MatchOutcome::Malformed(e) => {
            tracing::debug!(kind, error = %e, "malformed signature aborted match");
            None
        }
    }
}

impl From<ApoKeyInput> for Input {
    fn from(input: ApoKeyInput) -> Self {
        Input::ApoKey(input)
    }
}

impl From<TaprootKeyInput> for Input {
    fn from(input: TaprootKeyInput) -> Self {
        Input::TaprootKey(input)
    }
}

impl From<TaprootScriptInput> for Input {
    fn from(input: TaprootScriptInput) -> Self {
        Input::TaprootScript(input)
    }
}

impl From<ApoLeafScriptInput> for Input {
    fn from(input: ApoLeafScriptInput) -> Self {
        Input::ApoLeafScript(input)
    }
}

impl From<ApoScriptInput> for Input {
    fn from(input: ApoScriptInput) -> Self {
        Input::ApoScript(input)
    }
}

impl From<RawInput> for Input {
    fn from(input: RawInput) -> Self {
        Input::Raw(input)
    }
}
