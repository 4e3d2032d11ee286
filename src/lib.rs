//! Taproot input signing with BIP-118 ANYPREVOUT support.
//!
//! no_std (with `alloc`). The `std` feature adds `std::error::Error` for [`TxError`]; the
//! `serde` feature adds serde support for hash types, signatures and outputs.

#![no_std]

#[cfg(feature = "std")]
extern crate std;

// Needed for Vec
extern crate alloc;

pub mod compact_size;
pub mod consensus;
pub mod error;
pub mod input;
pub mod sighash_type;
pub mod signature;
pub mod taproot;
pub mod transaction;

pub use consensus::{taproot_sighash, OutPoint, TxOut, Txid};
pub use error::TxError;
pub use input::{
    create_input_signature, ApoKeyInput, ApoLeafScriptInput, ApoScriptInput, Input,
    MatchOutcome, RawInput, TaprootInput, TaprootKeyInput, TaprootScriptInput,
};
pub use sighash_type::SigHashType;
pub use signature::SchnorrInputSignature;
pub use taproot::{ControlBlock, TapLeaf};
pub use transaction::Transaction;

/// Re-exported so callers build keys against the same `k256` version.
pub use k256::schnorr::SigningKey;
