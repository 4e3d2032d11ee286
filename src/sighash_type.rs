//! Schnorr sighash types: output-selection mode plus the input-commitment field.
//!
//! Bits 0–1 select outputs (ALL / NONE / SINGLE). Bits 6–7 form one field describing how the
//! signing input is committed to:
//!
//! | bits 6–7 | meaning |
//! |---|---|
//! | `0x00` | all inputs |
//! | `0x80` | ANYONECANPAY |
//! | `0x40` | ANYPREVOUT |
//! | `0xC0` | ANYPREVOUTANYSCRIPT |
//!
//! `0x00` alone is the Schnorr-only DEFAULT sentinel (ALL, omitted from signatures).

use core::fmt;
use core::str::FromStr;

use crate::error::TxError;

pub const SIGHASH_DEFAULT: u8 = 0x00;
pub const SIGHASH_ALL: u8 = 0x01;
pub const SIGHASH_NONE: u8 = 0x02;
pub const SIGHASH_SINGLE: u8 = 0x03;

pub const SIGHASH_ANYONECANPAY: u8 = 0x80;
pub const SIGHASH_ANYPREVOUT: u8 = 0x40;
pub const SIGHASH_ANYPREVOUTANYSCRIPT: u8 = 0xc0;

/// Output-selection bits.
pub const SIGHASH_OUTPUT_MASK: u8 = 0x03;
/// Input-commitment field (bits 6–7).
pub const SIGHASH_INPUT_MASK: u8 = 0xc0;

/// How the signing input (and the other inputs) enter the signature message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputCommitment {
    /// Every input's outpoint, amount, script and sequence.
    AllInputs,
    /// Only this input: outpoint, amount, script, sequence.
    AnyoneCanPay,
    /// Only this input, without its outpoint.
    AnyPrevOut,
    /// Only this input's sequence.
    AnyPrevOutAnyScript,
}

/// A validated sighash type. Only whitelisted bytes (and DEFAULT) can be constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SigHashType(u8);

impl SigHashType {
    /// Exact whitelist of explicit (non-DEFAULT) values.
    pub const fn valid_value(value: u8) -> bool {
        matches!(
            value,
            0x01 | 0x02 | 0x03 | 0x81 | 0x82 | 0x83 | 0x41 | 0x42 | 0x43 | 0xc1 | 0xc2 | 0xc3
        )
    }

    /// Constructs from an explicit byte. DEFAULT (0x00) is rejected; use [`Self::default_type`].
    pub fn from_value(value: u8) -> Result<Self, TxError> {
        if Self::valid_value(value) {
            Ok(Self(value))
        } else {
            Err(TxError::InvalidSigHashValue(value))
        }
    }

    /// Same as [`Self::from_value`].
    pub fn validated(value: u8) -> Result<Self, TxError> {
        Self::from_value(value)
    }

    /// Schnorr DEFAULT: commits like ALL, encoded by omitting the hash-type byte.
    pub const fn default_type() -> Self {
        Self(SIGHASH_DEFAULT)
    }

    pub const fn all() -> Self {
        Self(SIGHASH_ALL)
    }

    pub const fn none() -> Self {
        Self(SIGHASH_NONE)
    }

    pub const fn single() -> Self {
        Self(SIGHASH_SINGLE)
    }

    pub const fn value(self) -> u8 {
        self.0
    }

    pub const fn is_default(self) -> bool {
        self.0 == SIGHASH_DEFAULT
    }

    /// ALL mode, flag-agnostic. DEFAULT counts as ALL.
    pub const fn is_all(self) -> bool {
        self.is_default() || self.0 & SIGHASH_OUTPUT_MASK == SIGHASH_ALL
    }

    pub const fn is_none(self) -> bool {
        self.0 & SIGHASH_OUTPUT_MASK == SIGHASH_NONE
    }

    pub const fn is_single(self) -> bool {
        self.0 & SIGHASH_OUTPUT_MASK == SIGHASH_SINGLE
    }

    /// Bit 7. Also set for ANYPREVOUTANYSCRIPT, which commits to no other input either.
    pub const fn any_one_can_pay(self) -> bool {
        self.0 & SIGHASH_ANYONECANPAY != 0
    }

    /// Bit 6. Set for both ANYPREVOUT and ANYPREVOUTANYSCRIPT; use
    /// [`input_commitment`](Self::input_commitment) to tell them apart.
    pub const fn any_prev_out(self) -> bool {
        self.0 & SIGHASH_ANYPREVOUT != 0
    }

    pub const fn any_prev_out_any_script(self) -> bool {
        self.0 & SIGHASH_INPUT_MASK == SIGHASH_ANYPREVOUTANYSCRIPT
    }

    pub const fn input_commitment(self) -> InputCommitment {
        match self.0 & SIGHASH_INPUT_MASK {
            SIGHASH_ANYONECANPAY => InputCommitment::AnyoneCanPay,
            SIGHASH_ANYPREVOUT => InputCommitment::AnyPrevOut,
            SIGHASH_ANYPREVOUTANYSCRIPT => InputCommitment::AnyPrevOutAnyScript,
            _ => InputCommitment::AllInputs,
        }
    }

    /// Sets bit 7. On an ANYPREVOUT type this yields ANYPREVOUTANYSCRIPT.
    pub fn with_any_one_can_pay(self) -> Result<Self, TxError> {
        Self::validated(self.0 | SIGHASH_ANYONECANPAY)
    }

    /// Overwrites the input-commitment field with ANYPREVOUT.
    pub fn with_any_prev_out(self) -> Result<Self, TxError> {
        Self::validated((self.0 & !SIGHASH_INPUT_MASK) | SIGHASH_ANYPREVOUT)
    }

    /// Overwrites the input-commitment field with ANYPREVOUTANYSCRIPT.
    pub fn with_any_prev_out_any_script(self) -> Result<Self, TxError> {
        Self::validated((self.0 & !SIGHASH_INPUT_MASK) | SIGHASH_ANYPREVOUTANYSCRIPT)
    }
}

impl Default for SigHashType {
    fn default() -> Self {
        Self::default_type()
    }
}

impl TryFrom<u8> for SigHashType {
    type Error = TxError;
    fn try_from(value: u8) -> Result<Self, TxError> {
        Self::from_value(value)
    }
}

impl From<SigHashType> for u8 {
    fn from(hash_type: SigHashType) -> u8 {
        hash_type.0
    }
}

impl fmt::Display for SigHashType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_default() {
            return f.write_str("DEFAULT");
        }
        let mode = match self.0 & SIGHASH_OUTPUT_MASK {
            SIGHASH_ALL => "ALL",
            SIGHASH_NONE => "NONE",
            _ => "SINGLE",
        };
        f.write_str(mode)?;
        match self.input_commitment() {
            InputCommitment::AllInputs => Ok(()),
            InputCommitment::AnyoneCanPay => f.write_str("|ANYONECANPAY"),
            InputCommitment::AnyPrevOut => f.write_str("|ANYPREVOUT"),
            InputCommitment::AnyPrevOutAnyScript => f.write_str("|ANYPREVOUTANYSCRIPT"),
        }
    }
}

impl FromStr for SigHashType {
    type Err = TxError;

    /// Parses the [`Display`](fmt::Display) form, e.g. `SINGLE|ANYPREVOUT`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s == "DEFAULT" {
            return Ok(Self::default_type());
        }
        let (mode, flag) = match s.split_once('|') {
            Some((mode, flag)) => (mode, Some(flag)),
            None => (s, None),
        };
        let mode = match mode {
            "ALL" => SIGHASH_ALL,
            "NONE" => SIGHASH_NONE,
            "SINGLE" => SIGHASH_SINGLE,
            _ => return Err(TxError::InvalidSigHashName),
        };
        let flag = match flag {
            None => 0,
            Some("ANYONECANPAY") => SIGHASH_ANYONECANPAY,
            Some("ANYPREVOUT") => SIGHASH_ANYPREVOUT,
            Some("ANYPREVOUTANYSCRIPT") => SIGHASH_ANYPREVOUTANYSCRIPT,
            Some(_) => return Err(TxError::InvalidSigHashName),
        };
        Self::validated(mode | flag)
    }
}

#[cfg(feature = "serde")]
mod serde_impl {
    use super::SigHashType;

    impl serde::Serialize for SigHashType {
        fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            serializer.serialize_u8(self.0)
        }
    }

    // DEFAULT is a legitimate stored value, so 0x00 is accepted here.
    impl<'de> serde::Deserialize<'de> for SigHashType {
        fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            let value = <u8 as serde::Deserialize>::deserialize(deserializer)?;
            if value == super::SIGHASH_DEFAULT {
                return Ok(SigHashType::default_type());
            }
            SigHashType::validated(value).map_err(serde::de::Error::custom)
        }
    }
}
