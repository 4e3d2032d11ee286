//! Inputs whose witness shape is not recognized.

use alloc::vec::Vec;

use crate::consensus::OutPoint;

/// An input kept exactly as it was read: outpoint, sequence, script-sig and witness stack.
///
/// Also the starting point for matching: [`super::Input::match_raw`] tries every typed variant
/// against it and falls back to keeping it as is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawInput {
    prev_out: OutPoint,
    sequence: u32,
    script_sig: Vec<u8>,
    witness: Vec<Vec<u8>>,
}

impl RawInput {
    pub fn new(
        prev_out: OutPoint,
        sequence: u32,
        script_sig: Vec<u8>,
        witness: Vec<Vec<u8>>,
    ) -> Self {
        Self {
            prev_out,
            sequence,
            script_sig,
            witness,
        }
    }

    pub fn prev_out(&self) -> &OutPoint {
        &self.prev_out
    }

    pub fn sequence(&self) -> u32 {
        self.sequence
    }

    pub fn script_sig(&self) -> &[u8] {
        &self.script_sig
    }

    pub fn witness(&self) -> &[Vec<u8>] {
        &self.witness
    }

    /// Nothing is known about what this input still needs, so it is passed through as final.
    pub fn complete(&self) -> bool {
        true
    }
}
