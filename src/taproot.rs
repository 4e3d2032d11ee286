//! Tapscript leaves and the script-path control block layout.
//!
//! Control block: byte 0 = leaf version | output-key parity (bit 0), bytes 1..33 = internal
//! x-only key, then 0..=128 Merkle proof nodes of 32 bytes each.

use alloc::vec::Vec;

use crate::compact_size::write_var_bytes;
use crate::consensus::tagged_hash;
use crate::error::TxError;

/// Tapscript leaf version.
pub const TAPSCRIPT_LEAF_VERSION: u8 = 0xc0;
/// Masks off the parity bit of the control block's first byte.
pub const TAPROOT_LEAF_MASK: u8 = 0xfe;
/// Version/parity byte plus the internal key.
pub const TAPROOT_CONTROL_BASE_SIZE: usize = 33;
pub const TAPROOT_CONTROL_NODE_SIZE: usize = 32;
pub const TAPROOT_CONTROL_MAX_NODE_COUNT: usize = 128;
pub const TAPROOT_CONTROL_MAX_SIZE: usize =
    TAPROOT_CONTROL_BASE_SIZE + TAPROOT_CONTROL_NODE_SIZE * TAPROOT_CONTROL_MAX_NODE_COUNT;

const TAP_LEAF_TAG: &[u8] = b"TapLeaf";

/// A tapscript leaf: compiled script plus its derived leaf hash.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TapLeaf {
    script: Vec<u8>,
    hash: [u8; 32],
}

impl TapLeaf {
    pub fn new(script: Vec<u8>) -> Self {
        let hash = leaf_hash(TAPSCRIPT_LEAF_VERSION, &script);
        Self { script, hash }
    }

    pub fn script(&self) -> &[u8] {
        &self.script
    }

    pub const fn version(&self) -> u8 {
        TAPSCRIPT_LEAF_VERSION
    }

    /// TaggedHash("TapLeaf", version || compact_size(len) || script).
    pub const fn hash(&self) -> &[u8; 32] {
        &self.hash
    }
}

fn leaf_hash(version: u8, script: &[u8]) -> [u8; 32] {
    let mut payload = Vec::with_capacity(1 + 9 + script.len());
    payload.push(version);
    write_var_bytes(&mut payload, script);
    tagged_hash(TAP_LEAF_TAG, &payload)
}

/// Size rule alone: 33 + 32n bytes with n <= 128.
pub const fn valid_control_block_size(len: usize) -> bool {
    len >= TAPROOT_CONTROL_BASE_SIZE
        && (len - TAPROOT_CONTROL_BASE_SIZE) % TAPROOT_CONTROL_NODE_SIZE == 0
        && (len - TAPROOT_CONTROL_BASE_SIZE) / TAPROOT_CONTROL_NODE_SIZE
            <= TAPROOT_CONTROL_MAX_NODE_COUNT
}

/// Structural view over control block bytes. Keys and proof nodes are not checked against
/// any output; that belongs to script-tree construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlBlock<'a> {
    bytes: &'a [u8],
}

impl<'a> ControlBlock<'a> {
    /// Accepts bytes with a valid size and the tapscript leaf version (parity ignored).
    pub fn from_slice(bytes: &'a [u8]) -> Result<Self, TxError> {
        if !valid_control_block_size(bytes.len()) {
            return Err(TxError::InvalidControlBlock(bytes.len()));
        }
        let version = bytes[0] & TAPROOT_LEAF_MASK;
        if version != TAPSCRIPT_LEAF_VERSION {
            return Err(TxError::InvalidLeafVersion(version));
        }
        Ok(Self { bytes })
    }

    pub fn leaf_version(&self) -> u8 {
        self.bytes[0] & TAPROOT_LEAF_MASK
    }

    /// Parity of the tweaked output key.
    pub fn output_key_parity(&self) -> u8 {
        self.bytes[0] & 1
    }

    pub fn internal_key(&self) -> &'a [u8] {
        let bytes: &'a [u8] = self.bytes;
        &bytes[1..TAPROOT_CONTROL_BASE_SIZE]
    }

    pub fn proof_len(&self) -> usize {
        (self.bytes.len() - TAPROOT_CONTROL_BASE_SIZE) / TAPROOT_CONTROL_NODE_SIZE
    }

    /// Merkle proof nodes, leaf side first.
    pub fn proof_nodes(&self) -> impl Iterator<Item = &'a [u8]> {
        let bytes: &'a [u8] = self.bytes;
        bytes[TAPROOT_CONTROL_BASE_SIZE..].chunks_exact(TAPROOT_CONTROL_NODE_SIZE)
    }

    pub const fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }
}
