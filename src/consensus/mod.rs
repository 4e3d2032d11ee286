//! Consensus data shared by signing and the transaction codec: spent outputs, outpoints and
//! BIP-340 tagged hashes.
//!
//! Outpoints reuse `bitcoin::OutPoint`; the txid is kept in internal (wire) byte order and only
//! reversed when displayed.

use alloc::vec::Vec;

use bitcoin::consensus::Decodable;
use bitcoin::hashes::sha256::Hash as Sha256Hash;
use bitcoin::hashes::Hash;
use byteorder::{ByteOrder, LittleEndian};

use crate::compact_size::{compact_size_len, read_u64, read_var_bytes, write_var_bytes};
use crate::error::TxError;

pub mod taproot_sighash;

pub use bitcoin::{OutPoint, Txid};
pub use taproot_sighash::taproot_sighash;

/// Serialized outpoint size: 32-byte txid + 4-byte vout.
pub const OUTPOINT_SIZE: usize = 36;

// -----------------------------------------------------------------------------
// TxOut
// -----------------------------------------------------------------------------

/// A transaction output, or the previous output an input spends.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TxOut {
    /// Value in satoshis.
    pub value: u64,
    /// scriptPubKey as opaque bytes.
    pub script_pubkey: Vec<u8>,
}

impl TxOut {
    pub fn new(value: u64, script_pubkey: Vec<u8>) -> Self {
        Self {
            value,
            script_pubkey,
        }
    }

    /// CTxOut encoding: 8-byte value LE + var-bytes scriptPubKey.
    pub fn write_to(&self, buf: &mut Vec<u8>) {
        let mut val_buf = [0u8; 8];
        LittleEndian::write_u64(&mut val_buf, self.value);
        buf.extend_from_slice(&val_buf);
        write_var_bytes(buf, &self.script_pubkey);
    }

    pub fn read_from(data: &mut &[u8]) -> Result<Self, TxError> {
        let value = read_u64(data)?;
        let script_pubkey = read_var_bytes(data)?;
        Ok(Self {
            value,
            script_pubkey,
        })
    }

    pub fn encoded_len(&self) -> usize {
        8 + compact_size_len(self.script_pubkey.len() as u64) + self.script_pubkey.len()
    }
}

// -----------------------------------------------------------------------------
// OutPoint encoding
// -----------------------------------------------------------------------------

/// Appends txid (internal order) and vout LE.
pub fn write_outpoint(buf: &mut Vec<u8>, outpoint: &OutPoint) {
    buf.extend_from_slice(&outpoint.txid.to_byte_array());
    let mut vout_buf = [0u8; 4];
    LittleEndian::write_u32(&mut vout_buf, outpoint.vout);
    buf.extend_from_slice(&vout_buf);
}

/// Decodes a 36-byte outpoint from the front of `data`.
pub fn read_outpoint(data: &mut &[u8]) -> Result<OutPoint, TxError> {
    if data.len() < OUTPOINT_SIZE {
        return Err(TxError::IncompleteData);
    }
    OutPoint::consensus_decode(data).map_err(|_| TxError::IncompleteData)
}

// -----------------------------------------------------------------------------
// Hashing
// -----------------------------------------------------------------------------

/// BIP-340 tagged hash: SHA256(SHA256(tag) || SHA256(tag) || payload).
pub fn tagged_hash(tag: &[u8], payload: &[u8]) -> [u8; 32] {
    let tag_hash = Sha256Hash::hash(tag);
    let mut inner = Vec::with_capacity(64 + payload.len());
    inner.extend_from_slice(&tag_hash.to_byte_array());
    inner.extend_from_slice(&tag_hash.to_byte_array());
    inner.extend_from_slice(payload);
    Sha256Hash::hash(&inner).to_byte_array()
}

pub(crate) fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256Hash::hash(data).to_byte_array()
}
