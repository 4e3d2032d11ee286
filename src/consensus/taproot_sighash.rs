//! BIP-341 Taproot sighash (SigMsg + TapSighash tagged hash) with the BIP-118 input-data rules
//! for ANYPREVOUT and ANYPREVOUTANYSCRIPT.
//!
//! The hash type's input-commitment field decides what of the spent outputs is read:
//! every entry for the plain modes, only `prevouts[input_index]` for ANYONECANPAY and
//! ANYPREVOUT, nothing at all for ANYPREVOUTANYSCRIPT.

use alloc::vec::Vec;

use byteorder::{ByteOrder, LittleEndian};

use crate::compact_size::write_var_bytes;
use crate::consensus::{sha256, tagged_hash, write_outpoint, TxOut};
use crate::error::TxError;
use crate::sighash_type::{InputCommitment, SigHashType};
use crate::transaction::Transaction;

const TAP_SIGHASH_TAG: &[u8] = b"TapSighash";

/// Sighash epoch prefixed to SigMsg.
const SIGHASH_EPOCH: u8 = 0x00;

/// Key version committed by script-path signatures with an ANYPREVOUT flag (BIP-118 keys).
const APO_KEY_VERSION: u8 = 0x01;
const TAPROOT_KEY_VERSION: u8 = 0x00;

/// No OP_CODESEPARATOR executed.
const CODESEP_NONE: u32 = 0xffff_ffff;

fn push_u32(buf: &mut Vec<u8>, n: u32) {
    let mut b = [0u8; 4];
    LittleEndian::write_u32(&mut b, n);
    buf.extend_from_slice(&b);
}

fn push_u64(buf: &mut Vec<u8>, n: u64) {
    let mut b = [0u8; 8];
    LittleEndian::write_u64(&mut b, n);
    buf.extend_from_slice(&b);
}

/// The output spent by `input_index`.
fn spent_output(prevouts: &[TxOut], input_index: usize) -> Result<&TxOut, TxError> {
    prevouts.get(input_index).ok_or(TxError::MissingPrevouts {
        required: input_index + 1,
        found: prevouts.len(),
    })
}

/// Computes the Taproot signature hash of `tx` for `input_index`.
///
/// `leaf_hash` selects the script path (ext_flag = 1). `prevouts` must hold one entry per
/// input unless the hash type commits to the signing input alone.
pub fn taproot_sighash(
    tx: &Transaction,
    input_index: usize,
    prevouts: &[TxOut],
    hash_type: SigHashType,
    leaf_hash: Option<&[u8; 32]>,
) -> Result<[u8; 32], TxError> {
    let input = tx
        .inputs
        .get(input_index)
        .ok_or(TxError::InputIndexOutOfRange {
            index: input_index,
            inputs: tx.inputs.len(),
        })?;
    let commitment = hash_type.input_commitment();

    let mut sig_msg = Vec::with_capacity(256);

    // Control: hash_type
    sig_msg.push(hash_type.value());

    // Transaction: nVersion, nLockTime
    push_u32(&mut sig_msg, tx.version);
    push_u32(&mut sig_msg, tx.locktime);

    if commitment == InputCommitment::AllInputs {
        if prevouts.len() < tx.inputs.len() {
            return Err(TxError::MissingPrevouts {
                required: tx.inputs.len(),
                found: prevouts.len(),
            });
        }
        let spent = &prevouts[..tx.inputs.len()];

        let mut outpoints = Vec::with_capacity(36 * tx.inputs.len());
        let mut sequences = Vec::with_capacity(4 * tx.inputs.len());
        for inp in tx.inputs.iter() {
            write_outpoint(&mut outpoints, inp.prev_out());
            push_u32(&mut sequences, inp.sequence());
        }
        let mut amounts = Vec::with_capacity(8 * spent.len());
        let mut scripts = Vec::new();
        for prev in spent {
            push_u64(&mut amounts, prev.value);
            write_var_bytes(&mut scripts, &prev.script_pubkey);
        }

        sig_msg.extend_from_slice(&sha256(&outpoints));
        sig_msg.extend_from_slice(&sha256(&amounts));
        sig_msg.extend_from_slice(&sha256(&scripts));
        sig_msg.extend_from_slice(&sha256(&sequences));
    }

    // sha_outputs (ALL and DEFAULT)
    if hash_type.is_all() {
        let mut outputs = Vec::new();
        for out in tx.outputs.iter() {
            out.write_to(&mut outputs);
        }
        sig_msg.extend_from_slice(&sha256(&outputs));
    }

    // spend_type: ext_flag * 2, no annex
    let ext_flag: u8 = if leaf_hash.is_some() { 1 } else { 0 };
    sig_msg.push(ext_flag * 2);

    // Data about this input
    match commitment {
        InputCommitment::AnyoneCanPay => {
            let prev = spent_output(prevouts, input_index)?;
            write_outpoint(&mut sig_msg, input.prev_out());
            prev.write_to(&mut sig_msg);
            push_u32(&mut sig_msg, input.sequence());
        }
        InputCommitment::AnyPrevOut => {
            let prev = spent_output(prevouts, input_index)?;
            prev.write_to(&mut sig_msg);
            push_u32(&mut sig_msg, input.sequence());
        }
        InputCommitment::AnyPrevOutAnyScript => {
            push_u32(&mut sig_msg, input.sequence());
        }
        InputCommitment::AllInputs => {
            push_u32(&mut sig_msg, input_index as u32);
        }
    }

    // sha_single_output
    if hash_type.is_single() {
        let out = tx
            .outputs
            .get(input_index)
            .ok_or(TxError::SingleWithoutOutput {
                index: input_index,
                outputs: tx.outputs.len(),
            })?;
        let mut single = Vec::with_capacity(out.encoded_len());
        out.write_to(&mut single);
        sig_msg.extend_from_slice(&sha256(&single));
    }

    // Script-path extension
    if let Some(leaf_hash) = leaf_hash {
        if commitment != InputCommitment::AnyPrevOutAnyScript {
            sig_msg.extend_from_slice(leaf_hash);
        }
        sig_msg.push(if hash_type.any_prev_out() {
            APO_KEY_VERSION
        } else {
            TAPROOT_KEY_VERSION
        });
        push_u32(&mut sig_msg, CODESEP_NONE);
    }

    let mut payload = Vec::with_capacity(1 + sig_msg.len());
    payload.push(SIGHASH_EPOCH);
    payload.extend_from_slice(&sig_msg);
    Ok(tagged_hash(TAP_SIGHASH_TAG, &payload))
}
