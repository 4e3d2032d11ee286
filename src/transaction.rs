//! Transaction container and Bitcoin consensus (de)serialization.
//!
//! Inputs are typed on decode through [`Input::match_raw`]; encoding writes each input's
//! current witness. Segwit form (marker 0x00, flag 0x01) is used whenever any witness is
//! non-empty, legacy form otherwise.

use alloc::vec::Vec;

use bitcoin::hashes::sha256d::Hash as Sha256dHash;
use bitcoin::hashes::Hash;
use byteorder::{ByteOrder, LittleEndian};

use crate::compact_size::{
    read_compact_size, read_u32, read_var_bytes, write_compact_size, write_var_bytes,
};
use crate::consensus::{read_outpoint, write_outpoint, TxOut, Txid};
use crate::error::TxError;
use crate::input::{Input, RawInput};
use crate::signature::SchnorrInputSignature;

const SEGWIT_MARKER: u8 = 0x00;
const SEGWIT_FLAG: u8 = 0x01;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub version: u32,
    pub inputs: Vec<Input>,
    pub outputs: Vec<TxOut>,
    pub locktime: u32,
}

fn push_u32(buf: &mut Vec<u8>, n: u32) {
    let mut b = [0u8; 4];
    LittleEndian::write_u32(&mut b, n);
    buf.extend_from_slice(&b);
}

impl Transaction {
    pub fn new(version: u32, inputs: Vec<Input>, outputs: Vec<TxOut>, locktime: u32) -> Self {
        Self {
            version,
            inputs,
            outputs,
            locktime,
        }
    }

    pub fn has_witness(&self) -> bool {
        self.inputs.iter().any(|input| !input.witness().is_empty())
    }

    /// Full serialization, with witnesses when present.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.encode(self.has_witness())
    }

    /// Witness-stripped serialization.
    pub fn to_legacy_bytes(&self) -> Vec<u8> {
        self.encode(false)
    }

    fn encode(&self, with_witness: bool) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.estimate_capacity());

        // nVersion
        push_u32(&mut out, self.version);

        if with_witness {
            out.push(SEGWIT_MARKER);
            out.push(SEGWIT_FLAG);
        }

        // Inputs: PrevOut (32 + 4) + scriptSig (var-bytes) + nSequence
        write_compact_size(&mut out, self.inputs.len() as u64);
        for input in self.inputs.iter() {
            write_outpoint(&mut out, input.prev_out());
            write_var_bytes(&mut out, input.script_sig());
            push_u32(&mut out, input.sequence());
        }

        // Outputs: value (8 LE) + scriptPubKey (var-bytes)
        write_compact_size(&mut out, self.outputs.len() as u64);
        for output in self.outputs.iter() {
            output.write_to(&mut out);
        }

        if with_witness {
            for input in self.inputs.iter() {
                let witness = input.witness();
                write_compact_size(&mut out, witness.len() as u64);
                for item in witness.iter() {
                    write_var_bytes(&mut out, item);
                }
            }
        }

        // nLockTime
        push_u32(&mut out, self.locktime);

        out
    }

    fn estimate_capacity(&self) -> usize {
        let inputs = self.inputs.len() * (36 + 1 + 4);
        let outputs: usize = self.outputs.iter().map(TxOut::encoded_len).sum();
        4 + 2 + 9 + inputs + 9 + outputs + 4
    }

    /// Parses a complete transaction; bytes left after nLockTime are an error.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TxError> {
        let mut data = bytes;
        let version = read_u32(&mut data)?;

        let segwit = data.first() == Some(&SEGWIT_MARKER);
        if segwit {
            let flag = *data.get(1).ok_or(TxError::IncompleteData)?;
            if flag != SEGWIT_FLAG {
                return Err(TxError::InvalidSegwitFlag(flag));
            }
            data = &data[2..];
        }

        let input_count = read_compact_size(&mut data)?;
        // Each input takes at least 41 bytes; bounds the allocation below.
        if input_count > (data.len() / 41) as u64 {
            return Err(TxError::IncompleteData);
        }
        let mut raw_inputs = Vec::with_capacity(input_count as usize);
        for _ in 0..input_count {
            let prev_out = read_outpoint(&mut data)?;
            let script_sig = read_var_bytes(&mut data)?;
            let sequence = read_u32(&mut data)?;
            raw_inputs.push((prev_out, script_sig, sequence));
        }

        let output_count = read_compact_size(&mut data)?;
        if output_count > (data.len() / 9) as u64 {
            return Err(TxError::IncompleteData);
        }
        let mut outputs = Vec::with_capacity(output_count as usize);
        for _ in 0..output_count {
            outputs.push(TxOut::read_from(&mut data)?);
        }

        let mut witnesses: Vec<Vec<Vec<u8>>> = Vec::with_capacity(raw_inputs.len());
        if segwit {
            for _ in 0..raw_inputs.len() {
                let items = read_compact_size(&mut data)?;
                if items > data.len() as u64 {
                    return Err(TxError::IncompleteData);
                }
                let mut witness = Vec::with_capacity(items as usize);
                for _ in 0..items {
                    witness.push(read_var_bytes(&mut data)?);
                }
                witnesses.push(witness);
            }
            if witnesses.iter().all(Vec::is_empty) {
                return Err(TxError::EmptyWitnessTransaction);
            }
        } else {
            witnesses.resize(raw_inputs.len(), Vec::new());
        }

        let locktime = read_u32(&mut data)?;
        if !data.is_empty() {
            return Err(TxError::TrailingData(data.len()));
        }

        let inputs = raw_inputs
            .into_iter()
            .zip(witnesses)
            .map(|((prev_out, script_sig, sequence), witness)| {
                Input::match_raw(RawInput::new(prev_out, sequence, script_sig, witness))
            })
            .collect();

        Ok(Self {
            version,
            inputs,
            outputs,
            locktime,
        })
    }

    /// Double SHA-256 of the witness-stripped serialization.
    pub fn txid(&self) -> Txid {
        let hash = Sha256dHash::hash(&self.to_legacy_bytes());
        Txid::from_byte_array(hash.to_byte_array())
    }

    /// Copy of this transaction with input `index` replaced.
    pub fn with_input(&self, index: usize, input: Input) -> Result<Self, TxError> {
        if index >= self.inputs.len() {
            return Err(TxError::InputIndexOutOfRange {
                index,
                inputs: self.inputs.len(),
            });
        }
        let mut tx = self.clone();
        tx.inputs[index] = input;
        Ok(tx)
    }

    /// Applies `keep(input_index, signature)` to the signatures of every input.
    pub fn filter_signatures<F: Fn(usize, &SchnorrInputSignature) -> bool>(&self, keep: F) -> Self {
        let inputs = self
            .inputs
            .iter()
            .enumerate()
            .map(|(index, input)| input.filter_signatures(|sig| keep(index, sig)))
            .collect();
        Self {
            inputs,
            ..self.clone()
        }
    }

    /// True when every input is ready to broadcast.
    pub fn complete(&self) -> bool {
        self.inputs.iter().all(Input::complete)
    }
}
