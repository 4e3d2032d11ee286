//! Shared fixtures: deterministic keys, a two-input spending transaction and its prevouts.

#![allow(dead_code)]

use bitcoin::hashes::Hash;

use tapsign::signature::x_only_public_key;
use tapsign::{Input, OutPoint, SigHashType, SigningKey, TapLeaf, Transaction, TxOut, Txid};

pub const SEQUENCE: u32 = 0xffff_fffd;

/// Deterministic key from a one-byte seed (any non-zero seed is a valid scalar).
pub fn signing_key(seed: u8) -> SigningKey {
    SigningKey::from_bytes((&[seed; 32][..]).into()).expect("fixed test key is valid")
}

pub fn x_only(key: &SigningKey) -> [u8; 32] {
    x_only_public_key(key)
}

pub fn outpoint(fill: u8, vout: u32) -> OutPoint {
    OutPoint {
        txid: Txid::from_byte_array([fill; 32]),
        vout,
    }
}

/// P2TR scriptPubKey: OP_1 <32-byte key>.
pub fn p2tr_script(x_only_key: &[u8; 32]) -> Vec<u8> {
    let mut script = vec![0x51, 0x20];
    script.extend_from_slice(x_only_key);
    script
}

/// `<key> OP_CHECKSIG` tapscript leaf.
pub fn checksig_leaf(key: &SigningKey) -> TapLeaf {
    let mut script = vec![0x20];
    script.extend_from_slice(&x_only(key));
    script.push(0xac);
    TapLeaf::new(script)
}

/// Control block with the given first byte and `nodes` proof hashes.
pub fn control_block(first: u8, nodes: usize) -> Vec<u8> {
    let mut cb = vec![first];
    cb.extend_from_slice(&x_only(&signing_key(0x77)));
    for i in 0..nodes {
        cb.extend_from_slice(&[0x30 + i as u8; 32]);
    }
    cb
}

/// Two P2TR prevouts with distinct amounts.
pub fn prevouts() -> Vec<TxOut> {
    vec![
        TxOut::new(50_000, p2tr_script(&x_only(&signing_key(0x01)))),
        TxOut::new(75_000, p2tr_script(&x_only(&signing_key(0x02)))),
    ]
}

/// Version 2 transaction spending `inputs` into two outputs.
pub fn spending_tx(inputs: Vec<Input>) -> Transaction {
    let mut p2wpkh = vec![0x00, 0x14];
    p2wpkh.extend_from_slice(&[0xab; 20]);
    Transaction::new(
        2,
        inputs,
        vec![
            TxOut::new(60_000, p2tr_script(&x_only(&signing_key(0x03)))),
            TxOut::new(64_000, p2wpkh),
        ],
        800_000,
    )
}

pub fn hash_type(value: u8) -> SigHashType {
    if value == 0 {
        SigHashType::default_type()
    } else {
        SigHashType::from_value(value).expect("whitelisted sighash value")
    }
}

/// Every explicit value that does not use the ANYPREVOUT field, plus DEFAULT.
pub const STANDARD_HASH_TYPES: [u8; 7] = [0x00, 0x01, 0x02, 0x03, 0x81, 0x82, 0x83];
