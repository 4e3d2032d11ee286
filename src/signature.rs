//! Schnorr input signatures: 64-byte BIP-340 signature plus the sighash type it commits to.
//!
//! Wire form is `sig || hash_type`, except for DEFAULT where the hash-type byte is omitted.

use alloc::vec::Vec;
use core::fmt;

use k256::schnorr::signature::hazmat::{PrehashSigner, PrehashVerifier};
use k256::schnorr::{Signature, SigningKey, VerifyingKey};

use crate::error::TxError;
use crate::sighash_type::SigHashType;

pub const SCHNORR_SIGNATURE_SIZE: usize = 64;

/// A signature as it appears in a Taproot witness.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SchnorrInputSignature {
    signature: [u8; SCHNORR_SIGNATURE_SIZE],
    hash_type: SigHashType,
}

impl SchnorrInputSignature {
    pub const fn new(signature: [u8; SCHNORR_SIGNATURE_SIZE], hash_type: SigHashType) -> Self {
        Self {
            signature,
            hash_type,
        }
    }

    /// Parses a witness element. 64 bytes is DEFAULT; 65 bytes carries an explicit,
    /// whitelisted hash type (an explicit 0x00 is rejected).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TxError> {
        let (sig, hash_type) = match bytes.len() {
            SCHNORR_SIGNATURE_SIZE => (bytes, SigHashType::default_type()),
            65 => {
                let byte = bytes[SCHNORR_SIGNATURE_SIZE];
                let hash_type = SigHashType::from_value(byte)
                    .map_err(|_| TxError::InvalidSignatureHashByte(byte))?;
                (&bytes[..SCHNORR_SIGNATURE_SIZE], hash_type)
            }
            len => return Err(TxError::InvalidSignatureLength(len)),
        };
        let mut signature = [0u8; SCHNORR_SIGNATURE_SIZE];
        signature.copy_from_slice(sig);
        Ok(Self {
            signature,
            hash_type,
        })
    }

    /// Witness encoding.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len());
        out.extend_from_slice(&self.signature);
        if !self.hash_type.is_default() {
            out.push(self.hash_type.value());
        }
        out
    }

    pub const fn encoded_len(&self) -> usize {
        if self.hash_type.is_default() {
            SCHNORR_SIGNATURE_SIZE
        } else {
            SCHNORR_SIGNATURE_SIZE + 1
        }
    }

    pub const fn signature(&self) -> &[u8; SCHNORR_SIGNATURE_SIZE] {
        &self.signature
    }

    pub const fn hash_type(&self) -> SigHashType {
        self.hash_type
    }

    /// Checks the signature against `digest` (the sighash it was made over).
    pub fn verify(&self, pubkey_x: &[u8; 32], digest: &[u8; 32]) -> Result<(), TxError> {
        verify_schnorr_bip340(pubkey_x, digest, &self.signature)
    }
}

impl fmt::Debug for SchnorrInputSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SchnorrInputSignature(")?;
        for b in self.signature.iter() {
            write!(f, "{:02x}", b)?;
        }
        write!(f, ", {})", self.hash_type)
    }
}

/// BIP-340 signature over a 32-byte digest (zero auxiliary randomness, deterministic).
pub fn sign_digest(
    key: &SigningKey,
    digest: &[u8; 32],
) -> Result<[u8; SCHNORR_SIGNATURE_SIZE], TxError> {
    let sig: Signature = key
        .sign_prehash(digest)
        .map_err(|_| TxError::SigningFailed)?;
    Ok(sig.to_bytes())
}

/// Verifies a 64-byte BIP-340 Schnorr signature over a 32-byte digest with the given x-only key.
pub fn verify_schnorr_bip340(
    pubkey_x: &[u8; 32],
    digest: &[u8; 32],
    sig_bytes: &[u8; SCHNORR_SIGNATURE_SIZE],
) -> Result<(), TxError> {
    let verifying_key =
        VerifyingKey::from_bytes(pubkey_x).map_err(|_| TxError::InvalidPublicKey)?;
    let signature =
        Signature::try_from(sig_bytes.as_slice()).map_err(|_| TxError::InvalidSignature)?;
    verifying_key
        .verify_prehash(digest, &signature)
        .map_err(|_| TxError::InvalidSignature)
}

/// X-only public key of a signing key.
pub fn x_only_public_key(key: &SigningKey) -> [u8; 32] {
    key.verifying_key().to_bytes().into()
}

#[cfg(feature = "serde")]
mod serde_impl {
    use alloc::string::String;

    use super::SchnorrInputSignature;

    impl serde::Serialize for SchnorrInputSignature {
        fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            serializer.serialize_str(&hex::encode(self.to_bytes()))
        }
    }

    impl<'de> serde::Deserialize<'de> for SchnorrInputSignature {
        fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            let s = <String as serde::Deserialize>::deserialize(deserializer)?;
            let bytes = hex::decode(s).map_err(serde::de::Error::custom)?;
            SchnorrInputSignature::from_bytes(&bytes).map_err(serde::de::Error::custom)
        }
    }
}
