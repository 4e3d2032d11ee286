// src/error.rs

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TxError {
    /// The byte is not one of the whitelisted sighash values.
    InvalidSigHashValue(u8),

    /// A Schnorr input signature must be 64 bytes (DEFAULT) or 65 bytes (explicit hash type).
    InvalidSignatureLength(usize),

    /// The trailing hash-type byte of a 65-byte signature is not a valid explicit sighash value.
    InvalidSignatureHashByte(u8),

    /// The input variant requires a sighash flag the signature does not carry.
    /// (Required flag pattern, Found hash type)
    MissingSigHashFlag { required: u8, found: u8 },

    /// The hash type carries an ANYPREVOUT field value the input variant does not accept.
    ForbiddenSigHashFlag(u8),

    /// Text form of a hash type names an unknown mode or flag.
    InvalidSigHashName,

    /// Control block length is not 33 + 32 * n with n <= 128.
    InvalidControlBlock(usize),

    /// Leaf version byte (parity masked) is not the tapscript version.
    InvalidLeafVersion(u8),

    /// Signing input index is outside the transaction inputs.
    InputIndexOutOfRange { index: usize, inputs: usize },

    /// The hash type needs more previous outputs than were supplied.
    MissingPrevouts { required: usize, found: usize },

    /// SIGHASH_SINGLE used on an input without a corresponding output.
    SingleWithoutOutput { index: usize, outputs: usize },

    /// The Schnorr signer rejected the digest.
    SigningFailed,

    /// BIP-340 verification failed.
    InvalidSignature,

    /// The x-only public key is not a valid curve point.
    InvalidPublicKey,

    /// Unknown witness shapes cannot be signed or re-signed.
    UnsignableInput,

    /// The data stream ended before the transaction could be fully read.
    IncompleteData,

    /// CompactSize was not minimally encoded.
    NonCanonicalCompactSize,

    /// Segwit marker was present but the flag byte was not 0x01.
    InvalidSegwitFlag(u8),

    /// Segwit serialization where every witness stack is empty.
    EmptyWitnessTransaction,

    /// Bytes left over after a full transaction parse.
    TrailingData(usize),
}

// Manual implementation of Display for no_std environments.
impl core::fmt::Display for TxError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::InvalidSigHashValue(v) => write!(f, "Invalid sighash value: 0x{:02x}", v),
            Self::InvalidSignatureLength(len) => write!(
                f,
                "Invalid input signature length: {} (expected 64 or 65)",
                len
            ),
            Self::InvalidSignatureHashByte(b) => {
                write!(f, "Invalid input signature hash type byte: 0x{:02x}", b)
            }
            Self::MissingSigHashFlag { required, found } => write!(
                f,
                "Sighash flag 0x{:02x} required, found hash type 0x{:02x}",
                required, found
            ),
            Self::ForbiddenSigHashFlag(v) => write!(
                f,
                "Hash type 0x{:02x} carries an ANYPREVOUT flag not allowed for this input",
                v
            ),
            Self::InvalidSigHashName => write!(f, "Unknown sighash type name"),
            Self::InvalidControlBlock(len) => write!(f, "Invalid control block size: {}", len),
            Self::InvalidLeafVersion(v) => write!(f, "Invalid leaf version: 0x{:02x}", v),
            Self::InputIndexOutOfRange { index, inputs } => write!(
                f,
                "Input index {} out of range ({} inputs)",
                index, inputs
            ),
            Self::MissingPrevouts { required, found } => write!(
                f,
                "Missing previous outputs: {} required, {} supplied",
                required, found
            ),
            Self::SingleWithoutOutput { index, outputs } => write!(
                f,
                "SIGHASH_SINGLE on input {} without corresponding output ({} outputs)",
                index, outputs
            ),
            Self::SigningFailed => write!(f, "Schnorr signing failed"),
            Self::InvalidSignature => write!(f, "Schnorr signature verification failed"),
            Self::InvalidPublicKey => write!(f, "Invalid x-only public key"),
            Self::UnsignableInput => write!(f, "Input with unknown witness cannot be signed"),
            Self::IncompleteData => write!(f, "Incomplete transaction data"),
            Self::NonCanonicalCompactSize => write!(f, "Non-canonical CompactSize"),
            Self::InvalidSegwitFlag(v) => write!(f, "Invalid segwit flag: 0x{:02x}", v),
            Self::EmptyWitnessTransaction => {
                write!(f, "Segwit serialization without any witness data")
            }
            Self::TrailingData(n) => write!(f, "Trailing data: {} bytes left after parse", n),
        }
    }
}

// Enable standard Error trait if the "std" feature is on.
#[cfg(feature = "std")]
impl std::error::Error for TxError {}
