//! `icf-core`: decoder for ICF badge capsules.
//!
//! A capsule is a flat run of TLV fields:
//!
//! ```text
//! capsule := field*
//! field   := type:u8 length:u8 value:u8[length]
//! ```
//!
//! Decoding copies every retained value out of the input buffer, tracks the
//! signed prefix (everything before the Hash/Signature/AuthorityId trailer)
//! and checks the declared SHA-256 the moment the Hash field is consumed.
//! Signature checking lives one layer up, in `icf_capsule`.

use sha2::{Digest, Sha256};

pub mod codec;
pub mod encode;
pub mod parser;
pub mod payload;
pub mod tlv;
pub mod types;

pub use encode::CapsuleWriter;
pub use parser::{parse, Decoded, Decoder};
pub use payload::{HeapAllocator, Payload, PayloadAllocator};
pub use tlv::FieldType;
pub use types::*;

/// SHA-256 digest length; also the Hash field length.
pub const HASH_LEN: usize = 32;
/// Detached signature length.
pub const SIGNATURE_LEN: usize = 64;
/// Authority identifier length.
pub const AUTHORITY_ID_LEN: usize = 8;
/// Public key length handed to signature verifiers.
pub const PUBLIC_KEY_LEN: usize = 32;

/// Why a length was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeError {
    /// A field value has a length its type does not allow.
    FieldLength { field: FieldType, len: usize },
    /// A declared value length runs past the end of the buffer.
    Overrun {
        offset: usize,
        declared: usize,
        remaining: usize,
    },
    /// The buffer ended inside a field header.
    Truncated { offset: usize },
    /// Bytes follow a consumed End field.
    TrailingData { consumed: usize, len: usize },
}

impl std::fmt::Display for SizeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SizeError::FieldLength { field, len } => {
                write!(f, "{} field has invalid length {len}", field.name())
            }
            SizeError::Overrun {
                offset,
                declared,
                remaining,
            } => write!(
                f,
                "field at offset {offset} declares {declared} bytes, {remaining} remain"
            ),
            SizeError::Truncated { offset } => {
                write!(f, "buffer ends inside a field header at offset {offset}")
            }
            SizeError::TrailingData { consumed, len } => {
                write!(f, "{} trailing bytes after End", len - consumed)
            }
        }
    }
}

/// Which integrity check failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Check {
    Hash,
    Signature,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("InvalidArgument: {0}")]
    InvalidArgument(&'static str),
    #[error("InvalidSize: {0}")]
    InvalidSize(SizeError),
    #[error("NoMemory: could not allocate {requested} payload bytes")]
    NoMemory { requested: usize },
    #[error("IntegrityMismatch({0:?})")]
    IntegrityMismatch(Check),
    #[error("MissingRequiredField({0})")]
    MissingRequiredField(&'static str),
    #[error("AuthorityUnresolved({0})")]
    AuthorityUnresolved(AuthorityId),
}

impl Error {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Error::InvalidArgument(_) => "Err.ICF.InvalidArgument",
            Error::InvalidSize(_) => "Err.ICF.InvalidSize",
            Error::NoMemory { .. } => "Err.ICF.NoMemory",
            Error::IntegrityMismatch(_) => "Err.ICF.IntegrityMismatch",
            Error::MissingRequiredField(_) => "Err.ICF.MissingRequiredField",
            Error::AuthorityUnresolved(_) => "Err.ICF.AuthorityUnresolved",
        }
    }

    pub(crate) fn field_len(field: FieldType, len: usize) -> Self {
        Error::InvalidSize(SizeError::FieldLength { field, len })
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// SHA-256 of `data`.
pub fn hash_bytes(data: &[u8]) -> [u8; HASH_LEN] {
    Sha256::digest(data).into()
}

// --- Fuzz-only exposure (feature: fuzz_expose) ---
#[cfg(feature = "fuzz_expose")]
pub fn _fuzz_apply_field(ty: u8, value: &[u8]) -> Result<()> {
    let mut capsule = Capsule::default();
    codec::apply(
        &mut capsule,
        FieldType::from_byte(ty),
        value,
        &HeapAllocator,
    )
}
