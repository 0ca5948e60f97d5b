//! Capsule parser: drives the TLV scan and the inline hash check.
//!
//! States:
//!
//! ```text
//! Scanning --Hash field--> VerifyHash --match--> Scanning
//! Scanning --End field---> Terminated
//! Scanning --< 2 bytes---> Exhausted
//! ```
//!
//! After the loop the consumed length must equal the buffer length.

use crate::codec;
use crate::payload::{HeapAllocator, PayloadAllocator};
use crate::tlv::{FieldType, HEADER_LEN};
use crate::types::Capsule;
use crate::{hash_bytes, Check, Error, Result, SizeError};

/// End of the signed prefix: the position after the last field that is not
/// Hash, Signature or AuthorityId.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SignedRange {
    len: usize,
}

impl SignedRange {
    /// Record that a field of type `ty` ended at `pos`.
    pub fn advance(&mut self, ty: FieldType, pos: usize) {
        if !ty.is_trailer() {
            self.len = pos;
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn of<'a>(&self, buf: &'a [u8]) -> &'a [u8] {
        &buf[..self.len]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Scanning,
    VerifyHash,
    Terminated,
    Exhausted,
}

/// A successful scan.
#[derive(Debug)]
pub struct Decoded {
    pub capsule: Capsule,
    /// Length of the prefix covered by the hash.
    pub signed_len: usize,
    /// Bytes consumed; always the full buffer on success.
    pub consumed: usize,
    pub fields: usize,
}

/// Permissive decoder. Checks the hash if one is present, never a signature.
pub struct Decoder<'a> {
    alloc: &'a dyn PayloadAllocator,
}

impl Default for Decoder<'static> {
    fn default() -> Self {
        Decoder {
            alloc: &HeapAllocator,
        }
    }
}

impl Decoder<'static> {
    pub fn new() -> Self {
        Decoder::default()
    }
}

impl<'a> Decoder<'a> {
    pub fn with_allocator(alloc: &'a dyn PayloadAllocator) -> Self {
        Decoder { alloc }
    }

    pub fn parse(&self, buf: &[u8]) -> Result<Capsule> {
        self.decode(buf).map(|d| d.capsule)
    }

    #[tracing::instrument(level = "debug", skip_all, fields(len = buf.len()))]
    pub fn decode(&self, buf: &[u8]) -> Result<Decoded> {
        let mut capsule = Capsule::default();
        let mut signed = SignedRange::default();
        let mut state = State::Scanning;
        let mut pos = 0usize;
        let mut fields = 0usize;

        loop {
            match state {
                State::Scanning => {
                    if buf.len() - pos < HEADER_LEN {
                        state = State::Exhausted;
                        continue;
                    }
                    let ty = FieldType::from_byte(buf[pos]);
                    let len = buf[pos + 1] as usize;
                    let start = pos + HEADER_LEN;
                    let remaining = buf.len() - start;
                    if len > remaining {
                        return Err(Error::InvalidSize(SizeError::Overrun {
                            offset: pos,
                            declared: len,
                            remaining,
                        }));
                    }
                    codec::apply(&mut capsule, ty, &buf[start..start + len], self.alloc)?;
                    pos = start + len;
                    fields += 1;
                    signed.advance(ty, pos);
                    state = match ty {
                        FieldType::Hash => State::VerifyHash,
                        FieldType::End => State::Terminated,
                        _ => State::Scanning,
                    };
                }
                State::VerifyHash => {
                    let computed = hash_bytes(signed.of(buf));
                    if capsule.hash.as_deref() != Some(&computed) {
                        tracing::warn!(signed_len = signed.len(), "capsule hash mismatch");
                        return Err(Error::IntegrityMismatch(Check::Hash));
                    }
                    state = State::Scanning;
                }
                State::Terminated | State::Exhausted => break,
            }
        }

        if pos != buf.len() {
            let err = match state {
                State::Terminated => SizeError::TrailingData {
                    consumed: pos,
                    len: buf.len(),
                },
                _ => SizeError::Truncated { offset: pos },
            };
            return Err(Error::InvalidSize(err));
        }

        tracing::debug!(
            fields,
            signed_len = signed.len(),
            terminated = state == State::Terminated,
            "capsule decoded"
        );
        Ok(Decoded {
            capsule,
            signed_len: signed.len(),
            consumed: pos,
            fields,
        })
    }
}

/// Permissive parse with the heap allocator.
pub fn parse(buf: &[u8]) -> Result<Capsule> {
    Decoder::default().parse(buf)
}
