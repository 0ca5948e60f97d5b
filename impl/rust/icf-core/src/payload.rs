//! Owned system payload.
//!
//! The bytes live in a [`Zeroizing`] buffer: whichever path drops a
//! `Payload`, the memory is wiped before it goes back to the allocator.

use std::fmt;

use zeroize::{Zeroize, Zeroizing};

#[derive(Clone, PartialEq, Eq)]
pub struct Payload(Zeroizing<Vec<u8>>);

impl Payload {
    pub fn from_slice(bytes: &[u8]) -> Self {
        Payload(Zeroizing::new(bytes.to_vec()))
    }

    /// Copy `bytes` into a buffer obtained from `alloc`.
    /// `None` if the allocator could not provide room for them.
    pub fn copy_in(bytes: &[u8], alloc: &dyn PayloadAllocator) -> Option<Self> {
        let mut buf = Zeroizing::new(alloc.allocate(bytes.len())?);
        if buf.capacity() < bytes.len() {
            return None;
        }
        buf.clear();
        buf.extend_from_slice(bytes);
        Some(Payload(buf))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Zero the bytes in place; the length is kept.
    pub(crate) fn wipe(&mut self) {
        self.0.as_mut_slice().zeroize();
    }

    /// Parse as JSON. A payload that is not JSON has no structured form.
    pub fn to_json(&self) -> Option<serde_json::Value> {
        match serde_json::from_slice(&self.0) {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::debug!(error = %e, len = self.len(), "payload is not JSON");
                None
            }
        }
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Payload({} bytes)", self.len())
    }
}

/// Source of payload buffers.
///
/// Returns an empty vector with capacity for at least `len` bytes, or `None`
/// when memory is unavailable.
pub trait PayloadAllocator {
    fn allocate(&self, len: usize) -> Option<Vec<u8>>;
}

/// Fallible heap allocation.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeapAllocator;

impl PayloadAllocator for HeapAllocator {
    fn allocate(&self, len: usize) -> Option<Vec<u8>> {
        let mut v = Vec::new();
        v.try_reserve_exact(len).ok()?;
        Some(v)
    }
}
