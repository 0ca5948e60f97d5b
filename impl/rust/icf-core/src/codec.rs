//! Field codec: validate one TLV value and store it in the capsule.
//!
//! Later occurrences of a field overwrite earlier ones.

use crate::payload::{Payload, PayloadAllocator};
use crate::tlv::FieldType;
use crate::types::{AuthorityId, BadgeType, Capsule, Tag};
use crate::{Error, Result};

/// Check `value` against the length rule of `ty`.
pub fn check_len(ty: FieldType, len: usize) -> Result<()> {
    if ty.len_rule().admits(len) {
        Ok(())
    } else {
        Err(Error::field_len(ty, len))
    }
}

/// Decode `value` as a field of type `ty` into `capsule`.
///
/// End and unknown types leave the capsule untouched; the dispatcher owns
/// their control-flow meaning.
pub fn apply(
    capsule: &mut Capsule,
    ty: FieldType,
    value: &[u8],
    alloc: &dyn PayloadAllocator,
) -> Result<()> {
    if let FieldType::Unknown(_) = ty {
        return Ok(());
    }
    check_len(ty, value.len())?;
    match ty {
        FieldType::Url => capsule.url.set(value),
        FieldType::Language => capsule.language = Some(fixed(value)),
        FieldType::Title => capsule.title.set(value),
        FieldType::Tag => capsule.tag = Tag::from_bytes(fixed(value)),
        FieldType::Retention => capsule.retention = value[0],
        FieldType::Expires => capsule.expires = u32::from_be_bytes(fixed(value)),
        FieldType::BadgeType => capsule.badge_type = BadgeType::from_byte(value[0]),
        FieldType::SysPayload => {
            let payload = Payload::copy_in(value, alloc).ok_or(Error::NoMemory {
                requested: value.len(),
            })?;
            capsule.payload = Some(payload);
        }
        FieldType::Hash => capsule.hash = Some(boxed(value)),
        FieldType::Signature => capsule.signature = Some(boxed(value)),
        FieldType::AuthorityId => capsule.authority = Some(AuthorityId(fixed(value))),
        FieldType::End | FieldType::Unknown(_) => {}
    }
    Ok(())
}

// Length already checked by `check_len`.
fn fixed<const N: usize>(value: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(value);
    out
}

// Copied straight into the heap, no stack staging.
fn boxed<const N: usize>(value: &[u8]) -> Box<[u8; N]> {
    let mut out = Box::new([0u8; N]);
    out.copy_from_slice(value);
    out
}
