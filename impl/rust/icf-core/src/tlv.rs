//! TLV type codes and their length rules.

use crate::{AUTHORITY_ID_LEN, HASH_LEN, SIGNATURE_LEN};

/// Longest URL value, in bytes.
pub const URL_MAX: usize = 200;
/// Longest title value, in bytes.
pub const TITLE_MAX: usize = 64;
/// Every TLV header is one type byte and one length byte.
pub const HEADER_LEN: usize = 2;
/// A one-byte length caps every value.
pub const VALUE_MAX: usize = u8::MAX as usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    Url,
    Language,
    Title,
    Tag,
    Retention,
    Expires,
    BadgeType,
    SysPayload,
    Hash,
    Signature,
    AuthorityId,
    End,
    /// Not reserved; skipped by the decoder.
    Unknown(u8),
}

/// Allowed value length for a field type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LenRule {
    Exactly(usize),
    AtMost(usize),
}

impl LenRule {
    pub fn admits(self, len: usize) -> bool {
        match self {
            LenRule::Exactly(n) => len == n,
            LenRule::AtMost(n) => len <= n,
        }
    }
}

impl FieldType {
    pub const fn from_byte(b: u8) -> Self {
        match b {
            0x01 => FieldType::Url,
            0x02 => FieldType::Language,
            0x03 => FieldType::Title,
            0x04 => FieldType::Tag,
            0x05 => FieldType::Retention,
            0x06 => FieldType::Expires,
            0xE0 => FieldType::BadgeType,
            0xE1 => FieldType::SysPayload,
            0xF2 => FieldType::Hash,
            0xF3 => FieldType::Signature,
            0xF4 => FieldType::AuthorityId,
            0xFF => FieldType::End,
            other => FieldType::Unknown(other),
        }
    }

    pub const fn code(self) -> u8 {
        match self {
            FieldType::Url => 0x01,
            FieldType::Language => 0x02,
            FieldType::Title => 0x03,
            FieldType::Tag => 0x04,
            FieldType::Retention => 0x05,
            FieldType::Expires => 0x06,
            FieldType::BadgeType => 0xE0,
            FieldType::SysPayload => 0xE1,
            FieldType::Hash => 0xF2,
            FieldType::Signature => 0xF3,
            FieldType::AuthorityId => 0xF4,
            FieldType::End => 0xFF,
            FieldType::Unknown(b) => b,
        }
    }

    pub fn len_rule(self) -> LenRule {
        match self {
            FieldType::Url => LenRule::AtMost(URL_MAX),
            FieldType::Language => LenRule::Exactly(2),
            FieldType::Title => LenRule::AtMost(TITLE_MAX),
            FieldType::Tag => LenRule::Exactly(3),
            FieldType::Retention => LenRule::Exactly(1),
            FieldType::Expires => LenRule::Exactly(4),
            FieldType::BadgeType => LenRule::Exactly(1),
            FieldType::SysPayload | FieldType::Unknown(_) => LenRule::AtMost(VALUE_MAX),
            FieldType::Hash => LenRule::Exactly(HASH_LEN),
            FieldType::Signature => LenRule::Exactly(SIGNATURE_LEN),
            FieldType::AuthorityId => LenRule::Exactly(AUTHORITY_ID_LEN),
            FieldType::End => LenRule::Exactly(0),
        }
    }

    /// Hash, Signature and AuthorityId sit outside the signed range.
    pub fn is_trailer(self) -> bool {
        matches!(
            self,
            FieldType::Hash | FieldType::Signature | FieldType::AuthorityId
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            FieldType::Url => "url",
            FieldType::Language => "language",
            FieldType::Title => "title",
            FieldType::Tag => "tag",
            FieldType::Retention => "retention",
            FieldType::Expires => "expires",
            FieldType::BadgeType => "badge_type",
            FieldType::SysPayload => "sys_payload",
            FieldType::Hash => "hash",
            FieldType::Signature => "signature",
            FieldType::AuthorityId => "authority_id",
            FieldType::End => "end",
            FieldType::Unknown(_) => "unknown",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_byte_maps_back_to_itself() {
        for b in 0..=u8::MAX {
            assert_eq!(FieldType::from_byte(b).code(), b);
        }
    }

    #[test]
    fn reserved_codes() {
        assert_eq!(FieldType::from_byte(0xF2), FieldType::Hash);
        assert_eq!(FieldType::from_byte(0xFF), FieldType::End);
        assert_eq!(FieldType::from_byte(0x7A), FieldType::Unknown(0x7A));
        assert_eq!(FieldType::from_byte(0x00), FieldType::Unknown(0x00));
    }

    #[test]
    fn trailer_fields() {
        assert!(FieldType::Hash.is_trailer());
        assert!(FieldType::Signature.is_trailer());
        assert!(FieldType::AuthorityId.is_trailer());
        assert!(!FieldType::End.is_trailer());
        assert!(!FieldType::Unknown(0xF5).is_trailer());
    }

    #[test]
    fn len_rules() {
        assert!(FieldType::Url.len_rule().admits(200));
        assert!(!FieldType::Url.len_rule().admits(201));
        assert!(FieldType::Title.len_rule().admits(0));
        assert!(!FieldType::Title.len_rule().admits(65));
        assert!(!FieldType::End.len_rule().admits(1));
    }
}
