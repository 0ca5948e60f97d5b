//! Capsule writer, the encoding side of the codec.
//!
//! Applies the same length rules the decoder enforces and tracks the signed
//! range the same way, so `seal_hash` covers exactly what the decoder will
//! hash.

use crate::codec::check_len;
use crate::parser::SignedRange;
use crate::tlv::{FieldType, VALUE_MAX};
use crate::types::{AuthorityId, BadgeType, Tag};
use crate::{hash_bytes, Error, Result, SizeError, HASH_LEN, SIGNATURE_LEN};

#[derive(Debug, Clone, Default)]
pub struct CapsuleWriter {
    buf: Vec<u8>,
    signed: SignedRange,
}

impl CapsuleWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field of a known type, enforcing its length rule.
    pub fn field(&mut self, ty: FieldType, value: &[u8]) -> Result<&mut Self> {
        check_len(ty, value.len())?;
        self.push(ty, value);
        Ok(self)
    }

    /// Append a field with an arbitrary type code. Only the one-byte length
    /// limit is enforced.
    pub fn raw(&mut self, code: u8, value: &[u8]) -> Result<&mut Self> {
        if value.len() > VALUE_MAX {
            return Err(Error::InvalidSize(SizeError::FieldLength {
                field: FieldType::from_byte(code),
                len: value.len(),
            }));
        }
        self.push(FieldType::from_byte(code), value);
        Ok(self)
    }

    pub fn url(&mut self, url: &str) -> Result<&mut Self> {
        self.field(FieldType::Url, url.as_bytes())
    }

    pub fn language(&mut self, code: &str) -> Result<&mut Self> {
        self.field(FieldType::Language, code.as_bytes())
    }

    pub fn title(&mut self, title: &str) -> Result<&mut Self> {
        self.field(FieldType::Title, title.as_bytes())
    }

    pub fn tag(&mut self, tag: Tag) -> Result<&mut Self> {
        self.field(FieldType::Tag, &tag.to_bytes())
    }

    pub fn retention(&mut self, retention: u8) -> Result<&mut Self> {
        self.field(FieldType::Retention, &[retention])
    }

    pub fn expires(&mut self, expires: u32) -> Result<&mut Self> {
        self.field(FieldType::Expires, &expires.to_be_bytes())
    }

    pub fn badge_type(&mut self, badge: BadgeType) -> Result<&mut Self> {
        self.field(FieldType::BadgeType, &[badge.to_byte()])
    }

    pub fn payload(&mut self, payload: &[u8]) -> Result<&mut Self> {
        self.field(FieldType::SysPayload, payload)
    }

    /// Hash the signed range written so far and append it as the Hash field.
    pub fn seal_hash(&mut self) -> [u8; HASH_LEN] {
        let hash = hash_bytes(self.signed.of(&self.buf));
        self.push(FieldType::Hash, &hash);
        hash
    }

    pub fn signature(&mut self, sig: &[u8; SIGNATURE_LEN]) -> &mut Self {
        self.push(FieldType::Signature, sig);
        self
    }

    pub fn authority(&mut self, id: AuthorityId) -> &mut Self {
        self.push(FieldType::AuthorityId, id.as_bytes());
        self
    }

    pub fn end(&mut self) -> &mut Self {
        self.push(FieldType::End, &[]);
        self
    }

    pub fn signed_len(&self) -> usize {
        self.signed.len()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn finish(self) -> Vec<u8> {
        self.buf
    }

    fn push(&mut self, ty: FieldType, value: &[u8]) {
        self.buf.push(ty.code());
        self.buf.push(value.len() as u8);
        self.buf.extend_from_slice(value);
        self.signed.advance(ty, self.buf.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Decoder;
    use crate::types::{Cycle, Subject};

    #[test]
    fn writes_wire_layout() {
        let mut w = CapsuleWriter::new();
        w.url("abc").unwrap().end();
        assert_eq!(w.as_bytes(), &[0x01, 0x03, b'a', b'b', b'c', 0xFF, 0x00]);
    }

    #[test]
    fn enforces_length_rules() {
        let mut w = CapsuleWriter::new();
        assert!(w.language("fra").is_err());
        assert!(w.url(&"u".repeat(201)).is_err());
        assert!(w.raw(0x7A, &[0u8; 256]).is_err());
        assert!(w.as_bytes().is_empty());
    }

    #[test]
    fn sealed_output_decodes() {
        let mut w = CapsuleWriter::new();
        w.url("https://ex.org/b/42")
            .unwrap()
            .language("en")
            .unwrap()
            .title("Volcanoes")
            .unwrap()
            .tag(Tag {
                cycle: Cycle::Cycle3,
                subject: Subject::Science,
                sub: 4,
            })
            .unwrap()
            .expires(3600)
            .unwrap()
            .payload(br#"{"volume":42}"#)
            .unwrap();
        let signed_len = w.signed_len();
        let hash = w.seal_hash();
        w.signature(&[0x11; SIGNATURE_LEN])
            .authority(AuthorityId([9; 8]))
            .end();
        assert_eq!(hash, hash_bytes(&w.as_bytes()[..signed_len]));

        let d = Decoder::default().decode(w.as_bytes()).unwrap();
        assert_eq!(d.signed_len, w.signed_len());
        assert_eq!(d.capsule.title, "Volcanoes");
        assert_eq!(d.capsule.tag.subject, Subject::Science);
        assert_eq!(d.capsule.expires, 3600);
        assert_eq!(d.capsule.hash.as_deref(), Some(&hash));
        assert_eq!(
            d.capsule.payload_json(),
            Some(serde_json::json!({"volume": 42}))
        );
    }
}
