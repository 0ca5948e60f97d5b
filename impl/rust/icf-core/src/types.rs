//! Core types for ICF capsules.

use std::fmt;
use std::str::FromStr;

use zeroize::Zeroize;

use crate::payload::Payload;
use crate::{AUTHORITY_ID_LEN, HASH_LEN, SIGNATURE_LEN};

/// A decoded capsule. Every retained byte is copied out of the input.
///
/// Dropping a capsule runs [`Capsule::release`], so the payload, hash and
/// signature never outlive it unzeroed. All three live on the heap, so moving
/// a capsule copies pointers, never their bytes.
#[derive(Debug, Default)]
pub struct Capsule {
    pub badge_type: BadgeType,
    pub url: Text,
    /// ISO 639-1 code, exactly two bytes when present.
    pub language: Option<[u8; 2]>,
    pub title: Text,
    pub tag: Tag,
    pub retention: u8,
    /// Seconds; surfaced raw, never enforced.
    pub expires: u32,
    pub payload: Option<Payload>,
    pub hash: Option<Box<[u8; HASH_LEN]>>,
    pub signature: Option<Box<[u8; SIGNATURE_LEN]>>,
    pub authority: Option<AuthorityId>,
}

impl Capsule {
    pub fn has_hash(&self) -> bool {
        self.hash.is_some()
    }

    pub fn has_signature(&self) -> bool {
        self.signature.is_some()
    }

    pub fn has_authority(&self) -> bool {
        self.authority.is_some()
    }

    pub fn language_code(&self) -> Option<&str> {
        self.language
            .as_ref()
            .and_then(|l| std::str::from_utf8(l).ok())
    }

    /// The payload parsed as JSON. `None` when absent or not valid JSON.
    pub fn payload_json(&self) -> Option<serde_json::Value> {
        self.payload.as_ref().and_then(Payload::to_json)
    }

    /// Zero and drop the payload, zero the hash and signature and clear their
    /// presence. Safe to call any number of times, on any capsule.
    pub fn release(&mut self) {
        self.wipe();
        self.payload = None;
        self.hash = None;
        self.signature = None;
    }

    /// Zero payload, hash and signature in place, keeping their presence.
    pub(crate) fn wipe(&mut self) {
        if let Some(payload) = self.payload.as_mut() {
            payload.wipe();
        }
        if let Some(hash) = self.hash.as_deref_mut() {
            hash.zeroize();
        }
        if let Some(sig) = self.signature.as_deref_mut() {
            sig.zeroize();
        }
    }
}

impl Drop for Capsule {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Display for Capsule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Badge type: {}", self.badge_type)?;
        if !self.url.is_empty() {
            writeln!(f, "URL: {}", self.url)?;
        }
        if let Some(lang) = &self.language {
            writeln!(f, "Language: {}", String::from_utf8_lossy(lang))?;
        }
        if !self.title.is_empty() {
            writeln!(f, "Title: {}", self.title)?;
        }
        writeln!(f, "Tag: {}", self.tag)?;
        if self.retention != 0 {
            writeln!(f, "Retention: {}", self.retention)?;
        }
        if self.expires != 0 {
            writeln!(f, "Expires: {}", self.expires)?;
        }
        if let Some(p) = &self.payload {
            writeln!(
                f,
                "Payload ({} bytes): {}",
                p.len(),
                String::from_utf8_lossy(p.as_bytes())
            )?;
        }
        if let Some(id) = &self.authority {
            writeln!(f, "AuthorityID: {id}")?;
        }
        if self.has_signature() {
            writeln!(f, "Signature present")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Text
// ---------------------------------------------------------------------------

/// Bounded text copied verbatim off the wire. Not guaranteed to be UTF-8.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Text(Vec<u8>);

impl Text {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.0).ok()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn set(&mut self, value: &[u8]) {
        self.0.clear();
        self.0.extend_from_slice(value);
    }
}

impl From<&str> for Text {
    fn from(s: &str) -> Self {
        Text(s.as_bytes().to_vec())
    }
}

impl PartialEq<str> for Text {
    fn eq(&self, other: &str) -> bool {
        self.0 == other.as_bytes()
    }
}

impl PartialEq<&str> for Text {
    fn eq(&self, other: &&str) -> bool {
        self.0 == other.as_bytes()
    }
}

impl fmt::Display for Text {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.0))
    }
}

impl fmt::Debug for Text {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", String::from_utf8_lossy(&self.0))
    }
}

// ---------------------------------------------------------------------------
// Authority identifier
// ---------------------------------------------------------------------------

/// Eight-byte identifier of the authority that sealed a capsule.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AuthorityId(pub [u8; AUTHORITY_ID_LEN]);

impl AuthorityId {
    pub fn as_bytes(&self) -> &[u8; AUTHORITY_ID_LEN] {
        &self.0
    }
}

impl fmt::Display for AuthorityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode_upper(self.0))
    }
}

impl fmt::Debug for AuthorityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AuthorityId({self})")
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("authority id must be {} hex digits", AUTHORITY_ID_LEN * 2)]
pub struct ParseAuthorityIdError;

impl FromStr for AuthorityId {
    type Err = ParseAuthorityIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s.trim()).map_err(|_| ParseAuthorityIdError)?;
        let arr: [u8; AUTHORITY_ID_LEN] = bytes.try_into().map_err(|_| ParseAuthorityIdError)?;
        Ok(AuthorityId(arr))
    }
}

// ---------------------------------------------------------------------------
// Badge type
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum BadgeType {
    #[default]
    Resource,
    Configuration,
    Admin,
    Unrecognized(u8),
}

impl BadgeType {
    pub const fn from_byte(b: u8) -> Self {
        match b {
            0x00 => BadgeType::Resource,
            0x01 => BadgeType::Configuration,
            0x02 => BadgeType::Admin,
            other => BadgeType::Unrecognized(other),
        }
    }

    pub const fn to_byte(self) -> u8 {
        match self {
            BadgeType::Resource => 0x00,
            BadgeType::Configuration => 0x01,
            BadgeType::Admin => 0x02,
            BadgeType::Unrecognized(b) => b,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BadgeType::Resource => "resource",
            BadgeType::Configuration => "configuration",
            BadgeType::Admin => "admin",
            BadgeType::Unrecognized(_) => "unrecognized",
        }
    }
}

impl fmt::Display for BadgeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BadgeType::Unrecognized(b) => write!(f, "unrecognized({b:#04x})"),
            other => f.write_str(other.as_str()),
        }
    }
}

// ---------------------------------------------------------------------------
// Pedagogical tag
// ---------------------------------------------------------------------------

/// School cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Cycle {
    #[default]
    Undefined,
    /// Nursery school.
    Cycle1,
    Cycle2,
    Cycle3,
    Cycle4,
    Local,
    Reserved,
    Unrecognized(u8),
}

impl Cycle {
    pub const fn from_byte(b: u8) -> Self {
        match b {
            0x00 => Cycle::Undefined,
            0x01 => Cycle::Cycle1,
            0x02 => Cycle::Cycle2,
            0x03 => Cycle::Cycle3,
            0x04 => Cycle::Cycle4,
            0xFE => Cycle::Local,
            0xFF => Cycle::Reserved,
            other => Cycle::Unrecognized(other),
        }
    }

    pub const fn to_byte(self) -> u8 {
        match self {
            Cycle::Undefined => 0x00,
            Cycle::Cycle1 => 0x01,
            Cycle::Cycle2 => 0x02,
            Cycle::Cycle3 => 0x03,
            Cycle::Cycle4 => 0x04,
            Cycle::Local => 0xFE,
            Cycle::Reserved => 0xFF,
            Cycle::Unrecognized(b) => b,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Cycle::Undefined => "undefined",
            Cycle::Cycle1 => "cycle1",
            Cycle::Cycle2 => "cycle2",
            Cycle::Cycle3 => "cycle3",
            Cycle::Cycle4 => "cycle4",
            Cycle::Local => "local",
            Cycle::Reserved => "reserved",
            Cycle::Unrecognized(_) => "unrecognized",
        }
    }
}

/// Subject taught.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Subject {
    #[default]
    Undefined,
    Reading,
    Science,
    Music,
    /// Foreign languages.
    Foreign,
    Project,
    Math,
    Civic,
    Local,
    Reserved,
    Unrecognized(u8),
}

impl Subject {
    pub const fn from_byte(b: u8) -> Self {
        match b {
            0x00 => Subject::Undefined,
            0x01 => Subject::Reading,
            0x02 => Subject::Science,
            0x03 => Subject::Music,
            0x04 => Subject::Foreign,
            0x05 => Subject::Project,
            0x06 => Subject::Math,
            0x07 => Subject::Civic,
            0xFE => Subject::Local,
            0xFF => Subject::Reserved,
            other => Subject::Unrecognized(other),
        }
    }

    pub const fn to_byte(self) -> u8 {
        match self {
            Subject::Undefined => 0x00,
            Subject::Reading => 0x01,
            Subject::Science => 0x02,
            Subject::Music => 0x03,
            Subject::Foreign => 0x04,
            Subject::Project => 0x05,
            Subject::Math => 0x06,
            Subject::Civic => 0x07,
            Subject::Local => 0xFE,
            Subject::Reserved => 0xFF,
            Subject::Unrecognized(b) => b,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Subject::Undefined => "undefined",
            Subject::Reading => "reading",
            Subject::Science => "science",
            Subject::Music => "music",
            Subject::Foreign => "foreign",
            Subject::Project => "project",
            Subject::Math => "math",
            Subject::Civic => "civic",
            Subject::Local => "local",
            Subject::Reserved => "reserved",
            Subject::Unrecognized(_) => "unrecognized",
        }
    }
}

/// Pedagogical tag: cycle, subject and a free-form sub-code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Tag {
    pub cycle: Cycle,
    pub subject: Subject,
    pub sub: u8,
}

impl Tag {
    pub const fn from_bytes(b: [u8; 3]) -> Self {
        Tag {
            cycle: Cycle::from_byte(b[0]),
            subject: Subject::from_byte(b[1]),
            sub: b[2],
        }
    }

    pub const fn to_bytes(self) -> [u8; 3] {
        [self.cycle.to_byte(), self.subject.to_byte(), self.sub]
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.cycle.as_str(),
            self.subject.as_str(),
            self.sub
        )
    }
}
