use std::io::Write;

use ed25519_dalek::SigningKey;
use icf_capsule::{
    parse, parse_permissive, parse_strict, seal::sign, AuthorityId, Ed25519Verifier, Error,
    Keyring, Mode, ParseOpts, PublicKey,
};
use icf_core::{BadgeType, CapsuleWriter, Check, Cycle, Subject, Tag};

const AUTHORITY: AuthorityId = AuthorityId([0xA1, 0xB2, 0xC3, 0xD4, 0, 0, 0, 1]);

fn badge() -> CapsuleWriter {
    let mut w = CapsuleWriter::new();
    w.badge_type(BadgeType::Resource)
        .unwrap()
        .url("https://badges.example.org/r/42")
        .unwrap()
        .language("en")
        .unwrap()
        .title("Long division")
        .unwrap()
        .tag(Tag {
            cycle: Cycle::Cycle3,
            subject: Subject::Math,
            sub: 4,
        })
        .unwrap()
        .retention(30)
        .unwrap()
        .expires(1_900_000_000)
        .unwrap()
        .payload(br#"{"level":2,"tags":["div"]}"#)
        .unwrap();
    w
}

fn keyring_with(sk: &SigningKey) -> Keyring {
    let mut ring = Keyring::new();
    ring.insert(AUTHORITY, sk.verifying_key().to_bytes());
    ring
}

// =========================================================================
// Ed25519 end to end
// =========================================================================

#[test]
fn sealed_badge_verifies_with_keyring() {
    let sk = SigningKey::generate(&mut rand_core::OsRng);
    let bytes = sign(badge(), &sk, AUTHORITY);
    let ring = keyring_with(&sk);

    let c = parse(&bytes, &ParseOpts::strict(&ring)).unwrap();
    assert_eq!(c.url, "https://badges.example.org/r/42");
    assert_eq!(c.tag.to_string(), "cycle3/math/4");
    assert_eq!(c.payload_json().unwrap()["level"], 2);
    assert_eq!(c.authority, Some(AUTHORITY));
}

#[test]
fn other_authority_is_unresolved() {
    let sk = SigningKey::generate(&mut rand_core::OsRng);
    let other = AuthorityId([1; 8]);
    let bytes = sign(badge(), &sk, other);
    let err = parse(&bytes, &ParseOpts::strict(&keyring_with(&sk))).unwrap_err();
    assert_eq!(err, Error::AuthorityUnresolved(other));
    assert_eq!(err.code(), "Err.ICF.AuthorityUnresolved");
}

#[test]
fn forged_signature_is_rejected() {
    let sk = SigningKey::generate(&mut rand_core::OsRng);
    let mut bytes = sign(badge(), &sk, AUTHORITY);
    // Signature value sits after its two-byte header, 74 bytes before the end.
    let sig_at = bytes.len() - 2 - 10 - 64;
    bytes[sig_at] ^= 0x80;
    let err = parse(&bytes, &ParseOpts::strict(&keyring_with(&sk))).unwrap_err();
    assert_eq!(err, Error::IntegrityMismatch(Check::Signature));
}

#[test]
fn tampered_title_fails_the_hash_first() {
    let sk = SigningKey::generate(&mut rand_core::OsRng);
    let bytes = sign(badge(), &sk, AUTHORITY);
    let at = bytes
        .windows(4)
        .position(|w| w == b"Long")
        .unwrap();
    let mut tampered = bytes.clone();
    tampered[at] = b'S';
    let err = parse(&tampered, &ParseOpts::strict(&keyring_with(&sk))).unwrap_err();
    assert_eq!(err, Error::IntegrityMismatch(Check::Hash));
}

#[test]
fn permissive_accepts_any_signature() {
    let sk = SigningKey::generate(&mut rand_core::OsRng);
    let mut bytes = sign(badge(), &sk, AUTHORITY);
    let sig_at = bytes.len() - 2 - 10 - 64;
    bytes[sig_at] ^= 0x80;
    let c = parse_permissive(&bytes).unwrap();
    assert!(c.has_signature());
}

// =========================================================================
// Injected collaborators
// =========================================================================

#[test]
fn closures_as_collaborators() {
    let bytes = {
        let mut w = badge();
        w.seal_hash();
        w.signature(&[0xAA; 64]).authority(AUTHORITY).end();
        w.finish()
    };
    let lookup = |_: &AuthorityId| -> Option<PublicKey> { Some([0; 32]) };
    let accept_aa = |sig: &[u8; 64], _: &[u8], _: &PublicKey| sig.iter().all(|b| *b == 0xAA);
    let reject_all = |_: &[u8; 64], _: &[u8], _: &PublicKey| false;

    assert!(parse_strict(&bytes, &lookup, &accept_aa).is_ok());
    assert_eq!(
        parse_strict(&bytes, &lookup, &reject_all).unwrap_err(),
        Error::IntegrityMismatch(Check::Signature)
    );
    // The default Ed25519 verifier does not accept the fake signature.
    assert!(parse_strict(&bytes, &lookup, &Ed25519Verifier).is_err());
}

#[test]
fn strict_mode_needs_lookup() {
    let opts = ParseOpts {
        mode: Mode::Strict,
        ..ParseOpts::default()
    };
    assert_eq!(
        parse(&[0xFF, 0x00], &opts).unwrap_err().code(),
        "Err.ICF.InvalidArgument"
    );
}

#[test]
fn unsigned_capsule_in_strict_mode() {
    let mut w = badge();
    w.seal_hash();
    w.end();
    let ring = Keyring::new();
    assert_eq!(
        parse(w.as_bytes(), &ParseOpts::strict(&ring)).unwrap_err(),
        Error::MissingRequiredField("signature")
    );
}

// =========================================================================
// Keyring file
// =========================================================================

#[test]
fn keyring_loaded_from_file() {
    let sk = SigningKey::generate(&mut rand_core::OsRng);
    let mut f = tempfile::NamedTempFile::new().unwrap();
    write!(
        f,
        r#"{{"{}": "{}"}}"#,
        AUTHORITY,
        hex::encode(sk.verifying_key().to_bytes())
    )
    .unwrap();

    let ring = Keyring::load(f.path()).unwrap();
    let bytes = sign(badge(), &sk, AUTHORITY);
    assert!(parse(&bytes, &ParseOpts::strict(&ring)).is_ok());
}

#[test]
fn missing_keyring_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        Keyring::load(dir.path().join("absent.json")),
        Err(icf_capsule::KeyringError::Io(_))
    ));
}
