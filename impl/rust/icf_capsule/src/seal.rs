//! Seal: detached signature over the capsule hash.
//!
//! The signed message is the 32-byte SHA-256 stored in the Hash field, which
//! the decoder has already checked against the signed prefix. Verification
//! needs two collaborators, both passed in per call:
//!   - a [`KeyLookup`] mapping the AuthorityId to a 32-byte public key
//!   - a [`SignatureVerifier`] (Ed25519 by default)

use icf_core::{
    AuthorityId, Capsule, CapsuleWriter, Check, Decoder, Error, HeapAllocator, PayloadAllocator,
    Result, PUBLIC_KEY_LEN, SIGNATURE_LEN,
};

#[cfg(feature = "metrics")]
use crate::metrics_support::ensure_exporter;
#[cfg(feature = "metrics")]
use metrics::{counter, histogram};

pub type PublicKey = [u8; PUBLIC_KEY_LEN];

// ---------------------------------------------------------------------------
// Collaborators
// ---------------------------------------------------------------------------

/// Checks a detached signature. Anything but `true` is a failure.
pub trait SignatureVerifier {
    fn verify(
        &self,
        signature: &[u8; SIGNATURE_LEN],
        message: &[u8],
        public_key: &PublicKey,
    ) -> bool;
}

impl<F> SignatureVerifier for F
where
    F: Fn(&[u8; SIGNATURE_LEN], &[u8], &PublicKey) -> bool,
{
    fn verify(
        &self,
        signature: &[u8; SIGNATURE_LEN],
        message: &[u8],
        public_key: &PublicKey,
    ) -> bool {
        self(signature, message, public_key)
    }
}

/// Ed25519 detached verification (ed25519-dalek).
#[derive(Debug, Clone, Copy, Default)]
pub struct Ed25519Verifier;

impl SignatureVerifier for Ed25519Verifier {
    fn verify(
        &self,
        signature: &[u8; SIGNATURE_LEN],
        message: &[u8],
        public_key: &PublicKey,
    ) -> bool {
        let Ok(vk) = ed25519_dalek::VerifyingKey::from_bytes(public_key) else {
            return false;
        };
        let sig = ed25519_dalek::Signature::from_bytes(signature);
        use ed25519_dalek::Verifier;
        vk.verify(message, &sig).is_ok()
    }
}

/// Resolves an authority to its public key.
pub trait KeyLookup {
    fn lookup(&self, authority: &AuthorityId) -> Option<PublicKey>;
}

impl<F> KeyLookup for F
where
    F: Fn(&AuthorityId) -> Option<PublicKey>,
{
    fn lookup(&self, authority: &AuthorityId) -> Option<PublicKey> {
        self(authority)
    }
}

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    /// Hash is checked when present; signature is not required.
    #[default]
    Permissive,
    /// Signature and AuthorityId are required and the signature must verify.
    Strict,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Permissive => "permissive",
            Mode::Strict => "strict",
        }
    }
}

/// Options for [`parse`].
pub struct ParseOpts<'a> {
    pub mode: Mode,
    /// Required in strict mode.
    pub key_lookup: Option<&'a dyn KeyLookup>,
    pub verifier: &'a dyn SignatureVerifier,
    pub allocator: &'a dyn PayloadAllocator,
}

impl Default for ParseOpts<'static> {
    fn default() -> Self {
        ParseOpts {
            mode: Mode::Permissive,
            key_lookup: None,
            verifier: &Ed25519Verifier,
            allocator: &HeapAllocator,
        }
    }
}

impl<'a> ParseOpts<'a> {
    /// Strict mode with the Ed25519 verifier.
    pub fn strict(key_lookup: &'a dyn KeyLookup) -> Self {
        ParseOpts {
            mode: Mode::Strict,
            key_lookup: Some(key_lookup),
            verifier: &Ed25519Verifier,
            allocator: &HeapAllocator,
        }
    }

    pub fn with_verifier(mut self, verifier: &'a dyn SignatureVerifier) -> Self {
        self.verifier = verifier;
        self
    }

    pub fn with_allocator(mut self, allocator: &'a dyn PayloadAllocator) -> Self {
        self.allocator = allocator;
        self
    }
}

// ---------------------------------------------------------------------------
// Parse
// ---------------------------------------------------------------------------

/// Parse `buf` in the mode selected by `opts`.
///
/// On any error the partially decoded capsule is dropped, which zeroes it.
#[cfg_attr(
    feature = "obs",
    tracing::instrument(level = "debug", skip_all, fields(len = buf.len(), mode = opts.mode.as_str()))
)]
pub fn parse(buf: &[u8], opts: &ParseOpts<'_>) -> Result<Capsule> {
    #[cfg(feature = "metrics")]
    let t0 = std::time::Instant::now();
    #[cfg(feature = "metrics")]
    ensure_exporter();

    let result = (|| -> Result<Capsule> {
        let lookup = match (opts.mode, opts.key_lookup) {
            (Mode::Permissive, _) => None,
            (Mode::Strict, Some(lookup)) => Some(lookup),
            (Mode::Strict, None) => {
                return Err(Error::InvalidArgument("strict parse requires a key lookup"))
            }
        };
        let capsule = Decoder::with_allocator(opts.allocator).parse(buf)?;
        if let Some(lookup) = lookup {
            check_seal(&capsule, lookup, opts.verifier)?;
        }
        Ok(capsule)
    })();

    #[cfg(feature = "metrics")]
    {
        let ms = t0.elapsed().as_secs_f64() * 1000.0;
        let mode = opts.mode.as_str();
        histogram!("icf_capsule_parse_ms", "mode" => mode).record(ms);
        match &result {
            Ok(_) => {
                counter!("icf_capsule_parse_ok_total", "mode" => mode).increment(1);
            }
            Err(e) => {
                counter!("icf_capsule_parse_fail_total", "mode" => mode, "code" => e.code())
                    .increment(1);
            }
        }
    }

    result
}

pub fn parse_permissive(buf: &[u8]) -> Result<Capsule> {
    parse(buf, &ParseOpts::default())
}

pub fn parse_strict(
    buf: &[u8],
    key_lookup: &dyn KeyLookup,
    verifier: &dyn SignatureVerifier,
) -> Result<Capsule> {
    parse(buf, &ParseOpts::strict(key_lookup).with_verifier(verifier))
}

fn check_seal(
    capsule: &Capsule,
    lookup: &dyn KeyLookup,
    verifier: &dyn SignatureVerifier,
) -> Result<()> {
    if !capsule.has_signature() {
        return Err(Error::MissingRequiredField("signature"));
    }
    let authority = capsule
        .authority
        .ok_or(Error::MissingRequiredField("authority_id"))?;
    let Some(public_key) = lookup.lookup(&authority) else {
        tracing::warn!(%authority, "no public key for authority");
        return Err(Error::AuthorityUnresolved(authority));
    };
    verify_signature(capsule, &public_key, verifier)
}

/// Verify the capsule's signature over its stored hash with `public_key`.
///
/// A capsule without a hash has nothing signed and fails the check.
pub fn verify_signature(
    capsule: &Capsule,
    public_key: &PublicKey,
    verifier: &dyn SignatureVerifier,
) -> Result<()> {
    let signature = capsule
        .signature
        .as_deref()
        .ok_or(Error::MissingRequiredField("signature"))?;
    let verified = match capsule.hash.as_deref() {
        Some(hash) => verifier.verify(signature, hash, public_key),
        None => false,
    };
    if verified {
        Ok(())
    } else {
        tracing::warn!(authority = ?capsule.authority, "capsule signature rejected");
        Err(Error::IntegrityMismatch(Check::Signature))
    }
}

// ---------------------------------------------------------------------------
// Sign
// ---------------------------------------------------------------------------

/// Seal the fields written so far: append Hash, an Ed25519 Signature over
/// it, the AuthorityId and End.
#[cfg_attr(feature = "obs", tracing::instrument(level = "debug", skip_all, fields(%authority)))]
pub fn sign(
    mut writer: CapsuleWriter,
    sk: &ed25519_dalek::SigningKey,
    authority: AuthorityId,
) -> Vec<u8> {
    let hash = writer.seal_hash();
    use ed25519_dalek::Signer;
    let sig = sk.sign(&hash);
    writer.signature(&sig.to_bytes()).authority(authority).end();
    writer.finish()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
