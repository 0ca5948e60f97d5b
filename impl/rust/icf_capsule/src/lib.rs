//! `icf_capsule`: strict verification of ICF capsules.
//!
//! Strict parse = permissive parse (`icf_core`) + required Signature and
//! AuthorityId fields + a signature check over the stored hash, with the
//! authority's public key resolved through a caller-supplied lookup.
//!
//! Both collaborators are passed in explicitly; nothing here is global.

pub mod keyring;
#[cfg(feature = "metrics")]
mod metrics_support;
pub mod seal;

pub use icf_core::{AuthorityId, Capsule, Error, Result};
pub use keyring::{Keyring, KeyringError};
pub use seal::{
    parse, parse_permissive, parse_strict, sign, verify_signature, Ed25519Verifier, KeyLookup,
    Mode, ParseOpts, PublicKey, SignatureVerifier,
};
