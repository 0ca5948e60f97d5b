//! Keyring: authority id → Ed25519 public key, loaded from JSON.
//!
//! ```json
//! { "0001020304050607": "d75a980182b10ab7d54bfed3c964073a0ee172f3daa62325af021a68f707511a" }
//! ```

use std::collections::HashMap;
use std::path::Path;

use icf_core::{AuthorityId, PUBLIC_KEY_LEN};

use crate::seal::{KeyLookup, PublicKey};

#[derive(Debug, thiserror::Error)]
pub enum KeyringError {
    #[error("Err.Keyring.Io: {0}")]
    Io(#[from] std::io::Error),
    #[error("Err.Keyring.InvalidJSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Err.Keyring.BadAuthority: {0:?} is not 16 hex digits")]
    BadAuthority(String),
    #[error("Err.Keyring.BadKey: key for {0} is not 64 hex digits")]
    BadKey(String),
    #[error("Err.Keyring.DuplicateAuthority: {0} is listed more than once")]
    DuplicateAuthority(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Keyring {
    keys: HashMap<AuthorityId, PublicKey>,
}

impl Keyring {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, authority: AuthorityId, key: PublicKey) -> Option<PublicKey> {
        self.keys.insert(authority, key)
    }

    pub fn get(&self, authority: &AuthorityId) -> Option<&PublicKey> {
        self.keys.get(authority)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn from_json_str(s: &str) -> Result<Self, KeyringError> {
        let raw: HashMap<String, String> = serde_json::from_str(s)?;
        let mut ring = Keyring::new();
        for (id_hex, key_hex) in raw {
            let authority: AuthorityId = id_hex
                .parse()
                .map_err(|_| KeyringError::BadAuthority(id_hex.clone()))?;
            let key: PublicKey = hex::decode(key_hex.trim())
                .ok()
                .and_then(|b| <[u8; PUBLIC_KEY_LEN]>::try_from(b).ok())
                .ok_or_else(|| KeyringError::BadKey(authority.to_string()))?;
            // Ids are case-insensitive hex; two spellings of one id are ambiguous.
            if ring.insert(authority, key).is_some() {
                return Err(KeyringError::DuplicateAuthority(authority.to_string()));
            }
        }
        tracing::debug!(keys = ring.len(), "keyring loaded");
        Ok(ring)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, KeyringError> {
        let s = std::fs::read_to_string(path)?;
        Self::from_json_str(&s)
    }
}

impl KeyLookup for Keyring {
    fn lookup(&self, authority: &AuthorityId) -> Option<PublicKey> {
        self.keys.get(authority).copied()
    }
}
