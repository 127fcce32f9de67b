//! Password credential value objects - key derivation for stored secrets.
//!
//! A stored credential is three text columns: the base64 derived key, the
//! base64 salt, and the encoded scheme (algorithm plus work factor) that
//! produced it. Keeping the scheme per account lets the work factor be raised
//! without invalidating existing hashes.

use std::fmt;
use std::str::FromStr;

use argon2::{
    password_hash::{
        rand_core::{OsRng, RngCore},
        Output,
    },
    Algorithm, Argon2, Params, Version,
};

use crate::constants::{
    DEFAULT_KDF_ITERATIONS, DEFAULT_KDF_MEMORY_KIB, DEFAULT_KDF_PARALLELISM,
    DERIVED_KEY_LENGTH_BYTES, KDF_ALGORITHM, KDF_VERSION, SALT_LENGTH_BYTES,
};
use crate::error::{DomainError, DomainResult};

/// Argon2id work factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    /// Memory cost in KiB
    pub memory_kib: u32,
    /// Number of passes over memory
    pub iterations: u32,
    /// Number of lanes
    pub parallelism: u32,
}

impl KdfParams {
    pub fn new(memory_kib: u32, iterations: u32, parallelism: u32) -> Self {
        Self {
            memory_kib,
            iterations,
            parallelism,
        }
    }

    fn argon2(&self) -> DomainResult<Argon2<'static>> {
        let params = Params::new(
            self.memory_kib,
            self.iterations,
            self.parallelism,
            Some(DERIVED_KEY_LENGTH_BYTES),
        )
        .map_err(|e| DomainError::password(format!("Invalid work factor {}: {}", self, e)))?;

        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }
}

impl Default for KdfParams {
    fn default() -> Self {
        Self::new(
            DEFAULT_KDF_MEMORY_KIB,
            DEFAULT_KDF_ITERATIONS,
            DEFAULT_KDF_PARALLELISM,
        )
    }
}

/// Encodes as `argon2id$v=19$m=<kib>,t=<iterations>,p=<lanes>`.
impl fmt::Display for KdfParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}$v={}$m={},t={},p={}",
            KDF_ALGORITHM, KDF_VERSION, self.memory_kib, self.iterations, self.parallelism
        )
    }
}

impl FromStr for KdfParams {
    type Err = DomainError;

    fn from_str(scheme: &str) -> DomainResult<Self> {
        let invalid = || DomainError::password(format!("Unrecognized password scheme: {}", scheme));

        let mut parts = scheme.split('$');
        if parts.next() != Some(KDF_ALGORITHM) {
            return Err(invalid());
        }
        if parts.next() != Some(format!("v={}", KDF_VERSION).as_str()) {
            return Err(invalid());
        }
        let cost = parts.next().ok_or_else(invalid)?;
        if parts.next().is_some() {
            return Err(invalid());
        }

        let (mut memory_kib, mut iterations, mut parallelism) = (None, None, None);
        for pair in cost.split(',') {
            let (key, value) = pair.split_once('=').ok_or_else(invalid)?;
            let value: u32 = value.parse().map_err(|_| invalid())?;
            match key {
                "m" => memory_kib = Some(value),
                "t" => iterations = Some(value),
                "p" => parallelism = Some(value),
                _ => return Err(invalid()),
            }
        }

        match (memory_kib, iterations, parallelism) {
            (Some(m), Some(t), Some(p)) => Ok(Self::new(m, t, p)),
            _ => Err(invalid()),
        }
    }
}

/// Output of a key derivation, ready for storage.
#[derive(Clone, PartialEq, Eq)]
pub struct DerivedSecret {
    /// Base64 derived key
    pub hash: String,
    /// Base64 salt
    pub salt: String,
    /// Encoded work factor
    pub scheme: String,
}

// Keep key material out of logs
impl fmt::Debug for DerivedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DerivedSecret")
            .field("hash", &"[REDACTED]")
            .field("salt", &"[REDACTED]")
            .field("scheme", &self.scheme)
            .finish()
    }
}

/// Derives and verifies password secrets with a configured work factor.
#[derive(Debug, Clone)]
pub struct CredentialHasher {
    params: KdfParams,
}

impl CredentialHasher {
    /// Create a hasher, rejecting work factors Argon2 cannot run.
    pub fn new(params: KdfParams) -> DomainResult<Self> {
        params.argon2().map_err(|e| match e {
            DomainError::Password(reason) => DomainError::invalid_argument(reason),
            other => other,
        })?;
        Ok(Self { params })
    }

    /// Work factor applied to new secrets.
    pub fn params(&self) -> KdfParams {
        self.params
    }

    /// Derive a secret for `password` under a fresh random salt.
    pub fn derive(&self, password: &str) -> DomainResult<DerivedSecret> {
        let mut salt = [0u8; SALT_LENGTH_BYTES];
        OsRng.fill_bytes(&mut salt);

        let key = derive_key(&self.params, password.as_bytes(), &salt)?;
        Ok(DerivedSecret {
            hash: key.to_string(),
            salt: encode_b64(&salt)?,
            scheme: self.params.to_string(),
        })
    }

    /// Recompute the base64 key for a stored salt and scheme.
    pub fn rederive(password: &str, salt: &str, scheme: &str) -> DomainResult<String> {
        let params: KdfParams = scheme.parse()?;
        let salt = decode_b64(salt)?;
        Ok(derive_key(&params, password.as_bytes(), salt.as_bytes())?.to_string())
    }

    /// Check `password` against a stored hash, salt and scheme.
    ///
    /// The comparison runs in constant time over the derived bytes.
    pub fn verify(password: &str, hash: &str, salt: &str, scheme: &str) -> DomainResult<bool> {
        let params: KdfParams = scheme.parse()?;
        let expected = decode_b64(hash)?;
        let salt = decode_b64(salt)?;
        let actual = derive_key(&params, password.as_bytes(), salt.as_bytes())?;

        // Output's PartialEq is constant-time
        Ok(actual == expected)
    }

    /// Burn one derivation with the current work factor.
    ///
    /// Used when there is no stored secret to check against, so that a
    /// missing account costs the same time as a wrong password.
    pub fn dummy_verify(&self, password: &str) {
        let salt = [0u8; SALT_LENGTH_BYTES];
        let _ = derive_key(&self.params, password.as_bytes(), &salt);
    }

    /// Whether a secret stored under `scheme` should be re-derived.
    pub fn needs_rehash(&self, scheme: &str) -> bool {
        match scheme.parse::<KdfParams>() {
            Ok(stored) => stored != self.params,
            Err(_) => true,
        }
    }
}

fn derive_key(params: &KdfParams, password: &[u8], salt: &[u8]) -> DomainResult<Output> {
    let mut key = [0u8; DERIVED_KEY_LENGTH_BYTES];
    params
        .argon2()?
        .hash_password_into(password, salt, &mut key)
        .map_err(|e| DomainError::password(format!("Key derivation failed: {}", e)))?;

    Output::new(&key).map_err(|e| DomainError::password(format!("Key encoding failed: {}", e)))
}

// Output carries the unpadded standard base64 codec used for both columns.
fn encode_b64(bytes: &[u8]) -> DomainResult<String> {
    Output::new(bytes)
        .map(|o| o.to_string())
        .map_err(|e| DomainError::password(format!("Encoding failed: {}", e)))
}

fn decode_b64(text: &str) -> DomainResult<Output> {
    Output::b64_decode(text)
        .map_err(|e| DomainError::password(format!("Stored secret is not valid base64: {}", e)))
}
