//! Domain-level constants.
//!
//! These constants define the credential format and its default work factor.

// =============================================================================
// Credential format
// =============================================================================

/// Random salt length (128 bits)
pub const SALT_LENGTH_BYTES: usize = 16;

/// Derived key length (256 bits)
pub const DERIVED_KEY_LENGTH_BYTES: usize = 32;

/// Algorithm identifier written at the head of every stored scheme
pub const KDF_ALGORITHM: &str = "argon2id";

/// Argon2 version 1.3, as it appears in an encoded scheme
pub const KDF_VERSION: u32 = 19;

// =============================================================================
// Default work factor
// =============================================================================

/// Default Argon2 memory cost in KiB (19 MiB)
pub const DEFAULT_KDF_MEMORY_KIB: u32 = 19_456;

/// Default Argon2 iteration count
pub const DEFAULT_KDF_ITERATIONS: u32 = 2;

/// Default Argon2 lane count
pub const DEFAULT_KDF_PARALLELISM: u32 = 1;

// =============================================================================
// Accounts
// =============================================================================

/// Accounts are active unless the signup says otherwise
pub const DEFAULT_ACCOUNT_ACTIVE: bool = true;
