//! Domain layer - Core business entities and value objects.
//!
//! This crate contains pure domain logic with no infrastructure dependencies:
//! the account entity, signup input, and the password key-derivation value
//! objects used by the credential service.

pub mod account;
pub mod constants;
pub mod error;
pub mod password;

pub use account::{Account, AccountResponse, SignupRequest};
pub use constants::*;
pub use error::{DomainError, DomainResult};
pub use password::{CredentialHasher, DerivedSecret, KdfParams};
