//! Service layer - business logic on top of the repositories.

mod credential_service;

pub use credential_service::{CredentialManager, CredentialService};
