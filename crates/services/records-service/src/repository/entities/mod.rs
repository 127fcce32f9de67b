//! SeaORM entity definitions
//!
//! These are database-specific entities separate from domain models.

pub mod account;
pub mod account_role_mapping;
pub mod role;
pub mod role_privilege;
pub mod student;
pub mod user_type;
