//! Identity verification and delegatable credentials (SPEC_FULL.md §4.9).

mod basic;
mod delegation;
mod error;
mod identity;

pub use basic::authenticate_basic;
pub use delegation::{check_entity_caveat, mint, renew, DelegatableCredential};
pub use error::AuthGateError;
pub use identity::{IdentityCollaborator, StaticIdentityCollaborator};
