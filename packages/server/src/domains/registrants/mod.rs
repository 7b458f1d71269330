//! Registrant domain - registration, review status and member ids
//!
//! Architecture:
//!   HTTP / scheduler / migrate_cli → activities → IdentityEngine + kernel stores

pub mod activities;
pub mod errors;
pub mod identity;
pub mod models;

// Re-export commonly used types
pub use errors::RegistryError;
pub use identity::{IdentityEngine, IdentityOutcome};
pub use models::{MemberId, NewRegistrant, Registrant, RegistrantStatus};
