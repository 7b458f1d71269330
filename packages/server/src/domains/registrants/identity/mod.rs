//! Member identity & status engine

pub mod engine;

pub use engine::{IdentityAction, IdentityEngine, IdentityOutcome, DEFAULT_ALLOCATION_ATTEMPTS};
