//! Typed ID definitions for domain entities.

pub use super::id::Id;

/// Marker type for Registrant entities (portal members).
pub struct Registrant;

/// Typed ID for Registrant entities.
pub type RegistrantId = Id<Registrant>;
