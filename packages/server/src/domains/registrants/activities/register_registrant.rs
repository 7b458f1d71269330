//! Register registrant activity - creates a pending registrant with a
//! temporary member id

use tracing::{info, warn};

use crate::domains::registrants::{NewRegistrant, Registrant, RegistryError};
use crate::kernel::ServerDeps;

/// Register a new registrant.
///
/// The member id is allocated before the row exists and written with it in
/// a single insert, so a failed allocation leaves nothing behind. In strict
/// mode an unknown sector is rejected before anything is allocated.
pub async fn register_registrant(
    input: NewRegistrant,
    deps: &ServerDeps,
) -> Result<Registrant, RegistryError> {
    let input = input.normalized()?;
    deps.engine.sector_prefix(input.sector.as_deref())?;

    let attempts = deps.engine.max_attempts();
    let mut conflicted_prefix = String::new();

    for attempt in 1..=attempts {
        let mut registrant = Registrant::from_new(input.clone());
        deps.engine
            .ensure_identifier(&mut registrant, deps.allocator.as_ref())
            .await?;

        match deps.store.create(&registrant).await {
            Ok(saved) => {
                info!(
                    registrant_id = %saved.id,
                    sector = ?saved.sector,
                    member_id = ?saved.member_id.as_ref().map(|m| m.value()),
                    "Registrant registered"
                );
                return Ok(saved);
            }
            Err(RegistryError::ConcurrentAllocationConflict { prefix }) => {
                warn!(prefix = %prefix, attempt, "Member id already taken at insert, reallocating");
                conflicted_prefix = prefix;
            }
            Err(e) => return Err(e),
        }
    }

    Err(RegistryError::IdentifierAllocationFailed {
        prefix: conflicted_prefix,
        attempts,
    })
}
