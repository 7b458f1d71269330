//! Run the identity engine against the stored row and save the result with a
//! compare-and-set write, retrying when the chosen member id turns out to be
//! taken or the row changed underneath us.

use tracing::warn;

use crate::common::RegistrantId;
use crate::domains::registrants::{IdentityOutcome, Registrant, RegistryError};
use crate::kernel::ServerDeps;

/// What `persist_identity` did with the row
#[derive(Debug)]
pub enum Persisted {
    /// The prepared status and member id were written
    Saved {
        registrant: Registrant,
        outcome: IdentityOutcome,
    },
    /// `prepare` declined the freshly read row; nothing was written
    Declined(Registrant),
}

impl Persisted {
    /// The row as it now stands, with `Unchanged` when nothing was written
    pub fn into_parts(self) -> (Registrant, IdentityOutcome) {
        match self {
            Self::Saved {
                registrant,
                outcome,
            } => (registrant, outcome),
            Self::Declined(registrant) => (registrant, IdentityOutcome::Unchanged),
        }
    }
}

/// Read registrant `id`, let `prepare` apply the caller's change, make sure
/// the result has the member id its status calls for, and save status +
/// member id.
///
/// `prepare` returns `Ok(false)` to leave the row alone and may reject it
/// with an error. It runs again on every attempt against a fresh read, so a
/// decision is never based on a copy another writer has since replaced.
pub async fn persist_identity<F>(
    id: RegistrantId,
    deps: &ServerDeps,
    mut prepare: F,
) -> Result<Persisted, RegistryError>
where
    F: FnMut(&mut Registrant) -> Result<bool, RegistryError>,
{
    let attempts = deps.engine.max_attempts();
    let mut last_conflict = None;

    for attempt in 1..=attempts {
        let current = deps
            .store
            .find_by_id(id)
            .await?
            .ok_or(RegistryError::NotFound(id))?;

        let mut candidate = current.clone();
        if !prepare(&mut candidate)? {
            return Ok(Persisted::Declined(current));
        }

        let outcome = deps
            .engine
            .ensure_identifier(&mut candidate, deps.allocator.as_ref())
            .await?;

        match deps.store.save_identity(&current, &candidate).await {
            Ok(registrant) => return Ok(Persisted::Saved { registrant, outcome }),
            Err(RegistryError::ConcurrentAllocationConflict { prefix }) => {
                warn!(
                    registrant_id = %id,
                    prefix = %prefix,
                    attempt,
                    "Member id already taken at save, reallocating"
                );
                last_conflict = Some(RegistryError::IdentifierAllocationFailed { prefix, attempts });
            }
            Err(RegistryError::StaleRecord(_)) => {
                warn!(registrant_id = %id, attempt, "Registrant changed before save, re-reading");
                last_conflict = Some(RegistryError::StaleRecord(id));
            }
            Err(e) => return Err(e),
        }
    }

    Err(last_conflict.unwrap_or(RegistryError::StaleRecord(id)))
}
