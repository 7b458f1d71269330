//! Update registrant status activity

use tracing::info;

use super::persist_identity;
use crate::common::RegistrantId;
use crate::domains::registrants::{
    IdentityOutcome, Registrant, RegistrantStatus, RegistryError,
};
use crate::kernel::ServerDeps;

/// Move a registrant to `status` and apply the matching member id action.
///
/// The transition is checked against the stored status on every save
/// attempt, so a concurrent change cannot slip an illegal move through.
pub async fn update_status(
    id: RegistrantId,
    status: RegistrantStatus,
    deps: &ServerDeps,
) -> Result<Registrant, RegistryError> {
    let mut from = None;
    let persisted = persist_identity(id, deps, |registrant| {
        from = registrant.status;
        if !RegistrantStatus::can_transition(from, status) {
            return Err(RegistryError::InvalidTransition { from, to: status });
        }
        registrant.status = Some(status);
        Ok(true)
    })
    .await?;
    let (saved, outcome) = persisted.into_parts();

    match outcome {
        IdentityOutcome::Assigned {
            member_id,
            replaced,
        } => info!(
            registrant_id = %id,
            from = ?from,
            to = %status,
            member_id = %member_id,
            replaced = ?replaced.map(|m| m.value()),
            "Registrant status updated with new member id"
        ),
        IdentityOutcome::Unchanged => info!(
            registrant_id = %id,
            from = ?from,
            to = %status,
            "Registrant status updated"
        ),
    }

    Ok(saved)
}
