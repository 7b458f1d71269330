use crate::common::RegistrantId;
use crate::domains::registrants::{IdentityOutcome, Registrant, RegistryError};
use crate::kernel::ServerDeps;

use super::persist_identity;

/// Load a registrant and make sure it carries the member id its current
/// status calls for.
pub async fn ensure_member_id(
    id: RegistrantId,
    deps: &ServerDeps,
) -> Result<(Registrant, IdentityOutcome), RegistryError> {
    Ok(persist_identity(id, deps, |_| Ok(true)).await?.into_parts())
}
