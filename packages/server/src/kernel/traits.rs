// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic.
// The identity rules live in domains/registrants and only talk to storage
// through these contracts.
//
// Naming convention: Base* for trait names (e.g., BaseRegistrantStore)

use async_trait::async_trait;

use crate::common::RegistrantId;
use crate::domains::registrants::models::{Registrant, RegistrantFilter};
use crate::domains::registrants::RegistryError;

// =============================================================================
// Registrant Store Trait (Infrastructure - persistence)
// =============================================================================

#[async_trait]
pub trait BaseRegistrantStore: Send + Sync {
    /// Insert a fully built registrant, member id included, in one write.
    ///
    /// Fails with `ConcurrentAllocationConflict` when the member id is already
    /// held by another registrant; nothing is written in that case.
    async fn create(&self, registrant: &Registrant) -> Result<Registrant, RegistryError>;

    async fn find_by_id(&self, id: RegistrantId) -> Result<Option<Registrant>, RegistryError>;

    /// Registrants matching `filter`, ordered by id
    async fn find(&self, filter: &RegistrantFilter) -> Result<Vec<Registrant>, RegistryError>;

    /// Number of registrants matching `filter` (`limit` is ignored)
    async fn count(&self, filter: &RegistrantFilter) -> Result<i64, RegistryError>;

    /// Persist `status` and `member_id` of `registrant` in one atomic
    /// compare-and-set write.
    ///
    /// The write only lands if the stored row still holds the status and
    /// member id of `expected` (the copy the change was computed from).
    /// Otherwise it fails with `StaleRecord`. Also fails with
    /// `ConcurrentAllocationConflict` when the member id is already held by
    /// another registrant, and `NotFound` when the row is gone.
    async fn save_identity(
        &self,
        expected: &Registrant,
        registrant: &Registrant,
    ) -> Result<Registrant, RegistryError>;

    /// Cheap liveness probe for health checks
    async fn ping(&self) -> Result<(), RegistryError>;
}

// =============================================================================
// Sequence Allocator Trait (Infrastructure - per-prefix counters)
// =============================================================================

#[async_trait]
pub trait BaseSequenceAllocator: Send + Sync {
    /// Next unused sequence number for `prefix`.
    ///
    /// Values are strictly increasing per prefix and never handed out twice,
    /// even across concurrent callers. Transient contention surfaces as
    /// `ConcurrentAllocationConflict` and may be retried.
    async fn next_sequence(&self, prefix: &str) -> Result<u32, RegistryError>;
}
