//! Member id rules: decide whether a registrant needs a member id, and
//! allocate one from the per-prefix counter when it does.
//!
//! The engine only mutates the registrant it is handed. Persisting the result
//! is the caller's job (see `activities::persist_identity`).

use std::sync::Arc;
use tracing::{debug, warn};

use crate::domains::registrants::models::{
    IdKind, MemberId, Registrant, RegistrantStatus, SectorTable, GENERIC_PREFIX,
    INCOMPLETE_PREFIX, NON_COMPLIANT_PREFIX,
};
use crate::domains::registrants::RegistryError;
use crate::kernel::BaseSequenceAllocator;

/// Default number of allocation attempts before giving up
pub const DEFAULT_ALLOCATION_ATTEMPTS: u32 = 3;

/// What `ensure_identifier` will do for a registrant
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityAction {
    Keep,
    Assign { prefix: String, kind: IdKind },
}

/// What `ensure_identifier` did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityOutcome {
    Unchanged,
    Assigned {
        member_id: MemberId,
        replaced: Option<MemberId>,
    },
}

impl IdentityOutcome {
    pub fn is_assigned(&self) -> bool {
        matches!(self, Self::Assigned { .. })
    }
}

pub struct IdentityEngine {
    sectors: Arc<SectorTable>,
    strict_sectors: bool,
    max_attempts: u32,
}

impl IdentityEngine {
    pub fn new(sectors: Arc<SectorTable>) -> Self {
        Self {
            sectors,
            strict_sectors: false,
            max_attempts: DEFAULT_ALLOCATION_ATTEMPTS,
        }
    }

    /// Reject unknown or missing sectors instead of falling back to `GEN`.
    pub fn with_strict_sectors(mut self, strict: bool) -> Self {
        self.strict_sectors = strict;
        self
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn sectors(&self) -> &SectorTable {
        &self.sectors
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Prefix for a raw sector slug.
    pub fn sector_prefix(&self, sector: Option<&str>) -> Result<&str, RegistryError> {
        match self.sectors.lookup(sector) {
            Some(known) => Ok(self.sectors.prefix(known)),
            None if self.strict_sectors => {
                Err(RegistryError::InvalidSector(sector.map(str::to_string)))
            }
            None => Ok(GENERIC_PREFIX),
        }
    }

    /// Decide the member id action for a registrant without allocating.
    pub fn plan(&self, registrant: &Registrant) -> Result<IdentityAction, RegistryError> {
        use RegistrantStatus::*;

        let status = registrant
            .status
            .ok_or(RegistryError::MissingStatus(registrant.id))?;

        let action = match (status, registrant.member_id.as_ref()) {
            (Archived, _) => IdentityAction::Keep,
            (Approved, Some(existing)) if existing.is_permanent() => IdentityAction::Keep,
            (Approved, _) => IdentityAction::Assign {
                prefix: self.sector_prefix(registrant.sector.as_deref())?.to_string(),
                kind: IdKind::Permanent,
            },
            (Pending, None) => IdentityAction::Assign {
                prefix: self.sector_prefix(registrant.sector.as_deref())?.to_string(),
                kind: IdKind::Temporary,
            },
            (Incomplete, None) => IdentityAction::Assign {
                prefix: INCOMPLETE_PREFIX.to_string(),
                kind: IdKind::Temporary,
            },
            (NonCompliant, None) => IdentityAction::Assign {
                prefix: NON_COMPLIANT_PREFIX.to_string(),
                kind: IdKind::Temporary,
            },
            (Pending | Incomplete | NonCompliant, Some(_)) => IdentityAction::Keep,
        };

        Ok(action)
    }

    /// Give the registrant the member id its status and sector call for.
    ///
    /// Approval is the only path that replaces an existing id, and only a
    /// temporary one. Allocation conflicts are retried up to `max_attempts`.
    pub async fn ensure_identifier(
        &self,
        registrant: &mut Registrant,
        allocator: &dyn BaseSequenceAllocator,
    ) -> Result<IdentityOutcome, RegistryError> {
        let (prefix, kind) = match self.plan(registrant)? {
            IdentityAction::Keep => return Ok(IdentityOutcome::Unchanged),
            IdentityAction::Assign { prefix, kind } => (prefix, kind),
        };

        let sequence = self.allocate(&prefix, allocator).await?;
        let member_id = MemberId::new(prefix, sequence, kind);
        let replaced = registrant.member_id.replace(member_id.clone());

        debug!(
            registrant_id = %registrant.id,
            member_id = %member_id,
            kind = %kind,
            replaced = ?replaced.as_ref().map(MemberId::value),
            "Assigned member id"
        );

        Ok(IdentityOutcome::Assigned {
            member_id,
            replaced,
        })
    }

    async fn allocate(
        &self,
        prefix: &str,
        allocator: &dyn BaseSequenceAllocator,
    ) -> Result<u32, RegistryError> {
        for attempt in 1..=self.max_attempts {
            match allocator.next_sequence(prefix).await {
                Ok(sequence) => return Ok(sequence),
                Err(e) if e.is_conflict() => {
                    warn!(prefix, attempt, "Member id allocation conflict, retrying");
                }
                Err(e) => return Err(e),
            }
        }

        Err(RegistryError::IdentifierAllocationFailed {
            prefix: prefix.to_string(),
            attempts: self.max_attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::registrants::models::{NewRegistrant, Sector};
    use crate::kernel::test_dependencies::InMemorySequenceAllocator;

    fn engine() -> IdentityEngine {
        IdentityEngine::new(Arc::new(SectorTable::default()))
    }

    fn registrant(sector: Option<&str>, status: Option<RegistrantStatus>) -> Registrant {
        let mut r = Registrant::from_new(NewRegistrant::new("Test Registrant", sector));
        r.status = status;
        r
    }

    #[tokio::test]
    async fn pending_registrants_get_their_sector_prefix() {
        let engine = engine();
        let allocator = InMemorySequenceAllocator::new();

        for sector in Sector::ALL {
            let mut r = registrant(Some(sector.as_str()), Some(RegistrantStatus::Pending));
            engine.ensure_identifier(&mut r, &allocator).await.unwrap();

            let id = r.member_id.expect("member id assigned");
            assert_eq!(id.prefix(), engine.sectors().prefix(sector));
            assert!(id.value().starts_with(engine.sectors().prefix(sector)));
            assert_eq!(id.kind(), IdKind::Temporary);
        }
    }

    #[tokio::test]
    async fn first_madaris_student_is_ms0001() {
        let engine = engine();
        let allocator = InMemorySequenceAllocator::new();
        let mut r = registrant(Some("madaris_students"), Some(RegistrantStatus::Pending));

        engine.ensure_identifier(&mut r, &allocator).await.unwrap();

        assert_eq!(r.member_id.unwrap().value(), "MS0001");
    }

    #[tokio::test]
    async fn lgbtq_community_uses_lgbtq_prefix() {
        let engine = engine();
        let allocator = InMemorySequenceAllocator::new();
        let mut r = registrant(Some("lgbtq_community"), Some(RegistrantStatus::Pending));

        engine.ensure_identifier(&mut r, &allocator).await.unwrap();

        assert_eq!(r.member_id.unwrap().value(), "LGBTQ0001");
    }

    #[tokio::test]
    async fn unknown_sector_falls_back_to_generic_prefix() {
        let engine = engine();
        let allocator = InMemorySequenceAllocator::new();

        let mut unknown = registrant(Some("astronaut"), Some(RegistrantStatus::Pending));
        engine.ensure_identifier(&mut unknown, &allocator).await.unwrap();
        assert_eq!(unknown.member_id.unwrap().value(), "GEN0001");

        let mut missing = registrant(None, Some(RegistrantStatus::Pending));
        engine.ensure_identifier(&mut missing, &allocator).await.unwrap();
        assert_eq!(missing.member_id.unwrap().value(), "GEN0002");
    }

    #[tokio::test]
    async fn strict_mode_rejects_unknown_sector() {
        let engine = engine().with_strict_sectors(true);
        let allocator = InMemorySequenceAllocator::new();
        let mut r = registrant(Some("astronaut"), Some(RegistrantStatus::Pending));

        let err = engine.ensure_identifier(&mut r, &allocator).await.unwrap_err();

        assert!(matches!(err, RegistryError::InvalidSector(Some(ref s)) if s == "astronaut"));
        assert!(r.member_id.is_none());
        assert_eq!(allocator.calls(), 0);
    }

    #[tokio::test]
    async fn strict_mode_does_not_block_status_coded_ids() {
        let engine = engine().with_strict_sectors(true);
        let allocator = InMemorySequenceAllocator::new();
        let mut r = registrant(Some("astronaut"), Some(RegistrantStatus::Incomplete));

        engine.ensure_identifier(&mut r, &allocator).await.unwrap();

        assert_eq!(r.member_id.unwrap().value(), "INC0001");
    }

    #[tokio::test]
    async fn approved_permanent_id_is_never_regenerated() {
        let engine = engine();
        let allocator = InMemorySequenceAllocator::new();
        let mut r = registrant(Some("farmer"), Some(RegistrantStatus::Approved));

        engine.ensure_identifier(&mut r, &allocator).await.unwrap();
        let first = r.member_id.clone().unwrap();
        assert!(first.is_permanent());

        let outcome = engine.ensure_identifier(&mut r, &allocator).await.unwrap();

        assert_eq!(outcome, IdentityOutcome::Unchanged);
        assert_eq!(r.member_id.unwrap(), first);
        assert_eq!(allocator.calls(), 1);
    }

    #[tokio::test]
    async fn approval_replaces_status_coded_id() {
        let engine = engine();
        let allocator = InMemorySequenceAllocator::new().with_counter("INC", 6);
        let mut r = registrant(Some("fisherman"), Some(RegistrantStatus::Incomplete));

        engine.ensure_identifier(&mut r, &allocator).await.unwrap();
        assert_eq!(r.member_id.as_ref().unwrap().value(), "INC0007");

        r.status = Some(RegistrantStatus::Approved);
        let outcome = engine.ensure_identifier(&mut r, &allocator).await.unwrap();

        let current = r.member_id.unwrap();
        assert_eq!(current.value(), "FSH0001");
        assert!(current.is_permanent());
        match outcome {
            IdentityOutcome::Assigned { replaced, .. } => {
                assert_eq!(replaced.unwrap().value(), "INC0007");
            }
            other => panic!("expected assignment, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn approval_replaces_temporary_sector_id() {
        let engine = engine();
        let allocator = InMemorySequenceAllocator::new();
        let mut r = registrant(Some("youth"), Some(RegistrantStatus::Pending));

        engine.ensure_identifier(&mut r, &allocator).await.unwrap();
        assert_eq!(r.member_id.as_ref().unwrap().value(), "YTH0001");

        r.status = Some(RegistrantStatus::Approved);
        engine.ensure_identifier(&mut r, &allocator).await.unwrap();

        let current = r.member_id.unwrap();
        assert_eq!(current.value(), "YTH0002");
        assert_eq!(current.kind(), IdKind::Permanent);
    }

    #[tokio::test]
    async fn non_compliant_gets_noc_prefix_only_when_absent() {
        let engine = engine();
        let allocator = InMemorySequenceAllocator::new();

        let mut fresh = registrant(Some("pwd"), Some(RegistrantStatus::NonCompliant));
        engine.ensure_identifier(&mut fresh, &allocator).await.unwrap();
        assert_eq!(fresh.member_id.unwrap().value(), "NOC0001");

        let mut existing = registrant(Some("pwd"), Some(RegistrantStatus::Pending));
        engine.ensure_identifier(&mut existing, &allocator).await.unwrap();
        existing.status = Some(RegistrantStatus::NonCompliant);
        let outcome = engine.ensure_identifier(&mut existing, &allocator).await.unwrap();
        assert_eq!(outcome, IdentityOutcome::Unchanged);
        assert_eq!(existing.member_id.unwrap().value(), "PWD0001");
    }

    #[tokio::test]
    async fn archived_registrants_are_left_alone() {
        let engine = engine().with_strict_sectors(true);
        let allocator = InMemorySequenceAllocator::new();

        let mut without_id = registrant(Some("astronaut"), Some(RegistrantStatus::Archived));
        let outcome = engine.ensure_identifier(&mut without_id, &allocator).await.unwrap();
        assert_eq!(outcome, IdentityOutcome::Unchanged);
        assert!(without_id.member_id.is_none());

        let mut with_temp = registrant(Some("women"), Some(RegistrantStatus::Archived));
        with_temp.member_id = Some(MemberId::new("WMN", 3, IdKind::Temporary));
        engine.ensure_identifier(&mut with_temp, &allocator).await.unwrap();
        assert_eq!(with_temp.member_id.unwrap().value(), "WMN0003");
        assert_eq!(allocator.calls(), 0);
    }

    #[tokio::test]
    async fn missing_status_is_rejected() {
        let engine = engine();
        let allocator = InMemorySequenceAllocator::new();
        let mut r = registrant(Some("farmer"), None);

        let err = engine.ensure_identifier(&mut r, &allocator).await.unwrap_err();

        assert!(matches!(err, RegistryError::MissingStatus(id) if id == r.id));
    }

    #[tokio::test]
    async fn conflicts_are_retried_transparently() {
        let engine = engine();
        let allocator = InMemorySequenceAllocator::new().with_conflicts(2);
        let mut r = registrant(Some("teacher"), Some(RegistrantStatus::Pending));

        engine.ensure_identifier(&mut r, &allocator).await.unwrap();

        assert_eq!(r.member_id.unwrap().value(), "TCH0001");
        assert_eq!(allocator.calls(), 3);
    }

    #[tokio::test]
    async fn persistent_conflicts_exhaust_retries() {
        let engine = engine();
        let allocator = InMemorySequenceAllocator::new().with_conflicts(10);
        let mut r = registrant(Some("teacher"), Some(RegistrantStatus::Pending));

        let err = engine.ensure_identifier(&mut r, &allocator).await.unwrap_err();

        match err {
            RegistryError::IdentifierAllocationFailed { prefix, attempts } => {
                assert_eq!(prefix, "TCH");
                assert_eq!(attempts, DEFAULT_ALLOCATION_ATTEMPTS);
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(r.member_id.is_none());
    }

    #[test]
    fn plan_is_pure() {
        let engine = engine();
        let r = registrant(Some("ofw"), Some(RegistrantStatus::Approved));

        assert_eq!(
            engine.plan(&r).unwrap(),
            IdentityAction::Assign {
                prefix: "OFW".to_string(),
                kind: IdKind::Permanent,
            }
        );
        assert!(r.member_id.is_none());
    }
}
