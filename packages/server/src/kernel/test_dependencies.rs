// TestDependencies - in-memory implementations for testing
//
// Provides stores that can be injected into ServerDeps for tests without a
// database, with hooks for simulating contention and storage failures.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use super::{BaseRegistrantStore, BaseSequenceAllocator, ServerDeps, DEFAULT_BATCH_SIZE};
use crate::common::RegistrantId;
use crate::domains::registrants::models::{MemberId, Registrant, RegistrantFilter, SectorTable};
use crate::domains::registrants::{IdentityEngine, RegistryError};

// =============================================================================
// In-memory Sequence Allocator
// =============================================================================

pub struct InMemorySequenceAllocator {
    counters: Mutex<HashMap<String, u32>>,
    conflicts_remaining: AtomicU32,
    calls: AtomicUsize,
}

impl InMemorySequenceAllocator {
    pub fn new() -> Self {
        Self {
            counters: Mutex::new(HashMap::new()),
            conflicts_remaining: AtomicU32::new(0),
            calls: AtomicUsize::new(0),
        }
    }

    /// Start `prefix` at `last_value` (the next allocation is `last_value + 1`)
    pub fn with_counter(self, prefix: &str, last_value: u32) -> Self {
        self.counters
            .lock()
            .unwrap()
            .insert(prefix.to_string(), last_value);
        self
    }

    /// Fail the next `n` allocations with `ConcurrentAllocationConflict`
    pub fn with_conflicts(self, n: u32) -> Self {
        self.conflicts_remaining.store(n, Ordering::SeqCst);
        self
    }

    /// Number of `next_sequence` calls, including conflicted ones
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn current(&self, prefix: &str) -> Option<u32> {
        self.counters.lock().unwrap().get(prefix).copied()
    }
}

impl Default for InMemorySequenceAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseSequenceAllocator for InMemorySequenceAllocator {
    async fn next_sequence(&self, prefix: &str) -> Result<u32, RegistryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let conflicted = self
            .conflicts_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if conflicted {
            return Err(RegistryError::ConcurrentAllocationConflict {
                prefix: prefix.to_string(),
            });
        }

        let mut counters = self.counters.lock().unwrap();
        let counter = counters.entry(prefix.to_string()).or_insert(0);
        *counter += 1;
        Ok(*counter)
    }
}

// =============================================================================
// In-memory Registrant Store
// =============================================================================

pub struct InMemoryRegistrantStore {
    rows: Mutex<BTreeMap<RegistrantId, Registrant>>,
    failing_saves: Mutex<HashSet<RegistrantId>>,
    unavailable: AtomicBool,
}

impl InMemoryRegistrantStore {
    pub fn new() -> Self {
        Self {
            rows: Mutex::new(BTreeMap::new()),
            failing_saves: Mutex::new(HashSet::new()),
            unavailable: AtomicBool::new(false),
        }
    }

    /// Seed a row as-is (e.g. a legacy registrant with no status)
    pub fn insert(&self, registrant: Registrant) {
        self.rows.lock().unwrap().insert(registrant.id, registrant);
    }

    /// Make `save_identity` fail with a persistence error for this registrant
    pub fn fail_saves_for(&self, id: RegistrantId) {
        self.failing_saves.lock().unwrap().insert(id);
    }

    /// Make every call fail as if the database were down
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn get(&self, id: RegistrantId) -> Option<Registrant> {
        self.rows.lock().unwrap().get(&id).cloned()
    }

    pub fn all(&self) -> Vec<Registrant> {
        self.rows.lock().unwrap().values().cloned().collect()
    }

    fn check_available(&self) -> Result<(), RegistryError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(RegistryError::Persistence(anyhow::anyhow!(
                "in-memory store marked unavailable"
            )));
        }
        Ok(())
    }

    fn check_member_id_free(
        rows: &BTreeMap<RegistrantId, Registrant>,
        registrant: &Registrant,
    ) -> Result<(), RegistryError> {
        let Some(member_id) = &registrant.member_id else {
            return Ok(());
        };
        let value = Some(member_id.value());
        let taken = rows
            .values()
            .any(|other| other.id != registrant.id && member_id_value(&other.member_id) == value);
        if taken {
            return Err(RegistryError::ConcurrentAllocationConflict {
                prefix: member_id.prefix().to_string(),
            });
        }
        Ok(())
    }

    fn matches(filter: &RegistrantFilter, registrant: &Registrant) -> bool {
        filter.status.matches(registrant.status)
            && filter
                .sector
                .as_ref()
                .map_or(true, |s| registrant.sector.as_ref() == Some(s))
            && filter.member_id_prefix.as_deref().map_or(true, |p| {
                registrant.member_id.as_ref().map(|id| id.prefix()) == Some(p)
            })
            && filter
                .has_member_id
                .map_or(true, |present| registrant.member_id.is_some() == present)
            && filter.after.map_or(true, |after| registrant.id > after)
    }
}

fn member_id_value(member_id: &Option<MemberId>) -> Option<String> {
    member_id.as_ref().map(MemberId::value)
}

impl Default for InMemoryRegistrantStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseRegistrantStore for InMemoryRegistrantStore {
    async fn create(&self, registrant: &Registrant) -> Result<Registrant, RegistryError> {
        self.check_available()?;
        let mut rows = self.rows.lock().unwrap();
        Self::check_member_id_free(&rows, registrant)?;
        rows.insert(registrant.id, registrant.clone());
        Ok(registrant.clone())
    }

    async fn find_by_id(&self, id: RegistrantId) -> Result<Option<Registrant>, RegistryError> {
        self.check_available()?;
        Ok(self.get(id))
    }

    async fn find(&self, filter: &RegistrantFilter) -> Result<Vec<Registrant>, RegistryError> {
        self.check_available()?;
        let limit = filter
            .limit
            .and_then(|l| usize::try_from(l).ok())
            .unwrap_or(usize::MAX);

        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|r| Self::matches(filter, r))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn count(&self, filter: &RegistrantFilter) -> Result<i64, RegistryError> {
        self.check_available()?;
        let count = self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|r| Self::matches(filter, r))
            .count();
        Ok(count as i64)
    }

    async fn save_identity(
        &self,
        expected: &Registrant,
        registrant: &Registrant,
    ) -> Result<Registrant, RegistryError> {
        self.check_available()?;
        if self.failing_saves.lock().unwrap().contains(&registrant.id) {
            return Err(RegistryError::Persistence(anyhow::anyhow!(
                "simulated write failure for {}",
                registrant.id
            )));
        }

        let mut rows = self.rows.lock().unwrap();
        Self::check_member_id_free(&rows, registrant)?;

        let row = rows
            .get_mut(&registrant.id)
            .ok_or(RegistryError::NotFound(registrant.id))?;
        if row.status != expected.status
            || member_id_value(&row.member_id) != member_id_value(&expected.member_id)
        {
            return Err(RegistryError::StaleRecord(registrant.id));
        }

        row.status = registrant.status;
        row.member_id = registrant.member_id.clone();
        row.updated_at = Utc::now();
        Ok(row.clone())
    }

    async fn ping(&self) -> Result<(), RegistryError> {
        self.check_available()
    }
}

// =============================================================================
// TestDependencies
// =============================================================================

/// Builder for `ServerDeps` backed by in-memory collaborators.
///
/// Keeps typed handles to the store and allocator so tests can seed data and
/// inspect results.
pub struct TestDependencies {
    pub store: Arc<InMemoryRegistrantStore>,
    pub allocator: Arc<InMemorySequenceAllocator>,
    pub sectors: Arc<SectorTable>,
    pub strict_sectors: bool,
    pub max_attempts: u32,
    pub batch_size: i64,
}

impl TestDependencies {
    pub fn new() -> Self {
        Self {
            store: Arc::new(InMemoryRegistrantStore::new()),
            allocator: Arc::new(InMemorySequenceAllocator::new()),
            sectors: Arc::new(SectorTable::default()),
            strict_sectors: false,
            max_attempts: crate::domains::registrants::identity::DEFAULT_ALLOCATION_ATTEMPTS,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn with_strict_sectors(mut self) -> Self {
        self.strict_sectors = true;
        self
    }

    pub fn with_allocator(mut self, allocator: InMemorySequenceAllocator) -> Self {
        self.allocator = Arc::new(allocator);
        self
    }

    pub fn with_batch_size(mut self, batch_size: i64) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn server_deps(&self) -> ServerDeps {
        let engine = IdentityEngine::new(self.sectors.clone())
            .with_strict_sectors(self.strict_sectors)
            .with_max_attempts(self.max_attempts);

        ServerDeps::new(
            self.store.clone(),
            self.allocator.clone(),
            Arc::new(engine),
            self.batch_size,
        )
    }
}

impl Default for TestDependencies {
    fn default() -> Self {
        Self::new()
    }
}
