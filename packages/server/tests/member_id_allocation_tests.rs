//! Member id allocation against a real Postgres database.

mod common;

use std::collections::HashSet;

use common::{sectors_with_ofw_prefix, unique_prefix, TestHarness};
use futures::future::join_all;
use portal_core::domains::registrants::activities::{
    reconcile_statuses, register_registrant, update_status,
};
use portal_core::domains::registrants::models::{IdKind, MemberId, MemberIdSequence};
use portal_core::domains::registrants::{NewRegistrant, Registrant, RegistrantStatus, RegistryError};
use portal_core::kernel::{BaseSequenceAllocator, PgSequenceAllocator};
use test_context::test_context;

#[test_context(TestHarness)]
#[tokio::test]
async fn concurrent_allocations_never_repeat(ctx: &TestHarness) {
    let prefix = unique_prefix();
    let allocator = PgSequenceAllocator::new(ctx.db_pool.clone());

    let results = join_all((0..25).map(|_| allocator.next_sequence(&prefix))).await;
    let mut values: Vec<u32> = results.into_iter().map(|r| r.unwrap()).collect();
    values.sort_unstable();

    assert_eq!(values, (1..=25).collect::<Vec<u32>>());
}

#[test_context(TestHarness)]
#[tokio::test]
async fn counter_seeds_from_existing_member_ids(ctx: &TestHarness) {
    let prefix = unique_prefix();

    // A legacy row that already holds sequence 41 under this prefix
    let mut legacy = Registrant::from_new(NewRegistrant::new("Legacy Holder", Some("ofw")));
    legacy.member_id = Some(MemberId::new(prefix.clone(), 41, IdKind::Permanent));
    legacy.insert(&ctx.db_pool).await.unwrap();

    let next = MemberIdSequence::next_value(&prefix, &ctx.db_pool).await.unwrap();
    assert_eq!(next, 42);
    assert_eq!(
        MemberIdSequence::current_value(&prefix, &ctx.db_pool)
            .await
            .unwrap(),
        Some(42)
    );
}

#[test_context(TestHarness)]
#[tokio::test]
async fn concurrent_registrations_get_distinct_ids(ctx: &TestHarness) {
    let prefix = unique_prefix();
    let deps = ctx.deps_with_sectors(sectors_with_ofw_prefix(&prefix));

    let registrations = (0..10).map(|i| {
        let deps = deps.clone();
        tokio::spawn(async move {
            register_registrant(NewRegistrant::new(format!("Worker {}", i), Some("ofw")), &deps)
                .await
        })
    });

    let mut values = HashSet::new();
    for handle in join_all(registrations).await {
        let registrant = handle.unwrap().unwrap();
        let member_id = registrant.member_id.unwrap();
        assert_eq!(member_id.prefix(), prefix);
        assert_eq!(member_id.kind(), IdKind::Temporary);
        values.insert(member_id.value());
    }

    let expected: HashSet<String> = (1..=10).map(|n| format!("{}{:04}", prefix, n)).collect();
    assert_eq!(values, expected);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn approval_replaces_temporary_id_in_database(ctx: &TestHarness) {
    let prefix = unique_prefix();
    let deps = ctx.deps_with_sectors(sectors_with_ofw_prefix(&prefix));

    let registrant = register_registrant(NewRegistrant::new("Ana Santos", Some("OFW ")), &deps)
        .await
        .unwrap();
    assert_eq!(registrant.sector.as_deref(), Some("ofw"));
    assert_eq!(
        registrant.member_id.as_ref().map(|m| m.value()),
        Some(format!("{}0001", prefix))
    );

    let approved = update_status(registrant.id, RegistrantStatus::Approved, &deps)
        .await
        .unwrap();
    let member_id = approved.member_id.as_ref().unwrap();
    assert_eq!(member_id.value(), format!("{}0002", prefix));
    assert!(member_id.is_permanent());

    let reloaded = Registrant::find_by_id(registrant.id, &ctx.db_pool)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reloaded, approved);

    // Archiving keeps the permanent id
    let archived = update_status(registrant.id, RegistrantStatus::Archived, &deps)
        .await
        .unwrap();
    assert_eq!(archived.member_id, approved.member_id);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn reconcile_repairs_null_and_blank_statuses(ctx: &TestHarness) {
    let prefix = unique_prefix();
    let deps = ctx.deps_with_sectors(sectors_with_ofw_prefix(&prefix));

    let mut null_status = Registrant::from_new(NewRegistrant::new("Null Status", Some("ofw")));
    null_status.status = None;
    let null_status = null_status.insert(&ctx.db_pool).await.unwrap();

    let blank = Registrant::from_new(NewRegistrant::new("Blank Status", Some("ofw")));
    blank.insert(&ctx.db_pool).await.unwrap();
    sqlx::query("UPDATE registrants SET status = '' WHERE id = $1")
        .bind(blank.id)
        .execute(&ctx.db_pool)
        .await
        .unwrap();
    let blank = Registrant::find_by_id(blank.id, &ctx.db_pool)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(blank.status, None);

    let report = reconcile_statuses(vec![null_status, blank], &deps).await;
    assert_eq!(report.updated, 2);
    assert!(report.failed.is_empty());

    let repaired: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM registrants WHERE member_id_prefix = $1 AND status = 'pending'",
    )
    .bind(&prefix)
    .fetch_one(&ctx.db_pool)
    .await
    .unwrap();
    assert_eq!(repaired, 2);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn duplicate_member_id_is_reported_as_conflict(ctx: &TestHarness) {
    let prefix = unique_prefix();
    let deps = ctx.deps_with_sectors(sectors_with_ofw_prefix(&prefix));

    let first = register_registrant(NewRegistrant::new("First", Some("ofw")), &deps)
        .await
        .unwrap();
    let second = register_registrant(NewRegistrant::new("Second", Some("ofw")), &deps)
        .await
        .unwrap();

    let mut duplicate = second.clone();
    duplicate.member_id = first.member_id.clone();
    let err = deps.store.save_identity(&second, &duplicate).await.unwrap_err();
    assert!(matches!(err, RegistryError::ConcurrentAllocationConflict { .. }));
}

#[test_context(TestHarness)]
#[tokio::test]
async fn save_from_stale_copy_does_not_overwrite_approval(ctx: &TestHarness) {
    let prefix = unique_prefix();
    let deps = ctx.deps_with_sectors(sectors_with_ofw_prefix(&prefix));

    let registered = register_registrant(NewRegistrant::new("Stale Copy", Some("ofw")), &deps)
        .await
        .unwrap();
    let approved = update_status(registered.id, RegistrantStatus::Approved, &deps)
        .await
        .unwrap();

    let mut overwrite = registered.clone();
    overwrite.status = Some(RegistrantStatus::Incomplete);
    let err = deps
        .store
        .save_identity(&registered, &overwrite)
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::StaleRecord(id) if id == registered.id));

    let stored = Registrant::find_by_id(registered.id, &ctx.db_pool)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, Some(RegistrantStatus::Approved));
    assert_eq!(stored.member_id, approved.member_id);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn reconcile_from_stale_snapshot_keeps_permanent_id(ctx: &TestHarness) {
    let prefix = unique_prefix();
    let deps = ctx.deps_with_sectors(sectors_with_ofw_prefix(&prefix));

    let mut snapshot = Registrant::from_new(NewRegistrant::new("Late Sweep", Some("ofw")));
    snapshot.status = None;
    let snapshot = snapshot.insert(&ctx.db_pool).await.unwrap();

    update_status(snapshot.id, RegistrantStatus::Pending, &deps)
        .await
        .unwrap();
    let approved = update_status(snapshot.id, RegistrantStatus::Approved, &deps)
        .await
        .unwrap();

    let report = reconcile_statuses(vec![snapshot.clone()], &deps).await;
    assert_eq!(report.updated, 0);
    assert_eq!(report.skipped, 1);

    let stored = Registrant::find_by_id(snapshot.id, &ctx.db_pool)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, Some(RegistrantStatus::Approved));
    assert_eq!(stored.member_id, approved.member_id);
    assert!(stored.member_id.unwrap().is_permanent());
}
