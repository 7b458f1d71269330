//! Registrant activities - the callable operations behind HTTP handlers,
//! scheduled jobs and data migrations.

mod backfill_member_ids;
mod batch;
mod ensure_member_id;
mod persist_identity;
mod reconcile_statuses;
mod register_registrant;
mod stats;
mod update_status;

pub use backfill_member_ids::{backfill_filter, backfill_member_ids, BACKFILL_STATUSES};
pub use batch::{BatchReport, RecordFailure};
pub use ensure_member_id::ensure_member_id;
pub use persist_identity::{persist_identity, Persisted};
pub use reconcile_statuses::{reconcile_missing_statuses, reconcile_registrant, reconcile_statuses};
pub use register_registrant::register_registrant;
pub use stats::{registrant_stats, RegistrantStats};
pub use update_status::update_status;
