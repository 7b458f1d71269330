//! Kernel module - server infrastructure and dependencies.

pub mod deps;
pub mod postgres;
pub mod scheduled_tasks;
pub mod test_dependencies;
pub mod traits;

pub use deps::{ServerDeps, DEFAULT_BATCH_SIZE};
pub use postgres::{PgRegistrantStore, PgSequenceAllocator};
pub use scheduled_tasks::start_scheduler;
pub use test_dependencies::{InMemoryRegistrantStore, InMemorySequenceAllocator, TestDependencies};
pub use traits::*;
