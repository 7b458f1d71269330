use serde::Serialize;

use crate::common::RegistrantId;

/// One record a batch job could not process
#[derive(Debug, Clone, Serialize)]
pub struct RecordFailure {
    pub registrant_id: RegistrantId,
    pub error: String,
}

/// Outcome of a reconcile / backfill sweep
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub examined: usize,
    pub updated: usize,
    pub skipped: usize,
    pub failed: Vec<RecordFailure>,
}

impl BatchReport {
    pub fn merge(&mut self, other: BatchReport) {
        self.examined += other.examined;
        self.updated += other.updated;
        self.skipped += other.skipped;
        self.failed.extend(other.failed);
    }

    pub(crate) fn record_failure(&mut self, registrant_id: RegistrantId, error: impl ToString) {
        self.failed.push(RecordFailure {
            registrant_id,
            error: error.to_string(),
        });
    }
}
