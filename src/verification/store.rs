//! Append-only in-memory verification store.

use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

use super::codes::normalize_lookup_code;
use super::types::VerificationRecord;

/// Repository of completed verifications.
///
/// Records are shared read-only; nothing hands out a mutable reference.
pub trait VerificationRepository: Send + Sync {
    /// Append a record. No deduplication.
    fn append(&self, record: Arc<VerificationRecord>);
    /// First record whose code equals the upper-cased input.
    fn find_by_code(&self, code: &str) -> Option<Arc<VerificationRecord>>;
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
    records: RwLock<Vec<Arc<VerificationRecord>>>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl VerificationRepository for InMemoryStore {
    fn append(&self, record: Arc<VerificationRecord>) {
        // A panic while holding the lock cannot leave the Vec half-written.
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        records.push(record);
        debug!(records = records.len(), "verification record stored");
    }

    fn find_by_code(&self, code: &str) -> Option<Arc<VerificationRecord>> {
        let code = normalize_lookup_code(code);
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        records
            .iter()
            .find(|record| record.verification_code == code)
            .cloned()
    }

    fn len(&self) -> usize {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
