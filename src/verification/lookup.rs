//! Admin lookup of issued verification codes.

use std::sync::Arc;
use tracing::{debug, instrument};

use super::codes::{CODE_LEN, normalize_lookup_code};
use super::error::LookupError;
use super::store::VerificationRepository;
use super::types::VerificationRecord;

#[derive(Clone)]
pub struct LookupService {
    store: Arc<dyn VerificationRepository>,
}

impl LookupService {
    #[must_use]
    pub fn new(store: Arc<dyn VerificationRepository>) -> Self {
        Self { store }
    }

    /// Find the record issued under `code`.
    ///
    /// `Ok(None)` means the code was never issued; it is not an error.
    ///
    /// # Errors
    /// `MalformedCode` when the input is not exactly six characters long.
    #[instrument(skip(self))]
    pub fn lookup(&self, code: &str) -> Result<Option<Arc<VerificationRecord>>, LookupError> {
        let length = code.chars().count();
        if length != CODE_LEN {
            return Err(LookupError::MalformedCode {
                expected: CODE_LEN,
                length,
            });
        }

        let code = normalize_lookup_code(code);
        let found = self.store.find_by_code(&code);
        debug!(found = found.is_some(), "verification lookup");
        Ok(found)
    }
}
