//! One flow per browser session, keyed by ULID.

use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::{debug, instrument};
use ulid::Ulid;

use super::error::FlowError;
use super::flow::{FlowController, FlowState, transition};
use super::types::{ApplicantForm, ConfirmationForm};

/// Flows live for the lifetime of the process, like the records they produce.
#[derive(Debug)]
pub struct FlowRegistry {
    controller: FlowController,
    flows: Mutex<HashMap<Ulid, FlowState>>,
}

impl FlowRegistry {
    #[must_use]
    pub fn new(controller: FlowController) -> Self {
        Self {
            controller,
            flows: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn controller(&self) -> &FlowController {
        &self.controller
    }

    pub async fn create(&self) -> Ulid {
        let id = Ulid::new();
        self.flows.lock().await.insert(id, FlowState::Collect);
        debug!(flow_id = %id, "verification flow created");
        id
    }

    /// # Errors
    /// `UnknownFlow` if `id` was never created.
    pub async fn get(&self, id: Ulid) -> Result<FlowState, FlowError> {
        self.flows
            .lock()
            .await
            .get(&id)
            .cloned()
            .ok_or(FlowError::UnknownFlow(id))
    }

    /// Submit the first step. The lock is released while the code is delivered.
    ///
    /// # Errors
    /// `UnknownFlow`, or anything [`FlowController::send_code`] reports.
    #[instrument(skip(self, form))]
    pub async fn submit_applicant(
        &self,
        id: Ulid,
        form: ApplicantForm,
    ) -> Result<FlowState, FlowError> {
        let step = self.get(id).await?.step();
        let event = self.controller.send_code(step, form).await?;

        let mut flows = self.flows.lock().await;
        let current = flows.get(&id).ok_or(FlowError::UnknownFlow(id))?;
        let next = transition(current, event)?;
        flows.insert(id, next.clone());
        Ok(next)
    }

    /// Submit the second step. A rejected confirmation keeps the flow where it is.
    ///
    /// # Errors
    /// `UnknownFlow`, or anything [`FlowController::confirm`] reports.
    #[instrument(skip(self, form))]
    pub async fn confirm(&self, id: Ulid, form: ConfirmationForm) -> Result<FlowState, FlowError> {
        let mut flows = self.flows.lock().await;
        let current = flows.get(&id).ok_or(FlowError::UnknownFlow(id))?;
        let next = self.controller.confirm(current, form)?;
        flows.insert(id, next.clone());
        Ok(next)
    }

    /// Clear the flow back to the first step. Issued records stay in the store.
    ///
    /// # Errors
    /// `UnknownFlow` if `id` was never created.
    pub async fn reset(&self, id: Ulid) -> Result<FlowState, FlowError> {
        let mut flows = self.flows.lock().await;
        let state = flows.get_mut(&id).ok_or(FlowError::UnknownFlow(id))?;
        *state = FlowState::Collect;
        Ok(FlowState::Collect)
    }

    pub async fn len(&self) -> usize {
        self.flows.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delivery::DeliveryError;
    use crate::verification::flow::tests::{FixedCodes, RecordingDelivery, ivan};
    use crate::verification::store::{InMemoryStore, VerificationRepository};
    use crate::verification::types::Step;
    use std::sync::Arc;

    fn registry(delivery: RecordingDelivery) -> (FlowRegistry, Arc<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::new());
        let controller = FlowController::new(
            store.clone(),
            Arc::new(delivery),
            Arc::new(FixedCodes {
                session: "482913".to_string(),
                lookup: "AB12CD".to_string(),
            }),
        );
        (FlowRegistry::new(controller), store)
    }

    fn confirmation(code: &str) -> ConfirmationForm {
        ConfirmationForm {
            code: code.to_string(),
            photo_present: true,
            ..ConfirmationForm::default()
        }
    }

    #[tokio::test]
    async fn new_flow_starts_collecting() -> Result<(), FlowError> {
        let (registry, _) = registry(RecordingDelivery::default());
        let id = registry.create().await;
        assert_eq!(registry.get(id).await?, FlowState::Collect);
        assert_eq!(registry.len().await, 1);
        Ok(())
    }

    #[tokio::test]
    async fn unknown_flow_is_reported() {
        let (registry, _) = registry(RecordingDelivery::default());
        let id = Ulid::new();
        assert_eq!(registry.get(id).await, Err(FlowError::UnknownFlow(id)));
        assert_eq!(registry.reset(id).await, Err(FlowError::UnknownFlow(id)));
    }

    #[tokio::test]
    async fn full_flow_then_reset_keeps_record() -> Result<(), FlowError> {
        let (registry, store) = registry(RecordingDelivery::default());
        let id = registry.create().await;

        let state = registry.submit_applicant(id, ivan()).await?;
        assert_eq!(state.step(), Step::Confirm);

        let mismatch = registry.confirm(id, confirmation("000000")).await;
        assert_eq!(mismatch, Err(FlowError::CodeMismatch));
        assert_eq!(registry.get(id).await?.step(), Step::Confirm);

        let issued = registry.confirm(id, confirmation("482913")).await?;
        assert_eq!(issued.step(), Step::Issued);

        assert_eq!(registry.reset(id).await?, FlowState::Collect);
        assert_eq!(registry.get(id).await?, FlowState::Collect);
        assert!(store.find_by_code("AB12CD").is_some());
        Ok(())
    }

    #[tokio::test]
    async fn delivery_failure_stays_collecting() -> Result<(), FlowError> {
        let (registry, _) = registry(RecordingDelivery {
            fail_with: Some("Missing required fields".to_string()),
            ..RecordingDelivery::default()
        });
        let id = registry.create().await;

        let result = registry.submit_applicant(id, ivan()).await;
        assert_eq!(
            result,
            Err(FlowError::Delivery(DeliveryError::Rejected(
                "Missing required fields".to_string()
            )))
        );
        assert_eq!(registry.get(id).await?, FlowState::Collect);
        Ok(())
    }

    #[tokio::test]
    async fn second_submit_in_confirm_is_rejected() -> Result<(), FlowError> {
        let (registry, _) = registry(RecordingDelivery::default());
        let id = registry.create().await;
        registry.submit_applicant(id, ivan()).await?;

        let again = registry.submit_applicant(id, ivan()).await;
        assert!(matches!(
            again,
            Err(FlowError::InvalidStep {
                step: Step::Confirm,
                ..
            })
        ));
        Ok(())
    }
}
