use std::future::Future;
use std::pin::Pin;
use tracing::error;

use super::{CodeSenders, Delivery, DeliveryError, DeliveryMode, DeliveryRequest};

/// Delivers through the in-process senders instead of a remote collaborator.
#[derive(Clone, Debug)]
pub struct LocalDelivery {
    senders: CodeSenders,
}

impl LocalDelivery {
    #[must_use]
    pub fn new(senders: CodeSenders) -> Self {
        Self { senders }
    }
}

impl Delivery for LocalDelivery {
    fn deliver<'a>(
        &'a self,
        request: &'a DeliveryRequest,
    ) -> Pin<Box<dyn Future<Output = Result<(), DeliveryError>> + Send + 'a>> {
        Box::pin(async move {
            self.senders.send(request).await.map_err(|err| {
                error!("Failed to send code: {err:#}");
                DeliveryError::Rejected(err.to_string())
            })
        })
    }

    fn mode(&self) -> DeliveryMode {
        DeliveryMode::Local
    }
}
