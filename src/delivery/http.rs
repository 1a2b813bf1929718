use anyhow::{Context, Result};
use reqwest::Client;
use std::future::Future;
use std::pin::Pin;
use tracing::{Instrument, error, info_span, warn};
use url::Url;

use super::{
    DEFAULT_REJECTION, Delivery, DeliveryError, DeliveryMode, DeliveryRequest, DeliveryResponse,
};

/// Posts session codes to a remote delivery collaborator.
#[derive(Clone, Debug)]
pub struct HttpDelivery {
    client: Client,
    url: Url,
}

impl HttpDelivery {
    /// # Errors
    /// Returns an error if the URL is not http(s) or the client cannot be built.
    pub fn new(url: &str) -> Result<Self> {
        let url = Url::parse(url).with_context(|| format!("Invalid delivery URL: {url}"))?;
        if !matches!(url.scheme(), "http" | "https") {
            anyhow::bail!("Delivery URL must use http or https: {url}");
        }

        // No request timeout: the flow waits for the collaborator's answer.
        let client = Client::builder()
            .user_agent(crate::APP_USER_AGENT)
            .build()
            .context("Failed to build delivery HTTP client")?;

        Ok(Self { client, url })
    }

    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    async fn post(&self, request: &DeliveryRequest) -> Result<(), DeliveryError> {
        let response = self
            .client
            .post(self.url.clone())
            .json(request)
            .send()
            .await
            .map_err(|err| {
                error!("Failed to reach delivery service: {err}");
                DeliveryError::Unreachable
            })?;

        let status = response.status();
        let body: DeliveryResponse = response.json().await.map_err(|err| {
            error!("Invalid delivery response ({status}): {err}");
            DeliveryError::Unreachable
        })?;

        if status.is_success() && body.success {
            return Ok(());
        }

        warn!(status = %status, "delivery rejected");
        Err(DeliveryError::Rejected(
            body.error.unwrap_or_else(|| DEFAULT_REJECTION.to_string()),
        ))
    }
}

impl Delivery for HttpDelivery {
    fn deliver<'a>(
        &'a self,
        request: &'a DeliveryRequest,
    ) -> Pin<Box<dyn Future<Output = Result<(), DeliveryError>> + Send + 'a>> {
        let span = info_span!(
            "http.client",
            http.method = "POST",
            http.url = %self.url,
            contact_type = %request.contact_type
        );
        Box::pin(self.post(request).instrument(span))
    }

    fn mode(&self) -> DeliveryMode {
        DeliveryMode::Remote
    }
}
