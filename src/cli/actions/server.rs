use crate::{
    api,
    delivery::{
        CodeSenders, Delivery, HttpDelivery, LocalDelivery, LogCodeSender, SmscSender,
        SmtpSender, sender::CodeSender,
    },
    verification::{FlowController, FlowRegistry, InMemoryStore, LookupService, RandomCodes},
};
use anyhow::Result;
use secrecy::SecretString;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub allowed_origin: Option<String>,
    pub delivery_url: Option<String>,
    pub sms_api_key: SecretString,
    pub sms_gateway_url: String,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_user: String,
    pub smtp_password: Option<SecretString>,
}

/// SMTP when a password is configured, otherwise the logging demo sender.
fn email_sender(args: &Args) -> Result<Arc<dyn CodeSender>> {
    match &args.smtp_password {
        Some(password) => {
            let smtp = SmtpSender::new(&args.smtp_host, args.smtp_port, &args.smtp_user, password)?;
            info!(host = %args.smtp_host, port = args.smtp_port, "email codes sent over SMTP");
            Ok(Arc::new(smtp))
        }
        None => {
            info!("SMTP password not set, email codes are only logged");
            Ok(Arc::new(LogCodeSender::new("email")))
        }
    }
}

/// Wire the senders, the delivery collaborator, the store and the flow registry.
///
/// # Errors
/// Returns an error if a configured URL or SMTP setting is invalid.
pub fn services(args: &Args) -> Result<api::Services> {
    let sms = SmscSender::new(&args.sms_gateway_url, args.sms_api_key.clone())?;
    if sms.is_demo() {
        info!("SMS sender in demo mode, codes are only logged");
    }

    let senders = CodeSenders::new(email_sender(args)?, Arc::new(sms));

    let delivery: Arc<dyn Delivery> = match &args.delivery_url {
        Some(url) => {
            let http = HttpDelivery::new(url)?;
            info!(url = %http.url(), "session codes posted to the delivery service");
            Arc::new(http)
        }
        None => Arc::new(LocalDelivery::new(senders.clone())),
    };
    info!(mode = delivery.mode().as_str(), "code delivery configured");

    let store = Arc::new(InMemoryStore::new());
    let controller = FlowController::new(store.clone(), delivery, Arc::new(RandomCodes));

    Ok(api::Services::new(
        FlowRegistry::new(controller),
        LookupService::new(store),
        senders,
    ))
}

/// Execute the server action.
/// # Errors
/// Returns an error if the configuration is invalid or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    debug!("Server args: {:?}", args);

    let services = services(&args)?;

    api::new(args.port, services, args.allowed_origin).await
}
