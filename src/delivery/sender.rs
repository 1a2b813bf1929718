//! Code senders behind the delivery collaborator.
//!
//! Email goes over SMTP (STARTTLS, then login) when a password is configured.
//! Without one it only logs that a code was issued (demo mode). Phone numbers
//! go to the SMSC HTTP gateway unless the API key is `demo`, in which case
//! nothing is sent and the request still succeeds.

use anyhow::{Context, Result, anyhow};
use lettre::{
    Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tracing::{Instrument, debug, info, info_span, instrument};
use url::Url;

use super::DeliveryRequest;
use crate::verification::ContactType;

pub const SMSC_GATEWAY_URL: &str = "https://smsc.ru/sys/send.php";
pub const DEMO_API_KEY: &str = "demo";

pub const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";
pub const DEFAULT_SMTP_PORT: u16 = 587;
pub const DEFAULT_SMTP_USER: &str = "noreply@poehali.dev";

const EMAIL_SENDER_NAME: &str = "Verification service";
const EMAIL_SUBJECT: &str = "Verification code";

/// Text of the message carrying the code.
#[must_use]
pub fn code_message(code: &str) -> String {
    format!("Your verification code: {code}")
}

/// Delivers a code to one contact. Errors carry the message returned to the caller.
pub trait CodeSender: Send + Sync {
    fn send<'a>(
        &'a self,
        contact: &'a str,
        code: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

    /// True when codes are only logged, never sent.
    fn is_demo(&self) -> bool {
        false
    }
}

/// Demo sender that logs the message instead of sending it.
#[derive(Clone, Debug)]
pub struct LogCodeSender {
    channel: &'static str,
}

impl LogCodeSender {
    #[must_use]
    pub const fn new(channel: &'static str) -> Self {
        Self { channel }
    }
}

impl CodeSender for LogCodeSender {
    fn send<'a>(
        &'a self,
        contact: &'a str,
        code: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            info!(channel = self.channel, contact = %contact, "demo mode: code not sent");
            debug!(channel = self.channel, text = %code_message(code), "demo message");
            Ok(())
        })
    }

    fn is_demo(&self) -> bool {
        true
    }
}

/// HTML body of the verification email.
fn code_email_html(code: &str) -> String {
    format!(
        r#"<html>
  <body style="font-family: Arial, sans-serif; padding: 20px; background-color: #f4f4f4;">
    <div style="max-width: 600px; margin: 0 auto; background-color: white; padding: 30px; border-radius: 10px;">
      <h2 style="color: #9b87f5; text-align: center;">Verification code</h2>
      <p style="font-size: 16px; color: #333;">Your confirmation code:</p>
      <div style="background-color: #f0ebff; padding: 20px; text-align: center; border-radius: 8px; margin: 20px 0;">
        <span style="font-size: 32px; font-weight: bold; color: #9b87f5; letter-spacing: 5px;">{code}</span>
      </div>
      <p style="font-size: 14px; color: #666;">Enter this code in the form to finish the verification.</p>
      <p style="font-size: 12px; color: #999; margin-top: 30px;">If you did not request this code, ignore this email.</p>
    </div>
  </body>
</html>
"#
    )
}

/// Email sender over SMTP with STARTTLS.
///
/// The SMTP user doubles as the sender address. A connection is opened per
/// message.
pub struct SmtpSender {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    host: String,
    port: u16,
}

impl SmtpSender {
    /// # Errors
    /// Returns an error if the user is not an email address or the host is invalid.
    pub fn new(host: &str, port: u16, user: &str, password: &SecretString) -> Result<Self> {
        let address: Address = user
            .parse()
            .with_context(|| format!("Invalid SMTP user address: {user}"))?;
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
            .with_context(|| format!("Invalid SMTP host: {host}"))?
            .port(port)
            .credentials(Credentials::new(
                user.to_string(),
                password.expose_secret().to_string(),
            ))
            .timeout(Some(Duration::from_secs(10)))
            .build();

        Ok(Self {
            transport,
            from: Mailbox::new(Some(EMAIL_SENDER_NAME.to_string()), address),
            host: host.to_string(),
            port,
        })
    }

    fn message(&self, contact: &str, code: &str) -> Result<Message> {
        let to: Mailbox = contact
            .parse()
            .with_context(|| format!("Invalid email address: {contact}"))?;
        Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(EMAIL_SUBJECT)
            .header(ContentType::TEXT_HTML)
            .body(code_email_html(code))
            .context("Failed to build email")
    }

    async fn send_email(&self, contact: &str, code: &str) -> Result<()> {
        let message = self.message(contact, code)?;

        let span = info_span!("smtp.send", smtp.host = %self.host, smtp.port = self.port);
        self.transport
            .send(message)
            .instrument(span)
            .await
            .context("Failed to send email")?;

        info!(contact = %contact, "verification email sent");
        Ok(())
    }
}

impl CodeSender for SmtpSender {
    fn send<'a>(
        &'a self,
        contact: &'a str,
        code: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(self.send_email(contact, code))
    }
}

impl std::fmt::Debug for SmtpSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpSender")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("from", &self.from.to_string())
            .field("password", &"***")
            .finish()
    }
}

/// SMS sender for the SMSC gateway.
///
/// The API key is `login:password`, or a bare login with an empty password.
#[derive(Clone)]
pub struct SmscSender {
    client: Client,
    gateway: Url,
    api_key: SecretString,
}

impl SmscSender {
    /// # Errors
    /// Returns an error if the gateway URL is invalid or the client cannot be built.
    pub fn new(gateway: &str, api_key: SecretString) -> Result<Self> {
        let gateway =
            Url::parse(gateway).with_context(|| format!("Invalid SMS gateway URL: {gateway}"))?;
        let client = Client::builder()
            .user_agent(crate::APP_USER_AGENT)
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .context("Failed to build SMS gateway client")?;
        Ok(Self {
            client,
            gateway,
            api_key,
        })
    }

    #[must_use]
    pub fn is_demo(&self) -> bool {
        self.api_key.expose_secret() == DEMO_API_KEY
    }

    async fn send_sms(&self, phone: &str, code: &str) -> Result<()> {
        if self.is_demo() {
            info!("SMS demo mode: code not sent");
            return Ok(());
        }

        let (login, password) = split_api_key(self.api_key.expose_secret());
        let phones = phone_digits(phone);
        let message = code_message(code);

        let span = info_span!("http.client", http.method = "GET", http.url = %self.gateway);
        let reply: Value = self
            .client
            .get(self.gateway.clone())
            .query(&[
                ("login", login),
                ("psw", password),
                ("phones", phones.as_str()),
                ("mes", message.as_str()),
                ("fmt", "3"),
            ])
            .send()
            .instrument(span)
            .await
            .context("SMS gateway request failed")?
            .json()
            .await
            .context("SMS gateway returned an invalid reply")?;

        if reply.get("error").is_some_and(|error| !error.is_null()) {
            let code = match reply.get("error_code") {
                Some(Value::String(code)) => code.clone(),
                Some(Value::Number(code)) => code.to_string(),
                _ => "SMS sending failed".to_string(),
            };
            return Err(anyhow!(code));
        }

        Ok(())
    }
}

impl CodeSender for SmscSender {
    fn send<'a>(
        &'a self,
        contact: &'a str,
        code: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(self.send_sms(contact, code))
    }

    fn is_demo(&self) -> bool {
        SmscSender::is_demo(self)
    }
}

impl std::fmt::Debug for SmscSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmscSender")
            .field("gateway", &self.gateway.as_str())
            .field("api_key", &"***")
            .finish_non_exhaustive()
    }
}

fn split_api_key(api_key: &str) -> (&str, &str) {
    api_key.split_once(':').unwrap_or((api_key, ""))
}

fn phone_digits(phone: &str) -> String {
    phone.chars().filter(char::is_ascii_digit).collect()
}

/// Routes a delivery request to the sender for its contact type.
#[derive(Clone)]
pub struct CodeSenders {
    email: Arc<dyn CodeSender>,
    sms: Arc<dyn CodeSender>,
}

impl CodeSenders {
    #[must_use]
    pub fn new(email: Arc<dyn CodeSender>, sms: Arc<dyn CodeSender>) -> Self {
        Self { email, sms }
    }

    /// # Errors
    /// Returns the sender's error; its message is what the caller sees.
    #[instrument(skip(self, request), fields(contact_type = %request.contact_type))]
    pub async fn send(&self, request: &DeliveryRequest) -> Result<()> {
        let sender = match request.contact_type {
            ContactType::Email => &self.email,
            ContactType::Phone => &self.sms,
        };
        sender.send(&request.contact, &request.code).await
    }

    #[must_use]
    pub fn email_is_demo(&self) -> bool {
        self.email.is_demo()
    }
}

impl std::fmt::Debug for CodeSenders {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodeSenders").finish_non_exhaustive()
    }
}
