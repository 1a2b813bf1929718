use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;

use crate::delivery::sender::{
    DEFAULT_SMTP_HOST, DEFAULT_SMTP_PORT, DEFAULT_SMTP_USER, DEMO_API_KEY, SMSC_GATEWAY_URL,
};

pub const ARG_DELIVERY_URL: &str = "delivery-url";
pub const ARG_SMS_API_KEY: &str = "sms-api-key";
pub const ARG_SMS_GATEWAY_URL: &str = "sms-gateway-url";
pub const ARG_SMTP_HOST: &str = "smtp-host";
pub const ARG_SMTP_PORT: &str = "smtp-port";
pub const ARG_SMTP_USER: &str = "smtp-user";
pub const ARG_SMTP_PASSWORD: &str = "smtp-password";

#[derive(Debug, Clone)]
pub struct Options {
    /// Remote delivery collaborator; `None` delivers through the local senders.
    pub url: Option<String>,
    pub sms_api_key: SecretString,
    pub sms_gateway_url: String,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_user: String,
    /// Without a password email codes are only logged.
    pub smtp_password: Option<SecretString>,
}

impl Options {
    /// Parse delivery arguments from matches.
    ///
    /// # Errors
    /// Returns an error if the SMS gateway URL, SMTP host or SMTP user is blank.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        let url = matches
            .get_one::<String>(ARG_DELIVERY_URL)
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty());

        let sms_api_key = matches
            .get_one::<String>(ARG_SMS_API_KEY)
            .cloned()
            .filter(|key| !key.trim().is_empty())
            .unwrap_or_else(|| DEMO_API_KEY.to_string());

        let sms_gateway_url = matches
            .get_one::<String>(ARG_SMS_GATEWAY_URL)
            .cloned()
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| anyhow::anyhow!("missing required argument: --{ARG_SMS_GATEWAY_URL}"))?;

        let smtp_host = required(matches, ARG_SMTP_HOST)?;
        let smtp_user = required(matches, ARG_SMTP_USER)?;
        let smtp_port = matches
            .get_one::<u16>(ARG_SMTP_PORT)
            .copied()
            .unwrap_or(DEFAULT_SMTP_PORT);

        let smtp_password = matches
            .get_one::<String>(ARG_SMTP_PASSWORD)
            .filter(|password| !password.is_empty())
            .map(|password| SecretString::from(password.clone()));

        Ok(Self {
            url,
            sms_api_key: SecretString::from(sms_api_key),
            sms_gateway_url,
            smtp_host,
            smtp_port,
            smtp_user,
            smtp_password,
        })
    }
}

fn required(matches: &ArgMatches, name: &str) -> anyhow::Result<String> {
    matches
        .get_one::<String>(name)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| anyhow::anyhow!("missing required argument: --{name}"))
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_DELIVERY_URL)
                .long(ARG_DELIVERY_URL)
                .help("URL of the code delivery service")
                .long_help(
                    "URL of the code delivery service. Session codes are POSTed as {contactType, contact, code}. When unset, codes are sent by this process through the same senders that back /v1/send-code.",
                )
                .env("VERIGATE_DELIVERY_URL"),
        )
        .arg(
            Arg::new(ARG_SMS_API_KEY)
                .long(ARG_SMS_API_KEY)
                .help("SMSC credentials as login:password, or 'demo' to only log codes")
                .default_value(DEMO_API_KEY)
                .env("VERIGATE_SMS_API_KEY")
                .hide_env_values(true),
        )
        .arg(
            Arg::new(ARG_SMS_GATEWAY_URL)
                .long(ARG_SMS_GATEWAY_URL)
                .help("SMSC send endpoint")
                .default_value(SMSC_GATEWAY_URL)
                .env("VERIGATE_SMS_GATEWAY_URL"),
        )
        .arg(
            Arg::new(ARG_SMTP_HOST)
                .long(ARG_SMTP_HOST)
                .help("SMTP relay for email codes, reached with STARTTLS")
                .default_value(DEFAULT_SMTP_HOST)
                .env("VERIGATE_SMTP_HOST"),
        )
        .arg(
            Arg::new(ARG_SMTP_PORT)
                .long(ARG_SMTP_PORT)
                .help("SMTP relay port")
                .default_value("587")
                .env("VERIGATE_SMTP_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new(ARG_SMTP_USER)
                .long(ARG_SMTP_USER)
                .help("SMTP login, also used as the sender address")
                .default_value(DEFAULT_SMTP_USER)
                .env("VERIGATE_SMTP_USER"),
        )
        .arg(
            Arg::new(ARG_SMTP_PASSWORD)
                .long(ARG_SMTP_PASSWORD)
                .help("SMTP password; when unset email codes are only logged")
                .env("VERIGATE_SMTP_PASSWORD")
                .hide_env_values(true),
        )
}
