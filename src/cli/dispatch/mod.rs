//! Map parsed CLI arguments to the action to run.

use crate::cli::actions::{Action, server::Args};
use crate::cli::commands::{ARG_ALLOWED_ORIGIN, ARG_PORT, delivery};
use anyhow::Result;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>(ARG_PORT).copied().unwrap_or(8080);
    let allowed_origin = matches
        .get_one::<String>(ARG_ALLOWED_ORIGIN)
        .map(|origin| origin.trim().to_string())
        .filter(|origin| !origin.is_empty());

    let delivery_opts = delivery::Options::parse(matches)?;

    Ok(Action::Server(Args {
        port,
        allowed_origin,
        delivery_url: delivery_opts.url,
        sms_api_key: delivery_opts.sms_api_key,
        sms_gateway_url: delivery_opts.sms_gateway_url,
        smtp_host: delivery_opts.smtp_host,
        smtp_port: delivery_opts.smtp_port,
        smtp_user: delivery_opts.smtp_user,
        smtp_password: delivery_opts.smtp_password,
    }))
}
