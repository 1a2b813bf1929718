//! # Verigate (Identity & Age Verification)
//!
//! `verigate` walks a person through a short verification flow and issues a
//! lookup code that an operator can later use to read the verified record back.
//!
//! ## Flow
//!
//! 1. **Collect:** name, age, contact (email or phone) and company. A six-digit
//!    session code is sent to the contact through the delivery collaborator; the
//!    flow only advances when delivery reports success.
//! 2. **Confirm:** the entered code must match the session code exactly, a photo
//!    must be attached and, for film companies, the screening (movie name, date
//!    and time) must be filled in.
//! 3. **Issued:** a six-character lookup code is generated and the record is
//!    appended to the verification store.
//!
//! ## Storage
//!
//! Records live in memory for the lifetime of the process. They are append-only
//! and are never updated or removed. Lookup codes are not checked for
//! uniqueness against existing records.
//!
//! ## Delivery
//!
//! Session codes are handed to a delivery collaborator, either a remote HTTP
//! endpoint (`--delivery-url`) or the in-process senders that also back the
//! `/v1/send-code` endpoint (email demo sender, SMSC gateway for phones).

pub mod api;
pub mod cli;
pub mod delivery;
pub mod verification;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
