//! Verification core: code generation, the flow state machine, the record
//! store and admin lookups. Nothing in here knows about HTTP.

mod codes;
mod error;
mod flow;
mod lookup;
mod registry;
mod store;
mod types;

pub use codes::{
    CODE_LEN, CodeSource, RandomCodes, issue_lookup_code, issue_session_code,
    normalize_lookup_code,
};
pub use error::{FlowError, LookupError};
pub use flow::{
    FlowController, FlowEvent, FlowState, check_confirmation, transition, validate_applicant,
};
pub use lookup::LookupService;
pub use registry::FlowRegistry;
pub use store::{InMemoryStore, VerificationRepository};
pub use types::{
    Applicant, ApplicantForm, Company, ConfirmationForm, ContactType, Screening, Step,
    VerificationRecord,
};
