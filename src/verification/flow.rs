//! Verification flow state machine.
//!
//! The flow is a three step sequence: collect the applicant's details, confirm
//! the session code together with the evidence, and issue a lookup code.
//! [`transition`] is pure: every random value and every side effect (code
//! generation, delivery, storing the record) is owned by [`FlowController`],
//! which feeds the results in as [`FlowEvent`]s.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, instrument};

use super::codes::CodeSource;
use super::error::FlowError;
use super::store::VerificationRepository;
use super::types::{
    Applicant, ApplicantForm, Company, ConfirmationForm, Screening, Step, VerificationRecord,
};
use crate::delivery::{Delivery, DeliveryRequest};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum FlowState {
    #[default]
    Collect,
    Confirm {
        applicant: Applicant,
        session_code: String,
    },
    Issued {
        record: Arc<VerificationRecord>,
    },
}

impl FlowState {
    #[must_use]
    pub const fn step(&self) -> Step {
        match self {
            Self::Collect => Step::Collect,
            Self::Confirm { .. } => Step::Confirm,
            Self::Issued { .. } => Step::Issued,
        }
    }
}

#[derive(Clone, Debug)]
pub enum FlowEvent {
    /// The delivery collaborator accepted the session code.
    CodeDelivered {
        applicant: Applicant,
        session_code: String,
    },
    /// Second step submitted; `lookup_code` is used only if it is accepted.
    Confirm {
        form: ConfirmationForm,
        lookup_code: String,
        issued_at: DateTime<Utc>,
    },
    Reset,
}

/// Validate the first step. All four of name, age, contact and company must be non-empty.
///
/// # Errors
/// `MissingFields` naming every empty field, or `UnknownCompany`.
pub fn validate_applicant(form: ApplicantForm) -> Result<Applicant, FlowError> {
    let missing: Vec<&'static str> = [
        ("name", form.name.is_empty()),
        ("age", form.age.is_empty()),
        ("contact", form.contact.is_empty()),
        ("company", form.company.is_empty()),
    ]
    .into_iter()
    .filter_map(|(field, empty)| empty.then_some(field))
    .collect();

    if !missing.is_empty() {
        return Err(FlowError::MissingFields(missing));
    }

    let company =
        Company::parse(&form.company).ok_or_else(|| FlowError::UnknownCompany(form.company))?;

    Ok(Applicant {
        name: form.name,
        age: form.age,
        contact: form.contact,
        contact_type: form.contact_type,
        company,
    })
}

/// Validate the second step against the code that was sent.
///
/// Missing evidence is reported before the code comparison so the two failures
/// stay distinguishable.
///
/// # Errors
/// `MissingFields` or `CodeMismatch`.
pub fn check_confirmation(
    company: Company,
    session_code: &str,
    form: ConfirmationForm,
) -> Result<Option<Screening>, FlowError> {
    let mut missing = Vec::new();
    if form.code.is_empty() {
        missing.push("code");
    }
    if !form.photo_present {
        missing.push("photo");
    }
    if company.requires_screening() {
        if form.movie_name.is_empty() {
            missing.push("movieName");
        }
        if form.movie_date.is_empty() {
            missing.push("movieDate");
        }
        if form.movie_time.is_empty() {
            missing.push("movieTime");
        }
    }
    if !missing.is_empty() {
        return Err(FlowError::MissingFields(missing));
    }

    if form.code != session_code {
        return Err(FlowError::CodeMismatch);
    }

    Ok(company.requires_screening().then(|| Screening {
        movie_name: form.movie_name,
        movie_date: form.movie_date,
        movie_time: form.movie_time,
    }))
}

/// Compute the next state. On error the caller keeps the current state.
///
/// A delivery that lands while the flow already waits for confirmation replaces
/// the session code: concurrent sends are not deduplicated and the last one wins.
///
/// # Errors
/// Any [`FlowError`] from validation, or `InvalidStep` when the event does not
/// belong to the current step.
pub fn transition(state: &FlowState, event: FlowEvent) -> Result<FlowState, FlowError> {
    match (state, event) {
        (
            FlowState::Collect | FlowState::Confirm { .. },
            FlowEvent::CodeDelivered {
                applicant,
                session_code,
            },
        ) => Ok(FlowState::Confirm {
            applicant,
            session_code,
        }),
        (
            FlowState::Confirm {
                applicant,
                session_code,
            },
            FlowEvent::Confirm {
                form,
                lookup_code,
                issued_at,
            },
        ) => {
            let screening = check_confirmation(applicant.company, session_code, form)?;
            let record =
                VerificationRecord::new(applicant.clone(), lookup_code, screening, issued_at);
            Ok(FlowState::Issued {
                record: Arc::new(record),
            })
        }
        (_, FlowEvent::Reset) => Ok(FlowState::Collect),
        (state, FlowEvent::CodeDelivered { .. }) => Err(FlowError::InvalidStep {
            step: state.step(),
            action: "send a code",
        }),
        (state, FlowEvent::Confirm { .. }) => Err(FlowError::InvalidStep {
            step: state.step(),
            action: "confirm",
        }),
    }
}

/// Runs the side effects around [`transition`].
#[derive(Clone)]
pub struct FlowController {
    store: Arc<dyn VerificationRepository>,
    delivery: Arc<dyn Delivery>,
    codes: Arc<dyn CodeSource>,
}

impl FlowController {
    #[must_use]
    pub fn new(
        store: Arc<dyn VerificationRepository>,
        delivery: Arc<dyn Delivery>,
        codes: Arc<dyn CodeSource>,
    ) -> Self {
        Self {
            store,
            delivery,
            codes,
        }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn VerificationRepository> {
        &self.store
    }

    #[must_use]
    pub fn delivery(&self) -> &Arc<dyn Delivery> {
        &self.delivery
    }

    /// Validate the first step and send a fresh session code to the contact.
    ///
    /// Returns the event to apply once delivery succeeded; nothing changes
    /// when delivery fails. There is no timeout on the delivery call.
    ///
    /// # Errors
    /// `InvalidStep` outside the collect step, validation errors, or the
    /// delivery failure reported by the collaborator.
    #[instrument(skip(self, form), fields(contact_type = %form.contact_type))]
    pub async fn send_code(&self, step: Step, form: ApplicantForm) -> Result<FlowEvent, FlowError> {
        if step != Step::Collect {
            return Err(FlowError::InvalidStep {
                step,
                action: "send a code",
            });
        }

        let applicant = validate_applicant(form)?;
        let session_code = self.codes.session_code();
        debug!(session_code = %session_code, "issued session code");

        let request = DeliveryRequest {
            contact_type: applicant.contact_type,
            contact: applicant.contact.clone(),
            code: session_code.clone(),
        };
        self.delivery.deliver(&request).await?;

        info!(company = %applicant.company, "session code delivered");

        Ok(FlowEvent::CodeDelivered {
            applicant,
            session_code,
        })
    }

    /// Confirm the second step and store the resulting record.
    ///
    /// # Errors
    /// `InvalidStep` outside the confirm step, `MissingFields` or `CodeMismatch`.
    pub fn confirm(&self, state: &FlowState, form: ConfirmationForm) -> Result<FlowState, FlowError> {
        let event = FlowEvent::Confirm {
            form,
            lookup_code: self.codes.lookup_code(),
            issued_at: Utc::now(),
        };
        let next = transition(state, event)?;
        if let FlowState::Issued { record } = &next {
            self.store.append(Arc::clone(record));
            info!(
                verification_code = %record.verification_code,
                company = %record.company,
                "verification issued"
            );
        }
        Ok(next)
    }
}

impl std::fmt::Debug for FlowController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlowController")
            .field("records", &self.store.len())
            .field("delivery", &self.delivery.mode())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::delivery::{DeliveryError, DeliveryMode};
    use crate::verification::store::InMemoryStore;
    use crate::verification::types::ContactType;
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::Mutex;

    pub(crate) struct FixedCodes {
        pub(crate) session: String,
        pub(crate) lookup: String,
    }

    impl CodeSource for FixedCodes {
        fn session_code(&self) -> String {
            self.session.clone()
        }

        fn lookup_code(&self) -> String {
            self.lookup.clone()
        }
    }

    /// Records every request and answers with a canned outcome.
    #[derive(Default)]
    pub(crate) struct RecordingDelivery {
        pub(crate) fail_with: Option<String>,
        pub(crate) sent: Mutex<Vec<DeliveryRequest>>,
    }

    impl Delivery for RecordingDelivery {
        fn deliver<'a>(
            &'a self,
            request: &'a DeliveryRequest,
        ) -> Pin<Box<dyn Future<Output = Result<(), DeliveryError>> + Send + 'a>> {
            Box::pin(async move {
                if let Ok(mut sent) = self.sent.lock() {
                    sent.push(request.clone());
                }
                match &self.fail_with {
                    Some(message) => Err(DeliveryError::Rejected(message.clone())),
                    None => Ok(()),
                }
            })
        }

        fn mode(&self) -> DeliveryMode {
            DeliveryMode::Local
        }
    }

    pub(crate) fn ivan() -> ApplicantForm {
        ApplicantForm {
            name: "Ivan".to_string(),
            age: "25".to_string(),
            contact: "a@b.com".to_string(),
            contact_type: ContactType::Email,
            company: "retail".to_string(),
        }
    }

    fn applicant(company: Company) -> Applicant {
        Applicant {
            name: "Ivan".to_string(),
            age: "25".to_string(),
            contact: "a@b.com".to_string(),
            contact_type: ContactType::Email,
            company,
        }
    }

    fn confirm_state(company: Company) -> FlowState {
        FlowState::Confirm {
            applicant: applicant(company),
            session_code: "482913".to_string(),
        }
    }

    fn confirmation(code: &str, photo: bool) -> ConfirmationForm {
        ConfirmationForm {
            code: code.to_string(),
            photo_present: photo,
            ..ConfirmationForm::default()
        }
    }

    fn confirm_event(form: ConfirmationForm) -> FlowEvent {
        FlowEvent::Confirm {
            form,
            lookup_code: "C0FFEE".to_string(),
            issued_at: Utc::now(),
        }
    }

    fn controller(delivery: Arc<RecordingDelivery>) -> (FlowController, Arc<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::new());
        let controller = FlowController::new(
            store.clone(),
            delivery,
            Arc::new(FixedCodes {
                session: "482913".to_string(),
                lookup: "K7Q2ZD".to_string(),
            }),
        );
        (controller, store)
    }

    #[test]
    fn validate_applicant_reports_all_missing_fields() {
        let result = validate_applicant(ApplicantForm::default());
        assert_eq!(
            result,
            Err(FlowError::MissingFields(vec![
                "name", "age", "contact", "company"
            ]))
        );
    }

    #[test]
    fn validate_applicant_rejects_unknown_company() {
        let form = ApplicantForm {
            company: "casino".to_string(),
            ..ivan()
        };
        assert_eq!(
            validate_applicant(form),
            Err(FlowError::UnknownCompany("casino".to_string()))
        );
    }

    #[test]
    fn validate_applicant_keeps_input_verbatim() {
        let form = ApplicantForm {
            name: "  Ivan Ivanov ".to_string(),
            age: "twenty five".to_string(),
            ..ivan()
        };
        let applicant = validate_applicant(form);
        assert_eq!(
            applicant.map(|a| (a.name, a.age)),
            Ok(("  Ivan Ivanov ".to_string(), "twenty five".to_string()))
        );
    }

    #[test]
    fn confirmation_succeeds_only_with_code_and_photo() {
        for (code, photo, ok) in [
            ("482913", true, true),
            ("482913", false, false),
            ("482914", true, false),
            ("", true, false),
            ("48291", true, false),
        ] {
            let result = transition(
                &confirm_state(Company::Retail),
                confirm_event(confirmation(code, photo)),
            );
            assert_eq!(result.is_ok(), ok, "code={code} photo={photo}");
        }
    }

    #[test]
    fn code_comparison_is_case_sensitive() {
        let state = FlowState::Confirm {
            applicant: applicant(Company::Other),
            session_code: "ab12cd".to_string(),
        };
        let result = transition(&state, confirm_event(confirmation("AB12CD", true)));
        assert_eq!(result, Err(FlowError::CodeMismatch));
    }

    #[test]
    fn mismatch_is_distinct_from_missing_photo() {
        let state = confirm_state(Company::Retail);
        assert_eq!(
            transition(&state, confirm_event(confirmation("000000", true))),
            Err(FlowError::CodeMismatch)
        );
        assert_eq!(
            transition(&state, confirm_event(confirmation("482913", false))),
            Err(FlowError::MissingFields(vec!["photo"]))
        );
    }

    #[test]
    fn films_require_every_screening_field() {
        let state = confirm_state(Company::Films);
        let result = transition(&state, confirm_event(confirmation("482913", true)));
        assert_eq!(
            result,
            Err(FlowError::MissingFields(vec![
                "movieName",
                "movieDate",
                "movieTime"
            ]))
        );

        let partial = ConfirmationForm {
            movie_name: "Solaris".to_string(),
            movie_date: "2026-10-20".to_string(),
            ..confirmation("482913", true)
        };
        assert_eq!(
            transition(&state, confirm_event(partial)),
            Err(FlowError::MissingFields(vec!["movieTime"]))
        );
    }

    #[test]
    fn films_record_carries_screening() {
        let form = ConfirmationForm {
            movie_name: "Solaris".to_string(),
            movie_date: "2026-10-20".to_string(),
            movie_time: "19:30".to_string(),
            ..confirmation("482913", true)
        };
        let next = transition(&confirm_state(Company::Films), confirm_event(form));
        let Ok(FlowState::Issued { record }) = next else {
            panic!("expected issued state");
        };
        assert_eq!(
            record.screening,
            Some(Screening {
                movie_name: "Solaris".to_string(),
                movie_date: "2026-10-20".to_string(),
                movie_time: "19:30".to_string(),
            })
        );
        assert_eq!(record.verification_code, "C0FFEE");
    }

    #[test]
    fn screening_is_dropped_for_other_companies() {
        let form = ConfirmationForm {
            movie_name: "Solaris".to_string(),
            ..confirmation("482913", true)
        };
        let next = transition(&confirm_state(Company::Finance), confirm_event(form));
        let Ok(FlowState::Issued { record }) = next else {
            panic!("expected issued state");
        };
        assert!(record.screening.is_none());
    }

    #[test]
    fn events_outside_their_step_are_rejected() {
        assert_eq!(
            transition(
                &FlowState::Collect,
                confirm_event(confirmation("482913", true))
            ),
            Err(FlowError::InvalidStep {
                step: Step::Collect,
                action: "confirm",
            })
        );

        let issued = transition(
            &confirm_state(Company::Retail),
            confirm_event(confirmation("482913", true)),
        );
        let Ok(issued) = issued else {
            panic!("expected issued state");
        };
        let again = transition(
            &issued,
            FlowEvent::CodeDelivered {
                applicant: applicant(Company::Retail),
                session_code: "111111".to_string(),
            },
        );
        assert!(matches!(
            again,
            Err(FlowError::InvalidStep {
                step: Step::Issued,
                ..
            })
        ));
    }

    #[test]
    fn late_delivery_replaces_session_code() {
        let next = transition(
            &confirm_state(Company::Retail),
            FlowEvent::CodeDelivered {
                applicant: applicant(Company::Retail),
                session_code: "555555".to_string(),
            },
        );
        assert!(matches!(
            next,
            Ok(FlowState::Confirm { ref session_code, .. }) if session_code == "555555"
        ));
    }

    #[test]
    fn reset_returns_to_collect_from_every_step() {
        for state in [FlowState::Collect, confirm_state(Company::Films)] {
            assert_eq!(transition(&state, FlowEvent::Reset), Ok(FlowState::Collect));
        }
    }

    #[tokio::test]
    async fn send_code_delivers_to_contact_once() -> Result<(), FlowError> {
        let delivery = Arc::new(RecordingDelivery::default());
        let (controller, _) = controller(delivery.clone());

        let event = controller.send_code(Step::Collect, ivan()).await?;
        let next = transition(&FlowState::Collect, event)?;
        assert_eq!(next.step(), Step::Confirm);

        let sent = delivery.sent.lock().map(|s| s.clone()).unwrap_or_default();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].contact, "a@b.com");
        assert_eq!(sent[0].code, "482913");
        assert_eq!(sent[0].contact_type, ContactType::Email);
        Ok(())
    }

    #[tokio::test]
    async fn failed_delivery_does_not_advance() {
        let delivery = Arc::new(RecordingDelivery {
            fail_with: Some("SMTP down".to_string()),
            ..RecordingDelivery::default()
        });
        let (controller, _) = controller(delivery);

        let result = controller.send_code(Step::Collect, ivan()).await;
        assert_eq!(
            result.map(|_| ()),
            Err(FlowError::Delivery(DeliveryError::Rejected(
                "SMTP down".to_string()
            )))
        );
    }

    #[tokio::test]
    async fn invalid_applicant_is_not_sent() {
        let delivery = Arc::new(RecordingDelivery::default());
        let (controller, _) = controller(delivery.clone());

        let form = ApplicantForm {
            contact: String::new(),
            ..ivan()
        };
        let result = controller.send_code(Step::Collect, form).await;
        assert!(matches!(result, Err(FlowError::MissingFields(_))));
        assert!(delivery.sent.lock().map(|s| s.is_empty()).unwrap_or(false));
    }

    #[tokio::test]
    async fn retail_scenario_stores_exact_record() -> Result<(), FlowError> {
        let delivery = Arc::new(RecordingDelivery::default());
        let (controller, store) = controller(delivery);

        let event = controller.send_code(Step::Collect, ivan()).await?;
        let state = transition(&FlowState::Collect, event)?;
        let issued = controller.confirm(&state, confirmation("482913", true))?;

        let FlowState::Issued { record } = issued else {
            panic!("expected issued state");
        };
        assert_eq!(record.verification_code.len(), 6);

        let found = store.find_by_code(&record.verification_code);
        let Some(found) = found else {
            panic!("issued record not found");
        };
        assert_eq!(found.name, "Ivan");
        assert_eq!(found.age, "25");
        assert_eq!(found.contact, "a@b.com");
        assert_eq!(found.contact_type, ContactType::Email);
        assert_eq!(found.company, Company::Retail);
        assert!(found.screening.is_none());
        Ok(())
    }

    #[test]
    fn rejected_confirmation_stores_nothing() {
        let (controller, store) = controller(Arc::new(RecordingDelivery::default()));
        let result = controller.confirm(&confirm_state(Company::Retail), confirmation("999999", true));
        assert_eq!(result, Err(FlowError::CodeMismatch));
        assert!(store.is_empty());
    }
}
