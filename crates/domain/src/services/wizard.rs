//! Multi-step registration wizard.
//!
//! Four linear steps: personal info, accommodation, course duration,
//! review. `next` validates the current step before advancing, `back`
//! never validates, and `submit` only talks to the server from the review
//! step. Every change is mirrored to the injected [`DraftStore`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;
use validator::Validate;

use super::draft_store::{DraftStore, REGISTRATION_DRAFT_KEY};
use super::pricing::{calculate_quote, PricingRates, Quote, QuoteInput};
use crate::models::{
    AccommodationType, CertificateType, CourseEvent, CreateRegistrationRequest, DayCount,
    FoodPreference, Profession,
};

/// Message shown when the server rejects or cannot be reached.
pub const SUBMISSION_FAILED_MESSAGE: &str = "Registration failed. Please try again.";

/// Field name → first error message.
pub type FieldErrors = BTreeMap<String, String>;

/// Wizard steps in order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    #[default]
    PersonalInfo,
    Accommodation,
    Duration,
    Review,
}

impl WizardStep {
    /// 1-based position shown in the progress bar.
    pub fn number(self) -> u8 {
        match self {
            WizardStep::PersonalInfo => 1,
            WizardStep::Accommodation => 2,
            WizardStep::Duration => 3,
            WizardStep::Review => 4,
        }
    }

    /// Following step, clamped at review.
    pub fn next(self) -> Self {
        match self {
            WizardStep::PersonalInfo => WizardStep::Accommodation,
            WizardStep::Accommodation => WizardStep::Duration,
            WizardStep::Duration | WizardStep::Review => WizardStep::Review,
        }
    }

    /// Preceding step, clamped at personal info.
    pub fn previous(self) -> Self {
        match self {
            WizardStep::PersonalInfo | WizardStep::Accommodation => WizardStep::PersonalInfo,
            WizardStep::Duration => WizardStep::Accommodation,
            WizardStep::Review => WizardStep::Duration,
        }
    }

    pub fn is_terminal(self) -> bool {
        self == WizardStep::Review
    }
}

/// Everything the user has entered so far.
///
/// The `validator` rules cover the personal-info step only; the other
/// steps are checked in [`validate_step`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default, rename_all = "snake_case")]
pub struct WizardForm {
    #[validate(length(min = 2, max = 100, message = "First name must be at least 2 characters"))]
    pub first_name: String,

    #[validate(length(min = 2, max = 100, message = "Last name must be at least 2 characters"))]
    pub last_name: String,

    #[validate(email(message = "Please enter a valid email address"))]
    pub email: String,

    #[validate(length(min = 10, max = 30, message = "Phone number must be at least 10 characters"))]
    pub phone: String,

    #[validate(length(min = 2, max = 200, message = "Practice name must be at least 2 characters"))]
    pub practice_name: String,

    #[validate(length(min = 5, max = 500, message = "Address must be at least 5 characters"))]
    pub address: String,

    pub agree_to_terms: bool,
    pub marketing_opt_in: bool,

    pub needs_accommodation: Option<bool>,
    pub accommodation_nights: Option<DayCount>,

    pub course_days: Option<DayCount>,
}

impl WizardForm {
    /// Copy with surrounding whitespace removed from the text fields, as sent
    /// to the server.
    fn trimmed(&self) -> WizardForm {
        WizardForm {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: self.phone.trim().to_string(),
            practice_name: self.practice_name.trim().to_string(),
            address: self.address.trim().to_string(),
            ..self.clone()
        }
    }

    fn quote_input(&self) -> Option<QuoteInput> {
        let needs_accommodation = self.needs_accommodation == Some(true);
        Some(QuoteInput {
            course_days: self.course_days?,
            needs_accommodation,
            accommodation_nights: if needs_accommodation {
                self.accommodation_nights
            } else {
                None
            },
        })
    }
}

/// Checks the required fields of one step.
pub fn validate_step(form: &WizardForm, step: WizardStep) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();

    match step {
        WizardStep::PersonalInfo => {
            if let Err(validation) = form.trimmed().validate() {
                for (field, field_errors) in validation.field_errors() {
                    if let Some(first) = field_errors.first() {
                        let message = first
                            .message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| first.code.to_string());
                        errors.insert(field.to_string(), message);
                    }
                }
            }
            if let Err(e) = shared::validation::validate_consent(form.agree_to_terms) {
                let message = e.message.map(|m| m.to_string()).unwrap_or_default();
                errors.insert("agree_to_terms".to_string(), message);
            }
        }
        WizardStep::Accommodation => match form.needs_accommodation {
            None => {
                errors.insert(
                    "needs_accommodation".to_string(),
                    "Please select whether you need accommodation".to_string(),
                );
            }
            Some(true) if form.accommodation_nights.is_none() => {
                errors.insert(
                    "accommodation_nights".to_string(),
                    "Please select the number of nights".to_string(),
                );
            }
            Some(_) => {}
        },
        WizardStep::Duration => {
            if form.course_days.is_none() {
                errors.insert(
                    "course_days".to_string(),
                    "Please select a course duration".to_string(),
                );
            }
        }
        WizardStep::Review => {}
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Serialized form of the wizard kept in the draft store.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct WizardDraft {
    event_id: Uuid,
    step: WizardStep,
    form: WizardForm,
}

/// Server acknowledgement of a submitted registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SubmissionReceipt {
    pub confirmation_number: String,
    pub total: f64,
}

/// Why a submission did not go through.
#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Rejected by server: {0}")]
    Rejected(String),
}

/// Sends a finished wizard to the registration endpoint.
#[async_trait::async_trait]
pub trait RegistrationSubmitter: Send + Sync {
    async fn submit(
        &self,
        request: &CreateRegistrationRequest,
    ) -> Result<SubmissionReceipt, SubmissionError>;
}

/// Data handed to the payment stage after a successful submit.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentHandoff {
    pub confirmation_number: String,
    pub request: CreateRegistrationRequest,
    pub quote: Option<Quote>,
    pub server_total: f64,
}

/// Result of pressing the submit button.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Not on the review step: behaved like `next` and advanced.
    Advanced(WizardStep),
    /// Validation failed; the wizard did not move.
    Invalid(FieldErrors),
    /// Registration stored; the draft was cleared.
    Submitted(Box<PaymentHandoff>),
    /// Server call failed; the wizard stays on review with the draft intact.
    Failed(String),
}

/// Registration wizard state.
pub struct RegistrationWizard {
    event: CourseEvent,
    rates: PricingRates,
    store: Arc<dyn DraftStore>,
    step: WizardStep,
    form: WizardForm,
    errors: FieldErrors,
    submission_error: Option<String>,
}

impl RegistrationWizard {
    /// Creates a wizard for `event`, resuming any draft saved for it.
    pub fn new(event: CourseEvent, rates: PricingRates, store: Arc<dyn DraftStore>) -> Self {
        let mut wizard = Self {
            event,
            rates,
            store,
            step: WizardStep::default(),
            form: WizardForm::default(),
            errors: FieldErrors::new(),
            submission_error: None,
        };
        wizard.load_draft();
        wizard
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn form(&self) -> &WizardForm {
        &self.form
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn submission_error(&self) -> Option<&str> {
        self.submission_error.as_deref()
    }

    pub fn event(&self) -> &CourseEvent {
        &self.event
    }

    /// Applies a field change and saves the draft.
    pub fn update<F>(&mut self, change: F)
    where
        F: FnOnce(&mut WizardForm),
    {
        change(&mut self.form);
        self.save_draft();
    }

    /// Running price quote; `None` until a course duration is chosen.
    pub fn quote(&self) -> Option<Quote> {
        self.form
            .quote_input()
            .map(|input| calculate_quote(&self.event, &input, &self.rates))
    }

    /// Validates the current step and advances on success.
    pub fn next(&mut self) -> Result<WizardStep, FieldErrors> {
        match validate_step(&self.form, self.step) {
            Ok(()) => {
                self.errors.clear();
                self.step = self.step.next();
                self.save_draft();
                Ok(self.step)
            }
            Err(errors) => {
                self.errors = errors.clone();
                Err(errors)
            }
        }
    }

    /// Goes one step back without validating.
    pub fn back(&mut self) -> WizardStep {
        self.step = self.step.previous();
        self.save_draft();
        self.step
    }

    /// Submits from the review step; elsewhere behaves like [`Self::next`].
    pub async fn submit(&mut self, submitter: &dyn RegistrationSubmitter) -> SubmitOutcome {
        if !self.step.is_terminal() {
            return match self.next() {
                Ok(step) => SubmitOutcome::Advanced(step),
                Err(errors) => SubmitOutcome::Invalid(errors),
            };
        }

        let request = match self.to_registration_request() {
            Ok(request) => request,
            Err(errors) => {
                self.errors = errors.clone();
                return SubmitOutcome::Invalid(errors);
            }
        };
        self.submission_error = None;

        match submitter.submit(&request).await {
            Ok(receipt) => {
                info!(
                    confirmation_number = %receipt.confirmation_number,
                    event_id = %self.event.id,
                    "Registration submitted"
                );
                let handoff = PaymentHandoff {
                    confirmation_number: receipt.confirmation_number,
                    quote: request.client_quote.clone(),
                    request,
                    server_total: receipt.total,
                };
                self.clear_state();
                SubmitOutcome::Submitted(Box::new(handoff))
            }
            Err(e) => {
                error!(error = %e, event_id = %self.event.id, "Registration submission failed");
                self.submission_error = Some(SUBMISSION_FAILED_MESSAGE.to_string());
                SubmitOutcome::Failed(SUBMISSION_FAILED_MESSAGE.to_string())
            }
        }
    }

    /// Discards all input and the saved draft.
    pub fn reset(&mut self) {
        self.clear_state();
    }

    /// Builds the API payload from the collected fields.
    pub fn to_registration_request(&self) -> Result<CreateRegistrationRequest, FieldErrors> {
        let course_days = self.form.course_days.ok_or_else(|| {
            FieldErrors::from([(
                "course_days".to_string(),
                "Please select a course duration".to_string(),
            )])
        })?;
        let needs_accommodation = self.form.needs_accommodation == Some(true);
        let fields = self.form.trimmed();

        Ok(CreateRegistrationRequest {
            event_id: self.event.id,
            first_name: fields.first_name,
            last_name: fields.last_name,
            email: fields.email,
            phone: fields.phone,
            practice_name: fields.practice_name,
            address: fields.address,
            country: None,
            profession: Profession::default(),
            years_of_experience: 0,
            license_number: None,
            course_days,
            accommodation_type: if needs_accommodation {
                AccommodationType::Single
            } else {
                AccommodationType::None
            },
            accommodation_nights: if needs_accommodation {
                self.form.accommodation_nights
            } else {
                None
            },
            food_preference: FoodPreference::default(),
            dietary_notes: None,
            certificate_type: CertificateType::default(),
            materials_kit: false,
            networking_dinner: false,
            promo_code: None,
            client_quote: self.quote(),
            agree_to_terms: self.form.agree_to_terms,
            marketing_opt_in: self.form.marketing_opt_in,
        })
    }

    fn clear_state(&mut self) {
        self.form = WizardForm::default();
        self.step = WizardStep::default();
        self.errors.clear();
        self.submission_error = None;
        if let Err(e) = self.store.clear(REGISTRATION_DRAFT_KEY) {
            warn!(error = %e, "Failed to clear registration draft");
        }
    }

    fn save_draft(&self) {
        let draft = WizardDraft {
            event_id: self.event.id,
            step: self.step,
            form: self.form.clone(),
        };
        let json = match serde_json::to_string(&draft) {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "Failed to serialize registration draft");
                return;
            }
        };
        if let Err(e) = self.store.set(REGISTRATION_DRAFT_KEY, &json) {
            warn!(error = %e, "Failed to save registration draft");
        }
    }

    fn load_draft(&mut self) {
        let json = match self.store.get(REGISTRATION_DRAFT_KEY) {
            Ok(Some(json)) => json,
            Ok(None) => return,
            Err(e) => {
                warn!(error = %e, "Failed to read registration draft");
                return;
            }
        };

        match serde_json::from_str::<WizardDraft>(&json) {
            Ok(draft) if draft.event_id == self.event.id => {
                self.step = draft.step;
                self.form = draft.form;
            }
            Ok(draft) => {
                info!(
                    draft_event_id = %draft.event_id,
                    event_id = %self.event.id,
                    "Ignoring registration draft saved for another event"
                );
            }
            Err(e) => {
                warn!(error = %e, "Discarding unreadable registration draft");
            }
        }
    }
}
