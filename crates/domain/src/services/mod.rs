//! Domain services for the Dental Masterclass backend.
//!
//! Services contain business logic that operates on domain models.

pub mod draft_store;
pub mod payment;
pub mod pricing;
pub mod wizard;

pub use draft_store::{
    DraftStore, DraftStoreError, FileDraftStore, InMemoryDraftStore, REGISTRATION_DRAFT_KEY,
};

pub use payment::{MockPaymentService, PaymentError, PaymentIntent, PaymentService};

pub use pricing::{
    accommodation_cost, build_snapshot, calculate_quote, Extra, PriceSource, PricingRates, Quote,
    QuoteInput,
};

pub use wizard::{
    validate_step, FieldErrors, PaymentHandoff, RegistrationSubmitter, RegistrationWizard,
    SubmissionError, SubmissionReceipt, SubmitOutcome, WizardForm, WizardStep,
    SUBMISSION_FAILED_MESSAGE,
};
