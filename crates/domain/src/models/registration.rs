//! Registration domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::pagination::Pagination;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use super::event::DayCount;
use crate::services::pricing::Quote;

/// Prefix of every confirmation number.
pub const CONFIRMATION_PREFIX: &str = "DM-";

/// Number of random base36 characters appended to the timestamp.
pub const CONFIRMATION_SUFFIX_LEN: usize = 4;

/// Generates a confirmation number `DM-<base36 millis><4 random base36>`.
///
/// Two calls in the same millisecond differ only by the random suffix, so
/// uniqueness is probabilistic. The store enforces it with a UNIQUE index.
pub fn generate_confirmation_number(now: DateTime<Utc>) -> String {
    let millis = u64::try_from(now.timestamp_millis()).unwrap_or_default();
    format!(
        "{}{}{}",
        CONFIRMATION_PREFIX,
        shared::base36::encode(millis),
        shared::base36::random(CONFIRMATION_SUFFIX_LEN)
    )
}

/// Checks the shape of a confirmation number (prefix plus base36 body).
pub fn is_valid_confirmation_number(value: &str) -> bool {
    match value.strip_prefix(CONFIRMATION_PREFIX) {
        Some(body) => body.len() > CONFIRMATION_SUFFIX_LEN && shared::base36::is_base36(body),
        None => false,
    }
}

macro_rules! string_enum {
    ($(#[$meta:meta])* $name:ident, $label:literal { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.to_lowercase().as_str() {
                    $($text => Ok($name::$variant),)+
                    _ => Err(format!(concat!("Invalid ", $label, ": {}"), s)),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }
    };
}

string_enum!(
    /// Professional background of the attendee.
    Profession, "profession" {
        Dentist => "dentist",
        Student => "student",
        Hygienist => "hygienist",
        Other => "other",
    }
);

string_enum!(
    /// Room arrangement requested with the course.
    AccommodationType, "accommodation type" {
        Single => "single",
        Shared => "shared",
        None => "none",
    }
);

string_enum!(
    /// Catering preference.
    FoodPreference, "food preference" {
        Halal => "halal",
        Vegetarian => "vegetarian",
        Vegan => "vegan",
        Standard => "standard",
    }
);

string_enum!(
    /// Format of the attendance certificate.
    CertificateType, "certificate type" {
        Hardcopy => "hardcopy",
        Digital => "digital",
    }
);

string_enum!(
    /// Payment state of a registration.
    PaymentStatus, "payment status" {
        Pending => "pending",
        Processing => "processing",
        Completed => "completed",
        Failed => "failed",
        Refunded => "refunded",
    }
);

string_enum!(
    /// Lifecycle state of a registration.
    RegistrationStatus, "registration status" {
        Pending => "pending",
        Confirmed => "confirmed",
        Cancelled => "cancelled",
        Attended => "attended",
    }
);

impl Default for Profession {
    fn default() -> Self {
        Profession::Dentist
    }
}

impl Default for AccommodationType {
    fn default() -> Self {
        AccommodationType::None
    }
}

impl Default for FoodPreference {
    fn default() -> Self {
        FoodPreference::Halal
    }
}

impl Default for CertificateType {
    fn default() -> Self {
        CertificateType::Digital
    }
}

impl PaymentStatus {
    /// Allowed payment transitions.
    ///
    /// pending → processing, failed → processing (retry),
    /// processing → completed | failed, completed → refunded.
    pub fn can_transition_to(self, next: PaymentStatus) -> bool {
        use PaymentStatus::*;
        matches!(
            (self, next),
            (Pending, Processing)
                | (Failed, Processing)
                | (Processing, Completed)
                | (Processing, Failed)
                | (Completed, Refunded)
        )
    }
}

impl RegistrationStatus {
    /// Allowed lifecycle transitions. Cancelled and attended are terminal.
    pub fn can_transition_to(self, next: RegistrationStatus) -> bool {
        use RegistrationStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed) | (Pending, Cancelled) | (Confirmed, Attended) | (Confirmed, Cancelled)
        )
    }

    /// Whether a payment may be taken. Cancelled and attended registrations
    /// accept refunds only.
    pub fn accepts_payment(self) -> bool {
        matches!(self, RegistrationStatus::Pending | RegistrationStatus::Confirmed)
    }
}

/// Itemized price breakdown recorded at submission time.
///
/// Stored verbatim; never recomputed from the promo code on read.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PricingSnapshot {
    pub base_price: f64,
    pub accommodation: f64,
    pub food: f64,
    pub certificate: f64,
    pub materials: f64,
    pub dinner: f64,
    pub discount: f64,
    pub total: f64,
    pub currency: String,
}

impl PricingSnapshot {
    /// Sum of all priced components before the discount.
    pub fn subtotal(&self) -> f64 {
        self.base_price + self.accommodation + self.food + self.certificate + self.materials + self.dinner
    }
}

/// A persisted course registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Registration {
    pub id: Uuid,
    pub confirmation_number: String,
    pub event_id: Uuid,
    // Personal
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub practice_name: String,
    pub address: String,
    pub country: Option<String>,
    pub profession: Profession,
    pub years_of_experience: i32,
    pub license_number: Option<String>,
    // Preferences
    pub course_days: DayCount,
    pub accommodation_type: AccommodationType,
    pub accommodation_nights: Option<DayCount>,
    pub food_preference: FoodPreference,
    pub dietary_notes: Option<String>,
    pub certificate_type: CertificateType,
    pub materials_kit: bool,
    pub networking_dinner: bool,
    // Pricing
    pub promo_code: Option<String>,
    pub pricing: PricingSnapshot,
    // Payment
    pub payment_status: PaymentStatus,
    pub payment_intent_id: Option<String>,
    pub customer_id: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    // Lifecycle
    pub status: RegistrationStatus,
    pub admin_notes: Option<String>,
    pub agree_to_terms: bool,
    pub marketing_opt_in: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Registration {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Request payload for creating a registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct CreateRegistrationRequest {
    pub event_id: Uuid,

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

    #[validate(length(max = 100, message = "Country must be at most 100 characters"))]
    pub country: Option<String>,

    #[serde(default)]
    pub profession: Profession,

    #[serde(default)]
    #[validate(range(min = 0, max = 70, message = "Years of experience must be between 0 and 70"))]
    pub years_of_experience: i32,

    #[validate(length(max = 50, message = "License number must be at most 50 characters"))]
    pub license_number: Option<String>,

    pub course_days: DayCount,

    #[serde(default)]
    pub accommodation_type: AccommodationType,

    #[serde(default)]
    pub accommodation_nights: Option<DayCount>,

    #[serde(default)]
    pub food_preference: FoodPreference,

    #[validate(length(max = 500, message = "Dietary notes must be at most 500 characters"))]
    pub dietary_notes: Option<String>,

    #[serde(default)]
    pub certificate_type: CertificateType,

    #[serde(default)]
    pub materials_kit: bool,

    #[serde(default)]
    pub networking_dinner: bool,

    #[validate(length(max = 32, message = "Promo code must be at most 32 characters"))]
    pub promo_code: Option<String>,

    /// Total the client displayed. Compared against the server figure, never trusted.
    #[serde(default)]
    pub client_quote: Option<Quote>,

    pub agree_to_terms: bool,

    #[serde(default)]
    pub marketing_opt_in: bool,
}

impl CreateRegistrationRequest {
    /// Checks the rules the derive cannot express.
    pub fn check_consistency(&self) -> Result<(), validator::ValidationError> {
        shared::validation::validate_consent(self.agree_to_terms)?;
        if self.accommodation_type != AccommodationType::None && self.accommodation_nights.is_none() {
            let mut err = validator::ValidationError::new("nights_required");
            err.message = Some("Please select the number of nights".into());
            return Err(err);
        }
        Ok(())
    }

    /// Nights that should be priced (none when no room was requested).
    pub fn priced_nights(&self) -> Option<DayCount> {
        match self.accommodation_type {
            AccommodationType::None => None,
            _ => self.accommodation_nights,
        }
    }
}

/// Admin edit of a registration.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct UpdateRegistrationRequest {
    pub status: Option<RegistrationStatus>,

    #[validate(length(max = 2000, message = "Notes must be at most 2000 characters"))]
    pub admin_notes: Option<String>,
}

/// Request body for the mock payment confirmation.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ConfirmPaymentRequest {
    pub succeeded: bool,
}

/// Query parameters for the admin registration list.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct RegistrationQuery {
    #[validate(range(min = 1, message = "Page must be at least 1"))]
    pub page: Option<u32>,
    #[validate(range(min = 1, max = 100, message = "Per page must be between 1 and 100"))]
    pub per_page: Option<u32>,
    pub status: Option<RegistrationStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub event_id: Option<Uuid>,
    #[validate(length(max = 100, message = "Search must be at most 100 characters"))]
    pub search: Option<String>,
}

/// Response for the admin registration list.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct RegistrationListResponse {
    pub data: Vec<Registration>,
    pub pagination: Pagination,
}

/// Dashboard statistics for admins.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AdminStats {
    pub total_registrations: i64,
    pub pending: i64,
    pub confirmed: i64,
    pub cancelled: i64,
    pub attended: i64,
    pub payments_completed: i64,
    pub payments_pending: i64,
    pub payments_failed: i64,
    pub revenue: f64,
    pub promo_redemptions: i64,
}
