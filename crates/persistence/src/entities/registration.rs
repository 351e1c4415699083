//! Registration entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::{
    AdminStats, DayCount, PaymentStatus, PricingSnapshot, Registration, RegistrationStatus,
};
use sqlx::types::Json;
use sqlx::FromRow;
use thiserror::Error;
use uuid::Uuid;

/// Database enum for payment_status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "payment_status", rename_all = "lowercase")]
pub enum PaymentStatusDb {
    Pending,
    Processing,
    Completed,
    Failed,
    Refunded,
}

impl From<PaymentStatusDb> for PaymentStatus {
    fn from(db: PaymentStatusDb) -> Self {
        match db {
            PaymentStatusDb::Pending => PaymentStatus::Pending,
            PaymentStatusDb::Processing => PaymentStatus::Processing,
            PaymentStatusDb::Completed => PaymentStatus::Completed,
            PaymentStatusDb::Failed => PaymentStatus::Failed,
            PaymentStatusDb::Refunded => PaymentStatus::Refunded,
        }
    }
}

impl From<PaymentStatus> for PaymentStatusDb {
    fn from(status: PaymentStatus) -> Self {
        match status {
            PaymentStatus::Pending => PaymentStatusDb::Pending,
            PaymentStatus::Processing => PaymentStatusDb::Processing,
            PaymentStatus::Completed => PaymentStatusDb::Completed,
            PaymentStatus::Failed => PaymentStatusDb::Failed,
            PaymentStatus::Refunded => PaymentStatusDb::Refunded,
        }
    }
}

/// Database enum for registration_status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "registration_status", rename_all = "lowercase")]
pub enum RegistrationStatusDb {
    Pending,
    Confirmed,
    Cancelled,
    Attended,
}

impl From<RegistrationStatusDb> for RegistrationStatus {
    fn from(db: RegistrationStatusDb) -> Self {
        match db {
            RegistrationStatusDb::Pending => RegistrationStatus::Pending,
            RegistrationStatusDb::Confirmed => RegistrationStatus::Confirmed,
            RegistrationStatusDb::Cancelled => RegistrationStatus::Cancelled,
            RegistrationStatusDb::Attended => RegistrationStatus::Attended,
        }
    }
}

impl From<RegistrationStatus> for RegistrationStatusDb {
    fn from(status: RegistrationStatus) -> Self {
        match status {
            RegistrationStatus::Pending => RegistrationStatusDb::Pending,
            RegistrationStatus::Confirmed => RegistrationStatusDb::Confirmed,
            RegistrationStatus::Cancelled => RegistrationStatusDb::Cancelled,
            RegistrationStatus::Attended => RegistrationStatusDb::Attended,
        }
    }
}

/// A column held a value the domain model does not accept.
#[derive(Debug, Error)]
#[error("Invalid value in registrations.{column}: {reason}")]
pub struct InvalidColumnError {
    pub column: &'static str,
    pub reason: String,
}

fn invalid(column: &'static str) -> impl Fn(String) -> InvalidColumnError {
    move |reason| InvalidColumnError { column, reason }
}

/// Database row mapping for the registrations table.
#[derive(Debug, Clone, FromRow)]
pub struct RegistrationEntity {
    pub id: Uuid,
    pub confirmation_number: String,
    pub event_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub practice_name: String,
    pub address: String,
    pub country: Option<String>,
    pub profession: String,
    pub years_of_experience: i32,
    pub license_number: Option<String>,
    pub course_days: i32,
    pub accommodation_type: String,
    pub accommodation_nights: Option<i32>,
    pub food_preference: String,
    pub dietary_notes: Option<String>,
    pub certificate_type: String,
    pub materials_kit: bool,
    pub networking_dinner: bool,
    pub promo_code: Option<String>,
    pub pricing: Json<PricingSnapshot>,
    pub total_amount: f64,
    pub payment_status: PaymentStatusDb,
    pub payment_intent_id: Option<String>,
    pub customer_id: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub status: RegistrationStatusDb,
    pub admin_notes: Option<String>,
    pub agree_to_terms: bool,
    pub marketing_opt_in: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<RegistrationEntity> for Registration {
    type Error = InvalidColumnError;

    fn try_from(entity: RegistrationEntity) -> Result<Self, Self::Error> {
        Ok(Self {
            id: entity.id,
            confirmation_number: entity.confirmation_number,
            event_id: entity.event_id,
            first_name: entity.first_name,
            last_name: entity.last_name,
            email: entity.email,
            phone: entity.phone,
            practice_name: entity.practice_name,
            address: entity.address,
            country: entity.country,
            profession: entity.profession.parse().map_err(invalid("profession"))?,
            years_of_experience: entity.years_of_experience,
            license_number: entity.license_number,
            course_days: DayCount::try_from(entity.course_days).map_err(invalid("course_days"))?,
            accommodation_type: entity
                .accommodation_type
                .parse()
                .map_err(invalid("accommodation_type"))?,
            accommodation_nights: entity
                .accommodation_nights
                .map(DayCount::try_from)
                .transpose()
                .map_err(invalid("accommodation_nights"))?,
            food_preference: entity
                .food_preference
                .parse()
                .map_err(invalid("food_preference"))?,
            dietary_notes: entity.dietary_notes,
            certificate_type: entity
                .certificate_type
                .parse()
                .map_err(invalid("certificate_type"))?,
            materials_kit: entity.materials_kit,
            networking_dinner: entity.networking_dinner,
            promo_code: entity.promo_code,
            pricing: entity.pricing.0,
            payment_status: entity.payment_status.into(),
            payment_intent_id: entity.payment_intent_id,
            customer_id: entity.customer_id,
            paid_at: entity.paid_at,
            status: entity.status.into(),
            admin_notes: entity.admin_notes,
            agree_to_terms: entity.agree_to_terms,
            marketing_opt_in: entity.marketing_opt_in,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        })
    }
}

/// Aggregates row for the admin dashboard.
#[derive(Debug, Clone, FromRow)]
pub struct AdminStatsEntity {
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

impl From<AdminStatsEntity> for AdminStats {
    fn from(entity: AdminStatsEntity) -> Self {
        Self {
            total_registrations: entity.total_registrations,
            pending: entity.pending,
            confirmed: entity.confirmed,
            cancelled: entity.cancelled,
            attended: entity.attended,
            payments_completed: entity.payments_completed,
            payments_pending: entity.payments_pending,
            payments_failed: entity.payments_failed,
            revenue: entity.revenue,
            promo_redemptions: entity.promo_redemptions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::models::{AccommodationType, CertificateType, FoodPreference, Profession};

    fn entity() -> RegistrationEntity {
        let now = Utc::now();
        RegistrationEntity {
            id: Uuid::new_v4(),
            confirmation_number: "DM-LQU5M2O0AB12".to_string(),
            event_id: Uuid::new_v4(),
            first_name: "Amina".to_string(),
            last_name: "Khan".to_string(),
            email: "amina@example.com".to_string(),
            phone: "07700900123".to_string(),
            practice_name: "Bright Smiles".to_string(),
            address: "22 Market Road".to_string(),
            country: None,
            profession: "hygienist".to_string(),
            years_of_experience: 4,
            license_number: None,
            course_days: 3,
            accommodation_type: "single".to_string(),
            accommodation_nights: Some(2),
            food_preference: "vegan".to_string(),
            dietary_notes: None,
            certificate_type: "hardcopy".to_string(),
            materials_kit: false,
            networking_dinner: true,
            promo_code: None,
            pricing: Json(PricingSnapshot {
                base_price: 2500.0,
                accommodation: 200.0,
                total: 2700.0,
                currency: "GBP".to_string(),
                ..Default::default()
            }),
            total_amount: 2700.0,
            payment_status: PaymentStatusDb::Pending,
            payment_intent_id: None,
            customer_id: None,
            paid_at: None,
            status: RegistrationStatusDb::Pending,
            admin_notes: None,
            agree_to_terms: true,
            marketing_opt_in: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_entity_to_domain() {
        let registration = Registration::try_from(entity()).unwrap();
        assert_eq!(registration.profession, Profession::Hygienist);
        assert_eq!(registration.course_days, DayCount::Three);
        assert_eq!(registration.accommodation_type, AccommodationType::Single);
        assert_eq!(registration.accommodation_nights, Some(DayCount::Two));
        assert_eq!(registration.food_preference, FoodPreference::Vegan);
        assert_eq!(registration.certificate_type, CertificateType::Hardcopy);
        assert_eq!(registration.payment_status, PaymentStatus::Pending);
        assert_eq!(registration.pricing.total, 2700.0);
    }

    #[test]
    fn test_entity_with_bad_day_count_is_rejected() {
        let mut bad = entity();
        bad.course_days = 5;
        let err = Registration::try_from(bad).unwrap_err();
        assert_eq!(err.column, "course_days");
    }

    #[test]
    fn test_entity_with_unknown_profession_is_rejected() {
        let mut bad = entity();
        bad.profession = "astronaut".to_string();
        let err = Registration::try_from(bad).unwrap_err();
        assert_eq!(err.column, "profession");
    }

    #[test]
    fn test_status_mappings() {
        assert_eq!(
            PaymentStatus::from(PaymentStatusDb::Refunded),
            PaymentStatus::Refunded
        );
        assert_eq!(
            RegistrationStatusDb::from(RegistrationStatus::Attended),
            RegistrationStatusDb::Attended
        );
    }
}
