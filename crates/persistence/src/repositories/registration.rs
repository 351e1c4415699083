//! Repository for registration database operations.

use domain::models::{
    normalize_code, AdminStats, CreateRegistrationRequest, PaymentStatus, PricingSnapshot,
    PromoCode, Registration, RegistrationStatus,
};
use sqlx::types::Json;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use super::promo_code::redeem_with;
use crate::entities::{AdminStatsEntity, PaymentStatusDb, RegistrationEntity, RegistrationStatusDb};
use crate::metrics::QueryTimer;

const REGISTRATION_COLUMNS: &str = "id, confirmation_number, event_id, first_name, last_name, \
     email, phone, practice_name, address, country, profession, years_of_experience, \
     license_number, course_days, accommodation_type, accommodation_nights, food_preference, \
     dietary_notes, certificate_type, materials_kit, networking_dinner, promo_code, pricing, \
     total_amount, payment_status, payment_intent_id, customer_id, paid_at, status, admin_notes, \
     agree_to_terms, marketing_opt_in, created_at, updated_at";

/// Maximum attempts when looking for an unused confirmation number.
const MAX_CONFIRMATION_ATTEMPTS: u32 = 100;

/// Errors from [`RegistrationRepository::create`].
#[derive(Debug, Error)]
pub enum CreateRegistrationError {
    #[error("Promo code is invalid or expired")]
    InvalidPromoCode,

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Filters for the admin registration list.
#[derive(Debug, Clone, Default)]
pub struct RegistrationFilter {
    pub status: Option<RegistrationStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub event_id: Option<Uuid>,
    pub search: Option<String>,
}

impl RegistrationFilter {
    /// Trimmed search text with `ILIKE` metacharacters escaped.
    fn search_term(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(escape_like)
    }
}

fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Payment provider identifiers recorded when a payment starts.
#[derive(Debug, Clone, Copy)]
pub struct PaymentRefs<'a> {
    pub payment_intent_id: &'a str,
    pub customer_id: &'a str,
}

fn to_domain(entity: RegistrationEntity) -> Result<Registration, sqlx::Error> {
    Registration::try_from(entity).map_err(|e| sqlx::Error::Decode(Box::new(e)))
}

fn to_domain_all(entities: Vec<RegistrationEntity>) -> Result<Vec<Registration>, sqlx::Error> {
    entities.into_iter().map(to_domain).collect()
}

/// Repository for registration operations.
#[derive(Clone)]
pub struct RegistrationRepository {
    pool: PgPool,
}

impl RegistrationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Check if a confirmation number is taken.
    pub async fn confirmation_exists(&self, confirmation_number: &str) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("check_confirmation_number_exists");
        let result = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(SELECT 1 FROM registrations WHERE confirmation_number = $1)
            "#,
        )
        .bind(confirmation_number)
        .fetch_one(&self.pool)
        .await;
        timer.finish(&result);
        result
    }

    /// Generate an unused confirmation number by retrying on collision.
    pub async fn generate_unique_confirmation_number<F>(
        &self,
        generator: F,
    ) -> Result<String, sqlx::Error>
    where
        F: Fn() -> String,
    {
        let mut candidate = generator();
        let mut attempts = 0;

        while self.confirmation_exists(&candidate).await? {
            candidate = generator();
            attempts += 1;
            if attempts > MAX_CONFIRMATION_ATTEMPTS {
                return Err(sqlx::Error::Protocol(
                    "Could not generate unique confirmation number".to_string(),
                ));
            }
        }

        Ok(candidate)
    }

    /// Stores a registration, redeeming its promo code in the same transaction.
    ///
    /// `price` receives the redeemed code (if any) and returns the snapshot
    /// to persist. An invalid code aborts before anything is written.
    pub async fn create<F>(
        &self,
        request: &CreateRegistrationRequest,
        confirmation_number: &str,
        price: F,
    ) -> Result<(Registration, Option<PromoCode>), CreateRegistrationError>
    where
        F: FnOnce(Option<&PromoCode>) -> PricingSnapshot,
    {
        let timer = QueryTimer::new("create_registration");
        let mut tx = self.pool.begin().await?;

        let promo_code = request
            .promo_code
            .as_deref()
            .map(normalize_code)
            .filter(|code| !code.is_empty());

        let promo = match &promo_code {
            Some(code) => match redeem_with(&mut *tx, code).await? {
                Some(entity) => Some(PromoCode::from(entity)),
                None => {
                    tracing::info!(promo_code = %code, "Rejected invalid promo code");
                    return Err(CreateRegistrationError::InvalidPromoCode);
                }
            },
            None => None,
        };

        let pricing = price(promo.as_ref());

        let entity = sqlx::query_as::<_, RegistrationEntity>(&format!(
            r#"
            INSERT INTO registrations (
                confirmation_number, event_id, first_name, last_name, email, phone,
                practice_name, address, country, profession, years_of_experience,
                license_number, course_days, accommodation_type, accommodation_nights,
                food_preference, dietary_notes, certificate_type, materials_kit,
                networking_dinner, promo_code, pricing, total_amount, agree_to_terms,
                marketing_opt_in
            )
            VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15,
                $16, $17, $18, $19, $20, $21, $22, $23, $24, $25
            )
            RETURNING {}
            "#,
            REGISTRATION_COLUMNS
        ))
        .bind(confirmation_number)
        .bind(request.event_id)
        .bind(request.first_name.trim())
        .bind(request.last_name.trim())
        .bind(request.email.trim().to_lowercase())
        .bind(request.phone.trim())
        .bind(request.practice_name.trim())
        .bind(request.address.trim())
        .bind(&request.country)
        .bind(request.profession.as_str())
        .bind(request.years_of_experience)
        .bind(&request.license_number)
        .bind(i32::from(request.course_days))
        .bind(request.accommodation_type.as_str())
        .bind(request.priced_nights().map(i32::from))
        .bind(request.food_preference.as_str())
        .bind(&request.dietary_notes)
        .bind(request.certificate_type.as_str())
        .bind(request.materials_kit)
        .bind(request.networking_dinner)
        .bind(promo.as_ref().map(|p| p.code.as_str()))
        .bind(Json(&pricing))
        .bind(pricing.total)
        .bind(request.agree_to_terms)
        .bind(request.marketing_opt_in)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        timer.succeeded();

        Ok((to_domain(entity)?, promo))
    }

    /// Finds a registration by confirmation number.
    pub async fn find_by_confirmation_number(
        &self,
        confirmation_number: &str,
    ) -> Result<Option<Registration>, sqlx::Error> {
        let timer = QueryTimer::new("find_registration_by_confirmation_number");
        let result = sqlx::query_as::<_, RegistrationEntity>(&format!(
            "SELECT {} FROM registrations WHERE confirmation_number = $1",
            REGISTRATION_COLUMNS
        ))
        .bind(confirmation_number.trim().to_uppercase())
        .fetch_optional(&self.pool)
        .await;
        timer.finish(&result);
        result?.map(to_domain).transpose()
    }

    /// Finds registrations for an email on one event, newest first.
    pub async fn find_by_email_and_event(
        &self,
        email: &str,
        event_id: Uuid,
    ) -> Result<Vec<Registration>, sqlx::Error> {
        let timer = QueryTimer::new("find_registrations_by_email_and_event");
        let result = sqlx::query_as::<_, RegistrationEntity>(&format!(
            r#"
            SELECT {} FROM registrations
            WHERE email = $1 AND event_id = $2
            ORDER BY created_at DESC
            "#,
            REGISTRATION_COLUMNS
        ))
        .bind(email.trim().to_lowercase())
        .bind(event_id)
        .fetch_all(&self.pool)
        .await;
        timer.finish(&result);
        to_domain_all(result?)
    }

    /// Lists registrations matching `filter`, newest first.
    pub async fn list(
        &self,
        filter: &RegistrationFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Registration>, sqlx::Error> {
        let timer = QueryTimer::new("list_registrations");
        let result = sqlx::query_as::<_, RegistrationEntity>(&format!(
            r#"
            SELECT {} FROM registrations
            WHERE ($1::registration_status IS NULL OR status = $1)
              AND ($2::payment_status IS NULL OR payment_status = $2)
              AND ($3::UUID IS NULL OR event_id = $3)
              AND ($4::TEXT IS NULL
                   OR first_name ILIKE '%' || $4 || '%' ESCAPE '\'
                   OR last_name ILIKE '%' || $4 || '%' ESCAPE '\'
                   OR email ILIKE '%' || $4 || '%' ESCAPE '\'
                   OR confirmation_number ILIKE '%' || $4 || '%' ESCAPE '\')
            ORDER BY created_at DESC
            LIMIT $5 OFFSET $6
            "#,
            REGISTRATION_COLUMNS
        ))
        .bind(filter.status.map(RegistrationStatusDb::from))
        .bind(filter.payment_status.map(PaymentStatusDb::from))
        .bind(filter.event_id)
        .bind(filter.search_term())
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await;
        timer.finish(&result);
        to_domain_all(result?)
    }

    /// Counts registrations matching `filter`.
    pub async fn count(&self, filter: &RegistrationFilter) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_registrations");
        let result = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM registrations
            WHERE ($1::registration_status IS NULL OR status = $1)
              AND ($2::payment_status IS NULL OR payment_status = $2)
              AND ($3::UUID IS NULL OR event_id = $3)
              AND ($4::TEXT IS NULL
                   OR first_name ILIKE '%' || $4 || '%' ESCAPE '\'
                   OR last_name ILIKE '%' || $4 || '%' ESCAPE '\'
                   OR email ILIKE '%' || $4 || '%' ESCAPE '\'
                   OR confirmation_number ILIKE '%' || $4 || '%' ESCAPE '\')
            "#,
        )
        .bind(filter.status.map(RegistrationStatusDb::from))
        .bind(filter.payment_status.map(PaymentStatusDb::from))
        .bind(filter.event_id)
        .bind(filter.search_term())
        .fetch_one(&self.pool)
        .await;
        timer.finish(&result);
        result
    }

    /// Moves the payment from `from` to `to` if it is still in `from`.
    ///
    /// Completing a payment confirms a pending registration and stamps
    /// `paid_at`; refunding cancels the registration. Returns `None` when
    /// the registration is missing, no longer in `from`, or is cancelled or
    /// attended and the move would take a payment.
    pub async fn transition_payment(
        &self,
        confirmation_number: &str,
        from: PaymentStatus,
        to: PaymentStatus,
        refs: Option<PaymentRefs<'_>>,
    ) -> Result<Option<Registration>, sqlx::Error> {
        if !from.can_transition_to(to) {
            return Err(sqlx::Error::Protocol(format!(
                "Illegal payment transition {} -> {}",
                from, to
            )));
        }

        let timer = QueryTimer::new("transition_registration_payment");
        let result = sqlx::query_as::<_, RegistrationEntity>(&format!(
            r#"
            UPDATE registrations
            SET payment_status = $3,
                payment_intent_id = COALESCE($4, payment_intent_id),
                customer_id = COALESCE($5, customer_id),
                paid_at = CASE WHEN $3 = 'completed'::payment_status THEN NOW() ELSE paid_at END,
                status = CASE
                    WHEN $3 = 'completed'::payment_status AND status = 'pending'::registration_status
                        THEN 'confirmed'::registration_status
                    WHEN $3 = 'refunded'::payment_status
                        THEN 'cancelled'::registration_status
                    ELSE status
                END,
                updated_at = NOW()
            WHERE confirmation_number = $1 AND payment_status = $2
              AND ($3 NOT IN ('processing'::payment_status, 'completed'::payment_status)
                   OR status IN ('pending'::registration_status, 'confirmed'::registration_status))
            RETURNING {}
            "#,
            REGISTRATION_COLUMNS
        ))
        .bind(confirmation_number)
        .bind(PaymentStatusDb::from(from))
        .bind(PaymentStatusDb::from(to))
        .bind(refs.map(|r| r.payment_intent_id))
        .bind(refs.map(|r| r.customer_id))
        .fetch_optional(&self.pool)
        .await;
        timer.finish(&result);
        result?.map(to_domain).transpose()
    }

    /// Applies an admin edit.
    ///
    /// A status change only lands if the registration is still in
    /// `expected_status`; notes are replaced when given.
    pub async fn update_admin_fields(
        &self,
        confirmation_number: &str,
        expected_status: RegistrationStatus,
        status: Option<RegistrationStatus>,
        admin_notes: Option<&str>,
    ) -> Result<Option<Registration>, sqlx::Error> {
        let timer = QueryTimer::new("update_registration_admin_fields");
        let result = sqlx::query_as::<_, RegistrationEntity>(&format!(
            r#"
            UPDATE registrations
            SET status = COALESCE($3, status),
                admin_notes = COALESCE($4, admin_notes),
                updated_at = NOW()
            WHERE confirmation_number = $1 AND status = $2
            RETURNING {}
            "#,
            REGISTRATION_COLUMNS
        ))
        .bind(confirmation_number)
        .bind(RegistrationStatusDb::from(expected_status))
        .bind(status.map(RegistrationStatusDb::from))
        .bind(admin_notes)
        .fetch_optional(&self.pool)
        .await;
        timer.finish(&result);
        result?.map(to_domain).transpose()
    }

    /// Dashboard aggregates.
    pub async fn stats(&self) -> Result<AdminStats, sqlx::Error> {
        let timer = QueryTimer::new("registration_stats");
        let result = sqlx::query_as::<_, AdminStatsEntity>(
            r#"
            SELECT
                COUNT(*)::bigint AS total_registrations,
                COUNT(*) FILTER (WHERE status = 'pending')::bigint AS pending,
                COUNT(*) FILTER (WHERE status = 'confirmed')::bigint AS confirmed,
                COUNT(*) FILTER (WHERE status = 'cancelled')::bigint AS cancelled,
                COUNT(*) FILTER (WHERE status = 'attended')::bigint AS attended,
                COUNT(*) FILTER (WHERE payment_status = 'completed')::bigint AS payments_completed,
                COUNT(*) FILTER (WHERE payment_status IN ('pending', 'processing'))::bigint AS payments_pending,
                COUNT(*) FILTER (WHERE payment_status = 'failed')::bigint AS payments_failed,
                COALESCE(SUM(total_amount) FILTER (WHERE payment_status = 'completed'), 0)::float8 AS revenue,
                COUNT(*) FILTER (WHERE promo_code IS NOT NULL)::bigint AS promo_redemptions
            FROM registrations
            "#,
        )
        .fetch_one(&self.pool)
        .await;
        timer.finish(&result);
        result.map(AdminStats::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_term_is_trimmed() {
        let filter = RegistrationFilter {
            search: Some("  khan ".to_string()),
            ..Default::default()
        };
        assert_eq!(filter.search_term().as_deref(), Some("khan"));
    }

    #[test]
    fn test_search_wildcards_are_escaped() {
        let filter = RegistrationFilter {
            search: Some("100%_off\\".to_string()),
            ..Default::default()
        };
        assert_eq!(filter.search_term().as_deref(), Some(r"100\%\_off\\"));
    }

    #[test]
    fn test_blank_search_is_ignored() {
        let filter = RegistrationFilter {
            search: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(filter.search_term(), None);
        assert_eq!(RegistrationFilter::default().search_term(), None);
    }
}
