//! Repository for promo code database operations.

use domain::models::{normalize_code, CreatePromoCodeRequest};
use sqlx::{PgExecutor, PgPool};

use crate::entities::{DiscountTypeDb, PromoCodeEntity};
use crate::metrics::QueryTimer;

const PROMO_CODE_COLUMNS: &str = "id, code, description, discount_type, discount_value, max_uses, \
     current_uses, valid_from, valid_until, is_active, created_at, updated_at";

/// Atomically consumes one use of `code` if it is currently valid.
///
/// The validity rules live in the WHERE clause so two concurrent
/// redemptions of the last use cannot both succeed. Returns `None` when
/// the code is unknown, inactive, outside its window, or exhausted.
pub(super) async fn redeem_with<'e, E>(
    executor: E,
    code: &str,
) -> Result<Option<PromoCodeEntity>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, PromoCodeEntity>(&format!(
        r#"
        UPDATE promo_codes
        SET current_uses = current_uses + 1, updated_at = NOW()
        WHERE code = $1
          AND is_active = true
          AND (valid_from IS NULL OR valid_from <= NOW())
          AND (valid_until IS NULL OR valid_until >= NOW())
          AND (max_uses IS NULL OR current_uses < max_uses)
        RETURNING {}
        "#,
        PROMO_CODE_COLUMNS
    ))
    .bind(normalize_code(code))
    .fetch_optional(executor)
    .await
}

/// Repository for promo code operations.
#[derive(Clone)]
pub struct PromoCodeRepository {
    pool: PgPool,
}

impl PromoCodeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates a promo code. The code is stored normalized.
    pub async fn create(
        &self,
        request: &CreatePromoCodeRequest,
    ) -> Result<PromoCodeEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_promo_code");
        let result = sqlx::query_as::<_, PromoCodeEntity>(&format!(
            r#"
            INSERT INTO promo_codes (
                code, description, discount_type, discount_value, max_uses,
                valid_from, valid_until, is_active
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            PROMO_CODE_COLUMNS
        ))
        .bind(normalize_code(&request.code))
        .bind(&request.description)
        .bind(DiscountTypeDb::from(request.discount_type))
        .bind(request.discount_value)
        .bind(request.max_uses)
        .bind(request.valid_from)
        .bind(request.valid_until)
        .bind(request.is_active)
        .fetch_one(&self.pool)
        .await;
        timer.finish(&result);
        result
    }

    /// Finds a promo code, matching case-insensitively.
    pub async fn find_by_code(&self, code: &str) -> Result<Option<PromoCodeEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_promo_code_by_code");
        let result = sqlx::query_as::<_, PromoCodeEntity>(&format!(
            "SELECT {} FROM promo_codes WHERE code = $1",
            PROMO_CODE_COLUMNS
        ))
        .bind(normalize_code(code))
        .fetch_optional(&self.pool)
        .await;
        timer.finish(&result);
        result
    }

    /// Lists promo codes, newest first.
    pub async fn list(&self, limit: i64, offset: i64) -> Result<Vec<PromoCodeEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_promo_codes");
        let result = sqlx::query_as::<_, PromoCodeEntity>(&format!(
            "SELECT {} FROM promo_codes ORDER BY created_at DESC LIMIT $1 OFFSET $2",
            PROMO_CODE_COLUMNS
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await;
        timer.finish(&result);
        result
    }

    /// Counts all promo codes.
    pub async fn count(&self) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_promo_codes");
        let result = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM promo_codes")
            .fetch_one(&self.pool)
            .await;
        timer.finish(&result);
        result
    }
}
