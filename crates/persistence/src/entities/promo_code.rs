//! Promo code entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::{DiscountType, PromoCode};
use sqlx::FromRow;
use uuid::Uuid;

/// Database enum for discount_type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "discount_type", rename_all = "lowercase")]
pub enum DiscountTypeDb {
    Percentage,
    Fixed,
}

impl From<DiscountTypeDb> for DiscountType {
    fn from(db: DiscountTypeDb) -> Self {
        match db {
            DiscountTypeDb::Percentage => DiscountType::Percentage,
            DiscountTypeDb::Fixed => DiscountType::Fixed,
        }
    }
}

impl From<DiscountType> for DiscountTypeDb {
    fn from(discount_type: DiscountType) -> Self {
        match discount_type {
            DiscountType::Percentage => DiscountTypeDb::Percentage,
            DiscountType::Fixed => DiscountTypeDb::Fixed,
        }
    }
}

/// Database row mapping for the promo_codes table.
#[derive(Debug, Clone, FromRow)]
pub struct PromoCodeEntity {
    pub id: Uuid,
    pub code: String,
    pub description: Option<String>,
    pub discount_type: DiscountTypeDb,
    pub discount_value: f64,
    pub max_uses: Option<i32>,
    pub current_uses: i32,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_until: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<PromoCodeEntity> for PromoCode {
    fn from(entity: PromoCodeEntity) -> Self {
        Self {
            id: entity.id,
            code: entity.code,
            description: entity.description,
            discount_type: entity.discount_type.into(),
            discount_value: entity.discount_value,
            max_uses: entity.max_uses,
            current_uses: entity.current_uses,
            valid_from: entity.valid_from,
            valid_until: entity.valid_until,
            is_active: entity.is_active,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}
