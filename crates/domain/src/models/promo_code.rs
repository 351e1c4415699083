//! Promo code domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

/// How a promo code reduces the price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscountType {
    Percentage,
    Fixed,
}

impl DiscountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscountType::Percentage => "percentage",
            DiscountType::Fixed => "fixed",
        }
    }
}

impl FromStr for DiscountType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "percentage" => Ok(DiscountType::Percentage),
            "fixed" => Ok(DiscountType::Fixed),
            _ => Err(format!("Invalid discount type: {}", s)),
        }
    }
}

impl fmt::Display for DiscountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A discount code that can be applied to a registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PromoCode {
    pub id: Uuid,
    pub code: String,
    pub description: Option<String>,
    pub discount_type: DiscountType,
    pub discount_value: f64,
    pub max_uses: Option<i32>,
    pub current_uses: i32,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_until: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PromoCode {
    /// Whether the code can be redeemed at `now`.
    ///
    /// Active, inside the (optionally open-ended) validity window, and
    /// below the usage cap when one is set. Computed, never stored.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        if !self.is_active {
            return false;
        }
        if self.valid_from.is_some_and(|from| now < from) {
            return false;
        }
        if self.valid_until.is_some_and(|until| now > until) {
            return false;
        }
        match self.max_uses {
            Some(max) => self.current_uses < max,
            None => true,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now())
    }

    /// Discount this code grants on `subtotal`, clamped to `[0, subtotal]`.
    pub fn discount_for(&self, subtotal: f64) -> f64 {
        if subtotal <= 0.0 {
            return 0.0;
        }
        let raw = match self.discount_type {
            DiscountType::Percentage => subtotal * self.discount_value.min(100.0) / 100.0,
            DiscountType::Fixed => self.discount_value,
        };
        raw.clamp(0.0, subtotal)
    }
}

/// Codes are stored trimmed and upper-cased.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// Request to create a promo code (admin).
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct CreatePromoCodeRequest {
    #[validate(length(min = 3, max = 32, message = "Code must be between 3 and 32 characters"))]
    #[validate(custom(function = "shared::validation::validate_not_blank"))]
    pub code: String,

    #[validate(length(max = 200, message = "Description must be at most 200 characters"))]
    pub description: Option<String>,

    pub discount_type: DiscountType,

    #[validate(custom(function = "shared::validation::validate_amount"))]
    pub discount_value: f64,

    #[validate(range(min = 1, message = "max_uses must be at least 1"))]
    pub max_uses: Option<i32>,

    pub valid_from: Option<DateTime<Utc>>,
    pub valid_until: Option<DateTime<Utc>>,

    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

impl CreatePromoCodeRequest {
    /// Cross-field checks the derive cannot express.
    pub fn check_consistency(&self) -> Result<(), String> {
        if self.discount_type == DiscountType::Percentage && self.discount_value > 100.0 {
            return Err("Percentage discount cannot exceed 100".to_string());
        }
        if let (Some(from), Some(until)) = (self.valid_from, self.valid_until) {
            if until < from {
                return Err("valid_until must not be before valid_from".to_string());
            }
        }
        Ok(())
    }
}

/// Public view of a promo code (for GET /promo-codes/:code).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct PromoCodeStatusResponse {
    pub code: String,
    pub is_valid: bool,
    pub discount_type: DiscountType,
    pub discount_value: f64,
}

impl From<&PromoCode> for PromoCodeStatusResponse {
    fn from(promo: &PromoCode) -> Self {
        Self {
            code: promo.code.clone(),
            is_valid: promo.is_valid(),
            discount_type: promo.discount_type,
            discount_value: promo.discount_value,
        }
    }
}
