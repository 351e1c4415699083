//! Registration pricing.
//!
//! A quote is a pure function of the selected event and the wizard
//! selections: a base price for the chosen number of course days plus
//! priced extras. The server-side snapshot extends the quote with
//! registration add-ons and a promo discount.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::models::{
    CertificateType, CourseEvent, CreateRegistrationRequest, DayCount, PricingSnapshot, PromoCode,
    QuoteRequest,
};

/// Nightly accommodation rate.
pub const DEFAULT_NIGHTLY_RATE: f64 = 100.0;

/// Base price used when an event carries no usable price data.
pub const DEFAULT_FALLBACK_BASE_PRICE: f64 = 2500.0;

/// Currency of all amounts.
pub const DEFAULT_CURRENCY: &str = "GBP";

lazy_static! {
    static ref LEADING_AMOUNT: Regex =
        Regex::new(r"\d[\d,]*(?:\.\d+)?").expect("amount pattern is valid");
}

/// Configurable prices that are not part of the event record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PricingRates {
    pub nightly_rate: f64,
    pub fallback_base_price: f64,
    pub certificate_hardcopy_fee: f64,
    pub materials_kit_price: f64,
    pub networking_dinner_price: f64,
    pub currency: String,
}

impl Default for PricingRates {
    fn default() -> Self {
        Self {
            nightly_rate: DEFAULT_NIGHTLY_RATE,
            fallback_base_price: DEFAULT_FALLBACK_BASE_PRICE,
            certificate_hardcopy_fee: 25.0,
            materials_kit_price: 150.0,
            networking_dinner_price: 75.0,
            currency: DEFAULT_CURRENCY.to_string(),
        }
    }
}

/// Where a base price comes from.
///
/// Event records are inconsistent in shape: some carry a per-day table,
/// some a flat number, some only a display string. The variant is chosen
/// once and resolved in a single match.
#[derive(Debug, Clone, PartialEq)]
pub enum PriceSource {
    /// Entry of the per-day price table for the selected day count.
    Table { days: DayCount, price: f64 },
    /// Flat numeric base price.
    Flat(f64),
    /// Human-readable tier price such as `"£2,500"`.
    TierString(String),
    /// No usable price data.
    Default,
}

impl PriceSource {
    /// Picks the source for `days`: table entry, flat price, first tier, default.
    pub fn for_event(event: &CourseEvent, days: DayCount) -> Self {
        if let Some(price) = event
            .multi_day_pricing
            .as_ref()
            .and_then(|table| table.get(days))
        {
            return PriceSource::Table { days, price };
        }
        if let Some(price) = event.base_price {
            return PriceSource::Flat(price);
        }
        if let Some(tier) = event.pricing_tiers.first() {
            return PriceSource::TierString(tier.price.clone());
        }
        PriceSource::Default
    }

    /// Resolves the base price. Unparsable tier strings degrade to the fallback.
    pub fn resolve(&self, rates: &PricingRates) -> f64 {
        match self {
            PriceSource::Table { price, .. } => *price,
            PriceSource::Flat(price) => *price,
            PriceSource::TierString(text) => {
                parse_leading_amount(text).unwrap_or(rates.fallback_base_price)
            }
            PriceSource::Default => rates.fallback_base_price,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            PriceSource::Table { .. } => "table",
            PriceSource::Flat(_) => "flat",
            PriceSource::TierString(_) => "tier_string",
            PriceSource::Default => "default",
        }
    }
}

/// Extracts the first numeric amount from a display string.
///
/// `"£2,500"` → 2500, `"From £1,250.50 per person"` → 1250.5.
pub fn parse_leading_amount(text: &str) -> Option<f64> {
    let matched = LEADING_AMOUNT.find(text)?;
    matched.as_str().replace(',', "").parse::<f64>().ok()
}

/// A labeled priced line item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Extra {
    pub name: String,
    pub price: f64,
}

/// Price quote shown to the user while filling in the wizard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Quote {
    pub base_price: f64,
    pub extras: Vec<Extra>,
    pub total: f64,
}

/// Selections that drive a quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuoteInput {
    pub course_days: DayCount,
    pub needs_accommodation: bool,
    pub accommodation_nights: Option<DayCount>,
}

impl From<QuoteRequest> for QuoteInput {
    fn from(request: QuoteRequest) -> Self {
        Self {
            course_days: request.course_days,
            needs_accommodation: request.accommodation_nights.is_some(),
            accommodation_nights: request.accommodation_nights,
        }
    }
}

/// Accommodation cost: nights × nightly rate, only when requested.
pub fn accommodation_cost(input: &QuoteInput, rates: &PricingRates) -> f64 {
    match (input.needs_accommodation, input.accommodation_nights) {
        (true, Some(nights)) => f64::from(nights.get()) * rates.nightly_rate,
        _ => 0.0,
    }
}

/// Computes the quote for an event and wizard selections.
pub fn calculate_quote(event: &CourseEvent, input: &QuoteInput, rates: &PricingRates) -> Quote {
    let source = PriceSource::for_event(event, input.course_days);
    let base_price = source.resolve(rates);
    tracing::debug!(
        event_id = %event.id,
        course_days = %input.course_days,
        price_source = source.kind(),
        base_price,
        "Resolved base price"
    );

    let mut extras = Vec::new();
    let accommodation = accommodation_cost(input, rates);
    if accommodation != 0.0 {
        let nights = input.accommodation_nights.map(DayCount::get).unwrap_or_default();
        extras.push(Extra {
            name: format!(
                "Accommodation ({} night{})",
                nights,
                if nights == 1 { "" } else { "s" }
            ),
            price: accommodation,
        });
    }

    let total = base_price + extras.iter().map(|e| e.price).sum::<f64>();
    Quote {
        base_price,
        extras,
        total,
    }
}

/// Builds the persisted snapshot for a registration request.
///
/// The promo code, when given, must already have been checked for validity.
pub fn build_snapshot(
    event: &CourseEvent,
    request: &CreateRegistrationRequest,
    promo: Option<&PromoCode>,
    rates: &PricingRates,
) -> PricingSnapshot {
    let input = QuoteInput {
        course_days: request.course_days,
        needs_accommodation: request.priced_nights().is_some(),
        accommodation_nights: request.priced_nights(),
    };
    let base_price = PriceSource::for_event(event, request.course_days).resolve(rates);
    let accommodation = accommodation_cost(&input, rates);

    let certificate = match request.certificate_type {
        CertificateType::Hardcopy => rates.certificate_hardcopy_fee,
        CertificateType::Digital => 0.0,
    };
    let materials = if request.materials_kit {
        rates.materials_kit_price
    } else {
        0.0
    };
    let dinner = if request.networking_dinner {
        rates.networking_dinner_price
    } else {
        0.0
    };

    let mut snapshot = PricingSnapshot {
        base_price,
        accommodation,
        food: 0.0,
        certificate,
        materials,
        dinner,
        discount: 0.0,
        total: 0.0,
        currency: rates.currency.clone(),
    };
    let subtotal = snapshot.subtotal();
    snapshot.discount = promo.map(|p| p.discount_for(subtotal)).unwrap_or(0.0);
    snapshot.total = (subtotal - snapshot.discount).max(0.0);
    snapshot
}
