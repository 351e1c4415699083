//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod event;
pub mod promo_code;
pub mod registration;

pub use event::CourseEventEntity;
pub use promo_code::{DiscountTypeDb, PromoCodeEntity};
pub use registration::{
    AdminStatsEntity, InvalidColumnError, PaymentStatusDb, RegistrationEntity,
    RegistrationStatusDb,
};
