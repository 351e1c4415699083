//! Repository implementations for database operations.

pub mod event;
pub mod promo_code;
pub mod registration;

pub use event::{EventRepository, NewCourseEvent};
pub use promo_code::PromoCodeRepository;
pub use registration::{
    CreateRegistrationError, PaymentRefs, RegistrationFilter, RegistrationRepository,
};
