//! Domain models for the Dental Masterclass backend.

pub mod event;
pub mod promo_code;
pub mod registration;

pub use event::{CourseEvent, DayCount, MultiDayPricing, PricingTier, QuoteRequest};
pub use promo_code::{
    normalize_code, CreatePromoCodeRequest, DiscountType, PromoCode, PromoCodeStatusResponse,
};
pub use registration::{
    generate_confirmation_number, is_valid_confirmation_number, AccommodationType, AdminStats,
    CertificateType, ConfirmPaymentRequest, CreateRegistrationRequest, FoodPreference,
    PaymentStatus, PricingSnapshot, Profession, Registration, RegistrationListResponse,
    RegistrationQuery, RegistrationStatus, UpdateRegistrationRequest,
};
