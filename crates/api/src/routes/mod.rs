//! HTTP route handlers.

pub mod admin;
pub mod events;
pub mod health;
pub mod payments;
pub mod promo_codes;
pub mod registrations;
