//! Domain layer for the Dental Masterclass backend.
//!
//! This crate contains:
//! - Domain models (CourseEvent, Registration, PromoCode)
//! - Pricing, registration wizard and payment services
//! - Domain error types

pub mod models;
pub mod services;
