//! Shared utilities and common types for the Dental Masterclass backend.
//!
//! This crate provides common functionality used across all other crates:
//! - Hashing utilities for the admin API key
//! - Base36 encoding for human-facing reference codes
//! - Page/offset pagination maths
//! - Common validation logic

pub mod base36;
pub mod crypto;
pub mod pagination;
pub mod validation;
