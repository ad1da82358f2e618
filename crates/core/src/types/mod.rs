//! Core types for Storedesk.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod price;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use price::{MAX_MONEY, MONEY_TOLERANCE, fit_money, money_eq, round_money};
pub use status::*;
