//! Storedesk Core - Shared types library.
//!
//! This crate provides common types used across all Storedesk components:
//! - `admin` - The back-office REST API
//! - `cli` - Command-line tools for migrations and management
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. This keeps it lightweight and allows it to be used
//! anywhere, including from the CLI without pulling in the web stack.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, money, emails, and statuses
//! - [`totals`] - Cart and order total arithmetic, coupon discounts, stock levels
//! - [`slug`] - URL slug generation from display names
//! - [`pagination`] - Page/limit arithmetic and the pagination envelope

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod pagination;
pub mod slug;
pub mod totals;
pub mod types;

pub use pagination::{Page, PageRequest, Pagination, PaginationError, SortDirection};
pub use slug::build_slug;
pub use types::*;
