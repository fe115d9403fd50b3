//! Cardstock Core - Shared types library.
//!
//! This crate provides common types used across all Cardstock components:
//! - `storefront` - The intentionally-vulnerable shop service
//! - `cli` - Command-line tools for migrations and seeding
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no database
//! access, no HTTP. This keeps it lightweight and allows it to be used
//! anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs and the account role
//! - [`cart`] - The client-held cart mapping and its merge rules

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod types;

pub use cart::{Cart, DecodedCart};
pub use types::*;
