//! Tidemark Core - Shared types library.
//!
//! This crate provides common types used across all Tidemark components:
//! - `storefront` - Public-facing catalog and search pages
//! - `admin` - Refund and order administration panel
//! - `cli` - Command-line tools for migrations and management
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no database access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Typed IDs, money, emails, and the refund status state machine

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
