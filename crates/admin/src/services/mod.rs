//! Business logic services for admin.
//!
//! # Services
//!
//! - `auth` - Email + password authentication for admin users
//! - `refunds` - Refund bulk actions and their batch reports

pub mod auth;
pub mod refunds;

pub use auth::{AdminAuthService, AuthError};
pub use refunds::{
    ActionError, BatchReport, GoodwillOutcome, ItemOutcome, ItemReport, RefundAction,
    RefundHooks, RefundStore, RefundWorkflow, SkipReason,
};
