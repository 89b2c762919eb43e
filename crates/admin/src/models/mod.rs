//! Domain models for admin.
//!
//! - [`refund`] - Refund requests, refund items, list filters and edit inputs
//! - [`order`] - Orders, order items and shipping addresses (read-only)
//! - [`admin_user`] - Admin panel users
//! - [`session`] - Session-stored identity and flash messages

pub mod admin_user;
pub mod order;
pub mod refund;
pub mod session;

pub use admin_user::{AdminRole, AdminUser};
pub use session::{CurrentAdmin, FlashMessage, MessageLevel, keys as session_keys};
