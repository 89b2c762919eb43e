//! Refund request route handlers.
//!
//! List with filters and the bulk action bar, the detail/edit form, and the
//! action endpoint.

mod actions;
mod detail;
mod list;
pub mod types;

pub use actions::{NO_ACTION, NOTHING_SELECTED, run_action};
pub use detail::{RefundShowTemplate, show, update};
pub use list::{FilterView, RefundsIndexTemplate, index};
