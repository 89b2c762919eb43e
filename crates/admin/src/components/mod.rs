//! Reusable UI building blocks for the admin templates.

pub mod data_table;
