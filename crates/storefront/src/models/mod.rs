//! Domain models for storefront.

pub mod product;

pub use product::{Category, Product};
