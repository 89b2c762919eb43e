//! Tidemark storefront library.
//!
//! The public catalog: the store front page, product detail, category and
//! brand listings, and search.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;
