//! Tidemark admin library.
//!
//! The refund back office as a library, so the binary, the CLI and the
//! integration tests share one implementation.
//!
//! # Security
//!
//! This crate can move money-adjacent state: it restocks products, adjusts
//! customer rewards balances and manages admin users. Serve it only on a
//! private network.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod components;
pub mod config;
pub mod db;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod registry;
pub mod routes;
pub mod services;
pub mod state;
