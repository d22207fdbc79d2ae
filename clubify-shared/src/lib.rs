//! # Clubify Shared Library
//!
//! Types, persistence and business rules shared by the Clubify API server.
//!
//! ## Module Organization
//!
//! - `models`: Records (users, clubs, tasks, events, products, sales,
//!   proposals, messages) and their SQL
//! - `auth`: Password hashing, tokens, identity resolution and role gates
//! - `analytics`: Sales aggregation and pie-chart geometry
//! - `mail`: Outbound e-mail relay
//! - `db`: Connection pool and migrations

pub mod analytics;
pub mod auth;
pub mod db;
pub mod mail;
pub mod models;

/// Current version of the Clubify shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
