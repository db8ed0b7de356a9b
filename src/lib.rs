//! Crashdesk server library
//!
//! Crash report deduplication and lifecycle tracking, exposed as a library so
//! the integration tests can drive the services and routes directly.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
