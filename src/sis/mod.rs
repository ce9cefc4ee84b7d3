//! Client for the SIS (Ellucian Banner self-service) HTTP endpoints.
//!
//! This module provides:
//! - One method per SIS endpoint, with JSON and HTML-fragment decoding
//! - Session-state handling (one client per sequenced unit of work)
//! - Retrying HTTP plumbing with backoff and per-session connection caps
//! - Term code construction and parsing

pub mod client;
pub mod errors;
pub mod fetch;
pub mod html;
pub mod json;
pub mod models;
pub mod restrictions;
pub mod term;
pub mod unescape;

pub use client::SisClient;
pub use errors::SisApiError;
pub use term::{Season, Term};
