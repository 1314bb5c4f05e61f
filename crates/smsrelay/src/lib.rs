//! # smsrelay
//!
//! HTTP front end of the SMS-to-email relay.
//!
//! Devices post received SMS to `/api/sms/forward`; the relay runs them
//! through the configured filters, emails them and keeps a log that the
//! dashboard endpoints summarize.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod api;
pub mod config;
pub mod telemetry;

pub use api::{AppState, router, serve};
pub use config::{Config, ConfigError};
pub use telemetry::init_tracing;
