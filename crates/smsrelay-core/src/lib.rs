//! # smsrelay-core
//!
//! Core logic of the SMS-to-email relay.
//!
//! This crate provides:
//! - **SMS log**: every received SMS with its delivery outcome, plus
//!   aggregate statistics
//! - **Filters**: sender and keyword rules deciding what gets forwarded
//! - **Email configuration**: the single active delivery target
//! - **Delivery**: message composition and SMTP submission with retries
//! - **Forwarding**: the pipeline tying the above together
//! - Local storage (`SQLite`)

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod delivery;
pub mod email;
mod error;
pub mod filter;
pub mod service;
pub mod sms;
mod store;
pub mod validation;

pub use delivery::{DeliveryReport, Mailer, RetryPolicy, SmtpMailer, SmtpOptions};
pub use email::{DeliveryMethod, EmailConfig, EmailConfigRepository};
pub use error::{Error, Result};
pub use filter::{FilterDecision, FilterRepository, FilterType, FilterUpdate, SmsFilter};
pub use service::{ForwardOutcome, ForwardService, TestOutcome};
pub use sms::{DeliveryStatus, ForwardRequest, MessageRepository, SmsMessage, SmsStats};
pub use store::Store;
pub use validation::{
    ValidationError, ValidationResult, is_valid_email, validate_email_config, validate_filter,
    validate_filter_update,
};
