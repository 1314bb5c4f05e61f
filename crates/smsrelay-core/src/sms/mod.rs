//! Received SMS records and statistics.

mod model;
mod repository;

pub use model::{DeliveryStatus, ForwardRequest, SmsMessage, SmsStats, parse_timestamp};
pub use repository::MessageRepository;
