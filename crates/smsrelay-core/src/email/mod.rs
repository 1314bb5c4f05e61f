//! Email delivery configuration.

mod model;
mod repository;

pub use model::{DEFAULT_SENDER_NAME, DeliveryMethod, EmailConfig, MASKED_PASSWORD};
pub use repository::EmailConfigRepository;
