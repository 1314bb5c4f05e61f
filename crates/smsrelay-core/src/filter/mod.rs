//! Forwarding filters: which SMS get emailed.

mod evaluate;
mod model;
mod repository;

pub use evaluate::{FilterDecision, evaluate};
pub use model::{FilterType, FilterUpdate, SmsFilter};
pub use repository::FilterRepository;
