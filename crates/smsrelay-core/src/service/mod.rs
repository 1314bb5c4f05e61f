//! Services combining storage and delivery.

mod forward;

pub use forward::{
    DEFAULT_TEST_MESSAGE, FILTERED_MESSAGE, ForwardOutcome, ForwardService, TEST_SENDER,
    TestOutcome,
};
