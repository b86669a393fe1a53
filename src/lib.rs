pub mod analysers;
pub mod cli;
pub mod clock;
pub mod debouncer;
pub mod detection;
pub mod error;
pub mod frames;
pub mod json;
pub mod notify;
pub mod output;
pub mod states;

pub use clock::{Clock, ManualClock, SystemClock};
pub use debouncer::{AlertDebouncer, AlertDecision, DebouncerConfig, Decision, SharedDebouncer};
pub use error::{Error, Result};

pub const ERR_CONTAINS_ALERT: u8 = 0b0001;
pub const ERR_CONTAINS_OUTAGE: u8 = 0b0010;
pub const ERR_NOTIFICATION_FAILED: u8 = 0b0100;
