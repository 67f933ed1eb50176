//! # Contracts
//!
//! Shared interface contracts for the update scheduler workspace.
//! Business crates depend on this crate only; reverse dependencies are prohibited.
//!
//! ## Time Model
//! - Monotonic `std::time::Instant` obtained through the [`Clock`] trait
//! - Intervals in configuration are expressed in seconds (`f64`)

mod channel_id;
mod clock;
mod error;
mod request;
mod scheduler_config;

pub use channel_id::{channels, ChannelId};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::*;
pub use request::UpdateRequest;
pub use scheduler_config::*;
