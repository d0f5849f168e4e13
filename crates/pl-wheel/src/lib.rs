//! Wheel of fate for Potluck.
//!
//! Events have a list of items somebody has to bring. Spinning the wheel
//! for an item picks a user, either uniformly (fair mode) or by weight, and
//! rewards the winner with a little karma.

/// Configuration for spins.
pub mod config;
/// Error types for the planner and sampler.
pub mod error;
/// Planned events, their items and responses.
pub mod event;
/// The planner state object.
pub mod planner;
/// Weighted random selection.
pub mod sampler;
/// Recorded spins.
pub mod spin;

pub use config::WheelConfig;
pub use error::{WheelError, WheelResult};
pub use event::{Event, EventId, EventItem, EventResponse, ItemId, NewEvent, Rsvp};
pub use planner::{Planner, WheelUser};
pub use sampler::{SpinMode, draw_weighted_winner};
pub use spin::Spin;
