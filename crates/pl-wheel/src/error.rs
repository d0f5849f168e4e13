use pl_core::UserId;

use crate::event::{EventId, ItemId};

/// Alias for `Result<T, WheelError>`.
pub type WheelResult<T> = Result<T, WheelError>;

/// Errors raised by the planner and the sampler.
#[derive(Debug, thiserror::Error)]
pub enum WheelError {
    /// A weight is negative or not a number, or they sum to zero.
    #[error("invalid weights: {0}")]
    InvalidWeights(String),

    /// No planner user with this id.
    #[error("unknown user: {0}")]
    UnknownUser(UserId),

    /// No event with this id.
    #[error("event not found: {0}")]
    EventNotFound(EventId),

    /// The event has no item with this id.
    #[error("item {item} not found in event {event}")]
    ItemNotFound {
        /// The event searched.
        event: EventId,
        /// The missing item.
        item: ItemId,
    },

    /// The event is missing a title.
    #[error("invalid event: {0}")]
    InvalidEvent(String),
}
