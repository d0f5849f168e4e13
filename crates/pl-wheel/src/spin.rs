use chrono::{DateTime, Utc};
use pl_core::UserId;
use serde::{Deserialize, Serialize};

use crate::event::{EventId, ItemId};

/// The record of one spin of the wheel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spin {
    /// The event the item belongs to.
    pub event_id: EventId,
    /// The item the spin was for.
    pub item_id: ItemId,
    /// Who has to bring it.
    pub winner_id: UserId,
    /// When the wheel stopped.
    pub timestamp: DateTime<Utc>,
    /// Whether every participant had an equal slice.
    pub was_in_fair_mode: bool,
    /// Karma the winner received.
    pub winner_karma_bonus: i64,
}
