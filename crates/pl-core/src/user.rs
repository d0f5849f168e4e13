use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::UserId;

/// A participant in the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Reputation score.
    pub karma_score: u32,
    /// Number of consecutive on-time payments.
    pub payment_streak: u32,
    /// When the user last paid for something.
    pub last_payment_date: Option<DateTime<Utc>>,
    /// When the user was added.
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create a user with a fresh id, no payment history, and the given karma.
    pub fn new(name: impl Into<String>, karma_score: u32, now: DateTime<Utc>) -> Self {
        Self {
            id: UserId::new(),
            name: name.into(),
            karma_score,
            payment_streak: 0,
            last_payment_date: None,
            created_at: now,
        }
    }
}
