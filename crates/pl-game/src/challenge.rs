//! Challenge records.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use pl_core::{Choice, UserId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a challenge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ChallengeId(pub Uuid);

impl ChallengeId {
    /// Generate a new random challenge ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Check whether the hyphenated form starts with `prefix`.
    pub fn matches_prefix(&self, prefix: &str) -> bool {
        !prefix.is_empty() && self.0.to_string().starts_with(&prefix.to_lowercase())
    }
}

impl Default for ChallengeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ChallengeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.0.to_string()[..8])
    }
}

impl FromStr for ChallengeId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Where a challenge is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeStatus {
    /// Issued to a human, waiting for them to accept.
    Pending,
    /// Hands may be played.
    InProgress,
    /// Decided; a settlement was emitted.
    Completed,
}

impl fmt::Display for ChallengeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::InProgress => write!(f, "in progress"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

/// Which of the two players a user is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// The debtor, who issued the challenge.
    Player1,
    /// The creditor (or the bot standing in for them).
    Player2,
}

/// A rock-paper-scissors game over one debt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Challenge {
    /// Unique identifier.
    pub id: ChallengeId,
    /// The debtor (player one).
    pub from_id: UserId,
    /// The creditor (player two).
    pub to_id: UserId,
    /// The debt at stake.
    pub amount: f64,
    /// Whether a bot plays for the creditor.
    pub is_bot: bool,
    /// Lifecycle state.
    pub status: ChallengeStatus,
    /// The debtor's hand, once played.
    pub player1_choice: Option<Choice>,
    /// The creditor's hand, once played.
    pub player2_choice: Option<Choice>,
    /// When the challenge was issued.
    pub created_at: DateTime<Utc>,
}

impl Challenge {
    /// Which side `player` is on, if either.
    pub fn side_of(&self, player: UserId) -> Option<Side> {
        if player == self.from_id {
            Some(Side::Player1)
        } else if player == self.to_id {
            Some(Side::Player2)
        } else {
            None
        }
    }

    /// Both hands, if both have been played.
    pub fn hands(&self) -> Option<(Choice, Choice)> {
        Some((self.player1_choice?, self.player2_choice?))
    }
}
