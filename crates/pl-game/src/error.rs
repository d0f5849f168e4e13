//! Error types for debt challenges.

use pl_core::{LedgerError, UserId};
use thiserror::Error;

use crate::challenge::ChallengeId;

/// Result type for game operations.
pub type GameResult<T> = Result<T, GameError>;

/// Errors that can occur while playing a debt challenge.
#[derive(Debug, Error)]
pub enum GameError {
    /// No challenge with this id.
    #[error("challenge not found: {0}")]
    ChallengeNotFound(ChallengeId),

    /// The operation is not allowed in the challenge's current state.
    #[error("invalid transition: {0}")]
    InvalidTransition(String),

    /// The debt is too large to gamble.
    #[error("stake {amount} exceeds the cap of {cap}")]
    StakeTooHigh {
        /// The requested stake.
        amount: f64,
        /// The configured cap.
        cap: f64,
    },

    /// The stake is zero, negative, or not a number.
    #[error("invalid stake: {0}")]
    InvalidStake(f64),

    /// A user tried to challenge themselves.
    #[error("a user cannot challenge themselves")]
    SelfChallenge,

    /// The user is not one of the two players.
    #[error("{player} is not playing challenge {challenge}")]
    NotAParticipant {
        /// The challenge.
        challenge: ChallengeId,
        /// The outsider.
        player: UserId,
    },

    /// The expense book rejected the operation.
    #[error("{0}")]
    Ledger(#[from] LedgerError),
}
