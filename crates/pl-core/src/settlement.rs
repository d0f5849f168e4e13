use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, LedgerResult};
use crate::id::{SettlementId, UserId};

/// A rock-paper-scissors hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Choice {
    /// Beats scissors.
    Rock,
    /// Beats rock.
    Paper,
    /// Beats paper.
    Scissors,
}

impl Choice {
    /// All three hands.
    pub fn all() -> &'static [Self] {
        &[Self::Rock, Self::Paper, Self::Scissors]
    }

    /// Whether this hand beats `other`.
    pub fn beats(self, other: Self) -> bool {
        matches!(
            (self, other),
            (Self::Rock, Self::Scissors) | (Self::Scissors, Self::Paper) | (Self::Paper, Self::Rock)
        )
    }

    /// Parse a hand from user input.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "rock" | "r" => Some(Self::Rock),
            "paper" | "p" => Some(Self::Paper),
            "scissors" | "s" => Some(Self::Scissors),
            _ => None,
        }
    }
}

impl std::fmt::Display for Choice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rock => write!(f, "rock"),
            Self::Paper => write!(f, "paper"),
            Self::Scissors => write!(f, "scissors"),
        }
    }
}

/// How a settlement came about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettlementMethod {
    /// An ordinary payment.
    Normal,
    /// The outcome of a debt game.
    Game,
}

/// What a debt game did to the debt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameAction {
    /// The debtor won and the debt is wiped.
    Cancel,
    /// The creditor won and the debt doubles.
    Double,
}

impl std::fmt::Display for GameAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cancel => write!(f, "cancel"),
            Self::Double => write!(f, "double"),
        }
    }
}

/// Game details attached to a settlement produced by a debt game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameResultInfo {
    /// The winning player.
    pub winner: UserId,
    /// What happened to the debt.
    pub action: GameAction,
    /// The debtor's hand.
    pub player1_choice: Option<Choice>,
    /// The creditor's (or bot's) hand.
    pub player2_choice: Option<Choice>,
}

/// A recorded transfer between two users.
///
/// `amount` is subtracted from what `from` owes `to`. A negative amount
/// therefore increases the debt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settlement {
    /// Unique identifier.
    pub id: SettlementId,
    /// The debtor being credited.
    pub from: UserId,
    /// The creditor.
    pub to: UserId,
    /// Signed amount.
    pub amount: f64,
    /// When the settlement was recorded.
    pub date: DateTime<Utc>,
    /// Payment or game outcome.
    pub method: SettlementMethod,
    /// Present for game outcomes.
    pub game_result: Option<GameResultInfo>,
}

impl Settlement {
    /// An ordinary payment of `amount` from `from` to `to`.
    pub fn payment(from: UserId, to: UserId, amount: f64, date: DateTime<Utc>) -> Self {
        Self {
            id: SettlementId::new(),
            from,
            to,
            amount,
            date,
            method: SettlementMethod::Normal,
            game_result: None,
        }
    }

    /// A settlement produced by a debt game.
    pub fn game(
        from: UserId,
        to: UserId,
        amount: f64,
        date: DateTime<Utc>,
        result: GameResultInfo,
    ) -> Self {
        Self {
            id: SettlementId::new(),
            from,
            to,
            amount,
            date,
            method: SettlementMethod::Game,
            game_result: Some(result),
        }
    }

    /// Check the shape of the settlement.
    ///
    /// Game settlements may carry a negative amount; normal payments must be
    /// positive.
    pub fn validate(&self) -> LedgerResult<()> {
        if self.from == self.to {
            return Err(LedgerError::InvalidSettlement(
                "a user cannot settle with themselves".to_string(),
            ));
        }
        if !self.amount.is_finite() {
            return Err(LedgerError::InvalidSettlement(format!(
                "amount must be finite, got {}",
                self.amount
            )));
        }
        if self.method == SettlementMethod::Normal && self.amount <= 0.0 {
            return Err(LedgerError::InvalidSettlement(format!(
                "a payment must be positive, got {}",
                self.amount
            )));
        }
        if self.method == SettlementMethod::Game && self.game_result.is_none() {
            return Err(LedgerError::InvalidSettlement(
                "game settlement without a game result".to_string(),
            ));
        }
        Ok(())
    }
}
