//! Rock-paper-scissors debt challenges.
//!
//! A small debt can be gambled: the debtor challenges the creditor (or a
//! bot) to a game. If the debtor wins, the debt is cancelled; if the
//! creditor wins, it doubles. The [`GameBoard`] is the state machine, the
//! [`DebtTable`] ties it to an [`pl_core::ExpenseBook`], and [`round`]
//! drives the delayed bot reveal with one-shot timers.

pub mod board;
pub mod challenge;
pub mod config;
pub mod error;
pub mod round;
pub mod table;

pub use board::{GameBoard, RoundOutcome};
pub use challenge::{Challenge, ChallengeId, ChallengeStatus, Side};
pub use config::GameConfig;
pub use error::{GameError, GameResult};
pub use round::{BotRound, RoundEvent, RoundHandle, schedule_bot_round};
pub use table::DebtTable;
