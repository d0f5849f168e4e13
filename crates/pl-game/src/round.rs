//! Delayed bot rounds.
//!
//! Against the bot, the player's hand is shown first, the bot's hand is
//! revealed after a pause, and the result lands after a second pause. The
//! bot's hand is drawn up front and all state changes happen in a single
//! step at the end, so cancelling the round (or dropping its handle) at any
//! point before that leaves the table exactly as it was.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::Utc;
use pl_core::{Choice, UserId};
use rand::Rng;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::board::{RoundOutcome, random_choice};
use crate::challenge::ChallengeId;
use crate::error::GameResult;
use crate::table::DebtTable;

/// One player-versus-bot round, with both hands already decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BotRound {
    /// The challenge being played.
    pub challenge: ChallengeId,
    /// The human player (the debtor).
    pub player: UserId,
    /// The player's hand.
    pub choice: Choice,
    /// The bot's hand.
    pub bot: Choice,
}

impl BotRound {
    /// Check the round is playable and draw the bot's hand.
    pub fn draw<R: Rng + ?Sized>(
        table: &DebtTable,
        challenge: ChallengeId,
        player: UserId,
        choice: Choice,
        rng: &mut R,
    ) -> GameResult<Self> {
        table.board().check_bot_round(challenge, player)?;
        Ok(Self {
            challenge,
            player,
            choice,
            bot: random_choice(rng),
        })
    }
}

/// Progress reported by a scheduled round.
#[derive(Debug)]
pub enum RoundEvent {
    /// The bot's hand is now visible.
    BotRevealed(Choice),
    /// The round was committed to the table.
    Finished(GameResult<RoundOutcome>),
}

/// Handle to a scheduled round. Dropping it cancels the round.
#[derive(Debug)]
pub struct RoundHandle {
    task: JoinHandle<()>,
    events: mpsc::UnboundedReceiver<RoundEvent>,
}

impl RoundHandle {
    /// Cancel the round. Has no effect once it has finished.
    pub fn cancel(&self) {
        self.task.abort();
    }

    /// Whether the round has finished or been cancelled.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// The next progress event, or `None` once the round is over.
    pub async fn next_event(&mut self) -> Option<RoundEvent> {
        self.events.recv().await
    }

    /// Wait for the round's result, skipping intermediate events.
    ///
    /// Returns `None` if the round was cancelled.
    pub async fn finished(&mut self) -> Option<GameResult<RoundOutcome>> {
        while let Some(event) = self.next_event().await {
            if let RoundEvent::Finished(result) = event {
                return Some(result);
            }
        }
        None
    }
}

impl Drop for RoundHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Schedule `round` on the current tokio runtime.
///
/// Waits `delay`, reports the bot's hand, waits `delay` again, then commits
/// the round to `table` under its lock.
pub fn schedule_bot_round(
    table: Arc<Mutex<DebtTable>>,
    round: BotRound,
    delay: Duration,
) -> RoundHandle {
    let (tx, events) = mpsc::unbounded_channel();
    let task = tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        debug!(challenge = %round.challenge, bot = %round.bot, "bot hand revealed");
        let _ = tx.send(RoundEvent::BotRevealed(round.bot));

        tokio::time::sleep(delay).await;
        let result = {
            let mut table = table.lock().unwrap_or_else(PoisonError::into_inner);
            table.play_bot_round(round.challenge, round.player, round.choice, round.bot, Utc::now())
        };
        info!(challenge = %round.challenge, ok = result.is_ok(), "bot round committed");
        let _ = tx.send(RoundEvent::Finished(result));
    });
    RoundHandle { task, events }
}
