//! Debt challenges played against a live expense book.

use chrono::{DateTime, Utc};
use pl_core::{Choice, ExpenseBook, UserId};
use rand::Rng;
use tracing::warn;

use crate::board::{GameBoard, RoundOutcome};
use crate::challenge::ChallengeId;
use crate::error::GameResult;

/// An [`ExpenseBook`] with a [`GameBoard`] on top.
///
/// Decided games are recorded as settlements in the book. If the book
/// rejects the settlement the board is rolled back, so a challenge is never
/// completed without its settlement.
#[derive(Debug, Clone)]
pub struct DebtTable {
    book: ExpenseBook,
    board: GameBoard,
}

impl DebtTable {
    /// Combine a book and a board.
    pub fn new(book: ExpenseBook, board: GameBoard) -> Self {
        Self { book, board }
    }

    /// The expense book.
    pub fn book(&self) -> &ExpenseBook {
        &self.book
    }

    /// Mutable access to the expense book.
    pub fn book_mut(&mut self) -> &mut ExpenseBook {
        &mut self.book
    }

    /// The challenge board.
    pub fn board(&self) -> &GameBoard {
        &self.board
    }

    /// Split back into book and board.
    pub fn into_parts(self) -> (ExpenseBook, GameBoard) {
        (self.book, self.board)
    }

    /// Challenge `to` over an explicit stake.
    pub fn challenge_to_game(
        &mut self,
        from: UserId,
        to: UserId,
        amount: f64,
        is_bot: bool,
        now: DateTime<Utc>,
    ) -> GameResult<ChallengeId> {
        self.book.require_user(from)?;
        self.book.require_user(to)?;
        self.board.challenge_to_game(from, to, amount, is_bot, now)
    }

    /// Challenge `to` over whatever `from` currently owes them.
    pub fn challenge_debt(
        &mut self,
        from: UserId,
        to: UserId,
        is_bot: bool,
        now: DateTime<Utc>,
    ) -> GameResult<ChallengeId> {
        let owed = self.book.owes(from, to);
        self.challenge_to_game(from, to, owed, is_bot, now)
    }

    /// Accept a pending challenge.
    pub fn accept_challenge(&mut self, id: ChallengeId) -> GameResult<()> {
        self.board.accept_challenge(id)
    }

    /// Play a hand, recording the settlement if the game is decided.
    pub fn make_game_choice<R: Rng + ?Sized>(
        &mut self,
        id: ChallengeId,
        player: UserId,
        choice: Choice,
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> GameResult<RoundOutcome> {
        self.transact(now, |board| {
            board.make_game_choice(id, player, choice, rng, now)
        })
    }

    /// Play both hands of a bot round, recording the settlement if decided.
    pub fn play_bot_round(
        &mut self,
        id: ChallengeId,
        player: UserId,
        choice: Choice,
        bot: Choice,
        now: DateTime<Utc>,
    ) -> GameResult<RoundOutcome> {
        self.transact(now, |board| board.play_bot_round(id, player, choice, bot, now))
    }

    /// Resolve a challenge, recording the settlement if decided.
    pub fn resolve_game(&mut self, id: ChallengeId, now: DateTime<Utc>) -> GameResult<RoundOutcome> {
        self.transact(now, |board| board.resolve_game(id, now))
    }

    fn transact(
        &mut self,
        now: DateTime<Utc>,
        step: impl FnOnce(&mut GameBoard) -> GameResult<RoundOutcome>,
    ) -> GameResult<RoundOutcome> {
        let before = self.board.clone();
        let outcome = step(&mut self.board)?;
        if let RoundOutcome::Decided { settlement, .. } = &outcome {
            if let Err(e) = self.book.add_settlement(settlement.clone(), now) {
                warn!(error = %e, "game settlement rejected, rolling back");
                self.board = before;
                return Err(e.into());
            }
        }
        Ok(outcome)
    }
}
