//! The challenge state machine.
//!
//! Transitions:
//!
//! ```text
//! Pending --accept--> InProgress --both hands, tie--> InProgress (hands cleared)
//!                               \--both hands, decisive--> Completed
//! ```
//!
//! Bot challenges start `InProgress`. Every operation either succeeds
//! completely or leaves the board untouched.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use pl_core::{Choice, GameAction, GameResultInfo, Settlement, UserId};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::challenge::{Challenge, ChallengeId, ChallengeStatus, Side};
use crate::config::GameConfig;
use crate::error::{GameError, GameResult};

/// What happened after a hand was played or a resolution was requested.
#[derive(Debug, Clone, PartialEq)]
pub enum RoundOutcome {
    /// The other player has not played yet.
    Waiting,
    /// Both players showed the same hand; the hands were cleared for a rematch.
    Draw {
        /// The hand both players showed.
        hand: Choice,
    },
    /// The game is over.
    Decided {
        /// The winning player.
        winner: UserId,
        /// What happens to the debt.
        action: GameAction,
        /// The settlement to record in the ledger.
        settlement: Settlement,
    },
    /// The challenge was already completed; nothing changed.
    AlreadyCompleted,
}

/// Pick a hand uniformly at random.
pub fn random_choice<R: Rng + ?Sized>(rng: &mut R) -> Choice {
    let hands = Choice::all();
    hands[rng.random_range(0..hands.len())]
}

/// Decide a game between two hands. `None` means a tie.
pub fn winner_of(player1: Choice, player2: Choice) -> Option<Side> {
    if player1.beats(player2) {
        Some(Side::Player1)
    } else if player2.beats(player1) {
        Some(Side::Player2)
    } else {
        None
    }
}

/// All challenges, keyed by id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameBoard {
    #[serde(skip)]
    config: GameConfig,
    challenges: BTreeMap<ChallengeId, Challenge>,
}

impl GameBoard {
    /// Create an empty board.
    pub fn new(config: GameConfig) -> Self {
        Self {
            config,
            challenges: BTreeMap::new(),
        }
    }

    /// Replace the configuration, e.g. after deserializing.
    pub fn set_config(&mut self, config: GameConfig) {
        self.config = config;
    }

    /// The active configuration.
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Look up a challenge.
    pub fn challenge(&self, id: ChallengeId) -> Option<&Challenge> {
        self.challenges.get(&id)
    }

    /// All challenges, oldest first.
    pub fn challenges(&self) -> Vec<&Challenge> {
        let mut list: Vec<&Challenge> = self.challenges.values().collect();
        list.sort_by_key(|c| c.created_at);
        list
    }

    /// Find a challenge by id prefix.
    pub fn find_challenge(&self, prefix: &str) -> Option<&Challenge> {
        self.challenges.values().find(|c| c.id.matches_prefix(prefix))
    }

    /// Challenges `user` still has to act on.
    pub fn open_for(&self, user: UserId) -> Vec<&Challenge> {
        self.challenges()
            .into_iter()
            .filter(|c| c.status != ChallengeStatus::Completed && c.side_of(user).is_some())
            .collect()
    }

    fn get(&self, id: ChallengeId) -> GameResult<&Challenge> {
        self.challenges
            .get(&id)
            .ok_or(GameError::ChallengeNotFound(id))
    }

    // -----------------------------------------------------------------------
    // Transitions
    // -----------------------------------------------------------------------

    /// Issue a challenge from the debtor `from` to the creditor `to`.
    ///
    /// Bot challenges skip acceptance and start in progress.
    pub fn challenge_to_game(
        &mut self,
        from: UserId,
        to: UserId,
        amount: f64,
        is_bot: bool,
        now: DateTime<Utc>,
    ) -> GameResult<ChallengeId> {
        if from == to {
            return Err(GameError::SelfChallenge);
        }
        if !amount.is_finite() || amount <= 0.0 {
            return Err(GameError::InvalidStake(amount));
        }
        if amount > self.config.stake_cap {
            return Err(GameError::StakeTooHigh {
                amount,
                cap: self.config.stake_cap,
            });
        }

        let id = ChallengeId::new();
        let status = if is_bot {
            ChallengeStatus::InProgress
        } else {
            ChallengeStatus::Pending
        };
        self.challenges.insert(
            id,
            Challenge {
                id,
                from_id: from,
                to_id: to,
                amount,
                is_bot,
                status,
                player1_choice: None,
                player2_choice: None,
                created_at: now,
            },
        );
        info!(challenge = %id, %from, %to, amount, is_bot, "challenge issued");
        Ok(id)
    }

    /// Move a pending challenge into play. Accepting a challenge that is
    /// already in progress does nothing.
    pub fn accept_challenge(&mut self, id: ChallengeId) -> GameResult<()> {
        match self.get(id)?.status {
            ChallengeStatus::InProgress => return Ok(()),
            ChallengeStatus::Completed => {
                return Err(GameError::InvalidTransition(
                    "cannot accept a completed challenge".to_string(),
                ));
            }
            ChallengeStatus::Pending => {}
        }
        if let Some(c) = self.challenges.get_mut(&id) {
            c.status = ChallengeStatus::InProgress;
        }
        info!(challenge = %id, "challenge accepted");
        Ok(())
    }

    /// Record `player`'s hand.
    ///
    /// In a bot challenge the bot's hand is drawn from `rng` and the game is
    /// resolved straight away. Otherwise the game resolves once both hands
    /// are in.
    pub fn make_game_choice<R: Rng + ?Sized>(
        &mut self,
        id: ChallengeId,
        player: UserId,
        choice: Choice,
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> GameResult<RoundOutcome> {
        let challenge = self.get(id)?;
        let side = self.playable_side(challenge, player)?;

        if challenge.is_bot {
            if side == Side::Player2 {
                return Err(GameError::InvalidTransition(
                    "the bot plays for the creditor".to_string(),
                ));
            }
            let bot = random_choice(rng);
            return self.play_bot_round(id, player, choice, bot, now);
        }

        let mut ready = false;
        if let Some(c) = self.challenges.get_mut(&id) {
            match side {
                Side::Player1 => c.player1_choice = Some(choice),
                Side::Player2 => c.player2_choice = Some(choice),
            }
            ready = c.hands().is_some();
        }
        debug!(challenge = %id, %player, "hand played");
        if !ready {
            return Ok(RoundOutcome::Waiting);
        }
        self.resolve_game(id, now)
    }

    /// Play both hands of a bot challenge at once.
    pub fn play_bot_round(
        &mut self,
        id: ChallengeId,
        player: UserId,
        choice: Choice,
        bot: Choice,
        now: DateTime<Utc>,
    ) -> GameResult<RoundOutcome> {
        self.check_bot_round(id, player)?;
        if let Some(c) = self.challenges.get_mut(&id) {
            c.player1_choice = Some(choice);
            c.player2_choice = Some(bot);
        }
        debug!(challenge = %id, %choice, %bot, "bot round played");
        self.resolve_game(id, now)
    }

    /// Check that `player` may play a bot round on `id` right now.
    pub fn check_bot_round(&self, id: ChallengeId, player: UserId) -> GameResult<()> {
        let challenge = self.get(id)?;
        if !challenge.is_bot {
            return Err(GameError::InvalidTransition(
                "not a bot challenge".to_string(),
            ));
        }
        match self.playable_side(challenge, player)? {
            Side::Player1 => Ok(()),
            Side::Player2 => Err(GameError::InvalidTransition(
                "the bot plays for the creditor".to_string(),
            )),
        }
    }

    /// Resolve a challenge whose hands are both in.
    ///
    /// A tie clears both hands and keeps the challenge in progress. A
    /// decisive game completes the challenge and yields the settlement to
    /// record: `+amount` when the debtor wins (cancelling the debt) and
    /// `-amount` when the creditor wins (doubling it). Resolving a completed
    /// challenge does nothing; resolving before both hands are in is an
    /// error.
    pub fn resolve_game(&mut self, id: ChallengeId, now: DateTime<Utc>) -> GameResult<RoundOutcome> {
        let challenge = self.get(id)?;
        match challenge.status {
            ChallengeStatus::Completed => return Ok(RoundOutcome::AlreadyCompleted),
            ChallengeStatus::Pending => {
                return Err(GameError::InvalidTransition(
                    "challenge has not been accepted".to_string(),
                ));
            }
            ChallengeStatus::InProgress => {}
        }
        let Some((p1, p2)) = challenge.hands() else {
            return Err(GameError::InvalidTransition(
                "both hands must be played first".to_string(),
            ));
        };

        let Some(side) = winner_of(p1, p2) else {
            if let Some(c) = self.challenges.get_mut(&id) {
                c.player1_choice = None;
                c.player2_choice = None;
            }
            info!(challenge = %id, hand = %p1, "draw, rematch");
            return Ok(RoundOutcome::Draw { hand: p1 });
        };

        let (winner, action, amount) = match side {
            Side::Player1 => (challenge.from_id, GameAction::Cancel, challenge.amount),
            Side::Player2 => (challenge.to_id, GameAction::Double, -challenge.amount),
        };
        let settlement = Settlement::game(
            challenge.from_id,
            challenge.to_id,
            amount,
            now,
            GameResultInfo {
                winner,
                action,
                player1_choice: Some(p1),
                player2_choice: Some(p2),
            },
        );
        if let Some(c) = self.challenges.get_mut(&id) {
            c.status = ChallengeStatus::Completed;
        }
        info!(challenge = %id, %winner, %action, "challenge decided");
        Ok(RoundOutcome::Decided {
            winner,
            action,
            settlement,
        })
    }

    fn playable_side(&self, challenge: &Challenge, player: UserId) -> GameResult<Side> {
        let side = challenge
            .side_of(player)
            .ok_or(GameError::NotAParticipant {
                challenge: challenge.id,
                player,
            })?;
        match challenge.status {
            ChallengeStatus::InProgress => Ok(side),
            status => Err(GameError::InvalidTransition(format!(
                "cannot play a challenge that is {status}"
            ))),
        }
    }
}
