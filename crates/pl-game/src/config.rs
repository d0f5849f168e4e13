//! Configuration for debt challenges.

use std::time::Duration;

/// Configuration for a [`GameBoard`](crate::GameBoard).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GameConfig {
    /// Largest debt that may be gambled.
    pub stake_cap: f64,
    /// Pause before the bot's hand is revealed, and again before the result.
    pub reveal_delay: Duration,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            stake_cap: 5.0,
            reveal_delay: Duration::from_secs(1),
        }
    }
}

impl GameConfig {
    /// Set the stake cap.
    pub fn with_stake_cap(mut self, cap: f64) -> Self {
        self.stake_cap = cap;
        self
    }

    /// Set the reveal delay.
    pub fn with_reveal_delay(mut self, delay: Duration) -> Self {
        self.reveal_delay = delay;
        self
    }
}
