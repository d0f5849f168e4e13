use rand::SeedableRng;
use rand::rngs::StdRng;

/// Rewards and randomness for spins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WheelConfig {
    /// Karma awarded to a fair-mode winner.
    pub fair_bonus: i64,
    /// Karma awarded to a weighted-mode winner.
    pub weighted_bonus: i64,
    /// Seed for deterministic spins. `None` draws from the OS.
    pub seed: Option<u64>,
}

impl Default for WheelConfig {
    fn default() -> Self {
        Self {
            fair_bonus: 2,
            weighted_bonus: 1,
            seed: None,
        }
    }
}

impl WheelConfig {
    /// Set the fair-mode bonus.
    pub fn with_fair_bonus(mut self, bonus: i64) -> Self {
        self.fair_bonus = bonus;
        self
    }

    /// Set the weighted-mode bonus.
    pub fn with_weighted_bonus(mut self, bonus: i64) -> Self {
        self.weighted_bonus = bonus;
        self
    }

    /// Set the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// A random number generator honoring the seed.
    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }
}
