//! Configuration for the bookkeeping rules.

/// Karma and streak constants for an [`ExpenseBook`](crate::ExpenseBook).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LedgerConfig {
    /// Karma a newly added user starts with.
    pub initial_karma: u32,
    /// Upper bound for karma.
    pub karma_cap: u32,
    /// Karma gained by the debtor for every recorded settlement.
    pub settlement_bonus: u32,
    /// Days without a payment after which the streak resets.
    pub streak_window_days: i64,
    /// Karma lost when the streak resets.
    pub streak_reset_penalty: u32,
    /// Days after which an unpaid expense counts as overdue.
    pub overdue_window_days: i64,
    /// Karma lost per full overdue window.
    pub overdue_penalty_per_window: u32,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            initial_karma: 100,
            karma_cap: 100,
            settlement_bonus: 5,
            streak_window_days: 7,
            streak_reset_penalty: 10,
            overdue_window_days: 7,
            overdue_penalty_per_window: 5,
        }
    }
}

impl LedgerConfig {
    /// Set the karma a new user starts with (clamped to the cap).
    pub fn with_initial_karma(mut self, karma: u32) -> Self {
        self.initial_karma = karma.min(self.karma_cap);
        self
    }

    /// Set the settlement bonus.
    pub fn with_settlement_bonus(mut self, bonus: u32) -> Self {
        self.settlement_bonus = bonus;
        self
    }

    /// Set the streak window (at least one day).
    pub fn with_streak_window_days(mut self, days: i64) -> Self {
        self.streak_window_days = days.max(1);
        self
    }

    /// Set the overdue window (at least one day).
    pub fn with_overdue_window_days(mut self, days: i64) -> Self {
        self.overdue_window_days = days.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let cfg = LedgerConfig::default();
        assert_eq!(cfg.initial_karma, 100);
        assert_eq!(cfg.karma_cap, 100);
        assert_eq!(cfg.settlement_bonus, 5);
        assert_eq!(cfg.streak_window_days, 7);
        assert_eq!(cfg.streak_reset_penalty, 10);
        assert_eq!(cfg.overdue_penalty_per_window, 5);
    }

    #[test]
    fn builder_methods() {
        let cfg = LedgerConfig::default()
            .with_initial_karma(50)
            .with_settlement_bonus(3)
            .with_streak_window_days(14);
        assert_eq!(cfg.initial_karma, 50);
        assert_eq!(cfg.settlement_bonus, 3);
        assert_eq!(cfg.streak_window_days, 14);
    }

    #[test]
    fn windows_clamped() {
        let cfg = LedgerConfig::default()
            .with_overdue_window_days(0)
            .with_initial_karma(500);
        assert_eq!(cfg.overdue_window_days, 1);
        assert_eq!(cfg.initial_karma, 100);
    }
}
