//! Karma and payment streak rules.
//!
//! Karma rises by a fixed bonus whenever a user settles, drops when a
//! payment streak lapses, and drops again for every full window a debt has
//! been left open. The tracker only ever touches `karma_score`,
//! `payment_streak` and `last_payment_date`.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::config::LedgerConfig;
use crate::expense::Expense;
use crate::id::UserId;
use crate::user::User;

/// A karma deduction applied by the overdue sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KarmaPenalty {
    /// The penalized user.
    pub user: UserId,
    /// Age in whole days of the user's oldest unpaid expense.
    pub days_overdue: i64,
    /// Karma actually removed (after flooring at zero).
    pub karma_lost: u32,
}

/// Applies karma and streak rules from a [`LedgerConfig`].
#[derive(Debug, Clone, Copy)]
pub struct ReputationTracker {
    config: LedgerConfig,
}

impl ReputationTracker {
    /// Create a tracker with the given rules.
    pub fn new(config: LedgerConfig) -> Self {
        Self { config }
    }

    /// Reward the debtor of a freshly recorded settlement.
    pub fn on_settlement_recorded(&self, user: &mut User) {
        user.karma_score = user
            .karma_score
            .saturating_add(self.config.settlement_bonus)
            .min(self.config.karma_cap);
    }

    /// Update the payment streak of a user who just paid.
    ///
    /// A first payment, or one arriving a full streak window after the
    /// previous one, restarts the streak at 1 and costs karma. Otherwise the
    /// streak grows by one.
    pub fn on_payment_streak_update(&self, user: &mut User, now: DateTime<Utc>) {
        let lapsed = match user.last_payment_date {
            Some(last) => (now - last).num_days() >= self.config.streak_window_days,
            None => true,
        };

        if lapsed {
            user.payment_streak = 1;
            user.karma_score = user
                .karma_score
                .saturating_sub(self.config.streak_reset_penalty);
            tracing::warn!(
                user = %user.id,
                karma = user.karma_score,
                "payment streak reset"
            );
        } else {
            user.payment_streak += 1;
        }
        user.last_payment_date = Some(now);
    }

    /// Penalize every user whose oldest unpaid expense is at least one
    /// overdue window old.
    ///
    /// An unpaid expense is one the user participates in without being the
    /// payer. The penalty is `floor(days / window) * penalty_per_window`,
    /// floored at zero karma.
    pub fn check_overdue_debts(
        &self,
        users: &mut BTreeMap<UserId, User>,
        expenses: &[Expense],
        now: DateTime<Utc>,
    ) -> Vec<KarmaPenalty> {
        let mut oldest: BTreeMap<UserId, DateTime<Utc>> = BTreeMap::new();
        for expense in expenses {
            for participant in &expense.participants {
                if *participant == expense.paid_by {
                    continue;
                }
                oldest
                    .entry(*participant)
                    .and_modify(|d| {
                        if expense.date < *d {
                            *d = expense.date;
                        }
                    })
                    .or_insert(expense.date);
            }
        }

        let mut penalties = Vec::new();
        for (id, since) in oldest {
            let Some(user) = users.get_mut(&id) else {
                continue;
            };
            let days = (now - since).num_days();
            if days < self.config.overdue_window_days {
                continue;
            }
            let windows = u32::try_from(days / self.config.overdue_window_days).unwrap_or(u32::MAX);
            let loss = windows.saturating_mul(self.config.overdue_penalty_per_window);
            let before = user.karma_score;
            user.karma_score = before.saturating_sub(loss);
            tracing::warn!(
                user = %id,
                days_overdue = days,
                karma = user.karma_score,
                "overdue debt penalty"
            );
            penalties.push(KarmaPenalty {
                user: id,
                days_overdue: days,
                karma_lost: before - user.karma_score,
            });
        }
        penalties
    }
}

impl Default for ReputationTracker {
    fn default() -> Self {
        Self::new(LedgerConfig::default())
    }
}
