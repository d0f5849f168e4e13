//! The expense book.
//!
//! `ExpenseBook` owns the user table, groups, and the expense and settlement
//! histories, plus the balances derived from them. Every mutating method
//! validates its input before touching anything, so a failed call leaves
//! the book as it was. Balances are recomputed from the full history after
//! each change, followed by the overdue-debt sweep.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::LedgerConfig;
use crate::error::{LedgerError, LedgerResult};
use crate::expense::{Expense, NewExpense};
use crate::group::Group;
use crate::id::{ExpenseId, GroupId, SettlementId, UserId};
use crate::ledger::{self, Balances};
use crate::reputation::{KarmaPenalty, ReputationTracker};
use crate::settlement::Settlement;
use crate::store::DocumentStore;
use crate::summary::ExpenseSummary;
use crate::user::User;

/// The authored part of the book, as exchanged with a document store.
/// Balances are not part of it; they are always re-derived.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookSnapshot {
    /// All users by id.
    pub users: BTreeMap<UserId, User>,
    /// All groups by id.
    pub groups: BTreeMap<GroupId, Group>,
    /// Expense history in insertion order.
    pub expenses: Vec<Expense>,
    /// Settlement history in insertion order.
    pub settlements: Vec<Settlement>,
}

/// Users, groups, expenses, settlements and their derived balances.
#[derive(Debug, Clone)]
pub struct ExpenseBook {
    config: LedgerConfig,
    reputation: ReputationTracker,
    users: BTreeMap<UserId, User>,
    groups: BTreeMap<GroupId, Group>,
    expenses: Vec<Expense>,
    settlements: Vec<Settlement>,
    balances: Balances,
}

impl Default for ExpenseBook {
    fn default() -> Self {
        Self::new(LedgerConfig::default())
    }
}

impl ExpenseBook {
    /// An empty book.
    pub fn new(config: LedgerConfig) -> Self {
        Self {
            config,
            reputation: ReputationTracker::new(config),
            users: BTreeMap::new(),
            groups: BTreeMap::new(),
            expenses: Vec::new(),
            settlements: Vec::new(),
            balances: Balances::default(),
        }
    }

    /// Build a book from a snapshot and derive its balances.
    pub fn from_snapshot(
        snapshot: BookSnapshot,
        config: LedgerConfig,
        now: DateTime<Utc>,
    ) -> LedgerResult<Self> {
        let mut book = Self::new(config);
        book.apply_remote(snapshot, now)?;
        Ok(book)
    }

    /// Rebuild a book this process saved earlier. Balances are derived but,
    /// unlike [`from_snapshot`](Self::from_snapshot), no overdue sweep runs.
    pub fn restore(snapshot: BookSnapshot, config: LedgerConfig) -> LedgerResult<Self> {
        let balances =
            ledger::recompute_balances(&snapshot.users, &snapshot.expenses, &snapshot.settlements)?;
        Ok(Self {
            config,
            reputation: ReputationTracker::new(config),
            users: snapshot.users,
            groups: snapshot.groups,
            expenses: snapshot.expenses,
            settlements: snapshot.settlements,
            balances,
        })
    }

    /// Load the book from a store. An empty store yields an empty book.
    pub fn load(
        store: &impl DocumentStore<BookSnapshot>,
        config: LedgerConfig,
        now: DateTime<Utc>,
    ) -> LedgerResult<Self> {
        let snapshot = store.load()?.unwrap_or_default();
        Self::from_snapshot(snapshot, config, now)
    }

    /// Write the current snapshot to a store.
    pub fn save(&self, store: &impl DocumentStore<BookSnapshot>) -> LedgerResult<()> {
        store.save(&self.snapshot())?;
        Ok(())
    }

    /// The authored state, without balances.
    pub fn snapshot(&self) -> BookSnapshot {
        BookSnapshot {
            users: self.users.clone(),
            groups: self.groups.clone(),
            expenses: self.expenses.clone(),
            settlements: self.settlements.clone(),
        }
    }

    /// Replace local state with a snapshot that changed elsewhere.
    ///
    /// Balances are derived from the snapshot before anything is replaced;
    /// an inconsistent snapshot is rejected and the book is unchanged.
    pub fn apply_remote(
        &mut self,
        snapshot: BookSnapshot,
        now: DateTime<Utc>,
    ) -> LedgerResult<Vec<KarmaPenalty>> {
        let balances =
            ledger::recompute_balances(&snapshot.users, &snapshot.expenses, &snapshot.settlements)?;
        self.users = snapshot.users;
        self.groups = snapshot.groups;
        self.expenses = snapshot.expenses;
        self.settlements = snapshot.settlements;
        self.balances = balances;
        tracing::debug!(users = self.users.len(), "applied remote snapshot");
        Ok(self.check_overdue_debts(now))
    }

    /// The rules this book runs with.
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Users
    // -----------------------------------------------------------------------

    /// Add a user with the configured starting karma.
    pub fn add_user(&mut self, name: impl Into<String>, now: DateTime<Utc>) -> UserId {
        let user = User::new(name, self.config.initial_karma, now);
        let id = user.id;
        tracing::info!(user = %id, name = %user.name, "user added");
        self.users.insert(id, user);
        // No history references a new user, so only an empty balance is added.
        self.balances.track(id);
        id
    }

    /// Look up a user.
    pub fn user(&self, id: UserId) -> Option<&User> {
        self.users.get(&id)
    }

    /// Look up a user or fail with `UnknownUser`.
    pub fn require_user(&self, id: UserId) -> LedgerResult<&User> {
        self.users.get(&id).ok_or(LedgerError::UnknownUser(id))
    }

    /// All users in id order.
    pub fn users(&self) -> impl Iterator<Item = &User> {
        self.users.values()
    }

    /// The user table.
    pub fn user_table(&self) -> &BTreeMap<UserId, User> {
        &self.users
    }

    /// Find a user by name (case-insensitive) or by id prefix.
    pub fn find_user(&self, query: &str) -> Option<&User> {
        let lower = query.trim().to_lowercase();
        self.users
            .values()
            .find(|u| u.name.to_lowercase() == lower)
            .or_else(|| self.users.values().find(|u| u.id.matches_prefix(&lower)))
    }

    // -----------------------------------------------------------------------
    // Expenses and settlements
    // -----------------------------------------------------------------------

    /// Record an expense, then recompute balances, sweep overdue debts, and
    /// update the payer's payment streak.
    pub fn add_expense(&mut self, draft: NewExpense, now: DateTime<Utc>) -> LedgerResult<ExpenseId> {
        let expense = draft.into_expense()?;
        self.require_user(expense.paid_by)?;
        for p in &expense.participants {
            self.require_user(*p)?;
        }
        if let Some(group) = expense.group_id {
            self.require_group(group)?;
        }

        let id = expense.id;
        let payer = expense.paid_by;
        tracing::info!(
            expense = %id,
            amount = expense.amount,
            payer = %payer,
            participants = expense.participants.len(),
            "expense added"
        );
        self.expenses.push(expense);
        if let Err(e) = self.recompute() {
            self.expenses.pop();
            return Err(e);
        }
        self.check_overdue_debts(now);
        if let Some(user) = self.users.get_mut(&payer) {
            self.reputation.on_payment_streak_update(user, now);
        }
        Ok(id)
    }

    /// Record a settlement, then recompute balances, sweep overdue debts, and
    /// reward the debtor.
    pub fn add_settlement(
        &mut self,
        settlement: Settlement,
        now: DateTime<Utc>,
    ) -> LedgerResult<SettlementId> {
        settlement.validate()?;
        self.require_user(settlement.from)?;
        self.require_user(settlement.to)?;

        let id = settlement.id;
        let from = settlement.from;
        tracing::info!(
            settlement = %id,
            from = %from,
            to = %settlement.to,
            amount = settlement.amount,
            method = ?settlement.method,
            "settlement recorded"
        );
        self.settlements.push(settlement);
        if let Err(e) = self.recompute() {
            self.settlements.pop();
            return Err(e);
        }
        self.check_overdue_debts(now);
        if let Some(user) = self.users.get_mut(&from) {
            self.reputation.on_settlement_recorded(user);
        }
        Ok(id)
    }

    /// Expense history.
    pub fn expenses(&self) -> &[Expense] {
        &self.expenses
    }

    /// Settlement history.
    pub fn settlements(&self) -> &[Settlement] {
        &self.settlements
    }

    // -----------------------------------------------------------------------
    // Balances and reputation
    // -----------------------------------------------------------------------

    /// Current balances.
    pub fn balances(&self) -> &Balances {
        &self.balances
    }

    /// What `debtor` currently owes `creditor`.
    pub fn owes(&self, debtor: UserId, creditor: UserId) -> f64 {
        self.balances.owes(debtor, creditor)
    }

    /// Recompute balances from the full history and run the overdue sweep.
    pub fn refresh(&mut self, now: DateTime<Utc>) -> LedgerResult<Vec<KarmaPenalty>> {
        self.recompute()?;
        Ok(self.check_overdue_debts(now))
    }

    /// Penalize users with overdue unpaid expenses.
    pub fn check_overdue_debts(&mut self, now: DateTime<Utc>) -> Vec<KarmaPenalty> {
        let penalties = self
            .reputation
            .check_overdue_debts(&mut self.users, &self.expenses, now);
        tracing::debug!(penalized = penalties.len(), "overdue sweep");
        penalties
    }

    fn recompute(&mut self) -> LedgerResult<()> {
        self.balances = ledger::recompute_balances(&self.users, &self.expenses, &self.settlements)?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Groups
    // -----------------------------------------------------------------------

    /// Create a group. Every member and the creator must exist.
    pub fn create_group(
        &mut self,
        name: impl Into<String>,
        members: &[UserId],
        created_by: UserId,
        now: DateTime<Utc>,
    ) -> LedgerResult<GroupId> {
        self.require_user(created_by)?;
        for m in members {
            self.require_user(*m)?;
        }
        let mut group = Group {
            id: GroupId::new(),
            name: name.into(),
            members: Vec::new(),
            created_by,
            created_at: now,
        };
        for m in members {
            group.add_member(*m);
        }
        let id = group.id;
        tracing::info!(group = %id, name = %group.name, "group created");
        self.groups.insert(id, group);
        Ok(id)
    }

    /// Look up a group.
    pub fn group(&self, id: GroupId) -> Option<&Group> {
        self.groups.get(&id)
    }

    /// All groups in id order.
    pub fn groups(&self) -> impl Iterator<Item = &Group> {
        self.groups.values()
    }

    /// Find a group by name (case-insensitive) or by id prefix.
    pub fn find_group(&self, query: &str) -> Option<&Group> {
        let lower = query.trim().to_lowercase();
        self.groups
            .values()
            .find(|g| g.name.to_lowercase() == lower)
            .or_else(|| self.groups.values().find(|g| g.id.matches_prefix(&lower)))
    }

    fn require_group(&self, id: GroupId) -> LedgerResult<&Group> {
        self.groups.get(&id).ok_or(LedgerError::UnknownGroup(id))
    }

    /// Add a user to a group. Returns false if they were already a member.
    pub fn add_user_to_group(&mut self, group: GroupId, user: UserId) -> LedgerResult<bool> {
        self.require_user(user)?;
        let group = self
            .groups
            .get_mut(&group)
            .ok_or(LedgerError::UnknownGroup(group))?;
        Ok(group.add_member(user))
    }

    /// Remove a user from a group. Returns true if they were a member.
    pub fn remove_user_from_group(&mut self, group: GroupId, user: UserId) -> LedgerResult<bool> {
        let group = self
            .groups
            .get_mut(&group)
            .ok_or(LedgerError::UnknownGroup(group))?;
        Ok(group.remove_member(user))
    }

    /// The group's expenses, in insertion order.
    pub fn group_expenses(&self, group: GroupId) -> LedgerResult<Vec<&Expense>> {
        self.require_group(group)?;
        Ok(self
            .expenses
            .iter()
            .filter(|e| e.group_id == Some(group))
            .collect())
    }

    /// Balances computed over the group's expenses only.
    pub fn group_balances(&self, group: GroupId) -> LedgerResult<Balances> {
        let group = self.require_group(group)?;
        ledger::group_balances(group, &self.users, &self.expenses, &self.settlements)
    }

    /// Spending summary for a group.
    pub fn expense_summary(&self, group: GroupId) -> LedgerResult<ExpenseSummary> {
        Ok(ExpenseSummary::from_expenses(self.group_expenses(group)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    use crate::settlement::{Choice, GameAction, GameResultInfo};
    use crate::store::MemoryStore;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 18, 0, 0).unwrap()
    }

    fn book_with(names: &[&str]) -> (ExpenseBook, Vec<UserId>) {
        let mut book = ExpenseBook::default();
        let ids = names.iter().map(|n| book.add_user(*n, now())).collect();
        (book, ids)
    }

    #[test]
    fn add_user_starts_with_full_karma() {
        let (book, ids) = book_with(&["Ada"]);
        let ada = book.user(ids[0]).unwrap();
        assert_eq!(ada.karma_score, 100);
        assert_eq!(ada.payment_streak, 0);
        assert!(book.balances().get(ids[0]).is_some());
    }

    #[test]
    fn find_user_by_name_or_prefix() {
        let (book, ids) = book_with(&["Ada", "Grace"]);
        assert_eq!(book.find_user("grace").map(|u| u.id), Some(ids[1]));
        let prefix = ids[0].to_string();
        assert_eq!(book.find_user(&prefix).map(|u| u.id), Some(ids[0]));
        assert!(book.find_user("nobody").is_none());
    }

    #[test]
    fn expense_updates_balances_and_streak() {
        let (mut book, ids) = book_with(&["a", "b", "c"]);
        let (a, b, c) = (ids[0], ids[1], ids[2]);
        book.add_expense(NewExpense::new("Dinner", 90.0, a, vec![a, b, c], now()), now())
            .unwrap();

        assert_eq!(book.owes(b, a), 30.0);
        assert_eq!(book.owes(c, a), 30.0);
        assert_eq!(book.balances().is_owed(a, b), 30.0);
        let payer = book.user(a).unwrap();
        assert_eq!(payer.payment_streak, 1);
        assert_eq!(payer.last_payment_date, Some(now()));
    }

    #[test]
    fn settlement_zeroes_debt_and_rewards_debtor() {
        let (mut book, ids) = book_with(&["a", "b", "c"]);
        let (a, b) = (ids[0], ids[1]);
        book.add_expense(NewExpense::new("Dinner", 90.0, a, vec![a, b, ids[2]], now()), now())
            .unwrap();
        book.users.get_mut(&b).unwrap().karma_score = 50;

        book.add_settlement(Settlement::payment(b, a, 30.0, now()), now())
            .unwrap();
        assert_eq!(book.owes(b, a), 0.0);
        assert_eq!(book.user(b).unwrap().karma_score, 55);
    }

    #[test]
    fn failed_expense_leaves_book_untouched() {
        let (mut book, ids) = book_with(&["a", "b"]);
        let before = book.snapshot();
        let stranger = UserId::new();

        let err = book
            .add_expense(NewExpense::new("x", 10.0, ids[0], vec![stranger], now()), now())
            .unwrap_err();
        assert!(matches!(err, LedgerError::UnknownUser(id) if id == stranger));

        let err = book
            .add_expense(NewExpense::new("x", 10.0, ids[0], vec![], now()), now())
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidExpense(_)));

        let err = book
            .add_expense(
                NewExpense::new("x", 10.0, ids[0], vec![ids[1]], now()).with_group(GroupId::new()),
                now(),
            )
            .unwrap_err();
        assert!(matches!(err, LedgerError::UnknownGroup(_)));

        assert_eq!(book.snapshot(), before);
    }

    #[test]
    fn failed_settlement_leaves_book_untouched() {
        let (mut book, ids) = book_with(&["a", "b"]);
        let before = book.snapshot();
        assert!(
            book.add_settlement(Settlement::payment(ids[0], ids[0], 5.0, now()), now())
                .is_err()
        );
        assert!(
            book.add_settlement(Settlement::payment(ids[0], UserId::new(), 5.0, now()), now())
                .is_err()
        );
        assert_eq!(book.snapshot(), before);
    }

    #[test]
    fn game_settlements_cancel_and_double() {
        let (mut book, ids) = book_with(&["a", "b"]);
        let (a, b) = (ids[0], ids[1]);
        book.add_expense(NewExpense::new("Coffee", 8.0, a, vec![a, b], now()), now())
            .unwrap();
        let result = |action| GameResultInfo {
            winner: b,
            action,
            player1_choice: Some(Choice::Rock),
            player2_choice: Some(Choice::Paper),
        };

        book.add_settlement(Settlement::game(b, a, -4.0, now(), result(GameAction::Double)), now())
            .unwrap();
        assert_eq!(book.owes(b, a), 8.0);

        book.add_settlement(Settlement::game(b, a, 8.0, now(), result(GameAction::Cancel)), now())
            .unwrap();
        assert_eq!(book.owes(b, a), 0.0);
    }

    #[test]
    fn overdue_sweep_runs_after_recompute() {
        let (mut book, ids) = book_with(&["a", "b"]);
        let (a, b) = (ids[0], ids[1]);
        let two_weeks_ago = now() - Duration::days(14);
        book.add_expense(NewExpense::new("Rent", 40.0, a, vec![a, b], two_weeks_ago), now())
            .unwrap();
        assert_eq!(book.user(b).unwrap().karma_score, 90);
        assert_eq!(book.user(a).unwrap().karma_score, 90); // first payment resets streak
    }

    #[test]
    fn groups_and_summary() {
        let (mut book, ids) = book_with(&["a", "b", "c"]);
        let (a, b, c) = (ids[0], ids[1], ids[2]);
        let trip = book.create_group("Trip", &[a, b], a, now()).unwrap();
        assert!(book.add_user_to_group(trip, c).unwrap());
        assert!(!book.add_user_to_group(trip, c).unwrap());
        assert!(book.remove_user_from_group(trip, c).unwrap());

        book.add_expense(
            NewExpense::new("Fuel", 30.0, a, vec![a, b], now())
                .with_group(trip)
                .with_category("Transport"),
            now(),
        )
        .unwrap();
        book.add_expense(NewExpense::new("Gift", 12.0, a, vec![a, c], now()), now())
            .unwrap();

        assert_eq!(book.group_expenses(trip).unwrap().len(), 1);
        let bal = book.group_balances(trip).unwrap();
        assert_eq!(bal.owes(b, a), 15.0);
        assert_eq!(bal.owes(c, a), 0.0);
        let summary = book.expense_summary(trip).unwrap();
        assert_eq!(summary.top_category(), Some(("Transport", 30.0)));
        assert_eq!(book.find_group("trip").map(|g| g.id), Some(trip));
    }

    #[test]
    fn unknown_group_operations_fail() {
        let (mut book, ids) = book_with(&["a"]);
        let ghost = GroupId::new();
        assert!(matches!(
            book.add_user_to_group(ghost, ids[0]),
            Err(LedgerError::UnknownGroup(_))
        ));
        assert!(book.group_balances(ghost).is_err());
        assert!(book.create_group("x", &[UserId::new()], ids[0], now()).is_err());
    }

    #[test]
    fn remote_snapshot_rederives_balances() {
        let store: MemoryStore<BookSnapshot> = MemoryStore::new();
        let (mut local, ids) = book_with(&["a", "b"]);
        local.save(&store).unwrap();

        let mut remote = ExpenseBook::load(&store, LedgerConfig::default(), now()).unwrap();
        let updates = store.subscribe();
        remote
            .add_expense(
                NewExpense::new("Pizza", 20.0, ids[0], vec![ids[0], ids[1]], now()),
                now(),
            )
            .unwrap();
        remote.save(&store).unwrap();

        let snapshot = updates.try_recv().unwrap();
        local.apply_remote(snapshot, now()).unwrap();
        assert_eq!(local.owes(ids[1], ids[0]), 10.0);
        assert_eq!(local.expenses().len(), 1);
    }

    #[test]
    fn restore_skips_the_sweep() {
        let (mut book, ids) = book_with(&["a", "b"]);
        let (a, b) = (ids[0], ids[1]);
        book.add_expense(NewExpense::new("Rent", 40.0, a, vec![a, b], now()), now())
            .unwrap();
        let snapshot = book.snapshot();

        let restored = ExpenseBook::restore(snapshot.clone(), LedgerConfig::default()).unwrap();
        assert_eq!(restored.snapshot(), snapshot);
        assert_eq!(restored.owes(b, a), 20.0);

        let later = now() + Duration::days(21);
        let swept = ExpenseBook::from_snapshot(snapshot, LedgerConfig::default(), later).unwrap();
        assert_eq!(swept.user(b).unwrap().karma_score, 85);
    }

    #[test]
    fn inconsistent_remote_snapshot_rejected() {
        let (mut book, ids) = book_with(&["a", "b"]);
        let before = book.snapshot();
        let mut bad = book.snapshot();
        bad.users.remove(&ids[1]);
        bad.expenses.push(
            NewExpense::new("x", 10.0, ids[0], vec![ids[1]], now())
                .into_expense()
                .unwrap(),
        );
        assert!(book.apply_remote(bad, now()).is_err());
        assert_eq!(book.snapshot(), before);
    }
}
