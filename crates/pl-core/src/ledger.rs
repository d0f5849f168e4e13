//! Balance computation.
//!
//! Balances are a pure function of the user table, the expense history and
//! the settlement history. Every mutation of the book re-runs
//! [`recompute_balances`] over the full history rather than patching the
//! previous result, so a snapshot that changed underneath us (a remote
//! update) is handled the same way as a local edit.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, LedgerResult};
use crate::expense::Expense;
use crate::group::Group;
use crate::id::UserId;
use crate::settlement::Settlement;
use crate::user::User;

/// One user's view of the ledger.
///
/// `owes[b]` is what this user owes `b`; `is_owed[b]` is what `b` owes this
/// user. Values may be negative once a debt has been over-settled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Balance {
    /// The user this balance belongs to.
    pub user_id: UserId,
    /// Amounts this user owes, by creditor.
    pub owes: BTreeMap<UserId, f64>,
    /// Amounts owed to this user, by debtor.
    pub is_owed: BTreeMap<UserId, f64>,
}

impl Balance {
    /// An empty balance.
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            owes: BTreeMap::new(),
            is_owed: BTreeMap::new(),
        }
    }

    /// What this user owes `other` (zero if they never interacted).
    pub fn owes_to(&self, other: UserId) -> f64 {
        self.owes.get(&other).copied().unwrap_or(0.0)
    }

    /// What `other` owes this user (zero if they never interacted).
    pub fn owed_by(&self, other: UserId) -> f64 {
        self.is_owed.get(&other).copied().unwrap_or(0.0)
    }

    /// Total owed to this user minus total this user owes.
    pub fn net(&self) -> f64 {
        self.is_owed.values().sum::<f64>() - self.owes.values().sum::<f64>()
    }
}

/// Balances for every known user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Balances {
    by_user: BTreeMap<UserId, Balance>,
}

impl Balances {
    /// Empty balances for each of the given users.
    pub fn for_users(users: impl IntoIterator<Item = UserId>) -> Self {
        Self {
            by_user: users.into_iter().map(|id| (id, Balance::new(id))).collect(),
        }
    }

    /// The balance for `user`, if known.
    pub fn get(&self, user: UserId) -> Option<&Balance> {
        self.by_user.get(&user)
    }

    /// What `debtor` owes `creditor`.
    pub fn owes(&self, debtor: UserId, creditor: UserId) -> f64 {
        self.get(debtor).map_or(0.0, |b| b.owes_to(creditor))
    }

    /// What `creditor` is owed by `debtor`.
    pub fn is_owed(&self, creditor: UserId, debtor: UserId) -> f64 {
        self.get(creditor).map_or(0.0, |b| b.owed_by(debtor))
    }

    /// Iterate balances in user id order.
    pub fn iter(&self) -> impl Iterator<Item = &Balance> {
        self.by_user.values()
    }

    /// Number of users tracked.
    pub fn len(&self) -> usize {
        self.by_user.len()
    }

    /// Whether no users are tracked.
    pub fn is_empty(&self) -> bool {
        self.by_user.is_empty()
    }

    pub(crate) fn track(&mut self, user: UserId) {
        self.by_user.entry(user).or_insert_with(|| Balance::new(user));
    }

    /// Record that `debtor` owes `creditor` a further `amount`, on both sides.
    fn credit(&mut self, debtor: UserId, creditor: UserId, amount: f64) -> LedgerResult<()> {
        if !self.by_user.contains_key(&creditor) {
            return Err(LedgerError::UnknownUser(creditor));
        }
        let owes = self
            .by_user
            .get_mut(&debtor)
            .ok_or(LedgerError::UnknownUser(debtor))?;
        *owes.owes.entry(creditor).or_insert(0.0) += amount;

        if let Some(owed) = self.by_user.get_mut(&creditor) {
            *owed.is_owed.entry(debtor).or_insert(0.0) += amount;
        }
        Ok(())
    }

    fn apply_expense(&mut self, expense: &Expense) -> LedgerResult<()> {
        expense.validate()?;
        if !self.by_user.contains_key(&expense.paid_by) {
            return Err(LedgerError::UnknownUser(expense.paid_by));
        }
        let per_person = expense.per_person();
        for participant in &expense.participants {
            if *participant != expense.paid_by {
                self.credit(*participant, expense.paid_by, per_person)?;
            }
        }
        Ok(())
    }

    fn apply_settlements<'a>(
        &mut self,
        settlements: impl IntoIterator<Item = &'a Settlement>,
    ) -> LedgerResult<()> {
        let mut ordered: Vec<&Settlement> = settlements.into_iter().collect();
        ordered.sort_by_key(|s| s.date);
        for s in ordered {
            self.credit(s.from, s.to, -s.amount)?;
        }
        Ok(())
    }
}

/// Recompute every user's balance from scratch.
///
/// Expenses add `amount / participants` to each non-paying participant's
/// debt towards the payer. Settlements are then applied in chronological
/// order, subtracting their amount from the debtor's debt. Nothing is
/// clamped: an over-settled debt turns negative.
pub fn recompute_balances(
    users: &BTreeMap<UserId, User>,
    expenses: &[Expense],
    settlements: &[Settlement],
) -> LedgerResult<Balances> {
    let mut balances = Balances::for_users(users.keys().copied());
    for expense in expenses {
        balances.apply_expense(expense)?;
    }
    balances.apply_settlements(settlements)?;
    tracing::debug!(
        users = users.len(),
        expenses = expenses.len(),
        settlements = settlements.len(),
        "balances recomputed"
    );
    Ok(balances)
}

/// Balances restricted to one group.
///
/// Only the group's expenses count, and only settlements between two users
/// who both take part in at least one of those expenses.
pub fn group_balances(
    group: &Group,
    users: &BTreeMap<UserId, User>,
    expenses: &[Expense],
    settlements: &[Settlement],
) -> LedgerResult<Balances> {
    let group_expenses: Vec<&Expense> = expenses
        .iter()
        .filter(|e| e.group_id == Some(group.id))
        .collect();

    let mut balances = Balances::for_users(users.keys().copied());
    for expense in &group_expenses {
        balances.apply_expense(expense)?;
    }
    let relevant = settlements.iter().filter(|s| {
        group_expenses
            .iter()
            .any(|e| e.participants.contains(&s.from) && e.participants.contains(&s.to))
    });
    balances.apply_settlements(relevant)?;
    Ok(balances)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use proptest::prelude::*;

    use crate::expense::NewExpense;
    use crate::id::GroupId;

    fn users(names: &[&str]) -> (BTreeMap<UserId, User>, Vec<UserId>) {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let mut map = BTreeMap::new();
        let mut ids = Vec::new();
        for n in names {
            let u = User::new(*n, 100, now);
            ids.push(u.id);
            map.insert(u.id, u);
        }
        (map, ids)
    }

    fn expense(amount: f64, payer: UserId, participants: Vec<UserId>) -> Expense {
        NewExpense::new("x", amount, payer, participants, Utc::now())
            .into_expense()
            .unwrap()
    }

    #[test]
    fn even_split_against_non_payers() {
        let (table, ids) = users(&["a", "b", "c"]);
        let (a, b, c) = (ids[0], ids[1], ids[2]);
        let e = expense(90.0, a, vec![a, b, c]);
        let bal = recompute_balances(&table, &[e], &[]).unwrap();
        assert_eq!(bal.owes(b, a), 30.0);
        assert_eq!(bal.owes(c, a), 30.0);
        assert_eq!(bal.is_owed(a, b), 30.0);
        assert_eq!(bal.is_owed(a, c), 30.0);
        assert_eq!(bal.owes(a, a), 0.0);
        assert_eq!(bal.get(a).unwrap().net(), 60.0);
    }

    #[test]
    fn payer_outside_participants() {
        let (table, ids) = users(&["a", "b", "c"]);
        let e = expense(20.0, ids[0], vec![ids[1], ids[2]]);
        let bal = recompute_balances(&table, &[e], &[]).unwrap();
        assert_eq!(bal.owes(ids[1], ids[0]), 10.0);
        assert_eq!(bal.owes(ids[2], ids[0]), 10.0);
    }

    #[test]
    fn settlement_zeroes_debt() {
        let (table, ids) = users(&["a", "b", "c"]);
        let (a, b) = (ids[0], ids[1]);
        let e = expense(90.0, a, vec![a, b, ids[2]]);
        let s = Settlement::payment(b, a, 30.0, Utc::now());
        let bal = recompute_balances(&table, &[e], &[s]).unwrap();
        assert_eq!(bal.owes(b, a), 0.0);
        assert_eq!(bal.is_owed(a, b), 0.0);
    }

    #[test]
    fn over_settlement_goes_negative() {
        let (table, ids) = users(&["a", "b"]);
        let (a, b) = (ids[0], ids[1]);
        let e = expense(10.0, a, vec![a, b]);
        let s = Settlement::payment(b, a, 8.0, Utc::now());
        let bal = recompute_balances(&table, &[e], &[s]).unwrap();
        assert_eq!(bal.owes(b, a), -3.0);
        assert_eq!(bal.is_owed(a, b), -3.0);
    }

    #[test]
    fn negative_settlement_increases_debt() {
        let (table, ids) = users(&["a", "b"]);
        let (a, b) = (ids[0], ids[1]);
        let e = expense(8.0, a, vec![a, b]);
        let mut s = Settlement::payment(b, a, 4.0, Utc::now());
        s.amount = -4.0;
        let bal = recompute_balances(&table, &[e], &[s]).unwrap();
        assert_eq!(bal.owes(b, a), 8.0);
    }

    #[test]
    fn settlements_applied_chronologically() {
        let (table, ids) = users(&["a", "b"]);
        let (a, b) = (ids[0], ids[1]);
        let t0 = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let late = Settlement::payment(b, a, 1.0, t0 + Duration::days(2));
        let early = Settlement::payment(b, a, 2.0, t0);
        let fwd = recompute_balances(&table, &[], &[early.clone(), late.clone()]).unwrap();
        let rev = recompute_balances(&table, &[], &[late, early]).unwrap();
        assert_eq!(fwd, rev);
        assert_eq!(fwd.owes(b, a), -3.0);
    }

    #[test]
    fn unknown_user_rejected() {
        let (table, ids) = users(&["a"]);
        let stranger = UserId::new();
        let e = expense(10.0, ids[0], vec![ids[0], stranger]);
        assert!(matches!(
            recompute_balances(&table, &[e], &[]),
            Err(LedgerError::UnknownUser(id)) if id == stranger
        ));
        let s = Settlement::payment(stranger, ids[0], 1.0, Utc::now());
        assert!(recompute_balances(&table, &[], &[s]).is_err());
    }

    #[test]
    fn zero_participant_expense_rejected() {
        let (table, ids) = users(&["a"]);
        let mut e = expense(10.0, ids[0], vec![ids[0]]);
        e.participants.clear();
        assert!(matches!(
            recompute_balances(&table, &[e], &[]),
            Err(LedgerError::InvalidExpense(_))
        ));
    }

    #[test]
    fn every_user_gets_a_balance() {
        let (table, _) = users(&["a", "b", "c"]);
        let bal = recompute_balances(&table, &[], &[]).unwrap();
        assert_eq!(bal.len(), 3);
        assert!(bal.iter().all(|b| b.owes.is_empty() && b.is_owed.is_empty()));
    }

    #[test]
    fn group_balances_filter_expenses_and_settlements() {
        let (table, ids) = users(&["a", "b", "c"]);
        let (a, b, c) = (ids[0], ids[1], ids[2]);
        let group = Group {
            id: GroupId::new(),
            name: "trip".to_string(),
            members: vec![a, b],
            created_by: a,
            created_at: Utc::now(),
        };
        let mut inside = expense(10.0, a, vec![a, b]);
        inside.group_id = Some(group.id);
        let outside = expense(30.0, a, vec![a, c]);
        let pay_inside = Settlement::payment(b, a, 2.0, Utc::now());
        let pay_outside = Settlement::payment(c, a, 5.0, Utc::now());

        let bal = group_balances(
            &group,
            &table,
            &[inside, outside],
            &[pay_inside, pay_outside],
        )
        .unwrap();
        assert_eq!(bal.owes(b, a), 3.0);
        assert_eq!(bal.owes(c, a), 0.0);
    }

    fn history() -> impl Strategy<Value = (Vec<(usize, u8, u32)>, Vec<(usize, usize, i32, i64)>)> {
        let expenses = prop::collection::vec((0usize..4, 1u8..16, 1u32..10_000), 0..12);
        let settlements = prop::collection::vec((0usize..4, 0usize..4, -500i32..500, 0i64..30), 0..12);
        (expenses, settlements)
    }

    proptest! {
        #[test]
        fn mirror_invariant_and_idempotence((raw_expenses, raw_settlements) in history()) {
            let (table, ids) = users(&["a", "b", "c", "d"]);
            let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

            let expenses: Vec<Expense> = raw_expenses
                .iter()
                .map(|(payer, mask, cents)| {
                    let participants: Vec<UserId> = (0..4)
                        .filter(|i| mask & (1 << i) != 0)
                        .map(|i| ids[i])
                        .collect();
                    expense(*cents as f64 / 100.0, ids[*payer], participants)
                })
                .collect();
            let settlements: Vec<Settlement> = raw_settlements
                .iter()
                .filter(|(from, to, _, _)| from != to)
                .map(|(from, to, cents, day)| {
                    let mut s = Settlement::payment(ids[*from], ids[*to], 1.0, t0 + Duration::days(*day));
                    s.amount = *cents as f64 / 100.0;
                    s
                })
                .collect();

            let first = recompute_balances(&table, &expenses, &settlements).unwrap();
            let second = recompute_balances(&table, &expenses, &settlements).unwrap();
            prop_assert_eq!(&first, &second);

            for a in &ids {
                for b in &ids {
                    prop_assert_eq!(first.owes(*a, *b), first.is_owed(*b, *a));
                }
            }
        }
    }
}
