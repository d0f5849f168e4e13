use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, LedgerResult};
use crate::id::{ExpenseId, GroupId, UserId};

/// A shared expense, split evenly across its participants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    /// Unique identifier.
    pub id: ExpenseId,
    /// What the money was spent on.
    pub description: String,
    /// Total amount paid. Always positive.
    pub amount: f64,
    /// The user who paid.
    pub paid_by: UserId,
    /// Users sharing the cost, in the order they were listed. The payer may
    /// or may not be among them.
    pub participants: Vec<UserId>,
    /// When the expense happened.
    pub date: DateTime<Utc>,
    /// Group this expense belongs to, if any.
    pub group_id: Option<GroupId>,
    /// Free-form category ("Food", "Rent", ...).
    pub category: Option<String>,
}

impl Expense {
    /// Each participant's share of the amount.
    pub fn per_person(&self) -> f64 {
        self.amount / self.participants.len() as f64
    }

    /// Whether `user` shares this expense without having paid it.
    pub fn is_debtor(&self, user: UserId) -> bool {
        user != self.paid_by && self.participants.contains(&user)
    }

    /// Check the shape of the expense: positive finite amount, at least one
    /// participant, no participant listed twice.
    pub fn validate(&self) -> LedgerResult<()> {
        if !self.amount.is_finite() || self.amount <= 0.0 {
            return Err(LedgerError::InvalidExpense(format!(
                "amount must be positive, got {}",
                self.amount
            )));
        }
        if self.participants.is_empty() {
            return Err(LedgerError::InvalidExpense(
                "an expense needs at least one participant".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        for p in &self.participants {
            if !seen.insert(*p) {
                return Err(LedgerError::InvalidExpense(format!(
                    "participant {p} listed twice"
                )));
            }
        }
        Ok(())
    }
}

/// The caller-authored part of an expense. The book assigns the id.
#[derive(Debug, Clone)]
pub struct NewExpense {
    /// What the money was spent on.
    pub description: String,
    /// Total amount paid.
    pub amount: f64,
    /// The user who paid.
    pub paid_by: UserId,
    /// Users sharing the cost.
    pub participants: Vec<UserId>,
    /// When the expense happened.
    pub date: DateTime<Utc>,
    /// Optional group.
    pub group_id: Option<GroupId>,
    /// Optional category.
    pub category: Option<String>,
}

impl NewExpense {
    /// Start an expense with no group and no category.
    pub fn new(
        description: impl Into<String>,
        amount: f64,
        paid_by: UserId,
        participants: Vec<UserId>,
        date: DateTime<Utc>,
    ) -> Self {
        Self {
            description: description.into(),
            amount,
            paid_by,
            participants,
            date,
            group_id: None,
            category: None,
        }
    }

    /// Attach the expense to a group.
    pub fn with_group(mut self, group: GroupId) -> Self {
        self.group_id = Some(group);
        self
    }

    /// Set the category.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Assign an id and validate.
    pub fn into_expense(self) -> LedgerResult<Expense> {
        let expense = Expense {
            id: ExpenseId::new(),
            description: self.description,
            amount: self.amount,
            paid_by: self.paid_by,
            participants: self.participants,
            date: self.date,
            group_id: self.group_id,
            category: self.category,
        };
        expense.validate()?;
        Ok(expense)
    }
}
