//! Spending summaries.

use serde::{Deserialize, Serialize};

use crate::expense::Expense;

/// Category used for expenses without one.
pub const UNCATEGORIZED: &str = "Other";

/// Where the money went.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseSummary {
    /// Number of expenses considered.
    pub expense_count: usize,
    /// Sum of all amounts.
    pub total: f64,
    /// Spend per category, in order of first appearance.
    pub by_category: Vec<(String, f64)>,
}

impl ExpenseSummary {
    /// Summarize a set of expenses.
    pub fn from_expenses<'a>(expenses: impl IntoIterator<Item = &'a Expense>) -> Self {
        let mut summary = Self {
            expense_count: 0,
            total: 0.0,
            by_category: Vec::new(),
        };
        for e in expenses {
            summary.expense_count += 1;
            summary.total += e.amount;
            let cat = e.category.as_deref().unwrap_or(UNCATEGORIZED);
            match summary.by_category.iter().position(|(c, _)| c == cat) {
                Some(i) => summary.by_category[i].1 += e.amount,
                None => summary.by_category.push((cat.to_string(), e.amount)),
            }
        }
        summary
    }

    /// The category with the largest spend. Ties go to the category seen first.
    pub fn top_category(&self) -> Option<(&str, f64)> {
        let mut top: Option<(&str, f64)> = None;
        for (cat, sum) in &self.by_category {
            if top.is_none_or(|(_, best)| *sum > best) {
                top = Some((cat.as_str(), *sum));
            }
        }
        top
    }

    /// Rounded percentage of the total spent on the top category.
    pub fn top_share_percent(&self) -> Option<u32> {
        let (_, sum) = self.top_category()?;
        if self.total <= 0.0 {
            return None;
        }
        Some((sum / self.total * 100.0).round() as u32)
    }
}

fn category_emoji(category: &str) -> &'static str {
    match category {
        "Food" => "🍽️",
        "Transport" => "🚗",
        "Entertainment" => "🎉",
        "Shopping" => "🛍️",
        "Utilities" => "💡",
        "Rent" => "🏠",
        "Other" => "💰",
        _ => "💸",
    }
}

impl std::fmt::Display for ExpenseSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.top_category(), self.top_share_percent()) {
            (Some((cat, _)), Some(pct)) => write!(
                f,
                "You spent {pct}% of the budget on {cat} {}!",
                category_emoji(cat)
            ),
            _ => write!(f, "No expenses yet!"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    use crate::expense::NewExpense;
    use crate::id::UserId;

    fn expense(amount: f64, category: Option<&str>) -> Expense {
        let payer = UserId::new();
        let mut draft = NewExpense::new("x", amount, payer, vec![payer], Utc::now());
        if let Some(c) = category {
            draft = draft.with_category(c);
        }
        draft.into_expense().unwrap()
    }

    #[test]
    fn empty_summary() {
        let s = ExpenseSummary::from_expenses(&Vec::<Expense>::new());
        assert_eq!(s.expense_count, 0);
        assert_eq!(s.top_category(), None);
        insta::assert_snapshot!(s.to_string(), @"No expenses yet!");
    }

    #[test]
    fn top_category_share() {
        let expenses = vec![
            expense(60.0, Some("Food")),
            expense(30.0, Some("Rent")),
            expense(10.0, None),
        ];
        let s = ExpenseSummary::from_expenses(&expenses);
        assert_eq!(s.total, 100.0);
        assert_eq!(s.top_category(), Some(("Food", 60.0)));
        assert_eq!(s.top_share_percent(), Some(60));
        insta::assert_snapshot!(s.to_string(), @"You spent 60% of the budget on Food 🍽️!");
    }

    #[test]
    fn uncategorized_counts_as_other() {
        let expenses = vec![expense(5.0, None), expense(5.0, None)];
        let s = ExpenseSummary::from_expenses(&expenses);
        assert_eq!(s.by_category, vec![("Other".to_string(), 10.0)]);
        assert_eq!(s.top_share_percent(), Some(100));
    }

    #[test]
    fn tie_goes_to_first_seen() {
        let expenses = vec![expense(5.0, Some("Transport")), expense(5.0, Some("Food"))];
        let s = ExpenseSummary::from_expenses(&expenses);
        assert_eq!(s.top_category().map(|(c, _)| c), Some("Transport"));
    }
}
