use chrono::Utc;
use colored::Colorize;
use comfy_table::{ContentArrangement, Table};
use pl_core::{NewExpense, UserId};

use super::{find_group, find_user, find_users, money, name_of};
use crate::state::Session;

pub fn add(
    session: &mut Session,
    description: &str,
    amount: f64,
    paid_by: &str,
    split: &[String],
    group: Option<&str>,
    category: Option<&str>,
) -> Result<(), String> {
    let payer = find_user(session, paid_by)?;
    let group = group.map(|g| find_group(session, g)).transpose()?;

    let participants: Vec<UserId> = if !split.is_empty() {
        find_users(session, split)?
    } else if let Some(group) = group {
        session
            .table
            .book()
            .group(group)
            .map(|g| g.members.clone())
            .unwrap_or_default()
    } else {
        session.table.book().users().map(|u| u.id).collect()
    };

    let now = Utc::now();
    let mut draft = NewExpense::new(description, amount, payer, participants, now);
    if let Some(group) = group {
        draft = draft.with_group(group);
    }
    if let Some(category) = category {
        draft = draft.with_category(category);
    }

    let count = draft.participants.len();
    let id = session
        .table
        .book_mut()
        .add_expense(draft, now)
        .map_err(|e| e.to_string())?;
    session.save()?;

    println!(
        "  {} {description}: {} paid by {} split {count} ways ({id})",
        "Recorded".green().bold(),
        money(amount),
        name_of(session, payer),
    );
    Ok(())
}

pub fn list(session: &Session, group: Option<&str>) -> Result<(), String> {
    let book = session.table.book();
    let expenses = match group {
        Some(g) => book
            .group_expenses(find_group(session, g)?)
            .map_err(|e| e.to_string())?,
        None => book.expenses().iter().collect(),
    };

    if expenses.is_empty() {
        println!("  No expenses found.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Date", "Description", "Amount", "Paid by", "Split", "Category"]);
    for e in &expenses {
        let split: Vec<String> = e.participants.iter().map(|p| name_of(session, *p)).collect();
        table.add_row(vec![
            e.date.format("%Y-%m-%d").to_string(),
            e.description.clone(),
            money(e.amount),
            name_of(session, e.paid_by),
            split.join(", "),
            e.category.clone().unwrap_or_else(|| "-".to_string()),
        ]);
    }

    println!("{table}");
    println!();
    println!("  {} expenses", expenses.len());
    Ok(())
}
