use chrono::Utc;
use colored::Colorize;
use comfy_table::{ContentArrangement, Table};
use pl_core::Settlement;

use super::{find_group, find_user, money, name_of};
use crate::state::Session;

/// Amounts below this are shown as settled.
const EPSILON: f64 = 0.005;

pub fn settle(session: &mut Session, from: &str, to: &str, amount: f64) -> Result<(), String> {
    let from = find_user(session, from)?;
    let to = find_user(session, to)?;
    let now = Utc::now();

    session
        .table
        .book_mut()
        .add_settlement(Settlement::payment(from, to, amount, now), now)
        .map_err(|e| e.to_string())?;
    session.save()?;

    let remaining = session.table.book().owes(from, to);
    println!(
        "  {} {} paid {} {}",
        "Settled".green().bold(),
        name_of(session, from),
        name_of(session, to),
        money(amount),
    );
    if remaining > EPSILON {
        println!("  Still owed: {}", money(remaining));
    }
    Ok(())
}

pub fn balances(session: &Session, group: Option<&str>) -> Result<(), String> {
    let book = session.table.book();
    let owned;
    let balances = match group {
        Some(g) => {
            owned = book
                .group_balances(find_group(session, g)?)
                .map_err(|e| e.to_string())?;
            &owned
        }
        None => book.balances(),
    };

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Debtor", "Owes", "Amount"]);
    let mut rows = 0;
    for balance in balances.iter() {
        for (creditor, amount) in &balance.owes {
            if amount.abs() < EPSILON {
                continue;
            }
            table.add_row(vec![
                name_of(session, balance.user_id),
                name_of(session, *creditor),
                money(*amount),
            ]);
            rows += 1;
        }
    }

    if rows == 0 {
        println!("  {}", "All settled up.".green());
    } else {
        println!("{table}");
    }
    Ok(())
}

pub fn sweep(session: &mut Session) -> Result<(), String> {
    let penalties = session.table.book_mut().check_overdue_debts(Utc::now());
    session.save()?;

    if penalties.is_empty() {
        println!("  No overdue debts.");
        return Ok(());
    }
    for p in &penalties {
        println!(
            "  {} {} lost {} karma ({} days overdue)",
            "Penalty".red().bold(),
            name_of(session, p.user),
            p.karma_lost,
            p.days_overdue,
        );
    }
    Ok(())
}
