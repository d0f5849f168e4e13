use chrono::Utc;
use colored::Colorize;

use super::{find_group, find_user, find_users, money, name_of};
use crate::state::Session;

pub fn create(session: &mut Session, name: &str, by: &str, members: &[String]) -> Result<(), String> {
    let creator = find_user(session, by)?;
    let mut ids = vec![creator];
    ids.extend(find_users(session, members)?);

    let id = session
        .table
        .book_mut()
        .create_group(name, &ids, creator, Utc::now())
        .map_err(|e| e.to_string())?;
    session.save()?;

    println!("  {} group {name} ({id})", "Created".green().bold());
    Ok(())
}

pub fn add(session: &mut Session, group: &str, user: &str) -> Result<(), String> {
    let group_id = find_group(session, group)?;
    let user_id = find_user(session, user)?;
    let added = session
        .table
        .book_mut()
        .add_user_to_group(group_id, user_id)
        .map_err(|e| e.to_string())?;
    session.save()?;

    if added {
        println!("  {} {} to {group}", "Added".green().bold(), name_of(session, user_id));
    } else {
        println!("  {} is already in {group}", name_of(session, user_id));
    }
    Ok(())
}

pub fn remove(session: &mut Session, group: &str, user: &str) -> Result<(), String> {
    let group_id = find_group(session, group)?;
    let user_id = find_user(session, user)?;
    let removed = session
        .table
        .book_mut()
        .remove_user_from_group(group_id, user_id)
        .map_err(|e| e.to_string())?;
    session.save()?;

    if removed {
        println!("  {} {} from {group}", "Removed".yellow().bold(), name_of(session, user_id));
    } else {
        println!("  {} is not in {group}", name_of(session, user_id));
    }
    Ok(())
}

pub fn summary(session: &Session, group: &str) -> Result<(), String> {
    let group_id = find_group(session, group)?;
    let summary = session
        .table
        .book()
        .expense_summary(group_id)
        .map_err(|e| e.to_string())?;

    println!("  {}", summary.to_string().bold());
    if summary.expense_count > 0 {
        println!();
        for (category, amount) in &summary.by_category {
            println!("  {category:<16} {}", money(*amount));
        }
        println!("  {:<16} {}", "Total", money(summary.total));
    }
    Ok(())
}
