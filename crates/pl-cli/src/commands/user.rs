use chrono::Utc;
use colored::Colorize;
use comfy_table::{ContentArrangement, Table};
use pl_wheel::WheelUser;

use crate::state::Session;

pub fn add(session: &mut Session, name: &str) -> Result<(), String> {
    let name = name.trim();
    if name.is_empty() {
        return Err("user name must not be empty".into());
    }
    if session.table.book().find_user(name).is_some() {
        return Err(format!("a user named '{name}' already exists"));
    }

    let now = Utc::now();
    let id = session.table.book_mut().add_user(name, now);
    session.planner.insert_user(WheelUser::new(id, name, now));
    session.save()?;

    println!("  {} {name} ({id})", "Added".green().bold());
    Ok(())
}

pub fn list(session: &Session) -> Result<(), String> {
    let book = session.table.book();
    if book.users().next().is_none() {
        println!("  No users yet.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Name", "Id", "Karma", "Streak", "Wheel karma"]);

    let mut count = 0;
    for user in book.users() {
        let wheel_karma = session
            .planner
            .user(user.id)
            .map_or_else(|| "-".to_string(), |u| u.karma_score.to_string());
        table.add_row(vec![
            user.name.clone(),
            user.id.to_string(),
            user.karma_score.to_string(),
            user.payment_streak.to_string(),
            wheel_karma,
        ]);
        count += 1;
    }

    println!("{table}");
    println!();
    println!("  {count} users");
    Ok(())
}
