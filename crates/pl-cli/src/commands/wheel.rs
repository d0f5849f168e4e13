use chrono::Utc;
use colored::Colorize;
use comfy_table::{ContentArrangement, Table};
use pl_core::UserId;
use pl_wheel::{ItemId, SpinMode};

use super::{find_event, find_user, name_of};
use crate::state::Session;

/// Parse `user=weight` pairs.
fn parse_weights(session: &Session, pairs: &[String]) -> Result<Vec<(UserId, f64)>, String> {
    pairs
        .iter()
        .map(|pair| {
            let (user, weight) = pair
                .split_once('=')
                .ok_or_else(|| format!("expected user=weight, got '{pair}'"))?;
            let weight: f64 = weight
                .trim()
                .parse()
                .map_err(|_| format!("'{weight}' is not a number"))?;
            Ok((find_user(session, user.trim())?, weight))
        })
        .collect()
}

pub fn spin(
    session: &mut Session,
    event: &str,
    item: &str,
    fair: bool,
    weights: &[String],
) -> Result<(), String> {
    let event_id = find_event(session, event)?;
    let item_id = session
        .planner
        .event(event_id)
        .and_then(|e| e.find_item(item))
        .map(|i| i.id)
        .ok_or_else(|| format!("'{event}' has no item '{item}'"))?;

    let participants = if weights.is_empty() {
        session
            .planner
            .participants(event_id)
            .map_err(|e| e.to_string())?
    } else {
        parse_weights(session, weights)?
    };
    let mode = if fair { SpinMode::Fair } else { SpinMode::Weighted };

    let spin = session
        .planner
        .spin(event_id, item_id, &participants, mode, &mut session.rng, Utc::now())
        .map_err(|e| e.to_string())?;
    session.save()?;

    println!(
        "  {} {} brings {item}! (+{} karma)",
        "The wheel has spoken:".magenta().bold(),
        name_of(session, spin.winner_id),
        spin.winner_karma_bonus,
    );
    Ok(())
}

pub fn history(session: &Session, event: &str) -> Result<(), String> {
    let event_id = find_event(session, event)?;
    let spins = session.planner.spin_history_for_event(event_id);
    if spins.is_empty() {
        println!("  No spins yet.");
        return Ok(());
    }

    let item_name = |id: ItemId| {
        session
            .planner
            .event(event_id)
            .and_then(|e| e.item(id))
            .map_or_else(|| id.to_string(), |i| i.name.clone())
    };
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["When", "Item", "Winner", "Mode", "Bonus"]);
    for s in &spins {
        table.add_row(vec![
            s.timestamp.format("%Y-%m-%d %H:%M").to_string(),
            item_name(s.item_id),
            name_of(session, s.winner_id),
            if s.was_in_fair_mode { "fair" } else { "weighted" }.to_string(),
            format!("+{}", s.winner_karma_bonus),
        ]);
    }
    println!("{table}");
    Ok(())
}

pub fn clear(session: &mut Session, event: &str) -> Result<(), String> {
    let event_id = find_event(session, event)?;
    let removed = session.planner.clear_history_for_event(event_id);
    session.save()?;
    println!("  Cleared {removed} spins.");
    Ok(())
}
