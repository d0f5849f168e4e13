use chrono::Utc;
use colored::Colorize;
use comfy_table::{ContentArrangement, Table};
use pl_wheel::{NewEvent, Rsvp};

use super::{find_event, find_user};
use crate::state::Session;

pub fn create(
    session: &mut Session,
    title: &str,
    by: &str,
    description: &str,
    location: &str,
    date: &str,
    items: Vec<String>,
) -> Result<(), String> {
    let creator = find_user(session, by)?;
    let draft = NewEvent {
        title: title.to_string(),
        description: description.to_string(),
        location: location.to_string(),
        date: date.to_string(),
        items,
    };
    let id = session
        .planner
        .create_event(draft, creator, Utc::now())
        .map_err(|e| e.to_string())?;
    session.save()?;

    println!("  {} event {title} ({id})", "Created".green().bold());
    Ok(())
}

pub fn respond(session: &mut Session, event: &str, user: &str, response: &str) -> Result<(), String> {
    let event_id = find_event(session, event)?;
    let user_id = find_user(session, user)?;
    let rsvp = Rsvp::parse(response)
        .ok_or_else(|| format!("'{response}' is not 'going' or 'not-going'"))?;
    session
        .planner
        .respond_to_event(event_id, user_id, rsvp, Utc::now())
        .map_err(|e| e.to_string())?;
    session.save()?;

    println!("  {user} is {rsvp}");
    Ok(())
}

pub fn list(session: &Session) -> Result<(), String> {
    let events = session.planner.events();
    if events.is_empty() {
        println!("  No events planned.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Title", "When", "Where", "Items", "Going"]);
    for e in &events {
        let items: Vec<&str> = e.items.iter().map(|i| i.name.as_str()).collect();
        table.add_row(vec![
            e.title.clone(),
            e.date.clone(),
            e.location.clone(),
            items.join(", "),
            e.attendees().count().to_string(),
        ]);
    }
    println!("{table}");
    Ok(())
}
