pub mod event;
pub mod expense;
pub mod game;
pub mod group;
pub mod ledger;
pub mod user;
pub mod wheel;

use pl_core::{GroupId, UserId};
use pl_game::ChallengeId;
use pl_wheel::EventId;

use crate::state::Session;

/// Resolve a user by name or id prefix.
fn find_user(session: &Session, query: &str) -> Result<UserId, String> {
    session
        .table
        .book()
        .find_user(query)
        .map(|u| u.id)
        .ok_or_else(|| format!("no user named '{query}'"))
}

fn find_users(session: &Session, queries: &[String]) -> Result<Vec<UserId>, String> {
    queries.iter().map(|q| find_user(session, q)).collect()
}

fn find_group(session: &Session, query: &str) -> Result<GroupId, String> {
    session
        .table
        .book()
        .find_group(query)
        .map(|g| g.id)
        .ok_or_else(|| format!("no group named '{query}'"))
}

fn find_challenge(session: &Session, prefix: &str) -> Result<ChallengeId, String> {
    session
        .table
        .board()
        .find_challenge(prefix)
        .map(|c| c.id)
        .ok_or_else(|| format!("no challenge with id '{prefix}'"))
}

fn find_event(session: &Session, query: &str) -> Result<EventId, String> {
    session
        .planner
        .find_event(query)
        .map(|e| e.id)
        .ok_or_else(|| format!("no event named '{query}'"))
}

/// Display name for a user id, falling back to the short id.
fn name_of(session: &Session, id: UserId) -> String {
    session
        .table
        .book()
        .user(id)
        .map(|u| u.name.clone())
        .or_else(|| session.planner.user(id).map(|u| u.name.clone()))
        .unwrap_or_else(|| id.to_string())
}

fn money(amount: f64) -> String {
    format!("{amount:.2}")
}
