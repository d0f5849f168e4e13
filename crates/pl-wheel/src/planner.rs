//! The planner: users, events, and the wheel's spin history.
//!
//! Like the expense book, every mutating method checks its inputs first
//! and fails without side effects.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use pl_core::UserId;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::WheelConfig;
use crate::error::{WheelError, WheelResult};
use crate::event::{Event, EventId, EventItem, ItemId, NewEvent, Rsvp};
use crate::sampler::{SpinMode, draw_weighted_winner};
use crate::spin::Spin;

/// A planner participant. Karma starts at zero and has no upper bound.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WheelUser {
    /// Unique identifier.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Accumulated spin bonuses.
    pub karma_score: i64,
    /// When the user was added.
    pub created_at: DateTime<Utc>,
}

impl WheelUser {
    /// A user with no karma yet.
    pub fn new(id: UserId, name: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: name.into(),
            karma_score: 0,
            created_at: now,
        }
    }
}

/// Users, events and spin history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Planner {
    #[serde(skip)]
    config: WheelConfig,
    users: BTreeMap<UserId, WheelUser>,
    events: BTreeMap<EventId, Event>,
    spins: Vec<Spin>,
}

impl Planner {
    /// An empty planner.
    pub fn new(config: WheelConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Replace the configuration, e.g. after deserializing.
    pub fn set_config(&mut self, config: WheelConfig) {
        self.config = config;
    }

    /// The active configuration.
    pub fn config(&self) -> &WheelConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Users
    // -----------------------------------------------------------------------

    /// Add a user with a fresh id.
    pub fn add_user(&mut self, name: impl Into<String>, now: DateTime<Utc>) -> UserId {
        self.insert_user(WheelUser::new(UserId::new(), name, now))
    }

    /// Add a user whose id was allocated elsewhere, replacing any existing
    /// record with that id.
    pub fn insert_user(&mut self, user: WheelUser) -> UserId {
        let id = user.id;
        info!(user = %id, name = %user.name, "planner user added");
        self.users.insert(id, user);
        id
    }

    /// Remove a user and their event responses. Spin history is kept.
    pub fn remove_user(&mut self, id: UserId) -> WheelResult<WheelUser> {
        let user = self.users.remove(&id).ok_or(WheelError::UnknownUser(id))?;
        for event in self.events.values_mut() {
            event.responses.retain(|r| r.user_id != id);
        }
        info!(user = %id, "planner user removed");
        Ok(user)
    }

    /// Look up a user.
    pub fn user(&self, id: UserId) -> Option<&WheelUser> {
        self.users.get(&id)
    }

    /// All users, ordered by id.
    pub fn users(&self) -> impl Iterator<Item = &WheelUser> {
        self.users.values()
    }

    /// Find a user by name (case-insensitive) or id prefix.
    pub fn find_user(&self, query: &str) -> Option<&WheelUser> {
        self.users
            .values()
            .find(|u| u.name.eq_ignore_ascii_case(query))
            .or_else(|| self.users.values().find(|u| u.id.matches_prefix(query)))
    }

    fn require_user(&self, id: UserId) -> WheelResult<&WheelUser> {
        self.users.get(&id).ok_or(WheelError::UnknownUser(id))
    }

    // -----------------------------------------------------------------------
    // Events
    // -----------------------------------------------------------------------

    /// Create an event. The title must not be blank.
    pub fn create_event(
        &mut self,
        draft: NewEvent,
        created_by: UserId,
        now: DateTime<Utc>,
    ) -> WheelResult<EventId> {
        self.require_user(created_by)?;
        let title = draft.title.trim();
        if title.is_empty() {
            return Err(WheelError::InvalidEvent("title must not be empty".to_string()));
        }

        let id = EventId::new();
        let event = Event {
            id,
            title: title.to_string(),
            description: draft.description,
            location: draft.location,
            date: draft.date,
            created_by,
            created_at: now,
            items: draft
                .items
                .into_iter()
                .map(|name| EventItem {
                    id: ItemId::new(),
                    name,
                })
                .collect(),
            responses: Vec::new(),
        };
        info!(event = %id, title = %event.title, items = event.items.len(), "event created");
        self.events.insert(id, event);
        Ok(id)
    }

    /// Look up an event.
    pub fn event(&self, id: EventId) -> Option<&Event> {
        self.events.get(&id)
    }

    /// All events, oldest first.
    pub fn events(&self) -> Vec<&Event> {
        let mut list: Vec<&Event> = self.events.values().collect();
        list.sort_by_key(|e| e.created_at);
        list
    }

    /// Find an event by title (case-insensitive) or id prefix.
    pub fn find_event(&self, query: &str) -> Option<&Event> {
        self.events
            .values()
            .find(|e| e.title.eq_ignore_ascii_case(query))
            .or_else(|| self.events.values().find(|e| e.id.matches_prefix(query)))
    }

    fn require_event(&self, id: EventId) -> WheelResult<&Event> {
        self.events.get(&id).ok_or(WheelError::EventNotFound(id))
    }

    /// Record `user`'s answer, replacing any earlier one.
    pub fn respond_to_event(
        &mut self,
        event: EventId,
        user: UserId,
        response: Rsvp,
        now: DateTime<Utc>,
    ) -> WheelResult<()> {
        self.require_user(user)?;
        let event = self
            .events
            .get_mut(&event)
            .ok_or(WheelError::EventNotFound(event))?;
        event.respond(user, response, now);
        debug!(event = %event.id, %user, %response, "event response");
        Ok(())
    }

    /// Delete an event together with its spin history.
    pub fn remove_event(&mut self, id: EventId) -> WheelResult<Event> {
        let event = self.events.remove(&id).ok_or(WheelError::EventNotFound(id))?;
        self.spins.retain(|s| s.event_id != id);
        info!(event = %id, "event removed");
        Ok(event)
    }

    /// Who is on the wheel for `event`: everyone who said they are going,
    /// or every user if nobody has answered yes. Each gets weight 1.
    pub fn participants(&self, event: EventId) -> WheelResult<Vec<(UserId, f64)>> {
        let event = self.require_event(event)?;
        let going: Vec<UserId> = event
            .attendees()
            .filter(|u| self.users.contains_key(u))
            .collect();
        let ids: Vec<UserId> = if going.is_empty() {
            self.users.keys().copied().collect()
        } else {
            going
        };
        Ok(ids.into_iter().map(|id| (id, 1.0)).collect())
    }

    // -----------------------------------------------------------------------
    // Wheel
    // -----------------------------------------------------------------------

    /// Spin the wheel for one item of an event and record the result.
    ///
    /// The winner gains the configured karma bonus for the mode.
    pub fn spin<R: Rng + ?Sized>(
        &mut self,
        event: EventId,
        item: ItemId,
        participants: &[(UserId, f64)],
        mode: SpinMode,
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> WheelResult<Spin> {
        let ev = self.require_event(event)?;
        if ev.item(item).is_none() {
            return Err(WheelError::ItemNotFound { event, item });
        }
        for (id, _) in participants {
            self.require_user(*id)?;
        }

        let winner_id = draw_weighted_winner(participants, mode, rng)?;
        let bonus = match mode {
            SpinMode::Fair => self.config.fair_bonus,
            SpinMode::Weighted => self.config.weighted_bonus,
        };
        if let Some(winner) = self.users.get_mut(&winner_id) {
            winner.karma_score = winner.karma_score.saturating_add(bonus);
        }

        let spin = Spin {
            event_id: event,
            item_id: item,
            winner_id,
            timestamp: now,
            was_in_fair_mode: mode == SpinMode::Fair,
            winner_karma_bonus: bonus,
        };
        info!(event = %event, item = %item, winner = %winner_id, %mode, bonus, "spin recorded");
        self.spins.push(spin.clone());
        Ok(spin)
    }

    /// Spins recorded for `event`, oldest first.
    pub fn spin_history_for_event(&self, event: EventId) -> Vec<&Spin> {
        self.spins.iter().filter(|s| s.event_id == event).collect()
    }

    /// Forget the spins recorded for `event`. Returns how many were removed.
    pub fn clear_history_for_event(&mut self, event: EventId) -> usize {
        let before = self.spins.len();
        self.spins.retain(|s| s.event_id != event);
        let removed = before - self.spins.len();
        debug!(event = %event, removed, "spin history cleared");
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    struct Fixture {
        planner: Planner,
        alice: UserId,
        bob: UserId,
        event: EventId,
        bread: ItemId,
    }

    fn fixture() -> Fixture {
        let now = Utc::now();
        let mut planner = Planner::new(WheelConfig::default());
        let alice = planner.add_user("Alice", now);
        let bob = planner.add_user("Bob", now);
        let event = planner
            .create_event(
                NewEvent::new("Picnic")
                    .with_location("Park")
                    .with_item("Bread")
                    .with_item("Wine"),
                alice,
                now,
            )
            .unwrap();
        let bread = planner.event(event).unwrap().items[0].id;
        Fixture {
            planner,
            alice,
            bob,
            event,
            bread,
        }
    }

    #[test]
    fn users_start_without_karma() {
        let f = fixture();
        assert_eq!(f.planner.user(f.alice).unwrap().karma_score, 0);
        assert_eq!(f.planner.find_user("bob").unwrap().id, f.bob);
    }

    #[test]
    fn blank_title_rejected() {
        let mut f = fixture();
        let err = f
            .planner
            .create_event(NewEvent::new("  "), f.alice, Utc::now())
            .unwrap_err();
        assert!(matches!(err, WheelError::InvalidEvent(_)));
        assert_eq!(f.planner.events().len(), 1);
    }

    #[test]
    fn unknown_creator_rejected() {
        let mut f = fixture();
        let stranger = UserId::new();
        let err = f
            .planner
            .create_event(NewEvent::new("Party"), stranger, Utc::now())
            .unwrap_err();
        assert!(matches!(err, WheelError::UnknownUser(id) if id == stranger));
    }

    #[test]
    fn fair_spin_awards_two() {
        let mut f = fixture();
        let mut rng = StdRng::seed_from_u64(5);
        let participants = f.planner.participants(f.event).unwrap();
        let spin = f
            .planner
            .spin(f.event, f.bread, &participants, SpinMode::Fair, &mut rng, Utc::now())
            .unwrap();
        assert!(spin.was_in_fair_mode);
        assert_eq!(spin.winner_karma_bonus, 2);
        assert_eq!(f.planner.user(spin.winner_id).unwrap().karma_score, 2);
        assert_eq!(f.planner.spin_history_for_event(f.event).len(), 1);
    }

    #[test]
    fn weighted_spin_awards_one_and_respects_weights() {
        let mut f = fixture();
        let mut rng = StdRng::seed_from_u64(5);
        let participants = [(f.alice, 0.0), (f.bob, 2.0)];
        for _ in 0..3 {
            let spin = f
                .planner
                .spin(f.event, f.bread, &participants, SpinMode::Weighted, &mut rng, Utc::now())
                .unwrap();
            assert_eq!(spin.winner_id, f.bob);
            assert_eq!(spin.winner_karma_bonus, 1);
        }
        assert_eq!(f.planner.user(f.bob).unwrap().karma_score, 3);
        assert_eq!(f.planner.user(f.alice).unwrap().karma_score, 0);
    }

    #[test]
    fn spin_errors_leave_state_untouched() {
        let mut f = fixture();
        let mut rng = StdRng::seed_from_u64(5);
        let before = f.planner.clone();

        let err = f
            .planner
            .spin(f.event, ItemId::new(), &[(f.alice, 1.0)], SpinMode::Fair, &mut rng, Utc::now())
            .unwrap_err();
        assert!(matches!(err, WheelError::ItemNotFound { .. }));

        let err = f
            .planner
            .spin(EventId::new(), f.bread, &[(f.alice, 1.0)], SpinMode::Fair, &mut rng, Utc::now())
            .unwrap_err();
        assert!(matches!(err, WheelError::EventNotFound(_)));

        let err = f
            .planner
            .spin(f.event, f.bread, &[(UserId::new(), 1.0)], SpinMode::Fair, &mut rng, Utc::now())
            .unwrap_err();
        assert!(matches!(err, WheelError::UnknownUser(_)));

        let err = f
            .planner
            .spin(f.event, f.bread, &[], SpinMode::Fair, &mut rng, Utc::now())
            .unwrap_err();
        assert!(matches!(err, WheelError::InvalidWeights(_)));

        assert_eq!(f.planner, before);
    }

    #[test]
    fn participants_prefer_attendees() {
        let mut f = fixture();
        assert_eq!(f.planner.participants(f.event).unwrap().len(), 2);
        f.planner
            .respond_to_event(f.event, f.bob, Rsvp::Going, Utc::now())
            .unwrap();
        f.planner
            .respond_to_event(f.event, f.alice, Rsvp::NotGoing, Utc::now())
            .unwrap();
        assert_eq!(f.planner.participants(f.event).unwrap(), vec![(f.bob, 1.0)]);
    }

    #[test]
    fn respond_replaces_previous() {
        let mut f = fixture();
        f.planner
            .respond_to_event(f.event, f.bob, Rsvp::Going, Utc::now())
            .unwrap();
        f.planner
            .respond_to_event(f.event, f.bob, Rsvp::NotGoing, Utc::now())
            .unwrap();
        let event = f.planner.event(f.event).unwrap();
        assert_eq!(event.responses.len(), 1);
        assert_eq!(event.response_of(f.bob), Some(Rsvp::NotGoing));
    }

    #[test]
    fn clear_history_only_touches_one_event() {
        let mut f = fixture();
        let mut rng = StdRng::seed_from_u64(5);
        let other = f
            .planner
            .create_event(NewEvent::new("Dinner").with_item("Dessert"), f.bob, Utc::now())
            .unwrap();
        let dessert = f.planner.event(other).unwrap().items[0].id;
        let everyone = [(f.alice, 1.0), (f.bob, 1.0)];
        f.planner
            .spin(f.event, f.bread, &everyone, SpinMode::Fair, &mut rng, Utc::now())
            .unwrap();
        f.planner
            .spin(other, dessert, &everyone, SpinMode::Fair, &mut rng, Utc::now())
            .unwrap();

        assert_eq!(f.planner.clear_history_for_event(f.event), 1);
        assert!(f.planner.spin_history_for_event(f.event).is_empty());
        assert_eq!(f.planner.spin_history_for_event(other).len(), 1);
    }

    #[test]
    fn remove_user_drops_responses() {
        let mut f = fixture();
        f.planner
            .respond_to_event(f.event, f.bob, Rsvp::Going, Utc::now())
            .unwrap();
        f.planner.remove_user(f.bob).unwrap();
        assert!(f.planner.user(f.bob).is_none());
        assert!(f.planner.event(f.event).unwrap().responses.is_empty());
        assert!(matches!(
            f.planner.remove_user(f.bob),
            Err(WheelError::UnknownUser(_))
        ));
    }

    #[test]
    fn remove_event_drops_history() {
        let mut f = fixture();
        let mut rng = StdRng::seed_from_u64(5);
        f.planner
            .spin(f.event, f.bread, &[(f.alice, 1.0)], SpinMode::Fair, &mut rng, Utc::now())
            .unwrap();
        f.planner.remove_event(f.event).unwrap();
        assert!(f.planner.spin_history_for_event(f.event).is_empty());
        assert!(f.planner.find_event("picnic").is_none());
    }

    #[test]
    fn planner_round_trips_through_json() {
        let f = fixture();
        let json = serde_json::to_string(&f.planner).unwrap();
        let back: Planner = serde_json::from_str(&json).unwrap();
        assert_eq!(back, f.planner);
    }
}
