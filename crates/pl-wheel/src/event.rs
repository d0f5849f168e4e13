use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use pl_core::UserId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Generate a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Check whether the hyphenated form starts with `prefix`.
            pub fn matches_prefix(&self, prefix: &str) -> bool {
                !prefix.is_empty() && self.0.to_string().starts_with(&prefix.to_lowercase())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", &self.0.to_string()[..8])
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }
    };
}

uuid_id!(
    /// Unique identifier for an event.
    EventId
);

uuid_id!(
    /// Unique identifier for an item within an event.
    ItemId
);

/// Something that has to be brought to an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventItem {
    /// Unique identifier.
    pub id: ItemId,
    /// What it is.
    pub name: String,
}

/// Whether a user is coming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rsvp {
    /// Coming.
    Going,
    /// Not coming.
    NotGoing,
}

impl Rsvp {
    /// Parse a response from user input.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace(['-', '_'], " ").as_str() {
            "going" | "yes" => Some(Self::Going),
            "not going" | "no" => Some(Self::NotGoing),
            _ => None,
        }
    }
}

impl fmt::Display for Rsvp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Going => write!(f, "going"),
            Self::NotGoing => write!(f, "not going"),
        }
    }
}

/// One user's answer to an invitation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventResponse {
    /// Who answered.
    pub user_id: UserId,
    /// The answer.
    pub response: Rsvp,
    /// When they answered.
    pub responded_at: DateTime<Utc>,
}

/// The fields supplied when creating an event.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewEvent {
    /// Headline.
    pub title: String,
    /// Free text.
    pub description: String,
    /// Where.
    pub location: String,
    /// When, as the organiser wrote it.
    pub date: String,
    /// Names of the things to bring.
    pub items: Vec<String>,
}

impl NewEvent {
    /// An event with just a title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the location.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    /// Set the date text.
    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = date.into();
        self
    }

    /// Add an item to bring.
    pub fn with_item(mut self, name: impl Into<String>) -> Self {
        self.items.push(name.into());
        self
    }
}

/// A planned get-together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Unique identifier.
    pub id: EventId,
    /// Headline.
    pub title: String,
    /// Free text.
    pub description: String,
    /// Where.
    pub location: String,
    /// When, as the organiser wrote it.
    pub date: String,
    /// Who created it.
    pub created_by: UserId,
    /// When it was created.
    pub created_at: DateTime<Utc>,
    /// Things to bring.
    pub items: Vec<EventItem>,
    /// At most one response per user.
    pub responses: Vec<EventResponse>,
}

impl Event {
    /// Look up an item.
    pub fn item(&self, id: ItemId) -> Option<&EventItem> {
        self.items.iter().find(|i| i.id == id)
    }

    /// Find an item by name (case-insensitive) or id prefix.
    pub fn find_item(&self, query: &str) -> Option<&EventItem> {
        self.items
            .iter()
            .find(|i| i.name.eq_ignore_ascii_case(query))
            .or_else(|| self.items.iter().find(|i| i.id.matches_prefix(query)))
    }

    /// Record a response, replacing any earlier one from the same user.
    pub fn respond(&mut self, user: UserId, response: Rsvp, now: DateTime<Utc>) {
        self.responses.retain(|r| r.user_id != user);
        self.responses.push(EventResponse {
            user_id: user,
            response,
            responded_at: now,
        });
    }

    /// The response `user` gave, if any.
    pub fn response_of(&self, user: UserId) -> Option<Rsvp> {
        self.responses
            .iter()
            .find(|r| r.user_id == user)
            .map(|r| r.response)
    }

    /// Users who said they are going.
    pub fn attendees(&self) -> impl Iterator<Item = UserId> + '_ {
        self.responses
            .iter()
            .filter(|r| r.response == Rsvp::Going)
            .map(|r| r.user_id)
    }
}
