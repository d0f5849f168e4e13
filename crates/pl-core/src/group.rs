use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::{GroupId, UserId};

/// A named set of users who share expenses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    /// Unique identifier.
    pub id: GroupId,
    /// Display name.
    pub name: String,
    /// Member user ids, in join order.
    pub members: Vec<UserId>,
    /// The user who created the group.
    pub created_by: UserId,
    /// When the group was created.
    pub created_at: DateTime<Utc>,
}

impl Group {
    /// Whether `user` is a member.
    pub fn has_member(&self, user: UserId) -> bool {
        self.members.contains(&user)
    }

    /// Add a member. Returns false if they were already in the group.
    pub fn add_member(&mut self, user: UserId) -> bool {
        if self.has_member(user) {
            return false;
        }
        self.members.push(user);
        true
    }

    /// Remove a member. Returns true if they were in the group.
    pub fn remove_member(&mut self, user: UserId) -> bool {
        let before = self.members.len();
        self.members.retain(|m| *m != user);
        self.members.len() < before
    }
}
