//! Meeting attendees in speaking order

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Name used when a meeting is started without any attendees
pub const PLACEHOLDER_SPEAKER: &str = "Player 1";

/// One attendee's place in the rotation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Speaker {
    /// Display name, not necessarily unique
    pub name: String,
    /// True once this speaker's slot has elapsed or been skipped past
    pub is_completed: bool,
    /// Stable identity for correlating entries across updates
    pub id: Uuid,
}

impl Speaker {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_completed: false,
            id: Uuid::new_v4(),
        }
    }
}

/// Build the roster from attendee names, keeping their order.
/// An empty list yields a single placeholder speaker so the roster is never empty.
pub fn roster_from(attendees: Vec<String>) -> Vec<Speaker> {
    if attendees.is_empty() {
        return vec![Speaker::new(PLACEHOLDER_SPEAKER)];
    }
    attendees.into_iter().map(Speaker::new).collect()
}
