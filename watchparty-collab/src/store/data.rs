use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A member of a watch party room
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    /// If this is true, the member has full control over the room
    pub is_host: bool,
    pub joined_at: i64,
}

/// A video that was added to a room by a member.
/// It lives in the queue until it is promoted to the room's current video, or removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoInfo {
    /// The external video identifier
    pub id: String,
    pub title: String,
    pub thumbnail: String,
    /// The id of the member that added this video
    pub added_by: String,
    pub added_at: i64,
}

/// The permission toggles of a room, gating what non-host members can do.
/// The host is always permitted regardless of these.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSettings {
    pub allow_all_play_pause: bool,
    pub allow_all_skip: bool,
    pub allow_all_delete: bool,
    pub allow_all_queue_reorder: bool,
}

/// A watch party room document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: String,
    pub name: String,
    pub created_at: i64,
    /// The id of the member that created the room
    pub host_id: String,
    pub current_video: Option<VideoInfo>,
    pub queue: Vec<VideoInfo>,
    pub is_playing: bool,
    /// The shared playback position, in seconds
    pub current_time: f32,
    pub last_updated: i64,
    pub users: HashMap<String, User>,
    pub settings: RoomSettings,
}

/// A chat message. Append-only, never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub room_id: String,
    pub user_id: String,
    pub user_name: String,
    pub text: String,
    pub timestamp: i64,
}

impl Room {
    /// Returns the member with the given id, if it is in the room
    pub fn member(&self, user_id: &str) -> Option<&User> {
        self.users.get(user_id)
    }

    /// Returns all members except the given one, earliest joined first
    pub fn other_members(&self, user_id: &str) -> Vec<&User> {
        let mut others: Vec<_> = self.users.values().filter(|u| u.id != user_id).collect();
        others.sort_by_key(|u| u.joined_at);
        others
    }
}
