//! All schemas that are exposed from endpoints are defined here
//! along with the conversions from collab types

use serde::Serialize;
use utoipa::ToSchema;
use watchparty_collab::{
    Message as CollabMessage, Room as CollabRoom, RoomSettings as CollabRoomSettings,
    User as CollabUser, VideoInfo,
};

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct User {
    id: String,
    name: String,
    is_host: bool,
    joined_at: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Video {
    id: String,
    title: String,
    thumbnail: String,
    added_by: String,
    added_at: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RoomSettings {
    allow_all_play_pause: bool,
    allow_all_skip: bool,
    allow_all_delete: bool,
    allow_all_queue_reorder: bool,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Room {
    id: String,
    name: String,
    created_at: i64,
    host_id: String,
    current_video: Option<Video>,
    queue: Vec<Video>,
    is_playing: bool,
    current_time: f32,
    last_updated: i64,
    /// The members of the room, longest-present first
    users: Vec<User>,
    settings: RoomSettings,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Message {
    id: String,
    room_id: String,
    user_id: String,
    user_name: String,
    text: String,
    timestamp: i64,
}

/// Returned after creating or joining a room, carrying the identity
/// the client should persist for reconnection
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct JoinedRoom {
    pub room: Room,
    pub user: User,
}

/// Helper trait to convert any type into a serialized version
pub trait ToSerialized<T>
where
    T: Serialize,
{
    fn to_serialized(&self) -> T;
}

impl<I, O> ToSerialized<Vec<O>> for Vec<I>
where
    I: ToSerialized<O>,
    O: Serialize,
{
    fn to_serialized(&self) -> Vec<O> {
        self.iter().map(|x| x.to_serialized()).collect()
    }
}

impl<I, O> ToSerialized<Option<O>> for Option<I>
where
    I: ToSerialized<O>,
    O: Serialize,
{
    fn to_serialized(&self) -> Option<O> {
        self.as_ref().map(|x| x.to_serialized())
    }
}

impl ToSerialized<User> for CollabUser {
    fn to_serialized(&self) -> User {
        User {
            id: self.id.clone(),
            name: self.name.clone(),
            is_host: self.is_host,
            joined_at: self.joined_at,
        }
    }
}

impl ToSerialized<Video> for VideoInfo {
    fn to_serialized(&self) -> Video {
        Video {
            id: self.id.clone(),
            title: self.title.clone(),
            thumbnail: self.thumbnail.clone(),
            added_by: self.added_by.clone(),
            added_at: self.added_at,
        }
    }
}

impl ToSerialized<RoomSettings> for CollabRoomSettings {
    fn to_serialized(&self) -> RoomSettings {
        RoomSettings {
            allow_all_play_pause: self.allow_all_play_pause,
            allow_all_skip: self.allow_all_skip,
            allow_all_delete: self.allow_all_delete,
            allow_all_queue_reorder: self.allow_all_queue_reorder,
        }
    }
}

impl ToSerialized<Room> for CollabRoom {
    fn to_serialized(&self) -> Room {
        let mut users: Vec<_> = self.users.values().collect();
        users.sort_by_key(|u| u.joined_at);

        Room {
            id: self.id.clone(),
            name: self.name.clone(),
            created_at: self.created_at,
            host_id: self.host_id.clone(),
            current_video: self.current_video.to_serialized(),
            queue: self.queue.to_serialized(),
            is_playing: self.is_playing,
            current_time: self.current_time,
            last_updated: self.last_updated,
            users: users.into_iter().map(|u| u.to_serialized()).collect(),
            settings: self.settings.to_serialized(),
        }
    }
}

impl ToSerialized<Message> for CollabMessage {
    fn to_serialized(&self) -> Message {
        Message {
            id: self.id.clone(),
            room_id: self.room_id.clone(),
            user_id: self.user_id.clone(),
            user_name: self.user_name.clone(),
            text: self.text.clone(),
            timestamp: self.timestamp,
        }
    }
}
