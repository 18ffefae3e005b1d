use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::watch;

mod data;
pub use data::*;

mod memory;
pub use memory::*;

pub type Result<T> = std::result::Result<T, StoreError>;
pub type BoxedStore = Arc<dyn RealtimeStore>;

#[derive(Debug, Error)]
pub enum StoreError {
    /// An unknown or internal error happened with the store
    #[error(transparent)]
    Internal(Box<dyn std::error::Error + Send + Sync>),
    /// A document already exists at the targeted path
    #[error("{resource}:{identifier} already exists")]
    Conflict {
        resource: &'static str,
        identifier: String,
    },
    /// A document in the store doesn't exist
    #[error("{resource}:{identifier} doesn't exist")]
    NotFound {
        resource: &'static str,
        identifier: String,
    },
}

/// A sparse patch applied to a room document.
/// Fields left as `None` are not touched, so concurrent writers only
/// overwrite the fields they target.
#[derive(Debug, Clone, Default)]
pub struct RoomUpdate {
    pub current_video: Option<Option<VideoInfo>>,
    pub queue: Option<Vec<VideoInfo>>,
    pub is_playing: Option<bool>,
    pub current_time: Option<f32>,
    pub settings: Option<RoomSettings>,
    pub last_updated: Option<i64>,
}

/// Represents a realtime document store holding room and message documents.
///
/// The store resolves concurrent writes with last-write-wins per field and
/// provides no validation of its own. Authority over the room document is
/// enforced by [crate::RoomManager] before anything is written here.
#[async_trait]
pub trait RealtimeStore: Send + Sync {
    /// Writes a whole new room document. Fails if the id is taken.
    async fn create_room(&self, room: Room) -> Result<()>;
    async fn room_by_id(&self, room_id: &str) -> Result<Room>;
    async fn list_rooms(&self) -> Result<Vec<Room>>;
    /// Applies a partial update to the room document, returning the new document
    async fn update_room(&self, room_id: &str, update: RoomUpdate) -> Result<Room>;
    async fn delete_room(&self, room_id: &str) -> Result<()>;

    /// Overwrites the queue sub-path wholesale
    async fn set_queue(&self, room_id: &str, queue: Vec<VideoInfo>) -> Result<()>;

    async fn put_member(&self, room_id: &str, member: User) -> Result<()>;
    async fn remove_member(&self, room_id: &str, user_id: &str) -> Result<()>;
    async fn set_member_host(&self, room_id: &str, user_id: &str, is_host: bool) -> Result<()>;

    async fn push_message(&self, message: Message) -> Result<()>;
    /// Returns the messages of a room in insertion order
    async fn messages(&self, room_id: &str) -> Result<Vec<Message>>;

    /// Subscribes to a room document. The receiver carries the whole document,
    /// replaced on every change, and `None` once the room is deleted.
    async fn watch_room(&self, room_id: &str) -> Result<watch::Receiver<Option<Room>>>;
    /// Subscribes to the message list of a room
    async fn watch_messages(&self, room_id: &str) -> Result<watch::Receiver<Vec<Message>>>;
}
