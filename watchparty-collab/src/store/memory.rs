use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::watch;

use super::{Message, RealtimeStore, Result, Room, RoomUpdate, StoreError, User, VideoInfo};

/// An in-memory [RealtimeStore].
///
/// Every mutation replaces the stored document and publishes the new version
/// wholesale to all watchers, which is the same contract a hosted realtime
/// database exposes to its clients.
#[derive(Default)]
pub struct MemoryStore {
    rooms: DashMap<String, RoomEntry>,
    messages: DashMap<String, MessageEntry>,
}

struct RoomEntry {
    room: Room,
    sender: watch::Sender<Option<Room>>,
}

struct MessageEntry {
    list: Vec<Message>,
    sender: watch::Sender<Vec<Message>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mutates a room document in place and notifies all watchers
    fn mutate_room<F, T>(&self, room_id: &str, apply: F) -> Result<T>
    where
        F: FnOnce(&mut Room) -> Result<T>,
    {
        let mut entry = self
            .rooms
            .get_mut(room_id)
            .ok_or_else(|| StoreError::NotFound {
                resource: "room",
                identifier: room_id.to_string(),
            })?;

        let result = apply(&mut entry.room)?;
        let _ = entry.sender.send(Some(entry.room.clone()));

        Ok(result)
    }
}

#[async_trait]
impl RealtimeStore for MemoryStore {
    async fn create_room(&self, room: Room) -> Result<()> {
        if self.rooms.contains_key(&room.id) {
            return Err(StoreError::Conflict {
                resource: "room",
                identifier: room.id,
            });
        }

        let (sender, _) = watch::channel(Some(room.clone()));
        self.rooms.insert(room.id.clone(), RoomEntry { room, sender });

        Ok(())
    }

    async fn room_by_id(&self, room_id: &str) -> Result<Room> {
        self.rooms
            .get(room_id)
            .map(|e| e.room.clone())
            .ok_or_else(|| StoreError::NotFound {
                resource: "room",
                identifier: room_id.to_string(),
            })
    }

    async fn list_rooms(&self) -> Result<Vec<Room>> {
        Ok(self.rooms.iter().map(|e| e.room.clone()).collect())
    }

    async fn update_room(&self, room_id: &str, update: RoomUpdate) -> Result<Room> {
        self.mutate_room(room_id, |room| {
            if let Some(current_video) = update.current_video {
                room.current_video = current_video;
            }

            if let Some(queue) = update.queue {
                room.queue = queue;
            }

            if let Some(is_playing) = update.is_playing {
                room.is_playing = is_playing;
            }

            if let Some(current_time) = update.current_time {
                room.current_time = current_time;
            }

            if let Some(settings) = update.settings {
                room.settings = settings;
            }

            if let Some(last_updated) = update.last_updated {
                room.last_updated = last_updated;
            }

            Ok(room.clone())
        })
    }

    async fn delete_room(&self, room_id: &str) -> Result<()> {
        let (_, entry) = self
            .rooms
            .remove(room_id)
            .ok_or_else(|| StoreError::NotFound {
                resource: "room",
                identifier: room_id.to_string(),
            })?;

        let _ = entry.sender.send(None);
        self.messages.remove(room_id);

        Ok(())
    }

    async fn set_queue(&self, room_id: &str, queue: Vec<VideoInfo>) -> Result<()> {
        self.mutate_room(room_id, |room| {
            room.queue = queue;
            Ok(())
        })
    }

    async fn put_member(&self, room_id: &str, member: User) -> Result<()> {
        self.mutate_room(room_id, |room| {
            room.users.insert(member.id.clone(), member);
            Ok(())
        })
    }

    async fn remove_member(&self, room_id: &str, user_id: &str) -> Result<()> {
        self.mutate_room(room_id, |room| {
            room.users.remove(user_id);
            Ok(())
        })
    }

    async fn set_member_host(&self, room_id: &str, user_id: &str, is_host: bool) -> Result<()> {
        self.mutate_room(room_id, |room| {
            let member = room
                .users
                .get_mut(user_id)
                .ok_or_else(|| StoreError::NotFound {
                    resource: "member",
                    identifier: user_id.to_string(),
                })?;

            member.is_host = is_host;
            Ok(())
        })
    }

    async fn push_message(&self, message: Message) -> Result<()> {
        let mut entry = self
            .messages
            .entry(message.room_id.clone())
            .or_insert_with(MessageEntry::new);

        entry.list.push(message);
        let _ = entry.sender.send(entry.list.clone());

        Ok(())
    }

    async fn messages(&self, room_id: &str) -> Result<Vec<Message>> {
        Ok(self
            .messages
            .get(room_id)
            .map(|e| e.list.clone())
            .unwrap_or_default())
    }

    async fn watch_room(&self, room_id: &str) -> Result<watch::Receiver<Option<Room>>> {
        self.rooms
            .get(room_id)
            .map(|e| e.sender.subscribe())
            .ok_or_else(|| StoreError::NotFound {
                resource: "room",
                identifier: room_id.to_string(),
            })
    }

    async fn watch_messages(&self, room_id: &str) -> Result<watch::Receiver<Vec<Message>>> {
        let entry = self
            .messages
            .entry(room_id.to_string())
            .or_insert_with(MessageEntry::new);

        Ok(entry.sender.subscribe())
    }
}

impl MessageEntry {
    fn new() -> Self {
        let (sender, _) = watch::channel(vec![]);

        Self {
            list: vec![],
            sender,
        }
    }
}
