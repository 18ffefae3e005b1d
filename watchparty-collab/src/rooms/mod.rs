mod session;

pub use session::*;

use log::info;
use thiserror::Error;

use crate::{
    events::CollabEvent,
    permissions,
    store::{Message, Room, RoomSettings, RoomUpdate, StoreError, User, VideoInfo},
    util::{random_string, timestamp_now},
    CollabContext,
};

/// A video a member wants to add to a room
#[derive(Debug, Clone)]
pub struct NewVideo {
    pub id: String,
    pub title: String,
    pub thumbnail: String,
}

#[derive(Debug, Error)]
pub enum RoomError {
    #[error("User is not a member of this room")]
    UserNotInRoom,
    #[error("You don't have permission to perform this action")]
    NotAllowed,
    #[error("Only the host can perform this action")]
    HostOnly,
    #[error("Video {0} is not in the queue")]
    VideoNotInQueue(String),
    #[error("There is no video playing")]
    NoCurrentVideo,
    #[error("Cannot target yourself with this action")]
    CannotTargetSelf,
    #[error("Message text cannot be empty")]
    EmptyMessage,
    #[error(transparent)]
    Store(#[from] StoreError),
}

type Result<T> = std::result::Result<T, RoomError>;

/// Facilitates all mutations of the shared room documents.
///
/// Every operation that changes a room validates the acting member against
/// the room's permission settings before writing, since the store accepts
/// writes to any path unconditionally.
#[derive(Clone)]
pub struct RoomManager {
    context: CollabContext,
}

impl RoomManager {
    pub const ROOM_ID_LENGTH: usize = 8;
    pub const USER_ID_LENGTH: usize = 16;

    pub fn new(context: &CollabContext) -> Self {
        Self {
            context: context.clone(),
        }
    }

    /// Creates a new room with the creator as its host
    pub async fn create_room(&self, name: &str, user_name: &str) -> Result<(Room, User)> {
        let timestamp = timestamp_now();

        let host = User {
            id: random_string(Self::USER_ID_LENGTH),
            name: user_name.to_string(),
            is_host: true,
            joined_at: timestamp,
        };

        let room = Room {
            id: random_string(Self::ROOM_ID_LENGTH),
            name: name.to_string(),
            created_at: timestamp,
            host_id: host.id.clone(),
            current_video: None,
            queue: vec![],
            is_playing: false,
            current_time: 0.,
            last_updated: timestamp,
            users: [(host.id.clone(), host.clone())].into(),
            settings: RoomSettings::default(),
        };

        self.context.store.create_room(room.clone()).await?;

        info!("Room {} created by {}", room.id, host.name);
        self.context.emit(CollabEvent::RoomCreated { room: room.clone() });

        Ok((room, host))
    }

    /// Adds a new member to an existing room
    pub async fn join_room(&self, room_id: &str, user_name: &str) -> Result<(Room, User)> {
        let room = self.context.store.room_by_id(room_id).await?;

        let user = User {
            id: random_string(Self::USER_ID_LENGTH),
            name: user_name.to_string(),
            is_host: false,
            joined_at: timestamp_now(),
        };

        self.context.store.put_member(room_id, user.clone()).await?;

        info!("{} joined room {}", user.name, room_id);
        self.context.emit(CollabEvent::UserJoined {
            room_id: room_id.to_string(),
            new_member: user.clone(),
        });

        Ok((room, user))
    }

    /// Re-inserts a returning member whose record disappeared while they were away.
    /// They come back as a regular member, even if they were host before.
    pub async fn rejoin_as_member(&self, room_id: &str, user_id: &str, user_name: &str) -> Result<User> {
        let user = User {
            id: user_id.to_string(),
            name: user_name.to_string(),
            is_host: false,
            joined_at: timestamp_now(),
        };

        self.context.store.put_member(room_id, user.clone()).await?;

        self.context.emit(CollabEvent::UserJoined {
            room_id: room_id.to_string(),
            new_member: user.clone(),
        });

        Ok(user)
    }

    /// Removes a member from a room.
    /// A leaving host hands their role to the longest-present remaining member.
    pub async fn leave_room(&self, room_id: &str, user_id: &str) -> Result<()> {
        let room = self.context.store.room_by_id(room_id).await?;
        let member = room.member(user_id).ok_or(RoomError::UserNotInRoom)?;

        if member.is_host {
            if let Some(next_host) = room.other_members(user_id).first() {
                self.context
                    .store
                    .set_member_host(room_id, &next_host.id, true)
                    .await?;

                info!("Host privileges transferred to {}", next_host.name);
                self.context.emit(CollabEvent::HostChanged {
                    room_id: room_id.to_string(),
                    new_host_id: next_host.id.clone(),
                });
            }
            // With nobody left the room is simply orphaned
        }

        self.context.store.remove_member(room_id, user_id).await?;

        info!("{} left room {}", member.name, room_id);
        self.context.emit(CollabEvent::UserLeft {
            room_id: room_id.to_string(),
            user_id: user_id.to_string(),
        });

        Ok(())
    }

    /// Removes another member from the room. Host-only.
    pub async fn remove_user(&self, room_id: &str, acting: &str, target: &str) -> Result<()> {
        let room = self.context.store.room_by_id(room_id).await?;
        let member = room.member(acting).ok_or(RoomError::UserNotInRoom)?;

        if !member.is_host {
            return Err(RoomError::HostOnly);
        }

        if acting == target {
            return Err(RoomError::CannotTargetSelf);
        }

        if room.member(target).is_none() {
            return Err(RoomError::UserNotInRoom);
        }

        self.context.store.remove_member(room_id, target).await?;

        info!("User {} removed from room {}", target, room_id);
        self.context.emit(CollabEvent::UserLeft {
            room_id: room_id.to_string(),
            user_id: target.to_string(),
        });

        Ok(())
    }

    /// Hands host privileges to another member. Host-only.
    ///
    /// The two member writes are not atomic: a write landing between them can
    /// observe a room without any host.
    pub async fn transfer_host(&self, room_id: &str, acting: &str, target: &str) -> Result<()> {
        let room = self.context.store.room_by_id(room_id).await?;
        let member = room.member(acting).ok_or(RoomError::UserNotInRoom)?;

        if !member.is_host {
            return Err(RoomError::HostOnly);
        }

        if acting == target {
            return Err(RoomError::CannotTargetSelf);
        }

        let new_host = room.member(target).ok_or(RoomError::UserNotInRoom)?;

        self.context
            .store
            .set_member_host(room_id, acting, false)
            .await?;
        self.context
            .store
            .set_member_host(room_id, target, true)
            .await?;

        info!("Host privileges transferred to {}", new_host.name);
        self.context.emit(CollabEvent::HostChanged {
            room_id: room_id.to_string(),
            new_host_id: target.to_string(),
        });

        Ok(())
    }

    /// Replaces the permission toggles of a room. Host-only.
    pub async fn update_settings(
        &self,
        room_id: &str,
        acting: &str,
        settings: RoomSettings,
    ) -> Result<()> {
        let room = self.context.store.room_by_id(room_id).await?;
        let member = room.member(acting).ok_or(RoomError::UserNotInRoom)?;

        if !member.is_host {
            return Err(RoomError::HostOnly);
        }

        self.context
            .store
            .update_room(
                room_id,
                RoomUpdate {
                    settings: Some(settings),
                    last_updated: Some(timestamp_now()),
                    ..Default::default()
                },
            )
            .await?;

        self.context.emit(CollabEvent::SettingsUpdate {
            room_id: room_id.to_string(),
            settings,
        });

        Ok(())
    }

    /// Adds a video. It plays immediately when nothing is playing,
    /// otherwise it is appended to the queue.
    pub async fn add_video(&self, room_id: &str, acting: &str, new_video: NewVideo) -> Result<()> {
        let room = self.context.store.room_by_id(room_id).await?;
        let member = room.member(acting).ok_or(RoomError::UserNotInRoom)?;

        let timestamp = timestamp_now();
        let video = VideoInfo {
            id: new_video.id,
            title: new_video.title,
            thumbnail: new_video.thumbnail,
            added_by: member.id.clone(),
            added_at: timestamp,
        };

        if room.current_video.is_none() {
            let updated = self
                .context
                .store
                .update_room(
                    room_id,
                    RoomUpdate {
                        current_video: Some(Some(video)),
                        last_updated: Some(timestamp),
                        ..Default::default()
                    },
                )
                .await?;

            self.emit_queue_update(&updated);
        } else {
            let mut queue = room.queue.clone();
            queue.push(video);

            self.context.store.set_queue(room_id, queue.clone()).await?;

            self.context.emit(CollabEvent::QueueUpdate {
                room_id: room_id.to_string(),
                current_video: room.current_video,
                queue,
            });
        }

        Ok(())
    }

    /// Removes a video, from the queue or the current slot.
    /// Removing the current video promotes the first queued entry, if any.
    pub async fn remove_video(&self, room_id: &str, acting: &str, video_id: &str) -> Result<()> {
        let room = self.context.store.room_by_id(room_id).await?;
        let member = room.member(acting).ok_or(RoomError::UserNotInRoom)?;

        let current = room
            .current_video
            .as_ref()
            .filter(|v| v.id == video_id);

        if let Some(current) = current {
            if !permissions::can_remove_video(member, &room.settings, current) {
                return Err(RoomError::NotAllowed);
            }

            let next_video = room.queue.first().cloned();
            let new_queue: Vec<_> = room.queue.iter().skip(1).cloned().collect();

            let updated = self
                .context
                .store
                .update_room(
                    room_id,
                    RoomUpdate {
                        is_playing: Some(next_video.is_some()),
                        current_video: Some(next_video),
                        queue: Some(new_queue),
                        current_time: Some(0.),
                        last_updated: Some(timestamp_now()),
                        ..Default::default()
                    },
                )
                .await?;

            self.emit_queue_update(&updated);
            self.emit_playback_update(&updated);
        } else {
            let video = room
                .queue
                .iter()
                .find(|v| v.id == video_id)
                .ok_or_else(|| RoomError::VideoNotInQueue(video_id.to_string()))?;

            if !permissions::can_remove_video(member, &room.settings, video) {
                return Err(RoomError::NotAllowed);
            }

            let new_queue: Vec<_> = room
                .queue
                .iter()
                .filter(|v| v.id != video_id)
                .cloned()
                .collect();

            self.context
                .store
                .set_queue(room_id, new_queue.clone())
                .await?;

            self.context.emit(CollabEvent::QueueUpdate {
                room_id: room_id.to_string(),
                current_video: room.current_video,
                queue: new_queue,
            });
        }

        Ok(())
    }

    /// Resumes playback of the current video
    pub async fn play(&self, room_id: &str, acting: &str) -> Result<()> {
        self.set_playing(room_id, acting, true).await
    }

    /// Pauses playback of the current video
    pub async fn pause(&self, room_id: &str, acting: &str) -> Result<()> {
        self.set_playing(room_id, acting, false).await
    }

    async fn set_playing(&self, room_id: &str, acting: &str, is_playing: bool) -> Result<()> {
        let room = self.context.store.room_by_id(room_id).await?;
        let member = room.member(acting).ok_or(RoomError::UserNotInRoom)?;

        if room.current_video.is_none() {
            return Err(RoomError::NoCurrentVideo);
        }

        if !permissions::can_play_pause(member, &room.settings) {
            return Err(RoomError::NotAllowed);
        }

        let updated = self
            .context
            .store
            .update_room(
                room_id,
                RoomUpdate {
                    is_playing: Some(is_playing),
                    last_updated: Some(timestamp_now()),
                    ..Default::default()
                },
            )
            .await?;

        self.emit_playback_update(&updated);

        Ok(())
    }

    /// Moves the shared playback position. Host-only; guest seeks stay local.
    pub async fn seek(&self, room_id: &str, acting: &str, time: f32) -> Result<()> {
        let room = self.context.store.room_by_id(room_id).await?;
        let member = room.member(acting).ok_or(RoomError::UserNotInRoom)?;

        if room.current_video.is_none() {
            return Err(RoomError::NoCurrentVideo);
        }

        if !member.is_host {
            return Err(RoomError::HostOnly);
        }

        let updated = self
            .context
            .store
            .update_room(
                room_id,
                RoomUpdate {
                    current_time: Some(time),
                    last_updated: Some(timestamp_now()),
                    ..Default::default()
                },
            )
            .await?;

        self.emit_playback_update(&updated);

        Ok(())
    }

    /// Advances to the next queued video, or stops playback when the queue is empty
    pub async fn skip(&self, room_id: &str, acting: &str) -> Result<()> {
        let room = self.context.store.room_by_id(room_id).await?;
        let member = room.member(acting).ok_or(RoomError::UserNotInRoom)?;

        if !permissions::can_skip(member, &room.settings) {
            return Err(RoomError::NotAllowed);
        }

        let next_video = room.queue.first().cloned();
        let new_queue: Vec<_> = room.queue.iter().skip(1).cloned().collect();

        let update = if let Some(next_video) = next_video {
            RoomUpdate {
                current_video: Some(Some(next_video)),
                queue: Some(new_queue),
                is_playing: Some(true),
                current_time: Some(0.),
                last_updated: Some(timestamp_now()),
                ..Default::default()
            }
        } else {
            RoomUpdate {
                current_video: Some(None),
                is_playing: Some(false),
                current_time: Some(0.),
                last_updated: Some(timestamp_now()),
                ..Default::default()
            }
        };

        let updated = self.context.store.update_room(room_id, update).await?;

        self.emit_queue_update(&updated);
        self.emit_playback_update(&updated);

        Ok(())
    }

    /// Removes the current video without advancing, stopping playback entirely
    /// even when more videos are queued
    pub async fn skip_current(&self, room_id: &str, acting: &str) -> Result<()> {
        let room = self.context.store.room_by_id(room_id).await?;
        let member = room.member(acting).ok_or(RoomError::UserNotInRoom)?;

        if room.current_video.is_none() {
            return Err(RoomError::NoCurrentVideo);
        }

        if !permissions::can_delete(member, &room.settings) {
            return Err(RoomError::NotAllowed);
        }

        let updated = self
            .context
            .store
            .update_room(
                room_id,
                RoomUpdate {
                    current_video: Some(None),
                    is_playing: Some(false),
                    current_time: Some(0.),
                    last_updated: Some(timestamp_now()),
                    ..Default::default()
                },
            )
            .await?;

        self.emit_queue_update(&updated);
        self.emit_playback_update(&updated);

        Ok(())
    }

    /// Promotes a queued video directly to the current one, discarding
    /// whatever was playing. Host-only.
    pub async fn play_from_queue(&self, room_id: &str, acting: &str, video_id: &str) -> Result<()> {
        let room = self.context.store.room_by_id(room_id).await?;
        let member = room.member(acting).ok_or(RoomError::UserNotInRoom)?;

        if !permissions::can_play_from_queue(member) {
            return Err(RoomError::HostOnly);
        }

        let selected = room
            .queue
            .iter()
            .find(|v| v.id == video_id)
            .cloned()
            .ok_or_else(|| RoomError::VideoNotInQueue(video_id.to_string()))?;

        let new_queue: Vec<_> = room
            .queue
            .iter()
            .filter(|v| v.id != video_id)
            .cloned()
            .collect();

        let updated = self
            .context
            .store
            .update_room(
                room_id,
                RoomUpdate {
                    current_video: Some(Some(selected)),
                    queue: Some(new_queue),
                    is_playing: Some(true),
                    current_time: Some(0.),
                    last_updated: Some(timestamp_now()),
                    ..Default::default()
                },
            )
            .await?;

        self.emit_queue_update(&updated);
        self.emit_playback_update(&updated);

        Ok(())
    }

    /// Replaces the queue wholesale with a client-supplied permutation.
    /// Concurrent reorders overwrite each other, last write wins.
    pub async fn reorder_queue(
        &self,
        room_id: &str,
        acting: &str,
        new_queue: Vec<VideoInfo>,
    ) -> Result<()> {
        let room = self.context.store.room_by_id(room_id).await?;
        let member = room.member(acting).ok_or(RoomError::UserNotInRoom)?;

        if !permissions::can_reorder(member, &room.settings) {
            return Err(RoomError::NotAllowed);
        }

        self.context
            .store
            .set_queue(room_id, new_queue.clone())
            .await?;
        self.context
            .store
            .update_room(
                room_id,
                RoomUpdate {
                    last_updated: Some(timestamp_now()),
                    ..Default::default()
                },
            )
            .await?;

        self.context.emit(CollabEvent::QueueUpdate {
            room_id: room_id.to_string(),
            current_video: room.current_video,
            queue: new_queue,
        });

        Ok(())
    }

    /// Appends a chat message to the room
    pub async fn send_message(&self, room_id: &str, acting: &str, text: &str) -> Result<Message> {
        let room = self.context.store.room_by_id(room_id).await?;
        let member = room.member(acting).ok_or(RoomError::UserNotInRoom)?;

        let text = text.trim();

        if text.is_empty() {
            return Err(RoomError::EmptyMessage);
        }

        let message = Message {
            id: random_string(Self::USER_ID_LENGTH),
            room_id: room_id.to_string(),
            user_id: member.id.clone(),
            user_name: member.name.clone(),
            text: text.to_string(),
            timestamp: timestamp_now(),
        };

        self.context.store.push_message(message.clone()).await?;

        self.context.emit(CollabEvent::MessageSent {
            message: message.clone(),
        });

        Ok(message)
    }

    /// Returns the messages of a room, oldest first
    pub async fn messages(&self, room_id: &str) -> Result<Vec<Message>> {
        let mut messages = self.context.store.messages(room_id).await?;
        messages.sort_by_key(|m| m.timestamp);

        Ok(messages)
    }

    pub async fn room_by_id(&self, room_id: &str) -> Result<Room> {
        Ok(self.context.store.room_by_id(room_id).await?)
    }

    pub async fn list_all(&self) -> Result<Vec<Room>> {
        Ok(self.context.store.list_rooms().await?)
    }

    fn emit_queue_update(&self, room: &Room) {
        self.context.emit(CollabEvent::QueueUpdate {
            room_id: room.id.clone(),
            current_video: room.current_video.clone(),
            queue: room.queue.clone(),
        });
    }

    fn emit_playback_update(&self, room: &Room) {
        self.context.emit(CollabEvent::PlaybackUpdate {
            room_id: room.id.clone(),
            is_playing: room.is_playing,
            current_time: room.current_time,
        });
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{Collab, MemoryStore};

    async fn collab() -> Collab {
        Collab::new(MemoryStore::new())
    }

    fn video(id: &str) -> NewVideo {
        NewVideo {
            id: id.to_string(),
            title: format!("video {}", id),
            thumbnail: format!("https://example.com/{}.jpg", id),
        }
    }

    #[tokio::test]
    async fn first_video_plays_immediately_and_later_ones_queue_up() {
        let collab = collab().await;
        let (room, host) = collab.rooms.create_room("movies", "john").await.unwrap();

        collab
            .rooms
            .add_video(&room.id, &host.id, video("a"))
            .await
            .unwrap();
        collab
            .rooms
            .add_video(&room.id, &host.id, video("b"))
            .await
            .unwrap();

        let room = collab.rooms.room_by_id(&room.id).await.unwrap();
        assert_eq!(room.current_video.as_ref().unwrap().id, "a");
        assert_eq!(room.queue.len(), 1);
        assert_eq!(room.queue[0].id, "b");
    }

    #[tokio::test]
    async fn removing_the_current_video_promotes_the_next_one() {
        let collab = collab().await;
        let (room, host) = collab.rooms.create_room("movies", "john").await.unwrap();

        for id in ["a", "b", "c"] {
            collab
                .rooms
                .add_video(&room.id, &host.id, video(id))
                .await
                .unwrap();
        }

        collab.rooms.remove_video(&room.id, &host.id, "a").await.unwrap();

        let room = collab.rooms.room_by_id(&room.id).await.unwrap();
        assert_eq!(room.current_video.as_ref().unwrap().id, "b");
        assert_eq!(room.queue.len(), 1);
        assert!(room.is_playing);
        assert_eq!(room.current_time, 0.);
    }

    #[tokio::test]
    async fn removing_the_last_video_stops_playback() {
        let collab = collab().await;
        let (room, host) = collab.rooms.create_room("movies", "john").await.unwrap();

        collab
            .rooms
            .add_video(&room.id, &host.id, video("a"))
            .await
            .unwrap();
        collab.rooms.remove_video(&room.id, &host.id, "a").await.unwrap();

        let room = collab.rooms.room_by_id(&room.id).await.unwrap();
        assert!(room.current_video.is_none());
        assert!(!room.is_playing);
    }

    #[tokio::test]
    async fn guests_can_only_remove_their_own_videos() {
        let collab = collab().await;
        let (room, host) = collab.rooms.create_room("movies", "john").await.unwrap();
        let (_, guest) = collab.rooms.join_room(&room.id, "mary").await.unwrap();

        collab
            .rooms
            .add_video(&room.id, &host.id, video("a"))
            .await
            .unwrap();
        collab
            .rooms
            .add_video(&room.id, &host.id, video("b"))
            .await
            .unwrap();
        collab
            .rooms
            .add_video(&room.id, &guest.id, video("c"))
            .await
            .unwrap();

        let denied = collab.rooms.remove_video(&room.id, &guest.id, "b").await;
        assert!(matches!(denied, Err(RoomError::NotAllowed)));

        collab.rooms.remove_video(&room.id, &guest.id, "c").await.unwrap();

        let room = collab.rooms.room_by_id(&room.id).await.unwrap();
        assert_eq!(room.queue.len(), 1);
        assert_eq!(room.queue[0].id, "b");
    }

    #[tokio::test]
    async fn skip_advances_and_stops_at_the_end() {
        let collab = collab().await;
        let (room, host) = collab.rooms.create_room("movies", "john").await.unwrap();

        collab
            .rooms
            .add_video(&room.id, &host.id, video("a"))
            .await
            .unwrap();
        collab
            .rooms
            .add_video(&room.id, &host.id, video("b"))
            .await
            .unwrap();

        collab.rooms.skip(&room.id, &host.id).await.unwrap();

        let state = collab.rooms.room_by_id(&room.id).await.unwrap();
        assert_eq!(state.current_video.as_ref().unwrap().id, "b");
        assert!(state.is_playing);

        collab.rooms.skip(&room.id, &host.id).await.unwrap();

        let state = collab.rooms.room_by_id(&room.id).await.unwrap();
        assert!(state.current_video.is_none());
        assert!(!state.is_playing);
    }

    #[tokio::test]
    async fn skip_current_does_not_advance() {
        let collab = collab().await;
        let (room, host) = collab.rooms.create_room("movies", "john").await.unwrap();

        collab
            .rooms
            .add_video(&room.id, &host.id, video("a"))
            .await
            .unwrap();
        collab
            .rooms
            .add_video(&room.id, &host.id, video("b"))
            .await
            .unwrap();

        collab.rooms.skip_current(&room.id, &host.id).await.unwrap();

        let state = collab.rooms.room_by_id(&room.id).await.unwrap();
        assert!(state.current_video.is_none());
        assert!(!state.is_playing);
        // The queue is left untouched
        assert_eq!(state.queue.len(), 1);
    }

    #[tokio::test]
    async fn play_from_queue_is_host_only_and_discards_the_current_video() {
        let collab = collab().await;
        let (room, host) = collab.rooms.create_room("movies", "john").await.unwrap();
        let (_, guest) = collab.rooms.join_room(&room.id, "mary").await.unwrap();

        for id in ["a", "b", "c"] {
            collab
                .rooms
                .add_video(&room.id, &host.id, video(id))
                .await
                .unwrap();
        }

        let denied = collab.rooms.play_from_queue(&room.id, &guest.id, "c").await;
        assert!(matches!(denied, Err(RoomError::HostOnly)));

        collab
            .rooms
            .play_from_queue(&room.id, &host.id, "c")
            .await
            .unwrap();

        let state = collab.rooms.room_by_id(&room.id).await.unwrap();
        assert_eq!(state.current_video.as_ref().unwrap().id, "c");
        // "a" is discarded, not returned to the queue
        assert_eq!(state.queue.len(), 1);
        assert_eq!(state.queue[0].id, "b");
        assert!(state.is_playing);
    }

    #[tokio::test]
    async fn guests_need_permission_to_control_playback() {
        let collab = collab().await;
        let (room, host) = collab.rooms.create_room("movies", "john").await.unwrap();
        let (_, guest) = collab.rooms.join_room(&room.id, "mary").await.unwrap();

        collab
            .rooms
            .add_video(&room.id, &host.id, video("a"))
            .await
            .unwrap();

        let denied = collab.rooms.play(&room.id, &guest.id).await;
        assert!(matches!(denied, Err(RoomError::NotAllowed)));

        collab
            .rooms
            .update_settings(
                &room.id,
                &host.id,
                RoomSettings {
                    allow_all_play_pause: true,
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        collab.rooms.play(&room.id, &guest.id).await.unwrap();

        let state = collab.rooms.room_by_id(&room.id).await.unwrap();
        assert!(state.is_playing);
    }

    #[tokio::test]
    async fn seeking_is_host_only() {
        let collab = collab().await;
        let (room, host) = collab.rooms.create_room("movies", "john").await.unwrap();
        let (_, guest) = collab.rooms.join_room(&room.id, "mary").await.unwrap();

        collab
            .rooms
            .add_video(&room.id, &host.id, video("a"))
            .await
            .unwrap();

        let denied = collab.rooms.seek(&room.id, &guest.id, 30.).await;
        assert!(matches!(denied, Err(RoomError::HostOnly)));

        collab.rooms.seek(&room.id, &host.id, 30.).await.unwrap();

        let state = collab.rooms.room_by_id(&room.id).await.unwrap();
        assert_eq!(state.current_time, 30.);
    }

    #[tokio::test]
    async fn reordering_replaces_the_queue_wholesale() {
        let collab = collab().await;
        let (room, host) = collab.rooms.create_room("movies", "john").await.unwrap();

        for id in ["a", "b", "c"] {
            collab
                .rooms
                .add_video(&room.id, &host.id, video(id))
                .await
                .unwrap();
        }

        let state = collab.rooms.room_by_id(&room.id).await.unwrap();
        let reversed: Vec<_> = state.queue.iter().rev().cloned().collect();

        collab
            .rooms
            .reorder_queue(&room.id, &host.id, reversed)
            .await
            .unwrap();

        let state = collab.rooms.room_by_id(&room.id).await.unwrap();
        let order: Vec<_> = state.queue.iter().map(|v| v.id.as_str()).collect();
        assert_eq!(order, vec!["c", "b"]);
    }

    #[tokio::test]
    async fn a_leaving_host_hands_over_to_the_longest_present_member() {
        let collab = collab().await;
        let (room, host) = collab.rooms.create_room("movies", "john").await.unwrap();
        let (_, first) = collab.rooms.join_room(&room.id, "mary").await.unwrap();
        let (_, second) = collab.rooms.join_room(&room.id, "carl").await.unwrap();

        collab.rooms.leave_room(&room.id, &host.id).await.unwrap();

        let state = collab.rooms.room_by_id(&room.id).await.unwrap();
        assert!(state.member(&first.id).unwrap().is_host);
        assert!(!state.member(&second.id).unwrap().is_host);
        assert!(state.member(&host.id).is_none());
    }

    #[tokio::test]
    async fn manual_host_transfer_rejects_self_and_unknown_targets() {
        let collab = collab().await;
        let (room, host) = collab.rooms.create_room("movies", "john").await.unwrap();
        let (_, guest) = collab.rooms.join_room(&room.id, "mary").await.unwrap();

        let to_self = collab.rooms.transfer_host(&room.id, &host.id, &host.id).await;
        assert!(matches!(to_self, Err(RoomError::CannotTargetSelf)));

        let to_nobody = collab.rooms.transfer_host(&room.id, &host.id, "ghost").await;
        assert!(matches!(to_nobody, Err(RoomError::UserNotInRoom)));

        collab
            .rooms
            .transfer_host(&room.id, &host.id, &guest.id)
            .await
            .unwrap();

        let state = collab.rooms.room_by_id(&room.id).await.unwrap();
        assert!(state.member(&guest.id).unwrap().is_host);
        assert!(!state.member(&host.id).unwrap().is_host);
    }

    #[tokio::test]
    async fn eviction_is_host_only() {
        let collab = collab().await;
        let (room, host) = collab.rooms.create_room("movies", "john").await.unwrap();
        let (_, guest) = collab.rooms.join_room(&room.id, "mary").await.unwrap();

        let denied = collab.rooms.remove_user(&room.id, &guest.id, &host.id).await;
        assert!(matches!(denied, Err(RoomError::HostOnly)));

        collab
            .rooms
            .remove_user(&room.id, &host.id, &guest.id)
            .await
            .unwrap();

        let state = collab.rooms.room_by_id(&room.id).await.unwrap();
        assert!(state.member(&guest.id).is_none());
    }

    #[tokio::test]
    async fn messages_are_sorted_by_timestamp_on_read() {
        let collab = collab().await;
        let (room, host) = collab.rooms.create_room("movies", "john").await.unwrap();

        collab
            .rooms
            .send_message(&room.id, &host.id, "hello")
            .await
            .unwrap();
        collab
            .rooms
            .send_message(&room.id, &host.id, "  world  ")
            .await
            .unwrap();

        let empty = collab.rooms.send_message(&room.id, &host.id, "   ").await;
        assert!(matches!(empty, Err(RoomError::EmptyMessage)));

        let messages = collab.rooms.messages(&room.id).await.unwrap();
        let texts: Vec<_> = messages.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["hello", "world"]);
    }
}
