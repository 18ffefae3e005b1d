use crossbeam::channel::{Receiver, Sender};

use crate::{Message, Room, RoomSettings, User, VideoInfo};

pub type EventSender = Sender<CollabEvent>;
pub type EventReceiver = Receiver<CollabEvent>;

/// Events emitted whenever the shared room state changes
#[derive(Debug, Clone)]
pub enum CollabEvent {
    /// A new room was created
    RoomCreated { room: Room },
    /// A room's playback flags changed
    PlaybackUpdate {
        room_id: String,
        is_playing: bool,
        /// The shared playback position, in seconds
        current_time: f32,
    },
    /// The current video or queue of a room changed
    QueueUpdate {
        room_id: String,
        current_video: Option<VideoInfo>,
        queue: Vec<VideoInfo>,
    },
    /// The permission toggles of a room changed
    SettingsUpdate {
        room_id: String,
        settings: RoomSettings,
    },
    /// A user became a member of a room
    UserJoined { room_id: String, new_member: User },
    /// A user left a room, voluntarily or by eviction
    UserLeft { room_id: String, user_id: String },
    /// Host privileges moved to another member
    HostChanged {
        room_id: String,
        new_host_id: String,
    },
    /// A chat message was sent to a room
    MessageSent { message: Message },
}
