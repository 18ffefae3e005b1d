use axum::{
    extract::State,
    response::{
        sse::{Event, KeepAlive},
        Sse,
    },
    routing::get,
};
use futures_util::Stream;
use parking_lot::Mutex;
use serde::Serialize;
use std::{
    collections::VecDeque,
    convert::Infallible,
    pin::Pin,
    sync::{Arc, Weak},
    task::{Context, Poll, Waker},
};
use utoipa::ToSchema;
use watchparty_collab::CollabEvent;

use crate::{
    context::ServerContext,
    serialized::{Message, Room, RoomSettings, ToSerialized, User, Video},
    Router,
};

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "kebab-case", tag = "type")]
pub enum ServerEvent {
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
        current_video: Option<Video>,
        queue: Vec<Video>,
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

impl From<CollabEvent> for ServerEvent {
    fn from(value: CollabEvent) -> Self {
        match value {
            CollabEvent::RoomCreated { room } => Self::RoomCreated {
                room: room.to_serialized(),
            },
            CollabEvent::PlaybackUpdate {
                room_id,
                is_playing,
                current_time,
            } => Self::PlaybackUpdate {
                room_id,
                is_playing,
                current_time,
            },
            CollabEvent::QueueUpdate {
                room_id,
                current_video,
                queue,
            } => Self::QueueUpdate {
                room_id,
                current_video: current_video.to_serialized(),
                queue: queue.to_serialized(),
            },
            CollabEvent::SettingsUpdate { room_id, settings } => Self::SettingsUpdate {
                room_id,
                settings: settings.to_serialized(),
            },
            CollabEvent::UserJoined {
                room_id,
                new_member,
            } => Self::UserJoined {
                room_id,
                new_member: new_member.to_serialized(),
            },
            CollabEvent::UserLeft { room_id, user_id } => Self::UserLeft { room_id, user_id },
            CollabEvent::HostChanged {
                room_id,
                new_host_id,
            } => Self::HostChanged {
                room_id,
                new_host_id,
            },
            CollabEvent::MessageSent { message } => Self::MessageSent {
                message: message.to_serialized(),
            },
        }
    }
}

/// Manages server sent event connections
pub struct ServerSentEvents {
    me: Weak<Self>,
    connections: Mutex<Vec<Connection>>,
}

struct Connection {
    id: usize,
    pending: Arc<Mutex<VecDeque<ServerEvent>>>,
    waker: Arc<Mutex<Option<Waker>>>,
}

pub struct ConnectionHandle {
    id: usize,
    /// A reference to [Connection]'s pending events
    pending: Arc<Mutex<VecDeque<ServerEvent>>>,
    /// A reference to [Connection]'s stored [Waker]
    waker: Arc<Mutex<Option<Waker>>>,
    /// Required to remove the connection when dropped
    manager: Weak<ServerSentEvents>,
}

impl ServerSentEvents {
    pub fn new() -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            me: me.clone(),
            connections: Default::default(),
        })
    }

    pub fn broadcast(&self, event: ServerEvent) {
        let connections = self.connections.lock();

        for connection in connections.iter() {
            connection.send(event.clone())
        }
    }

    fn connect(&self) -> ConnectionHandle {
        let connection = Connection::new();
        let handle = connection.handle(self.me.clone());

        self.connections.lock().push(connection);
        handle
    }

    fn disconnect(&self, id: usize) {
        self.connections.lock().retain(|c| c.id != id)
    }
}

impl Connection {
    fn new() -> Self {
        static NEXT_ID: std::sync::atomic::AtomicUsize = std::sync::atomic::AtomicUsize::new(0);

        Self {
            id: NEXT_ID.fetch_add(1, std::sync::atomic::Ordering::Relaxed),
            pending: Default::default(),
            waker: Default::default(),
        }
    }

    fn send(&self, event: ServerEvent) {
        self.pending.lock().push_back(event);

        if let Some(waker) = self.waker.lock().take() {
            waker.wake()
        }
    }

    fn handle(&self, manager: Weak<ServerSentEvents>) -> ConnectionHandle {
        ConnectionHandle {
            id: self.id,
            pending: self.pending.clone(),
            waker: self.waker.clone(),
            manager,
        }
    }
}

impl Stream for ConnectionHandle {
    type Item = Result<Event, Infallible>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let next_event = self
            .pending
            .lock()
            .pop_front()
            .map(|e| serde_json::to_string(&e).expect("serializes properly"));

        if let Some(event) = next_event {
            return Poll::Ready(Some(Ok(Event::default().data(event))));
        }

        *self.waker.lock() = Some(cx.waker().clone());
        Poll::Pending
    }
}

impl Drop for ConnectionHandle {
    fn drop(&mut self) {
        if let Some(manager) = self.manager.upgrade() {
            manager.disconnect(self.id)
        }
    }
}

#[utoipa::path(
    get,
    path = "/v1/events",
    tag = "events",
    responses(
        (
            status = 200,
            content_type = "text/event-stream",
            description = "A stream of events from this watchparty instance",
            body = ServerEvent
        )
    )
)]
async fn event_stream(State(context): State<ServerContext>) -> Sse<ConnectionHandle> {
    Sse::new(context.sse.connect()).keep_alive(KeepAlive::default())
}

pub fn router() -> Router {
    Router::new().route("/", get(event_stream))
}
