use std::fmt::Display;
use std::sync::Arc;

use log::{info, warn};
use parking_lot::Mutex;
use tokio::task::JoinHandle;

use crate::{
    session::{BoxedSessionStorage, SavedSession},
    store::{Message, Room, StoreError},
    RoomError, RoomManager,
};

/// The reason a session stopped tracking its room
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The room document was deleted remotely
    RoomClosed,
    /// The local member record was removed by the host
    Evicted,
}

impl Display for SessionEnd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RoomClosed => write!(f, "Room no longer exists"),
            Self::Evicted => write!(f, "You were removed from the room"),
        }
    }
}

/// A user's live connection to a room.
///
/// The session subscribes to the room document and its message list, and
/// replaces its local projection wholesale on every remote change. It is the
/// read side of the system; all writes go through [RoomManager].
pub struct RoomSession {
    manager: RoomManager,
    storage: BoxedSessionStorage,

    pub room_id: String,
    pub user_id: String,

    state: Arc<SessionState>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

#[derive(Default)]
struct SessionState {
    room: Mutex<Option<Room>>,
    messages: Mutex<Vec<Message>>,
    end: Mutex<Option<SessionEnd>>,
}

impl RoomSession {
    /// Creates a new room and a session for its host
    pub async fn create(
        manager: &RoomManager,
        storage: BoxedSessionStorage,
        room_name: &str,
        user_name: &str,
    ) -> Result<Self, RoomError> {
        let (room, user) = manager.create_room(room_name, user_name).await?;

        storage.save(&SavedSession {
            room_id: room.id.clone(),
            user_id: user.id.clone(),
            user_name: user.name.clone(),
        });

        Self::attach(manager, storage, room.id, user.id).await
    }

    /// Joins an existing room as a new member
    pub async fn join(
        manager: &RoomManager,
        storage: BoxedSessionStorage,
        room_id: &str,
        user_name: &str,
    ) -> Result<Self, RoomError> {
        let (room, user) = manager.join_room(room_id, user_name).await?;

        storage.save(&SavedSession {
            room_id: room.id.clone(),
            user_id: user.id.clone(),
            user_name: user.name.clone(),
        });

        Self::attach(manager, storage, room.id, user.id).await
    }

    /// Attempts to restore a previous session from persisted identity.
    ///
    /// Returns `Ok(None)` when there is nothing to restore: no persisted
    /// session, or the room is gone (in which case the stale session is
    /// discarded). A member whose record disappeared while away is re-inserted
    /// as a regular member and loses host status permanently.
    pub async fn rejoin(
        manager: &RoomManager,
        storage: BoxedSessionStorage,
    ) -> Result<Option<Self>, RoomError> {
        let Some(saved) = storage.load() else {
            return Ok(None);
        };

        let room = match manager.room_by_id(&saved.room_id).await {
            Ok(room) => room,
            Err(RoomError::Store(StoreError::NotFound { .. })) => {
                warn!("Room {} no longer exists, discarding session", saved.room_id);
                storage.clear();
                return Ok(None);
            }
            Err(err) => return Err(err),
        };

        if room.member(&saved.user_id).is_none() {
            manager
                .rejoin_as_member(&saved.room_id, &saved.user_id, &saved.user_name)
                .await?;
        }

        info!("Restored session for {} in room {}", saved.user_name, saved.room_id);

        let session = Self::attach(manager, storage, saved.room_id, saved.user_id).await?;
        Ok(Some(session))
    }

    async fn attach(
        manager: &RoomManager,
        storage: BoxedSessionStorage,
        room_id: String,
        user_id: String,
    ) -> Result<Self, RoomError> {
        let store = &manager.context.store;
        let state = Arc::new(SessionState::default());

        let room_watcher = store.watch_room(&room_id).await?;
        let mut message_watcher = store.watch_messages(&room_id).await?;

        *state.room.lock() = room_watcher.borrow().clone();
        *state.messages.lock() = sorted(message_watcher.borrow().clone());

        let mut tasks = vec![];

        let room_state = state.clone();
        let mut room_rx = room_watcher.clone();
        tasks.push(tokio::spawn(async move {
            loop {
                if room_rx.changed().await.is_err() {
                    break;
                }

                let document = room_rx.borrow().clone();

                let mut end = room_state.end.lock();

                if end.is_some() {
                    break;
                }

                match document {
                    Some(room) => {
                        *room_state.room.lock() = Some(room);
                    }
                    None => {
                        *end = Some(SessionEnd::RoomClosed);
                        *room_state.room.lock() = None;
                        room_state.messages.lock().clear();
                        break;
                    }
                }
            }
        }));

        // Verify the member record exists before attaching the eviction
        // listener, so it can't fire on the member's own just-created record.
        let present = store
            .room_by_id(&room_id)
            .await?
            .member(&user_id)
            .is_some();

        if present {
            let member_state = state.clone();
            let member_id = user_id.clone();
            let mut member_rx = room_watcher;
            tasks.push(tokio::spawn(async move {
                loop {
                    if member_rx.changed().await.is_err() {
                        break;
                    }

                    let removed = member_rx
                        .borrow()
                        .as_ref()
                        .map(|room| room.member(&member_id).is_none());

                    match removed {
                        Some(true) => {
                            let mut end = member_state.end.lock();

                            if end.is_none() {
                                *end = Some(SessionEnd::Evicted);
                                *member_state.room.lock() = None;
                                member_state.messages.lock().clear();
                            }

                            break;
                        }
                        Some(false) => {}
                        // Room deletion is handled by the room listener
                        None => break,
                    }
                }
            }));
        }

        let message_state = state.clone();
        tasks.push(tokio::spawn(async move {
            loop {
                if message_watcher.changed().await.is_err() {
                    break;
                }

                let messages = message_watcher.borrow().clone();

                if message_state.end.lock().is_some() {
                    break;
                }

                *message_state.messages.lock() = sorted(messages);
            }
        }));

        Ok(Self {
            manager: manager.clone(),
            storage,
            room_id,
            user_id,
            state,
            tasks: Mutex::new(tasks),
        })
    }

    /// The last-known room document, if the session is still tracking one
    pub fn room(&self) -> Option<Room> {
        self.state.room.lock().clone()
    }

    /// The room's chat messages, oldest first
    pub fn messages(&self) -> Vec<Message> {
        self.state.messages.lock().clone()
    }

    /// Why the session stopped, if it did
    pub fn end(&self) -> Option<SessionEnd> {
        self.state.end.lock().clone()
    }

    /// Whether the local member currently holds the host role
    pub fn is_host(&self) -> bool {
        self.room()
            .and_then(|room| room.member(&self.user_id).map(|m| m.is_host))
            .unwrap_or(false)
    }

    /// Leaves the room, releasing all subscriptions and the persisted session
    pub async fn leave(self) -> Result<(), RoomError> {
        self.manager.leave_room(&self.room_id, &self.user_id).await?;

        self.storage.clear();
        self.detach();

        Ok(())
    }

    /// Releases all subscriptions. Safe to call more than once.
    fn detach(&self) {
        for task in self.tasks.lock().drain(..) {
            task.abort();
        }
    }
}

impl Drop for RoomSession {
    fn drop(&mut self) {
        self.detach()
    }
}

fn sorted(mut messages: Vec<Message>) -> Vec<Message> {
    messages.sort_by_key(|m| m.timestamp);
    messages
}
