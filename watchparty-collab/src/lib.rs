mod events;
mod permissions;
mod playback;
mod rooms;
mod session;
mod store;
mod util;

use std::sync::Arc;

use crossbeam::channel::unbounded;

pub use events::*;
pub use permissions::*;
pub use playback::*;
pub use rooms::*;
pub use session::*;
pub use store::*;
pub use util::random_string;

/// The watchparty collab system, facilitating rooms, shared playback, and chat
pub struct Collab {
    store: BoxedStore,
    event_receiver: EventReceiver,

    pub rooms: RoomManager,
}

/// A type passed to the components of the collab system,
/// to access the store and emit events
#[derive(Clone)]
pub struct CollabContext {
    pub store: BoxedStore,

    event_sender: EventSender,
}

impl Collab {
    pub fn new(store: impl RealtimeStore + 'static) -> Self {
        let store: BoxedStore = Arc::new(store);
        let (event_sender, event_receiver) = unbounded();

        let context = CollabContext {
            store: store.clone(),
            event_sender,
        };

        let rooms = RoomManager::new(&context);

        Self {
            store,
            event_receiver,
            rooms,
        }
    }

    /// The underlying document store
    pub fn store(&self) -> &BoxedStore {
        &self.store
    }

    /// Blocks until the next event is emitted by the collab system
    pub fn wait_for_event(&self) -> CollabEvent {
        self.event_receiver
            .recv()
            .expect("event is received without error")
    }

    /// Creates a new room and a session for its host
    pub async fn create_session(
        &self,
        storage: BoxedSessionStorage,
        room_name: &str,
        user_name: &str,
    ) -> std::result::Result<RoomSession, RoomError> {
        RoomSession::create(&self.rooms, storage, room_name, user_name).await
    }

    /// Joins an existing room as a new member
    pub async fn join_session(
        &self,
        storage: BoxedSessionStorage,
        room_id: &str,
        user_name: &str,
    ) -> std::result::Result<RoomSession, RoomError> {
        RoomSession::join(&self.rooms, storage, room_id, user_name).await
    }

    /// Attempts to restore a previous session from persisted identity
    pub async fn rejoin_session(
        &self,
        storage: BoxedSessionStorage,
    ) -> std::result::Result<Option<RoomSession>, RoomError> {
        RoomSession::rejoin(&self.rooms, storage).await
    }
}

impl CollabContext {
    pub fn emit(&self, event: CollabEvent) {
        self.event_sender.send(event).expect("event is sent");
    }
}
