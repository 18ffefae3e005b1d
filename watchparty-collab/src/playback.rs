use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam::atomic::AtomicCell;
use log::warn;
use parking_lot::Mutex;
use tokio::sync::watch;

use crate::{Room, RoomError, RoomManager};

/// Represents the local playback engine a [PlaybackSync] reconciles against
pub trait MediaPlayer: Send + Sync {
    /// The current playback position, in seconds
    fn current_time(&self) -> f32;
    fn seek(&self, time: f32);
    fn play(&self);
    fn pause(&self);
}

/// Playback-related events reported by the local player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerEvent {
    Playing,
    Paused,
    Buffering,
    Ended,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    #[default]
    NoVideo,
    Paused,
    Playing,
    Buffering,
}

/// Timing knobs of the reconciliation loop
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// How often the host compares its player against the shared clock
    pub heartbeat_interval: Duration,
    /// How far the host's player may drift before it pushes a seek
    pub host_drift_threshold: f32,
    /// How far a guest's player may drift before it is forced to seek.
    /// Larger than the host threshold, so guests don't fight the heartbeat.
    pub guest_drift_threshold: f32,
    /// How long after a local seek remote corrections are suppressed,
    /// to avoid oscillating between the correction and the next heartbeat
    pub resync_cooldown: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval: Duration::from_secs(3),
            host_drift_threshold: 1.0,
            guest_drift_threshold: 1.5,
            resync_cooldown: Duration::from_secs(1),
        }
    }
}

/// Reconciles a local [MediaPlayer] against the shared room document.
///
/// Two authorities drive this state machine: the room document (shared truth)
/// and the local player (the actual playback engine). The host's periodic
/// heartbeat is the only thing advancing the shared clock during
/// uninterrupted playback; guests follow it and correct large drift locally.
pub struct PlaybackSync<P> {
    manager: RoomManager,
    player: Arc<P>,
    config: SyncConfig,

    room_id: String,
    user_id: String,

    state: AtomicCell<PlaybackState>,
    dragging: AtomicCell<bool>,
    last_sync: Mutex<Option<Instant>>,
}

impl<P> PlaybackSync<P>
where
    P: MediaPlayer,
{
    pub fn new(manager: &RoomManager, player: Arc<P>, room_id: &str, user_id: &str) -> Self {
        Self::with_config(manager, player, room_id, user_id, SyncConfig::default())
    }

    pub fn with_config(
        manager: &RoomManager,
        player: Arc<P>,
        room_id: &str,
        user_id: &str,
        config: SyncConfig,
    ) -> Self {
        Self {
            manager: manager.clone(),
            player,
            config,
            room_id: room_id.to_string(),
            user_id: user_id.to_string(),
            state: Default::default(),
            dragging: Default::default(),
            last_sync: Default::default(),
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state.load()
    }

    /// Drives the reconciliation until the room watcher closes.
    /// Remote changes are applied as they arrive; the host heartbeat runs on
    /// a fixed interval in between.
    pub async fn run(&self, mut watcher: watch::Receiver<Option<Room>>) {
        let mut heartbeat = tokio::time::interval(self.config.heartbeat_interval);
        heartbeat.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                changed = watcher.changed() => {
                    if changed.is_err() {
                        break;
                    }

                    let Some(room) = watcher.borrow().clone() else {
                        break;
                    };

                    self.apply_remote(&room);
                }
                _ = heartbeat.tick() => {
                    let Some(room) = watcher.borrow().clone() else {
                        break;
                    };

                    self.heartbeat(&room).await;
                }
            }
        }
    }

    /// Applies a new version of the room document to the local player
    pub fn apply_remote(&self, room: &Room) {
        if room.current_video.is_none() {
            self.state.store(PlaybackState::NoVideo);
            return;
        }

        if room.is_playing {
            self.player.play();
            self.set_state_unless_buffering(PlaybackState::Playing);
        } else {
            self.player.pause();
            self.set_state_unless_buffering(PlaybackState::Paused);
        }

        if self.dragging.load() || self.in_cooldown() {
            return;
        }

        let drift = (self.player.current_time() - room.current_time).abs();

        if drift > self.config.guest_drift_threshold {
            self.player.seek(room.current_time);
            self.mark_synced();
        }
    }

    /// The host's polling heartbeat. Pushes the player's position to the
    /// shared document when it has drifted, keeping the shared clock moving.
    pub async fn heartbeat(&self, room: &Room) {
        if !self.is_host(room) || self.dragging.load() || room.current_video.is_none() {
            return;
        }

        let player_time = self.player.current_time();
        let drift = (player_time - room.current_time).abs();

        if drift > self.config.host_drift_threshold {
            if let Err(err) = self
                .manager
                .seek(&self.room_id, &self.user_id, player_time)
                .await
            {
                warn!("Heartbeat seek failed: {}", err);
            }
        }
    }

    /// Reacts to an event reported by the local player
    pub async fn handle_player_event(&self, room: &Room, event: PlayerEvent) {
        match event {
            PlayerEvent::Buffering => {
                self.state.store(PlaybackState::Buffering);
            }
            PlayerEvent::Playing => {
                self.state.store(PlaybackState::Playing);

                if self.is_host(room) && !room.is_playing {
                    self.push(self.manager.play(&self.room_id, &self.user_id).await);
                }
            }
            PlayerEvent::Paused => {
                self.state.store(PlaybackState::Paused);

                if self.is_host(room) && room.is_playing {
                    self.push(self.manager.pause(&self.room_id, &self.user_id).await);
                }
            }
            PlayerEvent::Ended => {
                // Anyone's player can report the end, but the skip only goes
                // through if this member is permitted to skip
                match self.manager.skip(&self.room_id, &self.user_id).await {
                    Ok(()) | Err(RoomError::NotAllowed) => {}
                    Err(err) => warn!("Skip at end of video failed: {}", err),
                }
            }
        }
    }

    /// Marks the start of a seek drag, suspending automatic sync
    pub fn begin_seek(&self) {
        self.dragging.store(true);
    }

    /// Commits a finished seek drag. Hosts push the new time to the shared
    /// document; for guests the seek stays local and will be overwritten by
    /// the next sync.
    pub async fn commit_seek(&self, room: &Room, time: f32) {
        self.player.seek(time);

        if self.is_host(room) {
            self.push(self.manager.seek(&self.room_id, &self.user_id, time).await);
        }

        self.mark_synced();
        self.dragging.store(false);
    }

    fn is_host(&self, room: &Room) -> bool {
        room.member(&self.user_id).map(|m| m.is_host).unwrap_or(false)
    }

    fn in_cooldown(&self) -> bool {
        self.last_sync
            .lock()
            .map(|at| at.elapsed() < self.config.resync_cooldown)
            .unwrap_or(false)
    }

    fn mark_synced(&self) {
        *self.last_sync.lock() = Some(Instant::now());
    }

    fn set_state_unless_buffering(&self, state: PlaybackState) {
        if self.state.load() != PlaybackState::Buffering {
            self.state.store(state);
        }
    }

    fn push(&self, result: Result<(), RoomError>) {
        if let Err(err) = result {
            warn!("Failed to push playback update: {}", err);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{Collab, MemoryStore, NewVideo};

    /// A scriptable player for driving the reconciliation in tests
    #[derive(Default)]
    struct MockPlayer {
        time: AtomicCell<f32>,
        playing: AtomicCell<bool>,
        seeks: Mutex<Vec<f32>>,
    }

    impl MediaPlayer for MockPlayer {
        fn current_time(&self) -> f32 {
            self.time.load()
        }

        fn seek(&self, time: f32) {
            self.time.store(time);
            self.seeks.lock().push(time);
        }

        fn play(&self) {
            self.playing.store(true);
        }

        fn pause(&self) {
            self.playing.store(false);
        }
    }

    fn video(id: &str) -> NewVideo {
        NewVideo {
            id: id.to_string(),
            title: format!("video {}", id),
            thumbnail: format!("https://example.com/{}.jpg", id),
        }
    }

    async fn room_with_video(collab: &Collab) -> (String, String, String) {
        let (room, host) = collab.rooms.create_room("movies", "john").await.unwrap();
        let (_, guest) = collab.rooms.join_room(&room.id, "mary").await.unwrap();

        collab
            .rooms
            .add_video(&room.id, &host.id, video("a"))
            .await
            .unwrap();

        (room.id, host.id, guest.id)
    }

    fn sync(
        collab: &Collab,
        player: &Arc<MockPlayer>,
        room_id: &str,
        user_id: &str,
    ) -> PlaybackSync<MockPlayer> {
        PlaybackSync::new(&collab.rooms, player.clone(), room_id, user_id)
    }

    #[tokio::test]
    async fn the_host_heartbeat_pushes_drifted_time() {
        let collab = Collab::new(MemoryStore::new());
        let (room_id, host_id, _) = room_with_video(&collab).await;

        let player = Arc::new(MockPlayer::default());
        let sync = sync(&collab, &player, &room_id, &host_id);

        // Small drift is left alone
        player.time.store(0.5);
        let room = collab.rooms.room_by_id(&room_id).await.unwrap();
        sync.heartbeat(&room).await;
        assert_eq!(
            collab.rooms.room_by_id(&room_id).await.unwrap().current_time,
            0.
        );

        // Large drift is pushed to the shared document
        player.time.store(12.);
        sync.heartbeat(&room).await;
        assert_eq!(
            collab.rooms.room_by_id(&room_id).await.unwrap().current_time,
            12.
        );
    }

    #[tokio::test]
    async fn guests_never_push_from_the_heartbeat() {
        let collab = Collab::new(MemoryStore::new());
        let (room_id, _, guest_id) = room_with_video(&collab).await;

        let player = Arc::new(MockPlayer::default());
        let sync = sync(&collab, &player, &room_id, &guest_id);

        player.time.store(30.);
        let room = collab.rooms.room_by_id(&room_id).await.unwrap();
        sync.heartbeat(&room).await;

        assert_eq!(
            collab.rooms.room_by_id(&room_id).await.unwrap().current_time,
            0.
        );
    }

    #[tokio::test]
    async fn remote_drift_beyond_the_threshold_forces_a_local_seek() {
        let collab = Collab::new(MemoryStore::new());
        let (room_id, host_id, guest_id) = room_with_video(&collab).await;

        let player = Arc::new(MockPlayer::default());
        let sync = sync(&collab, &player, &room_id, &guest_id);

        collab.rooms.seek(&room_id, &host_id, 20.).await.unwrap();
        let room = collab.rooms.room_by_id(&room_id).await.unwrap();

        sync.apply_remote(&room);
        assert_eq!(player.seeks.lock().as_slice(), &[20.]);

        // Within the threshold nothing happens
        player.time.store(20.5);
        collab.rooms.seek(&room_id, &host_id, 21.).await.unwrap();
        let room = collab.rooms.room_by_id(&room_id).await.unwrap();

        // Cooldown has to pass before the next correction is considered
        tokio::time::sleep(Duration::from_millis(1100)).await;
        sync.apply_remote(&room);
        assert_eq!(player.seeks.lock().len(), 1);
    }

    #[tokio::test]
    async fn corrections_are_suppressed_during_the_cooldown() {
        let collab = Collab::new(MemoryStore::new());
        let (room_id, host_id, guest_id) = room_with_video(&collab).await;

        let player = Arc::new(MockPlayer::default());
        let sync = sync(&collab, &player, &room_id, &guest_id);

        collab.rooms.seek(&room_id, &host_id, 20.).await.unwrap();
        let room = collab.rooms.room_by_id(&room_id).await.unwrap();
        sync.apply_remote(&room);

        // A second large correction arrives immediately after
        player.time.store(0.);
        collab.rooms.seek(&room_id, &host_id, 60.).await.unwrap();
        let room = collab.rooms.room_by_id(&room_id).await.unwrap();
        sync.apply_remote(&room);

        assert_eq!(player.seeks.lock().len(), 1);
    }

    #[tokio::test]
    async fn dragging_suspends_sync_until_committed() {
        let collab = Collab::new(MemoryStore::new());
        let (room_id, host_id, guest_id) = room_with_video(&collab).await;

        let player = Arc::new(MockPlayer::default());
        let sync = sync(&collab, &player, &room_id, &guest_id);

        sync.begin_seek();

        collab.rooms.seek(&room_id, &host_id, 45.).await.unwrap();
        let room = collab.rooms.room_by_id(&room_id).await.unwrap();
        sync.apply_remote(&room);

        // No correction while the drag is in progress
        assert!(player.seeks.lock().is_empty());

        sync.commit_seek(&room, 10.).await;
        assert_eq!(player.seeks.lock().as_slice(), &[10.]);

        // A guest commit stays local
        assert_eq!(
            collab.rooms.room_by_id(&room_id).await.unwrap().current_time,
            45.
        );
    }

    #[tokio::test]
    async fn a_host_commit_is_pushed_to_the_shared_document() {
        let collab = Collab::new(MemoryStore::new());
        let (room_id, host_id, _) = room_with_video(&collab).await;

        let player = Arc::new(MockPlayer::default());
        let sync = sync(&collab, &player, &room_id, &host_id);

        sync.begin_seek();
        let room = collab.rooms.room_by_id(&room_id).await.unwrap();
        sync.commit_seek(&room, 90.).await;

        assert_eq!(
            collab.rooms.room_by_id(&room_id).await.unwrap().current_time,
            90.
        );
    }

    #[tokio::test]
    async fn remote_playback_flags_drive_the_local_player() {
        let collab = Collab::new(MemoryStore::new());
        let (room_id, host_id, guest_id) = room_with_video(&collab).await;

        let player = Arc::new(MockPlayer::default());
        let sync = sync(&collab, &player, &room_id, &guest_id);

        collab.rooms.play(&room_id, &host_id).await.unwrap();
        let room = collab.rooms.room_by_id(&room_id).await.unwrap();
        sync.apply_remote(&room);

        assert!(player.playing.load());
        assert_eq!(sync.state(), PlaybackState::Playing);

        collab.rooms.pause(&room_id, &host_id).await.unwrap();
        let room = collab.rooms.room_by_id(&room_id).await.unwrap();
        sync.apply_remote(&room);

        assert!(!player.playing.load());
        assert_eq!(sync.state(), PlaybackState::Paused);
    }

    #[tokio::test]
    async fn an_ended_video_skips_only_when_permitted() {
        let collab = Collab::new(MemoryStore::new());
        let (room_id, host_id, guest_id) = room_with_video(&collab).await;

        collab
            .rooms
            .add_video(&room_id, &host_id, video("b"))
            .await
            .unwrap();

        // The guest's skip is rejected by permissions
        let player = Arc::new(MockPlayer::default());
        let guest_sync = sync(&collab, &player, &room_id, &guest_id);

        let room = collab.rooms.room_by_id(&room_id).await.unwrap();
        guest_sync.handle_player_event(&room, PlayerEvent::Ended).await;

        let state = collab.rooms.room_by_id(&room_id).await.unwrap();
        assert_eq!(state.current_video.as_ref().unwrap().id, "a");

        // The host's goes through
        let host_sync = sync(&collab, &player, &room_id, &host_id);
        host_sync.handle_player_event(&room, PlayerEvent::Ended).await;

        let state = collab.rooms.room_by_id(&room_id).await.unwrap();
        assert_eq!(state.current_video.as_ref().unwrap().id, "b");
    }

    #[tokio::test]
    async fn an_empty_room_has_no_video_state() {
        let collab = Collab::new(MemoryStore::new());
        let (room, host) = collab.rooms.create_room("movies", "john").await.unwrap();

        let player = Arc::new(MockPlayer::default());
        let sync = sync(&collab, &player, &room.id, &host.id);

        let state = collab.rooms.room_by_id(&room.id).await.unwrap();
        sync.apply_remote(&state);

        assert_eq!(sync.state(), PlaybackState::NoVideo);
    }
}
