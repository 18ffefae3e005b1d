//! Pure evaluation of what a member may do, from their role and the room settings.
//!
//! These checks gate every shared mutation, but only on the mutation path.
//! The store itself accepts any write, so this is the single authority layer.

use crate::{RoomSettings, User, VideoInfo};

/// Whether the member may play or pause the current video
pub fn can_play_pause(member: &User, settings: &RoomSettings) -> bool {
    member.is_host || settings.allow_all_play_pause
}

/// Whether the member may skip to the next queued video
pub fn can_skip(member: &User, settings: &RoomSettings) -> bool {
    member.is_host || settings.allow_all_skip
}

/// Whether the member may delete videos in general
pub fn can_delete(member: &User, settings: &RoomSettings) -> bool {
    member.is_host || settings.allow_all_delete
}

/// Whether the member may reorder the queue
pub fn can_reorder(member: &User, settings: &RoomSettings) -> bool {
    member.is_host || settings.allow_all_queue_reorder
}

/// Whether the member may remove a specific video.
/// Members can always remove videos they added themselves.
pub fn can_remove_video(member: &User, settings: &RoomSettings, video: &VideoInfo) -> bool {
    can_delete(member, settings) || video.added_by == member.id
}

/// Whether the member may promote a queued video directly to the current one.
/// This is host-only regardless of settings.
pub fn can_play_from_queue(member: &User) -> bool {
    member.is_host
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::util::timestamp_now;

    fn member(is_host: bool) -> User {
        User {
            id: "mary".to_string(),
            name: "Mary".to_string(),
            is_host,
            joined_at: timestamp_now(),
        }
    }

    fn video(added_by: &str) -> VideoInfo {
        VideoInfo {
            id: "v".to_string(),
            title: "a video".to_string(),
            thumbnail: "https://example.com/v.jpg".to_string(),
            added_by: added_by.to_string(),
            added_at: timestamp_now(),
        }
    }

    #[test]
    fn host_is_always_permitted() {
        let host = member(true);
        let settings = RoomSettings::default();

        assert!(can_play_pause(&host, &settings));
        assert!(can_skip(&host, &settings));
        assert!(can_delete(&host, &settings));
        assert!(can_reorder(&host, &settings));
        assert!(can_play_from_queue(&host));
    }

    #[test]
    fn guests_follow_the_settings() {
        let guest = member(false);

        let closed = RoomSettings::default();
        assert!(!can_play_pause(&guest, &closed));
        assert!(!can_skip(&guest, &closed));

        let open = RoomSettings {
            allow_all_play_pause: true,
            allow_all_skip: true,
            allow_all_delete: true,
            allow_all_queue_reorder: true,
        };
        assert!(can_play_pause(&guest, &open));
        assert!(can_skip(&guest, &open));
        assert!(can_delete(&guest, &open));
        assert!(can_reorder(&guest, &open));

        // Promoting from the queue stays host-only
        assert!(!can_play_from_queue(&guest));
    }

    #[test]
    fn adders_may_remove_their_own_videos() {
        let guest = member(false);
        let settings = RoomSettings::default();

        assert!(can_remove_video(&guest, &settings, &video("mary")));
        assert!(!can_remove_video(&guest, &settings, &video("john")));
    }
}
