//! Transport state machine over a [`Playlist`].
//!
//! Only one entry carries the playing marker at a time. Starting an entry
//! pauses every other handle first, so exclusivity is enforced by explicit
//! calls rather than locking. `pause` leaves the marker in place while `stop`
//! and end-of-media clear it; a paused-but-marked entry is what the UI shows
//! as paused.

use crate::model::EntryId;
use crate::playlist::Playlist;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Playing(usize),
    Paused(usize),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlaybackController {
    single_play: bool,
    loop_mode: bool,
}

impl PlaybackController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single_play(&self) -> bool {
        self.single_play
    }

    pub fn loop_mode(&self) -> bool {
        self.loop_mode
    }

    pub fn state(&self, playlist: &Playlist) -> PlaybackState {
        match playlist.marked_index() {
            None => PlaybackState::Idle,
            Some(index) => match playlist.get(index) {
                Some(entry) if entry.handle.is_paused() => PlaybackState::Paused(index),
                _ => PlaybackState::Playing(index),
            },
        }
    }

    pub fn play(&self, playlist: &mut Playlist, index: usize) -> bool {
        if index >= playlist.len() {
            return false;
        }
        pause_all(playlist);

        let loop_mode = self.loop_mode;
        let Some(entry) = playlist.get_mut(index) else {
            return false;
        };
        entry.handle.set_looping(loop_mode);
        if let Err(err) = entry.handle.play() {
            log::warn!("{} failed to start: {err:#}", entry.display_name());
        }
        entry.playing = true;
        log::debug!("playing {} at index {index}", entry.display_name());
        true
    }

    pub fn pause(&self, playlist: &mut Playlist, index: usize) -> bool {
        let Some(entry) = playlist.get_mut(index) else {
            return false;
        };
        entry.handle.pause();
        true
    }

    pub fn stop(&self, playlist: &mut Playlist, index: usize) -> bool {
        let Some(entry) = playlist.get_mut(index) else {
            return false;
        };
        entry.handle.pause();
        entry.handle.rewind();
        entry.playing = false;
        true
    }

    /// A handle started on its own, e.g. resumed outside the controller.
    pub fn handle_started(&self, playlist: &mut Playlist, id: EntryId) -> bool {
        let Some(index) = playlist.index_of(id) else {
            return false;
        };
        if playlist.get(index).is_some_and(|entry| entry.handle.is_paused()) {
            log::debug!("ignoring stale start from {id}");
            return false;
        }

        let loop_mode = self.loop_mode;
        for (position, entry) in playlist.iter_mut().enumerate() {
            entry.playing = position == index;
            if position == index {
                entry.handle.set_looping(loop_mode);
            }
        }
        true
    }

    /// End of media. Returns the index that auto-advance started, if any.
    pub fn handle_ended(&self, playlist: &mut Playlist, id: EntryId) -> Option<usize> {
        let index = playlist.index_of(id)?;
        if let Some(entry) = playlist.get_mut(index) {
            entry.playing = false;
        }

        if self.single_play {
            return None;
        }

        let next = index + 1;
        if next < playlist.len() && self.play(playlist, next) {
            Some(next)
        } else {
            log::debug!("reached end of playlist");
            None
        }
    }

    pub fn toggle_single_play(&mut self) -> bool {
        self.single_play = !self.single_play;
        self.single_play
    }

    pub fn toggle_loop(&mut self, playlist: &mut Playlist) -> bool {
        self.loop_mode = !self.loop_mode;
        if let Some(index) = playlist.marked_index()
            && let Some(entry) = playlist.get_mut(index)
        {
            entry.handle.set_looping(self.loop_mode);
        }
        self.loop_mode
    }
}

fn pause_all(playlist: &mut Playlist) {
    for entry in playlist.iter_mut() {
        entry.handle.pause();
        entry.playing = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{NullBackend, PlaybackBackend};
    use crate::model::FileItem;
    use crate::playlist::MediaEntry;
    use proptest::prop_assert;
    use std::path::Path;
    use std::time::Duration;

    fn playlist_of(names: &[&str]) -> Playlist {
        let mut playlist = Playlist::new();
        for name in names {
            let file = FileItem::from_path(Path::new(name));
            let handle = NullBackend.create(&file.source);
            let id = playlist.allocate_id();
            playlist.append(MediaEntry::new(id, file, handle));
        }
        playlist
    }

    fn id_at(playlist: &Playlist, index: usize) -> EntryId {
        playlist.get(index).map(MediaEntry::id).expect("entry")
    }

    fn marked_count(playlist: &Playlist) -> usize {
        playlist.iter().filter(|entry| entry.playing).count()
    }

    #[test]
    fn play_pauses_every_other_entry() {
        let mut playlist = playlist_of(&["a.mp3", "b.mp3", "c.mp3"]);
        let controller = PlaybackController::new();

        controller.play(&mut playlist, 0);
        controller.play(&mut playlist, 2);

        assert_eq!(controller.state(&playlist), PlaybackState::Playing(2));
        assert_eq!(marked_count(&playlist), 1);
        for index in [0, 1] {
            assert!(playlist.get(index).expect("entry").handle.is_paused());
        }
    }

    #[test]
    fn play_out_of_range_is_ignored() {
        let mut playlist = playlist_of(&["a.mp3"]);
        let controller = PlaybackController::new();
        assert!(!controller.play(&mut playlist, 3));
        assert_eq!(controller.state(&playlist), PlaybackState::Idle);
    }

    #[test]
    fn pause_keeps_marker() {
        let mut playlist = playlist_of(&["a.mp3", "b.mp3"]);
        let controller = PlaybackController::new();

        controller.play(&mut playlist, 1);
        controller.pause(&mut playlist, 1);

        assert!(playlist.get(1).expect("entry").playing);
        assert_eq!(controller.state(&playlist), PlaybackState::Paused(1));
    }

    #[test]
    fn stop_rewinds_and_clears_marker() {
        let mut playlist = playlist_of(&["a.mp3", "b.mp3"]);
        let controller = PlaybackController::new();

        controller.play(&mut playlist, 0);
        playlist
            .get_mut(0)
            .expect("entry")
            .handle
            .seek_to(Duration::from_secs(30))
            .expect("seek");
        controller.stop(&mut playlist, 0);

        let entry = playlist.get(0).expect("entry");
        assert_eq!(entry.handle.position(), Duration::ZERO);
        assert!(entry.handle.is_paused());
        assert!(!entry.playing);
        assert_eq!(controller.state(&playlist), PlaybackState::Idle);
    }

    #[test]
    fn ended_advances_to_next_entry() {
        let mut playlist = playlist_of(&["a.mp3", "b.mp3", "c.mp3"]);
        let controller = PlaybackController::new();

        controller.play(&mut playlist, 0);
        let a = id_at(&playlist, 0);
        assert_eq!(controller.handle_ended(&mut playlist, a), Some(1));
        assert_eq!(controller.state(&playlist), PlaybackState::Playing(1));
    }

    #[test]
    fn ended_on_last_entry_goes_idle() {
        let mut playlist = playlist_of(&["a.mp3", "b.mp3", "c.mp3"]);
        let controller = PlaybackController::new();

        controller.play(&mut playlist, 2);
        playlist.get_mut(2).expect("entry").handle.pause();
        let c = id_at(&playlist, 2);
        assert_eq!(controller.handle_ended(&mut playlist, c), None);
        assert_eq!(controller.state(&playlist), PlaybackState::Idle);
    }

    #[test]
    fn single_play_suppresses_advance() {
        let mut playlist = playlist_of(&["a.mp3", "b.mp3", "c.mp3"]);
        let mut controller = PlaybackController::new();
        assert!(controller.toggle_single_play());

        controller.play(&mut playlist, 0);
        playlist.get_mut(0).expect("entry").handle.pause();
        let a = id_at(&playlist, 0);
        assert_eq!(controller.handle_ended(&mut playlist, a), None);
        assert_eq!(controller.state(&playlist), PlaybackState::Idle);
        assert!(playlist.iter().all(|entry| entry.handle.is_paused()));
    }

    #[test]
    fn toggle_loop_reaches_marked_entry_only() {
        let mut playlist = playlist_of(&["a.mp3", "b.mp3"]);
        let mut controller = PlaybackController::new();

        controller.play(&mut playlist, 0);
        assert!(controller.toggle_loop(&mut playlist));
        assert!(playlist.get(0).expect("entry").handle.looping());
        assert!(!playlist.get(1).expect("entry").handle.looping());

        assert!(!controller.toggle_loop(&mut playlist));
        assert!(!playlist.get(0).expect("entry").handle.looping());
    }

    #[test]
    fn toggle_loop_while_idle_applies_on_next_play() {
        let mut playlist = playlist_of(&["a.mp3"]);
        let mut controller = PlaybackController::new();

        controller.toggle_loop(&mut playlist);
        assert!(!playlist.get(0).expect("entry").handle.looping());

        controller.play(&mut playlist, 0);
        assert!(playlist.get(0).expect("entry").handle.looping());
    }

    #[test]
    fn external_start_takes_the_marker() {
        let mut playlist = playlist_of(&["a.mp3", "b.mp3"]);
        let mut controller = PlaybackController::new();
        controller.toggle_loop(&mut playlist);
        controller.play(&mut playlist, 0);

        playlist.get_mut(1).expect("entry").handle.play().expect("play");
        let b = id_at(&playlist, 1);
        assert!(controller.handle_started(&mut playlist, b));

        assert!(!playlist.get(0).expect("entry").playing);
        assert!(playlist.get(1).expect("entry").playing);
        assert!(playlist.get(1).expect("entry").handle.looping());
    }

    #[test]
    fn stale_start_is_ignored() {
        let mut playlist = playlist_of(&["a.mp3", "b.mp3"]);
        let controller = PlaybackController::new();
        controller.play(&mut playlist, 0);
        controller.play(&mut playlist, 1);

        let a = id_at(&playlist, 0);
        assert!(!controller.handle_started(&mut playlist, a));
        assert_eq!(controller.state(&playlist), PlaybackState::Playing(1));
    }

    proptest::proptest! {
        #[test]
        fn at_most_one_marker_after_random_ops(
            ops in proptest::collection::vec((0u8..7, 0usize..6), 1..200),
        ) {
            let mut playlist = playlist_of(&["a.mp3", "b.mp3", "c.mp3", "d.mp3", "e.mp3"]);
            let mut controller = PlaybackController::new();

            for (op, index) in ops {
                match op {
                    0 => {
                        controller.play(&mut playlist, index);
                        if index < playlist.len() {
                            let others_paused = playlist
                                .iter()
                                .enumerate()
                                .filter(|(position, _)| *position != index)
                                .all(|(_, entry)| entry.handle.is_paused());
                            prop_assert!(others_paused);
                        }
                    }
                    1 => {
                        controller.pause(&mut playlist, index);
                    }
                    2 => {
                        controller.stop(&mut playlist, index);
                    }
                    3 => {
                        if let Some(id) = playlist.get(index).map(MediaEntry::id) {
                            controller.handle_ended(&mut playlist, id);
                        }
                    }
                    4 => {
                        if let Some(id) = playlist.get(index).map(MediaEntry::id) {
                            controller.handle_started(&mut playlist, id);
                        }
                    }
                    5 => {
                        controller.toggle_single_play();
                    }
                    _ => {
                        controller.toggle_loop(&mut playlist);
                    }
                }
                prop_assert!(marked_count(&playlist) <= 1);
            }
        }
    }
}
