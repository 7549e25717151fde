use crate::model::EntryId;
use crate::playlist::Playlist;
use std::collections::HashMap;
use std::time::{Duration, Instant};

pub const BACKGROUND_VOLUME: f32 = 0.20;
pub const FOREGROUND_VOLUME: f32 = 1.0;
pub const FADE_STEPS: u32 = 10;
pub const FADE_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Copy)]
struct Fade {
    target: f32,
    step: f32,
    remaining: u32,
    next_at: Instant,
}

/// Per-entry background mode and the volume ramps that move between modes.
#[derive(Debug, Default)]
pub struct FadeEngine {
    background: HashMap<EntryId, bool>,
    fades: HashMap<EntryId, Fade>,
}

impl FadeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_background(&self, id: EntryId) -> bool {
        self.background.get(&id).copied().unwrap_or(false)
    }

    pub fn is_fading(&self, id: EntryId) -> bool {
        self.fades.contains_key(&id)
    }

    pub fn has_active_fades(&self) -> bool {
        !self.fades.is_empty()
    }

    /// Flips background mode and starts a ramp from `current_volume`.
    /// A ramp already running for the entry is replaced.
    pub fn toggle(&mut self, id: EntryId, current_volume: f32, now: Instant) -> bool {
        let background = !self.is_background(id);
        self.background.insert(id, background);

        let target = if background {
            BACKGROUND_VOLUME
        } else {
            FOREGROUND_VOLUME
        };
        let replaced = self.fades.insert(
            id,
            Fade {
                target,
                step: (target - current_volume) / FADE_STEPS as f32,
                remaining: FADE_STEPS,
                next_at: now + FADE_INTERVAL,
            },
        );
        if replaced.is_some() {
            log::debug!("cancelled in-flight fade for {id}");
        }
        background
    }

    /// Applies every step due at `now`. Returns whether any volume changed.
    pub fn advance(&mut self, now: Instant, playlist: &mut Playlist) -> bool {
        let mut changed = false;
        self.fades.retain(|id, fade| {
            let Some(index) = playlist.index_of(*id) else {
                return false;
            };
            let Some(entry) = playlist.get_mut(index) else {
                return false;
            };

            while fade.remaining > 0 && fade.next_at <= now {
                fade.remaining -= 1;
                fade.next_at += FADE_INTERVAL;
                let volume = if fade.remaining == 0 {
                    fade.target
                } else {
                    entry.handle.volume() + fade.step
                };
                entry.handle.set_volume(volume);
                changed = true;
            }
            fade.remaining > 0
        });
        changed
    }

    pub fn forget(&mut self, id: EntryId) {
        self.background.remove(&id);
        self.fades.remove(&id);
    }

    pub fn clear(&mut self) {
        self.background.clear();
        self.fades.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{NullBackend, PlaybackBackend};
    use crate::model::FileItem;
    use crate::playlist::MediaEntry;
    use std::path::Path;

    fn single_entry() -> (Playlist, EntryId) {
        let mut playlist = Playlist::new();
        let file = FileItem::from_path(Path::new("song.mp3"));
        let handle = NullBackend.create(&file.source);
        let id = playlist.allocate_id();
        playlist.append(MediaEntry::new(id, file, handle));
        (playlist, id)
    }

    fn volume(playlist: &Playlist) -> f32 {
        playlist.get(0).expect("entry").handle.volume()
    }

    #[test]
    fn fade_to_background_lands_on_target_after_ten_steps() {
        let (mut playlist, id) = single_entry();
        let mut engine = FadeEngine::new();
        let start = Instant::now();

        assert!(engine.toggle(id, volume(&playlist), start));
        for step in 1..FADE_STEPS {
            engine.advance(start + FADE_INTERVAL * step, &mut playlist);
            assert!(engine.is_fading(id));
        }
        assert!(volume(&playlist) > BACKGROUND_VOLUME);

        engine.advance(start + FADE_INTERVAL * FADE_STEPS, &mut playlist);
        assert_eq!(volume(&playlist), BACKGROUND_VOLUME);
        assert!(!engine.is_fading(id));
    }

    #[test]
    fn late_tick_catches_up_every_step() {
        let (mut playlist, id) = single_entry();
        let mut engine = FadeEngine::new();
        let start = Instant::now();

        engine.toggle(id, volume(&playlist), start);
        assert!(!engine.advance(start, &mut playlist));
        assert!(engine.advance(start + Duration::from_secs(2), &mut playlist));
        assert_eq!(volume(&playlist), BACKGROUND_VOLUME);
    }

    #[test]
    fn second_toggle_returns_to_full_volume() {
        let (mut playlist, id) = single_entry();
        let mut engine = FadeEngine::new();
        let start = Instant::now();

        engine.toggle(id, volume(&playlist), start);
        engine.advance(start + Duration::from_secs(1), &mut playlist);

        let later = start + Duration::from_secs(2);
        assert!(!engine.toggle(id, volume(&playlist), later));
        engine.advance(later + Duration::from_secs(1), &mut playlist);
        assert_eq!(volume(&playlist), FOREGROUND_VOLUME);
        assert!(!engine.is_background(id));
    }

    #[test]
    fn toggle_mid_fade_replaces_running_ramp() {
        let (mut playlist, id) = single_entry();
        let mut engine = FadeEngine::new();
        let start = Instant::now();

        engine.toggle(id, volume(&playlist), start);
        engine.advance(start + FADE_INTERVAL * 3, &mut playlist);
        let midway = volume(&playlist);
        assert!(midway < FOREGROUND_VOLUME && midway > BACKGROUND_VOLUME);

        let restart = start + FADE_INTERVAL * 3;
        engine.toggle(id, midway, restart);
        engine.advance(restart + FADE_INTERVAL * FADE_STEPS, &mut playlist);
        assert_eq!(volume(&playlist), FOREGROUND_VOLUME);
        assert!(!engine.has_active_fades());
    }

    #[test]
    fn removed_entry_drops_its_fade() {
        let (mut playlist, id) = single_entry();
        let mut engine = FadeEngine::new();
        let start = Instant::now();

        engine.toggle(id, 1.0, start);
        playlist.remove_at(0);
        assert!(!engine.advance(start + FADE_INTERVAL, &mut playlist));
        assert!(!engine.is_fading(id));
    }
}
