use crate::audio::{HandleEvent, PlaybackBackend};
use crate::error::{PlayerError, PlayerResult};
use crate::fade::FadeEngine;
use crate::folder::{FolderAccess, FolderSystem};
use crate::handle_store::HandleStore;
use crate::loader;
use crate::model::{EntryId, FileItem, FolderHandle, Theme};
use crate::permission;
use crate::playback::{PlaybackController, PlaybackState};
use crate::playlist::Playlist;
use std::path::PathBuf;
use std::time::{Duration, Instant};

pub const STATUS_FOLDER_LOADED: &str = "Folder authorized and media loaded";
pub const STATUS_FOLDER_FAILED: &str = "Folder selection failed";
pub const STATUS_FOLDER_RESTORED: &str = "Folder restored; add files or open another folder";
pub const STATUS_CHOOSE_FOLDER: &str = "Choose a folder with :open <path>";

const SCRUB_STEP: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerEvent {
    Play(usize),
    Pause(usize),
    Stop(usize),
    Scrub { index: usize, forward: bool },
    MoveUp(usize),
    MoveDown(usize),
    Delete(usize),
    ToggleFade(usize),
    ToggleSinglePlay,
    ToggleLoop,
    ToggleTheme,
    HandleStarted(EntryId),
    HandleEnded(EntryId),
    Tick(Instant),
}

/// Everything one player window owns: the playlist, transport flags, fades,
/// and the collaborators that reach outside the process.
pub struct PlayerSession {
    pub playlist: Playlist,
    controller: PlaybackController,
    fades: FadeEngine,
    backend: Box<dyn PlaybackBackend>,
    folders: Box<dyn FolderSystem>,
    store: Box<dyn HandleStore>,
    pub folder: Option<FolderHandle>,
    pub selected: usize,
    pub theme: Theme,
    pub dirty: bool,
    pub status: String,
}

impl PlayerSession {
    pub fn new(
        backend: Box<dyn PlaybackBackend>,
        folders: Box<dyn FolderSystem>,
        store: Box<dyn HandleStore>,
    ) -> Self {
        Self {
            playlist: Playlist::new(),
            controller: PlaybackController::new(),
            fades: FadeEngine::new(),
            backend,
            folders,
            store,
            folder: None,
            selected: 0,
            theme: Theme::default(),
            dirty: true,
            status: String::from("Ready"),
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.controller.state(&self.playlist)
    }

    pub fn single_play(&self) -> bool {
        self.controller.single_play()
    }

    pub fn loop_mode(&self) -> bool {
        self.controller.loop_mode()
    }

    pub fn is_background(&self, index: usize) -> bool {
        self.playlist
            .get(index)
            .is_some_and(|entry| self.fades.is_background(entry.id()))
    }

    pub fn output_name(&self) -> &str {
        self.backend.output_name()
    }

    /// Startup: reload the last authorized folder if it is still readable.
    pub fn restore_last_folder(&mut self) -> bool {
        match self.try_restore() {
            Ok(Some(count)) => {
                log::info!("restored folder with {count} entries");
                self.set_status(STATUS_FOLDER_RESTORED);
                true
            }
            Ok(None) => {
                self.set_status(STATUS_CHOOSE_FOLDER);
                false
            }
            Err(err) => {
                log::warn!("folder restore failed: {err}");
                self.set_status(STATUS_CHOOSE_FOLDER);
                false
            }
        }
    }

    fn try_restore(&mut self) -> PlayerResult<Option<usize>> {
        let Some(handle) = self.store.load()? else {
            return Ok(None);
        };
        let mut folder = self.folders.open(&handle);
        if !permission::verify(folder.as_mut()) {
            return Ok(None);
        }
        let count = self.replace_from_folder(folder.as_ref())?;
        self.folder = Some(handle);
        Ok(Some(count))
    }

    /// `None` means the user dismissed the picker.
    pub fn pick_folder(&mut self, picked: Option<FolderHandle>) -> PlayerResult<usize> {
        let result = self.try_pick(picked);
        match &result {
            Ok(_) => self.set_status(STATUS_FOLDER_LOADED),
            Err(err) => {
                log::warn!("folder selection failed: {err}");
                self.set_status(STATUS_FOLDER_FAILED);
            }
        }
        result
    }

    fn try_pick(&mut self, picked: Option<FolderHandle>) -> PlayerResult<usize> {
        let handle = picked.ok_or(PlayerError::UserCancel)?;
        let mut folder = self.folders.open(&handle);
        if !permission::verify(folder.as_mut()) {
            return Err(PlayerError::PermissionDenied {
                path: handle.path.clone(),
            });
        }
        self.store.save(&handle)?;
        let count = self.replace_from_folder(folder.as_ref())?;
        self.folder = Some(handle);
        Ok(count)
    }

    fn replace_from_folder(&mut self, folder: &dyn FolderAccess) -> PlayerResult<usize> {
        let count = loader::load_from_folder(folder, self.backend.as_ref(), &mut self.playlist)?;
        self.fades.clear();
        self.selected = 0;
        self.dirty = true;
        Ok(count)
    }

    pub fn add_files(&mut self, files: Vec<FileItem>) -> usize {
        let count = loader::load_from_files(files, self.backend.as_ref(), &mut self.playlist);
        self.set_status(&format!("Added {count} files"));
        count
    }

    pub fn add_paths(&mut self, paths: &[PathBuf]) -> usize {
        let files = paths
            .iter()
            .map(|path| FileItem::from_path(path))
            .collect();
        self.add_files(files)
    }

    pub fn dispatch(&mut self, event: PlayerEvent) {
        match event {
            PlayerEvent::Play(index) => self.play(index),
            PlayerEvent::Pause(index) => self.pause(index),
            PlayerEvent::Stop(index) => self.stop(index),
            PlayerEvent::Scrub { index, forward } => self.scrub(index, forward),
            PlayerEvent::MoveUp(index) => self.move_up(index),
            PlayerEvent::MoveDown(index) => self.move_down(index),
            PlayerEvent::Delete(index) => self.delete(index),
            PlayerEvent::ToggleFade(index) => self.toggle_fade(index, Instant::now()),
            PlayerEvent::ToggleSinglePlay => self.toggle_single_play(),
            PlayerEvent::ToggleLoop => self.toggle_loop(),
            PlayerEvent::ToggleTheme => {
                self.theme = self.theme.toggled();
                self.dirty = true;
            }
            PlayerEvent::HandleStarted(id) => {
                if self.controller.handle_started(&mut self.playlist, id) {
                    self.dirty = true;
                }
            }
            PlayerEvent::HandleEnded(id) => self.handle_ended(id),
            PlayerEvent::Tick(now) => self.tick(now),
        }
    }

    pub fn play(&mut self, index: usize) {
        if self.controller.play(&mut self.playlist, index) {
            let name = self.entry_name(index);
            self.set_status(&format!("Playing {name}"));
        }
    }

    pub fn pause(&mut self, index: usize) {
        if self.controller.pause(&mut self.playlist, index) {
            self.set_status("Paused");
        }
    }

    pub fn stop(&mut self, index: usize) {
        if self.controller.stop(&mut self.playlist, index) {
            self.set_status("Stopped");
        }
    }

    pub fn scrub(&mut self, index: usize, forward: bool) {
        let Some(entry) = self.playlist.get_mut(index) else {
            return;
        };
        let position = entry.handle.position();
        let target = if forward {
            position.saturating_add(SCRUB_STEP)
        } else {
            position.saturating_sub(SCRUB_STEP)
        };
        if let Err(err) = entry.handle.seek_to(target) {
            self.set_status(&format!("seek error: {err:#}"));
        } else {
            self.dirty = true;
        }
    }

    pub fn move_up(&mut self, index: usize) {
        if self.playlist.move_up(index) {
            self.selected = index - 1;
            self.dirty = true;
        }
    }

    pub fn move_down(&mut self, index: usize) {
        if self.playlist.move_down(index) {
            self.selected = index + 1;
            self.dirty = true;
        }
    }

    pub fn delete(&mut self, index: usize) {
        let Some(entry) = self.playlist.remove_at(index) else {
            return;
        };
        self.fades.forget(entry.id());
        log::debug!("removed {}", entry.display_name());
        if self.selected >= self.playlist.len() {
            self.selected = self.playlist.len().saturating_sub(1);
        }
        self.set_status(&format!("Removed {}", entry.display_name()));
    }

    pub fn toggle_fade(&mut self, index: usize, now: Instant) {
        let Some(entry) = self.playlist.get(index) else {
            return;
        };
        let background = self
            .fades
            .toggle(entry.id(), entry.handle.volume(), now);
        self.set_status(if background {
            "Background on"
        } else {
            "Background off"
        });
    }

    pub fn toggle_single_play(&mut self) {
        let on = self.controller.toggle_single_play();
        self.set_status(if on { "Single play on" } else { "Single play off" });
    }

    pub fn toggle_loop(&mut self) {
        let on = self.controller.toggle_loop(&mut self.playlist);
        self.set_status(if on { "Loop on" } else { "Loop off" });
    }

    fn handle_ended(&mut self, id: EntryId) {
        match self.controller.handle_ended(&mut self.playlist, id) {
            Some(next) => {
                let name = self.entry_name(next);
                self.set_status(&format!("Playing {name}"));
            }
            None => self.dirty = true,
        }
    }

    /// Drains handle notifications and advances fades.
    pub fn tick(&mut self, now: Instant) {
        let mut notifications = Vec::new();
        for entry in self.playlist.iter_mut() {
            for event in entry.handle.poll_events() {
                notifications.push((entry.id(), event));
            }
        }

        for (id, event) in notifications {
            match event {
                HandleEvent::Started => self.dispatch(PlayerEvent::HandleStarted(id)),
                HandleEvent::Ended => self.dispatch(PlayerEvent::HandleEnded(id)),
            }
        }

        if self.fades.advance(now, &mut self.playlist) {
            self.dirty = true;
        }
    }

    pub fn select_next(&mut self) {
        if self.playlist.is_empty() {
            return;
        }
        self.selected = (self.selected + 1).min(self.playlist.len() - 1);
        self.dirty = true;
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
        self.dirty = true;
    }

    fn entry_name(&self, index: usize) -> String {
        self.playlist
            .get(index)
            .map(|entry| entry.display_name().to_string())
            .unwrap_or_default()
    }

    pub fn set_status(&mut self, message: &str) {
        self.status = message.to_string();
        self.dirty = true;
    }
}
