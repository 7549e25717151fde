use crate::audio::Playable;
use crate::model::{EntryId, FileItem, MediaKind, SourceRef};

/// One loaded track together with the play object it exclusively owns.
#[derive(Debug)]
pub struct MediaEntry {
    id: EntryId,
    display_name: String,
    mime: String,
    pub source: SourceRef,
    pub kind: MediaKind,
    pub handle: Box<dyn Playable>,
    pub playing: bool,
}

impl MediaEntry {
    pub fn new(id: EntryId, file: FileItem, mut handle: Box<dyn Playable>) -> Self {
        handle.set_volume(1.0);
        Self {
            id,
            kind: MediaKind::from_mime(&file.mime),
            display_name: file.name,
            mime: file.mime,
            source: file.source,
            handle,
            playing: false,
        }
    }

    pub fn id(&self) -> EntryId {
        self.id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }
}

#[derive(Debug, Default)]
pub struct Playlist {
    entries: Vec<MediaEntry>,
    next_id: u64,
}

impl Playlist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate_id(&mut self) -> EntryId {
        self.next_id += 1;
        EntryId(self.next_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&MediaEntry> {
        self.entries.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut MediaEntry> {
        self.entries.get_mut(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MediaEntry> {
        self.entries.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut MediaEntry> {
        self.entries.iter_mut()
    }

    pub fn index_of(&self, id: EntryId) -> Option<usize> {
        self.entries.iter().position(|entry| entry.id == id)
    }

    pub fn marked_index(&self) -> Option<usize> {
        self.entries.iter().position(|entry| entry.playing)
    }

    pub fn append(&mut self, entry: MediaEntry) {
        self.entries.push(entry);
    }

    /// Swaps in a freshly loaded set of entries. Outgoing handles are paused
    /// before they are dropped.
    pub fn replace_all(&mut self, entries: Vec<MediaEntry>) {
        for entry in &mut self.entries {
            entry.handle.pause();
        }
        self.entries = entries;
    }

    pub fn remove_at(&mut self, index: usize) -> Option<MediaEntry> {
        let entry = self.entries.get_mut(index)?;
        entry.handle.pause();
        Some(self.entries.remove(index))
    }

    pub fn swap(&mut self, index: usize) -> bool {
        let Some(next) = index.checked_add(1).filter(|next| *next < self.entries.len()) else {
            return false;
        };
        self.entries.swap(index, next);
        true
    }

    pub fn move_up(&mut self, index: usize) -> bool {
        if index == 0 {
            return false;
        }
        self.swap(index - 1)
    }

    pub fn move_down(&mut self, index: usize) -> bool {
        self.swap(index)
    }

    pub fn display_index(index: usize) -> String {
        format!("{:02}", index + 1)
    }
}
