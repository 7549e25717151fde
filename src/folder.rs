use crate::error::{PlayerError, PlayerResult};
use crate::model::{
    AccessMode, FileItem, FolderEntry, FolderEntryKind, FolderHandle, PermissionState, SourceRef,
    mime_for_name,
};
use std::cell::Cell;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use walkdir::WalkDir;

/// Capability over one authorized folder.
pub trait FolderAccess {
    fn handle(&self) -> &FolderHandle;
    fn entries(&self) -> PlayerResult<Vec<FolderEntry>>;
    fn open_file(&self, entry: &FolderEntry) -> PlayerResult<FileItem>;
    fn query_permission(&self, mode: AccessMode) -> PermissionState;
    fn request_permission(&mut self, mode: AccessMode) -> PermissionState;
}

/// Turns a stored or freshly picked handle into a usable folder.
pub trait FolderSystem {
    fn open(&self, handle: &FolderHandle) -> Box<dyn FolderAccess>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFolders;

impl FolderSystem for LocalFolders {
    fn open(&self, handle: &FolderHandle) -> Box<dyn FolderAccess> {
        Box::new(LocalFolder::new(handle.clone()))
    }
}

#[derive(Debug, Clone)]
pub struct LocalFolder {
    handle: FolderHandle,
}

impl LocalFolder {
    pub fn new(handle: FolderHandle) -> Self {
        Self { handle }
    }

    fn check_readable(&self) -> PermissionState {
        match fs::read_dir(&self.handle.path) {
            Ok(_) => PermissionState::Granted,
            Err(err) if err.kind() == ErrorKind::PermissionDenied => PermissionState::Denied,
            Err(_) => PermissionState::Prompt,
        }
    }
}

impl FolderAccess for LocalFolder {
    fn handle(&self) -> &FolderHandle {
        &self.handle
    }

    /// Direct children sorted by file name, so reloads are reproducible.
    /// Only a failure to read the folder itself is an error; a child that
    /// cannot be inspected, such as a dangling symlink, is skipped.
    fn entries(&self) -> PlayerResult<Vec<FolderEntry>> {
        let root = &self.handle.path;
        let mut entries = Vec::new();
        for entry in WalkDir::new(root)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) if err.depth() == 0 => return Err(PlayerError::unreadable(root, err)),
                Err(err) => {
                    log::warn!("skipping unreadable entry in {}: {err}", root.display());
                    continue;
                }
            };
            let kind = if entry.file_type().is_dir() {
                FolderEntryKind::Directory
            } else {
                FolderEntryKind::File
            };
            entries.push(FolderEntry {
                name: entry.file_name().to_string_lossy().to_string(),
                kind,
                path: entry.into_path(),
            });
        }
        Ok(entries)
    }

    fn open_file(&self, entry: &FolderEntry) -> PlayerResult<FileItem> {
        let metadata = fs::metadata(&entry.path)
            .map_err(|err| PlayerError::unreadable(entry.path.clone(), err))?;
        if !metadata.is_file() {
            return Err(PlayerError::unreadable(entry.path.clone(), "not a file"));
        }
        Ok(FileItem::from_path(&entry.path))
    }

    fn query_permission(&self, _mode: AccessMode) -> PermissionState {
        self.check_readable()
    }

    fn request_permission(&mut self, _mode: AccessMode) -> PermissionState {
        let state = self.check_readable();
        log::info!(
            "read access to {} requested: {state:?}",
            self.handle.path.display()
        );
        state
    }
}

#[derive(Debug, Clone)]
struct MemoryFile {
    entry: FolderEntry,
    mime: Option<String>,
}

/// In-memory folder with scripted permission answers.
#[derive(Debug, Clone)]
pub struct MemoryFolder {
    handle: FolderHandle,
    files: Vec<MemoryFile>,
    query_answer: PermissionState,
    request_answer: PermissionState,
    queries: Cell<u32>,
    requests: u32,
    unreadable: bool,
}

impl MemoryFolder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            handle: FolderHandle::new(path),
            files: Vec::new(),
            query_answer: PermissionState::Granted,
            request_answer: PermissionState::Granted,
            queries: Cell::new(0),
            requests: 0,
            unreadable: false,
        }
    }

    pub fn with_file(self, name: &str) -> Self {
        self.with_child(name, FolderEntryKind::File, None)
    }

    pub fn with_typed_file(self, name: &str, mime: &str) -> Self {
        self.with_child(name, FolderEntryKind::File, Some(mime.to_string()))
    }

    pub fn with_dir(self, name: &str) -> Self {
        self.with_child(name, FolderEntryKind::Directory, None)
    }

    fn with_child(mut self, name: &str, kind: FolderEntryKind, mime: Option<String>) -> Self {
        let entry = FolderEntry {
            name: name.to_string(),
            path: self.handle.path.join(name),
            kind,
        };
        self.files.push(MemoryFile { entry, mime });
        self
    }

    pub fn with_permission(mut self, query: PermissionState, request: PermissionState) -> Self {
        self.query_answer = query;
        self.request_answer = request;
        self
    }

    pub fn unreadable(mut self) -> Self {
        self.unreadable = true;
        self
    }

    pub fn query_count(&self) -> u32 {
        self.queries.get()
    }

    pub fn request_count(&self) -> u32 {
        self.requests
    }
}

impl FolderAccess for MemoryFolder {
    fn handle(&self) -> &FolderHandle {
        &self.handle
    }

    fn entries(&self) -> PlayerResult<Vec<FolderEntry>> {
        if self.unreadable {
            return Err(PlayerError::unreadable(
                self.handle.path.clone(),
                "folder vanished",
            ));
        }
        Ok(self.files.iter().map(|file| file.entry.clone()).collect())
    }

    fn open_file(&self, entry: &FolderEntry) -> PlayerResult<FileItem> {
        let file = self
            .files
            .iter()
            .find(|file| file.entry == *entry)
            .ok_or_else(|| PlayerError::unreadable(entry.path.clone(), "missing"))?;
        let mime = file
            .mime
            .clone()
            .unwrap_or_else(|| mime_for_name(&entry.name).to_string());
        Ok(FileItem {
            name: entry.name.clone(),
            mime,
            source: SourceRef::new(&entry.path),
        })
    }

    fn query_permission(&self, _mode: AccessMode) -> PermissionState {
        self.queries.set(self.queries.get() + 1);
        self.query_answer
    }

    fn request_permission(&mut self, _mode: AccessMode) -> PermissionState {
        self.requests += 1;
        self.request_answer
    }
}

/// Folder system backed by [`MemoryFolder`]s keyed by path. Unknown paths
/// open as empty folders whose access is denied.
#[derive(Debug, Default, Clone)]
pub struct MemoryFolders {
    folders: HashMap<PathBuf, MemoryFolder>,
}

impl MemoryFolders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_folder(mut self, folder: MemoryFolder) -> Self {
        self.folders.insert(folder.handle.path.clone(), folder);
        self
    }
}

impl FolderSystem for MemoryFolders {
    fn open(&self, handle: &FolderHandle) -> Box<dyn FolderAccess> {
        let folder = self.folders.get(&handle.path).cloned().unwrap_or_else(|| {
            MemoryFolder::new(handle.path.clone())
                .with_permission(PermissionState::Prompt, PermissionState::Denied)
        });
        Box::new(folder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::tempdir;

    #[test]
    fn local_folder_lists_direct_children_by_name() {
        let dir = tempdir().expect("tempdir");
        fs::write(dir.path().join("b.mp3"), b"").expect("write");
        fs::write(dir.path().join("a.m4a"), b"").expect("write");
        fs::create_dir(dir.path().join("nested")).expect("mkdir");
        fs::write(dir.path().join("nested").join("deep.mp3"), b"").expect("write");

        let folder = LocalFolder::new(FolderHandle::new(dir.path()));
        let entries = folder.entries().expect("entries");
        let names: Vec<&str> = entries.iter().map(|entry| entry.name.as_str()).collect();
        assert_eq!(names, vec!["a.m4a", "b.mp3", "nested"]);
        assert_eq!(entries[2].kind, FolderEntryKind::Directory);
    }

    #[test]
    fn local_folder_resolves_file_items() {
        let dir = tempdir().expect("tempdir");
        fs::write(dir.path().join("clip.mp4"), b"").expect("write");

        let folder = LocalFolder::new(FolderHandle::new(dir.path()));
        let item = folder
            .open_file(&FolderEntry {
                name: String::from("clip.mp4"),
                path: dir.path().join("clip.mp4"),
                kind: FolderEntryKind::File,
            })
            .expect("file");
        assert_eq!(item.mime, "video/mp4");
        assert_eq!(item.source.path(), dir.path().join("clip.mp4").as_path());
    }

    #[cfg(unix)]
    #[test]
    fn dangling_symlink_is_skipped() {
        let dir = tempdir().expect("tempdir");
        fs::write(dir.path().join("good.mp3"), b"").expect("write");
        std::os::unix::fs::symlink(dir.path().join("missing"), dir.path().join("old-link.txt"))
            .expect("symlink");

        let folder = LocalFolder::new(FolderHandle::new(dir.path()));
        let entries = folder.entries().expect("entries");
        let names: Vec<&str> = entries.iter().map(|entry| entry.name.as_str()).collect();
        assert_eq!(names, vec!["good.mp3"]);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn non_utf8_file_name_opens_through_real_path() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = tempdir().expect("tempdir");
        let raw = OsStr::from_bytes(b"caf\xe9.mp3");
        fs::write(dir.path().join(raw), b"").expect("write");

        let folder = LocalFolder::new(FolderHandle::new(dir.path()));
        let entries = folder.entries().expect("entries");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "caf\u{FFFD}.mp3");

        let item = folder.open_file(&entries[0]).expect("file");
        assert_eq!(item.source.path(), dir.path().join(raw).as_path());
        assert_eq!(item.mime, "audio/mpeg");
    }

    #[test]
    fn local_folder_grants_readable_directory() {
        let dir = tempdir().expect("tempdir");
        let mut folder = LocalFolder::new(FolderHandle::new(dir.path()));
        assert_eq!(
            folder.query_permission(AccessMode::Read),
            PermissionState::Granted
        );
        assert_eq!(
            folder.request_permission(AccessMode::Read),
            PermissionState::Granted
        );
    }

    #[test]
    fn missing_directory_is_not_granted() {
        let dir = tempdir().expect("tempdir");
        let folder = LocalFolder::new(FolderHandle::new(dir.path().join("gone")));
        assert_ne!(
            folder.query_permission(AccessMode::Read),
            PermissionState::Granted
        );
        assert!(folder.entries().is_err());
    }

    #[test]
    fn unknown_memory_folder_is_denied() {
        let folders = MemoryFolders::new();
        let mut folder = folders.open(&FolderHandle::new(Path::new("/nowhere")));
        assert_eq!(
            folder.request_permission(AccessMode::Read),
            PermissionState::Denied
        );
    }
}
