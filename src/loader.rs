use crate::audio::PlaybackBackend;
use crate::error::PlayerResult;
use crate::folder::FolderAccess;
use crate::model::{FileItem, FolderEntry, FolderEntryKind, name_extension};
use crate::playlist::{MediaEntry, Playlist};

pub const SUPPORTED_EXTENSIONS: &[&str] = &["mp3", "mp4", "m4a"];

pub fn is_supported_name(name: &str) -> bool {
    let ext = name_extension(name);
    SUPPORTED_EXTENSIONS
        .iter()
        .any(|supported| ext.eq_ignore_ascii_case(supported))
}

/// Replaces the playlist with the supported files of `folder`, in the order
/// the folder lists them. On error the playlist is left untouched.
pub fn load_from_folder(
    folder: &dyn FolderAccess,
    backend: &dyn PlaybackBackend,
    playlist: &mut Playlist,
) -> PlayerResult<usize> {
    let mut files = Vec::new();
    for entry in folder.entries()? {
        if !is_media_entry(&entry) {
            continue;
        }
        files.push(folder.open_file(&entry)?);
    }

    let entries: Vec<MediaEntry> = files
        .into_iter()
        .map(|file| build_entry(file, backend, playlist))
        .collect();
    let count = entries.len();
    playlist.replace_all(entries);
    log::info!(
        "loaded {count} entries from {}",
        folder.handle().path.display()
    );
    Ok(count)
}

/// Appends every given file. No extension filtering.
pub fn load_from_files(
    files: Vec<FileItem>,
    backend: &dyn PlaybackBackend,
    playlist: &mut Playlist,
) -> usize {
    let count = files.len();
    for file in files {
        let entry = build_entry(file, backend, playlist);
        playlist.append(entry);
    }
    log::info!("appended {count} files");
    count
}

fn is_media_entry(entry: &FolderEntry) -> bool {
    entry.kind == FolderEntryKind::File && is_supported_name(&entry.name)
}

fn build_entry(
    file: FileItem,
    backend: &dyn PlaybackBackend,
    playlist: &mut Playlist,
) -> MediaEntry {
    let handle = backend.create(&file.source);
    MediaEntry::new(playlist.allocate_id(), file, handle)
}
