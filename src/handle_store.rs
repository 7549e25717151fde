use crate::config;
use crate::error::{PlayerError, PlayerResult};
use crate::model::FolderHandle;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const SCHEMA_VERSION: u32 = 1;
pub const HANDLE_COLLECTION: &str = "handles";
pub const HANDLE_KEY: &str = "directoryHandle";

pub trait HandleStore {
    fn save(&mut self, handle: &FolderHandle) -> PlayerResult<()>;
    fn load(&mut self) -> PlayerResult<Option<FolderHandle>>;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct HandleDatabase {
    version: u32,
    #[serde(default)]
    collections: BTreeMap<String, BTreeMap<String, FolderHandle>>,
}

impl HandleDatabase {
    fn initialized() -> Self {
        let mut db = Self {
            version: SCHEMA_VERSION,
            collections: BTreeMap::new(),
        };
        db.collections
            .insert(HANDLE_COLLECTION.to_string(), BTreeMap::new());
        db
    }

    fn handles(&self) -> PlayerResult<&BTreeMap<String, FolderHandle>> {
        self.collections
            .get(HANDLE_COLLECTION)
            .ok_or_else(|| PlayerError::storage("handles collection missing"))
    }
}

/// Versioned JSON document holding the last authorized folder.
#[derive(Debug)]
pub struct JsonHandleStore {
    path: PathBuf,
    db: Option<HandleDatabase>,
}

impl JsonHandleStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            db: None,
        }
    }

    pub fn at_default_location() -> PlayerResult<Self> {
        let path = config::handle_store_path()
            .map_err(|err| PlayerError::storage(format!("{err:#}")))?;
        Ok(Self::new(path))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open(&mut self) -> PlayerResult<&mut HandleDatabase> {
        if self.db.is_none() {
            let db = open_database(&self.path)?;
            self.db = Some(db);
        }
        self.db
            .as_mut()
            .ok_or_else(|| PlayerError::storage("handle store not open"))
    }
}

impl HandleStore for JsonHandleStore {
    fn save(&mut self, handle: &FolderHandle) -> PlayerResult<()> {
        let path = self.path.clone();
        let db = self.open()?;

        let mut next = db.clone();
        next.collections
            .entry(HANDLE_COLLECTION.to_string())
            .or_default()
            .insert(HANDLE_KEY.to_string(), handle.clone());
        write_database(&path, &next)?;
        *db = next;
        log::info!("saved folder handle {}", handle.path.display());
        Ok(())
    }

    fn load(&mut self) -> PlayerResult<Option<FolderHandle>> {
        let db = self.open()?;
        Ok(db.handles()?.get(HANDLE_KEY).cloned())
    }
}

fn open_database(path: &Path) -> PlayerResult<HandleDatabase> {
    if !path.exists() {
        let db = HandleDatabase::initialized();
        write_database(path, &db)?;
        log::info!("initialized handle store at {}", path.display());
        return Ok(db);
    }

    let raw = fs::read_to_string(path)
        .map_err(|err| PlayerError::storage(format!("failed to read {}: {err}", path.display())))?;
    let mut db: HandleDatabase = serde_json::from_str(&raw).map_err(|err| {
        PlayerError::storage(format!("failed to parse {}: {err}", path.display()))
    })?;

    if db.version > SCHEMA_VERSION {
        return Err(PlayerError::storage(format!(
            "{} has schema version {}, newest supported is {SCHEMA_VERSION}",
            path.display(),
            db.version
        )));
    }
    if db.version < SCHEMA_VERSION || !db.collections.contains_key(HANDLE_COLLECTION) {
        db.version = SCHEMA_VERSION;
        db.collections
            .entry(HANDLE_COLLECTION.to_string())
            .or_default();
        write_database(path, &db)?;
    }
    Ok(db)
}

fn write_database(path: &Path, db: &HandleDatabase) -> PlayerResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|err| {
            PlayerError::storage(format!("failed to create {}: {err}", parent.display()))
        })?;
    }
    let json = serde_json::to_string_pretty(db).map_err(PlayerError::storage)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json)
        .map_err(|err| PlayerError::storage(format!("failed to write {}: {err}", tmp.display())))?;
    fs::rename(&tmp, path)
        .map_err(|err| PlayerError::storage(format!("failed to replace {}: {err}", path.display())))
}

/// Store kept in memory; can be told to fail every operation.
#[derive(Debug, Default, Clone)]
pub struct MemoryHandleStore {
    handle: Option<FolderHandle>,
    failing: bool,
    saves: u32,
}

impl MemoryHandleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_handle(handle: FolderHandle) -> Self {
        Self {
            handle: Some(handle),
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn saves(&self) -> u32 {
        self.saves
    }

    pub fn stored(&self) -> Option<&FolderHandle> {
        self.handle.as_ref()
    }
}

impl HandleStore for MemoryHandleStore {
    fn save(&mut self, handle: &FolderHandle) -> PlayerResult<()> {
        if self.failing {
            return Err(PlayerError::storage("store offline"));
        }
        self.saves += 1;
        self.handle = Some(handle.clone());
        Ok(())
    }

    fn load(&mut self) -> PlayerResult<Option<FolderHandle>> {
        if self.failing {
            return Err(PlayerError::storage("store offline"));
        }
        Ok(self.handle.clone())
    }
}
