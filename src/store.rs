use crate::error::StoreError;
use crate::models::{Mode, StickerRecord, StoreDocument, UserId};
use std::path::{Path, PathBuf};

/// Per-user sticker collections and delete-mode membership, backed by a
/// single JSON file that is rewritten after every mutation.
#[derive(Debug)]
pub struct StickerStore {
    path: PathBuf,
    doc: StoreDocument,
}

impl StickerStore {
    /// Loads the store from `path`. A missing file is an empty store; it is
    /// created on the first mutation.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let doc = match std::fs::read_to_string(&path) {
            Ok(contents) => {
                serde_json::from_str(&contents).map_err(|source| StoreError::Parse {
                    path: path.display().to_string(),
                    source,
                })?
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No store at {}, starting empty", path.display());
                StoreDocument::default()
            }
            Err(source) => {
                return Err(StoreError::Read {
                    path: path.display().to_string(),
                    source,
                });
            }
        };
        Ok(Self { path, doc })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn user_count(&self) -> usize {
        self.doc.user_stickers.len()
    }

    /// The user's collection in insertion order, empty if they have none.
    pub fn get_stickers(&self, user_id: UserId) -> &[StickerRecord] {
        self.doc
            .user_stickers
            .get(&user_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn has_collection(&self, user_id: UserId) -> bool {
        self.doc.user_stickers.contains_key(&user_id)
    }

    pub fn ensure_user(&mut self, user_id: UserId) -> Result<(), StoreError> {
        self.mutate(|doc| {
            if !doc.user_stickers.contains_key(&user_id) {
                tracing::debug!(user_id, "Creating sticker collection");
                doc.user_stickers.insert(user_id, Vec::new());
            }
        })
    }

    /// Appends a sticker unless one with the same `stable_id` is already in
    /// the user's collection. Returns whether it was added.
    pub fn add_sticker(
        &mut self,
        user_id: UserId,
        stable_id: &str,
        transient_file_id: &str,
    ) -> Result<bool, StoreError> {
        self.mutate(|doc| {
            let stickers = doc.user_stickers.entry(user_id).or_default();
            if stickers.iter().any(|s| s.stable_id == stable_id) {
                return false;
            }
            stickers.push(StickerRecord::new(stable_id, transient_file_id));
            true
        })
    }

    /// Returns whether a record with `stable_id` was removed.
    pub fn remove_sticker(&mut self, user_id: UserId, stable_id: &str) -> Result<bool, StoreError> {
        self.mutate(|doc| {
            let Some(stickers) = doc.user_stickers.get_mut(&user_id) else {
                return false;
            };
            match stickers.iter().position(|s| s.stable_id == stable_id) {
                Some(index) => {
                    stickers.remove(index);
                    true
                }
                None => false,
            }
        })
    }

    pub fn enter_delete_mode(&mut self, user_id: UserId) -> Result<(), StoreError> {
        self.mutate(|doc| {
            doc.delete_mode.insert(user_id);
        })
    }

    /// Returns whether the user was in delete mode.
    pub fn exit_delete_mode(&mut self, user_id: UserId) -> Result<bool, StoreError> {
        self.mutate(|doc| doc.delete_mode.remove(&user_id))
    }

    pub fn is_in_delete_mode(&self, user_id: UserId) -> bool {
        self.doc.delete_mode.contains(&user_id)
    }

    pub fn mode(&self, user_id: UserId) -> Mode {
        if self.is_in_delete_mode(user_id) {
            Mode::DeleteMode
        } else {
            Mode::Normal
        }
    }

    /// Applies `f` to the document and writes it out if anything changed.
    /// On a failed write the in-memory document is rolled back so it keeps
    /// matching the last successful write.
    fn mutate<T>(&mut self, f: impl FnOnce(&mut StoreDocument) -> T) -> Result<T, StoreError> {
        let previous = self.doc.clone();
        let result = f(&mut self.doc);
        if self.doc == previous {
            return Ok(result);
        }
        if let Err(e) = self.persist() {
            self.doc = previous;
            return Err(e);
        }
        Ok(result)
    }

    fn persist(&self) -> Result<(), StoreError> {
        let write_error = |source: std::io::Error| StoreError::Write {
            path: self.path.display().to_string(),
            source,
        };

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(write_error)?;
        }

        let json = serde_json::to_string_pretty(&self.doc).map_err(StoreError::Serialize)?;

        // Replace via rename so a crash mid-write never truncates the store.
        let mut tmp_name = self.path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);
        std::fs::write(&tmp_path, json).map_err(write_error)?;
        if let Err(e) = std::fs::rename(&tmp_path, &self.path) {
            let _ = std::fs::remove_file(&tmp_path);
            return Err(write_error(e));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_in(dir: &Path) -> StickerStore {
        StickerStore::open(dir.join("db.json")).unwrap()
    }

    fn stable_ids(store: &StickerStore, user_id: UserId) -> Vec<&str> {
        store
            .get_stickers(user_id)
            .iter()
            .map(|s| s.stable_id.as_str())
            .collect()
    }

    #[test]
    fn missing_file_opens_empty_without_creating_it() {
        let tmp = tempfile::tempdir().unwrap();
        let store = open_in(tmp.path());
        assert!(store.get_stickers(1).is_empty());
        assert!(!store.has_collection(1));
        assert_eq!(store.user_count(), 0);
        assert!(!tmp.path().join("db.json").exists());
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("db.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = StickerStore::open(&path).unwrap_err();
        assert!(matches!(err, StoreError::Parse { .. }));
    }

    #[test]
    fn ensure_user_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let mut store = open_in(tmp.path());
        store.ensure_user(5).unwrap();
        store.add_sticker(5, "a", "fa").unwrap();
        store.ensure_user(5).unwrap();
        assert!(store.has_collection(5));
        assert_eq!(stable_ids(&store, 5), ["a"]);
    }

    #[test]
    fn add_rejects_duplicate_stable_id() {
        let tmp = tempfile::tempdir().unwrap();
        let mut store = open_in(tmp.path());
        assert!(store.add_sticker(1, "a", "fa").unwrap());
        assert!(!store.add_sticker(1, "a", "fa-resent").unwrap());
        assert_eq!(store.get_stickers(1), [StickerRecord::new("a", "fa")]);
    }

    #[test]
    fn repeated_adds_never_duplicate() {
        let tmp = tempfile::tempdir().unwrap();
        let mut store = open_in(tmp.path());
        for id in ["a", "b", "a", "c", "b", "a"] {
            store.add_sticker(1, id, &format!("f{id}")).unwrap();
        }
        assert_eq!(stable_ids(&store, 1), ["a", "b", "c"]);
    }

    #[test]
    fn collections_are_per_user() {
        let tmp = tempfile::tempdir().unwrap();
        let mut store = open_in(tmp.path());
        assert!(store.add_sticker(1, "a", "fa").unwrap());
        assert!(store.add_sticker(2, "a", "fa").unwrap());
        assert!(store.remove_sticker(1, "a").unwrap());
        assert!(store.get_stickers(1).is_empty());
        assert_eq!(stable_ids(&store, 2), ["a"]);
    }

    #[test]
    fn remove_deletes_exactly_one_record() {
        let tmp = tempfile::tempdir().unwrap();
        let mut store = open_in(tmp.path());
        for id in ["a", "b", "c"] {
            store.add_sticker(1, id, id).unwrap();
        }
        assert!(store.remove_sticker(1, "b").unwrap());
        assert_eq!(stable_ids(&store, 1), ["a", "c"]);
    }

    #[test]
    fn remove_absent_sticker_reports_not_removed() {
        let tmp = tempfile::tempdir().unwrap();
        let mut store = open_in(tmp.path());
        store.add_sticker(1, "a", "fa").unwrap();
        assert!(!store.remove_sticker(1, "zzz").unwrap());
        assert!(!store.remove_sticker(99, "a").unwrap());
        assert_eq!(stable_ids(&store, 1), ["a"]);
        assert!(!store.has_collection(99));
    }

    #[test]
    fn delete_mode_enter_and_exit() {
        let tmp = tempfile::tempdir().unwrap();
        let mut store = open_in(tmp.path());
        assert_eq!(store.mode(3), Mode::Normal);
        assert!(!store.exit_delete_mode(3).unwrap());
        assert_eq!(store.mode(3), Mode::Normal);

        store.enter_delete_mode(3).unwrap();
        store.enter_delete_mode(3).unwrap();
        assert!(store.is_in_delete_mode(3));
        assert_eq!(store.mode(3), Mode::DeleteMode);

        assert!(store.exit_delete_mode(3).unwrap());
        assert_eq!(store.mode(3), Mode::Normal);
    }

    #[test]
    fn mutations_survive_reopen() {
        let tmp = tempfile::tempdir().unwrap();
        {
            let mut store = open_in(tmp.path());
            store.add_sticker(10, "a", "fa").unwrap();
            store.add_sticker(10, "b", "fb").unwrap();
            store.enter_delete_mode(10).unwrap();
        }
        let store = open_in(tmp.path());
        assert_eq!(stable_ids(&store, 10), ["a", "b"]);
        assert!(store.is_in_delete_mode(10));
    }

    #[test]
    fn persisted_file_uses_documented_layout() {
        let tmp = tempfile::tempdir().unwrap();
        let mut store = open_in(tmp.path());
        store.add_sticker(42, "uniq", "file").unwrap();

        let contents = std::fs::read_to_string(tmp.path().join("db.json")).unwrap();
        let json: serde_json::Value = serde_json::from_str(&contents).unwrap();
        assert_eq!(json["userStickers"]["42"][0]["id"], "uniq");
        assert_eq!(json["userStickers"]["42"][0]["sticker_file_id"], "file");
        assert_eq!(json["userStickers"]["42"][0]["type"], "sticker");
        assert_eq!(json["deleteMode"], serde_json::json!([]));
        assert!(!tmp.path().join("db.json.tmp").exists());
    }

    #[test]
    fn creates_missing_parent_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("data").join("db.json");
        let mut store = StickerStore::open(&path).unwrap();
        store.ensure_user(1).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn failed_write_rolls_back_memory() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("data");
        let mut store = StickerStore::open(blocker.join("db.json")).unwrap();
        // A regular file where the parent directory should be makes every write fail.
        std::fs::write(&blocker, "").unwrap();

        let err = store.add_sticker(1, "a", "fa").unwrap_err();
        assert!(matches!(err, StoreError::Write { .. }));
        assert!(store.get_stickers(1).is_empty());
        assert!(!store.has_collection(1));

        assert!(store.enter_delete_mode(1).is_err());
        assert_eq!(store.mode(1), Mode::Normal);
    }

    #[test]
    fn failed_rename_removes_temp_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("db.json");
        let mut store = StickerStore::open(&path).unwrap();
        // Renaming a file over a non-empty directory fails after the temp write.
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("occupied"), "").unwrap();

        let err = store.add_sticker(1, "a", "fa").unwrap_err();
        assert!(matches!(err, StoreError::Write { .. }));
        assert!(!tmp.path().join("db.json.tmp").exists());
        assert!(store.get_stickers(1).is_empty());
    }

    #[test]
    fn no_op_mutation_does_not_write() {
        let tmp = tempfile::tempdir().unwrap();
        let mut store = open_in(tmp.path());
        assert!(!store.remove_sticker(1, "a").unwrap());
        assert!(!store.exit_delete_mode(1).unwrap());
        assert!(!tmp.path().join("db.json").exists());
    }
}
