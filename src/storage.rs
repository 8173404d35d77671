use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

#[cfg(test)]
use mockall::automock;

use crate::error::StorageError;

/// 永続化されるblobのキー。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BlobKey {
    Budget,
    Entries,
    Tags,
}

impl BlobKey {
    pub const ALL: [BlobKey; 3] = [BlobKey::Budget, BlobKey::Entries, BlobKey::Tags];

    pub fn as_str(&self) -> &'static str {
        match self {
            BlobKey::Budget => "budget",
            BlobKey::Entries => "entries",
            BlobKey::Tags => "tags",
        }
    }
}

impl fmt::Display for BlobKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// キーごとにblobを読み書きするストア。
#[cfg_attr(test, automock)]
pub trait BlobStore {
    /// blobを読み込む。存在しない場合は`None`を返す。
    fn load(&self, key: BlobKey) -> Result<Option<Vec<u8>>, StorageError>;

    /// blobを書き込む。既存のblobは置き換える。
    fn save(&mut self, key: BlobKey, data: &[u8]) -> Result<(), StorageError>;
}

/// ディレクトリにキーごとのJSONファイルとして保存するストア。
///
/// `<dir>/budget.json`, `<dir>/entries.json`, `<dir>/tags.json`
pub struct FileBlobStore {
    dir: PathBuf,
}

impl FileBlobStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: BlobKey) -> PathBuf {
        self.dir.join(format!("{}.json", key.as_str()))
    }
}

impl BlobStore for FileBlobStore {
    fn load(&self, key: BlobKey) -> Result<Option<Vec<u8>>, StorageError> {
        match fs::read(self.path_for(key)) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Read { key, source }),
        }
    }

    /// 一時ファイルに書き込んでからリネームする。
    fn save(&mut self, key: BlobKey, data: &[u8]) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir).map_err(|source| StorageError::Write { key, source })?;

        let path = self.path_for(key);
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, data).map_err(|source| StorageError::Write { key, source })?;
        fs::rename(&temp_path, &path).map_err(|source| StorageError::Write { key, source })?;

        Ok(())
    }
}

/// メモリ上に保持するストア。
#[derive(Clone, Debug, Default)]
pub struct MemoryBlobStore {
    blobs: HashMap<BlobKey, Vec<u8>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: BlobKey) -> Option<&[u8]> {
        self.blobs.get(&key).map(Vec::as_slice)
    }

    pub fn insert(&mut self, key: BlobKey, data: impl Into<Vec<u8>>) {
        self.blobs.insert(key, data.into());
    }
}

impl BlobStore for MemoryBlobStore {
    fn load(&self, key: BlobKey) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.blobs.get(&key).cloned())
    }

    fn save(&mut self, key: BlobKey, data: &[u8]) -> Result<(), StorageError> {
        self.blobs.insert(key, data.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use tempfile::TempDir;

    use super::{BlobKey, BlobStore, FileBlobStore, MemoryBlobStore};

    /// ファイルがない場合は`None`が返ることを確認する。
    #[rstest]
    #[case::budget(BlobKey::Budget)]
    #[case::entries(BlobKey::Entries)]
    #[case::tags(BlobKey::Tags)]
    fn test_file_load_missing(#[case] key: BlobKey) {
        let dir = TempDir::new().unwrap();
        let store = FileBlobStore::new(dir.path());

        assert!(store.load(key).unwrap().is_none());
    }

    /// 保存したblobが読み込めること、存在しないディレクトリも作成されることを確認する。
    #[test]
    fn test_file_save_then_load() {
        let dir = TempDir::new().unwrap();
        let mut store = FileBlobStore::new(dir.path().join("nested").join("data"));

        store.save(BlobKey::Tags, b"[]").unwrap();
        store.save(BlobKey::Tags, b"[1]").unwrap();

        assert_eq!(store.load(BlobKey::Tags).unwrap(), Some(b"[1]".to_vec()));
        assert!(store.path_for(BlobKey::Tags).ends_with("tags.json"));
        assert!(!store.path_for(BlobKey::Tags).with_extension("tmp").exists());
        assert!(store.load(BlobKey::Budget).unwrap().is_none());
    }

    /// ファイルのパスがディレクトリの場合、読み込みエラーになることを確認する。
    #[test]
    fn test_file_load_error() {
        let dir = TempDir::new().unwrap();
        let store = FileBlobStore::new(dir.path());
        std::fs::create_dir_all(store.path_for(BlobKey::Entries)).unwrap();

        assert!(store.load(BlobKey::Entries).is_err());
    }

    /// メモリ上のストアがキーごとに独立して保持することを確認する。
    #[test]
    fn test_memory_store() {
        let mut store = MemoryBlobStore::new();

        store.save(BlobKey::Budget, b"{}").unwrap();

        assert_eq!(store.get(BlobKey::Budget), Some(&b"{}"[..]));
        assert!(store.load(BlobKey::Entries).unwrap().is_none());
    }
}
