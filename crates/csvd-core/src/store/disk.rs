//! One-file-per-table persistence.
//!
//! Each committed table lives at `<dir>/<name>.csv` in the same CSV shape the
//! HTTP layer speaks. Writes go to a hidden temporary file first and are
//! renamed into place, so a reader of the directory never sees a half-written
//! table.

use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::codec;
use crate::error::{StoreError, StoreResult};
use crate::name::TableName;
use crate::table::Table;

const TABLE_EXTENSION: &str = "csv";

#[derive(Debug)]
pub(crate) struct DiskStore {
    dir: PathBuf,
    next_tmp: AtomicU64,
}

impl DiskStore {
    /// Opens `dir`, creating it if needed, and loads every table in it.
    pub(crate) fn open(dir: &Path) -> StoreResult<(Self, Vec<(TableName, Table)>)> {
        fs::create_dir_all(dir)?;

        let mut tables = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some(TABLE_EXTENSION)
            {
                continue;
            }

            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                tracing::warn!("Skipping table file with non UTF-8 name: {:?}", path);
                continue;
            };
            let name = match TableName::new(stem) {
                Ok(name) => name,
                Err(e) => {
                    tracing::warn!("Skipping {:?}: {}", path, e);
                    continue;
                }
            };

            let bytes = fs::read(&path)?;
            let table = codec::decode(&bytes).map_err(|source| StoreError::Corrupted {
                path: path.clone(),
                source,
            })?;
            tables.push((name, table));
        }

        let store = Self {
            dir: dir.to_path_buf(),
            next_tmp: AtomicU64::new(0),
        };
        Ok((store, tables))
    }

    /// Returns the data directory.
    pub(crate) fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the file a table is stored in.
    pub(crate) fn path_for(&self, name: &TableName) -> PathBuf {
        self.dir.join(format!("{}.{}", name, TABLE_EXTENSION))
    }

    /// Durably replaces the file for `name`.
    pub(crate) fn write(&self, name: &TableName, table: &Table) -> StoreResult<()> {
        let seq = self.next_tmp.fetch_add(1, Ordering::Relaxed);
        let tmp = self.dir.join(format!(".{}.{}.tmp", name, seq));

        let result = write_file(&tmp, table).and_then(|()| fs::rename(&tmp, self.path_for(name)));
        if result.is_err() {
            let _ = fs::remove_file(&tmp);
        }
        result?;

        // Make the rename itself durable.
        sync_dir(&self.dir)?;
        Ok(())
    }

    /// Deletes the file for `name`. A missing file is not an error.
    pub(crate) fn remove(&self, name: &TableName) -> StoreResult<()> {
        match fs::remove_file(self.path_for(name)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(unix)]
fn sync_dir(dir: &Path) -> io::Result<()> {
    File::open(dir)?.sync_all()
}

// Directories cannot be opened for syncing here.
#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> io::Result<()> {
    Ok(())
}

fn write_file(path: &Path, table: &Table) -> io::Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    codec::encode_to(table, &mut writer).map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
    let file = writer.into_inner().map_err(|e| e.into_error())?;
    file.sync_all()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> Table {
        Table::new(
            vec!["value".to_string()],
            vec!["2013-01-01 00:00:00".to_string()],
            vec![vec![0.25]],
        )
        .unwrap()
    }

    #[test]
    fn test_write_then_reopen() {
        let dir = TempDir::new().unwrap();
        let (disk, loaded) = DiskStore::open(dir.path()).unwrap();
        assert!(loaded.is_empty());

        let name = TableName::new("alpha").unwrap();
        disk.write(&name, &sample()).unwrap();
        assert!(disk.path_for(&name).exists());

        let (_, loaded) = DiskStore::open(dir.path()).unwrap();
        assert_eq!(loaded, vec![(name, sample())]);
    }

    #[test]
    fn test_sync_dir() {
        let dir = TempDir::new().unwrap();
        sync_dir(dir.path()).unwrap();
        assert!(sync_dir(&dir.path().join("missing")).is_err() || cfg!(not(unix)));
    }

    #[test]
    fn test_write_into_removed_dir_fails_cleanly() {
        let dir = TempDir::new().unwrap();
        let data = dir.path().join("data");
        let (disk, _) = DiskStore::open(&data).unwrap();
        fs::remove_dir_all(&data).unwrap();

        let name = TableName::new("gamma").unwrap();
        assert!(matches!(
            disk.write(&name, &sample()),
            Err(StoreError::Io { .. })
        ));
    }

    #[test]
    fn test_no_temp_files_left_behind() {
        let dir = TempDir::new().unwrap();
        let (disk, _) = DiskStore::open(dir.path()).unwrap();
        let name = TableName::new("beta").unwrap();
        disk.write(&name, &sample()).unwrap();
        disk.write(&name, &sample()).unwrap();

        let files: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn test_remove_missing_is_ok() {
        let dir = TempDir::new().unwrap();
        let (disk, _) = DiskStore::open(dir.path()).unwrap();
        disk.remove(&TableName::new("ghost").unwrap()).unwrap();
    }

    #[test]
    fn test_open_skips_foreign_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("notes.txt"), "hello").unwrap();
        fs::write(dir.path().join(".half.3.tmp"), ",v\nx,").unwrap();
        fs::write(dir.path().join("bad name.csv"), ",v\nx,1\n").unwrap();

        let (_, loaded) = DiskStore::open(dir.path()).unwrap();
        assert!(loaded.is_empty());
    }

    #[test]
    fn test_open_rejects_corrupted_table() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("broken.csv"), ",a,b\nx,1\n").unwrap();

        let err = DiskStore::open(dir.path()).unwrap_err();
        assert!(matches!(err, StoreError::Corrupted { .. }));
    }
}
