//! Host storage behind the drive.
//!
//! The drive only needs three things from the host: a listing of the
//! current directory, a way to open a named file, and the directory's name
//! for the listing header.

use std::fs::{self, File};
use std::io::{self, Read, Seek, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

/// One entry of the current directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub is_dir: bool,
    /// Size in bytes. Zero for directories.
    pub size: u64,
}

/// How a file is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    Read,
    /// Create or truncate.
    Write,
}

/// An open file handle.
pub trait StorageFile: Read + Write + Seek {}

impl<T: Read + Write + Seek> StorageFile for T {}

/// Directory-style storage the drive serves files from.
pub trait StorageProvider {
    /// Entries of the current directory, in listing order.
    fn entries(&mut self) -> io::Result<Vec<DirEntry>>;

    fn open(&mut self, name: &str, mode: OpenMode) -> io::Result<Box<dyn StorageFile>>;

    /// Path of the current directory.
    fn directory(&self) -> String;
}

/// Storage failure seen by the drive. Never propagated into emulation:
/// the drive logs it and reports an empty channel.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("no storage attached")]
    Detached,
    #[error("cannot open \"{name}\": {source}")]
    Open {
        name: String,
        #[source]
        source: io::Error,
    },
    #[error("cannot list directory: {0}")]
    Listing(#[source] io::Error),
    #[error("read failed: {0}")]
    Read(#[source] io::Error),
    #[error("write failed: {0}")]
    Write(#[source] io::Error),
}

/// Storage over a host directory.
///
/// Lookups for reading are case-insensitive, since the guest always sends
/// upper-case names.
pub struct FsStorage {
    root: PathBuf,
}

impl FsStorage {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Host path of `name`, preferring an existing entry that matches
    /// without regard to case.
    fn resolve(&self, name: &str) -> PathBuf {
        let exact = self.root.join(name);
        if exact.exists() {
            return exact;
        }
        fs::read_dir(&self.root)
            .ok()
            .and_then(|dir| {
                dir.filter_map(Result::ok)
                    .find(|e| e.file_name().to_string_lossy().eq_ignore_ascii_case(name))
                    .map(|e| e.path())
            })
            .unwrap_or(exact)
    }
}

impl StorageProvider for FsStorage {
    fn entries(&mut self) -> io::Result<Vec<DirEntry>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let meta = entry.metadata()?;
            entries.push(DirEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                is_dir: meta.is_dir(),
                size: if meta.is_dir() { 0 } else { meta.len() },
            });
        }
        // Directories first, then by name.
        entries.sort_by(|a, b| b.is_dir.cmp(&a.is_dir).then_with(|| a.name.cmp(&b.name)));
        Ok(entries)
    }

    fn open(&mut self, name: &str, mode: OpenMode) -> io::Result<Box<dyn StorageFile>> {
        let file = match mode {
            OpenMode::Read => File::options().read(true).open(self.resolve(name))?,
            OpenMode::Write => File::create(self.root.join(name))?,
        };
        Ok(Box::new(file))
    }

    fn directory(&self) -> String {
        self.root.to_string_lossy().into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("drive-iec-{tag}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).expect("create scratch dir");
        dir
    }

    #[test]
    fn entries_list_directories_first() {
        let dir = scratch("entries");
        fs::write(dir.join("b.prg"), [0u8; 300]).expect("write");
        fs::write(dir.join("a.prg"), [0u8; 10]).expect("write");
        fs::create_dir(dir.join("games")).expect("mkdir");

        let mut storage = FsStorage::new(&dir);
        let entries = storage.entries().expect("list");
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["games", "a.prg", "b.prg"]);
        assert!(entries[0].is_dir);
        assert_eq!(entries[2].size, 300);

        fs::remove_dir_all(dir).expect("cleanup");
    }

    #[test]
    fn read_lookup_ignores_case() {
        let dir = scratch("case");
        fs::write(dir.join("hello.prg"), [1, 2, 3]).expect("write");

        let mut storage = FsStorage::new(&dir);
        let mut file = storage.open("HELLO.PRG", OpenMode::Read).expect("open");
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes).expect("read");
        assert_eq!(bytes, [1, 2, 3]);

        fs::remove_dir_all(dir).expect("cleanup");
    }

    #[test]
    fn write_creates_file() {
        let dir = scratch("write");
        let mut storage = FsStorage::new(&dir);
        {
            let mut file = storage.open("OUT.PRG", OpenMode::Write).expect("create");
            file.write_all(&[0x01, 0x10, 0xEA]).expect("write");
        }
        assert_eq!(fs::read(dir.join("OUT.PRG")).expect("read back"), [0x01, 0x10, 0xEA]);

        fs::remove_dir_all(dir).expect("cleanup");
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = scratch("missing");
        let mut storage = FsStorage::new(&dir);
        assert!(storage.open("NOPE.PRG", OpenMode::Read).is_err());
        fs::remove_dir_all(dir).expect("cleanup");
    }
}
