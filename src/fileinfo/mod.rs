//! File-backed ledger index ("file info")
//!
//! Each ledger stored on this node has one index file: a fixed-size header
//! carrying the master key and state bits, followed by the index payload.
//!
//! # States
//!
//! | State | Reads/writes | `close(true)` |
//! |-------|--------------|---------------|
//! | Open | ok | flushes header |
//! | Deleted | `FileInfoDeleted` | `FileInfoDeleted` |
//! | Closed | `FileInfoClosed` | no-op |

pub mod header;
pub mod loader;

pub use header::{IndexHeader, CURRENT_HEADER_VERSION, HEADER_SIZE};
pub use loader::DirectoryLoader;

use crate::cache::{BackingResource, ResourceOpener};
use crate::error::{LedgerError, LedgerResult};
use crate::LedgerId;
use parking_lot::Mutex;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Open index file for one ledger
#[derive(Debug)]
pub struct FileInfo {
    ledger_id: LedgerId,
    path: PathBuf,
    state: Mutex<FileState>,
}

#[derive(Debug)]
struct FileState {
    file: Option<File>,
    header: IndexHeader,
    header_dirty: bool,
    deleted: bool,
}

impl FileInfo {
    /// Open the index file at `path`, creating it if it does not exist
    ///
    /// Creation requires a master key. An existing file keeps the master key
    /// and header version it was created with.
    pub fn open(
        ledger_id: LedgerId,
        path: &Path,
        master_key: Option<&[u8]>,
        header_version: u32,
    ) -> LedgerResult<Self> {
        let (file, header) = if path.exists() {
            Self::open_existing(path)?
        } else {
            let key = master_key.ok_or(LedgerError::MasterKeyRequired(ledger_id))?;
            Self::create_new(path, key, header_version)?
        };

        Ok(Self {
            ledger_id,
            path: path.to_path_buf(),
            state: Mutex::new(FileState {
                file: Some(file),
                header,
                header_dirty: false,
                deleted: false,
            }),
        })
    }

    fn open_existing(path: &Path) -> LedgerResult<(File, IndexHeader)> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|e| LedgerError::io(format!("opening index {}", path.display()), e))?;

        let mut buf = vec![0u8; HEADER_SIZE as usize];
        file.read_exact(&mut buf).map_err(|e| match e.kind() {
            ErrorKind::UnexpectedEof => LedgerError::header(path, "file shorter than header"),
            _ => LedgerError::io(format!("reading header of {}", path.display()), e),
        })?;

        let header = IndexHeader::decode(path, &buf)?;
        debug!("Opened index {} (header v{})", path.display(), header.version());
        Ok((file, header))
    }

    fn create_new(path: &Path, master_key: &[u8], version: u32) -> LedgerResult<(File, IndexHeader)> {
        let header = IndexHeader::new(version, master_key)?;

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(|e| LedgerError::io(format!("creating index {}", path.display()), e))?;

        file.write_all(&header.encode())
            .map_err(|e| LedgerError::io(format!("writing header of {}", path.display()), e))?;

        debug!("Created index {} (header v{})", path.display(), version);
        Ok((file, header))
    }

    pub fn ledger_id(&self) -> LedgerId {
        self.ledger_id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn master_key(&self) -> Vec<u8> {
        self.state.lock().header.master_key().to_vec()
    }

    pub fn header_version(&self) -> u32 {
        self.state.lock().header.version()
    }

    pub fn is_fenced(&self) -> bool {
        self.state.lock().header.is_fenced()
    }

    /// Mark the ledger fenced; persisted on the next header flush
    ///
    /// Returns true if the ledger was not fenced before.
    pub fn set_fenced(&self) -> LedgerResult<bool> {
        let mut state = self.state.lock();
        self.check_usable(&state)?;
        let changed = state.header.set_fenced();
        state.header_dirty |= changed;
        Ok(changed)
    }

    pub fn is_deleted(&self) -> bool {
        self.state.lock().deleted
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().file.is_none()
    }

    /// Payload size in bytes, excluding the header
    pub fn size(&self) -> LedgerResult<u64> {
        let state = self.state.lock();
        let file = self.check_usable(&state)?;
        let len = file
            .metadata()
            .map_err(|e| LedgerError::io(format!("stat {}", self.path.display()), e))?
            .len();
        Ok(len.saturating_sub(HEADER_SIZE))
    }

    /// Write `data` at payload offset `position`
    pub fn write_at(&self, position: u64, data: &[u8]) -> LedgerResult<()> {
        let state = self.state.lock();
        let mut file = self.check_usable(&state)?;
        file.seek(SeekFrom::Start(HEADER_SIZE + position))
            .and_then(|_| file.write_all(data))
            .map_err(|e| LedgerError::io(format!("writing {}", self.path.display()), e))
    }

    /// Read up to `len` bytes from payload offset `position`
    pub fn read_at(&self, position: u64, len: usize) -> LedgerResult<Vec<u8>> {
        let state = self.state.lock();
        let mut file = self.check_usable(&state)?;
        let mut buf = Vec::with_capacity(len);
        file.seek(SeekFrom::Start(HEADER_SIZE + position))
            .and_then(|_| file.take(len as u64).read_to_end(&mut buf))
            .map_err(|e| LedgerError::io(format!("reading {}", self.path.display()), e))?;
        Ok(buf)
    }

    /// Persist the header (if changed) and sync the file to disk
    pub fn flush(&self) -> LedgerResult<()> {
        let mut state = self.state.lock();
        self.check_usable(&state)?;
        self.flush_locked(&mut state)
    }

    fn flush_locked(&self, state: &mut FileState) -> LedgerResult<()> {
        let Some(mut file) = state.file.as_ref() else {
            return Err(LedgerError::FileInfoClosed(self.ledger_id));
        };

        if state.header_dirty {
            file.seek(SeekFrom::Start(0))
                .and_then(|_| file.write_all(&state.header.encode()))
                .map_err(|e| {
                    LedgerError::io(format!("writing header of {}", self.path.display()), e)
                })?;
            state.header_dirty = false;
        }

        file.sync_all()
            .map_err(|e| LedgerError::io(format!("syncing {}", self.path.display()), e))
    }

    /// Close the underlying file, optionally flushing first
    ///
    /// Closing twice is a no-op. Flushing a deleted index always fails with
    /// `FileInfoDeleted`, even though `delete` already released the file.
    pub fn close(&self, flush: bool) -> LedgerResult<()> {
        let mut state = self.state.lock();
        if flush && state.deleted {
            state.file = None;
            return Err(LedgerError::FileInfoDeleted(self.ledger_id));
        }
        if state.file.is_none() {
            return Ok(());
        }

        let result = if flush {
            self.flush_locked(&mut state)
        } else {
            Ok(())
        };

        state.file = None;
        debug!("Closed index for ledger {} (flush: {})", self.ledger_id, flush);
        result
    }

    /// Delete the index file and leave a tombstone so it is not recreated
    pub fn delete(&self) -> LedgerResult<()> {
        let mut state = self.state.lock();
        state.deleted = true;
        state.file = None;

        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                return Err(LedgerError::io(
                    format!("removing index {}", self.path.display()),
                    e,
                ))
            }
        }

        let tombstone = loader::tombstone_path(&self.path);
        fs::write(&tombstone, b"").map_err(|e| {
            LedgerError::io(format!("writing tombstone {}", tombstone.display()), e)
        })?;

        debug!("Deleted index for ledger {}", self.ledger_id);
        Ok(())
    }

    fn check_usable<'a>(&self, state: &'a FileState) -> LedgerResult<&'a File> {
        if state.deleted {
            return Err(LedgerError::FileInfoDeleted(self.ledger_id));
        }
        state
            .file
            .as_ref()
            .ok_or(LedgerError::FileInfoClosed(self.ledger_id))
    }
}

impl BackingResource for FileInfo {
    fn close(&self, flush: bool) -> LedgerResult<()> {
        FileInfo::close(self, flush)
    }
}

/// Opens [`FileInfo`] resources for the backing cache
#[derive(Debug, Clone, Copy, Default)]
pub struct FileInfoOpener;

impl ResourceOpener<FileInfo> for FileInfoOpener {
    fn open(
        &self,
        ledger_id: LedgerId,
        location: &Path,
        master_key: Option<&[u8]>,
        header_version: u32,
    ) -> LedgerResult<FileInfo> {
        FileInfo::open(ledger_id, location, master_key, header_version)
    }
}
