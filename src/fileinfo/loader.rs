//! Ledger id to index file resolution

use crate::cache::LedgerLoader;
use crate::error::{LedgerError, LedgerResult};
use crate::LedgerId;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Resolves ledgers to index files under a single root directory
///
/// Ledger `0x1a2b3c` lives at `<root>/2b/3c/1a2b3c.idx`, which spreads files
/// over at most 65536 directories.
#[derive(Debug, Clone)]
pub struct DirectoryLoader {
    root: PathBuf,
}

impl DirectoryLoader {
    /// Create a loader rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory for index files
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Index file path for a ledger
    pub fn index_path(&self, ledger_id: LedgerId) -> PathBuf {
        let grand_parent = (ledger_id >> 8) & 0xff;
        let parent = ledger_id & 0xff;
        self.root
            .join(format!("{:x}", grand_parent))
            .join(format!("{:x}", parent))
            .join(format!("{:x}.idx", ledger_id))
    }
}

impl LedgerLoader for DirectoryLoader {
    fn resolve(&self, ledger_id: LedgerId, create_if_not_found: bool) -> LedgerResult<PathBuf> {
        let path = self.index_path(ledger_id);

        if tombstone_path(&path).exists() {
            return Err(LedgerError::LedgerDeleted(ledger_id));
        }

        if path.exists() {
            return Ok(path);
        }

        if !create_if_not_found {
            return Err(LedgerError::NoLedger(ledger_id));
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                LedgerError::io(format!("creating ledger directory {}", parent.display()), e)
            })?;
        }

        debug!("Resolved new index file for ledger {}: {}", ledger_id, path.display());
        Ok(path)
    }
}

/// Marker left behind when a ledger's index file is deleted
pub(crate) fn tombstone_path(index_path: &Path) -> PathBuf {
    let mut name = index_path.as_os_str().to_os_string();
    name.push(".deleted");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn index_path_layout() {
        let loader = DirectoryLoader::new("/ledgers");
        assert_eq!(
            loader.index_path(0x1a2b3c),
            PathBuf::from("/ledgers/2b/3c/1a2b3c.idx")
        );
        assert_eq!(loader.index_path(9), PathBuf::from("/ledgers/0/9/9.idx"));
    }

    #[test]
    fn missing_without_create_is_no_ledger() {
        let dir = TempDir::new().unwrap();
        let loader = DirectoryLoader::new(dir.path());

        let err = loader.resolve(5, false).unwrap_err();
        assert!(matches!(err, LedgerError::NoLedger(5)));
    }

    #[test]
    fn create_makes_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let loader = DirectoryLoader::new(dir.path());

        let path = loader.resolve(0x0102, true).unwrap();
        assert!(path.parent().unwrap().is_dir());
        assert!(!path.exists());
    }

    #[test]
    fn tombstone_blocks_resolution() {
        let dir = TempDir::new().unwrap();
        let loader = DirectoryLoader::new(dir.path());

        let path = loader.resolve(3, true).unwrap();
        fs::write(tombstone_path(&path), b"").unwrap();

        assert!(matches!(
            loader.resolve(3, true),
            Err(LedgerError::LedgerDeleted(3))
        ));
        assert!(matches!(
            loader.resolve(3, false),
            Err(LedgerError::LedgerDeleted(3))
        ));
    }

    #[test]
    fn tombstone_name() {
        assert_eq!(
            tombstone_path(Path::new("/l/0/9/9.idx")),
            PathBuf::from("/l/0/9/9.idx.deleted")
        );
    }
}
