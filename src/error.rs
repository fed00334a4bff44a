//! Error types for ledger-index
//!
//! All modules use `LedgerResult<T>` as their return type.

use crate::LedgerId;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for ledger-index operations
pub type LedgerResult<T> = Result<T, LedgerError>;

/// All errors that can occur in ledger-index
#[derive(Error, Debug)]
pub enum LedgerError {
    // Ledger lookup errors
    #[error("No ledger {0} on this storage node")]
    NoLedger(LedgerId),

    #[error("Ledger {0} has been deleted")]
    LedgerDeleted(LedgerId),

    // File info errors
    #[error("File info for ledger {0} has been deleted")]
    FileInfoDeleted(LedgerId),

    #[error("File info for ledger {0} is closed")]
    FileInfoClosed(LedgerId),

    #[error("Invalid index header in {path}: {reason}")]
    HeaderInvalid { path: PathBuf, reason: String },

    #[error("Unsupported index header version: {0}")]
    UnsupportedHeaderVersion(u32),

    #[error("Master key too long: {0} bytes")]
    MasterKeyTooLong(usize),

    #[error("Master key required to create index for ledger {0}")]
    MasterKeyRequired(LedgerId),

    // Cache lifecycle errors
    #[error("File info for ledger {ledger_id} (generation {generation}) already retired")]
    AlreadyRetired { ledger_id: LedgerId, generation: u64 },

    #[error("Failed to close file info for ledger {ledger_id} during shutdown: {source}")]
    ShutdownClose {
        ledger_id: LedgerId,
        #[source]
        source: Box<LedgerError>,
    },

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    User(String),
}

impl LedgerError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a header validation error
    pub fn header(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::HeaderInvalid {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Check if the error means the ledger has no backing index
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NoLedger(_) | Self::LedgerDeleted(_))
    }

    /// Check if the error is a cache lifecycle misuse by the caller
    pub fn is_already_retired(&self) -> bool {
        matches!(self, Self::AlreadyRetired { .. })
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::NoLedger(_) => Some("Create it first: ledger-index create <id> --master-key <key>"),
            Self::MasterKeyRequired(_) => Some("Pass --master-key when creating a ledger"),
            Self::UnsupportedHeaderVersion(_) => Some("Supported header versions are 0 and 1"),
            Self::ConfigInvalid { .. } => Some("Run: ledger-index config init --force"),
            _ => None,
        }
    }
}
