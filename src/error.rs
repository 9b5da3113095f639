//! Error types.
//!
//! The application layer (config, commands, `main`) works with `anyhow` and attaches context as
//! errors bubble up. The ledger core returns `LedgerError` so that callers, the HTTP gateway in
//! particular, can tell a corrupt document apart from a failed write.

use crate::model::TransactionId;
use std::path::{Path, PathBuf};

pub type Error = anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the ledger codec and store.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// The ledger document could not be parsed. The store refuses to open in this case because the
    /// integrity of the collection cannot be assumed.
    #[error("Malformed ledger document{}: {message}", display_path(.path))]
    MalformedDocument {
        path: Option<PathBuf>,
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    /// A durable write of the ledger did not complete. Nothing was published and the identifier
    /// that was allocated for the write is handed out again on the next append.
    #[error("Unable to persist the ledger to {}: {source}", .path.display())]
    PersistenceFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The ledger file could not be opened or created.
    #[error("Unable to open the ledger at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Another store, usually another process, has the ledger open for writing.
    #[error(
        "The ledger at {} is in use by another process, stop it or append through its HTTP API",
        .path.display()
    )]
    Locked { path: PathBuf },

    /// The largest possible identifier has already been issued.
    #[error("No transaction ids are left, the id {} is already in use", TransactionId::MAX)]
    IdsExhausted,
}

impl LedgerError {
    pub(crate) fn malformed(message: impl Into<String>, source: Option<serde_json::Error>) -> Self {
        Self::MalformedDocument {
            path: None,
            message: message.into(),
            source,
        }
    }

    pub(crate) fn persistence(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::PersistenceFailure {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Attaches the document path to a `MalformedDocument` error. Other variants already carry one.
    pub(crate) fn at(self, p: &Path) -> Self {
        match self {
            Self::MalformedDocument {
                message, source, ..
            } => Self::MalformedDocument {
                path: Some(p.to_path_buf()),
                message,
                source,
            },
            other => other,
        }
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::MalformedDocument { .. })
    }

    pub fn is_persistence_failure(&self) -> bool {
        matches!(self, Self::PersistenceFailure { .. })
    }

    pub fn is_locked(&self) -> bool {
        matches!(self, Self::Locked { .. })
    }
}

fn display_path(path: &Option<PathBuf>) -> String {
    match path {
        Some(p) => format!(" at {}", p.display()),
        None => String::new(),
    }
}
