//! Command handlers for the ledger CLI.
//!
//! This module contains implementations for all CLI subcommands.

mod add;
mod init;
mod list;
mod serve;
mod summary;

use crate::model::Transaction;
use crate::{store, Config, LedgerStore, Result};
use anyhow::Context;
use serde::Serialize;
use std::fmt::Debug;
use tracing::info;

pub use add::add;
pub use init::init;
pub use list::{list, show};
pub use serve::serve;
pub use summary::summary;

/// The output type for a command. This allows the command to return a consistent message and,
/// optionally, structured data to print to the command line.
#[derive(Debug, Clone, Serialize)]
pub struct Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// A message that can be printed to the user regarding the outcome of the command execution.
    message: String,

    /// Any structured data that needs to be output from the call.
    structure: Option<T>,
}

impl<T, S> From<S> for Out<T>
where
    T: Debug + Clone + Serialize,
    S: Into<String>,
{
    fn from(value: S) -> Self {
        Out::new_message(value)
    }
}

impl<T> Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// Create a new `Out` object that has `Some(structure)`.
    pub fn new<S>(message: S, structure: T) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: Some(structure),
        }
    }

    /// Create a new `Out` object that has `None` for `structure`.
    pub fn new_message<S>(message: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: None,
        }
    }

    /// Get the `message`.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the structured data stored in `structure`.
    pub fn structure(&self) -> Option<&T> {
        self.structure.as_ref()
    }

    /// Print the message to `info!` and the structured data (if it exists) as JSON to stdout.
    /// Logs go to stderr, so stdout can be piped into other tools.
    pub fn print(&self) {
        info!("{}", self.message);
        if let Some(structure) = self.structure() {
            if let Ok(json) = serde_json::to_string_pretty(structure) {
                println!("{json}");
            }
        }
    }
}

/// Opens the ledger for appending. Fails while another process, e.g. `ledger serve`, has it open.
async fn open(config: &Config) -> Result<LedgerStore> {
    LedgerStore::open(config.ledger_path())
        .await
        .context("Unable to open the ledger")
}

/// Reads the ledger without locking it, so it works while `ledger serve` is running.
async fn load(config: &Config) -> Result<Vec<Transaction>> {
    store::load(&config.ledger_path())
        .await
        .context("Unable to read the ledger")
}
