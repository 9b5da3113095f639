use crate::commands::Out;
use crate::{Config, LedgerStore, Result};
use anyhow::Context;
use std::net::SocketAddr;
use std::path::Path;

/// Creates the ledger home directory, its subdirectories and:
/// - Creates an initial `config.json` file with default settings and the given bind address
/// - Creates an empty ledger document, `transactions.json`
///
/// # Arguments
/// - `ledger_home` - The directory that will be the root of data directory, e.g. `$HOME/ledger`
/// - `bind` - The address `ledger serve` will listen on. Defaults to `127.0.0.1:8080`.
///
/// # Errors
/// - Returns an error if `config.json` already exists or if any file operations fail.
pub async fn init(ledger_home: &Path, bind: Option<SocketAddr>) -> Result<Out<()>> {
    let config = Config::create(ledger_home, bind)
        .await
        .context("Unable to create the data directory and configs")?;
    let store = LedgerStore::open(config.ledger_path())
        .await
        .context("Unable to create the ledger")?;
    Ok(format!(
        "Successfully created the ledger home directory at '{}' with ledger '{}'",
        config.root().display(),
        store.path().display()
    )
    .into())
}
