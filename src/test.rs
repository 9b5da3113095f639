//! Shared test utilities for creating test environments.
//!
//! This module is only compiled when running tests (`#[cfg(test)]`).

use crate::model::{Amount, NewTransaction, Transaction};
use crate::{Config, LedgerStore};
use tempfile::TempDir;

/// Test environment that sets up a ledger home directory with a Config and an empty ledger.
/// Holds TempDir to keep the directory alive for the duration of the test.
pub struct TestEnv {
    _temp_dir: TempDir,
    config: Config,
}

impl TestEnv {
    /// Creates a test environment with a Config and an empty ledger document.
    pub async fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("ledger");
        let config = Config::create(&root, None).await.unwrap();
        // Opening creates the empty document, dropping releases the lock.
        LedgerStore::open(config.ledger_path()).await.unwrap();

        Self {
            _temp_dir: temp_dir,
            config,
        }
    }

    /// Returns a clone of the Config.
    pub fn config(&self) -> Config {
        self.config.clone()
    }

    /// Opens the ledger, the way a freshly started process would. Only one store can be open at a
    /// time, so drop it before opening another.
    pub async fn store(&self) -> LedgerStore {
        LedgerStore::open(self.config.ledger_path()).await.unwrap()
    }

    /// Appends a transaction with the given description and amount, dated 2024-01-01.
    pub async fn insert_test_transaction(
        &self,
        description: &str,
        amount: &str,
        category: &str,
    ) -> Transaction {
        let amount: Amount = amount.parse().unwrap();
        self.store()
            .await
            .append(NewTransaction::new(description, amount, category, "2024-01-01"))
            .await
            .unwrap()
    }
}
