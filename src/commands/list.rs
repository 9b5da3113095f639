//! Read-only command handlers.

use crate::commands::{load, Out};
use crate::model::{Transaction, TransactionId};
use crate::{Config, Result};
use anyhow::anyhow;

/// Returns every transaction in the ledger, in insertion order.
pub async fn list(config: Config) -> Result<Out<Vec<Transaction>>> {
    let transactions = load(&config).await?;
    let message = format!("The ledger has {} transactions", transactions.len());
    Ok(Out::new(message, transactions))
}

/// Returns the transaction with the given `id`.
///
/// # Errors
/// - Returns an error if no transaction has that id.
pub async fn show(config: Config, id: TransactionId) -> Result<Out<Transaction>> {
    let transaction = load(&config)
        .await?
        .into_iter()
        .find(|t| t.id() == id)
        .ok_or_else(|| anyhow!("Transaction {id} not found"))?;
    Ok(Out::new(format!("Found transaction {id}"), transaction))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::TestEnv;

    #[tokio::test]
    async fn test_list_empty() {
        let env = TestEnv::new().await;
        let out = list(env.config()).await.unwrap();
        assert!(out.structure().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_in_order() {
        let env = TestEnv::new().await;
        env.insert_test_transaction("salary", "1200.00", "income").await;
        env.insert_test_transaction("coffee", "-4.50", "food").await;

        let out = list(env.config()).await.unwrap();
        let descriptions: Vec<&str> = out
            .structure()
            .unwrap()
            .iter()
            .map(|t| t.description())
            .collect();
        assert_eq!(descriptions, vec!["salary", "coffee"]);
        assert_eq!(out.message(), "The ledger has 2 transactions");
    }

    #[tokio::test]
    async fn test_show() {
        let env = TestEnv::new().await;
        let stored = env.insert_test_transaction("coffee", "-4.50", "food").await;

        let out = show(env.config(), stored.id()).await.unwrap();
        assert_eq!(out.structure().unwrap(), &stored);

        let err = show(env.config(), 42).await.unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[tokio::test]
    async fn test_list_while_ledger_is_open() {
        let env = TestEnv::new().await;
        let server = env.store().await;
        server
            .append(crate::model::NewTransaction::default())
            .await
            .unwrap();

        let out = list(env.config()).await.unwrap();
        assert_eq!(out.structure().unwrap(), &server.read_all().await);
    }
}
