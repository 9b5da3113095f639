use crate::args::AddArgs;
use crate::commands::{open, Out};
use crate::model::{NewTransaction, Transaction};
use crate::{Config, Result};
use anyhow::Context;
use chrono::Local;

/// Appends a transaction to the ledger.
///
/// The id is assigned by the ledger and is one greater than the largest id already stored. When
/// `args.date` is `None` today's date is used.
///
/// # Returns
///
/// On success, returns an `Out` containing the stored transaction with its id.
///
/// # Errors
///
/// - Returns an error if the ledger cannot be opened, which includes while `ledger serve` has it
///   open, or if the write fails. A failed write leaves the ledger unchanged.
pub async fn add(config: Config, args: AddArgs) -> Result<Out<Transaction>> {
    let date = args
        .date
        .unwrap_or_else(|| Local::now().format("%Y-%m-%d").to_string());
    let candidate = NewTransaction::new(args.description, args.amount, args.category, date);

    let store = open(&config).await?;
    let stored = store
        .append(candidate)
        .await
        .context("Unable to add the transaction")?;

    let message = format!("Added transaction with ID: {}", stored.id());
    Ok(Out::new(message, stored))
}
