use crate::commands::{load, Out};
use crate::model::Summary;
use crate::{Config, Result};

/// Totals the ledger: the number of transactions, income (non-negative amounts), expenses
/// (negative amounts) and the resulting balance.
pub async fn summary(config: Config) -> Result<Out<Summary>> {
    let summary = Summary::from_transactions(&load(&config).await?);
    let message = format!(
        "{} transactions, income {}, expenses {}, balance {}",
        summary.count,
        summary.income.formatted(),
        summary.expenses.formatted(),
        summary.balance.formatted()
    );
    Ok(Out::new(message, summary))
}
