use crate::model::{Amount, Transaction};
use serde::{Deserialize, Serialize};

/// Totals derived from the ledger.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    /// The number of transactions in the ledger.
    pub count: usize,
    /// The sum of all positive amounts.
    pub income: Amount,
    /// The sum of all negative amounts. This is zero or negative.
    pub expenses: Amount,
    /// `income + expenses`.
    pub balance: Amount,
}

impl Summary {
    pub fn from_transactions<'a>(transactions: impl IntoIterator<Item = &'a Transaction>) -> Self {
        let mut summary = Summary::default();
        for t in transactions {
            summary.count += 1;
            if t.amount.is_negative() {
                summary.expenses += t.amount;
            } else {
                summary.income += t.amount;
            }
        }
        summary.balance = summary.income + summary.expenses;
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NewTransaction;
    use std::str::FromStr;

    fn t(id: u64, amount: &str) -> Transaction {
        Transaction::from_new(
            id,
            NewTransaction::new("x", Amount::from_str(amount).unwrap(), "c", "2024-01-01"),
        )
    }

    #[test]
    fn test_summary_empty() {
        let summary = Summary::from_transactions(&Vec::<Transaction>::new());
        assert_eq!(summary, Summary::default());
    }

    #[test]
    fn test_summary_totals() {
        let data = vec![t(1, "-4.50"), t(2, "2500"), t(3, "-120.25"), t(4, "0")];
        let summary = Summary::from_transactions(&data);
        assert_eq!(summary.count, 4);
        assert_eq!(summary.income, Amount::from_str("2500").unwrap());
        assert_eq!(summary.expenses, Amount::from_str("-124.75").unwrap());
        assert_eq!(summary.balance, Amount::from_str("2375.25").unwrap());
    }
}
