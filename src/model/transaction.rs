use crate::model::Amount;
use serde::{Deserialize, Serialize};

/// The identifier of a stored transaction. Identifiers are assigned by the store, start at 1 and
/// are never reused.
pub type TransactionId = u64;

/// A single income or expense record as it is stored in the ledger.
#[derive(Default, Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Transaction {
    pub(crate) id: TransactionId,
    #[serde(default)]
    pub(crate) description: String,
    #[serde(default)]
    pub(crate) amount: Amount,
    #[serde(default)]
    pub(crate) category: String,
    #[serde(default)]
    pub(crate) date: String,
}

impl Transaction {
    /// Combines a candidate with the identifier the store allocated for it.
    pub(crate) fn from_new(id: TransactionId, new: NewTransaction) -> Self {
        Self {
            id,
            description: new.description,
            amount: new.amount,
            category: new.category,
            date: new.date,
        }
    }

    pub fn id(&self) -> TransactionId {
        self.id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn date(&self) -> &str {
        &self.date
    }
}

/// A transaction that has not been stored yet, so it has no identifier.
///
/// When deserializing, any `id` in the payload is ignored and missing fields take their default
/// value. The store always assigns the identifier.
#[derive(Default, Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct NewTransaction {
    pub(crate) description: String,
    pub(crate) amount: Amount,
    pub(crate) category: String,
    pub(crate) date: String,
}

impl NewTransaction {
    pub fn new(
        description: impl Into<String>,
        amount: Amount,
        category: impl Into<String>,
        date: impl Into<String>,
    ) -> Self {
        Self {
            description: description.into(),
            amount,
            category: category.into(),
            date: date.into(),
        }
    }
}
