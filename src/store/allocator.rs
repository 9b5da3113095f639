//! Hands out transaction identifiers.

use crate::error::LedgerError;
use crate::model::{Transaction, TransactionId};

/// Produces strictly increasing transaction identifiers.
///
/// The allocator is seeded from the persisted ledger so that identifiers never collide across
/// restarts. It is not synchronized on its own; the store owns it inside its exclusive state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct IdAllocator {
    /// `None` once `TransactionId::MAX` is taken.
    next: Option<TransactionId>,
}

impl IdAllocator {
    /// Seeds the allocator with `max(id) + 1`, or `1` for an empty ledger.
    pub(crate) fn seeded(transactions: &[Transaction]) -> Self {
        let next = match transactions.iter().map(Transaction::id).max() {
            Some(max) => max.checked_add(1),
            None => Some(1),
        };
        Self { next }
    }

    /// Returns the identifier the next call to `next` will issue.
    pub(crate) fn peek(&self) -> Option<TransactionId> {
        self.next
    }

    /// Issues an identifier and advances.
    ///
    /// # Errors
    /// - `IdsExhausted` if every identifier up to `TransactionId::MAX` has been issued.
    pub(crate) fn next(&mut self) -> Result<TransactionId, LedgerError> {
        let id = self.next.ok_or(LedgerError::IdsExhausted)?;
        self.next = id.checked_add(1);
        Ok(id)
    }

    /// Takes back the identifier most recently issued by `next` so that it is issued again.
    pub(crate) fn rollback(&mut self, id: TransactionId) {
        debug_assert_eq!(
            id.checked_add(1),
            self.next,
            "only the last issued id can be rolled back"
        );
        self.next = Some(id);
    }
}
