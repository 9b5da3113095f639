//! Converts the ordered transaction collection to and from the JSON document stored on disk.
//!
//! The document is a JSON array of transaction objects in ledger order. An empty (or
//! whitespace-only) document decodes to an empty ledger.

use crate::error::LedgerError;
use crate::model::Transaction;
use std::collections::HashSet;

/// Serializes `transactions` as a pretty-printed JSON array followed by a newline.
pub fn encode(transactions: &[Transaction]) -> Result<Vec<u8>, LedgerError> {
    let mut bytes = serde_json::to_vec_pretty(transactions)
        .map_err(|e| LedgerError::malformed("Unable to encode the ledger", Some(e)))?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Parses a ledger document. The result is either the complete collection or an error, never a
/// partially populated collection.
///
/// # Errors
/// - `MalformedDocument` if the bytes are not a JSON array of transactions or if two records share
///   an identifier.
pub fn decode(bytes: &[u8]) -> Result<Vec<Transaction>, LedgerError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }

    let transactions: Vec<Transaction> = serde_json::from_slice(bytes).map_err(|e| {
        LedgerError::malformed("Expected a JSON array of transactions", Some(e))
    })?;

    let mut seen = HashSet::with_capacity(transactions.len());
    for t in &transactions {
        if !seen.insert(t.id()) {
            return Err(LedgerError::malformed(
                format!("Transaction id {} appears more than once", t.id()),
                None,
            ));
        }
    }

    Ok(transactions)
}
