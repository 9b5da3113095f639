//! Errors the gateway turns into HTTP responses.

use crate::error::LedgerError;
use hyper::StatusCode;
use thiserror::Error;

/// Errors that can occur while handling a request.
#[derive(Debug, Error)]
pub(crate) enum GatewayError {
    /// The request body is not a JSON object describing a transaction.
    #[error("Malformed request body: {0}")]
    MalformedRequestBody(String),

    /// The request body could not be read to the end.
    #[error("Unable to read the request body: {0}")]
    UnreadableBody(String),

    /// The request body exceeds the size limit.
    #[error("Request body is larger than {0} bytes")]
    BodyTooLarge(usize),

    /// The path segment after `/api/transactions/` is not a transaction id.
    #[error("Invalid transaction id '{0}'")]
    InvalidId(String),

    /// No transaction has the requested id.
    #[error("Transaction {0} not found")]
    TransactionNotFound(u64),

    /// The path is not served.
    #[error("Not Found")]
    NotFound,

    /// The path is served but not for this method.
    #[error("Method Not Allowed")]
    MethodNotAllowed { allow: &'static str },

    /// The ledger failed.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// A response could not be produced.
    #[error("{0}")]
    Internal(String),
}

impl GatewayError {
    /// Returns the HTTP status code for this error.
    ///
    /// - Malformed or unreadable body, invalid id: 400 Bad Request
    /// - Body too large: 413 Payload Too Large
    /// - Unknown path or transaction: 404 Not Found
    /// - Wrong method: 405 Method Not Allowed
    /// - Ledger or encoding failure: 500 Internal Server Error
    pub(crate) fn status_code(&self) -> StatusCode {
        match self {
            Self::MalformedRequestBody(_) | Self::UnreadableBody(_) | Self::InvalidId(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::BodyTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::TransactionNotFound(_) | Self::NotFound => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            Self::Ledger(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The plain-text body sent to the client. Ledger failures are described in the log only.
    pub(crate) fn client_message(&self) -> String {
        match self {
            Self::Ledger(_) => "Internal Server Error: the transaction was not stored".to_string(),
            Self::Internal(_) => "Internal Server Error".to_string(),
            other => other.to_string(),
        }
    }
}
