//! Maps requests onto ledger operations.
//!
//! | Method | Path                      | Result                                   |
//! |--------|---------------------------|------------------------------------------|
//! | GET    | `/api/transactions`       | 200, every transaction in ledger order   |
//! | POST   | `/api/transactions`       | 201, the stored transaction with its id  |
//! | GET    | `/api/transactions/{id}`  | 200, one transaction, or 404             |
//! | GET    | `/api/summary`            | 200, income, expenses and balance        |
//! | OPTIONS| any of the above          | 204, CORS preflight                      |
//!
//! Other methods on these paths get 405 and other paths get 404.

use crate::gateway::error::GatewayError;
use crate::model::{NewTransaction, TransactionId};
use crate::store::Ledger;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Body, Bytes};
use hyper::header::{self, HeaderValue};
use hyper::{Method, Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::error::Error as StdError;
use tracing::{debug, error};

/// The largest request body the gateway will read.
pub(crate) const MAX_BODY_BYTES: usize = 1024 * 1024;

const TRANSACTIONS: &str = "/api/transactions";
const TRANSACTIONS_PREFIX: &str = "/api/transactions/";
const SUMMARY: &str = "/api/summary";

const ALLOW_COLLECTION: &str = "GET, POST, OPTIONS";
const ALLOW_READ_ONLY: &str = "GET, OPTIONS";

const JSON: &str = "application/json";
const TEXT: &str = "text/plain; charset=utf-8";

/// Handles a single request against `ledger`. Every outcome, including errors, becomes a response.
pub(crate) async fn handle<B>(req: Request<B>, ledger: &dyn Ledger) -> Response<Full<Bytes>>
where
    B: Body,
    B::Error: Into<Box<dyn StdError + Send + Sync>>,
{
    match route(req, ledger).await {
        Ok(response) => response,
        Err(e) => {
            if let GatewayError::Ledger(inner) = &e {
                error!("Request failed: {inner}");
            } else {
                debug!("Request rejected: {e}");
            }
            error_response(&e)
        }
    }
}

async fn route<B>(req: Request<B>, ledger: &dyn Ledger) -> Result<Response<Full<Bytes>>, GatewayError>
where
    B: Body,
    B::Error: Into<Box<dyn StdError + Send + Sync>>,
{
    let path = req.uri().path().to_string();
    let method = req.method().clone();

    if path == TRANSACTIONS {
        return match method {
            Method::GET => json(StatusCode::OK, &ledger.read_all().await),
            Method::POST => {
                let candidate = read_candidate(req.into_body()).await?;
                let stored = ledger.append(candidate).await?;
                json(StatusCode::CREATED, &stored)
            }
            Method::OPTIONS => Ok(preflight(ALLOW_COLLECTION)),
            _ => Err(GatewayError::MethodNotAllowed {
                allow: ALLOW_COLLECTION,
            }),
        };
    }

    if let Some(segment) = path.strip_prefix(TRANSACTIONS_PREFIX) {
        return match method {
            Method::GET => {
                let id = parse_id(segment)?;
                match ledger.get(id).await {
                    Some(t) => json(StatusCode::OK, &t),
                    None => Err(GatewayError::TransactionNotFound(id)),
                }
            }
            Method::OPTIONS => Ok(preflight(ALLOW_READ_ONLY)),
            _ => Err(GatewayError::MethodNotAllowed {
                allow: ALLOW_READ_ONLY,
            }),
        };
    }

    if path == SUMMARY {
        return match method {
            Method::GET => json(StatusCode::OK, &ledger.summary().await),
            Method::OPTIONS => Ok(preflight(ALLOW_READ_ONLY)),
            _ => Err(GatewayError::MethodNotAllowed {
                allow: ALLOW_READ_ONLY,
            }),
        };
    }

    Err(GatewayError::NotFound)
}

/// Reads the whole body and decodes it. The ledger is only called once this has succeeded.
async fn read_candidate<B>(body: B) -> Result<NewTransaction, GatewayError>
where
    B: Body,
    B::Error: Into<Box<dyn StdError + Send + Sync>>,
{
    let bytes = match Limited::new(body, MAX_BODY_BYTES).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
            return Err(GatewayError::BodyTooLarge(MAX_BODY_BYTES))
        }
        Err(e) => return Err(GatewayError::UnreadableBody(e.to_string())),
    };
    let object: Map<String, Value> = serde_json::from_slice(&bytes)
        .map_err(|e| GatewayError::MalformedRequestBody(e.to_string()))?;
    NewTransaction::deserialize(Value::Object(object))
        .map_err(|e| GatewayError::MalformedRequestBody(e.to_string()))
}

fn parse_id(segment: &str) -> Result<TransactionId, GatewayError> {
    segment
        .parse()
        .map_err(|_| GatewayError::InvalidId(segment.to_string()))
}

fn json<T: Serialize>(status: StatusCode, value: &T) -> Result<Response<Full<Bytes>>, GatewayError> {
    let body = serde_json::to_vec(value)
        .map_err(|e| GatewayError::Internal(format!("Unable to encode response: {e}")))?;
    Ok(response(status, JSON, Bytes::from(body)))
}

fn preflight(allow: &'static str) -> Response<Full<Bytes>> {
    let mut r = response(StatusCode::NO_CONTENT, TEXT, Bytes::new());
    let headers = r.headers_mut();
    headers.insert(header::ALLOW, HeaderValue::from_static(allow));
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(allow),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("content-type"),
    );
    r
}

fn error_response(e: &GatewayError) -> Response<Full<Bytes>> {
    let mut r = response(e.status_code(), TEXT, Bytes::from(e.client_message()));
    if let GatewayError::MethodNotAllowed { allow } = e {
        r.headers_mut()
            .insert(header::ALLOW, HeaderValue::from_static(*allow));
    }
    r
}

fn response(status: StatusCode, content_type: &'static str, body: Bytes) -> Response<Full<Bytes>> {
    let mut r = Response::new(Full::new(body));
    *r.status_mut() = status;
    let headers = r.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    r
}
