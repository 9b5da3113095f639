//! A small personal finance ledger.
//!
//! Transactions are stored in a single JSON document that is replaced atomically on every append.
//! [`LedgerStore`] owns that document and serializes writers, the `gateway` serves it over HTTP
//! and [`commands`] expose it on the command line.

pub mod args;
mod backup;
pub mod codec;
pub mod commands;
mod config;
mod error;
mod gateway;
pub mod model;
pub mod store;
mod utils;

#[cfg(test)]
mod test;

pub use config::Config;
pub use error::Error;
pub use error::LedgerError;
pub use error::Result;
pub use gateway::Gateway;
pub use store::{Ledger, LedgerStore};
