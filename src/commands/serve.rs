use crate::commands::Out;
use crate::gateway::Gateway;
use crate::store::Ledger;
use crate::{Config, LedgerStore, Result};
use anyhow::Context;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Serves the HTTP API until the process receives Ctrl-C.
///
/// Before the ledger is opened it is copied into the backups directory. The ledger is then opened
/// (a malformed document stops the server from starting) and the gateway listens on `bind`, or on
/// the address in `config.json` when `bind` is `None`.
///
/// # Errors
/// - Returns an error if the backup fails, the ledger cannot be opened or the address cannot be
///   bound.
pub async fn serve(config: Config, bind: Option<SocketAddr>) -> Result<Out<()>> {
    serve_until(config, bind, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Unable to listen for Ctrl-C, the server must be killed to stop it: {e}");
            std::future::pending::<()>().await;
        }
    })
    .await
}

pub(super) async fn serve_until(
    config: Config,
    bind: Option<SocketAddr>,
    shutdown: impl Future<Output = ()>,
) -> Result<Out<()>> {
    match config.backup().copy_ledger().await? {
        Some(path) => info!("Backed up the ledger to {}", path.display()),
        None => warn!("There is no ledger to back up yet"),
    }

    let store = LedgerStore::open(config.ledger_path())
        .await
        .context("Unable to open the ledger")?;
    let ledger: Arc<dyn Ledger> = Arc::new(store);

    let addr = bind.unwrap_or_else(|| config.bind_address());
    let gateway = Gateway::bind(addr, ledger).await?;
    let local = gateway.local_addr()?;
    gateway.serve(shutdown).await?;

    Ok(format!("Stopped serving on {local}").into())
}
