//! These structs provide the CLI interface for the ledger CLI.

use crate::model::{Amount, TransactionId};
use clap::{Parser, Subcommand};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::net::SocketAddr;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;

/// ledger: A small personal finance ledger with an HTTP API.
///
/// Income and expense records are kept in a single JSON document inside the ledger home
/// directory. Run `ledger init` once to create the directory, then `ledger serve` to start the
/// HTTP server that a web frontend talks to. The remaining subcommands read from and append to the
/// same document from the command line.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the ledger home directory, its configuration file and an empty ledger.
    ///
    /// This is the first command you should run. By default the ledger home is $HOME/ledger, pass
    /// --ledger-home or set LEDGER_HOME if you want it somewhere else.
    Init(InitArgs),
    /// Back up the ledger and serve the HTTP API until interrupted with Ctrl-C.
    Serve(ServeArgs),
    /// Print every stored transaction as JSON, in insertion order.
    List,
    /// Print a single transaction as JSON.
    Show(ShowArgs),
    /// Append a transaction to the ledger and print it, with its assigned id, as JSON.
    Add(AddArgs),
    /// Print the count, income, expenses and balance of the ledger.
    Summary,
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG. See the tracing-subscriber crate for instructions.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where the ledger and its configuration are held. Defaults to ~/ledger
    #[arg(long, env = "LEDGER_HOME", default_value_t = default_ledger_home())]
    ledger_home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, ledger_home: PathBuf) -> Self {
        Self {
            log_level,
            ledger_home: ledger_home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn ledger_home(&self) -> &DisplayPath {
        &self.ledger_home
    }
}

/// Args for the `ledger init` command.
#[derive(Debug, Parser, Clone)]
pub struct InitArgs {
    /// The address `ledger serve` listens on, written to config.json. Defaults to 127.0.0.1:8080
    #[arg(long)]
    bind: Option<SocketAddr>,
}

impl InitArgs {
    pub fn new(bind: Option<SocketAddr>) -> Self {
        Self { bind }
    }

    pub fn bind(&self) -> Option<SocketAddr> {
        self.bind
    }
}

/// Args for the `ledger serve` command.
#[derive(Debug, Parser, Clone)]
pub struct ServeArgs {
    /// Listen on this address instead of the one in config.json. Use port 0 to let the operating
    /// system choose.
    #[arg(long)]
    bind: Option<SocketAddr>,
}

impl ServeArgs {
    pub fn new(bind: Option<SocketAddr>) -> Self {
        Self { bind }
    }

    pub fn bind(&self) -> Option<SocketAddr> {
        self.bind
    }
}

/// Args for the `ledger show` command.
#[derive(Debug, Parser, Clone)]
pub struct ShowArgs {
    /// The id of the transaction.
    id: TransactionId,
}

impl ShowArgs {
    pub fn new(id: TransactionId) -> Self {
        Self { id }
    }

    pub fn id(&self) -> TransactionId {
        self.id
    }
}

/// Args for the `ledger add` command.
///
/// The id is assigned by the ledger. Negative amounts are expenses, everything else is income.
#[derive(Debug, Parser, Clone)]
pub struct AddArgs {
    /// A free-form description, e.g. "coffee".
    #[arg(long, default_value = "")]
    pub description: String,

    /// The signed amount, e.g. -4.50 or "$1,200.00".
    #[arg(long, allow_hyphen_values = true)]
    pub amount: Amount,

    /// A free-form category, e.g. "food".
    #[arg(long, default_value = "")]
    pub category: String,

    /// The date of the transaction, by convention YYYY-MM-DD. Defaults to today.
    #[arg(long)]
    pub date: Option<String>,
}

fn default_ledger_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("ledger"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --ledger-home or LEDGER_HOME instead of relying on the default \
                ledger home directory. If you continue using the program right now, you may have \
                problems!",
            );
            PathBuf::from("ledger")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn new(path: PathBuf) -> Self {
        Self(path)
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}
