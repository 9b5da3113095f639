//! The transaction ledger store.
//!
//! `LedgerStore` owns the ledger file. Appends are serialized by a single lock over the identifier
//! allocator and each append rewrites the whole document with an atomic publish. Readers are served
//! from a snapshot that is replaced only after the new document is durably on disk, so they see
//! either the state before an append or the state after it.
//!
//! Only one store may have a ledger open at a time. `open` takes an exclusive lock on a sibling
//! `<ledger>.lock` file and holds it until the last clone of the store is dropped, so a second
//! process cannot write over the first one's appends. Reading the document with [`load`] does not
//! need the lock.

mod allocator;
mod file;

use crate::codec;
use crate::error::LedgerError;
use crate::model::{NewTransaction, Summary, Transaction, TransactionId};
use allocator::IdAllocator;
use std::fs::{File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tracing::{debug, error, info, warn};

/// The operations the rest of the program needs from a ledger. The HTTP gateway and the CLI
/// commands are written against this trait.
#[async_trait::async_trait]
pub trait Ledger: Send + Sync {
    /// Returns every stored transaction in ledger order.
    async fn read_all(&self) -> Vec<Transaction>;

    /// Returns the transaction with the given identifier, if there is one.
    async fn get(&self, id: TransactionId) -> Option<Transaction>;

    /// Stores `candidate` under a newly allocated identifier and returns the stored record.
    async fn append(&self, candidate: NewTransaction) -> Result<Transaction, LedgerError>;

    /// Computes totals over the current ledger.
    async fn summary(&self) -> Summary {
        Summary::from_transactions(&self.read_all().await)
    }
}

/// A ledger persisted as a single JSON document. Cloning is cheap and clones share state.
#[derive(Debug, Clone)]
pub struct LedgerStore {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    path: PathBuf,
    /// Holds the exclusive lock on `<ledger>.lock` for the lifetime of the store.
    _lock: File,
    /// Held for the whole read-modify-publish sequence of an append.
    writer: Arc<Mutex<IdAllocator>>,
    /// The last published collection. Only replaced while `writer` is held.
    snapshot: RwLock<Arc<Vec<Transaction>>>,
}

impl LedgerStore {
    /// Opens the ledger at `path`, creating its directory and an empty document if needed.
    ///
    /// # Errors
    /// - `Locked` if another store already has the ledger open.
    /// - `MalformedDocument` if the existing file cannot be parsed. The file is left untouched.
    /// - `Io` if the file or its directory cannot be read or created.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, LedgerError> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| LedgerError::io(parent, e))?;
        }
        let lock_file = lock(&path)?;

        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                file::publish(&path, codec::encode(&[])?)
                    .await
                    .map_err(|e| LedgerError::io(&path, e))?;
                info!("Created empty ledger at {}", path.display());
                Vec::new()
            }
            Err(e) => return Err(LedgerError::io(&path, e)),
        };

        let transactions = codec::decode(&bytes).map_err(|e| e.at(&path))?;
        let allocator = IdAllocator::seeded(&transactions);
        info!(
            "Loaded {} transactions from {}",
            transactions.len(),
            path.display()
        );
        match allocator.peek() {
            Some(id) => debug!("The next transaction id is {id}"),
            None => warn!("Every transaction id is in use, appends will fail"),
        }

        Ok(Self {
            inner: Arc::new(Inner {
                path,
                _lock: lock_file,
                writer: Arc::new(Mutex::new(allocator)),
                snapshot: RwLock::new(Arc::new(transactions)),
            }),
        })
    }

    /// The path of the ledger document.
    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    /// Returns the current persisted collection in ledger order.
    pub async fn read_all(&self) -> Vec<Transaction> {
        self.snapshot().await.as_ref().clone()
    }

    /// Returns the transaction with identifier `id`.
    pub async fn get(&self, id: TransactionId) -> Option<Transaction> {
        self.snapshot().await.iter().find(|t| t.id() == id).cloned()
    }

    /// Returns totals over the current collection.
    pub async fn summary(&self) -> Summary {
        Summary::from_transactions(self.snapshot().await.iter())
    }

    /// Appends `candidate` with a newly allocated identifier and durably publishes the ledger
    /// before returning the stored record.
    ///
    /// If the caller stops waiting before the append acquires the lock, nothing happens. Once the
    /// lock is acquired the append finishes on its own task whether or not anyone awaits it.
    ///
    /// # Errors
    /// - `PersistenceFailure` if the document could not be written. The ledger is unchanged and the
    ///   identifier is issued again by the next append.
    pub async fn append(&self, candidate: NewTransaction) -> Result<Transaction, LedgerError> {
        let allocator = Arc::clone(&self.inner.writer).lock_owned().await;
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move { inner.append_locked(allocator, candidate).await })
            .await
            .map_err(|e| LedgerError::persistence(self.path(), std::io::Error::other(e)))?
    }

    async fn snapshot(&self) -> Arc<Vec<Transaction>> {
        Arc::clone(&*self.inner.snapshot.read().await)
    }
}

impl Inner {
    async fn append_locked(
        &self,
        mut allocator: OwnedMutexGuard<IdAllocator>,
        candidate: NewTransaction,
    ) -> Result<Transaction, LedgerError> {
        let id = allocator.next().inspect_err(|e| error!("Append failed: {e}"))?;
        let stored = Transaction::from_new(id, candidate);

        let base = Arc::clone(&*self.snapshot.read().await);
        let mut next = Vec::with_capacity(base.len() + 1);
        next.extend_from_slice(&base);
        next.push(stored.clone());

        let written = match codec::encode(&next) {
            Ok(bytes) => file::publish(&self.path, bytes)
                .await
                .map_err(|e| LedgerError::persistence(&self.path, e)),
            Err(e) => Err(e),
        };

        if let Err(e) = written {
            allocator.rollback(id);
            error!("Append of transaction {id} failed: {e}");
            return Err(e);
        }

        *self.snapshot.write().await = Arc::new(next);
        debug!("Appended transaction {id} to {}", self.path.display());
        Ok(stored)
    }
}

/// Reads the ledger document at `path` without opening a store. A missing document is an empty
/// ledger. Appends replace the document atomically, so this sees a complete collection even while
/// a store in another process is writing.
///
/// # Errors
/// - `MalformedDocument` if the file cannot be parsed.
/// - `Io` if the file cannot be read.
pub async fn load(path: &Path) -> Result<Vec<Transaction>, LedgerError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => codec::decode(&bytes).map_err(|e| e.at(path)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(LedgerError::io(path, e)),
    }
}

/// Takes the exclusive lock on the `.lock` file next to `path` without waiting for it.
fn lock(path: &Path) -> Result<File, LedgerError> {
    let mut lock_path = path.as_os_str().to_owned();
    lock_path.push(".lock");
    let lock_path = PathBuf::from(lock_path);

    let file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .read(true)
        .write(true)
        .open(&lock_path)
        .map_err(|e| LedgerError::io(&lock_path, e))?;
    match fs2::FileExt::try_lock_exclusive(&file) {
        Ok(()) => Ok(file),
        Err(e) if e.raw_os_error() == fs2::lock_contended_error().raw_os_error() => {
            Err(LedgerError::Locked {
                path: path.to_path_buf(),
            })
        }
        Err(e) => Err(LedgerError::io(&lock_path, e)),
    }
}

#[async_trait::async_trait]
impl Ledger for LedgerStore {
    async fn read_all(&self) -> Vec<Transaction> {
        LedgerStore::read_all(self).await
    }

    async fn get(&self, id: TransactionId) -> Option<Transaction> {
        LedgerStore::get(self, id).await
    }

    async fn append(&self, candidate: NewTransaction) -> Result<Transaction, LedgerError> {
        LedgerStore::append(self, candidate).await
    }

    async fn summary(&self) -> Summary {
        LedgerStore::summary(self).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Amount;
    use std::collections::BTreeSet;
    use std::str::FromStr;
    use std::time::Duration;
    use tempfile::TempDir;

    fn coffee() -> NewTransaction {
        NewTransaction::new(
            "coffee",
            Amount::from_str("-4.50").unwrap(),
            "food",
            "2024-01-01",
        )
    }

    fn ledger_path(dir: &TempDir) -> PathBuf {
        dir.path().join("data").join("transactions.json")
    }

    #[tokio::test]
    async fn test_open_creates_empty_ledger() {
        let dir = TempDir::new().unwrap();
        let path = ledger_path(&dir);
        let store = LedgerStore::open(&path).await.unwrap();
        assert!(store.read_all().await.is_empty());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[]\n");
    }

    #[tokio::test]
    async fn test_append_scenario() {
        let dir = TempDir::new().unwrap();
        let store = LedgerStore::open(ledger_path(&dir)).await.unwrap();

        let first = store.append(coffee()).await.unwrap();
        assert_eq!(first.id(), 1);
        assert_eq!(first.description(), "coffee");
        assert_eq!(first.amount(), Amount::from_str("-4.50").unwrap());
        assert_eq!(first.category(), "food");
        assert_eq!(first.date(), "2024-01-01");

        let second = store.append(coffee()).await.unwrap();
        assert_eq!(second.id(), 2);

        assert_eq!(store.read_all().await, vec![first, second]);
    }

    #[tokio::test]
    async fn test_read_all_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = LedgerStore::open(ledger_path(&dir)).await.unwrap();
        store.append(coffee()).await.unwrap();
        assert_eq!(store.read_all().await, store.read_all().await);
    }

    #[tokio::test]
    async fn test_get() {
        let dir = TempDir::new().unwrap();
        let store = LedgerStore::open(ledger_path(&dir)).await.unwrap();
        let stored = store.append(coffee()).await.unwrap();
        assert_eq!(store.get(1).await, Some(stored));
        assert_eq!(store.get(2).await, None);
    }

    #[tokio::test]
    async fn test_restart_durability() {
        let dir = TempDir::new().unwrap();
        let path = ledger_path(&dir);
        {
            let store = LedgerStore::open(&path).await.unwrap();
            store.append(coffee()).await.unwrap();
            store.append(coffee()).await.unwrap();
            store.append(coffee()).await.unwrap();
        }

        let reopened = LedgerStore::open(&path).await.unwrap();
        let ids: Vec<u64> = reopened.read_all().await.iter().map(|t| t.id()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(reopened.append(coffee()).await.unwrap().id(), 4);
    }

    #[tokio::test]
    async fn test_seed_from_existing_max_id() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("transactions.json");
        std::fs::write(
            &path,
            r#"[{"id":7,"description":"a","amount":1,"category":"x","date":"2024-01-01"},
                {"id":3,"description":"b","amount":2,"category":"x","date":"2024-01-02"}]"#,
        )
        .unwrap();

        let store = LedgerStore::open(&path).await.unwrap();
        assert_eq!(store.append(coffee()).await.unwrap().id(), 8);
    }

    #[tokio::test]
    async fn test_open_malformed_is_fatal() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("transactions.json");
        std::fs::write(&path, r#"[{"id":1,"description":"trunc"#).unwrap();

        let err = LedgerStore::open(&path).await.unwrap_err();
        assert!(err.is_malformed());
        assert!(err.to_string().contains("transactions.json"));
        // The corrupt document is left as it was.
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            r#"[{"id":1,"description":"trunc"#
        );
    }

    #[tokio::test]
    async fn test_open_empty_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("transactions.json");
        std::fs::write(&path, "").unwrap();
        let store = LedgerStore::open(&path).await.unwrap();
        assert!(store.read_all().await.is_empty());
        assert_eq!(store.append(coffee()).await.unwrap().id(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_appends() {
        const N: u64 = 64;
        let dir = TempDir::new().unwrap();
        let path = ledger_path(&dir);
        let store = LedgerStore::open(&path).await.unwrap();

        let mut handles = Vec::new();
        for i in 0..N {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let candidate = NewTransaction::new(
                    format!("item {i}"),
                    Amount::from(rust_decimal::Decimal::from(i)),
                    "test",
                    "2024-01-01",
                );
                store.append(candidate).await.unwrap()
            }));
        }
        let mut returned = BTreeSet::new();
        for handle in handles {
            returned.insert(handle.await.unwrap().id());
        }

        let expected: BTreeSet<u64> = (1..=N).collect();
        assert_eq!(returned, expected);

        let in_memory: BTreeSet<u64> = store.read_all().await.iter().map(|t| t.id()).collect();
        assert_eq!(in_memory, expected);
        assert_eq!(store.read_all().await.len(), N as usize);

        drop(store);
        let reopened = LedgerStore::open(&path).await.unwrap();
        let on_disk: Vec<u64> = reopened.read_all().await.iter().map(|t| t.id()).collect();
        assert_eq!(on_disk.len(), N as usize);
        assert_eq!(on_disk.into_iter().collect::<BTreeSet<_>>(), expected);
    }

    #[tokio::test]
    async fn test_failed_write_rolls_back() {
        let dir = TempDir::new().unwrap();
        let data_dir = dir.path().join("data");
        let path = data_dir.join("transactions.json");
        let store = LedgerStore::open(&path).await.unwrap();
        store.append(coffee()).await.unwrap();
        let before = store.read_all().await;

        // Removing the directory makes the temporary file impossible to create.
        std::fs::remove_dir_all(&data_dir).unwrap();
        let err = store.append(coffee()).await.unwrap_err();
        assert!(err.is_persistence_failure());
        assert_eq!(store.read_all().await, before);

        std::fs::create_dir_all(&data_dir).unwrap();
        let retried = store.append(coffee()).await.unwrap();
        assert_eq!(retried.id(), 2);

        let ids: Vec<u64> = load(&path).await.unwrap().iter().map(|t| t.id()).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_cancelled_append_still_completes() {
        let dir = TempDir::new().unwrap();
        let path = ledger_path(&dir);
        let store = LedgerStore::open(&path).await.unwrap();

        // A zero timeout polls the append once, which takes the lock and starts the write, and then
        // drops it.
        let _ = tokio::time::timeout(Duration::ZERO, store.append(coffee())).await;

        // The next append has to wait for the abandoned one, which still finishes.
        let next = store.append(coffee()).await.unwrap();
        assert_eq!(next.id(), 2);
        assert_eq!(store.read_all().await.len(), 2);
    }

    #[tokio::test]
    async fn test_summary() {
        let dir = TempDir::new().unwrap();
        let store = LedgerStore::open(ledger_path(&dir)).await.unwrap();
        store.append(coffee()).await.unwrap();
        store
            .append(NewTransaction::new(
                "pay",
                Amount::from_str("100").unwrap(),
                "salary",
                "2024-01-02",
            ))
            .await
            .unwrap();
        let summary = Ledger::summary(&store).await;
        assert_eq!(summary.count, 2);
        assert_eq!(summary.balance, Amount::from_str("95.50").unwrap());
    }

    #[tokio::test]
    async fn test_second_open_is_refused() {
        let dir = TempDir::new().unwrap();
        let path = ledger_path(&dir);
        let server = LedgerStore::open(&path).await.unwrap();
        server.append(coffee()).await.unwrap();

        let err = LedgerStore::open(&path).await.unwrap_err();
        assert!(err.is_locked(), "unexpected error: {err}");
        assert!(err.to_string().contains("in use by another process"));

        // The first store keeps appending without anything written over it.
        assert_eq!(server.append(coffee()).await.unwrap().id(), 2);
        assert_eq!(load(&path).await.unwrap().len(), 2);

        // Clones share the lock, so it is released only when the last one is dropped.
        let clone = server.clone();
        drop(server);
        assert!(LedgerStore::open(&path).await.unwrap_err().is_locked());
        drop(clone);
        let reopened = LedgerStore::open(&path).await.unwrap();
        assert_eq!(reopened.append(coffee()).await.unwrap().id(), 3);
    }

    #[tokio::test]
    async fn test_load_without_lock() {
        let dir = TempDir::new().unwrap();
        let path = ledger_path(&dir);
        assert!(load(&path).await.unwrap().is_empty());

        let store = LedgerStore::open(&path).await.unwrap();
        let stored = store.append(coffee()).await.unwrap();
        assert_eq!(load(&path).await.unwrap(), vec![stored]);
    }

    #[tokio::test]
    async fn test_append_after_max_id_is_refused() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("transactions.json");
        let document = format!(
            r#"[{{"id":{},"description":"last","amount":1,"category":"x","date":"2024-01-01"}}]"#,
            u64::MAX
        );
        std::fs::write(&path, &document).unwrap();

        let store = LedgerStore::open(&path).await.unwrap();
        let err = store.append(coffee()).await.unwrap_err();
        assert!(matches!(err, LedgerError::IdsExhausted), "unexpected error: {err}");
        assert_eq!(store.read_all().await.len(), 1);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), document);

        // The ledger still opens after the refused append.
        drop(store);
        assert_eq!(LedgerStore::open(&path).await.unwrap().read_all().await.len(), 1);
    }
}
