use serde::de::DeserializeOwned;
use sled::{Batch, Db, Tree};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::index::IndexStore;

const SNAPSHOT_TREE: &str = "snapshot";

// The four artifacts of one snapshot
const POSTINGS_KEY: &str = "postings";
const DOCMAP_KEY: &str = "docmap";
const TERM_FREQUENCIES_KEY: &str = "term_frequencies";
const DOC_LENGTHS_KEY: &str = "doc_lengths";

// A just-closed handle can hold the file lock for a moment
const OPEN_ATTEMPTS: u32 = 40;
const OPEN_RETRY_DELAY: Duration = Duration::from_millis(50);

/// Open a sled database without the background flusher; every write path
/// flushes explicitly. Lock contention is retried for a bounded time.
fn open_db(path: &Path) -> sled::Result<Db> {
    let config = sled::Config::new().path(path).flush_every_ms(None);
    let mut attempt = 1;
    loop {
        match config.open() {
            Err(sled::Error::Io(e)) if attempt < OPEN_ATTEMPTS => {
                tracing::debug!(attempt, error = %e, "index cache busy, retrying");
                thread::sleep(OPEN_RETRY_DELAY);
                attempt += 1;
            }
            result => return result,
        }
    }
}

/// Persistent index cache backed by a sled database
pub struct Storage {
    db: Db,
    path: PathBuf,
}

impl Storage {
    /// Open or create the cache database (used when building)
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let db = open_db(&path)?;
        Ok(Self { db, path })
    }

    /// Open a cache that must already exist (used when searching)
    pub fn open_existing<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Err(Error::cache_unavailable(path, "no cache directory"));
        }
        let db = open_db(&path).map_err(|e| {
            let reason = format!("cannot open (locked by another process?): {e}");
            Error::cache_unavailable(&path, reason)
        })?;
        Ok(Self { db, path })
    }

    /// Create an in-memory database (for testing)
    pub fn in_memory() -> Result<Self> {
        let config = sled::Config::new().temporary(true);
        let db = config.open()?;
        Ok(Self {
            db,
            path: PathBuf::from("<memory>"),
        })
    }

    fn snapshot(&self) -> Result<Tree> {
        Ok(self.db.open_tree(SNAPSHOT_TREE)?)
    }

    /// Persist all four index structures as one atomic batch
    pub fn save_index(&self, index: &IndexStore) -> Result<()> {
        let mut batch = Batch::default();
        batch.insert(POSTINGS_KEY, bincode::serialize(&index.postings)?);
        batch.insert(DOCMAP_KEY, bincode::serialize(&index.docmap)?);
        batch.insert(
            TERM_FREQUENCIES_KEY,
            bincode::serialize(&index.term_frequencies)?,
        );
        batch.insert(DOC_LENGTHS_KEY, bincode::serialize(&index.doc_lengths)?);

        let tree = self.snapshot()?;
        tree.apply_batch(batch)?;
        tree.flush()?;

        tracing::info!(
            path = %self.path.display(),
            documents = index.total_documents(),
            "saved index snapshot"
        );
        Ok(())
    }

    fn read_artifact<T: DeserializeOwned>(&self, tree: &Tree, key: &str) -> Result<T> {
        let bytes = tree
            .get(key)
            .map_err(|e| Error::cache_unavailable(&self.path, e))?
            .ok_or_else(|| {
                Error::cache_unavailable(&self.path, format!("missing artifact `{key}`"))
            })?;
        bincode::deserialize(&bytes).map_err(|e| {
            Error::cache_unavailable(&self.path, format!("corrupt artifact `{key}`: {e}"))
        })
    }

    /// Load a complete snapshot. Fails if any artifact is missing, unreadable
    /// or disagrees with the others.
    pub fn load_index(&self) -> Result<IndexStore> {
        let tree = self
            .snapshot()
            .map_err(|e| Error::cache_unavailable(&self.path, e))?;

        let index = IndexStore {
            postings: self.read_artifact(&tree, POSTINGS_KEY)?,
            docmap: self.read_artifact(&tree, DOCMAP_KEY)?,
            term_frequencies: self.read_artifact(&tree, TERM_FREQUENCIES_KEY)?,
            doc_lengths: self.read_artifact(&tree, DOC_LENGTHS_KEY)?,
        };

        if !index.is_consistent() {
            tracing::warn!(path = %self.path.display(), "rejected inconsistent snapshot");
            return Err(Error::cache_unavailable(
                &self.path,
                "artifacts disagree on the document set",
            ));
        }

        tracing::info!(
            path = %self.path.display(),
            documents = index.total_documents(),
            "loaded index snapshot"
        );
        Ok(index)
    }

    /// Whether a snapshot has been written
    pub fn has_index(&self) -> Result<bool> {
        Ok(self.snapshot()?.contains_key(DOCMAP_KEY)?)
    }

    /// Clear all data
    pub fn clear(&self) -> Result<()> {
        self.db.drop_tree(SNAPSHOT_TREE)?;
        self.db.flush()?;
        Ok(())
    }

    /// Flush and release the database
    pub fn close(self) -> Result<()> {
        self.db.flush()?;
        Ok(())
    }

    #[cfg(test)]
    fn remove_artifact(&self, key: &str) -> Result<()> {
        self.snapshot()?.remove(key)?;
        Ok(())
    }

    #[cfg(test)]
    fn overwrite_artifact(&self, key: &str, bytes: &[u8]) -> Result<()> {
        self.snapshot()?.insert(key, bytes)?;
        Ok(())
    }
}
