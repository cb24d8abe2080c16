//! On-device key-value backend for the WhereIs item store.
//!
//! The item store keeps its whole collection as one JSON document under
//! [`whereis_core::COLLECTION_KEY`], so this backend only ever holds a handful
//! of keys in a single Fjall keyspace. Verification and rollback happen above
//! it, in [`whereis_core::ItemStore`].

use std::path::Path;

use fjall::{Database, Keyspace, KeyspaceCreateOptions};
use thiserror::Error;
use whereis_core::Store;

/// Keyspace holding the item collection.
pub const ITEMS_KEYSPACE: &str = "whereis";

#[derive(Debug, Error)]
#[error("item database error: {0}")]
pub struct FjallError(#[from] fjall::Error);

/// Item collection storage in a Fjall database directory.
pub struct FjallStore {
    items: Keyspace,
    _database: Database, // held open for the lifetime of the keyspace
}

impl FjallStore {
    /// Opens the item database in `path`, creating the directory and the
    /// items keyspace on first use.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, FjallError> {
        let database = Database::builder(path).open()?;
        let items = database.keyspace(ITEMS_KEYSPACE, KeyspaceCreateOptions::default)?;
        Ok(Self {
            items,
            _database: database,
        })
    }
}

impl Store for FjallStore {
    type Error = FjallError;

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, Self::Error> {
        let value = self.items.get(key.as_bytes())?;
        Ok(value.map(|bytes| bytes.to_vec()))
    }

    fn put(&self, key: &str, value: &[u8]) -> Result<(), Self::Error> {
        self.items.insert(key.as_bytes(), value)?;
        Ok(())
    }

    fn has(&self, key: &str) -> Result<bool, Self::Error> {
        Ok(self.items.contains_key(key.as_bytes())?)
    }

    fn delete(&self, key: &str) -> Result<(), Self::Error> {
        self.items.remove(key.as_bytes())?;
        Ok(())
    }
}
