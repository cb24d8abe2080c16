use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::{Arc, RwLock};

/// A string-keyed store for opaque bytes.
///
/// Stores know nothing about items or their encoding; the item store
/// serializes the whole collection and hands the bytes over under a single
/// key. Encryption at rest, when present, is the backend's concern.
///
/// All methods take `&self` to support stores with internal locking (e.g., RocksDB).
pub trait Store {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Retrieves the bytes stored under `key`, or None if not present.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, Self::Error>;

    /// Stores bytes under `key`, replacing any previous value.
    fn put(&self, key: &str, value: &[u8]) -> Result<(), Self::Error>;

    /// Checks whether `key` holds a value.
    fn has(&self, key: &str) -> Result<bool, Self::Error>;

    /// Removes the value under `key`. Removing a missing key is not an error.
    fn delete(&self, key: &str) -> Result<(), Self::Error>;
}

impl<S: Store> Store for &S {
    type Error = S::Error;

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, Self::Error> {
        (*self).get(key)
    }

    fn put(&self, key: &str, value: &[u8]) -> Result<(), Self::Error> {
        (*self).put(key, value)
    }

    fn has(&self, key: &str) -> Result<bool, Self::Error> {
        (*self).has(key)
    }

    fn delete(&self, key: &str) -> Result<(), Self::Error> {
        (*self).delete(key)
    }
}

impl<S: Store> Store for Arc<S> {
    type Error = S::Error;

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, Self::Error> {
        self.as_ref().get(key)
    }

    fn put(&self, key: &str, value: &[u8]) -> Result<(), Self::Error> {
        self.as_ref().put(key, value)
    }

    fn has(&self, key: &str) -> Result<bool, Self::Error> {
        self.as_ref().has(key)
    }

    fn delete(&self, key: &str) -> Result<(), Self::Error> {
        self.as_ref().delete(key)
    }
}

/// An in-memory store backed by a HashMap.
///
/// Useful for testing and as a reference implementation.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    type Error = Infallible;

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, Self::Error> {
        Ok(self.data.read().unwrap().get(key).cloned())
    }

    fn put(&self, key: &str, value: &[u8]) -> Result<(), Self::Error> {
        self.data
            .write()
            .unwrap()
            .insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn has(&self, key: &str) -> Result<bool, Self::Error> {
        Ok(self.data.read().unwrap().contains_key(key))
    }

    fn delete(&self, key: &str) -> Result<(), Self::Error> {
        self.data.write().unwrap().remove(key);
        Ok(())
    }
}
