use std::future::Future;

use crate::Store;

/// Async string-keyed store for opaque bytes.
///
/// Mirrors the `Store` trait but with async methods, so the item store can
/// sit on top of backends that suspend (platform keychains, remote vaults).
/// Methods are prefixed with `async_` to avoid name collisions when a type
/// implements both `Store` and `AsyncStore`.
pub trait AsyncStore: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    fn async_get(&self, key: &str) -> impl Future<Output = Result<Option<Vec<u8>>, Self::Error>> + Send;
    fn async_put(&self, key: &str, value: &[u8]) -> impl Future<Output = Result<(), Self::Error>> + Send;
    fn async_has(&self, key: &str) -> impl Future<Output = Result<bool, Self::Error>> + Send;
    fn async_delete(&self, key: &str) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

/// Blanket impl: any sync `Store` is also an `AsyncStore`.
impl<S: Store + Send + Sync> AsyncStore for S {
    type Error = S::Error;

    async fn async_get(&self, key: &str) -> Result<Option<Vec<u8>>, Self::Error> {
        self.get(key)
    }

    async fn async_put(&self, key: &str, value: &[u8]) -> Result<(), Self::Error> {
        self.put(key, value)
    }

    async fn async_has(&self, key: &str) -> Result<bool, Self::Error> {
        self.has(key)
    }

    async fn async_delete(&self, key: &str) -> Result<(), Self::Error> {
        self.delete(key)
    }
}
