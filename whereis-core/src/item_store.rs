use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde_json::Value as JsonValue;
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::AsyncStore;
use crate::best_effort::BestEffort;
use crate::error::{ItemStoreError, Result};
use crate::fs::{FileSystem, LocalFileSystem};
use crate::item::{Item, ItemUpdate, NewItem};
use crate::paths::{COLLECTION_KEY, IMAGE_EXTENSION, StorePaths, local_path};

/// Owns the item collection.
///
/// The whole collection lives under [`COLLECTION_KEY`] in the injected store
/// and is rewritten on every mutation. Each write is read back and compared
/// byte for byte before it counts as committed; a compact snapshot is then
/// copied to the backup file.
///
/// Every permanent image asset belongs to exactly one item. A reference to an
/// asset already owned by another item is copied, and an asset is only
/// removed once no item in the committed collection points at it.
///
/// Mutations run one at a time: the writer lock is held from the initial read
/// through verification and backup, so concurrent callers observe
/// linearized updates. Reads do not take the lock and see the last committed
/// collection.
pub struct ItemStore<S, F = LocalFileSystem> {
    store: S,
    fs: F,
    paths: StorePaths,
    writer: Mutex<()>,
}

impl<S: AsyncStore> ItemStore<S, LocalFileSystem> {
    /// Creates an item store on the host filesystem.
    pub fn new(store: S, paths: StorePaths) -> Self {
        Self::with_file_system(store, LocalFileSystem, paths)
    }
}

impl<S: AsyncStore, F: FileSystem> ItemStore<S, F> {
    pub fn with_file_system(store: S, fs: F, paths: StorePaths) -> Self {
        Self {
            store,
            fs,
            paths,
            writer: Mutex::new(()),
        }
    }

    pub fn paths(&self) -> &StorePaths {
        &self.paths
    }

    /// Returns the collection in insertion order.
    ///
    /// Falls back to the backup snapshot when the primary store has no
    /// collection or cannot be read. An empty list means neither holds data;
    /// an unreadable backup is an error, never an empty collection.
    #[instrument(skip(self))]
    pub async fn get_all_items(&self) -> Result<Vec<Item>> {
        let primary = match self.store.async_get(COLLECTION_KEY).await {
            Ok(Some(bytes)) => decode(&bytes),
            Ok(None) => {
                debug!("primary collection absent, reading backup");
                return Ok(self.read_backup().await?.unwrap_or_default());
            }
            Err(err) => Err(ItemStoreError::persistence("reading collection", err)),
        };

        match primary {
            Ok(items) => Ok(items),
            Err(err) => {
                warn!(%err, "primary collection unreadable, trying backup");
                self.recover_from_backup(err).await
            }
        }
    }

    /// First item with `id`, or None.
    #[instrument(skip(self))]
    pub async fn get_item_by_id(&self, id: &str) -> Result<Option<Item>> {
        let items = self.get_all_items().await?;
        Ok(items.into_iter().find(|item| item.id == id))
    }

    /// Creates an item, materializing its image into permanent storage.
    #[instrument(skip(self, candidate), fields(name = %candidate.name))]
    pub async fn save_item(&self, candidate: NewItem) -> Result<Item> {
        let candidate = candidate.normalized()?;

        let _guard = self.writer.lock().await;
        let mut items = self.get_all_items().await?;

        let (image_uri, fresh_asset) = match candidate.image_uri {
            Some(source) => {
                let shared = references(&items, &source);
                self.materialize_image(&source, shared).await
            }
            None => (None, None),
        };

        let now = Utc::now();
        let item = Item {
            id: fresh_id(&items),
            name: candidate.name,
            description: candidate.description,
            location: candidate.location,
            image_uri,
            gps_location: candidate.gps_location,
            created_at: now,
            updated_at: now,
        };

        items.push(item.clone());
        if let Err(err) = self.commit(&items).await {
            self.abandon_asset(fresh_asset).await;
            return Err(err);
        }

        debug!(id = %item.id, "item saved");
        Ok(item)
    }

    /// Replaces all mutable fields of an existing item, keeping its position
    /// and creation time.
    #[instrument(skip(self, update), fields(id = %update.id))]
    pub async fn update_item(&self, update: ItemUpdate) -> Result<Item> {
        let update = update.normalized()?;

        let _guard = self.writer.lock().await;
        let mut items = self.get_all_items().await?;

        let position = items
            .iter()
            .position(|item| item.id == update.id)
            .ok_or_else(|| ItemStoreError::NotFound(update.id.clone()))?;
        let previous_image = items[position].image_uri.clone();
        let created_at = items[position].created_at;
        let previous_update = items[position].updated_at;

        let (image_uri, fresh_asset) = match update.image_uri {
            Some(source) if previous_image.as_deref() != Some(source.as_str()) => {
                let shared = items
                    .iter()
                    .any(|other| other.id != update.id && owns(other, &source));
                self.materialize_image(&source, shared).await
            }
            other => (other, None),
        };

        let item = Item {
            id: update.id,
            name: update.name,
            description: update.description,
            location: update.location,
            image_uri,
            gps_location: update.gps_location,
            created_at,
            updated_at: advance(previous_update),
        };

        items[position] = item.clone();
        if let Err(err) = self.commit(&items).await {
            self.abandon_asset(fresh_asset).await;
            return Err(err);
        }

        if let Some(old) = previous_image {
            self.release_asset(&items, &old, "discard replaced image").await;
        }

        debug!("item updated");
        Ok(item)
    }

    /// Removes an item and its image asset.
    #[instrument(skip(self))]
    pub async fn delete_item(&self, id: &str) -> Result<bool> {
        let _guard = self.writer.lock().await;
        let mut items = self.get_all_items().await?;

        let position = items
            .iter()
            .position(|item| item.id == id)
            .ok_or_else(|| ItemStoreError::NotFound(id.to_string()))?;
        let removed = items.remove(position);

        self.commit(&items).await?;

        if let Some(uri) = removed.image_uri {
            self.release_asset(&items, &uri, "delete image asset").await;
        }

        debug!("item deleted");
        Ok(true)
    }

    /// Items whose name, description or location contains `query`,
    /// ignoring case. An empty or absent query matches nothing.
    #[instrument(skip(self))]
    pub async fn search_items(&self, query: Option<&str>) -> Result<Vec<Item>> {
        let needle = match query.map(str::trim) {
            Some(q) if !q.is_empty() => q.to_lowercase(),
            _ => return Ok(Vec::new()),
        };

        let items = self.get_all_items().await?;
        Ok(items.into_iter().filter(|item| item.matches(&needle)).collect())
    }

    /// Writes the collection, pretty-printed, to the export file.
    #[instrument(skip(self))]
    pub async fn export_data(&self) -> Result<PathBuf> {
        let items = self.get_all_items().await?;
        let json = serde_json::to_vec_pretty(&items)
            .map_err(|e| ItemStoreError::persistence("encoding export", e))?;

        let path = self.paths.export_file();
        self.fs
            .write(&path, &json)
            .await
            .map_err(|e| ItemStoreError::persistence("writing export", e))?;

        debug!(path = %path.display(), count = items.len(), "collection exported");
        Ok(path)
    }

    /// Replaces the whole collection with the contents of an export file.
    ///
    /// Image assets of the replaced collection that the imported one does
    /// not reference are removed afterwards.
    #[instrument(skip(self))]
    pub async fn import_data(&self, path: &Path) -> Result<Vec<Item>> {
        let bytes = self
            .fs
            .read(path)
            .await
            .map_err(|e| ItemStoreError::persistence("reading import file", e))?;
        let items = parse_import(&bytes)?;
        self.check_single_ownership(&items)?;

        let _guard = self.writer.lock().await;
        let replaced = match self.get_all_items().await {
            Ok(replaced) => replaced,
            Err(err) => {
                warn!(%err, "replaced collection unreadable, its images are left in place");
                Vec::new()
            }
        };

        self.commit(&items).await?;

        for uri in replaced.iter().filter_map(|item| item.image_uri.as_deref()) {
            self.release_asset(&items, uri, "discard replaced image").await;
        }

        debug!(count = items.len(), "collection imported");
        Ok(items)
    }

    /// Rewrites the primary store from the backup snapshot.
    #[instrument(skip(self))]
    pub async fn restore_from_backup(&self) -> Result<Vec<Item>> {
        let _guard = self.writer.lock().await;

        let items = self.read_backup().await?.ok_or_else(|| {
            ItemStoreError::Persistence("no backup snapshot available".to_string())
        })?;
        let bytes = encode(&items)?;
        self.write_verified(&bytes).await?;

        debug!(count = items.len(), "collection restored from backup");
        Ok(items)
    }

    async fn recover_from_backup(&self, primary_err: ItemStoreError) -> Result<Vec<Item>> {
        match self.read_backup().await {
            Ok(Some(items)) => {
                debug!(count = items.len(), "serving collection from backup");
                Ok(items)
            }
            Ok(None) => Err(primary_err),
            Err(backup_err) => Err(ItemStoreError::Persistence(format!(
                "{primary_err}; backup unusable: {backup_err}"
            ))),
        }
    }

    async fn read_backup(&self) -> Result<Option<Vec<Item>>> {
        let path = self.paths.backup_file();
        let exists = self
            .fs
            .exists(&path)
            .await
            .map_err(|e| ItemStoreError::persistence("checking backup", e))?;
        if !exists {
            return Ok(None);
        }

        let bytes = self
            .fs
            .read(&path)
            .await
            .map_err(|e| ItemStoreError::persistence("reading backup", e))?;
        decode(&bytes).map(Some)
    }

    /// Rejects collections where two items claim the same permanent asset.
    fn check_single_ownership(&self, items: &[Item]) -> Result<()> {
        let mut owned = HashSet::new();
        let permanent = items
            .iter()
            .filter_map(|item| item.image_uri.as_deref())
            .filter(|uri| self.paths.is_permanent(uri));

        for uri in permanent {
            if !owned.insert(local_path(uri)) {
                return Err(ItemStoreError::Validation(format!(
                    "image {uri} is referenced by more than one item"
                )));
            }
        }
        Ok(())
    }

    /// Verified write of the collection followed by a backup snapshot.
    async fn commit(&self, items: &[Item]) -> Result<()> {
        let bytes = encode(items)?;
        self.write_verified(&bytes).await?;
        self.write_backup(&bytes).await.report("write backup");
        Ok(())
    }

    /// Writes `bytes` under the collection key and reads them back.
    ///
    /// On mismatch the previous value is put back so callers keep observing
    /// the last committed collection.
    async fn write_verified(&self, bytes: &[u8]) -> Result<()> {
        let previous = self.store.async_get(COLLECTION_KEY).await;

        self.store
            .async_put(COLLECTION_KEY, bytes)
            .await
            .map_err(|e| ItemStoreError::persistence("writing collection", e))?;

        let written = self
            .store
            .async_get(COLLECTION_KEY)
            .await
            .map_err(|e| ItemStoreError::persistence("verifying collection", e))?;

        if written.as_deref() != Some(bytes) {
            warn!("read-back differs from written collection, rolling back");
            let rollback = match previous {
                Ok(Some(old)) => {
                    BestEffort::from_result(self.store.async_put(COLLECTION_KEY, &old).await)
                }
                Ok(None) => self.clear_collection_key().await,
                Err(err) => BestEffort::Failed(format!("previous value unknown: {err}")),
            };
            rollback.report("rollback collection");
            return Err(ItemStoreError::Persistence(
                "integrity verification failed".to_string(),
            ));
        }

        Ok(())
    }

    async fn clear_collection_key(&self) -> BestEffort {
        match self.store.async_has(COLLECTION_KEY).await {
            Ok(true) => BestEffort::from_result(self.store.async_delete(COLLECTION_KEY).await),
            Ok(false) => BestEffort::Done,
            Err(err) => BestEffort::Failed(err.to_string()),
        }
    }

    pub(crate) async fn write_backup(&self, bytes: &[u8]) -> BestEffort {
        BestEffort::from_result(self.fs.write(&self.paths.backup_file(), bytes).await)
    }

    /// Resolves an image source to the reference the item will own.
    ///
    /// A permanent source not owned by anyone else is kept as-is; anything
    /// else is copied into the images directory. Returns the reference and,
    /// when a copy was made, the new asset. A failed copy keeps the original
    /// reference.
    pub(crate) async fn materialize_image(
        &self,
        source: &str,
        shared: bool,
    ) -> (Option<String>, Option<String>) {
        if self.paths.is_permanent(source) && !shared {
            return (Some(source.to_string()), None);
        }

        match self.copy_into_images(source).await {
            Ok(permanent) => {
                debug!(source, permanent = %permanent, "image materialized");
                (Some(permanent.clone()), Some(permanent))
            }
            Err(err) => {
                warn!(source, %err, "image copy failed, keeping original reference");
                (Some(source.to_string()), None)
            }
        }
    }

    async fn copy_into_images(&self, source: &str) -> io::Result<String> {
        let images_dir = self.paths.images_dir();
        if !self.fs.exists(&images_dir).await? {
            self.fs.create_dir_all(&images_dir).await?;
        }

        let target = images_dir.join(format!("{}.{}", Uuid::new_v4(), IMAGE_EXTENSION));
        self.fs.copy(&local_path(source), &target).await?;
        Ok(target.to_string_lossy().into_owned())
    }

    /// Removes `uri` if it is a permanent asset that no item in `items` still references.
    async fn release_asset(&self, items: &[Item], uri: &str, step: &str) {
        if self.paths.is_permanent(uri) && !references(items, uri) {
            self.discard_image(uri).await.report(step);
        }
    }

    /// Removes an asset copied for a mutation that did not commit.
    async fn abandon_asset(&self, fresh: Option<String>) {
        if let Some(uri) = fresh {
            self.discard_image(&uri).await.report("discard uncommitted image");
        }
    }

    pub(crate) async fn discard_image(&self, uri: &str) -> BestEffort {
        BestEffort::from_result(self.fs.remove_file(&local_path(uri)).await)
    }
}

fn owns(item: &Item, uri: &str) -> bool {
    item.image_uri
        .as_deref()
        .is_some_and(|own| local_path(own) == local_path(uri))
}

fn references(items: &[Item], uri: &str) -> bool {
    items.iter().any(|item| owns(item, uri))
}

fn encode(items: &[Item]) -> Result<Vec<u8>> {
    serde_json::to_vec(items).map_err(|e| ItemStoreError::persistence("encoding collection", e))
}

fn decode(bytes: &[u8]) -> Result<Vec<Item>> {
    serde_json::from_slice(bytes)
        .map_err(|e| ItemStoreError::persistence("decoding collection", e))
}

fn fresh_id(items: &[Item]) -> String {
    loop {
        let id = Uuid::new_v4().to_string();
        if !items.iter().any(|item| item.id == id) {
            return id;
        }
    }
}

/// Current time, strictly after `previous`.
fn advance(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = Utc::now();
    if now > previous {
        now
    } else {
        previous + Duration::microseconds(1)
    }
}

/// Validates an import payload and decodes it into items.
///
/// Records written before `updatedAt` existed get their `createdAt`.
fn parse_import(bytes: &[u8]) -> Result<Vec<Item>> {
    let mut value: JsonValue = serde_json::from_slice(bytes)
        .map_err(|e| ItemStoreError::Validation(format!("import is not valid JSON: {e}")))?;

    let entries = value.as_array_mut().ok_or_else(|| {
        ItemStoreError::Validation("import must be an array of items".to_string())
    })?;

    let mut seen = HashSet::new();
    for (index, entry) in entries.iter_mut().enumerate() {
        let record = entry.as_object_mut().ok_or_else(|| {
            ItemStoreError::Validation(format!("import entry {index} is not an object"))
        })?;

        for field in ["id", "name", "description"] {
            let present = record
                .get(field)
                .and_then(JsonValue::as_str)
                .is_some_and(|v| !v.trim().is_empty());
            if !present {
                return Err(ItemStoreError::Validation(format!(
                    "import entry {index} is missing {field}"
                )));
            }
        }

        if let Some(id) = record.get("id").and_then(JsonValue::as_str) {
            if !seen.insert(id.to_string()) {
                return Err(ItemStoreError::Validation(format!(
                    "import contains duplicate id {id}"
                )));
            }
        }

        if !record.contains_key("updatedAt") {
            if let Some(created) = record.get("createdAt").cloned() {
                record.insert("updatedAt".to_string(), created);
            }
        }
    }

    serde_json::from_value(value)
        .map_err(|e| ItemStoreError::Validation(format!("import entry is malformed: {e}")))
}
