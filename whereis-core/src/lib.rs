//! WhereIs core: local persistence for a catalogue of personal belongings.
//!
//! Core concepts:
//! - **Item**: a catalogued belonging (name, description, location, photo, GPS)
//! - **Item collection**: every item, stored as one JSON array under one key
//! - **Store**: the key-value backend holding the collection
//! - **Backup snapshot**: a best-effort copy of the collection on disk
//! - **Image asset**: a photo copied into permanent storage, owned by one item
//!
//! # Example
//!
//! ```no_run
//! use whereis_core::{ItemStore, MemoryStore, NewItem, StorePaths};
//!
//! # async fn demo() -> whereis_core::Result<()> {
//! let store = ItemStore::new(MemoryStore::new(), StorePaths::new("/tmp/whereis"));
//!
//! let drill = store.save_item(NewItem::new("Drill", "In garage")).await?;
//! assert_eq!(store.get_item_by_id(&drill.id).await?, Some(drill));
//! # Ok(())
//! # }
//! ```

mod async_store;
mod best_effort;
mod error;
mod fs;
mod item;
mod item_store;
mod paths;
mod store;

pub use async_store::AsyncStore;
pub use best_effort::BestEffort;
pub use error::{ItemStoreError, Result};
pub use fs::{FileSystem, LocalFileSystem};
pub use item::{GpsLocation, Item, ItemId, ItemUpdate, NewItem};
pub use item_store::ItemStore;
pub use paths::{COLLECTION_KEY, IMAGE_EXTENSION, StorePaths, local_path};
pub use store::{MemoryStore, Store};
