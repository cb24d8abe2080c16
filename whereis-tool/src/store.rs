use whereis_core::{ItemStore, StorePaths};
use whereis_fjall::FjallStore;

use crate::config::ResolvedPaths;
use crate::error::ToolError;

pub type AppStore = ItemStore<FjallStore>;

/// Opens the Fjall database and wraps it in an item store rooted at the data directory.
pub fn open(paths: &ResolvedPaths) -> Result<AppStore, ToolError> {
    if let Some(parent) = paths.store.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let store = FjallStore::open(&paths.store)?;

    Ok(ItemStore::new(store, StorePaths::new(&paths.data_dir)))
}
