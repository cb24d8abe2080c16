use thiserror::Error;
use whereis_core::ItemStoreError;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store error: {0}")]
    Store(#[from] whereis_fjall::FjallError),

    #[error(transparent)]
    Items(#[from] ItemStoreError),

    #[error("Item not found: {0}")]
    ItemNotFound(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
