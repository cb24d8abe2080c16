use std::path::{Component, Path, PathBuf};

/// Key under which the whole item collection is stored.
pub const COLLECTION_KEY: &str = "whereIs_items";

/// Extension given to materialized image assets.
pub const IMAGE_EXTENSION: &str = "jpg";

const BACKUP_FILE: &str = "whereis_items_backup.json";
const EXPORT_FILE: &str = "whereis_items_export.json";
const IMAGES_DIR: &str = "images";

/// Filesystem locations owned by the item store, all under one data directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorePaths {
    data_dir: PathBuf,
}

impl StorePaths {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Latest backup snapshot (compact JSON).
    pub fn backup_file(&self) -> PathBuf {
        self.data_dir.join(BACKUP_FILE)
    }

    /// Target of `export_data` (pretty JSON).
    pub fn export_file(&self) -> PathBuf {
        self.data_dir.join(EXPORT_FILE)
    }

    /// Permanent storage root for image assets.
    pub fn images_dir(&self) -> PathBuf {
        self.data_dir.join(IMAGES_DIR)
    }

    /// Whether `uri` names a file inside the permanent images directory.
    ///
    /// The part below the images directory may only hold plain names, so
    /// `images/../x` never counts as permanent.
    pub fn is_permanent(&self, uri: &str) -> bool {
        let path = local_path(uri);
        let Ok(rest) = path.strip_prefix(self.images_dir()) else {
            return false;
        };

        let mut components = rest.components().peekable();
        components.peek().is_some() && components.all(|c| matches!(c, Component::Normal(_)))
    }
}

/// Turns an image reference into a filesystem path, accepting `file://` URIs.
pub fn local_path(uri: &str) -> PathBuf {
    PathBuf::from(uri.strip_prefix("file://").unwrap_or(uri))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_paths() {
        let paths = StorePaths::new("/data/whereis");

        assert_eq!(
            paths.backup_file(),
            PathBuf::from("/data/whereis/whereis_items_backup.json")
        );
        assert_eq!(
            paths.export_file(),
            PathBuf::from("/data/whereis/whereis_items_export.json")
        );
        assert_eq!(paths.images_dir(), PathBuf::from("/data/whereis/images"));
    }

    #[test]
    fn permanent_detection() {
        let paths = StorePaths::new("/data/whereis");

        assert!(paths.is_permanent("/data/whereis/images/abc.jpg"));
        assert!(paths.is_permanent("file:///data/whereis/images/abc.jpg"));
        assert!(!paths.is_permanent("/tmp/camera/abc.jpg"));
        // component-wise, not a string prefix
        assert!(!paths.is_permanent("/data/whereis/images-old/abc.jpg"));
    }

    #[test]
    fn traversal_is_never_permanent() {
        let paths = StorePaths::new("/data/whereis");

        assert!(!paths.is_permanent("/data/whereis/images/../../victim.txt"));
        assert!(!paths.is_permanent("/data/whereis/images/../images/abc.jpg"));
        assert!(!paths.is_permanent("file:///data/whereis/images/sub/../../x"));
        assert!(!paths.is_permanent("/data/whereis/images"));
        assert!(paths.is_permanent("/data/whereis/images/sub/abc.jpg"));
    }

    #[test]
    fn relative_data_dir() {
        let paths = StorePaths::new("../whereis");

        assert!(paths.is_permanent("../whereis/images/abc.jpg"));
        assert!(!paths.is_permanent("../whereis/images/../abc.jpg"));
    }
}
