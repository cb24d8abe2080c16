use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ItemStoreError, Result};

/// Stable identifier for items (UUID format).
pub type ItemId = String;

/// Coordinates captured alongside an item.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsLocation {
    pub latitude: f64,
    pub longitude: f64,
}

impl GpsLocation {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Map search link for these coordinates.
    pub fn maps_url(&self) -> String {
        format!(
            "https://www.google.com/maps/search/?api=1&query={},{}",
            self.latitude, self.longitude
        )
    }
}

/// A catalogued belonging, as persisted in the item collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gps_location: Option<GpsLocation>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Item {
    /// Case-insensitive substring match on name, description and location.
    ///
    /// `needle` must already be lowercased.
    pub(crate) fn matches(&self, needle: &str) -> bool {
        let contains = |field: &str| field.to_lowercase().contains(needle);

        contains(&self.name)
            || contains(&self.description)
            || self.location.as_deref().is_some_and(contains)
    }
}

/// Fields supplied by the caller when creating an item.
///
/// `image_uri` may point at a transient location (camera cache, picker
/// temp file); saving copies it into permanent storage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewItem {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub image_uri: Option<String>,
    #[serde(default)]
    pub gps_location: Option<GpsLocation>,
}

impl NewItem {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            ..Default::default()
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_image(mut self, image_uri: impl Into<String>) -> Self {
        self.image_uri = Some(image_uri.into());
        self
    }

    pub fn with_gps(mut self, gps: GpsLocation) -> Self {
        self.gps_location = Some(gps);
        self
    }

    pub(crate) fn normalized(self) -> Result<Self> {
        Ok(Self {
            name: required("name", &self.name)?,
            description: required("description", &self.description)?,
            location: self.location.map(|l| l.trim().to_string()),
            image_uri: self.image_uri,
            gps_location: self.gps_location,
        })
    }
}

/// Replacement values for an existing item.
///
/// Every mutable field is replaced; `id` selects the item and `createdAt`
/// is always carried over from the stored record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemUpdate {
    pub id: ItemId,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub image_uri: Option<String>,
    #[serde(default)]
    pub gps_location: Option<GpsLocation>,
}

impl ItemUpdate {
    pub fn new(
        id: impl Into<ItemId>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            location: None,
            image_uri: None,
            gps_location: None,
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_image(mut self, image_uri: impl Into<String>) -> Self {
        self.image_uri = Some(image_uri.into());
        self
    }

    pub fn with_gps(mut self, gps: GpsLocation) -> Self {
        self.gps_location = Some(gps);
        self
    }

    pub(crate) fn normalized(self) -> Result<Self> {
        Ok(Self {
            name: required("name", &self.name)?,
            description: required("description", &self.description)?,
            location: self.location.map(|l| l.trim().to_string()),
            ..self
        })
    }
}

impl From<&Item> for ItemUpdate {
    /// Starts an update from the stored values.
    fn from(item: &Item) -> Self {
        Self {
            id: item.id.clone(),
            name: item.name.clone(),
            description: item.description.clone(),
            location: item.location.clone(),
            image_uri: item.image_uri.clone(),
            gps_location: item.gps_location,
        }
    }
}

fn required(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ItemStoreError::Validation(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}
