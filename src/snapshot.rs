use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};

/// First 8 bytes of any valid PNG file.
const PNG_MAGIC: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// A view node as captured on device. Addresses are opaque strings,
/// unique within one snapshot, and are the only cross-reference key.
/// Subview order is z/traversal order and must be preserved.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct RawView {
    #[serde(default)]
    pub class: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub frame: Vec<f64>,
    #[serde(default)]
    pub bounds: Vec<f64>,
    #[serde(default)]
    pub position: Vec<f64>,
    #[serde(default)]
    pub hidden: Option<bool>,
    #[serde(default, rename = "layoutMargins")]
    pub layout_margins: Vec<f64>,
    #[serde(default, rename = "hasAmbiguousLayout")]
    pub has_ambiguous_layout: Option<bool>,
    #[serde(default)]
    pub layer: Option<HashMap<String, String>>,
    #[serde(default)]
    pub constraints: Vec<RawConstraint>,
    #[serde(default)]
    pub subviews: Vec<RawView>,
    #[serde(default, rename = "imageData")]
    pub image_data: Option<plist::Value>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct RawConstraint {
    #[serde(default)]
    pub class: String,
    #[serde(default)]
    pub address: String,
    #[serde(default, rename = "firstItem")]
    pub first_item: String,
    #[serde(default, rename = "firstAttribute")]
    pub first_attribute: i64,
    #[serde(default)]
    pub relation: i64,
    #[serde(default, rename = "secondItem")]
    pub second_item: String,
    #[serde(default, rename = "secondAttribute")]
    pub second_attribute: i64,
    #[serde(default)]
    pub multiplier: f64,
    #[serde(default)]
    pub constant: f64,
    #[serde(default)]
    pub priority: f64,
}

/// A decoded point-in-time capture of the full view hierarchy.
/// Immutable once decoded.
#[derive(Clone, Debug, Deserialize)]
pub struct Snapshot {
    pub views: Vec<RawView>,
    pub classmap: HashMap<String, String>,
}

impl Snapshot {
    /// Decodes a captured binary property list document.
    pub fn decode(bytes: &[u8]) -> Result<Snapshot> {
        plist::from_bytes(bytes).map_err(Error::from)
    }

    pub fn decode_file(path: &Path) -> Result<Snapshot> {
        let bytes = fs::read(path)?;
        Snapshot::decode(&bytes)
    }

    /// Locates a node at any nesting depth by exact address match.
    pub fn find_by_address(&self, address: &str) -> Option<&RawView> {
        find_in(&self.views, address)
    }
}

fn find_in<'a>(views: &'a [RawView], address: &str) -> Option<&'a RawView> {
    for view in views {
        if view.address == address {
            return Some(view);
        }
        if let Some(found) = find_in(&view.subviews, address) {
            return Some(found);
        }
    }
    None
}

pub fn is_valid_png(data: &[u8]) -> bool {
    data.len() >= PNG_MAGIC.len() && data[..PNG_MAGIC.len()] == PNG_MAGIC
}

/// Writes a node's embedded snapshot image to a temp file and returns
/// the path. Missing or non-PNG payloads yield `None`; a write failure
/// is logged and also degrades to `None`.
pub fn extract_snapshot(view: &RawView) -> Option<PathBuf> {
    let bytes = match &view.image_data {
        Some(plist::Value::Data(bytes)) => bytes.as_slice(),
        _ => return None,
    };
    if !is_valid_png(bytes) {
        return None;
    }
    let path = std::env::temp_dir().join(format!("vantage_snapshot_{}.png", view.address));
    match fs::write(&path, bytes) {
        Ok(()) => Some(path),
        Err(err) => {
            tracing::warn!(path = %path.display(), %err, "failed to write snapshot image");
            None
        }
    }
}
