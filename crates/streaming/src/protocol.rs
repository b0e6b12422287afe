//! Wire types for the annotation store endpoints.
//!
//! Field names follow the store's JSON contracts:
//! - `POST /get_normalized_annotations {bounds, filename}`
//! - `POST /get_hex_bins {dzi_file, resolution}`
//! - `GET /available_images`
//! - `GET /annotations/{filename}`

use std::collections::BTreeMap;

use annotations::feature::Feature;
use foundation::bounds::ImageRect;
use serde::{Deserialize, Serialize};

/// Viewport bounds as sent on the wire (image-pixel space).
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundsPayload {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl From<ImageRect> for BoundsPayload {
    fn from(r: ImageRect) -> Self {
        Self {
            x_min: r.x_min,
            x_max: r.x_max,
            y_min: r.y_min,
            y_max: r.y_max,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScopedAnnotationsRequest {
    pub bounds: BoundsPayload,
    pub filename: String,
}

/// Scoped fetch result: source filename → features in the given bounds.
pub type ScopedAnnotations = BTreeMap<String, Vec<Feature>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HexBinsRequest {
    pub dzi_file: String,
    pub resolution: u32,
}

/// Per-classification tally inside a bin.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationBucket {
    pub count: u64,
    pub color: [u8; 3],
}

/// A precomputed spatial aggregation cell.
///
/// Geometry is opaque to the client: `image_coordinates` is the already
/// computed cell boundary in image-pixel space, never recomputed here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HexBin {
    #[serde(default)]
    pub hex_id: Option<String>,
    #[serde(default)]
    pub annotation_count: u64,
    pub image_coordinates: Vec<[f64; 2]>,
    pub classifications: BTreeMap<String, ClassificationBucket>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HexBinsResponse {
    pub hex_bins: Vec<HexBin>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailableImagesResponse {
    pub images: Vec<String>,
}
