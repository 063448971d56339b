//! Shared input types for the assembly pipeline
//!
//! These mirror the wire shapes produced by the external detector, OCR, and
//! captioning collaborators and use serde for JSON serialization.

use serde::{Deserialize, Serialize};

/// Axis-aligned region box in integer pixel coordinates.
///
/// Top-left origin: Y grows downward, matching the detector's raster space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegionBox {
    pub x1: i32, // left (x_min)
    pub y1: i32, // top (y_min)
    pub x2: i32, // right (x_max)
    pub y2: i32, // bottom (y_max)
}

impl RegionBox {
    /// Create a new region box
    #[inline]
    #[must_use = "returns a new RegionBox instance"]
    pub const fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Width in pixels
    #[inline]
    #[must_use = "returns the box width"]
    pub const fn width(&self) -> i32 {
        self.x2 - self.x1
    }

    /// Height in pixels
    #[inline]
    #[must_use = "returns the box height"]
    pub const fn height(&self) -> i32 {
        self.y2 - self.y1
    }

    /// Area in square pixels
    ///
    /// Widened to i64: page-scale boxes can exceed the i32 range when
    /// multiplied.
    #[inline]
    #[must_use = "returns the box area"]
    pub const fn area(&self) -> i64 {
        self.width() as i64 * self.height() as i64
    }

    /// Geometric center as floating-point coordinates
    #[inline]
    #[must_use = "returns the box center point"]
    pub fn center(&self) -> (f64, f64) {
        (
            (f64::from(self.x1) + f64::from(self.x2)) / 2.0,
            (f64::from(self.y1) + f64::from(self.y2)) / 2.0,
        )
    }

    /// Whether the box has positive extent on both axes
    #[inline]
    #[must_use = "returns whether the box has positive extent"]
    pub const fn has_positive_extent(&self) -> bool {
        self.x2 > self.x1 && self.y2 > self.y1
    }
}

/// One region produced by the external object detector
///
/// Created once per pipeline run and immutable thereafter. `class_name` is a
/// free-form string; it must pass through taxonomy normalization before any
/// capability decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedRegion {
    pub id: u32,
    pub class_name: String,
    pub bbox: RegionBox,
    pub confidence: f64,
}

impl DetectedRegion {
    #[inline]
    #[must_use = "returns a new DetectedRegion instance"]
    pub fn new(id: u32, class_name: impl Into<String>, bbox: RegionBox, confidence: f64) -> Self {
        Self {
            id,
            class_name: class_name.into(),
            bbox,
            confidence,
        }
    }
}

/// Text recognized inside one region by the external OCR engine
///
/// Zero or one per region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognizedText {
    pub region_id: u32,
    pub text: String,
    pub confidence: f64,
}

impl RecognizedText {
    #[inline]
    #[must_use = "returns a new RecognizedText instance"]
    pub fn new(region_id: u32, text: impl Into<String>, confidence: f64) -> Self {
        Self {
            region_id,
            text: text.into(),
            confidence,
        }
    }
}

/// Natural-language caption for one visual region
///
/// Zero or one per region, produced by the external captioning service for
/// visual classes only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Caption {
    pub region_id: u32,
    pub text: String,
}

impl Caption {
    #[inline]
    #[must_use = "returns a new Caption instance"]
    pub fn new(region_id: u32, text: impl Into<String>) -> Self {
        Self {
            region_id,
            text: text.into(),
        }
    }
}
