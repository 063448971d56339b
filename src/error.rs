//! Error types for the worksheet assembly library
//!
//! All public APIs use the `Result<T>` type alias which wraps
//! [`AssemblyError`]. Only structurally impossible input is a hard error;
//! per-region anomalies are accumulated as diagnostics on the successful
//! result instead (see [`crate::pipeline::diagnostics`]).
//!
//! # Examples
//!
//! ```
//! use worksheet_assembly::{AssemblyError, AssemblyPipeline};
//! use worksheet_assembly::{DetectedRegion, RegionBox};
//!
//! let pipeline = AssemblyPipeline::new();
//! let detections = vec![
//!     DetectedRegion::new(1, "text", RegionBox::new(10, 10, 10, 40), 0.9),
//! ];
//!
//! match pipeline.assemble(&detections, &[], &[]) {
//!     Err(AssemblyError::InvalidGeometry { region_id, .. }) => {
//!         assert_eq!(region_id, 1);
//!     }
//!     other => panic!("expected a geometry error, got {other:?}"),
//! }
//! ```

use crate::pipeline::types::RegionBox;
use thiserror::Error;

/// Errors that abort assembly of one page
///
/// Every variant describes input that is structurally impossible rather than
/// merely noisy: noisy-but-possible input (pattern misses, far-away elements,
/// unresolved coordinates) flows into diagnostics, never here. In particular,
/// degenerate geometry fails fast instead of being patched with a placeholder
/// box.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AssemblyError {
    /// Two detections share one region id
    #[error("duplicate region id {region_id} in detection input")]
    DuplicateRegionId { region_id: u32 },

    /// A region box with non-positive extent
    #[error("region {region_id} has degenerate geometry {bbox:?}")]
    InvalidGeometry { region_id: u32, bbox: RegionBox },

    /// Detector confidence outside `[0, 1]` or non-finite
    #[error("region {region_id} has invalid detector confidence {confidence}")]
    InvalidConfidence { region_id: u32, confidence: f64 },

    /// OCR confidence outside `[0, 1]` or non-finite
    #[error("recognized text for region {region_id} has invalid confidence {confidence}")]
    InvalidTextConfidence { region_id: u32, confidence: f64 },

    /// A recognized-text entry keyed to a region id absent from the detections
    #[error("recognized text references unknown region id {region_id}")]
    DanglingTextReference { region_id: u32 },

    /// A caption keyed to a region id absent from the detections
    #[error("caption references unknown region id {region_id}")]
    DanglingCaptionReference { region_id: u32 },

    /// More than one recognized-text entry for one region
    #[error("region {region_id} has more than one recognized text entry")]
    DuplicateTextEntry { region_id: u32 },

    /// More than one caption for one region
    #[error("region {region_id} has more than one caption entry")]
    DuplicateCaptionEntry { region_id: u32 },
}

impl AssemblyError {
    /// Check if this error concerns region geometry
    #[inline]
    #[must_use = "this method returns a boolean, not modifying the error"]
    pub const fn is_geometry_error(&self) -> bool {
        matches!(self, Self::InvalidGeometry { .. })
    }

    /// Check if this error concerns a confidence value
    #[inline]
    #[must_use = "this method returns a boolean, not modifying the error"]
    pub const fn is_confidence_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidConfidence { .. } | Self::InvalidTextConfidence { .. }
        )
    }

    /// Check if this error concerns a cross-collection reference
    #[inline]
    #[must_use = "this method returns a boolean, not modifying the error"]
    pub const fn is_reference_error(&self) -> bool {
        matches!(
            self,
            Self::DanglingTextReference { .. } | Self::DanglingCaptionReference { .. }
        )
    }

    /// The region id the error refers to
    #[inline]
    #[must_use = "this method returns the offending region id"]
    pub const fn region_id(&self) -> u32 {
        match self {
            Self::DuplicateRegionId { region_id }
            | Self::InvalidGeometry { region_id, .. }
            | Self::InvalidConfidence { region_id, .. }
            | Self::InvalidTextConfidence { region_id, .. }
            | Self::DanglingTextReference { region_id }
            | Self::DanglingCaptionReference { region_id }
            | Self::DuplicateTextEntry { region_id }
            | Self::DuplicateCaptionEntry { region_id } => *region_id,
        }
    }
}

/// Result type alias for worksheet assembly operations
pub type Result<T> = std::result::Result<T, AssemblyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AssemblyError::DuplicateRegionId { region_id: 42 };
        assert_eq!(err.to_string(), "duplicate region id 42 in detection input");

        let err = AssemblyError::InvalidConfidence {
            region_id: 7,
            confidence: 1.5,
        };
        assert_eq!(
            err.to_string(),
            "region 7 has invalid detector confidence 1.5"
        );

        let err = AssemblyError::DanglingCaptionReference { region_id: 3 };
        assert_eq!(err.to_string(), "caption references unknown region id 3");
    }

    #[test]
    fn test_error_classification() {
        let geometry = AssemblyError::InvalidGeometry {
            region_id: 1,
            bbox: RegionBox::new(5, 5, 5, 10),
        };
        assert!(geometry.is_geometry_error());
        assert!(!geometry.is_confidence_error());

        let confidence = AssemblyError::InvalidTextConfidence {
            region_id: 2,
            confidence: f64::NAN,
        };
        assert!(confidence.is_confidence_error());
        assert!(!confidence.is_reference_error());

        let reference = AssemblyError::DanglingTextReference { region_id: 3 };
        assert!(reference.is_reference_error());
        assert!(!reference.is_geometry_error());
    }

    #[test]
    fn test_error_region_id() {
        assert_eq!(
            AssemblyError::DuplicateTextEntry { region_id: 9 }.region_id(),
            9
        );
        assert_eq!(
            AssemblyError::InvalidGeometry {
                region_id: 11,
                bbox: RegionBox::new(0, 0, 0, 0),
            }
            .region_id(),
            11
        );
    }

    #[test]
    fn test_error_propagation_with_question_mark() {
        fn fails() -> crate::Result<()> {
            Err(AssemblyError::DuplicateRegionId { region_id: 1 })
        }
        fn propagates() -> crate::Result<()> {
            fails()?;
            Ok(())
        }
        assert!(propagates().is_err());
    }

    #[test]
    fn test_error_size() {
        // Errors are returned by value on every pipeline path; keep them small
        assert!(std::mem::size_of::<AssemblyError>() <= 64);
    }
}
