//! # Worksheet Assembly - Question Structure Reconstruction Library
//!
//! Reconstructs the logical question structure of scanned worksheet and exam
//! pages from the unordered output of three upstream collaborators: a layout
//! detector (classed regions with confidence), an OCR engine (text per
//! region), and an image captioner (descriptions for figures and tables).
//! The result is a tree of numbered questions and type headers with nested
//! sub-questions, ordered the way a human reads a multi-column page.
//!
//! ## Features
//!
//! - **Identifier Extraction**: Question numbers and type headers recovered
//!   from noisy OCR text, with duplicate detections merged by confidence
//! - **Column-Aware Ordering**: Multi-column pages read left column first,
//!   top to bottom, with numeric identifiers compared as integers
//! - **Sub-Question Nesting**: "(1)"-style markers grouped under their
//!   parent question, including detector misclassification fallbacks
//! - **Partial Success**: Unplaceable regions are reported in diagnostics
//!   and the unassigned bucket instead of failing the run
//! - **No Fabricated Geometry**: A coordinate that cannot be traced back to
//!   an input region stays `None` and is flagged, never invented
//!
//! ## Quick Start
//!
//! ```
//! use worksheet_assembly::{
//!     AssemblyPipeline, Caption, DetectedRegion, RecognizedText, RegionBox, Result,
//! };
//!
//! fn main() -> Result<()> {
//!     // Collaborator output for a one-question page
//!     let detections = vec![
//!         DetectedRegion::new(0, "question_number", RegionBox::new(100, 80, 140, 110), 0.97),
//!         DetectedRegion::new(1, "text", RegionBox::new(160, 80, 620, 150), 0.92),
//!         DetectedRegion::new(2, "figure", RegionBox::new(160, 170, 620, 420), 0.88),
//!     ];
//!     let texts = vec![
//!         RecognizedText::new(0, "1.", 0.99),
//!         RecognizedText::new(1, "Sketch the graph of y = 2x + 1.", 0.93),
//!     ];
//!     let captions = vec![Caption::new(2, "coordinate grid")];
//!
//!     let pipeline = AssemblyPipeline::new();
//!     let output = pipeline.assemble(&detections, &texts, &captions)?;
//!
//!     for question in &output.document.questions {
//!         println!(
//!             "question {}: {} elements, column {}",
//!             question.identifier,
//!             question.content.len(),
//!             question.column
//!         );
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration
//!
//! Distance thresholds are resolution-dependent policy, injectable through
//! [`AssemblyConfig`]:
//!
//! ```
//! use worksheet_assembly::{AssemblyConfig, AssemblyPipeline, ColumnConfig};
//!
//! let config = AssemblyConfig {
//!     columns: ColumnConfig {
//!         min_gap_ratio: 0.3,
//!         ..Default::default()
//!     },
//!     page_width_override: Some(2480),
//!     ..Default::default()
//! };
//! let pipeline = AssemblyPipeline::with_config(config);
//! ```
//!
//! ## Error Handling
//!
//! Malformed input fails fast with a typed [`AssemblyError`]; per-region
//! anomalies on well-formed input are diagnostics, not errors:
//!
//! ```
//! use worksheet_assembly::{AssemblyError, AssemblyPipeline, DetectedRegion, RegionBox};
//!
//! let detections = vec![
//!     DetectedRegion::new(3, "text", RegionBox::new(0, 0, 10, 10), 0.9),
//!     DetectedRegion::new(3, "text", RegionBox::new(20, 0, 30, 10), 0.8),
//! ];
//! match AssemblyPipeline::new().assemble(&detections, &[], &[]) {
//!     Err(AssemblyError::DuplicateRegionId { region_id }) => {
//!         assert_eq!(region_id, 3);
//!     }
//!     other => panic!("expected a duplicate id error, got {other:?}"),
//! }
//! ```
//!
//! ## Determinism
//!
//! `assemble` is a pure function of its inputs: identical input produces
//! byte-identical serialized output. Ties in every ordering decision break
//! on explicit keys (identifier value, region id), never on hash or index
//! iteration order.

// Error types (public API)
pub mod error;

// Class vocabulary normalization (detector strings to the closed ClassId enum)
pub mod taxonomy;

/// Staged assembly pipeline: identifier extraction, column detection,
/// element assignment, sub-question grouping, document assembly.
///
/// This is the **primary public API** for worksheet reconstruction; the
/// commonly used types are re-exported at the crate root.
pub mod pipeline;

// ============================================================================
// Public API Exports
// ============================================================================
//
// This section defines the minimal public API surface for the library.
// Stage internals remain reachable through the pipeline module.

pub use error::{AssemblyError, Result};

// Core pipeline API
pub use pipeline::{
    AssemblyConfig,   // Pipeline configuration
    AssemblyOutput,   // Document plus run diagnostics
    AssemblyPipeline, // Main pipeline struct
};

// Input types (produced by the upstream collaborators)
pub use pipeline::{Caption, DetectedRegion, RecognizedText, RegionBox};

// Output types (returned by AssemblyPipeline::assemble)
pub use pipeline::{
    Boundary,           // Question start with Y trusted and X optional
    ColumnAssignment,   // Column placement with the estimated flag
    ContentElement,     // One placed region in the tree
    QuestionIdentifier, // Number or type-header identity
    QuestionNode,       // One question with content and sub-questions
    StructuredDocument, // The assembled tree plus unassigned bucket
    SubQuestionId,      // Sub-question local identifier
};

// Diagnostics (partial-success reporting)
pub use pipeline::{
    verify_document,
    BoundarySource,
    RunDiagnostics,
    SkipReason,
    SkippedRegion,
    SubQuestionDetector,
    SubQuestionRecord,
};

// Class vocabulary
pub use taxonomy::{ClassCapabilities, ClassId, ClassTaxonomy};

// Per-stage configuration types
pub use pipeline::{AssignerConfig, ColumnConfig, ExtractorConfig};
