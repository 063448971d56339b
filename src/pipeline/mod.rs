//! # Assembly Pipeline - Worksheet Structure Reconstruction
//!
//! This module provides the staged pipeline that turns unordered detector,
//! OCR, and captioner output into an ordered question tree via the
//! [`AssemblyPipeline`] struct.
//!
//! ## Pipeline Stages
//!
//! The pipeline executes the following stages in order:
//!
//! ### Stage 1: Identifier Extraction
//! - **Input:** boundary-eligible regions + recognized text
//! - **Implementation:** `identifier_extractor.rs`
//! - **Output:** question boundaries with fused confidence, duplicate
//!   identifiers merged, Y trusted and X deliberately left open
//!
//! ### Stage 2: Column Detection
//! - **Input:** boundaries + all non-deprecated regions
//! - **Implementation:** `column_detector.rs`
//! - **Output:** boundary X traced back to source regions, boundaries
//!   split into at most two columns at the largest horizontal gap
//!
//! ### Stage 3: Element Assignment
//! - **Input:** remaining regions + placed boundaries
//! - **Implementation:** `element_assigner.rs`
//! - **Output:** content attached to the nearest boundary within an
//!   adaptive radius; everything else lands in the unassigned bucket
//!
//! ### Stage 4: Sub-Question Grouping
//! - **Input:** one question's content at a time
//! - **Implementation:** `sub_question_grouper.rs`
//! - **Output:** marker elements nested into sub-question nodes through a
//!   priority-ordered detector chain
//!
//! ### Stage 5: Document Assembly
//! - **Input:** prepared questions + unassigned elements
//! - **Implementation:** `document_assembler.rs`
//! - **Output:** [`StructuredDocument`] in reading order
//!
//! ## Module Organization
//!
//! - `orchestrator`: Main `AssemblyPipeline` struct and `assemble()` wiring
//! - `types`: Collaborator input model (regions, text, captions)
//! - `document`: Output tree (questions, boundaries, content)
//! - `patterns`: Identifier and marker regexes
//! - `diagnostics`: Partial-success reporting and output verification
//!
//! ## Usage
//!
//! See the top-level crate documentation for usage examples.

pub mod column_detector;
pub mod diagnostics;
pub mod document;
pub mod document_assembler;
pub mod element_assigner;
pub mod identifier_extractor;
pub mod orchestrator;
pub mod patterns;
pub mod sub_question_grouper;
pub mod types;

// ============================================================================
// Public API Exports
// ============================================================================
//
// Explicit exports for the public API. Stage internals stay reachable
// through their modules for embedders that drive stages individually.

// Core pipeline API
pub use orchestrator::{AssemblyConfig, AssemblyOutput, AssemblyPipeline};

// Input types (what the upstream detector, OCR, and captioner produce)
pub use types::{
    Caption,        // Caption keyed to a visual region
    DetectedRegion, // Detected layout region with class and confidence
    RecognizedText, // OCR text keyed to a region
    RegionBox,      // Axis-aligned bounding box in pixel coordinates
};

// Output model (what users get from assemble)
pub use document::{
    Boundary,           // Question start with Y trusted and X optional
    ColumnAssignment,   // Column placement with the estimated flag
    ContentElement,     // One placed region in the tree
    QuestionIdentifier, // Number or type-header identity
    QuestionNode,       // One question with content and sub-questions
    StructuredDocument, // The assembled tree plus unassigned bucket
    SubQuestionId,      // Sub-question local identifier, numerically ordered
};

// Diagnostics (partial success is first-class)
pub use diagnostics::{
    verify_document,    // Id-conservation check against the input
    BoundarySource,     // Region that won a boundary's merge
    RunDiagnostics,     // Accumulated anomalies of one run
    SkipReason,         // Why a region was left out
    SkippedRegion,      // One left-out region with its reason
    SubQuestionDetector, // Which chain detector created a sub-question
    SubQuestionRecord,  // Sub-question creation attribution
};

// Stage types (for embedders composing their own pipeline)
pub use column_detector::{ColumnConfig, ColumnDetector};
pub use document_assembler::{DocumentAssembler, PreparedQuestion};
pub use element_assigner::{AssignerConfig, ElementAssigner};
pub use identifier_extractor::{ExtractorConfig, IdentifierExtractor};
pub use sub_question_grouper::SubQuestionGrouper;
