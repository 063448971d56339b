//! Run diagnostics: per-region anomalies that are not errors
//!
//! Partial success is a first-class outcome. Every region the pipeline leaves
//! out of the tree is recorded here with a typed reason, every boundary whose
//! X stayed unresolved is listed, and every sub-question node is attributed
//! to the detector that created it. [`verify_document`] cross-checks the
//! final tree against the input for id conservation.

use crate::pipeline::document::{QuestionIdentifier, StructuredDocument, SubQuestionId};
use crate::pipeline::types::DetectedRegion;
use crate::taxonomy::ClassId;
use log::{debug, trace, warn};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a region was left out of the assembled tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Boundary-eligible region with no recognized text to extract from
    NoRecognizedText,
    /// Question-number text failed pattern extraction
    PatternMiss,
    /// Type-header text left nothing after sanitizing
    EmptyHeaderText,
    /// Class is in the taxonomy's deprecated set
    DeprecatedClass,
    /// Duplicate identifier: this region lost the confidence merge
    MergedDuplicate { winner_region_id: u32 },
    /// Element farther than the assignment radius from every boundary
    OutsideAssignmentRadius {
        nearest: QuestionIdentifier,
        distance: f64,
    },
    /// No boundary existed to assign the element to
    NoBoundaryAvailable,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoRecognizedText => write!(f, "no recognized text"),
            Self::PatternMiss => write!(f, "text failed question number extraction"),
            Self::EmptyHeaderText => write!(f, "header text empty after sanitizing"),
            Self::DeprecatedClass => write!(f, "class is deprecated"),
            Self::MergedDuplicate { winner_region_id } => {
                write!(f, "duplicate identifier merged into region {winner_region_id}")
            }
            Self::OutsideAssignmentRadius { nearest, distance } => {
                write!(
                    f,
                    "outside every assignment radius (nearest {nearest}, distance {distance:.1})"
                )
            }
            Self::NoBoundaryAvailable => write!(f, "no boundary available"),
        }
    }
}

/// One region left out of the tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedRegion {
    pub region_id: u32,
    pub class: ClassId,
    pub reason: SkipReason,
}

/// The source region that won a boundary's confidence merge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundarySource {
    pub identifier: QuestionIdentifier,
    pub region_id: u32,
}

/// Which detector in the grouping chain created a sub-question node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubQuestionDetector {
    /// The authoritative signal: a `sub_question_number`-classified element
    SubQuestionClass,
    /// Fallback for detector misclassification: a `question_number` element
    /// whose text is a parenthesized marker
    QuestionNumberFallback,
}

impl fmt::Display for SubQuestionDetector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SubQuestionClass => write!(f, "sub_question_class"),
            Self::QuestionNumberFallback => write!(f, "question_number_fallback"),
        }
    }
}

/// Attribution of one sub-question node to the detector that created it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubQuestionRecord {
    pub parent: QuestionIdentifier,
    pub local_id: SubQuestionId,
    pub detector: SubQuestionDetector,
}

/// Accumulated anomalies of one pipeline run
///
/// Returned alongside the document; an empty instance means every region was
/// placed and every boundary resolved.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunDiagnostics {
    /// Regions left out of the tree, with reasons
    pub skipped: Vec<SkippedRegion>,
    /// Boundaries whose X never traced back to a source region
    pub unresolved_boundaries: Vec<QuestionIdentifier>,
    /// Source regions that produced each boundary
    pub boundary_sources: Vec<BoundarySource>,
    /// Sub-question nodes with their creating detector
    pub sub_questions: Vec<SubQuestionRecord>,
}

impl RunDiagnostics {
    /// Record a skipped region and log the decision
    pub fn record_skip(&mut self, region_id: u32, class: ClassId, reason: SkipReason) {
        debug!("region {region_id} ({class}) skipped: {reason}");
        self.skipped.push(SkippedRegion {
            region_id,
            class,
            reason,
        });
    }

    /// Record a boundary whose X could not be resolved
    pub fn record_unresolved_boundary(&mut self, identifier: QuestionIdentifier) {
        warn!("boundary {identifier}: no source region matched, X stays unresolved");
        self.unresolved_boundaries.push(identifier);
    }

    /// Record the source region that won a boundary's merge
    pub fn record_boundary_source(&mut self, identifier: QuestionIdentifier, region_id: u32) {
        trace!("boundary {identifier} produced by region {region_id}");
        self.boundary_sources.push(BoundarySource {
            identifier,
            region_id,
        });
    }

    /// Record a freshly created sub-question node
    pub fn record_sub_question(
        &mut self,
        parent: QuestionIdentifier,
        local_id: SubQuestionId,
        detector: SubQuestionDetector,
    ) {
        trace!("sub-question {local_id} under {parent} created by {detector}");
        self.sub_questions.push(SubQuestionRecord {
            parent,
            local_id,
            detector,
        });
    }

    /// Number of skipped regions
    #[inline]
    #[must_use = "returns the number of skipped regions"]
    pub fn skip_count(&self) -> usize {
        self.skipped.len()
    }

    /// Check if the run recorded any skip or unresolved boundary
    #[inline]
    #[must_use = "returns whether any anomaly was recorded"]
    pub fn has_anomalies(&self) -> bool {
        !self.skipped.is_empty() || !self.unresolved_boundaries.is_empty()
    }
}

/// Verify id conservation between the input and the assembled document
///
/// Checks that no region id is placed twice, that every placed id exists in
/// the input, and that every input id is accounted for exactly once across
/// tree content, the unassigned bucket, recorded skips, and boundary sources.
/// Returns whether verification passed plus human-readable warnings, which
/// are also logged.
#[must_use = "returns the verification result and warnings"]
pub fn verify_document(
    detections: &[DetectedRegion],
    document: &StructuredDocument,
    diagnostics: &RunDiagnostics,
) -> (bool, Vec<String>) {
    let mut warnings = Vec::new();

    let input_ids: FxHashSet<u32> = detections.iter().map(|r| r.id).collect();
    let placed = document.placed_region_ids();

    let mut seen: FxHashSet<u32> = FxHashSet::default();
    for id in &placed {
        if !seen.insert(*id) {
            warnings.push(format!("region {id} placed more than once"));
        }
        if !input_ids.contains(id) {
            warnings.push(format!("region {id} in output but not in input"));
        }
    }

    let mut accounted: FxHashSet<u32> = seen;
    accounted.extend(document.unassigned.iter().map(|e| e.region_id));
    accounted.extend(diagnostics.skipped.iter().map(|s| s.region_id));
    accounted.extend(diagnostics.boundary_sources.iter().map(|b| b.region_id));

    for region in detections {
        if !accounted.contains(&region.id) {
            warnings.push(format!(
                "region {} ({}) unaccounted for: neither placed, unassigned, skipped, nor a boundary source",
                region.id, region.class_name
            ));
        }
    }

    for warning in &warnings {
        warn!("document verification: {warning}");
    }
    (warnings.is_empty(), warnings)
}
