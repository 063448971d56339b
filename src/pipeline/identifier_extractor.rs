//! Identifier extraction: boundary-eligible regions to question boundaries
//!
//! Scans every detection whose normalized class may start a question, runs
//! the recognized text through the number patterns (or header sanitizer),
//! fuses detector, OCR, and pattern confidence, and merges duplicate
//! identifiers through a pure fold. Output boundaries carry a resolved Y and
//! an unresolved X; the column detector owns X.

use crate::pipeline::diagnostics::{RunDiagnostics, SkipReason};
use crate::pipeline::document::{Boundary, QuestionIdentifier};
use crate::pipeline::patterns::{
    extract_question_number, matches_sub_question, sanitize_header_text,
};
use crate::pipeline::types::{DetectedRegion, RecognizedText};
use crate::taxonomy::ClassId;
use log::{debug, trace};
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::BTreeMap;

/// Configuration for identifier extraction
///
/// The three weights fuse detector confidence, OCR confidence, and the
/// pattern-match score into one boundary confidence. They are normalized by
/// their sum, so only their ratio matters.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractorConfig {
    /// Weight of the detector's own confidence (default 0.5)
    pub detector_weight: f64,
    /// Weight of the OCR confidence (default 0.3)
    pub ocr_weight: f64,
    /// Weight of the pattern-match score (default 0.2; fixed at 1.0 input
    /// for type headers, which carry no pattern ambiguity)
    pub pattern_weight: f64,
}

impl Default for ExtractorConfig {
    #[inline]
    fn default() -> Self {
        Self {
            detector_weight: 0.5,
            ocr_weight: 0.3,
            pattern_weight: 0.2,
        }
    }
}

impl ExtractorConfig {
    /// Weighted fusion of the three confidence signals
    #[must_use = "returns the fused confidence"]
    fn fuse(&self, detector: f64, ocr: f64, pattern: f64) -> f64 {
        let total = self.detector_weight + self.ocr_weight + self.pattern_weight;
        if total <= 0.0 {
            return 0.0;
        }
        (self.detector_weight * detector + self.ocr_weight * ocr + self.pattern_weight * pattern)
            / total
    }
}

/// One extraction candidate before the confidence merge
#[derive(Debug, Clone, PartialEq)]
struct BoundaryCandidate {
    boundary: Boundary,
    source_region_id: u32,
}

/// Pure merge rule for duplicate identifiers
///
/// Keeps the candidate with the higher fused confidence; ties go to the lower
/// region id. Order-independent, so the fold over candidates is deterministic
/// regardless of detection order.
#[must_use = "returns the winning candidate"]
fn merge_candidate(
    existing: Option<BoundaryCandidate>,
    new: BoundaryCandidate,
) -> BoundaryCandidate {
    match existing {
        None => new,
        Some(current) => {
            let new_wins = new.boundary.confidence > current.boundary.confidence
                || (new.boundary.confidence == current.boundary.confidence
                    && new.source_region_id < current.source_region_id);
            if new_wins {
                new
            } else {
                current
            }
        }
    }
}

/// Result of the extraction stage
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractionOutput {
    /// Surviving boundaries, keyed and iterated deterministically
    pub boundaries: BTreeMap<QuestionIdentifier, Boundary>,
    /// Region ids consumed here: boundary sources plus regions discarded
    /// with a recorded skip. Everything else stays available as an element.
    pub consumed: FxHashSet<u32>,
}

/// Identifier extraction stage
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IdentifierExtractor {
    config: ExtractorConfig,
}

impl IdentifierExtractor {
    #[inline]
    #[must_use = "returns a new IdentifierExtractor instance"]
    pub fn new() -> Self {
        Self {
            config: ExtractorConfig::default(),
        }
    }

    #[inline]
    #[must_use = "returns a new IdentifierExtractor with custom config"]
    pub const fn with_config(config: ExtractorConfig) -> Self {
        Self { config }
    }

    /// Extract question boundaries from boundary-eligible regions
    ///
    /// Regions whose text is a sub-question marker are deferred, not skipped:
    /// they stay available to the element assigner so the grouping fallback
    /// can claim them later. All other failures are recorded skips and
    /// consume their region.
    pub fn process(
        &self,
        regions: &[&DetectedRegion],
        classes: &FxHashMap<u32, ClassId>,
        texts: &FxHashMap<u32, &RecognizedText>,
        diagnostics: &mut RunDiagnostics,
    ) -> ExtractionOutput {
        let mut candidates: BTreeMap<QuestionIdentifier, BoundaryCandidate> = BTreeMap::new();
        let mut consumed: FxHashSet<u32> = FxHashSet::default();

        for region in regions {
            let Some(class) = classes.get(&region.id) else {
                continue;
            };
            if !class.is_boundary_eligible() {
                continue;
            }

            let candidate = match class {
                ClassId::QuestionNumber => {
                    match self.number_candidate(region, texts, &mut consumed, diagnostics) {
                        Some(candidate) => candidate,
                        None => continue,
                    }
                }
                ClassId::QuestionType => {
                    match self.header_candidate(region, texts, &mut consumed, diagnostics) {
                        Some(candidate) => candidate,
                        None => continue,
                    }
                }
                _ => continue,
            };

            let identifier = candidate.boundary.identifier.clone();
            match candidates.remove(&identifier) {
                None => {
                    candidates.insert(identifier, candidate);
                }
                Some(current) => {
                    let current_id = current.source_region_id;
                    let new_id = candidate.source_region_id;
                    let winner = merge_candidate(Some(current), candidate);
                    let loser_id = if winner.source_region_id == new_id {
                        current_id
                    } else {
                        new_id
                    };
                    consumed.insert(loser_id);
                    diagnostics.record_skip(
                        loser_id,
                        ClassId::QuestionNumber,
                        SkipReason::MergedDuplicate {
                            winner_region_id: winner.source_region_id,
                        },
                    );
                    candidates.insert(identifier, winner);
                }
            }
        }

        let mut boundaries = BTreeMap::new();
        for (identifier, candidate) in candidates {
            consumed.insert(candidate.source_region_id);
            diagnostics.record_boundary_source(identifier.clone(), candidate.source_region_id);
            boundaries.insert(identifier, candidate.boundary);
        }

        debug!(
            "extracted {} boundaries from {} regions ({} consumed)",
            boundaries.len(),
            regions.len(),
            consumed.len()
        );
        ExtractionOutput {
            boundaries,
            consumed,
        }
    }

    /// Candidate from a question-number region, or `None` with the region
    /// either skipped or deferred
    fn number_candidate(
        &self,
        region: &DetectedRegion,
        texts: &FxHashMap<u32, &RecognizedText>,
        consumed: &mut FxHashSet<u32>,
        diagnostics: &mut RunDiagnostics,
    ) -> Option<BoundaryCandidate> {
        let Some(text) = texts.get(&region.id) else {
            consumed.insert(region.id);
            diagnostics.record_skip(
                region.id,
                ClassId::QuestionNumber,
                SkipReason::NoRecognizedText,
            );
            return None;
        };

        if matches_sub_question(&text.text) {
            // Misclassified sub-question marker: never a top-level boundary,
            // but still an element for the grouping fallback
            trace!(
                "region {} text {:?} deferred to sub-question grouping",
                region.id,
                text.text
            );
            return None;
        }

        let Some(matched) = extract_question_number(&text.text) else {
            consumed.insert(region.id);
            diagnostics.record_skip(region.id, ClassId::QuestionNumber, SkipReason::PatternMiss);
            return None;
        };

        let confidence = self
            .config
            .fuse(region.confidence, text.confidence, matched.pattern_score);
        Some(BoundaryCandidate {
            boundary: Boundary::unresolved(
                QuestionIdentifier::Number(matched.identifier),
                region.bbox.y1,
                confidence,
            ),
            source_region_id: region.id,
        })
    }

    /// Candidate from a question-type header region, or `None` with the
    /// region skipped
    fn header_candidate(
        &self,
        region: &DetectedRegion,
        texts: &FxHashMap<u32, &RecognizedText>,
        consumed: &mut FxHashSet<u32>,
        diagnostics: &mut RunDiagnostics,
    ) -> Option<BoundaryCandidate> {
        let Some(text) = texts.get(&region.id) else {
            consumed.insert(region.id);
            diagnostics.record_skip(
                region.id,
                ClassId::QuestionType,
                SkipReason::NoRecognizedText,
            );
            return None;
        };

        let Some(sanitized) = sanitize_header_text(&text.text) else {
            consumed.insert(region.id);
            diagnostics.record_skip(
                region.id,
                ClassId::QuestionType,
                SkipReason::EmptyHeaderText,
            );
            return None;
        };

        // The class assignment already disambiguates headers; the pattern
        // term is therefore maximal
        let confidence = self.config.fuse(region.confidence, text.confidence, 1.0);
        Some(BoundaryCandidate {
            boundary: Boundary::unresolved(
                QuestionIdentifier::TypeHeader {
                    source_region_id: region.id,
                    sanitized_text: sanitized,
                },
                region.bbox.y1,
                confidence,
            ),
            source_region_id: region.id,
        })
    }

    /// Stage name for logging
    #[inline]
    #[must_use = "returns the stage name"]
    pub const fn stage_name() -> &'static str {
        "identifier_extractor"
    }
}
