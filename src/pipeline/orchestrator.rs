//! Pipeline orchestrator: wires the assembly stages together
//!
//! Validates the input contract up front (malformed input is an error, not
//! a diagnostic), then runs extraction, column detection, element
//! assignment, sub-question grouping, and final assembly in order. Every
//! per-region anomaly the stages record rides along in the returned
//! diagnostics; a page with no usable boundaries assembles into an empty
//! document rather than failing.

use crate::error::{AssemblyError, Result};
use crate::pipeline::column_detector::{ColumnConfig, ColumnDetector, ColumnOutput};
use crate::pipeline::diagnostics::{verify_document, RunDiagnostics, SkipReason};
use crate::pipeline::document::{ColumnAssignment, StructuredDocument};
use crate::pipeline::document_assembler::{DocumentAssembler, PreparedQuestion};
use crate::pipeline::element_assigner::{AssignerConfig, ElementAssigner};
use crate::pipeline::identifier_extractor::{ExtractorConfig, IdentifierExtractor};
use crate::pipeline::sub_question_grouper::SubQuestionGrouper;
use crate::pipeline::types::{Caption, DetectedRegion, RecognizedText};
use crate::taxonomy::{ClassId, ClassTaxonomy};
use log::debug;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

/// Configuration for the whole pipeline
///
/// Distance thresholds are page-resolution dependent; the defaults suit
/// scan resolutions around 1300px page width and are meant to be retuned
/// per corpus.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssemblyConfig {
    pub taxonomy: ClassTaxonomy,
    pub extractor: ExtractorConfig,
    pub columns: ColumnConfig,
    pub assigner: AssignerConfig,
    /// Override for the page width otherwise derived from region extents
    pub page_width_override: Option<i32>,
    /// Override for the page height otherwise derived from region extents
    pub page_height_override: Option<i32>,
}

/// Result of one assembly run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssemblyOutput {
    pub document: StructuredDocument,
    pub diagnostics: RunDiagnostics,
}

impl AssemblyOutput {
    /// Cross-check id conservation against the original detections
    #[must_use = "returns the verification result and warnings"]
    pub fn verify(&self, detections: &[DetectedRegion]) -> (bool, Vec<String>) {
        verify_document(detections, &self.document, &self.diagnostics)
    }
}

/// Worksheet structure assembly pipeline
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssemblyPipeline {
    taxonomy: ClassTaxonomy,
    extractor: IdentifierExtractor,
    column_detector: ColumnDetector,
    element_assigner: ElementAssigner,
    grouper: SubQuestionGrouper,
    assembler: DocumentAssembler,
    page_width_override: Option<i32>,
    page_height_override: Option<i32>,
}

impl AssemblyPipeline {
    /// Create a pipeline with default configuration
    #[inline]
    #[must_use = "pipeline is created but not used"]
    pub fn new() -> Self {
        Self::with_config(AssemblyConfig::default())
    }

    /// Create a pipeline with custom configuration
    #[must_use = "pipeline is created but not used"]
    pub fn with_config(config: AssemblyConfig) -> Self {
        Self {
            taxonomy: config.taxonomy,
            extractor: IdentifierExtractor::with_config(config.extractor),
            column_detector: ColumnDetector::with_config(config.columns),
            element_assigner: ElementAssigner::with_config(config.assigner),
            grouper: SubQuestionGrouper::new(),
            assembler: DocumentAssembler::new(),
            page_width_override: config.page_width_override,
            page_height_override: config.page_height_override,
        }
    }

    /// Assemble the question structure of one page
    ///
    /// `texts` and `captions` are keyed to `detections` by region id; at
    /// most one entry per region each. Malformed input fails fast with the
    /// first offending entry in input order.
    ///
    /// # Errors
    ///
    /// Returns an [`AssemblyError`] when a region id repeats, a bounding
    /// box has no positive extent, a confidence leaves `[0, 1]`, or a text
    /// or caption references a region that does not exist.
    pub fn assemble(
        &self,
        detections: &[DetectedRegion],
        texts: &[RecognizedText],
        captions: &[Caption],
    ) -> Result<AssemblyOutput> {
        validate_inputs(detections, texts, captions)?;

        debug!(
            "assembling {} regions, {} text entries, {} captions",
            detections.len(),
            texts.len(),
            captions.len()
        );
        let mut diagnostics = RunDiagnostics::default();

        let classes: FxHashMap<u32, ClassId> = detections
            .iter()
            .map(|r| (r.id, self.taxonomy.normalize(&r.class_name)))
            .collect();

        // Deprecated classes drop out before any stage sees them
        let mut active: Vec<&DetectedRegion> = Vec::with_capacity(detections.len());
        for region in detections {
            let class = &classes[&region.id];
            if self.taxonomy.is_deprecated(class) {
                diagnostics.record_skip(region.id, class.clone(), SkipReason::DeprecatedClass);
            } else {
                active.push(region);
            }
        }

        let text_map: FxHashMap<u32, &RecognizedText> =
            texts.iter().map(|t| (t.region_id, t)).collect();
        let caption_map: FxHashMap<u32, &Caption> =
            captions.iter().map(|c| (c.region_id, c)).collect();

        debug!(
            "{}: scanning {} active regions",
            IdentifierExtractor::stage_name(),
            active.len()
        );
        let extraction = self
            .extractor
            .process(&active, &classes, &text_map, &mut diagnostics);
        debug!("  -> {} boundaries", extraction.boundaries.len());

        let (page_width, page_height) = self.page_extent(detections);
        let page_area = f64::from(page_width.max(0)) * f64::from(page_height.max(0));

        debug!(
            "{}: resolving X on a {page_width}x{page_height} page",
            ColumnDetector::stage_name()
        );
        let ColumnOutput {
            boundaries,
            assignments,
        } = self.column_detector.process(
            extraction.boundaries,
            &active,
            &classes,
            &text_map,
            page_width,
            &mut diagnostics,
        );

        let elements: Vec<&DetectedRegion> = active
            .iter()
            .copied()
            .filter(|r| !extraction.consumed.contains(&r.id))
            .collect();

        debug!(
            "{}: placing {} elements",
            ElementAssigner::stage_name(),
            elements.len()
        );
        let mut assignment = self.element_assigner.process(
            &elements,
            &boundaries,
            &classes,
            &text_map,
            &caption_map,
            page_area,
            &mut diagnostics,
        );

        let mut prepared = Vec::with_capacity(boundaries.len());
        for (identifier, boundary) in boundaries {
            let placement = assignments
                .get(&identifier)
                .copied()
                .unwrap_or(ColumnAssignment {
                    column: 0,
                    estimated: true,
                });
            let content = assignment.assigned.remove(&identifier).unwrap_or_default();
            let grouping = self.grouper.process(
                &identifier,
                placement.column,
                placement.estimated,
                boundary.x_resolved,
                content,
                &mut diagnostics,
            );
            prepared.push(PreparedQuestion {
                boundary,
                assignment: placement,
                content: grouping.remaining,
                sub_questions: grouping.sub_questions,
            });
        }

        let document = self
            .assembler
            .process(prepared, assignment.unassigned);
        debug!(
            "  -> {} questions, {} unassigned, {} anomalies",
            document.questions.len(),
            document.unassigned.len(),
            diagnostics.skip_count() + diagnostics.unresolved_boundaries.len()
        );

        Ok(AssemblyOutput {
            document,
            diagnostics,
        })
    }

    /// Page extent from the configured overrides or the region extents
    fn page_extent(&self, detections: &[DetectedRegion]) -> (i32, i32) {
        let width = self
            .page_width_override
            .unwrap_or_else(|| detections.iter().map(|r| r.bbox.x2).max().unwrap_or(0));
        let height = self
            .page_height_override
            .unwrap_or_else(|| detections.iter().map(|r| r.bbox.y2).max().unwrap_or(0));
        (width, height)
    }
}

/// Check the input contract, failing on the first offense in input order
fn validate_inputs(
    detections: &[DetectedRegion],
    texts: &[RecognizedText],
    captions: &[Caption],
) -> Result<()> {
    let mut region_ids: FxHashSet<u32> = FxHashSet::default();
    for region in detections {
        if !region_ids.insert(region.id) {
            return Err(AssemblyError::DuplicateRegionId {
                region_id: region.id,
            });
        }
        if !region.bbox.has_positive_extent() {
            return Err(AssemblyError::InvalidGeometry {
                region_id: region.id,
                bbox: region.bbox,
            });
        }
        if !confidence_valid(region.confidence) {
            return Err(AssemblyError::InvalidConfidence {
                region_id: region.id,
                confidence: region.confidence,
            });
        }
    }

    let mut text_ids: FxHashSet<u32> = FxHashSet::default();
    for text in texts {
        if !region_ids.contains(&text.region_id) {
            return Err(AssemblyError::DanglingTextReference {
                region_id: text.region_id,
            });
        }
        if !text_ids.insert(text.region_id) {
            return Err(AssemblyError::DuplicateTextEntry {
                region_id: text.region_id,
            });
        }
        if !confidence_valid(text.confidence) {
            return Err(AssemblyError::InvalidTextConfidence {
                region_id: text.region_id,
                confidence: text.confidence,
            });
        }
    }

    let mut caption_ids: FxHashSet<u32> = FxHashSet::default();
    for caption in captions {
        if !region_ids.contains(&caption.region_id) {
            return Err(AssemblyError::DanglingCaptionReference {
                region_id: caption.region_id,
            });
        }
        if !caption_ids.insert(caption.region_id) {
            return Err(AssemblyError::DuplicateCaptionEntry {
                region_id: caption.region_id,
            });
        }
    }

    Ok(())
}

#[inline]
fn confidence_valid(confidence: f64) -> bool {
    confidence.is_finite() && (0.0..=1.0).contains(&confidence)
}
