//! Sub-question grouping: nest marker elements inside their parent question
//!
//! Runs an ordered detector chain over a question's content. The dedicated
//! sub-question class is authoritative; a fallback catches question-number
//! elements whose text is really a parenthesized marker, a common detector
//! misclassification. Passes run in chain order and an element claimed by an
//! earlier detector is invisible to later ones, so one marker can never
//! create two nodes. Each created node is attributed to its detector in the
//! run diagnostics.

use crate::pipeline::diagnostics::{RunDiagnostics, SubQuestionDetector};
use crate::pipeline::document::{ContentElement, QuestionIdentifier, QuestionNode, SubQuestionId};
use crate::pipeline::patterns::{extract_sub_question_marker, extract_trailing_digits};
use crate::taxonomy::ClassId;
use log::debug;
use std::collections::BTreeMap;

type DetectorFn = fn(&ContentElement) -> Option<SubQuestionId>;

/// Detector chain in authority order; later entries only see elements the
/// earlier ones left unclaimed
const DETECTOR_CHAIN: &[(SubQuestionDetector, DetectorFn)] = &[
    (SubQuestionDetector::SubQuestionClass, detect_sub_class_marker),
    (
        SubQuestionDetector::QuestionNumberFallback,
        detect_fallback_marker,
    ),
];

/// Marker from an element the detector already classified as a sub-question
/// number
fn detect_sub_class_marker(element: &ContentElement) -> Option<SubQuestionId> {
    if !element.class.is_sub_boundary() {
        return None;
    }
    let text = element.text.as_deref()?;
    extract_trailing_digits(text).map(SubQuestionId::new)
}

/// Marker from a question-number element whose text is bracketed, which the
/// extraction stage refused as a top-level boundary
fn detect_fallback_marker(element: &ContentElement) -> Option<SubQuestionId> {
    if element.class != ClassId::QuestionNumber {
        return None;
    }
    let text = element.text.as_deref()?;
    extract_sub_question_marker(text).map(SubQuestionId::new)
}

/// Output of sub-question grouping for one parent question
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupingOutput {
    /// Created sub-question nodes, iterated in numeric marker order
    pub sub_questions: BTreeMap<SubQuestionId, QuestionNode>,
    /// Content no detector claimed, in the original order
    pub remaining: Vec<ContentElement>,
}

/// Sub-question grouping stage
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SubQuestionGrouper;

impl SubQuestionGrouper {
    #[inline]
    #[must_use = "returns a new SubQuestionGrouper instance"]
    pub const fn new() -> Self {
        Self
    }

    /// Group one question's content into sub-question nodes
    ///
    /// Created nodes inherit the parent's column placement; their `min_y`
    /// comes from their own claimed elements.
    pub fn process(
        &self,
        parent: &QuestionIdentifier,
        column: u32,
        column_estimated: bool,
        x_resolved: bool,
        content: Vec<ContentElement>,
        diagnostics: &mut RunDiagnostics,
    ) -> GroupingOutput {
        let mut claims: Vec<Option<SubQuestionId>> = vec![None; content.len()];
        let mut creators: BTreeMap<SubQuestionId, SubQuestionDetector> = BTreeMap::new();

        for (detector, detect) in DETECTOR_CHAIN {
            for (index, element) in content.iter().enumerate() {
                if claims[index].is_some() {
                    continue;
                }
                let Some(local_id) = detect(element) else {
                    continue;
                };
                if !creators.contains_key(&local_id) {
                    creators.insert(local_id.clone(), *detector);
                    diagnostics.record_sub_question(parent.clone(), local_id.clone(), *detector);
                }
                claims[index] = Some(local_id);
            }
        }

        let mut output = GroupingOutput::default();
        for (element, claim) in content.into_iter().zip(claims) {
            match claim {
                Some(local_id) => {
                    let node = output
                        .sub_questions
                        .entry(local_id.clone())
                        .or_insert_with(|| QuestionNode {
                            identifier: QuestionIdentifier::Number(local_id.as_str().to_string()),
                            column,
                            column_estimated,
                            min_y: element.bbox.y1,
                            x_resolved,
                            content: Vec::new(),
                            sub_questions: BTreeMap::new(),
                        });
                    node.min_y = node.min_y.min(element.bbox.y1);
                    node.content.push(element);
                }
                None => output.remaining.push(element),
            }
        }

        if !output.sub_questions.is_empty() {
            debug!(
                "grouped {} sub-questions under {parent}, {} elements left at top level",
                output.sub_questions.len(),
                output.remaining.len()
            );
        }
        output
    }

    /// Stage name for logging
    #[inline]
    #[must_use = "returns the stage name"]
    pub const fn stage_name() -> &'static str {
        "sub_question_grouper"
    }
}
