//! Output data model: identifiers, boundaries, and the structured tree
//!
//! All entities here are created once per page run and never mutated after
//! element assignment, except to attach sub-questions and impose final order.
//! Every type serializes with serde; the caller owns the wire format.

use crate::pipeline::patterns::compare_digit_strings;
use crate::pipeline::types::RegionBox;
use crate::taxonomy::ClassId;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

/// Identifier of a top-level question node
///
/// The two variants never compare equal, even when their display strings
/// coincide: a printed "3" and a type header whose sanitized text happens to
/// be "3" are different questions. A `TypeHeader` additionally carries its
/// originating region id, so identical header text at two page positions
/// stays page-unique.
///
/// The derived `Ord` (numbers before headers, then field order) exists for
/// deterministic map iteration; reading-order comparison is the assembler's
/// job and is numeric-aware.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum QuestionIdentifier {
    /// Canonical printed question number ("3", "12")
    #[serde(rename = "number")]
    Number(String),
    /// Question-type header ("II. Multiple Choice"), keyed by source region
    #[serde(rename = "type_header")]
    TypeHeader {
        source_region_id: u32,
        sanitized_text: String,
    },
}

impl QuestionIdentifier {
    /// Check if this is a printed question number
    #[inline]
    #[must_use = "returns whether this identifier is a printed number"]
    pub const fn is_number(&self) -> bool {
        matches!(self, Self::Number(_))
    }

    /// Check if this is a question-type header
    #[inline]
    #[must_use = "returns whether this identifier is a type header"]
    pub const fn is_type_header(&self) -> bool {
        matches!(self, Self::TypeHeader { .. })
    }

    /// The numeric value string, for `Number` identifiers only
    #[inline]
    #[must_use = "returns the numeric value, if this is a number"]
    pub fn as_number(&self) -> Option<&str> {
        match self {
            Self::Number(value) => Some(value),
            Self::TypeHeader { .. } => None,
        }
    }

    /// Human-readable value (number string or sanitized header text)
    #[inline]
    #[must_use = "returns the display value of the identifier"]
    pub fn display_value(&self) -> &str {
        match self {
            Self::Number(value) => value,
            Self::TypeHeader { sanitized_text, .. } => sanitized_text,
        }
    }
}

impl fmt::Display for QuestionIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(value) => write!(f, "{value}"),
            Self::TypeHeader {
                source_region_id,
                sanitized_text,
            } => write!(f, "{sanitized_text}#{source_region_id}"),
        }
    }
}

/// Local identifier of a sub-question, ordered numerically
///
/// `"2" < "10"` under this ordering, so a `BTreeMap` keyed by it iterates
/// sub-questions in emission order with no extra sort.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubQuestionId(String);

impl SubQuestionId {
    #[inline]
    #[must_use = "returns a new SubQuestionId instance"]
    pub fn new(digits: impl Into<String>) -> Self {
        Self(digits.into())
    }

    #[inline]
    #[must_use = "returns the identifier digits"]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Ord for SubQuestionId {
    fn cmp(&self, other: &Self) -> Ordering {
        // String tie-break keeps the order total and consistent with Eq when
        // zero-padded spellings slip through
        compare_digit_strings(&self.0, &other.0).then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for SubQuestionId {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for SubQuestionId {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A detected region that starts a new question or question-type header
///
/// Produced by the identifier extractor with `x=None`; the column detector
/// fills `x` only by tracing it back to a source region. `x_resolved=false`
/// is an observable degraded state, never patched with a guessed coordinate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Boundary {
    pub identifier: QuestionIdentifier,
    /// Top edge of the source region
    pub y: i32,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub x: Option<i32>,
    /// Fused detector/OCR/pattern confidence
    pub confidence: f64,
    pub x_resolved: bool,
}

impl Boundary {
    /// A freshly extracted boundary with X not yet resolved
    #[inline]
    #[must_use = "returns a new unresolved Boundary instance"]
    pub const fn unresolved(identifier: QuestionIdentifier, y: i32, confidence: f64) -> Self {
        Self {
            identifier,
            y,
            x: None,
            confidence,
            x_resolved: false,
        }
    }

    /// Record the X coordinate traced back to a source region
    ///
    /// Keeps `x` and `x_resolved` in step.
    #[inline]
    pub fn resolve_x(&mut self, x: i32) {
        self.x = Some(x);
        self.x_resolved = true;
    }
}

/// Column placement of one boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnAssignment {
    /// Column index, 0 = leftmost
    pub column: u32,
    /// True when the boundary had no resolved X and column 0 is a default
    pub estimated: bool,
}

/// Any detected region attached to a question node
///
/// `text` is recognized text when present, else the caption for visual
/// classes, else `None`. Text is never fabricated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentElement {
    pub region_id: u32,
    pub class: ClassId,
    pub bbox: RegionBox,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub text: Option<String>,
}

/// One question (or question-type header) in the assembled tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionNode {
    pub identifier: QuestionIdentifier,
    /// Column index, 0 = leftmost
    pub column: u32,
    /// True when the column is a default placement for an unresolved X
    pub column_estimated: bool,
    /// Minimum of the boundary Y and the content box tops
    pub min_y: i32,
    /// False when the boundary's X never traced back to a source region
    pub x_resolved: bool,
    pub content: Vec<ContentElement>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub sub_questions: BTreeMap<SubQuestionId, QuestionNode>,
}

impl QuestionNode {
    /// Region ids of this node's content and all nested sub-questions
    fn collect_region_ids(&self, out: &mut Vec<u32>) {
        out.extend(self.content.iter().map(|e| e.region_id));
        for sub in self.sub_questions.values() {
            sub.collect_region_ids(out);
        }
    }
}

/// The assembled page: ordered top-level questions plus the unassigned bucket
///
/// Sub-questions live nested under their parents, never at the top level.
/// `unassigned` holds elements outside every boundary's assignment radius,
/// surfaced rather than discarded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuredDocument {
    pub questions: Vec<QuestionNode>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub unassigned: Vec<ContentElement>,
}

impl StructuredDocument {
    /// Number of top-level questions
    #[inline]
    #[must_use = "returns the number of top-level questions"]
    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    /// Find a top-level question by identifier
    #[must_use = "returns the matching question node, if any"]
    pub fn question(&self, identifier: &QuestionIdentifier) -> Option<&QuestionNode> {
        self.questions.iter().find(|q| &q.identifier == identifier)
    }

    /// Region ids placed anywhere in the tree (excluding the unassigned
    /// bucket), in tree order
    #[must_use = "returns the placed region ids"]
    pub fn placed_region_ids(&self) -> Vec<u32> {
        let mut ids = Vec::new();
        for question in &self.questions {
            question.collect_region_ids(&mut ids);
        }
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_test_element(region_id: u32) -> ContentElement {
        ContentElement {
            region_id,
            class: ClassId::Text,
            bbox: RegionBox::new(0, 0, 10, 10),
            text: Some(format!("element {region_id}")),
        }
    }

    fn make_test_node(identifier: QuestionIdentifier, region_ids: &[u32]) -> QuestionNode {
        QuestionNode {
            identifier,
            column: 0,
            column_estimated: false,
            min_y: 0,
            x_resolved: true,
            content: region_ids.iter().copied().map(make_test_element).collect(),
            sub_questions: BTreeMap::new(),
        }
    }

    #[test]
    fn test_identifier_variants_never_equal() {
        let number = QuestionIdentifier::Number("3".to_string());
        let header = QuestionIdentifier::TypeHeader {
            source_region_id: 9,
            sanitized_text: "3".to_string(),
        };
        assert_eq!(number.display_value(), header.display_value());
        assert_ne!(number, header);
    }

    #[test]
    fn test_type_headers_unique_per_region() {
        let a = QuestionIdentifier::TypeHeader {
            source_region_id: 1,
            sanitized_text: "Multiple_Choice".to_string(),
        };
        let b = QuestionIdentifier::TypeHeader {
            source_region_id: 2,
            sanitized_text: "Multiple_Choice".to_string(),
        };
        assert_ne!(a, b);
    }

    #[test]
    fn test_sub_question_id_orders_numerically() {
        let mut ids = vec![
            SubQuestionId::new("10"),
            SubQuestionId::new("2"),
            SubQuestionId::new("1"),
        ];
        ids.sort();
        let ordered: Vec<&str> = ids.iter().map(SubQuestionId::as_str).collect();
        assert_eq!(ordered, vec!["1", "2", "10"]);
    }

    #[test]
    fn test_sub_question_map_iterates_numerically() {
        let mut subs: BTreeMap<SubQuestionId, u32> = BTreeMap::new();
        subs.insert(SubQuestionId::new("11"), 0);
        subs.insert(SubQuestionId::new("2"), 0);
        subs.insert(SubQuestionId::new("9"), 0);
        let keys: Vec<&str> = subs.keys().map(SubQuestionId::as_str).collect();
        assert_eq!(keys, vec!["2", "9", "11"]);
    }

    #[test]
    fn test_boundary_resolution_keeps_flag_in_step() {
        let mut boundary =
            Boundary::unresolved(QuestionIdentifier::Number("4".to_string()), 120, 0.8);
        assert_eq!(boundary.x, None);
        assert!(!boundary.x_resolved);

        boundary.resolve_x(260);
        assert_eq!(boundary.x, Some(260));
        assert!(boundary.x_resolved);
    }

    #[test]
    fn test_identifier_serde_shape() {
        let number = QuestionIdentifier::Number("3".to_string());
        assert_eq!(
            serde_json::to_string(&number).unwrap(),
            r#"{"number":"3"}"#
        );

        let id = SubQuestionId::new("2");
        assert_eq!(serde_json::to_string(&id).unwrap(), r#""2""#);
    }

    #[test]
    fn test_unresolved_boundary_serializes_without_x() {
        let boundary = Boundary::unresolved(QuestionIdentifier::Number("1".to_string()), 50, 0.9);
        let json = serde_json::to_string(&boundary).unwrap();
        assert!(!json.contains("\"x\""), "unexpected x field in {json}");
        assert!(json.contains("\"x_resolved\":false"));
    }

    #[test]
    fn test_placed_region_ids_walks_sub_questions() {
        let mut parent = make_test_node(QuestionIdentifier::Number("4".to_string()), &[1, 2]);
        parent.sub_questions.insert(
            SubQuestionId::new("1"),
            make_test_node(QuestionIdentifier::Number("4".to_string()), &[3]),
        );
        let document = StructuredDocument {
            questions: vec![parent],
            unassigned: vec![make_test_element(99)],
        };

        let ids = document.placed_region_ids();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(document.question_count(), 1);
    }

    #[test]
    fn test_question_lookup() {
        let node = make_test_node(QuestionIdentifier::Number("7".to_string()), &[1]);
        let document = StructuredDocument {
            questions: vec![node],
            unassigned: Vec::new(),
        };
        assert!(document
            .question(&QuestionIdentifier::Number("7".to_string()))
            .is_some());
        assert!(document
            .question(&QuestionIdentifier::Number("8".to_string()))
            .is_none());
    }
}
