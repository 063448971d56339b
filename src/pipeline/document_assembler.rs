//! Document assembly: order prepared questions into the final tree
//!
//! Questions sort by a strict total order: confidently placed before
//! estimated, then column, then minimum Y, then identifier value. Numeric
//! identifiers compare as integers and always precede type headers, so "2"
//! sorts before "10" and a header between two numbers stays between them
//! when the geometry says so.

use crate::pipeline::document::{
    Boundary, ColumnAssignment, ContentElement, QuestionIdentifier, QuestionNode,
    StructuredDocument, SubQuestionId,
};
use log::debug;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// One question with everything the assembler needs to place it
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedQuestion {
    pub boundary: Boundary,
    pub assignment: ColumnAssignment,
    /// Content left at the top level after sub-question grouping
    pub content: Vec<ContentElement>,
    pub sub_questions: BTreeMap<SubQuestionId, QuestionNode>,
}

/// Document assembly stage
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DocumentAssembler;

impl DocumentAssembler {
    #[inline]
    #[must_use = "returns a new DocumentAssembler instance"]
    pub const fn new() -> Self {
        Self
    }

    /// Build the final document in reading order
    #[must_use = "returns the assembled document"]
    pub fn process(
        &self,
        prepared: Vec<PreparedQuestion>,
        unassigned: Vec<ContentElement>,
    ) -> StructuredDocument {
        let mut questions: Vec<QuestionNode> = prepared.into_iter().map(build_node).collect();
        questions.sort_unstable_by(compare_nodes);

        let column_count = questions
            .iter()
            .map(|q| q.column)
            .max()
            .map_or(0, |c| c + 1);
        debug!(
            "assembled {} questions across {column_count} column(s), {} unassigned elements",
            questions.len(),
            unassigned.len()
        );

        StructuredDocument {
            questions,
            unassigned,
        }
    }

    /// Stage name for logging
    #[inline]
    #[must_use = "returns the stage name"]
    pub const fn stage_name() -> &'static str {
        "document_assembler"
    }
}

fn build_node(prepared: PreparedQuestion) -> QuestionNode {
    // The boundary Y participates so a question with no top-level content
    // still has a position
    let min_y = prepared
        .content
        .iter()
        .map(|e| e.bbox.y1)
        .fold(prepared.boundary.y, i32::min);

    QuestionNode {
        identifier: prepared.boundary.identifier,
        column: prepared.assignment.column,
        column_estimated: prepared.assignment.estimated,
        min_y,
        x_resolved: prepared.boundary.x_resolved,
        content: prepared.content,
        sub_questions: prepared.sub_questions,
    }
}

/// Reading order between two questions
///
/// Strict total order: distinct questions always differ in identifier, so
/// the final key never ties.
fn compare_nodes(a: &QuestionNode, b: &QuestionNode) -> Ordering {
    a.column_estimated
        .cmp(&b.column_estimated)
        .then_with(|| a.column.cmp(&b.column))
        .then_with(|| a.min_y.cmp(&b.min_y))
        .then_with(|| compare_identifiers(&a.identifier, &b.identifier))
}

/// Identifier value order: numbers compare as integers and precede headers
fn compare_identifiers(a: &QuestionIdentifier, b: &QuestionIdentifier) -> Ordering {
    match (a, b) {
        (QuestionIdentifier::Number(left), QuestionIdentifier::Number(right)) => {
            match (left.parse::<u64>(), right.parse::<u64>()) {
                (Ok(left_n), Ok(right_n)) => {
                    left_n.cmp(&right_n).then_with(|| left.cmp(right))
                }
                _ => left.cmp(right),
            }
        }
        (QuestionIdentifier::Number(_), QuestionIdentifier::TypeHeader { .. }) => Ordering::Less,
        (QuestionIdentifier::TypeHeader { .. }, QuestionIdentifier::Number(_)) => Ordering::Greater,
        (
            QuestionIdentifier::TypeHeader {
                sanitized_text: left_text,
                source_region_id: left_id,
            },
            QuestionIdentifier::TypeHeader {
                sanitized_text: right_text,
                source_region_id: right_id,
            },
        ) => left_text.cmp(right_text).then_with(|| left_id.cmp(right_id)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::types::RegionBox;
    use crate::taxonomy::ClassId;

    fn make_test_element(region_id: u32, y1: i32) -> ContentElement {
        ContentElement {
            region_id,
            class: ClassId::Text,
            bbox: RegionBox::new(100, y1, 400, y1 + 40),
            text: Some("content".to_string()),
        }
    }

    fn prepared_number(
        value: &str,
        y: i32,
        column: u32,
        estimated: bool,
        content: Vec<ContentElement>,
    ) -> PreparedQuestion {
        let identifier = QuestionIdentifier::Number(value.to_string());
        let mut boundary = Boundary::unresolved(identifier, y, 0.9);
        if !estimated {
            boundary.resolve_x(100 + 600 * column as i32);
        }
        PreparedQuestion {
            boundary,
            assignment: ColumnAssignment { column, estimated },
            content,
            sub_questions: BTreeMap::new(),
        }
    }

    fn prepared_header(text: &str, region_id: u32, y: i32, column: u32) -> PreparedQuestion {
        let identifier = QuestionIdentifier::TypeHeader {
            source_region_id: region_id,
            sanitized_text: text.to_string(),
        };
        let mut boundary = Boundary::unresolved(identifier, y, 0.9);
        boundary.resolve_x(100);
        PreparedQuestion {
            boundary,
            assignment: ColumnAssignment {
                column,
                estimated: false,
            },
            content: Vec::new(),
            sub_questions: BTreeMap::new(),
        }
    }

    fn identifier_values(document: &StructuredDocument) -> Vec<String> {
        document
            .questions
            .iter()
            .map(|q| q.identifier.display_value().to_string())
            .collect()
    }

    #[test]
    fn test_left_column_drains_before_right() {
        let prepared = vec![
            prepared_number("3", 100, 1, false, Vec::new()),
            prepared_number("2", 900, 0, false, Vec::new()),
            prepared_number("1", 100, 0, false, Vec::new()),
        ];
        let document = DocumentAssembler::new().process(prepared, Vec::new());

        // Question 3 sits higher on the page but in the right column
        assert_eq!(identifier_values(&document), vec!["1", "2", "3"]);
    }

    #[test]
    fn test_estimated_placement_sorts_last() {
        let prepared = vec![
            prepared_number("9", 10, 0, true, Vec::new()),
            prepared_number("1", 900, 1, false, Vec::new()),
        ];
        let document = DocumentAssembler::new().process(prepared, Vec::new());

        assert_eq!(identifier_values(&document), vec!["1", "9"]);
        assert!(document.questions[1].column_estimated);
    }

    #[test]
    fn test_numeric_identifiers_never_sort_lexicographically() {
        // Same column, same Y: only the identifier value decides
        let prepared = vec![
            prepared_number("10", 100, 0, false, Vec::new()),
            prepared_number("2", 100, 0, false, Vec::new()),
            prepared_number("3", 100, 0, false, Vec::new()),
        ];
        let document = DocumentAssembler::new().process(prepared, Vec::new());

        assert_eq!(identifier_values(&document), vec!["2", "3", "10"]);
    }

    #[test]
    fn test_header_interleaves_by_position() {
        let prepared = vec![
            prepared_number("2", 700, 0, false, Vec::new()),
            prepared_header("Fill_in_the_Blank", 50, 400, 0),
            prepared_number("1", 100, 0, false, Vec::new()),
        ];
        let document = DocumentAssembler::new().process(prepared, Vec::new());

        assert_eq!(
            identifier_values(&document),
            vec!["1", "Fill_in_the_Blank", "2"]
        );
    }

    #[test]
    fn test_number_precedes_header_at_equal_position() {
        let prepared = vec![
            prepared_header("Reading", 50, 100, 0),
            prepared_number("1", 100, 0, false, Vec::new()),
        ];
        let document = DocumentAssembler::new().process(prepared, Vec::new());

        assert_eq!(identifier_values(&document), vec!["1", "Reading"]);
    }

    #[test]
    fn test_min_y_takes_content_above_the_boundary() {
        let prepared = vec![
            prepared_number("2", 200, 0, false, Vec::new()),
            // Boundary at 250 but an attached element reaches up to 150
            prepared_number("1", 250, 0, false, vec![make_test_element(10, 150)]),
        ];
        let document = DocumentAssembler::new().process(prepared, Vec::new());

        assert_eq!(identifier_values(&document), vec!["1", "2"]);
        assert_eq!(document.questions[0].min_y, 150);
        assert_eq!(document.questions[1].min_y, 200);
    }

    #[test]
    fn test_question_without_content_keeps_boundary_position() {
        let prepared = vec![prepared_number("7", 320, 0, false, Vec::new())];
        let document = DocumentAssembler::new().process(prepared, Vec::new());

        assert_eq!(document.questions[0].min_y, 320);
        assert!(document.questions[0].content.is_empty());
    }

    #[test]
    fn test_unassigned_elements_pass_through_in_order() {
        let unassigned = vec![make_test_element(5, 100), make_test_element(3, 900)];
        let document = DocumentAssembler::new().process(Vec::new(), unassigned);

        assert!(document.questions.is_empty());
        let ids: Vec<u32> = document.unassigned.iter().map(|e| e.region_id).collect();
        assert_eq!(ids, vec![5, 3]);
    }
}
