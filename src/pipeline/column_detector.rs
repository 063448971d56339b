//! Column detection: X resolution and the single-gap column split
//!
//! Boundaries arrive with a trusted Y and no X. This stage traces each
//! boundary back to a source region to resolve X, then splits the page into
//! at most two columns at the largest horizontal gap between resolved
//! boundary Xs. A boundary that cannot be traced keeps `x = None`, lands in
//! column 0 with `estimated = true`, and is reported in diagnostics; X is
//! never guessed.

use crate::pipeline::diagnostics::RunDiagnostics;
use crate::pipeline::document::{Boundary, ColumnAssignment, QuestionIdentifier};
use crate::pipeline::patterns::extract_question_number;
use crate::pipeline::types::{DetectedRegion, RecognizedText};
use crate::taxonomy::ClassId;
use log::debug;
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;

/// Configuration for column detection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnConfig {
    /// Vertical tolerance when re-matching a boundary to a source region,
    /// in pixels (default 10)
    pub y_tolerance: i32,
    /// Minimum horizontal gap that counts as a column break, as a fraction
    /// of the page width (default 0.25)
    pub min_gap_ratio: f64,
}

impl Default for ColumnConfig {
    #[inline]
    fn default() -> Self {
        Self {
            y_tolerance: 10,
            min_gap_ratio: 0.25,
        }
    }
}

/// Output of column detection
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnOutput {
    /// Boundaries with X resolved where a source region matched
    pub boundaries: BTreeMap<QuestionIdentifier, Boundary>,
    /// Column placement per boundary
    pub assignments: BTreeMap<QuestionIdentifier, ColumnAssignment>,
}

/// Column detection stage
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ColumnDetector {
    config: ColumnConfig,
}

impl ColumnDetector {
    #[inline]
    #[must_use = "returns a new ColumnDetector instance"]
    pub fn new() -> Self {
        Self {
            config: ColumnConfig::default(),
        }
    }

    #[inline]
    #[must_use = "returns a new ColumnDetector with custom config"]
    pub const fn with_config(config: ColumnConfig) -> Self {
        Self { config }
    }

    /// Resolve boundary Xs and assign columns
    ///
    /// `regions` must be the full set of non-deprecated detections, not just
    /// unconsumed elements, so boundary sources can be re-matched.
    pub fn process(
        &self,
        boundaries: BTreeMap<QuestionIdentifier, Boundary>,
        regions: &[&DetectedRegion],
        classes: &FxHashMap<u32, ClassId>,
        texts: &FxHashMap<u32, &RecognizedText>,
        page_width: i32,
        diagnostics: &mut RunDiagnostics,
    ) -> ColumnOutput {
        let region_by_id: FxHashMap<u32, &DetectedRegion> =
            regions.iter().map(|r| (r.id, *r)).collect();

        let mut resolved = boundaries;
        for (identifier, boundary) in &mut resolved {
            match self.locate_source_x(identifier, boundary.y, regions, classes, texts, &region_by_id)
            {
                Some(x) => boundary.resolve_x(x),
                None => diagnostics.record_unresolved_boundary(identifier.clone()),
            }
        }

        let assignments = self.assign_columns(&resolved, page_width);
        let resolved_count = resolved.values().filter(|b| b.x_resolved).count();
        let column_count = assignments
            .values()
            .map(|a| a.column)
            .max()
            .map_or(0, |c| c + 1);
        debug!(
            "resolved X for {resolved_count}/{} boundaries, {column_count} column(s)",
            resolved.len()
        );

        ColumnOutput {
            boundaries: resolved,
            assignments,
        }
    }

    /// Find the X of the region a boundary came from
    ///
    /// Number identifiers re-match by canonical extraction of the region text
    /// plus a vertical tolerance, so trailing punctuation variants of the
    /// same number still match. Type headers match by originating region id
    /// alone. Among several matches the smallest vertical distance wins,
    /// ties to the lower region id.
    fn locate_source_x(
        &self,
        identifier: &QuestionIdentifier,
        boundary_y: i32,
        regions: &[&DetectedRegion],
        classes: &FxHashMap<u32, ClassId>,
        texts: &FxHashMap<u32, &RecognizedText>,
        region_by_id: &FxHashMap<u32, &DetectedRegion>,
    ) -> Option<i32> {
        match identifier {
            QuestionIdentifier::TypeHeader {
                source_region_id, ..
            } => region_by_id.get(source_region_id).map(|r| r.bbox.x1),
            QuestionIdentifier::Number(value) => {
                let mut best: Option<(i32, u32, i32)> = None;
                for region in regions {
                    if classes.get(&region.id) != Some(&ClassId::QuestionNumber) {
                        continue;
                    }
                    let distance = (region.bbox.y1 - boundary_y).abs();
                    if distance > self.config.y_tolerance {
                        continue;
                    }
                    let Some(text) = texts.get(&region.id) else {
                        continue;
                    };
                    let Some(matched) = extract_question_number(&text.text) else {
                        continue;
                    };
                    if matched.identifier != *value {
                        continue;
                    }
                    let candidate = (distance, region.id, region.bbox.x1);
                    let closer = match best {
                        None => true,
                        Some((best_distance, best_id, _)) => {
                            (distance, region.id) < (best_distance, best_id)
                        }
                    };
                    if closer {
                        best = Some(candidate);
                    }
                }
                best.map(|(_, _, x)| x)
            }
        }
    }

    /// Split boundaries into at most two columns at the largest X gap
    ///
    /// A gap qualifies only when it spans at least `min_gap_ratio` of the
    /// page width; otherwise the page is a single column. Unresolved
    /// boundaries always land in column 0 with `estimated = true`.
    fn assign_columns(
        &self,
        boundaries: &BTreeMap<QuestionIdentifier, Boundary>,
        page_width: i32,
    ) -> BTreeMap<QuestionIdentifier, ColumnAssignment> {
        let mut resolved: Vec<(i32, &QuestionIdentifier)> = boundaries
            .iter()
            .filter_map(|(identifier, boundary)| boundary.x.map(|x| (x, identifier)))
            .collect();
        resolved.sort_unstable_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(b.1)));

        let split_index = self.find_split(&resolved, page_width);

        let mut assignments = BTreeMap::new();
        for (index, (_, identifier)) in resolved.iter().enumerate() {
            let column = match split_index {
                Some(split) if index > split => 1,
                _ => 0,
            };
            assignments.insert(
                (*identifier).clone(),
                ColumnAssignment {
                    column,
                    estimated: false,
                },
            );
        }
        for (identifier, boundary) in boundaries {
            if boundary.x.is_none() {
                assignments.insert(
                    identifier.clone(),
                    ColumnAssignment {
                        column: 0,
                        estimated: true,
                    },
                );
            }
        }
        assignments
    }

    /// Index of the last left-column entry, or `None` for a single column.
    /// Ties between equal gaps take the leftmost gap.
    fn find_split(&self, sorted_xs: &[(i32, &QuestionIdentifier)], page_width: i32) -> Option<usize> {
        if sorted_xs.len() < 2 {
            return None;
        }
        let mut largest: Option<(i32, usize)> = None;
        for (index, pair) in sorted_xs.windows(2).enumerate() {
            let gap = pair[1].0 - pair[0].0;
            if largest.map_or(true, |(best, _)| gap > best) {
                largest = Some((gap, index));
            }
        }
        let (gap, index) = largest?;
        let threshold = f64::from(page_width.max(0)) * self.config.min_gap_ratio;
        if gap > 0 && f64::from(gap) >= threshold {
            Some(index)
        } else {
            None
        }
    }

    /// Stage name for logging
    #[inline]
    #[must_use = "returns the stage name"]
    pub const fn stage_name() -> &'static str {
        "column_detector"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::types::RegionBox;

    fn create_test_region(id: u32, class_name: &str, x1: i32, y1: i32) -> DetectedRegion {
        DetectedRegion::new(id, class_name, RegionBox::new(x1, y1, x1 + 40, y1 + 30), 0.9)
    }

    fn number_boundary(value: &str, y: i32) -> (QuestionIdentifier, Boundary) {
        let identifier = QuestionIdentifier::Number(value.to_string());
        (identifier.clone(), Boundary::unresolved(identifier, y, 0.9))
    }

    fn run_detector(
        boundaries: BTreeMap<QuestionIdentifier, Boundary>,
        regions: &[DetectedRegion],
        texts: &[RecognizedText],
        page_width: i32,
    ) -> (ColumnOutput, RunDiagnostics) {
        let refs: Vec<&DetectedRegion> = regions.iter().collect();
        let classes: FxHashMap<u32, ClassId> = regions
            .iter()
            .map(|r| (r.id, ClassId::normalize(&r.class_name)))
            .collect();
        let text_map: FxHashMap<u32, &RecognizedText> =
            texts.iter().map(|t| (t.region_id, t)).collect();
        let mut diagnostics = RunDiagnostics::default();
        let output = ColumnDetector::new().process(
            boundaries,
            &refs,
            &classes,
            &text_map,
            page_width,
            &mut diagnostics,
        );
        (output, diagnostics)
    }

    #[test]
    fn test_x_resolves_from_matching_region() {
        let regions = vec![create_test_region(1, "question_number", 120, 500)];
        let texts = vec![RecognizedText::new(1, "3.", 0.9)];
        let (identifier, boundary) = number_boundary("3", 500);
        let boundaries = BTreeMap::from([(identifier.clone(), boundary)]);

        let (output, diagnostics) = run_detector(boundaries, &regions, &texts, 1200);

        let resolved = output.boundaries.get(&identifier).unwrap();
        assert_eq!(resolved.x, Some(120));
        assert!(resolved.x_resolved);
        assert!(diagnostics.unresolved_boundaries.is_empty());
    }

    #[test]
    fn test_punctuation_variant_still_matches() {
        // Boundary extracted from "3." but the rescanned region reads "3、"
        let regions = vec![create_test_region(1, "question_number", 80, 300)];
        let texts = vec![RecognizedText::new(1, "3、", 0.9)];
        let (identifier, boundary) = number_boundary("3", 302);
        let boundaries = BTreeMap::from([(identifier.clone(), boundary)]);

        let (output, _) = run_detector(boundaries, &regions, &texts, 1200);
        assert_eq!(output.boundaries.get(&identifier).unwrap().x, Some(80));
    }

    #[test]
    fn test_header_matches_by_region_id() {
        let regions = vec![create_test_region(7, "question_type", 95, 150)];
        let identifier = QuestionIdentifier::TypeHeader {
            source_region_id: 7,
            sanitized_text: "Multiple_Choice".to_string(),
        };
        let boundaries = BTreeMap::from([(
            identifier.clone(),
            Boundary::unresolved(identifier.clone(), 150, 0.9),
        )]);

        let (output, _) = run_detector(boundaries, &regions, &[], 1200);
        assert_eq!(output.boundaries.get(&identifier).unwrap().x, Some(95));
    }

    #[test]
    fn test_unmatched_boundary_stays_unresolved() {
        let (identifier, boundary) = number_boundary("5", 400);
        let boundaries = BTreeMap::from([(identifier.clone(), boundary)]);

        let (output, diagnostics) = run_detector(boundaries, &[], &[], 1200);

        let unresolved = output.boundaries.get(&identifier).unwrap();
        assert_eq!(unresolved.x, None);
        assert!(!unresolved.x_resolved);
        assert_eq!(diagnostics.unresolved_boundaries, vec![identifier.clone()]);
        assert_eq!(
            output.assignments.get(&identifier),
            Some(&ColumnAssignment {
                column: 0,
                estimated: true,
            })
        );
    }

    #[test]
    fn test_y_tolerance_bounds_the_match() {
        let regions = vec![create_test_region(1, "question_number", 120, 511)];
        let texts = vec![RecognizedText::new(1, "3.", 0.9)];
        let (identifier, boundary) = number_boundary("3", 500);
        let boundaries = BTreeMap::from([(identifier.clone(), boundary)]);

        // 11px off with a 10px tolerance
        let (output, diagnostics) = run_detector(boundaries, &regions, &texts, 1200);
        assert_eq!(output.boundaries.get(&identifier).unwrap().x, None);
        assert_eq!(diagnostics.unresolved_boundaries.len(), 1);
    }

    #[test]
    fn test_closest_vertical_match_wins() {
        let regions = vec![
            create_test_region(2, "question_number", 700, 508),
            create_test_region(1, "question_number", 120, 503),
        ];
        let texts = vec![
            RecognizedText::new(2, "3.", 0.9),
            RecognizedText::new(1, "3.", 0.9),
        ];
        let (identifier, boundary) = number_boundary("3", 500);
        let boundaries = BTreeMap::from([(identifier.clone(), boundary)]);

        let (output, _) = run_detector(boundaries, &regions, &texts, 1200);
        assert_eq!(output.boundaries.get(&identifier).unwrap().x, Some(120));
    }

    #[test]
    fn test_two_columns_split_at_largest_gap() {
        let regions = vec![
            create_test_region(1, "question_number", 100, 100),
            create_test_region(2, "question_number", 120, 600),
            create_test_region(3, "question_number", 900, 120),
        ];
        let texts = vec![
            RecognizedText::new(1, "1.", 0.9),
            RecognizedText::new(2, "2.", 0.9),
            RecognizedText::new(3, "3.", 0.9),
        ];
        let mut boundaries = BTreeMap::new();
        for (value, y) in [("1", 100), ("2", 600), ("3", 120)] {
            let (identifier, boundary) = number_boundary(value, y);
            boundaries.insert(identifier, boundary);
        }

        // Gaps are 20 and 780 against a 300px threshold
        let (output, _) = run_detector(boundaries, &regions, &texts, 1200);

        let column = |value: &str| {
            output
                .assignments
                .get(&QuestionIdentifier::Number(value.to_string()))
                .unwrap()
                .column
        };
        assert_eq!(column("1"), 0);
        assert_eq!(column("2"), 0);
        assert_eq!(column("3"), 1);
        assert!(output.assignments.values().all(|a| !a.estimated));
    }

    #[test]
    fn test_small_gaps_stay_single_column() {
        let regions = vec![
            create_test_region(1, "question_number", 100, 100),
            create_test_region(2, "question_number", 350, 600),
        ];
        let texts = vec![
            RecognizedText::new(1, "1.", 0.9),
            RecognizedText::new(2, "2.", 0.9),
        ];
        let mut boundaries = BTreeMap::new();
        for (value, y) in [("1", 100), ("2", 600)] {
            let (identifier, boundary) = number_boundary(value, y);
            boundaries.insert(identifier, boundary);
        }

        // Gap of 250 is under the 300px threshold
        let (output, _) = run_detector(boundaries, &regions, &texts, 1200);
        assert!(output.assignments.values().all(|a| a.column == 0));
    }

    #[test]
    fn test_empty_input_yields_empty_output() {
        let (output, diagnostics) = run_detector(BTreeMap::new(), &[], &[], 0);
        assert!(output.boundaries.is_empty());
        assert!(output.assignments.is_empty());
        assert!(!diagnostics.has_anomalies());
    }
}
