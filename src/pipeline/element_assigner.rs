//! Element assignment: attach non-boundary regions to the nearest question
//!
//! Every surviving element is matched to the closest boundary anchor within
//! an adaptive radius. Resolved boundaries are indexed in an R-tree and
//! measured center-to-anchor; boundaries without a resolved X are compared
//! on vertical distance alone rather than against a guessed X. Elements
//! farther than the radius from every boundary land in the unassigned
//! bucket with a recorded reason.

// Intentional numeric conversions: pixel areas into f64 fractions
#![allow(clippy::cast_precision_loss)]

use crate::pipeline::diagnostics::{RunDiagnostics, SkipReason};
use crate::pipeline::document::{Boundary, ContentElement, QuestionIdentifier};
use crate::pipeline::types::{Caption, DetectedRegion, RecognizedText};
use crate::taxonomy::ClassId;
use log::debug;
use ordered_float::OrderedFloat;
use rstar::{PointDistance, RTree, RTreeObject, AABB};
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;

/// Configuration for element assignment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AssignerConfig {
    /// Assignment radius for ordinary elements, in pixels (default 500.0)
    pub standard_radius: f64,
    /// Assignment radius for large elements, in pixels (default 800.0);
    /// full-width figures and tables sit farther from their question number
    pub large_radius: f64,
    /// Fraction of the page area above which an element counts as large
    /// (default 0.10)
    pub large_area_fraction: f64,
}

impl Default for AssignerConfig {
    #[inline]
    fn default() -> Self {
        Self {
            standard_radius: 500.0,
            large_radius: 800.0,
            large_area_fraction: 0.10,
        }
    }
}

/// Resolved boundary anchor in the spatial index
#[derive(Debug, Clone)]
struct BoundaryAnchor {
    x: f64,
    y: f64,
    identifier: QuestionIdentifier,
}

impl RTreeObject for BoundaryAnchor {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.x, self.y])
    }
}

impl PointDistance for BoundaryAnchor {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.x - point[0];
        let dy = self.y - point[1];
        dx * dx + dy * dy
    }
}

/// Output of element assignment
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssignmentOutput {
    /// Elements per boundary, in input order within each question
    pub assigned: BTreeMap<QuestionIdentifier, Vec<ContentElement>>,
    /// Elements no boundary claimed
    pub unassigned: Vec<ContentElement>,
}

/// Element assignment stage
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ElementAssigner {
    config: AssignerConfig,
}

impl ElementAssigner {
    #[inline]
    #[must_use = "returns a new ElementAssigner instance"]
    pub fn new() -> Self {
        Self {
            config: AssignerConfig::default(),
        }
    }

    #[inline]
    #[must_use = "returns a new ElementAssigner with custom config"]
    pub const fn with_config(config: AssignerConfig) -> Self {
        Self { config }
    }

    /// Assign elements to their nearest boundary within the adaptive radius
    pub fn process(
        &self,
        elements: &[&DetectedRegion],
        boundaries: &BTreeMap<QuestionIdentifier, Boundary>,
        classes: &FxHashMap<u32, ClassId>,
        texts: &FxHashMap<u32, &RecognizedText>,
        captions: &FxHashMap<u32, &Caption>,
        page_area: f64,
        diagnostics: &mut RunDiagnostics,
    ) -> AssignmentOutput {
        let mut anchors = Vec::new();
        let mut unresolved: Vec<(f64, &QuestionIdentifier)> = Vec::new();
        for (identifier, boundary) in boundaries {
            match boundary.x {
                Some(x) => anchors.push(BoundaryAnchor {
                    x: f64::from(x),
                    y: f64::from(boundary.y),
                    identifier: identifier.clone(),
                }),
                None => unresolved.push((f64::from(boundary.y), identifier)),
            }
        }
        let tree = RTree::bulk_load(anchors);

        let mut output = AssignmentOutput::default();
        for region in elements {
            let Some(class) = classes.get(&region.id) else {
                continue;
            };
            let element = ContentElement {
                region_id: region.id,
                class: class.clone(),
                bbox: region.bbox,
                text: element_text(class, region.id, texts, captions),
            };

            let center = region.bbox.center();
            let Some((distance, identifier)) = nearest_boundary(center, &tree, &unresolved)
            else {
                diagnostics.record_skip(
                    region.id,
                    class.clone(),
                    SkipReason::NoBoundaryAvailable,
                );
                output.unassigned.push(element);
                continue;
            };

            let radius = self.radius_for(region.bbox.area(), page_area);
            if distance <= radius {
                output
                    .assigned
                    .entry(identifier.clone())
                    .or_default()
                    .push(element);
            } else {
                diagnostics.record_skip(
                    region.id,
                    class.clone(),
                    SkipReason::OutsideAssignmentRadius {
                        nearest: identifier.clone(),
                        distance,
                    },
                );
                output.unassigned.push(element);
            }
        }

        debug!(
            "assigned {} elements across {} questions, {} unassigned",
            output.assigned.values().map(Vec::len).sum::<usize>(),
            output.assigned.len(),
            output.unassigned.len()
        );
        output
    }

    /// Radius for an element of the given area
    #[must_use = "returns the assignment radius"]
    fn radius_for(&self, element_area: i64, page_area: f64) -> f64 {
        if page_area > 0.0 && element_area as f64 / page_area > self.config.large_area_fraction {
            self.config.large_radius
        } else {
            self.config.standard_radius
        }
    }

    /// Stage name for logging
    #[inline]
    #[must_use = "returns the stage name"]
    pub const fn stage_name() -> &'static str {
        "element_assigner"
    }
}

/// Closest boundary to a point, with equidistant ties going to the smaller
/// identifier so assignment never depends on index internals
fn nearest_boundary<'a>(
    center: (f64, f64),
    tree: &'a RTree<BoundaryAnchor>,
    unresolved: &[(f64, &'a QuestionIdentifier)],
) -> Option<(f64, &'a QuestionIdentifier)> {
    let mut best: Option<(f64, &'a QuestionIdentifier)> = None;

    let mut neighbors = tree.nearest_neighbor_iter_with_distance_2(&[center.0, center.1]);
    if let Some((first, first_distance_2)) = neighbors.next() {
        let mut tie_winner = &first.identifier;
        for (anchor, distance_2) in neighbors {
            if distance_2 > first_distance_2 {
                break;
            }
            if anchor.identifier < *tie_winner {
                tie_winner = &anchor.identifier;
            }
        }
        best = Some((first_distance_2.sqrt(), tie_winner));
    }

    for (y, identifier) in unresolved {
        // No resolved X, so only the vertical offset is comparable
        let distance = (center.1 - y).abs();
        let better = match best {
            None => true,
            Some((best_distance, best_identifier)) => {
                (OrderedFloat(distance), *identifier)
                    < (OrderedFloat(best_distance), best_identifier)
            }
        };
        if better {
            best = Some((distance, identifier));
        }
    }

    best
}

/// Element text: recognized text first, else the caption for visual classes
fn element_text(
    class: &ClassId,
    region_id: u32,
    texts: &FxHashMap<u32, &RecognizedText>,
    captions: &FxHashMap<u32, &Caption>,
) -> Option<String> {
    if let Some(text) = texts.get(&region_id) {
        return Some(text.text.clone());
    }
    if class.is_visual() {
        if let Some(caption) = captions.get(&region_id) {
            return Some(caption.text.clone());
        }
    }
    None
}
