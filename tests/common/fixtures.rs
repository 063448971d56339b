//! Synthetic worksheet pages for integration tests.
//!
//! Geometry in these fixtures is chosen so every element sits inside the
//! assignment radius of exactly one boundary and column gaps clear the
//! default split threshold. Tests that need degenerate geometry build their
//! own regions inline.

// Each integration test binary compiles this module separately and uses a
// different subset of the helpers.
#![allow(dead_code)]

use worksheet_assembly::{
    Caption, DetectedRegion, QuestionIdentifier, RecognizedText, RegionBox,
};

/// Initialize logging once per test binary; later calls are no-ops
pub fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn make_region(
    id: u32,
    class_name: &str,
    x1: i32,
    y1: i32,
    x2: i32,
    y2: i32,
    confidence: f64,
) -> DetectedRegion {
    DetectedRegion::new(id, class_name, RegionBox::new(x1, y1, x2, y2), confidence)
}

pub fn make_text(region_id: u32, text: &str, confidence: f64) -> RecognizedText {
    RecognizedText::new(region_id, text, confidence)
}

pub fn make_caption(region_id: u32, text: &str) -> Caption {
    Caption::new(region_id, text)
}

pub fn number(value: &str) -> QuestionIdentifier {
    QuestionIdentifier::Number(value.to_string())
}

/// A two-column page with questions 1 and 2 on the left, 3 and 10 on the
/// right, and a captioned figure under question 2.
///
/// Derived page extent is 2100x900; the 1140px gap between the column
/// anchors at x=100 and x=1240 clears the default split threshold of 525px.
pub fn two_column_page() -> (Vec<DetectedRegion>, Vec<RecognizedText>, Vec<Caption>) {
    let detections = vec![
        make_region(1, "question_number", 100, 120, 150, 160, 0.98),
        make_region(2, "text", 170, 118, 950, 165, 0.93),
        make_region(3, "question_number", 100, 420, 150, 460, 0.97),
        make_region(4, "text", 170, 418, 950, 470, 0.92),
        make_region(5, "figure", 200, 480, 700, 900, 0.90),
        make_region(6, "question_number", 1240, 130, 1300, 170, 0.96),
        make_region(7, "text", 1320, 128, 2100, 175, 0.94),
        make_region(8, "question_number", 1240, 520, 1310, 560, 0.95),
        make_region(9, "text", 1320, 518, 2100, 570, 0.93),
    ];
    let texts = vec![
        make_text(1, "1.", 0.96),
        make_text(2, "Solve for x: 2x + 3 = 9.", 0.91),
        make_text(3, "2.", 0.95),
        make_text(4, "Sketch the graph of y = x * x.", 0.92),
        make_text(6, "3.", 0.94),
        make_text(7, "Name the longest river in Asia.", 0.93),
        make_text(8, "10.", 0.93),
        make_text(9, "Translate the sentence into English.", 0.92),
    ];
    let captions = vec![make_caption(5, "parabola opening upward")];
    (detections, texts, captions)
}

/// A single-column page with question 4 and two sub-questions, where the
/// marker "(1)" appears twice: once as a `sub_question_number` region and
/// once misclassified as a `question_number` region.
pub fn sub_question_page() -> (Vec<DetectedRegion>, Vec<RecognizedText>) {
    let detections = vec![
        make_region(1, "question_number", 100, 100, 160, 140, 0.97),
        make_region(2, "sub_question_number", 140, 180, 200, 215, 0.90),
        make_region(3, "question_number", 480, 180, 540, 215, 0.88),
        make_region(4, "text", 210, 178, 460, 220, 0.92),
        make_region(5, "sub_question_number", 140, 320, 200, 355, 0.90),
        make_region(6, "text", 210, 318, 460, 360, 0.91),
    ];
    let texts = vec![
        make_text(1, "4.", 0.95),
        make_text(2, "(1)", 0.88),
        make_text(3, "(1)", 0.86),
        make_text(4, "Compute the sum of the first five terms.", 0.92),
        make_text(5, "（2）", 0.87),
        make_text(6, "State the general term.", 0.91),
    ];
    (detections, texts)
}
