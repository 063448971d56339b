//! Pattern matching over recognized text
//!
//! Pure helpers shared by the identifier extractor (top-level question
//! numbers), the column detector (text-based X re-matching), and the
//! sub-question grouper (nested item detection). All functions are
//! deterministic and allocation-light; the regexes are compiled once.

use regex::Regex;
use std::sync::LazyLock;

/// Pre-compiled regex for leading question numbers
///
/// Matches an anchored digit run with optional trailing punctuation, ASCII or
/// full-width: "3.", "12、", "7．", "5:", "9". Length capping happens in code
/// (the regex itself is greedy) so "1234" is rejected as a whole rather than
/// truncated to "123".
static QUESTION_NUMBER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+)\s*[.．。、，,:：]?\s*").expect("valid question number regex")
});

/// Pre-compiled regex for sub-question markers
///
/// Matches parenthesized/bracketed integers with the opening bracket optional
/// and the closing one required, ASCII or full-width: "(1)", "2)", "（3）",
/// "【4】", "[5]". Size capping (small integers only) happens in code.
static SUB_QUESTION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[(（\[【]?\s*(\d+)\s*[)）\]】]").expect("valid sub-question regex")
});

/// Pre-compiled regex for the trailing digit run of a text
///
/// Captures the last digit run, ignoring any non-digit tail: "(1)" → "1",
/// "第2题" → "2", "12" → "12".
static TRAILING_DIGITS_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\D*$").expect("valid trailing digits regex"));

/// Most digits a top-level question number may carry
const MAX_QUESTION_NUMBER_DIGITS: usize = 3;

/// Most digits a sub-question marker may carry
const MAX_SUB_QUESTION_DIGITS: usize = 2;

/// A question number extracted from region text
#[derive(Debug, Clone, PartialEq)]
pub struct NumberMatch {
    /// Canonical identifier (leading zeros stripped)
    pub identifier: String,
    /// Fraction of the trimmed text consumed by the match, in `[0, 1]`
    pub pattern_score: f64,
}

/// Strip leading zeros from a digit string, keeping a lone zero
fn canonical_digits(digits: &str) -> String {
    let stripped = digits.trim_start_matches('0');
    if stripped.is_empty() {
        "0".to_string()
    } else {
        stripped.to_string()
    }
}

/// Extract a top-level question number from recognized text
///
/// Returns `None` when the text does not start with a plausible question
/// number. The pattern score is the fraction of the trimmed text the match
/// consumed: a region containing only "3." scores 1.0, "3. Solve for x"
/// scores well below it.
#[must_use = "returns the extracted question number, if any"]
pub fn extract_question_number(text: &str) -> Option<NumberMatch> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    let captures = QUESTION_NUMBER_REGEX.captures(trimmed)?;
    let digits = captures.get(1)?.as_str();
    if digits.len() > MAX_QUESTION_NUMBER_DIGITS {
        return None;
    }

    let consumed = captures.get(0)?.as_str().len();
    Some(NumberMatch {
        identifier: canonical_digits(digits),
        pattern_score: consumed as f64 / trimmed.len() as f64,
    })
}

/// Extract a sub-question marker from recognized text
///
/// Accepts parenthesized/bracketed small integers at the start of the text,
/// with the opening bracket optional: "(1)", "2)", "（3）", "【4】". Returns
/// the canonical digits.
#[must_use = "returns the extracted sub-question number, if any"]
pub fn extract_sub_question_marker(text: &str) -> Option<String> {
    let trimmed = text.trim();
    let captures = SUB_QUESTION_REGEX.captures(trimmed)?;
    let digits = captures.get(1)?.as_str();
    if digits.len() > MAX_SUB_QUESTION_DIGITS {
        return None;
    }
    Some(canonical_digits(digits))
}

/// Check if recognized text is a sub-question marker
///
/// Used by the identifier extractor to keep misclassified sub-question
/// numbers out of the top-level boundary set.
#[inline]
#[must_use = "returns whether the text is a sub-question marker"]
pub fn matches_sub_question(text: &str) -> bool {
    extract_sub_question_marker(text).is_some()
}

/// Extract the trailing digit run of a text
///
/// Any non-empty digit run qualifies; non-digit suffixes (closing brackets,
/// unit words) are ignored: "(1)" → "1", "第12题" → "12".
#[must_use = "returns the trailing digit run, if any"]
pub fn extract_trailing_digits(text: &str) -> Option<String> {
    let captures = TRAILING_DIGITS_REGEX.captures(text.trim())?;
    Some(canonical_digits(captures.get(1)?.as_str()))
}

/// Sanitize question-type header text into an identifier fragment
///
/// Whitespace runs become single underscores, every other non-alphanumeric
/// character is stripped, and consecutive underscores collapse. Returns
/// `None` when nothing survives: a header identifier must keep at least one
/// character.
#[must_use = "returns the sanitized header text, if any survives"]
pub fn sanitize_header_text(text: &str) -> Option<String> {
    let mut sanitized = String::with_capacity(text.len());
    let mut last_was_underscore = true; // suppress a leading underscore
    for c in text.chars() {
        if c.is_alphanumeric() {
            sanitized.push(c);
            last_was_underscore = false;
        } else if (c.is_whitespace() || c == '_') && !last_was_underscore {
            sanitized.push('_');
            last_was_underscore = true;
        }
    }
    while sanitized.ends_with('_') {
        sanitized.pop();
    }

    if sanitized.is_empty() {
        None
    } else {
        Some(sanitized)
    }
}

/// Compare two digit strings numerically without parsing
///
/// Leading zeros are insignificant; longer (zero-trimmed) runs are larger;
/// equal lengths compare lexicographically. Total order over digit strings of
/// any length.
#[must_use = "returns the numeric ordering of the two digit strings"]
pub fn compare_digit_strings(a: &str, b: &str) -> std::cmp::Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::cmp::Ordering;

    #[rstest]
    #[case("3.", "3")]
    #[case("12、", "12")]
    #[case("7．", "7")]
    #[case("5:", "5")]
    #[case("9", "9")]
    #[case("03.", "3")]
    #[case(" 42． ", "42")]
    fn test_question_number_accepts(#[case] text: &str, #[case] expected: &str) {
        let matched = extract_question_number(text).unwrap();
        assert_eq!(matched.identifier, expected);
        assert!((matched.pattern_score - 1.0).abs() < 1e-9);
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("abc")]
    #[case("(1)")]
    #[case("（3）")]
    #[case("1234.")] // too many digits: rejected whole, never truncated
    #[case("第3题")] // digits not leading
    fn test_question_number_rejects(#[case] text: &str) {
        assert!(extract_question_number(text).is_none());
    }

    #[test]
    fn test_question_number_partial_consumption_scores_low() {
        let matched = extract_question_number("3. Solve for x").unwrap();
        assert_eq!(matched.identifier, "3");
        assert!(matched.pattern_score < 0.5);
        assert!(matched.pattern_score > 0.0);
    }

    #[rstest]
    #[case("(1)", "1")]
    #[case("2)", "2")]
    #[case("（3）", "3")]
    #[case("【4】", "4")]
    #[case("[5]", "5")]
    #[case("(08)", "8")]
    #[case("（12）小题", "12")]
    fn test_sub_question_accepts(#[case] text: &str, #[case] expected: &str) {
        assert_eq!(extract_sub_question_marker(text).as_deref(), Some(expected));
    }

    #[rstest]
    #[case("3.")]
    #[case("12、")]
    #[case("(123)")] // not a small integer
    #[case("(a)")]
    #[case("()")]
    #[case("")]
    fn test_sub_question_rejects(#[case] text: &str) {
        assert!(extract_sub_question_marker(text).is_none());
        assert!(!matches_sub_question(text));
    }

    #[rstest]
    #[case("(1)", Some("1"))]
    #[case("第2题", Some("2"))]
    #[case("12", Some("12"))]
    #[case("1a2b3", Some("3"))]
    #[case("007)", Some("7"))]
    #[case("no digits", None)]
    #[case("", None)]
    fn test_trailing_digits(#[case] text: &str, #[case] expected: Option<&str>) {
        assert_eq!(extract_trailing_digits(text).as_deref(), expected);
    }

    #[rstest]
    #[case("II. Multiple Choice", Some("II_Multiple_Choice"))]
    #[case("  Fill in the blanks  ", Some("Fill_in_the_blanks"))]
    #[case("选择题", Some("选择题"))]
    #[case("a--b", Some("ab"))]
    #[case("***", None)]
    #[case("", None)]
    #[case(" 、。 ", None)]
    fn test_sanitize_header_text(#[case] text: &str, #[case] expected: Option<&str>) {
        assert_eq!(sanitize_header_text(text).as_deref(), expected);
    }

    #[test]
    fn test_compare_digit_strings_is_numeric() {
        assert_eq!(compare_digit_strings("2", "10"), Ordering::Less);
        assert_eq!(compare_digit_strings("10", "2"), Ordering::Greater);
        assert_eq!(compare_digit_strings("3", "3"), Ordering::Equal);
        assert_eq!(compare_digit_strings("03", "3"), Ordering::Equal);
        assert_eq!(compare_digit_strings("9", "11"), Ordering::Less);
    }
}
