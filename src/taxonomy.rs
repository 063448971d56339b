//! Canonical registry of detectable region classes
//!
//! The external detector emits free-form class strings whose vocabulary is
//! neither canonical nor stable across model versions. Every string entering
//! the pipeline passes through [`ClassId::normalize`], which trims, lowercases,
//! collapses separators, consults a fixed alias table, and only then falls back
//! to an explicit [`ClassId::Unknown`] variant. Unknown classes stay visible
//! downstream; they are never coerced to a known class.

use once_cell::sync::Lazy;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical region class
///
/// Wire format is the canonical snake_case name (serialized through
/// [`ClassId::canonical_name`]); unknown classes round-trip their normalized
/// spelling.
///
/// # Examples
///
/// ```
/// use worksheet_assembly::ClassId;
///
/// assert_eq!(ClassId::normalize("Question  Number"), ClassId::QuestionNumber);
/// assert!(ClassId::QuestionNumber.is_boundary_eligible());
/// assert!(!ClassId::QuestionNumber.is_visual());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ClassId {
    /// Printed number starting a top-level question ("3.", "12、")
    QuestionNumber,
    /// Section header naming a question type ("II. Multiple Choice")
    QuestionType,
    /// Number of a nested sub-item ("(1)", "(2)")
    SubQuestionNumber,
    /// Body text
    Text,
    /// Illustration, diagram, or photo
    Figure,
    /// Tabular region
    Table,
    /// Mathematical formula
    Formula,
    /// Multiple-choice option row
    Choice,
    /// Blank area left for the answer
    AnswerBlank,
    /// Page number furniture
    PageNumber,
    /// Exam seal line margin
    SealLine,
    /// Any class the taxonomy does not recognize, carrying its normalized
    /// spelling
    Unknown(String),
}

/// Alias table: normalized legacy/variant spellings mapped to canonical
/// classes
///
/// Consulted after separator normalization and before the `Unknown` fallback,
/// so a detector upgrade that renames a class needs one entry here and no
/// extraction-logic change.
static CLASS_ALIASES: Lazy<FxHashMap<&'static str, ClassId>> = Lazy::new(|| {
    let mut aliases = FxHashMap::default();
    aliases.insert("question_numbers", ClassId::QuestionNumber);
    aliases.insert("question_no", ClassId::QuestionNumber);
    aliases.insert("question_num", ClassId::QuestionNumber);
    aliases.insert("topic_number", ClassId::QuestionNumber);
    aliases.insert("question_types", ClassId::QuestionType);
    aliases.insert("question_header", ClassId::QuestionType);
    aliases.insert("topic_type", ClassId::QuestionType);
    aliases.insert("subquestion_number", ClassId::SubQuestionNumber);
    aliases.insert("sub_question_no", ClassId::SubQuestionNumber);
    aliases.insert("sub_topic_number", ClassId::SubQuestionNumber);
    aliases.insert("image", ClassId::Figure);
    aliases.insert("picture", ClassId::Figure);
    aliases.insert("tables", ClassId::Table);
    aliases.insert("equation", ClassId::Formula);
    aliases.insert("options", ClassId::Choice);
    aliases.insert("choice", ClassId::Choice);
    aliases.insert("blank", ClassId::AnswerBlank);
    aliases.insert("answer_area", ClassId::AnswerBlank);
    aliases.insert("page_no", ClassId::PageNumber);
    aliases.insert("seal", ClassId::SealLine);
    aliases.insert("sealing_line", ClassId::SealLine);
    aliases
});

impl ClassId {
    /// Normalize a raw detector class string to a canonical class
    ///
    /// Rules, in order: trim and lowercase; collapse whitespace and hyphen
    /// runs to a single underscore; match canonical names; consult the alias
    /// table; fall back to `Unknown` carrying the normalized spelling.
    #[must_use = "returns the canonical class for the raw string"]
    pub fn normalize(raw: &str) -> Self {
        let lowered = raw.to_lowercase();
        let mut normalized = String::with_capacity(lowered.len());
        for part in lowered
            .split(|c: char| c.is_whitespace() || c == '-')
            .filter(|p| !p.is_empty())
        {
            if !normalized.is_empty() {
                normalized.push('_');
            }
            normalized.push_str(part);
        }

        match normalized.as_str() {
            "question_number" => Self::QuestionNumber,
            "question_type" => Self::QuestionType,
            "sub_question_number" => Self::SubQuestionNumber,
            "text" => Self::Text,
            "figure" => Self::Figure,
            "table" => Self::Table,
            "formula" => Self::Formula,
            "option" => Self::Choice,
            "answer_blank" => Self::AnswerBlank,
            "page_number" => Self::PageNumber,
            "seal_line" => Self::SealLine,
            _ => CLASS_ALIASES
                .get(normalized.as_str())
                .cloned()
                .unwrap_or(Self::Unknown(normalized)),
        }
    }

    /// Canonical snake_case name (the wire spelling)
    #[inline]
    #[must_use = "returns the canonical class name"]
    pub fn canonical_name(&self) -> &str {
        match self {
            Self::QuestionNumber => "question_number",
            Self::QuestionType => "question_type",
            Self::SubQuestionNumber => "sub_question_number",
            Self::Text => "text",
            Self::Figure => "figure",
            Self::Table => "table",
            Self::Formula => "formula",
            Self::Choice => "option",
            Self::AnswerBlank => "answer_blank",
            Self::PageNumber => "page_number",
            Self::SealLine => "seal_line",
            Self::Unknown(name) => name,
        }
    }

    /// Check if this class may start a top-level question
    ///
    /// Exactly two classes qualify: the question number and the question-type
    /// header.
    #[inline]
    #[must_use = "returns whether this class may start a top-level question"]
    pub const fn is_boundary_eligible(&self) -> bool {
        matches!(self, Self::QuestionNumber | Self::QuestionType)
    }

    /// Check if this class marks a nested sub-item
    ///
    /// Sub-boundary classes never start a top-level question.
    #[inline]
    #[must_use = "returns whether this class marks a nested sub-item"]
    pub const fn is_sub_boundary(&self) -> bool {
        matches!(self, Self::SubQuestionNumber)
    }

    /// Check if this class is visual (caption-bearing, not text-bearing)
    #[inline]
    #[must_use = "returns whether this class is visual"]
    pub const fn is_visual(&self) -> bool {
        matches!(self, Self::Figure | Self::Table)
    }

    /// Check if the taxonomy recognizes this class
    #[inline]
    #[must_use = "returns whether this class is a known taxonomy entry"]
    pub const fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown(_))
    }

    /// Capability flags as one record
    #[inline]
    #[must_use = "returns the capability flags for this class"]
    pub const fn capabilities(&self) -> ClassCapabilities {
        ClassCapabilities {
            is_visual: self.is_visual(),
            is_boundary_eligible: self.is_boundary_eligible(),
            is_sub_boundary: self.is_sub_boundary(),
        }
    }
}

impl fmt::Display for ClassId {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical_name())
    }
}

impl From<String> for ClassId {
    #[inline]
    fn from(raw: String) -> Self {
        Self::normalize(&raw)
    }
}

impl From<ClassId> for String {
    #[inline]
    fn from(class: ClassId) -> Self {
        class.canonical_name().to_string()
    }
}

/// Capability flags of one region class
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassCapabilities {
    pub is_visual: bool,
    pub is_boundary_eligible: bool,
    pub is_sub_boundary: bool,
}

/// Read-only class registry shared across pipeline runs
///
/// Carries the table-driven deprecated set: deprecated classes are recognized
/// (they normalize like any other) but are excluded from boundary, grouping,
/// and assignment logic, surfacing only in diagnostics. The default set
/// covers page furniture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassTaxonomy {
    deprecated: FxHashSet<ClassId>,
}

impl ClassTaxonomy {
    /// Registry with the default deprecated set (`page_number`, `seal_line`)
    #[must_use = "returns a new ClassTaxonomy instance"]
    pub fn new() -> Self {
        Self::with_deprecated([ClassId::PageNumber, ClassId::SealLine])
    }

    /// Registry with a caller-supplied deprecated set
    #[must_use = "returns a new ClassTaxonomy with the given deprecated classes"]
    pub fn with_deprecated(deprecated: impl IntoIterator<Item = ClassId>) -> Self {
        Self {
            deprecated: deprecated.into_iter().collect(),
        }
    }

    /// Normalize a raw detector class string
    #[inline]
    #[must_use = "returns the canonical class for the raw string"]
    pub fn normalize(&self, raw: &str) -> ClassId {
        ClassId::normalize(raw)
    }

    /// Check if a class is deprecated in this registry
    #[inline]
    #[must_use = "returns whether the class is deprecated"]
    pub fn is_deprecated(&self, class: &ClassId) -> bool {
        self.deprecated.contains(class)
    }
}

impl Default for ClassTaxonomy {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}
