//! Violations: one failed structural or SEO rule.

use serde::{Deserialize, Serialize};

/// Stable identifier for each validation rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuleId {
    /// No structured payload could be located in the raw output
    Unparseable,
    /// Required field absent
    MissingField,
    /// Field present with the wrong JSON type
    WrongType,
    /// Title length out of bounds
    TitleLength,
    /// Meta description length out of bounds
    MetaLength,
    /// Heading too long
    HeadingLength,
    /// Slug not lowercase-hyphenated or too long
    SlugFormat,
    /// Body word count outside the configured interval
    BodyWordCount,
    /// Too few keywords
    KeywordCount,
    /// Duplicate keywords
    KeywordDuplicate,
    /// Mandatory structured-data key missing or malformed
    JsonldKey,
    /// Structured data lacks any contact or geo field
    JsonldContact,
    /// Internal link count outside the configured interval
    LinkCount,
    /// Duplicate internal links
    LinkDuplicate,
    /// Internal link references the subject's own page
    LinkSelf,
}

impl RuleId {
    /// Stable kebab-case identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleId::Unparseable => "unparseable",
            RuleId::MissingField => "missing-field",
            RuleId::WrongType => "wrong-type",
            RuleId::TitleLength => "title-length",
            RuleId::MetaLength => "meta-length",
            RuleId::HeadingLength => "heading-length",
            RuleId::SlugFormat => "slug-format",
            RuleId::BodyWordCount => "body-word-count",
            RuleId::KeywordCount => "keyword-count",
            RuleId::KeywordDuplicate => "keyword-duplicate",
            RuleId::JsonldKey => "jsonld-key",
            RuleId::JsonldContact => "jsonld-contact",
            RuleId::LinkCount => "link-count",
            RuleId::LinkDuplicate => "link-duplicate",
            RuleId::LinkSelf => "link-self",
        }
    }
}

impl std::fmt::Display for RuleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One failed check: which field, which rule, and an actionable message.
///
/// Messages are interpolated verbatim into repair prompts, so each must be
/// self-contained: state the measured value and the required bound.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Field the rule applies to (e.g. "body", "jsonld.address").
    pub field: String,

    /// Stable rule identifier.
    pub rule: RuleId,

    /// Human-readable, actionable message.
    pub message: String,
}

impl Violation {
    /// Create a new violation.
    pub fn new(rule: RuleId, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            rule,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.rule, self.field, self.message)
    }
}
