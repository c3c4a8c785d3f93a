//! Attempt records and terminal loop outcomes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ContentSpec, Violation};

/// One generate -> validate round, immutable once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptRecord {
    /// Round index, contiguous from 0.
    pub round: u32,

    /// The exact prompt sent to the generation capability.
    pub prompt: String,

    /// The raw model output, verbatim.
    pub raw_output: String,

    /// The parsed candidate, None when parsing failed.
    pub spec: Option<ContentSpec>,

    /// Violations found this round, empty on acceptance.
    pub violations: Vec<Violation>,

    /// When the round completed.
    pub timestamp: DateTime<Utc>,
}

impl AttemptRecord {
    pub fn new(
        round: u32,
        prompt: String,
        raw_output: String,
        spec: Option<ContentSpec>,
        violations: Vec<Violation>,
    ) -> Self {
        Self {
            round,
            prompt,
            raw_output,
            spec,
            violations,
            timestamp: Utc::now(),
        }
    }
}

/// Why an invocation terminated without an accepted spec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureReason {
    /// Every content round produced violations
    MaxRoundsExceeded,
    /// The generation capability exhausted the transport-fault budget
    GenerationUnavailable,
    /// The caller cancelled the invocation
    Cancelled,
}

impl FailureReason {
    /// Stable reason code.
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureReason::MaxRoundsExceeded => "MAX_ROUNDS_EXCEEDED",
            FailureReason::GenerationUnavailable => "GENERATION_UNAVAILABLE",
            FailureReason::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Terminal outcome of one loop invocation.
///
/// Owns the full ordered attempt sequence; attempts are never shared across
/// concurrent invocations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum LoopResult {
    /// Validation passed: the spec satisfies every structural and SEO rule.
    Accepted {
        spec: ContentSpec,
        attempts: Vec<AttemptRecord>,
    },
    /// Terminal failure; the last violation set is retained for reporting.
    Failed {
        reason: FailureReason,
        violations: Vec<Violation>,
        attempts: Vec<AttemptRecord>,
    },
}

impl LoopResult {
    pub fn is_accepted(&self) -> bool {
        matches!(self, LoopResult::Accepted { .. })
    }

    /// The ordered attempt sequence, whatever the outcome.
    pub fn attempts(&self) -> &[AttemptRecord] {
        match self {
            LoopResult::Accepted { attempts, .. } => attempts,
            LoopResult::Failed { attempts, .. } => attempts,
        }
    }
}
