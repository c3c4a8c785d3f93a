//! Core domain types for the content generation and repair engine.

mod attempt;
mod business;
mod spec;
mod violation;

pub use attempt::{AttemptRecord, FailureReason, LoopResult};
pub use business::{BusinessRecord, related_records};
pub use spec::ContentSpec;
pub use violation::{RuleId, Violation};
