//! Execution trace recording.
//!
//! Every loop invocation hands its finalized result to a recorder exactly
//! once, on terminal transition. The recorded artifact reconstructs every
//! prompt sent and every violation found, in order, for post-hoc audit of
//! why a record was accepted or rejected.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::LoopResult;
use crate::error::{PagewrightError, Result};

/// The audit artifact for one loop invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionTrace {
    /// Business record identifier this invocation ran for.
    pub business_id: String,

    /// Invocation timestamp.
    pub recorded_at: DateTime<Utc>,

    /// The terminal result with its full ordered attempt sequence.
    pub result: LoopResult,
}

impl ExecutionTrace {
    pub fn new(business_id: impl Into<String>, result: &LoopResult) -> Self {
        Self {
            business_id: business_id.into(),
            recorded_at: Utc::now(),
            result: result.clone(),
        }
    }
}

/// Sink for finalized traces. Append-only; called once per invocation.
pub trait TraceRecorder: Send + Sync {
    fn record(&self, trace: &ExecutionTrace) -> Result<()>;
}

/// Appends one JSON line per invocation to traces.jsonl under a base
/// directory.
pub struct JsonlTraceRecorder {
    path: PathBuf,
}

impl JsonlTraceRecorder {
    /// Create a recorder writing under the given directory.
    pub fn new(base_path: impl AsRef<Path>) -> Result<Self> {
        let base_path = base_path.as_ref().to_path_buf();
        fs::create_dir_all(&base_path)?;
        Ok(Self {
            path: base_path.join("traces.jsonl"),
        })
    }

    /// Path of the backing JSONL file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TraceRecorder for JsonlTraceRecorder {
    fn record(&self, trace: &ExecutionTrace) -> Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        writeln!(file, "{}", serde_json::to_string(trace)?)?;
        Ok(())
    }
}

/// In-memory recorder for tests.
#[derive(Default)]
pub struct MemoryTraceRecorder {
    traces: Mutex<Vec<ExecutionTrace>>,
}

impl MemoryTraceRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded traces, in record order.
    pub fn traces(&self) -> Vec<ExecutionTrace> {
        self.traces.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.traces.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TraceRecorder for MemoryTraceRecorder {
    fn record(&self, trace: &ExecutionTrace) -> Result<()> {
        self.traces
            .lock()
            .map_err(|e| PagewrightError::Storage(e.to_string()))?
            .push(trace.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AttemptRecord, FailureReason, RuleId, Violation};
    use tempfile::TempDir;

    fn failed_result() -> LoopResult {
        LoopResult::Failed {
            reason: FailureReason::MaxRoundsExceeded,
            violations: vec![Violation::new(
                RuleId::MetaLength,
                "meta_description",
                "meta description is 200 characters, required between 50 and 160",
            )],
            attempts: vec![AttemptRecord::new(
                0,
                "the prompt".to_string(),
                "the raw output".to_string(),
                None,
                vec![],
            )],
        }
    }

    #[test]
    fn test_jsonl_recorder_appends_lines() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let recorder = JsonlTraceRecorder::new(temp_dir.path())?;

        recorder.record(&ExecutionTrace::new("b1", &failed_result()))?;
        recorder.record(&ExecutionTrace::new("b2", &failed_result()))?;

        let content = std::fs::read_to_string(recorder.path())?;
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: ExecutionTrace = serde_json::from_str(lines[0])?;
        assert_eq!(first.business_id, "b1");
        assert_eq!(first.result.attempts().len(), 1);
        assert_eq!(first.result.attempts()[0].prompt, "the prompt");

        let second: ExecutionTrace = serde_json::from_str(lines[1])?;
        assert_eq!(second.business_id, "b2");

        Ok(())
    }

    #[test]
    fn test_jsonl_recorder_creates_base_directory() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let nested = temp_dir.path().join("a").join("b");
        let recorder = JsonlTraceRecorder::new(&nested)?;

        recorder.record(&ExecutionTrace::new("b1", &failed_result()))?;
        assert!(recorder.path().exists());

        Ok(())
    }

    #[test]
    fn test_trace_preserves_violation_detail() -> Result<()> {
        let trace = ExecutionTrace::new("b1", &failed_result());
        let json = serde_json::to_string(&trace)?;
        let restored: ExecutionTrace = serde_json::from_str(&json)?;

        match &restored.result {
            LoopResult::Failed { reason, violations, .. } => {
                assert_eq!(*reason, FailureReason::MaxRoundsExceeded);
                assert_eq!(violations[0].rule, RuleId::MetaLength);
                assert!(violations[0].message.contains("200 characters"));
            }
            LoopResult::Accepted { .. } => panic!("expected failed result"),
        }

        Ok(())
    }

    #[test]
    fn test_memory_recorder() {
        let recorder = MemoryTraceRecorder::new();
        assert!(recorder.is_empty());

        recorder.record(&ExecutionTrace::new("b1", &failed_result())).unwrap();
        recorder.record(&ExecutionTrace::new("b2", &failed_result())).unwrap();

        let traces = recorder.traces();
        assert_eq!(traces.len(), 2);
        assert_eq!(traces[0].business_id, "b1");
        assert_eq!(traces[1].business_id, "b2");
    }
}
