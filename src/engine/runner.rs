//! Repair loop controller - executes the generate/validate/repair rounds.
//!
//! One invocation per business record, strictly sequential rounds:
//!
//! ```text
//! START -> GENERATING -> VALIDATING -> ACCEPTED
//!              ^                    \-> REPAIRING -> GENERATING
//!              |                    \-> FAILED
//!              \- transport faults retry on a separate budget
//! ```
//!
//! Content violations and transport faults are tracked on separate budgets:
//! a flaky capability call must not consume the limited retries meant for
//! steering content quality, and a systematically unavailable capability
//! must not masquerade as a content-quality failure.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::EngineConfig;
use crate::domain::{AttemptRecord, BusinessRecord, FailureReason, LoopResult, Violation};
use crate::error::Result;
use crate::llm::{GenerationRequest, TextGenerator, TransportFault};
use crate::prompt::{PromptBuilder, SYSTEM_PROMPT};
use crate::trace::{ExecutionTrace, TraceRecorder};
use crate::validate::{ParseOutcome, SeoValidator, parse_content_spec};

/// Caller-controlled cancellation, honored at generation boundaries
/// (before or after an in-flight call, never mid-parse).
#[async_trait]
pub trait CancelSignal: Send + Sync {
    async fn is_cancelled(&self) -> bool;
}

/// Signal that never cancels.
pub struct NeverCancelled;

#[async_trait]
impl CancelSignal for NeverCancelled {
    async fn is_cancelled(&self) -> bool {
        false
    }
}

/// Executes the repair loop for one business record at a time.
///
/// Invocations for different records are independent and may run
/// concurrently; each owns its attempt sequence exclusively.
pub struct RepairEngine<G, R>
where
    G: TextGenerator,
    R: TraceRecorder,
{
    generator: Arc<G>,
    recorder: Arc<R>,
    config: EngineConfig,
    seo: SeoValidator,
}

impl<G, R> RepairEngine<G, R>
where
    G: TextGenerator,
    R: TraceRecorder,
{
    /// Create a new engine. Fails fast on invalid configuration, before any
    /// generation call can happen.
    pub fn new(config: EngineConfig, generator: Arc<G>, recorder: Arc<R>) -> Result<Self> {
        config.validate()?;
        let seo = SeoValidator::new(&config.seo);
        Ok(Self {
            generator,
            recorder,
            config,
            seo,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run the loop to a terminal result.
    ///
    /// `link_candidates` are slugs of related pages offered to the model for
    /// internal linking. Content and transport failures resolve into the
    /// returned LoopResult, never into an error.
    pub async fn run(&self, record: &BusinessRecord, link_candidates: Vec<String>) -> LoopResult {
        self.run_with_signal(record, link_candidates, &NeverCancelled).await
    }

    /// Run the loop with a cancellation signal.
    pub async fn run_with_signal<S: CancelSignal>(
        &self,
        record: &BusinessRecord,
        link_candidates: Vec<String>,
        signal: &S,
    ) -> LoopResult {
        let result = self.execute(record, link_candidates, signal).await;

        match &result {
            LoopResult::Accepted { attempts, .. } => {
                tracing::info!(
                    business_id = %record.business_id,
                    rounds = attempts.len(),
                    "content accepted"
                );
            }
            LoopResult::Failed { reason, attempts, .. } => {
                tracing::warn!(
                    business_id = %record.business_id,
                    reason = %reason,
                    rounds = attempts.len(),
                    "content generation failed"
                );
            }
        }

        // Terminal transition: hand the finalized trace to the recorder
        // exactly once. A trace sink problem must not turn a computed
        // outcome into a hard failure.
        let trace = ExecutionTrace::new(&record.business_id, &result);
        if let Err(e) = self.recorder.record(&trace) {
            tracing::warn!(business_id = %record.business_id, error = %e, "failed to record trace");
        }

        result
    }

    async fn execute<S: CancelSignal>(
        &self,
        record: &BusinessRecord,
        link_candidates: Vec<String>,
        signal: &S,
    ) -> LoopResult {
        let builder = PromptBuilder::new(&self.config.seo).with_link_candidates(link_candidates);
        let subject_slug = record.slug();
        let timeout = Duration::from_millis(self.config.timeout_ms);

        let mut attempts: Vec<AttemptRecord> = Vec::new();
        let mut prior: Option<AttemptRecord> = None;
        let mut violations: Vec<Violation> = Vec::new();
        let mut faults: u32 = 0;

        for round in 0..self.config.max_rounds {
            if signal.is_cancelled().await {
                return failed(FailureReason::Cancelled, violations, attempts);
            }

            let prompt = builder.build(record, prior.as_ref(), &violations);

            // GENERATING: transport faults retry on their own budget and do
            // not consume this content round.
            let raw = loop {
                let request = GenerationRequest {
                    system: SYSTEM_PROMPT.to_string(),
                    prompt: prompt.clone(),
                    max_tokens: self.config.llm.max_tokens,
                };

                let fault = match tokio::time::timeout(timeout, self.generator.generate(request)).await
                {
                    Ok(Ok(response)) => break response.text,
                    Ok(Err(fault)) => fault,
                    Err(_) => TransportFault::Timeout { timeout },
                };

                faults += 1;
                tracing::warn!(
                    business_id = %record.business_id,
                    round,
                    faults,
                    fault = %fault,
                    "transport fault"
                );

                if faults > self.config.fault_budget {
                    return failed(FailureReason::GenerationUnavailable, violations, attempts);
                }
                if signal.is_cancelled().await {
                    return failed(FailureReason::Cancelled, violations, attempts);
                }
            };

            if signal.is_cancelled().await {
                return failed(FailureReason::Cancelled, violations, attempts);
            }

            // VALIDATING: schema first; SEO rules never run on invalid
            // structures.
            let (spec, round_violations) = match parse_content_spec(&raw) {
                ParseOutcome::Parsed(spec) => {
                    let found = self.seo.validate(&spec, &subject_slug);
                    (Some(spec), found)
                }
                ParseOutcome::Invalid(found) => (None, found),
            };

            tracing::debug!(
                business_id = %record.business_id,
                round,
                violations = round_violations.len(),
                "round validated"
            );

            let attempt = AttemptRecord::new(round, prompt, raw, spec.clone(), round_violations.clone());
            attempts.push(attempt.clone());

            if round_violations.is_empty() {
                // Parsed is guaranteed when no violations were found.
                return LoopResult::Accepted {
                    spec: spec.expect("accepted round has a parsed spec"),
                    attempts,
                };
            }

            violations = round_violations;
            prior = Some(attempt);
        }

        failed(FailureReason::MaxRoundsExceeded, violations, attempts)
    }
}

fn failed(
    reason: FailureReason,
    violations: Vec<Violation>,
    attempts: Vec<AttemptRecord>,
) -> LoopResult {
    LoopResult::Failed {
        reason,
        violations,
        attempts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SeoThresholds;
    use crate::domain::RuleId;
    use crate::llm::{MockGenerator, MockReply};
    use crate::trace::MemoryTraceRecorder;
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct FlagSignal(AtomicBool);

    #[async_trait]
    impl CancelSignal for FlagSignal {
        async fn is_cancelled(&self) -> bool {
            self.0.load(Ordering::SeqCst)
        }
    }

    fn record() -> BusinessRecord {
        BusinessRecord {
            business_id: "b1".to_string(),
            name: "Joe's Pizza".to_string(),
            category: "Restaurant".to_string(),
            address: "123 Main St".to_string(),
            city: "San Francisco".to_string(),
            state: "CA".to_string(),
            zip_code: "94103".to_string(),
            phone: Some("415-555-0100".to_string()),
            website: None,
            email: None,
            description: None,
            rating: Some(4.5),
            review_count: Some(210),
        }
    }

    fn payload(body_words: usize, meta_len: usize) -> String {
        json!({
            "title": "Joe's Pizza - Top Rated Restaurant in San Francisco",
            "meta_description": "m".repeat(meta_len),
            "heading": "Joe's Pizza: A San Francisco Favorite",
            "slug": "joe-s-pizza-sf",
            "body": "word ".repeat(body_words).trim_end(),
            "keywords": ["pizza", "restaurant", "san francisco"],
            "jsonld": {
                "@type": "LocalBusiness",
                "name": "Joe's Pizza",
                "address": {"addressLocality": "San Francisco"},
                "telephone": "415-555-0100"
            },
            "internal_links": ["a-slug", "b-slug", "c-slug"]
        })
        .to_string()
    }

    fn compliant() -> String {
        payload(900, 80)
    }

    fn engine(
        replies: Vec<MockReply>,
        config: EngineConfig,
    ) -> (
        RepairEngine<MockGenerator, MemoryTraceRecorder>,
        Arc<MockGenerator>,
        Arc<MemoryTraceRecorder>,
    ) {
        let generator = Arc::new(MockGenerator::new(replies));
        let recorder = Arc::new(MemoryTraceRecorder::new());
        let engine = RepairEngine::new(config, generator.clone(), recorder.clone()).unwrap();
        (engine, generator, recorder)
    }

    #[test]
    fn test_invalid_config_fails_fast() {
        let config = EngineConfig {
            max_rounds: 0,
            ..Default::default()
        };
        let generator = Arc::new(MockGenerator::new(vec![]));
        let recorder = Arc::new(MemoryTraceRecorder::new());
        let result = RepairEngine::new(config, generator, recorder);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_accepted_on_first_round() {
        let (engine, generator, recorder) =
            engine(vec![MockReply::Text(compliant())], EngineConfig::default());

        let result = engine.run(&record(), vec![]).await;

        match &result {
            LoopResult::Accepted { spec, attempts } => {
                assert_eq!(attempts.len(), 1);
                assert_eq!(attempts[0].round, 0);
                assert!(attempts[0].violations.is_empty());
                assert_eq!(spec.heading, "Joe's Pizza: A San Francisco Favorite");
            }
            LoopResult::Failed { violations, .. } => {
                panic!("expected acceptance, got {:?}", violations)
            }
        }

        assert_eq!(generator.call_count(), 1);
        assert_eq!(recorder.len(), 1);
        assert_eq!(recorder.traces()[0].business_id, "b1");
    }

    #[tokio::test]
    async fn test_acceptance_implies_compliance() {
        let (engine, _, _) = engine(vec![MockReply::Text(compliant())], EngineConfig::default());

        let result = engine.run(&record(), vec![]).await;
        let LoopResult::Accepted { spec, .. } = result else {
            panic!("expected acceptance");
        };

        // Re-running the validators on the returned spec finds nothing.
        let validator = SeoValidator::new(&SeoThresholds::default());
        assert!(validator.validate(&spec, &record().slug()).is_empty());
    }

    #[tokio::test]
    async fn test_repair_round_fixes_short_body() {
        // Round 0: 500-word body. Round 1: compliant replacement.
        let (engine, generator, _) = engine(
            vec![
                MockReply::Text(payload(500, 80)),
                MockReply::Text(compliant()),
            ],
            EngineConfig::default(),
        );

        let result = engine.run(&record(), vec![]).await;

        match &result {
            LoopResult::Accepted { attempts, .. } => {
                assert_eq!(attempts.len(), 2);
                assert_eq!(attempts[0].round, 0);
                assert_eq!(attempts[1].round, 1);
                assert_eq!(attempts[0].violations.len(), 1);
                assert_eq!(attempts[0].violations[0].rule, RuleId::BodyWordCount);
                assert!(attempts[1].violations.is_empty());
            }
            LoopResult::Failed { .. } => panic!("expected acceptance after repair"),
        }

        // The second prompt embeds the prior output and the violation.
        let requests = generator.requests();
        assert_eq!(requests.len(), 2);
        assert!(requests[1].prompt.contains("PROBLEMS FOUND"));
        assert!(requests[1].prompt.contains("body has 500 words, minimum is 800"));
    }

    #[tokio::test]
    async fn test_max_rounds_exceeded_retains_last_violations() {
        let config = EngineConfig {
            max_rounds: 3,
            ..Default::default()
        };
        // Every round: meta description of 200 characters.
        let (engine, generator, recorder) = engine(
            vec![
                MockReply::Text(payload(900, 200)),
                MockReply::Text(payload(900, 200)),
                MockReply::Text(payload(900, 200)),
            ],
            config,
        );

        let result = engine.run(&record(), vec![]).await;

        match &result {
            LoopResult::Failed { reason, violations, attempts } => {
                assert_eq!(*reason, FailureReason::MaxRoundsExceeded);
                assert_eq!(attempts.len(), 3);
                assert_eq!(
                    attempts.iter().map(|a| a.round).collect::<Vec<_>>(),
                    vec![0, 1, 2]
                );
                assert_eq!(violations.len(), 1);
                assert_eq!(violations[0].rule, RuleId::MetaLength);
            }
            LoopResult::Accepted { .. } => panic!("expected failure"),
        }

        assert_eq!(generator.call_count(), 3);
        assert_eq!(recorder.len(), 1);
    }

    #[tokio::test]
    async fn test_transport_faults_exhaust_separate_budget() {
        let config = EngineConfig {
            fault_budget: 2,
            ..Default::default()
        };
        let (engine, generator, _) = engine(
            vec![
                MockReply::Fault("unreachable".to_string()),
                MockReply::Fault("unreachable".to_string()),
                MockReply::Fault("unreachable".to_string()),
            ],
            config,
        );

        let result = engine.run(&record(), vec![]).await;

        match &result {
            LoopResult::Failed { reason, attempts, .. } => {
                assert_eq!(*reason, FailureReason::GenerationUnavailable);
                // No content round completed.
                assert!(attempts.is_empty());
            }
            LoopResult::Accepted { .. } => panic!("expected failure"),
        }

        // Budget of 2 retries means exactly 3 calls.
        assert_eq!(generator.call_count(), 3);
    }

    #[tokio::test]
    async fn test_transport_fault_does_not_consume_content_round() {
        let config = EngineConfig {
            max_rounds: 1,
            fault_budget: 2,
            ..Default::default()
        };
        let (engine, generator, _) = engine(
            vec![
                MockReply::Fault("flaky".to_string()),
                MockReply::Text(compliant()),
            ],
            config,
        );

        let result = engine.run(&record(), vec![]).await;

        assert!(result.is_accepted());
        assert_eq!(result.attempts().len(), 1);
        assert_eq!(generator.call_count(), 2);
    }

    #[tokio::test]
    async fn test_timeout_is_a_transport_fault() {
        let config = EngineConfig {
            fault_budget: 0,
            timeout_ms: 50,
            ..Default::default()
        };
        let (engine, _, _) = engine(vec![MockReply::Hang], config);

        let result = engine.run(&record(), vec![]).await;

        match result {
            LoopResult::Failed { reason, attempts, .. } => {
                assert_eq!(reason, FailureReason::GenerationUnavailable);
                assert!(attempts.is_empty());
            }
            LoopResult::Accepted { .. } => panic!("expected failure"),
        }
    }

    #[tokio::test]
    async fn test_unparseable_output_consumes_a_repair_round() {
        let (engine, _, _) = engine(
            vec![
                MockReply::Text("I'm sorry, I can't produce that page.".to_string()),
                MockReply::Text(compliant()),
            ],
            EngineConfig::default(),
        );

        let result = engine.run(&record(), vec![]).await;

        match &result {
            LoopResult::Accepted { attempts, .. } => {
                assert_eq!(attempts.len(), 2);
                assert!(attempts[0].spec.is_none());
                assert_eq!(attempts[0].violations[0].rule, RuleId::Unparseable);
            }
            LoopResult::Failed { .. } => panic!("expected acceptance after repair"),
        }
    }

    #[tokio::test]
    async fn test_cancellation_before_first_generation() {
        let (engine, generator, recorder) =
            engine(vec![MockReply::Text(compliant())], EngineConfig::default());
        let signal = FlagSignal(AtomicBool::new(true));

        let result = engine.run_with_signal(&record(), vec![], &signal).await;

        match result {
            LoopResult::Failed { reason, attempts, .. } => {
                assert_eq!(reason, FailureReason::Cancelled);
                assert!(attempts.is_empty());
            }
            LoopResult::Accepted { .. } => panic!("expected cancellation"),
        }

        assert_eq!(generator.call_count(), 0);
        // The cancelled invocation is still traced.
        assert_eq!(recorder.len(), 1);
    }

    #[tokio::test]
    async fn test_termination_bound() {
        // A generator that always produces violating output terminates in
        // exactly max_rounds calls.
        let config = EngineConfig {
            max_rounds: 5,
            ..Default::default()
        };
        let replies = (0..10)
            .map(|_| MockReply::Text(payload(10, 80)))
            .collect();
        let (engine, generator, _) = engine(replies, config);

        let result = engine.run(&record(), vec![]).await;

        assert!(!result.is_accepted());
        assert_eq!(result.attempts().len(), 5);
        assert_eq!(generator.call_count(), 5);
    }

    #[tokio::test]
    async fn test_link_candidates_reach_the_prompt() {
        let (engine, generator, _) =
            engine(vec![MockReply::Text(compliant())], EngineConfig::default());

        engine
            .run(&record(), vec!["luigi-s-restaurant-oakland".to_string()])
            .await;

        let requests = generator.requests();
        assert!(requests[0].prompt.contains("luigi-s-restaurant-oakland"));
    }
}
