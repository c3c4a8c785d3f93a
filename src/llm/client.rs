//! Core generation client types and trait definition.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Stateless text generator - each call is independent.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Single completion request, blocking until complete.
    async fn generate(
        &self,
        request: GenerationRequest,
    ) -> std::result::Result<GenerationResponse, TransportFault>;
}

/// Everything needed for one generation call.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// System prompt.
    pub system: String,

    /// User prompt (initial or repair).
    pub prompt: String,

    /// Max tokens for the response.
    pub max_tokens: u32,
}

/// Response from a generation call.
#[derive(Debug, Clone)]
pub struct GenerationResponse {
    /// Raw text content, exactly as the model produced it.
    pub text: String,

    /// Token usage for cost tracking.
    pub usage: Usage,
}

/// Token usage statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl Usage {
    pub fn new(input_tokens: u64, output_tokens: u64) -> Self {
        Self {
            input_tokens,
            output_tokens,
        }
    }

    /// Calculate total tokens.
    pub fn total(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }

    /// Accumulate usage from another instance.
    pub fn add(&mut self, other: &Usage) {
        self.input_tokens += other.input_tokens;
        self.output_tokens += other.output_tokens;
    }
}

/// Failure to obtain any response from the generation capability.
///
/// Distinct from content violations: transport faults consume the engine's
/// separate fault budget and never a content-repair round.
#[derive(Debug, thiserror::Error)]
pub enum TransportFault {
    #[error("Rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Generation call timed out after {timeout:?}")]
    Timeout { timeout: Duration },
}

/// Scripted reply for [`MockGenerator`].
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Return this text.
    Text(String),
    /// Fail with a transport fault carrying this message.
    Fault(String),
    /// Never respond; lets callers exercise their timeout handling.
    Hang,
}

/// Scripted generator for tests: pops one reply per call, in order.
pub struct MockGenerator {
    replies: Mutex<VecDeque<MockReply>>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl MockGenerator {
    pub fn new(replies: Vec<MockReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Every request received so far, in call order.
    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of calls received.
    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl TextGenerator for MockGenerator {
    async fn generate(
        &self,
        request: GenerationRequest,
    ) -> std::result::Result<GenerationResponse, TransportFault> {
        self.requests.lock().unwrap().push(request);

        let reply = self.replies.lock().unwrap().pop_front();
        match reply {
            Some(MockReply::Text(text)) => Ok(GenerationResponse {
                text,
                usage: Usage::new(100, 50),
            }),
            Some(MockReply::Fault(message)) => Err(TransportFault::ApiError {
                status: 503,
                message,
            }),
            Some(MockReply::Hang) => {
                tokio::time::sleep(Duration::from_secs(86_400)).await;
                Err(TransportFault::MalformedResponse("hang elapsed".to_string()))
            }
            None => Err(TransportFault::ApiError {
                status: 500,
                message: "mock replies exhausted".to_string(),
            }),
        }
    }
}
