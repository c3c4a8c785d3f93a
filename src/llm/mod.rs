//! Generation capability boundary.
//!
//! The engine only requires the [`TextGenerator`] contract: prompt in, raw
//! text or transport fault out. [`AnthropicClient`] is the production
//! implementation; [`MockGenerator`] scripts responses for tests.

mod anthropic;
mod client;

pub use anthropic::{AnthropicClient, AnthropicConfig};
pub use client::{
    GenerationRequest, GenerationResponse, MockGenerator, MockReply, TextGenerator,
    TransportFault, Usage,
};
