//! LLM gateway seam and response parsing
//!
//! The transport layer is an external collaborator; this pipeline only
//! needs "succeeded with text" vs "failed". String surgery on model
//! output is isolated in the parser module.

pub mod gateway;
pub mod parser;

pub use gateway::{HttpLlmGateway, LlmGateway, RawModelOutput, ScriptedGateway};
