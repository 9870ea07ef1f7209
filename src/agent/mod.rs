//! Agentic exchange loop
//!
//! AwaitingModel → ToolsRequested → ToolsExecuted → AwaitingModel(final) → Done
//!
//! Drives at most two sequential model round-trips per turn: the second one
//! only exists to feed tool results back. No recursive tool chains.

use crate::llm::{parser, LlmGateway};
use crate::models::{LlmMessage, ToolResult};
use crate::tools::ToolRegistry;
use crate::Result;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What one exchange produced: the extracted reasoning block (if any) and
/// the cleaned JSON payload ready for schema parsing.
#[derive(Debug, Clone)]
pub struct AgentOutcome {
    pub reasoning: Option<String>,
    pub payload: String,
}

pub struct AgenticLoop {
    gateway: Arc<dyn LlmGateway>,
}

impl AgenticLoop {
    pub fn new(gateway: Arc<dyn LlmGateway>) -> Self {
        Self { gateway }
    }

    /// Run one agentic turn over the message list.
    ///
    /// With a registry present the model may request tools; requests are
    /// dispatched sequentially in request order and results are resubmitted
    /// exactly once. Without a registry the first response is final.
    pub async fn run(
        &self,
        mut messages: Vec<LlmMessage>,
        registry: Option<&ToolRegistry>,
    ) -> Result<AgentOutcome> {
        let specs = registry
            .filter(|r| !r.is_empty())
            .map(|r| r.specs());

        let first = self
            .gateway
            .complete_chat(&messages, specs.as_deref())
            .await?;

        let final_text = match registry {
            Some(registry) if !first.tool_calls.is_empty() => {
                info!(
                    tool_requests = first.tool_calls.len(),
                    "Model requested tools - dispatching"
                );

                let mut results = Vec::with_capacity(first.tool_calls.len());
                for call in &first.tool_calls {
                    let result = match registry.get(&call.tool_name) {
                        Some(tool) => tool.execute(call).await,
                        None => {
                            warn!(tool_name = %call.tool_name, "Requested tool not registered");
                            ToolResult {
                                call_id: call.call_id.clone(),
                                tool_name: call.tool_name.clone(),
                                output: "Tool not found".to_string(),
                            }
                        }
                    };
                    results.push(result);
                }

                // Echo the requests and hand the serialized results back,
                // then take the second response as final.
                messages.push(LlmMessage::assistant(serde_json::to_string(
                    &first.tool_calls,
                )?));
                messages.push(LlmMessage::user(serde_json::to_string(&results)?));

                let second = self.gateway.complete_chat(&messages, None).await?;
                if !second.tool_calls.is_empty() {
                    debug!("Ignoring tool requests in the final round");
                }
                second.text
            }
            _ => {
                if !first.tool_calls.is_empty() {
                    debug!("Tool requests without a registry - using text segment only");
                }
                first.text
            }
        };

        let (reasoning, payload) = parser::extract_reasoning_and_payload(&final_text);

        Ok(AgentOutcome { reasoning, payload })
    }
}
