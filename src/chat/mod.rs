//! Chat session service
//!
//! Maps a session id to an ordered message list so follow-up turns reuse
//! the investigation context. Sessions live in memory with TTL eviction,
//! or in Postgres when DATABASE_URL is configured. Any failure inside a
//! turn yields the fixed decline response; broken state is never cached.

use crate::agent::AgenticLoop;
use crate::error::InvestigationError;
use crate::llm::parser;
use crate::models::{InvestigationResponse, LlmMessage, MessageRole, StructuredChatResponse};
use crate::prompt::PromptBuilder;
use crate::tools::ToolRegistry;
use crate::Result;
use chrono::{DateTime, Duration, Utc};
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use std::env;
use std::sync::Arc;
use tokio::sync::{OnceCell, RwLock};
use tracing::{info, warn};
use uuid::Uuid;

/// How long an idle in-memory session survives before eviction.
const DEFAULT_SESSION_TTL_SECS: i64 = 3600;

/// One completed chat turn: the (possibly newly generated) session id and
/// the structured response.
#[derive(Debug, Clone)]
pub struct ChatTurn {
    pub session_id: String,
    pub response: StructuredChatResponse,
}

struct SessionEntry {
    messages: Vec<LlmMessage>,
    last_active: DateTime<Utc>,
}

enum SessionBackend {
    InMemory {
        sessions: Arc<RwLock<HashMap<String, SessionEntry>>>,
    },
    Postgres {
        pool: PgPool,
        schema_ready: Arc<OnceCell<()>>,
    },
}

pub struct ChatSessionService {
    backend: SessionBackend,
    agent: AgenticLoop,
    tools: Arc<ToolRegistry>,
    session_ttl: Duration,
}

impl ChatSessionService {
    /// Backend selected from the environment: Postgres when DATABASE_URL
    /// is set and connectable, in-memory otherwise.
    pub fn new(agent: AgenticLoop, tools: Arc<ToolRegistry>) -> Self {
        Self {
            backend: build_backend(),
            agent,
            tools,
            session_ttl: Duration::seconds(DEFAULT_SESSION_TTL_SECS),
        }
    }

    pub fn in_memory(agent: AgenticLoop, tools: Arc<ToolRegistry>) -> Self {
        Self {
            backend: SessionBackend::InMemory {
                sessions: Arc::new(RwLock::new(HashMap::new())),
            },
            agent,
            tools,
            session_ttl: Duration::seconds(DEFAULT_SESSION_TTL_SECS),
        }
    }

    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    /// Process one conversational turn.
    ///
    /// The first turn of a session is seeded with the follow-up system
    /// prompt built from the prior investigation; later turns replay the
    /// cached list. Every failure path returns the fixed decline response.
    pub async fn process_chat_turn(
        &self,
        session_id: Option<String>,
        content: &str,
        initial_context: Option<&InvestigationResponse>,
    ) -> ChatTurn {
        let session_id = session_id.unwrap_or_else(|| Uuid::new_v4().to_string());

        let response = match self.run_turn(&session_id, content, initial_context).await {
            Ok(response) => response,
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "Chat turn failed - returning decline response");
                StructuredChatResponse::decline()
            }
        };

        ChatTurn {
            session_id,
            response,
        }
    }

    async fn run_turn(
        &self,
        session_id: &str,
        content: &str,
        initial_context: Option<&InvestigationResponse>,
    ) -> Result<StructuredChatResponse> {
        let mut messages = self.load_history(session_id).await?;

        if messages.is_empty() {
            let system_prompt = match initial_context {
                Some(response) => PromptBuilder::follow_up_system_prompt(response),
                None => {
                    "You are a financial crime analyst. No investigation context is \
                     available for this session; answer general questions only and \
                     state uncertainty explicitly. Return ONLY valid JSON with keys \
                     responseType, response, evidenceReference, confidenceStatement."
                        .to_string()
                }
            };
            messages.push(LlmMessage::system(system_prompt));
            info!(session_id = %session_id, "Seeded new chat session");
        }

        messages.push(LlmMessage::user(content));

        let outcome = self
            .agent
            .run(messages.clone(), Some(self.tools.as_ref()))
            .await?;

        let mut chat = parser::parse_chat(&outcome.payload)?;
        if let Some(reasoning) = &outcome.reasoning {
            chat.response = parser::merge_reasoning(reasoning, &chat.response);
        }

        messages.push(LlmMessage::assistant(serde_json::to_string(&chat)?));
        self.save_history(session_id, &messages).await?;

        Ok(chat)
    }

    /// Cached message list for a session (empty when unknown or expired).
    pub async fn history(&self, session_id: &str) -> Result<Vec<LlmMessage>> {
        self.load_history(session_id).await
    }

    async fn load_history(&self, session_id: &str) -> Result<Vec<LlmMessage>> {
        match &self.backend {
            SessionBackend::InMemory { sessions } => {
                let cutoff = Utc::now() - self.session_ttl;

                let mut locked = sessions.write().await;
                locked.retain(|_, entry| entry.last_active > cutoff);

                Ok(locked
                    .get(session_id)
                    .map(|entry| entry.messages.clone())
                    .unwrap_or_default())
            }
            SessionBackend::Postgres { pool, .. } => {
                self.ensure_schema_if_needed().await?;

                let rows = sqlx::query(
                    r#"
                    SELECT role, content
                    FROM chat_messages
                    WHERE session_id = $1
                    ORDER BY position ASC
                    "#,
                )
                .bind(session_id)
                .fetch_all(pool)
                .await
                .map_err(|e| {
                    InvestigationError::Database(format!("Failed to load chat history: {}", e))
                })?;

                let messages = rows
                    .into_iter()
                    .map(|row| {
                        let role: String = row.try_get("role").unwrap_or_else(|_| "user".to_string());
                        LlmMessage {
                            role: role_from_db(&role),
                            content: row.try_get("content").unwrap_or_default(),
                        }
                    })
                    .collect();

                Ok(messages)
            }
        }
    }

    async fn save_history(&self, session_id: &str, messages: &[LlmMessage]) -> Result<()> {
        match &self.backend {
            SessionBackend::InMemory { sessions } => {
                let mut locked = sessions.write().await;
                locked.insert(
                    session_id.to_string(),
                    SessionEntry {
                        messages: messages.to_vec(),
                        last_active: Utc::now(),
                    },
                );
                Ok(())
            }
            SessionBackend::Postgres { pool, .. } => {
                self.ensure_schema_if_needed().await?;

                let mut tx = pool.begin().await.map_err(|e| {
                    InvestigationError::Database(format!(
                        "Failed to begin chat history transaction: {}",
                        e
                    ))
                })?;

                sqlx::query("DELETE FROM chat_messages WHERE session_id = $1")
                    .bind(session_id)
                    .execute(&mut *tx)
                    .await
                    .map_err(|e| {
                        InvestigationError::Database(format!(
                            "Failed to clear old chat history: {}",
                            e
                        ))
                    })?;

                for (position, message) in messages.iter().enumerate() {
                    sqlx::query(
                        r#"
                        INSERT INTO chat_messages (session_id, position, role, content, created_at)
                        VALUES ($1, $2, $3, $4, $5)
                        "#,
                    )
                    .bind(session_id)
                    .bind(position as i32)
                    .bind(role_to_db(message.role))
                    .bind(&message.content)
                    .bind(Utc::now())
                    .execute(&mut *tx)
                    .await
                    .map_err(|e| {
                        InvestigationError::Database(format!(
                            "Failed to insert chat message: {}",
                            e
                        ))
                    })?;
                }

                tx.commit().await.map_err(|e| {
                    InvestigationError::Database(format!(
                        "Failed to commit chat history transaction: {}",
                        e
                    ))
                })?;

                Ok(())
            }
        }
    }

    async fn ensure_schema_if_needed(&self) -> Result<()> {
        let SessionBackend::Postgres { pool, schema_ready } = &self.backend else {
            return Ok(());
        };

        schema_ready
            .get_or_try_init(|| async {
                sqlx::query(
                    r#"
                    CREATE TABLE IF NOT EXISTS chat_messages (
                      session_id TEXT NOT NULL,
                      position INTEGER NOT NULL,
                      role TEXT NOT NULL,
                      content TEXT NOT NULL,
                      created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                      PRIMARY KEY (session_id, position)
                    );
                    "#,
                )
                .execute(pool)
                .await?;

                Ok::<(), sqlx::Error>(())
            })
            .await
            .map_err(|e| {
                InvestigationError::Database(format!(
                    "Failed to initialize chat session schema: {}",
                    e
                ))
            })?;

        Ok(())
    }
}

fn role_to_db(role: MessageRole) -> &'static str {
    match role {
        MessageRole::System => "system",
        MessageRole::User => "user",
        MessageRole::Assistant => "assistant",
    }
}

fn role_from_db(role: &str) -> MessageRole {
    match role.to_lowercase().as_str() {
        "system" => MessageRole::System,
        "assistant" => MessageRole::Assistant,
        _ => MessageRole::User,
    }
}

fn build_backend() -> SessionBackend {
    let database_url = env::var("DATABASE_URL").ok();

    if let Some(url) = database_url {
        match sqlx::postgres::PgPoolOptions::new()
            .max_connections(5)
            .connect_lazy(&url)
        {
            Ok(pool) => {
                info!("Chat session backend: postgres");
                return SessionBackend::Postgres {
                    pool,
                    schema_ready: Arc::new(OnceCell::new()),
                };
            }
            Err(error) => {
                warn!(
                    "Failed to initialize postgres session backend, falling back to in-memory: {}",
                    error
                );
            }
        }
    }

    info!("Chat session backend: in-memory");
    SessionBackend::InMemory {
        sessions: Arc::new(RwLock::new(HashMap::new())),
    }
}
