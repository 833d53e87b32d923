//! Advisory AI helpers: summarizing and prioritizing tasks through an
//! external text completion service.
//!
//! Nothing here is authoritative. Failures of the completion service, and
//! completions that cannot be understood, degrade to an empty result instead
//! of an error so the client always has something to render.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use taskboard_core::{Priority, PrioritySuggestion, TaskId};

use crate::config::Config;

pub mod api;
mod openai;

pub use api::AssistState;
pub use openai::OpenAiCompletionService;
pub use taskboard_core::{AssistTask, Prioritization, Summary};

/// Error type for completion service calls.
#[derive(Debug, thiserror::Error)]
pub enum AssistError {
    #[error("Completion service is not configured")]
    NotConfigured,
    #[error("Completion request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Completion service responded with {status}: {body}")]
    Upstream { status: u16, body: String },
    #[error("Completion response contained no message")]
    EmptyCompletion,
}

/// A text completion backend: one prompt in, one completion out.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(&self, prompt: String) -> Result<String, AssistError>;
}

/// Stand-in used when no API key is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledCompletionService;

#[async_trait]
impl CompletionService for DisabledCompletionService {
    async fn complete(&self, _prompt: String) -> Result<String, AssistError> {
        Err(AssistError::NotConfigured)
    }
}

/// Picks the completion backend from the configuration.
pub fn completion_service_from_config(config: &Config) -> Arc<dyn CompletionService> {
    match config.openai_api_key.as_deref().filter(|key| !key.is_empty()) {
        Some(api_key) => Arc::new(OpenAiCompletionService::new(
            api_key.to_string(),
            config.openai_base_url.clone(),
            config.openai_model.clone(),
        )),
        None => {
            tracing::warn!("OPENAI_API_KEY is not set, AI assistance is disabled");
            Arc::new(DisabledCompletionService)
        }
    }
}

pub struct AssistService {
    completion: Arc<dyn CompletionService>,
}

impl AssistService {
    pub fn new(completion: Arc<dyn CompletionService>) -> Self {
        Self { completion }
    }

    /// Asks for a short summary of the tasks.
    #[tracing::instrument(skip(self, tasks), fields(task_count = tasks.len()))]
    pub async fn summarize(&self, tasks: &[AssistTask]) -> Summary {
        if tasks.is_empty() {
            return Summary {
                summary: String::new(),
                degraded: false,
            };
        }

        match self.completion.complete(summarize_prompt(tasks)).await {
            Ok(text) => Summary {
                summary: text.trim().to_string(),
                degraded: false,
            },
            Err(err) => {
                tracing::warn!("Summarization failed: {}", err);
                Summary {
                    summary: String::new(),
                    degraded: true,
                }
            }
        }
    }

    /// Asks for a priority per task. Only suggestions for the submitted tasks are kept.
    #[tracing::instrument(skip(self, tasks), fields(task_count = tasks.len()))]
    pub async fn prioritize(&self, tasks: &[AssistTask]) -> Prioritization {
        if tasks.is_empty() {
            return Prioritization {
                results: Vec::new(),
                degraded: false,
            };
        }

        match self.completion.complete(prioritize_prompt(tasks)).await {
            Ok(text) => {
                let known_ids: HashSet<TaskId> = tasks.iter().map(|task| task.id).collect();
                match parse_suggestions(&text, &known_ids) {
                    Some(results) => Prioritization {
                        results,
                        degraded: false,
                    },
                    None => {
                        tracing::warn!("Failed to parse prioritization response: {}", text);
                        Prioritization {
                            results: Vec::new(),
                            degraded: true,
                        }
                    }
                }
            }
            Err(err) => {
                tracing::warn!("Prioritization failed: {}", err);
                Prioritization {
                    results: Vec::new(),
                    degraded: true,
                }
            }
        }
    }
}

fn summarize_prompt(tasks: &[AssistTask]) -> String {
    let lines: Vec<String> = tasks
        .iter()
        .map(|task| match task.description.as_deref() {
            Some(description) if !description.is_empty() => {
                format!("- {}: {}", task.title, description)
            }
            _ => format!("- {}", task.title),
        })
        .collect();
    format!(
        "Summarize the following tasks in a short paragraph, highlighting what matters most.\n\nTasks:\n{}",
        lines.join("\n")
    )
}

fn prioritize_prompt(tasks: &[AssistTask]) -> String {
    let lines: Vec<String> = tasks
        .iter()
        .map(|task| {
            format!(
                "- {}: {} (Current: {})",
                task.id,
                task.title,
                task.priority.unwrap_or_default()
            )
        })
        .collect();
    format!(
        "You are an assistant that prioritizes tasks.\n\
         Assign each task a priority: P1 (High), P2 (Medium), P3 (Low).\n\
         Respond in pure JSON array format only, like:\n\
         [{{\"id\": 123, \"newPriority\": \"P1\"}}, {{\"id\": 456, \"newPriority\": \"P3\"}}]\n\n\
         Tasks:\n{}",
        lines.join("\n")
    )
}

/// Reads the suggestions out of a completion.
///
/// Returns `None` when the text is not a JSON array. Entries without a usable
/// id or priority, ids outside `known_ids` and repeated ids are dropped.
fn parse_suggestions(raw: &str, known_ids: &HashSet<TaskId>) -> Option<Vec<PrioritySuggestion>> {
    let cleaned = raw.replace("```json", "").replace("```", "");
    let entries = match serde_json::from_str::<serde_json::Value>(cleaned.trim()).ok()? {
        serde_json::Value::Array(entries) => entries,
        _ => return None,
    };

    let mut seen = HashSet::new();
    let suggestions = entries
        .iter()
        .filter_map(|entry| {
            let id = match entry.get("id")? {
                serde_json::Value::Number(number) => TaskId::try_from(number.as_i64()?).ok()?,
                serde_json::Value::String(text) => text.trim().parse().ok()?,
                _ => return None,
            };
            let new_priority: Priority = entry.get("newPriority")?.as_str()?.parse().ok()?;
            Some(PrioritySuggestion { id, new_priority })
        })
        .filter(|suggestion| known_ids.contains(&suggestion.id) && seen.insert(suggestion.id))
        .collect();
    Some(suggestions)
}
