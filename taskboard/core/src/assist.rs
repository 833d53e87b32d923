//! Wire types of the AI assist endpoints.

use serde::{Deserialize, Serialize};

use crate::task::{Priority, PrioritySuggestion, TaskCard, TaskId};

/// The parts of a task the assistant looks at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AssistTask {
    pub id: TaskId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
}

impl From<&TaskCard> for AssistTask {
    fn from(card: &TaskCard) -> Self {
        AssistTask {
            id: card.id,
            title: card.title.clone(),
            description: card.description.clone(),
            priority: Some(card.priority),
        }
    }
}

/// Outcome of a summary request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Summary {
    pub summary: String,
    /// True when the assistant failed and the summary is empty
    pub degraded: bool,
}

/// Outcome of a prioritization request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Prioritization {
    pub results: Vec<PrioritySuggestion>,
    /// True when the assistant failed or its answer was unusable
    pub degraded: bool,
}
