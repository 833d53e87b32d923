use serde::{Deserialize, Serialize};
use taskboard_core::{
    AssistTask, NewTask, Priority, PrioritySuggestion, PriorityUpdate, Status, Task, TaskId,
    TaskPatch, User,
};
use tracing_futures::Instrument;

use crate::api::{ApiError, AuthApi, TaskApi};
use crate::auth::{AuthAction, AuthState, reduce_auth};
use crate::state::{Action, BoardState, NotificationKind, RequestState, reduce};

const CONNECTIVITY_ERROR: &str = "Unable to connect to the server. Please check your connection.";
const UNKNOWN_TASK_TITLE: &str = "Unknown Task";

/// One suggested priority change, shown to the user before it is applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriorityReview {
    pub id: TaskId,
    pub title: String,
    pub old_priority: Priority,
    pub new_priority: Priority,
}

/// Pairs each suggestion with the task it refers to.
///
/// Suggestions for tasks that are not on the board are kept with a
/// placeholder title and the default priority.
pub fn merge_reviews(board: &BoardState, suggestions: &[PrioritySuggestion]) -> Vec<PriorityReview> {
    suggestions
        .iter()
        .map(|suggestion| match board.task_by_id(suggestion.id) {
            Some(card) => PriorityReview {
                id: suggestion.id,
                title: card.title.clone(),
                old_priority: card.priority,
                new_priority: suggestion.new_priority,
            },
            None => PriorityReview {
                id: suggestion.id,
                title: UNKNOWN_TASK_TITLE.to_string(),
                old_priority: Priority::default(),
                new_priority: suggestion.new_priority,
            },
        })
        .collect()
}

fn failure_message(err: &ApiError) -> String {
    match err {
        ApiError::Network(_) => CONNECTIVITY_ERROR.to_string(),
        _ => err.to_string(),
    }
}

/// Client state container.
///
/// Every intent awaits the server before touching the state; nothing is
/// applied optimistically. Intents take `&mut self`, so at most one request
/// is in flight per store and the last response applied wins.
pub struct Store<A> {
    api: A,
    board: BoardState,
    auth: AuthState,
}

impl<A> Store<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            board: BoardState::default(),
            auth: AuthState::default(),
        }
    }

    pub fn board(&self) -> &BoardState {
        &self.board
    }

    pub fn auth(&self) -> &AuthState {
        &self.auth
    }

    pub fn dispatch(&mut self, action: Action) {
        let state = std::mem::take(&mut self.board);
        self.board = reduce(state, action);
    }

    fn dispatch_auth(&mut self, action: AuthAction) {
        let state = std::mem::take(&mut self.auth);
        self.auth = reduce_auth(state, action);
    }

    pub fn dismiss_notification(&mut self, id: u64) {
        self.dispatch(Action::DismissNotification(id));
    }

    /// Turns a mutation response into a request state, dispatching `on_success`
    /// or an error notification.
    fn settle<T>(
        &mut self,
        result: Result<T, ApiError>,
        on_success: impl FnOnce(&T) -> Action,
    ) -> RequestState<T> {
        match result {
            Ok(value) => {
                self.dispatch(on_success(&value));
                RequestState::Success(value)
            }
            Err(err) => {
                tracing::warn!("Request failed: {}", err);
                let message = failure_message(&err);
                self.dispatch(Action::MutationFailed(message.clone()));
                RequestState::Failure(message)
            }
        }
    }
}

impl<A: TaskApi> Store<A> {
    /// Loads the board. On failure the board is replaced by a connectivity error.
    pub async fn fetch_tasks(&mut self) -> RequestState<()> {
        self.dispatch(Action::FetchStarted);
        let result = self
            .api
            .list_tasks()
            .instrument(tracing::info_span!("fetch_tasks"))
            .await;
        match result {
            Ok(tasks) => {
                self.dispatch(Action::FetchSucceeded(tasks));
                RequestState::Success(())
            }
            Err(err) => {
                tracing::warn!("Failed to load tasks: {}", err);
                let message = failure_message(&err);
                self.dispatch(Action::FetchFailed(message.clone()));
                RequestState::Failure(message)
            }
        }
    }

    pub async fn create_task(&mut self, new_task: NewTask) -> RequestState<Task> {
        let result = self
            .api
            .create_task(new_task)
            .instrument(tracing::info_span!("create_task"))
            .await;
        self.settle(result, |task| Action::TaskCreated(task.clone()))
    }

    pub async fn update_task(&mut self, id: TaskId, patch: TaskPatch) -> RequestState<Task> {
        let result = self
            .api
            .update_task(id, patch)
            .instrument(tracing::info_span!("update_task", id))
            .await;
        self.settle(result, |task| Action::TaskUpdated(task.clone()))
    }

    pub async fn set_status(&mut self, id: TaskId, status: Status) -> RequestState<Task> {
        let result = self
            .api
            .set_status(id, status)
            .instrument(tracing::info_span!("set_status", id, status = %status))
            .await;
        self.settle(result, |task| Action::TaskUpdated(task.clone()))
    }

    pub async fn delete_task(&mut self, id: TaskId) -> RequestState<()> {
        let result = self
            .api
            .delete_task(id)
            .instrument(tracing::info_span!("delete_task", id))
            .await;
        self.settle(result, |_| Action::TaskDeleted(id))
    }

    pub async fn bulk_set_priority(&mut self, updates: Vec<PriorityUpdate>) -> RequestState<Vec<Task>> {
        let result = self
            .api
            .bulk_set_priority(updates)
            .instrument(tracing::info_span!("bulk_set_priority"))
            .await;
        self.settle(result, |tasks| Action::PrioritiesUpdated(tasks.clone()))
    }

    /// Asks the assistant for priorities of every task on the board.
    pub async fn review_priorities(&mut self) -> RequestState<Vec<PriorityReview>> {
        let tasks: Vec<AssistTask> = self.board.tasks.iter().map(AssistTask::from).collect();
        if tasks.is_empty() {
            return RequestState::Success(Vec::new());
        }

        let result = self
            .api
            .suggest_priorities(tasks)
            .instrument(tracing::info_span!("suggest_priorities"))
            .await;
        match result {
            Ok(prioritization) if prioritization.degraded => {
                let message = "AI prioritization is unavailable right now".to_string();
                self.dispatch(Action::Notify(NotificationKind::Error, message.clone()));
                RequestState::Failure(message)
            }
            Ok(prioritization) => {
                RequestState::Success(merge_reviews(&self.board, &prioritization.results))
            }
            Err(err) => {
                tracing::warn!("Failed to get priority suggestions: {}", err);
                let message = failure_message(&err);
                self.dispatch(Action::MutationFailed(message.clone()));
                RequestState::Failure(message)
            }
        }
    }

    /// Submits reviewed priorities, then reloads the board.
    pub async fn apply_priority_review(&mut self, reviews: &[PriorityReview]) -> RequestState<Vec<Task>> {
        let updates = reviews
            .iter()
            .map(|review| PriorityUpdate {
                id: review.id,
                priority: review.new_priority,
            })
            .collect();

        let outcome = self.bulk_set_priority(updates).await;
        if let RequestState::Success(tasks) = &outcome {
            let message = format!("Updated priority of {} tasks", tasks.len());
            self.dispatch(Action::Notify(NotificationKind::Info, message));
            self.fetch_tasks().await;
        }
        outcome
    }

    /// Asks the assistant for a summary of the board.
    pub async fn summarize(&mut self) -> RequestState<String> {
        let tasks: Vec<AssistTask> = self.board.tasks.iter().map(AssistTask::from).collect();
        let result = self
            .api
            .summarize(tasks)
            .instrument(tracing::info_span!("summarize"))
            .await;
        match result {
            Ok(summary) if summary.degraded => {
                let message = "AI summary is unavailable right now".to_string();
                self.dispatch(Action::Notify(NotificationKind::Error, message.clone()));
                RequestState::Failure(message)
            }
            Ok(summary) => RequestState::Success(summary.summary),
            Err(err) => {
                let message = failure_message(&err);
                self.dispatch(Action::MutationFailed(message.clone()));
                RequestState::Failure(message)
            }
        }
    }
}

impl<A: AuthApi> Store<A> {
    /// Signs in and keeps the token for every later request.
    pub async fn login(&mut self, email: &str, password: &str) -> RequestState<User> {
        self.dispatch_auth(AuthAction::LoginStarted);
        let result = self
            .api
            .login(email.to_string(), password.to_string())
            .instrument(tracing::info_span!("login"))
            .await;
        match result {
            Ok(response) => {
                self.api.set_token(Some(response.token.clone()));
                self.dispatch_auth(AuthAction::LoginSucceeded {
                    user: response.user.clone(),
                    token: response.token,
                });
                RequestState::Success(response.user)
            }
            Err(err) => {
                let message = failure_message(&err);
                self.dispatch_auth(AuthAction::LoginFailed(message.clone()));
                RequestState::Failure(message)
            }
        }
    }

    pub async fn register(&mut self, name: &str, email: &str, password: &str) -> RequestState<User> {
        self.dispatch_auth(AuthAction::RegisterStarted);
        let result = self
            .api
            .register(name.to_string(), email.to_string(), password.to_string())
            .instrument(tracing::info_span!("register"))
            .await;
        match result {
            Ok(user) => {
                self.dispatch_auth(AuthAction::RegisterSucceeded(user.clone()));
                RequestState::Success(user)
            }
            Err(err) => {
                let message = failure_message(&err);
                self.dispatch_auth(AuthAction::RegisterFailed(message.clone()));
                RequestState::Failure(message)
            }
        }
    }

    /// Forgets the token and everything loaded with it.
    pub fn logout(&mut self) {
        self.api.set_token(None);
        self.dispatch_auth(AuthAction::Logout);
        self.board = BoardState::default();
    }
}
