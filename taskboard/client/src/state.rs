//! Board state and the pure reducer that evolves it.
//!
//! Nothing here performs I/O. The [`Store`](crate::store::Store) turns server
//! responses into [`Action`]s and feeds them through [`reduce`].

use taskboard_core::{GroupedTasks, Status, Task, TaskCard, TaskId};

/// Progress of the task list request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FetchState {
    #[default]
    Idle,
    Loading,
    Ready,
    /// The list could not be loaded. The board shows a connectivity error instead of tasks.
    Errored(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: u64,
    pub kind: NotificationKind,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoardState {
    pub tasks: GroupedTasks,
    pub fetch: FetchState,
    pub notifications: Vec<Notification>,
    next_notification_id: u64,
}

impl BoardState {
    pub fn task_by_id(&self, id: TaskId) -> Option<&TaskCard> {
        self.tasks.find(id)
    }

    pub fn tasks_by_status(&self, status: Status) -> &[TaskCard] {
        self.tasks.group(status)
    }

    pub fn total_task_count(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_loading(&self) -> bool {
        self.fetch == FetchState::Loading
    }

    fn notify(&mut self, kind: NotificationKind, message: String) {
        self.next_notification_id += 1;
        self.notifications.push(Notification {
            id: self.next_notification_id,
            kind,
            message,
        });
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    FetchStarted,
    FetchSucceeded(GroupedTasks),
    FetchFailed(String),
    TaskCreated(Task),
    TaskUpdated(Task),
    TaskDeleted(TaskId),
    /// Records returned by a bulk priority change; each one is authoritative.
    PrioritiesUpdated(Vec<Task>),
    MutationFailed(String),
    Notify(NotificationKind, String),
    DismissNotification(u64),
}

/// Applies one action to the state.
///
/// Server records always win: an updated task is taken as is and placed in
/// the group matching its status.
pub fn reduce(mut state: BoardState, action: Action) -> BoardState {
    match action {
        Action::FetchStarted => {
            state.fetch = FetchState::Loading;
        }
        Action::FetchSucceeded(tasks) => {
            state.tasks = tasks;
            state.fetch = FetchState::Ready;
        }
        Action::FetchFailed(message) => {
            state.tasks = GroupedTasks::default();
            state.fetch = FetchState::Errored(message);
        }
        Action::TaskCreated(task) => {
            state.tasks.insert(task.to_card());
        }
        Action::TaskUpdated(task) => {
            state.tasks.upsert(task.to_card());
        }
        Action::TaskDeleted(id) => {
            state.tasks.remove(id);
        }
        Action::PrioritiesUpdated(tasks) => {
            for task in tasks {
                state.tasks.upsert(task.to_card());
            }
        }
        Action::MutationFailed(message) => {
            state.notify(NotificationKind::Error, message);
        }
        Action::Notify(kind, message) => {
            state.notify(kind, message);
        }
        Action::DismissNotification(id) => {
            state.notifications.retain(|notification| notification.id != id);
        }
    }
    state
}

/// Lifecycle of one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RequestState<T> {
    #[default]
    Pending,
    Success(T),
    Failure(String),
}

impl<T> RequestState<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, RequestState::Success(_))
    }

    pub fn success(self) -> Option<T> {
        match self {
            RequestState::Success(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            RequestState::Failure(message) => Some(message),
            _ => None,
        }
    }
}

impl<T, E: std::fmt::Display> From<Result<T, E>> for RequestState<T> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => RequestState::Success(value),
            Err(err) => RequestState::Failure(err.to_string()),
        }
    }
}
