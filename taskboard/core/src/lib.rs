//! Shared data model for the task board.
//!
//! Both the server and the client speak in these types, so the wire format of
//! statuses, priorities and the grouped board lives in exactly one place.

pub mod assist;
pub mod board;
pub mod task;
pub mod user;
pub mod validation;

pub use assist::{AssistTask, Prioritization, Summary};
pub use board::GroupedTasks;
pub use task::{
    NewTask, ParsePriorityError, ParseStatusError, Priority, PrioritySuggestion, PriorityUpdate,
    Status, Task, TaskCard, TaskId, TaskPatch, UserId,
};
pub use user::User;
pub use validation::ValidationError;
