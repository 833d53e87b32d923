use chrono::{DateTime, SubsecRound, Utc};
use sea_orm::*;
use taskboard_core::validation::{normalize_description, normalize_title};
use taskboard_core::{
    GroupedTasks, NewTask, ParseStatusError, PriorityUpdate, Status, Task, TaskId, TaskPatch,
    UserId, ValidationError,
};

use crate::entities::*;

pub mod api;

pub use api::TaskState;

/// Error type for TaskService operations.
#[derive(Debug, thiserror::Error)]
pub enum TaskServiceError {
    /// A title or description that breaks the field constraints.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// A status string outside of the enumerated set.
    #[error(transparent)]
    InvalidStatus(#[from] ParseStatusError),
    /// No task with this ID is owned by the caller.
    #[error("Task with ID {0} not found")]
    TaskNotFound(TaskId),
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<task::Model> for Task {
    fn from(model: task::Model) -> Self {
        Task {
            id: model.id,
            title: model.title,
            description: model.description,
            status: model.status.into(),
            priority: model.priority.into(),
            owner: model.owner_id,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Current time at the precision the store keeps.
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Timestamp for a mutation of a record last changed at `previous`; always later than it.
fn next_update_time(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = now();
    if now > previous {
        now
    } else {
        previous + chrono::Duration::microseconds(1)
    }
}

/// Task operations, always scoped to the owning user.
pub struct TaskService<'a> {
    db: &'a DatabaseConnection,
}

impl TaskService<'_> {
    pub fn new(db: &DatabaseConnection) -> TaskService<'_> {
        TaskService { db }
    }

    /// Creates a new task owned by `owner`.
    ///
    /// # Arguments
    ///
    /// * `owner` - The ID of the user creating the task.
    /// * `new_task` - Title and optional description, status and priority.
    ///
    /// # Returns
    ///
    /// A `Result` containing the created `Task`, or a validation error if the
    /// title is empty or a field is too long. Nothing is stored on failure.
    #[tracing::instrument(skip(self))]
    pub async fn create_task(&self, owner: UserId, new_task: NewTask) -> Result<Task, TaskServiceError> {
        let title = normalize_title(&new_task.title)?;
        let description = normalize_description(new_task.description.as_deref())?;
        let created_at = now();

        let active_model = task::ActiveModel {
            title: ActiveValue::Set(title),
            description: ActiveValue::Set(description),
            status: ActiveValue::Set(new_task.status.unwrap_or_default().into()),
            priority: ActiveValue::Set(new_task.priority.unwrap_or_default().into()),
            owner_id: ActiveValue::Set(owner),
            created_at: ActiveValue::Set(created_at),
            updated_at: ActiveValue::Set(created_at),
            ..Default::default()
        };
        let created_model = active_model.insert(self.db).await?;
        Ok(Task::from(created_model))
    }

    /// Retrieves one task by its ID.
    #[tracing::instrument(skip(self))]
    pub async fn get_task(&self, owner: UserId, id: TaskId) -> Result<Task, TaskServiceError> {
        let model = self.find_owned(owner, id).await?;
        Ok(Task::from(model))
    }

    /// Retrieves all tasks of `owner`, oldest first.
    #[tracing::instrument(skip(self))]
    pub async fn get_all_tasks(&self, owner: UserId) -> Result<Vec<Task>, TaskServiceError> {
        let tasks = task::Entity::find()
            .filter(task::Column::OwnerId.eq(owner))
            .order_by_asc(task::Column::CreatedAt)
            .order_by_asc(task::Column::Id)
            .all(self.db)
            .await?
            .into_iter()
            .map(Task::from)
            .collect();
        Ok(tasks)
    }

    /// Retrieves the tasks of `owner` partitioned by status, as display cards.
    #[tracing::instrument(skip(self))]
    pub async fn get_grouped_tasks(&self, owner: UserId) -> Result<GroupedTasks, TaskServiceError> {
        let tasks = self.get_all_tasks(owner).await?;
        Ok(GroupedTasks::partition(tasks.into_iter().map(Into::into)))
    }

    /// Applies a partial update to a task.
    ///
    /// # Arguments
    ///
    /// * `owner` - The ID of the calling user.
    /// * `id` - The ID of the task to edit.
    /// * `patch` - Fields to change; absent fields are left as they are.
    ///
    /// # Returns
    ///
    /// A `Result` containing the updated `Task`, or `TaskNotFound` if the caller
    /// owns no task with this ID.
    #[tracing::instrument(skip(self))]
    pub async fn update_task(
        &self,
        owner: UserId,
        id: TaskId,
        patch: TaskPatch,
    ) -> Result<Task, TaskServiceError> {
        let title = patch.title.as_deref().map(normalize_title).transpose()?;
        let description = match patch.description.as_deref() {
            Some(description) => Some(normalize_description(Some(description))?),
            None => None,
        };

        let task_to_update = self.find_owned(owner, id).await?;
        let updated_at = next_update_time(task_to_update.updated_at);

        let mut active_model: task::ActiveModel = task_to_update.into();
        if let Some(title) = title {
            active_model.title = ActiveValue::Set(title);
        }
        if let Some(description) = description {
            active_model.description = ActiveValue::Set(description);
        }
        if let Some(status) = patch.status {
            active_model.status = ActiveValue::Set(status.into());
        }
        if let Some(priority) = patch.priority {
            active_model.priority = ActiveValue::Set(priority.into());
        }
        active_model.updated_at = ActiveValue::Set(updated_at);
        let updated_model = active_model.update(self.db).await?;

        Ok(Task::from(updated_model))
    }

    /// Moves a task to another status.
    ///
    /// The status is parsed before the task is looked up, so an unknown status
    /// never touches the store.
    #[tracing::instrument(skip(self))]
    pub async fn set_status(
        &self,
        owner: UserId,
        id: TaskId,
        status: &str,
    ) -> Result<Task, TaskServiceError> {
        let status: Status = status.parse()?;
        let patch = TaskPatch {
            status: Some(status),
            ..Default::default()
        };
        self.update_task(owner, id, patch).await
    }

    /// Deletes a task by its ID.
    #[tracing::instrument(skip(self))]
    pub async fn delete_task(&self, owner: UserId, id: TaskId) -> Result<(), TaskServiceError> {
        let result = task::Entity::delete_many()
            .filter(task::Column::Id.eq(id))
            .filter(task::Column::OwnerId.eq(owner))
            .exec(self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(TaskServiceError::TaskNotFound(id));
        }
        Ok(())
    }

    /// Changes the priority of several tasks, one at a time.
    ///
    /// Each entry is independent: ids the caller does not own, unknown ids and
    /// entries the store fails to write are skipped and only logged. There is
    /// no atomicity across the batch.
    ///
    /// # Returns
    ///
    /// The tasks that were updated, in request order.
    #[tracing::instrument(skip(self))]
    pub async fn bulk_set_priority(
        &self,
        owner: UserId,
        updates: &[PriorityUpdate],
    ) -> Result<Vec<Task>, TaskServiceError> {
        let mut updated_tasks = Vec::with_capacity(updates.len());

        for update in updates {
            let patch = TaskPatch {
                priority: Some(update.priority),
                ..Default::default()
            };
            match self.update_task(owner, update.id, patch).await {
                Ok(task) => updated_tasks.push(task),
                Err(TaskServiceError::TaskNotFound(id)) => {
                    tracing::warn!("Skipped priority update for task {}: not found", id);
                }
                Err(e) => {
                    tracing::error!("Failed to update priority of task {}: {}", update.id, e);
                }
            }
        }

        Ok(updated_tasks)
    }

    async fn find_owned(&self, owner: UserId, id: TaskId) -> Result<task::Model, TaskServiceError> {
        task::Entity::find_by_id(id)
            .filter(task::Column::OwnerId.eq(owner))
            .one(self.db)
            .await?
            .ok_or(TaskServiceError::TaskNotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn next_update_time_is_strictly_later() {
        let far_future = Utc.with_ymd_and_hms(2999, 1, 1, 0, 0, 0).unwrap();

        let next = next_update_time(far_future);

        assert_eq!(next, far_future + chrono::Duration::microseconds(1));
    }

    #[test]
    fn next_update_time_uses_clock_when_ahead() {
        let past = Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap();

        let next = next_update_time(past);

        assert!(next > past);
        assert_eq!(next.timestamp_subsec_nanos() % 1_000, 0);
    }
}
