use serde::{Deserialize, Serialize};

use crate::task::{Status, TaskCard, TaskId};

/// Tasks partitioned by status, in the shape `GET /api/tasks` returns.
///
/// A task id appears in at most one group, and always in the group matching
/// its status. The mutating methods keep that true.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct GroupedTasks {
    #[serde(default)]
    pub todo: Vec<TaskCard>,
    #[serde(default)]
    pub in_progress: Vec<TaskCard>,
    #[serde(default)]
    pub done: Vec<TaskCard>,
}

impl GroupedTasks {
    /// Splits cards into their status groups, keeping the input order within each group.
    pub fn partition<I>(cards: I) -> Self
    where
        I: IntoIterator<Item = TaskCard>,
    {
        let mut grouped = GroupedTasks::default();
        for card in cards {
            grouped.insert(card);
        }
        grouped
    }

    /// Returns the cards of one status group.
    pub fn group(&self, status: Status) -> &[TaskCard] {
        match status {
            Status::Todo => &self.todo,
            Status::InProgress => &self.in_progress,
            Status::Done => &self.done,
        }
    }

    fn group_mut(&mut self, status: Status) -> &mut Vec<TaskCard> {
        match status {
            Status::Todo => &mut self.todo,
            Status::InProgress => &mut self.in_progress,
            Status::Done => &mut self.done,
        }
    }

    /// Appends a card to the end of its status group, dropping any stale copy first.
    pub fn insert(&mut self, card: TaskCard) {
        self.remove(card.id);
        self.group_mut(card.status).push(card);
    }

    /// Merges an authoritative card into the board.
    ///
    /// A card whose status did not change keeps its position; a card that
    /// changed status leaves its old group and is appended to the new one.
    pub fn upsert(&mut self, card: TaskCard) {
        let group = self.group_mut(card.status);
        if let Some(existing) = group.iter_mut().find(|existing| existing.id == card.id) {
            *existing = card;
            return;
        }
        self.insert(card);
    }

    /// Removes the card with the given id from whichever group holds it.
    pub fn remove(&mut self, id: TaskId) -> Option<TaskCard> {
        for status in Status::ALL {
            let group = self.group_mut(status);
            if let Some(index) = group.iter().position(|card| card.id == id) {
                return Some(group.remove(index));
            }
        }
        None
    }

    pub fn find(&self, id: TaskId) -> Option<&TaskCard> {
        self.iter().find(|card| card.id == id)
    }

    /// Iterates over all cards in column order.
    pub fn iter(&self) -> impl Iterator<Item = &TaskCard> {
        self.todo
            .iter()
            .chain(self.in_progress.iter())
            .chain(self.done.iter())
    }

    pub fn len(&self) -> usize {
        self.todo.len() + self.in_progress.len() + self.done.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FromIterator<TaskCard> for GroupedTasks {
    fn from_iter<T: IntoIterator<Item = TaskCard>>(iter: T) -> Self {
        GroupedTasks::partition(iter)
    }
}
