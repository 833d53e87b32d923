//! HTML rendering of the board, independent of any server.

use askama::Template;
use taskboard_core::{Status, TaskCard};

use crate::state::{BoardState, FetchState, Notification, NotificationKind};

struct CardView {
    id: i32,
    title: String,
    description: String,
    priority: &'static str,
    priority_label: &'static str,
    date: String,
}

impl From<&TaskCard> for CardView {
    fn from(card: &TaskCard) -> Self {
        CardView {
            id: card.id,
            title: card.title.clone(),
            description: card.description.clone().unwrap_or_default(),
            priority: card.priority.as_str(),
            priority_label: card.priority.label(),
            date: card.date.format("%b %-d, %Y").to_string(),
        }
    }
}

struct ColumnView {
    status: &'static str,
    label: &'static str,
    cards: Vec<CardView>,
}

struct NotificationView {
    id: u64,
    class: &'static str,
    message: String,
}

impl From<&Notification> for NotificationView {
    fn from(notification: &Notification) -> Self {
        NotificationView {
            id: notification.id,
            class: match notification.kind {
                NotificationKind::Info => "info",
                NotificationKind::Error => "error",
            },
            message: notification.message.clone(),
        }
    }
}

#[derive(Template)]
#[template(path = "board.html")]
struct BoardTemplate {
    columns: Vec<ColumnView>,
    loading: bool,
    error: Option<String>,
    notifications: Vec<NotificationView>,
}

impl BoardTemplate {
    fn new(state: &BoardState) -> Self {
        let columns = Status::ALL
            .into_iter()
            .map(|status| ColumnView {
                status: status.as_str(),
                label: status.label(),
                cards: state
                    .tasks_by_status(status)
                    .iter()
                    .map(CardView::from)
                    .collect(),
            })
            .collect();
        let error = match &state.fetch {
            FetchState::Errored(message) => Some(message.clone()),
            _ => None,
        };
        Self {
            columns,
            loading: state.fetch == FetchState::Loading && state.total_task_count() == 0,
            error,
            notifications: state.notifications.iter().map(NotificationView::from).collect(),
        }
    }
}

/// Renders the whole board: notifications, then either the loading state,
/// the connectivity error or the three status columns.
pub fn render_board(state: &BoardState) -> Result<String, askama::Error> {
    BoardTemplate::new(state).render()
}
