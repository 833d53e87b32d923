//! Client side of the task board: an HTTP API client, a typed state store
//! driven by pure reducers, and server-independent HTML rendering.

pub mod api;
pub mod auth;
pub mod state;
pub mod store;
pub mod ui;

pub use api::{ApiError, AuthApi, HttpTaskApi, LoginResponse, TaskApi};
pub use auth::{AuthAction, AuthState};
pub use state::{Action, BoardState, FetchState, Notification, NotificationKind, RequestState};
pub use store::{PriorityReview, Store};
