use async_trait::async_trait;
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use taskboard_core::{
    AssistTask, GroupedTasks, NewTask, Prioritization, PriorityUpdate, Status, Summary, Task,
    TaskId, TaskPatch, User,
};

/// Client-side API error.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The server could not be reached or the connection broke.
    #[error("Could not reach the server: {0}")]
    Network(#[from] reqwest::Error),
    /// The server answered with a non-success status.
    #[error("{message}")]
    Server {
        status: u16,
        code: Option<String>,
        message: String,
    },
    /// The server answered with a body this client does not understand.
    #[error("Unexpected response from the server: {0}")]
    Decode(String),
}

/// Body of every error response of the server.
#[derive(Deserialize)]
struct ErrorBody {
    error: String,
    message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

#[derive(Deserialize)]
struct BulkPriorityResponse {
    tasks: Vec<Task>,
}

/// Task operations of the REST API, scoped to the signed in user.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TaskApi: Send + Sync {
    async fn list_tasks(&self) -> Result<GroupedTasks, ApiError>;
    async fn create_task(&self, new_task: NewTask) -> Result<Task, ApiError>;
    async fn update_task(&self, id: TaskId, patch: TaskPatch) -> Result<Task, ApiError>;
    async fn set_status(&self, id: TaskId, status: Status) -> Result<Task, ApiError>;
    async fn delete_task(&self, id: TaskId) -> Result<(), ApiError>;
    /// Returns only the tasks the server actually updated.
    async fn bulk_set_priority(&self, updates: Vec<PriorityUpdate>) -> Result<Vec<Task>, ApiError>;
    async fn suggest_priorities(&self, tasks: Vec<AssistTask>) -> Result<Prioritization, ApiError>;
    async fn summarize(&self, tasks: Vec<AssistTask>) -> Result<Summary, ApiError>;
}

/// Account operations. The token returned by `login` is kept for later calls.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn register(&self, name: String, email: String, password: String) -> Result<User, ApiError>;
    async fn login(&self, email: String, password: String) -> Result<LoginResponse, ApiError>;
    fn set_token(&mut self, token: Option<String>);
}

/// [`TaskApi`] and [`AuthApi`] over HTTP with a bearer token.
#[derive(Debug, Clone)]
pub struct HttpTaskApi {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpTaskApi {
    /// `base_url` is the server origin, without the `/api` prefix.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .http
            .request(method, format!("{}/api{}", self.base_url, path));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send<T: DeserializeOwned>(builder: RequestBuilder) -> Result<T, ApiError> {
        let response = builder.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            let (code, message) = match serde_json::from_slice::<ErrorBody>(&bytes) {
                Ok(body) => (Some(body.error), body.message),
                Err(_) => (None, String::from_utf8_lossy(&bytes).into_owned()),
            };
            return Err(ApiError::Server {
                status: status.as_u16(),
                code,
                message,
            });
        }

        serde_json::from_slice(&bytes).map_err(|err| ApiError::Decode(err.to_string()))
    }
}

#[derive(Serialize)]
struct StatusRequest {
    status: Status,
}

#[derive(Serialize)]
struct BulkPriorityRequest {
    updates: Vec<PriorityUpdate>,
}

#[derive(Serialize)]
struct AssistRequest {
    tasks: Vec<AssistTask>,
}

#[derive(Serialize)]
struct RegisterRequest {
    name: String,
    email: String,
    password: String,
}

#[derive(Serialize)]
struct LoginRequest {
    email: String,
    password: String,
}

#[async_trait]
impl TaskApi for HttpTaskApi {
    async fn list_tasks(&self) -> Result<GroupedTasks, ApiError> {
        Self::send(self.request(Method::GET, "/tasks")).await
    }

    async fn create_task(&self, new_task: NewTask) -> Result<Task, ApiError> {
        Self::send(self.request(Method::POST, "/tasks").json(&new_task)).await
    }

    async fn update_task(&self, id: TaskId, patch: TaskPatch) -> Result<Task, ApiError> {
        Self::send(self.request(Method::PUT, &format!("/tasks/{}", id)).json(&patch)).await
    }

    async fn set_status(&self, id: TaskId, status: Status) -> Result<Task, ApiError> {
        let body = StatusRequest { status };
        Self::send(
            self.request(Method::PATCH, &format!("/tasks/{}/status", id))
                .json(&body),
        )
        .await
    }

    async fn delete_task(&self, id: TaskId) -> Result<(), ApiError> {
        Self::send::<serde_json::Value>(self.request(Method::DELETE, &format!("/tasks/{}", id)))
            .await
            .map(|_| ())
    }

    async fn bulk_set_priority(&self, updates: Vec<PriorityUpdate>) -> Result<Vec<Task>, ApiError> {
        let body = BulkPriorityRequest { updates };
        let response: BulkPriorityResponse =
            Self::send(self.request(Method::POST, "/tasks/bulk-priority").json(&body)).await?;
        Ok(response.tasks)
    }

    async fn suggest_priorities(&self, tasks: Vec<AssistTask>) -> Result<Prioritization, ApiError> {
        let body = AssistRequest { tasks };
        Self::send(self.request(Method::POST, "/assist/prioritize").json(&body)).await
    }

    async fn summarize(&self, tasks: Vec<AssistTask>) -> Result<Summary, ApiError> {
        let body = AssistRequest { tasks };
        Self::send(self.request(Method::POST, "/assist/summarize").json(&body)).await
    }
}

#[async_trait]
impl AuthApi for HttpTaskApi {
    async fn register(&self, name: String, email: String, password: String) -> Result<User, ApiError> {
        let body = RegisterRequest {
            name,
            email,
            password,
        };
        Self::send(self.request(Method::POST, "/auth/register").json(&body)).await
    }

    async fn login(&self, email: String, password: String) -> Result<LoginResponse, ApiError> {
        let body = LoginRequest { email, password };
        Self::send(self.request(Method::POST, "/auth/login").json(&body)).await
    }

    fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }
}
