use std::sync::Arc;

use axum::{
    Router,
    middleware::{from_fn, from_fn_with_state},
};
use tower::ServiceBuilder;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::assist::{self, AssistState};
use crate::auth::{self, AuthState, auth_user_middleware, require_auth_middleware};
use crate::task::{self, TaskState};

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::api::register_handler,
        auth::api::login_handler,
        task::api::create_task_handler,
        task::api::get_tasks_handler,
        task::api::get_task_handler,
        task::api::update_task_handler,
        task::api::set_status_handler,
        task::api::delete_task_handler,
        task::api::bulk_priority_handler,
        assist::api::summarize_handler,
        assist::api::prioritize_handler,
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Registration and login"),
        (name = "Tasks", description = "Task board of the authenticated user"),
        (name = "Assist", description = "Advisory AI summaries and priorities")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

/// Creates the JSON API under `/api`. Everything but the auth routes requires a bearer token.
pub fn create_api_router(
    auth_state: Arc<AuthState>,
    task_state: Arc<TaskState>,
    assist_state: AssistState,
) -> Router {
    let public_routes = auth::api::create_api_router(auth_state.clone());
    let protected_routes = task::api::create_api_router(task_state)
        .merge(assist::api::create_api_router(assist_state))
        .layer(ServiceBuilder::new().layer(from_fn(require_auth_middleware)));
    let api_routes = public_routes.merge(protected_routes);
    Router::new()
        .nest("/api", api_routes)
        .layer(ServiceBuilder::new().layer(from_fn_with_state(auth_state, auth_user_middleware)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_document_lists_every_route() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&str> = doc.paths.paths.keys().map(String::as_str).collect();

        assert_eq!(
            paths,
            vec![
                "/api/assist/prioritize",
                "/api/assist/summarize",
                "/api/auth/login",
                "/api/auth/register",
                "/api/tasks",
                "/api/tasks/bulk-priority",
                "/api/tasks/{id}",
                "/api/tasks/{id}/status",
            ]
        );
        assert!(
            doc.components
                .as_ref()
                .is_some_and(|components| components.security_schemes.contains_key("bearer"))
        );
    }
}
