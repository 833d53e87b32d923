use axum::Router;
use axum::extract::MatchedPath;
use axum::http::{HeaderValue, header};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::sensitive_headers::SetSensitiveRequestHeadersLayer;
use tower_http::trace::{MakeSpan, TraceLayer};
use tracing::Span;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::assist::{self, AssistState, CompletionService};
use crate::auth::AuthState;
use crate::config::Config;
use crate::task::TaskState;

pub mod api;
pub mod error;

#[tracing::instrument(skip(config))]
pub async fn start_web_server(config: Config) -> anyhow::Result<()> {
    let server_address = format!("0.0.0.0:{}", &config.port);
    let listener = tokio::net::TcpListener::bind(&server_address).await?;
    tracing::info!("Web server running on http://{}", server_address);

    let db = Database::connect(&config.db_url).await?;
    migration::Migrator::up(&db, None).await?;
    tracing::info!("Database migrations applied successfully");

    let completion = assist::completion_service_from_config(&config);
    let app = create_app(&config, Arc::new(db), completion);

    axum::serve(listener, app).await?;
    Ok(())
}

/// Builds the whole application: health check, JSON API and its documentation.
pub fn create_app(
    config: &Config,
    db: Arc<DatabaseConnection>,
    completion: Arc<dyn CompletionService>,
) -> Router {
    let auth_state = Arc::new(AuthState::new(db.clone(), config.jwt_secret.clone()));
    let task_state = Arc::new(TaskState { db });
    let assist_state = AssistState { completion };

    Router::new()
        .route("/health", axum::routing::get(health_check_handler))
        .merge(api::create_api_router(auth_state, task_state, assist_state))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api::ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(SetSensitiveRequestHeadersLayer::new([header::AUTHORIZATION]))
                .layer(TraceLayer::new_for_http().make_span_with(FilteredMakeSpan))
                .layer(cors_layer(config.frontend_url.as_deref())),
        )
}

fn cors_layer(frontend_url: Option<&str>) -> CorsLayer {
    let origin = match frontend_url.map(HeaderValue::from_str) {
        Some(Ok(origin)) => AllowOrigin::exact(origin),
        Some(Err(err)) => {
            tracing::warn!("Ignoring invalid FRONTEND_URL: {}", err);
            AllowOrigin::any()
        }
        None => AllowOrigin::any(),
    };
    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

#[tracing::instrument]
pub async fn health_check_handler() -> &'static str {
    "OK"
}

/// Span maker that keeps credentials of auth requests out of the logs.
#[derive(Clone, Debug)]
pub struct FilteredMakeSpan;

impl<B> MakeSpan<B> for FilteredMakeSpan {
    fn make_span(&mut self, request: &axum::http::Request<B>) -> Span {
        let uri = request.uri();
        let method = request.method();
        let matched_path = request
            .extensions()
            .get::<MatchedPath>()
            .map(MatchedPath::as_str);

        if uri.path().starts_with("/api/auth/") {
            tracing::info_span!(
                "request",
                method = %method,
                uri = %uri,
                matched_path,
                sensitive_route = true,
            )
        } else {
            tracing::info_span!(
                "request",
                method = %method,
                uri = %uri,
                matched_path,
            )
        }
    }
}
