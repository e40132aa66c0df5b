use std::sync::Arc;

use axum::Router;
use axum::extract::MatchedPath;
use migration::MigratorTrait;
use sea_orm::Database;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::{MakeSpan, TraceLayer};
use tracing::Span;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::Config;
use crate::events::{EventBridgeBus, EventBusNotifier, LoggingNotifier, TaskNotifier};
use crate::task::api::TaskState;
use crate::task::seed::load_sample_tasks;
use crate::task::{SeaOrmTaskRepository, TaskRepository, TaskService};

pub mod api;
pub mod openapi;

#[tracing::instrument(skip(config))]
pub async fn start_web_server(config: Config) -> anyhow::Result<()> {
    let server_address = format!("0.0.0.0:{}", &config.port);
    let listener = tokio::net::TcpListener::bind(&server_address).await?;
    tracing::info!("Web server running on http://{}", server_address);

    let db = Database::connect(&config.db_url).await?;
    migration::Migrator::up(&db, None).await?;
    tracing::info!("Database migrations applied successfully");

    let repository: Arc<dyn TaskRepository> = Arc::new(SeaOrmTaskRepository::new(db));
    if config.seed_sample_data {
        load_sample_tasks(repository.as_ref()).await?;
    }

    let notifier = create_notifier(&config).await;
    let task_state = Arc::new(TaskState {
        service: TaskService::new(repository, notifier),
    });

    let app = create_app(task_state, config.port);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn create_notifier(config: &Config) -> Arc<dyn TaskNotifier> {
    if !config.events_enabled {
        tracing::warn!("Event delivery is disabled; completed tasks will only be logged");
        return Arc::new(LoggingNotifier);
    }

    let bus = EventBridgeBus::connect(config.aws_region.clone(), config.event_bus_name.clone()).await;
    tracing::info!(
        "Publishing task events to EventBridge bus {} in {}",
        config.event_bus_name.as_deref().unwrap_or("default"),
        config.aws_region
    );
    Arc::new(EventBusNotifier::new(bus))
}

/// Assembles the full application: health check, JSON API, Swagger UI and
/// the request tracing and CORS layers.
pub fn create_app(task_state: Arc<TaskState>, port: u16) -> Router {
    Router::new()
        .route("/health", axum::routing::get(health_check_handler))
        .merge(api::create_api_router(task_state))
        .merge(
            SwaggerUi::new("/swagger-ui")
                .url("/api-docs/openapi.json", openapi::openapi_document(port)),
        )
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http().make_span_with(RequestMakeSpan))
                .layer(CorsLayer::permissive()),
        )
}

#[tracing::instrument]
pub async fn health_check_handler() -> &'static str {
    "OK"
}

/// Span maker that records the method, the full URI including the query
/// string, and the matched route of every request.
#[derive(Clone, Debug)]
pub struct RequestMakeSpan;

impl<B> MakeSpan<B> for RequestMakeSpan {
    fn make_span(&mut self, request: &axum::http::Request<B>) -> Span {
        let matched_path = request
            .extensions()
            .get::<MatchedPath>()
            .map(MatchedPath::as_str);

        tracing::info_span!(
            "request",
            method = %request.method(),
            uri = %request.uri(),
            matched_path,
        )
    }
}
