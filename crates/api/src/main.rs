use std::net::SocketAddr;
use std::sync::Arc;

use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tagvault_gitlab::{StaticTokenStore, TokenGatewayFactory};
use tagvault_worker::{ReleaseProcessor, RestPublisher, TaskQueue, TaskRunner, WorkerConfig};

mod config;
mod error;
mod routes;
mod state;

use config::ServerConfig;
use state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tagvault_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env();
    let worker_config = WorkerConfig::from_env();

    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = tagvault_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    tagvault_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tagvault_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // In-process task execution: the intake handler enqueues, the runner
    // drains. A standalone tagvault-worker deployment can take over by
    // polling the releases table instead.
    let (queue, receiver) = TaskQueue::new();
    let gateways = TokenGatewayFactory::new(
        worker_config.gitlab.clone(),
        StaticTokenStore::new(worker_config.gitlab_token.clone()),
    );
    let publisher =
        RestPublisher::new(&worker_config.publisher).expect("Failed to build publisher");
    let processor = ReleaseProcessor::new(pool.clone(), gateways, publisher);
    let runner = TaskRunner::new(processor, worker_config.gitlab.clone());
    tokio::spawn(async move { runner.run(receiver).await });

    let app_state = AppState {
        pool,
        queue,
        config: Arc::new(config.clone()),
    };

    let app = routes::router()
        .with_state(app_state)
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::new(config.host.parse().expect("Invalid HOST"), config.port);
    tracing::info!("Starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listen address");
    axum::serve(listener, app).await.expect("Server error");
}
