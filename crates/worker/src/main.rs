use std::time::Duration;

use tagvault_db::repositories::ReleaseRepo;
use tagvault_gitlab::{StaticTokenStore, TokenGatewayFactory};
use tagvault_worker::{ReleaseProcessor, RestPublisher, WorkerConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tagvault_worker=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = WorkerConfig::from_env();

    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = tagvault_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tagvault_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database connection pool created");

    let gateways = TokenGatewayFactory::new(
        config.gitlab.clone(),
        StaticTokenStore::new(config.gitlab_token.clone()),
    );
    let publisher = RestPublisher::new(&config.publisher).expect("Failed to build publisher");
    let processor = ReleaseProcessor::new(pool.clone(), gateways, publisher);

    tracing::info!(
        interval_secs = config.poll_interval_secs,
        "Worker started, polling for received releases"
    );

    // Poll for releases awaiting their first attempt. FAILED releases
    // stay eligible for claiming but are only retried when explicitly
    // re-enqueued.
    loop {
        match ReleaseRepo::list_received(&pool, config.poll_batch_size).await {
            Ok(releases) => {
                for release in releases {
                    if let Err(e) = processor.process(&release.tag, release.project_id, false).await
                    {
                        tracing::error!(
                            release_id = release.id,
                            tag = %release.tag,
                            error = %e,
                            "Release processing failed"
                        );
                    }
                }
            }
            Err(e) => tracing::error!(error = %e, "Failed to poll for received releases"),
        }

        tokio::time::sleep(Duration::from_secs(config.poll_interval_secs)).await;
    }
}
