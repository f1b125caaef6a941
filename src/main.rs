use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use auto_messaging::{
    application::{
        handlers::{dispatch_scheduler::DispatchScheduler, message_dispatcher::MessageDispatcher},
        services::cache::MessageCache,
    },
    config::{Config, DatabaseConfig},
    domain::repositories::MessageRepository,
    infrastructure::{
        cache::{in_memory::InMemoryMessageCache, redis::RedisMessageCache},
        messaging::webhook::WebhookClient,
        repositories::{in_memory::InMemoryMessageRepository, postgres::PostgresMessageRepository},
    },
    presentation::http::{build_app, endpoints::root::ApiState},
};
use poem::{Server, listener::TcpListener};
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::try_parse()?;

    tracing_subscriber::fmt()
        .compact()
        .with_max_level(config.log_level)
        .init();

    let repo = build_repository(config.database.as_ref()).await?;
    let cache = build_cache(config.redis_url.as_deref()).await;
    let channel = WebhookClient::new(config.webhook.clone())?;

    let mut dispatcher = MessageDispatcher::new(repo.clone(), channel, config.dispatcher.clone());
    if let Some(cache) = &cache {
        dispatcher = dispatcher.with_cache(cache.clone());
    }
    let scheduler = Arc::new(DispatchScheduler::new(Arc::new(dispatcher)));
    if config.autostart {
        scheduler.start();
    }

    let state = Arc::new(ApiState::new(repo, cache, scheduler.clone()));
    let server_url = format!(
        "{}://{}:{}",
        config.server.scheme, config.server.host, config.server.port
    );
    info!(%server_url, "starting server");

    Server::new(TcpListener::bind(format!(
        "{}:{}",
        config.server.host, config.server.port
    )))
    .run_with_graceful_shutdown(
        build_app(state, &server_url),
        async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown requested");
        },
        Some(Duration::from_secs(10)),
    )
    .await?;

    scheduler.shutdown().await;
    Ok(())
}

async fn build_repository(
    database: Option<&DatabaseConfig>,
) -> anyhow::Result<Arc<dyn MessageRepository>> {
    let Some(database) = database else {
        warn!("DATABASE_URL is not set, messages are kept in memory only");
        return Ok(Arc::new(InMemoryMessageRepository::new()));
    };

    let pool = PgPoolOptions::new()
        .max_connections(database.max_connections)
        .connect(&database.url)
        .await
        .context("failed to connect to postgres")?;
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("failed to apply migrations")?;

    let repo: Arc<dyn MessageRepository> = PostgresMessageRepository::new(pool);
    Ok(repo)
}

async fn build_cache(redis_url: Option<&str>) -> Option<Arc<dyn MessageCache>> {
    let Some(url) = redis_url else {
        return Some(Arc::new(InMemoryMessageCache::new()));
    };
    match RedisMessageCache::connect(url).await {
        Ok(cache) => Some(cache as Arc<dyn MessageCache>),
        Err(err) => {
            warn!(error = ?err, "redis unavailable, delivery cache disabled");
            None
        }
    }
}
