use anyhow::Result;
use cookiefun::*;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    let app_config = config::AppConfig::load()?;
    tracing::debug!(config = ?app_config, "config loaded");

    let client: Arc<dyn cookie_client::AgentSource> =
        Arc::new(cookie_client::CookieClient::connect(&app_config.upstream)?);
    let cache: Arc<dyn cache_store::CacheStore> =
        Arc::new(cache_store::FileCacheStore::open(&app_config.cache.dir)?);
    let page_delay = Duration::from_millis(app_config.aggregation.page_delay_ms);
    let limiter: Arc<dyn aggregator::RateLimiter> = if app_config.aggregation.burst > 1 {
        Arc::new(aggregator::TokenBucket::new(
            app_config.aggregation.burst,
            page_delay,
        ))
    } else {
        Arc::new(aggregator::FixedDelay(page_delay))
    };
    let aggregator = aggregator::Aggregator::new(
        client.clone(),
        limiter,
        aggregator::AggregatorConfig::from(&app_config.aggregation),
    );
    let service = Arc::new(agent_service::AgentService::new(
        client,
        aggregator,
        cache,
        cache_store::FreshnessPolicy::from(&app_config.cache),
        Duration::from_secs(app_config.aggregation.run_timeout_secs),
    ));

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let refresh_handle = if app_config.refresh.enabled {
        tracing::info!(
            schedule = ?app_config.refresh.schedule,
            interval_secs = app_config.refresh.interval_secs,
            "refresh worker enabled"
        );
        Some(refresh_worker::spawn(
            service.clone(),
            refresh_worker::RefreshWorkerConfig::from(&app_config.refresh),
            shutdown_rx,
        ))
    } else {
        None
    };

    let app = routes::app(service);
    let addr = format!("{}:{}", app_config.server.host, app_config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);

    tokio::select! {
        result = axum::serve(listener, app) => {
            result?;
        }
        _ = shutdown_signal() => {
            tracing::info!("Received shutdown signal");
            let _ = shutdown_tx.send(());
            if let Some(handle) = refresh_handle {
                let _ = handle.await;
            }
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(s) => s,
                Err(_) => {
                    let _ = tokio::signal::ctrl_c().await;
                    return;
                }
            };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
