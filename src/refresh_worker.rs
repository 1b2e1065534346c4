// Background refresh: re-aggregate every interval on a schedule so "fetch all"
// requests are normally served from cache.
// Ticks come from a cron expression (UTC) or a fixed interval.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::agent_service::AgentService;
use crate::config::RefreshConfig;
use crate::models::Interval;
use tracing::{info, instrument, warn};

#[derive(Debug, Clone)]
pub struct RefreshWorkerConfig {
    pub schedule: Option<String>,
    pub interval_secs: u64,
}

impl From<&RefreshConfig> for RefreshWorkerConfig {
    fn from(c: &RefreshConfig) -> Self {
        Self {
            schedule: c.schedule.clone(),
            interval_secs: c.interval_secs,
        }
    }
}

/// Spawns the refresh worker. It exits when `shutdown_rx` fires or its sender is dropped.
pub fn spawn(
    service: Arc<AgentService>,
    config: RefreshWorkerConfig,
    shutdown_rx: tokio::sync::oneshot::Receiver<()>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        run(service, config, shutdown_rx).await;
    })
}

#[instrument(skip(service, shutdown_rx), fields(worker = "refresh"))]
async fn run(
    service: Arc<AgentService>,
    config: RefreshWorkerConfig,
    mut shutdown_rx: tokio::sync::oneshot::Receiver<()>,
) {
    let (tick_tx, mut tick_rx) = tokio::sync::mpsc::channel::<()>(1);
    let scheduler = tokio::spawn(tick_scheduler(config, tick_tx));

    loop {
        tokio::select! {
            tick = tick_rx.recv() => {
                if tick.is_none() {
                    warn!("refresh scheduler stopped; worker exiting");
                    break;
                }
                // A tick can run for minutes; shutdown must not wait for it.
                tokio::select! {
                    _ = run_one_tick(&service) => {}
                    _ = &mut shutdown_rx => {
                        info!("refresh worker shutting down mid-tick; run discarded");
                        break;
                    }
                }
            }
            _ = &mut shutdown_rx => {
                info!("refresh worker shutting down");
                break;
            }
        }
    }
    scheduler.abort();
}

/// Refreshes every interval once, sequentially. Failures are logged, not returned.
pub async fn run_one_tick(service: &AgentService) {
    for interval in Interval::ALL {
        match service.refresh(interval).await {
            Ok(entry) => info!(
                %interval,
                total_count = entry.result.total_count,
                success = entry.result.success,
                "refresh complete"
            ),
            Err(e) => warn!(%interval, error = %e, "refresh failed"),
        }
    }
}

/// Sends on `tx` at each refresh time.
async fn tick_scheduler(config: RefreshWorkerConfig, tx: tokio::sync::mpsc::Sender<()>) {
    if let Some(ref cron_str) = config.schedule {
        let Ok(schedule) = cron::Schedule::from_str(cron_str) else {
            warn!(cron = %cron_str, "invalid refresh schedule; refresh will not run");
            return;
        };
        loop {
            let now = chrono::Utc::now();
            let next = schedule.after(&now).next();
            if let Some(next) = next {
                let delay = (next - now).to_std().unwrap_or(Duration::from_secs(1));
                tokio::time::sleep(delay).await;
                if tx.send(()).await.is_err() {
                    break;
                }
            } else {
                tokio::time::sleep(Duration::from_secs(3600)).await;
            }
        }
    } else {
        let interval = Duration::from_secs(config.interval_secs.max(1));
        loop {
            tokio::time::sleep(interval).await;
            if tx.send(()).await.is_err() {
                break;
            }
        }
    }
}
