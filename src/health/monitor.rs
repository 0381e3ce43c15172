//! Background availability refresh.
//!
//! Runs `check_all` on a fixed interval so the last-known availability
//! flags recover even when nobody calls `/health`.

use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time;

use crate::config::HealthConfig;
use crate::health::aggregator::HealthAggregator;

pub struct HealthMonitor {
    aggregator: HealthAggregator,
    config: HealthConfig,
}

impl HealthMonitor {
    pub fn new(aggregator: HealthAggregator, config: HealthConfig) -> Self {
        Self { aggregator, config }
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        if !self.config.refresh_enabled {
            tracing::info!("Background health refresh disabled");
            return;
        }

        tracing::info!(
            interval = self.config.refresh_interval_secs,
            "Health monitor starting"
        );

        let mut ticker = time::interval(Duration::from_secs(self.config.refresh_interval_secs));
        ticker.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let report = self.aggregator.check_all().await;
                    if !report.is_healthy() {
                        tracing::warn!(status = report.status.as_str(), "Backends not healthy");
                    }
                }
                _ = shutdown.recv() => {
                    tracing::info!("Health monitor received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}
