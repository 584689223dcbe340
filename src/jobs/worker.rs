use anyhow::Result;
use chrono::Utc;
use std::{sync::Arc, time::Duration};
use tokio::{
    signal,
    task::JoinSet,
    time::{MissedTickBehavior, interval},
};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, error, info, info_span, warn};
use uuid::Uuid;

use crate::collector::CollectError;
use crate::jobs::{PassStatus, Updater};

/// Runs an update pass for every user at a fixed interval until shutdown.
pub struct UpdateSupervisor {
    updater: Arc<Updater>,
    interval: Duration,
    status: Arc<PassStatus>,
    shutdown_token: CancellationToken,
}

impl UpdateSupervisor {
    pub fn new(updater: Updater, interval: Duration, status: Arc<PassStatus>) -> Self {
        Self {
            updater: Arc::new(updater),
            interval,
            status,
            shutdown_token: CancellationToken::new(),
        }
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown_token.clone()
    }

    /// Start the supervisor. Returns after Ctrl-C once the running pass
    /// finished its in-flight fetches.
    pub async fn run(self) -> Result<()> {
        info!(
            "Starting update supervisor, interval: {}s",
            self.interval.as_secs()
        );

        let shutdown_token = self.shutdown_token.clone();
        tokio::spawn(async move {
            if let Err(e) = signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {}", e);
                return;
            }
            info!("Received shutdown signal, initiating graceful shutdown...");
            shutdown_token.cancel();
        });

        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.shutdown_token.cancelled() => {
                    info!("Supervisor shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    let pass_id = Uuid::new_v4();
                    if let Err(e) = self
                        .run_pass()
                        .instrument(info_span!("pass", id = %pass_id))
                        .await
                    {
                        error!("Update pass failed: {}", e);
                    }
                }
            }
        }

        Ok(())
    }

    /// Updates all users in parallel and records the outcome.
    pub async fn run_pass(&self) -> Result<usize> {
        let users = self.updater.users().list_users().await?;
        debug!("Updating {} users", users.len());

        let mut tasks = JoinSet::new();
        for user in users {
            let updater = self.updater.clone();
            let cancel = self.shutdown_token.clone();
            let span = info_span!("user", id = user.id);
            tasks.spawn(
                async move {
                    match updater.update_for_user(&user, &cancel).await {
                        Ok(delivered) => delivered,
                        Err(e) => {
                            if matches!(e.downcast_ref::<CollectError>(), Some(CollectError::NotLoggedIn)) {
                                info!("User {} is not logged in, skipping", user.id);
                            } else {
                                warn!("Update for user {} failed: {}", user.id, e);
                            }
                            0
                        }
                    }
                }
                .instrument(span),
            );
        }

        let mut delivered = 0;
        while let Some(result) = tasks.join_next().await {
            match result {
                Ok(count) => delivered += count,
                Err(e) if e.is_panic() => error!("User update panicked: {}", e),
                Err(e) => warn!("User update task failed: {}", e),
            }
        }

        self.status.record(Utc::now(), delivered);
        info!("Pass finished, {} entries delivered", delivered);
        Ok(delivered)
    }
}
