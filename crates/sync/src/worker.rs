//! Background worker for periodic refreshes.

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use barterhub_infra::LedgerReader;

use crate::class::DataClass;
use crate::scheduler::RefreshScheduler;

/// Handle to stop a running [`RefreshWorker`]. Dropping it also stops the
/// class tasks, without waiting for them.
#[derive(Debug)]
pub struct WorkerHandle {
    shutdown: watch::Sender<bool>,
    tasks: Vec<(DataClass, JoinHandle<()>)>,
}

impl WorkerHandle {
    /// Request graceful shutdown and wait for every class task to stop.
    ///
    /// A refresh still in flight is abandoned; nothing it fetched is applied.
    pub async fn shutdown(self) {
        self.shutdown.send_replace(true);
        for (class, task) in self.tasks {
            if let Err(e) = task.await {
                tracing::warn!(class = %class, error = %e, "refresh task ended abnormally");
            }
        }
        tracing::info!("refresh worker stopped");
    }
}

/// Refreshes each data class on its own timer, in its own task.
///
/// A slow class never delays another one. Ticks missed while a class is
/// refreshing are skipped rather than replayed.
pub struct RefreshWorker<L> {
    scheduler: RefreshScheduler<L>,
}

impl<L> RefreshWorker<L>
where
    L: LedgerReader + 'static,
{
    pub fn new(scheduler: RefreshScheduler<L>) -> Self {
        Self { scheduler }
    }

    /// Spawn the worker. Every class refreshes once right away.
    pub fn start(self) -> WorkerHandle {
        let (shutdown, _) = watch::channel(false);
        let intervals = self.scheduler.intervals();
        tracing::info!(
            inventory = ?intervals.timer_period(DataClass::Inventory),
            membership = ?intervals.timer_period(DataClass::Membership),
            collectibles = ?intervals.timer_period(DataClass::Collectibles),
            "refresh worker started"
        );

        let tasks = DataClass::ALL
            .into_iter()
            .map(|class| {
                let task = tokio::spawn(refresh_loop(self.scheduler.clone(), class, shutdown.subscribe()));
                (class, task)
            })
            .collect();

        WorkerHandle { shutdown, tasks }
    }
}

async fn refresh_loop<L>(scheduler: RefreshScheduler<L>, class: DataClass, mut shutdown: watch::Receiver<bool>)
where
    L: LedgerReader + 'static,
{
    let mut timer = interval(scheduler.intervals().timer_period(class));
    timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

    while !*shutdown.borrow() {
        let result = tokio::select! {
            _ = shutdown.changed() => break,
            result = async {
                timer.tick().await;
                scheduler.refresh_class(class).await
            } => result,
        };

        match result {
            Ok(report) if !report.discarded.is_empty() => {
                tracing::debug!(class = %class, "periodic refresh discarded");
            }
            Ok(_) => {}
            Err(e) => tracing::warn!(class = %class, error = %e, "periodic refresh failed"),
        }
    }

    tracing::debug!(class = %class, "refresh task stopped");
}
