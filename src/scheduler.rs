use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

/// Shortest period a [`RecurringTask`] accepts.
pub const MIN_PERIOD: Duration = Duration::from_millis(1);

/// A job that re-runs on a fixed period until its handle is stopped or dropped.
///
/// Ticks never overlap: the next run starts only after the previous one has
/// finished, and missed ticks are delayed rather than bunched up.
pub struct RecurringTask {
    name: &'static str,
    period: Duration,
    handle: Option<JoinHandle<()>>,
}

impl RecurringTask {
    /// Spawns the job on the current tokio runtime. With `run_immediately`
    /// the first run happens right away, otherwise after one full period.
    pub fn start<F, Fut>(name: &'static str, period: Duration, run_immediately: bool, job: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        // tokio intervals panic on a zero period
        let period = if period < MIN_PERIOD {
            log::warn!("Recurring task '{}' period {:?} raised to {:?}", name, period, MIN_PERIOD);
            MIN_PERIOD
        } else {
            period
        };
        log::info!("Starting recurring task '{}' every {:?}", name, period);
        let handle = tokio::spawn(async move {
            let first = if run_immediately { Instant::now() } else { Instant::now() + period };
            let mut ticker = time::interval_at(first, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                log::debug!("Recurring task '{}' tick", name);
                job().await;
            }
        });
        Self { name, period, handle: Some(handle) }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().map(|h| !h.is_finished()).unwrap_or(false)
    }

    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            log::info!("Stopping recurring task '{}'", self.name);
            handle.abort();
        }
    }
}

impl Drop for RecurringTask {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Runs `job` once after `delay`. The returned handle may be awaited or ignored.
pub fn run_after<Fut>(delay: Duration, job: Fut) -> JoinHandle<()>
where
    Fut: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        time::sleep(delay).await;
        job.await;
    })
}
