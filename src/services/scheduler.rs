use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio::time::{self, Duration, MissedTickBehavior};
use tracing::info;

/// A named unit of background work run on a fixed period.
#[async_trait]
pub trait RecurringJob: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    /// One tick. Failures are the job's to log; the next tick runs regardless.
    async fn run(&self);
}

/// Registry of recurring jobs, each driven by its own tokio task.
///
/// The first tick fires as soon as a job is scheduled. A tick that overruns
/// its period delays the next one instead of queueing the missed ticks.
#[derive(Default)]
pub struct Scheduler {
    jobs: Mutex<HashMap<&'static str, JoinHandle<()>>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start `job` unless a job with the same name is already running.
    /// Returns true when a new task was spawned.
    pub fn schedule(&self, job: Arc<dyn RecurringJob>, every: Duration) -> bool {
        let mut jobs = match self.jobs.lock() {
            Ok(jobs) => jobs,
            Err(poisoned) => poisoned.into_inner(),
        };
        let name = job.name();
        if jobs.get(name).is_some_and(|handle| !handle.is_finished()) {
            return false;
        }

        let handle = tokio::spawn(async move {
            let mut ticker = time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                job.run().await;
            }
        });
        jobs.insert(name, handle);
        info!("Scheduler: '{}' scheduled every {:?}", name, every);
        true
    }

    /// Cancel a job. Returns false when nothing was scheduled under `name`.
    pub fn unschedule(&self, name: &str) -> bool {
        let mut jobs = match self.jobs.lock() {
            Ok(jobs) => jobs,
            Err(poisoned) => poisoned.into_inner(),
        };
        match jobs.remove(name) {
            Some(handle) => {
                handle.abort();
                info!("Scheduler: '{}' unscheduled", name);
                true
            }
            None => false,
        }
    }

    pub fn is_scheduled(&self, name: &str) -> bool {
        let jobs = match self.jobs.lock() {
            Ok(jobs) => jobs,
            Err(poisoned) => poisoned.into_inner(),
        };
        jobs.get(name).is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        let jobs = match self.jobs.get_mut() {
            Ok(jobs) => jobs,
            Err(poisoned) => poisoned.into_inner(),
        };
        for (_, handle) in jobs.drain() {
            handle.abort();
        }
    }
}
