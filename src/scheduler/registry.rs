//! Process-wide job registry.
//!
//! Maps a derived job key to a running cron job on the shared
//! [`JobScheduler`]. The map is the single piece of cross-cutting mutable
//! state in the process; every mutation happens under one lock hold so
//! stop-then-recreate sequences on the same key never interleave. Nothing
//! here is persisted, the entity `status` column is the durable mirror.

use std::collections::HashMap;

use anyhow::{Context, Result};
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// 注册表里一条任务的快照
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobHandle {
    pub job_id: Uuid,
    pub running: bool,
}

pub struct JobRegistry {
    scheduler: JobScheduler,
    jobs: Mutex<HashMap<String, JobHandle>>,
}

impl JobRegistry {
    pub async fn new() -> Result<Self> {
        let scheduler = JobScheduler::new()
            .await
            .context("Failed to create job scheduler")?;
        Ok(Self {
            scheduler,
            jobs: Mutex::new(HashMap::new()),
        })
    }

    /// Start firing registered jobs. Jobs added earlier stay idle until
    /// this call.
    pub async fn start(&self) -> Result<()> {
        self.scheduler
            .start()
            .await
            .context("Failed to start job scheduler")?;
        Ok(())
    }

    /// Stop the underlying scheduler; registered entries are left as-is.
    pub async fn shutdown(&self) -> Result<()> {
        self.scheduler
            .clone()
            .shutdown()
            .await
            .context("Failed to shut down job scheduler")?;
        Ok(())
    }

    /// Register `job` under `key`. A key can only hold one job at a time:
    /// a present entry is unscheduled and replaced, so re-registration is
    /// idempotent.
    pub async fn add(&self, key: &str, job: Job) -> Result<()> {
        let mut jobs = self.jobs.lock().await;

        if let Some(old) = jobs.remove(key) {
            warn!("Job {} already registered, replacing", key);
            if old.running {
                self.scheduler
                    .remove(&old.job_id)
                    .await
                    .with_context(|| format!("Failed to unschedule job {}", key))?;
            }
        }

        let job_id = self
            .scheduler
            .add(job)
            .await
            .with_context(|| format!("Failed to schedule job {}", key))?;
        jobs.insert(
            key.to_string(),
            JobHandle {
                job_id,
                running: true,
            },
        );

        info!("⏰ Job {} registered", key);
        Ok(())
    }

    pub async fn get(&self, key: &str) -> Option<JobHandle> {
        self.jobs.lock().await.get(key).copied()
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.jobs.lock().await.contains_key(key)
    }

    pub async fn len(&self) -> usize {
        self.jobs.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.lock().await.is_empty()
    }

    /// Halt future ticks but keep the bookkeeping entry. Absent key is a
    /// no-op.
    pub async fn stop(&self, key: &str) -> Result<()> {
        let mut jobs = self.jobs.lock().await;

        let Some(handle) = jobs.get_mut(key) else {
            debug!("Job {} not registered, nothing to stop", key);
            return Ok(());
        };
        if handle.running {
            self.scheduler
                .remove(&handle.job_id)
                .await
                .with_context(|| format!("Failed to unschedule job {}", key))?;
            handle.running = false;
            info!("⏸️ Job {} stopped", key);
        }
        Ok(())
    }

    /// Unschedule (if running) and discard the entry. Absent key is a no-op.
    pub async fn remove(&self, key: &str) -> Result<()> {
        let mut jobs = self.jobs.lock().await;

        let Some(handle) = jobs.remove(key) else {
            debug!("Job {} not registered, nothing to remove", key);
            return Ok(());
        };
        if handle.running {
            self.scheduler
                .remove(&handle.job_id)
                .await
                .with_context(|| format!("Failed to unschedule job {}", key))?;
        }
        info!("🗑️ Job {} removed", key);
        Ok(())
    }
}
