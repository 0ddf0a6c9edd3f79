//! Periodic task scheduler
//!
//! A simple scheduler for running background tasks at regular intervals.
//! Add new tasks by implementing the `PeriodicTask` trait.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;

use super::reminders::{ReminderStatus, ReminderSweep};

/// Trait for periodic background tasks
#[async_trait]
pub trait PeriodicTask: Send + Sync {
    /// Task name for logging
    fn name(&self) -> &'static str;

    /// How often to run (e.g., every 1 hour)
    fn interval(&self) -> Duration;

    /// Execute the task
    async fn run(&self) -> anyhow::Result<()>;
}

/// Start all periodic tasks
pub fn start_scheduler(tasks: Vec<Box<dyn PeriodicTask>>) {
    if tasks.is_empty() {
        return;
    }

    for task in tasks {
        tokio::spawn(async move {
            run_task(task).await;
        });
    }

    tracing::info!("Periodic task scheduler started");
}

/// Run a single task on its interval
async fn run_task(task: Box<dyn PeriodicTask>) {
    let mut ticker = interval(task.interval());

    // Skip the first immediate tick
    ticker.tick().await;

    loop {
        ticker.tick().await;

        tracing::debug!(task = task.name(), "Running periodic task");

        match task.run().await {
            Ok(()) => {
                tracing::debug!(task = task.name(), "Periodic task completed");
            }
            Err(e) => {
                tracing::error!(task = task.name(), error = %e, "Periodic task failed");
            }
        }
    }
}

// ============================================================================
// Medication Reminder Task
// ============================================================================

/// Runs the medication reminder sweep
pub struct MedicationReminderTask {
    sweep: Arc<ReminderSweep>,
    every: Duration,
}

impl MedicationReminderTask {
    pub fn new(sweep: Arc<ReminderSweep>, every: Duration) -> Self {
        Self { sweep, every }
    }
}

#[async_trait]
impl PeriodicTask for MedicationReminderTask {
    fn name(&self) -> &'static str {
        "medication_reminders"
    }

    fn interval(&self) -> Duration {
        self.every
    }

    async fn run(&self) -> anyhow::Result<()> {
        let report = self.sweep.run().await?;

        let failed = report
            .results
            .iter()
            .filter(|r| r.status == ReminderStatus::Failed)
            .count();
        if failed > 0 {
            tracing::warn!(failed, "Some medication reminders could not be delivered");
        }

        Ok(())
    }
}
