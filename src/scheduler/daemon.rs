use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use super::jobs::{RunContext, Scheduler, Trigger, TriggerOutcome};
use crate::pipeline::BroadcastPipeline;

/// Spawn the single-flight worker and its interval producer.
///
/// Returns the scheduler handle used by the manual-trigger entry points.
pub fn spawn_broadcast_daemon(
    pipeline: Arc<BroadcastPipeline>,
    interval: Duration,
) -> (Scheduler, JoinHandle<()>) {
    let (scheduler, worker) = spawn_worker(pipeline);
    spawn_timer(scheduler.clone(), interval);
    (scheduler, worker)
}

/// Spawn only the queue consumer. The returned handle feeds its capacity-1
/// queue; exactly one `run_once` executes at a time.
pub fn spawn_worker(pipeline: Arc<BroadcastPipeline>) -> (Scheduler, JoinHandle<()>) {
    let (sender, receiver) = mpsc::channel(1);
    let worker = tokio::spawn(run_worker(pipeline, receiver));
    (Scheduler::new(sender), worker)
}

/// Spawn the fixed-interval producer. The first immediate tick is skipped;
/// ticks that land while a run is in flight are dropped, not queued up.
pub fn spawn_timer(scheduler: Scheduler, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

        // Skip first tick (immediate)
        timer.tick().await;

        loop {
            timer.tick().await;
            if scheduler.trigger(Trigger::Timer) == TriggerOutcome::Dropped {
                debug!("timer tick dropped, broadcast run already in flight");
            }
        }
    })
}

async fn run_worker(pipeline: Arc<BroadcastPipeline>, mut receiver: mpsc::Receiver<Trigger>) {
    while let Some(trigger) = receiver.recv().await {
        let run = RunContext::new(trigger);
        info!(run_id = %run.run_id, trigger = ?run.trigger, "broadcast run started");

        match pipeline.run_once(&run).await {
            Ok(report) => info!(
                run_id = %run.run_id,
                items_considered = report.items_considered,
                items_delivered = report.items_delivered,
                messages_sent = report.messages_sent,
                delivery_failures = report.delivery_failures,
                "broadcast run completed"
            ),
            // The loop must survive any run failure; the next trigger retries.
            Err(err) => error!(run_id = %run.run_id, error = format!("{err:#}"), "broadcast run failed"),
        }
    }
    info!("broadcast worker stopped");
}
