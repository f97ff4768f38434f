pub mod daemon;
pub mod jobs;

pub use daemon::{spawn_broadcast_daemon, spawn_timer, spawn_worker};
pub use jobs::{RunContext, Scheduler, Trigger, TriggerOutcome};
