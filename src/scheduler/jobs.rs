use tokio::sync::mpsc;
use uuid::Uuid;

/// パイプラインを起動するトリガー源。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Fixed-interval tick.
    Timer,
    /// Privileged command or control-plane request.
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// Accepted into the single-slot queue.
    Queued,
    /// A run is in flight and the slot is taken; the trigger is discarded.
    Dropped,
}

/// 1回の実行コンテキスト。ログ相関用のidとトリガー源を持つ。
#[derive(Debug, Clone, Copy)]
pub struct RunContext {
    pub run_id: Uuid,
    pub trigger: Trigger,
}

impl RunContext {
    #[must_use]
    pub fn new(trigger: Trigger) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            trigger,
        }
    }
}

/// 単一フライトのトリガーキューへのハンドル。
///
/// タイマーデーモンとコマンド層の両方がここを通る。キュー容量は1なので、
/// 実行中+保留1を超えるトリガーは重ねて実行されず破棄される。
#[derive(Clone)]
pub struct Scheduler {
    sender: mpsc::Sender<Trigger>,
}

impl Scheduler {
    pub(crate) fn new(sender: mpsc::Sender<Trigger>) -> Self {
        Self { sender }
    }

    /// Request a run. Never blocks; a full queue reports `Dropped`.
    #[must_use]
    pub fn trigger(&self, trigger: Trigger) -> TriggerOutcome {
        match self.sender.try_send(trigger) {
            Ok(()) => TriggerOutcome::Queued,
            Err(_) => TriggerOutcome::Dropped,
        }
    }
}
