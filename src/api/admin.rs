use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use tracing::info;

use crate::app::AppState;
use crate::scheduler::{Trigger, TriggerOutcome};

#[derive(Debug, Serialize)]
struct TriggerResponse {
    status: &'static str,
}

/// 手動ブロードキャストの投入口。実行中のランがあれば409で弾く。
pub(crate) async fn trigger_broadcast(State(state): State<AppState>) -> impl IntoResponse {
    state.telemetry().record_manual_trigger();

    match state.scheduler().trigger(Trigger::Manual) {
        TriggerOutcome::Queued => {
            info!("manual broadcast run queued");
            (StatusCode::ACCEPTED, Json(TriggerResponse { status: "queued" })).into_response()
        }
        TriggerOutcome::Dropped => (
            StatusCode::CONFLICT,
            Json(TriggerResponse {
                status: "already_running",
            }),
        )
            .into_response(),
    }
}
