use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use floodgate_core::AppError;
use tracing::warn;

use crate::dispatch::dispatch_update;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::telegram_update::Update;

/// Accepts one update and acknowledges it immediately.
///
/// The update is routed inside the request, so each member's messages are
/// queued in arrival order. The rest of the work runs on its own task so a
/// slow platform call never delays the acknowledgement Telegram waits for.
pub async fn webhook_handler(
    State(state): State<AppState>,
    Path(secret): Path<String>,
    Json(update): Json<Update>,
) -> ApiResult<StatusCode> {
    if secret.as_str() != &*state.webhook_secret {
        warn!("webhook called with an unknown secret");
        return Err(ApiError(AppError::Forbidden(
            "unknown webhook path".to_owned(),
        )));
    }

    tokio::spawn(dispatch_update(state, update));
    Ok(StatusCode::OK)
}
