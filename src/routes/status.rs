use axum::extract::State;
use axum::Json;

use crate::progress::{ProgressData, ProgressTracker};
use crate::state::SharedState;

/// GET /api/status — current progress snapshot, idle when no run has
/// ever written one.
pub async fn get_status(State(state): State<SharedState>) -> Json<ProgressData> {
    let tracker = ProgressTracker::new(&state.config.data_dir);
    Json(tracker.read_or_idle())
}
