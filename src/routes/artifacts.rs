use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::Value;

use crate::config::SUMMARY_FILE;
use crate::error::StorewatchError;
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct EnvironmentQuery {
    #[serde(default = "default_environment")]
    pub environment: String,
}

fn default_environment() -> String {
    "qa".to_string()
}

/// Environment names become path components; reject anything that could
/// escape the data directory.
fn sanitize(environment: &str) -> Result<&str, StorewatchError> {
    if environment.is_empty()
        || environment.contains('/')
        || environment.contains('\\')
        || environment.contains("..")
    {
        return Err(StorewatchError::InvalidInput(format!(
            "invalid environment name '{environment}'"
        )));
    }
    Ok(environment)
}

/// GET /api/results?environment=qa — the environment's summary, or JSON
/// null when no run has completed yet.
pub async fn get_results(
    State(state): State<SharedState>,
    Query(query): Query<EnvironmentQuery>,
) -> Result<impl IntoResponse, StorewatchError> {
    let environment = sanitize(&query.environment)?;
    let path = state
        .config
        .data_dir
        .join(environment)
        .join(SUMMARY_FILE);

    if !path.exists() {
        return Ok(Json(Value::Null));
    }
    let raw = tokio::fs::read_to_string(&path).await?;
    Ok(Json(serde_json::from_str(&raw)?))
}

/// GET /api/screenshots?environment=qa — failure screenshot file names,
/// sorted, for the dashboard gallery.
pub async fn list_screenshots(
    State(state): State<SharedState>,
    Query(query): Query<EnvironmentQuery>,
) -> Result<impl IntoResponse, StorewatchError> {
    let environment = sanitize(&query.environment)?;
    let pattern = state
        .config
        .data_dir
        .join(environment)
        .join("screenshots")
        .join("*.png");

    let mut names: Vec<String> = glob::glob(&pattern.to_string_lossy())
        .map_err(|e| StorewatchError::InvalidInput(e.to_string()))?
        .flatten()
        .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().to_string()))
        .collect();
    names.sort();

    Ok(Json(serde_json::json!({
        "environment": environment,
        "screenshots": names,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_rejects_traversal() {
        assert!(sanitize("qa").is_ok());
        assert!(sanitize("live").is_ok());
        assert!(sanitize("../secrets").is_err());
        assert!(sanitize("a/b").is_err());
        assert!(sanitize("a\\b").is_err());
        assert!(sanitize("").is_err());
    }
}
