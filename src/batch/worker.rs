use chrono::Utc;
use serde::Serialize;
use std::fs;
use tracing::{info, warn};

use crate::batch::splitter::load_chunk;
use crate::browser::{BrowserSession, PageDriver};
use crate::config::RunChunkArgs;
use crate::error::StorewatchError;
use crate::flows::{run_printbox_flow, PrintboxTestResult};
use crate::region;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ChunkReport {
    chunk_id: usize,
    region: String,
    environment: String,
    total: usize,
    passed: usize,
    failed: usize,
    finished_at: chrono::DateTime<Utc>,
    results: Vec<PrintboxTestResult>,
}

/// Drive the designer flow over every link in one chunk file. Returns the
/// number of failed links; the caller turns that into an exit code.
pub async fn run_chunk(args: &RunChunkArgs) -> Result<usize, StorewatchError> {
    let region = region::by_code(&args.region)
        .ok_or_else(|| StorewatchError::UnknownRegion(args.region.clone()))?;
    let base_url = region.base_url(args.environment);

    let mut links = load_chunk(&args.chunk_file)?;
    if let (Some(start), Some(end)) = (args.start_index, args.end_index) {
        if start == 0 || start > end || end > links.len() {
            return Err(StorewatchError::InvalidInput(format!(
                "sub-slice {start}..={end} out of range for {} links",
                links.len()
            )));
        }
        links = links[start - 1..end].to_vec();
    }
    info!(
        "chunk {}: {} links against {}",
        args.chunk_id,
        links.len(),
        base_url
    );

    let session = BrowserSession::launch(true).await?;
    let mut driver = session.new_driver().await?;

    let mut results = Vec::with_capacity(links.len());
    for link in &links {
        // Chunk files may hold absolute URLs or bare paths.
        let url = if link.starts_with("http") {
            link.clone()
        } else {
            format!("{base_url}{link}")
        };
        let result = run_printbox_flow(&mut driver, &url).await;
        if !result.success {
            warn!(
                "designer flow failed for {} at {:?}",
                url,
                result.failure_point()
            );
        }
        results.push(result);
    }

    drop(driver);
    session.close().await?;

    let passed = results.iter().filter(|r| r.success).count();
    let failed = results.len() - passed;
    let report = ChunkReport {
        chunk_id: args.chunk_id,
        region: region.code.to_string(),
        environment: args.environment.to_string(),
        total: results.len(),
        passed,
        failed,
        finished_at: Utc::now(),
        results,
    };

    let out_dir = args.output_dir.join(format!("chunk-{}", args.chunk_id));
    fs::create_dir_all(&out_dir)?;
    fs::write(
        out_dir.join("results.json"),
        serde_json::to_vec_pretty(&report)?,
    )?;
    info!(
        "chunk {} done: {}/{} passed",
        args.chunk_id, passed, report.total
    );
    Ok(failed)
}
