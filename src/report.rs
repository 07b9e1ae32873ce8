use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{COMBINED_REPORT_FILE, SUMMARY_FILE};
use crate::error::StorewatchError;
use crate::results::{NavigationTestResult, TestSummary};

pub fn write_summary(dir: &Path, summary: &TestSummary) -> Result<PathBuf, StorewatchError> {
    fs::create_dir_all(dir)?;
    let path = dir.join(SUMMARY_FILE);
    fs::write(&path, serde_json::to_vec_pretty(summary)?)?;
    Ok(path)
}

/// Persist one failed navigation attempt as its own JSON log. The index
/// keeps file names unique within a run.
pub fn write_failure_log(
    logs_dir: &Path,
    index: usize,
    result: &NavigationTestResult,
) -> Result<PathBuf, StorewatchError> {
    fs::create_dir_all(logs_dir)?;
    let path = logs_dir.join(format!("failure-{:04}-{}.json", index, slug(&result.link_name)));
    fs::write(&path, serde_json::to_vec_pretty(result)?)?;
    Ok(path)
}

/// Human-readable end-of-run summary for CLI output and worker logs.
pub fn render_text_summary(summary: &TestSummary) -> String {
    let mut out = String::new();
    out.push_str(&format!("Environment:  {}\n", summary.environment));
    out.push_str(&format!("Tested:       {}\n", summary.total_tested));
    out.push_str(&format!("Passed:       {}\n", summary.total_passed));
    out.push_str(&format!("Failed:       {}\n", summary.total_failed));
    out.push_str(&format!("Success rate: {}\n", summary.success_rate));
    if !summary.failures.is_empty() {
        out.push_str("Failures:\n");
        for failure in &summary.failures {
            out.push_str(&format!(
                "  - {} ({}): {}\n",
                failure.link_name,
                failure.link_url,
                failure.error.as_deref().unwrap_or("unknown reason"),
            ));
        }
    }
    out
}

/// One environment's section of the combined report.
pub fn render_environment_section(summary: &TestSummary) -> String {
    let mut rows = String::new();
    for result in &summary.results {
        let row_class = if result.passed { "pass" } else { "fail" };
        let marker = if result.passed { "\u{2713}" } else { "\u{2717}" };
        rows.push_str(&format!(
            "<tr class=\"{class}\"><td>{marker}</td><td>{name}</td><td>{url}</td><td>{ms} ms</td><td>{error}</td></tr>\n",
            class = row_class,
            marker = marker,
            name = escape_html(&result.link_name),
            url = escape_html(&result.link_url),
            ms = result.load_time_ms,
            error = escape_html(result.error.as_deref().unwrap_or("")),
        ));
    }

    format!(
        r#"<section class="environment">
<h2>{env}</h2>
<p class="counts">{passed} passed, {failed} failed ({total} total) — success rate {rate}</p>
<table>
<thead><tr><th></th><th>Link</th><th>URL</th><th>Load</th><th>Error</th></tr></thead>
<tbody>
{rows}</tbody>
</table>
</section>
"#,
        env = escape_html(&summary.environment),
        passed = summary.total_passed,
        failed = summary.total_failed,
        total = summary.total_tested,
        rate = escape_html(&summary.success_rate),
        rows = rows,
    )
}

/// Self-contained static page concatenating one section per environment.
pub fn render_combined_report(summaries: &[TestSummary]) -> String {
    let all_passed = summaries.iter().all(|s| s.total_failed == 0);
    let header_color = if all_passed { "#4CAF50" } else { "#f44336" };
    let status_text = if all_passed {
        "ALL ENVIRONMENTS HEALTHY"
    } else {
        "FAILURES DETECTED"
    };

    let sections: String = summaries.iter().map(render_environment_section).collect();

    format!(
        r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>Navigation Monitor — Combined Report</title>
<style>
body {{ font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, sans-serif; margin: 0; background: #f5f5f5; }}
.header {{ background: {header_color}; color: white; padding: 20px 30px; }}
.header h1 {{ margin: 0; font-size: 24px; }}
.content {{ max-width: 1000px; margin: 20px auto; padding: 0 20px; }}
.environment {{ background: white; border-radius: 6px; padding: 16px 20px; margin-bottom: 16px; }}
.environment h2 {{ margin: 0 0 4px 0; font-size: 18px; }}
.counts {{ color: #666; font-size: 14px; margin: 0 0 12px 0; }}
table {{ border-collapse: collapse; width: 100%; font-size: 13px; }}
th, td {{ text-align: left; padding: 4px 8px; border-bottom: 1px solid #eee; }}
tr.pass td:first-child {{ color: #4CAF50; }}
tr.fail td {{ color: #c62828; }}
tr.fail td:last-child {{ font-weight: bold; }}
</style>
</head>
<body>
<div class="header"><h1>{status_text}</h1></div>
<div class="content">
{sections}</div>
</body>
</html>"##,
        header_color = header_color,
        status_text = status_text,
        sections = sections,
    )
}

/// Collect every per-environment `summary.json` under `root` and, when more
/// than one environment has been run, write the combined HTML page.
pub fn write_combined_report(root: &Path) -> Result<Option<PathBuf>, StorewatchError> {
    let pattern = root.join("*").join(SUMMARY_FILE);
    let mut summaries = Vec::new();
    if let Ok(paths) = glob::glob(&pattern.to_string_lossy()) {
        for path in paths.flatten() {
            match fs::read_to_string(&path)
                .map_err(StorewatchError::from)
                .and_then(|raw| serde_json::from_str::<TestSummary>(&raw).map_err(Into::into))
            {
                Ok(summary) => summaries.push(summary),
                Err(e) => tracing::warn!("skipping unreadable summary {:?}: {}", path, e),
            }
        }
    }

    if summaries.len() < 2 {
        return Ok(None);
    }
    summaries.sort_by(|a, b| a.environment.cmp(&b.environment));

    let path = root.join(COMBINED_REPORT_FILE);
    fs::write(&path, render_combined_report(&summaries))?;
    Ok(Some(path))
}

pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn slug(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::{PageState, Viewport};
    use chrono::Utc;

    fn summary(env: &str, passed: usize, failed: usize) -> TestSummary {
        let mut results = Vec::new();
        for i in 0..passed + failed {
            results.push(NavigationTestResult {
                link_name: format!("Link {}", i),
                link_url: format!("/link-{}", i),
                timestamp: Utc::now(),
                passed: i < passed,
                load_time_ms: 100,
                screenshot: None,
                page_state: PageState::default(),
                viewport: Viewport {
                    width: 1366,
                    height: 900,
                },
                page_height: 1200,
                error: (i >= passed).then(|| "no product cards <found>".to_string()),
            });
        }
        TestSummary::from_results(env, Utc::now(), results)
    }

    #[test]
    fn escape_html_handles_special_chars() {
        assert_eq!(escape_html("a<b>&\"c'"), "a&lt;b&gt;&amp;&quot;c&#39;");
    }

    #[test]
    fn section_contains_counts_and_escaped_errors() {
        let section = render_environment_section(&summary("qa", 2, 1));
        assert!(section.contains("2 passed, 1 failed (3 total)"));
        assert!(section.contains("no product cards &lt;found&gt;"));
        assert!(!section.contains("<found>"));
    }

    #[test]
    fn combined_report_concatenates_environments() {
        let html = render_combined_report(&[summary("live", 3, 0), summary("qa", 1, 1)]);
        assert!(html.contains("<h2>live</h2>"));
        assert!(html.contains("<h2>qa</h2>"));
        assert!(html.contains("FAILURES DETECTED"));
    }

    #[test]
    fn combined_report_green_when_clean() {
        let html = render_combined_report(&[summary("qa", 2, 0)]);
        assert!(html.contains("ALL ENVIRONMENTS HEALTHY"));
    }

    #[test]
    fn combined_report_written_from_per_environment_summaries() {
        let dir = tempfile::tempdir().unwrap();
        write_summary(&dir.path().join("qa"), &summary("qa", 2, 1)).unwrap();
        write_summary(&dir.path().join("live"), &summary("live", 3, 0)).unwrap();

        let path = write_combined_report(dir.path())
            .unwrap()
            .expect("two environments must produce the combined page");
        let html = fs::read_to_string(&path).unwrap();
        // Sections are ordered by environment name.
        let live_pos = html.find("<h2>live</h2>").unwrap();
        let qa_pos = html.find("<h2>qa</h2>").unwrap();
        assert!(live_pos < qa_pos);
        assert!(html.contains("FAILURES DETECTED"));
    }

    #[test]
    fn combined_report_skipped_for_a_single_environment() {
        let dir = tempfile::tempdir().unwrap();
        write_summary(&dir.path().join("qa"), &summary("qa", 2, 0)).unwrap();

        assert_eq!(write_combined_report(dir.path()).unwrap(), None);
        assert!(!dir.path().join(COMBINED_REPORT_FILE).exists());
    }

    #[test]
    fn failure_log_name_is_indexed_and_slugged() {
        let dir = tempfile::tempdir().unwrap();
        let result = &summary("qa", 0, 1).failures[0];
        let path = write_failure_log(dir.path(), 7, result).unwrap();
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("failure-0007-link-0"), "{}", name);
    }

    #[test]
    fn text_summary_lists_failures() {
        let text = render_text_summary(&summary("qa", 1, 2));
        assert!(text.contains("Success rate: 33.3%"));
        assert!(text.contains("Failures:"));
    }
}
