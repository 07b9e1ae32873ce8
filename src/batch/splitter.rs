use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::info;

use crate::config::{CHUNK_FILE_PREFIX, CHUNK_MANIFEST_FILE};
use crate::error::StorewatchError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkInfo {
    pub chunk_id: usize,
    pub file: String,
    /// 1-based index of the chunk's first link within the full list.
    pub start_index: usize,
    /// 1-based index of the chunk's last link, inclusive.
    pub end_index: usize,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkManifest {
    pub total_links: usize,
    pub chunk_count: usize,
    pub chunk_size: usize,
    pub chunks: Vec<ChunkInfo>,
    pub generated_at: DateTime<Utc>,
}

/// Split a JSON array of URL strings into `chunk_count` chunk files plus a
/// manifest. A leading `"link"` header element, an export artifact of the
/// source sheet, is discarded. The last chunk absorbs the remainder.
pub fn split_links(
    input: &Path,
    out_dir: &Path,
    chunk_count: usize,
) -> Result<ChunkManifest, StorewatchError> {
    if chunk_count == 0 {
        return Err(StorewatchError::InvalidInput(
            "chunk count must be at least 1".to_string(),
        ));
    }

    let raw = fs::read_to_string(input)?;
    let values: Vec<Value> = serde_json::from_str(&raw)?;
    let mut links = Vec::with_capacity(values.len());
    for (i, value) in values.into_iter().enumerate() {
        match value.as_str() {
            // The export header only ever appears as the first element;
            // a "link" URL later in the list is a real entry.
            Some("link") if i == 0 => continue,
            Some(s) => links.push(s.to_string()),
            None => {
                return Err(StorewatchError::InvalidInput(format!(
                    "element {i} in {} is not a string: {value}",
                    input.display()
                )))
            }
        }
    }

    if links.is_empty() {
        return Err(StorewatchError::InvalidInput(format!(
            "no links found in {}",
            input.display()
        )));
    }

    fs::create_dir_all(out_dir)?;

    let total = links.len();
    let chunk_size = (total + chunk_count - 1) / chunk_count;
    let mut chunks = Vec::new();

    for (i, slice) in links.chunks(chunk_size).enumerate() {
        let chunk_id = i + 1;
        let file_name = format!("{CHUNK_FILE_PREFIX}{chunk_id}.json");
        fs::write(
            out_dir.join(&file_name),
            serde_json::to_vec_pretty(slice)?,
        )?;

        let start_index = i * chunk_size + 1;
        chunks.push(ChunkInfo {
            chunk_id,
            file: file_name,
            start_index,
            end_index: start_index + slice.len() - 1,
            count: slice.len(),
        });
    }

    let manifest = ChunkManifest {
        total_links: total,
        chunk_count: chunks.len(),
        chunk_size,
        chunks,
        generated_at: Utc::now(),
    };
    fs::write(
        out_dir.join(CHUNK_MANIFEST_FILE),
        serde_json::to_vec_pretty(&manifest)?,
    )?;
    info!(
        "split {} links into {} chunks of up to {}",
        total, manifest.chunk_count, chunk_size
    );
    Ok(manifest)
}

/// Load one chunk file back into a link list.
pub fn load_chunk(path: &Path) -> Result<Vec<String>, StorewatchError> {
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_input(dir: &Path, links: usize, with_header: bool) -> std::path::PathBuf {
        let mut values: Vec<String> = Vec::new();
        if with_header {
            values.push("link".to_string());
        }
        values.extend((0..links).map(|i| format!("https://www.printshop.co.uk/p/{i}")));
        let path = dir.join("final.json");
        fs::write(&path, serde_json::to_vec(&values).unwrap()).unwrap();
        path
    }

    #[test]
    fn splits_evenly_with_remainder_in_last_chunk() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(dir.path(), 4995, true);
        let manifest = split_links(&input, dir.path(), 10).unwrap();

        assert_eq!(manifest.total_links, 4995);
        assert_eq!(manifest.chunk_count, 10);
        assert_eq!(manifest.chunk_size, 500);
        for chunk in &manifest.chunks[..9] {
            assert_eq!(chunk.count, 500);
        }
        assert_eq!(manifest.chunks[9].count, 495);
        let sum: usize = manifest.chunks.iter().map(|c| c.count).sum();
        assert_eq!(sum, 4995);
    }

    #[test]
    fn manifest_indices_are_one_based_and_contiguous() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(dir.path(), 23, false);
        let manifest = split_links(&input, dir.path(), 4).unwrap();

        assert_eq!(manifest.chunks[0].start_index, 1);
        for pair in manifest.chunks.windows(2) {
            assert_eq!(pair[1].start_index, pair[0].end_index + 1);
            assert_eq!(pair[1].chunk_id, pair[0].chunk_id + 1);
        }
        assert_eq!(manifest.chunks.last().unwrap().end_index, 23);
    }

    #[test]
    fn chunk_files_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(dir.path(), 7, true);
        let manifest = split_links(&input, dir.path(), 3).unwrap();

        let first = load_chunk(&dir.path().join(&manifest.chunks[0].file)).unwrap();
        assert_eq!(first.len(), manifest.chunks[0].count);
        assert!(first[0].starts_with("https://"));
        assert!(!first.contains(&"link".to_string()));
    }

    #[test]
    fn rejects_empty_input_and_zero_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("final.json");
        fs::write(&input, b"[\"link\"]").unwrap();
        assert!(split_links(&input, dir.path(), 10).is_err());
        assert!(split_links(&input, dir.path(), 0).is_err());
    }

    #[test]
    fn header_is_only_stripped_from_the_front() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("final.json");
        fs::write(
            &input,
            serde_json::to_vec(&["link", "https://www.printshop.co.uk/p/0", "link"]).unwrap(),
        )
        .unwrap();

        let manifest = split_links(&input, dir.path(), 1).unwrap();
        assert_eq!(manifest.total_links, 2);
        let chunk = load_chunk(&dir.path().join(&manifest.chunks[0].file)).unwrap();
        assert_eq!(chunk, vec!["https://www.printshop.co.uk/p/0", "link"]);
    }

    #[test]
    fn rejects_non_string_entries() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("final.json");
        fs::write(&input, b"[\"link\", \"https://www.printshop.co.uk/p/0\", 7]").unwrap();

        let err = split_links(&input, dir.path(), 1).unwrap_err();
        assert!(matches!(err, StorewatchError::InvalidInput(_)));
        assert!(err.to_string().contains("element 2"));
    }

    #[test]
    fn fewer_links_than_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(dir.path(), 3, false);
        let manifest = split_links(&input, dir.path(), 10).unwrap();
        assert_eq!(manifest.chunk_count, 3);
        assert!(manifest.chunks.iter().all(|c| c.count == 1));
    }
}
