//! Loading rulebook documents from a local directory.

use std::path::Path;

use tokio::fs;

use crate::types::{RuleDocument, RuleError};

const RULEBOOK_EXTENSIONS: [&str; 3] = ["md", "markdown", "txt"];

/// Reads every rulebook file (`.md`, `.markdown`, `.txt`) directly beneath
/// `dir`, in name order.
///
/// An empty result is an error: with nothing indexed the assistant cannot
/// answer rules questions at all.
pub async fn read_rulebook(dir: impl AsRef<Path>) -> Result<Vec<RuleDocument>, RuleError> {
    let dir = dir.as_ref();
    let mut reader = fs::read_dir(dir).await?;
    let mut paths = Vec::new();
    while let Some(entry) = reader.next_entry().await? {
        let path = entry.path();
        let keep = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| RULEBOOK_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
            .unwrap_or(false);
        if keep && path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();

    let mut documents = Vec::with_capacity(paths.len());
    for path in paths {
        let text = fs::read_to_string(&path).await?;
        let title = extract_title(&text).unwrap_or_else(|| {
            path.file_stem()
                .and_then(|stem| stem.to_str())
                .unwrap_or("rulebook")
                .to_string()
        });
        documents.push(RuleDocument {
            source: path.display().to_string(),
            title,
            text,
        });
    }

    if documents.is_empty() {
        return Err(RuleError::InvalidDocument(format!(
            "no rulebook documents found in {}",
            dir.display()
        )));
    }

    tracing::debug!(documents = documents.len(), dir = %dir.display(), "rulebook loaded");
    Ok(documents)
}

/// First markdown heading, with the marker stripped.
fn extract_title(text: &str) -> Option<String> {
    text.lines()
        .map(str::trim)
        .find(|line| line.starts_with('#'))
        .map(|line| line.trim_start_matches('#').trim().to_string())
        .filter(|title| !title.is_empty())
}
