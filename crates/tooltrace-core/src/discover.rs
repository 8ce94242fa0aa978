use std::path::{Path, PathBuf};
use std::time::SystemTime;

use ignore::WalkBuilder;

use crate::error::{DatasetError, Result};

pub const LOG_EXTENSION: &str = "jsonl";

/// Find every `*.jsonl` under `root`, newest first by modification time.
///
/// Hidden and gitignored entries are included: session logs live in plain
/// data directories, not source trees. Entries the walker cannot read are
/// logged and skipped; only a missing root is an error. `max_files == 0`
/// means no limit.
pub fn discover_log_files(root: &Path, max_files: usize) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(DatasetError::MissingDir(root.to_path_buf()));
    }

    let walker = WalkBuilder::new(root)
        .git_ignore(false)
        .git_global(false)
        .git_exclude(false)
        .ignore(false)
        .hidden(false)
        .build();

    let mut files: Vec<(SystemTime, PathBuf)> = Vec::new();
    for result in walker {
        let entry = match result {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Skipping unreadable entry under {:?}: {}", root, e);
                continue;
            }
        };
        let path = entry.path();

        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }
        if path.extension().and_then(|s| s.to_str()) != Some(LOG_EXTENSION) {
            continue;
        }

        let modified = entry
            .metadata()
            .ok()
            .and_then(|m| m.modified().ok())
            .unwrap_or(SystemTime::UNIX_EPOCH);
        files.push((modified, path.to_path_buf()));
    }

    // Newest first; path order breaks ties so runs are reproducible.
    files.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
    if max_files > 0 {
        files.truncate(max_files);
    }

    tracing::debug!(root = ?root, count = files.len(), "Discovered log files");
    Ok(files.into_iter().map(|(_, path)| path).collect())
}
