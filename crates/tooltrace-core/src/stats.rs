use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;
use crate::row::DatasetRow;

/// How many tool names are kept in the persisted frequency table.
pub const TOP_TOOL_NAMES: usize = 50;

/// Running tallies over emitted rows.
#[derive(Debug, Clone, Default)]
pub struct StatsCollector {
    rows: usize,
    tool_name_counts: HashMap<String, usize>,
}

impl StatsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, row: &DatasetRow) {
        self.rows += 1;
        *self.tool_name_counts.entry(row.tool_name.clone()).or_insert(0) += 1;
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Freeze the tallies, keeping the most frequent tool names.
    pub fn finish(self, files: usize) -> DatasetStats {
        let mut counts: Vec<ToolCount> = self
            .tool_name_counts
            .into_iter()
            .map(|(tool_name, count)| ToolCount { tool_name, count })
            .collect();
        counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.tool_name.cmp(&b.tool_name)));
        counts.truncate(TOP_TOOL_NAMES);

        DatasetStats {
            rows: self.rows,
            files,
            tool_name_counts: counts
                .into_iter()
                .map(|c| (c.tool_name, Value::from(c.count)))
                .collect(),
        }
    }
}

struct ToolCount {
    tool_name: String,
    count: usize,
}

/// Aggregate statistics written next to the dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetStats {
    pub rows: usize,
    pub files: usize,
    /// Most frequent first.
    pub tool_name_counts: Map<String, Value>,
}

impl DatasetStats {
    /// `<out>.stats.json` for a dataset written to `out`.
    pub fn path_for(out: &Path) -> PathBuf {
        let mut name = out.as_os_str().to_os_string();
        name.push(".stats.json");
        PathBuf::from(name)
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn count_for(&self, tool_name: &str) -> Option<u64> {
        self.tool_name_counts.get(tool_name).and_then(|v| v.as_u64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row::{ToolResultEntry, TraceEntry};

    fn row(tool_name: &str) -> DatasetRow {
        DatasetRow {
            session_id: "s1".to_string(),
            t: None,
            messages: Vec::new(),
            tool_name: tool_name.to_string(),
            tool_input: Map::new(),
            tool_result: TraceEntry::ToolResult(ToolResultEntry {
                t: None,
                tool_use_id: Some("t".to_string()),
                is_error: false,
                content_text: String::new(),
                uuid: None,
                parent_uuid: None,
            }),
            trace: Vec::new(),
            reward: 1.0,
        }
    }

    #[test]
    fn test_counts_are_sorted_by_frequency() {
        let mut collector = StatsCollector::new();
        for name in ["Read", "Bash", "Read", "Edit", "Read", "Bash"] {
            collector.record(&row(name));
        }

        let stats = collector.finish(3);
        assert_eq!(stats.rows, 6);
        assert_eq!(stats.files, 3);
        let names: Vec<_> = stats.tool_name_counts.keys().cloned().collect();
        assert_eq!(names, vec!["Read", "Bash", "Edit"]);
        assert_eq!(stats.count_for("Read"), Some(3));
    }

    #[test]
    fn test_counts_are_truncated() {
        let mut collector = StatsCollector::new();
        for i in 0..(TOP_TOOL_NAMES + 10) {
            collector.record(&row(&format!("tool{i:03}")));
        }
        let stats = collector.finish(1);
        assert_eq!(stats.tool_name_counts.len(), TOP_TOOL_NAMES);
        assert_eq!(stats.rows, TOP_TOOL_NAMES + 10);
    }

    #[test]
    fn test_stats_path_appends_suffix() {
        let path = DatasetStats::path_for(Path::new("/tmp/rows.jsonl"));
        assert_eq!(path, PathBuf::from("/tmp/rows.jsonl.stats.json"));
    }
}
