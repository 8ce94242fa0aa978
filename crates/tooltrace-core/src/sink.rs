use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;

use crate::error::Result;
use crate::row::DatasetRow;
use crate::stats::{DatasetStats, StatsCollector};

struct SinkState<W: Write> {
    writer: BufWriter<W>,
    stats: StatsCollector,
}

/// Writes dataset rows as JSON lines.
///
/// Safe to share between workers: writes are serialised behind a mutex and
/// every accepted row is tallied for the stats file. An optional row limit
/// makes further writes no-ops once reached.
pub struct RowSink<W: Write = File> {
    state: Mutex<SinkState<W>>,
    max_rows: Option<usize>,
}

impl RowSink<File> {
    /// Create (truncating) the output file, making parent directories.
    pub fn create(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        Ok(Self::new(File::create(path)?))
    }
}

impl<W: Write> RowSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            state: Mutex::new(SinkState {
                writer: BufWriter::new(writer),
                stats: StatsCollector::new(),
            }),
            max_rows: None,
        }
    }

    /// Stop accepting rows after `max_rows`. Zero means unlimited.
    pub fn with_max_rows(mut self, max_rows: usize) -> Self {
        self.max_rows = (max_rows > 0).then_some(max_rows);
        self
    }

    /// Write one row. Returns `Ok(false)` once the row limit has been reached.
    pub fn write_row(&self, row: &DatasetRow) -> Result<bool> {
        let mut state = self.lock();
        if self.is_full(&state) {
            return Ok(false);
        }

        let line = serde_json::to_string(row)?;
        writeln!(state.writer, "{}", line)?;
        state.stats.record(row);
        Ok(true)
    }

    /// True once the row limit has been reached.
    pub fn is_closed(&self) -> bool {
        let state = self.lock();
        self.is_full(&state)
    }

    pub fn rows_written(&self) -> usize {
        self.lock().stats.rows()
    }

    /// Flush and return the writer together with the final statistics.
    pub fn finish(self, files: usize) -> Result<(W, DatasetStats)> {
        let state = self
            .state
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let writer = state
            .writer
            .into_inner()
            .map_err(|e| e.into_error())?;
        Ok((writer, state.stats.finish(files)))
    }

    fn is_full(&self, state: &SinkState<W>) -> bool {
        self.max_rows.is_some_and(|max| state.stats.rows() >= max)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SinkState<W>> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row::{ToolResultEntry, TraceEntry};
    use serde_json::{Map, Value};

    fn row(tool_name: &str) -> DatasetRow {
        DatasetRow {
            session_id: "s1".to_string(),
            t: Some("2025-01-01T00:00:00Z".to_string()),
            messages: Vec::new(),
            tool_name: tool_name.to_string(),
            tool_input: Map::new(),
            tool_result: TraceEntry::ToolResult(ToolResultEntry {
                t: None,
                tool_use_id: Some("t1".to_string()),
                is_error: false,
                content_text: "ok".to_string(),
                uuid: None,
                parent_uuid: None,
            }),
            trace: Vec::new(),
            reward: 1.0,
        }
    }

    #[test]
    fn test_writes_one_json_object_per_line() {
        let sink = RowSink::new(Vec::new());
        assert!(sink.write_row(&row("Read")).unwrap());
        assert!(sink.write_row(&row("Bash")).unwrap());

        let (buf, stats) = sink.finish(1).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["tool_name"], "Read");
        assert_eq!(first["reward"], 1.0);
        assert_eq!(first["tool_result"]["type"], "tool_result");
        assert_eq!(stats.rows, 2);
    }

    #[test]
    fn test_row_limit_stops_writes() {
        let sink = RowSink::new(Vec::new()).with_max_rows(2);
        assert!(sink.write_row(&row("A")).unwrap());
        assert!(!sink.is_closed());
        assert!(sink.write_row(&row("B")).unwrap());
        assert!(sink.is_closed());
        assert!(!sink.write_row(&row("C")).unwrap());

        let (buf, stats) = sink.finish(1).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap().lines().count(), 2);
        assert_eq!(stats.rows, 2);
        assert_eq!(stats.count_for("C"), None);
    }

    #[test]
    fn test_zero_limit_is_unlimited() {
        let sink = RowSink::new(Vec::new()).with_max_rows(0);
        for _ in 0..5 {
            assert!(sink.write_row(&row("A")).unwrap());
        }
        assert_eq!(sink.rows_written(), 5);
    }
}
