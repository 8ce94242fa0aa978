//! # tooltrace-core
//!
//! Turns agent session logs (JSON lines) into a tool-use dataset.
//!
//! ## Pipeline
//!
//! - [`RecordReader`] - one JSON object per valid line, malformed lines skipped
//! - [`normalize`] - raw record to zero or more [`NormalizedEvent`]s
//! - [`Correlator`] - pairs tool uses with tool results into [`DatasetRow`]s
//! - [`reward`] - scalar outcome for a resolved call
//! - [`RowSink`] - JSONL output with running [`DatasetStats`]
//!
//! [`DatasetBuilder`] wires these together for one or more files.

mod correlate;
mod dataset;
mod discover;
mod error;
pub mod fields;
mod normalize;
mod reader;
mod reward;
mod row;
mod sink;
mod stats;
mod types;

pub use correlate::{process, Correlator, Rows, DEFAULT_WINDOW_SIZE};
pub use dataset::{DatasetBuilder, FileEvents, ProjectEvents};
pub use discover::{discover_log_files, LOG_EXTENSION};
pub use error::{DatasetError, Result};
pub use normalize::{is_skipped_record, normalize, SKIPPED_RECORD_TYPES};
pub use reader::RecordReader;
pub use reward::{reward, ERROR_REWARD, SUCCESS_REWARD};
pub use row::{ContextMessage, DatasetRow, ToolResultEntry, ToolUseEntry, TraceEntry};
pub use sink::RowSink;
pub use stats::{DatasetStats, StatsCollector, TOP_TOOL_NAMES};
pub use types::{MessageEvent, NormalizedEvent, ToolResultEvent, ToolUseEvent};
