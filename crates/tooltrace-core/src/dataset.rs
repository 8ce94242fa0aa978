use std::path::{Path, PathBuf};

use crate::correlate::{Correlator, Rows, DEFAULT_WINDOW_SIZE};
use crate::error::Result;
use crate::normalize::normalize;
use crate::reader::RecordReader;
use crate::types::NormalizedEvent;

/// Normalized events of one log file, in file order.
pub struct FileEvents {
    records: RecordReader,
    buffered: std::vec::IntoIter<NormalizedEvent>,
}

impl FileEvents {
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self {
            records: RecordReader::open(path)?,
            buffered: Vec::new().into_iter(),
        })
    }
}

impl Iterator for FileEvents {
    type Item = NormalizedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(event) = self.buffered.next() {
                return Some(event);
            }
            let record = self.records.next()?;
            self.buffered = normalize(&record).into_iter();
        }
    }
}

/// Normalized events of several files, concatenated in the given order.
///
/// Files that cannot be opened are logged and skipped; their paths are
/// kept in [`ProjectEvents::failed`].
pub struct ProjectEvents {
    paths: std::vec::IntoIter<PathBuf>,
    current: Option<FileEvents>,
    failed: Vec<PathBuf>,
}

impl ProjectEvents {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self {
            paths: paths.into_iter(),
            current: None,
            failed: Vec::new(),
        }
    }

    pub fn failed(&self) -> &[PathBuf] {
        &self.failed
    }
}

impl Iterator for ProjectEvents {
    type Item = NormalizedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(event) = self.current.as_mut().and_then(Iterator::next) {
                return Some(event);
            }

            let path = self.paths.next()?;
            match FileEvents::open(&path) {
                Ok(events) => {
                    tracing::debug!(path = ?path, "Reading log file");
                    self.current = Some(events);
                }
                Err(e) => {
                    tracing::warn!("Skipping {:?}: {}", path, e);
                    self.current = None;
                    self.failed.push(path);
                }
            }
        }
    }
}

/// Configures and runs the log-to-dataset pipeline.
#[derive(Debug, Clone)]
pub struct DatasetBuilder {
    max_context_messages: usize,
    include_messages_in_trace: bool,
}

impl Default for DatasetBuilder {
    fn default() -> Self {
        Self {
            max_context_messages: DEFAULT_WINDOW_SIZE,
            include_messages_in_trace: true,
        }
    }
}

impl DatasetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_context_messages(mut self, max: usize) -> Self {
        self.max_context_messages = max;
        self
    }

    pub fn with_messages_in_trace(mut self, include: bool) -> Self {
        self.include_messages_in_trace = include;
        self
    }

    /// A fresh engine with this builder's settings.
    pub fn correlator(&self) -> Correlator {
        Correlator::new(self.max_context_messages, self.include_messages_in_trace)
    }

    pub fn rows_from_events<I>(&self, events: I) -> Rows<I::IntoIter>
    where
        I: IntoIterator<Item = NormalizedEvent>,
    {
        Rows::new(events.into_iter(), self.correlator())
    }

    /// Rows from one file with its own engine. Fails only if the file can't be opened.
    pub fn rows_from_file(&self, path: &Path) -> Result<Rows<FileEvents>> {
        Ok(self.rows_from_events(FileEvents::open(path)?))
    }

    /// Rows from several files fed, in order, through a single engine.
    pub fn rows_from_files(&self, paths: Vec<PathBuf>) -> Rows<ProjectEvents> {
        self.rows_from_events(ProjectEvents::new(paths))
    }
}
