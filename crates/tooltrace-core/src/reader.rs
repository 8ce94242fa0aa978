use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::error::{DatasetError, Result};

/// Lazily yields one JSON object per line of a JSONL log.
///
/// Blank lines, lines that fail to decode, and lines whose top-level value
/// is not an object are skipped. Invalid UTF-8 is replaced rather than
/// rejected. An I/O error after the file was opened ends the sequence.
pub struct RecordReader<R = BufReader<File>> {
    reader: R,
    source: PathBuf,
    buf: Vec<u8>,
    done: bool,
}

impl RecordReader {
    /// Open a log file. Failing to open is the only fatal error.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|source| DatasetError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::with_source(BufReader::new(file), path.to_path_buf()))
    }
}

impl<R: BufRead> RecordReader<R> {
    pub fn from_reader(reader: R) -> Self {
        Self::with_source(reader, PathBuf::from("<reader>"))
    }

    fn with_source(reader: R, source: PathBuf) -> Self {
        Self {
            reader,
            source,
            buf: Vec::new(),
            done: false,
        }
    }

    /// Read the next raw line. `None` at EOF or on a read error.
    fn next_line(&mut self) -> Option<String> {
        if self.done {
            return None;
        }
        self.buf.clear();
        match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(0) => {
                self.done = true;
                None
            }
            Ok(_) => Some(String::from_utf8_lossy(&self.buf).into_owned()),
            Err(e) => {
                tracing::debug!(path = ?self.source, error = %e, "Stopped reading log file");
                self.done = true;
                None
            }
        }
    }
}

impl<R: BufRead> Iterator for RecordReader<R> {
    type Item = Map<String, Value>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = self.next_line()?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if let Ok(Value::Object(record)) = serde_json::from_str::<Value>(line) {
                return Some(record);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn read_all(input: &[u8]) -> Vec<Map<String, Value>> {
        RecordReader::from_reader(Cursor::new(input.to_vec())).collect()
    }

    #[test]
    fn test_skips_blank_and_malformed_lines() {
        let input = b"{\"a\":1}\n\n   \n{not json\n{\"b\":2}\n";
        let records = read_all(input);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["a"], 1);
        assert_eq!(records[1]["b"], 2);
    }

    #[test]
    fn test_skips_non_object_values() {
        let input = b"42\n\"str\"\n[1,2]\nnull\n{\"ok\":true}\n";
        let records = read_all(input);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["ok"], true);
    }

    #[test]
    fn test_last_line_without_newline() {
        let records = read_all(b"{\"a\":1}\n{\"b\":2}");
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let mut input = b"{\"text\":\"caf".to_vec();
        input.push(0xff);
        input.extend_from_slice(b"\"}\n");
        let records = read_all(&input);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["text"], "caf\u{fffd}");
    }

    #[test]
    fn test_open_missing_file_is_an_error() {
        let result = RecordReader::open(Path::new("/definitely/not/here.jsonl"));
        assert!(matches!(result, Err(DatasetError::Open { .. })));
    }
}
