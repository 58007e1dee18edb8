use crate::errors::{ShellError, ShellResult};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use tracing::debug;

/// Session command log.
///
/// Entries are append-only and numbered from 1. `flushed` is the watermark
/// of entries already written by [`History::append_to`] or
/// [`History::write_to`].
#[derive(Debug, Default, Clone)]
pub struct History {
    entries: Vec<String>,
    flushed: usize,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a command to history
    pub fn push(&mut self, command: impl Into<String>) {
        self.entries.push(command.into());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// The last `count` entries with their absolute 1-based positions.
    pub fn tail(&self, count: usize) -> impl Iterator<Item = (usize, &str)> {
        let start = self.entries.len().saturating_sub(count);
        self.entries[start..]
            .iter()
            .enumerate()
            .map(move |(offset, entry)| (start + offset + 1, entry.as_str()))
    }

    /// Append the non-empty lines of `path` to the log.
    pub fn read_from(&mut self, path: &Path) -> ShellResult<usize> {
        let content = fs::read_to_string(path).map_err(|source| ShellError::HistoryFile {
            path: path.to_path_buf(),
            source,
        })?;
        let before = self.entries.len();
        self.entries.extend(
            content
                .lines()
                .filter(|line| !line.is_empty())
                .map(str::to_string),
        );
        let loaded = self.entries.len() - before;
        debug!(path = %path.display(), loaded, "history.read");
        Ok(loaded)
    }

    /// Overwrite `path` with the whole log.
    pub fn write_to(&mut self, path: &Path) -> ShellResult<()> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path);
        self.write_entries(path, file, 0)
    }

    /// Append the entries not yet flushed to `path`.
    pub fn append_to(&mut self, path: &Path) -> ShellResult<()> {
        let file = OpenOptions::new().append(true).create(true).open(path);
        self.write_entries(path, file, self.flushed)
    }

    fn write_entries(
        &mut self,
        path: &Path,
        file: std::io::Result<fs::File>,
        from: usize,
    ) -> ShellResult<()> {
        let to_error = |source| ShellError::HistoryFile {
            path: path.to_path_buf(),
            source,
        };
        let mut file = file.map_err(to_error)?;
        let mut buf = String::new();
        for entry in &self.entries[from..] {
            buf.push_str(entry);
            buf.push('\n');
        }
        file.write_all(buf.as_bytes()).map_err(to_error)?;
        debug!(path = %path.display(), written = self.entries.len() - from, "history.write");
        self.flushed = self.entries.len();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history_of(lines: &[&str]) -> History {
        let mut history = History::new();
        for line in lines {
            history.push(*line);
        }
        history
    }

    #[test]
    fn test_tail_keeps_absolute_numbering() {
        let history = history_of(&["echo a", "echo b", "history 2"]);
        let tail: Vec<_> = history.tail(2).collect();
        assert_eq!(tail, vec![(2, "echo b"), (3, "history 2")]);
    }

    #[test]
    fn test_tail_larger_than_log_lists_everything() {
        let history = history_of(&["one", "two"]);
        assert_eq!(history.tail(10).count(), 2);
        assert_eq!(history.tail(0).count(), 0);
    }

    #[test]
    fn test_read_appends_instead_of_replacing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hist");
        fs::write(&path, "ls\n\npwd\n").unwrap();

        let mut history = history_of(&["echo first"]);
        assert_eq!(history.read_from(&path).unwrap(), 2);
        assert_eq!(history.entries(), &["echo first", "ls", "pwd"]);
    }

    #[test]
    fn test_write_overwrites_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hist");
        fs::write(&path, "stale\n").unwrap();

        let mut history = history_of(&["a", "b"]);
        history.write_to(&path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "a\nb\n");
    }

    #[test]
    fn test_append_only_writes_unflushed_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hist");

        let mut history = history_of(&["a", "b"]);
        history.append_to(&path).unwrap();
        history.push("c");
        history.append_to(&path).unwrap();
        history.append_to(&path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "a\nb\nc\n");
    }

    #[test]
    fn test_write_advances_the_watermark() {
        let dir = tempfile::tempdir().unwrap();
        let full = dir.path().join("full");
        let incremental = dir.path().join("incremental");

        let mut history = history_of(&["a"]);
        history.write_to(&full).unwrap();
        history.push("b");
        history.append_to(&incremental).unwrap();
        assert_eq!(fs::read_to_string(&incremental).unwrap(), "b\n");
    }

    #[test]
    fn test_missing_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing");
        let err = History::new().read_from(&path).unwrap_err();
        assert!(err.to_string().starts_with("history: "));
        assert!(err.to_string().contains("missing"));
    }
}
