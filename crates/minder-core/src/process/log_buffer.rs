//! Bounded ring buffer for captured process output.

use chrono::{DateTime, Local};
use serde::Serialize;
use std::collections::VecDeque;

/// Which pipe a log line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogStream {
    Stdout,
    Stderr,
}

impl LogStream {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogStream::Stdout => "stdout",
            LogStream::Stderr => "stderr",
        }
    }
}

impl std::fmt::Display for LogStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single captured line.
#[derive(Debug, Clone)]
pub struct LogLine {
    /// Source pipe.
    pub stream: LogStream,
    /// Line content, without the trailing newline.
    pub content: String,
    /// When the line was captured.
    pub timestamp: DateTime<Local>,
}

/// Fixed-capacity FIFO of the most recent log lines.
///
/// Append is the only mutation; once the capacity is reached, the oldest
/// line is evicted in the same operation. There is no backpressure to the
/// producer; capture is best-effort.
#[derive(Debug)]
pub struct LogBuffer {
    lines: VecDeque<LogLine>,
    max_lines: usize,
}

impl LogBuffer {
    /// Create a buffer holding at most `max_lines` lines.
    pub fn new(max_lines: usize) -> Self {
        Self {
            lines: VecDeque::with_capacity(max_lines),
            max_lines,
        }
    }

    /// Append a line, evicting the oldest one if the buffer is full.
    pub fn push(&mut self, stream: LogStream, content: &str) {
        if self.lines.len() >= self.max_lines {
            self.lines.pop_front();
        }

        self.lines.push_back(LogLine {
            stream,
            content: content.to_string(),
            timestamp: Local::now(),
        });
    }

    /// Number of retained lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Iterate lines oldest-first.
    pub fn iter(&self) -> impl Iterator<Item = &LogLine> {
        self.lines.iter()
    }

    /// The most recent `limit` lines, oldest-first.
    pub fn recent(&self, limit: usize) -> Vec<LogLine> {
        let skip = self.lines.len().saturating_sub(limit);
        self.lines.iter().skip(skip).cloned().collect()
    }

    /// Drop all retained lines.
    pub fn clear(&mut self) {
        self.lines.clear();
    }
}
