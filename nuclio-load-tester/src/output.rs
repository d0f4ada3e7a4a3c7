use std::io::Write;
use std::sync::Mutex;

/// Destination for report lines shared by all workers.
///
/// Each call writes one whole line; lines from different workers may
/// interleave in any order but never split each other.
pub trait OutputSink: Send + Sync {
    fn write_line(&self, line: &str);
}

/// Writes report lines to standard output
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSink;

impl OutputSink for StdoutSink {
    fn write_line(&self, line: &str) {
        let mut stdout = std::io::stdout().lock();
        // A closed stdout (e.g. piped into `head`) must not take the workers down.
        let _ = writeln!(stdout, "{}", line);
    }
}

/// Keeps report lines in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every line written so far
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Number of captured lines starting with `prefix`
    pub fn count_prefixed(&self, prefix: &str) -> usize {
        self.lines
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
            .filter(|line| line.starts_with(prefix))
            .count()
    }
}

impl OutputSink for MemorySink {
    fn write_line(&self, line: &str) {
        self.lines
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(line.to_string());
    }
}
