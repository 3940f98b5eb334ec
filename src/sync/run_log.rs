use tracing::{error, info, warn};

/// Log lines collected during one run and returned to the caller, mirrored
/// to `tracing` under the `sync` target.
#[derive(Debug, Clone, Default)]
pub struct RunLog {
    lines: Vec<String>,
}

impl RunLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn info(&mut self, line: impl Into<String>) {
        let line = line.into();
        info!(target: "sync", "{line}");
        self.lines.push(line);
    }

    pub fn warn(&mut self, line: impl Into<String>) {
        let line = line.into();
        warn!(target: "sync", "{line}");
        self.lines.push(format!("WARN: {line}"));
    }

    pub fn error(&mut self, line: impl Into<String>) {
        let line = line.into();
        error!(target: "sync", "{line}");
        self.lines.push(format!("ERROR: {line}"));
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }
}
