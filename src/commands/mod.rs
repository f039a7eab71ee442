pub mod classify;
pub mod retitle;
pub mod wrangle;

use serde::Serialize;

/// What a subcommand prints: plain lines, or JSON with `--json`.
#[derive(Debug, Clone, Serialize)]
pub struct CommandReport {
    pub command: String,
    pub ok: bool,
    pub details: Vec<String>,
    pub issues: Vec<String>,
}

impl CommandReport {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ok: true,
            details: Vec::new(),
            issues: Vec::new(),
        }
    }

    pub fn detail(&mut self, text: impl Into<String>) {
        self.details.push(text.into());
    }

    pub fn issue(&mut self, text: impl Into<String>) {
        self.ok = false;
        self.issues.push(text.into());
    }
}

/// Logs a fatal error into the run log before it reaches `main`.
pub fn log_fatal(err: anyhow::Error) -> anyhow::Error {
    match crate::error::code_of(&err) {
        Some(code) => tracing::error!("[{}] {:#}", code.as_str(), err),
        None => tracing::error!("{:#}", err),
    }
    err
}
