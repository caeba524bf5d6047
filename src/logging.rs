//! Stage logging for pipeline runs.
//!
//! The logger is constructed in `main` and handed to the pipeline, so
//! there is no global logging state. Lines go to stderr with a
//! timestamp and a bracketed stage prefix, optionally mirrored to a
//! log file.

use crate::error::{Error, Result};
use chrono::Local;
use std::fmt::Display;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

#[derive(Debug)]
pub struct Logger {
    file: Option<File>,
}

impl Logger {
    pub fn to_stderr() -> Self {
        Self { file: None }
    }

    /// Logs to stderr and appends the same lines to `path`.
    pub fn with_file(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| {
                Error::internal_io(
                    e.to_string(),
                    Some(format!("open log file {}", path.display())),
                )
            })?;

        Ok(Self { file: Some(file) })
    }

    pub fn info(&self, stage: &str, message: impl Display) {
        self.write("INFO", stage, &message);
    }

    pub fn warn(&self, stage: &str, message: impl Display) {
        self.write("WARN", stage, &message);
    }

    pub fn error(&self, stage: &str, message: impl Display) {
        self.write("ERROR", stage, &message);
    }

    fn write(&self, level: &str, stage: &str, message: &dyn Display) {
        let line = format!(
            "{} [{}] {}: {}",
            Local::now().format("%Y-%m-%d %H:%M:%S"),
            stage,
            level,
            message
        );

        eprintln!("{}", line);

        // A failed mirror write never fails the stage.
        if let Some(file) = &self.file {
            let mut file = file;
            let _ = writeln!(file, "{}", line);
        }
    }
}
