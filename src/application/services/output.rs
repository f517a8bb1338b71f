//! Output routing for per-switch records

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::domain::{OutputRecord, OutputSink, SwitchTarget};
use crate::infrastructure::traits::{Console, FileSystem};

/// Writes each finished record to the run's single sink.
pub struct OutputService {
    fs: Arc<dyn FileSystem>,
    console: Arc<dyn Console>,
    /// Per-switch files written so far, with the switch that wrote them
    written: Mutex<HashMap<PathBuf, SwitchTarget>>,
    overwritten: Mutex<Vec<PathBuf>>,
}

impl OutputService {
    pub fn new(fs: Arc<dyn FileSystem>, console: Arc<dyn Console>) -> Self {
        Self {
            fs,
            console,
            written: Mutex::new(HashMap::new()),
            overwritten: Mutex::new(Vec::new()),
        }
    }

    /// Per-switch files that more than one record was written to, in order of reuse.
    pub fn overwritten(&self) -> Vec<PathBuf> {
        self.overwritten
            .lock()
            .map(|paths| paths.clone())
            .unwrap_or_default()
    }

    fn track(&self, path: &Path, target: &SwitchTarget) {
        let Ok(mut written) = self.written.lock() else {
            return;
        };
        if let Some(previous) = written.insert(path.to_path_buf(), target.clone()) {
            warn!("{target} replaces output of {previous} in {}", path.display());
            if let Ok(mut overwritten) = self.overwritten.lock() {
                overwritten.push(path.to_path_buf());
            }
        }
    }

    /// Emit one record.
    ///
    /// Shared files are appended to; per-switch files are truncated, and a file
    /// reused by a later switch in the same run is reported.
    pub fn emit(&self, record: &OutputRecord, sink: &OutputSink) -> ApplicationResult<()> {
        let text = record.render();

        match sink {
            OutputSink::Stdout => {
                self.console
                    .print(&text)
                    .map_err(|e| ApplicationError::OperationFailed {
                        context: "write to stdout".to_string(),
                        source: Box::new(e),
                    })
            }
            OutputSink::SharedFile(path) => {
                debug!("append {} -> {}", record.target(), path.display());
                self.fs
                    .ensure_parent(path)
                    .with_path_context("create output directory for", path)?;
                self.fs
                    .append(path, &text)
                    .with_path_context("couldn't output to", path)
            }
            OutputSink::PerSwitch { .. } => {
                let Some(path) = sink.path_for(record.target()) else {
                    return Ok(());
                };
                debug!("write {} -> {}", record.target(), path.display());
                self.track(&path, record.target());
                self.fs
                    .ensure_parent(&path)
                    .with_path_context("create output directory for", &path)?;
                self.fs
                    .write(&path, &text)
                    .with_path_context("couldn't output to", &path)
            }
        }
    }
}
