//! I/O boundary traits for testability
//!
//! These traits abstract external I/O operations, allowing services
//! to be tested with mock implementations.

use std::fs::OpenOptions;
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::Path;

use serde_json::Value;

use crate::domain::{Credentials, ReplyEncoding, SwitchTarget};
use crate::infrastructure::eapi::{CommandInput, EapiError};

/// Filesystem abstraction for testability.
pub trait FileSystem: Send + Sync {
    /// Read file contents to string.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Write string content to file, truncating it.
    fn write(&self, path: &Path, content: &str) -> io::Result<()>;

    /// Append string content to file, creating it if needed.
    fn append(&self, path: &Path, content: &str) -> io::Result<()>;

    /// Check if path exists.
    fn exists(&self, path: &Path) -> bool;

    /// Create directory and all parent directories.
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Create parent directories if needed.
    fn ensure_parent(&self, path: &Path) -> io::Result<()>;
}

/// Interactive input from the user.
pub trait Prompter: Send + Sync {
    /// Ask for a line of input. The trailing newline is stripped.
    fn prompt_line(&self, message: &str) -> io::Result<String>;

    /// Ask for a secret.
    fn prompt_secret(&self, message: &str) -> io::Result<String>;
}

/// Console sink for rendered output.
pub trait Console: Send + Sync {
    fn print(&self, text: &str) -> io::Result<()>;
}

/// Opens one eAPI session per switch.
pub trait EapiConnector: Send + Sync {
    fn connect(
        &self,
        target: &SwitchTarget,
        credentials: &Credentials,
    ) -> Result<Box<dyn EapiSession>, EapiError>;
}

/// A live session with one switch.
pub trait EapiSession {
    /// Issue one `runCmds` call; returns one reply per command, in order.
    fn run_cmds(
        &self,
        cmds: &[CommandInput],
        encoding: ReplyEncoding,
    ) -> Result<Vec<Value>, EapiError>;
}

// ============================================================
// REAL IMPLEMENTATIONS
// ============================================================

/// Real filesystem implementation.
#[derive(Debug, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn write(&self, path: &Path, content: &str) -> io::Result<()> {
        std::fs::write(path, content)
    }

    fn append(&self, path: &Path, content: &str) -> io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        file.write_all(content.as_bytes())
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        std::fs::create_dir_all(path)
    }

    fn ensure_parent(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                self.create_dir_all(parent)?;
            }
        }
        Ok(())
    }
}

/// Prompter reading from stdin.
///
/// Secrets are read from the terminal without echo; piped stdin falls back to a plain line.
#[derive(Debug, Default)]
pub struct StdinPrompter;

impl StdinPrompter {
    fn read_line(&self) -> io::Result<String> {
        let mut line = String::new();
        let read = io::stdin().lock().read_line(&mut line)?;
        if read == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "no input available on stdin",
            ));
        }
        Ok(line.trim_end_matches(['\n', '\r']).to_string())
    }
}

impl Prompter for StdinPrompter {
    fn prompt_line(&self, message: &str) -> io::Result<String> {
        crate::cli::output::prompt(message);
        self.read_line()
    }

    fn prompt_secret(&self, message: &str) -> io::Result<String> {
        crate::cli::output::prompt(message);
        if io::stdin().is_terminal() {
            rpassword::read_password()
        } else {
            self.read_line()
        }
    }
}

/// Console writing to stdout.
#[derive(Debug, Default)]
pub struct StdoutConsole;

impl Console for StdoutConsole {
    fn print(&self, text: &str) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        stdout.write_all(text.as_bytes())?;
        stdout.flush()
    }
}
