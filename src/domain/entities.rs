//! Domain entities: core data structures

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Line written between sections of a record and at the end of each switch.
pub const SEPARATOR: &str = "------------------------------";

/// A switch to send commands to: hostname, address, or `host:port`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SwitchTarget(String);

impl SwitchTarget {
    /// Parse a target from user input, trimming surrounding whitespace.
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.contains(char::is_whitespace) {
            return Err(DomainError::InvalidSwitchTarget(raw.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Port given in the target itself (`host:port`, `[v6]:port`).
    pub fn port(&self) -> Option<u16> {
        let (host, port) = self.0.rsplit_once(':')?;
        if host.is_empty() || (host.contains(':') && !host.ends_with(']')) {
            return None;
        }
        port.parse().ok()
    }

    /// Name usable as a file stem: anything outside `[A-Za-z0-9._-]` becomes `_`.
    pub fn file_stem(&self) -> String {
        self.0
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                    c
                } else {
                    '_'
                }
            })
            .collect()
    }
}

impl fmt::Display for SwitchTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Login credentials for the management API.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"********")
            .finish()
    }
}

/// How a batch of commands is executed on the switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandMode {
    /// Read-only status command (`show ...`)
    Query,
    /// Elevated, non-persistent execution (`enable ...`)
    Privileged,
    /// Mutates persistent device configuration (`configure ...`)
    Config,
}

impl CommandMode {
    /// Classify a command by the first two letters of its first word.
    ///
    /// This is a prefix heuristic, not a parser: `sh` is a query, `en` is
    /// privileged, `co` is config. Anything else is rejected.
    pub fn classify(command: &str) -> Result<Self, DomainError> {
        let token = command
            .split_whitespace()
            .next()
            .ok_or(DomainError::EmptyBatch)?;
        let prefix: String = token.to_lowercase().chars().take(2).collect();

        match prefix.as_str() {
            "en" => Ok(Self::Privileged),
            "sh" => Ok(Self::Query),
            "co" => Ok(Self::Config),
            _ => Err(DomainError::UnrecognizedCommand {
                token: token.to_string(),
            }),
        }
    }
}

impl fmt::Display for CommandMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Query => "query",
            Self::Privileged => "privileged",
            Self::Config => "config",
        };
        f.write_str(name)
    }
}

/// Commands to run on every switch, classified once from the first command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandBatch {
    mode: CommandMode,
    commands: Vec<String>,
}

impl CommandBatch {
    /// Build a batch from raw command lines.
    ///
    /// Lines are trimmed; blank lines and lines starting with one of
    /// `ignore_prefixes` are dropped before the mode is derived.
    pub fn parse<S: AsRef<str>>(
        raw: &[S],
        ignore_prefixes: &[String],
    ) -> Result<Self, DomainError> {
        let commands: Vec<String> = raw
            .iter()
            .map(|line| line.as_ref().trim())
            .filter(|line| !line.is_empty())
            .filter(|line| !ignore_prefixes.iter().any(|p| line.starts_with(p.as_str())))
            .map(str::to_string)
            .collect();

        let first = commands.first().ok_or(DomainError::EmptyBatch)?;
        let mode = CommandMode::classify(first)?;

        Ok(Self { mode, commands })
    }

    pub fn mode(&self) -> CommandMode {
        self.mode
    }

    pub fn commands(&self) -> &[String] {
        &self.commands
    }
}

/// Encoding requested from the switch. Replies are always rendered as text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplyEncoding {
    #[default]
    Text,
    Json,
}

/// Per-run options threaded through the dispatcher.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Capture running-config before and after the batch
    pub save_running_config: bool,
    /// Reply encoding for the batch
    pub encoding: ReplyEncoding,
    /// Secret sent with `enable`, if the switch requires one
    pub enable_secret: Option<String>,
}

/// Ordered output lines collected for one switch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputRecord {
    target: SwitchTarget,
    lines: Vec<String>,
    failed: bool,
}

impl OutputRecord {
    pub fn new(target: SwitchTarget) -> Self {
        Self {
            target,
            lines: Vec::new(),
            failed: false,
        }
    }

    pub fn push(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    /// Append multi-line command output, one record line per output line.
    pub fn push_text(&mut self, text: &str) {
        for line in text.trim_end_matches(['\n', '\r']).lines() {
            self.lines.push(line.to_string());
        }
    }

    pub fn mark_failed(&mut self) {
        self.failed = true;
    }

    pub fn target(&self) -> &SwitchTarget {
        &self.target
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn failed(&self) -> bool {
        self.failed
    }

    /// Render as newline-terminated text.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            out.push_str(line);
            out.push('\n');
        }
        out
    }
}

/// Where output records are written. Exactly one per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputSink {
    Stdout,
    /// All switches appended to one file
    SharedFile(PathBuf),
    /// One truncated file per switch
    PerSwitch { dir: PathBuf, extension: String },
}

impl OutputSink {
    /// File the record for `target` goes to, if this sink writes files.
    pub fn path_for(&self, target: &SwitchTarget) -> Option<PathBuf> {
        match self {
            Self::Stdout => None,
            Self::SharedFile(path) => Some(path.clone()),
            Self::PerSwitch { dir, extension } => Some(per_switch_path(dir, target, extension)),
        }
    }
}

fn per_switch_path(dir: &Path, target: &SwitchTarget, extension: &str) -> PathBuf {
    let stem = target.file_stem();
    if extension.is_empty() {
        dir.join(stem)
    } else {
        dir.join(format!("{stem}.{extension}"))
    }
}
