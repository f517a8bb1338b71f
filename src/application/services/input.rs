//! Input resolution
//!
//! Gathers switches, commands and credentials from flags, list files, or
//! interactive prompts, in that order of preference.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::application::{ApplicationResult, IoResultExt};
use crate::domain::{Credentials, DomainError, SwitchTarget};
use crate::infrastructure::traits::{FileSystem, Prompter};

/// Resolves run inputs, prompting for whatever was not supplied.
pub struct InputResolver {
    fs: Arc<dyn FileSystem>,
    prompter: Arc<dyn Prompter>,
}

impl InputResolver {
    pub fn new(fs: Arc<dyn FileSystem>, prompter: Arc<dyn Prompter>) -> Self {
        Self { fs, prompter }
    }

    /// Switches from a list file, a single flag, or a prompt.
    ///
    /// List files hold one switch per line; blank lines and `#` comments are skipped,
    /// and lines that are not a valid target are skipped with a warning.
    pub fn switches(
        &self,
        switch: Option<&str>,
        switch_file: Option<&Path>,
    ) -> ApplicationResult<Vec<SwitchTarget>> {
        let targets = if let Some(path) = switch_file {
            self.load_lines(path)?
                .iter()
                .filter(|line| !line.starts_with('#'))
                .filter_map(|line| match SwitchTarget::parse(line) {
                    Ok(target) => Some(target),
                    Err(e) => {
                        warn!("{}: skipping line: {e}", path.display());
                        None
                    }
                })
                .collect()
        } else if let Some(switch) = switch {
            vec![SwitchTarget::parse(switch)?]
        } else {
            let answer = self
                .prompter
                .prompt_line("Enter the IP of the switch to connect to:")
                .with_input_context("switch prompt")?;
            vec![SwitchTarget::parse(&answer)?]
        };

        if targets.is_empty() {
            return Err(DomainError::EmptySwitchList.into());
        }
        debug!("switches: {:?}", targets);
        Ok(targets)
    }

    /// Raw command lines from a list file, a single flag, or a prompt.
    ///
    /// Comment and blank-line removal happens when the batch is built.
    pub fn commands(
        &self,
        command: Option<&str>,
        command_file: Option<&Path>,
    ) -> ApplicationResult<Vec<String>> {
        let commands = if let Some(path) = command_file {
            self.load_lines(path)?
        } else if let Some(command) = command {
            vec![command.to_string()]
        } else {
            vec![self
                .prompter
                .prompt_line("Enter the command to run:")
                .with_input_context("command prompt")?]
        };
        debug!("commands: {:?}", commands);
        Ok(commands)
    }

    /// Username and password, prompting for any that are missing.
    pub fn credentials(
        &self,
        username: Option<&str>,
        password: Option<&str>,
    ) -> ApplicationResult<Credentials> {
        let username = match username {
            Some(u) => u.to_string(),
            None => self
                .prompter
                .prompt_line("Enter your username:")
                .with_input_context("username prompt")?,
        };
        let password = match password {
            Some(p) => p.to_string(),
            None => self
                .prompter
                .prompt_secret("Enter your password:")
                .with_input_context("password prompt")?,
        };
        Ok(Credentials::new(username, password))
    }

    /// Read a list file into trimmed, non-blank lines.
    fn load_lines(&self, path: &Path) -> ApplicationResult<Vec<String>> {
        let content = self
            .fs
            .read_to_string(path)
            .with_input_context(&format!("error opening file {}", path.display()))?;

        Ok(content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }
}
