//! Per-switch execution pipeline
//!
//! connect → identify (`show hostname`) → optional config snapshot →
//! run the batch in its mode's call shape → optional config snapshot.
//! Every failure is caught here and written into the switch's record, so one
//! unreachable switch never stops the run.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::domain::{
    CommandBatch, CommandMode, Credentials, OutputRecord, ReplyEncoding, RunOptions, SwitchTarget,
    SEPARATOR,
};
use crate::infrastructure::eapi::{CommandInput, EapiError};
use crate::infrastructure::traits::{EapiConnector, EapiSession};

/// First line written for a switch that could not be reached.
pub const CONNECTION_ERROR_MARKER: &str = "CONNECTION ERROR";
/// First line written for any other failure.
pub const ERROR_MARKER: &str = "ERROR";

const HOSTNAME_COMMAND: &str = "show hostname";
const RUNNING_CONFIG_COMMAND: &str = "show running-config";

/// Commands actually sent for a batch, and how many leading replies to drop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallShape {
    pub cmds: Vec<CommandInput>,
    pub prepended: usize,
}

impl CallShape {
    /// Build the `runCmds` list for a mode.
    ///
    /// - query: the commands as given
    /// - privileged: `enable` first, unless the batch already opens with a bare `enable`,
    ///   in which case that one carries the secret
    /// - config: `enable`, then `configure terminal` unless the batch already opens with `conf...`
    pub fn for_mode(mode: CommandMode, commands: &[String], enable_secret: Option<&str>) -> Self {
        let mut cmds: Vec<CommandInput> = Vec::with_capacity(commands.len() + 2);

        match mode {
            CommandMode::Query => {}
            CommandMode::Privileged if opens_with_enable(commands) => {
                cmds.push(enable(enable_secret));
                cmds.extend(commands.iter().skip(1).cloned().map(CommandInput::from));
                return Self { cmds, prepended: 0 };
            }
            CommandMode::Privileged => cmds.push(enable(enable_secret)),
            CommandMode::Config => {
                cmds.push(enable(enable_secret));
                if !opens_config_session(commands) {
                    cmds.push(CommandInput::from("configure terminal"));
                }
            }
        }

        let prepended = cmds.len();
        cmds.extend(commands.iter().cloned().map(CommandInput::from));
        Self { cmds, prepended }
    }
}

fn enable(secret: Option<&str>) -> CommandInput {
    match secret {
        Some(secret) => CommandInput::WithInput {
            cmd: "enable".into(),
            input: secret.into(),
        },
        None => CommandInput::from("enable"),
    }
}

/// A lone `enable` (or an abbreviation of it) as the first command.
fn opens_with_enable(commands: &[String]) -> bool {
    let Some(first) = commands.first() else {
        return false;
    };
    let mut tokens = first.split_whitespace();
    match (tokens.next(), tokens.next()) {
        (Some(token), None) => {
            let token = token.to_lowercase();
            token.len() >= 2 && "enable".starts_with(&token)
        }
        _ => false,
    }
}

fn opens_config_session(commands: &[String]) -> bool {
    commands
        .first()
        .and_then(|c| c.split_whitespace().next())
        .is_some_and(|token| token.to_lowercase().starts_with("conf"))
}

/// Coerce one reply to plain text.
///
/// Text replies carry an `output` string; anything else is pretty-printed JSON.
pub fn reply_text(reply: &Value) -> String {
    match reply.get("output").and_then(Value::as_str) {
        Some(output) => output.to_string(),
        None => serde_json::to_string_pretty(reply).unwrap_or_else(|_| reply.to_string()),
    }
}

/// Runs a command batch against switches, one at a time.
pub struct DispatchService {
    connector: Arc<dyn EapiConnector>,
}

impl DispatchService {
    pub fn new(connector: Arc<dyn EapiConnector>) -> Self {
        Self { connector }
    }

    /// Run the batch on one switch and collect everything it printed.
    ///
    /// Never fails: errors become lines in the returned record.
    #[instrument(skip_all, fields(switch = %target))]
    pub fn run_switch(
        &self,
        target: &SwitchTarget,
        batch: &CommandBatch,
        credentials: &Credentials,
        options: &RunOptions,
    ) -> OutputRecord {
        let mut record = OutputRecord::new(target.clone());
        record.push(format!("Processing switch {target}"));

        if let Err(e) = self.collect(&mut record, target, batch, credentials, options) {
            warn!("{target}: {e}");
            record.mark_failed();
            push_error(&mut record, target, &e);
        }

        record.push(SEPARATOR);
        record
    }

    fn collect(
        &self,
        record: &mut OutputRecord,
        target: &SwitchTarget,
        batch: &CommandBatch,
        credentials: &Credentials,
        options: &RunOptions,
    ) -> Result<(), EapiError> {
        let session = self.connector.connect(target, credentials)?;

        let hostname =
            session.run_cmds(&[CommandInput::from(HOSTNAME_COMMAND)], ReplyEncoding::Text)?;
        for reply in &hostname {
            record.push_text(&reply_text(reply));
        }

        if options.save_running_config {
            push_running_config(record, session.as_ref(), "before", options)?;
        }

        info!(
            "{target}: running {} command(s) in {} mode",
            batch.commands().len(),
            batch.mode()
        );
        let shape = CallShape::for_mode(
            batch.mode(),
            batch.commands(),
            options.enable_secret.as_deref(),
        );
        let replies = session.run_cmds(&shape.cmds, options.encoding)?;
        debug!("{target}: {} replies", replies.len());

        for (command, reply) in batch
            .commands()
            .iter()
            .zip(replies.iter().skip(shape.prepended))
        {
            record.push(format!("Running command: {command}"));
            record.push_text(&reply_text(reply));
        }

        if options.save_running_config {
            push_running_config(record, session.as_ref(), "after", options)?;
        }

        Ok(())
    }
}

fn push_running_config(
    record: &mut OutputRecord,
    session: &dyn EapiSession,
    timing: &str,
    options: &RunOptions,
) -> Result<(), EapiError> {
    let shape = CallShape::for_mode(
        CommandMode::Privileged,
        &[RUNNING_CONFIG_COMMAND.to_string()],
        options.enable_secret.as_deref(),
    );
    let replies = session.run_cmds(&shape.cmds, ReplyEncoding::Text)?;

    record.push(format!("Running-config from {timing}:"));
    for reply in replies.iter().skip(shape.prepended) {
        record.push_text(&reply_text(reply));
    }
    record.push(SEPARATOR);
    Ok(())
}

fn push_error(record: &mut OutputRecord, target: &SwitchTarget, error: &EapiError) {
    match error {
        EapiError::Connection {
            command, message, ..
        } => {
            record.push(format!("{CONNECTION_ERROR_MARKER}: {target}"));
            record.push(format!("Error command: {command}"));
            record.push(format!("Error message: {message}"));
        }
        other => {
            record.push(format!(
                "{ERROR_MARKER}: could not open connection to {target} or could not run command"
            ));
            record.push(format!("Exception msg = {other}"));
        }
    }
}
