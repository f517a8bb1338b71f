//! Command execution: turns parsed arguments into a run

use std::io;

use clap::CommandFactory;
use clap_complete::{generate, Shell};
use tracing::{debug, info, instrument};

use crate::cli::args::Cli;
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::config::{global_config_path, Settings, Transport};
use crate::domain::{CommandBatch, OutputSink, ReplyEncoding, RunOptions};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::traits::{FileSystem, RealFileSystem};
use crate::infrastructure::InfraError;

/// Execute the parsed command line.
pub fn execute_command(cli: &Cli) -> CliResult<()> {
    if let Some(shell) = cli.completions {
        print_completions(shell);
        return Ok(());
    }

    let mut settings = Settings::load(cli.config.as_deref())?;
    apply_overrides(cli, &mut settings)?;

    if cli.show_config {
        output::info(&settings.to_toml()?);
        return Ok(());
    }
    if cli.init_config {
        return init_config();
    }

    let container = ServiceContainer::new(settings);
    run(cli, &container)
}

/// Resolve inputs and process every switch in order.
///
/// Per-switch failures end up in that switch's output; only problems with
/// the inputs themselves abort the run.
#[instrument(skip_all)]
pub fn run(cli: &Cli, container: &ServiceContainer) -> CliResult<()> {
    let settings = &container.settings;
    let resolver = container.input_resolver();

    let switches = resolver.switches(cli.switch.as_deref(), cli.switch_file.as_deref())?;
    let raw_commands = resolver.commands(cli.command.as_deref(), cli.command_file.as_deref())?;
    let batch = CommandBatch::parse(
        raw_commands.as_slice(),
        &settings.commands.ignore_prefixes,
    )?;

    let username = cli.username.as_deref().or(settings.username.as_deref());
    let credentials = resolver.credentials(username, cli.password.as_deref())?;

    let sink = output_sink(cli, settings);
    let options = run_options(cli);

    debug!("--- inputs ---");
    debug!("switches: {:?}", switches);
    debug!("commands ({} mode): {:?}", batch.mode(), batch.commands());
    debug!("credentials: {:?}", credentials);
    debug!("sink: {:?}", sink);
    debug!(
        "options: save={} encoding={:?}",
        options.save_running_config, options.encoding
    );

    let dispatch = container.dispatch_service();
    let writer = container.output_service();
    let mut failed = 0usize;

    for target in &switches {
        let record = dispatch.run_switch(target, &batch, &credentials, &options);
        if record.failed() {
            failed += 1;
        }
        if let Err(e) = writer.emit(&record, &sink) {
            output::error(&e);
        }
    }

    for path in writer.overwritten() {
        output::warning(&format!(
            "{} was written by more than one switch; only the last output is kept",
            path.display()
        ));
    }
    if failed > 0 {
        output::warning(&format!(
            "{failed} of {} switch(es) failed, see their output",
            switches.len()
        ));
    }
    info!("processed {} switch(es)", switches.len());
    Ok(())
}

/// Command line flags win over every config layer.
pub fn apply_overrides(cli: &Cli, settings: &mut Settings) -> CliResult<()> {
    if cli.insecure {
        settings.eapi.verify_tls = false;
    }
    if cli.http {
        settings.eapi.transport = Transport::Http;
    }
    if let Some(port) = cli.port {
        if port == 0 {
            return Err(CliError::InvalidArgs("port must be between 1 and 65535".into()));
        }
        settings.eapi.port = Some(port);
    }
    if cli.autocomplete {
        settings.eapi.autocomplete = true;
    }
    Ok(())
}

/// The single sink selected by the flags.
pub fn output_sink(cli: &Cli, settings: &Settings) -> OutputSink {
    if let Some(path) = &cli.output_file {
        OutputSink::SharedFile(path.clone())
    } else if cli.output_per_switch {
        OutputSink::PerSwitch {
            dir: settings.output.dir.clone(),
            extension: settings.output.extension.clone(),
        }
    } else {
        OutputSink::Stdout
    }
}

pub fn run_options(cli: &Cli) -> RunOptions {
    RunOptions {
        save_running_config: cli.save,
        encoding: if cli.json {
            ReplyEncoding::Json
        } else {
            ReplyEncoding::Text
        },
        enable_secret: cli.enable_secret.clone(),
    }
}

fn init_config() -> CliResult<()> {
    let fs = RealFileSystem;
    let path = global_config_path()
        .ok_or_else(|| CliError::Usage("cannot determine config directory".into()))?;
    if fs.exists(&path) {
        return Err(CliError::Usage(format!(
            "config already exists: {}",
            path.display()
        )));
    }
    fs.ensure_parent(&path)
        .and_then(|()| fs.write(&path, &Settings::template()))
        .map_err(|e| InfraError::create(&path, e))?;
    output::action("Created", &path.display());
    Ok(())
}

fn print_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
}
