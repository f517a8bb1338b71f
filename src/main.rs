use std::process;

use clap::Parser;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, Layer};

use eapicmd::cli::commands::execute_command;
use eapicmd::cli::{output, Cli};
use eapicmd::exitcode;

fn main() {
    let cli = Cli::parse();

    setup_logging(cli.debug);

    let code = match execute_command(&cli) {
        Ok(()) => exitcode::OK,
        Err(e) => {
            output::error(&e);
            e.exit_code()
        }
    };
    process::exit(code);
}

fn setup_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        3 => LevelFilter::TRACE,
        _ => {
            eprintln!("Don't be crazy, max is -d -d -d");
            LevelFilter::TRACE
        }
    };

    // HTTP internals are only interesting at trace level
    let noisy_modules = ["hyper", "reqwest", "rustls"];
    let quiet = verbosity < 3;
    let module_filter = filter_fn(move |metadata| {
        !quiet
            || !noisy_modules
                .iter()
                .any(|name| metadata.target().starts_with(name))
    });

    // Formatted output directed to stderr; stdout carries switch output
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_names(false)
        .with_span_events(FmtSpan::CLOSE);

    let filtered_layer = fmt_layer.with_filter(filter).with_filter(module_filter);

    tracing_subscriber::registry().with(filtered_layer).init();

    match filter {
        LevelFilter::INFO => tracing::info!("Debug mode: info"),
        LevelFilter::DEBUG => tracing::debug!("Debug mode: debug"),
        LevelFilter::TRACE => tracing::debug!("Debug mode: trace"),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // https://docs.rs/clap/latest/clap/_derive/_tutorial/index.html#testing
    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
