//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueHint};

/// Run commands against one or many Arista switches over eAPI and collect the output.
///
/// The first command decides how the whole batch runs: `show ...` as a query,
/// `enable ...` with privileges, `configure ...` as a configuration change.
#[derive(Parser, Debug)]
#[command(name = "eapicmd")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Single target switch
    #[arg(short = 't', long = "switch", value_name = "HOST", conflicts_with = "switch_file")]
    pub switch: Option<String>,

    /// File listing target switches, one per line
    #[arg(short = 'T', long, value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub switch_file: Option<PathBuf>,

    /// Username to log in with (prompted for if omitted)
    #[arg(short, long, env = "EAPICMD_USERNAME")]
    pub username: Option<String>,

    /// Password to log in with (prompted for if omitted)
    #[arg(short, long, env = "EAPICMD_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Single command to send; enter the entire command
    #[arg(short, long, conflicts_with = "command_file")]
    pub command: Option<String>,

    /// File listing commands, one per line; `!` and `#` lines are comments
    #[arg(short = 'C', long, value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub command_file: Option<PathBuf>,

    /// Capture running-config before and after the commands
    #[arg(long)]
    pub save: bool,

    /// Append all output to a single file
    #[arg(short = 'o', long, value_name = "FILE", value_hint = ValueHint::FilePath, conflicts_with = "output_per_switch")]
    pub output_file: Option<PathBuf>,

    /// Write each switch's output to its own file
    #[arg(short = 'O', long)]
    pub output_per_switch: bool,

    /// Debug output (repeat for more: -d info, -dd debug, -ddd trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub debug: u8,

    /// Skip TLS certificate verification
    #[arg(long)]
    pub insecure: bool,

    /// Use plain HTTP instead of HTTPS
    #[arg(long)]
    pub http: bool,

    /// Port of the command API
    #[arg(long)]
    pub port: Option<u16>,

    /// Secret for `enable`, if the switch requires one
    #[arg(long, env = "EAPICMD_ENABLE_SECRET", hide_env_values = true)]
    pub enable_secret: Option<String>,

    /// Let the switch expand abbreviated commands ("sh ip int b")
    #[arg(long)]
    pub autocomplete: bool,

    /// Request JSON replies (printed as-is, pretty)
    #[arg(long)]
    pub json: bool,

    /// Config file (in addition to the global one)
    #[arg(long, value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Print the effective configuration and exit
    #[arg(long)]
    pub show_config: bool,

    /// Create a global config template and exit
    #[arg(long)]
    pub init_config: bool,

    /// Print shell completions and exit
    #[arg(long, value_enum, value_name = "SHELL")]
    pub completions: Option<clap_complete::Shell>,
}
