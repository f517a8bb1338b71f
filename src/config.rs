//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/eapicmd/eapicmd.toml`
//! 3. Explicit config file (`--config`)
//! 4. Environment variables: `EAPICMD_*` prefix, `__` for nesting
//!
//! Command line flags are applied on top by the CLI layer.

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;

/// Transport used to reach the command API.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    Http,
    #[default]
    Https,
}

/// Settings for talking to switches.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EapiConfig {
    pub transport: Transport,
    /// Port override; scheme default when unset
    pub port: Option<u16>,
    /// Verify the switch's TLS certificate
    pub verify_tls: bool,
    /// HTTP request timeout in seconds
    pub timeout_secs: u64,
    /// Let the switch expand abbreviated commands
    pub autocomplete: bool,
}

impl Default for EapiConfig {
    fn default() -> Self {
        Self {
            transport: Transport::Https,
            port: None,
            verify_tls: true,
            timeout_secs: 60,
            autocomplete: false,
        }
    }
}

/// Settings for file output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory for per-switch files
    pub dir: PathBuf,
    /// Extension for per-switch files (empty for none)
    pub extension: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            extension: "txt".into(),
        }
    }
}

/// Settings for reading command lists.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CommandsConfig {
    /// Command lines starting with any of these are comments
    pub ignore_prefixes: Vec<String>,
}

impl Default for CommandsConfig {
    fn default() -> Self {
        Self {
            ignore_prefixes: vec!["!".into(), "#".into()],
        }
    }
}

/// Unified configuration for eapicmd.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Default login name; prompted for when unset
    pub username: Option<String>,
    pub eapi: EapiConfig,
    pub output: OutputConfig,
    pub commands: CommandsConfig,
}

/// Get the XDG config directory for eapicmd.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "eapicmd").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("eapicmd.toml"))
}

impl Settings {
    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `explicit` - Config file given on the command line; must exist
    pub fn load(explicit: Option<&Path>) -> Result<Self, ApplicationError> {
        let global = global_config_path();
        Self::load_layers(global.as_deref(), explicit)
    }

    /// Load settings from the given global and explicit files plus `EAPICMD_*` variables.
    pub fn load_layers(
        global: Option<&Path>,
        explicit: Option<&Path>,
    ) -> Result<Self, ApplicationError> {
        let mut builder = Config::builder();

        if let Some(global_path) = global {
            if global_path.exists() {
                builder = builder.add_source(File::from(global_path).required(false));
            }
        }

        if let Some(path) = explicit {
            builder = builder.add_source(File::from(path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix("EAPICMD")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("commands.ignore_prefixes"),
        );

        let config = builder.build().map_err(config_err)?;
        let mut settings: Self = config.try_deserialize().map_err(config_err)?;

        settings.expand_paths();

        Ok(settings)
    }

    /// Expand `~`, `$VAR` and `${VAR}` in the output directory.
    fn expand_paths(&mut self) {
        let raw = self.output.dir.to_string_lossy().to_string();
        if let Ok(expanded) = shellexpand::full(&raw) {
            self.output.dir = PathBuf::from(expanded.as_ref());
        }
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r##"# eapicmd configuration
#
# Locations (by precedence, lowest to highest):
#   Global:   ~/.config/eapicmd/eapicmd.toml
#   Explicit: --config <file>
#   Env:      EAPICMD_* environment variables, e.g. EAPICMD_EAPI__VERIFY_TLS=false
#   Flags:    command line options win over everything

# Default login name (prompted for when unset)
# username = "admin"

[eapi]
# "https" or "http"
# transport = "https"

# Port override (defaults to the scheme's port)
# port = 443

# Verify switch TLS certificates. Only turn off for lab gear with self-signed certs.
# verify_tls = true

# Request timeout in seconds
# timeout_secs = 60

# Let the switch expand abbreviated commands like "sh ip int b"
# autocomplete = false

[output]
# Directory for --output-per-switch files
# dir = "."

# Extension for per-switch files
# extension = "txt"

[commands]
# Lines in command files starting with these are comments
# ignore_prefixes = ["!", "#"]
"##
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
