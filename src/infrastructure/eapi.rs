//! Minimal Arista eAPI client
//!
//! eAPI is JSON-RPC 2.0 over HTTP(S): every request is a `POST /command-api`
//! calling `runCmds` with a list of CLI commands. The switch answers with one
//! result per command, or with a JSON-RPC error naming the failed command.

use std::time::Duration;

use reqwest::blocking::Client as HttpClient;
use reqwest::header::{HeaderValue, ACCEPT, CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, trace, warn};

use crate::config::{EapiConfig, Transport};
use crate::domain::{Credentials, ReplyEncoding, SwitchTarget};
use crate::infrastructure::traits::{EapiConnector, EapiSession};

const EAPI_PATH: &str = "/command-api";
const EAPI_VERSION: u8 = 1;

#[derive(Error, Debug)]
pub enum EapiError {
    /// The switch could not be reached at all.
    #[error("connection to {url} failed while sending [{command}]: {message}")]
    Connection {
        url: String,
        command: String,
        message: String,
    },

    #[error("HTTP {status} at {url}: {body}")]
    Http {
        url: String,
        status: u16,
        body: String,
    },

    /// The switch rejected one of the commands.
    #[error("command error {code}: {message}{}", format_details(.errors))]
    Command {
        code: i64,
        message: String,
        errors: Vec<String>,
    },

    #[error("could not decode reply from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}

fn format_details(errors: &[String]) -> String {
    if errors.is_empty() {
        String::new()
    } else {
        format!(" ({})", errors.join("; "))
    }
}

/// One entry of the `cmds` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum CommandInput {
    Plain(String),
    /// Command answering an interactive prompt, e.g. `enable` with a secret
    WithInput { cmd: String, input: String },
}

impl CommandInput {
    pub fn command(&self) -> &str {
        match self {
            Self::Plain(cmd) => cmd,
            Self::WithInput { cmd, .. } => cmd,
        }
    }
}

impl From<&str> for CommandInput {
    fn from(cmd: &str) -> Self {
        Self::Plain(cmd.to_string())
    }
}

impl From<String> for CommandInput {
    fn from(cmd: String) -> Self {
        Self::Plain(cmd)
    }
}

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    method: &'static str,
    params: RunCmdsParams<'a>,
    id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RunCmdsParams<'a> {
    version: u8,
    cmds: &'a [CommandInput],
    format: ReplyEncoding,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    auto_complete: bool,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Vec<Value>>,
    #[serde(default)]
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
    #[serde(default)]
    data: Vec<Value>,
}

impl RpcErrorBody {
    /// Collect the per-command `errors` strings the switch attaches in `data`.
    fn command_errors(&self) -> Vec<String> {
        self.data
            .iter()
            .filter_map(|entry| entry.get("errors"))
            .filter_map(Value::as_array)
            .flatten()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect()
    }
}

/// Builds sessions from eAPI settings.
#[derive(Debug, Clone)]
pub struct HttpEapiConnector {
    config: EapiConfig,
}

impl HttpEapiConnector {
    pub fn new(config: EapiConfig) -> Self {
        if !config.verify_tls && config.transport == Transport::Https {
            warn!("TLS certificate verification is disabled");
        }
        Self { config }
    }

    /// URL of the command endpoint for a target.
    ///
    /// A port written into the target wins over the configured one.
    pub fn endpoint(&self, target: &SwitchTarget) -> String {
        let scheme = match self.config.transport {
            Transport::Http => "http",
            Transport::Https => "https",
        };
        let port = match (target.port(), self.config.port) {
            (Some(own), Some(configured)) if own != configured => {
                debug!("{target}: using its own port {own}, not {configured}");
                None
            }
            (Some(_), _) => None,
            (None, configured) => configured,
        };
        match port {
            Some(port) => format!("{scheme}://{target}:{port}{EAPI_PATH}"),
            None => format!("{scheme}://{target}{EAPI_PATH}"),
        }
    }
}

impl EapiConnector for HttpEapiConnector {
    fn connect(
        &self,
        target: &SwitchTarget,
        credentials: &Credentials,
    ) -> Result<Box<dyn EapiSession>, EapiError> {
        let client = HttpClient::builder()
            .danger_accept_invalid_certs(!self.config.verify_tls)
            .timeout(Duration::from_secs(self.config.timeout_secs))
            .build()?;
        let url = self.endpoint(target);
        debug!("connect: {url} as {}", credentials.username);

        Ok(Box::new(HttpEapiSession {
            client,
            url,
            credentials: credentials.clone(),
            autocomplete: self.config.autocomplete,
        }))
    }
}

/// Session against one switch; dropped once the switch is done.
pub struct HttpEapiSession {
    client: HttpClient,
    url: String,
    credentials: Credentials,
    autocomplete: bool,
}

impl HttpEapiSession {
    fn joined(cmds: &[CommandInput]) -> String {
        cmds.iter()
            .map(CommandInput::command)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl EapiSession for HttpEapiSession {
    fn run_cmds(
        &self,
        cmds: &[CommandInput],
        encoding: ReplyEncoding,
    ) -> Result<Vec<Value>, EapiError> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            method: "runCmds",
            params: RunCmdsParams {
                version: EAPI_VERSION,
                cmds,
                format: encoding,
                auto_complete: self.autocomplete,
            },
            id: uuid::Uuid::new_v4().to_string(),
        };
        trace!("runCmds {}: [{}]", self.url, Self::joined(cmds));

        let response = self
            .client
            .post(&self.url)
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .header(
                USER_AGENT,
                HeaderValue::from_static(concat!("eapicmd/", env!("CARGO_PKG_VERSION"))),
            )
            .basic_auth(&self.credentials.username, Some(&self.credentials.password))
            .json(&request)
            .send()
            .map_err(|e| EapiError::Connection {
                url: self.url.clone(),
                command: Self::joined(cmds),
                message: e.to_string(),
            })?;

        let status = response.status();
        let body = response.text().map_err(|e| EapiError::Connection {
            url: self.url.clone(),
            command: Self::joined(cmds),
            message: e.to_string(),
        })?;
        if !status.is_success() {
            return Err(EapiError::Http {
                url: self.url.clone(),
                status: status.as_u16(),
                body,
            });
        }

        let reply: RpcResponse = serde_json::from_str(&body).map_err(|e| EapiError::Decode {
            url: self.url.clone(),
            message: e.to_string(),
        })?;

        if let Some(error) = reply.error {
            return Err(EapiError::Command {
                code: error.code,
                errors: error.command_errors(),
                message: error.message,
            });
        }

        let results = reply.result.ok_or_else(|| EapiError::Decode {
            url: self.url.clone(),
            message: "reply has neither result nor error".to_string(),
        })?;
        if results.len() != cmds.len() {
            return Err(EapiError::Decode {
                url: self.url.clone(),
                message: format!("expected {} results, got {}", cmds.len(), results.len()),
            });
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn connector(transport: Transport, port: Option<u16>) -> HttpEapiConnector {
        HttpEapiConnector::new(EapiConfig {
            transport,
            port,
            ..EapiConfig::default()
        })
    }

    #[test]
    fn given_https_default_when_endpoint_then_no_port() {
        let target = SwitchTarget::parse("spine1").unwrap();
        assert_eq!(
            connector(Transport::Https, None).endpoint(&target),
            "https://spine1/command-api"
        );
    }

    #[test]
    fn given_port_when_endpoint_then_port_appended() {
        let target = SwitchTarget::parse("10.1.1.1").unwrap();
        assert_eq!(
            connector(Transport::Http, Some(8080)).endpoint(&target),
            "http://10.1.1.1:8080/command-api"
        );
    }

    #[test]
    fn given_target_with_own_port_and_configured_port_when_endpoint_then_target_port_wins() {
        let target = SwitchTarget::parse("leaf1:8443").unwrap();
        assert_eq!(
            connector(Transport::Https, Some(443)).endpoint(&target),
            "https://leaf1:8443/command-api"
        );
    }

    #[test]
    fn given_enable_with_secret_when_serialized_then_uses_cmd_input_object() {
        let cmds = vec![
            CommandInput::WithInput {
                cmd: "enable".into(),
                input: "s3cret".into(),
            },
            CommandInput::from("show clock"),
        ];
        let params = RunCmdsParams {
            version: 1,
            cmds: &cmds,
            format: ReplyEncoding::Text,
            auto_complete: false,
        };

        let value = serde_json::to_value(&params).unwrap();

        assert_eq!(
            value,
            json!({
                "version": 1,
                "cmds": [{"cmd": "enable", "input": "s3cret"}, "show clock"],
                "format": "text"
            })
        );
    }

    #[test]
    fn given_autocomplete_when_serialized_then_flag_present() {
        let cmds = vec![CommandInput::from("sh ver")];
        let params = RunCmdsParams {
            version: 1,
            cmds: &cmds,
            format: ReplyEncoding::Json,
            auto_complete: true,
        };

        let value = serde_json::to_value(&params).unwrap();

        assert_eq!(value["autoComplete"], json!(true));
        assert_eq!(value["format"], json!("json"));
    }

    #[test]
    fn given_error_data_when_command_errors_then_collects_strings() {
        let body: RpcErrorBody = serde_json::from_value(json!({
            "code": 1002,
            "message": "CLI command 2 of 2 'show bogus' failed: invalid command",
            "data": [{}, {"errors": ["Invalid input (at token 1: 'bogus')"]}]
        }))
        .unwrap();

        assert_eq!(
            body.command_errors(),
            vec!["Invalid input (at token 1: 'bogus')".to_string()]
        );
    }
}
