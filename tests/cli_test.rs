//! End-to-end runs through the CLI layer with scripted switches

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};

use clap::Parser;
use serde_json::{json, Value};
use tempfile::TempDir;

use eapicmd::cli::commands::{apply_overrides, run};
use eapicmd::cli::Cli;
use eapicmd::config::{Settings, Transport};
use eapicmd::domain::{Credentials, ReplyEncoding, SwitchTarget, SEPARATOR};
use eapicmd::exitcode;
use eapicmd::infrastructure::di::ServiceContainer;
use eapicmd::infrastructure::eapi::{CommandInput, EapiError};
use eapicmd::infrastructure::traits::{
    Console, EapiConnector, EapiSession, Prompter, RealFileSystem,
};
use eapicmd::util::testing::init_test_setup;

// ============================================================
// Test doubles
// ============================================================

/// Switches that echo commands back; `down` ones refuse connections.
#[derive(Default)]
struct EchoSwitches {
    down: Vec<String>,
    logins: Mutex<Vec<(String, String)>>,
}

impl EapiConnector for EchoSwitches {
    fn connect(
        &self,
        target: &SwitchTarget,
        credentials: &Credentials,
    ) -> Result<Box<dyn EapiSession>, EapiError> {
        self.logins
            .lock()
            .unwrap()
            .push((target.to_string(), credentials.username.clone()));
        Ok(Box::new(EchoSession {
            target: target.to_string(),
            down: self.down.contains(&target.to_string()),
        }))
    }
}

struct EchoSession {
    target: String,
    down: bool,
}

impl EapiSession for EchoSession {
    fn run_cmds(
        &self,
        cmds: &[CommandInput],
        _encoding: ReplyEncoding,
    ) -> Result<Vec<Value>, EapiError> {
        if self.down {
            return Err(EapiError::Connection {
                url: format!("https://{}/command-api", self.target),
                command: cmds[0].command().to_string(),
                message: "timed out".into(),
            });
        }
        Ok(cmds
            .iter()
            .map(|c| match c.command() {
                "show hostname" => json!({"output": format!("Hostname: {}\n", self.target)}),
                other => json!({"output": format!("{} says {other}\n", self.target)}),
            })
            .collect())
    }
}

#[derive(Default)]
struct QueuedPrompter {
    answers: Mutex<VecDeque<String>>,
    asked: Mutex<Vec<String>>,
}

impl Prompter for QueuedPrompter {
    fn prompt_line(&self, message: &str) -> io::Result<String> {
        self.prompt_secret(message)
    }

    fn prompt_secret(&self, message: &str) -> io::Result<String> {
        self.asked.lock().unwrap().push(message.to_string());
        self.answers
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "stdin closed"))
    }
}

#[derive(Default)]
struct CapturedStdout(Mutex<String>);

impl Console for CapturedStdout {
    fn print(&self, text: &str) -> io::Result<()> {
        self.0.lock().unwrap().push_str(text);
        Ok(())
    }
}

struct Harness {
    switches: Arc<EchoSwitches>,
    prompter: Arc<QueuedPrompter>,
    stdout: Arc<CapturedStdout>,
    container: ServiceContainer,
}

fn harness(settings: Settings, switches: EchoSwitches, answers: &[&str]) -> Harness {
    init_test_setup();
    let switches = Arc::new(switches);
    let prompter = Arc::new(QueuedPrompter {
        answers: Mutex::new(answers.iter().map(|a| a.to_string()).collect()),
        ..QueuedPrompter::default()
    });
    let stdout = Arc::new(CapturedStdout::default());
    let container = ServiceContainer::with_deps(
        settings,
        Arc::new(RealFileSystem),
        prompter.clone(),
        stdout.clone(),
        switches.clone(),
    );
    Harness {
        switches,
        prompter,
        stdout,
        container,
    }
}

// ============================================================
// Argument parsing
// ============================================================

#[test]
fn given_switch_and_switch_file_when_parse_then_rejected() {
    let result = Cli::try_parse_from(["eapicmd", "-t", "leaf1", "-T", "switches.txt"]);
    assert!(result.is_err());
}

#[test]
fn given_both_output_modes_when_parse_then_rejected() {
    let result = Cli::try_parse_from(["eapicmd", "-o", "all.txt", "-O"]);
    assert!(result.is_err());
}

#[test]
fn given_port_zero_when_apply_overrides_then_usage_error() {
    let cli = Cli::try_parse_from(["eapicmd", "--port", "0"]).unwrap();
    let mut settings = Settings::default();

    let err = apply_overrides(&cli, &mut settings).unwrap_err();

    assert_eq!(err.exit_code(), exitcode::USAGE);
}

#[test]
fn given_transport_flags_when_apply_overrides_then_flags_beat_config() {
    let cli =
        Cli::try_parse_from(["eapicmd", "--http", "--insecure", "--port", "8080"]).unwrap();
    let mut settings = Settings::default();

    apply_overrides(&cli, &mut settings).unwrap();

    assert_eq!(settings.eapi.transport, Transport::Http);
    assert!(!settings.eapi.verify_tls);
    assert_eq!(settings.eapi.port, Some(8080));
}

// ============================================================
// Full runs
// ============================================================

#[test]
fn given_switch_list_with_dead_switch_when_run_per_switch_then_every_switch_gets_a_file() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let switch_file = temp.path().join("switches.txt");
    std::fs::write(&switch_file, "leaf1\nleaf2\nleaf3\n").unwrap();
    let out_dir = temp.path().join("out");
    let mut settings = Settings::default();
    settings.output.dir = out_dir.clone();
    let h = harness(
        settings,
        EchoSwitches {
            down: vec!["leaf2".into()],
            ..EchoSwitches::default()
        },
        &[],
    );
    let cli = Cli::try_parse_from([
        "eapicmd",
        "-T",
        switch_file.to_str().unwrap(),
        "-c",
        "show version",
        "-u",
        "admin",
        "-p",
        "pw",
        "-O",
    ])
    .unwrap();

    // Act
    run(&cli, &h.container).unwrap();

    // Assert
    let leaf1 = std::fs::read_to_string(out_dir.join("leaf1.txt")).unwrap();
    assert_eq!(
        leaf1,
        format!(
            "Processing switch leaf1\nHostname: leaf1\nRunning command: show version\nleaf1 says show version\n{SEPARATOR}\n"
        )
    );
    let leaf2 = std::fs::read_to_string(out_dir.join("leaf2.txt")).unwrap();
    assert!(leaf2.contains("CONNECTION ERROR: leaf2"));
    let leaf3 = std::fs::read_to_string(out_dir.join("leaf3.txt")).unwrap();
    assert!(leaf3.contains("leaf3 says show version"));

    assert!(h.stdout.0.lock().unwrap().is_empty());
    assert!(h.prompter.asked.lock().unwrap().is_empty());
    let visited: Vec<String> = h
        .switches
        .logins
        .lock()
        .unwrap()
        .iter()
        .map(|(t, _)| t.clone())
        .collect();
    assert_eq!(visited, vec!["leaf1", "leaf2", "leaf3"]);
}

#[test]
fn given_no_flags_when_run_then_prompts_and_prints_to_stdout() {
    // Arrange
    let h = harness(
        Settings::default(),
        EchoSwitches::default(),
        &["leaf1", "show clock", "admin", "pw"],
    );
    let cli = Cli::try_parse_from(["eapicmd"]).unwrap();

    // Act
    run(&cli, &h.container).unwrap();

    // Assert
    assert_eq!(
        *h.prompter.asked.lock().unwrap(),
        vec![
            "Enter the IP of the switch to connect to:",
            "Enter the command to run:",
            "Enter your username:",
            "Enter your password:",
        ]
    );
    let printed = h.stdout.0.lock().unwrap().clone();
    assert!(printed.starts_with("Processing switch leaf1\n"));
    assert!(printed.contains("Running command: show clock\nleaf1 says show clock\n"));
}

#[test]
fn given_username_in_settings_when_run_then_only_password_prompted() {
    // Arrange
    let settings = Settings {
        username: Some("netops".into()),
        ..Settings::default()
    };
    let h = harness(settings, EchoSwitches::default(), &["pw"]);
    let cli = Cli::try_parse_from(["eapicmd", "-t", "leaf1", "-c", "show clock"]).unwrap();

    // Act
    run(&cli, &h.container).unwrap();

    // Assert
    assert_eq!(
        *h.prompter.asked.lock().unwrap(),
        vec!["Enter your password:"]
    );
    assert_eq!(
        *h.switches.logins.lock().unwrap(),
        vec![("leaf1".to_string(), "netops".to_string())]
    );
}

#[test]
fn given_unrecognized_command_when_run_then_dataerr_before_any_connection() {
    // Arrange
    let h = harness(Settings::default(), EchoSwitches::default(), &[]);
    let cli = Cli::try_parse_from([
        "eapicmd", "-t", "leaf1", "-c", "reload now", "-u", "admin", "-p", "pw",
    ])
    .unwrap();

    // Act
    let err = run(&cli, &h.container).unwrap_err();

    // Assert
    assert_eq!(err.exit_code(), exitcode::DATAERR);
    assert!(h.switches.logins.lock().unwrap().is_empty());
    assert!(h.stdout.0.lock().unwrap().is_empty());
}

#[test]
fn given_missing_command_file_when_run_then_noinput() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let h = harness(Settings::default(), EchoSwitches::default(), &[]);
    let missing = temp.path().join("commands.txt");
    let cli = Cli::try_parse_from([
        "eapicmd",
        "-t",
        "leaf1",
        "-C",
        missing.to_str().unwrap(),
    ])
    .unwrap();

    // Act
    let err = run(&cli, &h.container).unwrap_err();

    // Assert
    assert_eq!(err.exit_code(), exitcode::NOINPUT);
}

#[test]
fn given_switch_file_with_malformed_line_when_run_then_valid_switches_still_processed() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let switch_file = temp.path().join("switches.txt");
    std::fs::write(&switch_file, "leaf1\nleaf2 core-rack\nleaf3\n").unwrap();
    let h = harness(Settings::default(), EchoSwitches::default(), &[]);
    let cli = Cli::try_parse_from([
        "eapicmd",
        "-T",
        switch_file.to_str().unwrap(),
        "-c",
        "show clock",
        "-u",
        "admin",
        "-p",
        "pw",
    ])
    .unwrap();

    // Act
    run(&cli, &h.container).unwrap();

    // Assert
    let visited: Vec<String> = h
        .switches
        .logins
        .lock()
        .unwrap()
        .iter()
        .map(|(t, _)| t.clone())
        .collect();
    assert_eq!(visited, vec!["leaf1", "leaf3"]);
    let printed = h.stdout.0.lock().unwrap().clone();
    assert!(printed.contains("leaf3 says show clock"));
}
