//! Terminal output formatting with colors
//!
//! Respects NO_COLOR, CLICOLOR, CLICOLOR_FORCE automatically.

use colored::Colorize;

/// Print error (red bold "error:" prefix) to stderr
pub fn error(msg: &(impl std::fmt::Display + ?Sized)) {
    eprintln!("{}: {}", "error".red().bold(), msg);
}

/// Print warning (yellow "Warning:" prefix) to stderr
pub fn warning(msg: &(impl std::fmt::Display + ?Sized)) {
    eprintln!("{}: {}", "Warning".yellow(), msg);
}

/// Print completed action (green label)
pub fn action(label: &str, msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}: {}", label.green(), msg);
}

/// Print plain output (no color, for data)
pub fn info(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}", msg);
}

/// Print prompt without newline (cyan) to stderr, keeping stdout for output
pub fn prompt(msg: &(impl std::fmt::Display + ?Sized)) {
    use std::io::Write;
    eprint!("{} ", msg.to_string().cyan());
    std::io::stderr().flush().ok();
}
