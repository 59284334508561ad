//! Operator-facing output for the gate.
//!
//! Progress goes to stdout; the single failure line goes to stderr.

use colored::Colorize;

/// `== Title ==`, preceded by a blank line except for the first section.
pub fn section(title: &str, first: bool) {
    if !first {
        println!();
    }
    println!("{}", format!("== {} ==", title).bold());
}

pub fn skip(what: &str, reason: &str) {
    println!("{}", format!("(skip) {}: {}", what, reason).dimmed());
}

pub fn note(message: &str) {
    println!("{} {}", "▸".bright_cyan(), message);
}

pub fn success(message: &str) {
    println!("{} {}", "✓".bright_green(), message.bright_green());
}

/// Join the non-empty lines of `message`; text within a line is untouched.
pub fn single_line(message: &str) -> String {
    message
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// The failure line: exactly one line on stderr, message otherwise verbatim.
pub fn failure_line(message: &str) -> String {
    format!("PRE-FLIGHT FAILED: {}", single_line(message))
}
