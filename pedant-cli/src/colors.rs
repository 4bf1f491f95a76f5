//! ANSI color helpers for terminal output.

/// ANSI escape codes
pub mod ansi {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";
    pub const DIM: &str = "\x1b[2m";

    pub const RED: &str = "\x1b[31m";
    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const CYAN: &str = "\x1b[36m";
    pub const WHITE: &str = "\x1b[37m";
}

use ansi::{BOLD, CYAN, DIM, GREEN, RED, RESET, WHITE, YELLOW};

/// Persona speech (cyan)
pub fn persona(msg: &str) -> String {
    format!("{CYAN}{msg}{RESET}")
}

/// Warning message (yellow)
pub fn warning(msg: &str) -> String {
    format!("{YELLOW}{msg}{RESET}")
}

/// Secondary text (dim)
pub fn dim(msg: &str) -> String {
    format!("{DIM}{msg}{RESET}")
}

/// Header (bold)
pub fn header(msg: &str) -> String {
    format!("{BOLD}{msg}{RESET}")
}

/// Input prompt
pub fn prompt() -> String {
    format!("{BOLD}{WHITE}You: {RESET}")
}

/// Color for a sass level: green when mild, yellow when moderate, red when high.
pub fn for_intensity(level: u8) -> &'static str {
    match level {
        8.. => RED,
        5..=7 => YELLOW,
        _ => GREEN,
    }
}
