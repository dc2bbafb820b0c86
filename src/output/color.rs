//! ANSI coloring of status tokens

use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Colors used for status tokens
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Color {
    Green,
    Red,
    Yellow,
}

impl Color {
    fn sgr(self) -> &'static str {
        match self {
            Color::Green => "\x1b[32m",
            Color::Red => "\x1b[31m",
            Color::Yellow => "\x1b[33m",
        }
    }
}

const RESET: &str = "\x1b[0m";

/// When to emit color
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    /// Only when the stream is a terminal and `NO_COLOR` is unset
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorMode {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "auto" => Some(ColorMode::Auto),
            "always" | "on" | "true" => Some(ColorMode::Always),
            "never" | "off" | "false" => Some(ColorMode::Never),
            _ => None,
        }
    }

    /// Resolve against the capabilities of the target stream
    pub fn enabled(self, stream_is_terminal: bool) -> bool {
        match self {
            ColorMode::Always => true,
            ColorMode::Never => false,
            ColorMode::Auto => stream_is_terminal && std::env::var_os("NO_COLOR").is_none(),
        }
    }
}

/// Wraps tokens in a color when enabled, identity otherwise
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ColorFormatter {
    enabled: bool,
}

impl ColorFormatter {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn paint<'a>(&self, text: &'a str, color: Color) -> Cow<'a, str> {
        if self.enabled {
            Cow::Owned(format!("{}{text}{RESET}", color.sgr()))
        } else {
            Cow::Borrowed(text)
        }
    }
}
