//! Volume commands
//!
//! The three keyboard-driven commands the host delivers as wire
//! strings. Reset is a distinct dispatcher entry point, not a command:
//! it ends the session rather than mutating it.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    /// Flip the tab's mute state
    #[serde(rename = "volume-mute")]
    MuteToggle,
    /// Raise the volume by one step
    #[serde(rename = "volume-up")]
    VolumeUp,
    /// Lower the volume by one step
    #[serde(rename = "volume-down")]
    VolumeDown,
}

impl Command {
    /// Parse a host command string. Unknown names yield `None` and are
    /// ignored by the caller.
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim() {
            "volume-mute" => Some(Command::MuteToggle),
            "volume-up" => Some(Command::VolumeUp),
            "volume-down" => Some(Command::VolumeDown),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Command::MuteToggle => "volume-mute",
            Command::VolumeUp => "volume-up",
            Command::VolumeDown => "volume-down",
        }
    }
}
