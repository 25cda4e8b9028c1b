//! The `midi` config section.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MidiConfig {
    /// Case-insensitive substring of the input port to open. `None` opens
    /// the first port.
    pub device_name: Option<String>,
    /// Zero-based channel to listen on; `None` listens on all sixteen.
    pub channel_filter: Option<u8>,
}

impl MidiConfig {
    /// Whether a port called `port_name` is the one asked for.
    pub fn wants_port(&self, port_name: &str) -> bool {
        match &self.device_name {
            Some(wanted) => port_name.to_lowercase().contains(&wanted.to_lowercase()),
            None => true,
        }
    }
}
