//! OSC configuration: listen address and address prefix.

use serde::{Deserialize, Serialize};

/// The `osc` section of the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OscConfig {
    /// UDP port to listen on.
    #[serde(default = "default_port")]
    pub listen_port: u16,
    /// Interface to bind.
    #[serde(default = "default_bind")]
    pub bind_address: String,
    /// Address prefix for all commands.
    #[serde(default = "default_prefix")]
    pub prefix: String,
}

fn default_port() -> u16 {
    9000
}

fn default_bind() -> String {
    "127.0.0.1".to_string()
}

fn default_prefix() -> String {
    "/glitch".to_string()
}

impl Default for OscConfig {
    fn default() -> Self {
        Self {
            listen_port: default_port(),
            bind_address: default_bind(),
            prefix: default_prefix(),
        }
    }
}
