//! MIDI input: connects to a MIDI device and feeds its messages to the
//! engine.

use std::io;

use midir::{MidiInput as MidirInput, MidiInputConnection};
use tracing::{debug, info};

use super::config::MidiConfig;
use super::message::MidiMessage;
use crate::engine::SharedEngine;

/// Active MIDI input connection. Dropping it closes the port.
pub struct MidiInput {
    _connection: MidiInputConnection<()>,
    port_name: String,
}

impl MidiInput {
    /// Open the first port the config wants and route its messages into
    /// `engine`.
    pub fn start(config: &MidiConfig, engine: SharedEngine) -> io::Result<Self> {
        let midi_in =
            MidirInput::new("glitch").map_err(|e| io::Error::other(format!("MIDI init: {e}")))?;

        let ports = midi_in.ports();
        if ports.is_empty() {
            return Err(io::Error::other("no MIDI input ports available"));
        }

        let (port, port_name) = ports
            .iter()
            .find_map(|p| {
                let name = midi_in.port_name(p).ok()?;
                config.wants_port(&name).then(|| (p.clone(), name))
            })
            .ok_or_else(|| {
                let wanted = config.device_name.as_deref().unwrap_or("any");
                io::Error::other(format!("no MIDI input matching '{wanted}'"))
            })?;

        let channel_filter = config.channel_filter;
        let connection = midi_in
            .connect(
                &port,
                "glitch-input",
                move |_timestamp, bytes, _| route(bytes, channel_filter, &engine),
                (),
            )
            .map_err(|e| io::Error::other(format!("MIDI connect: {e}")))?;

        info!(port = %port_name, "MIDI input connected");
        Ok(Self {
            _connection: connection,
            port_name,
        })
    }

    /// Get the connected port name.
    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    /// List all available MIDI input device names.
    pub fn list_devices() -> Vec<String> {
        let Ok(midi_in) = MidirInput::new("glitch-list") else {
            return Vec::new();
        };
        midi_in
            .ports()
            .iter()
            .filter_map(|p| midi_in.port_name(p).ok())
            .collect()
    }
}

/// Apply one raw message unless the channel filter rejects it.
pub fn route(bytes: &[u8], channel_filter: Option<u8>, engine: &SharedEngine) {
    match MidiMessage::parse(bytes) {
        Some(msg) if msg.accepts(channel_filter) => engine.midi(bytes),
        Some(msg) => debug!(?msg, "filtered by channel"),
        None => debug!(?bytes, "ignoring malformed MIDI message"),
    }
}
