//! OSC message mapping: converts OSC addresses and arguments to engine
//! commands.
//!
//! Addresses live under a configurable prefix (`/glitch` by default):
//! - `<prefix>/play <script>` compiles and queues a script
//! - `<prefix>/set <name> <value>` sets a variable
//! - `<prefix>/midi <status> <data1> <data2>` injects a MIDI message
//! - `<prefix>/volume <gain>` sets the output volume (0..1)
//! - `<prefix>/mute <flag>` mutes or unmutes the output

use rosc::{OscMessage, OscType};
use tracing::{debug, warn};

use crate::audio::AudioControl;
use crate::engine::SharedEngine;

/// A control command decoded from an OSC message.
#[derive(Debug, Clone, PartialEq)]
pub enum OscCommand {
    Play(String),
    Set { name: String, value: f32 },
    Midi([u8; 3]),
    Volume(f32),
    Mute(bool),
}

impl OscCommand {
    /// Decode `msg`, or `None` when the address or arguments do not match.
    pub fn parse(msg: &OscMessage, prefix: &str) -> Option<Self> {
        let command = msg.addr.strip_prefix(prefix)?;
        match command {
            "/play" => extract_string(&msg.args, 0).map(OscCommand::Play),
            "/set" => Some(OscCommand::Set {
                name: extract_string(&msg.args, 0)?,
                value: extract_float(&msg.args, 1)?,
            }),
            "/midi" => {
                let byte = |i| extract_int(&msg.args, i).map(|v| v.clamp(0, 255) as u8);
                Some(OscCommand::Midi([byte(0)?, byte(1)?, byte(2)?]))
            }
            "/volume" => extract_float(&msg.args, 0).map(OscCommand::Volume),
            "/mute" => extract_bool(&msg.args, 0).map(OscCommand::Mute),
            _ => None,
        }
    }

    /// Apply the command to the engine, or to the audio output for volume
    /// and mute. Without an output those two are dropped.
    pub fn apply(self, engine: &SharedEngine, audio: Option<&AudioControl>) {
        match self {
            OscCommand::Play(script) => match engine.compile(&script) {
                Ok(()) => debug!("script queued from OSC"),
                Err(e) => warn!("OSC script rejected: {e}"),
            },
            OscCommand::Set { name, value } => {
                engine.set(&name, value);
            }
            OscCommand::Midi(bytes) => engine.midi(&bytes),
            OscCommand::Volume(volume) => {
                if let Some(audio) = audio {
                    if let Err(e) = audio.set_volume(volume) {
                        warn!("OSC volume dropped: {e}");
                    }
                } else {
                    debug!("no audio output for OSC volume");
                }
            }
            OscCommand::Mute(muted) => {
                if let Some(audio) = audio {
                    if let Err(e) = audio.set_muted(muted) {
                        warn!("OSC mute dropped: {e}");
                    }
                } else {
                    debug!("no audio output for OSC mute");
                }
            }
        }
    }
}

/// Decode and apply a message. Unknown addresses are logged and ignored.
pub fn apply_osc_message(
    msg: &OscMessage,
    prefix: &str,
    engine: &SharedEngine,
    audio: Option<&AudioControl>,
) {
    match OscCommand::parse(msg, prefix) {
        Some(command) => command.apply(engine, audio),
        None => debug!(addr = %msg.addr, "ignoring OSC message"),
    }
}

fn extract_string(args: &[OscType], index: usize) -> Option<String> {
    match args.get(index)? {
        OscType::String(s) => Some(s.clone()),
        _ => None,
    }
}

/// Extract a float from OSC args at the given index.
fn extract_float(args: &[OscType], index: usize) -> Option<f32> {
    args.get(index).and_then(|arg| match arg {
        OscType::Float(f) => Some(*f),
        OscType::Double(d) => Some(*d as f32),
        OscType::Int(i) => Some(*i as f32),
        OscType::Long(l) => Some(*l as f32),
        _ => None,
    })
}

/// True, false, or a number where anything but 0 means true.
fn extract_bool(args: &[OscType], index: usize) -> Option<bool> {
    match args.get(index)? {
        OscType::Bool(b) => Some(*b),
        _ => extract_float(args, index).map(|v| v != 0.0),
    }
}

fn extract_int(args: &[OscType], index: usize) -> Option<i32> {
    args.get(index).and_then(|arg| match arg {
        OscType::Int(i) => Some(*i),
        OscType::Float(f) if f.is_finite() => Some(*f as i32),
        _ => None,
    })
}
