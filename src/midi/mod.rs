//! MIDI controller input.

pub mod config;
pub mod input;
pub mod message;

pub use config::MidiConfig;
pub use input::MidiInput;
pub use message::MidiMessage;
