//! Decoding of the few MIDI messages the engine reacts to.

/// A decoded channel message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiMessage {
    /// Note on with a non-zero velocity.
    NoteOn { channel: u8, note: u8, velocity: u8 },
    /// Note off, or note on with velocity 0.
    NoteOff { channel: u8, note: u8 },
    /// Pitch bend, 14-bit value centred on 8192.
    PitchBend { channel: u8, value: u16 },
    /// Control change.
    ControlChange {
        channel: u8,
        controller: u8,
        value: u8,
    },
    /// Anything else with a recognisable status byte.
    Other { status: u8 },
}

/// Controller number of the modulation wheel.
pub const MOD_WHEEL: u8 = 1;

impl MidiMessage {
    /// Decode a raw message.
    ///
    /// Message format:
    /// - Note On:    [0x90 | channel, note, velocity]
    /// - Note Off:   [0x80 | channel, note, velocity]
    /// - CC:         [0xB0 | channel, controller, value]
    /// - Pitch bend: [0xE0 | channel, lsb, msb]
    ///
    /// Returns `None` for an empty or truncated message.
    pub fn parse(msg: &[u8]) -> Option<Self> {
        let (&first, data) = msg.split_first()?;
        let status = first & 0xF0;
        let channel = first & 0x0F;

        match status {
            0x90 if data.len() >= 2 => {
                let (note, velocity) = (data[0] & 0x7F, data[1] & 0x7F);
                if velocity == 0 {
                    Some(MidiMessage::NoteOff { channel, note })
                } else {
                    Some(MidiMessage::NoteOn {
                        channel,
                        note,
                        velocity,
                    })
                }
            }
            0x80 if data.len() >= 2 => Some(MidiMessage::NoteOff {
                channel,
                note: data[0] & 0x7F,
            }),
            0xB0 if data.len() >= 2 => Some(MidiMessage::ControlChange {
                channel,
                controller: data[0] & 0x7F,
                value: data[1] & 0x7F,
            }),
            0xE0 if data.len() >= 2 => {
                let value = ((data[1] as u16 & 0x7F) << 7) | (data[0] as u16 & 0x7F);
                Some(MidiMessage::PitchBend { channel, value })
            }
            0x90 | 0x80 | 0xB0 | 0xE0 => None,
            _ => Some(MidiMessage::Other { status: first }),
        }
    }

    /// The message's channel (0-15), if it is a channel message.
    pub fn channel(&self) -> Option<u8> {
        match *self {
            MidiMessage::NoteOn { channel, .. }
            | MidiMessage::NoteOff { channel, .. }
            | MidiMessage::PitchBend { channel, .. }
            | MidiMessage::ControlChange { channel, .. } => Some(channel),
            MidiMessage::Other { status } if status < 0xF0 => Some(status & 0x0F),
            MidiMessage::Other { .. } => None,
        }
    }

    /// Whether the message passes an optional channel filter. Messages
    /// without a channel always pass.
    pub fn accepts(&self, channel_filter: Option<u8>) -> bool {
        match (channel_filter, self.channel()) {
            (Some(filter), Some(channel)) => filter == channel,
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn note_on_and_off() {
        assert_eq!(
            MidiMessage::parse(&[0x91, 60, 100]),
            Some(MidiMessage::NoteOn {
                channel: 1,
                note: 60,
                velocity: 100
            })
        );
        assert_eq!(
            MidiMessage::parse(&[0x80, 60, 64]),
            Some(MidiMessage::NoteOff {
                channel: 0,
                note: 60
            })
        );
    }

    #[test]
    fn velocity_zero_is_note_off() {
        assert_eq!(
            MidiMessage::parse(&[0x90, 60, 0]),
            Some(MidiMessage::NoteOff {
                channel: 0,
                note: 60
            })
        );
    }

    #[test]
    fn pitch_bend_is_fourteen_bit() {
        assert_eq!(
            MidiMessage::parse(&[0xE0, 0x00, 0x40]),
            Some(MidiMessage::PitchBend {
                channel: 0,
                value: 8192
            })
        );
        assert_eq!(
            MidiMessage::parse(&[0xE3, 0x7F, 0x7F]),
            Some(MidiMessage::PitchBend {
                channel: 3,
                value: 16383
            })
        );
    }

    #[test]
    fn control_change() {
        assert_eq!(
            MidiMessage::parse(&[0xB0, MOD_WHEEL, 127]),
            Some(MidiMessage::ControlChange {
                channel: 0,
                controller: 1,
                value: 127
            })
        );
    }

    #[test]
    fn truncated_and_unknown() {
        assert_eq!(MidiMessage::parse(&[]), None);
        assert_eq!(MidiMessage::parse(&[0x90, 60]), None);
        assert_eq!(
            MidiMessage::parse(&[0xC0, 5]),
            Some(MidiMessage::Other { status: 0xC0 })
        );
        assert_eq!(
            MidiMessage::parse(&[0xF8]),
            Some(MidiMessage::Other { status: 0xF8 })
        );
    }

    #[test]
    fn channel_filter() {
        let msg = MidiMessage::parse(&[0x92, 60, 1]).unwrap();
        assert!(msg.accepts(None));
        assert!(msg.accepts(Some(2)));
        assert!(!msg.accepts(Some(0)));
        let clock = MidiMessage::parse(&[0xF8]).unwrap();
        assert!(clock.accepts(Some(0)));
    }
}
