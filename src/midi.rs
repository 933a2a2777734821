//! MIDI message model and wire codec
//!
//! Provides the structured message type, the MIDI-1 triplet encoding/decoding,
//! raw byte parsing for backend callbacks, and display helpers.

pub mod sysex;
pub mod ump;

use std::fmt;

pub use sysex::{SysEx, MAX_SYSEX_LEN};
pub use ump::from_ump32;

/// Number of MIDI channels on one port
pub const CHANNEL_COUNT: usize = 16;

/// Number of note numbers per channel
pub const NOTE_COUNT: usize = 128;

/// Pitch bend centre position (14-bit)
pub const PITCH_BEND_CENTER: u16 = 8192;

/// Highest 14-bit pitch bend level
pub const PITCH_BEND_MAX: u16 = 16383;

const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// MIDI message types handled by the router
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// Note On: channel (0-15), note (0-127), velocity (0-127)
    NoteOn { channel: u8, note: u8, velocity: u8 },

    /// Note Off: channel (0-15), note (0-127), release velocity (0-127)
    NoteOff { channel: u8, note: u8, velocity: u8 },

    /// Program Change: channel (0-15), program (0-127)
    ProgramChange { channel: u8, program: u8 },

    /// Pitch Bend: channel (0-15), level (0-16383, centre 8192)
    PitchBend { channel: u8, level: u16 },

    /// Control Change: channel (0-15), controller (0-127), value (0-127)
    ControlChange { channel: u8, controller: u8, value: u8 },

    /// System Exclusive: shared raw buffer, F0 .. F7 included
    SysEx(SysEx),

    /// Unrecognized status; dropped by consumers
    None,
}

/// Raw MIDI-1 wire triplet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Packet {
    pub status: u8,
    pub data1: u8,
    pub data2: u8,
}

impl Packet {
    pub const fn new(status: u8, data1: u8, data2: u8) -> Self {
        Self {
            status,
            data1,
            data2,
        }
    }

    /// Decode this triplet (see [`decode`])
    pub fn decode(self) -> Message {
        decode(self.status, self.data1, self.data2)
    }
}

/// Decode a MIDI-1 triplet. Never fails: unknown status nibbles yield `Message::None`.
pub fn decode(status: u8, data1: u8, data2: u8) -> Message {
    let channel = status & 0x0F;
    let data1 = data1 & 0x7F;
    let data2 = data2 & 0x7F;

    match status >> 4 {
        0x8 => Message::NoteOff {
            channel,
            note: data1,
            velocity: data2,
        },
        0x9 => Message::NoteOn {
            channel,
            note: data1,
            velocity: data2,
        },
        0xB => Message::ControlChange {
            channel,
            controller: data1,
            value: data2,
        },
        0xC => Message::ProgramChange {
            channel,
            program: data1,
        },
        0xE => Message::PitchBend {
            channel,
            level: ((data2 as u16) << 7) | data1 as u16,
        },
        _ => Message::None,
    }
}

impl Message {
    /// Parse a message from raw bytes as delivered by a backend callback
    ///
    /// A leading 0xF0 yields a SysEx carrying the whole buffer. Anything else is
    /// decoded as a triplet, missing data bytes reading as zero. Running status
    /// is not supported.
    pub fn parse(data: &[u8]) -> Self {
        let Some(&status) = data.first() else {
            return Message::None;
        };

        if status == 0xF0 {
            return Message::SysEx(SysEx::new(data));
        }

        // Data byte first means running status
        if status < 0x80 {
            return Message::None;
        }

        let data1 = data.get(1).copied().unwrap_or(0);
        let data2 = data.get(2).copied().unwrap_or(0);
        decode(status, data1, data2)
    }

    /// Encode to a wire triplet; `None` for SysEx and unrecognized messages
    pub fn encode(&self) -> Option<Packet> {
        let packet = match *self {
            Message::NoteOff {
                channel,
                note,
                velocity,
            } => Packet::new(0x80 | (channel & 0x0F), note & 0x7F, velocity & 0x7F),
            Message::NoteOn {
                channel,
                note,
                velocity,
            } => Packet::new(0x90 | (channel & 0x0F), note & 0x7F, velocity & 0x7F),
            Message::ControlChange {
                channel,
                controller,
                value,
            } => Packet::new(0xB0 | (channel & 0x0F), controller & 0x7F, value & 0x7F),
            Message::ProgramChange { channel, program } => {
                Packet::new(0xC0 | (channel & 0x0F), program & 0x7F, 0)
            }
            Message::PitchBend { channel, level } => {
                let lsb = (level & 0x7F) as u8;
                let msb = ((level >> 7) & 0x7F) as u8;
                Packet::new(0xE0 | (channel & 0x0F), lsb, msb)
            }
            Message::SysEx(_) | Message::None => return None,
        };
        Some(packet)
    }

    /// Serialize for transmission on a byte-oriented port
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Message::SysEx(sysex) => sysex.as_bytes().to_vec(),
            Message::ProgramChange { .. } => self
                .encode()
                .map(|p| vec![p.status, p.data1])
                .unwrap_or_default(),
            _ => self
                .encode()
                .map(|p| vec![p.status, p.data1, p.data2])
                .unwrap_or_default(),
        }
    }

    /// Get the channel for channel messages (0-15), None for SysEx/unrecognized
    pub fn channel(&self) -> Option<u8> {
        match *self {
            Message::NoteOn { channel, .. }
            | Message::NoteOff { channel, .. }
            | Message::ProgramChange { channel, .. }
            | Message::PitchBend { channel, .. }
            | Message::ControlChange { channel, .. } => Some(channel),
            Message::SysEx(_) | Message::None => None,
        }
    }

    /// Copy of this message moved to another channel (no-op for channel-less messages)
    pub fn with_channel(&self, new_channel: u8) -> Self {
        let mut message = self.clone();
        match &mut message {
            Message::NoteOn { channel, .. }
            | Message::NoteOff { channel, .. }
            | Message::ProgramChange { channel, .. }
            | Message::PitchBend { channel, .. }
            | Message::ControlChange { channel, .. } => *channel = new_channel & 0x0F,
            Message::SysEx(_) | Message::None => {}
        }
        message
    }

    /// Note number for note messages
    pub fn note(&self) -> Option<u8> {
        match *self {
            Message::NoteOn { note, .. } | Message::NoteOff { note, .. } => Some(note),
            _ => None,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Message::None)
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Message::NoteOn {
                channel,
                note,
                velocity,
            } => write!(
                f,
                "NoteOn ch:{} n:{} ({}) v:{}",
                (channel & 0x0F) + 1,
                note,
                note_name(*note),
                velocity
            ),
            Message::NoteOff {
                channel,
                note,
                velocity,
            } => write!(
                f,
                "NoteOff ch:{} n:{} ({}) v:{}",
                (channel & 0x0F) + 1,
                note,
                note_name(*note),
                velocity
            ),
            Message::ProgramChange { channel, program } => {
                write!(f, "ProgramChange ch:{} p:{}", (channel & 0x0F) + 1, program)
            }
            Message::PitchBend { channel, level } => {
                write!(f, "PitchBend ch:{} l:{}", (channel & 0x0F) + 1, level)
            }
            Message::ControlChange {
                channel,
                controller,
                value,
            } => write!(f, "CC ch:{} cc:{} v:{}", (channel & 0x0F) + 1, controller, value),
            Message::SysEx(sysex) => write!(f, "SysEx {} bytes", sysex.len()),
            Message::None => write!(f, "None"),
        }
    }
}

/// Note name with octave, e.g. 60 -> "C5" (octave = note / 12)
pub fn note_name(note: u8) -> String {
    format!("{}{}", NOTE_NAMES[(note % 12) as usize], note / 12)
}

/// Format MIDI bytes as hex string for debugging
pub fn format_hex(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}
