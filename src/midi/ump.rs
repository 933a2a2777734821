//! MIDI 2.0 Universal MIDI Packet downgrade
//!
//! Only 32-bit packets of message type 0x2 (MIDI 1.0 channel voice) carry a
//! MIDI-1 triplet; everything else maps to `Message::None`.

use super::{decode, Message};

/// UMP message type for MIDI 1.0 channel voice messages
const MT_MIDI1_CHANNEL_VOICE: u32 = 0x2;

/// Extract the MIDI-1 message from a 32-bit UMP word
///
/// Layout: `mt:4 group:4 status:8 data1:8 data2:8`. The group is discarded.
pub fn from_ump32(word: u32) -> Message {
    if word >> 28 != MT_MIDI1_CHANNEL_VOICE {
        return Message::None;
    }

    let status = ((word >> 16) & 0xFF) as u8;
    let data1 = ((word >> 8) & 0xFF) as u8;
    let data2 = (word & 0xFF) as u8;
    decode(status, data1, data2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_midi1_channel_voice() {
        // Group 3, NoteOn ch 2, note 60, velocity 100
        let word = 0x2392_3C64;
        assert_eq!(
            from_ump32(word),
            Message::NoteOn {
                channel: 2,
                note: 60,
                velocity: 100
            }
        );
    }

    #[test]
    fn test_pitch_bend_from_ump() {
        let word = 0x20E0_0040;
        assert_eq!(
            from_ump32(word),
            Message::PitchBend {
                channel: 0,
                level: 8192
            }
        );
    }

    #[test]
    fn test_other_message_types_dropped() {
        // Utility (0x0), system (0x1), MIDI 2.0 channel voice (0x4)
        assert_eq!(from_ump32(0x0000_0000), Message::None);
        assert_eq!(from_ump32(0x10F8_0000), Message::None);
        assert_eq!(from_ump32(0x4090_3C00), Message::None);
    }
}
