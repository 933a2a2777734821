//! Per-channel playback state

use crate::midi::{NOTE_COUNT, PITCH_BEND_CENTER};

/// Playback state of one MIDI channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelState {
    /// Last known velocity per note, 0 = released
    pub held: [u8; NOTE_COUNT],
    pub muted: bool,
    pub solo: bool,
    pub hold: bool,
    pub program: u8,
    /// 14-bit pitch bend level
    pub pitch_bend: u16,
    /// CC 1
    pub modulation: u8,
    /// CC 64
    pub pedal: u8,
}

impl Default for ChannelState {
    fn default() -> Self {
        Self {
            held: [0; NOTE_COUNT],
            muted: false,
            solo: false,
            hold: false,
            program: 0,
            pitch_bend: PITCH_BEND_CENTER,
            modulation: 0,
            pedal: 0,
        }
    }
}

impl ChannelState {
    /// Notes with a non-zero velocity, ascending, as (note, velocity)
    pub fn held_notes(&self) -> impl Iterator<Item = (u8, u8)> + '_ {
        self.held
            .iter()
            .enumerate()
            .filter(|(_, &velocity)| velocity > 0)
            .map(|(note, &velocity)| (note as u8, velocity))
    }

    /// Record a note's velocity; 0 releases it
    pub fn set_held(&mut self, note: u8, velocity: u8) {
        self.held[(note & 0x7F) as usize] = velocity;
    }

    pub fn is_held(&self, note: u8) -> bool {
        self.held[(note & 0x7F) as usize] > 0
    }

    pub fn held_count(&self) -> usize {
        self.held.iter().filter(|&&v| v > 0).count()
    }
}
