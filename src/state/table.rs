//! The sixteen-channel table and its user commands
//!
//! Commands that release notes send the NoteOffs straight to the given
//! output port, on the channel whose state is being changed.

use tracing::{debug, info};

use super::ChannelState;
use crate::backend::OutputPort;
use crate::midi::{Message, CHANNEL_COUNT};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelTable {
    channels: [ChannelState; CHANNEL_COUNT],
}

impl Default for ChannelTable {
    fn default() -> Self {
        Self {
            channels: std::array::from_fn(|_| ChannelState::default()),
        }
    }
}

impl ChannelTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, channel: u8) -> &ChannelState {
        &self.channels[(channel & 0x0F) as usize]
    }

    pub fn get_mut(&mut self, channel: u8) -> &mut ChannelState {
        &mut self.channels[(channel & 0x0F) as usize]
    }

    /// (channel, state) pairs in channel order
    pub fn iter(&self) -> impl Iterator<Item = (u8, &ChannelState)> {
        self.channels
            .iter()
            .enumerate()
            .map(|(ch, state)| (ch as u8, state))
    }

    pub fn set_mute(&mut self, channel: u8, muted: bool, output: &dyn OutputPort) {
        let channel = channel & 0x0F;
        let state = self.get(channel);
        if muted && !state.muted {
            self.release_all(channel, output);
        }
        self.get_mut(channel).muted = muted;
        debug!("Channel {} mute: {}", channel + 1, muted);
    }

    pub fn set_solo(&mut self, channel: u8, solo: bool, output: &dyn OutputPort) {
        let channel = channel & 0x0F;

        if solo {
            for other in (0..CHANNEL_COUNT as u8).filter(|&ch| ch != channel) {
                self.set_mute(other, true, output);
                self.get_mut(other).solo = false;
            }
            let state = self.get_mut(channel);
            state.muted = false;
            state.solo = true;
            info!("Channel {} soloed", channel + 1);
        } else {
            for state in self.channels.iter_mut() {
                state.muted = false;
                state.solo = false;
            }
            info!("Solo cleared");
        }
    }

    pub fn set_hold(&mut self, channel: u8, hold: bool, output: &dyn OutputPort) {
        let channel = channel & 0x0F;
        if !hold {
            self.release_all(channel, output);
        }
        self.get_mut(channel).hold = hold;
        debug!("Channel {} hold: {}", channel + 1, hold);
    }

    /// Store the program and send it out at once
    pub fn set_program(&mut self, channel: u8, program: u8, output: &dyn OutputPort) {
        let channel = channel & 0x0F;
        let program = program & 0x7F;
        self.get_mut(channel).program = program;
        output.send(&Message::ProgramChange { channel, program });
        debug!("Channel {} program: {}", channel + 1, program);
    }

    /// NoteOff (velocity 0) for every held note of a channel, then forget them
    pub fn release_all(&mut self, channel: u8, output: &dyn OutputPort) {
        let channel = channel & 0x0F;
        let state = self.get_mut(channel);

        for (note, _) in state.held_notes() {
            output.send(&Message::NoteOff {
                channel,
                note,
                velocity: 0,
            });
        }
        state.held = [0; crate::midi::NOTE_COUNT];
    }

    /// Panic button
    pub fn all_notes_off(&mut self, output: &dyn OutputPort) {
        for channel in 0..CHANNEL_COUNT as u8 {
            self.release_all(channel, output);
        }
        info!("All notes off");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::DeviceInfo;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Recorder {
        sent: RefCell<Vec<Message>>,
    }

    impl Recorder {
        fn take(&self) -> Vec<Message> {
            self.sent.borrow_mut().drain(..).collect()
        }
    }

    impl OutputPort for Recorder {
        fn index(&self) -> usize {
            0
        }
        fn status(&self) -> bool {
            true
        }
        fn send(&self, message: &Message) {
            self.sent.borrow_mut().push(message.clone());
        }
        fn last_error(&self) -> String {
            String::new()
        }
        fn devices(&self) -> Vec<DeviceInfo> {
            Vec::new()
        }
    }

    fn off(channel: u8, note: u8) -> Message {
        Message::NoteOff {
            channel,
            note,
            velocity: 0,
        }
    }

    #[test]
    fn test_mute_releases_held_notes() {
        let out = Recorder::default();
        let mut table = ChannelTable::new();
        table.get_mut(5).held[60] = 100;
        table.get_mut(5).held[64] = 80;

        table.set_mute(5, true, &out);

        assert_eq!(out.take(), vec![off(5, 60), off(5, 64)]);
        assert!(table.get(5).muted);
        assert_eq!(table.get(5).held_count(), 0);
    }

    #[test]
    fn test_mute_twice_releases_once() {
        let out = Recorder::default();
        let mut table = ChannelTable::new();
        table.set_mute(3, true, &out);
        table.get_mut(3).held[10] = 1;

        table.set_mute(3, true, &out);
        assert!(out.take().is_empty());

        table.set_mute(3, false, &out);
        assert!(!table.get(3).muted);
        assert!(out.take().is_empty());
    }

    #[test]
    fn test_solo_exclusivity() {
        let out = Recorder::default();
        let mut table = ChannelTable::new();
        table.get_mut(1).held[40] = 80;
        table.get_mut(2).held[41] = 90;

        table.set_solo(0, true, &out);

        assert_eq!(out.take(), vec![off(1, 40), off(2, 41)]);
        assert!(table.get(1).muted);
        assert!(table.get(2).muted);
        assert!(!table.get(0).muted);
        assert!(table.get(0).solo);
        assert!((1..16).all(|ch| table.get(ch).muted && !table.get(ch).solo));
    }

    #[test]
    fn test_solo_moves_between_channels() {
        let out = Recorder::default();
        let mut table = ChannelTable::new();
        table.set_solo(0, true, &out);
        table.set_solo(7, true, &out);

        assert!(table.get(7).solo && !table.get(7).muted);
        assert!(!table.get(0).solo && table.get(0).muted);
    }

    #[test]
    fn test_solo_off_clears_everything() {
        let out = Recorder::default();
        let mut table = ChannelTable::new();
        table.set_solo(4, true, &out);

        // Disabling on any channel, not only the soloed one
        table.set_solo(9, false, &out);

        assert!(table.iter().all(|(_, s)| !s.muted && !s.solo));
    }

    #[test]
    fn test_hold_off_releases() {
        let out = Recorder::default();
        let mut table = ChannelTable::new();
        table.set_hold(2, true, &out);
        table.get_mut(2).held[64] = 90;
        assert!(out.take().is_empty());

        table.set_hold(2, false, &out);
        assert_eq!(out.take(), vec![off(2, 64)]);
        assert!(!table.get(2).hold);
    }

    #[test]
    fn test_set_program_emits() {
        let out = Recorder::default();
        let mut table = ChannelTable::new();
        table.set_program(9, 42, &out);

        assert_eq!(table.get(9).program, 42);
        assert_eq!(
            out.take(),
            vec![Message::ProgramChange {
                channel: 9,
                program: 42
            }]
        );
    }

    #[test]
    fn test_all_notes_off() {
        let out = Recorder::default();
        let mut table = ChannelTable::new();
        table.get_mut(0).held[1] = 1;
        table.get_mut(15).held[127] = 127;
        table.get_mut(15).hold = true;

        table.all_notes_off(&out);
        assert_eq!(out.take(), vec![off(0, 1), off(15, 127)]);
        assert!(table.get(15).hold);
        assert_eq!(table.get(15).held_count(), 0);
    }

    #[test]
    fn test_unmasked_channel_is_folded() {
        let out = Recorder::default();
        let mut table = ChannelTable::new();
        table.get_mut(15).held[40] = 90;

        table.set_mute(255, true, &out);
        table.set_hold(255, true, &out);
        assert!(table.get(15).muted && table.get(15).hold);
        assert_eq!(out.take(), vec![off(15, 40)]);
    }
}
