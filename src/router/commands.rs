//! User commands applied to the channel table
//!
//! These run on the consumer thread between ticks, so the next routed
//! message already sees their effect.

use tracing::debug;

use super::Router;

impl Router {
    pub fn set_mute(&mut self, channel: u8, muted: bool) {
        self.channels.set_mute(channel, muted, self.output.as_ref());
    }

    pub fn set_solo(&mut self, channel: u8, solo: bool) {
        self.channels.set_solo(channel, solo, self.output.as_ref());
    }

    pub fn set_hold(&mut self, channel: u8, hold: bool) {
        self.channels.set_hold(channel, hold, self.output.as_ref());
    }

    pub fn set_program(&mut self, channel: u8, program: u8) {
        self.channels
            .set_program(channel, program, self.output.as_ref());
    }

    /// Step the output channel's program, clamped to 0..=127
    pub fn step_program(&mut self, delta: i8) -> u8 {
        let channel = self.settings.effective_output_channel();
        let current = self.channels.get(channel).program as i16;
        let program = (current + delta as i16).clamp(0, 127) as u8;
        debug!("Program step {:+} -> {}", delta, program);
        self.set_program(channel, program);
        program
    }

    pub fn release_all(&mut self, channel: u8) {
        self.channels.release_all(channel, self.output.as_ref());
    }

    /// Panic: NoteOff for every held note on every channel
    pub fn all_notes_off(&mut self) {
        self.channels.all_notes_off(self.output.as_ref());
    }
}
