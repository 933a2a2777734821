//! Per-message routing decision

use tracing::{debug, trace};

use super::Router;
use crate::midi::Message;

/// What happened to a routed message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    /// Sent to the output, possibly on a remapped channel
    Forwarded(Message),
    /// Held back by hold or mute
    Suppressed,
    /// Unrecognized, never forwarded
    Dropped,
}

impl Router {
    /// Route one inbound message
    ///
    /// Updates channel state, triggers keystrokes for the listen channel,
    /// lights the activity indicator, applies hold and mute gating, then
    /// forwards what survives.
    pub fn route(&mut self, message: Message) -> Disposition {
        let listen = self.settings.listen_channel;
        let mut suppress = false;

        match message {
            Message::None => {
                trace!("Dropped unrecognized message");
                return Disposition::Dropped;
            }
            Message::NoteOn {
                channel,
                note,
                velocity,
            } => {
                let state = self.channels.get_mut(channel);
                if state.hold && velocity == 0 {
                    suppress = true;
                } else {
                    state.set_held(note, velocity);
                }
                if state.muted {
                    suppress = true;
                }
                if channel == listen {
                    self.keymap.trigger(self.injector.as_ref(), note, velocity);
                }
            }
            Message::NoteOff { channel, note, .. } => {
                let state = self.channels.get_mut(channel);
                if state.hold {
                    suppress = true;
                } else {
                    state.set_held(note, 0);
                }
                if channel == listen {
                    self.keymap.trigger(self.injector.as_ref(), note, 0);
                }
            }
            Message::PitchBend { channel, level } => {
                self.channels.get_mut(channel).pitch_bend = level;
            }
            Message::ControlChange {
                channel,
                controller,
                value,
            } => {
                let state = self.channels.get_mut(channel);
                match controller {
                    1 => state.modulation = value,
                    64 => state.pedal = value,
                    _ => {}
                }
            }
            Message::ProgramChange { channel, program } => {
                self.channels.get_mut(channel).program = program;
            }
            Message::SysEx(_) => {}
        }

        // Lit for every channel message, gated or not
        let channel = message.channel();
        if let Some(channel) = channel {
            self.activity.refresh(channel);
        }

        if suppress {
            debug!("Suppressed: {}", message);
            return Disposition::Suppressed;
        }

        let outbound = match (channel, self.settings.remap_channel) {
            (Some(channel), Some(remap)) if channel == listen => message.with_channel(remap),
            _ => message,
        };

        trace!("Forward: {}", outbound);
        self.output.send(&outbound);
        Disposition::Forwarded(outbound)
    }
}
