//! Router module - per-channel processing of the inbound MIDI stream
//!
//! The Router owns everything the consumer side touches:
//! - the channel state table and the activity indicator
//! - the routing settings (listen, remap and output channels)
//! - the key map and the keystroke injector
//! - the input and output ports
//!
//! Each [`tick`](Router::tick) decays the activity indicator once and then
//! drains the input queue without blocking, routing every message.

mod commands;
mod routing;


pub use routing::Disposition;

use tracing::{debug, info};

use crate::backend::{InputPort, OutputPort, UnboundInput, UnboundOutput};
use crate::keys::{KeyMap, KeystrokeInjector};
use crate::midi::Message;
use crate::state::{ActivityIndicator, ChannelTable};

/// Channel routing, 0-based
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoutingSettings {
    /// Channel whose notes drive keystrokes
    pub listen_channel: u8,
    /// Replaces the listen channel on output when set
    pub remap_channel: Option<u8>,
    /// Channel targeted by program stepping and the setup ProgramChange
    pub output_channel: u8,
    /// Output channel follows the listen channel
    pub sync_output_channel: bool,
}

impl Default for RoutingSettings {
    fn default() -> Self {
        Self {
            listen_channel: 0,
            remap_channel: None,
            output_channel: 0,
            sync_output_channel: true,
        }
    }
}

impl RoutingSettings {
    /// Output channel after applying the sync option
    pub fn effective_output_channel(&self) -> u8 {
        if self.sync_output_channel {
            self.listen_channel
        } else {
            self.output_channel
        }
    }
}

/// Single-consumer MIDI router
pub struct Router {
    pub(crate) channels: ChannelTable,
    pub(crate) activity: ActivityIndicator,
    pub(crate) settings: RoutingSettings,
    pub(crate) keymap: KeyMap,
    injector: Box<dyn KeystrokeInjector>,
    input: Box<dyn InputPort>,
    output: Box<dyn OutputPort>,
}

impl Router {
    /// Create a router with no ports bound
    pub fn new(
        settings: RoutingSettings,
        keymap: KeyMap,
        injector: Box<dyn KeystrokeInjector>,
    ) -> Self {
        Self::with_ports(
            settings,
            keymap,
            injector,
            Box::new(UnboundInput::new("Input not opened")),
            Box::new(UnboundOutput::new("Output not opened")),
        )
    }

    pub fn with_ports(
        settings: RoutingSettings,
        keymap: KeyMap,
        injector: Box<dyn KeystrokeInjector>,
        input: Box<dyn InputPort>,
        output: Box<dyn OutputPort>,
    ) -> Self {
        Self {
            channels: ChannelTable::new(),
            activity: ActivityIndicator::new(),
            settings,
            keymap,
            injector,
            input,
            output,
        }
    }

    /// One pass of the consumer loop; returns how many messages were routed
    pub fn tick(&mut self) -> usize {
        self.activity.decay();

        let mut routed = 0;
        while let Some(message) = self.input.poll(false) {
            self.route(message);
            routed += 1;
        }
        routed
    }

    /// Swap the input port; the previous one is closed on drop
    pub fn set_input(&mut self, input: Box<dyn InputPort>) {
        debug!("Input replaced (connected: {})", input.status());
        self.input = input;
    }

    /// Swap the output port; the previous one is closed on drop
    pub fn set_output(&mut self, output: Box<dyn OutputPort>) {
        debug!("Output replaced (connected: {})", output.status());
        self.output = output;
    }

    /// Tell the output which program the output channel is on
    ///
    /// Only sent while an input is connected, matching the setup sequence.
    pub fn announce_program(&self) {
        if !self.input.status() {
            return;
        }
        let channel = self.settings.effective_output_channel();
        let program = self.channels.get(channel).program;
        info!("Announcing program {} on channel {}", program, channel + 1);
        self.output.send(&Message::ProgramChange { channel, program });
    }

    pub fn input(&self) -> &dyn InputPort {
        self.input.as_ref()
    }

    pub fn output(&self) -> &dyn OutputPort {
        self.output.as_ref()
    }

    pub fn channels(&self) -> &ChannelTable {
        &self.channels
    }

    pub fn activity(&self) -> &ActivityIndicator {
        &self.activity
    }

    pub fn settings(&self) -> RoutingSettings {
        self.settings
    }

    pub fn set_settings(&mut self, settings: RoutingSettings) {
        if settings != self.settings {
            info!(
                "Routing: listen {} remap {} output {}{}",
                settings.listen_channel + 1,
                settings
                    .remap_channel
                    .map(|ch| (ch + 1).to_string())
                    .unwrap_or_else(|| "off".to_string()),
                settings.effective_output_channel() + 1,
                if settings.sync_output_channel { " (sync)" } else { "" }
            );
        }
        self.settings = settings;
    }

    pub fn keymap(&self) -> &KeyMap {
        &self.keymap
    }

    pub fn set_keymap(&mut self, keymap: KeyMap) {
        debug!("Key map replaced ({} bindings)", keymap.len());
        self.keymap = keymap;
    }
}
