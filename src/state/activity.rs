//! Activity indicator for the channel view
//!
//! Each channel carries a frame counter. Routing a message on a channel sets
//! it to [`ACTIVE_FRAMES`]; every tick takes one off, stopping at zero.

use tracing::trace;

use crate::midi::CHANNEL_COUNT;

/// Frames a channel stays lit after its last message
pub const ACTIVE_FRAMES: u8 = 3;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivityIndicator {
    frames: [u8; CHANNEL_COUNT],
}

impl ActivityIndicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record activity on a channel
    pub fn refresh(&mut self, channel: u8) {
        let channel = channel & 0x0F;
        self.frames[channel as usize] = ACTIVE_FRAMES;
        trace!("Activity: ch {}", channel + 1);
    }

    /// One tick elapsed
    pub fn decay(&mut self) {
        for frames in self.frames.iter_mut() {
            *frames = frames.saturating_sub(1);
        }
    }

    /// Remaining frames for a channel
    pub fn level(&self, channel: u8) -> u8 {
        self.frames[(channel & 0x0F) as usize]
    }

    pub fn is_active(&self, channel: u8) -> bool {
        self.level(channel) > 0
    }

    /// Channels currently lit
    pub fn active_channels(&self) -> impl Iterator<Item = u8> + '_ {
        self.frames
            .iter()
            .enumerate()
            .filter(|(_, &f)| f > 0)
            .map(|(ch, _)| ch as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refresh_and_decay() {
        let mut indicator = ActivityIndicator::new();
        indicator.refresh(4);
        assert_eq!(indicator.level(4), 3);

        indicator.decay();
        assert_eq!(indicator.level(4), 2);
        indicator.decay();
        indicator.decay();
        assert!(!indicator.is_active(4));

        // Floored at zero
        indicator.decay();
        assert_eq!(indicator.level(4), 0);
    }

    #[test]
    fn test_refresh_resets_counter() {
        let mut indicator = ActivityIndicator::new();
        indicator.refresh(0);
        indicator.decay();
        indicator.decay();
        indicator.refresh(0);
        assert_eq!(indicator.level(0), ACTIVE_FRAMES);
    }

    #[test]
    fn test_active_channels() {
        let mut indicator = ActivityIndicator::new();
        indicator.refresh(2);
        indicator.refresh(15);
        assert_eq!(indicator.active_channels().collect::<Vec<_>>(), vec![2, 15]);
    }
}
