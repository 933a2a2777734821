//! Console output - logs every outbound message
//!
//! Handy for trying routing settings without a synth attached.

use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info};

use super::{DeviceInfo, OutputPort};
use crate::midi::{format_hex, Message};

pub struct ConsoleOutput {
    name: String,
    /// Messages logged so far
    count: AtomicU64,
}

impl ConsoleOutput {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            count: AtomicU64::new(0),
        }
    }

    pub(super) fn device() -> DeviceInfo {
        DeviceInfo {
            index: 0,
            name: "Console".to_string(),
            id: "console".to_string(),
        }
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }
}

impl OutputPort for ConsoleOutput {
    fn index(&self) -> usize {
        0
    }

    fn status(&self) -> bool {
        true
    }

    fn send(&self, message: &Message) {
        if message.is_none() {
            return;
        }
        let n = self.count.fetch_add(1, Ordering::Relaxed) + 1;

        info!(
            "🎹 [{}] {} → {} [#{}]",
            chrono::Local::now().format("%H:%M:%S%.3f"),
            self.name,
            message,
            n
        );
        debug!(
            output = self.name,
            bytes = %format_hex(&message.to_bytes()),
            count = n,
            "ConsoleOutput send"
        );
    }

    fn last_error(&self) -> String {
        String::new()
    }

    fn devices(&self) -> Vec<DeviceInfo> {
        vec![Self::device()]
    }
}

impl Drop for ConsoleOutput {
    fn drop(&mut self) {
        debug!("ConsoleOutput '{}' closed after {} messages", self.name, self.count());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_messages() {
        let output = ConsoleOutput::new("test");
        for note in 0..10 {
            output.send(&Message::NoteOn {
                channel: 0,
                note,
                velocity: 1,
            });
        }
        assert_eq!(output.count(), 10);
    }

    #[test]
    fn test_skips_unrecognized() {
        let output = ConsoleOutput::new("test");
        output.send(&Message::None);
        assert_eq!(output.count(), 0);
        assert!(output.status());
        assert!(output.last_error().is_empty());
    }
}
