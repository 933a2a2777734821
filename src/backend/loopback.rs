//! In-process virtual MIDI cable
//!
//! Whatever is sent into the output end comes out of the input end, through
//! the same [`InboundQueue`] a hardware callback would feed. Used by the demo
//! session and by tests as both a message source and an output probe.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};

use super::{DeviceInfo, InputPort, OutputPort};
use crate::midi::{from_ump32, Message};
use crate::queue::InboundQueue;

/// Create a connected cable; dropping the input end disconnects both ends
pub fn cable(name: impl Into<String>) -> (LoopbackInput, LoopbackOutput) {
    let name = name.into();
    let queue = Arc::new(InboundQueue::new());
    debug!("Loopback cable '{}' created", name);

    (
        LoopbackInput {
            name: name.clone(),
            queue: queue.clone(),
        },
        LoopbackOutput {
            name,
            queue,
            sent: AtomicU64::new(0),
        },
    )
}

fn device(name: &str) -> DeviceInfo {
    DeviceInfo {
        index: 0,
        name: name.to_string(),
        id: format!("loopback:{}", name),
    }
}

pub struct LoopbackInput {
    name: String,
    queue: Arc<InboundQueue>,
}

impl LoopbackInput {
    /// Close this end; the output side starts dropping
    pub fn close(&self) {
        self.queue.disconnect();
    }
}

impl InputPort for LoopbackInput {
    fn index(&self) -> usize {
        0
    }

    fn queue(&self) -> &InboundQueue {
        &self.queue
    }

    fn last_error(&self) -> String {
        if self.queue.is_connected() {
            String::new()
        } else {
            format!("Loopback '{}' closed", self.name)
        }
    }

    fn devices(&self) -> Vec<DeviceInfo> {
        vec![device(&self.name)]
    }
}

impl Drop for LoopbackInput {
    fn drop(&mut self) {
        self.queue.disconnect();
    }
}

pub struct LoopbackOutput {
    name: String,
    queue: Arc<InboundQueue>,
    sent: AtomicU64,
}

impl LoopbackOutput {
    /// Feed raw wire bytes, as a hardware callback would deliver them
    pub fn send_raw(&self, data: &[u8]) {
        self.send(&Message::parse(data));
    }

    /// Feed a 32-bit Universal MIDI Packet
    pub fn send_ump(&self, word: u32) {
        self.send(&from_ump32(word));
    }

    /// Messages accepted since creation
    pub fn sent(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }
}

impl OutputPort for LoopbackOutput {
    fn index(&self) -> usize {
        0
    }

    fn status(&self) -> bool {
        self.queue.is_connected()
    }

    fn send(&self, message: &Message) {
        if !self.queue.is_connected() {
            return;
        }
        trace!("Loopback '{}' <- {}", self.name, message);
        self.sent.fetch_add(1, Ordering::Relaxed);
        self.queue.push(message.clone());
    }

    fn last_error(&self) -> String {
        if self.queue.is_connected() {
            String::new()
        } else {
            format!("Loopback '{}' closed", self.name)
        }
    }

    fn devices(&self) -> Vec<DeviceInfo> {
        vec![device(&self.name)]
    }
}
