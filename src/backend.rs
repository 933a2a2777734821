//! MIDI transport backends
//!
//! The router only talks to [`InputPort`] and [`OutputPort`]. Each transport
//! (hardware ports through midir, the in-process loopback cable, the logging
//! console output) implements those traits. Opening a port never fails: a
//! transport that cannot connect yields a port whose `status()` is false and
//! whose `last_error()` says why.

pub mod console;
pub mod hardware;
pub mod loopback;

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

use crate::error::BackendError;
use crate::midi::Message;
use crate::queue::InboundQueue;

pub use console::ConsoleOutput;
pub use hardware::{HardwareInput, HardwareOutput};
pub use loopback::{cable, LoopbackInput, LoopbackOutput};

/// A device a backend can bind to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub index: usize,
    pub name: String,
    pub id: String,
}

/// Transport selection as stored in the configuration
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// System MIDI ports (ALSA, CoreMIDI, WinMM) through midir
    #[default]
    Hardware,
    /// Output-only: log every message
    Console,
}

impl BackendKind {
    pub fn all() -> &'static [BackendKind] {
        &[BackendKind::Hardware, BackendKind::Console]
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Hardware => write!(f, "hardware"),
            BackendKind::Console => write!(f, "console"),
        }
    }
}

/// Receiving side of a transport
///
/// The transport's delivery thread pushes decoded messages into [`queue`](Self::queue);
/// the router drains it with [`poll`](Self::poll).
pub trait InputPort {
    /// Index of the bound device in the backend's device list
    fn index(&self) -> usize;

    /// Queue fed by the transport
    fn queue(&self) -> &InboundQueue;

    /// Human-readable reason for a failed connection
    fn last_error(&self) -> String;

    /// Devices this backend could bind to
    fn devices(&self) -> Vec<DeviceInfo>;

    fn status(&self) -> bool {
        self.queue().is_connected()
    }

    fn poll(&self, blocking: bool) -> Option<Message> {
        self.queue().poll(blocking)
    }
}

/// Sending side of a transport
///
/// `send` is fire-and-forget and a no-op while disconnected.
pub trait OutputPort {
    fn index(&self) -> usize;

    fn status(&self) -> bool;

    fn send(&self, message: &Message);

    fn last_error(&self) -> String;

    fn devices(&self) -> Vec<DeviceInfo>;
}

/// Input that never connected (no device, or a backend without an input side)
pub struct UnboundInput {
    queue: InboundQueue,
    reason: String,
}

impl UnboundInput {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            queue: InboundQueue::disconnected(),
            reason: reason.into(),
        }
    }
}

impl InputPort for UnboundInput {
    fn index(&self) -> usize {
        0
    }

    fn queue(&self) -> &InboundQueue {
        &self.queue
    }

    fn last_error(&self) -> String {
        self.reason.clone()
    }

    fn devices(&self) -> Vec<DeviceInfo> {
        Vec::new()
    }
}

/// Output with no device bound; drops everything
pub struct UnboundOutput {
    reason: String,
}

impl UnboundOutput {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl OutputPort for UnboundOutput {
    fn index(&self) -> usize {
        0
    }

    fn status(&self) -> bool {
        false
    }

    fn send(&self, _message: &Message) {}

    fn last_error(&self) -> String {
        self.reason.clone()
    }

    fn devices(&self) -> Vec<DeviceInfo> {
        Vec::new()
    }
}

/// Pick the configured device, clamped to the last available one
pub fn select_device(devices: &[DeviceInfo], index: usize) -> Option<&DeviceInfo> {
    if devices.is_empty() {
        return None;
    }
    devices.get(index.min(devices.len() - 1))
}

/// Enumerate input devices for a backend
pub fn list_input_devices(kind: BackendKind) -> Vec<DeviceInfo> {
    match kind {
        BackendKind::Hardware => HardwareInput::list_devices().unwrap_or_else(|e| {
            warn!("Failed to enumerate MIDI inputs: {}", e);
            Vec::new()
        }),
        BackendKind::Console => Vec::new(),
    }
}

/// Enumerate output devices for a backend
pub fn list_output_devices(kind: BackendKind) -> Vec<DeviceInfo> {
    match kind {
        BackendKind::Hardware => HardwareOutput::list_devices().unwrap_or_else(|e| {
            warn!("Failed to enumerate MIDI outputs: {}", e);
            Vec::new()
        }),
        BackendKind::Console => vec![ConsoleOutput::device()],
    }
}

/// Open the input side of a backend, binding to the configured device index
pub fn open_input(kind: BackendKind, device_index: usize) -> Box<dyn InputPort> {
    match kind {
        BackendKind::Hardware => {
            let devices = list_input_devices(kind);
            match select_device(&devices, device_index) {
                Some(device) => {
                    debug!("Opening hardware input #{}: {}", device.index, device.name);
                    Box::new(HardwareInput::open(device))
                }
                None => Box::new(UnboundInput::new(
                    BackendError::NoDevices("input").to_string(),
                )),
            }
        }
        BackendKind::Console => Box::new(UnboundInput::new(
            BackendError::Unsupported("console", "input").to_string(),
        )),
    }
}

/// Open the output side of a backend, binding to the configured device index
pub fn open_output(kind: BackendKind, device_index: usize) -> Box<dyn OutputPort> {
    match kind {
        BackendKind::Hardware => {
            let devices = list_output_devices(kind);
            match select_device(&devices, device_index) {
                Some(device) => {
                    debug!("Opening hardware output #{}: {}", device.index, device.name);
                    Box::new(HardwareOutput::open(device))
                }
                None => Box::new(UnboundOutput::new(
                    BackendError::NoDevices("output").to_string(),
                )),
            }
        }
        BackendKind::Console => Box::new(ConsoleOutput::new("console")),
    }
}
