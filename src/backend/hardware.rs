//! System MIDI ports through midir
//!
//! Device ids are port names. The index in the device list is only a hint:
//! if the port at that index was renamed since enumeration, the port is
//! looked up by name instead.

use midir::{Ignore, MidiInput, MidiInputConnection, MidiOutput, MidiOutputConnection};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

use super::{DeviceInfo, InputPort, OutputPort};
use crate::error::BackendError;
use crate::midi::{format_hex, Message};
use crate::queue::InboundQueue;

const CLIENT_NAME: &str = "MidiKeys";

fn find_port<P: Clone>(
    ports: &[P],
    port_name: impl Fn(&P) -> Option<String>,
    device: &DeviceInfo,
) -> Result<P, BackendError> {
    if let Some(port) = ports.get(device.index) {
        if port_name(port).as_deref() == Some(device.id.as_str()) {
            return Ok(port.clone());
        }
    }

    ports
        .iter()
        .find(|port| port_name(port).as_deref() == Some(device.id.as_str()))
        .cloned()
        .ok_or_else(|| BackendError::PortNotFound(device.id.clone()))
}

/// Hardware MIDI input
///
/// The midir callback thread parses raw bytes and pushes them into the queue.
pub struct HardwareInput {
    index: usize,
    name: String,
    queue: Arc<InboundQueue>,
    connection: Option<MidiInputConnection<()>>,
    error: String,
}

impl HardwareInput {
    pub fn list_devices() -> Result<Vec<DeviceInfo>, BackendError> {
        let midi_in = MidiInput::new(&format!("{}-Scanner", CLIENT_NAME))?;
        Ok(midi_in
            .ports()
            .iter()
            .enumerate()
            .filter_map(|(index, port)| {
                midi_in.port_name(port).ok().map(|name| DeviceInfo {
                    index,
                    id: name.clone(),
                    name,
                })
            })
            .collect())
    }

    /// Connect to a device; on failure the port stays disconnected with the reason recorded
    pub fn open(device: &DeviceInfo) -> Self {
        let queue = Arc::new(InboundQueue::new());

        match Self::connect(device, queue.clone()) {
            Ok(connection) => {
                info!("🎹 MIDI input connected: {}", device.name);
                Self {
                    index: device.index,
                    name: device.name.clone(),
                    queue,
                    connection: Some(connection),
                    error: String::new(),
                }
            }
            Err(e) => {
                warn!("Failed to open MIDI input '{}': {}", device.name, e);
                queue.disconnect();
                Self {
                    index: device.index,
                    name: device.name.clone(),
                    queue,
                    connection: None,
                    error: e.to_string(),
                }
            }
        }
    }

    fn connect(
        device: &DeviceInfo,
        queue: Arc<InboundQueue>,
    ) -> Result<MidiInputConnection<()>, BackendError> {
        let mut midi_in = MidiInput::new(&format!("{}-Input", CLIENT_NAME))?;
        // Clock and active sensing would only decode to None
        midi_in.ignore(Ignore::TimeAndActiveSense);

        let ports = midi_in.ports();
        let port = find_port(&ports, |p| midi_in.port_name(p).ok(), device)?;

        let connection = midi_in.connect(
            &port,
            CLIENT_NAME,
            move |_timestamp, data, _| {
                let message = Message::parse(data);
                trace!("MIDI in [{}] -> {}", format_hex(data), message);
                queue.push(message);
            },
            (),
        )?;
        Ok(connection)
    }
}

impl InputPort for HardwareInput {
    fn index(&self) -> usize {
        self.index
    }

    fn queue(&self) -> &InboundQueue {
        &self.queue
    }

    fn last_error(&self) -> String {
        self.error.clone()
    }

    fn devices(&self) -> Vec<DeviceInfo> {
        Self::list_devices().unwrap_or_else(|e| {
            warn!("Failed to enumerate MIDI inputs: {}", e);
            Vec::new()
        })
    }
}

impl Drop for HardwareInput {
    fn drop(&mut self) {
        if let Some(connection) = self.connection.take() {
            connection.close();
            debug!("MIDI input closed: {}", self.name);
        }
        self.queue.disconnect();
    }
}

/// Hardware MIDI output
pub struct HardwareOutput {
    index: usize,
    name: String,
    connection: Mutex<Option<MidiOutputConnection>>,
    error: Mutex<String>,
}

impl HardwareOutput {
    pub fn list_devices() -> Result<Vec<DeviceInfo>, BackendError> {
        let midi_out = MidiOutput::new(&format!("{}-Scanner", CLIENT_NAME))?;
        Ok(midi_out
            .ports()
            .iter()
            .enumerate()
            .filter_map(|(index, port)| {
                midi_out.port_name(port).ok().map(|name| DeviceInfo {
                    index,
                    id: name.clone(),
                    name,
                })
            })
            .collect())
    }

    /// Connect to a device; on failure the port stays disconnected with the reason recorded
    pub fn open(device: &DeviceInfo) -> Self {
        let (connection, error) = match Self::connect(device) {
            Ok(connection) => {
                info!("🎹 MIDI output connected: {}", device.name);
                (Some(connection), String::new())
            }
            Err(e) => {
                warn!("Failed to open MIDI output '{}': {}", device.name, e);
                (None, e.to_string())
            }
        };

        Self {
            index: device.index,
            name: device.name.clone(),
            connection: Mutex::new(connection),
            error: Mutex::new(error),
        }
    }

    fn connect(device: &DeviceInfo) -> Result<MidiOutputConnection, BackendError> {
        let midi_out = MidiOutput::new(&format!("{}-Output", CLIENT_NAME))?;
        let ports = midi_out.ports();
        let port = find_port(&ports, |p| midi_out.port_name(p).ok(), device)?;
        Ok(midi_out.connect(&port, CLIENT_NAME)?)
    }
}

impl OutputPort for HardwareOutput {
    fn index(&self) -> usize {
        self.index
    }

    fn status(&self) -> bool {
        self.connection.lock().is_some()
    }

    fn send(&self, message: &Message) {
        if let Message::SysEx(sysex) = message {
            if !sysex.is_terminated() {
                debug!("Skipping unterminated SysEx ({} bytes)", sysex.len());
                return;
            }
        }

        let bytes = message.to_bytes();
        if bytes.is_empty() {
            return;
        }

        let mut connection = self.connection.lock();
        let Some(conn) = connection.as_mut() else {
            return;
        };

        match conn.send(&bytes) {
            Ok(()) => trace!("MIDI out [{}] {}", format_hex(&bytes), message),
            Err(e) => {
                let e = BackendError::from(e);
                warn!("MIDI output '{}' failed, closing: {}", self.name, e);
                // A broken port stays closed until the next refresh
                if let Some(conn) = connection.take() {
                    conn.close();
                }
                *self.error.lock() = e.to_string();
            }
        }
    }

    fn last_error(&self) -> String {
        self.error.lock().clone()
    }

    fn devices(&self) -> Vec<DeviceInfo> {
        Self::list_devices().unwrap_or_else(|e| {
            warn!("Failed to enumerate MIDI outputs: {}", e);
            Vec::new()
        })
    }
}

impl Drop for HardwareOutput {
    fn drop(&mut self) {
        if let Some(conn) = self.connection.lock().take() {
            conn.close();
            debug!("MIDI output closed: {}", self.name);
        }
    }
}
