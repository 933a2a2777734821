//! Error types for the MIDI transport layer.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("MIDI backend init failed: {0}")]
    Init(String),

    #[error("MIDI port '{0}' not found")]
    PortNotFound(String),

    #[error("MIDI port info error: {0}")]
    PortInfo(String),

    #[error("MIDI connect failed: {0}")]
    Connect(String),

    #[error("MIDI send failed: {0}")]
    Send(String),

    #[error("No MIDI {0} devices available")]
    NoDevices(&'static str),

    #[error("The {0} backend has no {1} side")]
    Unsupported(&'static str, &'static str),
}

impl From<midir::InitError> for BackendError {
    fn from(e: midir::InitError) -> Self {
        BackendError::Init(e.to_string())
    }
}

impl From<midir::PortInfoError> for BackendError {
    fn from(e: midir::PortInfoError) -> Self {
        BackendError::PortInfo(e.to_string())
    }
}

impl From<midir::ConnectError<midir::MidiInput>> for BackendError {
    fn from(e: midir::ConnectError<midir::MidiInput>) -> Self {
        BackendError::Connect(e.to_string())
    }
}

impl From<midir::ConnectError<midir::MidiOutput>> for BackendError {
    fn from(e: midir::ConnectError<midir::MidiOutput>) -> Self {
        BackendError::Connect(e.to_string())
    }
}

impl From<midir::SendError> for BackendError {
    fn from(e: midir::SendError) -> Self {
        BackendError::Send(e.to_string())
    }
}
