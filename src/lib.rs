//! MidiKeys - MIDI channel router with note-to-keystroke mapping
//!
//! Reads MIDI from an input port, tracks per-channel state (held notes, mute,
//! solo, hold, program, controllers), forwards a filtered and optionally
//! remapped stream to an output port, and turns notes on one listen channel
//! into keystrokes.

pub mod app;
pub mod backend;
pub mod chord;
pub mod cli;
pub mod config;
pub mod demo;
pub mod error;
pub mod keys;
pub mod midi;
pub mod paths;
pub mod queue;
pub mod router;
pub mod state;
pub mod view;
