//! Command-line interface and REPL
//!
//! The REPL runs on a blocking thread and hands parsed commands to the main
//! loop over a channel. Channels are 1-based here.

use anyhow::{bail, Context, Result};
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tokio::sync::mpsc;
use tracing::debug;

use crate::backend::BackendKind;

pub const HELP: &str = "\
Commands:
  mute <ch> on|off        mute a channel (releases held notes)
  solo <ch> on|off        solo a channel; off clears every solo
  hold <ch> on|off        hold notes; off releases them
  program <ch> <n>        send a program change
  program +|-             step the output channel's program
  listen <ch>             channel that drives keystrokes
  remap <ch>|off          output channel for the listen channel
  output <ch>|sync        output channel, or follow the listen channel
  device in|out <n> [b]   select a device (backend: hardware|console)
  bind <note> <key>       map a note (number or name, e.g. C5) to a key
  unbind <note>           remove a mapping
  panic                   all notes off
  status                  show the channel table
  devices                 list MIDI devices
  save | load | reset     write, re-read or reset the config
  refresh                 re-open MIDI ports
  help | quit";

/// Which port a `device` command selects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortSide {
    Input,
    Output,
}

/// A parsed REPL command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Mute { channel: u8, on: bool },
    Solo { channel: u8, on: bool },
    Hold { channel: u8, on: bool },
    Program { channel: u8, program: u8 },
    ProgramStep(i8),
    Listen(u8),
    /// `None` turns remapping off
    Remap(Option<u8>),
    /// `None` syncs the output channel to the listen channel
    Output(Option<u8>),
    /// `backend: None` keeps the configured backend
    Device {
        side: PortSide,
        index: usize,
        backend: Option<BackendKind>,
    },
    Bind { note: u8, key: String },
    Unbind(u8),
    Panic,
    Status,
    Devices,
    Save,
    Load,
    Reset,
    Refresh,
    Help,
    Quit,
}

impl Command {
    pub fn parse(line: &str) -> Result<Self> {
        let words: Vec<&str> = line.split_whitespace().collect();
        let Some((&name, args)) = words.split_first() else {
            bail!("empty command");
        };

        let command = match (name.to_lowercase().as_str(), args) {
            ("mute", [ch, state]) => Command::Mute {
                channel: parse_channel(ch)?,
                on: parse_switch(state)?,
            },
            ("solo", [ch, state]) => Command::Solo {
                channel: parse_channel(ch)?,
                on: parse_switch(state)?,
            },
            ("hold", [ch, state]) => Command::Hold {
                channel: parse_channel(ch)?,
                on: parse_switch(state)?,
            },
            ("program", ["+"]) => Command::ProgramStep(1),
            ("program", ["-"]) => Command::ProgramStep(-1),
            ("program", [ch, program]) => Command::Program {
                channel: parse_channel(ch)?,
                program: parse_7bit("program", program)?,
            },
            ("listen", [ch]) => Command::Listen(parse_channel(ch)?),
            ("remap", ["off"]) => Command::Remap(None),
            ("remap", [ch]) => Command::Remap(Some(parse_channel(ch)?)),
            ("output", ["sync"]) => Command::Output(None),
            ("output", [ch]) => Command::Output(Some(parse_channel(ch)?)),
            ("device", [side, index]) => Command::Device {
                side: parse_side(side)?,
                index: parse_index(index)?,
                backend: None,
            },
            ("device", [side, index, backend]) => Command::Device {
                side: parse_side(side)?,
                index: parse_index(index)?,
                backend: Some(parse_backend(backend)?),
            },
            ("bind", [note, key]) => Command::Bind {
                note: parse_note(note)?,
                key: key.to_string(),
            },
            ("unbind", [note]) => Command::Unbind(parse_note(note)?),
            ("panic", []) => Command::Panic,
            ("status", []) => Command::Status,
            ("devices", []) => Command::Devices,
            ("save", []) => Command::Save,
            ("load", []) => Command::Load,
            ("reset", []) => Command::Reset,
            ("refresh", []) => Command::Refresh,
            ("help" | "?", []) => Command::Help,
            ("quit" | "exit", []) => Command::Quit,
            (other, _) => bail!("unknown command or arguments: '{}' (try 'help')", other),
        };
        Ok(command)
    }
}

/// 1-16 in, 0-15 out
fn parse_channel(s: &str) -> Result<u8> {
    let channel: u8 = s
        .parse()
        .with_context(|| format!("invalid channel '{}'", s))?;
    if !(1..=16).contains(&channel) {
        bail!("channel must be 1-16 (got {})", channel);
    }
    Ok(channel - 1)
}

fn parse_switch(s: &str) -> Result<bool> {
    match s.to_lowercase().as_str() {
        "on" | "1" | "true" => Ok(true),
        "off" | "0" | "false" => Ok(false),
        _ => bail!("expected on|off (got '{}')", s),
    }
}

fn parse_side(s: &str) -> Result<PortSide> {
    match s.to_lowercase().as_str() {
        "in" | "input" => Ok(PortSide::Input),
        "out" | "output" => Ok(PortSide::Output),
        _ => bail!("expected in|out (got '{}')", s),
    }
}

fn parse_index(s: &str) -> Result<usize> {
    s.parse()
        .with_context(|| format!("invalid device index '{}'", s))
}

fn parse_backend(s: &str) -> Result<BackendKind> {
    let lower = s.to_lowercase();
    BackendKind::all()
        .iter()
        .copied()
        .find(|kind| kind.to_string() == lower)
        .with_context(|| format!("unknown backend '{}'", s))
}

fn parse_7bit(what: &str, s: &str) -> Result<u8> {
    let value: u8 = s
        .parse()
        .with_context(|| format!("invalid {} '{}'", what, s))?;
    if value > 127 {
        bail!("{} must be 0-127 (got {})", what, value);
    }
    Ok(value)
}

/// Note number or name with octave (`C5` = 60, `F#3` = 42)
fn parse_note(s: &str) -> Result<u8> {
    if s.starts_with(|c: char| c.is_ascii_digit()) {
        return parse_7bit("note", s);
    }

    let upper = s.to_uppercase();
    let (pitch, octave) = match upper.find(|c: char| c.is_ascii_digit()) {
        Some(split) => upper.split_at(split),
        None => bail!("note name needs an octave (e.g. C5)"),
    };
    let semitone = match pitch {
        "C" => 0,
        "C#" | "DB" => 1,
        "D" => 2,
        "D#" | "EB" => 3,
        "E" => 4,
        "F" => 5,
        "F#" | "GB" => 6,
        "G" => 7,
        "G#" | "AB" => 8,
        "A" => 9,
        "A#" | "BB" => 10,
        "B" => 11,
        _ => bail!("invalid note name '{}'", s),
    };
    let octave: u16 = octave
        .parse()
        .with_context(|| format!("invalid octave in '{}'", s))?;
    let note = octave * 12 + semitone;
    if note > 127 {
        bail!("note {} is out of range", s);
    }
    Ok(note as u8)
}

/// Read lines until `quit`, EOF or Ctrl+C, forwarding parsed commands
///
/// Blocking; run it on its own thread.
pub fn run_repl(tx: mpsc::Sender<Command>) -> Result<()> {
    let mut rl = DefaultEditor::new()?;

    loop {
        match rl.readline("midikeys> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line);

                match Command::parse(line) {
                    Ok(command) => {
                        let quit = command == Command::Quit;
                        if tx.blocking_send(command).is_err() {
                            debug!("Command channel closed, leaving REPL");
                            break;
                        }
                        if quit {
                            break;
                        }
                    }
                    Err(e) => eprintln!("{} {}", "✗".red(), e),
                }
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => {
                let _ = tx.blocking_send(Command::Quit);
                break;
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}
