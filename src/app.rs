//! Application orchestration
//!
//! Owns the persisted configuration and the router, opens ports according to
//! the config, and applies REPL commands and config reloads between ticks.

use anyhow::Result;
use colored::Colorize;
use std::time::Duration;
use tracing::{info, warn};

use crate::backend::{self, InputPort, OutputPort, UnboundInput, UnboundOutput};
use crate::cli::{Command, PortSide, HELP};
use crate::config::{AppConfig, RoutingConfig};
use crate::keys::LogInjector;
use crate::paths::AppPaths;
use crate::router::{Router, RoutingSettings};
use crate::view;

/// Whether the main loop keeps going after a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct App {
    config: AppConfig,
    paths: AppPaths,
    router: Router,
}

impl App {
    pub fn new(config: AppConfig, paths: AppPaths) -> Self {
        let router = Router::new(
            config.routing.to_settings(),
            config.keymap.clone(),
            Box::new(LogInjector),
        );
        Self {
            config,
            paths,
            router,
        }
    }

    /// (Re)open both ports from the config and announce the output program
    ///
    /// The configured device index is clamped to the last available device;
    /// the clamped index is written back to the in-memory config.
    pub fn setup(&mut self) {
        // Release the old ports before reopening the same devices
        self.router
            .set_input(Box::new(UnboundInput::new("Reconnecting")));
        self.router
            .set_output(Box::new(UnboundOutput::new("Reconnecting")));

        let midi = self.config.midi;
        let input = backend::open_input(midi.input.backend, midi.input.device);
        let output = backend::open_output(midi.output.backend, midi.output.device);

        if input.status() {
            self.config.midi.input.device = input.index();
        } else {
            warn!("MIDI input unavailable: {}", input.last_error());
        }
        if output.status() {
            self.config.midi.output.device = output.index();
        } else {
            warn!("MIDI output unavailable: {}", output.last_error());
        }

        info!(
            "Ports ready (input: {}, output: {})",
            if input.status() { "connected" } else { "disconnected" },
            if output.status() { "connected" } else { "disconnected" }
        );

        self.router.set_input(input);
        self.router.set_output(output);
        self.router.announce_program();
    }

    pub fn tick(&mut self) -> usize {
        self.router.tick()
    }

    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.config.tick_ms)
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Apply a reloaded config; ports are reopened only if the MIDI section changed
    pub fn apply_config(&mut self, config: AppConfig) -> bool {
        let rebind = config.midi != self.config.midi;

        self.router.set_settings(config.routing.to_settings());
        self.router.set_keymap(config.keymap.clone());
        self.config = config;

        if rebind {
            info!("MIDI selection changed, reopening ports");
            self.setup();
        }
        rebind
    }

    fn update_routing(&mut self, change: impl FnOnce(&mut RoutingSettings)) {
        let mut settings = self.router.settings();
        change(&mut settings);
        self.router.set_settings(settings);
        self.config.routing = RoutingConfig::from_settings(&settings);
    }

    /// Run one REPL command
    pub async fn handle(&mut self, command: Command) -> Result<Flow> {
        match command {
            Command::Mute { channel, on } => self.router.set_mute(channel, on),
            Command::Solo { channel, on } => self.router.set_solo(channel, on),
            Command::Hold { channel, on } => self.router.set_hold(channel, on),
            Command::Program { channel, program } => self.router.set_program(channel, program),
            Command::ProgramStep(delta) => {
                let program = self.router.step_program(delta);
                println!("program {}", program.to_string().cyan());
            }
            Command::Listen(channel) => self.update_routing(|s| s.listen_channel = channel),
            Command::Remap(channel) => self.update_routing(|s| s.remap_channel = channel),
            Command::Output(Some(channel)) => self.update_routing(|s| {
                s.output_channel = channel;
                s.sync_output_channel = false;
            }),
            Command::Output(None) => self.update_routing(|s| s.sync_output_channel = true),
            Command::Device {
                side,
                index,
                backend,
            } => {
                let port = match side {
                    PortSide::Input => &mut self.config.midi.input,
                    PortSide::Output => &mut self.config.midi.output,
                };
                port.device = index;
                if let Some(backend) = backend {
                    port.backend = backend;
                }
                self.setup();
            }
            Command::Bind { note, key } => {
                self.config.keymap.bind(note, key);
                self.router.set_keymap(self.config.keymap.clone());
            }
            Command::Unbind(note) => {
                if self.config.keymap.unbind(note).is_none() {
                    println!("note {} was not bound", note);
                }
                self.router.set_keymap(self.config.keymap.clone());
            }
            Command::Panic => self.router.all_notes_off(),
            Command::Status => print!("{}", view::render_status(&self.router)),
            Command::Devices => print!(
                "{}",
                view::render_devices(self.router.input(), self.router.output())
            ),
            Command::Save => {
                self.config.save(&self.paths.config).await?;
                println!("{} saved to {}", "✓".green(), self.paths.config.display());
            }
            Command::Load => {
                let config = AppConfig::load(&self.paths.config).await?;
                if !self.apply_config(config) {
                    self.setup();
                }
                println!("{} loaded {}", "✓".green(), self.paths.config.display());
            }
            Command::Reset => {
                if !self.apply_config(AppConfig::default()) {
                    self.setup();
                }
            }
            Command::Refresh => self.setup(),
            Command::Help => println!("{}", HELP),
            Command::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    /// Release everything still sounding before exit
    pub fn shutdown(&mut self) {
        self.router.all_notes_off();
        info!("MidiKeys stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BackendKind;
    use crate::midi::Message;
    use crate::paths::PathMode;
    use tempfile::TempDir;

    fn make_console_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.midi.input.backend = BackendKind::Console;
        config.midi.output.backend = BackendKind::Console;
        config
    }

    fn make_test_app(dir: &TempDir) -> App {
        let mut app = App::new(
            make_console_config(),
            AppPaths::in_dir(dir.path(), PathMode::Portable),
        );
        app.setup();
        app
    }

    #[tokio::test]
    async fn test_setup_with_console_backends() {
        let dir = TempDir::new().unwrap();
        let app = make_test_app(&dir);

        assert!(!app.router().input().status());
        assert!(app.router().output().status());
        assert_eq!(app.tick_period(), Duration::from_millis(16));
    }

    #[tokio::test]
    async fn test_routing_commands_update_config() -> Result<()> {
        let dir = TempDir::new()?;
        let mut app = make_test_app(&dir);

        app.handle(Command::Listen(3)).await?;
        app.handle(Command::Remap(Some(8))).await?;
        app.handle(Command::Output(Some(5))).await?;

        let settings = app.router().settings();
        assert_eq!(settings.listen_channel, 3);
        assert_eq!(settings.remap_channel, Some(8));
        assert_eq!(settings.effective_output_channel(), 5);
        assert_eq!(app.config().routing.listen_channel, 4);
        assert_eq!(app.config().routing.remap_channel, Some(9));
        assert!(!app.config().routing.sync_output_channel);

        app.handle(Command::Output(None)).await?;
        assert_eq!(app.router().settings().effective_output_channel(), 3);
        Ok(())
    }

    #[tokio::test]
    async fn test_bind_save_load() -> Result<()> {
        let dir = TempDir::new()?;
        let mut app = make_test_app(&dir);

        app.handle(Command::Bind {
            note: 60,
            key: "A".to_string(),
        })
        .await?;
        assert_eq!(app.router().keymap().get(60), Some("A"));
        app.handle(Command::Save).await?;

        app.handle(Command::Unbind(60)).await?;
        assert!(app.router().keymap().is_empty());

        app.handle(Command::Load).await?;
        assert_eq!(app.router().keymap().get(60), Some("A"));
        Ok(())
    }

    #[tokio::test]
    async fn test_load_without_file_fails() {
        let dir = TempDir::new().unwrap();
        let mut app = make_test_app(&dir);
        assert!(app.handle(Command::Load).await.is_err());
    }

    #[tokio::test]
    async fn test_reset_restores_config_defaults() -> Result<()> {
        let dir = TempDir::new()?;
        let mut app = make_test_app(&dir);
        app.handle(Command::Listen(9)).await?;

        app.handle(Command::Reset).await?;

        assert_eq!(app.router().settings(), RoutingSettings::default());
        // Default config selects hardware ports again
        assert_eq!(app.config().midi.output.backend, BackendKind::Hardware);
        Ok(())
    }

    #[tokio::test]
    async fn test_device_command_reopens_port() -> Result<()> {
        let dir = TempDir::new()?;
        let mut app = make_test_app(&dir);

        app.handle(Command::Device {
            side: PortSide::Output,
            index: 5,
            backend: None,
        })
        .await?;
        assert_eq!(app.config().midi.output.backend, BackendKind::Console);
        // Console has a single device, the index is clamped back
        assert_eq!(app.config().midi.output.device, 0);
        assert!(app.router().output().status());

        app.handle(Command::Device {
            side: PortSide::Input,
            index: 1,
            backend: Some(BackendKind::Hardware),
        })
        .await?;
        assert_eq!(app.config().midi.input.backend, BackendKind::Hardware);
        Ok(())
    }

    #[tokio::test]
    async fn test_reset_keeps_channel_state() -> Result<()> {
        let dir = TempDir::new()?;
        let mut app = make_test_app(&dir);
        app.router.route(Message::NoteOn {
            channel: 0,
            note: 60,
            velocity: 100,
        });
        app.handle(Command::Mute { channel: 2, on: true }).await?;

        app.handle(Command::Reset).await?;

        // Still known, so a later panic can release it
        assert!(app.router().channels().get(0).is_held(60));
        assert!(app.router().channels().get(2).muted);
        Ok(())
    }

    #[tokio::test]
    async fn test_apply_config_rebinds_only_on_midi_change() {
        let dir = TempDir::new().unwrap();
        let mut app = make_test_app(&dir);

        let mut config = app.config().clone();
        config.routing.listen_channel = 12;
        assert!(!app.apply_config(config.clone()));
        assert_eq!(app.router().settings().listen_channel, 11);

        config.midi.output.device = 3;
        assert!(app.apply_config(config));
    }

    #[tokio::test]
    async fn test_quit() {
        let dir = TempDir::new().unwrap();
        let mut app = make_test_app(&dir);
        assert_eq!(app.handle(Command::Quit).await.unwrap(), Flow::Quit);
        assert_eq!(app.handle(Command::Panic).await.unwrap(), Flow::Continue);
    }
}
