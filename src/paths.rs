//! Where MidiKeys keeps its config and logs
//!
//! - **Dev mode** (debug builds): `config.yaml` in the working directory wins.
//! - **Portable mode**: a `.portable` marker next to the executable keeps
//!   everything beside it.
//! - **Installed mode** (default): the platform data directory, e.g.
//!   `%APPDATA%\MidiKeys` or `~/.local/share/MidiKeys`.

use anyhow::Context;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::AppConfig;

/// Directory name in installed mode
const APP_NAME: &str = "MidiKeys";

const CONFIG_FILE: &str = "config.yaml";
const EXAMPLE_CONFIG_FILE: &str = "config.example.yaml";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathMode {
    Dev,
    Portable,
    Installed,
    /// Config given on the command line
    Explicit,
}

impl fmt::Display for PathMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PathMode::Dev => "dev",
            PathMode::Portable => "portable",
            PathMode::Installed => "installed",
            PathMode::Explicit => "explicit",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub config: PathBuf,
    pub logs_dir: PathBuf,
    pub mode: PathMode,
}

fn exe_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

impl AppPaths {
    /// Everything inside one directory
    pub fn in_dir(dir: impl AsRef<Path>, mode: PathMode) -> Self {
        let dir = dir.as_ref();
        Self {
            config: dir.join(CONFIG_FILE),
            logs_dir: dir.join("logs"),
            mode,
        }
    }

    /// Use an explicit config file; logs go next to it
    pub fn with_config(config: impl Into<PathBuf>) -> Self {
        let config = config.into();
        let logs_dir = config
            .parent()
            .map(|p| p.join("logs"))
            .unwrap_or_else(|| PathBuf::from("logs"));
        Self {
            config,
            logs_dir,
            mode: PathMode::Explicit,
        }
    }

    /// Runs before logging is initialized, so diagnostics go to stderr
    pub fn detect() -> Self {
        let exe_dir = exe_dir();

        #[cfg(debug_assertions)]
        {
            let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
            if cwd.join(CONFIG_FILE).exists() {
                eprintln!("[paths] DEV mode ({} found in {})", CONFIG_FILE, cwd.display());
                return Self::in_dir(cwd, PathMode::Dev);
            }
        }

        if exe_dir.join(".portable").exists() {
            return Self::in_dir(exe_dir, PathMode::Portable);
        }

        let data_dir = dirs::data_dir().unwrap_or_else(|| {
            eprintln!("[paths] WARNING: no platform data dir, falling back to exe dir");
            exe_dir.clone()
        });
        Self::in_dir(data_dir.join(APP_NAME), PathMode::Installed)
    }

    pub fn base_dir(&self) -> PathBuf {
        self.config
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Create the config and logs directories, and seed a config file if none exists
    pub fn ensure_directories(&self) -> anyhow::Result<()> {
        if !self.logs_dir.exists() {
            debug!("Creating logs directory: {}", self.logs_dir.display());
            std::fs::create_dir_all(&self.logs_dir).with_context(|| {
                format!("Failed to create logs directory: {}", self.logs_dir.display())
            })?;
        }

        let base = self.base_dir();
        if !base.exists() {
            debug!("Creating config directory: {}", base.display());
            std::fs::create_dir_all(&base)
                .with_context(|| format!("Failed to create config directory: {}", base.display()))?;
        }

        if !self.config.exists() {
            self.seed_config()?;
        }

        Ok(())
    }

    /// Copy `config.example.yaml` (next to the executable, then cwd) or write defaults
    fn seed_config(&self) -> anyhow::Result<()> {
        let candidates = [
            exe_dir().join(EXAMPLE_CONFIG_FILE),
            PathBuf::from(EXAMPLE_CONFIG_FILE),
        ];

        if let Some(example) = candidates.iter().find(|p| p.exists()) {
            info!("Copying {} to {}", example.display(), self.config.display());
            std::fs::copy(example, &self.config).with_context(|| {
                format!(
                    "Failed to copy example config from {} to {}",
                    example.display(),
                    self.config.display()
                )
            })?;
            return Ok(());
        }

        info!("Writing default config to {}", self.config.display());
        let yaml = serde_yaml::to_string(&AppConfig::default())
            .context("Failed to serialize default config")?;
        std::fs::write(&self.config, yaml)
            .with_context(|| format!("Failed to write config file: {}", self.config.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_in_dir_layout() {
        let paths = AppPaths::in_dir("test", PathMode::Portable);
        assert_eq!(paths.config, PathBuf::from("test/config.yaml"));
        assert_eq!(paths.logs_dir, PathBuf::from("test/logs"));
        assert_eq!(paths.base_dir(), PathBuf::from("test"));
    }

    #[test]
    fn test_with_config_puts_logs_beside() {
        let paths = AppPaths::with_config("/etc/midikeys/custom.yaml");
        assert_eq!(paths.logs_dir, PathBuf::from("/etc/midikeys/logs"));
        assert_eq!(paths.mode, PathMode::Explicit);
    }

    #[tokio::test]
    async fn test_ensure_directories_seeds_loadable_config() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let paths = AppPaths::in_dir(temp_dir.path().join("nested"), PathMode::Installed);

        paths.ensure_directories()?;

        assert!(paths.logs_dir.is_dir());
        assert!(paths.config.is_file());
        // Seeded from the example if one is reachable, defaults otherwise
        AppConfig::load(&paths.config).await?;
        Ok(())
    }

    #[test]
    fn test_existing_config_untouched() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let paths = AppPaths::in_dir(temp_dir.path(), PathMode::Portable);
        std::fs::write(&paths.config, "tick_ms: 5\n")?;

        paths.ensure_directories()?;
        assert_eq!(std::fs::read_to_string(&paths.config)?, "tick_ms: 5\n");
        Ok(())
    }
}
