//! Configuration and CLI argument handling

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use crate::{
    error::ConfigValidationError,
    state::{ContainerSize, TimerConfig},
    ui::KeyBindings,
};

/// CLI argument parsing structure
#[derive(Debug, Parser)]
#[command(name = "podium-timer")]
#[command(about = "Presentation timer and PDF page coordinator served over HTTP")]
#[command(version = "1.0.0")]
pub struct Config {
    /// Port to bind the server to
    #[arg(short, long, default_value = "20560")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Total talk duration in seconds
    #[arg(short, long, default_value = "60", allow_hyphen_values = true)]
    pub total: i64,

    /// Countdown before the timer starts, in seconds
    #[arg(short, long, default_value = "3", allow_hyphen_values = true)]
    pub countdown: i64,

    /// Start the timer without a countdown
    #[arg(long)]
    pub no_countdown: bool,

    /// Initial viewer width until the browser reports its own
    #[arg(long, default_value = "1280", allow_hyphen_values = true)]
    pub viewport_width: f64,

    /// Initial viewer height until the browser reports its own
    #[arg(long, default_value = "720", allow_hyphen_values = true)]
    pub viewport_height: f64,

    /// TOML file overriding the default key bindings
    #[arg(long)]
    pub keymap: Option<PathBuf>,

    /// Upload size limit for documents, in megabytes
    #[arg(long, default_value = "64")]
    pub max_upload_mb: usize,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    /// Startup timer settings, validated the same way as runtime updates
    pub fn timer_config(&self) -> Result<TimerConfig, ConfigValidationError> {
        TimerConfig::new(self.total, !self.no_countdown, self.countdown)
    }

    /// Initial viewer size; pages cannot be fitted into an empty or non-finite box
    pub fn container(&self) -> anyhow::Result<ContainerSize> {
        let container = ContainerSize {
            width: self.viewport_width,
            height: self.viewport_height,
        };
        anyhow::ensure!(
            container.is_usable(),
            "viewport must be positive and finite, got {}x{}",
            container.width,
            container.height
        );
        Ok(container)
    }

    /// Default bindings, or the ones from `--keymap`
    pub fn key_bindings(&self) -> anyhow::Result<KeyBindings> {
        let Some(path) = &self.keymap else {
            return Ok(KeyBindings::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read keymap {}", path.display()))?;
        KeyBindings::from_toml(&text)
            .with_context(|| format!("invalid keymap {}", path.display()))
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }
}
