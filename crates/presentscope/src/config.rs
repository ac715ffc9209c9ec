//! `presentscope.toml` and command-line overrides.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use graph_model::{BufferDepth, PresentMode, PresentationConfig};
use graph_renderer::GraphSettings;
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_PATH: &str = "presentscope.toml";
/// Largest ring the storage buffer is sized for.
const MAX_RING_CAPACITY: u32 = 1 << 24;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub graph: GraphSection,
    pub presentation: PresentationSection,
    pub window: WindowSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GraphSection {
    pub capacity: u32,
    pub initial_window: u32,
    pub max_latency_ms: f32,
    pub stats_interval_frames: u64,
}

impl Default for GraphSection {
    fn default() -> Self {
        Self {
            capacity: graph_model::DEFAULT_RING_CAPACITY,
            initial_window: graph_model::DEFAULT_WINDOW_SIZE,
            max_latency_ms: graph_model::DEFAULT_MAX_LATENCY_MS,
            stats_interval_frames: 600,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PresentationSection {
    pub vsync: bool,
    pub buffer_depth: BufferDepth,
    pub present_mode: PresentMode,
    pub scroll: bool,
}

impl Default for PresentationSection {
    fn default() -> Self {
        Self {
            vsync: false,
            buffer_depth: BufferDepth::Triple,
            present_mode: PresentMode::Synchronous,
            scroll: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WindowSection {
    pub width: u32,
    pub height: u32,
    pub title: String,
}

impl Default for WindowSection {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            title: "presentscope".to_owned(),
        }
    }
}

impl AppConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// An explicit path must exist. Without one, `presentscope.toml` in the
    /// working directory is used when present, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return Self::load(path);
        }
        let default_path = Path::new(DEFAULT_CONFIG_PATH);
        if default_path.exists() {
            return Self::load(default_path);
        }
        Ok(Self::default())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let graph = &self.graph;
        if !graph.capacity.is_power_of_two() || graph.capacity < 2 {
            return Err(ConfigError::Invalid(format!(
                "graph.capacity must be a power of two of at least 2, got {}",
                graph.capacity
            )));
        }
        if graph.capacity > MAX_RING_CAPACITY {
            return Err(ConfigError::Invalid(format!(
                "graph.capacity must not exceed {MAX_RING_CAPACITY}, got {}",
                graph.capacity
            )));
        }
        if graph.initial_window == 0 || graph.initial_window > graph.capacity / 2 {
            return Err(ConfigError::Invalid(format!(
                "graph.initial_window must be in 1..={}, got {}",
                graph.capacity / 2,
                graph.initial_window
            )));
        }
        if !graph.max_latency_ms.is_finite() || graph.max_latency_ms <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "graph.max_latency_ms must be positive, got {}",
                graph.max_latency_ms
            )));
        }
        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "window size must be non-zero, got {}x{}",
                self.window.width, self.window.height
            )));
        }
        Ok(())
    }

    pub fn presentation_config(&self) -> PresentationConfig {
        let mut config = PresentationConfig::new(self.graph.capacity);
        config.vsync = self.presentation.vsync;
        config.buffer_depth = self.presentation.buffer_depth;
        config.present_mode = self.presentation.present_mode;
        config.scroll = self.presentation.scroll;
        config.set_window_size(self.graph.initial_window);
        config
    }

    pub fn graph_settings(&self) -> GraphSettings {
        GraphSettings {
            ring_capacity: self.graph.capacity,
            max_latency_ms: self.graph.max_latency_ms,
            stats_interval_frames: self.graph.stats_interval_frames,
        }
    }
}

/// Measures how long acquiring the next drawable takes and graphs it live.
#[derive(Debug, Parser)]
#[command(name = "presentscope", version)]
pub struct Cli {
    /// Config file; defaults to ./presentscope.toml when it exists.
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Wait for vertical blank.
    #[arg(long)]
    pub vsync: bool,
    /// Present from the queue completion callback instead of the render thread.
    #[arg(long)]
    pub scheduled: bool,
    /// Two swapchain images instead of three.
    #[arg(long)]
    pub double_buffer: bool,
    /// Fill the graph left to right instead of scrolling.
    #[arg(long)]
    pub paged: bool,
    /// Bars on screen.
    #[arg(long)]
    pub window: Option<u32>,
    /// Latency at the top of the graph.
    #[arg(long)]
    pub max_latency_ms: Option<f32>,
    /// Frames between logged latency summaries, 0 to disable.
    #[arg(long)]
    pub stats_interval: Option<u64>,
}

impl Cli {
    /// Loads the config file, applies the flags given on the command line
    /// and validates the result.
    pub fn resolve(&self) -> Result<AppConfig, ConfigError> {
        let mut config = AppConfig::load_or_default(self.config.as_deref())?;
        self.apply_overrides(&mut config);
        config.validate()?;
        Ok(config)
    }

    pub fn apply_overrides(&self, config: &mut AppConfig) {
        if self.vsync {
            config.presentation.vsync = true;
        }
        if self.scheduled {
            config.presentation.present_mode = PresentMode::Scheduled;
        }
        if self.double_buffer {
            config.presentation.buffer_depth = BufferDepth::Double;
        }
        if self.paged {
            config.presentation.scroll = false;
        }
        if let Some(window) = self.window {
            config.graph.initial_window = window;
        }
        if let Some(max_latency_ms) = self.max_latency_ms {
            config.graph.max_latency_ms = max_latency_ms;
        }
        if let Some(stats_interval) = self.stats_interval {
            config.graph.stats_interval_frames = stats_interval;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = AppConfig::parse("").expect("parse empty config");
        assert_eq!(config, AppConfig::default());
        let presentation = config.presentation_config();
        assert_eq!(presentation.window_size(), 256);
        assert!(!presentation.vsync);
        assert!(presentation.scroll);
        assert_eq!(presentation.buffer_depth, BufferDepth::Triple);
        assert_eq!(presentation.present_mode, PresentMode::Synchronous);
    }

    #[test]
    fn sections_override_defaults() {
        let config = AppConfig::parse(
            r#"
            [graph]
            capacity = 4096
            initial_window = 1024
            max_latency_ms = 50.0

            [presentation]
            vsync = true
            buffer_depth = "double"
            present_mode = "scheduled"
            scroll = false

            [window]
            title = "latency"
            "#,
        )
        .expect("parse config");
        assert_eq!(config.graph.capacity, 4096);
        assert_eq!(config.window.title, "latency");
        assert_eq!(config.window.width, 1280);

        let presentation = config.presentation_config();
        assert_eq!(presentation.window_size(), 1024);
        assert_eq!(presentation.max_window_size(), 2048);
        assert!(presentation.vsync);
        assert!(!presentation.scroll);
        assert_eq!(presentation.present_mode, PresentMode::Scheduled);
        assert_eq!(presentation.buffer_depth, BufferDepth::Double);

        let settings = config.graph_settings();
        assert_eq!(settings.ring_capacity, 4096);
        assert_eq!(settings.max_latency_ms, 50.0);
    }

    #[test]
    fn invalid_values_are_rejected() {
        for (source, needle) in [
            ("[graph]\ncapacity = 1000", "power of two"),
            ("[graph]\ncapacity = 1", "power of two"),
            ("[graph]\ninitial_window = 0", "initial_window"),
            ("[graph]\ncapacity = 64\ninitial_window = 64", "initial_window"),
            ("[graph]\nmax_latency_ms = 0.0", "max_latency_ms"),
            ("[window]\nwidth = 0", "window size"),
        ] {
            match AppConfig::parse(source) {
                Err(ConfigError::Invalid(message)) => {
                    assert!(message.contains(needle), "{source}: {message}")
                }
                other => panic!("{source}: expected invalid config, got {other:?}"),
            }
        }
    }

    #[test]
    fn unknown_keys_fail_to_parse() {
        assert!(matches!(
            AppConfig::parse("[graph]\nwindow = 12"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let result = AppConfig::load_or_default(Some(Path::new("does/not/exist.toml")));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn command_line_overrides_file_values() {
        let cli = Cli::try_parse_from([
            "presentscope",
            "--vsync",
            "--scheduled",
            "--double-buffer",
            "--paged",
            "--window",
            "64",
            "--stats-interval",
            "0",
        ])
        .expect("parse args");
        let mut config = AppConfig::default();
        cli.apply_overrides(&mut config);
        config.validate().expect("valid overrides");

        assert!(config.presentation.vsync);
        assert!(!config.presentation.scroll);
        assert_eq!(config.presentation.present_mode, PresentMode::Scheduled);
        assert_eq!(config.presentation.buffer_depth, BufferDepth::Double);
        assert_eq!(config.graph.initial_window, 64);
        assert_eq!(config.graph.stats_interval_frames, 0);
    }

    #[test]
    fn out_of_range_window_override_fails_validation() {
        let cli = Cli::try_parse_from(["presentscope", "--window", "65536"]).expect("parse args");
        let mut config = AppConfig::default();
        cli.apply_overrides(&mut config);
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }
}
