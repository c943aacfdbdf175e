//! Logging configuration with optional file rotation
//!
//! Sets up a `tracing` subscriber with:
//! - stderr output
//! - daily-rotated file output
//! - optional JSON formatting

use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Layer};

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Log level
    pub level: Level,

    /// Log to file
    pub file_path: Option<PathBuf>,

    /// Log to stderr
    pub stderr: bool,

    /// Include thread IDs
    pub thread_ids: bool,

    /// Emit JSON lines instead of human readable output
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            file_path: None,
            stderr: true,
            thread_ids: false,
            json: false,
        }
    }
}

impl LogConfig {
    /// Create config from environment
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(rust_log) = std::env::var("RUST_LOG") {
            config.level = level_from_directive(&rust_log).unwrap_or(config.level);
        }

        if let Ok(log_file) = std::env::var("FHEM_VOICE_LOG_FILE") {
            if !log_file.is_empty() {
                config.file_path = Some(PathBuf::from(log_file));
            }
        }

        if let Ok(log_stderr) = std::env::var("FHEM_VOICE_LOG_STDERR") {
            config.stderr = log_stderr.to_lowercase() != "false";
        }

        if let Ok(log_json) = std::env::var("FHEM_VOICE_LOG_JSON") {
            config.json = log_json.to_lowercase() == "true";
        }

        config
    }

    /// Raise verbosity to debug
    pub fn with_debug(mut self, debug: bool) -> Self {
        if debug {
            self.level = Level::DEBUG;
        }
        self
    }
}

/// Level for this crate from a `RUST_LOG` directive list: the crate's own
/// `target=level` entry wins over a bare global level
fn level_from_directive(directive: &str) -> Option<Level> {
    let mut global = None;
    let mut own = None;

    for part in directive.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        match part.split_once('=') {
            Some((target, level)) => {
                let target = target.split('[').next().unwrap_or_default().trim();
                if target == env!("CARGO_CRATE_NAME") || target == "fhem_voice" {
                    own = level.trim().parse().ok().or(own);
                }
            }
            None => global = part.parse().ok().or(global),
        }
    }

    own.or(global)
}

type BoxedLayer = Box<dyn Layer<tracing_subscriber::Registry> + Send + Sync>;

fn output_layer<W>(writer: W, ansi: bool, config: &LogConfig) -> BoxedLayer
where
    W: for<'w> fmt::MakeWriter<'w> + Send + Sync + 'static,
{
    let layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(ansi)
        .with_target(true)
        .with_thread_ids(config.thread_ids);

    if config.json {
        layer.json().boxed()
    } else {
        layer.boxed()
    }
}

/// Initialize logging with the given configuration
pub fn init_logging(config: LogConfig) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::builder()
        .with_default_directive(config.level.into())
        .from_env_lossy();

    let mut layers: Vec<BoxedLayer> = Vec::new();

    if config.stderr {
        layers.push(output_layer(std::io::stderr, true, &config));
    }

    if let Some(file_path) = &config.file_path {
        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file_appender = tracing_appender::rolling::daily(
            file_path
                .parent()
                .unwrap_or_else(|| std::path::Path::new(".")),
            file_path
                .file_name()
                .unwrap_or_else(|| std::ffi::OsStr::new("fhem-voice.log")),
        );
        layers.push(output_layer(file_appender, false, &config));
    }

    let subscriber = tracing_subscriber::registry().with(layers).with(env_filter);
    tracing::subscriber::set_global_default(subscriber)?;

    Ok(())
}
