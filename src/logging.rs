//! Log setup for the keepvault binary.
//!
//! Everything goes to a log file with RFC3339 timestamps. Warnings and
//! errors are echoed to the terminal as well. Secrets never reach the log.

use anyhow::{Context, Result};
use log::LevelFilter;
use simplelog::{
    ColorChoice, CombinedLogger, ConfigBuilder, SharedLogger, TermLogger, TerminalMode, WriteLogger,
};
use std::fs::OpenOptions;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

pub const DEFAULT_LOG_FILE: &str = "keepvault.log";

/// Rotated files beyond this many are deleted, oldest first.
pub const DEFAULT_KEEP_ROTATED: usize = 3;

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub path: PathBuf,
    pub level: LevelFilter,
    /// Rotate once the file grows past this many bytes. 0 disables rotation.
    pub max_size: u64,
    pub keep_rotated: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_LOG_FILE),
            level: LevelFilter::Info,
            max_size: 5 * 1024 * 1024,
            keep_rotated: DEFAULT_KEEP_ROTATED,
        }
    }
}

impl LogConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn with_level(mut self, level: LevelFilter) -> Self {
        self.level = level;
        self
    }

    pub fn with_max_size(mut self, max_size: u64) -> Self {
        self.max_size = max_size;
        self
    }

    pub fn with_keep_rotated(mut self, keep: usize) -> Self {
        self.keep_rotated = keep;
        self
    }

    /// Whether the current log file has outgrown `max_size`.
    pub fn needs_rotation(&self) -> bool {
        self.max_size > 0
            && std::fs::metadata(&self.path)
                .map(|m| m.len() > self.max_size)
                .unwrap_or(false)
    }
}

/// Installs the global logger. Fails if a logger is already installed.
pub fn init_logging(config: &LogConfig) -> Result<()> {
    if let Some(parent) = config.path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }

    if config.needs_rotation() {
        rotate_log(&config.path)?;
        prune_rotated(&config.path, config.keep_rotated)?;
    }

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.path)
        .with_context(|| format!("Failed to open log file {}", config.path.display()))?;

    let file_config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_target_level(LevelFilter::Off)
        .set_location_level(LevelFilter::Debug)
        .build();

    let term_config = ConfigBuilder::new()
        .set_time_level(LevelFilter::Off)
        .set_target_level(LevelFilter::Off)
        .set_location_level(LevelFilter::Off)
        .build();

    let mut loggers: Vec<Box<dyn SharedLogger>> =
        vec![WriteLogger::new(config.level, file_config, log_file)];

    if std::io::stderr().is_terminal() {
        loggers.push(TermLogger::new(
            LevelFilter::Warn,
            term_config,
            TerminalMode::Stderr,
            ColorChoice::Auto,
        ));
    }

    CombinedLogger::init(loggers).context("Failed to initialize logger")?;

    log::info!("keepvault {} logging at {:?}", env!("CARGO_PKG_VERSION"), config.level);
    Ok(())
}

fn rotated_prefix(path: &Path) -> String {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(DEFAULT_LOG_FILE);
    format!("{name}.")
}

/// Renames `path` to `<name>.<timestamp>`.
fn rotate_log(path: &Path) -> Result<PathBuf> {
    let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let rotated = path.with_file_name(format!("{}{}", rotated_prefix(path), stamp));
    std::fs::rename(path, &rotated)
        .with_context(|| format!("Failed to rotate {}", path.display()))?;
    Ok(rotated)
}

/// Keeps the `keep` newest rotated files next to `path`.
fn prune_rotated(path: &Path, keep: usize) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let prefix = rotated_prefix(path);

    let mut rotated: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(&prefix))
        })
        .collect();

    // timestamps sort lexically
    rotated.sort();
    let excess = rotated.len().saturating_sub(keep);
    for old in rotated.into_iter().take(excess) {
        std::fs::remove_file(&old)?;
    }
    Ok(())
}

/// Evaluates `$body` and logs how long it took at debug level.
#[macro_export]
macro_rules! log_timed {
    ($op:expr, $body:expr) => {{
        let start = std::time::Instant::now();
        let result = $body;
        log::debug!("{} took {:?}", $op, start.elapsed());
        result
    }};
}
