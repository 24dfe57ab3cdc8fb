//! Minimal `log` backend.
//!
//! Records go to stderr, or to a file once [`redirect_to_file`] is called
//! (the terminal viewer owns the screen, so it logs to a file instead).

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::{Mutex, OnceLock};

use log::{LevelFilter, Metadata, Record};

/// Environment variable that overrides the configured level.
pub const LOG_ENV: &str = "BUDGETGRID_LOG";

struct SimpleLogger {
    file: OnceLock<Mutex<File>>,
}

static LOGGER: SimpleLogger = SimpleLogger { file: OnceLock::new() };

impl log::Log for SimpleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        match self.file.get() {
            Some(file) => {
                if let Ok(mut file) = file.lock() {
                    let _ = writeln!(file, "[{}] {}: {}", record.level(), record.target(), record.args());
                }
            }
            None => eprintln!("[{}] {}", record.level(), record.args()),
        }
    }

    fn flush(&self) {
        if let Some(file) = self.file.get() {
            if let Ok(mut file) = file.lock() {
                let _ = file.flush();
            }
        }
    }
}

/// Install the logger. `configured` is the settings-file level; the
/// environment variable wins when set to a valid level.
pub fn init(configured: &str) {
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(resolve_level(std::env::var(LOG_ENV).ok().as_deref(), configured));
}

/// Send all further records to `path` (appending).
pub fn redirect_to_file(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let _ = LOGGER.file.set(Mutex::new(file));
    Ok(())
}

fn resolve_level(env: Option<&str>, configured: &str) -> LevelFilter {
    env.and_then(parse_level)
        .or_else(|| parse_level(configured))
        .unwrap_or(LevelFilter::Warn)
}

fn parse_level(s: &str) -> Option<LevelFilter> {
    s.trim().parse::<LevelFilter>().ok()
}
