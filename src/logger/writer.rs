//! Log writer module
//!
//! Write-once global sink. Access and info lines go to stdout or an access
//! log file; warnings and errors go to stderr or an error log file.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, OnceLock};

use super::Level;

static LOG_WRITER: OnceLock<LogWriter> = OnceLock::new();

enum LogTarget {
    Stdout,
    Stderr,
    File {
        file: Mutex<File>,
        path: String,
        /// Set after the first failed write has been reported
        write_failed: AtomicBool,
    },
}

impl LogTarget {
    fn open(path: Option<&str>, fallback: Self) -> io::Result<Self> {
        match path {
            Some(p) => open_log_file(p).map(|f| Self::file(f, p)),
            None => Ok(fallback),
        }
    }

    fn file(file: File, path: &str) -> Self {
        Self::File {
            file: Mutex::new(file),
            path: path.to_string(),
            write_failed: AtomicBool::new(false),
        }
    }

    fn write_line(&self, message: &str) {
        match self {
            Self::Stdout => println!("{message}"),
            Self::Stderr => eprintln!("{message}"),
            Self::File {
                file,
                path,
                write_failed,
            } => {
                let result = file
                    .lock()
                    .map_err(|_| io::Error::other("log file lock poisoned"))
                    .and_then(|mut f| writeln!(f, "{message}"));
                // Report the first failure only; a broken log file would
                // otherwise flood stderr
                if let Err(e) = result {
                    if !write_failed.swap(true, Ordering::Relaxed) {
                        eprintln!("[ERROR] Failed to write log file '{path}': {e}");
                    }
                }
            }
        }
    }
}

pub struct LogWriter {
    level: Level,
    access: LogTarget,
    error: LogTarget,
}

impl LogWriter {
    fn new(
        level: Level,
        access_log_file: Option<&str>,
        error_log_file: Option<&str>,
    ) -> io::Result<Self> {
        Ok(Self {
            level,
            access: LogTarget::open(access_log_file, LogTarget::Stdout)?,
            error: LogTarget::open(error_log_file, LogTarget::Stderr)?,
        })
    }

    pub fn enabled(&self, level: Level) -> bool {
        level >= self.level
    }

    pub fn write_access(&self, message: &str) {
        self.access.write_line(message);
    }

    /// Route a leveled message to its target, dropping it below the threshold
    pub fn write(&self, level: Level, message: &str) {
        if !self.enabled(level) {
            return;
        }
        match level {
            Level::Debug | Level::Info => self.access.write_line(message),
            Level::Warn | Level::Error => self.error.write_line(message),
        }
    }
}

/// Open or create a log file for appending, creating parent directories
fn open_log_file(path: &str) -> io::Result<File> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    OpenOptions::new().create(true).append(true).open(path)
}

/// Initialize the global log writer. Fails if called twice or if a log
/// file cannot be opened.
pub fn init(
    level: Level,
    access_log_file: Option<&str>,
    error_log_file: Option<&str>,
) -> io::Result<()> {
    let writer = LogWriter::new(level, access_log_file, error_log_file)?;
    LOG_WRITER.set(writer).map_err(|_| {
        io::Error::new(
            io::ErrorKind::AlreadyExists,
            "Log writer already initialized",
        )
    })
}

/// Global writer, if `init()` has run
pub fn get() -> Option<&'static LogWriter> {
    LOG_WRITER.get()
}
