//! Leveled logging shared by convex build scripts and the `convex` CLI.
//!
//! Everything is appended to a log file. What reaches the terminal depends on the sink:
//! the CLI writes colored lines to stderr, while build scripts can only talk to the user
//! through `cargo:warning=` lines on stdout (anything else is swallowed by cargo).

use colored::Colorize;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

static LOG_FILE: Mutex<Option<PathBuf>> = Mutex::new(None);
static VERBOSITY: Mutex<u8> = Mutex::new(0);
static SINK: Mutex<Sink> = Mutex::new(Sink::Console);

/// Where console-bound messages go
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sink {
    /// Colored lines on stderr
    Console,
    /// `cargo:warning=` lines on stdout
    BuildScript,
}

/// Name of the log file inside the log directory
pub const LOG_FILE_NAME: &str = "convex.log";

/// Get the current verbosity level
pub fn get_verbosity() -> u8 {
    VERBOSITY.lock().ok().map(|v| *v).unwrap_or(0)
}

/// Get the active sink
pub fn get_sink() -> Sink {
    SINK.lock().ok().map(|s| *s).unwrap_or(Sink::Console)
}

fn set_state(verbosity: u8, sink: Sink, log_file: Option<PathBuf>) {
    if let Ok(mut v) = VERBOSITY.lock() {
        *v = verbosity;
    }
    if let Ok(mut s) = SINK.lock() {
        *s = sink;
    }
    if let Ok(mut f) = LOG_FILE.lock() {
        *f = log_file;
    }
}

/// Initialize for CLI use. Logs go to `~/.cache/convex/convex.log` unless `log_dir` is given.
pub fn init_console(verbosity: u8, log_dir: Option<&Path>) -> Result<(), String> {
    let dir = match log_dir {
        Some(dir) => dir.to_path_buf(),
        None => default_log_dir()?,
    };
    let log_file = prepare_log_file(&dir)?;
    set_state(verbosity, Sink::Console, Some(log_file));
    Ok(())
}

/// Initialize for use inside a build script; the log file lands in `out_dir`.
pub fn init_build_script(verbosity: u8, out_dir: &Path) -> Result<(), String> {
    let log_file = prepare_log_file(out_dir)?;
    set_state(verbosity, Sink::BuildScript, Some(log_file));
    Ok(())
}

fn prepare_log_file(dir: &Path) -> Result<PathBuf, String> {
    fs::create_dir_all(dir).map_err(|e| format!("Failed to create log directory: {}", e))?;
    let log_file = dir.join(LOG_FILE_NAME);

    // Truncate log file on each run (overwrite instead of append)
    if log_file.exists() {
        let _ = fs::remove_file(&log_file);
    }
    Ok(log_file)
}

fn default_log_dir() -> Result<PathBuf, String> {
    #[cfg(not(target_os = "windows"))]
    let dir = dirs::home_dir()
        .ok_or("Could not determine home directory")?
        .join(".cache")
        .join("convex");

    #[cfg(target_os = "windows")]
    let dir = dirs::cache_dir()
        .ok_or("Could not determine cache directory")?
        .join("convex");

    Ok(dir)
}

fn write_to_log(message: &str) {
    if let Ok(log_file_guard) = LOG_FILE.lock() {
        if let Some(ref log_path) = *log_file_guard {
            if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(log_path) {
                let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
                let _ = writeln!(file, "[{}] {}", timestamp, message);
            }
        }
    }
}

/// Render a message as cargo build-script warning lines, one per input line
pub fn build_script_lines(prefix: &str, message: &str) -> Vec<String> {
    message
        .lines()
        .map(|line| {
            if prefix.is_empty() {
                format!("cargo:warning={}", line)
            } else {
                format!("cargo:warning={} {}", prefix, line)
            }
        })
        .collect()
}

fn emit_build_script(prefix: &str, message: &str) {
    for line in build_script_lines(prefix, message) {
        println!("{}", line);
    }
}

/// Log an informational message (to console if verbose >= 1, always to file)
pub fn info(message: &str) {
    write_to_log(&format!("INFO {}", message));
    if get_verbosity() >= 1 {
        match get_sink() {
            Sink::Console => eprintln!("{}", message),
            Sink::BuildScript => emit_build_script("", message),
        }
    }
}

/// Log a debug message (to console if verbose >= 2, always to file)
pub fn debug(message: &str) {
    write_to_log(&format!("DEBUG {}", message));
    if get_verbosity() >= 2 {
        match get_sink() {
            Sink::Console => eprintln!("{} {}", "DEBUG:".blue().bold(), message),
            Sink::BuildScript => emit_build_script("debug:", message),
        }
    }
}

/// Log a warning message (to both file and console)
pub fn warn(message: &str) {
    write_to_log(&format!("WARN {}", message));
    match get_sink() {
        Sink::Console => eprintln!("{} {}", "warning:".yellow().bold(), message),
        Sink::BuildScript => emit_build_script("", message),
    }
}

/// Log an error message (to both file and console)
pub fn error(message: &str) {
    write_to_log(&format!("ERROR {}", message));
    match get_sink() {
        Sink::Console => eprintln!("{} {}", "Error:".red().bold(), message),
        Sink::BuildScript => emit_build_script("error:", message),
    }
}

/// Log a success message (console only in CLI mode)
pub fn success(message: &str) {
    write_to_log(&format!("SUCCESS {}", message));
    if get_sink() == Sink::Console {
        let check = "\u{2714}".green().bold();
        eprintln!("{} {}", check, message);
    }
}

/// Log a pipeline step (trace level on console)
pub fn step(message: &str) {
    write_to_log(&format!("STEP: {}", message));
    if get_verbosity() >= 3 && get_sink() == Sink::Console {
        eprintln!("TRACE: {}", message);
    }
}

/// Get the log file path for display
pub fn get_log_path() -> Option<PathBuf> {
    LOG_FILE.lock().ok().and_then(|guard| guard.clone())
}

/// Print the log file path to the user
pub fn show_log_path() {
    match get_log_path() {
        Some(path) => eprintln!("Log file: {}", path.display()),
        None => eprintln!("Log file location not available"),
    }
}
