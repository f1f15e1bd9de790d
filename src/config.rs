//! Runtime configuration.
//!
//! Configuration is read from environment variables at server construction
//! time, optionally seeded from a `.env` file:
//!
//! - `TRELLIS_WORKERS` - connection workers in the pool (default: 100)
//! - `TRELLIS_READ_TIMEOUT_MS` - socket read timeout (default: 30000)
//! - `TRELLIS_STACK_SIZE` - worker coroutine stack size in bytes, decimal or
//!   `0x` hex (default: 0x10000)

use std::env;
use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;

use tracing::debug;

const DEFAULT_WORKERS: usize = 100;
const DEFAULT_READ_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_STACK_SIZE: usize = 0x10000;

/// Server tuning knobs, frozen once the server starts listening.
#[derive(Debug, Clone, Copy)]
pub struct ServerConfig {
    /// Number of connection worker coroutines.
    pub workers: usize,
    /// Read timeout applied to every accepted socket.
    pub read_timeout: Duration,
    /// Stack size for worker coroutines in bytes.
    pub stack_size: usize,
}

impl ServerConfig {
    /// Load configuration from `TRELLIS_*` environment variables.
    pub fn from_env() -> Self {
        let workers = env::var("TRELLIS_WORKERS")
            .ok()
            .and_then(|s| s.parse().ok())
            .filter(|&n| n > 0)
            .unwrap_or(DEFAULT_WORKERS);

        let read_timeout_ms = env::var("TRELLIS_READ_TIMEOUT_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_READ_TIMEOUT_MS);

        let stack_size = env::var("TRELLIS_STACK_SIZE")
            .ok()
            .and_then(|s| parse_stack_size(&s))
            .unwrap_or(DEFAULT_STACK_SIZE);

        Self {
            workers,
            read_timeout: Duration::from_millis(read_timeout_ms),
            stack_size,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            read_timeout: Duration::from_millis(DEFAULT_READ_TIMEOUT_MS),
            stack_size: DEFAULT_STACK_SIZE,
        }
    }
}

fn parse_stack_size(value: &str) -> Option<usize> {
    if let Some(hex) = value.strip_prefix("0x") {
        usize::from_str_radix(hex, 16).ok()
    } else {
        value.parse().ok()
    }
}

/// Load `KEY=VALUE` pairs from `.env` in the working directory into the
/// process environment. A missing file is not an error.
pub fn load_dotenv() -> io::Result<usize> {
    load_dotenv_from(".env")
}

/// Load `KEY=VALUE` pairs from the given file into the process environment.
///
/// Blank lines and lines starting with `#` are skipped. Keys and values are
/// trimmed; a line without `=` is skipped. Returns the number of variables
/// set.
pub fn load_dotenv_from(path: impl AsRef<Path>) -> io::Result<usize> {
    let contents = match fs::read_to_string(path.as_ref()) {
        Ok(c) => c,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e),
    };

    let mut loaded = 0;
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            let key = key.trim();
            if key.is_empty() {
                continue;
            }
            env::set_var(key, value.trim());
            loaded += 1;
        }
    }
    debug!(path = %path.as_ref().display(), loaded, "env file loaded");
    Ok(loaded)
}
