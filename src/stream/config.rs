//! Stream configuration
//!
//! ```
//! use headerpeek::StreamConfig;
//! use std::time::Duration;
//!
//! let config = StreamConfig::default()
//!     .with_header_capacity(36)
//!     .with_header_ready_timeout(Duration::from_secs(5));
//! assert_eq!(config.header_capacity, 36);
//! ```

use std::io;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default header window capacity in bytes
///
/// Twelve bytes cover a RIFF/WAVE preamble, the longest magic checked by
/// [`ContainerFormat::detect`](super::sniff::ContainerFormat::detect).
pub const DEFAULT_HEADER_CAPACITY: usize = 12;

/// Default bound on the header-ready wait
pub const DEFAULT_HEADER_READY_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Number of leading bytes kept buffered for positional reads
    pub header_capacity: usize,
    /// How long a read (or `length`) waits for the header window
    #[serde(rename = "header_ready_timeout_ms", with = "duration_millis")]
    pub header_ready_timeout: Duration,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            header_capacity: DEFAULT_HEADER_CAPACITY,
            header_ready_timeout: DEFAULT_HEADER_READY_TIMEOUT,
        }
    }
}

impl StreamConfig {
    /// Set the header window size in bytes
    pub fn with_header_capacity(mut self, capacity: usize) -> Self {
        self.header_capacity = capacity;
        self
    }

    /// Set the header wait bound; `Duration::MAX` waits indefinitely
    pub fn with_header_ready_timeout(mut self, timeout: Duration) -> Self {
        self.header_ready_timeout = timeout;
        self
    }

    /// Load a configuration from a JSON file
    ///
    /// Missing fields fall back to their defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let file = std::fs::File::open(path)?;
        serde_json::from_reader(io::BufReader::new(file)).map_err(io::Error::other)
    }

    /// Serialize as pretty-printed JSON
    pub fn to_json_pretty(&self) -> io::Result<String> {
        serde_json::to_string_pretty(self).map_err(io::Error::other)
    }
}

mod duration_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis().min(u64::MAX as u128) as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
