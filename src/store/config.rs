use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const FILE: &str = "flows.db";

#[derive(Clone, Debug)]
pub struct Config {
    pub path:     PathBuf,
    pub window:   Duration,
    pub interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            path:     data_dir().join(FILE),
            window:   Duration::from_secs(60),
            interval: Duration::from_secs(5),
        }
    }
}

/// Per-user application data directory.
pub fn data_dir() -> PathBuf {
    let base = env::var_os("XDG_DATA_HOME").map(PathBuf::from).or_else(|| {
        env::var_os("HOME").map(|home| PathBuf::from(home).join(".local/share"))
    }).unwrap_or_else(|| PathBuf::from("."));
    base.join("flowscope")
}
