//! Server configuration.

use std::path::PathBuf;

use gridroom_room::CoordinatorConfig;
use serde::{Deserialize, Serialize};

use crate::GridroomError;

/// Everything needed to start a server process.
///
/// | Field               | Variable                     | Default        |
/// |---------------------|------------------------------|----------------|
/// | `bind_addr`         | `GRIDROOM_BIND`              | `0.0.0.0:3000` |
/// | `db_path`           | `GRIDROOM_DB`                | `db.json`      |
/// | `board_size`        | `GRIDROOM_BOARD_SIZE`        | unset          |
/// | `notify_rejections` | `GRIDROOM_NOTIFY_REJECTIONS` | `false`        |
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub db_path: PathBuf,
    pub board_size: Option<u32>,
    pub notify_rejections: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".to_string(),
            db_path: PathBuf::from("db.json"),
            board_size: None,
            notify_rejections: false,
        }
    }
}

impl ServerConfig {
    /// Reads the configuration from `GRIDROOM_*` environment variables,
    /// falling back to the defaults for unset ones.
    pub fn from_env() -> Result<Self, GridroomError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an arbitrary source of
    /// variables.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, GridroomError> {
        let mut config = Self::default();

        if let Some(addr) = lookup("GRIDROOM_BIND") {
            config.bind_addr = addr;
        }
        if let Some(path) = lookup("GRIDROOM_DB") {
            config.db_path = PathBuf::from(path);
        }
        if let Some(raw) = lookup("GRIDROOM_BOARD_SIZE") {
            let size = raw.trim().parse::<u32>().ok().filter(|size| *size > 0);
            config.board_size = Some(size.ok_or_else(|| {
                GridroomError::Config(format!("GRIDROOM_BOARD_SIZE={raw:?} is not a positive integer"))
            })?);
        }
        if let Some(raw) = lookup("GRIDROOM_NOTIFY_REJECTIONS") {
            config.notify_rejections = parse_flag(&raw).ok_or_else(|| {
                GridroomError::Config(format!("GRIDROOM_NOTIFY_REJECTIONS={raw:?} is not a boolean"))
            })?;
        }

        Ok(config)
    }

    /// The part of the configuration the coordinator needs.
    pub fn coordinator_config(&self) -> CoordinatorConfig {
        CoordinatorConfig {
            board_size: self.board_size,
            notify_rejections: self.notify_rejections,
        }
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
