use serde::Deserialize;
use std::path::{Path, PathBuf};
use crate::error::Result;

/// TOML設定ファイル
///
/// ```toml
/// address = "127.0.0.1"
/// port = 8080
/// www_root = "/srv/www"
/// initial_rate = 1250000
/// cntrl_divisor = 10
/// cntrl_max_bytes = 16777216
/// ```
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    pub address: Option<String>,
    pub port: Option<u16>,
    pub www_root: Option<PathBuf>,
    pub initial_rate: Option<u64>,
    pub cntrl_divisor: Option<u64>,
    pub cntrl_max_bytes: Option<u64>,
}

impl ServerConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(path)?;
        let config: ServerConfig = toml::from_str(&config_str)?;
        Ok(config)
    }
}
