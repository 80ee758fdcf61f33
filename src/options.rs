use std::path::PathBuf;
use crate::error::{EmuError, Result};
use crate::server::ServerConfig;

/// `/cntrl` 応答本文の既定上限（16 MiB）
pub const DEFAULT_CNTRL_MAX_BYTES: u64 = 16 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct Options {
    // サーバーオプション
    pub address: String,
    pub port: u16,
    pub www_root: PathBuf,
    pub cntrl_divisor: u64,
    pub cntrl_max_bytes: u64,

    // 帯域オプション
    pub initial_rate: u64,

    // 出力・表示オプション
    pub verbose: u8,
    pub quiet: bool,
    pub log_file: Option<PathBuf>,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            // サーバーオプション
            address: "0.0.0.0".to_string(),
            port: 80,
            www_root: PathBuf::new(),
            cntrl_divisor: 10,
            cntrl_max_bytes: DEFAULT_CNTRL_MAX_BYTES,

            // 帯域オプション
            initial_rate: 0,

            // 出力・表示オプション
            verbose: 0,
            quiet: false,
            log_file: None,
        }
    }
}

impl Options {
    /// 設定ファイルの値を反映（コマンドラインの値は後から上書きする）
    pub fn apply_config(&mut self, config: ServerConfig) {
        if let Some(address) = config.address {
            self.address = address;
        }
        if let Some(port) = config.port {
            self.port = port;
        }
        if let Some(www_root) = config.www_root {
            self.www_root = www_root;
        }
        if let Some(divisor) = config.cntrl_divisor {
            self.cntrl_divisor = divisor;
        }
        if let Some(max_bytes) = config.cntrl_max_bytes {
            self.cntrl_max_bytes = max_bytes;
        }
        if let Some(rate) = config.initial_rate {
            self.initial_rate = rate;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.www_root.as_os_str().is_empty() {
            return Err(EmuError::InvalidOption(
                "a www directory is required (argument or www_root in the config file)".to_string(),
            ));
        }
        if self.cntrl_divisor == 0 {
            return Err(EmuError::InvalidOption("cntrl_divisor must be at least 1".to_string()));
        }
        if self.cntrl_max_bytes == 0 {
            return Err(EmuError::InvalidOption("cntrl_max_bytes must be at least 1".to_string()));
        }
        if !self.www_root.is_dir() {
            log::warn!("www directory {} does not exist", self.www_root.display());
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }

}

/// `-v` の回数に応じた既定のログレベル
pub fn log_level(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}
