use clap::{Parser, ArgAction};
use std::path::PathBuf;
use crate::options::Options;
use crate::error::Result;
use crate::server::ServerConfig;

#[derive(Parser, Debug)]
#[command(name = "tracebw")]
#[command(version = "0.1.0")]
#[command(about = "HTTP server with trace-driven bandwidth emulation", long_about = None)]
#[command(disable_help_flag = true)]
pub struct Cli {
    /// Print help information (use --help)
    #[arg(long = "help", action = ArgAction::Help)]
    pub help: Option<bool>,

    /// Directory served as the web root
    pub www_dir: Option<PathBuf>,

    /// Port to listen on (default 80)
    #[arg(short = 'p', long = "port")]
    pub port: Option<u16>,

    /// Address or hostname to bind (default 0.0.0.0)
    #[arg(short = 'h', long = "host")]
    pub host: Option<String>,

    /// Read server settings from a TOML file
    #[arg(long = "config")]
    pub config: Option<PathBuf>,

    /// Bandwidth in bytes/s before any command is given
    #[arg(long = "initial-rate")]
    pub initial_rate: Option<u64>,

    /// Append every control operation to FILE
    #[arg(long = "log-file")]
    pub log_file: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,

    /// Do not print the shell prompt
    #[arg(short = 'q', long = "quiet")]
    pub quiet: bool,
}

impl Cli {
    /// CLIと設定ファイルからOptionsを作る
    pub fn into_options(self) -> Result<Options> {
        let mut options = Options::default();

        // 設定ファイル
        if let Some(ref config_path) = self.config {
            options.apply_config(ServerConfig::load(config_path)?);
        }

        // コマンドラインが優先
        if let Some(host) = self.host {
            options.address = host;
        }
        if let Some(port) = self.port {
            options.port = port;
        }
        if let Some(www_dir) = self.www_dir {
            options.www_root = www_dir;
        }
        if let Some(rate) = self.initial_rate {
            options.initial_rate = rate;
        }
        options.log_file = self.log_file;
        options.verbose = self.verbose;
        options.quiet = self.quiet;

        options.validate()?;
        Ok(options)
    }
}
