use std::sync::Arc;
use crate::control::command::{parse_rate, Command};
#[cfg(test)]
use crate::emulation::PlayerState;
use crate::emulation::{RateState, TracePlayer};
use crate::error::Result;
use crate::journal;

pub const HELP_TEXT: &str = "\
bw [bytes/s]  - set bandwidth
trace [path]  - run network trace
quit          - close server
";

/// コマンド実行結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Done,
    Help,
    Shutdown,
}

/// オペレーターシェルとHTTP制御エンドポイントが共有する操作
#[derive(Clone)]
pub struct ControlSurface {
    rate: RateState,
    player: Arc<TracePlayer>,
}

impl ControlSurface {
    pub fn new(rate: RateState, player: Arc<TracePlayer>) -> Self {
        ControlSurface { rate, player }
    }

    /// 再生を止めて固定帯域を設定
    pub async fn set_rate(&self, rate: u64) {
        self.player.stop_at(rate).await;
        log::info!("Bandwidth set to {} B/s", rate);
        journal!("bw {}", rate);
    }

    /// 文字列引数から固定帯域を設定（不正な値なら何も変更しない）
    pub async fn set_rate_arg(&self, arg: &str) -> Result<()> {
        let rate = parse_rate(arg)?;
        self.set_rate(rate).await;
        Ok(())
    }

    pub async fn start_trace(&self, path: &str) -> Result<()> {
        journal!("trace {}", path);
        if let Err(e) = self.player.start(path).await {
            log::warn!("Failed to start trace: {}", e);
            return Err(e);
        }
        Ok(())
    }

    /// 再生中のトレースを先頭から再生し直す
    pub async fn reset_trace(&self) -> bool {
        let restarted = self.player.reset_in_place().await;
        journal!("tracereset ({})", if restarted { "restarted" } else { "idle" });
        restarted
    }

    pub async fn shutdown(&self) {
        journal!("quit");
        self.player.stop().await;
        log::info!("Shutting down");
    }

    /// 応答サイズ決定用の現在帯域（読み取りのみ）
    pub fn current_rate(&self) -> u64 {
        self.rate.read()
    }

    #[cfg(test)]
    pub fn player_state(&self) -> PlayerState {
        self.player.state()
    }

    pub async fn dispatch(&self, command: Command) -> Result<Outcome> {
        match command {
            Command::SetRate(rate) => {
                self.set_rate(rate).await;
                Ok(Outcome::Done)
            }
            Command::StartTrace(path) => {
                self.start_trace(&path).await?;
                Ok(Outcome::Done)
            }
            Command::Quit => {
                self.shutdown().await;
                Ok(Outcome::Shutdown)
            }
            Command::Help => Ok(Outcome::Help),
        }
    }

    /// 1行のテキストコマンドを解析して実行
    pub async fn dispatch_line(&self, line: &str) -> Result<Outcome> {
        let command = Command::parse(line)?;
        self.dispatch(command).await
    }
}
