mod cli;
mod error;
mod options;
mod emulation;
mod control;
mod server;
mod output;

use std::sync::Arc;
use clap::Parser;
use cli::Cli;
use control::{ControlSurface, OperatorShell, ShellExit};
use emulation::{RateState, ScheduleBuilder, ScheduleCache, TracePlayer};
use server::HttpServer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // コマンドライン引数のパース
    let cli = Cli::parse();

    // ロガーの初期化（RUST_LOG が優先）。オプション検証の警告より先に行う
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(options::log_level(cli.verbose)),
    )
    .init();

    let options = cli.into_options()?;

    // 操作ジャーナル（--log-file オプションが指定されている場合）
    if let Some(ref log_file_path) = options.log_file {
        if let Err(e) = output::init_journal(log_file_path) {
            eprintln!("Warning: Failed to initialize log file: {}", e);
        }
    }

    // 帯域エミュレーション
    let rate = RateState::new(options.initial_rate);
    let builder = ScheduleBuilder::default();
    let cache = Arc::new(ScheduleCache::new(builder));
    let player = Arc::new(TracePlayer::new(rate.clone(), cache, builder.interval()));
    let control = ControlSurface::new(rate, player);

    // HTTPサーバー
    let server = HttpServer::new(&options);
    let listener = server.bind().await?;
    println!(
        "Starting Web Server on {}, root directory {}",
        listener.local_addr()?,
        options.www_root.display()
    );
    let mut server_task = tokio::spawn(server.serve(listener, control.clone()));

    // オペレーターシェル
    let shell = OperatorShell::new(control.clone(), !options.quiet);
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());

    tokio::select! {
        exit = shell.run(stdin, tokio::io::stdout()) => {
            if exit? == ShellExit::EndOfInput {
                log::info!("Standard input closed, serving until interrupted");
                tokio::select! {
                    result = &mut server_task => result??,
                    _ = tokio::signal::ctrl_c() => {}
                }
            }
        }
        result = &mut server_task => result??,
        _ = tokio::signal::ctrl_c() => {}
    }

    control.shutdown().await;
    // 標準入力の読み込みが残っていても待たずに終了する
    std::process::exit(0);
}
