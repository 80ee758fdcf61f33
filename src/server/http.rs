use std::path::PathBuf;
use anyhow::{Context, Result};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use crate::control::ControlSurface;
use crate::error::EmuError;
use crate::options::Options;

impl IntoResponse for EmuError {
    fn into_response(self) -> Response {
        let status = match self {
            EmuError::Usage(_) | EmuError::InvalidOption(_) => StatusCode::BAD_REQUEST,
            EmuError::TraceRead { .. } => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, format!("error: {}", self)).into_response()
    }
}

#[derive(Clone)]
struct AppState {
    control: ControlSurface,
    cntrl_divisor: u64,
    cntrl_max_bytes: u64,
}

/// 制御エンドポイントと静的ファイル配信のルーター
pub fn router(
    control: ControlSurface,
    www_root: PathBuf,
    cntrl_divisor: u64,
    cntrl_max_bytes: u64,
) -> Router {
    Router::new()
        .route("/bw/:rate", get(set_rate))
        .route("/trace/*path", get(start_trace))
        .route("/tracereset", get(reset_trace))
        .route("/cntrl", get(cntrl))
        .fallback_service(ServeDir::new(www_root))
        .with_state(AppState {
            control,
            cntrl_divisor: cntrl_divisor.max(1),
            cntrl_max_bytes: cntrl_max_bytes.max(1),
        })
}

async fn set_rate(
    State(app): State<AppState>,
    Path(rate): Path<String>,
) -> Result<&'static str, EmuError> {
    app.control.set_rate_arg(&rate).await?;
    Ok("ok")
}

async fn start_trace(
    State(app): State<AppState>,
    Path(path): Path<String>,
) -> Result<&'static str, EmuError> {
    app.control.start_trace(&path).await?;
    Ok("ok")
}

async fn reset_trace(State(app): State<AppState>) -> &'static str {
    app.control.reset_trace().await;
    "ok"
}

/// 現在の帯域に比例したサイズの本文を返す（上限 `cntrl_max_bytes`）
async fn cntrl(State(app): State<AppState>) -> String {
    let len = (app.control.current_rate() / app.cntrl_divisor)
        .saturating_add(1)
        .min(app.cntrl_max_bytes);
    "c".repeat(usize::try_from(len).unwrap_or(usize::MAX))
}

pub struct HttpServer {
    address: String,
    www_root: PathBuf,
    cntrl_divisor: u64,
    cntrl_max_bytes: u64,
}

impl HttpServer {
    pub fn new(options: &Options) -> Self {
        HttpServer {
            address: options.bind_address(),
            www_root: options.www_root.clone(),
            cntrl_divisor: options.cntrl_divisor,
            cntrl_max_bytes: options.cntrl_max_bytes,
        }
    }

    pub async fn bind(&self) -> Result<TcpListener> {
        let listener = TcpListener::bind(&self.address)
            .await
            .context(format!("Failed to bind to {}", self.address))?;
        Ok(listener)
    }

    pub async fn serve(self, listener: TcpListener, control: ControlSurface) -> Result<()> {
        let local = listener.local_addr()?;
        log::info!("Listening on {}, root directory {}", local, self.www_root.display());

        let app = router(control, self.www_root, self.cntrl_divisor, self.cntrl_max_bytes);
        axum::serve(listener, app).await.context("HTTP server failed")?;
        Ok(())
    }
}
