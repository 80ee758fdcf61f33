mod config;
mod http;

pub use config::ServerConfig;
pub use http::HttpServer;
