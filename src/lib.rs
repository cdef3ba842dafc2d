pub mod adapters;
mod app;
mod assets;
pub mod bot;
pub mod config;
pub mod document;
pub mod ops;
pub mod ports;
pub mod session;
mod state;
mod templates;
pub mod types;

pub use app::app;

use std::net::SocketAddr;

pub async fn serve(addr: SocketAddr, config: config::AppConfig) {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app(config)).await.expect("server error");
}
