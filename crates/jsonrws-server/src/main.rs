//! jsonRWS server binary.
//!
//! - WebSocket endpoint: /v1/ws
//! - Decode-once pipeline: WS Text frame -> Envelope -> Dispatcher
//! - Heartbeat ping + idle timeout

use std::net::SocketAddr;

use tracing_subscriber::{fmt, EnvFilter};

use jsonrws_server::{app_state, config, router};

#[tokio::main]
async fn main() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let cfg = config::load_from_file("jsonrws.yaml").expect("config load failed");
    let listen: SocketAddr = cfg
        .server
        .listen
        .parse()
        .expect("server.listen must be a valid SocketAddr");

    let state = app_state::AppState::new(cfg);
    let app = router::build_router(state);

    tracing::info!(%listen, "jsonrws-server starting");
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .expect("failed to bind");

    axum::serve(listener, app).await.expect("server failed");
}
