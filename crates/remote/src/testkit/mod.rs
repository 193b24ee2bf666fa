//! In-process fake servers for tests
//!
//! Both fakes bind an ephemeral localhost port and are shut down when
//! dropped.

mod bot_server;
mod video_server;

pub use bot_server::{FakeBotServer, FakeBotState};
pub use video_server::{FakeVideo, FakeVideoServer};

pub use axum::http::StatusCode;

async fn bind_local() -> (tokio::net::TcpListener, String) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("test listener address");
    (listener, format!("http://{}", addr))
}
