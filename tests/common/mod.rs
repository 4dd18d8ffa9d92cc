#![allow(dead_code)]

pub mod client;
pub mod test_server;

pub use client::TestClient;
pub use test_server::{TestServer, TestServerBuilder};

pub const ZONE: &str = "example.com.";

/// Polls `check` until it holds or a second has passed.
pub async fn eventually<F, Fut>(mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    for _ in 0..100 {
        if check().await {
            return true;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    false
}
