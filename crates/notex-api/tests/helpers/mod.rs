//! Test helpers: run the real router on an ephemeral port.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use notex_api::{build_router, AppState, SseConfig};
use notex_db::MemoryNoteRepository;

pub struct TestServer {
    pub base_url: String,
    pub state: AppState,
}

/// Spawn a server backed by an in-memory repository.
pub async fn spawn_test_server() -> TestServer {
    spawn_test_server_with(SseConfig::default()).await
}

pub async fn spawn_test_server_with(sse: SseConfig) -> TestServer {
    let state = AppState::new(Arc::new(MemoryNoteRepository::new()), sse);
    let router = build_router(state.clone(), "http://localhost:3000");

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    TestServer {
        base_url: format!("http://{}", addr),
        state,
    }
}

/// Read raw SSE text until `needle` shows up or the deadline passes.
pub async fn read_until(resp: &mut reqwest::Response, needle: &str) -> String {
    let mut collected = String::new();
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while tokio::time::Instant::now() < deadline {
        match tokio::time::timeout(Duration::from_secs(3), resp.chunk()).await {
            Ok(Ok(Some(chunk))) => {
                collected.push_str(&String::from_utf8_lossy(&chunk));
                if collected.contains(needle) {
                    break;
                }
            }
            _ => break,
        }
    }
    collected
}

/// Poll `check` until it holds or two seconds pass.
pub async fn eventually<F: Fn() -> bool>(check: F) -> bool {
    for _ in 0..100 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    check()
}

/// Collect raw SSE text for `window`.
pub async fn read_for(resp: &mut reqwest::Response, window: Duration) -> String {
    let mut collected = String::new();
    let deadline = tokio::time::Instant::now() + window;
    while let Ok(Ok(Some(chunk))) = tokio::time::timeout_at(deadline, resp.chunk()).await {
        collected.push_str(&String::from_utf8_lossy(&chunk));
    }
    collected
}
