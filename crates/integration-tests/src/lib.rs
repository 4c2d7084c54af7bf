//! Shared helpers for the integration tests

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Minimal HTTP server answering every request with the next scripted feed
/// body (the last one repeats)
pub struct FeedServer {
    url: String,
    hits: Arc<AtomicUsize>,
    handle: JoinHandle<()>,
}

impl FeedServer {
    pub async fn start(bodies: &[&str]) -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let url = format!("http://{}/WaitInfo.ashx", listener.local_addr()?);

        let script: Arc<Mutex<VecDeque<String>>> =
            Arc::new(Mutex::new(bodies.iter().map(|b| b.to_string()).collect()));
        let hits = Arc::new(AtomicUsize::new(0));

        let handle = {
            let hits = hits.clone();
            tokio::spawn(async move {
                while let Ok((mut socket, _)) = listener.accept().await {
                    let body = {
                        let mut script = script.lock().unwrap();
                        if script.len() > 1 {
                            script.pop_front().unwrap_or_default()
                        } else {
                            script.front().cloned().unwrap_or_default()
                        }
                    };
                    hits.fetch_add(1, Ordering::SeqCst);

                    tokio::spawn(async move {
                        let mut buf = vec![0u8; 4096];
                        let _ = socket.read(&mut buf).await;
                        let response = format!(
                            "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
            })
        };

        Ok(Self { url, hits, handle })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Requests served so far
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

impl Drop for FeedServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
