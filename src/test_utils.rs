//! Test helpers.
//!
//! [`StubPortal`] is a loopback HTTP/1.1 server that answers every request
//! with the same canned bytes. It exists so the network paths (body caps,
//! digest verification, concurrency bounds) can be exercised without a
//! real portal or any mock-server dependency. Each request is handled on
//! its own task, and the peak number of simultaneously open requests is
//! recorded so tests can assert on concurrency limits.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// A canned-response HTTP server bound to an ephemeral loopback port.
pub struct StubPortal {
    /// Base URL to hand to a `PortalClient`
    pub url: String,
    peak: Arc<AtomicUsize>,
}

impl StubPortal {
    /// Serve `response` (a complete HTTP response, see [`http_response`])
    /// to every connection.
    pub async fn serve(response: Vec<u8>) -> Self {
        Self::serve_with_delay(response, Duration::ZERO).await
    }

    /// Like [`serve`](Self::serve), but each request is held open for
    /// `delay` before the response is sent, making request overlap
    /// observable through [`peak_concurrency`](Self::peak_concurrency).
    pub async fn serve_with_delay(response: Vec<u8>, delay: Duration) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("binding stub portal");
        let url = format!("http://{}", listener.local_addr().expect("local addr"));

        let current = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let peak_writer = Arc::clone(&peak);

        tokio::spawn(async move {
            loop {
                let Ok((mut sock, _)) = listener.accept().await else {
                    break;
                };
                let current = Arc::clone(&current);
                let peak = Arc::clone(&peak_writer);
                let response = response.clone();
                tokio::spawn(async move {
                    let in_flight = current.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(in_flight, Ordering::SeqCst);

                    // Read the request head; GET requests fit in one read.
                    let mut buf = [0u8; 2048];
                    let _ = sock.read(&mut buf).await;
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    let _ = sock.write_all(&response).await;
                    let _ = sock.shutdown().await;

                    current.fetch_sub(1, Ordering::SeqCst);
                });
            }
        });

        Self { url, peak }
    }

    /// The highest number of requests that were open at the same instant.
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

/// Build a complete HTTP/1.1 response with the given status line and body.
///
/// `Connection: close` is always set so every request from a pooling
/// client opens a fresh connection, keeping the request count honest.
pub fn http_response(status: &str, body: &[u8]) -> Vec<u8> {
    let mut out = format!(
        "HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    )
    .into_bytes();
    out.extend_from_slice(body);
    out
}
