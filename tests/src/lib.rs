//! A canned-response HTTP server for exercising the metrics client.

use std::{
    collections::VecDeque,
    net::SocketAddr,
    sync::{Arc, Mutex},
};

use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
    task::JoinHandle,
};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct Reply {
    pub status: u16,
    pub body:   String,
}

impl Reply {
    pub fn json(value: serde_json::Value) -> Self {
        Self {
            status: 200,
            body:   value.to_string(),
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            body: String::new(),
        }
    }

    pub fn raw(body: &str) -> Self {
        Self {
            status: 200,
            body:   body.to_string(),
        }
    }
}

#[derive(Default)]
struct Shared {
    replies:  VecDeque<Reply>,
    /// Answer once the queue is empty.
    fallback: Option<Reply>,
    requests: Vec<String>,
}

/// Serves queued replies in order, one per connection.
pub struct MetricsServer {
    addr:   SocketAddr,
    shared: Arc<Mutex<Shared>>,
    handle: JoinHandle<()>,
}

impl MetricsServer {
    pub async fn start(replies: Vec<Reply>) -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let shared = Arc::new(Mutex::new(Shared {
            replies: replies.into(),
            ..Default::default()
        }));

        let accept_shared = shared.clone();
        let handle = tokio::spawn(async move {
            while let Ok((stream, peer)) = listener.accept().await {
                debug!(%peer, "metrics server accepted a connection");
                let shared = accept_shared.clone();
                tokio::spawn(async move {
                    let _ = serve(stream, shared).await;
                });
            }
        });
        Ok(Self {
            addr,
            shared,
            handle,
        })
    }

    pub fn base_url(&self) -> String { format!("http://{}/", self.addr) }

    pub fn set_fallback(&self, reply: Reply) {
        self.shared.lock().unwrap().fallback = Some(reply);
    }

    /// Request heads received so far, lower-cased.
    pub fn requests(&self) -> Vec<String> { self.shared.lock().unwrap().requests.clone() }
}

impl Drop for MetricsServer {
    fn drop(&mut self) { self.handle.abort(); }
}

async fn serve(mut stream: TcpStream, shared: Arc<Mutex<Shared>>) -> std::io::Result<()> {
    let mut head = Vec::new();
    let mut buf = [0u8; 1024];
    while !head.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = stream.read(&mut buf).await?;
        if n == 0 {
            return Ok(());
        }
        head.extend_from_slice(&buf[..n]);
    }

    let reply = {
        let mut shared = shared.lock().unwrap();
        shared
            .requests
            .push(String::from_utf8_lossy(&head).to_lowercase());
        match shared.replies.pop_front() {
            Some(reply) => reply,
            None => shared.fallback.clone().unwrap_or_else(|| Reply::status(404)),
        }
    };

    let response = format!(
        "HTTP/1.1 {} Canned\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
        reply.status,
        reply.body.len(),
        reply.body
    );
    stream.write_all(response.as_bytes()).await?;
    stream.shutdown().await
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use diskbar_usage::{
        ErrorKind, HttpMetricsSource, MetricsSource, RawMetrics, Unit, UsageConfig, UsageMonitor,
        UsageSnapshot,
    };
    use serde_json::json;
    use tokio::time::timeout;

    use super::*;

    fn config_for(server: &MetricsServer) -> UsageConfig {
        let mut config = UsageConfig::default();
        config.with_base_url(&server.base_url());
        config.refresh_rate = 20;
        config.max_interval = 80;
        config.request_timeout = 2_000;
        config
    }

    #[tokio::test]
    async fn fetches_disk_figures() {
        let server = MetricsServer::start(vec![Reply::json(
            json!({"rss": 100, "disk_used": 512, "disk_total": 2048}),
        )])
        .await
        .unwrap();
        let source = HttpMetricsSource::new(&config_for(&server)).unwrap();

        let metrics = source.fetch().await.unwrap();
        assert_eq!(metrics, Some(RawMetrics::new(512.0, Some(2048.0))));

        let requests = server.requests();
        assert!(requests[0].starts_with("get /api/metrics/v1 "));
        assert!(requests[0].contains("accept: application/json"));
    }

    #[tokio::test]
    async fn error_status_is_a_network_failure() {
        let server = MetricsServer::start(vec![Reply::status(500)]).await.unwrap();
        let source = HttpMetricsSource::new(&config_for(&server)).unwrap();
        let err = source.fetch().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NetworkFailure);
    }

    #[tokio::test]
    async fn unreachable_server_is_a_network_failure() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let mut config = UsageConfig::default();
        config.with_base_url(&format!("http://{addr}/"));
        let source = HttpMetricsSource::new(&config).unwrap();
        let err = source.fetch().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NetworkFailure);
    }

    #[tokio::test]
    async fn garbage_body_is_malformed() {
        let server = MetricsServer::start(vec![Reply::raw("<html>login</html>")])
            .await
            .unwrap();
        let source = HttpMetricsSource::new(&config_for(&server)).unwrap();
        let err = source.fetch().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedResponse);
    }

    #[tokio::test]
    async fn other_shapes_mean_no_data() {
        let server = MetricsServer::start(vec![
            Reply::json(json!({"rss": 100})),
            Reply::raw("null"),
        ])
        .await
        .unwrap();
        let source = HttpMetricsSource::new(&config_for(&server)).unwrap();
        assert_eq!(source.fetch().await.unwrap(), None);
        assert_eq!(source.fetch().await.unwrap(), None);
    }

    #[tokio::test]
    async fn token_is_sent() {
        let server = MetricsServer::start(vec![Reply::json(json!({"disk_used": 1}))])
            .await
            .unwrap();
        let mut config = config_for(&server);
        config.with_token("abc123");
        let source = HttpMetricsSource::new(&config).unwrap();
        source.fetch().await.unwrap();
        assert!(server.requests()[0].contains("authorization: token abc123"));
    }

    #[tokio::test]
    async fn monitor_follows_the_server() {
        let server = MetricsServer::start(vec![
            Reply::json(json!({"disk_used": 5_000_000_000u64, "disk_total": 20_000_000_000u64})),
            Reply::status(502),
            Reply::json(json!({"disk_used": 512, "disk_total": 2048})),
        ])
        .await
        .unwrap();
        server.set_fallback(Reply::json(json!({"disk_used": 512, "disk_total": 2048})));

        let monitor = UsageMonitor::start(&config_for(&server)).unwrap();
        let mut rx = monitor.subscribe();
        let wait = Duration::from_secs(5);

        timeout(wait, rx.changed()).await.unwrap().unwrap();
        let s = *rx.borrow_and_update();
        assert!(s.available());
        assert_eq!(s.unit(), Unit::GB);
        assert!((s.used() - 5.0).abs() < 1e-9);
        assert!((s.total().unwrap() - 20.0).abs() < 1e-9);

        timeout(wait, rx.changed()).await.unwrap().unwrap();
        assert_eq!(*rx.borrow_and_update(), UsageSnapshot::unavailable());

        timeout(wait, rx.changed()).await.unwrap().unwrap();
        let s = *rx.borrow_and_update();
        assert_eq!((s.used(), s.total(), s.unit()), (512.0, Some(2048.0), Unit::B));

        // the fallback repeats the same figures, which must stay quiet.
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(server.requests().len() > 3);
        assert!(!rx.has_changed().unwrap());

        monitor.dispose().await;
        assert!(rx.changed().await.is_err());
    }
}
