use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use oci_discovery::{MemoryTransport, RefEngineRegistry, INDEX_MEDIA_TYPE, REF_ENGINES_MEDIA_TYPE};
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

pub(crate) const WELL_KNOWN: &str = "https://example.com/.well-known/oci-host-ref-engines";
pub(crate) const INDEX: &str = "https://example.com/index.json";

pub(crate) fn two_entry_index() -> Value {
    json!({
        "schemaVersion": 2,
        "manifests": [
            {"size": 1},
            {"size": 2, "annotations": {"org.opencontainers.image.ref.name": "1.0"}},
        ]
    })
}

pub(crate) fn index_template_engines(uri: &str) -> Value {
    json!({"refEngines": [{"protocol": "oci-index-template-v1", "uri": uri}]})
}

/// `example.com` publishing an index-template engine and a two-entry index
/// at the root of the host.
pub(crate) fn example_com() -> MemoryTransport {
    MemoryTransport::new()
        .with_json(WELL_KNOWN, REF_ENGINES_MEDIA_TYPE, &index_template_engines("/index.json"))
        .expect("well-known document")
        .with_json(INDEX, INDEX_MEDIA_TYPE, &two_entry_index())
        .expect("index document")
}

pub(crate) fn registry() -> Arc<RefEngineRegistry> {
    Arc::new(RefEngineRegistry::with_defaults())
}

/// A canned response served by [`HttpFixture`].
pub(crate) struct Route {
    pub(crate) content_type: &'static str,
    pub(crate) body: String,
}

/// Minimal HTTP/1.1 server on a random local port.
///
/// Every connection carries one request and is closed after the response.
/// Unknown paths answer 404.
pub(crate) struct HttpFixture {
    pub(crate) addr: SocketAddr,
    requests: Arc<Mutex<Vec<(String, String)>>>,
}

impl HttpFixture {
    pub(crate) async fn serve(routes: HashMap<&'static str, Route>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local address");
        let requests = Arc::new(Mutex::new(Vec::new()));
        let seen = requests.clone();
        let routes = Arc::new(routes);

        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                let routes = routes.clone();
                let seen = seen.clone();
                tokio::spawn(async move {
                    let mut raw = Vec::new();
                    let mut buf = [0u8; 1024];
                    while !raw.windows(4).any(|w| w == b"\r\n\r\n") {
                        match stream.read(&mut buf).await {
                            Ok(0) | Err(_) => return,
                            Ok(n) => raw.extend_from_slice(&buf[..n]),
                        }
                    }

                    let head = String::from_utf8_lossy(&raw).to_string();
                    let path = head.split_whitespace().nth(1).unwrap_or("/").to_string();
                    let accept = head
                        .lines()
                        .find_map(|line| {
                            let (key, value) = line.split_once(':')?;
                            key.eq_ignore_ascii_case("accept").then(|| value.trim().to_string())
                        })
                        .unwrap_or_default();
                    seen.lock().unwrap().push((path.clone(), accept));

                    let response = match routes.get(path.as_str()) {
                        Some(route) => format!(
                            "HTTP/1.1 200 OK\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            route.content_type,
                            route.body.len(),
                            route.body
                        ),
                        None => "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
                            .to_string(),
                    };
                    let _ = stream.write_all(response.as_bytes()).await;
                    let _ = stream.shutdown().await;
                });
            }
        });

        Self { addr, requests }
    }

    /// `(path, accept)` pairs received so far.
    pub(crate) fn requests(&self) -> Vec<(String, String)> {
        self.requests.lock().unwrap().clone()
    }
}
