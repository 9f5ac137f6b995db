//! End-to-end tests against a running server

use bytes::Bytes;
use flate2::read::GzDecoder;
use http::header::{ACCEPT_ENCODING, CONTENT_ENCODING, CONTENT_TYPE, ETAG, IF_NONE_MATCH, VARY};
use http::response::Parts;
use http::{Method, Request, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper::client::conn::http1::SendRequest;
use hyper_util::rt::TokioIo;
use shoal_config::{ConfigBuilder, PrecompressConfig};
use shoal_runtime::{RuntimeState, Server, ServerBuilder, ShutdownSignal};
use std::io::Read;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

const SCRIPT: &str = "export function greet(name) { return `hello ${name}`; }\n";

struct TestServer {
    addr: SocketAddr,
    server: Arc<Server>,
    shutdown: ShutdownSignal,
    task: JoinHandle<shoal_core::Result<()>>,
    _root: TempDir,
}

impl TestServer {
    async fn start(precompression: PrecompressConfig) -> Self {
        let root = tempfile::tempdir().unwrap();
        std::fs::write(root.path().join("app.js"), SCRIPT.repeat(50)).unwrap();
        std::fs::write(root.path().join("logo.png"), [0x89, b'P', b'N', b'G', 0, 1, 2, 3]).unwrap();

        let config = ConfigBuilder::new()
            .listen("127.0.0.1:0".parse().unwrap())
            .root(root.path())
            .precompression(precompression)
            .build()
            .unwrap();

        let shutdown = ShutdownSignal::new();
        let server = Arc::new(
            ServerBuilder::new()
                .config(config)
                .shutdown_signal(shutdown.clone())
                .build()
                .unwrap(),
        );

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let task = {
            let server = Arc::clone(&server);
            tokio::spawn(async move { server.serve(listener).await })
        };

        Self {
            addr,
            server,
            shutdown,
            task,
            _root: root,
        }
    }

    fn get(&self, path: &str) -> http::request::Builder {
        Request::builder()
            .method(Method::GET)
            .uri(path)
            .header(http::header::HOST, self.addr.to_string())
    }

    async fn connect(&self) -> SendRequest<Full<Bytes>> {
        let stream = TcpStream::connect(self.addr).await.unwrap();
        let (sender, conn) = hyper::client::conn::http1::handshake(TokioIo::new(stream))
            .await
            .unwrap();
        tokio::spawn(conn);
        sender
    }

    async fn send(&self, req: http::request::Builder) -> (Parts, Bytes) {
        let mut sender = self.connect().await;
        let response = sender
            .send_request(req.body(Full::new(Bytes::new())).unwrap())
            .await
            .unwrap();
        let (parts, body) = response.into_parts();
        (parts, body.collect().await.unwrap().to_bytes())
    }

    async fn stop(self) -> Arc<Server> {
        self.shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(5), self.task)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        self.server
    }
}

fn gunzip(bytes: &[u8]) -> String {
    let mut out = String::new();
    GzDecoder::new(bytes).read_to_string(&mut out).unwrap();
    out
}

#[tokio::test]
async fn test_gzip_then_not_modified() {
    let server = TestServer::start(PrecompressConfig::default()).await;

    let (first, body) = server
        .send(server.get("/app.js").header(ACCEPT_ENCODING, "gzip, deflate, br"))
        .await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.headers[CONTENT_ENCODING], "gzip");
    assert_eq!(first.headers[VARY], "accept-encoding");
    assert_eq!(gunzip(&body), SCRIPT.repeat(50));

    let etag = first.headers[ETAG].clone();
    let (second, body) = server
        .send(
            server
                .get("/app.js")
                .header(ACCEPT_ENCODING, "gzip")
                .header(IF_NONE_MATCH, etag.clone()),
        )
        .await;
    assert_eq!(second.status, StatusCode::NOT_MODIFIED);
    assert_eq!(second.headers[ETAG], etag);
    assert!(body.is_empty());

    let server = server.stop().await;
    let stats = server.cache_stats();
    assert_eq!(stats.entries, 1);
    assert_eq!(stats.computations, 1);
    assert_eq!(stats.hits, 1);
    assert_eq!(server.request_count(), 2);
    assert_eq!(server.state().await, RuntimeState::Stopped);
}

#[tokio::test]
async fn test_identity_for_plain_clients_and_images() {
    let server = TestServer::start(PrecompressConfig::default()).await;

    let (plain, body) = server.send(server.get("/app.js")).await;
    assert_eq!(plain.status, StatusCode::OK);
    assert!(plain.headers.get(CONTENT_ENCODING).is_none());
    assert_eq!(body, SCRIPT.repeat(50).as_bytes());

    let (image, body) = server
        .send(server.get("/logo.png").header(ACCEPT_ENCODING, "gzip"))
        .await;
    assert_eq!(image.status, StatusCode::OK);
    assert_eq!(image.headers[CONTENT_TYPE], "image/png");
    assert!(image.headers.get(CONTENT_ENCODING).is_none());
    assert!(image.headers.get(VARY).is_none());
    assert_eq!(body.len(), 8);

    server.stop().await;
}

#[tokio::test]
async fn test_unknown_paths_and_methods() {
    let server = TestServer::start(PrecompressConfig::default()).await;

    let (missing, _) = server.send(server.get("/nope.css")).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);

    let (post, _) = server.send(server.get("/app.js").method(Method::POST)).await;
    assert_eq!(post.status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(post.headers[http::header::ALLOW], "GET, HEAD");

    server.stop().await;
}

#[tokio::test]
async fn test_oversized_asset_served_uncompressed() {
    let server = TestServer::start(PrecompressConfig {
        max_size: 128,
        ..Default::default()
    })
    .await;

    let (response, body) = server
        .send(server.get("/app.js").header(ACCEPT_ENCODING, "gzip"))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.headers.get(CONTENT_ENCODING).is_none());
    assert_eq!(body.len(), SCRIPT.len() * 50);

    let server = server.stop().await;
    assert_eq!(server.cache_stats().entries, 0);
    assert_eq!(server.cache_stats().rejected, 1);
}

#[tokio::test]
async fn test_shutdown_closes_keep_alive_connections() {
    let server = TestServer::start(PrecompressConfig::default()).await;

    let mut sender = server.connect().await;
    let response = sender
        .send_request(server.get("/app.js").body(Full::new(Bytes::new())).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    response.into_body().collect().await.unwrap();

    let follow_up = server.get("/app.js").body(Full::new(Bytes::new())).unwrap();

    // The shutdown timeout is 30s; an idle connection must not hold the server open.
    let server = server.stop().await;
    assert_eq!(server.state().await, RuntimeState::Stopped);

    assert!(sender.send_request(follow_up).await.is_err());
    assert_eq!(server.request_count(), 1);
}
