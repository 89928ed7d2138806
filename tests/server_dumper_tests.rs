// Server-side dump middleware and proxy router tests
// Author: kelexine (https://github.com/kelexine)

use axum::body::{to_bytes, Body};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Router;
use bytes::Bytes;
use http::header::{CONNECTION, CONTENT_LENGTH, CONTENT_TYPE, HOST};
use http::{Request, Response, Version};
use httpdump::config::AppConfig;
use httpdump::dump::{DumpFormat, Dumper, WireFormat};
use httpdump::error::{ExchangeError, Result};
use httpdump::server::{create_router, DumpLayer, HealthResponse};
use httpdump::storage::MemoryFlusher;
use httpdump::utils::logging::ErrorLog;
use httpdump::utils::mime;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tower::{service_fn, BoxError, ServiceExt};

const BODY: &str = r#"{"name":"Boris", "age": 20}"#;
const REQUEST_DUMP: &str = "POST / HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/json\r\n\r\n{\"name\":\"Boris\", \"age\": 20}";
const RESPONSE_DUMP: &str = "HTTP/1.1 200 OK\r\nContent-Length: 0\r\n\r\n";

#[derive(Clone, Default)]
struct RecordingLog(Arc<Mutex<Vec<String>>>);

impl ErrorLog for RecordingLog {
    fn error(&self, message: &str) {
        self.0.lock().push(message.to_string());
    }
}

struct BrokenRequests;

impl DumpFormat for BrokenRequests {
    fn outbound_request(&self, head: &Request<()>, body: &[u8], with_body: bool) -> Result<String> {
        WireFormat.outbound_request(head, body, with_body)
    }

    fn inbound_request(&self, _head: &Request<()>, _body: &[u8], _with_body: bool) -> Result<String> {
        Err(ExchangeError::Dump("dump request error".into()))
    }

    fn response(&self, head: &Response<()>, body: &[u8], with_body: bool) -> Result<String> {
        WireFormat.response(head, body, with_body)
    }
}

fn post_request() -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/")
        .header(HOST, "localhost")
        .header(CONTENT_TYPE, mime::JSON)
        .body(Body::from(BODY))
        .unwrap()
}

async fn ok_handler() -> StatusCode {
    StatusCode::OK
}

#[tokio::test]
async fn test_successful_exchange() {
    let sink = MemoryFlusher::new();
    let app = Router::new()
        .route("/", post(ok_handler))
        .layer(DumpLayer::new(Dumper::new(sink.clone())));

    let res = app.oneshot(post_request()).await.unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        sink.messages(),
        vec![format!("HTTP dump:\n{}\n\n{}\n", REQUEST_DUMP, RESPONSE_DUMP)]
    );
}

#[tokio::test]
async fn test_handler_error_response() {
    let sink = MemoryFlusher::new();
    let app = Router::new()
        .route(
            "/",
            post(|| async {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    [(CONNECTION, "close")],
                    "Internal Error",
                )
            }),
        )
        .layer(DumpLayer::new(Dumper::new(sink.clone())));

    let res = app.oneshot(post_request()).await.unwrap();

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let message = &sink.messages()[0];
    assert!(message.contains("HTTP/1.1 500 Internal Server Error\r\n"));
    assert!(message.contains("Connection: close\r\n"));
    assert!(message.contains("Content-Length: 14\r\n"));
    assert!(message.ends_with("\r\n\r\nInternal Error\n"));
}

#[tokio::test]
async fn test_request_dump_error() {
    let sink = MemoryFlusher::new();
    let log = RecordingLog::default();
    let dumper = Dumper::builder(sink.clone())
        .error_log(log.clone())
        .format(BrokenRequests)
        .build();
    let app = Router::new()
        .route("/", post(ok_handler))
        .layer(DumpLayer::new(dumper));

    app.oneshot(post_request()).await.unwrap();

    assert_eq!(
        *log.0.lock(),
        vec!["HTTP request dump error: dump error: dump request error".to_string()]
    );
    assert_eq!(
        sink.messages(),
        vec![format!("HTTP dump:\n\n\n{}\n", RESPONSE_DUMP)]
    );
}

#[tokio::test]
async fn test_handler_sees_full_body() {
    let sink = MemoryFlusher::new();
    let app = Router::new()
        .route("/", post(|body: Bytes| async move { body }))
        .layer(DumpLayer::new(Dumper::new(sink.clone())));

    let res = app.oneshot(post_request()).await.unwrap();
    let echoed = to_bytes(res.into_body(), usize::MAX).await.unwrap();

    assert_eq!(echoed, BODY);
    // Opaque binary responses are dumped without their body
    let message = &sink.messages()[0];
    assert!(message.contains("Content-Type: application/octet-stream\r\nContent-Length: 27\r\n\r\n\n"));
}

#[tokio::test]
async fn test_custom_template_and_filter() {
    let sink = MemoryFlusher::new();
    let dumper = Dumper::builder(sink.clone())
        .template("HTTP dump:\n%s\n\n==============\n\n%s\n")
        .filter(|ct| ct != mime::JSON)
        .build();
    let app = Router::new()
        .route("/", post(ok_handler))
        .layer(DumpLayer::new(dumper));

    app.oneshot(post_request()).await.unwrap();

    assert_eq!(
        sink.messages(),
        vec![format!(
            "HTTP dump:\n{}\n\n==============\n\n{}\n",
            REQUEST_DUMP.trim_end_matches(BODY),
            RESPONSE_DUMP
        )]
    );
}

#[tokio::test]
async fn test_streamed_response_keeps_last_write() {
    let sink = MemoryFlusher::new();
    let app = Router::new()
        .route(
            "/",
            post(|| async {
                let chunks = futures::stream::iter(vec![
                    Ok::<_, std::io::Error>("first,"),
                    Ok("second"),
                ]);
                ([(CONTENT_TYPE, mime::TEXT)], Body::from_stream(chunks))
            }),
        )
        .layer(DumpLayer::new(Dumper::new(sink.clone())));

    let res = app.oneshot(post_request()).await.unwrap();
    let sent = to_bytes(res.into_body(), usize::MAX).await.unwrap();

    assert_eq!(sent, "first,second");
    assert!(sink.messages()[0].ends_with("\r\n\r\nsecond\n"));
}

#[tokio::test]
async fn test_response_version_follows_request() {
    let sink = MemoryFlusher::new();
    let app = Router::new()
        .route("/", get(|| async { "hello" }))
        .layer(DumpLayer::new(Dumper::new(sink.clone())));

    let req = Request::builder()
        .uri("/")
        .version(Version::HTTP_10)
        .header(HOST, "localhost")
        .body(Body::empty())
        .unwrap();
    let res = app.oneshot(req).await.unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let message = &sink.messages()[0];
    assert!(message.starts_with("HTTP dump:\nGET / HTTP/1.0\r\n"));
    assert!(message.contains("\n\nHTTP/1.0 200 OK\r\n"));
}

fn proxy_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.upstream.base_url = "http://upstream.test/".to_string();
    config
}

#[tokio::test]
async fn test_proxy_forwards_to_upstream() {
    let sink = MemoryFlusher::new();
    let client = service_fn(|req: Request<Bytes>| async move {
        let body = format!("{} {}", req.method(), req.uri());
        Ok::<_, BoxError>(
            Response::builder()
                .header(CONTENT_TYPE, mime::TEXT)
                .body(Bytes::from(body))
                .unwrap(),
        )
    });
    let app = create_router(&proxy_config(), Dumper::new(sink.clone()), client);

    let req = Request::builder()
        .method("DELETE")
        .uri("/v1/users?id=1")
        .body(Body::empty())
        .unwrap();
    let res = app.oneshot(req).await.unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().contains_key("x-request-id"));
    let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    assert_eq!(body, "DELETE http://upstream.test/v1/users?id=1");

    let message = &sink.messages()[0];
    assert!(message.starts_with("HTTP dump:\nDELETE /v1/users?id=1 HTTP/1.1\r\n"));
    assert!(message.ends_with("DELETE http://upstream.test/v1/users?id=1\n"));
}

#[tokio::test]
async fn test_proxy_maps_client_errors() {
    let client = service_fn(|_req: Request<Bytes>| async {
        Err::<Response<Bytes>, BoxError>(ExchangeError::Timeout(Duration::from_secs(1)).into())
    });
    let app = create_router(&proxy_config(), Dumper::new(MemoryFlusher::new()), client);

    let req = Request::builder().uri("/slow").body(Body::empty()).unwrap();
    let res = app.oneshot(req).await.unwrap();

    assert_eq!(res.status(), StatusCode::GATEWAY_TIMEOUT);
    let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"]["type"], "timeout_error");
}

#[tokio::test]
async fn test_health() {
    let client = service_fn(|_req: Request<Bytes>| async {
        Ok::<_, BoxError>(Response::new(Bytes::new()))
    });
    let app = create_router(&proxy_config(), Dumper::new(MemoryFlusher::new()), client);

    let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let res = app.oneshot(req).await.unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let health: HealthResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(health.status, "ok");
    assert_eq!(health.upstream, "http://upstream.test/");
}

#[tokio::test]
async fn test_body_limit() {
    let mut config = proxy_config();
    config.server.body_limit = 4;
    let client = service_fn(|_req: Request<Bytes>| async {
        Ok::<_, BoxError>(Response::new(Bytes::new()))
    });
    let app = create_router(&config, Dumper::new(MemoryFlusher::new()), client);

    let req = Request::builder()
        .method("POST")
        .uri("/upload")
        .header(CONTENT_TYPE, mime::TEXT)
        .header(CONTENT_LENGTH, "11")
        .body(Body::from("hello world"))
        .unwrap();
    let res = app.oneshot(req).await.unwrap();

    assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_chunked_body_over_limit_never_reaches_upstream() {
    let mut config = proxy_config();
    config.server.body_limit = 4;
    let sink = MemoryFlusher::new();
    let log = RecordingLog::default();
    let forwarded = Arc::new(Mutex::new(Vec::new()));
    let record = forwarded.clone();
    let client = service_fn(move |req: Request<Bytes>| {
        record.lock().push(req.body().len());
        async { Ok::<_, BoxError>(Response::new(Bytes::new())) }
    });
    let dumper = Dumper::builder(sink.clone()).error_log(log.clone()).build();
    let app = create_router(&config, dumper, client);

    let chunks = futures::stream::iter(vec![
        Ok::<_, std::io::Error>("hello "),
        Ok("world"),
    ]);
    let req = Request::builder()
        .method("POST")
        .uri("/upload")
        .header(CONTENT_TYPE, mime::TEXT)
        .body(Body::from_stream(chunks))
        .unwrap();
    let res = app.oneshot(req).await.unwrap();

    assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(forwarded.lock().is_empty());
    assert_eq!(
        *log.0.lock(),
        vec!["HTTP request dump error: length limit exceeded".to_string()]
    );
    assert_eq!(
        sink.messages(),
        vec!["HTTP dump:\n\n\nlength limit exceeded\n".to_string()]
    );
}

#[tokio::test]
async fn test_broken_request_stream_is_rejected() {
    let sink = MemoryFlusher::new();
    let called = Arc::new(AtomicBool::new(false));
    let flag = called.clone();
    let app = Router::new()
        .route(
            "/",
            post(move |_body: Bytes| async move {
                flag.store(true, Ordering::SeqCst);
                StatusCode::OK
            }),
        )
        .layer(DumpLayer::new(Dumper::new(sink.clone())));

    let chunks = futures::stream::iter(vec![
        Ok("partial"),
        Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset")),
    ]);
    let req = Request::builder()
        .method("POST")
        .uri("/")
        .body(Body::from_stream(chunks))
        .unwrap();
    let res = app.oneshot(req).await.unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert!(!called.load(Ordering::SeqCst));
    assert_eq!(sink.len(), 1);
}
