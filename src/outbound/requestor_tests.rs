//! Tests for `ReqwestRequestor`.
//!
//! Network tests run against a one-shot server on a local ephemeral port.

use std::collections::BTreeMap;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use super::*;

/// Accepts one connection, reads the request head (and a body of
/// `expect_body` bytes), replies with `response` and returns the raw
/// request bytes.
async fn serve_once(
    response: &'static [u8],
    expect_body: usize,
) -> (url::Url, tokio::task::JoinHandle<Vec<u8>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut received = Vec::new();
        let mut buf = [0u8; 1024];

        loop {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            received.extend_from_slice(&buf[..n]);
            if let Some(pos) = received.windows(4).position(|w| w == b"\r\n\r\n") {
                if received.len() >= pos + 4 + expect_body {
                    break;
                }
            }
        }

        socket.write_all(response).await.unwrap();
        socket.shutdown().await.unwrap();
        received
    });

    let url = url::Url::parse(&format!("http://{addr}/hook?x=1")).unwrap();
    (url, handle)
}

/// Requestor that ignores proxy environment variables.
fn local_requestor() -> ReqwestRequestor {
    ReqwestRequestor::from_client(
        ReqwestRequestor::client_builder()
            .no_proxy()
            .build()
            .unwrap(),
    )
}

/// Header names (lowercased) and values from the head of a raw request.
fn head_headers(raw: &[u8]) -> BTreeMap<String, String> {
    let text = String::from_utf8_lossy(raw);
    let head = text.split("\r\n\r\n").next().unwrap();

    head.lines()
        .skip(1)
        .filter_map(|line| line.split_once(':'))
        .map(|(name, value)| (name.to_ascii_lowercase(), value.trim().to_string()))
        .collect()
}

mod construction {
    use super::*;

    #[test]
    fn new_constructs() {
        let requestor = ReqwestRequestor::new().unwrap();

        assert!(format!("{requestor:?}").contains("ReqwestRequestor"));
    }

    #[test]
    fn from_client_accepts_custom_client() {
        let custom = ReqwestRequestor::client_builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap();
        let requestor = ReqwestRequestor::from_client(custom);

        let _ = format!("{requestor:?}");
    }

    #[test]
    fn requestor_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ReqwestRequestor>();
    }
}

mod exchange {
    use super::*;

    #[tokio::test]
    async fn sends_request_and_streams_response() {
        let (url, server) = serve_once(
            b"HTTP/1.1 201 Created\r\nContent-Type: text/plain\r\nContent-Length: 5\r\nConnection: close\r\n\r\nhello",
            4,
        )
        .await;

        let request = HttpRequest::post(url)
            .with_header(
                http::HeaderName::from_static("x-test"),
                http::HeaderValue::from_static("yes"),
            )
            .with_body(b"ping".to_vec());

        let response = local_requestor().send(&request).await.unwrap();

        assert_eq!(response.status, http::StatusCode::CREATED);
        assert_eq!(response.version, http::Version::HTTP_11);
        assert_eq!(response.headers["content-type"], "text/plain");

        let body = read_body(response.body, 0).await.unwrap();
        assert_eq!(body, b"hello");

        let received = String::from_utf8(server.await.unwrap()).unwrap();
        assert!(received.starts_with("POST /hook?x=1 HTTP/1.1\r\n"));
        assert!(received.contains("x-test: yes\r\n"));
        assert!(received.ends_with("\r\n\r\nping"));
    }

    #[tokio::test]
    async fn oversized_body_is_rejected_by_reader() {
        let (url, server) = serve_once(
            b"HTTP/1.1 200 OK\r\nContent-Length: 11\r\nConnection: close\r\n\r\n0123456789!",
            0,
        )
        .await;

        let response = local_requestor()
            .send(&HttpRequest::get(url))
            .await
            .unwrap();
        let result = read_body(response.body, 10).await;

        assert!(matches!(result, Err(BodyError::TooLarge { limit: 10 })));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn refused_connection_is_connection_error() {
        // Bind then drop to obtain a port with nothing listening.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let url = url::Url::parse(&format!("http://{addr}/")).unwrap();
        let result = local_requestor().send(&HttpRequest::get(url)).await;

        assert!(matches!(result, Err(HttpError::Connection(_))));
    }

    #[tokio::test]
    async fn redirect_is_returned_not_followed() {
        // Nothing listens on port 1, so following the redirect would fail.
        let (url, server) = serve_once(
            b"HTTP/1.1 302 Found\r\nLocation: http://127.0.0.1:1/meta\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
            0,
        )
        .await;

        let response = local_requestor()
            .send(&HttpRequest::get(url))
            .await
            .unwrap();

        assert_eq!(response.status, http::StatusCode::FOUND);
        assert_eq!(response.headers["location"], "http://127.0.0.1:1/meta");
        server.await.unwrap();
    }

    #[tokio::test]
    async fn dump_matches_headers_on_the_wire() {
        let (url, server) = serve_once(
            b"HTTP/1.1 204 No Content\r\nConnection: close\r\n\r\n",
            5,
        )
        .await;
        let request = HttpRequest::post(url).with_body(b"hello".to_vec());
        let dump = dump_request(&request).unwrap();

        local_requestor().send(&request).await.unwrap();
        let received = server.await.unwrap();

        assert_eq!(head_headers(&dump), head_headers(&received));
        assert_eq!(head_headers(&dump)["accept"], "*/*");
        assert!(received.ends_with(b"\r\n\r\nhello"));
        assert!(dump.ends_with(b"\r\n\r\nhello"));
    }
}
