//! Tests for wire-form dumps.

use super::{DumpError, HttpRequest, ResponseHead, dump_request, dump_response_head};

fn request(url: &str) -> HttpRequest {
    HttpRequest::get(url::Url::parse(url).unwrap())
}

mod requests {
    use super::*;

    #[test]
    fn get_without_body_ends_with_blank_line() {
        let dump = dump_request(&request("https://example.com/path?a=1&b=2")).unwrap();

        assert_eq!(
            dump,
            b"GET /path?a=1&b=2 HTTP/1.1\r\nHost: example.com\r\naccept: */*\r\n\r\n".to_vec()
        );
    }

    #[test]
    fn explicit_port_is_kept_in_host() {
        let dump = dump_request(&request("http://example.com:8080/")).unwrap();

        assert!(dump.starts_with(b"GET / HTTP/1.1\r\nHost: example.com:8080\r\n"));
    }

    #[test]
    fn default_port_is_omitted_from_host() {
        let dump = dump_request(&request("https://example.com:443/")).unwrap();

        assert!(dump.starts_with(b"GET / HTTP/1.1\r\nHost: example.com\r\n"));
    }

    #[test]
    fn headers_and_body_are_written() {
        let req = HttpRequest::post(url::Url::parse("https://example.com/hook").unwrap())
            .with_header(
                http::header::CONTENT_TYPE,
                http::HeaderValue::from_static("application/json"),
            )
            .with_body(br#"{"ok":true}"#.to_vec());

        let dump = dump_request(&req).unwrap();

        assert_eq!(
            String::from_utf8(dump).unwrap(),
            "POST /hook HTTP/1.1\r\n\
             Host: example.com\r\n\
             content-type: application/json\r\n\
             accept: */*\r\n\
             Content-Length: 11\r\n\
             \r\n\
             {\"ok\":true}"
        );
    }

    #[test]
    fn explicit_accept_replaces_default() {
        let req = request("https://example.com/").with_header(
            http::header::ACCEPT,
            http::HeaderValue::from_static("application/json"),
        );

        let dump = String::from_utf8(dump_request(&req).unwrap()).unwrap();

        assert_eq!(dump.matches("accept: ").count(), 1);
        assert!(dump.contains("accept: application/json\r\n"));
    }

    #[test]
    fn binary_body_is_kept_verbatim() {
        let body = vec![0x89, b'P', b'N', b'G', 0x00, 0xff];
        let req = request("https://example.com/upload").with_body(body.clone());

        let dump = dump_request(&req).unwrap();

        assert!(dump.ends_with(&body));
    }

    #[test]
    fn existing_host_header_is_not_duplicated() {
        let req = request("https://example.com/").with_header(
            http::header::HOST,
            http::HeaderValue::from_static("virtual.example"),
        );

        let dump = String::from_utf8(dump_request(&req).unwrap()).unwrap();

        assert_eq!(dump.matches("ost: ").count(), 1);
        assert!(dump.contains("host: virtual.example\r\n"));
    }

    #[test]
    fn url_without_host_is_an_error() {
        let result = dump_request(&request("mailto:someone@example.com"));

        assert!(matches!(result, Err(DumpError::MissingHost(_))));
    }
}

mod response_heads {
    use super::*;

    #[test]
    fn status_line_and_headers_are_written() {
        let mut headers = http::HeaderMap::new();
        headers.insert(
            http::header::CONTENT_TYPE,
            http::HeaderValue::from_static("text/plain"),
        );
        let head = ResponseHead {
            status: http::StatusCode::OK,
            version: http::Version::HTTP_11,
            headers,
        };

        let dump = dump_response_head(&head);

        assert_eq!(
            dump,
            b"HTTP/1.1 200 OK\r\ncontent-type: text/plain\r\n\r\n".to_vec()
        );
    }

    #[test]
    fn unknown_status_has_empty_reason() {
        let head = ResponseHead {
            status: http::StatusCode::from_u16(599).unwrap(),
            version: http::Version::HTTP_2,
            headers: http::HeaderMap::new(),
        };

        let dump = dump_response_head(&head);

        assert_eq!(dump, b"HTTP/2.0 599 \r\n\r\n".to_vec());
    }
}
