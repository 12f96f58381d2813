//! Repository version probe against a throwaway local HTTP listener.

use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::thread;
use std::time::Duration;

use semcon_harness::version::check_repo;
use semcon_harness::{HarnessConfig, HarnessError};

/// Serves a single request with `status_line` and returns the base URL and the request path.
fn serve_once(status_line: &'static str) -> (String, thread::JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");
    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept().expect("accept");
        let mut reader = BufReader::new(stream.try_clone().expect("clone"));
        let mut request_line = String::new();
        reader.read_line(&mut request_line).expect("read request");
        loop {
            let mut header = String::new();
            if reader.read_line(&mut header).unwrap_or(0) == 0 || header == "\r\n" {
                break;
            }
        }
        let body = "0.1.0";
        let mut stream = stream;
        write!(
            stream,
            "{status_line}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        )
        .expect("write response");
        request_line
    });
    (format!("http://{addr}"), handle)
}

fn config_for(url: String) -> HarnessConfig {
    HarnessConfig {
        repo_url: url,
        timeout: Duration::from_secs(5),
        ..HarnessConfig::default()
    }
}

#[test]
fn version_endpoint_returning_200_passes() {
    let (url, server) = serve_once("HTTP/1.1 200 OK");
    check_repo(&config_for(format!("{url}/"))).unwrap();
    let request_line = server.join().unwrap();
    assert!(request_line.starts_with("GET /version "), "{request_line}");
}

#[test]
fn unrepresentable_timeout_does_not_panic() {
    let (url, server) = serve_once("HTTP/1.1 200 OK");
    let config = HarnessConfig {
        timeout: Duration::from_secs(u64::MAX),
        ..config_for(url)
    };
    check_repo(&config).unwrap();
    server.join().unwrap();
}

#[test]
fn non_200_status_is_reported() {
    let (url, server) = serve_once("HTTP/1.1 503 Service Unavailable");
    let err = check_repo(&config_for(url)).unwrap_err();
    server.join().unwrap();
    match err {
        HarnessError::VersionStatus { status, url } => {
            assert_eq!(status, 503);
            assert!(url.ends_with("/version"));
        }
        other => panic!("expected version status error, got {other:?}"),
    }
}

#[test]
fn unreachable_repository_is_a_connectivity_error() {
    // Bind then drop to get a port with nothing listening.
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let err = check_repo(&config_for(format!("http://127.0.0.1:{port}"))).unwrap_err();
    assert_eq!(err.kind(), "connectivity");
}
