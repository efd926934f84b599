//! Integration tests for the heartbeat webhook dispatch.

use bins_webhook::{create_shared_aggregator, BinsReporter, Config};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Accept one connection, read a full HTTP request, respond 200, and return
/// the raw request bytes as a string.
async fn serve_one_request(listener: TcpListener) -> String {
    let (mut stream, _) = listener.accept().await.expect("Failed to accept");
    let mut request = Vec::new();
    let mut buf = [0u8; 4096];

    loop {
        let n = stream.read(&mut buf).await.expect("Failed to read");
        if n == 0 {
            break;
        }
        request.extend_from_slice(&buf[..n]);

        if let Some(head_end) = find_subsequence(&request, b"\r\n\r\n") {
            let head = String::from_utf8_lossy(&request[..head_end]).to_lowercase();
            let content_length = head
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|value| value.trim().parse::<usize>().ok())
                .unwrap_or(0);

            if request.len() >= head_end + 4 + content_length {
                break;
            }
        }
    }

    stream
        .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 0\r\n\r\n")
        .await
        .expect("Failed to respond");

    String::from_utf8_lossy(&request).to_string()
}

fn config_for(port: u16) -> Config {
    Config {
        hostname: "127.0.0.1".to_string(),
        port,
        ..Config::default()
    }
}

#[tokio::test]
async fn test_post_bins_sends_json_array_to_bins_path() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let server = tokio::spawn(serve_one_request(listener));

    let config = config_for(port);
    let reporter = BinsReporter::new(&config, create_shared_aggregator(5)).unwrap();
    reporter
        .post_bins(&["aa:bb:cc:dd:ee:ff".to_string()])
        .await;

    let request = server.await.unwrap();
    assert!(request.starts_with("POST /bins HTTP/1.1\r\n"), "{request}");
    assert!(request.to_lowercase().contains("content-type: application/json"));

    let body = r#"["aa:bb:cc:dd:ee:ff"]"#;
    assert!(request.ends_with(body), "{request}");
    assert!(request
        .to_lowercase()
        .contains(&format!("content-length: {}", body.len())));
}

#[tokio::test]
async fn test_post_bins_includes_custom_headers() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let server = tokio::spawn(serve_one_request(listener));

    let mut config = config_for(port);
    config
        .custom_headers
        .insert("X-Api-Key".to_string(), "secret".to_string());

    let reporter = BinsReporter::new(&config, create_shared_aggregator(5)).unwrap();
    reporter.post_bins(&[]).await;

    let request = server.await.unwrap();
    assert!(request.to_lowercase().contains("x-api-key: secret"));
    assert!(request.ends_with("[]"), "{request}");
}

#[tokio::test]
async fn test_transport_errors_are_swallowed() {
    // Nothing is listening on this port; the POST fails but must not panic
    // or propagate an error.
    let config = config_for(1);
    let reporter = BinsReporter::new(&config, create_shared_aggregator(5)).unwrap();
    reporter.post_bins(&["aa:bb:cc:dd:ee:ff".to_string()]).await;
}

#[tokio::test]
async fn test_drain_then_post_reports_qualifying_bins_once() {
    use bins_webhook::{Raddec, RssiSignatureEntry};

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let server = tokio::spawn(serve_one_request(listener));

    let aggregator = create_shared_aggregator(5);
    let raddec = Raddec {
        transmitter_id: "aa:bb:cc:dd:ee:ff".to_string(),
        transmitter_id_type: None,
        rssi_signature: vec![RssiSignatureEntry {
            receiver_id: None,
            rssi: Some(-70),
            number_of_decodings: 6,
        }],
        timestamp: None,
    };
    aggregator.lock().await.record(&raddec);

    let config = config_for(port);
    let reporter = BinsReporter::new(&config, aggregator.clone()).unwrap();

    let ids = aggregator.lock().await.drain();
    reporter.post_bins(&ids).await;

    let request = server.await.unwrap();
    assert!(request.ends_with(r#"["aa:bb:cc:dd:ee:ff"]"#), "{request}");

    // Counts never carry across a drain
    assert!(aggregator.lock().await.drain().is_empty());
}
