use providers::openai::{OpenAiConfig, OpenAiProvider};
use providers::{build_request, EncodedImage, ProviderError, VisionProvider};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Serves exactly one canned HTTP response and hands back the raw request.
async fn one_shot_server(status_line: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let request = read_request(&mut socket).await;
        let response = format!(
            "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
        request
    });
    (format!("http://{addr}/v1/chat/completions"), handle)
}

async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = socket.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        let text = String::from_utf8_lossy(&buf).to_string();
        if let Some(header_end) = text.find("\r\n\r\n") {
            let content_length = text[..header_end]
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if buf.len() >= header_end + 4 + content_length {
                break;
            }
        }
    }
    String::from_utf8_lossy(&buf).to_string()
}

fn config(url: String, timeout: Duration) -> OpenAiConfig {
    OpenAiConfig {
        url,
        api_key: Some("sk-test".into()),
        model: "test-model".into(),
        system_prompt: "You are a helpful assistant.".into(),
        timeout,
        accept_invalid_certs: false,
    }
}

fn request() -> providers::ClassificationRequest {
    build_request("Does the image contain cat?", EncodedImage::from_bytes(b"img"), 0.0)
}

#[tokio::test]
async fn returns_raw_body_on_success() {
    let body = r#"{"choices":[{"finish_reason":"stop","message":{"content":"Yes"}}]}"#;
    let (url, server) = one_shot_server("200 OK", body).await;
    let provider = OpenAiProvider::new(config(url, Duration::from_secs(10))).unwrap();

    let raw = provider.execute(&request()).await.unwrap();
    assert_eq!(raw.body, body);

    let seen = server.await.unwrap();
    assert!(seen.starts_with("POST /v1/chat/completions"));
    assert!(seen.to_lowercase().contains("authorization: bearer sk-test"));
    assert!(seen.contains(r#""model":"test-model""#));
    assert!(seen.contains("data:image/jpeg;base64,aW1n"));
}

#[tokio::test]
async fn non_success_status_is_server_error() {
    let (url, server) = one_shot_server("500 Internal Server Error", r#"{"error":"boom"}"#).await;
    let provider = OpenAiProvider::new(config(url, Duration::from_secs(10))).unwrap();

    match provider.execute(&request()).await {
        Err(ProviderError::Server { status, body }) => {
            assert_eq!(status, 500);
            assert!(body.contains("boom"));
        }
        other => panic!("expected server error, got {other:?}"),
    }
    server.await.unwrap();
}

#[tokio::test]
async fn silent_server_times_out() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}/v1/chat/completions", listener.local_addr().unwrap());
    let _server = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let _ = read_request(&mut socket).await;
        tokio::time::sleep(Duration::from_secs(30)).await;
    });
    let provider = OpenAiProvider::new(config(url, Duration::from_millis(200))).unwrap();

    assert!(matches!(
        provider.execute(&request()).await,
        Err(ProviderError::Timeout(_))
    ));
}

#[tokio::test]
async fn refused_connection_is_network_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}/v1/chat/completions", listener.local_addr().unwrap());
    drop(listener);
    let provider = OpenAiProvider::new(config(url, Duration::from_secs(5))).unwrap();

    assert!(matches!(
        provider.execute(&request()).await,
        Err(ProviderError::Network(_))
    ));
}
