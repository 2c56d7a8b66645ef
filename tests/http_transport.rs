use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use weights_client::*;

/// One request as the server saw it. `head` is lowercased; `body` is kept
/// verbatim.
#[derive(Debug, Clone)]
struct Recorded {
    head: String,
    body: String,
}

fn content_length(head: &str) -> usize {
    head.lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(0)
}

/// Minimal HTTP/1.1 responder: records each request and answers by path.
async fn spawn_server() -> (String, Arc<Mutex<Vec<Recorded>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let recorded = requests.clone();

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            let recorded = recorded.clone();
            tokio::spawn(async move {
                let mut buf = Vec::new();
                let mut chunk = [0u8; 1024];
                let head_end = loop {
                    if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                        break pos + 4;
                    }
                    match socket.read(&mut chunk).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => buf.extend_from_slice(&chunk[..n]),
                    }
                };
                let head = String::from_utf8_lossy(&buf[..head_end]).to_lowercase();
                let length = content_length(&head);
                while buf.len() < head_end + length {
                    match socket.read(&mut chunk).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => buf.extend_from_slice(&chunk[..n]),
                    }
                }
                let body = String::from_utf8_lossy(&buf[head_end..head_end + length]).to_string();
                let target = head.split_whitespace().nth(1).unwrap_or("/").to_string();
                recorded.lock().unwrap().push(Recorded { head, body });

                let (status, body) = if target.starts_with("/health") {
                    ("200 OK", r#"{"status":"OK"}"#.to_string())
                } else if target.starts_with("/search-loras") {
                    ("200 OK", r#"[{"id":"l1","name":"Pixel"}]"#.to_string())
                } else if target.starts_with("/generateimage") {
                    (
                        "200 OK",
                        r#"{"success":true,"imageId":"img-1","statusUrl":"/status/img-1"}"#
                            .to_string(),
                    )
                } else if target.starts_with("/voice") {
                    ("200 OK", r#"{"result":"https://cdn.example/out.mp3"}"#.to_string())
                } else if target.starts_with("/status/") {
                    ("200 OK", r#"{"status":"COMPLETED","lastModifiedDate":1}"#.to_string())
                } else if target.starts_with("/quota") {
                    ("500 Internal Server Error", "quota backend down".to_string())
                } else {
                    ("404 Not Found", String::new())
                };
                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    (format!("http://{}", addr), requests)
}

#[tokio::test]
async fn test_requests_carry_api_key_and_query() {
    let (endpoint, requests) = spawn_server().await;
    let client = WeightsClient::new(ClientConfig::new("secret-key").endpoint(endpoint)).unwrap();

    let result = client.search_loras("pixel").await.unwrap();
    assert_eq!(result.0[0]["name"], "Pixel");

    let requests = requests.lock().unwrap().clone();
    assert_eq!(requests.len(), 2);
    assert!(requests[0].head.starts_with("get /health "));
    assert!(requests[1].head.starts_with("get /search-loras?query=pixel "));
    for request in &requests {
        assert!(request.head.contains("x-api-key: secret-key"));
        assert!(request.head.contains("content-type: application/json"));
        assert!(request.body.is_empty());
    }
}

#[tokio::test]
async fn test_generate_image_omits_missing_lora() {
    let (endpoint, requests) = spawn_server().await;
    let client = WeightsClient::new(ClientConfig::new("k").endpoint(endpoint)).unwrap();

    let submission = client
        .submit(&GenerationRequest::new("sunrise"))
        .await
        .unwrap();

    assert_eq!(submission.image_id.as_str(), "img-1");
    let requests = requests.lock().unwrap().clone();
    assert!(requests[1].head.starts_with("get /generateimage?prompt=sunrise "));
    assert!(!requests[1].head.contains("loraname"));
}

#[tokio::test]
async fn test_post_sends_json_body_without_query() {
    let (endpoint, requests) = spawn_server().await;
    let transport = HttpTransport::open(&ClientConfig::new("voice-key").endpoint(endpoint)).unwrap();
    let payload = json!({"voiceModelName": "narrator-v2", "text": "Hello, world", "pitch": "3"});

    let reply = transport
        .send(ApiRequest::post("/voice").payload(payload.clone()))
        .await
        .unwrap();

    assert_eq!(reply, json!({"result": "https://cdn.example/out.mp3"}));
    let requests = requests.lock().unwrap().clone();
    assert_eq!(requests.len(), 1);
    let request_line = requests[0].head.lines().next().unwrap();
    assert_eq!(request_line, "post /voice http/1.1");
    assert!(requests[0].head.contains("content-type: application/json"));
    assert!(requests[0].head.contains("x-api-key: voice-key"));
    let body: Value = serde_json::from_str(&requests[0].body).unwrap();
    assert_eq!(body, payload);
}

#[tokio::test]
async fn test_voice_from_text_over_http() {
    let (endpoint, requests) = spawn_server().await;
    let client = WeightsClient::new(ClientConfig::new("k").endpoint(endpoint)).unwrap();

    let voice = client
        .voice_from_text("narrator-v2", "Good evening", -1)
        .await
        .unwrap();

    assert_eq!(voice.result, "https://cdn.example/out.mp3");
    let requests = requests.lock().unwrap().clone();
    assert!(requests[0].head.starts_with("get /health "));
    assert!(requests[1].head.starts_with("post /voice http/1.1"));
    let body: Value = serde_json::from_str(&requests[1].body).unwrap();
    assert_eq!(
        body,
        json!({"voiceModelName": "narrator-v2", "text": "Good evening", "pitch": "-1"})
    );
}

#[tokio::test]
async fn test_status_path_is_percent_encoded_on_the_wire() {
    let (endpoint, requests) = spawn_server().await;
    let client = WeightsClient::new(ClientConfig::new("k").endpoint(endpoint)).unwrap();

    let snapshot = client.job_status(&JobId::from("a/b?c")).await.unwrap();

    assert_eq!(snapshot.status, JobStatus::Completed);
    let requests = requests.lock().unwrap().clone();
    assert!(requests[1].head.starts_with("get /status/a%2fb%3fc http/1.1"));
}

#[tokio::test]
async fn test_non_success_status_maps_to_http_error() {
    let (endpoint, _requests) = spawn_server().await;
    let client = WeightsClient::new(ClientConfig::new("k").endpoint(endpoint)).unwrap();

    let err = client.quota().await.unwrap_err();

    match err {
        WeightsError::Http { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, "quota backend down");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_connection_refused_is_service_unavailable() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = WeightsClient::new(ClientConfig::new("k").endpoint(format!("http://{}", addr)))
        .unwrap();

    let err = client.quota().await.unwrap_err();

    match err {
        WeightsError::ServiceUnavailable { source } => {
            assert!(matches!(*source, WeightsError::Transport { .. }));
        }
        other => panic!("unexpected error: {other}"),
    }
}
