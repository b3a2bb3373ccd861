use std::net::SocketAddr;
use std::path::Path;

use nuance_ox::{Nuance, NuanceError, TtsRequest};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpListener,
    task::JoinHandle,
};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path, query_param},
};

fn client_for(server: &MockServer) -> Nuance {
    Nuance::builder()
        .app_id("test-app")
        .app_key("test-key")
        .dictation_url(format!("{}/dictation", server.uri()))
        .tts_url(format!("{}/tts", server.uri()))
        .build()
}

fn request(output: &Path, voice: Option<&str>, language: Option<&str>) -> TtsRequest {
    TtsRequest::builder()
        .identifier("user-1")
        .text("hello world")
        .output(output)
        .output_format("wav")
        .maybe_voice(voice)
        .maybe_language(language)
        .build()
}

#[tokio::test]
async fn test_audio_is_written_to_output() {
    let server = MockServer::start().await;
    let audio: Vec<u8> = (0..=255).cycle().take(64 * 1024).collect();

    Mock::given(method("GET"))
        .and(path("/tts"))
        .and(query_param("appId", "test-app"))
        .and(query_param("appKey", "test-key"))
        .and(query_param("id", "user-1"))
        .and(query_param("ttsLang", "en_US"))
        .and(query_param("text", "hello world"))
        .and(query_param("codec", "wav"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(audio.clone(), "audio/x-wav"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("speech.wav");
    let client = client_for(&server);

    let result = client
        .send_tts_request(&request(&output, None, Some("en_US")))
        .await
        .unwrap();

    assert_eq!(result.path, output);
    assert_eq!(result.bytes_written, audio.len() as u64);
    assert_eq!(result.content_type.as_deref(), Some("audio/x-wav"));
    // The call only resolves once the file is complete.
    assert_eq!(std::fs::read(&output).unwrap(), audio);
}

#[tokio::test]
async fn test_voice_wins_over_language() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("voice", "Tom"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"RIFF".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("tom.wav");
    let client = client_for(&server);

    client
        .send_tts_request(&request(&output, Some("Tom"), Some("en_US")))
        .await
        .unwrap();

    let received = server.received_requests().await.unwrap();
    assert_eq!(received.len(), 1);
    let url = received[0].url.as_str();
    assert!(url.contains("voice=Tom"));
    assert!(!url.contains("ttsLang="));
}

#[tokio::test]
async fn test_text_is_url_encoded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("text", "fish & chips? 100%"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"audio".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("encoded.wav");
    let client = client_for(&server);

    let request = TtsRequest::builder()
        .identifier("user-1")
        .text("fish & chips? 100%")
        .output(output.as_path())
        .output_format("wav")
        .voice("Samantha")
        .build();
    client.send_tts_request(&request).await.unwrap();

    let received = server.received_requests().await.unwrap();
    assert_eq!(received[0].url.query_pairs().count(), 6);
}

#[tokio::test]
async fn test_server_error_leaves_no_output_file() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_string("synthesis failed"))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("never.wav");
    let client = client_for(&server);

    let err = client
        .send_tts_request(&request(&output, Some("Tom"), None))
        .await
        .unwrap_err();

    match &err {
        NuanceError::RemoteFailure { status, body } => {
            assert_eq!(*status, 500);
            assert_eq!(body, "synthesis failed");
        }
        other => panic!("expected RemoteFailure, got {other:?}"),
    }
    assert!(!output.exists());
}

#[tokio::test]
async fn test_missing_voice_and_language_sends_nothing() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("speech.wav");
    let client = client_for(&server);

    let err = client
        .send_tts_request(&request(&output, None, None))
        .await
        .unwrap_err();

    assert!(matches!(err, NuanceError::InvalidOptions(_)));
    assert!(server.received_requests().await.unwrap().is_empty());
    assert!(!output.exists());
}

#[tokio::test]
async fn test_empty_credentials_send_nothing() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let client = Nuance::builder()
        .app_id("test-app")
        .app_key("")
        .tts_url(format!("{}/tts", server.uri()))
        .build();

    let err = client
        .send_tts_request(&request(&dir.path().join("x.wav"), Some("Tom"), None))
        .await
        .unwrap_err();

    assert!(matches!(err, NuanceError::InvalidCredentials));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unwritable_output_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"audio".to_vec()))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("no-such-dir").join("speech.wav");
    let client = client_for(&server);

    let err = client
        .send_tts_request(&request(&output, Some("Tom"), None))
        .await
        .unwrap_err();

    assert!(matches!(err, NuanceError::OutputUnavailable { .. }));
}

#[cfg(unix)]
#[tokio::test]
async fn test_failed_create_keeps_existing_read_only_file() {
    use std::os::unix::fs::PermissionsExt;

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"audio".to_vec()))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("keep.wav");
    std::fs::write(&output, b"precious").unwrap();
    std::fs::set_permissions(&output, std::fs::Permissions::from_mode(0o444)).unwrap();

    // Root ignores the read-only bit, so the create would succeed.
    if std::fs::OpenOptions::new().write(true).open(&output).is_ok() {
        return;
    }

    let err = client_for(&server)
        .send_tts_request(&request(&output, Some("Tom"), None))
        .await
        .unwrap_err();

    assert!(matches!(err, NuanceError::OutputUnavailable { .. }));
    assert_eq!(std::fs::read(&output).unwrap(), b"precious");
}

#[cfg(unix)]
#[tokio::test]
async fn test_failed_create_keeps_existing_link() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"audio".to_vec()))
        .mount(&server)
        .await;

    // A link into a missing directory: the create fails for every user.
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("speech.wav");
    std::os::unix::fs::symlink(dir.path().join("gone").join("speech.wav"), &output).unwrap();

    let err = client_for(&server)
        .send_tts_request(&request(&output, Some("Tom"), None))
        .await
        .unwrap_err();

    assert!(matches!(err, NuanceError::OutputUnavailable { .. }));
    assert!(std::fs::symlink_metadata(&output).is_ok());
}

/// Answer one connection with `response` verbatim, then hang up.
async fn serve_once(response: &'static [u8]) -> (SocketAddr, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut head = Vec::new();
        let mut buf = [0_u8; 1024];
        while !head.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            head.extend_from_slice(&buf[..n]);
        }
        socket.write_all(response).await.unwrap();
        socket.flush().await.unwrap();
    });
    (addr, handle)
}

fn raw_client(addr: SocketAddr) -> Nuance {
    Nuance::builder()
        .app_id("test-app")
        .app_key("test-key")
        .tts_url(format!("http://{addr}/tts"))
        .build()
}

#[tokio::test]
async fn test_truncated_body_removes_partial_file() {
    // Promises 1000 bytes, sends 10.
    let (addr, server) = serve_once(
        b"HTTP/1.1 200 OK\r\nContent-Type: audio/x-wav\r\nContent-Length: 1000\r\n\r\n0123456789",
    )
    .await;

    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("partial.wav");

    let err = raw_client(addr)
        .send_tts_request(&request(&output, Some("Tom"), None))
        .await
        .unwrap_err();
    server.await.unwrap();

    assert!(matches!(err, NuanceError::Transport(_)));
    assert!(!output.exists());
}

#[tokio::test]
async fn test_truncated_error_body_keeps_status() {
    let (addr, server) = serve_once(
        b"HTTP/1.1 502 Bad Gateway\r\nContent-Length: 1000\r\n\r\nupstream",
    )
    .await;

    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("never.wav");

    let err = raw_client(addr)
        .send_tts_request(&request(&output, Some("Tom"), None))
        .await
        .unwrap_err();
    server.await.unwrap();

    assert!(matches!(err, NuanceError::RemoteFailure { status: 502, .. }));
    assert!(!output.exists());
}

#[tokio::test]
async fn test_callback_adapter_reports_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("speech.wav");
    let client = client_for(&server);

    let mut status = None;
    client
        .send_tts_request_with(
            &request(&output, None, Some("en_US")),
            |_| panic!("success callback must not run"),
            |err| status = err.status(),
        )
        .await;

    assert_eq!(status, Some(503));
}

#[tokio::test]
async fn test_callback_adapter_reports_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"pcm".to_vec()))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("speech.pcm");
    let client = client_for(&server);

    let mut written = 0;
    client
        .send_tts_request_with(
            &request(&output, Some("Tom"), None),
            |out| written = out.bytes_written,
            |err| panic!("unexpected error: {err}"),
        )
        .await;

    assert_eq!(written, 3);
    assert_eq!(std::fs::read(&output).unwrap(), b"pcm");
}
