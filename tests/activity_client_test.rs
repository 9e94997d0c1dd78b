use axum::{http::StatusCode, routing::get, Router};

use tautulli_exporter::{
    activity::{classify, ActivityClient},
    config::Config,
    errors::PollError,
};

/// Serve one canned response on a random local port, return the base URL.
async fn mock_upstream(status: StatusCode, body: &'static str) -> String {
    let app = Router::new().route("/api/v2", get(move || async move { (status, body) }));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://127.0.0.1:{port}")
}

fn config_for(base_url: String) -> Config {
    Config {
        tautulli_url: base_url,
        api_key: "abcdef0123456789".to_string(),
        metrics_port: 8000,
        scrape_interval: 30,
        request_timeout: 2,
        log_level: "info".to_string(),
        probe_when_open: false,
    }
}

#[tokio::test]
async fn fetches_and_classifies_sessions() {
    let body = r#"{
        "response": {
            "result": "success",
            "data": {
                "sessions": [
                    {
                        "transcode_video_decision": "transcode",
                        "transcode_audio_decision": "direct play",
                        "transcode_container_decision": "direct play"
                    },
                    {
                        "transcode_video_decision": "direct play",
                        "transcode_audio_decision": "direct play",
                        "transcode_container_decision": "direct play"
                    }
                ]
            }
        }
    }"#;
    let base = mock_upstream(StatusCode::OK, body).await;

    let client = ActivityClient::new(&config_for(base));
    let sessions = client.fetch_activity().await.unwrap();
    let agg = classify(&sessions);

    assert_eq!(agg.total, 2);
    assert_eq!(agg.direct, 1);
    assert_eq!(agg.transcode, 1);
    assert_eq!(agg.video_transcodes, 1);
    assert_eq!(agg.audio_transcodes, 0);
    assert_eq!(agg.container_transcodes, 0);
}

#[tokio::test]
async fn empty_session_list_is_ok() {
    let base = mock_upstream(
        StatusCode::OK,
        r#"{"response": {"result": "success", "data": {"sessions": []}}}"#,
    )
    .await;

    let client = ActivityClient::new(&config_for(base));
    let sessions = client.fetch_activity().await.unwrap();
    assert!(sessions.is_empty());
    assert_eq!(classify(&sessions).total, 0);
}

#[tokio::test]
async fn http_500_maps_to_status_error() {
    let base = mock_upstream(StatusCode::INTERNAL_SERVER_ERROR, "boom").await;

    let client = ActivityClient::new(&config_for(base));
    match client.fetch_activity().await {
        Err(PollError::HttpStatus { status }) => assert_eq!(status, 500),
        other => panic!("expected HttpStatus error, got {other:?}"),
    }
}

#[tokio::test]
async fn api_level_error_maps_to_api_error() {
    let base = mock_upstream(
        StatusCode::OK,
        r#"{"response": {"result": "error", "message": "Invalid apikey"}}"#,
    )
    .await;

    let client = ActivityClient::new(&config_for(base));
    match client.fetch_activity().await {
        Err(PollError::Api { message }) => assert_eq!(message, "Invalid apikey"),
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn malformed_body_maps_to_parse_error() {
    let base = mock_upstream(StatusCode::OK, "<html>definitely not json</html>").await;

    let client = ActivityClient::new(&config_for(base));
    match client.fetch_activity().await {
        Err(PollError::MalformedBody { .. }) => {}
        other => panic!("expected MalformedBody error, got {other:?}"),
    }
}

#[tokio::test]
async fn connection_refused_maps_to_network_error() {
    // Nothing listens here.
    let client = ActivityClient::new(&config_for("http://127.0.0.1:1".to_string()));
    match client.fetch_activity().await {
        Err(PollError::Network { .. }) | Err(PollError::Timeout { .. }) => {}
        other => panic!("expected Network error, got {other:?}"),
    }
}
