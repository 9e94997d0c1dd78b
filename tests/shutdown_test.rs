use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use tautulli_exporter::{config::Config, metrics::MetricsState, web::WebServer};

fn test_config() -> Config {
    Config {
        tautulli_url: "http://tautulli.local:8181".to_string(),
        api_key: "abcdef0123456789".to_string(),
        // Port 0 lets the OS pick a free port for the test.
        metrics_port: 0,
        scrape_interval: 30,
        request_timeout: 10,
        log_level: "info".to_string(),
        probe_when_open: false,
    }
}

#[tokio::test]
async fn server_stops_promptly_on_cancellation() {
    let metrics = Arc::new(MetricsState::new().unwrap());
    let server = WebServer::bind(test_config(), metrics).await.unwrap();
    let port = server.port().unwrap();

    let shutdown = CancellationToken::new();
    let handle = tokio::spawn(server.serve(shutdown.clone()));

    // The server answers while running.
    let body = reqwest::get(format!("http://127.0.0.1:{port}/healthz"))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert_eq!(body, "OK");

    // Cancellation mid-wait must not sit out any poll interval: the serve
    // future ends within a small bounded delay.
    shutdown.cancel();
    tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("server did not shut down promptly")
        .unwrap()
        .unwrap();

    // The listener is gone; new connections are refused.
    assert!(
        reqwest::get(format!("http://127.0.0.1:{port}/healthz"))
            .await
            .is_err()
    );
}
