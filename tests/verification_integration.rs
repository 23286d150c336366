mod common;

use axum::{
    Router,
    http::{StatusCode, header},
    response::{IntoResponse, Redirect},
    routing::get,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use common::{build_app, spawn_upstream, test_verification_config};
use livetv_proxy::{
    config::PlaylistConfig,
    errors::{IngestionError, ProbeError},
    ingestor::PlaylistIngestor,
    services::{ChannelProbe, ChannelRegistry, HttpStreamProber, VerificationEngine},
};

const PLAYLIST: &str = "#EXTM3U\n\
#EXTINF:-1 tvg-logo=\"http://x/l.png\" group-title=\"News\",Good News\n\
ok.m3u8\n\
#EXTINF:-1 group-title=\"Sports\",Gone Sports\n\
missing\n\
#EXTINF:-1,Cartoon Feed\n\
#EXTVLCOPT:http-user-agent=Foo\n\
video.ts\n\
#EXTINF:-1,Orphan\n";

async fn hls_playlist() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/vnd.apple.mpegurl")],
        "#EXTM3U\n#EXT-X-VERSION:3\n#EXTINF:6,\nseg0.ts\n",
    )
}

async fn upstream() -> SocketAddr {
    let router = Router::new()
        .route("/lists/nam.m3u", get(|| async { PLAYLIST }))
        .route("/lists/ok.m3u8", get(hls_playlist))
        .route("/lists/video.ts", get(|| async { ([(header::CONTENT_TYPE, "video/mp2t")], vec![0x47u8; 4096]) }))
        .route("/lists/empty.ts", get(|| async { ([(header::CONTENT_TYPE, "video/mp2t")], Vec::<u8>::new()) }))
        .route("/lists/page", get(|| async { ([(header::CONTENT_TYPE, "text/html")], "<html></html>") }))
        .route("/lists/bad.m3u8", get(|| async { ([(header::CONTENT_TYPE, "text/plain")], "hello") }))
        .route("/lists/moved", get(|| async { Redirect::temporary("/lists/ok.m3u8") }))
        .route(
            "/lists/slow.m3u8",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(3)).await;
                "#EXTM3U\n"
            }),
        )
        .route("/lists/broken", get(|| async { StatusCode::SERVICE_UNAVAILABLE }));
    spawn_upstream(router).await
}

fn prober() -> HttpStreamProber {
    HttpStreamProber::new(&test_verification_config()).unwrap()
}

#[tokio::test]
async fn test_probe_outcomes() {
    let addr = upstream().await;
    let prober = prober();
    let url = |path: &str| format!("http://{addr}/lists/{path}");

    assert_eq!(prober.probe(&url("ok.m3u8")).await, Ok(()));
    assert_eq!(prober.probe(&url("video.ts")).await, Ok(()));
    assert_eq!(prober.probe(&url("moved")).await, Ok(()));
    assert_eq!(
        prober.probe(&url("missing")).await,
        Err(ProbeError::HttpStatus(404))
    );
    assert_eq!(
        prober.probe(&url("broken")).await,
        Err(ProbeError::HttpStatus(503))
    );
    assert_eq!(
        prober.probe(&url("page")).await,
        Err(ProbeError::InvalidFormat)
    );
    assert_eq!(
        prober.probe(&url("bad.m3u8")).await,
        Err(ProbeError::InvalidFormat)
    );
    assert_eq!(
        prober.probe(&url("empty.ts")).await,
        Err(ProbeError::InvalidFormat)
    );
}

#[tokio::test]
async fn test_probe_timeout() {
    let addr = upstream().await;

    let outcome = prober()
        .probe(&format!("http://{addr}/lists/slow.m3u8"))
        .await;

    assert_eq!(outcome, Err(ProbeError::Timeout));
}

/// Raw upstream that promises a long body, sends `body`, then hangs up
async fn truncating_upstream(content_type: &'static str, body: &'static [u8]) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            tokio::spawn(async move {
                let mut request = [0u8; 4096];
                let _ = socket.read(&mut request).await;
                let head = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: {content_type}\r\nContent-Length: 5000\r\n\r\n"
                );
                let _ = socket.write_all(head.as_bytes()).await;
                let _ = socket.write_all(body).await;
                let _ = socket.flush().await;
            });
        }
    });
    addr
}

#[tokio::test]
async fn test_truncated_body_is_judged_on_received_bytes() {
    let prober = prober();

    let empty_hls = truncating_upstream("application/vnd.apple.mpegurl", b"").await;
    assert_eq!(
        prober.probe(&format!("http://{empty_hls}/live.m3u8")).await,
        Err(ProbeError::InvalidFormat)
    );

    let partial_hls = truncating_upstream("application/vnd.apple.mpegurl", b"#EXTM3U\n#EXT").await;
    assert_eq!(
        prober.probe(&format!("http://{partial_hls}/live.m3u8")).await,
        Ok(())
    );

    let partial_ts = truncating_upstream("video/mp2t", &[0x47; 10]).await;
    assert_eq!(
        prober.probe(&format!("http://{partial_ts}/live.ts")).await,
        Ok(())
    );

    let empty_ts = truncating_upstream("video/mp2t", b"").await;
    assert_eq!(
        prober.probe(&format!("http://{empty_ts}/live.ts")).await,
        Err(ProbeError::InvalidFormat)
    );
}

#[tokio::test]
async fn test_probe_connection_refused_is_transport_error() {
    let addr = common::closed_addr().await;

    let outcome = prober().probe(&format!("http://{addr}/live.m3u8")).await;

    assert!(matches!(outcome, Err(ProbeError::Transport(_))));
}

#[tokio::test]
async fn test_ingest_and_verify_end_to_end() {
    let addr = upstream().await;
    let app = build_app();
    let ingestor = PlaylistIngestor::new(&PlaylistConfig {
        url: format!("http://{addr}/lists/nam.m3u"),
        ..Default::default()
    })
    .unwrap();

    let loaded = ingestor.ingest_into(&app.registry).await.unwrap();
    assert_eq!(loaded, 3);

    let (_, channels) = app.registry.snapshot().await;
    assert_eq!(channels[0].url, format!("http://{addr}/lists/ok.m3u8"));
    assert_eq!(channels[0].logo, "http://x/l.png");
    assert!(channels.iter().all(|c| c.last_checked.is_none()));

    let summary = app.engine.run_pass().await.expect("pass runs");
    assert_eq!(summary.total, 3);
    assert_eq!(summary.verified, 2);
    assert_eq!(summary.failed, 1);

    let checked = app.registry.checked_channels().await;
    assert_eq!(checked.len(), 3);
    assert!(checked[0].verified);
    assert_eq!(checked[1].error, Some(ProbeError::HttpStatus(404)));
    assert!(checked[2].verified);
    assert!(checked.iter().all(|c| !(c.verified && c.error.is_some())));

    let status = app.registry.status().await;
    assert_eq!(status.total, 3);
    assert_eq!(status.working, 2);
    assert!(!status.verifying);
}

#[tokio::test]
async fn test_reload_resets_verification_state() {
    let addr = upstream().await;
    let registry = ChannelRegistry::new();
    let engine = Arc::new(VerificationEngine::new(
        registry.clone(),
        Arc::new(prober()),
        &test_verification_config(),
    ));
    let ingestor = PlaylistIngestor::new(&PlaylistConfig {
        url: format!("http://{addr}/lists/nam.m3u"),
        ..Default::default()
    })
    .unwrap();

    ingestor.ingest_into(&registry).await.unwrap();
    engine.run_pass().await.unwrap();
    assert_eq!(registry.checked_channels().await.len(), 3);

    ingestor.ingest_into(&registry).await.unwrap();
    assert!(registry.checked_channels().await.is_empty());
    assert_eq!(registry.status().await.working, 0);
}

#[tokio::test]
async fn test_failed_fetch_leaves_registry_untouched() {
    let addr = upstream().await;
    let app = build_app();
    let good = PlaylistIngestor::new(&PlaylistConfig {
        url: format!("http://{addr}/lists/nam.m3u"),
        ..Default::default()
    })
    .unwrap();
    good.ingest_into(&app.registry).await.unwrap();

    let bad = PlaylistIngestor::new(&PlaylistConfig {
        url: format!("http://{addr}/lists/broken"),
        ..Default::default()
    })
    .unwrap();
    let err = bad.ingest_into(&app.registry).await.unwrap_err();

    assert!(matches!(err, IngestionError::HttpStatus { status: 503 }));
    assert_eq!(app.registry.status().await.total, 3);
    assert_eq!(app.registry.generation().await, 1);
}

#[tokio::test]
async fn test_invalid_playlist_url_is_rejected() {
    let result = PlaylistIngestor::new(&PlaylistConfig {
        url: "not a url".to_string(),
        ..Default::default()
    });

    assert!(matches!(
        result,
        Err(IngestionError::InvalidSourceUrl { .. })
    ));
}
