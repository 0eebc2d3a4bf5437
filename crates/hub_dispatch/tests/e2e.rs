use std::sync::Arc;
use std::time::Duration;

use hub_dispatch::{DispatchSettings, Dispatcher};
use hub_pool::{PoolStore, UpstreamUpdate};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

fn settings() -> DispatchSettings {
    DispatchSettings {
        prologue_timeout: Duration::from_secs(1),
        connect_timeout: Duration::from_secs(1),
        sniff_timeout: Duration::from_secs(1),
        max_retries: 5,
        fail_threshold: 3,
        switch_status_codes: vec![403, 429, 502, 503, 504],
        switch_keywords: vec!["验证码".to_string()],
    }
}

/// Spawns a one-shot mock upstream: accepts a single connection, reads
/// whatever the dispatcher forwards (the prologue), then writes `response`
/// and closes.
async fn mock_upstream_once(response: &'static [u8]) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut buf = [0u8; 4096];
        let _ = stream.read(&mut buf).await;
        let _ = stream.write_all(response).await;
        let _ = stream.shutdown().await;
    });
    format!("http://{addr}")
}

/// Spawns a mock upstream that accepts connections in a loop, replying with
/// `response` on each one — for upstreams that the dispatcher reconnects to
/// across several retry attempts against the same URL.
async fn mock_upstream_repeating(response: &'static [u8]) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else {
                break;
            };
            let mut buf = [0u8; 4096];
            let _ = stream.read(&mut buf).await;
            let _ = stream.write_all(response).await;
            let _ = stream.shutdown().await;
        }
    });
    format!("http://{addr}")
}

async fn spawn_hub(store: Arc<PoolStore>) -> String {
    let dispatcher = Dispatcher::new(store, settings(), 64);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = dispatcher.accept_loop(listener).await;
    });
    format!("127.0.0.1:{}", addr.port())
}

async fn client_roundtrip(hub_addr: &str, request: &[u8]) -> Vec<u8> {
    let mut client = TcpStream::connect(hub_addr).await.unwrap();
    client.write_all(request).await.unwrap();
    let mut got = Vec::new();
    let _ = tokio::time::timeout(Duration::from_secs(2), client.read_to_end(&mut got)).await;
    got
}

#[tokio::test]
async fn happy_splice_forwards_full_response() {
    let store = Arc::new(PoolStore::new());
    let upstream_url = mock_upstream_once(b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\nOK").await;
    store.add_upstreams(vec![upstream_url.clone()]);
    store.update_upstream(&upstream_url, UpstreamUpdate { alive: Some(true), ..Default::default() });

    let hub_addr = spawn_hub(store.clone()).await;
    let got = client_roundtrip(&hub_addr, b"GET /ok HTTP/1.1\r\nHost: x\r\n\r\n").await;

    assert!(String::from_utf8_lossy(&got).contains("200 OK"));
    assert!(String::from_utf8_lossy(&got).ends_with("OK"));
    assert!(!store.is_blacklisted(&upstream_url));
}

#[tokio::test]
async fn forbidden_response_rotates_to_next_upstream() {
    let store = Arc::new(PoolStore::new());
    let a_url = mock_upstream_once(b"HTTP/1.1 403 Forbidden\r\n\r\n").await;
    let b_url = mock_upstream_once(b"HTTP/1.1 200 OK\r\nContent-Length: 1\r\n\r\nB").await;
    store.add_upstreams(vec![a_url.clone(), b_url.clone()]);
    store.update_upstream(&a_url, UpstreamUpdate { alive: Some(true), ..Default::default() });
    store.update_upstream(&b_url, UpstreamUpdate { alive: Some(true), ..Default::default() });

    let hub_addr = spawn_hub(store.clone()).await;
    let got = client_roundtrip(&hub_addr, b"GET /ok HTTP/1.1\r\nHost: x\r\n\r\n").await;

    let text = String::from_utf8_lossy(&got);
    assert!(text.contains("200 OK"));
    assert!(!text.contains("403"));
    assert_eq!(store.all_upstreams().iter().find(|u| u.url == a_url).unwrap().fail_count, 1);
    assert_eq!(store.all_upstreams().iter().find(|u| u.url == b_url).unwrap().fail_count, 0);
}

#[tokio::test]
async fn keyword_hit_rotates_without_leaking_body() {
    let store = Arc::new(PoolStore::new());
    let a_url = mock_upstream_once("HTTP/1.1 200 OK\r\n\r\n<html>请完成验证码</html>".as_bytes()).await;
    let b_url = mock_upstream_once(b"HTTP/1.1 200 OK\r\nContent-Length: 1\r\n\r\nB").await;
    store.add_upstreams(vec![a_url.clone(), b_url.clone()]);
    store.update_upstream(&a_url, UpstreamUpdate { alive: Some(true), ..Default::default() });
    store.update_upstream(&b_url, UpstreamUpdate { alive: Some(true), ..Default::default() });

    let hub_addr = spawn_hub(store.clone()).await;
    let got = client_roundtrip(&hub_addr, b"GET /ok HTTP/1.1\r\nHost: x\r\n\r\n").await;

    let text = String::from_utf8_lossy(&got);
    assert!(!text.contains("验证码"));
    assert!(text.ends_with('B'));
}

#[tokio::test]
async fn three_connect_failures_blacklist_the_upstream() {
    let store = Arc::new(PoolStore::new());
    let a_url = "http://127.0.0.1:1".to_string(); // nothing listening: connect always fails
    store.add_upstreams(vec![a_url.clone()]);
    store.update_upstream(&a_url, UpstreamUpdate { alive: Some(true), ..Default::default() });

    let dispatcher_settings = DispatchSettings {
        connect_timeout: Duration::from_millis(200),
        ..settings()
    };
    let dispatcher = Dispatcher::new(store.clone(), dispatcher_settings, 64);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let hub_addr = format!("127.0.0.1:{}", listener.local_addr().unwrap().port());
    tokio::spawn(async move {
        let _ = dispatcher.accept_loop(listener).await;
    });

    for _ in 0..3 {
        let _ = client_roundtrip(&hub_addr, b"GET /ok HTTP/1.1\r\nHost: x\r\n\r\n").await;
    }

    assert!(store.is_blacklisted(&a_url));
    assert!(store.live(hub_pool::Mode::All).is_empty());

    // A fourth connection now observes immediate close: no live upstream.
    let got = client_roundtrip(&hub_addr, b"GET /ok HTTP/1.1\r\nHost: x\r\n\r\n").await;
    assert!(got.is_empty());
}

#[tokio::test]
async fn three_sniff_hits_blacklist_the_upstream() {
    let store = Arc::new(PoolStore::new());
    // Accepts a fresh connection on every retry attempt and answers each one
    // with a 403, so every attempt against A is a genuine sniff hit (§8
    // scenario 4), not a connect failure.
    let a_url = mock_upstream_repeating(b"HTTP/1.1 403 Forbidden\r\n\r\n").await;
    store.add_upstreams(vec![a_url.clone()]);
    store.update_upstream(&a_url, UpstreamUpdate { alive: Some(true), ..Default::default() });

    let hub_addr = spawn_hub(store.clone()).await;

    // A is the only live upstream, so the dispatcher's own retry loop
    // reselects it on every attempt: three sniff hits land within this one
    // client connection, blacklisting A before its retry budget closes it.
    let got = client_roundtrip(&hub_addr, b"GET /ok HTTP/1.1\r\nHost: x\r\n\r\n").await;
    assert!(got.is_empty());

    assert!(store.is_blacklisted(&a_url));
    assert_eq!(store.all_upstreams().iter().find(|u| u.url == a_url).unwrap().fail_count, 3);
    assert!(store.live(hub_pool::Mode::All).is_empty());

    // A further connection now observes immediate close: no live upstream.
    let got2 = client_roundtrip(&hub_addr, b"GET /ok HTTP/1.1\r\nHost: x\r\n\r\n").await;
    assert!(got2.is_empty());
}

#[tokio::test]
async fn connect_tunnel_skips_sniff_and_splices_immediately() {
    let store = Arc::new(PoolStore::new());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let upstream_addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut buf = [0u8; 4096];
        let n = stream.read(&mut buf).await.unwrap();
        assert!(buf[..n].starts_with(b"CONNECT"));
        // Tunnel established: echo back a canary so the client sees spliced bytes.
        let _ = stream.write_all(b"tunnel-ack").await;
        let _ = stream.shutdown().await;
    });
    let upstream_url = format!("http://{upstream_addr}");
    store.add_upstreams(vec![upstream_url.clone()]);
    store.update_upstream(&upstream_url, UpstreamUpdate { alive: Some(true), ..Default::default() });

    let hub_addr = spawn_hub(store.clone()).await;
    let got = client_roundtrip(&hub_addr, b"CONNECT example.com:443 HTTP/1.1\r\n\r\n").await;

    assert_eq!(got, b"tunnel-ack");
    assert!(!store.is_blacklisted(&upstream_url));
}
