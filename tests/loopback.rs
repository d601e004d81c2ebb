use axum::{extract::State, routing::post, Router};
use bytes::Bytes;
use loadgen::config::{AccessMethod, ClientConfig, FailurePolicy, ServerConfig};
use loadgen::payload::decode_envelope;
use loadgen::{Envelope, Server, WorkerPool};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::time::sleep;

fn client_config(url: String, worker_count: usize, method: AccessMethod) -> ClientConfig {
    ClientConfig {
        worker_count,
        interval: Duration::from_millis(20),
        url,
        method,
        request_timeout: Duration::from_secs(2),
        failure_policy: FailurePolicy::Shrink,
    }
}

type Received = Arc<Mutex<Vec<Envelope>>>;

async fn record(State(received): State<Received>, body: Bytes) -> &'static str {
    let envelope = decode_envelope(&body).expect("worker sent a valid envelope");
    received.lock().unwrap().push(envelope);
    "ok"
}

/// Minimal server that keeps every decoded envelope.
async fn spawn_recorder() -> (String, Received) {
    let received = Received::default();
    let app = Router::new()
        .route("/request", post(record))
        .with_state(received.clone());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await });
    (format!("http://{addr}/request"), received)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn envelopes_arrive_intact() {
    let (url, received) = spawn_recorder().await;
    let running = WorkerPool::new(&client_config(url, 3, AccessMethod::Post))
        .unwrap()
        .run();

    sleep(Duration::from_millis(300)).await;
    let report = running.close().await;

    let received = received.lock().unwrap();
    assert_eq!(received.len() as u64, report.requests);
    assert!(received.iter().all(|e| e.id < 3));
    for envelope in received.iter() {
        envelope.parsed_time().expect("time in wire format");
    }
    let uids: HashSet<_> = received.iter().map(|e| e.uid).collect();
    assert_eq!(uids.len(), received.len());

    let ids: HashSet<_> = received.iter().map(|e| e.id).collect();
    assert_eq!(ids.len(), 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn no_requests_after_close() {
    let (url, received) = spawn_recorder().await;
    let running = WorkerPool::new(&client_config(url, 4, AccessMethod::Post))
        .unwrap()
        .run();

    sleep(Duration::from_millis(200)).await;
    let report = running.close().await;
    let at_close = received.lock().unwrap().len();

    sleep(Duration::from_millis(200)).await;
    assert_eq!(received.lock().unwrap().len(), at_close);
    assert_eq!(at_close as u64, report.requests);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn get_workers_against_real_server() {
    let config = ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        prefix: "ping".to_string(),
        shutdown_timeout: Duration::from_secs(1),
        ..ServerConfig::default()
    };
    let mut server = Server::bind(config).await.unwrap();
    server.run();

    let url = format!("http://{}/ping", server.local_addr());
    let running = WorkerPool::new(&client_config(url, 2, AccessMethod::Get))
        .unwrap()
        .run();

    sleep(Duration::from_millis(300)).await;
    let report = running.close().await;
    assert_eq!(report.completed, 2);
    assert_eq!(report.failed, 0);
    assert!(report.requests > 0);

    assert_eq!(server.close().await, report.requests);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn workers_shrink_when_server_goes_away() {
    let config = ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        shutdown_timeout: Duration::from_secs(1),
        ..ServerConfig::default()
    };
    let mut server = Server::bind(config).await.unwrap();
    server.run();

    let url = format!("http://{}/request", server.local_addr());
    let mut client = client_config(url, 2, AccessMethod::Post);
    client.interval = Duration::from_millis(50);
    let running = WorkerPool::new(&client).unwrap().run();

    sleep(Duration::from_millis(200)).await;
    server.close().await;
    sleep(Duration::from_millis(300)).await;

    let report = running.close().await;
    assert_eq!(report.completed, 2);
    assert_eq!(report.failed, 2);
}
