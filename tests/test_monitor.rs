use std::time::{Duration, Instant};

use parkway::http::connection::Connection;
use parkway::server::{Admission, Monitor, PendingRegistration};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;

const KEEP_ALIVE: Duration = Duration::from_millis(500);

async fn pair(id: u64) -> (Connection, TcpStream) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let client = TcpStream::connect(addr).await.unwrap();
    let (server, peer) = listener.accept().await.unwrap();

    (Connection::new(id, server, peer), client)
}

async fn assert_closed(client: &mut TcpStream) {
    let mut buf = [0u8; 16];
    let n = timeout(Duration::from_secs(2), client.read(&mut buf))
        .await
        .expect("server side should have been closed")
        .unwrap();
    assert_eq!(n, 0);
}

#[tokio::test]
async fn test_admit_registers_fresh_connection() {
    let mut monitor = Monitor::new();
    let (conn, _client) = pair(7).await;
    let now = Instant::now();

    let pending = PendingRegistration {
        conn,
        handed_back_at: now,
    };

    assert_eq!(monitor.admit(pending, now, KEEP_ALIVE), Admission::Registered);
    assert_eq!(monitor.len(), 1);
    assert!(monitor.contains(7));
}

#[tokio::test]
async fn test_admit_closes_expired_registration() {
    let mut monitor = Monitor::new();
    let (conn, mut client) = pair(1).await;
    let handed_back_at = Instant::now();

    let pending = PendingRegistration {
        conn,
        handed_back_at,
    };
    let later = handed_back_at + KEEP_ALIVE + Duration::from_millis(1);

    assert_eq!(monitor.admit(pending, later, KEEP_ALIVE), Admission::Expired);
    assert!(monitor.is_empty());
    assert_closed(&mut client).await;
}

#[tokio::test]
async fn test_cancel_returns_connection() {
    let mut monitor = Monitor::new();
    let (conn, _client) = pair(3).await;
    monitor.register(conn, Instant::now());

    let conn = monitor.cancel(3).expect("connection was registered");
    assert_eq!(conn.id(), 3);
    assert!(monitor.is_empty());
    assert!(monitor.cancel(3).is_none());
}

#[tokio::test]
async fn test_evict_expired_only_closes_idle_connections() {
    let mut monitor = Monitor::new();
    let start = Instant::now();

    let (old, mut old_client) = pair(1).await;
    let (fresh, _fresh_client) = pair(2).await;
    monitor.register(old, start);
    monitor.register(fresh, start + Duration::from_millis(300));

    assert_eq!(monitor.evict_expired(start + Duration::from_millis(100), KEEP_ALIVE), 0);
    assert_eq!(monitor.len(), 2);

    assert_eq!(monitor.evict_expired(start + KEEP_ALIVE, KEEP_ALIVE), 1);
    assert_eq!(monitor.len(), 1);
    assert!(monitor.contains(2));
    assert_closed(&mut old_client).await;
}

#[tokio::test]
async fn test_ready_fires_when_client_sends() {
    let mut monitor = Monitor::new();
    let (conn, mut client) = pair(9).await;
    monitor.register(conn, Instant::now());

    assert!(timeout(Duration::from_millis(100), monitor.ready()).await.is_err());

    client.write_all(b"GET / HTTP/1.1\r\n\r\n").await.unwrap();
    let id = timeout(Duration::from_secs(2), monitor.ready())
        .await
        .expect("connection should become ready");
    assert_eq!(id, 9);

    // Readiness does not unregister; the owner cancels explicitly.
    assert!(monitor.contains(9));
}

#[tokio::test]
async fn test_ready_fires_when_client_hangs_up() {
    let mut monitor = Monitor::new();
    let (conn, client) = pair(4).await;
    monitor.register(conn, Instant::now());

    drop(client);
    let id = timeout(Duration::from_secs(2), monitor.ready())
        .await
        .expect("hang-up should count as readable");
    assert_eq!(id, 4);
}

#[tokio::test]
async fn test_ready_ignores_other_idle_connections() {
    let mut monitor = Monitor::new();
    let (idle, _idle_client) = pair(1).await;
    let (busy, mut busy_client) = pair(2).await;
    monitor.register(idle, Instant::now());
    monitor.register(busy, Instant::now());

    busy_client.write_all(b"x").await.unwrap();
    let id = timeout(Duration::from_secs(2), monitor.ready()).await.unwrap();
    assert_eq!(id, 2);
}

#[tokio::test]
async fn test_ready_pending_when_empty() {
    let mut monitor = Monitor::new();
    assert!(timeout(Duration::from_millis(50), monitor.ready()).await.is_err());
}
