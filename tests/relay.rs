//! End-to-end relay tests over real TCP sockets

use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;

use chat_relay::client::{ChatSession, ClientConfig};
use chat_relay::protocol::parse_broadcast_line;
use chat_relay::{ChatServer, ServerConfig};

const TIMEOUT: Duration = Duration::from_secs(5);
const QUIET: Duration = Duration::from_millis(200);

struct TestClient {
    lines: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
}

impl TestClient {
    async fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).await.unwrap();
        let (read_half, writer) = stream.into_split();
        Self {
            lines: BufReader::new(read_half).lines(),
            writer,
        }
    }

    async fn send(&mut self, line: &str) {
        self.writer
            .write_all(format!("{}\n", line).as_bytes())
            .await
            .unwrap();
    }

    async fn recv(&mut self) -> Option<String> {
        tokio::time::timeout(TIMEOUT, self.lines.next_line())
            .await
            .expect("timed out waiting for a line")
            .unwrap()
    }

    /// Assert nothing arrives for a short while
    async fn expect_silence(&mut self) {
        let result = tokio::time::timeout(QUIET, self.lines.next_line()).await;
        assert!(result.is_err(), "unexpected line: {:?}", result);
    }
}

fn localhost() -> SocketAddr {
    "127.0.0.1:0".parse().unwrap()
}

async fn wait_for_connections(server: &ChatServer, n: usize) {
    tokio::time::timeout(TIMEOUT, async {
        while server.registry().len().await != n {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap_or_else(|_| panic!("registry never reached {} connections", n));
}

#[tokio::test]
async fn test_hello_quit_scenario() {
    let server = ChatServer::new(ServerConfig::with_addr(localhost()));
    let handle = server.start().await.unwrap();
    let addr = handle.local_addrs()[0];

    let mut a = TestClient::connect(addr).await;
    wait_for_connections(&server, 1).await;
    let mut b = TestClient::connect(addr).await;
    wait_for_connections(&server, 2).await;

    a.send("hello").await;
    assert_eq!(b.recv().await.as_deref(), Some("Client 1: hello"));
    a.expect_silence().await;

    // Sentinel is relayed like any other line, then A closes
    a.send("quit").await;
    a.writer.shutdown().await.unwrap();
    assert_eq!(b.recv().await.as_deref(), Some("Client 1: quit"));
    assert_eq!(a.recv().await, None);

    wait_for_connections(&server, 1).await;
    assert!(!server.registry().contains(1).await);
    assert!(server.registry().contains(2).await);

    // B keeps receiving from newcomers
    let mut c = TestClient::connect(addr).await;
    wait_for_connections(&server, 2).await;
    c.send("hey").await;
    assert_eq!(b.recv().await.as_deref(), Some("Client 3: hey"));

    handle.shutdown().await;
}

#[tokio::test]
async fn test_sender_order_preserved_for_every_recipient() {
    let server = ChatServer::new(ServerConfig::with_addr(localhost()));
    let handle = server.start().await.unwrap();
    let addr = handle.local_addrs()[0];

    let mut sender = TestClient::connect(addr).await;
    wait_for_connections(&server, 1).await;
    let mut r1 = TestClient::connect(addr).await;
    let mut r2 = TestClient::connect(addr).await;
    wait_for_connections(&server, 3).await;

    for line in ["L1", "L2", "L3"] {
        sender.send(line).await;
    }

    for recipient in [&mut r1, &mut r2] {
        for expected in ["L1", "L2", "L3"] {
            let line = recipient.recv().await.unwrap();
            let msg = parse_broadcast_line(&line).unwrap();
            assert_eq!(msg.sender, 1);
            assert_eq!(msg.text, expected);
        }
    }
    sender.expect_silence().await;

    handle.shutdown().await;
}

#[tokio::test]
async fn test_multiple_ports_share_one_registry() {
    let config = ServerConfig::with_addr(localhost()).listen_on(localhost());
    let server = ChatServer::new(config);
    let handle = server.start().await.unwrap();
    assert_eq!(handle.local_addrs().len(), 2);

    let mut a = TestClient::connect(handle.local_addrs()[0]).await;
    wait_for_connections(&server, 1).await;
    let mut b = TestClient::connect(handle.local_addrs()[1]).await;
    wait_for_connections(&server, 2).await;

    b.send("across ports").await;
    assert_eq!(a.recv().await.as_deref(), Some("Client 2: across ports"));

    handle.shutdown().await;
}

#[tokio::test]
async fn test_connection_cap_rejects_excess() {
    let config = ServerConfig::with_addr(localhost()).max_connections(1);
    let server = ChatServer::new(config);
    let handle = server.start().await.unwrap();
    let addr = handle.local_addrs()[0];

    let _first = TestClient::connect(addr).await;
    wait_for_connections(&server, 1).await;

    let mut second = TestClient::connect(addr).await;
    let result = tokio::time::timeout(TIMEOUT, second.lines.next_line())
        .await
        .expect("rejected socket should be closed");
    assert!(!matches!(result, Ok(Some(_))));

    assert_eq!(server.registry().len().await, 1);
    assert_eq!(server.stats().connections_rejected, 1);

    handle.shutdown().await;
}

#[tokio::test]
async fn test_shutdown_closes_clients() {
    let server = ChatServer::new(ServerConfig::with_addr(localhost()));
    let handle = server.start().await.unwrap();
    let addr = handle.local_addrs()[0];

    let mut a = TestClient::connect(addr).await;
    let mut b = TestClient::connect(addr).await;
    wait_for_connections(&server, 2).await;

    assert_eq!(handle.shutdown().await, 2);
    assert_eq!(a.recv().await, None);
    assert_eq!(b.recv().await, None);
    assert!(TcpStream::connect(addr).await.is_err());
}

#[tokio::test]
async fn test_session_against_server() {
    let server = ChatServer::new(ServerConfig::with_addr(localhost()));
    let handle = server.start().await.unwrap();
    let addr = handle.local_addrs()[0];

    let mut observer = TestClient::connect(addr).await;
    wait_for_connections(&server, 1).await;

    let session = ChatSession::connect(ClientConfig::new(addr.to_string()))
        .await
        .unwrap();
    let input: &[u8] = b"hi all\nquit\n";
    let summary = tokio::time::timeout(TIMEOUT, session.run(input, tokio::io::sink()))
        .await
        .unwrap()
        .unwrap();

    assert!(summary.quit);
    assert_eq!(summary.lines_sent, 2);
    assert_eq!(observer.recv().await.as_deref(), Some("Client 2: hi all"));
    assert_eq!(observer.recv().await.as_deref(), Some("Client 2: quit"));

    wait_for_connections(&server, 1).await;
    let stats = server.stats();
    assert_eq!(stats.connections_accepted, 2);
    assert_eq!(stats.connections_closed, 1);
    assert_eq!(stats.lines_received, 2);

    handle.shutdown().await;
}
