//! End-to-end relay tests over loopback TCP.

use std::sync::Arc;
use std::time::Duration;

use gamehub_relay::{RelayHub, RelayServer, ServerEvent};
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(5);

struct TestClient {
    lines: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
}

impl TestClient {
    async fn connect(addr: std::net::SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).await.unwrap();
        let (read_half, writer) = stream.into_split();
        Self {
            lines: BufReader::new(read_half).lines(),
            writer,
        }
    }

    async fn send(&mut self, frame: Value) {
        let mut bytes = serde_json::to_vec(&frame).unwrap();
        bytes.push(b'\n');
        self.writer.write_all(&bytes).await.unwrap();
    }

    async fn send_raw(&mut self, raw: &str) {
        self.writer.write_all(raw.as_bytes()).await.unwrap();
    }

    async fn recv(&mut self) -> ServerEvent {
        let line = timeout(WAIT, self.lines.next_line())
            .await
            .expect("timed out waiting for a frame")
            .unwrap()
            .expect("connection closed");
        serde_json::from_str(&line).unwrap()
    }

    async fn join(&mut self, session: &str, name: &str, role: &str) {
        self.send(json!({
            "event": "join-session",
            "data": {"sessionId": session, "playerName": name, "deviceType": role}
        }))
        .await;
    }
}

async fn start() -> std::net::SocketAddr {
    let server = RelayServer::bind("127.0.0.1:0", Arc::new(RelayHub::default()))
        .await
        .unwrap();
    let addr = server.local_addr().unwrap();
    tokio::spawn(server.run());
    addr
}

#[tokio::test]
async fn test_display_sees_controller_join_and_press() {
    let addr = start().await;
    let mut display = TestClient::connect(addr).await;
    display.join("memory-game-1", "MainDisplay", "main-display").await;
    assert!(matches!(display.recv().await, ServerEvent::PlayerJoined(p) if p.total_players == 1));
    assert!(matches!(display.recv().await, ServerEvent::SessionState(s) if s.players.len() == 1));

    let mut pad = TestClient::connect(addr).await;
    pad.join("memory-game-1", "ana", "controller").await;
    match display.recv().await {
        ServerEvent::PlayerJoined(p) => {
            assert_eq!(p.player_name, "ana");
            assert_eq!(p.total_players, 2);
        }
        other => panic!("unexpected {other:?}"),
    }
    assert!(matches!(pad.recv().await, ServerEvent::PlayerJoined(_)));
    assert!(matches!(pad.recv().await, ServerEvent::SessionState(_)));

    pad.send(json!({"event": "button-press", "data": {"type": "memory-select", "cardIndex": 4}}))
        .await;
    match display.recv().await {
        ServerEvent::Interaction(i) => {
            assert_eq!(i.player_name, "ana");
            assert_eq!(i.data["cardIndex"], 4);
        }
        other => panic!("unexpected {other:?}"),
    }
    assert!(matches!(pad.recv().await, ServerEvent::Interaction(_)));
}

#[tokio::test]
async fn test_bad_frame_gets_error_reply() {
    let addr = start().await;
    let mut client = TestClient::connect(addr).await;
    client.send_raw("this is not json\n").await;
    assert!(matches!(client.recv().await, ServerEvent::Error { .. }));

    // The connection survives a bad frame.
    client.join("room", "ana", "controller").await;
    assert!(matches!(client.recv().await, ServerEvent::PlayerJoined(_)));
}

#[tokio::test]
async fn test_disconnect_notifies_room() {
    let addr = start().await;
    let mut display = TestClient::connect(addr).await;
    display.join("room", "MainDisplay", "main-display").await;
    display.recv().await;
    display.recv().await;

    let mut pad = TestClient::connect(addr).await;
    pad.join("room", "bo", "controller").await;
    display.recv().await;
    pad.recv().await;
    pad.recv().await;
    drop(pad);

    match display.recv().await {
        ServerEvent::PlayerLeft(p) => {
            assert_eq!(p.player_name, "bo");
            assert_eq!(p.total_players, 1);
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn test_game_action_relayed_verbatim() {
    let addr = start().await;
    let mut a = TestClient::connect(addr).await;
    a.join("room", "ana", "controller").await;
    a.recv().await;
    a.recv().await;

    a.send(json!({"event": "game-action", "data": {"type": "racing-lane-switch", "lane": 2}}))
        .await;
    match a.recv().await {
        ServerEvent::GameAction(g) => assert_eq!(g.action, json!({"type": "racing-lane-switch", "lane": 2})),
        other => panic!("unexpected {other:?}"),
    }
}
