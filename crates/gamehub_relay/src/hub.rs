//! # Relay Hub
//!
//! Room bookkeeping for the relay, independent of any socket.
//!
//! ```text
//!  conn 1 ──join──> ┌──────────── room "abc" ────────────┐
//!  conn 2 ──join──> │ members: [1, 2]                     │──> player-joined / interaction /
//!  conn 2 ──press─> │ players: [..]  interactions: [..]   │    game-action / player-left
//!                   └─────────────────────────────────────┘    to every member
//! ```
//!
//! Each connection registers an unbounded sender; the hub pushes
//! [`ServerEvent`]s into it and never waits on a slow socket.

use std::collections::HashMap;

use gamehub_shared::{now_millis, DeviceRole, InteractionId, ParticipantId, ParticipantRecord, SessionId};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc::UnboundedSender;

use crate::error::{RelayError, RelayResult};

/// Hub-assigned connection handle.
pub type ConnectionId = u64;

/// Action name stored for button presses.
pub const BUTTON_PRESS: &str = "button-press";

// ============================================================================
// WIRE EVENTS
// ============================================================================

/// `join-session` payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRequest {
    /// Room to join.
    pub session_id: SessionId,
    /// Display name.
    pub player_name: String,
    /// Display or controller.
    pub device_type: DeviceRole,
}

/// Client to server.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientEvent {
    /// Join a room.
    JoinSession(JoinRequest),
    /// Stored and fanned out as an `interaction`.
    ButtonPress(Value),
    /// Fanned out only.
    GameAction(Value),
}

/// `player-joined` payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerJoined {
    /// Who joined.
    pub player_name: String,
    /// As what.
    pub device_type: DeviceRole,
    /// Room size after the join.
    pub total_players: usize,
}

/// `player-left` payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerLeft {
    /// Who left.
    pub player_name: String,
    /// Room size after the leave.
    pub total_players: usize,
}

/// A stored button press.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayInteraction {
    /// Sender's socket id.
    pub player_id: ParticipantId,
    /// Sender's name.
    pub player_name: String,
    /// Always `button-press`.
    pub action: String,
    /// Client payload, untouched.
    pub data: Value,
    /// Server receive time (ms since epoch).
    pub timestamp: u64,
    /// Random id.
    pub id: InteractionId,
}

/// A relayed game action.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayGameAction {
    /// Sender's socket id.
    pub player_id: ParticipantId,
    /// Sender's name.
    pub player_name: String,
    /// Client payload, untouched.
    pub action: Value,
    /// Server receive time (ms since epoch).
    pub timestamp: u64,
}

/// `session-state` payload, sent to a joiner only.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    /// The room.
    pub session_id: SessionId,
    /// Everyone in it, joiner included.
    pub players: Vec<ParticipantRecord>,
    /// Latest stored interactions, oldest first.
    pub recent_interactions: Vec<RelayInteraction>,
}

/// Server to client.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerEvent {
    /// Someone joined the room.
    PlayerJoined(PlayerJoined),
    /// Someone left the room.
    PlayerLeft(PlayerLeft),
    /// A stored button press.
    Interaction(RelayInteraction),
    /// A relayed game action.
    GameAction(RelayGameAction),
    /// Room snapshot for a joiner.
    SessionState(SessionState),
    /// The last frame could not be understood.
    Error {
        /// What went wrong.
        message: String,
    },
}

// ============================================================================
// HUB
// ============================================================================

#[derive(Debug)]
struct Joined {
    session: SessionId,
    socket_id: ParticipantId,
    player_name: String,
}

#[derive(Debug)]
struct Connection {
    tx: UnboundedSender<ServerEvent>,
    joined: Option<Joined>,
}

#[derive(Debug, Default)]
struct Room {
    members: Vec<ConnectionId>,
    players: Vec<ParticipantRecord>,
    interactions: Vec<RelayInteraction>,
}

#[derive(Debug, Default)]
struct HubState {
    rooms: HashMap<SessionId, Room>,
    connections: HashMap<ConnectionId, Connection>,
    next_connection: ConnectionId,
}

impl HubState {
    fn broadcast(&self, session: &SessionId, event: &ServerEvent) {
        let Some(room) = self.rooms.get(session) else {
            return;
        };
        for member in &room.members {
            if let Some(conn) = self.connections.get(member) {
                // Closed receiver: the socket is going away.
                let _ = conn.tx.send(event.clone());
            }
        }
    }

    fn send_to(&self, connection: ConnectionId, event: ServerEvent) {
        if let Some(conn) = self.connections.get(&connection) {
            let _ = conn.tx.send(event);
        }
    }

    /// Removes a connection from its room and tells the others.
    fn leave_room(&mut self, connection: ConnectionId) {
        let Some(joined) = self
            .connections
            .get_mut(&connection)
            .and_then(|c| c.joined.take())
        else {
            return;
        };
        let Some(room) = self.rooms.get_mut(&joined.session) else {
            return;
        };
        room.members.retain(|&m| m != connection);
        room.players.retain(|p| p.participant_id != joined.socket_id);
        let total_players = room.players.len();
        tracing::info!(session = %joined.session, "{} left ({} remaining)", joined.player_name, total_players);

        self.broadcast(
            &joined.session,
            &ServerEvent::PlayerLeft(PlayerLeft {
                player_name: joined.player_name,
                total_players,
            }),
        );
    }
}

/// In-memory room registry.
pub struct RelayHub {
    state: Mutex<HubState>,
    recent_interactions: usize,
}

impl RelayHub {
    /// Creates a hub whose `session-state` replies carry `recent_interactions` entries.
    #[must_use]
    pub fn new(recent_interactions: usize) -> Self {
        Self {
            state: Mutex::new(HubState::default()),
            recent_interactions,
        }
    }

    /// Registers a connection.
    pub fn connect(&self, tx: UnboundedSender<ServerEvent>) -> ConnectionId {
        let mut state = self.state.lock();
        state.next_connection += 1;
        let id = state.next_connection;
        state.connections.insert(id, Connection { tx, joined: None });
        tracing::debug!("connection {} opened", id);
        id
    }

    /// Applies one client event.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::UnknownConnection`] if `connection` is not registered.
    pub fn handle(&self, connection: ConnectionId, event: ClientEvent) -> RelayResult<()> {
        let mut state = self.state.lock();
        if !state.connections.contains_key(&connection) {
            return Err(RelayError::UnknownConnection(connection));
        }
        match event {
            ClientEvent::JoinSession(request) => self.join(&mut state, connection, request),
            ClientEvent::ButtonPress(data) => Self::button_press(&mut state, connection, data),
            ClientEvent::GameAction(data) => Self::game_action(&state, connection, data),
        }
        Ok(())
    }

    fn join(&self, state: &mut HubState, connection: ConnectionId, request: JoinRequest) {
        state.leave_room(connection);

        let socket_id = ParticipantId::new(format!("conn-{connection}"));
        let record = ParticipantRecord {
            participant_id: socket_id.clone(),
            player_name: request.player_name.clone(),
            device_type: request.device_type,
            joined_at: now_millis(),
        };

        let room = state.rooms.entry(request.session_id.clone()).or_default();
        room.members.push(connection);
        room.players.push(record);
        let total_players = room.players.len();
        let snapshot = SessionState {
            session_id: request.session_id.clone(),
            players: room.players.clone(),
            recent_interactions: room
                .interactions
                .iter()
                .skip(room.interactions.len().saturating_sub(self.recent_interactions))
                .cloned()
                .collect(),
        };

        if let Some(conn) = state.connections.get_mut(&connection) {
            conn.joined = Some(Joined {
                session: request.session_id.clone(),
                socket_id,
                player_name: request.player_name.clone(),
            });
        }
        tracing::info!(
            session = %request.session_id,
            "{:?} \"{}\" joined ({} players)",
            request.device_type,
            request.player_name,
            total_players
        );

        state.broadcast(
            &request.session_id,
            &ServerEvent::PlayerJoined(PlayerJoined {
                player_name: request.player_name,
                device_type: request.device_type,
                total_players,
            }),
        );
        state.send_to(connection, ServerEvent::SessionState(snapshot));
    }

    fn sender(state: &HubState, connection: ConnectionId) -> Option<(SessionId, ParticipantId, String)> {
        let joined = state.connections.get(&connection)?.joined.as_ref()?;
        Some((joined.session.clone(), joined.socket_id.clone(), joined.player_name.clone()))
    }

    fn button_press(state: &mut HubState, connection: ConnectionId, data: Value) {
        let Some((session, player_id, player_name)) = Self::sender(state, connection) else {
            tracing::debug!("button-press from unjoined connection {} ignored", connection);
            return;
        };
        let interaction = RelayInteraction {
            player_id,
            player_name,
            action: BUTTON_PRESS.to_owned(),
            data,
            timestamp: now_millis(),
            id: InteractionId::random(&mut rand::thread_rng()),
        };
        tracing::debug!(session = %session, "button press from {}", interaction.player_name);
        if let Some(room) = state.rooms.get_mut(&session) {
            room.interactions.push(interaction.clone());
        }
        state.broadcast(&session, &ServerEvent::Interaction(interaction));
    }

    fn game_action(state: &HubState, connection: ConnectionId, action: Value) {
        let Some((session, player_id, player_name)) = Self::sender(state, connection) else {
            tracing::debug!("game-action from unjoined connection {} ignored", connection);
            return;
        };
        state.broadcast(
            &session,
            &ServerEvent::GameAction(RelayGameAction {
                player_id,
                player_name,
                action,
                timestamp: now_millis(),
            }),
        );
    }

    /// Sends an event to one connection, e.g. a decode error reply.
    pub fn reply(&self, connection: ConnectionId, event: ServerEvent) {
        self.state.lock().send_to(connection, event);
    }

    /// Drops a connection, leaving its room.
    pub fn disconnect(&self, connection: ConnectionId) {
        let mut state = self.state.lock();
        state.leave_room(connection);
        state.connections.remove(&connection);
        tracing::debug!("connection {} closed", connection);
    }

    /// Players in a room.
    #[must_use]
    pub fn players(&self, session: &SessionId) -> Vec<ParticipantRecord> {
        self.state
            .lock()
            .rooms
            .get(session)
            .map(|r| r.players.clone())
            .unwrap_or_default()
    }

    /// Stored interactions of a room, oldest first.
    #[must_use]
    pub fn interactions(&self, session: &SessionId) -> Vec<RelayInteraction> {
        self.state
            .lock()
            .rooms
            .get(session)
            .map(|r| r.interactions.clone())
            .unwrap_or_default()
    }

    /// Open connections.
    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.state.lock().connections.len()
    }
}

impl Default for RelayHub {
    fn default() -> Self {
        Self::new(gamehub_shared::constants::RELAY_RECENT_INTERACTIONS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

    fn open(hub: &RelayHub) -> (ConnectionId, UnboundedReceiver<ServerEvent>) {
        let (tx, rx) = unbounded_channel();
        (hub.connect(tx), rx)
    }

    fn join(hub: &RelayHub, conn: ConnectionId, session: &str, name: &str, role: DeviceRole) {
        hub.handle(
            conn,
            ClientEvent::JoinSession(JoinRequest {
                session_id: SessionId::new(session),
                player_name: name.into(),
                device_type: role,
            }),
        )
        .unwrap();
    }

    fn drain(rx: &mut UnboundedReceiver<ServerEvent>) -> Vec<ServerEvent> {
        let mut out = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            out.push(ev);
        }
        out
    }

    #[test]
    fn test_join_broadcasts_then_sends_state() {
        let hub = RelayHub::default();
        let (display, mut display_rx) = open(&hub);
        let (pad, mut pad_rx) = open(&hub);
        join(&hub, display, "room", "MainDisplay", DeviceRole::MainDisplay);
        drain(&mut display_rx);

        join(&hub, pad, "room", "ana", DeviceRole::Controller);
        let to_display = drain(&mut display_rx);
        assert_eq!(
            to_display,
            vec![ServerEvent::PlayerJoined(PlayerJoined {
                player_name: "ana".into(),
                device_type: DeviceRole::Controller,
                total_players: 2,
            })]
        );

        let to_pad = drain(&mut pad_rx);
        assert_eq!(to_pad.len(), 2);
        assert!(matches!(to_pad[0], ServerEvent::PlayerJoined(_)));
        let ServerEvent::SessionState(state) = &to_pad[1] else {
            panic!("expected session-state, got {:?}", to_pad[1]);
        };
        assert_eq!(state.players.len(), 2);
        assert!(state.recent_interactions.is_empty());
    }

    #[test]
    fn test_button_press_is_stored_and_fanned_out() {
        let hub = RelayHub::default();
        let (a, mut a_rx) = open(&hub);
        let (b, mut b_rx) = open(&hub);
        join(&hub, a, "room", "ana", DeviceRole::Controller);
        join(&hub, b, "room", "bo", DeviceRole::Controller);
        drain(&mut a_rx);
        drain(&mut b_rx);

        hub.handle(a, ClientEvent::ButtonPress(json!({"button": "A"}))).unwrap();
        for rx in [&mut a_rx, &mut b_rx] {
            let events = drain(rx);
            let [ServerEvent::Interaction(i)] = &events[..] else {
                panic!("expected one interaction, got {events:?}");
            };
            assert_eq!(i.action, BUTTON_PRESS);
            assert_eq!(i.player_name, "ana");
            assert_eq!(i.data, json!({"button": "A"}));
        }
        assert_eq!(hub.interactions(&SessionId::new("room")).len(), 1);
    }

    #[test]
    fn test_recent_interactions_are_capped() {
        let hub = RelayHub::new(3);
        let (a, _a_rx) = open(&hub);
        join(&hub, a, "room", "ana", DeviceRole::Controller);
        for n in 0..5 {
            hub.handle(a, ClientEvent::ButtonPress(json!(n))).unwrap();
        }
        let (b, mut b_rx) = open(&hub);
        join(&hub, b, "room", "bo", DeviceRole::Controller);
        let events = drain(&mut b_rx);
        let Some(ServerEvent::SessionState(state)) = events.last() else {
            panic!("no session-state");
        };
        let data: Vec<Value> = state.recent_interactions.iter().map(|i| i.data.clone()).collect();
        assert_eq!(data, vec![json!(2), json!(3), json!(4)]);
    }

    #[test]
    fn test_game_action_not_stored() {
        let hub = RelayHub::default();
        let (a, mut a_rx) = open(&hub);
        join(&hub, a, "room", "ana", DeviceRole::Controller);
        drain(&mut a_rx);
        hub.handle(a, ClientEvent::GameAction(json!({"type": "jump"}))).unwrap();
        let events = drain(&mut a_rx);
        assert!(matches!(&events[..], [ServerEvent::GameAction(g)] if g.action == json!({"type": "jump"})));
        assert!(hub.interactions(&SessionId::new("room")).is_empty());
    }

    #[test]
    fn test_unjoined_events_ignored() {
        let hub = RelayHub::default();
        let (a, mut a_rx) = open(&hub);
        hub.handle(a, ClientEvent::ButtonPress(json!(1))).unwrap();
        hub.handle(a, ClientEvent::GameAction(json!(1))).unwrap();
        assert!(drain(&mut a_rx).is_empty());
        assert!(matches!(
            hub.handle(99, ClientEvent::GameAction(json!(1))),
            Err(RelayError::UnknownConnection(99))
        ));
    }

    #[test]
    fn test_disconnect_broadcasts_player_left() {
        let hub = RelayHub::default();
        let (a, mut a_rx) = open(&hub);
        let (b, _b_rx) = open(&hub);
        join(&hub, a, "room", "ana", DeviceRole::MainDisplay);
        join(&hub, b, "room", "bo", DeviceRole::Controller);
        drain(&mut a_rx);

        hub.disconnect(b);
        assert_eq!(
            drain(&mut a_rx),
            vec![ServerEvent::PlayerLeft(PlayerLeft {
                player_name: "bo".into(),
                total_players: 1,
            })]
        );
        assert_eq!(hub.players(&SessionId::new("room")).len(), 1);
        assert_eq!(hub.connection_count(), 1);
    }

    #[test]
    fn test_rooms_are_isolated() {
        let hub = RelayHub::default();
        let (a, mut a_rx) = open(&hub);
        let (b, mut b_rx) = open(&hub);
        join(&hub, a, "one", "ana", DeviceRole::Controller);
        join(&hub, b, "two", "bo", DeviceRole::Controller);
        drain(&mut a_rx);
        drain(&mut b_rx);
        hub.handle(a, ClientEvent::ButtonPress(json!(1))).unwrap();
        assert!(drain(&mut b_rx).is_empty());
        assert_eq!(drain(&mut a_rx).len(), 1);
    }

    #[test]
    fn test_wire_shape() {
        let event = ServerEvent::PlayerLeft(PlayerLeft {
            player_name: "bo".into(),
            total_players: 1,
        });
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value, json!({"event": "player-left", "data": {"playerName": "bo", "totalPlayers": 1}}));

        let join: ClientEvent = serde_json::from_value(json!({
            "event": "join-session",
            "data": {"sessionId": "abc", "playerName": "ana", "deviceType": "controller"}
        }))
        .unwrap();
        assert!(matches!(join, ClientEvent::JoinSession(r) if r.session_id.as_str() == "abc"));
    }
}
