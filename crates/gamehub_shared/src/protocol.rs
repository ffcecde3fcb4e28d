//! Wire records stored in a session and exchanged with controllers.
//!
//! Field names follow the JSON shapes the browser clients already speak,
//! hence the camelCase renames.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::action::Action;
use crate::constants::CONTROLLER_PATH;
use crate::ids::{InteractionId, ParticipantId, SessionId};

/// Role a participant joined with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeviceRole {
    /// The shared screen that owns game state.
    MainDisplay,
    /// A phone acting as an input source.
    Controller,
}

/// One joined participant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantRecord {
    /// Participant id (`socketId` on the wire).
    #[serde(rename = "socketId")]
    pub participant_id: ParticipantId,
    /// Name shown on the display.
    pub player_name: String,
    /// Display or controller.
    pub device_type: DeviceRole,
    /// Join time, ms since the Unix epoch.
    pub joined_at: u64,
}

/// One appended interaction. Immutable once stored.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(into = "WireInteraction", from = "WireInteraction")]
pub struct InteractionRecord {
    /// Store-assigned key.
    pub id: InteractionId,
    /// Participant that appended it.
    pub player_id: ParticipantId,
    /// That participant's display name.
    pub player_name: String,
    /// Typed action (`action` + `data` on the wire).
    pub action: Action,
    /// Append time, ms since the Unix epoch.
    pub timestamp: u64,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireInteraction {
    #[serde(default = "empty_id")]
    id: InteractionId,
    player_id: ParticipantId,
    player_name: String,
    action: String,
    #[serde(default)]
    data: Value,
    timestamp: u64,
}

fn empty_id() -> InteractionId {
    InteractionId::new(String::new())
}

impl From<InteractionRecord> for WireInteraction {
    fn from(record: InteractionRecord) -> Self {
        let (action, data) = record.action.to_wire();
        Self {
            id: record.id,
            player_id: record.player_id,
            player_name: record.player_name,
            action,
            data,
            timestamp: record.timestamp,
        }
    }
}

impl From<WireInteraction> for InteractionRecord {
    fn from(wire: WireInteraction) -> Self {
        Self {
            id: wire.id,
            player_id: wire.player_id,
            player_name: wire.player_name,
            action: Action::from_wire(&wire.action, wire.data),
            timestamp: wire.timestamp,
        }
    }
}

/// Builds the controller join URL for a session.
#[must_use]
pub fn join_url(origin: &str, session: &SessionId) -> String {
    format!("{}/{CONTROLLER_PATH}/{session}", origin.trim_end_matches('/'))
}

/// Recovers the session id from a controller join URL.
///
/// Returns `None` if the URL has no `/controller/<id>` segment.
#[must_use]
pub fn parse_join_url(url: &str) -> Option<SessionId> {
    let marker = format!("/{CONTROLLER_PATH}/");
    let start = url.find(&marker)? + marker.len();
    let id = url[start..]
        .split(|c: char| c == '/' || c == '?' || c == '#')
        .next()
        .unwrap_or_default();
    if id.is_empty() {
        None
    } else {
        Some(SessionId::new(id))
    }
}
