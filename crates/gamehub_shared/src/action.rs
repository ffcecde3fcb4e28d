//! # Interaction Actions
//!
//! Tagged union of every action kind that travels through a session log.
//!
//! On the wire an interaction carries `action: string` and `data: object`.
//! [`Action::from_wire`] decodes that pair into a typed variant and
//! [`Action::to_wire`] produces it again. Kinds this build does not know
//! (and known kinds with a malformed payload) decode to [`Action::Other`] so
//! a foreign entry never poisons the log.

use serde::Deserialize;
use serde_json::{json, Map, Value};

/// Wire kind of a memory card selection.
pub const KIND_MEMORY_CARD_SELECT: &str = "memory-card-select";
/// Wire kind of a platformer jump button event.
pub const KIND_JUMP_ACTION: &str = "jump-action";
/// Wire kind of a racer forward tap.
pub const KIND_RACING_TAP: &str = "racing-tap";
/// Wire kind of a racer absolute lane switch.
pub const KIND_RACING_LANE_SWITCH: &str = "racing-lane-switch";
/// Wire kind of the display's matched-card reflection.
pub const KIND_MATCH_UPDATE: &str = "match-update";
/// Wire kind of a generic controller button press.
pub const KIND_BUTTON_PRESS: &str = "button-press";

/// One player- or display-originated action.
#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    /// A controller selected a memory card.
    MemoryCardSelect {
        /// Board position. Signed so out-of-range input reaches the game
        /// boundary intact and is rejected there.
        card_position: i64,
    },
    /// A controller pressed the platformer jump button.
    JumpAction,
    /// A controller tapped the racer forward button.
    RacingTap,
    /// A controller selected an absolute racer lane.
    RacingLaneSwitch {
        /// Requested lane; the racer clamps it to `0..=2`.
        lane: i64,
    },
    /// The display published the set of permanently matched cards.
    MatchUpdate {
        /// Every matched position so far (wire key `matchedCards`).
        matched_cards: Vec<usize>,
    },
    /// A generic controller button press carrying arbitrary data.
    ButtonPress {
        /// Opaque payload.
        data: Value,
    },
    /// Any other kind, kept verbatim.
    Other {
        /// Wire kind.
        kind: String,
        /// Wire payload.
        data: Value,
    },
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CardSelectData {
    card_position: i64,
}

#[derive(Deserialize)]
struct LaneSwitchData {
    lane: i64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MatchUpdateData {
    #[serde(default)]
    matched_cards: Vec<usize>,
}

impl Action {
    /// Returns the wire kind of this action.
    #[must_use]
    pub fn kind(&self) -> &str {
        match self {
            Self::MemoryCardSelect { .. } => KIND_MEMORY_CARD_SELECT,
            Self::JumpAction => KIND_JUMP_ACTION,
            Self::RacingTap => KIND_RACING_TAP,
            Self::RacingLaneSwitch { .. } => KIND_RACING_LANE_SWITCH,
            Self::MatchUpdate { .. } => KIND_MATCH_UPDATE,
            Self::ButtonPress { .. } => KIND_BUTTON_PRESS,
            Self::Other { kind, .. } => kind,
        }
    }

    /// Returns true for display-published reflection state.
    #[inline]
    #[must_use]
    pub fn is_reflection(&self) -> bool {
        matches!(self, Self::MatchUpdate { .. })
    }

    /// Decodes a wire `(action, data)` pair.
    #[must_use]
    pub fn from_wire(kind: &str, data: Value) -> Self {
        let decoded = match kind {
            KIND_MEMORY_CARD_SELECT => serde_json::from_value::<CardSelectData>(data.clone())
                .ok()
                .map(|d| Self::MemoryCardSelect { card_position: d.card_position }),
            KIND_JUMP_ACTION => Some(Self::JumpAction),
            KIND_RACING_TAP => Some(Self::RacingTap),
            KIND_RACING_LANE_SWITCH => serde_json::from_value::<LaneSwitchData>(data.clone())
                .ok()
                .map(|d| Self::RacingLaneSwitch { lane: d.lane }),
            KIND_MATCH_UPDATE => serde_json::from_value::<MatchUpdateData>(data.clone())
                .ok()
                .map(|d| Self::MatchUpdate { matched_cards: d.matched_cards }),
            KIND_BUTTON_PRESS => Some(Self::ButtonPress { data: data.clone() }),
            _ => None,
        };
        decoded.unwrap_or_else(|| Self::Other {
            kind: kind.to_owned(),
            data,
        })
    }

    /// Encodes this action as a wire `(action, data)` pair.
    #[must_use]
    pub fn to_wire(&self) -> (String, Value) {
        let data = match self {
            Self::MemoryCardSelect { card_position } => json!({ "cardPosition": card_position }),
            Self::JumpAction | Self::RacingTap => Value::Object(Map::new()),
            Self::RacingLaneSwitch { lane } => json!({ "lane": lane }),
            Self::MatchUpdate { matched_cards } => json!({ "matchedCards": matched_cards }),
            Self::ButtonPress { data } | Self::Other { data, .. } => data.clone(),
        };
        (self.kind().to_owned(), data)
    }
}
