//! # Identifiers
//!
//! Opaque string identifiers for sessions, participants and interactions.
//!
//! Session and participant ids are generated client-side from a random
//! base-36 token. Interaction ids are assigned by the store at append time.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::constants::DISPLAY_SESSION_PREFIX;

const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Length of the random part of a generated session id.
const SESSION_TOKEN_LEN: usize = 9;

/// Length of a generated participant id.
const PARTICIPANT_TOKEN_LEN: usize = 6;

/// Formats `value` in base 36 (lowercase).
#[must_use]
pub fn to_base36(mut value: u64) -> String {
    if value == 0 {
        return "0".to_owned();
    }
    let mut digits = Vec::with_capacity(13);
    while value > 0 {
        digits.push(BASE36[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    digits.into_iter().map(char::from).collect()
}

fn random_token<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    (0..len)
        .map(|_| char::from(BASE36[rng.gen_range(0..BASE36.len())]))
        .collect()
}

/// Identifies one logical session (a display plus its controllers).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Wraps an existing id (e.g. parsed from a join URL).
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a timestamp-salted random id.
    #[must_use]
    pub fn generate<R: Rng + ?Sized>(now_ms: u64, rng: &mut R) -> Self {
        let mut id = random_token(rng, SESSION_TOKEN_LEN);
        id.push_str(&to_base36(now_ms));
        Self(id)
    }

    /// Generates the fixed-prefix id a display creates for itself.
    #[must_use]
    pub fn for_display(now_ms: u64) -> Self {
        Self(format!("{DISPLAY_SESSION_PREFIX}{now_ms}"))
    }

    /// Returns the id as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifies one joined participant (the wire calls it `socketId`/`playerId`).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(String);

impl ParticipantId {
    /// Wraps an existing id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a random base-36 participant id.
    #[must_use]
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self(random_token(rng, PARTICIPANT_TOKEN_LEN))
    }

    /// Returns the id as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Store-assigned key of one interaction, unique within its session.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InteractionId(String);

impl InteractionId {
    /// Wraps an existing key.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Builds the key for the `seq`-th append of a session.
    ///
    /// Keys are zero-padded so lexical order equals append order.
    #[must_use]
    pub fn from_sequence(seq: u64) -> Self {
        Self(format!("-{seq:012}"))
    }

    /// Generates a random key (used by the relay, which has no sequence).
    #[must_use]
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self(random_token(rng, PARTICIPANT_TOKEN_LEN))
    }

    /// Returns the key as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InteractionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_base36() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
        assert_eq!(to_base36(1_700_000_000_000), "loyw3v28");
    }

    #[test]
    fn test_session_id_carries_timestamp() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let id = SessionId::generate(1_700_000_000_000, &mut rng);
        assert!(id.as_str().ends_with("loyw3v28"));
        assert_eq!(id.as_str().len(), SESSION_TOKEN_LEN + 8);
        assert!(id.as_str().chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_display_session_id() {
        assert_eq!(SessionId::for_display(42).as_str(), "memory-game-42");
    }

    #[test]
    fn test_interaction_keys_sort_in_append_order() {
        let a = InteractionId::from_sequence(9);
        let b = InteractionId::from_sequence(10);
        assert!(a < b);
    }

    #[test]
    fn test_participant_id_length() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let id = ParticipantId::generate(&mut rng);
        assert_eq!(id.as_str().len(), PARTICIPANT_TOKEN_LEN);
    }
}
