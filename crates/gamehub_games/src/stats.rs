//! # Game Stats
//!
//! The collaborator finished games are reported to, plus an in-memory book
//! with per-player totals, a leaderboard and bingo achievements.

use std::collections::HashMap;
use std::fmt;

use gamehub_shared::now_millis;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Number of entries in a leaderboard.
pub const LEADERBOARD_SIZE: usize = 10;

/// Which mini-game produced a record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameKind {
    /// Memory match.
    Memory,
    /// Charge-jump platformer.
    Platformer,
    /// Lane racer.
    Racing,
}

impl GameKind {
    /// Wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Platformer => "platformer",
            Self::Racing => "racing",
        }
    }
}

impl fmt::Display for GameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One finished game.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameRecord {
    /// Who played.
    pub player_name: String,
    /// Which game.
    #[serde(rename = "gameType")]
    pub kind: GameKind,
    /// Final score.
    pub score: u32,
    /// Moves taken (0 where the game has no moves).
    pub moves: u32,
    /// Play time, whole seconds.
    #[serde(rename = "timeElapsed")]
    pub elapsed_secs: u64,
    /// When it was recorded (ms since epoch).
    pub timestamp: u64,
}

impl GameRecord {
    /// Builds a record stamped with the current time.
    #[must_use]
    pub fn new(player_name: impl Into<String>, kind: GameKind, score: u32, moves: u32, elapsed_secs: u64) -> Self {
        Self {
            player_name: player_name.into(),
            kind,
            score,
            moves,
            elapsed_secs,
            timestamp: now_millis(),
        }
    }
}

/// Receives finished games.
pub trait StatsRecorder: Send + Sync {
    /// Records one finished game.
    fn record_game(&self, record: GameRecord);
}

impl<T: StatsRecorder + ?Sized> StatsRecorder for std::sync::Arc<T> {
    fn record_game(&self, record: GameRecord) {
        (**self).record_game(record);
    }
}

/// Aggregates for one player.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStats {
    /// Games recorded.
    pub total_games: u32,
    /// Sum of scores.
    pub total_score: u64,
    /// `total_score / total_games`, rounded.
    pub average_score: u32,
    /// Highest single score.
    pub best_score: u32,
    /// Every game, oldest first.
    pub game_history: Vec<GameRecord>,
}

impl PlayerStats {
    fn push(&mut self, record: GameRecord) {
        self.total_games += 1;
        self.total_score += u64::from(record.score);
        let avg = (self.total_score as f64 / f64::from(self.total_games)).round();
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        {
            self.average_score = avg as u32;
        }
        self.best_score = self.best_score.max(record.score);
        self.game_history.push(record);
    }
}

/// One leaderboard line.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    /// Player.
    pub player_name: String,
    /// Score of that game.
    pub score: u32,
    /// Game it was scored in.
    #[serde(rename = "gameType")]
    pub kind: GameKind,
}

/// Bingo achievements derived from a player's stats.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Achievement {
    /// Best score of 900 or more.
    MemoryMaster,
    /// Best score of 800 or more.
    SharpMind,
    /// Average score of 700 or more.
    ConsistentPlayer,
    /// Five or more games.
    DedicatedGamer,
    /// Ten or more games.
    GameEnthusiast,
    /// Best memory game took at most 20 moves.
    EfficientPlayer,
    /// Best memory game took at most 18 moves.
    PerfectMemory,
    /// Best memory game took at most 60 seconds.
    SpeedDemon,
}

impl Achievement {
    /// Label shown on the bingo card.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::MemoryMaster => "Memory Master (900+ score)",
            Self::SharpMind => "Sharp Mind (800+ score)",
            Self::ConsistentPlayer => "Consistent Player (700+ avg)",
            Self::DedicatedGamer => "Dedicated Gamer (5+ games)",
            Self::GameEnthusiast => "Game Enthusiast (10+ games)",
            Self::EfficientPlayer => "Efficient Player (≤20 moves)",
            Self::PerfectMemory => "Perfect Memory (≤18 moves)",
            Self::SpeedDemon => "Speed Demon (<60s)",
        }
    }
}

impl fmt::Display for Achievement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Default)]
struct Book {
    players: HashMap<String, PlayerStats>,
    /// All records in arrival order, for stable leaderboard ties.
    history: Vec<GameRecord>,
}

/// In-memory [`StatsRecorder`]. Lost when the process exits.
#[derive(Default)]
pub struct GameStatsBook {
    book: RwLock<Book>,
}

impl GameStatsBook {
    /// Creates an empty book.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stats for one player.
    #[must_use]
    pub fn player(&self, player_name: &str) -> Option<PlayerStats> {
        self.book.read().players.get(player_name).cloned()
    }

    /// Number of players with at least one game.
    #[must_use]
    pub fn player_count(&self) -> usize {
        self.book.read().players.len()
    }

    /// Top scores, optionally restricted to one game.
    ///
    /// Equal scores keep arrival order.
    #[must_use]
    pub fn leaderboard(&self, kind: Option<GameKind>) -> Vec<LeaderboardEntry> {
        let book = self.book.read();
        let mut entries: Vec<LeaderboardEntry> = book
            .history
            .iter()
            .filter(|r| kind.map_or(true, |k| r.kind == k))
            .map(|r| LeaderboardEntry {
                player_name: r.player_name.clone(),
                score: r.score,
                kind: r.kind,
            })
            .collect();
        entries.sort_by(|a, b| b.score.cmp(&a.score));
        entries.truncate(LEADERBOARD_SIZE);
        entries
    }

    /// Achievements a player has earned, in card order.
    #[must_use]
    pub fn achievements(&self, player_name: &str) -> Vec<Achievement> {
        let book = self.book.read();
        let Some(stats) = book.players.get(player_name) else {
            return Vec::new();
        };

        let mut earned = Vec::new();
        if stats.best_score >= 900 {
            earned.push(Achievement::MemoryMaster);
        }
        if stats.best_score >= 800 {
            earned.push(Achievement::SharpMind);
        }
        if stats.average_score >= 700 {
            earned.push(Achievement::ConsistentPlayer);
        }
        if stats.total_games >= 5 {
            earned.push(Achievement::DedicatedGamer);
        }
        if stats.total_games >= 10 {
            earned.push(Achievement::GameEnthusiast);
        }

        // First of the highest-scoring memory games.
        let best_memory = stats
            .game_history
            .iter()
            .filter(|g| g.kind == GameKind::Memory)
            .fold(None::<&GameRecord>, |best, g| match best {
                Some(b) if g.score <= b.score => Some(b),
                _ => Some(g),
            });
        if let Some(game) = best_memory {
            if game.moves <= 20 {
                earned.push(Achievement::EfficientPlayer);
            }
            if game.moves <= 18 {
                earned.push(Achievement::PerfectMemory);
            }
            if game.elapsed_secs <= 60 {
                earned.push(Achievement::SpeedDemon);
            }
        }
        earned
    }

    /// Forgets everything.
    pub fn clear(&self) {
        let mut book = self.book.write();
        book.players.clear();
        book.history.clear();
    }
}

impl StatsRecorder for GameStatsBook {
    fn record_game(&self, record: GameRecord) {
        tracing::info!(
            "game recorded for {}: {} score={} moves={} time={}s",
            record.player_name,
            record.kind,
            record.score,
            record.moves,
            record.elapsed_secs
        );
        let mut book = self.book.write();
        book.history.push(record.clone());
        book.players
            .entry(record.player_name.clone())
            .or_default()
            .push(record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(book: &GameStatsBook, name: &str, kind: GameKind, score: u32, moves: u32, secs: u64) {
        book.record_game(GameRecord::new(name, kind, score, moves, secs));
    }

    #[test]
    fn test_player_totals() {
        let book = GameStatsBook::new();
        record(&book, "ana", GameKind::Memory, 1000, 18, 40);
        record(&book, "ana", GameKind::Racing, 501, 0, 50);
        let stats = book.player("ana").unwrap();
        assert_eq!(stats.total_games, 2);
        assert_eq!(stats.total_score, 1501);
        assert_eq!(stats.average_score, 751);
        assert_eq!(stats.best_score, 1000);
        assert_eq!(stats.game_history.len(), 2);
        assert!(book.player("bo").is_none());
    }

    #[test]
    fn test_leaderboard_top_ten_filtered() {
        let book = GameStatsBook::new();
        for i in 0..12 {
            record(&book, "ana", GameKind::Memory, 100 + i * 10, 20, 30);
        }
        record(&book, "bo", GameKind::Racing, 5000, 0, 10);

        let all = book.leaderboard(None);
        assert_eq!(all.len(), LEADERBOARD_SIZE);
        assert_eq!(all[0].player_name, "bo");

        let memory = book.leaderboard(Some(GameKind::Memory));
        assert_eq!(memory.len(), LEADERBOARD_SIZE);
        assert_eq!(memory[0].score, 210);
        assert!(memory.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn test_achievements() {
        let book = GameStatsBook::new();
        record(&book, "ana", GameKind::Memory, 980, 20, 45);
        record(&book, "ana", GameKind::Memory, 700, 16, 90);
        let earned = book.achievements("ana");
        assert_eq!(
            earned,
            vec![
                Achievement::MemoryMaster,
                Achievement::SharpMind,
                Achievement::ConsistentPlayer,
                Achievement::EfficientPlayer,
                Achievement::SpeedDemon,
            ]
        );
        assert_eq!(earned[0].label(), "Memory Master (900+ score)");
        assert!(book.achievements("nobody").is_empty());
    }

    #[test]
    fn test_game_count_achievements() {
        let book = GameStatsBook::new();
        for _ in 0..10 {
            record(&book, "bo", GameKind::Platformer, 3, 0, 12);
        }
        let earned = book.achievements("bo");
        assert_eq!(earned, vec![Achievement::DedicatedGamer, Achievement::GameEnthusiast]);
    }

    #[test]
    fn test_record_serializes_wire_names() {
        let r = GameRecord {
            player_name: "ana".into(),
            kind: GameKind::Racing,
            score: 900,
            moves: 0,
            elapsed_secs: 10,
            timestamp: 1,
        };
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["playerName"], "ana");
        assert_eq!(json["gameType"], "racing");
        assert_eq!(json["timeElapsed"], 10);
    }
}
