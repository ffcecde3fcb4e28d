//! # Memory Match
//!
//! Eighteen face-down cards, nine symbols, two of each. Flip two at a time;
//! pairs lock in, mismatches flip back.
//!
//! ## Lifecycle of a pair
//!
//! ```text
//!   select(a)        select(b)            advance(..) past the delay
//! ──────────> 1 up ──────────> 2 up ────┬──> match:    both Matched, MatchUpdate
//!                               moves+1 └──> mismatch: both Hidden
//! ```
//!
//! While two cards are up every further selection is rejected. Timers run on
//! game time fed in by the host, so a stopped game resolves nothing.

use std::time::Duration;

use gamehub_shared::config::MemorySettings;
use gamehub_shared::{MEMORY_BOARD_SIZE, MEMORY_PAIRS};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::GameError;

/// Labels of the nine card faces.
pub const SYMBOLS: [&str; MEMORY_PAIRS] = [
    "cassette",
    "game-boy",
    "tape",
    "floppy",
    "phone",
    "vinyl",
    "gamepad",
    "tv",
    "headphones",
];

/// Moves a perfect game takes before the score starts dropping.
pub const PAR_MOVES: u32 = 18;

/// Visibility of one card.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CardState {
    /// Face down.
    Hidden,
    /// Face up, waiting for its pair to resolve.
    Flipped,
    /// Locked in. Terminal.
    Matched,
}

/// One card on the board.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Card {
    /// Index into [`SYMBOLS`].
    pub symbol: u8,
    /// Visibility.
    pub state: CardState,
}

/// Why a selection was refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rejection {
    /// Position outside `0..18`.
    OutOfRange(i64),
    /// Two cards are already up.
    PairPending,
    /// That card is already up.
    AlreadyFlipped(usize),
    /// That card is already matched.
    AlreadyMatched(usize),
    /// All pairs are found.
    Finished,
}

impl From<Rejection> for GameError {
    fn from(rejection: Rejection) -> Self {
        match rejection {
            Rejection::OutOfRange(p) => GameError::invalid(format!("card position {p} outside 0..{MEMORY_BOARD_SIZE}")),
            Rejection::Finished => GameError::Finished,
            other => GameError::invalid(format!("selection refused: {other:?}")),
        }
    }
}

/// Accepted selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Selection {
    /// First card of a pair is up.
    FirstFlipped(usize),
    /// Second card is up; the pair resolves after its delay.
    PairFlipped {
        /// The two positions, in selection order.
        cards: [usize; 2],
        /// Whether their symbols match.
        is_match: bool,
    },
}

/// Final result of a won game.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MemoryResult {
    /// Score, see [`memory_score`].
    pub score: u32,
    /// Pairs flipped.
    pub moves: u32,
    /// Play time rounded to whole seconds.
    pub elapsed_secs: u64,
}

/// What resolving a pair produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MemoryEvent {
    /// A pair locked in. Carries every matched position so far, ascending.
    MatchUpdate {
        /// All matched positions.
        matched_cards: Vec<usize>,
    },
    /// A mismatching pair flipped back.
    FlippedBack([usize; 2]),
    /// The ninth pair locked in.
    Won(MemoryResult),
}

/// `max(100, 1000 - 10 * max(0, moves - 18))`.
#[must_use]
pub fn memory_score(moves: u32) -> u32 {
    let over_par = moves.saturating_sub(PAR_MOVES);
    1000u32.saturating_sub(over_par.saturating_mul(10)).max(100)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn round_secs(elapsed: Duration) -> u64 {
    elapsed.as_secs_f64().round() as u64
}

#[derive(Clone, Copy, Debug)]
struct PendingPair {
    cards: [usize; 2],
    is_match: bool,
    due: Duration,
}

/// Memory game state machine.
pub struct MemoryGame {
    /// The board, position-indexed.
    cards: Vec<Card>,
    /// Positions currently face up, at most two.
    flipped: Vec<usize>,
    /// Pair waiting on its reveal delay.
    pending: Option<PendingPair>,
    /// Completed pair flips.
    moves: u32,
    /// Pairs locked in.
    matched_pairs: usize,
    /// Game time since start.
    elapsed: Duration,
    /// Reveal delays.
    timing: MemorySettings,
    /// Set once all pairs are found.
    result: Option<MemoryResult>,
}

impl MemoryGame {
    /// Deals a shuffled board.
    pub fn new<R: Rng + ?Sized>(timing: MemorySettings, rng: &mut R) -> Self {
        let mut symbols: Vec<u8> = (0..MEMORY_PAIRS as u8).chain(0..MEMORY_PAIRS as u8).collect();
        symbols.shuffle(rng);
        Self::from_symbols(timing, &symbols)
    }

    /// Deals a fixed board.
    ///
    /// # Errors
    ///
    /// Returns `GameError::InvalidInput` unless `layout` has 18 entries with
    /// every symbol `0..9` exactly twice.
    pub fn with_layout(timing: MemorySettings, layout: &[u8]) -> Result<Self, GameError> {
        if layout.len() != MEMORY_BOARD_SIZE {
            return Err(GameError::invalid(format!(
                "board needs {MEMORY_BOARD_SIZE} cards, got {}",
                layout.len()
            )));
        }
        let mut counts = [0u8; MEMORY_PAIRS];
        for &symbol in layout {
            let slot = counts
                .get_mut(usize::from(symbol))
                .ok_or_else(|| GameError::invalid(format!("unknown symbol {symbol}")))?;
            *slot += 1;
        }
        if counts.iter().any(|&c| c != 2) {
            return Err(GameError::invalid("every symbol must appear exactly twice"));
        }
        Ok(Self::from_symbols(timing, layout))
    }

    fn from_symbols(timing: MemorySettings, symbols: &[u8]) -> Self {
        tracing::info!("memory board dealt ({} cards)", symbols.len());
        Self {
            cards: symbols
                .iter()
                .map(|&symbol| Card {
                    symbol,
                    state: CardState::Hidden,
                })
                .collect(),
            flipped: Vec::with_capacity(2),
            pending: None,
            moves: 0,
            matched_pairs: 0,
            elapsed: Duration::ZERO,
            timing,
            result: None,
        }
    }

    /// Flips the card at `position`.
    ///
    /// # Errors
    ///
    /// Returns the [`Rejection`] when the selection is not allowed; the board
    /// is unchanged.
    pub fn select(&mut self, position: i64) -> Result<Selection, Rejection> {
        if self.result.is_some() {
            return Err(Rejection::Finished);
        }
        let index = usize::try_from(position)
            .ok()
            .filter(|&i| i < self.cards.len())
            .ok_or(Rejection::OutOfRange(position))?;
        if self.flipped.len() >= 2 {
            return Err(Rejection::PairPending);
        }
        match self.cards[index].state {
            CardState::Flipped => return Err(Rejection::AlreadyFlipped(index)),
            CardState::Matched => return Err(Rejection::AlreadyMatched(index)),
            CardState::Hidden => {}
        }

        self.cards[index].state = CardState::Flipped;
        self.flipped.push(index);

        let [first, second] = match self.flipped[..] {
            [first, second] => [first, second],
            _ => return Ok(Selection::FirstFlipped(index)),
        };

        self.moves += 1;
        let is_match = self.cards[first].symbol == self.cards[second].symbol;
        let delay = if is_match {
            self.timing.match_delay_ms
        } else {
            self.timing.mismatch_delay_ms
        };
        self.pending = Some(PendingPair {
            cards: [first, second],
            is_match,
            due: self.elapsed + Duration::from_millis(delay),
        });
        tracing::debug!("pair {}/{} flipped, match = {}", first, second, is_match);
        Ok(Selection::PairFlipped {
            cards: [first, second],
            is_match,
        })
    }

    /// Advances game time and resolves a pair whose delay has passed.
    pub fn advance(&mut self, elapsed: Duration) -> Vec<MemoryEvent> {
        if self.result.is_some() {
            return Vec::new();
        }
        self.elapsed += elapsed;

        let mut events = Vec::new();
        let Some(pending) = self.pending.filter(|p| p.due <= self.elapsed) else {
            return events;
        };
        self.pending = None;
        self.flipped.clear();

        let [a, b] = pending.cards;
        if !pending.is_match {
            self.cards[a].state = CardState::Hidden;
            self.cards[b].state = CardState::Hidden;
            events.push(MemoryEvent::FlippedBack(pending.cards));
            return events;
        }

        self.cards[a].state = CardState::Matched;
        self.cards[b].state = CardState::Matched;
        self.matched_pairs += 1;
        events.push(MemoryEvent::MatchUpdate {
            matched_cards: self.matched_positions(),
        });

        if self.matched_pairs == MEMORY_PAIRS {
            let result = MemoryResult {
                score: memory_score(self.moves),
                moves: self.moves,
                elapsed_secs: round_secs(self.elapsed),
            };
            tracing::info!(
                "memory won: {} moves, {}s, score {}",
                result.moves,
                result.elapsed_secs,
                result.score
            );
            self.result = Some(result);
            events.push(MemoryEvent::Won(result));
        }
        events
    }

    /// Positions of every matched card, ascending.
    #[must_use]
    pub fn matched_positions(&self) -> Vec<usize> {
        self.cards
            .iter()
            .enumerate()
            .filter(|(_, c)| c.state == CardState::Matched)
            .map(|(i, _)| i)
            .collect()
    }

    /// The board.
    #[must_use]
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    /// Positions currently face up.
    #[must_use]
    pub fn flipped(&self) -> &[usize] {
        &self.flipped
    }

    /// Completed pair flips.
    #[must_use]
    pub const fn moves(&self) -> u32 {
        self.moves
    }

    /// Pairs locked in.
    #[must_use]
    pub const fn matched_pairs(&self) -> usize {
        self.matched_pairs
    }

    /// Game time since start.
    #[must_use]
    pub const fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Result once won.
    #[must_use]
    pub const fn result(&self) -> Option<MemoryResult> {
        self.result
    }

    /// Whether all pairs are found.
    #[must_use]
    pub const fn is_won(&self) -> bool {
        self.result.is_some()
    }
}
