use std::fmt;

use rand::SeedableRng;
use rand::rngs::SmallRng;
use rayon::prelude::*;
use tracing::info;

use crate::engine::{EngineConfig, Game, roll_dice};
use crate::error::{EngineError, MapError};
use crate::instruction::Score;
use crate::map::{Map, generate_map};

/// Configuration for a batch of non-interactive games on one board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchConfig {
    /// Number of games to play.
    pub games: usize,
    /// Cells on the board.
    pub board_size: usize,
    /// Map seed (0 for entropy).
    pub seed: u64,
    /// Base seed for dice; game `i` uses `dice_seed + i`. `None` rolls from
    /// entropy.
    pub dice_seed: Option<u64>,
    /// Longest jump chain followed before a game is scored as a cycle.
    pub hop_limit: usize,
    /// Turns played before a game that never reaches `hlt` is cut off.
    pub turn_limit: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            games: 1000,
            board_size: 36,
            seed: 0,
            dice_seed: None,
            hop_limit: 10_000,
            turn_limit: 100_000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameResult {
    /// Reached a `hlt`.
    Halted,
    /// Cut off in a jump chain longer than the hop limit.
    Cycle,
    /// Still running after the turn limit.
    TurnLimit,
}

impl fmt::Display for GameResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            GameResult::Halted => "halted",
            GameResult::Cycle => "cycle",
            GameResult::TurnLimit => "turn_limit",
        })
    }
}

/// How one game of a batch went.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameSummary {
    pub game: usize,
    pub turns: usize,
    pub hops: usize,
    pub score: Score,
    pub position: usize,
    pub result: GameResult,
}

impl GameSummary {
    pub const CSV_HEADER: &'static str = "game,turns,hops,score,position,result";
}

/// One CSV row, matching [`GameSummary::CSV_HEADER`].
impl fmt::Display for GameSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{},{},{}",
            self.game, self.turns, self.hops, self.score, self.position, self.result
        )
    }
}

/// Results of a batch, in game order.
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub map: Map,
    pub games: Vec<GameSummary>,
}

impl BatchReport {
    pub fn halted(&self) -> usize {
        self.count(GameResult::Halted)
    }

    pub fn cycles(&self) -> usize {
        self.count(GameResult::Cycle)
    }

    pub fn turn_limited(&self) -> usize {
        self.count(GameResult::TurnLimit)
    }

    fn count(&self, result: GameResult) -> usize {
        self.games.iter().filter(|g| g.result == result).count()
    }

    /// Mean number of turns over all games (0.0 for an empty batch).
    pub fn mean_turns(&self) -> f64 {
        if self.games.is_empty() {
            return 0.0;
        }
        let total: usize = self.games.iter().map(|g| g.turns).sum();
        total as f64 / self.games.len() as f64
    }

    /// Lowest and highest final score among halted games.
    pub fn score_range(&self) -> Option<(Score, Score)> {
        let mut scores = self
            .games
            .iter()
            .filter(|g| g.result == GameResult::Halted)
            .map(|g| g.score);
        let first = scores.next()?;
        Some(scores.fold((first, first), |(lo, hi), s| (lo.min(s), hi.max(s))))
    }
}

/// Play one game to a halt, a cut-off jump chain, or `turn_limit` turns.
fn play_one(
    map: &Map,
    config: EngineConfig,
    turn_limit: usize,
    dice: &mut SmallRng,
    game: usize,
) -> GameSummary {
    let mut state = Game::new(map, config);
    let result = loop {
        if state.turns() >= turn_limit {
            break GameResult::TurnLimit;
        }
        let roll = roll_dice(dice);
        match state.take_turn(roll, |_| {}) {
            Ok(_) if state.is_halted() => break GameResult::Halted,
            Ok(_) => {}
            Err(EngineError::JumpCycle { .. }) => break GameResult::Cycle,
        }
    };
    GameSummary {
        game,
        turns: state.turns(),
        hops: state.hops(),
        score: state.score(),
        position: state.position(),
        result,
    }
}

/// Play `config.games` independent games on `map` in parallel, using the
/// dice seed and limits from `config`.
pub fn play_games(map: &Map, config: &BatchConfig) -> Vec<GameSummary> {
    let engine = EngineConfig {
        hop_limit: Some(config.hop_limit),
    };
    let turn_limit = config.turn_limit;
    (0..config.games)
        .into_par_iter()
        .map(|game| {
            let mut dice = match config.dice_seed {
                Some(seed) => SmallRng::seed_from_u64(seed.wrapping_add(game as u64)),
                None => SmallRng::from_entropy(),
            };
            play_one(map, engine, turn_limit, &mut dice, game)
        })
        .collect()
}

/// Generate the board described by `config` and play the whole batch on it.
pub fn run_batch(config: &BatchConfig) -> Result<BatchReport, MapError> {
    let map = generate_map(config.board_size, config.seed)?;
    info!(
        games = config.games,
        board_size = config.board_size,
        seed = config.seed,
        "running batch"
    );
    let games = play_games(&map, config);
    Ok(BatchReport { map, games })
}
