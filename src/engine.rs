use std::fmt;

use rand::Rng;
use tracing::{debug, warn};

use crate::error::EngineError;
use crate::instruction::{Instruction, Opcode, Score};
use crate::map::Map;

pub const DICE_SIDES: u8 = 6;

/// Roll one die, uniform in `1..=DICE_SIDES`.
pub fn roll_dice<R: Rng + ?Sized>(rng: &mut R) -> u8 {
    rng.gen_range(1..=DICE_SIDES)
}

/// Move `roll` cells forward on a circular board of `len` cells.
pub fn advance(position: usize, roll: u8, len: usize) -> usize {
    (position + usize::from(roll)) % len
}

/// Engine knobs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineConfig {
    /// Longest jump chain a single turn may follow. `None` follows chains
    /// forever, so a jump cycle never returns.
    pub hop_limit: Option<usize>,
}

/// One line of the play-by-play.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trace {
    /// The token sat on a jump at `position` and is about to follow it.
    Hop {
        position: usize,
        score: Score,
        roll: u8,
    },
    /// The turn resolved `instruction` at `position`, leaving `score`.
    Turn {
        position: usize,
        score: Score,
        instruction: Instruction,
        roll: u8,
    },
}

impl fmt::Display for Trace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (position, score, opcode, roll) = match *self {
            Trace::Hop {
                position,
                score,
                roll,
            } => (position, score, Opcode::Jmp, roll),
            Trace::Turn {
                position,
                score,
                instruction,
                roll,
            } => (position, score, instruction.opcode(), roll),
        };
        write!(
            f,
            "Pos: {position} Score: {score}, instruction {opcode} Rolled: {roll}"
        )
    }
}

/// Where a finished game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    pub position: usize,
    pub score: Score,
    pub instruction: Instruction,
    pub turns: usize,
    pub hops: usize,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Final Pos: {} Final Score: {}, Instruction {}",
            self.position,
            self.score,
            self.instruction.opcode()
        )
    }
}

/// A single play-through on a borrowed map.
///
/// The token starts on cell 0 with a score of 0. Each call to
/// [`Game::take_turn`] moves it by one roll, follows any jump chain, then
/// applies the instruction it stops on. The game is over once a `hlt` has been
/// resolved; further turns are ignored.
#[derive(Debug, Clone)]
pub struct Game<'m> {
    map: &'m Map,
    config: EngineConfig,
    position: usize,
    score: Score,
    turns: usize,
    hops: usize,
    last: Instruction,
    halted: bool,
}

impl<'m> Game<'m> {
    pub fn new(map: &'m Map, config: EngineConfig) -> Self {
        Self {
            map,
            config,
            position: 0,
            score: 0,
            turns: 0,
            hops: 0,
            last: map[0],
            halted: false,
        }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn score(&self) -> Score {
        self.score
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    pub fn turns(&self) -> usize {
        self.turns
    }

    /// Jumps followed so far, across all turns.
    pub fn hops(&self) -> usize {
        self.hops
    }

    /// Play one turn with the given die value, reporting every resolution to
    /// `trace`. Returns the instruction the token stopped on.
    pub fn take_turn<F>(&mut self, roll: u8, mut trace: F) -> Result<Instruction, EngineError>
    where
        F: FnMut(&Trace),
    {
        if self.halted {
            return Ok(self.last);
        }

        let len = self.map.len();
        self.turns += 1;
        self.position = advance(self.position, roll, len);

        let mut chain = 0usize;
        let mut instruction = self.map[self.position];
        while let Instruction::Jmp(target) = instruction {
            if self.config.hop_limit.is_some_and(|limit| chain >= limit) {
                warn!(position = self.position, hops = chain, "jump chain cut off");
                return Err(EngineError::JumpCycle {
                    position: self.position,
                    hops: chain,
                });
            }
            trace(&Trace::Hop {
                position: self.position,
                score: self.score,
                roll,
            });
            chain += 1;
            self.hops += 1;
            // Jump targets are absolute; `Map` guarantees they are in range.
            self.position = target;
            instruction = self.map[self.position];
        }

        let score = instruction.apply(self.score);
        if score != self.score && (score == Score::MAX || score == Score::MIN) {
            warn!(position = self.position, "score saturated");
        }
        self.score = score;
        self.halted = instruction.is_halt();
        self.last = instruction;

        trace(&Trace::Turn {
            position: self.position,
            score: self.score,
            instruction,
            roll,
        });
        Ok(instruction)
    }

    /// The final state, once the game has halted.
    pub fn outcome(&self) -> Option<Outcome> {
        self.halted.then(|| Outcome {
            position: self.position,
            score: self.score,
            instruction: self.last,
            turns: self.turns,
            hops: self.hops,
        })
    }
}

/// Roll `dice` until the token resolves a `hlt`.
///
/// Without a hop limit this never returns on a map whose jump chain from the
/// landed cell loops.
pub fn play<R, F>(
    map: &Map,
    config: EngineConfig,
    dice: &mut R,
    mut trace: F,
) -> Result<Outcome, EngineError>
where
    R: Rng + ?Sized,
    F: FnMut(&Trace),
{
    let mut game = Game::new(map, config);
    loop {
        let roll = roll_dice(dice);
        game.take_turn(roll, &mut trace)?;
        if let Some(outcome) = game.outcome() {
            debug!(
                turns = outcome.turns,
                hops = outcome.hops,
                score = %outcome.score,
                "game over"
            );
            return Ok(outcome);
        }
    }
}
