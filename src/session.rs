use std::io::{BufRead, Write};

use anyhow::{Context, Result, bail};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use tracing::info;

use crate::engine::{self, EngineConfig, Outcome};
use crate::grid::Grid;
use crate::map::generate_map;

const BOARD_PROMPT: &str = "Board Size and Seed: ";
const REPLAY_PROMPT: &str = "Would you like to play again? ";
const YES: &str = "yes";

/// True if the player asked for another round.
pub fn wants_replay(answer: &str) -> bool {
    answer.trim_end_matches(['\r', '\n']).to_lowercase() == YES
}

/// Parse a `"<board size> <seed>"` line. Tokens past the second are ignored.
///
/// Negative seeds are accepted and reinterpreted bit for bit as `u64`.
pub fn parse_board(line: &str) -> Result<(usize, u64)> {
    let mut tokens = line.split_whitespace();
    let size = tokens.next().context("missing board size")?;
    let seed = tokens.next().context("missing seed")?;
    let size: usize = size
        .parse()
        .with_context(|| format!("invalid board size `{size}`"))?;
    let seed: i64 = seed
        .parse()
        .with_context(|| format!("invalid seed `{seed}`"))?;
    if size < 2 {
        bail!("board size must be at least 2, got {size}");
    }
    Ok((size, seed as u64))
}

/// The interactive loop: ask for a board, draw it, play it, offer another.
///
/// Dice come from their own generator, independent of the map seed.
pub struct Session<R, W> {
    input: R,
    output: W,
    config: EngineConfig,
    dice: SmallRng,
}

impl<R: BufRead, W: Write> Session<R, W> {
    pub fn new(input: R, output: W, config: EngineConfig) -> Self {
        Self {
            input,
            output,
            config,
            dice: SmallRng::from_entropy(),
        }
    }

    /// Replace the dice generator, e.g. with a seeded one.
    pub fn with_dice(mut self, dice: SmallRng) -> Self {
        self.dice = dice;
        self
    }

    /// Print `text` and read one line. `None` at end of input.
    fn prompt(&mut self, text: &str) -> Result<Option<String>> {
        write!(self.output, "{text}")?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line))
    }

    /// Render and play one board, writing the grid and the trace.
    pub fn play_round(&mut self, board_size: usize, seed: u64) -> Result<Outcome> {
        let map = generate_map(board_size, seed)?;
        writeln!(self.output, "{}", Grid::for_map(&map))?;

        let output = &mut self.output;
        let mut write_error = None;
        let outcome = engine::play(&map, self.config, &mut self.dice, |trace| {
            if write_error.is_none() {
                if let Err(e) = writeln!(output, "{trace}") {
                    write_error = Some(e);
                }
            }
        });
        if let Some(e) = write_error {
            return Err(e).context("writing game trace");
        }
        let outcome = outcome?;
        writeln!(self.output, "{outcome}")?;
        Ok(outcome)
    }

    /// Run rounds until the player declines or input ends. Returns the number
    /// of rounds played.
    pub fn run(&mut self) -> Result<usize> {
        let mut rounds = 0;
        loop {
            let Some(line) = self.prompt(BOARD_PROMPT)? else {
                break;
            };
            let (board_size, seed) = parse_board(&line)?;
            info!(board_size, seed, round = rounds + 1, "starting round");
            self.play_round(board_size, seed)?;
            rounds += 1;

            match self.prompt(REPLAY_PROMPT)? {
                Some(answer) if wants_replay(&answer) => continue,
                _ => break,
            }
        }
        Ok(rounds)
    }
}
