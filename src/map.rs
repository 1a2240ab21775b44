use std::fmt;
use std::ops::Index;
use std::str::FromStr;

use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::error::MapError;
use crate::instruction::{Instruction, Opcode};

/// Relative odds of each interior cell, in `Opcode::ALL` order
/// (nop, add, sub, mul, jmp, hlt).
pub const OPCODE_WEIGHTS: [u32; 6] = [5, 2, 2, 2, 3, 1];

/// Inclusive range of generated `add`/`sub`/`mul` operands.
pub const MIN_OPERAND: u32 = 1;
pub const MAX_OPERAND: u32 = 100;

/// An immutable board: `nop` first, `hlt` last, every jump in range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Map {
    cells: Vec<Instruction>,
}

impl Map {
    /// Build a map from explicit cells, checking the board invariants.
    pub fn new(cells: Vec<Instruction>) -> Result<Self, MapError> {
        let len = cells.len();
        if len < 2 {
            return Err(MapError::TooShort(len));
        }
        if cells[0] != Instruction::Nop {
            return Err(MapError::BadStart(cells[0].to_string()));
        }
        if cells[len - 1] != Instruction::Hlt {
            return Err(MapError::BadEnd(cells[len - 1].to_string()));
        }
        for (position, cell) in cells.iter().enumerate() {
            if let Instruction::Jmp(target) = *cell {
                if target >= len {
                    return Err(MapError::JumpOutOfRange {
                        position,
                        target,
                        len,
                    });
                }
            }
        }
        Ok(Self { cells })
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Always false: a valid map has at least two cells.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn get(&self, position: usize) -> Option<Instruction> {
        self.cells.get(position).copied()
    }

    pub fn cells(&self) -> &[Instruction] {
        &self.cells
    }

    pub fn iter(&self) -> impl Iterator<Item = Instruction> + '_ {
        self.cells.iter().copied()
    }
}

impl Index<usize> for Map {
    type Output = Instruction;

    fn index(&self, position: usize) -> &Instruction {
        &self.cells[position]
    }
}

/// Comma-separated cell list, e.g. `nop, jmp 0, hlt`.
impl fmt::Display for Map {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, cell) in self.cells.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{cell}")?;
        }
        Ok(())
    }
}

impl FromStr for Map {
    type Err = MapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let cells = s
            .split(',')
            .enumerate()
            .map(|(position, cell)| {
                cell.parse::<Instruction>()
                    .map_err(|source| MapError::Parse { position, source })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Map::new(cells)
    }
}

/// Draws random maps from its own generator.
///
/// Seeding happens once at construction, so consecutive maps from one
/// generator differ while two generators built from the same non-zero seed
/// produce the same sequence of maps.
pub struct MapGenerator {
    rng: SmallRng,
    seed: u64,
    opcodes: WeightedIndex<u32>,
}

/// Categorical distribution over `Opcode::ALL` with the given weights.
fn opcode_distribution(weights: &[u32]) -> Result<WeightedIndex<u32>, MapError> {
    Ok(WeightedIndex::new(weights)?)
}

impl MapGenerator {
    /// A seed of 0 draws the generator state from OS entropy.
    pub fn new(seed: u64) -> Result<Self, MapError> {
        let rng = if seed == 0 {
            SmallRng::from_entropy()
        } else {
            SmallRng::seed_from_u64(seed)
        };
        Ok(Self {
            rng,
            seed,
            opcodes: opcode_distribution(&OPCODE_WEIGHTS)?,
        })
    }

    /// Generate a `length`-cell map: `nop`, `length - 2` weighted random
    /// cells, `hlt`.
    pub fn generate(&mut self, length: usize) -> Result<Map, MapError> {
        if length < 2 {
            return Err(MapError::TooShort(length));
        }

        let mut cells = Vec::with_capacity(length);
        cells.push(Instruction::Nop);
        for _ in 0..length - 2 {
            // Both operands are drawn for every cell, whatever the opcode.
            let points = self.rng.gen_range(MIN_OPERAND..=MAX_OPERAND);
            let target = self.rng.gen_range(0..length);
            let cell = match Opcode::ALL[self.opcodes.sample(&mut self.rng)] {
                Opcode::Nop => Instruction::Nop,
                Opcode::Add => Instruction::Add(points),
                Opcode::Sub => Instruction::Sub(points),
                Opcode::Mul => Instruction::Mul(points),
                Opcode::Jmp => Instruction::Jmp(target),
                Opcode::Hlt => Instruction::Hlt,
            };
            cells.push(cell);
        }
        cells.push(Instruction::Hlt);

        debug!(length, seed = self.seed, "generated map");
        Map::new(cells)
    }
}

/// Generate a map of `length` cells. A non-zero `seed` makes the result
/// reproducible; 0 uses fresh entropy.
pub fn generate_map(length: usize, seed: u64) -> Result<Map, MapError> {
    MapGenerator::new(seed)?.generate(length)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::distributions::WeightedError;

    #[test]
    fn test_seed_42_fixture() {
        let map = generate_map(5, 42).unwrap();
        assert_eq!(
            map.cells(),
            &[
                Instruction::Nop,
                Instruction::Mul(31),
                Instruction::Add(16),
                Instruction::Nop,
                Instruction::Hlt,
            ]
        );
    }

    #[test]
    fn test_deterministic_with_seed() {
        assert_eq!(generate_map(40, 7).unwrap(), generate_map(40, 7).unwrap());
    }

    #[test]
    fn test_different_seeds_differ() {
        assert_ne!(generate_map(64, 1).unwrap(), generate_map(64, 2).unwrap());
    }

    #[test]
    fn test_minimal_map() {
        let map = generate_map(2, 9).unwrap();
        assert_eq!(map.cells(), &[Instruction::Nop, Instruction::Hlt]);
    }

    #[test]
    fn test_too_short() {
        assert_eq!(generate_map(1, 3), Err(MapError::TooShort(1)));
        assert_eq!(generate_map(0, 0), Err(MapError::TooShort(0)));
    }

    #[test]
    fn test_unseeded_map_shape() {
        let map = generate_map(30, 0).unwrap();
        assert_eq!(map.len(), 30);
        assert_eq!(map[0], Instruction::Nop);
        assert_eq!(map[29], Instruction::Hlt);
    }

    #[test]
    fn test_generator_sequence_reproducible() {
        let mut a = MapGenerator::new(11).unwrap();
        let mut b = MapGenerator::new(11).unwrap();
        let first = a.generate(20).unwrap();
        assert_eq!(first, b.generate(20).unwrap());
        assert_eq!(a.generate(20).unwrap(), b.generate(20).unwrap());
    }

    #[test]
    fn test_generate_map_is_one_generator_pass() {
        let mut generator = MapGenerator::new(42).unwrap();
        assert_eq!(generator.seed, 42);
        assert_eq!(generator.generate(5).unwrap(), generate_map(5, 42).unwrap());
    }

    #[test]
    fn test_opcode_distribution_rejects_bad_weights() {
        assert!(opcode_distribution(&OPCODE_WEIGHTS).is_ok());
        assert_eq!(
            opcode_distribution(&[0; 6]).unwrap_err(),
            MapError::Weights(WeightedError::AllWeightsZero)
        );
        assert_eq!(
            opcode_distribution(&[]).unwrap_err(),
            MapError::Weights(WeightedError::NoItem)
        );
    }

    #[test]
    fn test_operands_in_range() {
        let map = generate_map(500, 123).unwrap();
        for cell in map.iter() {
            match cell {
                Instruction::Add(n) | Instruction::Sub(n) | Instruction::Mul(n) => {
                    assert!((MIN_OPERAND..=MAX_OPERAND).contains(&n));
                }
                Instruction::Jmp(target) => assert!(target < map.len()),
                Instruction::Nop | Instruction::Hlt => {}
            }
        }
    }

    #[test]
    fn test_every_opcode_appears() {
        let map = generate_map(1000, 5).unwrap();
        for op in Opcode::ALL {
            assert!(map.iter().any(|c| c.opcode() == op), "missing {op}");
        }
    }

    #[test]
    fn test_parse_and_display() {
        let map: Map = "nop, jmp 0, hlt".parse().unwrap();
        assert_eq!(
            map.cells(),
            &[Instruction::Nop, Instruction::Jmp(0), Instruction::Hlt]
        );
        assert_eq!(map.to_string(), "nop, jmp 0, hlt");
    }

    #[test]
    fn test_invariant_violations() {
        assert_eq!(
            "add 1, hlt".parse::<Map>(),
            Err(MapError::BadStart("add 1".into()))
        );
        assert_eq!(
            "nop, nop".parse::<Map>(),
            Err(MapError::BadEnd("nop".into()))
        );
        assert_eq!(
            "nop, jmp 3, hlt".parse::<Map>(),
            Err(MapError::JumpOutOfRange {
                position: 1,
                target: 3,
                len: 3,
            })
        );
        assert!(matches!(
            "nop, bogus, hlt".parse::<Map>(),
            Err(MapError::Parse { position: 1, .. })
        ));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn generated_maps_keep_shape(length in 2usize..300, seed in any::<u64>()) {
            let map = generate_map(length, seed).unwrap();
            prop_assert_eq!(map.len(), length);
            prop_assert_eq!(map[0], Instruction::Nop);
            prop_assert_eq!(map[length - 1], Instruction::Hlt);
        }

        #[test]
        fn seeded_generation_is_deterministic(length in 2usize..300, seed in 1u64..) {
            prop_assert_eq!(generate_map(length, seed).unwrap(), generate_map(length, seed).unwrap());
        }
    }
}
