use std::fmt;

use crate::map::Map;

/// Character columns per cell, including the left border.
pub const CELL_WIDTH: usize = 8;
/// Character rows per cell, including the top border.
pub const CELL_HEIGHT: usize = 3;

const BORDER: char = '*';

/// A text rendering of a board laid out as a snake of boxed cells.
///
/// Cell 0 is the top-left corner. Even row-bands run left to right, odd
/// row-bands right to left, so consecutive indices are always adjacent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    rows: Vec<Vec<char>>,
    columns: usize,
    bands: usize,
}

/// Cells per row-band for a board of `table_size` cells: `ceil(sqrt(n))`.
pub fn side_length(table_size: usize) -> usize {
    let mut side = (table_size as f64).sqrt() as usize;
    while side * side < table_size {
        side += 1;
    }
    while side > 0 && (side - 1) * (side - 1) >= table_size {
        side -= 1;
    }
    side
}

/// Number of row-bands: one per column, less one when the last band would
/// be empty.
pub fn band_count(table_size: usize) -> usize {
    let side = side_length(table_size);
    if side > 0 && side * (side - 1) >= table_size {
        side - 1
    } else {
        side
    }
}

/// An empty boxed grid big enough for `table_size` cells.
pub fn make_grid(table_size: usize) -> Grid {
    let columns = side_length(table_size);
    let bands = band_count(table_size);
    let width = CELL_WIDTH * columns + 1;
    let height = CELL_HEIGHT * bands + 1;

    let rows = (0..height)
        .map(|i| {
            (0..width)
                .map(|j| {
                    if i % CELL_HEIGHT == 0 || j % CELL_WIDTH == 0 {
                        BORDER
                    } else {
                        ' '
                    }
                })
                .collect()
        })
        .collect();

    Grid {
        rows,
        columns,
        bands,
    }
}

/// Top-left interior character (row, column) of logical cell `index`.
fn cell_origin(table_size: usize, index: usize) -> (usize, usize) {
    let side = side_length(table_size);
    if side == 0 {
        return (1, 1);
    }
    let band = index / side;
    let col = index % side;
    let col_start = if band % 2 == 0 {
        CELL_WIDTH * col
    } else {
        CELL_WIDTH * (side - col - 1)
    };
    (CELL_HEIGHT * band + 1, col_start + 1)
}

/// Write `text` into cell `index`, one line per interior row.
///
/// Nothing is clipped to the cell: a line longer than `CELL_WIDTH - 1` or more
/// than `CELL_HEIGHT - 1` lines spills into the neighbouring cells. Characters
/// that would land outside the grid are dropped.
pub fn fill_cell(grid: &mut Grid, table_size: usize, index: usize, text: &str) {
    let (row0, col0) = cell_origin(table_size, index);
    for (r, line) in text.split('\n').enumerate() {
        let Some(row) = grid.rows.get_mut(row0 + r) else {
            break;
        };
        for (k, c) in line.chars().enumerate() {
            if let Some(slot) = row.get_mut(col0 + k) {
                *slot = c;
            }
        }
    }
}

impl Grid {
    /// A grid with every cell labelled `"{index}\n{instruction}"`.
    pub fn for_map(map: &Map) -> Self {
        let size = map.len();
        let mut grid = make_grid(size);
        for (i, cell) in map.iter().enumerate() {
            fill_cell(&mut grid, size, i, &format!("{i}\n{cell}"));
        }
        grid
    }

    /// Cells per row-band.
    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn bands(&self) -> usize {
        self.bands
    }

    /// Width in characters.
    pub fn width(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    /// Height in characters.
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn row(&self, i: usize) -> Option<String> {
        self.rows.get(i).map(|r| r.iter().collect())
    }

    /// Interior rows of cell `index` with trailing padding removed.
    pub fn cell_lines(&self, table_size: usize, index: usize) -> Vec<String> {
        let (row0, col0) = cell_origin(table_size, index);
        (row0..row0 + CELL_HEIGHT - 1)
            .filter_map(|r| self.rows.get(r))
            .map(|row| {
                let end = (col0 + CELL_WIDTH - 1).min(row.len());
                let start = col0.min(end);
                row[start..end].iter().collect::<String>().trim_end().to_string()
            })
            .collect()
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, row) in self.rows.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            for &c in row {
                write!(f, "{c}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_length() {
        assert_eq!(side_length(0), 0);
        assert_eq!(side_length(1), 1);
        assert_eq!(side_length(4), 2);
        assert_eq!(side_length(5), 3);
        assert_eq!(side_length(9), 3);
        assert_eq!(side_length(10), 4);
        assert_eq!(side_length(1_000_001), 1001);
    }

    #[test]
    fn test_band_correction() {
        // 6 cells fit in 3x2, so the third band is dropped.
        assert_eq!(band_count(6), 2);
        assert_eq!(band_count(7), 3);
        assert_eq!(band_count(2), 1);
        assert_eq!(band_count(9), 3);
    }

    #[test]
    fn test_empty_grid_layout() {
        let grid = make_grid(4);
        let rendered = grid.to_string();
        let expected = [
            "*****************",
            "*       *       *",
            "*       *       *",
            "*****************",
            "*       *       *",
            "*       *       *",
            "*****************",
        ]
        .join("\n");
        assert_eq!(rendered, expected);
    }

    #[test]
    fn test_grid_dimensions() {
        let grid = make_grid(10);
        assert_eq!(grid.columns(), 4);
        assert_eq!(grid.bands(), 3);
        assert_eq!(grid.width(), 33);
        assert_eq!(grid.height(), 10);
    }

    #[test]
    fn test_snake_order() {
        let mut grid = make_grid(4);
        for i in 0..4 {
            fill_cell(&mut grid, 4, i, &i.to_string());
        }
        assert_eq!(grid.row(1).unwrap(), "*0      *1      *");
        assert_eq!(grid.row(4).unwrap(), "*3      *2      *");
    }

    #[test]
    fn test_fill_two_lines() {
        let mut grid = make_grid(5);
        fill_cell(&mut grid, 5, 4, "4\njmp 12");
        // Cell 4 is the middle of the reversed second band.
        assert_eq!(grid.row(4).unwrap(), "*       *4      *       *");
        assert_eq!(grid.row(5).unwrap(), "*       *jmp 12 *       *");
        assert_eq!(grid.cell_lines(5, 4), vec!["4", "jmp 12"]);
    }

    #[test]
    fn test_overflow_spills_into_neighbour() {
        let mut grid = make_grid(4);
        fill_cell(&mut grid, 4, 0, "abcdefghij");
        assert_eq!(grid.row(1).unwrap(), "*abcdefghij     *");
    }

    #[test]
    fn test_out_of_range_writes_are_dropped() {
        let mut grid = make_grid(4);
        let before = grid.clone();
        fill_cell(&mut grid, 4, 40, "x");
        assert_eq!(grid, before);
        fill_cell(&mut grid, 4, 1, "0123456789abcdef");
        assert_eq!(grid.width(), before.width());
    }

    #[test]
    fn test_for_map() {
        let map: Map = "nop, add 5, jmp 0, hlt".parse().unwrap();
        let grid = Grid::for_map(&map);
        assert_eq!(grid.cell_lines(4, 0), vec!["0", "nop"]);
        assert_eq!(grid.cell_lines(4, 1), vec!["1", "add 5"]);
        assert_eq!(grid.cell_lines(4, 2), vec!["2", "jmp 0"]);
        assert_eq!(grid.cell_lines(4, 3), vec!["3", "hlt"]);
        assert_eq!(grid.row(2).unwrap(), "*nop    *add 5  *");
        assert_eq!(grid.row(5).unwrap(), "*hlt    *jmp 0  *");
    }
}
