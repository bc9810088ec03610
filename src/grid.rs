//! Fixed-size cell buffer with a boundary policy.
//!
//! Cells are stored one byte per cell (0 or 1), row-major. The byte buffer
//! doubles as the export format.

use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::orbit::Pattern;

/// How neighbor lookups past the edge are resolved.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Boundary {
    /// Row and column indices wrap modulo the grid dimensions.
    #[default]
    Toroidal,
    /// Everything outside the grid reads as dead.
    DeadBorder,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    rows: usize,
    cols: usize,
    boundary: Boundary,
    cells: Vec<u8>,
}

impl Grid {
    pub fn new(rows: usize, cols: usize, boundary: Boundary) -> Result<Self> {
        if rows == 0 || cols == 0 {
            return Err(Error::InvalidGridDimensions { rows, cols });
        }
        Ok(Self {
            rows,
            cols,
            boundary,
            cells: vec![0; rows * cols],
        })
    }

    /// A 3x3 dead-border grid holding `pattern`, so that
    /// `Grid::from_pattern(p).pattern_at(1, 1) == p`.
    pub fn from_pattern(pattern: Pattern) -> Self {
        let cells = pattern
            .to_cells()
            .iter()
            .flatten()
            .map(|&alive| u8::from(alive))
            .collect();
        Self {
            rows: 3,
            cols: 3,
            boundary: Boundary::DeadBorder,
            cells,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn boundary(&self) -> Boundary {
        self.boundary
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    #[inline(always)]
    fn offset(&self, row: usize, col: usize) -> usize {
        assert!(
            row < self.rows && col < self.cols,
            "cell ({row},{col}) outside {}x{} grid",
            self.rows,
            self.cols
        );
        row * self.cols + col
    }

    /// # Panics
    /// If `(row, col)` is outside the grid.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> bool {
        self.cells[self.offset(row, col)] != 0
    }

    /// # Panics
    /// If `(row, col)` is outside the grid.
    #[inline]
    pub fn set(&mut self, row: usize, col: usize, alive: bool) {
        let i = self.offset(row, col);
        self.cells[i] = u8::from(alive);
    }

    /// Set every cell alive independently with probability `density / 100`.
    pub fn random_seed<R: Rng>(&mut self, density: u8, rng: &mut R) -> Result<()> {
        if density > 100 {
            return Err(Error::InvalidDensity(density));
        }
        for cell in &mut self.cells {
            *cell = u8::from(rng.random_ratio(u32::from(density), 100));
        }
        Ok(())
    }

    /// `random_seed` driven by a `StdRng` seeded from `seed`.
    pub fn seed_random(&mut self, density: u8, seed: u64) -> Result<()> {
        let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
        self.random_seed(density, &mut rng)
    }

    pub fn clear(&mut self) {
        self.fill(false);
    }

    pub fn fill(&mut self, alive: bool) {
        self.cells.fill(u8::from(alive));
    }

    pub fn population(&self) -> usize {
        self.cells.iter().filter(|&&c| c != 0).count()
    }

    pub fn for_each_live<F: FnMut(usize, usize)>(&self, mut f: F) {
        for (i, _) in self.cells.iter().enumerate().filter(|&(_, &c)| c != 0) {
            f(i / self.cols, i % self.cols);
        }
    }

    /// One byte per cell, row-major.
    pub fn as_bytes(&self) -> &[u8] {
        &self.cells
    }

    /// `#` for live cells, `.` for dead, one line per row.
    pub fn to_text(&self) -> String {
        let mut out = String::with_capacity(self.rows * (self.cols + 1));
        for row in self.cells.chunks(self.cols) {
            out.extend(row.iter().map(|&c| if c != 0 { '#' } else { '.' }));
            out.push('\n');
        }
        out
    }

    /// First differing cell in row-major order. Grids of different shape
    /// or boundary differ at `(0, 0)`.
    pub fn first_difference(&self, other: &Grid) -> Option<(usize, usize)> {
        if self.rows != other.rows || self.cols != other.cols || self.boundary != other.boundary {
            return Some((0, 0));
        }
        self.cells
            .iter()
            .zip(&other.cells)
            .position(|(a, b)| a != b)
            .map(|i| (i / self.cols, i % self.cols))
    }

    /// Neighbor read with the boundary policy applied.
    #[inline(always)]
    fn sample(&self, row: isize, col: isize) -> u16 {
        let (rows, cols) = (self.rows as isize, self.cols as isize);
        let (row, col) = match self.boundary {
            Boundary::Toroidal => (row.rem_euclid(rows), col.rem_euclid(cols)),
            Boundary::DeadBorder => {
                if row < 0 || row >= rows || col < 0 || col >= cols {
                    return 0;
                }
                (row, col)
            }
        };
        u16::from(self.cells[row as usize * self.cols + col as usize])
    }

    /// Encode the 3x3 neighborhood centred on `(row, col)`: bit `dr * 3 + dc`
    /// holds the cell at offset `(dr - 1, dc - 1)`.
    #[inline]
    pub fn pattern_at(&self, row: usize, col: usize) -> Pattern {
        assert!(
            row < self.rows && col < self.cols,
            "cell ({row}, {col}) outside {}x{} grid",
            self.rows,
            self.cols
        );
        let mut bits = 0u16;
        if row > 0 && row + 1 < self.rows && col > 0 && col + 1 < self.cols {
            for dr in 0..3 {
                let base = (row + dr - 1) * self.cols + col - 1;
                let line = &self.cells[base..base + 3];
                for (dc, &cell) in line.iter().enumerate() {
                    bits |= u16::from(cell) << (dr * 3 + dc);
                }
            }
        } else {
            for dr in 0..3 {
                for dc in 0..3 {
                    let cell = self.sample(row as isize + dr - 1, col as isize + dc - 1);
                    bits |= cell << (dr * 3 + dc);
                }
            }
        }
        Pattern::from_bits_truncate(bits)
    }

    /// Match `template`'s shape and boundary, reallocating only on a shape change.
    pub(crate) fn reshape_like(&mut self, template: &Grid) {
        self.rows = template.rows;
        self.cols = template.cols;
        self.boundary = template.boundary;
        self.cells.resize(template.cells.len(), 0);
    }

    pub(crate) fn cells_mut(&mut self) -> &mut [u8] {
        &mut self.cells
    }
}
