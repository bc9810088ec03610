//! 9-bit encoding of a 3x3 binary neighborhood.
//!
//! Bit `i` holds the cell at row `i / 3`, column `i % 3` (row-major, top-left
//! is bit 0). A single clockwise quarter turn moves `(r, c)` to `(c, 2 - r)`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Number of distinct 3x3 neighborhoods.
pub const PATTERN_COUNT: usize = 512;

pub const SIDE: usize = 3;

const CENTER_BIT: u16 = 1 << 4;
const PATTERN_MASK: u16 = (PATTERN_COUNT - 1) as u16;

/// Destination bit of each source bit under one clockwise quarter turn.
const ROTATE_CW: [u8; 9] = [2, 5, 8, 1, 4, 7, 0, 3, 6];

const ROTATION_LUT: [u16; PATTERN_COUNT] = build_rotation_lut();

const fn build_rotation_lut() -> [u16; PATTERN_COUNT] {
    let mut lut = [0u16; PATTERN_COUNT];
    let mut pattern = 0;
    while pattern < PATTERN_COUNT {
        let mut rotated = 0u16;
        let mut bit = 0;
        while bit < 9 {
            if (pattern >> bit) & 1 == 1 {
                rotated |= 1 << ROTATE_CW[bit];
            }
            bit += 1;
        }
        lut[pattern] = rotated;
        pattern += 1;
    }
    lut
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct Pattern(u16);

impl Pattern {
    pub const EMPTY: Pattern = Pattern(0);
    pub const FULL: Pattern = Pattern(PATTERN_MASK);

    /// Validate a raw value. Anything outside `0..512` is an `InvalidPattern` fault.
    pub fn new(bits: u16) -> Result<Self> {
        if bits as usize >= PATTERN_COUNT {
            return Err(Error::InvalidPattern(bits as u32));
        }
        Ok(Self(bits))
    }

    /// Build from the low 9 bits; higher bits are dropped.
    #[inline(always)]
    pub(crate) const fn from_bits_truncate(bits: u16) -> Self {
        Self(bits & PATTERN_MASK)
    }

    /// Every pattern in ascending order.
    pub fn all() -> impl Iterator<Item = Pattern> + Clone {
        (0..PATTERN_COUNT as u16).map(Pattern)
    }

    #[inline(always)]
    pub const fn bits(self) -> u16 {
        self.0
    }

    #[inline(always)]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Whether the cell at `(row, col)` of the neighborhood is alive.
    ///
    /// # Panics
    /// If `row` or `col` is 3 or more.
    #[inline]
    pub fn cell(self, row: usize, col: usize) -> bool {
        assert!(row < SIDE && col < SIDE, "cell ({row},{col}) outside 3x3");
        (self.0 >> (row * SIDE + col)) & 1 == 1
    }

    pub fn from_cells(cells: [[bool; SIDE]; SIDE]) -> Self {
        let mut bits = 0u16;
        for (row, line) in cells.iter().enumerate() {
            for (col, &alive) in line.iter().enumerate() {
                if alive {
                    bits |= 1 << (row * SIDE + col);
                }
            }
        }
        Self(bits)
    }

    pub fn to_cells(self) -> [[bool; SIDE]; SIDE] {
        let mut cells = [[false; SIDE]; SIDE];
        for (row, line) in cells.iter_mut().enumerate() {
            for (col, cell) in line.iter_mut().enumerate() {
                *cell = self.cell(row, col);
            }
        }
        cells
    }

    /// One clockwise quarter turn.
    #[inline(always)]
    pub fn rotate_cw(self) -> Self {
        Self(ROTATION_LUT[self.index()])
    }

    /// `[self, rot, rot², rot³]`, possibly with repeats.
    pub fn rotations(self) -> [Pattern; 4] {
        let r1 = self.rotate_cw();
        let r2 = r1.rotate_cw();
        let r3 = r2.rotate_cw();
        [self, r1, r2, r3]
    }

    #[inline]
    pub fn live_count(self) -> u32 {
        self.0.count_ones()
    }

    #[inline]
    pub fn center(self) -> bool {
        self.0 & CENTER_BIT != 0
    }

    /// Live cells among the eight surrounding the center.
    #[inline]
    pub fn neighbor_count(self) -> u32 {
        (self.0 & !CENTER_BIT).count_ones()
    }

    /// Zero-padded 9-character binary form, most significant bit first.
    pub fn binary_string(self) -> String {
        format!("{:09b}", self.0)
    }

    /// The neighborhood as rows of `0`/`1`.
    pub fn grid_rows(self) -> [[u8; SIDE]; SIDE] {
        self.to_cells().map(|line| line.map(u8::from))
    }

    /// Rows of `0`/`1` characters joined by newlines.
    pub fn render(self) -> String {
        self.grid_rows()
            .iter()
            .map(|line| line.iter().map(|&c| if c == 1 { '1' } else { '0' }).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u16> for Pattern {
    type Error = Error;

    fn try_from(bits: u16) -> Result<Self> {
        Pattern::new(bits)
    }
}

impl TryFrom<u32> for Pattern {
    type Error = Error;

    fn try_from(bits: u32) -> Result<Self> {
        if bits as usize >= PATTERN_COUNT {
            return Err(Error::InvalidPattern(bits));
        }
        Ok(Self(bits as u16))
    }
}

impl From<Pattern> for u16 {
    fn from(pattern: Pattern) -> u16 {
        pattern.0
    }
}
