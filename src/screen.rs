// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! Stores and displays the Chip-8's screen memory
//!
//! Each of the 32 rows is a [u64], with pixel `(x, y)` stored in bit
//! `63 - x` of row `y`. Column 0 is the most significant bit.

use std::fmt::{Display, Formatter};

/// Width of the display, in pixels
pub const WIDTH: usize = 64;
/// Height of the display, in pixels
pub const HEIGHT: usize = 32;

/// A 64x32 monochrome bitmap
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Screen {
    rows: [u64; HEIGHT],
}

impl Screen {
    /// Constructs a blank screen
    pub fn new() -> Self {
        Screen { rows: [0; HEIGHT] }
    }

    /// Turns every pixel off
    pub fn clear(&mut self) {
        self.rows = [0; HEIGHT];
    }

    /// Gets all rows
    pub fn rows(&self) -> &[u64; HEIGHT] {
        &self.rows
    }

    /// Gets row `y`, or None if it's off-screen
    pub fn row(&self, y: usize) -> Option<u64> {
        self.rows.get(y).copied()
    }

    /// Reports whether pixel `(x, y)` is lit. Off-screen pixels never are.
    /// # Examples
    /// ```rust
    /// # use chip8vm::screen::Screen;
    /// let mut screen = Screen::new();
    /// screen.blit_row(0, 0, 0b1000_0001, false);
    /// assert!(screen.pixel(0, 0));
    /// assert!(!screen.pixel(1, 0));
    /// assert!(screen.pixel(7, 0));
    /// assert_eq!(Some(0x8100_0000_0000_0000), screen.row(0));
    /// ```
    pub fn pixel(&self, x: usize, y: usize) -> bool {
        x < WIDTH && self.rows.get(y).map_or(false, |row| row >> (63 - x) & 1 == 1)
    }

    /// XORs one sprite byte into row `y`, with its most significant bit at column `x`.
    ///
    /// Bits that land past the right edge are clipped, unless `wrap` is set,
    /// in which case they continue from column 0.
    ///
    /// Returns true if any lit pixel was turned off.
    pub fn blit_row(&mut self, x: usize, y: usize, sprite: u8, wrap: bool) -> bool {
        let Some(row) = self.rows.get_mut(y) else {
            return false;
        };
        let mut collision = false;
        for bit in 0..8 {
            let mut col = x + bit;
            if col >= WIDTH {
                if !wrap {
                    break;
                }
                col %= WIDTH;
            }
            if sprite & (0x80 >> bit) == 0 {
                continue;
            }
            let mask = 1u64 << (63 - col);
            collision |= *row & mask != 0;
            *row ^= mask;
        }
        collision
    }

    /// Returns true when no pixel is lit
    pub fn is_blank(&self) -> bool {
        self.rows.iter().all(|&row| row == 0)
    }

    /// Counts the lit pixels
    pub fn lit(&self) -> usize {
        self.rows.iter().map(|row| row.count_ones() as usize).sum()
    }

    /// Prints the screen to stdout
    pub fn print_screen(&self) {
        print!("{self}")
    }
}

impl Default for Screen {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for Screen {
    /// Draws the screen with half-block characters, two pixel rows per line
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for pair in self.rows.chunks_exact(2) {
            for x in 0..WIDTH {
                let bit = 63 - x;
                let (top, bottom) = (pair[0] >> bit & 1, pair[1] >> bit & 1);
                write!(
                    f,
                    "{}",
                    match (top, bottom) {
                        (0, 0) => ' ',
                        (1, 0) => '▀',
                        (0, _) => '▄',
                        _ => '█',
                    }
                )?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
