// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! Helpers for whoever feeds the machine its input.
//!
//! Physical keys are numbered by their position in the 4x4 block on the
//! left of a QWERTY keyboard:
//!
//! ```text
//!  1 2 3 4      0 1 2 3
//!  Q W E R  =>  4 5 6 7
//!  A S D F      8 9 A B
//!  Z X C V      C D E F
//! ```
//!
//! A [Layout] then decides which logical key each physical slot presses.

use crate::error::Error;
use std::{fmt::Display, str::FromStr};

/// Physical keys, in slot order
pub const QWERTY: [char; 16] = [
    '1', '2', '3', '4', //
    'q', 'w', 'e', 'r', //
    'a', 's', 'd', 'f', //
    'z', 'x', 'c', 'v', //
];

/// Maps physical key slots onto the machine's logical keys 0..=F
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Layout {
    /// Slot k presses key k
    Ordered,
    /// Slots follow the COSMAC VIP's hex keypad
    #[default]
    Cosmac,
}

impl Layout {
    /// Gets the logical key pressed by physical `slot`, if the slot exists
    /// # Examples
    /// ```rust
    /// # use chip8vm::io::Layout;
    /// assert_eq!(Some(0x3), Layout::Ordered.key(0x3));
    /// assert_eq!(Some(0xc), Layout::Cosmac.key(0x3));
    /// assert_eq!(Some(0x0), Layout::Cosmac.key(0xd));
    /// assert_eq!(None, Layout::Cosmac.key(0x10));
    /// ```
    pub fn key(self, slot: usize) -> Option<u8> {
        #[rustfmt::skip]
        const COSMAC: [u8; 16] = [
            0x1, 0x2, 0x3, 0xc,
            0x4, 0x5, 0x6, 0xd,
            0x7, 0x8, 0x9, 0xe,
            0xa, 0x0, 0xb, 0xf,
        ];
        match self {
            Layout::Ordered => (slot < 16).then_some(slot as u8),
            Layout::Cosmac => COSMAC.get(slot).copied(),
        }
    }

    /// Builds the 16-bit input latch from the held physical slots.
    ///
    /// Bit k of the result is set when logical key k is held.
    /// Slots that don't exist are ignored.
    /// # Examples
    /// ```rust
    /// # use chip8vm::io::Layout;
    /// // `1` and `X` held
    /// assert_eq!(0b0000_0000_0000_0011, Layout::Cosmac.latch([0x0, 0xd]));
    /// assert_eq!(0b0010_0000_0000_0001, Layout::Ordered.latch([0x0, 0xd]));
    /// ```
    pub fn latch(self, held: impl IntoIterator<Item = usize>) -> u16 {
        held.into_iter()
            .filter_map(|slot| self.key(slot))
            .fold(0, |latch, key| latch | 1 << key)
    }
}

impl FromStr for Layout {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ordered" | "linear" => Ok(Layout::Ordered),
            "cosmac" | "vip" | "hex" => Ok(Layout::Cosmac),
            _ => Err(Error::InvalidLayout {
                layout: s.to_string(),
            }),
        }
    }
}

impl Display for Layout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Layout::Ordered => "Ordered",
                Layout::Cosmac => "Cosmac",
            }
        )
    }
}

/// Identifies the physical slot of a keyboard character
/// # Examples
/// ```rust
/// # use chip8vm::io::identify_key;
/// assert_eq!(Some(0x5), identify_key('W'));
/// assert_eq!(None, identify_key('p'));
/// ```
pub fn identify_key(key: char) -> Option<usize> {
    let key = key.to_ascii_lowercase();
    QWERTY.iter().position(|&k| k == key)
}
