// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! Controls the [Quirks] behavior of the CPU on a granular level, and
//! bundles them into an immutable [Policy].

use super::Mode;
use crate::io::Layout;

/// Controls the quirk behavior of the CPU on a granular level.
///
/// `false` is Cosmac-VIP-like behavior
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Quirks {
    /// Shift ops in `8xy`(`6`, `E`) shift vX in place, instead of copying vY into vX first
    pub shift: bool,
    /// DMA instructions `Fx55`/`Fx65` leave I alone, instead of changing it to I + x + 1
    pub dma_inc: bool,
    /// Indexed jump goes to `adr` + v`a`, where `a` is the high nibble of `adr`, instead of `adr` + v0
    pub stupid_jumps: bool,
    /// Draw operations wrap from bottom to top and side to side, instead of clipping
    pub screen_wrap: bool,
}

impl From<Mode> for Quirks {
    fn from(value: Mode) -> Self {
        let modern = value == Mode::Modern;
        Quirks {
            shift: modern,
            dma_inc: modern,
            stupid_jumps: modern,
            screen_wrap: false,
        }
    }
}

/// The compatibility policy, fixed when the machine is built.
///
/// The [Mode] picks the opcode [Quirks]; the [Layout] is only of interest
/// to whoever translates physical keys into the input latch.
/// # Examples
/// ```rust
/// # use chip8vm::prelude::*;
/// let policy = Policy::new(Mode::Legacy, Layout::Ordered).with_screen_wrap(true);
/// assert!(!policy.quirks().shift);
/// assert!(policy.quirks().screen_wrap);
/// assert_eq!(Layout::Ordered, policy.layout());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Policy {
    mode: Mode,
    layout: Layout,
    quirks: Quirks,
}

impl Policy {
    /// Builds a policy for the given [Mode] and keypad [Layout]
    pub fn new(mode: Mode, layout: Layout) -> Self {
        Policy {
            mode,
            layout,
            quirks: mode.into(),
        }
    }
    /// Selects wrapping (true) or clipping (false) at the screen edges
    pub fn with_screen_wrap(mut self, wrap: bool) -> Self {
        self.quirks.screen_wrap = wrap;
        self
    }
    /// Gets the [Mode]
    pub fn mode(&self) -> Mode {
        self.mode
    }
    /// Gets the keypad [Layout]
    pub fn layout(&self) -> Layout {
        self.layout
    }
    /// Gets the opcode [Quirks] in effect
    pub fn quirks(&self) -> Quirks {
        self.quirks
    }
}

impl Default for Policy {
    /// [Mode::Modern], with the default [Layout]
    /// # Examples
    /// ```rust
    /// # use chip8vm::prelude::*;
    /// assert_eq!(Policy::new(Mode::Modern, Layout::Cosmac), Policy::default());
    /// ```
    fn default() -> Self {
        Policy::new(Mode::default(), Layout::default())
    }
}
