// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! This crate implements a Chip-8 virtual machine: 4 KiB of memory, sixteen
//! 8-bit registers, a 64x32 monochrome screen, and a pair of 60Hz timers.
//!
//! The [CPU] runs one instruction per [Chip8::step]. The [runtime] module
//! drives that at a fixed instruction rate on one thread, and the timers at
//! 60Hz on another, with the whole machine behind a single lock.
//!
//! Whoever hosts the machine sees three things: the [Screen], a 16-bit input
//! latch, and whether the sound timer is running.

pub mod cpu;
pub mod error;
pub mod io;
pub mod mem;
pub mod runtime;
pub mod screen;

pub use cpu::{
    flags::Flags,
    instruction::{decode, Insn, Instruction},
    mode::Mode,
    quirks::{Policy, Quirks},
    CPU,
};
pub use error::{Error, Fault, Result};
pub use io::Layout;
pub use mem::Mem;
pub use screen::Screen;

use std::path::Path;

/// The complete state of the machine
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Chip8 {
    /// Registers, stack, timers, and input latch
    pub cpu: CPU,
    /// Memory, with the font and program loaded
    pub mem: Mem,
    /// The display
    pub screen: Screen,
}

impl Chip8 {
    /// Builds a machine with no program loaded
    pub fn new(policy: Policy) -> Self {
        Chip8 {
            cpu: CPU::new(policy),
            mem: Mem::new(),
            screen: Screen::new(),
        }
    }

    /// Builds a machine, and loads the ROM at `rom` into it.
    ///
    /// A missing or unreadable ROM is an error; there's nothing to run without one.
    pub fn load(rom: impl AsRef<Path>, policy: Policy) -> Result<Self> {
        let path = rom.as_ref();
        let program = std::fs::read(path).map_err(|source| Error::Rom {
            path: path.to_owned(),
            source,
        })?;
        let mut chip8 = Self::new(policy);
        chip8.mem.load_program(&program)?;
        Ok(chip8)
    }

    /// Builds a machine around an in-memory program image
    /// # Examples
    /// ```rust
    /// # use chip8vm::prelude::*;
    /// # fn main() -> Result<()> {
    /// let mut ch8 = Chip8::with_program(Policy::default(), &[
    ///     0x60, 0x2a, // mov #2a, v0
    /// ])?;
    /// ch8.step()?;
    /// assert_eq!(0x2a, ch8.cpu.v()[0]);
    /// #    Ok(())
    /// # }
    /// ```
    pub fn with_program(policy: Policy, program: &[u8]) -> Result<Self> {
        let mut chip8 = Self::new(policy);
        chip8.mem.load_program(program)?;
        Ok(chip8)
    }

    /// Runs one fetch-decode-execute cycle. See [CPU::tick].
    pub fn step(&mut self) -> Result<()> {
        self.cpu.tick(&mut self.mem, &mut self.screen)?;
        Ok(())
    }

    /// Runs `steps` cycles. See [CPU::multistep].
    pub fn multistep(&mut self, steps: usize) -> Result<()> {
        self.cpu.multistep(&mut self.mem, &mut self.screen, steps)?;
        Ok(())
    }

    /// Decrements the timers; call at 60Hz
    pub fn tick_timers(&mut self) {
        self.cpu.tick_timers()
    }

    /// Takes a snapshot of the screen
    pub fn frame(&self) -> Screen {
        self.screen
    }

    /// Replaces the input latch. Bit k is set while key k is held.
    pub fn set_keys(&mut self, latch: u16) {
        self.cpu.set_keys(latch)
    }

    /// Whether the tone should be playing
    pub fn is_sounding(&self) -> bool {
        self.cpu.is_sounding()
    }
}

/// Common imports for chip8vm
pub mod prelude {
    pub use super::Chip8;
    use super::*;
    pub use cpu::{flags::Flags, instruction::Insn, mode::Mode, quirks::*, CPU};
    pub use error::{Error, Fault, Result};
    pub use io::Layout;
    pub use mem::{ReadWrite, Region::*, CHARSET, FONT_ADDR, PROGRAM_ADDR};
    pub use mem::Mem;
    pub use runtime::{Frontend, Runtime};
    pub use screen::Screen;
}
