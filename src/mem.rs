// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! The Mem represents the machine's 4 KiB of memory
//!
//! Every access wraps around the 12-bit address space, so no opcode can
//! reach outside the backing array.

use crate::error::{Error, Result};
use std::{
    fmt::{Display, Formatter},
    ops::Range,
};

/// Total addressable memory, in bytes
pub const MEM_SIZE: usize = 0x1000;
/// Where the built-in font is loaded
pub const FONT_ADDR: u16 = 0x050;
/// Where programs are loaded, and where execution starts
pub const PROGRAM_ADDR: u16 = 0x200;

/// The built-in 4x5 hexadecimal font: 16 glyphs, 5 rows each
#[rustfmt::skip]
pub const CHARSET: [u8; 80] = [
    0xf0, 0x90, 0x90, 0x90, 0xf0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xf0, 0x10, 0xf0, 0x80, 0xf0, // 2
    0xf0, 0x10, 0xf0, 0x10, 0xf0, // 3
    0x90, 0x90, 0xf0, 0x10, 0x10, // 4
    0xf0, 0x80, 0xf0, 0x10, 0xf0, // 5
    0xf0, 0x80, 0xf0, 0x90, 0xf0, // 6
    0xf0, 0x10, 0x20, 0x40, 0x40, // 7
    0xf0, 0x90, 0xf0, 0x90, 0xf0, // 8
    0xf0, 0x90, 0xf0, 0x10, 0xf0, // 9
    0xf0, 0x90, 0xf0, 0x90, 0x90, // A
    0xe0, 0x90, 0xe0, 0x90, 0xe0, // B
    0xf0, 0x80, 0x80, 0x80, 0xf0, // C
    0xe0, 0x90, 0x90, 0x90, 0xe0, // D
    0xf0, 0x80, 0xf0, 0x80, 0xf0, // E
    0xf0, 0x80, 0xf0, 0x80, 0x80, // F
];

/// Represents a named region in memory
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Region {
    /// Character ROM (but writable!)
    Charset,
    /// Program memory
    Program,
}

impl Region {
    /// The range of addresses covered by this region
    pub fn range(self) -> Range<usize> {
        match self {
            Region::Charset => FONT_ADDR as usize..FONT_ADDR as usize + CHARSET.len(),
            Region::Program => PROGRAM_ADDR as usize..MEM_SIZE,
        }
    }
}

impl Display for Region {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Region::Charset => "Charset",
                Region::Program => "Program",
            }
        )
    }
}

/// Read or Write a T at address `addr`, wrapping at the end of memory
pub trait ReadWrite<T> {
    /// Reads a T from address `addr`
    fn read(&self, addr: impl Into<usize>) -> T;
    /// Writes a T to address `addr`
    fn write(&mut self, addr: impl Into<usize>, data: T);
}

/// Implements [ReadWrite] for the provided types
///
/// Relies on inherent methods of Rust numeric types:
/// - `Self::from_be_bytes`
/// - `Self::to_be_bytes`
macro_rules! impl_rw {($($t:ty),* $(,)?) => {
    $(
        impl ReadWrite<$t> for Mem {
            #[inline(always)]
            fn read(&self, addr: impl Into<usize>) -> $t {
                let addr: usize = addr.into();
                let mut bytes = [0; core::mem::size_of::<$t>()];
                for (offset, byte) in bytes.iter_mut().enumerate() {
                    *byte = self.memory[(addr + offset) % MEM_SIZE];
                }
                // Chip-8 is a big-endian system
                <$t>::from_be_bytes(bytes)
            }
            #[inline(always)]
            fn write(&mut self, addr: impl Into<usize>, data: $t) {
                let addr: usize = addr.into();
                for (offset, byte) in data.to_be_bytes().into_iter().enumerate() {
                    self.memory[(addr + offset) % MEM_SIZE] = byte;
                }
            }
        }
    )*
}}

impl_rw!(u8, u16);

/// 4 KiB of memory, with the font already in place
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Mem {
    memory: Vec<u8>,
}

impl Mem {
    /// Constructs a new Mem with the built-in font loaded at [FONT_ADDR]
    /// # Examples
    /// ```rust
    /// # use chip8vm::prelude::*;
    /// let mem = Mem::new();
    /// assert_eq!(0x1000, mem.len());
    /// assert_eq!(&CHARSET[..], mem.get_region(Charset));
    /// ```
    pub fn new() -> Self {
        let mut mem = Mem {
            memory: vec![0; MEM_SIZE],
        };
        mem.get_region_mut(Region::Charset).copy_from_slice(&CHARSET);
        mem
    }

    /// Gets the length of the backing memory
    pub fn len(&self) -> usize {
        self.memory.len()
    }

    /// Returns true if the backing memory contains no elements
    pub fn is_empty(&self) -> bool {
        self.memory.is_empty()
    }

    /// Loads a program image into [Region::Program], byte-for-byte.
    ///
    /// Whatever was in program memory before is zeroed.
    /// # Examples
    /// ```rust
    /// # use chip8vm::prelude::*;
    /// # fn main() -> Result<()> {
    /// let mut mem = Mem::new();
    /// mem.load_program(&[0x12, 0x00])?;
    /// let word: u16 = mem.read(0x200u16);
    /// assert_eq!(0x1200, word);
    /// // images that don't fit are refused
    /// assert!(mem.load_program(&[0; 0x1000]).is_err());
    /// #    Ok(())
    /// # }
    /// ```
    pub fn load_program(&mut self, rom: &[u8]) -> Result<&mut Self> {
        let max = Region::Program.range().len();
        if rom.len() > max {
            return Err(Error::ProgramTooLarge {
                len: rom.len(),
                max,
            });
        }
        self.clear_region(Region::Program);
        self.get_region_mut(Region::Program)[..rom.len()].copy_from_slice(rom);
        Ok(self)
    }

    /// Fills a [Region] with zeroes
    pub fn clear_region(&mut self, name: Region) -> &mut Self {
        self.get_region_mut(name).fill(0);
        self
    }

    /// Gets a slice of a named [Region] of memory
    #[inline(always)]
    pub fn get_region(&self, name: Region) -> &[u8] {
        &self.memory[name.range()]
    }

    /// Gets a mutable slice of a named [Region] of memory
    #[inline(always)]
    pub fn get_region_mut(&mut self, name: Region) -> &mut [u8] {
        &mut self.memory[name.range()]
    }

    /// Gets the whole backing memory
    pub fn as_slice(&self) -> &[u8] {
        &self.memory
    }
}

impl Default for Mem {
    fn default() -> Self {
        Self::new()
    }
}
