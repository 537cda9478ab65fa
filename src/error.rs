// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! Error type for chip8vm

use std::path::PathBuf;
use thiserror::Error;

/// Result type, equivalent to [std::result::Result]<T, [enum@Error]>
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for chip8vm.
#[derive(Debug, Error)]
pub enum Error {
    /// Represents an unimplemented operation. PC has already moved past it.
    #[error("opcode {word:04x} at {addr:03x} not recognized")]
    UnimplementedInstruction {
        /// The offending word
        word: u16,
        /// The address the word was fetched from
        addr: u16,
    },
    /// The program broke the call stack discipline
    #[error(transparent)]
    ControlFlow(#[from] Fault),
    /// Tried to press a key that doesn't exist
    #[error("tried to press key {key:X} which does not exist")]
    InvalidKey {
        /// The offending key
        key: usize,
    },
    /// Tried to get/set an out-of-bounds register
    #[error("tried to access register v{reg:X} which does not exist")]
    InvalidRegister {
        /// The offending register
        reg: usize,
    },
    /// Tried to convert string into mode, but it did not match.
    #[error("no suitable conversion of \"{mode}\" into Mode")]
    InvalidMode {
        /// The string which failed to become a mode
        mode: String,
    },
    /// Tried to convert string into keypad layout, but it did not match.
    #[error("no suitable conversion of \"{layout}\" into Layout")]
    InvalidLayout {
        /// The string which failed to become a layout
        layout: String,
    },
    /// Tried to run for a span of time that can't be represented
    #[error("can't run for {secs} seconds")]
    InvalidDuration {
        /// The offending number of seconds
        secs: f64,
    },
    /// The program image doesn't fit between 0x200 and the end of memory
    #[error("program is {len} bytes, but only {max} bytes fit in program memory")]
    ProgramTooLarge {
        /// Length of the rejected image
        len: usize,
        /// Size of program memory
        max: usize,
    },
    /// The ROM could not be read
    #[error("could not read ROM {}: {source}", path.display())]
    Rom {
        /// The path that was asked for
        path: PathBuf,
        /// The underlying failure
        source: std::io::Error,
    },
    /// A thread panicked while holding the machine
    #[error("machine state was poisoned by a panicked thread")]
    Poisoned,
    /// Error originated in [std::io]
    #[error(transparent)]
    IoError(#[from] std::io::Error),
}

impl Error {
    /// Whether execution must stop because of this error.
    ///
    /// Only unrecognized opcodes are survivable.
    /// # Examples
    /// ```rust
    /// # use chip8vm::error::{Error, Fault};
    /// assert!(!Error::UnimplementedInstruction { word: 0xffff, addr: 0x200 }.is_fatal());
    /// assert!(Error::from(Fault::StackUnderflow { addr: 0x200 }).is_fatal());
    /// ```
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Error::UnimplementedInstruction { .. })
    }

    /// Whether this error is a [Fault] in the program's control flow
    pub fn is_control_flow_fault(&self) -> bool {
        matches!(self, Error::ControlFlow(_))
    }
}

/// A control-flow fault: the program misused the 16-slot call stack.
///
/// The faulting instruction is rejected: it has no effect, and the
/// program counter is left pointing at it.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq, Hash)]
pub enum Fault {
    /// `2nnn` executed with all 16 stack slots in use
    #[error("stack overflow: call {target:03x} at {addr:03x} would exceed 16 frames")]
    StackOverflow {
        /// Address of the offending call
        addr: u16,
        /// Where it wanted to go
        target: u16,
    },
    /// `00ee` executed with an empty stack
    #[error("stack underflow: return at {addr:03x} with no caller")]
    StackUnderflow {
        /// Address of the offending return
        addr: u16,
    },
}
