// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! The call stack: at most [DEPTH] return addresses

use super::Adr;

/// Maximum nesting depth of subroutine calls
pub const DEPTH: usize = 16;

/// A bounded LIFO of return addresses
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Stack {
    frames: Vec<Adr>,
}

impl Stack {
    /// Pushes a return address, handing it back if every slot is taken
    /// # Examples
    /// ```rust
    /// # use chip8vm::cpu::stack::{Stack, DEPTH};
    /// let mut stack = Stack::default();
    /// for addr in 0..DEPTH as u16 {
    ///     assert_eq!(Ok(()), stack.push(addr));
    /// }
    /// assert_eq!(Err(0x300), stack.push(0x300));
    /// assert_eq!(DEPTH, stack.len());
    /// ```
    pub fn push(&mut self, addr: Adr) -> Result<(), Adr> {
        if self.is_full() {
            return Err(addr);
        }
        self.frames.push(addr);
        Ok(())
    }
    /// Pops the most recent return address
    pub fn pop(&mut self) -> Option<Adr> {
        self.frames.pop()
    }
    /// Number of frames in use
    pub fn len(&self) -> usize {
        self.frames.len()
    }
    /// Returns true if there are no frames
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
    /// Returns true if another call would overflow
    pub fn is_full(&self) -> bool {
        self.frames.len() >= DEPTH
    }
    /// Drops every frame
    pub fn clear(&mut self) {
        self.frames.clear()
    }
    /// Gets the frames, oldest first
    pub fn as_slice(&self) -> &[Adr] {
        &self.frames
    }
}
