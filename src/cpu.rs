// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! Decodes and runs instructions

#[cfg(test)]
mod tests;

pub mod behavior;
pub mod flags;
pub mod instruction;
pub mod mode;
pub mod quirks;
pub mod stack;

use self::{
    flags::Flags,
    instruction::{decode, Instruction},
    mode::Mode,
    quirks::{Policy, Quirks},
    stack::Stack,
};
use crate::{
    error::{Error, Result},
    mem::{Mem, ReadWrite, PROGRAM_ADDR},
    screen::Screen,
};
use owo_colors::OwoColorize;

/// A register index
pub type Reg = usize;
/// A 12-bit address, stored in 16 bits
pub type Adr = u16;
/// A 4-bit immediate
pub type Nib = u8;

/// Addresses are 12 bits wide
const ADR_MASK: Adr = 0x0fff;

/// Represents the internal state of the CPU interpreter
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CPU {
    /// Flags that control how the CPU behaves, but which aren't inherent to the
    /// chip-8.
    pub flags: Flags,
    policy: Policy,
    // memory
    stack: Stack,
    // registers
    pc: Adr,
    i: Adr,
    v: [u8; 16],
    delay: u8,
    sound: u8,
    // I/O
    keys: u16,
    wait: Option<Nib>,
    // Execution data
    cycle: usize,
}

// public interface
impl CPU {
    /// Constructs a new CPU with the given compatibility [Policy]
    /// # Examples
    /// ```rust
    /// # use chip8vm::prelude::*;
    /// let cpu = CPU::new(Policy::new(Mode::Legacy, Layout::Cosmac));
    /// assert_eq!(0x200, cpu.pc());
    /// assert_eq!(Mode::Legacy, cpu.policy().mode());
    /// ```
    pub fn new(policy: Policy) -> Self {
        CPU {
            flags: Flags::default(),
            policy,
            stack: Stack::default(),
            pc: PROGRAM_ADDR,
            i: 0,
            v: [0; 16],
            delay: 0,
            sound: 0,
            keys: 0,
            wait: None,
            cycle: 0,
        }
    }

    /// Gets the compatibility [Policy] this CPU was built with
    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    /// Shorthand for the opcode [Quirks] in effect
    pub fn quirks(&self) -> Quirks {
        self.policy.quirks()
    }

    /// Presses a key, and reports whether the key's state changed.
    /// If key does not exist, returns [Error::InvalidKey].
    ///
    /// # Examples
    /// ```rust
    /// # use chip8vm::prelude::*;
    /// let mut cpu = CPU::default();
    ///
    /// // press key `7`
    /// let did_press = cpu.press(0x7).unwrap();
    /// assert!(did_press);
    ///
    /// // press key `7` again, even though it's already pressed
    /// let did_press = cpu.press(0x7).unwrap();
    /// // it was already pressed, so nothing's changed.
    /// assert!(!did_press);
    /// ```
    pub fn press(&mut self, key: usize) -> Result<bool> {
        if key >= 16 {
            return Err(Error::InvalidKey { key });
        }
        let was_up = self.keys & 1 << key == 0;
        self.keys |= 1 << key;
        Ok(was_up)
    }

    /// Releases a key, and reports whether the key's state changed.
    /// If key is outside range `0..=0xF`, returns [Error::InvalidKey].
    pub fn release(&mut self, key: usize) -> Result<bool> {
        if key >= 16 {
            return Err(Error::InvalidKey { key });
        }
        let was_down = self.keys & 1 << key != 0;
        self.keys &= !(1 << key);
        Ok(was_down)
    }

    /// Replaces the whole input latch. Bit k is set while key k is held.
    pub fn set_keys(&mut self, latch: u16) {
        self.keys = latch;
    }

    /// Gets the input latch
    pub fn keys(&self) -> u16 {
        self.keys
    }

    /// Reports whether key `key` is held
    pub fn is_pressed(&self, key: usize) -> bool {
        key < 16 && self.keys & 1 << key != 0
    }

    /// Sets a general purpose register in the CPU.
    /// If the register doesn't exist, returns [Error::InvalidRegister]
    /// # Examples
    /// ```rust
    /// # use chip8vm::prelude::*;
    /// let mut cpu = CPU::default();
    /// cpu.set_v(0x4, 0x41).unwrap();
    /// assert_eq!(0x41, cpu.v()[4]);
    /// assert!(cpu.set_v(0x10, 0).is_err());
    /// ```
    pub fn set_v(&mut self, reg: Reg, value: u8) -> Result<()> {
        if let Some(gpr) = self.v.get_mut(reg) {
            *gpr = value;
            Ok(())
        } else {
            Err(Error::InvalidRegister { reg })
        }
    }

    /// Gets a slice of the entire general purpose registers
    pub fn v(&self) -> &[u8] {
        self.v.as_slice()
    }

    /// Gets the program counter
    pub fn pc(&self) -> Adr {
        self.pc
    }

    /// Gets the I register
    pub fn i(&self) -> Adr {
        self.i
    }

    /// Gets the value in the Sound Timer register
    pub fn sound(&self) -> u8 {
        self.sound
    }

    /// Gets the value in the Delay Timer register
    pub fn delay(&self) -> u8 {
        self.delay
    }

    /// Whether the tone should be playing
    pub fn is_sounding(&self) -> bool {
        self.sound > 0
    }

    /// Gets the return addresses on the call stack, oldest first
    pub fn stack(&self) -> &[Adr] {
        self.stack.as_slice()
    }

    /// Gets the key the CPU is blocked on, if it's waiting on one (`Fx0A`)
    pub fn awaiting_key(&self) -> Option<Nib> {
        self.wait
    }

    /// Gets the number of cycles the CPU has executed
    pub fn cycle(&self) -> usize {
        self.cycle
    }

    /// Resets the CPU, keeping its [Policy] and [Flags::debug]
    ///
    /// Touches the stack, pc, registers, timers, keys, key wait, and cycle count.
    pub fn reset(&mut self) {
        *self = CPU {
            flags: Flags {
                debug: self.flags.debug,
                pause: false,
            },
            ..CPU::new(self.policy)
        };
    }

    /// Decrements the delay and sound timers, stopping at zero.
    ///
    /// Should be called at 60Hz, independent of instruction rate.
    /// # Examples
    /// ```rust
    /// # use chip8vm::prelude::*;
    /// let mut cpu = CPU::default();
    /// cpu.tick_timers();
    /// assert_eq!(0, cpu.delay());
    /// ```
    pub fn tick_timers(&mut self) {
        self.delay = self.delay.saturating_sub(1);
        self.sound = self.sound.saturating_sub(1);
    }

    /// Decodes the word at the program counter, without moving it
    pub fn peek(&self, mem: &Mem) -> Instruction {
        decode(mem.read(self.pc))
    }

    /// Decodes the word at the program counter, and advances past it
    pub fn fetch(&mut self, mem: &Mem) -> Instruction {
        let insn = self.peek(mem);
        self.pc = self.pc.wrapping_add(2) & ADR_MASK;
        insn
    }

    /// Runs one fetch-decode-execute cycle
    ///
    /// While waiting on a key (`Fx0A`), a cycle only checks the key, and
    /// moves past the wait once it is held.
    ///
    /// Returns [Error::UnimplementedInstruction] if the word at `pc` is not an
    /// instruction. By then, `pc` has moved past it, so it is safe to continue.
    ///
    /// Returns [Error::ControlFlow] if the call stack over- or underflows.
    /// The instruction is rejected, `pc` stays on it, and the CPU pauses.
    /// # Examples
    /// ```rust
    /// # use chip8vm::prelude::*;
    /// let (mut cpu, mut mem, mut screen) = (CPU::default(), Mem::new(), Screen::new());
    /// mem.load_program(&[
    ///     0x00, 0xe0, // cls
    ///     0xff, 0xff, // invalid!
    /// ]).unwrap();
    /// cpu.tick(&mut mem, &mut screen)
    ///     .expect("0x00e0 (cls) should be a valid opcode.");
    /// assert_eq!(0x202, cpu.pc());
    /// assert_eq!(1, cpu.cycle());
    /// // unrecognized, but survivable
    /// let err = cpu.tick(&mut mem, &mut screen).unwrap_err();
    /// assert!(!err.is_fatal());
    /// assert_eq!(0x204, cpu.pc());
    /// ```
    pub fn tick(&mut self, mem: &mut Mem, screen: &mut Screen) -> Result<&mut Self> {
        // Do nothing if paused
        if self.flags.pause {
            return Ok(self);
        }
        self.cycle += 1;

        if let Some(key) = self.wait {
            if self.is_pressed(key as usize) {
                self.wait = None;
                self.pc = self.pc.wrapping_add(2) & ADR_MASK;
            }
            return Ok(self);
        }

        let addr = self.pc;
        let insn = self.fetch(mem);

        // Print opcode disassembly:
        if self.flags.debug {
            self.trace(addr, &insn);
        }

        if insn.is_idle() {
            return Ok(self);
        }
        let Some(op) = insn.insn() else {
            return Err(Error::UnimplementedInstruction {
                word: insn.word,
                addr,
            });
        };
        if let Err(fault) = self.execute(mem, screen, op) {
            // reject the instruction: park on it, and stop running
            self.pc = addr;
            self.flags.pause = true;
            return Err(fault.into());
        }
        Ok(self)
    }

    /// Runs `steps` cycles, reporting unrecognized opcodes on stderr and moving on.
    ///
    /// Stops early, returning the error, if a fatal error occurs.
    /// # Examples
    /// ```rust
    /// # use chip8vm::prelude::*;
    /// let (mut cpu, mut mem, mut screen) = (CPU::default(), Mem::new(), Screen::new());
    /// mem.load_program(&[
    ///     0x00, 0xe0, // cls
    ///     0x12, 0x02, // jump 0x202 (pc)
    /// ]).unwrap();
    /// cpu.multistep(&mut mem, &mut screen, 0x20)
    ///     .expect("The program should only have valid opcodes.");
    /// assert_eq!(0x202, cpu.pc());
    /// assert_eq!(0x20, cpu.cycle());
    /// ```
    pub fn multistep(&mut self, mem: &mut Mem, screen: &mut Screen, steps: usize) -> Result<&mut Self> {
        for _ in 0..steps {
            match self.tick(mem, screen) {
                Err(e) if !e.is_fatal() => report(&e),
                Err(e) => return Err(e),
                Ok(_) => (),
            }
        }
        Ok(self)
    }

    /// Dumps the current state of all CPU registers, and the cycle count
    /// # Examples
    /// ```rust
    /// # use chip8vm::prelude::*;
    /// let mut cpu = CPU::default();
    /// cpu.dump();
    /// ```
    /// outputs
    /// ```text
    /// PC: 0200, SP: 0000, I: 0000
    /// v0: 00 v1: 00 v2: 00 v3: 00
    /// v4: 00 v5: 00 v6: 00 v7: 00
    /// v8: 00 v9: 00 vA: 00 vB: 00
    /// vC: 00 vD: 00 vE: 00 vF: 00
    /// DLY: 0, SND: 0, CYC:      0
    /// ```
    pub fn dump(&self) {
        std::println!(
            "PC: {:04x}, SP: {:04x}, I: {:04x}\n{}DLY: {}, SND: {}, CYC: {:6}",
            self.pc,
            self.stack.len(),
            self.i,
            self.v
                .into_iter()
                .enumerate()
                .map(|(i, gpr)| {
                    format!(
                        "v{i:X}: {gpr:02x} {}",
                        match i % 4 {
                            3 => "\n",
                            _ => "",
                        }
                    )
                })
                .collect::<String>(),
            self.delay,
            self.sound,
            self.cycle,
        );
    }

    fn trace(&self, addr: Adr, insn: &Instruction) {
        match insn.insn() {
            Some(op) => std::println!("{:3} {addr:03x}: {:<36}", self.cycle.bright_black(), op.green()),
            None => std::println!(
                "{:3} {addr:03x}: {:<36}",
                self.cycle.bright_black(),
                format!("inval  {:04x}", insn.word).bold().red()
            ),
        }
    }
}

impl Default for CPU {
    /// Constructs a new CPU in [Mode::Modern], with the default [Layout](crate::io::Layout)
    ///
    /// # Examples
    /// ```rust
    /// # use chip8vm::prelude::*;
    /// let cpu = CPU::default();
    /// assert_eq!(Mode::Modern, cpu.policy().mode());
    /// ```
    fn default() -> Self {
        CPU::new(Policy::new(Mode::Modern, Default::default()))
    }
}

/// Reports a survivable error on stderr
pub fn report(e: &Error) {
    eprintln!("{}", e.bold().yellow());
}
