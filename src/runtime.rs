// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! Runs a [Chip8] in real time.
//!
//! Two threads share the machine: the clock, which runs instructions at the
//! configured rate, and the timer, which decrements the delay and sound
//! timers at 60Hz. The presentation side talks to the machine through a
//! [Frontend]. Every one of them holds the machine's lock for the whole of
//! each tick, so nobody ever sees half an instruction.
//!
//! All activities watch the same [Shutdown]. Raising it stops instruction
//! execution and timer decrement together.

use crate::{
    cpu::report,
    error::{Error, Result},
    Chip8, Screen,
};
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, MutexGuard,
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

/// Rate of the delay and sound timers, in Hz
pub const TIMER_HZ: u32 = 60;

/// Sleeps until the next tick of a fixed-rate clock
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Pacer {
    period: Duration,
    next: Instant,
}

impl Pacer {
    /// Constructs a pacer that ticks `hz` times per second
    /// # Examples
    /// ```rust
    /// # use chip8vm::runtime::Pacer;
    /// # use std::time::Duration;
    /// assert_eq!(Duration::from_millis(2), Pacer::new(500).period());
    /// ```
    pub fn new(hz: u32) -> Self {
        Pacer {
            period: Duration::from_nanos(1_000_000_000 / hz.max(1) as u64),
            next: Instant::now(),
        }
    }

    /// Time between ticks
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Sleeps until the next tick is due
    ///
    /// A pacer that has fallen more than a few ticks behind gives up on
    /// the missed ones, rather than running them back-to-back.
    pub fn wait(&mut self) {
        let now = Instant::now();
        if self.next > now {
            thread::sleep(self.next - now);
        } else if now - self.next > self.period * 8 {
            self.next = now;
        }
        self.next += self.period;
    }
}

/// A shutdown signal, shared between every activity touching the machine
#[derive(Clone, Debug, Default)]
pub struct Shutdown(Arc<AtomicBool>);

impl Shutdown {
    /// Constructs a fresh, unraised signal
    pub fn new() -> Self {
        Self::default()
    }
    /// Raises the signal. There is no lowering it.
    pub fn signal(&self) {
        self.0.store(true, Ordering::SeqCst)
    }
    /// Reports whether the signal was raised
    pub fn is_signaled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

type Shared = Arc<Mutex<Chip8>>;

fn lock(vm: &Mutex<Chip8>) -> Result<MutexGuard<'_, Chip8>> {
    vm.lock().map_err(|_| Error::Poisoned)
}

/// The presentation side's view of a running machine
///
/// Reads are snapshots; the only write is the input latch.
#[derive(Clone, Debug)]
pub struct Frontend {
    vm: Shared,
    shutdown: Shutdown,
}

impl Frontend {
    /// Takes a snapshot of the screen
    pub fn frame(&self) -> Result<Screen> {
        Ok(lock(&self.vm)?.frame())
    }
    /// Replaces the input latch. Bit k is set while key k is held.
    pub fn set_keys(&self, latch: u16) -> Result<()> {
        lock(&self.vm)?.set_keys(latch);
        Ok(())
    }
    /// Whether the tone should be playing
    pub fn is_sounding(&self) -> Result<bool> {
        Ok(lock(&self.vm)?.is_sounding())
    }
    /// Looks at the whole machine, under the lock
    pub fn inspect<T>(&self, f: impl FnOnce(&Chip8) -> T) -> Result<T> {
        Ok(f(&*lock(&self.vm)?))
    }
    /// Reports whether the machine is still running
    pub fn is_running(&self) -> bool {
        !self.shutdown.is_signaled()
    }
    /// Asks the machine to stop
    pub fn stop(&self) {
        self.shutdown.signal()
    }
}

/// A [Chip8] running on its own clock and timer threads
#[derive(Debug)]
pub struct Runtime {
    vm: Shared,
    shutdown: Shutdown,
    clock: Option<JoinHandle<Result<()>>>,
    timer: Option<JoinHandle<Result<()>>>,
}

impl Runtime {
    /// Starts running `chip8` at `speed` instructions per second
    pub fn start(chip8: Chip8, speed: u32) -> Self {
        let vm = Arc::new(Mutex::new(chip8));
        let shutdown = Shutdown::new();
        let clock = {
            let (vm, shutdown) = (Arc::clone(&vm), shutdown.clone());
            thread::spawn(move || run_clock(&vm, &shutdown, speed))
        };
        let timer = {
            let (vm, shutdown) = (Arc::clone(&vm), shutdown.clone());
            thread::spawn(move || run_timer(&vm, &shutdown))
        };
        Runtime {
            vm,
            shutdown,
            clock: Some(clock),
            timer: Some(timer),
        }
    }

    /// Gets a handle for the presentation side
    pub fn frontend(&self) -> Frontend {
        Frontend {
            vm: Arc::clone(&self.vm),
            shutdown: self.shutdown.clone(),
        }
    }

    /// Reports whether the machine is still running
    pub fn is_running(&self) -> bool {
        !self.shutdown.is_signaled()
    }

    /// Stops both threads, and waits for them to finish.
    ///
    /// Returns whatever stopped the clock, if it stopped itself.
    pub fn stop(&mut self) -> Result<()> {
        self.shutdown.signal();
        let clock = join(self.clock.take());
        let timer = join(self.timer.take());
        clock.and(timer)
    }

    /// Takes a copy of the whole machine
    pub fn snapshot(&self) -> Result<Chip8> {
        Ok(lock(&self.vm)?.clone())
    }
}

impl Drop for Runtime {
    fn drop(&mut self) {
        self.stop().ok();
    }
}

fn join(handle: Option<JoinHandle<Result<()>>>) -> Result<()> {
    match handle {
        Some(handle) => handle.join().map_err(|_| Error::Poisoned)?,
        None => Ok(()),
    }
}

/// Runs instructions until shutdown, or until one fails fatally
fn run_clock(vm: &Mutex<Chip8>, shutdown: &Shutdown, speed: u32) -> Result<()> {
    let mut pacer = Pacer::new(speed);
    let outcome = loop {
        if shutdown.is_signaled() {
            break Ok(());
        }
        match lock(vm).and_then(|mut chip8| chip8.step()) {
            Err(e) if !e.is_fatal() => report(&e),
            Err(e) => break Err(e),
            Ok(()) => (),
        }
        pacer.wait();
    };
    // whatever stops the clock stops the timers too
    shutdown.signal();
    outcome
}

/// Decrements the timers at [TIMER_HZ] until shutdown
fn run_timer(vm: &Mutex<Chip8>, shutdown: &Shutdown) -> Result<()> {
    let mut pacer = Pacer::new(TIMER_HZ);
    let outcome = loop {
        if shutdown.is_signaled() {
            break Ok(());
        }
        if let Err(e) = lock(vm).map(|mut chip8| chip8.tick_timers()) {
            break Err(e);
        }
        pacer.wait();
    };
    shutdown.signal();
    outcome
}
