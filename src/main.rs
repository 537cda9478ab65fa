// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! chip8vm: runs a Chip-8 program headless, in real time.
//!
//! The screen is printed to the terminal when the program stops.

use chip8vm::{
    error::{Error, Result},
    io::identify_key,
    runtime::{Frontend, Runtime},
    Chip8, Layout, Mode, Policy,
};
use gumdrop::*;
use owo_colors::OwoColorize;
use std::{
    path::PathBuf,
    time::{Duration, Instant},
};

pub fn main() -> Result<()> {
    let options = Arguments::parse_args_default_or_exit();
    let mut state = State::new(options)?;
    for result in state.by_ref() {
        if let Err(e) = result {
            eprintln!("{}", e.bold().red());
            break;
        }
    }
    state.finish()
}

#[derive(Clone, Debug, PartialEq, Options)]
struct Arguments {
    #[options(help = "Load a ROM to run.", required, free)]
    pub file: PathBuf,
    #[options(help = "Print this help message.")]
    help: bool,
    #[options(help = "Run in (Legacy, Modern) mode.")]
    pub mode: Option<Mode>,
    #[options(help = "Map the keyboard onto the (Ordered, Cosmac) keypad.")]
    pub layout: Option<Layout>,
    #[options(help = "Set the instructions-per-second rate.", default = "700", meta = "IPS")]
    pub speed: u32,
    #[options(help = "Wrap sprites around the screen edges, instead of clipping them.")]
    pub wrap: bool,
    #[options(help = "Print each instruction as it runs.")]
    pub debug: bool,
    #[options(help = "Stop after this many seconds.", meta = "SECS")]
    pub time: Option<f64>,
    #[options(help = "Hold these keys (1234/qwer/asdf/zxcv) for the whole run.", meta = "KEYS")]
    pub press: String,
    #[options(help = "Set the target framerate.", default = "60", meta = "FR")]
    pub frame_rate: u64,
    #[options(no_short, help = "Print the registers on exit.")]
    pub dump: bool,
}

/// Turns `--time` into a deadline
fn run_for(secs: f64) -> Result<Instant> {
    let span = Duration::try_from_secs_f64(secs).map_err(|_| Error::InvalidDuration { secs })?;
    Instant::now()
        .checked_add(span)
        .ok_or(Error::InvalidDuration { secs })
}

#[derive(Debug)]
struct State {
    pub runtime: Runtime,
    pub frontend: Frontend,
    pub keys: u16,
    pub sounding: bool,
    pub deadline: Option<Instant>,
    pub dump: bool,
    pub rate: u64,
    pub ft: Instant,
}

impl State {
    fn new(options: Arguments) -> Result<Self> {
        let layout = options.layout.unwrap_or_default();
        let policy = Policy::new(options.mode.unwrap_or_default(), layout).with_screen_wrap(options.wrap);
        let mut ch8 = Chip8::load(&options.file, policy)?;
        ch8.cpu.flags.debug = options.debug;

        let mut held = vec![];
        for key in options.press.chars() {
            match identify_key(key) {
                Some(slot) => held.push(slot),
                None => eprintln!("{}", format!("no key {key:?} on the keypad").yellow()),
            }
        }

        let deadline = options.time.map(run_for).transpose()?;
        let runtime = Runtime::start(ch8, options.speed);
        let frontend = runtime.frontend();
        Ok(State {
            runtime,
            frontend,
            keys: layout.latch(held),
            sounding: false,
            deadline,
            dump: options.dump,
            rate: options.frame_rate.max(1),
            ft: Instant::now(),
        })
    }
    fn keys(&mut self) -> Result<()> {
        self.frontend.set_keys(self.keys)
    }
    fn sound(&mut self) -> Result<()> {
        let sounding = self.frontend.is_sounding()?;
        if sounding != self.sounding {
            self.sounding = sounding;
            match sounding {
                true => eprintln!("{}", "♪ beep".bright_cyan()),
                false => eprintln!("{}", "♪ ...".bright_black()),
            }
        }
        Ok(())
    }
    fn wait_for_next_frame(&mut self) {
        let rate = Duration::from_nanos(1_000_000_000 / self.rate + 1);
        std::thread::sleep(rate.saturating_sub(self.ft.elapsed()));
        self.ft += rate;
    }
    /// Stops the machine, and shows how it ended up
    fn finish(mut self) -> Result<()> {
        let outcome = self.runtime.stop();
        let ch8 = self.runtime.snapshot()?;
        ch8.screen.print_screen();
        if self.dump {
            ch8.cpu.dump();
        }
        if let Err(e) = &outcome {
            eprintln!("{}", e.bold().red());
        }
        outcome
    }
}

impl Iterator for State {
    type Item = Result<()>;

    fn next(&mut self) -> Option<Self::Item> {
        self.wait_for_next_frame();
        if !self.frontend.is_running() {
            return None;
        }
        if self.deadline.map_or(false, |deadline| Instant::now() >= deadline) {
            return None;
        }
        if let Err(e) = self.keys() {
            return Some(Err(e));
        }
        if let Err(e) = self.sound() {
            return Some(Err(e));
        }
        Some(Ok(()))
    }
}
