// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! Selects the opcode behavior of the [super::CPU]

use crate::error::Error;
use std::{fmt::Display, str::FromStr};

/// Selects which interpreter lineage the divergent opcodes follow
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Mode {
    /// COSMAC VIP behavior
    Legacy,
    /// CHIP-48/SUPER-CHIP behavior
    #[default]
    Modern,
}

impl FromStr for Mode {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "legacy" | "cosmac" | "vip" | "chip8" | "chip-8" => Ok(Mode::Legacy),
            "modern" | "schip" | "superchip" | "chip48" | "chip-48" => Ok(Mode::Modern),
            _ => Err(Error::InvalidMode {
                mode: s.to_string(),
            }),
        }
    }
}

impl Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Mode::Legacy => "Legacy",
                Mode::Modern => "Modern",
            }
        )
    }
}
