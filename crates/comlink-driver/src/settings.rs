// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Serial line settings (baud, data bits, parity, stop bits)

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{DriverError, DriverResult};

/// Parity bit mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Parity {
    #[default]
    None,
    Odd,
    Even,
    Mark,
    Space,
}

/// Number of stop bits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopBits {
    #[default]
    One,
    OnePointFive,
    Two,
}

/// Line coding applied when a port is opened or reconfigured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialSettings {
    pub baud: u32,
    pub data_bits: u8,
    pub parity: Parity,
    pub stop_bits: StopBits,
}

impl Default for SerialSettings {
    fn default() -> Self {
        Self {
            baud: 115_200,
            data_bits: 8,
            parity: Parity::None,
            stop_bits: StopBits::One,
        }
    }
}

impl SerialSettings {
    /// Default line coding (8N1) at the given baud rate
    pub fn with_baud(baud: u32) -> Self {
        Self {
            baud,
            ..Default::default()
        }
    }

    /// Check the settings are encodable on a UART
    ///
    /// # Errors
    ///
    /// Returns `DriverError::InvalidSettings` for a zero baud rate or a data
    /// bit count outside 5..=8.
    pub fn validate(&self) -> DriverResult<()> {
        if self.baud == 0 {
            return Err(DriverError::InvalidSettings(
                "baud rate must be greater than 0".to_string(),
            ));
        }
        if !(5..=8).contains(&self.data_bits) {
            return Err(DriverError::InvalidSettings(format!(
                "data bits must be between 5 and 8, got {}",
                self.data_bits
            )));
        }
        Ok(())
    }
}

impl fmt::Display for SerialSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parity = match self.parity {
            Parity::None => 'N',
            Parity::Odd => 'O',
            Parity::Even => 'E',
            Parity::Mark => 'M',
            Parity::Space => 'S',
        };
        let stop_bits = match self.stop_bits {
            StopBits::One => "1",
            StopBits::OnePointFive => "1.5",
            StopBits::Two => "2",
        };
        write!(f, "{} {}{}{}", self.baud, self.data_bits, parity, stop_bits)
    }
}

impl FromStr for Parity {
    type Err = DriverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" | "n" => Ok(Self::None),
            "odd" | "o" => Ok(Self::Odd),
            "even" | "e" => Ok(Self::Even),
            "mark" | "m" => Ok(Self::Mark),
            "space" | "s" => Ok(Self::Space),
            other => Err(DriverError::InvalidSettings(format!(
                "unknown parity '{}'",
                other
            ))),
        }
    }
}

impl FromStr for StopBits {
    type Err = DriverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "one" | "1" => Ok(Self::One),
            "one_point_five" | "1.5" => Ok(Self::OnePointFive),
            "two" | "2" => Ok(Self::Two),
            other => Err(DriverError::InvalidSettings(format!(
                "unknown stop bits '{}'",
                other
            ))),
        }
    }
}
