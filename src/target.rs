// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Requested output sizes, as typed on the command line.

use crate::cq;
use crate::error::{Result, SeamError};
use std::str::FromStr;

/// A size is either a whole number of pixels (`"240"`) or a fraction
/// of the current size in `(0, 1]` (`"0.75"`, `"1.0"`).  A bare `"1"`
/// is read as the whole size, not a single pixel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TargetSize {
    Pixels(u32),
    Fraction(f32),
}

impl FromStr for TargetSize {
    type Err = SeamError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Ok(pixels) = s.parse::<u32>() {
            return Ok(cq!(pixels == 1, TargetSize::Fraction(1.0), TargetSize::Pixels(pixels)));
        }
        match s.parse::<f32>() {
            Ok(fraction) if fraction > 0.0 && fraction <= 1.0 => Ok(TargetSize::Fraction(fraction)),
            _ => Err(SeamError::InvalidInput(format!(
                "'{}' is neither a pixel count nor a fraction in (0, 1]",
                s
            ))),
        }
    }
}

impl TargetSize {
    /// Turn the request into pixels for a dimension that is currently
    /// `current` long.  Fractions are applied in `f32` and truncated; a
    /// result of zero is an error, as is asking for more than `current`.
    pub fn resolve(self, current: u32) -> Result<u32> {
        let pixels = match self {
            TargetSize::Pixels(pixels) => pixels,
            TargetSize::Fraction(fraction) => (current as f32 * fraction) as u32,
        };
        if pixels < 1 || pixels > current {
            return Err(SeamError::InvalidInput(format!(
                "{:?} resolves to {} pixels, outside 1..={}",
                self, pixels, current
            )));
        }
        Ok(pixels)
    }
}
