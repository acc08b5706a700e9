// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors raised by the carving engine.
//!
//! Every one of these is a caller-input problem; the engine is pure
//! and deterministic, so nothing here is worth retrying unchanged.

use crate::seamcarver::Axis;
use failure::Fail;

#[derive(Debug, Fail, PartialEq)]
pub enum SeamError {
    /// A zero-area image or energy map, or a target size outside the
    /// range the image can be carved to.
    #[fail(display = "invalid input: {}", _0)]
    InvalidInput(String),

    /// A seam or table whose length disagrees with the image it is
    /// applied to.
    #[fail(display = "shape mismatch: expected {}, got {}", expected, actual)]
    ShapeMismatch { expected: String, actual: String },

    /// A seam that steps outside the image.
    #[fail(
        display = "seam column {} in row {} is outside an image {} pixels wide",
        column, row, width
    )]
    SeamOutOfBounds { row: u32, column: u32, width: u32 },

    /// Only vertical seams (width reduction) are carved.
    #[fail(display = "carving along {:?} is not supported", _0)]
    UnsupportedAxis(Axis),
}

pub type Result<T> = std::result::Result<T, SeamError>;
