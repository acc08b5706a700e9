// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Content-aware image narrowing.
//!
//! Repeatedly finds the connected top-to-bottom path of pixels with the
//! least energy and cuts it out, one column per step, until the image
//! is as narrow as requested.

mod ternary;

pub mod error;
pub use error::{Result, SeamError};

pub mod twodmap;
pub use twodmap::TwoDimensionalMap;

pub mod energy;
pub use energy::{energy_to_image, EnergyEstimator, EnergyMap, SobelEnergy};

pub mod seamfinder;
pub use seamfinder::{extract_seam, find_min_seam, find_vertical_seam, BacktrackTable, CumulativeEnergyMap, Seam};

pub mod seamcarver;
pub use seamcarver::{remove_seam, visualize_seam, SEAM_HIGHLIGHT, Axis, Diagnostics, Retargeted, SeamCarver};

pub mod target;
pub use target::TargetSize;
