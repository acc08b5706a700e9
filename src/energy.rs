// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Calculate the energy of an image
//!
//! Given an image, calculate a map of how visually important every
//! pixel is.  Higher energy means the pixel is less likely to end up
//! in a removed seam.  The default estimator smooths a grayscale copy
//! of the image and sums the absolute horizontal and vertical Sobel
//! derivatives.

use crate::error::{Result, SeamError};
use crate::twodmap::TwoDimensionalMap;
use image::{imageops, GenericImageView, GrayImage, Pixel, Primitive};
use itertools::iproduct;
use num_traits::NumCast;

/// One non-negative importance score per pixel.
pub type EnergyMap = TwoDimensionalMap<f64>;

/// The sigma OpenCV derives for a 5x5 Gaussian kernel when asked to
/// pick one itself.
pub const DEFAULT_BLUR_SIGMA: f32 = 1.1;

/// Anything that can turn an image into an energy map of the same
/// dimensions.  Implementations must be pure: the same image always
/// produces the same map.
pub trait EnergyEstimator {
    fn compute_energy<I, P, S>(&self, image: &I) -> Result<EnergyMap>
    where
        I: GenericImageView<Pixel = P>,
        P: Pixel<Subpixel = S> + 'static,
        S: Primitive + 'static;
}

/// Gaussian pre-smoothing followed by a 3x3 Sobel operator on the
/// luminance channel: `energy = |dx| + |dy|`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SobelEnergy {
    /// Smoothing strength; `None` feeds the raw luminance straight to
    /// the Sobel operator.
    pub blur_sigma: Option<f32>,
}

impl Default for SobelEnergy {
    fn default() -> Self {
        SobelEnergy {
            blur_sigma: Some(DEFAULT_BLUR_SIGMA),
        }
    }
}

impl SobelEnergy {
    pub fn new(blur_sigma: Option<f32>) -> Self {
        SobelEnergy { blur_sigma }
    }
}

impl EnergyEstimator for SobelEnergy {
    fn compute_energy<I, P, S>(&self, image: &I) -> Result<EnergyMap>
    where
        I: GenericImageView<Pixel = P>,
        P: Pixel<Subpixel = S> + 'static,
        S: Primitive + 'static,
    {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(SeamError::InvalidInput(format!(
                "cannot compute the energy of a {}x{} image",
                width, height
            )));
        }

        let gray = imageops::grayscale(image);
        let luma = match self.blur_sigma {
            Some(sigma) if !(sigma.is_finite() && sigma > 0.0) => {
                return Err(SeamError::InvalidInput(format!(
                    "blur sigma must be a positive number, got {}",
                    sigma
                )));
            }
            Some(sigma) => intensities(&imageops::blur(&gray, sigma)),
            None => intensities(&gray),
        };
        Ok(sobel(&luma))
    }
}

// Image -> single-channel f64 field
fn intensities<I, P, S>(image: &I) -> TwoDimensionalMap<f64>
where
    I: GenericImageView<Pixel = P>,
    P: Pixel<Subpixel = S> + 'static,
    S: Primitive + 'static,
{
    let (width, height) = image.dimensions();
    let mut luma = TwoDimensionalMap::new(width, height);
    for (y, x) in iproduct!(0..height, 0..width) {
        let channel = image.get_pixel(x, y).to_luma().channels()[0];
        luma[(x, y)] = <f64 as NumCast>::from(channel).unwrap_or(0.0);
    }
    luma
}

// Reflect-101 addressing for a one-pixel overhang: -1 maps to 1 and n
// maps to n - 2.  A one-pixel-wide axis has nothing to reflect and
// just replicates.
#[inline]
fn reflect(i: i64, n: u32) -> u32 {
    let n = <i64 as From<u32>>::from(n);
    if n == 1 {
        return 0;
    }
    let r = if i < 0 {
        -i
    } else if i >= n {
        2 * n - 2 - i
    } else {
        i
    };
    r as u32
}

fn sobel(luma: &TwoDimensionalMap<f64>) -> EnergyMap {
    let (width, height) = luma.dimensions();
    let mut energy = EnergyMap::new(width, height);

    fill_rows(&mut energy, |y, row| {
        let yy = <i64 as From<u32>>::from(y);
        let (up, down) = (reflect(yy - 1, height), reflect(yy + 1, height));
        for (x, cell) in row.iter_mut().enumerate() {
            let xx = x as i64;
            let x = x as u32;
            let (left, right) = (reflect(xx - 1, width), reflect(xx + 1, width));
            let px = |cx: u32, cy: u32| luma[(cx, cy)];

            let dx = (px(right, up) - px(left, up))
                + 2.0 * (px(right, y) - px(left, y))
                + (px(right, down) - px(left, down));
            let dy = (px(left, down) - px(left, up))
                + 2.0 * (px(x, down) - px(x, up))
                + (px(right, down) - px(right, up));
            *cell = dx.abs() + dy.abs();
        }
    });
    energy
}

// Every pixel's energy is independent of every other, so rows can be
// handed out to workers in bands.
#[cfg(feature = "threaded")]
fn fill_rows<F>(map: &mut EnergyMap, fill: F)
where
    F: Fn(u32, &mut [f64]) + Sync,
{
    let workers = num_cpus::get().max(1);
    let band = ((map.height() as usize + workers - 1) / workers).max(1);
    let mut rows: Vec<(usize, &mut [f64])> = map.rows_mut().enumerate().collect();
    let fill = &fill;
    crossbeam::scope(|scope| {
        for chunk in rows.chunks_mut(band) {
            scope.spawn(move |_| {
                for (y, row) in chunk.iter_mut() {
                    fill(*y as u32, row);
                }
            });
        }
    })
    .unwrap_or_else(|panic| std::panic::resume_unwind(panic));
}

#[cfg(not(feature = "threaded"))]
fn fill_rows<F>(map: &mut EnergyMap, fill: F)
where
    F: Fn(u32, &mut [f64]),
{
    for (y, row) in map.rows_mut().enumerate() {
        fill(y as u32, row);
    }
}

/// Scale an energy map into an 8-bit grayscale image for display, with
/// the map's maximum mapped to white.  An all-zero map stays black.
pub fn energy_to_image(energy: &EnergyMap) -> GrayImage {
    let (width, height) = energy.dimensions();
    let factor = energy.as_slice().iter().cloned().fold(0.0, f64::max);
    let mut out = GrayImage::new(width, height);
    for (x, y, pixel) in out.enumerate_pixels_mut() {
        let level = if factor > 0.0 {
            (energy[(x, y)] / factor * 255.0).round()
        } else {
            0.0
        };
        pixel.channels_mut()[0] = level.max(0.0).min(255.0) as u8;
    }
    out
}
