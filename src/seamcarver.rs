// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Seamcarve - remove seams and drive the resize loop
//!
//! `remove_seam` narrows an image by one column along a seam,
//! `visualize_seam` paints a seam over a copy of an image, and
//! `SeamCarver` repeats energy -> seam -> removal until the image
//! reaches the requested width.  Every step produces a fresh buffer;
//! nothing the caller handed in is ever written to.

use crate::cq;
use crate::energy::{energy_to_image, EnergyEstimator, EnergyMap, SobelEnergy};
use crate::error::{Result, SeamError};
use crate::seamfinder::{extract_seam, find_min_seam, Seam};
use image::{GenericImageView, GrayImage, ImageBuffer, Pixel, Primitive, Rgb};
use std::time::Instant;
use tracing::{debug, info};

/// The direction a seam runs across.  Removing a vertical seam shrinks
/// the width; only that direction is carved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Width,
    Height,
}

/// The color seams are painted in by the command-line tool.
pub const SEAM_HIGHLIGHT: Rgb<u8> = Rgb([255, 0, 0]);

// A seam is only usable against an image if it has one column per
// row and every column is inside the image.  Checked before a single
// output pixel is written.
fn check_seam(seam: &Seam, width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(SeamError::InvalidInput(format!(
            "cannot carve a {}x{} image",
            width, height
        )));
    }
    if seam.len() != height as usize {
        return Err(SeamError::ShapeMismatch {
            expected: format!("seam of {} rows", height),
            actual: format!("seam of {} rows", seam.len()),
        });
    }
    match seam.columns().iter().position(|x| *x >= width) {
        Some(row) => Err(SeamError::SeamOutOfBounds {
            row: row as u32,
            column: seam.columns()[row],
            width,
        }),
        None => Ok(()),
    }
}

fn copy_image<I, P, S>(image: &I) -> ImageBuffer<P, Vec<S>>
where
    I: GenericImageView<Pixel = P>,
    P: Pixel<Subpixel = S> + 'static,
    S: Primitive + 'static,
{
    let (width, height) = image.dimensions();
    let mut scratch = ImageBuffer::new(width, height);
    image
        .pixels()
        .for_each(|(x, y, pixel)| scratch.put_pixel(x, y, pixel));
    scratch
}

/// Return a new image one column narrower than `image`, with the pixel
/// at `seam[y]` dropped from every row `y` and everything to its right
/// shifted one column left.
pub fn remove_seam<I, P, S>(image: &I, seam: &Seam) -> Result<ImageBuffer<P, Vec<S>>>
where
    I: GenericImageView<Pixel = P>,
    P: Pixel<Subpixel = S> + 'static,
    S: Primitive + 'static,
{
    let (width, height) = image.dimensions();
    check_seam(seam, width, height)?;

    let mut imgbuf = ImageBuffer::new(width - 1, height);
    for (y, &cut) in (0..height).zip(seam.columns()) {
        for x in 0..width - 1 {
            let source = cq!(x < cut, x, x + 1);
            imgbuf.put_pixel(x, y, image.get_pixel(source, y));
        }
    }
    Ok(imgbuf)
}

/// Return a copy of `image` with every pixel on `seam` painted over
/// with `highlight`.
pub fn visualize_seam<I, P, S>(image: &I, seam: &Seam, highlight: P) -> Result<ImageBuffer<P, Vec<S>>>
where
    I: GenericImageView<Pixel = P>,
    P: Pixel<Subpixel = S> + 'static,
    S: Primitive + 'static,
{
    let (width, height) = image.dimensions();
    check_seam(seam, width, height)?;

    let mut annotated = copy_image(image);
    for (y, &x) in (0..height).zip(seam.columns()) {
        annotated.put_pixel(x, y, highlight);
    }
    Ok(annotated)
}

/// What the last carving step saw: the image before removal, its
/// energy map, and the seam that was cut out of it.
#[derive(Debug)]
pub struct Diagnostics<P: Pixel<Subpixel = S> + 'static, S: Primitive + 'static> {
    pub source: ImageBuffer<P, Vec<S>>,
    pub energy: EnergyMap,
    pub seam: Seam,
}

impl<P, S> Diagnostics<P, S>
where
    P: Pixel<Subpixel = S> + 'static,
    S: Primitive + 'static,
{
    /// The energy map, scaled for display.
    pub fn energy_image(&self) -> GrayImage {
        energy_to_image(&self.energy)
    }

    /// The source image with the removed seam painted in.
    pub fn seam_image(&self, highlight: P) -> Result<ImageBuffer<P, Vec<S>>> {
        visualize_seam(&self.source, &self.seam, highlight)
    }
}

/// The outcome of a resize.
#[derive(Debug)]
pub struct Retargeted<P: Pixel<Subpixel = S> + 'static, S: Primitive + 'static> {
    pub image: ImageBuffer<P, Vec<S>>,
    pub seams_removed: u32,
    /// Only present when the carver was asked to keep diagnostics.
    pub last: Option<Diagnostics<P, S>>,
}

/// Repeatedly carves the cheapest vertical seam out of an image.  No
/// state survives from one step to the next: every step recomputes
/// the energy of the image the previous step produced.
#[derive(Debug, Clone, Default)]
pub struct SeamCarver<E: EnergyEstimator = SobelEnergy> {
    estimator: E,
    keep_diagnostics: bool,
}

impl SeamCarver<SobelEnergy> {
    /// A carver using the default Sobel energy.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<E: EnergyEstimator> SeamCarver<E> {
    pub fn with_estimator(estimator: E) -> Self {
        SeamCarver {
            estimator,
            keep_diagnostics: false,
        }
    }

    /// Hold on to the last step's energy map, seam, and source image.
    pub fn keep_diagnostics(mut self, keep: bool) -> Self {
        self.keep_diagnostics = keep;
        self
    }

    /// One full step: energy, cheapest seam, removal.
    pub fn carve_once<I, P, S>(&self, image: &I) -> Result<(ImageBuffer<P, Vec<S>>, Seam)>
    where
        I: GenericImageView<Pixel = P>,
        P: Pixel<Subpixel = S> + 'static,
        S: Primitive + 'static,
    {
        let (_, seam) = self.next_seam(image)?;
        Ok((remove_seam(image, &seam)?, seam))
    }

    fn next_seam<I, P, S>(&self, image: &I) -> Result<(EnergyMap, Seam)>
    where
        I: GenericImageView<Pixel = P>,
        P: Pixel<Subpixel = S> + 'static,
        S: Primitive + 'static,
    {
        let energy = self.estimator.compute_energy(image)?;
        let (cumulative, backtrack) = find_min_seam(&energy)?;
        let seam = extract_seam(&cumulative, &backtrack)?;
        Ok((energy, seam))
    }

    /// Carve `image` down to `target_width` columns.  Height never
    /// changes.  Asking for the current width returns an unchanged copy.
    pub fn resize_to_width<I, P, S>(&self, image: &I, target_width: u32) -> Result<ImageBuffer<P, Vec<S>>>
    where
        I: GenericImageView<Pixel = P>,
        P: Pixel<Subpixel = S> + 'static,
        S: Primitive + 'static,
    {
        Ok(self.shrink_width(image, target_width)?.image)
    }

    /// Carve along a single axis.  Only `Axis::Width` is supported.
    pub fn carve<I, P, S>(&self, image: &I, axis: Axis, target: u32) -> Result<ImageBuffer<P, Vec<S>>>
    where
        I: GenericImageView<Pixel = P>,
        P: Pixel<Subpixel = S> + 'static,
        S: Primitive + 'static,
    {
        match axis {
            Axis::Width => self.resize_to_width(image, target),
            Axis::Height => Err(SeamError::UnsupportedAxis(Axis::Height)),
        }
    }

    /// Resize to `target_width` x `target_height`.  Neither dimension
    /// may grow, and the height may only stay as it is, since
    /// horizontal seams are not carved.  Both are checked before any
    /// work starts.
    pub fn retarget<I, P, S>(&self, image: &I, target_width: u32, target_height: u32) -> Result<Retargeted<P, S>>
    where
        I: GenericImageView<Pixel = P>,
        P: Pixel<Subpixel = S> + 'static,
        S: Primitive + 'static,
    {
        let (width, height) = image.dimensions();
        if target_width > width || target_height > height {
            return Err(SeamError::InvalidInput(format!(
                "cannot enlarge a {}x{} image to {}x{}",
                width, height, target_width, target_height
            )));
        }
        if target_height < height {
            return Err(SeamError::UnsupportedAxis(Axis::Height));
        }
        self.shrink_width(image, target_width)
    }

    // This is absurdly inefficient, as the entire energy map and seam
    // tables are rebuilt on every step.  Only the columns around the
    // removed seam actually change.
    fn shrink_width<I, P, S>(&self, image: &I, target_width: u32) -> Result<Retargeted<P, S>>
    where
        I: GenericImageView<Pixel = P>,
        P: Pixel<Subpixel = S> + 'static,
        S: Primitive + 'static,
    {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(SeamError::InvalidInput(format!(
                "cannot resize a {}x{} image",
                width, height
            )));
        }
        if target_width < 1 || target_width > width {
            return Err(SeamError::InvalidInput(format!(
                "target width {} is outside 1..={}",
                target_width, width
            )));
        }

        let started = Instant::now();
        let steps = width - target_width;
        let mut scratch = copy_image(image);
        let mut last = None;

        for step in 0..steps {
            let (energy, seam) = self.next_seam(&scratch)?;
            let narrowed = remove_seam(&scratch, &seam)?;
            debug!(step, width = narrowed.width(), cost = seam.cost(), "removed seam");
            if self.keep_diagnostics {
                last = Some(Diagnostics {
                    source: scratch,
                    energy,
                    seam,
                });
            }
            scratch = narrowed;
        }

        // Nothing was carved, but the energy and the seam that would
        // have gone next are still worth reporting.
        if self.keep_diagnostics && last.is_none() {
            let (energy, seam) = self.next_seam(&scratch)?;
            last = Some(Diagnostics {
                source: scratch.clone(),
                energy,
                seam,
            });
        }

        info!(
            from = width,
            to = target_width,
            height,
            seams = steps,
            elapsed = ?started.elapsed(),
            "resize finished"
        );
        Ok(Retargeted {
            image: scratch,
            seams_removed: steps,
            last,
        })
    }
}
