// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Find the cheapest top-to-bottom seam in an energy map.
//!
//! The forward pass fills a cumulative energy map, in which every cell
//! holds the cost of the cheapest 8-connected path from the top row
//! down to that cell, and a backtrack table recording which of the
//! (up to) three cells above it that path came through.  The backward
//! pass starts at the cheapest cell of the bottom row and follows the
//! backtrack table up to the top.
//!
//! Ties are always broken toward the left-most column, both when
//! choosing a parent and when choosing where the seam ends.  Seam
//! shapes depend on it, so it is kept in a single helper.

use crate::cq;
use crate::energy::EnergyMap;
use crate::error::{Result, SeamError};
use crate::twodmap::TwoDimensionalMap;

/// `M[y, x]`: the minimum total energy of any path from row 0 to `(x, y)`.
pub type CumulativeEnergyMap = TwoDimensionalMap<f64>;

/// `backtrack[y, x]`: the column in row `y - 1` that the cheapest path
/// to `(x, y)` passes through.  Row 0 is unused.
pub type BacktrackTable = TwoDimensionalMap<u32>;

/// A vertical seam: one column per row, top to bottom, each step moving
/// at most one column left or right, and the total energy along it.
#[derive(Debug, Clone, PartialEq)]
pub struct Seam {
    columns: Vec<u32>,
    cost: f64,
}

impl Seam {
    /// Build a seam from explicit columns.  Nothing is checked here;
    /// consumers validate the seam against the image they apply it to.
    pub fn new(columns: Vec<u32>, cost: f64) -> Self {
        Seam { columns, cost }
    }

    pub fn columns(&self) -> &[u32] {
        &self.columns
    }

    pub fn cost(&self) -> f64 {
        self.cost
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

// The first minimum wins.  Energies are never NaN, so a strict `<`
// walk is a total order here.
#[inline]
fn leftmost_argmin(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate().skip(1) {
        if *v < values[best] {
            best = i;
        }
    }
    best
}

// Which of up-left, up, and up-right (clipped at the edges) is the
// cheapest parent of column `x`?
#[inline]
fn cheapest_parent(above: &[f64], x: usize) -> usize {
    let maxwidth = above.len() - 1;
    let lo = cq!(x == 0, 0, x - 1);
    let hi = cq!(x >= maxwidth, maxwidth, x + 1);
    lo + leftmost_argmin(&above[lo..=hi])
}

// Fill one band of a row.  `offset` is the column of the band's first
// cell; every cell depends only on the finished row above it.
fn accumulate_band(
    above: &[f64],
    energy: &[f64],
    offset: usize,
    cumulative: &mut [f64],
    backtrack: &mut [u32],
) {
    for (i, (cell, parent)) in cumulative.iter_mut().zip(backtrack.iter_mut()).enumerate() {
        let x = offset + i;
        let parent_x = cheapest_parent(above, x);
        *parent = parent_x as u32;
        *cell = energy[x] + above[parent_x];
    }
}

#[cfg(feature = "threaded")]
const MIN_PARALLEL_WIDTH: usize = 512;

// Columns within a row are independent of each other, so a wide row
// is split into bands.  The next row does not start until the scope
// has joined every band of this one.
#[cfg(feature = "threaded")]
fn accumulate_row(above: &[f64], energy: &[f64], cumulative: &mut [f64], backtrack: &mut [u32]) {
    let width = cumulative.len();
    if width < MIN_PARALLEL_WIDTH {
        return accumulate_band(above, energy, 0, cumulative, backtrack);
    }
    let workers = num_cpus::get().max(1);
    let band = ((width + workers - 1) / workers).max(1);
    crossbeam::scope(|scope| {
        for (n, (cells, parents)) in cumulative
            .chunks_mut(band)
            .zip(backtrack.chunks_mut(band))
            .enumerate()
        {
            scope.spawn(move |_| accumulate_band(above, energy, n * band, cells, parents));
        }
    })
    .unwrap_or_else(|panic| std::panic::resume_unwind(panic));
}

#[cfg(not(feature = "threaded"))]
fn accumulate_row(above: &[f64], energy: &[f64], cumulative: &mut [f64], backtrack: &mut [u32]) {
    accumulate_band(above, energy, 0, cumulative, backtrack)
}

/// The forward pass: build the cumulative energy map and backtrack
/// table for `energy`.
pub fn find_min_seam(energy: &EnergyMap) -> Result<(CumulativeEnergyMap, BacktrackTable)> {
    let (width, height) = energy.dimensions();
    if width == 0 || height == 0 {
        return Err(SeamError::InvalidInput(format!(
            "cannot find a seam in a {}x{} energy map",
            width, height
        )));
    }

    let mut cumulative = CumulativeEnergyMap::new(width, height);
    let mut backtrack = BacktrackTable::new(width, height);

    // Populate the first row with their native energies.
    cumulative.row_mut(0).copy_from_slice(energy.row(0));

    for y in 1..height {
        let (above, current) = cumulative.split_rows_mut(y);
        accumulate_row(above, energy.row(y), current, backtrack.row_mut(y));
    }

    Ok((cumulative, backtrack))
}

/// The backward pass: walk from the cheapest bottom cell up through
/// the backtrack table.
pub fn extract_seam(cumulative: &CumulativeEnergyMap, backtrack: &BacktrackTable) -> Result<Seam> {
    let (width, height) = cumulative.dimensions();
    if backtrack.dimensions() != (width, height) {
        return Err(SeamError::ShapeMismatch {
            expected: format!("{}x{} backtrack table", width, height),
            actual: format!("{}x{}", backtrack.width(), backtrack.height()),
        });
    }
    if width == 0 || height == 0 {
        return Err(SeamError::InvalidInput(format!(
            "cannot extract a seam from a {}x{} map",
            width, height
        )));
    }

    let bottom = cumulative.row(height - 1);
    let mut seam_col = leftmost_argmin(bottom) as u32;
    let cost = bottom[seam_col as usize];

    // Working backwards, collect the column for every row, then
    // reverse into top-to-bottom order.
    let mut columns = Vec::with_capacity(height as usize);
    for y in (0..height).rev() {
        if seam_col >= width {
            return Err(SeamError::SeamOutOfBounds {
                row: y,
                column: seam_col,
                width,
            });
        }
        columns.push(seam_col);
        if y > 0 {
            seam_col = backtrack[(seam_col, y)];
        }
    }
    columns.reverse();

    Ok(Seam::new(columns, cost))
}

/// Both passes at once: the cheapest vertical seam of `energy`.
pub fn find_vertical_seam(energy: &EnergyMap) -> Result<Seam> {
    let (cumulative, backtrack) = find_min_seam(energy)?;
    extract_seam(&cumulative, &backtrack)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENERGY_DATA: [f64; 20] = [
        9., 9., 0., 9., 9., 9., 1., 9., 8., 9., 9., 9., 9., 9., 0., 9., 9., 9., 0., 9.,
    ];

    fn map(width: u32, height: u32, data: &[f64]) -> EnergyMap {
        EnergyMap::from_vec(width, height, data.to_vec()).unwrap()
    }

    // A small linear congruential generator, so the property checks
    // below run over many maps without pulling in a random crate.
    fn scrambled(width: u32, height: u32, seed: u64) -> EnergyMap {
        let mut state = seed;
        let data = (0..width * height)
            .map(|_| {
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                ((state >> 33) % 8) as f64
            })
            .collect();
        EnergyMap::from_vec(width, height, data).unwrap()
    }

    #[test]
    fn energy_grid_to_vertical_seam() {
        let seam = find_vertical_seam(&map(5, 4, &ENERGY_DATA)).unwrap();
        assert_eq!(seam.columns(), &[2, 3, 4, 3]);
        assert_eq!(seam.cost(), 8.0);
    }

    #[test]
    fn diagonal_of_ones() {
        let energy = map(3, 3, &[1., 9., 9., 9., 1., 9., 9., 9., 1.]);
        let (cumulative, backtrack) = find_min_seam(&energy).unwrap();
        assert_eq!(cumulative.row(0), &[1., 9., 9.]);
        assert_eq!(cumulative.row(1), &[10., 2., 18.]);
        assert_eq!(cumulative.row(2), &[11., 11., 3.]);
        assert_eq!(backtrack.row(1), &[0, 0, 1]);
        assert_eq!(backtrack.row(2), &[1, 1, 1]);

        let seam = extract_seam(&cumulative, &backtrack).unwrap();
        assert_eq!(seam.columns(), &[0, 1, 2]);
        assert_eq!(seam.cost(), 3.0);
    }

    #[test]
    fn ties_prefer_the_leftmost_column() {
        let energy = map(3, 3, &[1.; 9]);
        let (cumulative, backtrack) = find_min_seam(&energy).unwrap();
        assert_eq!(backtrack.row(1), &[0, 0, 1]);
        assert_eq!(backtrack.row(2), &[0, 0, 1]);
        let seam = extract_seam(&cumulative, &backtrack).unwrap();
        assert_eq!(seam.columns(), &[0, 0, 0]);
        assert_eq!(seam.cost(), 3.0);
    }

    #[test]
    fn single_row_is_its_own_argmin() {
        let seam = find_vertical_seam(&map(4, 1, &[5., 2., 2., 7.])).unwrap();
        assert_eq!(seam.columns(), &[1]);
        assert_eq!(seam.cost(), 2.0);
    }

    #[test]
    fn single_column_runs_straight_down() {
        let seam = find_vertical_seam(&map(1, 3, &[4., 5., 6.])).unwrap();
        assert_eq!(seam.columns(), &[0, 0, 0]);
        assert_eq!(seam.cost(), 15.0);
    }

    #[test]
    fn seams_are_connected_and_in_bounds() {
        for seed in 0..40u64 {
            let (width, height) = (1 + (seed % 9) as u32, 1 + (seed % 7) as u32);
            let seam = find_vertical_seam(&scrambled(width, height, seed)).unwrap();
            assert_eq!(seam.len(), height as usize);
            assert!(seam.columns().iter().all(|c| *c < width));
            for pair in seam.columns().windows(2) {
                assert!((i64::from(pair[0]) - i64::from(pair[1])).abs() <= 1);
            }
        }
    }

    #[test]
    fn repeated_searches_agree() {
        let energy = scrambled(11, 8, 7);
        let first = find_vertical_seam(&energy).unwrap();
        for _ in 0..5 {
            assert_eq!(find_vertical_seam(&energy).unwrap(), first);
        }
    }

    #[test]
    fn cost_is_the_sum_along_the_seam() {
        let energy = scrambled(9, 6, 3);
        let seam = find_vertical_seam(&energy).unwrap();
        let sum: f64 = seam
            .columns()
            .iter()
            .enumerate()
            .map(|(y, x)| energy[(*x, y as u32)])
            .sum();
        assert_eq!(seam.cost(), sum);
    }

    // Fills both tables one whole row at a time with no banding, for
    // comparison against whatever `find_min_seam` was built with.
    fn single_band_tables(energy: &EnergyMap) -> (CumulativeEnergyMap, BacktrackTable) {
        let (width, height) = energy.dimensions();
        let mut cumulative = CumulativeEnergyMap::new(width, height);
        let mut backtrack = BacktrackTable::new(width, height);
        cumulative.row_mut(0).copy_from_slice(energy.row(0));
        for y in 1..height {
            let (above, current) = cumulative.split_rows_mut(y);
            accumulate_band(above, energy.row(y), 0, current, backtrack.row_mut(y));
        }
        (cumulative, backtrack)
    }

    #[test]
    fn wide_maps_match_a_single_band_pass() {
        let energy = scrambled(1300, 40, 11);
        let (cumulative, backtrack) = find_min_seam(&energy).unwrap();
        let (expected_cumulative, expected_backtrack) = single_band_tables(&energy);
        assert_eq!(cumulative, expected_cumulative);
        assert_eq!(backtrack, expected_backtrack);
        assert_eq!(
            extract_seam(&cumulative, &backtrack).unwrap(),
            extract_seam(&expected_cumulative, &expected_backtrack).unwrap()
        );
    }

    #[test]
    fn empty_maps_are_rejected() {
        let energy = EnergyMap::new(0, 4);
        assert!(matches!(
            find_min_seam(&energy),
            Err(SeamError::InvalidInput(_))
        ));
    }

    #[test]
    fn mismatched_tables_are_rejected() {
        let cumulative = CumulativeEnergyMap::new(3, 3);
        let backtrack = BacktrackTable::new(3, 2);
        assert!(matches!(
            extract_seam(&cumulative, &backtrack),
            Err(SeamError::ShapeMismatch { .. })
        ));
    }
}
