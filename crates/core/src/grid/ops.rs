//! Raster neighbourhood and distance operations
//!
//! - [`window_count`]: number of flagged cells in a square moving window,
//!   computed with a summed-area table in O(n) regardless of window size.
//! - [`distance_to`]: distance from every cell to the nearest flagged cell
//!   ("spread"), using a two-pass 8-neighbour chamfer transform with weights
//!   1 and √2, scaled by the cell size.
//! - [`fringe_mask`]: cells of a class with fewer than 8 same-class cells in
//!   their 3×3 window; cells beyond the raster count as outside the class.

use super::raster::Raster;

/// Count `true` cells inside a `side`×`side` window centred on each cell.
///
/// The centre cell is included. Windows are clipped at the raster border.
///
/// # Arguments
///
/// * `mask` - Cells to count
/// * `side` - Window side length in cells (odd values give a centred window)
#[must_use]
pub fn window_count(mask: &Raster<bool>, side: usize) -> Raster<u32> {
    let (w, h) = (mask.width(), mask.height());
    let radius = side / 2;

    // Summed-area table with a zero border row/column
    let mut sat = vec![0_u32; (w + 1) * (h + 1)];
    for y in 0..h {
        let mut row_sum = 0_u32;
        for x in 0..w {
            row_sum += u32::from(mask[y * w + x]);
            sat[(y + 1) * (w + 1) + (x + 1)] = sat[y * (w + 1) + (x + 1)] + row_sum;
        }
    }

    Raster::from_fn(w, h, |x, y| {
        let x0 = x.saturating_sub(radius);
        let y0 = y.saturating_sub(radius);
        let x1 = (x + radius + 1).min(w);
        let y1 = (y + radius + 1).min(h);
        sat[y1 * (w + 1) + x1] + sat[y0 * (w + 1) + x0]
            - sat[y0 * (w + 1) + x1]
            - sat[y1 * (w + 1) + x0]
    })
}

/// Distance from each cell to the nearest `true` cell of `targets`.
///
/// Target cells have distance 0. When no target exists every cell is
/// `f32::INFINITY`.
///
/// # Arguments
///
/// * `targets` - Feature cells (roads, rivers, settlements, ...)
/// * `cell_size` - Cell edge length in meters
#[must_use]
pub fn distance_to(targets: &Raster<bool>, cell_size: f32) -> Raster<f32> {
    let (w, h) = (targets.width(), targets.height());
    let mut dist = targets.map(|&t| if t { 0.0 } else { f32::INFINITY });
    let diagonal = std::f32::consts::SQRT_2;

    // Forward pass: top-left to bottom-right
    for y in 0..h {
        for x in 0..w {
            let idx = y * w + x;
            let mut best = dist[idx];
            if x > 0 {
                best = best.min(dist[idx - 1] + 1.0);
            }
            if y > 0 {
                best = best.min(dist[idx - w] + 1.0);
                if x > 0 {
                    best = best.min(dist[idx - w - 1] + diagonal);
                }
                if x + 1 < w {
                    best = best.min(dist[idx - w + 1] + diagonal);
                }
            }
            dist[idx] = best;
        }
    }

    // Backward pass: bottom-right to top-left
    for y in (0..h).rev() {
        for x in (0..w).rev() {
            let idx = y * w + x;
            let mut best = dist[idx];
            if x + 1 < w {
                best = best.min(dist[idx + 1] + 1.0);
            }
            if y + 1 < h {
                best = best.min(dist[idx + w] + 1.0);
                if x + 1 < w {
                    best = best.min(dist[idx + w + 1] + diagonal);
                }
                if x > 0 {
                    best = best.min(dist[idx + w - 1] + diagonal);
                }
            }
            dist[idx] = best;
        }
    }

    for d in dist.as_mut_slice() {
        *d *= cell_size;
    }
    dist
}

/// Cells of `class` with fewer than 8 same-class neighbours.
///
/// Out-of-bounds neighbours are not of the class, so a class cell on the
/// raster border is always fringe.
#[must_use]
pub fn fringe_mask(class: &Raster<bool>) -> Raster<bool> {
    let mut fringe = Raster::filled(class.width(), class.height(), false);
    for idx in 0..class.len() {
        if class[idx] && neighbor_count(class, idx) < 8 {
            fringe[idx] = true;
        }
    }
    fringe
}

/// Number of in-bounds 8-neighbours belonging to `class`.
#[must_use]
pub fn neighbor_count(class: &Raster<bool>, idx: usize) -> usize {
    class.neighbors(idx).filter(|&n| class[n]).count()
}
