//! Terrain slope derived from a digital elevation model
//!
//! Slope drives the no-allocation masks: each land-use type has a
//! "difficult terrain" slope range, and allocation prefers favorable terrain
//! below that range before falling back to difficult terrain.
//!
//! # Scientific Reference
//!
//! Horn, B.K.P. (1981). "Hill Shading and the Reflectance Map."
//! Proceedings of the IEEE, 69(1), 14-47.

use super::raster::Raster;

/// Slope in degrees at every cell using Horn's 3x3 kernel.
///
/// Edge cells reuse the nearest in-bounds elevation (clamped sampling), so
/// the raster border behaves like a flat continuation.
///
/// # Arguments
///
/// * `elevation` - Elevation in meters
/// * `cell_size` - Cell edge length in meters
///
/// # Returns
///
/// Slope raster in degrees (0-90)
#[must_use]
pub fn slope_degrees(elevation: &Raster<f32>, cell_size: f32) -> Raster<f32> {
    let (w, h) = (elevation.width(), elevation.height());
    if w == 0 || h == 0 {
        return Raster::filled(w, h, 0.0);
    }

    let sample = |x: isize, y: isize| -> f32 {
        let cx = x.clamp(0, w as isize - 1) as usize;
        let cy = y.clamp(0, h as isize - 1) as usize;
        elevation[cy * w + cx]
    };

    Raster::from_fn(w, h, |x, y| {
        let (x, y) = (x as isize, y as isize);
        // z[0] z[1] z[2]   (NW) (N) (NE)
        // z[3] z[4] z[5]   (W)  (C) (E)
        // z[6] z[7] z[8]   (SW) (S) (SE)
        // Row index grows southward
        let z = [
            sample(x - 1, y - 1),
            sample(x, y - 1),
            sample(x + 1, y - 1),
            sample(x - 1, y),
            sample(x, y),
            sample(x + 1, y),
            sample(x - 1, y + 1),
            sample(x, y + 1),
            sample(x + 1, y + 1),
        ];

        let dz_dx = ((z[2] + 2.0 * z[5] + z[8]) - (z[0] + 2.0 * z[3] + z[6])) / (8.0 * cell_size);
        let dz_dy = ((z[6] + 2.0 * z[7] + z[8]) - (z[0] + 2.0 * z[1] + z[2])) / (8.0 * cell_size);

        (dz_dx * dz_dx + dz_dy * dz_dy).sqrt().atan().to_degrees()
    })
}
