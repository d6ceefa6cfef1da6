//! Generic 2D raster container
//!
//! Stores one value per cell as a flat `Vec<T>` in row-major order
//! (`y * width + x`). All landscape layers (land use, biomass, succession age,
//! suitability, masks) are rasters of the same shape.

use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};
use thiserror::Error;

/// Raster construction failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RasterError {
    #[error("raster data holds {len} cells but shape {width}x{height} needs {expected}")]
    LengthMismatch {
        width: usize,
        height: usize,
        len: usize,
        expected: usize,
    },
    #[error("raster shape {found_width}x{found_height} differs from landscape shape {width}x{height}")]
    ShapeMismatch {
        width: usize,
        height: usize,
        found_width: usize,
        found_height: usize,
    },
}

/// Offsets of the 8-neighbourhood (Moore neighbourhood)
const MOORE: [(isize, isize); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Row-major 2D grid of values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Raster<T> {
    width: usize,
    height: usize,
    data: Vec<T>,
}

impl<T: Clone> Raster<T> {
    /// Create a raster with every cell set to `value`
    ///
    /// # Arguments
    ///
    /// * `width` - Grid width in cells
    /// * `height` - Grid height in cells
    /// * `value` - Initial value for all cells
    #[must_use]
    pub fn filled(width: usize, height: usize, value: T) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }

    /// Set every cell to `value`
    pub fn fill(&mut self, value: T) {
        self.data.fill(value);
    }
}

impl<T> Raster<T> {
    /// Wrap existing row-major data
    ///
    /// # Errors
    ///
    /// Returns [`RasterError::LengthMismatch`] if `data.len() != width * height`
    pub fn from_vec(width: usize, height: usize, data: Vec<T>) -> Result<Self, RasterError> {
        let expected = width * height;
        if data.len() != expected {
            return Err(RasterError::LengthMismatch {
                width,
                height,
                len: data.len(),
                expected,
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Build a raster by evaluating `f(x, y)` for every cell
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let mut data = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            data,
        }
    }

    /// Grid width in cells
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Grid height in cells
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of cells
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True for a 0x0 raster
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Flat index of `(x, y)`
    #[inline]
    pub fn index_of(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    /// `(x, y)` of a flat index
    #[inline]
    pub fn coords(&self, idx: usize) -> (usize, usize) {
        (idx % self.width, idx / self.width)
    }

    /// Value at `(x, y)`, or `None` when out of bounds
    pub fn get(&self, x: usize, y: usize) -> Option<&T> {
        if x < self.width && y < self.height {
            self.data.get(self.index_of(x, y))
        } else {
            None
        }
    }

    /// Overwrite the value at `(x, y)`
    ///
    /// # Panics
    ///
    /// Panics if coordinates are out of bounds
    pub fn set(&mut self, x: usize, y: usize, value: T) {
        assert!(
            x < self.width && y < self.height,
            "Coordinates out of bounds"
        );
        let idx = self.index_of(x, y);
        self.data[idx] = value;
    }

    /// Borrow the row-major cell values
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Mutably borrow the row-major cell values
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Iterate cell values in row-major order
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.data.iter()
    }

    /// True when `other` has the same width and height
    pub fn same_shape<U>(&self, other: &Raster<U>) -> bool {
        self.width == other.width && self.height == other.height
    }

    /// Check `other` against this raster's shape
    ///
    /// # Errors
    ///
    /// Returns [`RasterError::ShapeMismatch`] when the shapes differ
    pub fn ensure_same_shape<U>(&self, other: &Raster<U>) -> Result<(), RasterError> {
        if self.same_shape(other) {
            Ok(())
        } else {
            Err(RasterError::ShapeMismatch {
                width: self.width,
                height: self.height,
                found_width: other.width,
                found_height: other.height,
            })
        }
    }

    /// Apply `f` to every cell, producing a new raster
    pub fn map<U>(&self, f: impl Fn(&T) -> U) -> Raster<U> {
        Raster {
            width: self.width,
            height: self.height,
            data: self.data.iter().map(f).collect(),
        }
    }

    /// In-bounds 8-neighbours of a flat index
    pub fn neighbors(&self, idx: usize) -> impl Iterator<Item = usize> + '_ {
        let (x, y) = self.coords(idx);
        MOORE.iter().filter_map(move |&(dx, dy)| {
            let nx = x.checked_add_signed(dx)?;
            let ny = y.checked_add_signed(dy)?;
            (nx < self.width && ny < self.height).then(|| ny * self.width + nx)
        })
    }
}

impl<T> Index<usize> for Raster<T> {
    type Output = T;

    #[inline]
    fn index(&self, idx: usize) -> &T {
        &self.data[idx]
    }
}

impl<T> IndexMut<usize> for Raster<T> {
    #[inline]
    fn index_mut(&mut self, idx: usize) -> &mut T {
        &mut self.data[idx]
    }
}

impl Raster<bool> {
    /// Number of `true` cells
    pub fn count_true(&self) -> usize {
        self.data.iter().filter(|&&v| v).count()
    }
}
