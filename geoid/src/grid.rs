use crate::{GeoidError, C};
use byteorder::{BigEndian as BE, ByteOrder};
use geo::geometry::{Coord, Rect};
use memmap2::Mmap;
use serde::{Deserialize, Serialize};
use std::{mem::size_of, sync::OnceLock};

/// Placement of a [ScalarGrid] on the globe.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridMeta {
    /// Latitude of row 0 (the northernmost row).
    pub origin_lat: C,

    /// Longitude of column 0 (the westernmost column).
    pub origin_lon: C,

    /// Degrees per sample, identical on both axes.
    pub resolution: C,
}

/// A read-only raster of scalar samples.
///
/// Row 0 is the northernmost row and column 0 the westernmost
/// column. Once constructed a grid is never mutated, so it can be
/// shared between threads freely.
#[derive(Debug)]
pub struct ScalarGrid {
    meta: GridMeta,

    /// Number of (rows, columns) in this grid.
    dimensions: (usize, usize),

    /// Lowest and highest sample, computed on first use.
    extrema: OnceLock<(C, C)>,

    samples: SampleStore,
}

#[derive(Debug)]
pub(crate) enum SampleStore {
    InMem(Box<[C]>),
    /// Row-major big-endian `f32`s.
    MemMap(Mmap),
}

impl SampleStore {
    fn get_unchecked(&self, index: usize) -> C {
        match self {
            Self::InMem(samples) => samples[index],
            Self::MemMap(raw) => {
                let start = index * size_of::<f32>();
                let end = start + size_of::<f32>();
                C::from(BE::read_f32(&raw[start..end]))
            }
        }
    }
}

impl ScalarGrid {
    /// Returns a grid of `samples` laid out row-major with the given
    /// (rows, columns) `dimensions`.
    pub fn new(
        samples: Vec<C>,
        dimensions: (usize, usize),
        meta: GridMeta,
    ) -> Result<Self, GeoidError> {
        let (rows, cols) = dimensions;
        if samples.len() != rows * cols {
            return Err(GeoidError::InvalidGrid(format!(
                "{} samples for a {rows}x{cols} grid",
                samples.len()
            )));
        }
        Self::with_store(SampleStore::InMem(samples.into_boxed_slice()), dimensions, meta)
    }

    /// Returns a grid built from a list of rows, north to south.
    pub fn from_rows(rows: Vec<Vec<C>>, meta: GridMeta) -> Result<Self, GeoidError> {
        let cols = rows.first().map_or(0, Vec::len);
        if let Some(row) = rows.iter().position(|row| row.len() != cols) {
            return Err(GeoidError::InvalidGrid(format!(
                "row {row} has {} samples, expected {cols}",
                rows[row].len()
            )));
        }
        let dimensions = (rows.len(), cols);
        Self::new(rows.into_iter().flatten().collect(), dimensions, meta)
    }

    pub(crate) fn with_store(
        samples: SampleStore,
        dimensions: (usize, usize),
        meta: GridMeta,
    ) -> Result<Self, GeoidError> {
        validate(&meta, dimensions)?;
        Ok(Self {
            meta,
            dimensions,
            extrema: OnceLock::new(),
            samples,
        })
    }

    pub fn meta(&self) -> &GridMeta {
        &self.meta
    }

    /// Returns the number of (rows, columns).
    pub fn dimensions(&self) -> (usize, usize) {
        self.dimensions
    }

    /// Returns the number of samples in this grid.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        let (rows, cols) = self.dimensions;
        rows * cols
    }

    /// Returns the sample at (`row`, `col`), if any.
    pub fn get(&self, row: usize, col: usize) -> Option<C> {
        let (rows, cols) = self.dimensions;
        if row < rows && col < cols {
            Some(self.get_unchecked(row, col))
        } else {
            None
        }
    }

    /// Returns the lowest sample, ignoring NaNs.
    pub fn min(&self) -> C {
        self.extrema().0
    }

    /// Returns the highest sample, ignoring NaNs.
    pub fn max(&self) -> C {
        self.extrema().1
    }

    /// Returns the geographic position of node (`row`, `col`).
    #[allow(clippy::cast_precision_loss)]
    pub fn node_coord(&self, row: usize, col: usize) -> Option<Coord<C>> {
        let (rows, cols) = self.dimensions;
        (row < rows && col < cols).then(|| Coord {
            y: self.meta.origin_lat - row as C * self.meta.resolution,
            x: self.meta.origin_lon + col as C * self.meta.resolution,
        })
    }

    /// Returns the rectangle spanned by this grid's outermost nodes.
    #[allow(clippy::cast_precision_loss)]
    pub fn bounds(&self) -> Rect<C> {
        let (rows, cols) = self.dimensions;
        let GridMeta {
            origin_lat,
            origin_lon,
            resolution,
        } = self.meta;
        Rect::new(
            Coord {
                x: origin_lon,
                y: origin_lat,
            },
            Coord {
                x: origin_lon + (cols - 1) as C * resolution,
                y: origin_lat - (rows - 1) as C * resolution,
            },
        )
    }

    /// Returns an iterator over every sample, row by row.
    pub fn iter(&self) -> impl Iterator<Item = Sample<'_>> + '_ {
        (0..self.len()).map(|index| Sample { grid: self, index })
    }
}

/// Private API
impl ScalarGrid {
    pub(crate) fn get_unchecked(&self, row: usize, col: usize) -> C {
        self.samples.get_unchecked(row * self.dimensions.1 + col)
    }

    fn extrema(&self) -> (C, C) {
        *self.extrema.get_or_init(|| {
            (0..self.len())
                .map(|index| self.samples.get_unchecked(index))
                .fold((C::INFINITY, C::NEG_INFINITY), |(lo, hi), v| {
                    (lo.min(v), hi.max(v))
                })
        })
    }
}

fn validate(meta: &GridMeta, (rows, cols): (usize, usize)) -> Result<(), GeoidError> {
    if !(meta.resolution.is_finite() && meta.resolution > 0.0) {
        return Err(GeoidError::InvalidGrid(format!(
            "resolution must be positive, got {}",
            meta.resolution
        )));
    }
    if !(meta.origin_lat.is_finite() && meta.origin_lon.is_finite()) {
        return Err(GeoidError::InvalidGrid(format!(
            "origin ({}, {}) is not finite",
            meta.origin_lat, meta.origin_lon
        )));
    }
    if rows < 2 || cols < 2 {
        return Err(GeoidError::InvalidGrid(format!(
            "{rows}x{cols} grid, need at least 2x2"
        )));
    }
    Ok(())
}

/// A single grid sample.
pub struct Sample<'a> {
    /// The parent [ScalarGrid] this sample belongs to.
    grid: &'a ScalarGrid,
    /// Row-major index into the parent's samples.
    index: usize,
}

impl<'a> Sample<'a> {
    pub fn row(&self) -> usize {
        self.index / self.grid.dimensions.1
    }

    pub fn col(&self) -> usize {
        self.index % self.grid.dimensions.1
    }

    pub fn value(&self) -> C {
        self.grid.samples.get_unchecked(self.index)
    }

    #[allow(clippy::cast_precision_loss)]
    pub fn coord(&self) -> Coord<C> {
        let GridMeta {
            origin_lat,
            origin_lon,
            resolution,
        } = self.grid.meta;
        Coord {
            y: origin_lat - self.row() as C * resolution,
            x: origin_lon + self.col() as C * resolution,
        }
    }
}
