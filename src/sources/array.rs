//! In-memory pixel source backed by an ndarray.

use ndarray::{Array5, Axis as NdAxis, Slice};
use thiserror::Error;

use crate::error::SourceError;
use crate::pixels::{Calibration, PixelDimensions, PixelSource, PlaneIndex, PlaneRegion, Sample};

/// A plane or region outside the array was requested.
#[derive(Error, Debug)]
#[error("plane {plane} region {region:?} is outside the {dims:?} array")]
pub struct RegionOutOfBounds {
    pub plane: PlaneIndex,
    pub region: PlaneRegion,
    /// Array shape as `[t, z, c, y, x]`
    pub dims: [usize; 5],
}

/// Serves planes of a `[t][z][c][y][x]` array, encoded in a chosen byte order.
#[derive(Debug, Clone, PartialEq)]
pub struct ArraySource<T> {
    data: Array5<T>,
    little_endian: bool,
    calibration: Calibration,
}

impl<T: Sample> ArraySource<T> {
    /// Wrap an array; planes are served big endian.
    pub fn new(data: Array5<T>) -> Self {
        Self {
            data,
            little_endian: false,
            calibration: Calibration::default(),
        }
    }

    pub fn with_little_endian(mut self, little_endian: bool) -> Self {
        self.little_endian = little_endian;
        self
    }

    pub fn with_calibration(mut self, calibration: Calibration) -> Self {
        self.calibration = calibration;
        self
    }

    pub fn data(&self) -> &Array5<T> {
        &self.data
    }

    pub fn into_data(self) -> Array5<T> {
        self.data
    }

    fn dims(&self) -> [usize; 5] {
        let (t, z, c, y, x) = self.data.dim();
        [t, z, c, y, x]
    }
}

impl<T: Sample> PixelSource for ArraySource<T> {
    fn dimensions(&self) -> PixelDimensions {
        let [t, z, c, y, x] = self.dims();
        PixelDimensions::new(x as u32, y as u32, c as u32, z as u32, t as u32, T::PIXEL_TYPE)
            .with_little_endian(self.little_endian)
            .with_calibration(self.calibration)
    }

    fn read_plane(&self, plane: PlaneIndex, region: PlaneRegion) -> Result<Vec<u8>, SourceError> {
        let dims = self.dims();
        let [st, sz, sc, sy, sx] = dims;
        let (t, z, c) = (plane.t as usize, plane.z as usize, plane.c as usize);
        let (x0, y0) = (region.x as usize, region.y as usize);
        let (x1, y1) = (x0 + region.width as usize, y0 + region.height as usize);

        if t >= st || z >= sz || c >= sc || x1 > sx || y1 > sy {
            return Err(Box::new(RegionOutOfBounds {
                plane,
                region,
                dims,
            }));
        }

        let view = self
            .data
            .index_axis(NdAxis(0), t)
            .index_axis_move(NdAxis(0), z)
            .index_axis_move(NdAxis(0), c)
            .slice_axis_move(NdAxis(0), Slice::from(y0..y1))
            .slice_axis_move(NdAxis(1), Slice::from(x0..x1));
        let mut bytes = Vec::with_capacity(region.sample_count() * T::BYTES);
        for &value in view.iter() {
            value.encode(&mut bytes, self.little_endian);
        }
        Ok(bytes)
    }
}
