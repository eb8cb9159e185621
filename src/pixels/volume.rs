//! Assembled pixel volumes.

use std::io::Write;

use ndarray::{Array2, Array5, Axis as NdAxis};
use ndarray_npy::{WriteNpyError, WriteNpyExt};

use crate::bounds::Bounds5D;
use crate::pixels::{Calibration, PixelType};

/// Typed 5D pixel array, axes ordered `[t][z][c][y][x]`.
#[derive(Debug, Clone, PartialEq)]
pub enum VolumeData {
    Int8(Array5<i8>),
    Uint8(Array5<u8>),
    Int16(Array5<i16>),
    Uint16(Array5<u16>),
    Int32(Array5<i32>),
    Uint32(Array5<u32>),
    Float(Array5<f32>),
    Double(Array5<f64>),
}

/// Run `$body` with `$arr` bound to the inner array of any variant.
macro_rules! with_array {
    ($data:expr, $arr:ident => $body:expr) => {
        match $data {
            VolumeData::Int8($arr) => $body,
            VolumeData::Uint8($arr) => $body,
            VolumeData::Int16($arr) => $body,
            VolumeData::Uint16($arr) => $body,
            VolumeData::Int32($arr) => $body,
            VolumeData::Uint32($arr) => $body,
            VolumeData::Float($arr) => $body,
            VolumeData::Double($arr) => $body,
        }
    };
}

impl VolumeData {
    pub fn pixel_type(&self) -> PixelType {
        match self {
            VolumeData::Int8(_) => PixelType::Int8,
            VolumeData::Uint8(_) => PixelType::Uint8,
            VolumeData::Int16(_) => PixelType::Int16,
            VolumeData::Uint16(_) => PixelType::Uint16,
            VolumeData::Int32(_) => PixelType::Int32,
            VolumeData::Uint32(_) => PixelType::Uint32,
            VolumeData::Float(_) => PixelType::Float,
            VolumeData::Double(_) => PixelType::Double,
        }
    }

    /// Shape as `[t, z, c, y, x]`.
    pub fn shape(&self) -> [usize; 5] {
        with_array!(self, arr => {
            let (t, z, c, y, x) = arr.dim();
            [t, z, c, y, x]
        })
    }

    /// Sample at `[t][z][c][y][x]` as `f64`.
    pub fn get(&self, t: usize, z: usize, c: usize, y: usize, x: usize) -> Option<f64> {
        with_array!(self, arr => arr.get((t, z, c, y, x)).map(|&v| f64::from(v)))
    }

    /// Copy of one plane as `f64`.
    pub fn plane(&self, t: usize, z: usize, c: usize) -> Option<Array2<f64>> {
        let [st, sz, sc, _, _] = self.shape();
        if t >= st || z >= sz || c >= sc {
            return None;
        }
        Some(with_array!(self, arr => arr
            .index_axis(NdAxis(0), t)
            .index_axis_move(NdAxis(0), z)
            .index_axis_move(NdAxis(0), c)
            .mapv(f64::from)))
    }

    /// Widen every sample to `f64`.
    pub fn to_f64(&self) -> Array5<f64> {
        with_array!(self, arr => arr.mapv(f64::from))
    }

    /// Write the array as a NumPy `.npy` stream.
    pub fn write_npy<W: Write>(&self, writer: W) -> Result<(), WriteNpyError> {
        with_array!(self, arr => arr.write_npy(writer))
    }
}

/// A fetched pixel volume with its origin and exact intensity range.
#[derive(Debug, Clone, PartialEq)]
pub struct Volume {
    data: VolumeData,
    bounds: Bounds5D,
    min: f64,
    max: f64,
    calibration: Calibration,
}

impl Volume {
    pub(crate) fn new(
        data: VolumeData,
        bounds: Bounds5D,
        range: SampleRange,
        calibration: Calibration,
    ) -> Self {
        Self {
            data,
            bounds,
            min: range.min,
            max: range.max,
            calibration,
        }
    }

    pub fn data(&self) -> &VolumeData {
        &self.data
    }

    pub fn into_data(self) -> VolumeData {
        self.data
    }

    /// Region of the source volume this data was read from.
    pub fn bounds(&self) -> &Bounds5D {
        &self.bounds
    }

    /// Smallest sample over the whole volume (NaN samples excluded).
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Largest sample over the whole volume (NaN samples excluded).
    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn pixel_type(&self) -> PixelType {
        self.data.pixel_type()
    }

    /// Physical pixel sizes declared by the source.
    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    /// Shape as `[t, z, c, y, x]`.
    pub fn shape(&self) -> [usize; 5] {
        self.data.shape()
    }
}

/// Flattened byte volume in the source's byte order.
///
/// Planes are concatenated T-major, then Z, then C; each plane is row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawVolume {
    pub bytes: Vec<u8>,
    pub bounds: Bounds5D,
    pub pixel_type: PixelType,
    pub little_endian: bool,
}

impl RawVolume {
    /// Byte length of one plane.
    pub fn plane_len(&self) -> usize {
        let size = self.bounds.size();
        size.x as usize * size.y as usize * self.pixel_type.bytes_per_sample()
    }
}

/// Running min/max over decoded samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct SampleRange {
    pub min: f64,
    pub max: f64,
}

impl SampleRange {
    pub fn new() -> Self {
        Self {
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }

    #[inline]
    pub fn include(&mut self, value: f64) {
        // f64::min/max ignore NaN operands.
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }
}
