//! Pixel types, volume dimensions and sample decoding.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::bounds::Axis;
use crate::error::RoiError;

/// Sample type of a pixel volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelType {
    Int8,
    Uint8,
    Int16,
    Uint16,
    Int32,
    Uint32,
    Float,
    Double,
}

impl PixelType {
    /// Map a declared (bytes per sample, floating point) layout to a type.
    ///
    /// Integer layouts are read as unsigned, 4- and 8-byte floats as
    /// `f32`/`f64`.
    pub fn from_layout(bytes_per_sample: usize, floating_point: bool) -> Result<Self, RoiError> {
        match (bytes_per_sample, floating_point) {
            (1, false) => Ok(PixelType::Uint8),
            (2, false) => Ok(PixelType::Uint16),
            (4, false) => Ok(PixelType::Uint32),
            (4, true) => Ok(PixelType::Float),
            (8, true) => Ok(PixelType::Double),
            _ => Err(RoiError::UnsupportedPixelType {
                bytes_per_sample,
                floating_point,
            }),
        }
    }

    pub fn bytes_per_sample(&self) -> usize {
        match self {
            PixelType::Int8 | PixelType::Uint8 => 1,
            PixelType::Int16 | PixelType::Uint16 => 2,
            PixelType::Int32 | PixelType::Uint32 | PixelType::Float => 4,
            PixelType::Double => 8,
        }
    }

    pub fn is_floating_point(&self) -> bool {
        matches!(self, PixelType::Float | PixelType::Double)
    }

    pub fn is_signed(&self) -> bool {
        matches!(
            self,
            PixelType::Int8 | PixelType::Int16 | PixelType::Int32 | PixelType::Float | PixelType::Double
        )
    }

    /// Name used by the image repository ("uint16", "float", ...).
    pub fn name(&self) -> &'static str {
        match self {
            PixelType::Int8 => "int8",
            PixelType::Uint8 => "uint8",
            PixelType::Int16 => "int16",
            PixelType::Uint16 => "uint16",
            PixelType::Int32 => "int32",
            PixelType::Uint32 => "uint32",
            PixelType::Float => "float",
            PixelType::Double => "double",
        }
    }

    pub fn all() -> &'static [PixelType] {
        &[
            PixelType::Int8,
            PixelType::Uint8,
            PixelType::Int16,
            PixelType::Uint16,
            PixelType::Int32,
            PixelType::Uint32,
            PixelType::Float,
            PixelType::Double,
        ]
    }
}

impl fmt::Display for PixelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PixelType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        PixelType::all()
            .iter()
            .copied()
            .find(|t| t.name() == lower)
            .ok_or_else(|| format!("Unknown pixel type '{}'", s))
    }
}

/// Unit of a physical pixel size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LengthUnit {
    Nanometer,
    Micrometer,
    Millimeter,
    Centimeter,
    Meter,
}

impl LengthUnit {
    pub fn symbol(&self) -> &'static str {
        match self {
            LengthUnit::Nanometer => "nm",
            LengthUnit::Micrometer => "µm",
            LengthUnit::Millimeter => "mm",
            LengthUnit::Centimeter => "cm",
            LengthUnit::Meter => "m",
        }
    }

    fn meters(&self) -> f64 {
        match self {
            LengthUnit::Nanometer => 1e-9,
            LengthUnit::Micrometer => 1e-6,
            LengthUnit::Millimeter => 1e-3,
            LengthUnit::Centimeter => 1e-2,
            LengthUnit::Meter => 1.0,
        }
    }
}

/// Physical extent of one pixel along an axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhysicalSize {
    pub value: f64,
    pub unit: LengthUnit,
}

impl PhysicalSize {
    pub fn new(value: f64, unit: LengthUnit) -> Self {
        Self { value, unit }
    }

    pub fn micrometers(value: f64) -> Self {
        Self::new(value, LengthUnit::Micrometer)
    }

    /// Same length expressed in another unit.
    pub fn to_unit(&self, unit: LengthUnit) -> Self {
        Self::new(self.value * self.unit.meters() / unit.meters(), unit)
    }
}

impl fmt::Display for PhysicalSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.unit.symbol())
    }
}

/// Physical pixel sizes along X, Y and Z. `None` means uncalibrated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Calibration {
    pub x: Option<PhysicalSize>,
    pub y: Option<PhysicalSize>,
    pub z: Option<PhysicalSize>,
}

impl Calibration {
    pub fn new(
        x: Option<PhysicalSize>,
        y: Option<PhysicalSize>,
        z: Option<PhysicalSize>,
    ) -> Self {
        Self { x, y, z }
    }

    pub fn is_calibrated(&self) -> bool {
        self.x.is_some() || self.y.is_some() || self.z.is_some()
    }
}

/// Declared dimensions and sample layout of a pixel source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelDimensions {
    pub size_x: u32,
    pub size_y: u32,
    pub size_c: u32,
    pub size_z: u32,
    pub size_t: u32,
    pub pixel_type: PixelType,
    /// Byte order of plane buffers. Defaults to big endian (network order).
    pub little_endian: bool,
    pub calibration: Calibration,
}

impl PixelDimensions {
    pub fn new(
        size_x: u32,
        size_y: u32,
        size_c: u32,
        size_z: u32,
        size_t: u32,
        pixel_type: PixelType,
    ) -> Self {
        Self {
            size_x,
            size_y,
            size_c,
            size_z,
            size_t,
            pixel_type,
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

    /// Declared size along one axis.
    pub fn size(&self, axis: Axis) -> u32 {
        match axis {
            Axis::X => self.size_x,
            Axis::Y => self.size_y,
            Axis::C => self.size_c,
            Axis::Z => self.size_z,
            Axis::T => self.size_t,
        }
    }

    pub fn bytes_per_sample(&self) -> usize {
        self.pixel_type.bytes_per_sample()
    }

    pub fn is_floating_point(&self) -> bool {
        self.pixel_type.is_floating_point()
    }
}

/// Identifies one (X, Y) plane of a volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlaneIndex {
    pub t: u32,
    pub z: u32,
    pub c: u32,
}

impl PlaneIndex {
    pub fn new(t: u32, z: u32, c: u32) -> Self {
        Self { t, z, c }
    }
}

impl fmt::Display for PlaneIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(t={}, z={}, c={})", self.t, self.z, self.c)
    }
}

/// Rectangular region of a plane, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlaneRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PlaneRegion {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn sample_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// A numeric sample that can be decoded from a plane buffer.
pub trait Sample: Copy + Default + Into<f64> + 'static {
    /// Pixel type this sample decodes.
    const PIXEL_TYPE: PixelType;

    /// Size of one encoded sample in bytes.
    const BYTES: usize;

    /// Decode one sample from exactly `BYTES` bytes.
    fn decode(bytes: &[u8], little_endian: bool) -> Self;

    /// Append the encoded sample to `out`.
    fn encode(self, out: &mut Vec<u8>, little_endian: bool);
}

macro_rules! impl_sample {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl Sample for $ty {
                const PIXEL_TYPE: PixelType = PixelType::$variant;
                const BYTES: usize = std::mem::size_of::<$ty>();

                fn decode(bytes: &[u8], little_endian: bool) -> Self {
                    let mut buf = [0u8; std::mem::size_of::<$ty>()];
                    buf.copy_from_slice(bytes);
                    if little_endian {
                        <$ty>::from_le_bytes(buf)
                    } else {
                        <$ty>::from_be_bytes(buf)
                    }
                }

                fn encode(self, out: &mut Vec<u8>, little_endian: bool) {
                    if little_endian {
                        out.extend_from_slice(&self.to_le_bytes());
                    } else {
                        out.extend_from_slice(&self.to_be_bytes());
                    }
                }
            }
        )*
    };
}

impl_sample!(
    i8 => Int8,
    u8 => Uint8,
    i16 => Int16,
    u16 => Uint16,
    i32 => Int32,
    u32 => Uint32,
    f32 => Float,
    f64 => Double,
);
