//! roi5d - 5D regions of interest over microscopy pixel volumes
//!
//! Shapes annotate single (X, Y) planes of a volume ordered X, Y, C, Z, T.
//! A [`roi::Roi`] groups shapes; its 5D bounding box drives a plane-by-plane
//! fetch from a [`pixels::PixelSource`] into a typed `[t][z][c][y][x]`
//! array with an exact intensity range. The [`convert`] module maps ROIs to
//! and from the flat, property-tagged shape lists of the local toolkit.

pub mod bounds;
pub mod config;
pub mod constants;
pub mod convert;
pub mod error;
pub mod local;
pub mod pixels;
pub mod roi;
pub mod shape;
pub mod sources;

pub use bounds::{
    Axis, AxisRange, AxisRequest, Bounds5D, Coordinates, compute_bounds, resolve_axis_range,
    resolve_bounds,
};
pub use config::{EngineConfig, LogLevel};
pub use convert::{Grouped, from_local_shape, group_4d, to_local_shape, ungroup_4d};
pub use error::{RangeViolation, RoiError, SourceError};
pub use local::{LocalKind, LocalShape};
pub use pixels::{
    CancelToken, PixelDimensions, PixelSource, PixelType, PlaneIndex, PlaneRegion, Volume,
    VolumeData, fetch_volume,
};
pub use roi::{Roi, RoiStore};
pub use shape::{Geometry, ShapeKind, ShapeModel};
