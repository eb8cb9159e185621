//! 5D pixel volume reconstruction.
//!
//! This module provides:
//! - `PixelSource`: the plane-reading capability a remote store exposes
//! - `PixelType` / `PixelDimensions`: declared sample layout of a source
//! - `fetch_volume`: sequential plane fetch, decode and assembly into a
//!   typed `[t][z][c][y][x]` array with an exact global min/max
//!
//! ```rust,ignore
//! use roi5d::pixels::{fetch_request, PixelSource};
//! use roi5d::bounds::AxisRequest;
//!
//! let request = AxisRequest { z: Some([0, 4]), ..Default::default() };
//! let volume = fetch_request(&source, &request)?;
//! println!("range: {} .. {}", volume.min(), volume.max());
//! ```

mod source;
mod stitch;
mod types;
mod volume;

#[cfg(test)]
mod tests;

pub use source::PixelSource;
pub use stitch::{
    CancelToken, PlaneLengthMismatch, fetch_raw_volume, fetch_request, fetch_roi, fetch_volume,
    fetch_volume_with,
};
pub use types::{
    Calibration, LengthUnit, PhysicalSize, PixelDimensions, PixelType, PlaneIndex, PlaneRegion,
    Sample,
};
pub use volume::{RawVolume, Volume, VolumeData};
