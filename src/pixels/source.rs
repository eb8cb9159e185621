//! The pixel source capability consumed by the stitcher.

use crate::error::SourceError;
use crate::pixels::{PixelDimensions, PlaneIndex, PlaneRegion};

/// A store that serves raw planes of a 5D pixel volume.
///
/// Implementations talk to a remote image server, or wrap local data (see
/// [`crate::sources`]). Retries and timeouts are the implementation's concern;
/// any error returned here aborts the volume fetch in progress.
pub trait PixelSource {
    /// Declared volume dimensions and sample layout.
    fn dimensions(&self) -> PixelDimensions;

    /// Read one rectangular region of the plane at `plane`.
    ///
    /// Must return exactly `region.width * region.height * bytes_per_sample`
    /// bytes, row-major, in the declared byte order.
    fn read_plane(&self, plane: PlaneIndex, region: PlaneRegion) -> Result<Vec<u8>, SourceError>;
}

impl<S: PixelSource + ?Sized> PixelSource for &S {
    fn dimensions(&self) -> PixelDimensions {
        (**self).dimensions()
    }

    fn read_plane(&self, plane: PlaneIndex, region: PlaneRegion) -> Result<Vec<u8>, SourceError> {
        (**self).read_plane(plane, region)
    }
}

impl<S: PixelSource + ?Sized> PixelSource for Box<S> {
    fn dimensions(&self) -> PixelDimensions {
        (**self).dimensions()
    }

    fn read_plane(&self, plane: PlaneIndex, region: PlaneRegion) -> Result<Vec<u8>, SourceError> {
        (**self).read_plane(plane, region)
    }
}
