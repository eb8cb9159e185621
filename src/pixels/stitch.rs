//! Plane-by-plane volume reconstruction.
//!
//! Planes are requested T-major, then Z, then C. Each plane is one read from
//! the [`PixelSource`]; the first failed read aborts the whole fetch and the
//! partially filled buffer is dropped.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use ndarray::{Array5, Axis as NdAxis};
use thiserror::Error;
use web_time::Instant;

use crate::bounds::{AxisRequest, Bounds5D, compute_bounds, resolve_bounds};
use crate::error::RoiError;
use crate::pixels::volume::SampleRange;
use crate::pixels::{
    PixelSource, PixelType, PlaneIndex, PlaneRegion, RawVolume, Sample, Volume, VolumeData,
};
use crate::roi::Roi;

/// Shared flag used to abandon a fetch between two plane reads.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// A plane buffer did not have the expected length.
#[derive(Error, Debug)]
#[error("plane buffer has {actual} bytes, expected {expected}")]
pub struct PlaneLengthMismatch {
    pub expected: usize,
    pub actual: usize,
}

/// Fetch the volume covered by `bounds`, decoding samples as `pixel_type`.
pub fn fetch_volume<S: PixelSource + ?Sized>(
    source: &S,
    bounds: &Bounds5D,
    pixel_type: PixelType,
) -> Result<Volume, RoiError> {
    fetch_volume_with(source, bounds, pixel_type, &CancelToken::new())
}

/// [`fetch_volume`] with a cancellation token checked before every plane.
pub fn fetch_volume_with<S: PixelSource + ?Sized>(
    source: &S,
    bounds: &Bounds5D,
    pixel_type: PixelType,
    cancel: &CancelToken,
) -> Result<Volume, RoiError> {
    let dims = source.dimensions();
    let bounds = bounds.within(&dims)?;
    let little_endian = dims.little_endian;
    let started = Instant::now();

    let mut range = SampleRange::new();
    let data = match pixel_type {
        PixelType::Int8 => VolumeData::Int8(stitch(source, &bounds, little_endian, cancel, &mut range)?),
        PixelType::Uint8 => VolumeData::Uint8(stitch(source, &bounds, little_endian, cancel, &mut range)?),
        PixelType::Int16 => VolumeData::Int16(stitch(source, &bounds, little_endian, cancel, &mut range)?),
        PixelType::Uint16 => VolumeData::Uint16(stitch(source, &bounds, little_endian, cancel, &mut range)?),
        PixelType::Int32 => VolumeData::Int32(stitch(source, &bounds, little_endian, cancel, &mut range)?),
        PixelType::Uint32 => VolumeData::Uint32(stitch(source, &bounds, little_endian, cancel, &mut range)?),
        PixelType::Float => VolumeData::Float(stitch(source, &bounds, little_endian, cancel, &mut range)?),
        PixelType::Double => VolumeData::Double(stitch(source, &bounds, little_endian, cancel, &mut range)?),
    };

    log::info!(
        "Fetched {} planes ({}) as {} in {:.1?}, range [{}, {}]",
        bounds.plane_count(),
        bounds,
        pixel_type,
        started.elapsed(),
        range.min,
        range.max
    );

    Ok(Volume::new(data, bounds, range, dims.calibration))
}

/// Resolve per-axis requests against the source and fetch the result using
/// the source's declared pixel type.
pub fn fetch_request<S: PixelSource + ?Sized>(
    source: &S,
    request: &AxisRequest,
) -> Result<Volume, RoiError> {
    let dims = source.dimensions();
    let bounds = resolve_bounds(request, &dims)?;
    fetch_volume(source, &bounds, dims.pixel_type)
}

/// Fetch the 5D box enclosing every shape of `roi`.
pub fn fetch_roi<S: PixelSource + ?Sized>(source: &S, roi: &Roi) -> Result<Volume, RoiError> {
    let bounds = compute_bounds(roi.shapes())?;
    fetch_volume(source, &bounds, source.dimensions().pixel_type)
}

/// Fetch the planes covered by `bounds` without decoding them.
pub fn fetch_raw_volume<S: PixelSource + ?Sized>(
    source: &S,
    bounds: &Bounds5D,
    cancel: &CancelToken,
) -> Result<RawVolume, RoiError> {
    let dims = source.dimensions();
    let bounds = bounds.within(&dims)?;
    let plan = PlanePlan::new(&bounds);
    let plane_len = plan.region.sample_count() * dims.bytes_per_sample();

    let mut bytes = Vec::with_capacity(plane_len * plan.plane_count());
    for (_, plane) in plan.planes() {
        let buffer = read_checked(source, plane, plan.region, plane_len, cancel)?;
        bytes.extend_from_slice(&buffer);
    }

    Ok(RawVolume {
        bytes,
        bounds,
        pixel_type: dims.pixel_type,
        little_endian: dims.little_endian,
    })
}

/// Validated fetch geometry: origin plane indices and the (X, Y) region.
struct PlanePlan {
    region: PlaneRegion,
    origin: PlaneIndex,
    size: [usize; 3],
}

impl PlanePlan {
    /// `bounds` must already be validated against the source.
    fn new(bounds: &Bounds5D) -> Self {
        let size = bounds.size();
        Self {
            region: PlaneRegion::new(
                bounds.start.x as u32,
                bounds.start.y as u32,
                size.x as u32,
                size.y as u32,
            ),
            origin: PlaneIndex::new(bounds.start.t as u32, bounds.start.z as u32, bounds.start.c as u32),
            size: [size.t as usize, size.z as usize, size.c as usize],
        }
    }

    fn plane_count(&self) -> usize {
        self.size.iter().product()
    }

    /// Planes in fetch order, with their `[t][z][c]` offset in the output.
    fn planes(&self) -> impl Iterator<Item = ([usize; 3], PlaneIndex)> + '_ {
        let [st, sz, sc] = self.size;
        (0..st).flat_map(move |t| {
            (0..sz).flat_map(move |z| {
                (0..sc).map(move |c| {
                    let plane = PlaneIndex::new(
                        self.origin.t + t as u32,
                        self.origin.z + z as u32,
                        self.origin.c + c as u32,
                    );
                    ([t, z, c], plane)
                })
            })
        })
    }
}

fn read_checked<S: PixelSource + ?Sized>(
    source: &S,
    plane: PlaneIndex,
    region: PlaneRegion,
    expected: usize,
    cancel: &CancelToken,
) -> Result<Vec<u8>, RoiError> {
    if cancel.is_cancelled() {
        log::debug!("Fetch cancelled before plane {}", plane);
        return Err(RoiError::Cancelled);
    }

    let bytes = source
        .read_plane(plane, region)
        .map_err(|e| RoiError::remote_read(plane, e))?;

    if bytes.len() != expected {
        return Err(RoiError::remote_read(
            plane,
            PlaneLengthMismatch {
                expected,
                actual: bytes.len(),
            },
        ));
    }

    log::debug!("Read plane {} ({} bytes)", plane, bytes.len());
    Ok(bytes)
}

fn stitch<T: Sample, S: PixelSource + ?Sized>(
    source: &S,
    bounds: &Bounds5D,
    little_endian: bool,
    cancel: &CancelToken,
    range: &mut SampleRange,
) -> Result<Array5<T>, RoiError> {
    let plan = PlanePlan::new(bounds);
    let [st, sz, sc] = plan.size;
    let (width, height) = (plan.region.width as usize, plan.region.height as usize);
    let expected = plan.region.sample_count() * T::BYTES;

    let mut volume = Array5::<T>::default((st, sz, sc, height, width));

    for ([t, z, c], plane) in plan.planes() {
        let bytes = read_checked(source, plane, plan.region, expected, cancel)?;

        let mut target = volume
            .index_axis_mut(NdAxis(0), t)
            .index_axis_move(NdAxis(0), z)
            .index_axis_move(NdAxis(0), c);
        for (dst, chunk) in target.iter_mut().zip(bytes.chunks_exact(T::BYTES)) {
            let value = T::decode(chunk, little_endian);
            range.include(value.into());
            *dst = value;
        }
    }

    Ok(volume)
}
