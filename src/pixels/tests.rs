use std::cell::RefCell;

use ndarray::Array5;

use super::*;
use crate::bounds::{AxisRequest, Bounds5D, Coordinates};
use crate::error::{RoiError, SourceError};
use crate::roi::Roi;
use crate::shape::ShapeModel;
use crate::sources::ArraySource;

/// Wraps a source and records every plane read with its region; optionally
/// fails on one plane or truncates every buffer.
struct Recording<S> {
    inner: S,
    reads: RefCell<Vec<(PlaneIndex, PlaneRegion)>>,
    fail_on: Option<PlaneIndex>,
    truncate: bool,
    cancel_after: Option<(usize, CancelToken)>,
}

impl<S: PixelSource> Recording<S> {
    fn new(inner: S) -> Self {
        Self {
            inner,
            reads: RefCell::new(Vec::new()),
            fail_on: None,
            truncate: false,
            cancel_after: None,
        }
    }

    fn reads(&self) -> Vec<PlaneIndex> {
        self.reads.borrow().iter().map(|(plane, _)| *plane).collect()
    }

    fn regions(&self) -> Vec<PlaneRegion> {
        self.reads.borrow().iter().map(|(_, region)| *region).collect()
    }
}

impl<S: PixelSource> PixelSource for Recording<S> {
    fn dimensions(&self) -> PixelDimensions {
        self.inner.dimensions()
    }

    fn read_plane(&self, plane: PlaneIndex, region: PlaneRegion) -> Result<Vec<u8>, SourceError> {
        self.reads.borrow_mut().push((plane, region));
        if let Some((after, token)) = &self.cancel_after
            && self.reads.borrow().len() >= *after
        {
            token.cancel();
        }
        if self.fail_on == Some(plane) {
            return Err("connection reset".into());
        }
        let mut bytes = self.inner.read_plane(plane, region)?;
        if self.truncate {
            bytes.pop();
        }
        Ok(bytes)
    }
}

/// Deterministic u16 volume where every sample encodes its own position.
fn coded_volume(t: usize, z: usize, c: usize, y: usize, x: usize) -> Array5<u16> {
    Array5::from_shape_fn((t, z, c, y, x), |(t, z, c, y, x)| {
        (t * 10000 + z * 1000 + c * 100 + y * 10 + x) as u16
    })
}

fn bounds(start: [i64; 5], end: [i64; 5]) -> Bounds5D {
    let [x0, y0, c0, z0, t0] = start;
    let [x1, y1, c1, z1, t1] = end;
    Bounds5D::new(
        Coordinates::new(x0, y0, c0, z0, t0),
        Coordinates::new(x1, y1, c1, z1, t1),
    )
}

#[test]
fn test_fetch_order_and_placement() {
    let source = Recording::new(ArraySource::new(coded_volume(3, 2, 3, 6, 6)));
    // X 2..3, Y 1..2, C 0..1, Z 1, T 1..2
    let request = bounds([2, 1, 0, 1, 1], [3, 2, 1, 1, 2]);

    let volume = fetch_volume(&source, &request, PixelType::Uint16).unwrap();

    assert_eq!(
        source.reads(),
        vec![
            PlaneIndex::new(1, 1, 0),
            PlaneIndex::new(1, 1, 1),
            PlaneIndex::new(2, 1, 0),
            PlaneIndex::new(2, 1, 1),
        ]
    );
    assert_eq!(volume.shape(), [2, 1, 2, 2, 2]);

    let data = volume.data();
    for t in 0..2 {
        for c in 0..2 {
            for y in 0..2 {
                for x in 0..2 {
                    let expected = (t + 1) * 10000 + 1000 + c * 100 + (y + 1) * 10 + (x + 2);
                    assert_eq!(data.get(t, 0, c, y, x), Some(expected as f64));
                }
            }
        }
    }
    assert_eq!(volume.bounds(), &request);
}

#[test]
fn test_each_plane_read_once_with_cropped_region() {
    let source = Recording::new(ArraySource::new(coded_volume(2, 1, 2, 4, 4)));
    let request = bounds([0, 0, 0, 0, 0], [1, 1, 1, 0, 1]);

    let volume = fetch_volume(&source, &request, PixelType::Uint16).unwrap();

    assert_eq!(
        source.reads(),
        vec![
            PlaneIndex::new(0, 0, 0),
            PlaneIndex::new(0, 0, 1),
            PlaneIndex::new(1, 0, 0),
            PlaneIndex::new(1, 0, 1),
        ]
    );
    assert_eq!(source.regions(), vec![PlaneRegion::new(0, 0, 2, 2); 4]);
    assert_eq!(volume.shape(), [2, 1, 2, 2, 2]);
    assert_eq!(volume.data().get(1, 0, 1, 1, 1), Some(10111.0));
}

#[test]
fn test_failed_plane_aborts_fetch() {
    let mut source = Recording::new(ArraySource::new(coded_volume(2, 1, 2, 2, 2)));
    source.fail_on = Some(PlaneIndex::new(1, 0, 0));

    let err = fetch_volume(&source, &bounds([0, 0, 0, 0, 0], [1, 1, 1, 0, 1]), PixelType::Uint16)
        .err()
        .unwrap();

    match err {
        RoiError::RemoteRead { coordinate, source } => {
            assert_eq!(coordinate, PlaneIndex::new(1, 0, 0));
            assert_eq!(source.to_string(), "connection reset");
        }
        other => panic!("unexpected error: {other}"),
    }
    // No plane after the failing one was requested.
    assert_eq!(source.reads().len(), 3);
}

#[test]
fn test_exact_min_max() {
    let data = Array5::from_shape_fn((2, 3, 2, 4, 5), |(t, z, c, y, x)| {
        ((t * 7 + z * 13 + c * 29 + y * 3 + x * 11) % 37) as f32 - 12.5
    });
    let expected_min = data.iter().copied().fold(f32::INFINITY, f32::min) as f64;
    let expected_max = data.iter().copied().fold(f32::NEG_INFINITY, f32::max) as f64;
    let source = ArraySource::new(data);

    let volume = fetch_request(&source, &AxisRequest::default()).unwrap();
    assert_eq!(volume.pixel_type(), PixelType::Float);
    assert_eq!(volume.min(), expected_min);
    assert_eq!(volume.max(), expected_max);
}

#[test]
fn test_min_max_ignores_nan() {
    let mut data = Array5::<f64>::zeros((1, 1, 1, 2, 2));
    data[[0, 0, 0, 0, 0]] = f64::NAN;
    data[[0, 0, 0, 0, 1]] = -3.0;
    data[[0, 0, 0, 1, 1]] = 8.25;
    let volume = fetch_request(&ArraySource::new(data), &AxisRequest::default()).unwrap();

    assert_eq!(volume.min(), -3.0);
    assert_eq!(volume.max(), 8.25);
    assert!(volume.data().get(0, 0, 0, 0, 0).unwrap().is_nan());
}

#[test]
fn test_little_endian_source() {
    let data = coded_volume(1, 1, 1, 2, 3);
    let big = ArraySource::new(data.clone());
    let little = ArraySource::new(data).with_little_endian(true);
    let request = AxisRequest::default();

    let from_big = fetch_request(&big, &request).unwrap();
    let from_little = fetch_request(&little, &request).unwrap();
    assert_eq!(from_big.data(), from_little.data());
    assert_eq!(from_little.max(), 12.0);
}

#[test]
fn test_calibration_carried_onto_volume() {
    let calibration = Calibration::new(
        Some(PhysicalSize::micrometers(0.65)),
        Some(PhysicalSize::micrometers(0.65)),
        Some(PhysicalSize::new(2.0, LengthUnit::Micrometer)),
    );
    let source = ArraySource::new(coded_volume(1, 2, 1, 3, 3)).with_calibration(calibration);

    let volume = fetch_volume(&source, &bounds([0, 0, 0, 0, 0], [1, 1, 0, 1, 0]), PixelType::Uint16)
        .unwrap();
    assert_eq!(volume.calibration(), &calibration);

    let plain = fetch_request(&ArraySource::new(coded_volume(1, 1, 1, 2, 2)), &AxisRequest::default())
        .unwrap();
    assert!(!plain.calibration().is_calibrated());
}

#[test]
fn test_short_buffer_is_remote_read() {
    let mut source = Recording::new(ArraySource::new(coded_volume(1, 1, 2, 2, 2)));
    source.truncate = true;

    let err = fetch_request(&source, &AxisRequest::default()).err().unwrap();
    match err {
        RoiError::RemoteRead { coordinate, source } => {
            assert_eq!(coordinate, PlaneIndex::new(0, 0, 0));
            let mismatch = source.downcast_ref::<PlaneLengthMismatch>().unwrap();
            assert_eq!((mismatch.expected, mismatch.actual), (8, 7));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_out_of_range_bounds_are_rejected_before_reading() {
    let source = Recording::new(ArraySource::new(coded_volume(1, 2, 1, 4, 4)));

    let err = fetch_volume(&source, &bounds([0, 0, 0, 0, 0], [4, 3, 0, 2, 0]), PixelType::Uint16)
        .err()
        .unwrap();
    let axes: Vec<_> = err.violations().iter().map(|v| v.axis).collect();
    assert_eq!(axes, vec![crate::bounds::Axis::X, crate::bounds::Axis::Z]);
    assert!(source.reads().is_empty());
}

#[test]
fn test_cancelled_fetch() {
    let token = CancelToken::new();
    let mut source = Recording::new(ArraySource::new(coded_volume(2, 2, 1, 2, 2)));
    source.cancel_after = Some((2, token.clone()));

    let result = fetch_volume_with(
        &source,
        &bounds([0, 0, 0, 0, 0], [1, 1, 0, 1, 1]),
        PixelType::Uint16,
        &token,
    );
    assert!(matches!(result, Err(RoiError::Cancelled)));
    assert_eq!(source.reads().len(), 2);
}

#[test]
fn test_raw_volume_keeps_source_bytes() {
    let source = ArraySource::new(coded_volume(1, 1, 2, 2, 2));
    let raw = fetch_raw_volume(
        &source,
        &bounds([1, 0, 0, 0, 0], [1, 1, 1, 0, 0]),
        &CancelToken::new(),
    )
    .unwrap();

    assert_eq!(raw.pixel_type, PixelType::Uint16);
    assert!(!raw.little_endian);
    assert_eq!(raw.plane_len(), 4);
    // Column x = 1 of both rows, channel 0 then channel 1, big endian.
    let samples: Vec<u16> = raw
        .bytes
        .chunks_exact(2)
        .map(|b| u16::from_be_bytes([b[0], b[1]]))
        .collect();
    assert_eq!(samples, vec![1, 11, 101, 111]);
}

#[test]
fn test_fetch_roi_uses_shape_bounds() {
    let source = ArraySource::new(coded_volume(1, 3, 1, 8, 8));
    let roi = Roi::from_shapes([
        ShapeModel::rectangle(1.0, 1.0, 2.0, 2.0).with_plane(0, 0, 0),
        ShapeModel::point(4.0, 2.0).with_plane(0, 2, 0),
    ]);

    let volume = fetch_roi(&source, &roi).unwrap();
    assert_eq!(volume.shape(), [1, 3, 1, 2, 4]);
    assert_eq!(volume.min(), 11.0);
    assert_eq!(volume.max(), 2024.0);
}

#[test]
fn test_volume_plane_and_npy_export() {
    let source = ArraySource::new(coded_volume(1, 1, 2, 2, 2));
    let volume = fetch_request(&source, &AxisRequest::default()).unwrap();

    let plane = volume.data().plane(0, 0, 1).unwrap();
    assert_eq!(plane[[1, 0]], 110.0);
    assert!(volume.data().plane(0, 0, 2).is_none());

    let mut npy = Vec::new();
    volume.data().write_npy(&mut npy).unwrap();
    assert!(npy.starts_with(b"\x93NUMPY"));
}
