//! 5D bounds computation and axis-range validation.
//!
//! Bounds are expressed in pixel indices with an inclusive end on every axis:
//! a rectangle at x = 10 with width 5 covers columns 10..=14.

use std::fmt;

use crate::error::{RangeViolation, RoiError};
use crate::pixels::PixelDimensions;
use crate::shape::ShapeModel;

/// The five axes of a pixel volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    C,
    Z,
    T,
}

impl Axis {
    /// All axes in (X, Y, C, Z, T) order.
    pub const ALL: [Axis; 5] = [Axis::X, Axis::Y, Axis::C, Axis::Z, Axis::T];
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Axis::X => "X",
            Axis::Y => "Y",
            Axis::C => "C",
            Axis::Z => "Z",
            Axis::T => "T",
        };
        f.write_str(name)
    }
}

/// A position in the 5D pixel space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Coordinates {
    pub x: i64,
    pub y: i64,
    pub c: i64,
    pub z: i64,
    pub t: i64,
}

impl Coordinates {
    pub fn new(x: i64, y: i64, c: i64, z: i64, t: i64) -> Self {
        Self { x, y, c, z, t }
    }

    /// Value along one axis.
    pub fn get(&self, axis: Axis) -> i64 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::C => self.c,
            Axis::Z => self.z,
            Axis::T => self.t,
        }
    }

    fn set(&mut self, axis: Axis, value: i64) {
        match axis {
            Axis::X => self.x = value,
            Axis::Y => self.y = value,
            Axis::C => self.c = value,
            Axis::Z => self.z = value,
            Axis::T => self.t = value,
        }
    }

    fn combine(self, other: Self, f: impl Fn(i64, i64) -> i64) -> Self {
        Self {
            x: f(self.x, other.x),
            y: f(self.y, other.y),
            c: f(self.c, other.c),
            z: f(self.z, other.z),
            t: f(self.t, other.t),
        }
    }
}

/// An inclusive range of indices along one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisRange {
    pub lo: i64,
    pub hi: i64,
}

impl AxisRange {
    pub fn new(lo: i64, hi: i64) -> Self {
        Self { lo, hi }
    }

    /// Number of indices covered.
    pub fn len(&self) -> i64 {
        self.hi - self.lo + 1
    }

    pub fn is_empty(&self) -> bool {
        self.hi < self.lo
    }
}

/// Axis-aligned box over (X, Y, C, Z, T) with inclusive end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds5D {
    pub start: Coordinates,
    pub end: Coordinates,
}

impl Bounds5D {
    pub fn new(start: Coordinates, end: Coordinates) -> Self {
        Self { start, end }
    }

    /// Build bounds from one inclusive range per axis.
    pub fn from_ranges(x: AxisRange, y: AxisRange, c: AxisRange, z: AxisRange, t: AxisRange) -> Self {
        Self {
            start: Coordinates::new(x.lo, y.lo, c.lo, z.lo, t.lo),
            end: Coordinates::new(x.hi, y.hi, c.hi, z.hi, t.hi),
        }
    }

    /// Extent per axis (`end - start + 1`), saturating at `i64::MAX`.
    pub fn size(&self) -> Coordinates {
        self.end
            .combine(self.start, |e, s| e.saturating_sub(s).saturating_add(1))
    }

    pub fn range(&self, axis: Axis) -> AxisRange {
        AxisRange::new(self.start.get(axis), self.end.get(axis))
    }

    /// Number of planes (C x Z x T) covered.
    pub fn plane_count(&self) -> i64 {
        let size = self.size();
        size.c.saturating_mul(size.z).saturating_mul(size.t)
    }

    /// Check these bounds against a volume's declared dimensions.
    ///
    /// Every axis is validated; all violations are reported together.
    pub fn within(&self, dims: &PixelDimensions) -> Result<Self, RoiError> {
        let request = AxisRequest {
            x: Some([self.start.x, self.end.x]),
            y: Some([self.start.y, self.end.y]),
            c: Some([self.start.c, self.end.c]),
            z: Some([self.start.z, self.end.z]),
            t: Some([self.start.t, self.end.t]),
        };
        resolve_bounds(&request, dims)
    }
}

impl fmt::Display for Bounds5D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, axis) in Axis::ALL.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}:[{},{}]", axis, self.start.get(*axis), self.end.get(*axis))?;
        }
        Ok(())
    }
}

/// Optional caller-supplied `[lo, hi]` per axis. `None` means the whole axis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AxisRequest {
    pub x: Option<[i64; 2]>,
    pub y: Option<[i64; 2]>,
    pub c: Option<[i64; 2]>,
    pub z: Option<[i64; 2]>,
    pub t: Option<[i64; 2]>,
}

impl AxisRequest {
    pub fn get(&self, axis: Axis) -> Option<[i64; 2]> {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::C => self.c,
            Axis::Z => self.z,
            Axis::T => self.t,
        }
    }
}

/// Pixel span `[start, end]` covered by a box starting at `origin` with
/// extent `extent`. Degenerate boxes still cover the pixel they start in.
fn pixel_span(origin: f64, extent: f64) -> (i64, i64) {
    // Float-to-int casts saturate, so extreme coordinates cannot wrap.
    let start = origin.floor() as i64;
    let end = ((origin + extent).ceil() as i64).saturating_sub(1);
    (start, end.max(start))
}

/// Compute the minimal 5D box enclosing every shape.
pub fn compute_bounds(shapes: &[ShapeModel]) -> Result<Bounds5D, RoiError> {
    shapes
        .iter()
        .map(shape_bounds)
        .reduce(|acc, b| Bounds5D {
            start: acc.start.combine(b.start, i64::min),
            end: acc.end.combine(b.end, i64::max),
        })
        .ok_or(RoiError::EmptyInput)
}

fn shape_bounds(shape: &ShapeModel) -> Bounds5D {
    let bbox = shape.bounding_box();
    let (x0, x1) = pixel_span(bbox.x, bbox.width);
    let (y0, y1) = pixel_span(bbox.y, bbox.height);
    let plane = shape.plane();
    let (c, z, t) = (i64::from(plane.c), i64::from(plane.z), i64::from(plane.t));
    Bounds5D::new(Coordinates::new(x0, y0, c, z, t), Coordinates::new(x1, y1, c, z, t))
}

/// Resolve an optional `[lo, hi]` request against an axis of `declared_size`.
///
/// `None` selects the whole axis. A supplied range must satisfy
/// `0 <= lo <= hi < declared_size`; it is never clamped.
pub fn resolve_axis_range(
    axis: Axis,
    requested: Option<[i64; 2]>,
    declared_size: u32,
) -> Result<AxisRange, RoiError> {
    check_axis(axis, requested, declared_size).map_err(|v| RoiError::OutOfRange(vec![v]))
}

fn check_axis(
    axis: Axis,
    requested: Option<[i64; 2]>,
    size: u32,
) -> Result<AxisRange, RangeViolation> {
    let [lo, hi] = requested.unwrap_or([0, i64::from(size) - 1]);
    if lo < 0 || lo > hi || hi >= i64::from(size) {
        return Err(RangeViolation { axis, lo, hi, size });
    }
    Ok(AxisRange::new(lo, hi))
}

/// Resolve a full 5D request against a volume's dimensions.
///
/// Each axis is validated on its own; the error lists every bad axis.
pub fn resolve_bounds(request: &AxisRequest, dims: &PixelDimensions) -> Result<Bounds5D, RoiError> {
    let mut start = Coordinates::default();
    let mut end = Coordinates::default();
    let mut violations = Vec::new();

    for axis in Axis::ALL {
        match check_axis(axis, request.get(axis), dims.size(axis)) {
            Ok(range) => {
                start.set(axis, range.lo);
                end.set(axis, range.hi);
            }
            Err(violation) => violations.push(violation),
        }
    }

    if violations.is_empty() {
        Ok(Bounds5D::new(start, end))
    } else {
        log::debug!("Rejected axis request: {:?}", violations);
        Err(RoiError::OutOfRange(violations))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixels::PixelType;

    fn dims() -> PixelDimensions {
        PixelDimensions::new(64, 32, 3, 5, 2, PixelType::Uint16)
    }

    #[test]
    fn test_empty_input() {
        assert!(matches!(compute_bounds(&[]), Err(RoiError::EmptyInput)));
    }

    #[test]
    fn test_rectangle_inclusive_end() {
        let shapes = [ShapeModel::rectangle(10.0, 20.0, 5.0, 3.0).with_plane(1, 2, 0)];
        let bounds = compute_bounds(&shapes).unwrap();
        assert_eq!(bounds.start, Coordinates::new(10, 20, 1, 2, 0));
        assert_eq!(bounds.end, Coordinates::new(14, 22, 1, 2, 0));
        assert_eq!(bounds.size(), Coordinates::new(5, 3, 1, 1, 1));
    }

    #[test]
    fn test_combines_all_axes() {
        let shapes = [
            ShapeModel::rectangle(10.0, 10.0, 10.0, 10.0).with_plane(2, 0, 4),
            ShapeModel::ellipse(50.0, 50.0, 5.0, 8.0).with_plane(0, 3, 1),
            ShapeModel::point(5.0, 70.0).with_plane(1, 1, 1),
        ];
        let bounds = compute_bounds(&shapes).unwrap();
        assert_eq!(bounds.start, Coordinates::new(5, 10, 0, 0, 1));
        assert_eq!(bounds.end, Coordinates::new(54, 70, 2, 3, 4));
    }

    #[test]
    fn test_shapes_lie_within_bounds() {
        let shapes = [
            ShapeModel::polygon([(3.5, 4.0), (9.0, 1.25), (6.0, 12.0)]),
            ShapeModel::line(-4.0, 2.0, 8.0, 2.0).with_plane(0, 2, 0),
            ShapeModel::text("label", 30.0, 30.0),
        ];
        let bounds = compute_bounds(&shapes).unwrap();
        for axis in Axis::ALL {
            assert!(bounds.start.get(axis) <= bounds.end.get(axis), "axis {axis}");
        }
        for shape in &shapes {
            let bbox = shape.bounding_box();
            assert!(bbox.x >= bounds.start.x as f64);
            assert!(bbox.y >= bounds.start.y as f64);
            assert!(bbox.bottom_right().x <= (bounds.end.x + 1) as f64);
            assert!(bbox.bottom_right().y <= (bounds.end.y + 1) as f64);
        }
    }

    #[test]
    fn test_degenerate_shapes_cover_one_pixel() {
        let bounds = compute_bounds(&[ShapeModel::point(7.0, 9.0)]).unwrap();
        assert_eq!(bounds.size(), Coordinates::new(1, 1, 1, 1, 1));

        let bounds = compute_bounds(&[ShapeModel::line(0.0, 4.0, 10.0, 4.0)]).unwrap();
        assert_eq!(bounds.range(Axis::Y), AxisRange::new(4, 4));
    }

    #[test]
    fn test_extreme_coordinates_saturate() {
        let shapes = [
            ShapeModel::rectangle(f64::MAX, 0.0, f64::MAX, 1.0),
            ShapeModel::point(-1e300, 0.0),
        ];
        let bounds = compute_bounds(&shapes).unwrap();
        assert_eq!(bounds.start.x, i64::MIN);
        assert_eq!(bounds.end.x, i64::MAX);
        assert_eq!(bounds.size(), Coordinates::new(i64::MAX, 2, 1, 1, 1));
        assert_eq!(bounds.plane_count(), 1);
        assert_eq!(bounds.range(Axis::X).len(), i64::MAX);
    }

    #[test]
    fn test_plane_count_saturates() {
        let bounds = Bounds5D::new(
            Coordinates::new(0, 0, i64::MIN, i64::MIN, 0),
            Coordinates::new(0, 0, i64::MAX, i64::MAX, 3),
        );
        assert_eq!(bounds.size().c, i64::MAX);
        assert_eq!(bounds.plane_count(), i64::MAX);
    }

    #[test]
    fn test_single_shape_at_i64_edge() {
        let bounds = compute_bounds(&[ShapeModel::point(i64::MAX as f64, 0.0)]).unwrap();
        assert_eq!(bounds.start.x, bounds.end.x);
    }

    #[test]
    fn test_resolve_default_is_full_axis() {
        for size in [1, 2, 17, 4096] {
            let range = resolve_axis_range(Axis::X, None, size).unwrap();
            assert_eq!(range, AxisRange::new(0, i64::from(size) - 1));
        }
    }

    #[test]
    fn test_resolve_rejects_out_of_range() {
        assert!(resolve_axis_range(Axis::Z, Some([0, 4]), 5).is_ok());
        for bad in [[-1, 2], [0, 5], [3, 2], [7, 9]] {
            let err = resolve_axis_range(Axis::Z, Some(bad), 5).unwrap_err();
            assert_eq!(err.violations().len(), 1);
            assert_eq!(err.violations()[0].axis, Axis::Z);
        }
    }

    #[test]
    fn test_resolve_zero_sized_axis() {
        assert!(resolve_axis_range(Axis::T, None, 0).is_err());
    }

    #[test]
    fn test_resolve_bounds_reports_every_bad_axis() {
        let request = AxisRequest {
            x: Some([-2, 10]),
            c: Some([0, 3]),
            t: Some([1, 1]),
            ..Default::default()
        };
        let err = resolve_bounds(&request, &dims()).unwrap_err();
        let axes: Vec<Axis> = err.violations().iter().map(|v| v.axis).collect();
        assert_eq!(axes, vec![Axis::X, Axis::C]);
    }

    #[test]
    fn test_resolve_bounds_defaults() {
        let request = AxisRequest {
            z: Some([1, 3]),
            ..Default::default()
        };
        let bounds = resolve_bounds(&request, &dims()).unwrap();
        assert_eq!(bounds.start, Coordinates::new(0, 0, 0, 1, 0));
        assert_eq!(bounds.end, Coordinates::new(63, 31, 2, 3, 1));
        assert_eq!(bounds.plane_count(), 3 * 3 * 2);
    }

    #[test]
    fn test_roi_bounds_within_volume() {
        let shapes = [ShapeModel::rectangle(60.0, 0.0, 10.0, 4.0)];
        let bounds = compute_bounds(&shapes).unwrap();
        let err = bounds.within(&dims()).unwrap_err();
        assert_eq!(err.violations()[0].axis, Axis::X);
    }
}
