//! Shape data model.
//!
//! This module provides the canonical 2D annotation used throughout the engine:
//! - Geometry primitives (points, rectangles)
//! - One geometry variant per shape kind
//! - Plane position (channel, Z, time) and pass-through display style

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::error::RoiError;

// ============================================================================
// Core Geometry Types
// ============================================================================

/// A 2D point in image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

/// An axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Top-left corner X coordinate
    pub x: f64,
    /// Top-left corner Y coordinate
    pub y: f64,
    /// Width of the rectangle
    pub width: f64,
    /// Height of the rectangle
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Smallest rectangle enclosing all points, or `None` for an empty list.
    pub fn enclosing(points: &[Point]) -> Option<Self> {
        let first = points.first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in &points[1..] {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Some(Self::new(min_x, min_y, max_x - min_x, max_y - min_y))
    }

    /// Bottom-right corner (exclusive).
    pub fn bottom_right(&self) -> Point {
        Point::new(self.x + self.width, self.y + self.height)
    }
}

// ============================================================================
// Shape Kinds and Geometry
// ============================================================================

/// The closed set of shape kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShapeKind {
    Rectangle,
    Ellipse,
    Line,
    Arrow,
    Point,
    Polygon,
    Polyline,
    Text,
    Mask,
}

impl ShapeKind {
    /// Get the display name for this kind.
    pub fn name(&self) -> &'static str {
        match self {
            ShapeKind::Rectangle => "Rectangle",
            ShapeKind::Ellipse => "Ellipse",
            ShapeKind::Line => "Line",
            ShapeKind::Arrow => "Arrow",
            ShapeKind::Point => "Point",
            ShapeKind::Polygon => "Polygon",
            ShapeKind::Polyline => "Polyline",
            ShapeKind::Text => "Text",
            ShapeKind::Mask => "Mask",
        }
    }

    /// Get all shape kinds.
    pub fn all() -> &'static [ShapeKind] {
        &[
            ShapeKind::Rectangle,
            ShapeKind::Ellipse,
            ShapeKind::Line,
            ShapeKind::Arrow,
            ShapeKind::Point,
            ShapeKind::Polygon,
            ShapeKind::Polyline,
            ShapeKind::Text,
            ShapeKind::Mask,
        ]
    }
}

/// Kind-specific geometry of a shape (in image coordinates).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Rectangle {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    /// Ellipse given by its center and radii.
    Ellipse { cx: f64, cy: f64, rx: f64, ry: f64 },
    Line { x1: f64, y1: f64, x2: f64, y2: f64 },
    /// A line drawn with arrow heads (see [`ShapeStyle`] markers).
    Arrow { x1: f64, y1: f64, x2: f64, y2: f64 },
    Point { x: f64, y: f64 },
    /// Closed polygon.
    Polygon { points: Vec<Point> },
    /// Open polyline.
    Polyline { points: Vec<Point> },
    /// Text anchor; the text itself is the shape's label.
    Text { x: f64, y: f64 },
    /// Binary mask placed at (x, y) and stretched to width x height.
    Mask {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        /// Mask bits indexed as [row][column]
        bits: Array2<bool>,
    },
}

impl Geometry {
    /// The kind this geometry belongs to.
    pub fn kind(&self) -> ShapeKind {
        match self {
            Geometry::Rectangle { .. } => ShapeKind::Rectangle,
            Geometry::Ellipse { .. } => ShapeKind::Ellipse,
            Geometry::Line { .. } => ShapeKind::Line,
            Geometry::Arrow { .. } => ShapeKind::Arrow,
            Geometry::Point { .. } => ShapeKind::Point,
            Geometry::Polygon { .. } => ShapeKind::Polygon,
            Geometry::Polyline { .. } => ShapeKind::Polyline,
            Geometry::Text { .. } => ShapeKind::Text,
            Geometry::Mask { .. } => ShapeKind::Mask,
        }
    }

    /// Get the 2D bounding rectangle of this geometry.
    ///
    /// Point-like geometries (points, text anchors, empty polygons) yield a
    /// zero-sized rectangle at their anchor.
    pub fn bounding_box(&self) -> Rect {
        match self {
            Geometry::Rectangle {
                x,
                y,
                width,
                height,
            }
            | Geometry::Mask {
                x,
                y,
                width,
                height,
                ..
            } => Rect::new(*x, *y, *width, *height),
            Geometry::Ellipse { cx, cy, rx, ry } => {
                Rect::new(cx - rx, cy - ry, 2.0 * rx, 2.0 * ry)
            }
            Geometry::Line { x1, y1, x2, y2 } | Geometry::Arrow { x1, y1, x2, y2 } => {
                Rect::new(x1.min(*x2), y1.min(*y2), (x2 - x1).abs(), (y2 - y1).abs())
            }
            Geometry::Point { x, y } | Geometry::Text { x, y } => Rect::new(*x, *y, 0.0, 0.0),
            Geometry::Polygon { points } | Geometry::Polyline { points } => {
                Rect::enclosing(points).unwrap_or_else(|| Rect::new(0.0, 0.0, 0.0, 0.0))
            }
        }
    }
}

// ============================================================================
// Plane Position and Style
// ============================================================================

/// Plane a shape lives on (all 0-based).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlanePosition {
    pub c: u32,
    pub z: u32,
    pub t: u32,
}

impl PlanePosition {
    pub fn new(c: u32, z: u32, t: u32) -> Self {
        Self { c, z, t }
    }
}

/// Line end decoration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Marker {
    Arrow,
}

/// Display decorations. Carried through conversions untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShapeStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marker_start: Option<Marker>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marker_end: Option<Marker>,
    /// Stroke color (RGBA)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_color: Option<[u8; 4]>,
    /// Fill color (RGBA)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill_color: Option<[u8; 4]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f64>,
}

// ============================================================================
// Shape
// ============================================================================

/// A single 2D annotation on one plane of an image.
///
/// Shapes are values: the `with_*` builders consume the shape and return an
/// updated copy, so a shape held by a [`crate::roi::Roi`] never changes behind
/// the caller's back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeModel {
    /// Server-assigned ID, `None` until persisted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    geometry: Geometry,
    #[serde(default)]
    plane: PlanePosition,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default)]
    style: ShapeStyle,
}

impl ShapeModel {
    /// Create a shape on plane (0, 0, 0) with no text or style.
    pub fn new(geometry: Geometry) -> Self {
        Self {
            id: None,
            geometry,
            plane: PlanePosition::default(),
            text: None,
            style: ShapeStyle::default(),
        }
    }

    pub fn rectangle(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::new(Geometry::Rectangle {
            x,
            y,
            width,
            height,
        })
    }

    pub fn ellipse(cx: f64, cy: f64, rx: f64, ry: f64) -> Self {
        Self::new(Geometry::Ellipse { cx, cy, rx, ry })
    }

    pub fn line(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self::new(Geometry::Line { x1, y1, x2, y2 })
    }

    /// Create a single-headed arrow pointing at (x2, y2).
    pub fn arrow(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        let mut shape = Self::new(Geometry::Arrow { x1, y1, x2, y2 });
        shape.style.marker_end = Some(Marker::Arrow);
        shape
    }

    pub fn point(x: f64, y: f64) -> Self {
        Self::new(Geometry::Point { x, y })
    }

    pub fn polygon(points: impl IntoIterator<Item = impl Into<Point>>) -> Self {
        Self::new(Geometry::Polygon {
            points: points.into_iter().map(Into::into).collect(),
        })
    }

    pub fn polyline(points: impl IntoIterator<Item = impl Into<Point>>) -> Self {
        Self::new(Geometry::Polyline {
            points: points.into_iter().map(Into::into).collect(),
        })
    }

    /// Create a text shape anchored at (x, y).
    pub fn text(text: impl Into<String>, x: f64, y: f64) -> Self {
        Self::new(Geometry::Text { x, y }).with_text(text)
    }

    /// Create a mask covering `bits.ncols() x bits.nrows()` pixels at (x, y).
    pub fn mask(x: f64, y: f64, bits: Array2<bool>) -> Self {
        let (rows, cols) = bits.dim();
        Self::new(Geometry::Mask {
            x,
            y,
            width: cols as f64,
            height: rows as f64,
            bits,
        })
    }

    pub fn with_plane(mut self, c: u32, z: u32, t: u32) -> Self {
        self.plane = PlanePosition::new(c, z, t);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_style(mut self, style: ShapeStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    /// Replace the geometry with another geometry of the same kind.
    pub fn with_geometry(mut self, geometry: Geometry) -> Result<Self, RoiError> {
        let (from, to) = (self.kind(), geometry.kind());
        if from != to {
            return Err(RoiError::KindChange {
                from: from.name(),
                to: to.name(),
            });
        }
        self.geometry = geometry;
        Ok(self)
    }

    pub fn kind(&self) -> ShapeKind {
        self.geometry.kind()
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn plane(&self) -> PlanePosition {
        self.plane
    }

    /// Label text, or the displayed text for [`ShapeKind::Text`].
    pub fn label(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn style(&self) -> &ShapeStyle {
        &self.style
    }

    /// Get the 2D bounding rectangle of this shape.
    pub fn bounding_box(&self) -> Rect {
        self.geometry.bounding_box()
    }
}

// ============================================================================
// Tests
// ============================================================================
