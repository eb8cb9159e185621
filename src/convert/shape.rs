//! Per-kind conversion between [`ShapeModel`] and [`LocalShape`].

use crate::error::RoiError;
use crate::local::{ArrowHeads, LocalKind, LocalPosition, LocalShape, PolygonType};
use crate::shape::{Geometry, Marker, PlanePosition, Point, ShapeModel, ShapeStyle};

/// Convert a shape to its local toolkit counterpart.
///
/// Every shape kind has a local equivalent, so this cannot fail. The label
/// becomes the local name; the plane becomes a 1-based position.
pub fn to_local_shape(shape: &ShapeModel) -> LocalShape {
    let style = shape.style();
    let kind = match shape.geometry() {
        Geometry::Rectangle {
            x,
            y,
            width,
            height,
        } => LocalKind::Rect {
            x: *x,
            y: *y,
            width: *width,
            height: *height,
        },
        Geometry::Ellipse { cx, cy, rx, ry } => LocalKind::Oval {
            x: cx - rx,
            y: cy - ry,
            width: 2.0 * rx,
            height: 2.0 * ry,
        },
        Geometry::Line { x1, y1, x2, y2 } => LocalKind::Line {
            x1: *x1,
            y1: *y1,
            x2: *x2,
            y2: *y2,
            arrow: None,
        },
        Geometry::Arrow { x1, y1, x2, y2 } => LocalKind::Line {
            x1: *x1,
            y1: *y1,
            x2: *x2,
            y2: *y2,
            arrow: Some(ArrowHeads {
                start: style.marker_start.is_some(),
                end: style.marker_end.is_some(),
            }),
        },
        Geometry::Point { x, y } => LocalKind::MultiPoint(vec![Point::new(*x, *y)]),
        Geometry::Polygon { points } => LocalKind::Polygon {
            points: points.clone(),
            polygon_type: PolygonType::Polygon,
        },
        Geometry::Polyline { points } => LocalKind::Polygon {
            points: points.clone(),
            polygon_type: PolygonType::Polyline,
        },
        Geometry::Text { x, y } => LocalKind::Text {
            x: *x,
            y: *y,
            text: shape.label().unwrap_or_default().to_string(),
        },
        Geometry::Mask {
            x,
            y,
            width,
            height,
            bits,
        } => LocalKind::Bitmap {
            x: *x,
            y: *y,
            width: *width,
            height: *height,
            bits: bits.clone(),
        },
    };

    let plane = shape.plane();
    let mut local = LocalShape::new(kind).with_position(plane.c + 1, plane.z + 1, plane.t + 1);
    local.name = shape.label().map(str::to_string);
    local.stroke_color = style.stroke_color;
    local.fill_color = style.fill_color;
    local.stroke_width = style.stroke_width;
    local
}

/// Convert a local shape into one or more shapes.
///
/// Primitive local shapes yield exactly one shape. Multi-point shapes yield
/// one point per marker, and composites are decomposed into their parts,
/// each taking the composite's name and position. Image overlays have no
/// vector equivalent and fail with [`RoiError::UnsupportedShape`].
pub fn from_local_shape(local: &LocalShape) -> Result<Vec<ShapeModel>, RoiError> {
    let plane = plane_of(local.position);
    let mut style = ShapeStyle {
        stroke_color: local.stroke_color,
        fill_color: local.fill_color,
        stroke_width: local.stroke_width,
        ..ShapeStyle::default()
    };

    let geometries = match &local.kind {
        LocalKind::Rect {
            x,
            y,
            width,
            height,
        } => vec![Geometry::Rectangle {
            x: *x,
            y: *y,
            width: *width,
            height: *height,
        }],
        LocalKind::Oval {
            x,
            y,
            width,
            height,
        } => vec![Geometry::Ellipse {
            cx: x + width / 2.0,
            cy: y + height / 2.0,
            rx: width / 2.0,
            ry: height / 2.0,
        }],
        LocalKind::Line {
            x1,
            y1,
            x2,
            y2,
            arrow: None,
        } => vec![Geometry::Line {
            x1: *x1,
            y1: *y1,
            x2: *x2,
            y2: *y2,
        }],
        LocalKind::Line {
            x1,
            y1,
            x2,
            y2,
            arrow: Some(heads),
        } => {
            style.marker_start = heads.start.then_some(Marker::Arrow);
            style.marker_end = heads.end.then_some(Marker::Arrow);
            vec![Geometry::Arrow {
                x1: *x1,
                y1: *y1,
                x2: *x2,
                y2: *y2,
            }]
        }
        LocalKind::MultiPoint(points) => points
            .iter()
            .map(|p| Geometry::Point { x: p.x, y: p.y })
            .collect(),
        LocalKind::Polygon {
            points,
            polygon_type,
        } => {
            let points = points.clone();
            if polygon_type.is_open() {
                vec![Geometry::Polyline { points }]
            } else {
                vec![Geometry::Polygon { points }]
            }
        }
        LocalKind::Text { x, y, text } => {
            let mut shape = ShapeModel::new(Geometry::Text { x: *x, y: *y })
                .with_plane(plane.c, plane.z, plane.t)
                .with_style(style);
            if !text.is_empty() {
                shape = shape.with_text(text.as_str());
            }
            return Ok(vec![shape]);
        }
        LocalKind::Bitmap {
            x,
            y,
            width,
            height,
            bits,
        } => vec![Geometry::Mask {
            x: *x,
            y: *y,
            width: *width,
            height: *height,
            bits: bits.clone(),
        }],
        LocalKind::Composite(parts) => return decompose(local, parts),
        LocalKind::Image { .. } => return Err(RoiError::unsupported_shape(local.kind.type_name())),
    };

    Ok(geometries
        .into_iter()
        .map(|geometry| {
            let shape = ShapeModel::new(geometry)
                .with_plane(plane.c, plane.z, plane.t)
                .with_style(style.clone());
            match &local.name {
                Some(name) => shape.with_text(name.as_str()),
                None => shape,
            }
        })
        .collect())
}

fn decompose(composite: &LocalShape, parts: &[LocalShape]) -> Result<Vec<ShapeModel>, RoiError> {
    log::trace!("Decomposing composite shape into {} part(s)", parts.len());
    let mut shapes = Vec::with_capacity(parts.len());
    for part in parts {
        let mut part = part.clone();
        part.name = composite.name.clone();
        part.position = composite.position;
        shapes.extend(from_local_shape(&part)?);
    }
    Ok(shapes)
}

/// 1-based local position to 0-based plane; unset axes map to 0.
fn plane_of(position: LocalPosition) -> PlanePosition {
    PlanePosition::new(
        position.channel.saturating_sub(1),
        position.slice.saturating_sub(1),
        position.frame.saturating_sub(1),
    )
}
