//! Shape model of the local image-processing toolkit.
//!
//! Local shapes follow the toolkit's conventions: positions are 1-based with
//! 0 meaning "not set", ellipses are described by their bounding rectangle,
//! and several point markers may live in one shape. Free-form string
//! properties carry side-channel data such as 4D ROI group IDs.

use std::collections::BTreeMap;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::shape::Point;

/// Which ends of a local arrow carry a head.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArrowHeads {
    pub start: bool,
    pub end: bool,
}

impl ArrowHeads {
    /// Head at the end point only.
    pub fn forward() -> Self {
        Self {
            start: false,
            end: true,
        }
    }
}

/// Sub-type of a local polygon shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PolygonType {
    Polygon,
    Freehand,
    Traced,
    Polyline,
    Freeline,
    Angle,
}

impl PolygonType {
    /// Open types are drawn without closing the outline.
    pub fn is_open(&self) -> bool {
        matches!(
            self,
            PolygonType::Polyline | PolygonType::Freeline | PolygonType::Angle
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            PolygonType::Polygon => "Polygon",
            PolygonType::Freehand => "Freehand",
            PolygonType::Traced => "Traced",
            PolygonType::Polyline => "Polyline",
            PolygonType::Freeline => "Freeline",
            PolygonType::Angle => "Angle",
        }
    }
}

/// Geometry of a local shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LocalKind {
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    /// Ellipse inscribed in the given rectangle.
    Oval {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    Line {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        arrow: Option<ArrowHeads>,
    },
    /// One or more point markers.
    MultiPoint(Vec<Point>),
    Polygon {
        points: Vec<Point>,
        polygon_type: PolygonType,
    },
    Text { x: f64, y: f64, text: String },
    /// Binary overlay; `bits` is indexed as [row][column].
    Bitmap {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        bits: Array2<bool>,
    },
    /// Union of several shapes.
    Composite(Vec<LocalShape>),
    /// Image overlay. Has no vector equivalent.
    Image {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
}

impl LocalKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            LocalKind::Rect { .. } => "Rectangle",
            LocalKind::Oval { .. } => "Oval",
            LocalKind::Line { arrow: Some(_), .. } => "Arrow",
            LocalKind::Line { .. } => "Line",
            LocalKind::MultiPoint(_) => "Point",
            LocalKind::Polygon { polygon_type, .. } => polygon_type.name(),
            LocalKind::Text { .. } => "Text",
            LocalKind::Bitmap { .. } => "Bitmap",
            LocalKind::Composite(_) => "Composite",
            LocalKind::Image { .. } => "Image",
        }
    }
}

/// 1-based hyperstack position; 0 on an axis means "not set".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocalPosition {
    pub channel: u32,
    pub slice: u32,
    pub frame: u32,
}

impl LocalPosition {
    pub fn new(channel: u32, slice: u32, frame: u32) -> Self {
        Self {
            channel,
            slice,
            frame,
        }
    }
}

/// A shape as the local toolkit stores it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalShape {
    pub kind: LocalKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub position: LocalPosition,
    /// Display group used for grouped coloring (0 = none).
    #[serde(default)]
    pub group: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_color: Option<[u8; 4]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill_color: Option<[u8; 4]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    properties: BTreeMap<String, String>,
}

impl LocalShape {
    pub fn new(kind: LocalKind) -> Self {
        Self {
            kind,
            name: None,
            position: LocalPosition::default(),
            group: 0,
            stroke_color: None,
            fill_color: None,
            stroke_width: None,
            properties: BTreeMap::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_position(mut self, channel: u32, slice: u32, frame: u32) -> Self {
        self.position = LocalPosition::new(channel, slice, frame);
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_property(key, value);
        self
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.properties.insert(key.into(), value.into());
    }

    pub fn properties(&self) -> impl Iterator<Item = (&str, &str)> {
        self.properties
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
