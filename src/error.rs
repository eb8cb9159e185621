//! Error types for the ROI and pixel engine.

use std::fmt;

use thiserror::Error;

use crate::bounds::Axis;
use crate::pixels::PlaneIndex;

/// Error returned by a collaborator (pixel source, ROI store).
///
/// Sources define their own failure types; the engine only needs to carry
/// them through to the caller.
pub type SourceError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur while computing bounds, fetching pixels or
/// converting shapes.
#[derive(Error, Debug)]
pub enum RoiError {
    /// Bounds were requested for an empty shape list.
    #[error("Cannot compute bounds of an empty shape list")]
    EmptyInput,

    /// One or more requested axis ranges fall outside the declared volume.
    #[error("Requested range out of bounds: {}", DisplayViolations(.0))]
    OutOfRange(Vec<RangeViolation>),

    /// Reading a plane from the pixel source failed.
    #[error("Failed to read plane {coordinate}: {source}")]
    RemoteRead {
        /// The (t, z, c) plane that could not be read
        coordinate: PlaneIndex,
        /// Underlying source error
        source: SourceError,
    },

    /// A local shape has no conversion and no decomposition rule.
    #[error("Unsupported shape type '{kind}'")]
    UnsupportedShape {
        /// Name of the offending shape type
        kind: String,
    },

    /// The declared sample layout does not map to a known pixel type.
    #[error("Unsupported pixel type: {bytes_per_sample} byte(s), floating point = {floating_point}")]
    UnsupportedPixelType {
        /// Declared bytes per sample
        bytes_per_sample: usize,
        /// Whether samples were declared as floating point
        floating_point: bool,
    },

    /// A ROI already linked to one image was linked to another.
    #[error("ROI is already associated with image {current}, cannot associate with {requested}")]
    ImageAlreadyAssociated {
        /// Image the ROI is bound to
        current: i64,
        /// Image that was requested
        requested: i64,
    },

    /// A shape's geometry was replaced by a geometry of another kind.
    #[error("Cannot change shape kind from {from} to {to}")]
    KindChange {
        /// Kind of the existing geometry
        from: &'static str,
        /// Kind of the replacement geometry
        to: &'static str,
    },

    /// The fetch was cancelled before completion.
    #[error("Volume fetch cancelled")]
    Cancelled,

    /// Persisting a ROI failed.
    #[error("Cannot save ROI: {0}")]
    Store(#[source] SourceError),

    /// I/O error during file operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing or serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RoiError {
    /// Create an unsupported shape error.
    pub fn unsupported_shape(kind: impl Into<String>) -> Self {
        Self::UnsupportedShape { kind: kind.into() }
    }

    /// Wrap a source failure for the given plane.
    pub fn remote_read(coordinate: PlaneIndex, source: impl Into<SourceError>) -> Self {
        Self::RemoteRead {
            coordinate,
            source: source.into(),
        }
    }

    /// Violations carried by an out-of-range error (empty for other variants).
    pub fn violations(&self) -> &[RangeViolation] {
        match self {
            Self::OutOfRange(violations) => violations,
            _ => &[],
        }
    }
}

/// A single axis whose requested range is not inside the volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeViolation {
    /// The axis that failed validation
    pub axis: Axis,
    /// Requested lower bound (inclusive)
    pub lo: i64,
    /// Requested upper bound (inclusive)
    pub hi: i64,
    /// Declared size of the axis
    pub size: u32,
}

impl fmt::Display for RangeViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}, {}] not within [0, {})",
            self.axis, self.lo, self.hi, self.size
        )
    }
}

struct DisplayViolations<'a>(&'a [RangeViolation]);

impl fmt::Display for DisplayViolations<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, violation) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{violation}")?;
        }
        Ok(())
    }
}
