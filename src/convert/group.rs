//! 4D ROI grouping over flat local shape lists.
//!
//! The local toolkit has no notion of a multi-shape ROI. Shapes that belong
//! together carry the same integer under an ID property; grouping collects
//! them back into one [`Roi`], ungrouping writes the property out.

use std::collections::HashMap;

use crate::constants::{DEFAULT_ID_PROPERTY, MAX_DISPLAY_GROUPS};
use crate::error::RoiError;
use crate::local::LocalShape;
use crate::roi::Roi;

use super::{from_local_shape, to_local_shape};

/// Options controlling how ROIs map onto local shapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupingOptions {
    /// Property holding the 4D ROI index.
    pub id_property: String,
    /// Display groups are assigned only when there are fewer ROIs than this.
    pub max_display_groups: usize,
}

impl Default for GroupingOptions {
    fn default() -> Self {
        Self {
            id_property: DEFAULT_ID_PROPERTY.to_string(),
            max_display_groups: MAX_DISPLAY_GROUPS,
        }
    }
}

impl GroupingOptions {
    pub fn with_id_property(mut self, property: impl Into<String>) -> Self {
        self.id_property = property.into();
        self
    }
}

/// A local shape that was left out of a grouping pass.
#[derive(Debug)]
pub struct ConversionWarning {
    /// Position of the shape in the input list
    pub index: usize,
    /// Name of the shape, if it had one
    pub name: Option<String>,
    /// Why the shape was skipped
    pub error: RoiError,
}

/// Result of [`group_4d`]: the ROIs plus any shapes that were skipped.
#[derive(Debug, Default)]
pub struct Grouped {
    pub rois: Vec<Roi>,
    pub warnings: Vec<ConversionWarning>,
}

impl Grouped {
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Normalize an ID property name; blank names fall back to `"ROI"`.
pub fn id_property(property: &str) -> &str {
    if property.trim().is_empty() {
        DEFAULT_ID_PROPERTY
    } else {
        property
    }
}

/// Property carrying the persisted ROI ID next to `property`.
pub fn server_id_property(property: &str) -> String {
    format!("{}_ID", id_property(property))
}

/// Parse a group ID. Only plain integers (`-?\d+`) count.
fn parse_group_id(value: &str) -> Option<i64> {
    let digits = value.strip_prefix('-').unwrap_or(value);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    value.parse().ok()
}

/// Group flat local shapes into 4D ROIs.
///
/// Shapes whose `property` holds an integer are merged by that value,
/// wherever they occur in the list. Any other shape becomes its own ROI.
/// ROIs are ordered by the first appearance of their group, and shapes keep
/// their relative order within a ROI.
///
/// Conversion is best-effort: a shape that cannot be converted is skipped,
/// logged and reported in [`Grouped::warnings`].
pub fn group_4d(shapes: &[LocalShape], property: &str) -> Grouped {
    let property = id_property(property);
    let mut slots: Vec<Roi> = Vec::new();
    let mut by_id: HashMap<i64, usize> = HashMap::new();
    let mut warnings = Vec::new();

    for (index, local) in shapes.iter().enumerate() {
        let slot = match local.property(property).and_then(parse_group_id) {
            Some(id) => *by_id.entry(id).or_insert_with(|| {
                slots.push(Roi::new());
                slots.len() - 1
            }),
            None => {
                slots.push(Roi::new());
                slots.len() - 1
            }
        };

        match from_local_shape(local) {
            Ok(converted) => slots[slot].add_shapes(converted),
            Err(error) => {
                log::warn!("Skipping local shape {} ({:?}): {}", index, local.name, error);
                warnings.push(ConversionWarning {
                    index,
                    name: local.name.clone(),
                    error,
                });
            }
        }
    }

    // A group whose only shapes were skipped yields no ROI.
    let rois: Vec<Roi> = slots.into_iter().filter(|roi| !roi.is_empty()).collect();
    log::debug!(
        "Grouped {} local shape(s) into {} ROI(s), {} skipped",
        shapes.len(),
        rois.len(),
        warnings.len()
    );
    Grouped { rois, warnings }
}

/// Flatten ROIs into local shapes tagged with their 4D ROI index.
pub fn ungroup_4d(rois: &[Roi], property: &str) -> Vec<LocalShape> {
    ungroup_4d_with(
        rois,
        &GroupingOptions::default().with_id_property(property),
    )
}

/// [`ungroup_4d`] with an explicit display group ceiling.
pub fn ungroup_4d_with(rois: &[Roi], options: &GroupingOptions) -> Vec<LocalShape> {
    let property = id_property(&options.id_property);
    let id_key = server_id_property(property);
    let assign_groups = rois.len() < options.max_display_groups;

    let mut locals = Vec::with_capacity(rois.iter().map(Roi::len).sum());
    for (i, roi) in rois.iter().enumerate() {
        let index = i + 1;
        let roi_label = roi.id.unwrap_or(index as i64);

        for (j, shape) in roi.shapes().iter().enumerate() {
            let mut local = to_local_shape(shape);
            if local.name.as_deref().is_none_or(str::is_empty) {
                let shape_label = shape.id.unwrap_or(j as i64);
                local.name = Some(format!("{}-{}", roi_label, shape_label));
            }
            local.set_property(property, index.to_string());
            if let Some(id) = roi.id {
                local.set_property(id_key.as_str(), id.to_string());
            }
            if assign_groups {
                local.group = index as u32;
            }
            locals.push(local);
        }
    }
    locals
}
