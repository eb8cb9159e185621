//! Region of interest: an ordered collection of shapes on one image.

use serde::{Deserialize, Serialize};

use crate::bounds::{Bounds5D, compute_bounds};
use crate::error::{RoiError, SourceError};
use crate::shape::ShapeModel;

/// Persistence collaborator for ROIs.
///
/// Saving returns the stored ROI, carrying the server-assigned ROI and shape
/// IDs.
pub trait RoiStore {
    fn save_roi(&mut self, roi: &Roi) -> Result<Roi, SourceError>;
}

/// An ordered list of shapes, optionally linked to an image.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Roi {
    /// Server-assigned ID, `None` until saved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    image_id: Option<i64>,
    /// Shapes in display order.
    #[serde(default)]
    shapes: Vec<ShapeModel>,
}

impl Roi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_shapes(shapes: impl IntoIterator<Item = ShapeModel>) -> Self {
        Self {
            shapes: shapes.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Image this ROI is attached to.
    pub fn image_id(&self) -> Option<i64> {
        self.image_id
    }

    /// Attach the ROI to an image.
    ///
    /// Attaching to the image it is already attached to is a no-op; any other
    /// image is rejected. Build a new ROI to move shapes between images.
    pub fn set_image(&mut self, image_id: i64) -> Result<(), RoiError> {
        match self.image_id {
            Some(current) if current != image_id => Err(RoiError::ImageAlreadyAssociated {
                current,
                requested: image_id,
            }),
            _ => {
                self.image_id = Some(image_id);
                Ok(())
            }
        }
    }

    pub fn add_shape(&mut self, shape: ShapeModel) {
        self.shapes.push(shape);
    }

    pub fn add_shapes(&mut self, shapes: impl IntoIterator<Item = ShapeModel>) {
        self.shapes.extend(shapes);
    }

    /// Remove the shape at `index`, shifting later shapes down.
    pub fn remove_shape(&mut self, index: usize) -> Option<ShapeModel> {
        (index < self.shapes.len()).then(|| self.shapes.remove(index))
    }

    /// Remove the first shape equal to `shape`.
    pub fn remove_matching(&mut self, shape: &ShapeModel) -> Option<ShapeModel> {
        let index = self.shapes.iter().position(|s| s == shape)?;
        self.remove_shape(index)
    }

    pub fn shapes(&self) -> &[ShapeModel] {
        &self.shapes
    }

    pub fn get(&self, index: usize) -> Option<&ShapeModel> {
        self.shapes.get(index)
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// 5D box enclosing every shape.
    pub fn bounds(&self) -> Result<Bounds5D, RoiError> {
        compute_bounds(&self.shapes)
    }

    /// Persist through `store` and replace this ROI with the stored copy.
    pub fn save(&mut self, store: &mut impl RoiStore) -> Result<(), RoiError> {
        let saved = store.save_roi(self).map_err(RoiError::Store)?;
        log::debug!(
            "Saved ROI {:?} with {} shape(s) on image {:?}",
            saved.id,
            saved.len(),
            saved.image_id
        );
        *self = saved;
        Ok(())
    }

    // ========================================================================
    // Import/Export
    // ========================================================================

    /// Export to a pretty-printed JSON string.
    pub fn to_json(&self) -> Result<String, RoiError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Import from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, RoiError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Export a list of ROIs to a JSON array.
pub fn rois_to_json(rois: &[Roi]) -> Result<String, RoiError> {
    Ok(serde_json::to_string_pretty(rois)?)
}

/// Import a JSON array of ROIs.
pub fn rois_from_json(json: &str) -> Result<Vec<Roi>, RoiError> {
    Ok(serde_json::from_str(json)?)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bounds::Coordinates;

    /// Store that hands out sequential IDs.
    #[derive(Default)]
    struct CountingStore {
        next_id: i64,
        fail: bool,
    }

    impl RoiStore for CountingStore {
        fn save_roi(&mut self, roi: &Roi) -> Result<Roi, SourceError> {
            if self.fail {
                return Err("server unavailable".into());
            }
            let mut saved = roi.clone();
            self.next_id += 1;
            saved.id = Some(self.next_id);
            saved.shapes = roi
                .shapes
                .iter()
                .enumerate()
                .map(|(i, s)| s.clone().with_id(self.next_id * 100 + i as i64))
                .collect();
            Ok(saved)
        }
    }

    fn sample_roi() -> Roi {
        Roi::from_shapes([
            ShapeModel::rectangle(0.0, 0.0, 4.0, 4.0).with_plane(0, 0, 0),
            ShapeModel::rectangle(2.0, 2.0, 4.0, 4.0).with_plane(0, 1, 0),
            ShapeModel::point(10.0, 1.0).with_plane(1, 2, 0),
        ])
    }

    #[test]
    fn test_add_remove_keeps_order() {
        let mut roi = sample_roi();
        roi.add_shape(ShapeModel::point(0.0, 0.0).with_text("last"));
        assert_eq!(roi.len(), 4);

        let removed = roi.remove_shape(1).expect("shape at 1");
        assert_eq!(removed.plane().z, 1);
        assert_eq!(roi.get(1).map(|s| s.plane().z), Some(2));
        assert_eq!(roi.get(2).and_then(|s| s.label()), Some("last"));
        assert!(roi.remove_shape(10).is_none());
    }

    #[test]
    fn test_remove_matching() {
        let mut roi = sample_roi();
        let target = ShapeModel::point(10.0, 1.0).with_plane(1, 2, 0);
        assert!(roi.remove_matching(&target).is_some());
        assert_eq!(roi.len(), 2);
        assert!(roi.remove_matching(&target).is_none());
    }

    #[test]
    fn test_bounds() {
        let bounds = sample_roi().bounds().unwrap();
        assert_eq!(bounds.start, Coordinates::new(0, 0, 0, 0, 0));
        assert_eq!(bounds.end, Coordinates::new(10, 5, 1, 2, 0));
        assert!(matches!(Roi::new().bounds(), Err(RoiError::EmptyInput)));
    }

    #[test]
    fn test_image_association_is_fixed() {
        let mut roi = sample_roi();
        roi.set_image(42).unwrap();
        roi.set_image(42).unwrap();
        assert!(matches!(
            roi.set_image(7),
            Err(RoiError::ImageAlreadyAssociated {
                current: 42,
                requested: 7
            })
        ));
        roi.add_shape(ShapeModel::point(1.0, 1.0));
        assert_eq!(roi.image_id(), Some(42));
    }

    #[test]
    fn test_save_assigns_ids() {
        let mut store = CountingStore::default();
        let mut roi = sample_roi();
        roi.set_image(3).unwrap();
        roi.save(&mut store).unwrap();

        assert_eq!(roi.id, Some(1));
        assert_eq!(roi.image_id(), Some(3));
        let ids: Vec<Option<i64>> = roi.shapes().iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![Some(100), Some(101), Some(102)]);
    }

    #[test]
    fn test_failed_save_keeps_roi() {
        let mut store = CountingStore {
            fail: true,
            ..Default::default()
        };
        let mut roi = sample_roi();
        assert!(matches!(roi.save(&mut store), Err(RoiError::Store(_))));
        assert_eq!(roi.id, None);
    }

    #[test]
    fn test_json_export_import() {
        let mut roi = sample_roi().with_name("nucleus");
        roi.set_image(9).unwrap();

        let json = rois_to_json(std::slice::from_ref(&roi)).unwrap();
        assert!(json.contains("\"nucleus\""));
        assert!(json.contains("Rectangle"));

        let imported = rois_from_json(&json).unwrap();
        assert_eq!(imported, vec![roi]);
    }
}
