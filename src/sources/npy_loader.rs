//! Loader for NumPy `.npy` files.

use std::io::Cursor;

use ndarray::{ArrayD, Ix5, IxDyn};
use ndarray_npy::{ReadNpyExt, ReadableElement};

use crate::pixels::{PixelSource, Sample};
use crate::sources::ArraySource;
use crate::sources::loader::{LoaderError, SourceLoader};

/// Loader for NumPy `.npy` files.
///
/// **Expected array shapes** (missing leading axes are size 1):
/// - 2D `(Y, X)`
/// - 3D `(C, Y, X)`
/// - 4D `(Z, C, Y, X)`
/// - 5D `(T, Z, C, Y, X)`
///
/// Supported data types: `u8`, `i8`, `u16`, `i16`, `u32`, `i32`, `f32`, `f64`.
/// Samples keep their type; nothing is normalized.
pub struct NpyLoader;

impl NpyLoader {
    /// NumPy magic bytes: \x93NUMPY
    const MAGIC: &'static [u8] = &[0x93, b'N', b'U', b'M', b'P', b'Y'];

    fn into_source<T>(array: ArrayD<T>) -> Result<Box<dyn PixelSource>, LoaderError>
    where
        T: Sample + Clone,
    {
        let shape = array.shape().to_vec();
        log::debug!("NpyLoader: array shape = {:?}", shape);

        if !(2..=5).contains(&shape.len()) {
            return Err(LoaderError::new(format!(
                "Unsupported array dimensions: {} (expected 2 to 5)",
                shape.len()
            )));
        }

        let mut padded = vec![1usize; 5 - shape.len()];
        padded.extend_from_slice(&shape);

        let array = if array.is_standard_layout() {
            array
        } else {
            array.as_standard_layout().into_owned()
        };
        let data = array
            .into_shape_with_order(IxDyn(&padded))
            .and_then(|a| a.into_dimensionality::<Ix5>())
            .map_err(|e| LoaderError::new(format!("Cannot reshape array: {}", e)))?;

        log::info!(
            "NpyLoader: loaded {:?} array as (T, Z, C, Y, X) = {:?}",
            T::PIXEL_TYPE,
            data.dim()
        );

        Ok(Box::new(ArraySource::new(data).with_little_endian(true)))
    }

    fn try_read<T>(data: &[u8]) -> Option<Result<Box<dyn PixelSource>, LoaderError>>
    where
        T: Sample + Clone + ReadableElement,
    {
        ArrayD::<T>::read_npy(Cursor::new(data))
            .ok()
            .map(Self::into_source)
    }
}

impl SourceLoader for NpyLoader {
    fn id(&self) -> &'static str {
        "npy"
    }

    fn display_name(&self) -> &'static str {
        "NumPy Array (.npy)"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["npy"]
    }

    fn can_load(&self, data: &[u8]) -> bool {
        data.starts_with(Self::MAGIC)
    }

    fn load(&self, data: &[u8]) -> Result<Box<dyn PixelSource>, LoaderError> {
        Self::try_read::<u16>(data)
            .or_else(|| Self::try_read::<u8>(data))
            .or_else(|| Self::try_read::<f32>(data))
            .or_else(|| Self::try_read::<f64>(data))
            .or_else(|| Self::try_read::<i16>(data))
            .or_else(|| Self::try_read::<i32>(data))
            .or_else(|| Self::try_read::<u32>(data))
            .or_else(|| Self::try_read::<i8>(data))
            .unwrap_or_else(|| {
                Err(LoaderError::new(
                    "Failed to read NumPy array: unsupported dtype or invalid format",
                ))
            })
    }

    fn priority(&self) -> i32 {
        // Scientific arrays before generic images
        10
    }
}

#[cfg(test)]
mod tests {
    use ndarray::{Array3, Array5};
    use ndarray_npy::WriteNpyExt;

    use super::*;
    use crate::bounds::compute_bounds;
    use crate::pixels::{PixelType, fetch_volume};
    use crate::shape::ShapeModel;

    fn npy_bytes<A: WriteNpyExt>(array: &A) -> Vec<u8> {
        let mut buf = Vec::new();
        array.write_npy(&mut buf).expect("write npy");
        buf
    }

    #[test]
    fn test_magic_detection() {
        let loader = NpyLoader;
        assert!(loader.can_load(&[0x93, b'N', b'U', b'M', b'P', b'Y', 0x01, 0x00]));
        assert!(!loader.can_load(&[0x89, 0x50, 0x4E, 0x47]));
    }

    #[test]
    fn test_3d_is_channels_first() {
        let array = Array3::<u16>::from_shape_fn((2, 3, 4), |(c, y, x)| (c * 100 + y * 10 + x) as u16);
        let source = NpyLoader.load(&npy_bytes(&array)).expect("load");
        let dims = source.dimensions();
        assert_eq!(dims.pixel_type, PixelType::Uint16);
        assert_eq!((dims.size_x, dims.size_y, dims.size_c), (4, 3, 2));
        assert_eq!((dims.size_z, dims.size_t), (1, 1));
    }

    #[test]
    fn test_5d_float_fetch() {
        let array = Array5::<f32>::from_shape_fn((2, 2, 1, 3, 3), |(t, z, _, y, x)| {
            (t * 8 + z * 4 + y + x) as f32 - 2.5
        });
        let source = NpyLoader.load(&npy_bytes(&array)).expect("load");
        let bounds = compute_bounds(&[ShapeModel::rectangle(0.0, 0.0, 3.0, 3.0)
            .with_plane(0, 1, 1)])
        .unwrap();
        let volume = fetch_volume(&source, &bounds, PixelType::Float).expect("fetch");
        assert_eq!(volume.shape(), [1, 1, 1, 3, 3]);
        assert_eq!(volume.min(), 12.0 - 2.5);
        assert_eq!(volume.max(), 16.0 - 2.5);
    }

    #[test]
    fn test_rejects_1d() {
        let array = ndarray::Array1::<u8>::zeros(10);
        assert!(NpyLoader.load(&npy_bytes(&array)).is_err());
    }
}
