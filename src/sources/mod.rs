//! Local pixel sources.
//!
//! This module provides:
//! - `ArraySource`: an in-memory [`crate::pixels::PixelSource`] over an ndarray
//! - `LoaderRegistry`: turns local files into pixel sources
//! - Built-in loaders for NumPy (`.npy`) arrays and standard images
//!
//! ## Adding New Formats
//!
//! Implement `SourceLoader` and register it with `LoaderRegistry::register`.

mod array;
mod image_loader;
mod loader;
mod npy_loader;

pub use array::{ArraySource, RegionOutOfBounds};
pub use image_loader::ImageLoader;
pub use loader::{LoaderError, LoaderRegistry, SourceLoader};
pub use npy_loader::NpyLoader;
