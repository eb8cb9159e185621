//! Conversion between shapes and the local toolkit's shape model.
//!
//! - [`to_local_shape`] / [`from_local_shape`] map single shapes
//! - [`group_4d`] / [`ungroup_4d`] map ROIs onto flat, tagged shape lists

mod group;
mod shape;


pub use group::{
    ConversionWarning, Grouped, GroupingOptions, group_4d, id_property, server_id_property,
    ungroup_4d, ungroup_4d_with,
};
pub use shape::{from_local_shape, to_local_shape};
