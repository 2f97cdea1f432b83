//! Cut rectangular regions out of n-dimensional arrays.
//!
//! The per-axis selection lives in [`dims::DimensionSet`]; a drawn polygon can
//! be turned into a selection on the two trailing spatial axes with
//! [`bbox::crop_from_shape`]; [`slice::apply_slice`] produces the new layer.
//! [`panel::SlicePanel`] ties these together for an interactive front end.

pub mod array;
pub mod axis;
pub mod bbox;
pub mod common;
pub mod dims;
pub mod error;
pub mod export;
pub mod host;
pub mod panel;
pub mod read;
pub mod render;
pub mod save;
pub mod slice;
pub mod write;

pub use array::ArrayData;
pub use axis::AxisRange;
pub use bbox::BoundingBoxExtent;
pub use common::{ArgEndianess, SaveFormat};
pub use dims::DimensionSet;
pub use host::{ArrayLike, ImageLayer, Polygon, ShapeLike, ShapesLayer, SliceMetadata, Workspace};
pub use panel::SlicePanel;
