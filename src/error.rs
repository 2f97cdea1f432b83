//! Error types, one per concern.

use std::{io, path::PathBuf};

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AxisError {
    #[error("axis {index} has size 0")]
    ZeroSize { index: usize },
    #[error("axis {index} does not exist (array has {ndim} axes)")]
    NoSuchAxis { index: usize, ndim: usize },
}

/// Reasons a crop-from-shape attempt did not touch the axis bounds.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CropError {
    #[error("No selected shapes found. Please select a shape in a shapes layer.")]
    NoShapeSelected,
    #[error("Selected shape doesn't have enough vertices for a bounding box ({found} < 4)")]
    InsufficientVertices { found: usize },
    #[error("vertex {index} has {components} coordinate(s), need at least 2")]
    MalformedVertex { index: usize, components: usize },
    #[error("No image layer found")]
    NoTargetArray,
    #[error("Could not find 2 spatial dimensions to apply crop (found {found})")]
    MissingSpatialAxes { found: usize },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SliceError {
    #[error("no layer selected")]
    NoLayerSelected,
    #[error("layer `{0}` not found")]
    LayerNotFound(String),
    #[error("got {ranges} ranges for an array with {ndim} axes")]
    RankMismatch { ranges: usize, ndim: usize },
    #[error("slice is empty")]
    EmptySlice,
    #[error(transparent)]
    Axis(#[from] AxisError),
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("reading npy: {0}")]
    Npy(#[from] ndarray_npy::ReadNpyError),
    #[error("reading mrc: {0}")]
    Mrc(#[from] mrc::Error),
    #[error("unsupported dtype in {0:?}")]
    UnsupportedDtype(PathBuf),
    #[error("don't know how to read {0:?} (expected .npy or .mrc)")]
    UnsupportedExtension(PathBuf),
    #[error("data length does not match the header shape: {0}")]
    Shape(#[from] ndarray::ShapeError),
    #[error(transparent)]
    Axis(#[from] AxisError),
}

#[derive(Debug, Error)]
pub enum SaveError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("writing npy: {0}")]
    Npy(#[from] ndarray_npy::WriteNpyError),
    #[error("writing npz: {0}")]
    Npz(#[from] ndarray_npy::WriteNpzError),
    #[error("writing tiff: {0}")]
    Tiff(#[from] tiff::TiffError),
    #[error("unsupported format `{0}` (expected npy, npz, tiff or tif)")]
    UnsupportedFormat(String),
    #[error(transparent)]
    Slice(#[from] SliceError),
    #[error("writing metadata: {0}")]
    Metadata(#[from] serde_json::Error),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParsePolygonError {
    #[error("polygon has no vertices")]
    Empty,
    #[error("bad coordinate `{text}` in vertex {vertex}")]
    BadCoordinate { vertex: usize, text: String },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("coordinate transform failed: {0}")]
pub struct TransformError(pub String);
