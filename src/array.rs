//! Owned n-dimensional data behind a layer.

use ndarray::{ArrayD, Axis, Slice};
use num_complex::{Complex32, Complex64};

use crate::error::SliceError;

#[derive(Debug, Clone, PartialEq)]
pub enum ArrayData {
    U8(ArrayD<u8>),
    U16(ArrayD<u16>),
    I16(ArrayD<i16>),
    I32(ArrayD<i32>),
    I64(ArrayD<i64>),
    F32(ArrayD<f32>),
    F64(ArrayD<f64>),
    C32(ArrayD<Complex32>),
    C64(ArrayD<Complex64>),
}

/// Run `$body` with `$arr` bound to the inner array, whatever its element type.
macro_rules! with_array {
    ($data:expr, $arr:ident => $body:expr) => {
        match $data {
            ArrayData::U8($arr) => $body,
            ArrayData::U16($arr) => $body,
            ArrayData::I16($arr) => $body,
            ArrayData::I32($arr) => $body,
            ArrayData::I64($arr) => $body,
            ArrayData::F32($arr) => $body,
            ArrayData::F64($arr) => $body,
            ArrayData::C32($arr) => $body,
            ArrayData::C64($arr) => $body,
        }
    };
}

/// Like `with_array!`, but wraps the result back into the same variant.
macro_rules! map_array {
    ($data:expr, $arr:ident => $body:expr) => {
        match $data {
            ArrayData::U8($arr) => ArrayData::U8($body),
            ArrayData::U16($arr) => ArrayData::U16($body),
            ArrayData::I16($arr) => ArrayData::I16($body),
            ArrayData::I32($arr) => ArrayData::I32($body),
            ArrayData::I64($arr) => ArrayData::I64($body),
            ArrayData::F32($arr) => ArrayData::F32($body),
            ArrayData::F64($arr) => ArrayData::F64($body),
            ArrayData::C32($arr) => ArrayData::C32($body),
            ArrayData::C64($arr) => ArrayData::C64($body),
        }
    };
}

pub(crate) use with_array;

/// One 2-D image in row-major order.
#[derive(Debug, Clone, PartialEq)]
pub struct Plane<T> {
    pub rows: usize,
    pub cols: usize,
    pub values: Vec<T>,
}

/// A plane ready for an image writer. Complex data has been reduced to its
/// magnitude.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaneData {
    U8(Plane<u8>),
    U16(Plane<u16>),
    I16(Plane<i16>),
    I32(Plane<i32>),
    I64(Plane<i64>),
    F32(Plane<f32>),
    F64(Plane<f64>),
}

impl PlaneData {
    pub fn rows(&self) -> usize {
        match self {
            PlaneData::U8(p) => p.rows,
            PlaneData::U16(p) => p.rows,
            PlaneData::I16(p) => p.rows,
            PlaneData::I32(p) => p.rows,
            PlaneData::I64(p) => p.rows,
            PlaneData::F32(p) => p.rows,
            PlaneData::F64(p) => p.rows,
        }
    }

    pub fn cols(&self) -> usize {
        match self {
            PlaneData::U8(p) => p.cols,
            PlaneData::U16(p) => p.cols,
            PlaneData::I16(p) => p.cols,
            PlaneData::I32(p) => p.cols,
            PlaneData::I64(p) => p.cols,
            PlaneData::F32(p) => p.cols,
            PlaneData::F64(p) => p.cols,
        }
    }

    /// Values as `f32`, for display.
    pub fn to_f32(&self) -> Vec<f32> {
        match self {
            PlaneData::U8(p) => p.values.iter().map(|&v| v as f32).collect(),
            PlaneData::U16(p) => p.values.iter().map(|&v| v as f32).collect(),
            PlaneData::I16(p) => p.values.iter().map(|&v| v as f32).collect(),
            PlaneData::I32(p) => p.values.iter().map(|&v| v as f32).collect(),
            PlaneData::I64(p) => p.values.iter().map(|&v| v as f32).collect(),
            PlaneData::F32(p) => p.values.clone(),
            PlaneData::F64(p) => p.values.iter().map(|&v| v as f32).collect(),
        }
    }
}

impl ArrayData {
    pub fn shape(&self) -> &[usize] {
        with_array!(self, arr => arr.shape())
    }

    pub fn ndim(&self) -> usize {
        self.shape().len()
    }

    pub fn len(&self) -> usize {
        with_array!(self, arr => arr.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// numpy name of the element type
    pub fn dtype(&self) -> &'static str {
        match self {
            ArrayData::U8(_) => "uint8",
            ArrayData::U16(_) => "uint16",
            ArrayData::I16(_) => "int16",
            ArrayData::I32(_) => "int32",
            ArrayData::I64(_) => "int64",
            ArrayData::F32(_) => "float32",
            ArrayData::F64(_) => "float64",
            ArrayData::C32(_) => "complex64",
            ArrayData::C64(_) => "complex128",
        }
    }

    pub fn is_complex(&self) -> bool {
        matches!(self, ArrayData::C32(_) | ArrayData::C64(_))
    }

    /// Copy out the region given by one half-open `(start, end)` range per
    /// axis. Ranges must be in bounds; an inverted or empty range is reported
    /// as [`SliceError::EmptySlice`].
    pub fn slice(&self, ranges: &[(usize, usize)]) -> Result<ArrayData, SliceError> {
        let shape = self.shape();
        if ranges.len() != shape.len() {
            return Err(SliceError::RankMismatch {
                ranges: ranges.len(),
                ndim: shape.len(),
            });
        }
        if ranges
            .iter()
            .zip(shape)
            .any(|(&(start, end), &len)| start >= end || end > len)
        {
            return Err(SliceError::EmptySlice);
        }

        let sliced = map_array!(self, arr => arr
            .slice_each_axis(|ax| {
                let (start, end) = ranges[ax.axis.index()];
                Slice::from(start..end)
            })
            .to_owned());

        if sliced.is_empty() {
            return Err(SliceError::EmptySlice);
        }
        Ok(sliced)
    }

    /// Number of 2-D planes over the two trailing axes.
    pub fn plane_count(&self) -> usize {
        leading_shape(self.shape()).iter().product()
    }

    /// Shape of the axes in front of the two trailing ones.
    pub fn leading_shape(&self) -> &[usize] {
        leading_shape(self.shape())
    }

    /// The plane at `leading` indices along the leading axes. Missing
    /// indices count as 0, out-of-range ones are clamped.
    pub fn plane(&self, leading: &[usize]) -> PlaneData {
        match self {
            ArrayData::U8(arr) => PlaneData::U8(extract_plane(arr, leading, |v| v)),
            ArrayData::U16(arr) => PlaneData::U16(extract_plane(arr, leading, |v| v)),
            ArrayData::I16(arr) => PlaneData::I16(extract_plane(arr, leading, |v| v)),
            ArrayData::I32(arr) => PlaneData::I32(extract_plane(arr, leading, |v| v)),
            ArrayData::I64(arr) => PlaneData::I64(extract_plane(arr, leading, |v| v)),
            ArrayData::F32(arr) => PlaneData::F32(extract_plane(arr, leading, |v| v)),
            ArrayData::F64(arr) => PlaneData::F64(extract_plane(arr, leading, |v| v)),
            ArrayData::C32(arr) => PlaneData::F32(extract_plane(arr, leading, |v| v.norm())),
            ArrayData::C64(arr) => PlaneData::F64(extract_plane(arr, leading, |v| v.norm())),
        }
    }

    /// The plane with linear index `idx`, counting in row-major order over
    /// the leading axes.
    pub fn plane_at(&self, idx: usize) -> PlaneData {
        self.plane(&unravel(idx, self.leading_shape()))
    }
}

fn leading_shape(shape: &[usize]) -> &[usize] {
    &shape[..shape.len().saturating_sub(2)]
}

/// Row-major multi-index of `idx` within `shape`.
pub fn unravel(mut idx: usize, shape: &[usize]) -> Vec<usize> {
    let mut out = vec![0; shape.len()];
    for (pos, &len) in shape.iter().enumerate().rev() {
        if len == 0 {
            continue;
        }
        out[pos] = idx % len;
        idx /= len;
    }
    out
}

fn extract_plane<T: Clone, U>(
    arr: &ArrayD<T>,
    leading: &[usize],
    convert: impl Fn(T) -> U,
) -> Plane<U> {
    let mut view = arr.view();
    let mut k = 0;
    while view.ndim() > 2 {
        let len = view.len_of(Axis(0));
        let idx = leading.get(k).copied().unwrap_or(0).min(len.saturating_sub(1));
        view = view.index_axis_move(Axis(0), idx);
        k += 1;
    }
    let (rows, cols) = match view.shape() {
        [] => (1, 1),
        [cols] => (1, *cols),
        [rows, cols] => (*rows, *cols),
        _ => unreachable!("plane view has at most two axes"),
    };
    // `iter` walks in logical (row-major) order whatever the memory layout
    let values = view.iter().cloned().map(convert).collect();
    Plane { rows, cols, values }
}
