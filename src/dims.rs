//! Per-axis selection for a whole array.

use crate::{
    axis::AxisRange,
    error::AxisError,
};

/// The per-axis selections of the active array, in axis order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DimensionSet {
    axes: Vec<AxisRange>,
}

impl DimensionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_shape(shape: &[usize], axis_names: Option<&[String]>) -> Result<Self, AxisError> {
        let mut dims = Self::new();
        dims.rebuild(shape, axis_names)?;
        Ok(dims)
    }

    /// Replace every axis with a fresh full-extent one for `shape`.
    ///
    /// `axis_names` is only used when it has one entry per axis. On error the
    /// previous axes are kept as they were.
    pub fn rebuild(
        &mut self,
        shape: &[usize],
        axis_names: Option<&[String]>,
    ) -> Result<(), AxisError> {
        let names = axis_names.filter(|names| names.len() == shape.len());
        let axes = shape
            .iter()
            .enumerate()
            .map(|(index, &size)| {
                let name = names.map(|names| names[index].as_str());
                AxisRange::create(index, size, name)
            })
            .collect::<Result<Vec<_>, _>>()?;
        self.axes = axes;
        Ok(())
    }

    pub fn clear(&mut self) {
        self.axes.clear();
    }

    pub fn len(&self) -> usize {
        self.axes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.axes.is_empty()
    }

    pub fn axes(&self) -> &[AxisRange] {
        &self.axes
    }

    pub fn get(&self, index: usize) -> Option<&AxisRange> {
        self.axes.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Result<&mut AxisRange, AxisError> {
        let ndim = self.axes.len();
        self.axes
            .get_mut(index)
            .ok_or(AxisError::NoSuchAxis { index, ndim })
    }

    pub fn set_bounds(
        &mut self,
        index: usize,
        lower_text: &str,
        upper_text: &str,
    ) -> Result<(), AxisError> {
        self.get_mut(index)?.set_bounds(lower_text, upper_text);
        Ok(())
    }

    pub fn shape(&self) -> Vec<usize> {
        self.axes.iter().map(AxisRange::size).collect()
    }

    pub fn all_half_open_ranges(&self) -> Vec<(usize, usize)> {
        self.axes.iter().map(AxisRange::to_half_open_range).collect()
    }

    pub fn spatial_axes(&self) -> Vec<&AxisRange> {
        self.axes.iter().filter(|axis| axis.is_spatial()).collect()
    }

    /// Indices of the `(y, x)` crop targets: the last two spatial axes.
    pub fn crop_axes(&self) -> Option<(usize, usize)> {
        let spatial = self.spatial_axes();
        match spatial.as_slice() {
            [.., y, x] => Some((y.index(), x.index())),
            _ => None,
        }
    }

    pub fn reset_all(&mut self) {
        self.axes.iter_mut().for_each(AxisRange::reset);
    }
}
