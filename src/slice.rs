//! Turning a selection into a new, uniquely named layer.

use std::collections::HashSet;

use log::{debug, info};

use crate::{
    dims::DimensionSet,
    error::SliceError,
    host::{ImageLayer, SliceMetadata},
};

pub const SOURCE_RELATION: &str = "sliced";

/// `"{original}_sliced"`, or the first of `_1`, `_2`, ... appended to it
/// that is not in `existing`.
pub fn unique_name<'a>(original: &str, existing: impl IntoIterator<Item = &'a str>) -> String {
    let existing: HashSet<&str> = existing.into_iter().collect();
    let base = format!("{original}_{SOURCE_RELATION}");
    if !existing.contains(base.as_str()) {
        return base;
    }
    let mut counter = 1;
    loop {
        let candidate = format!("{base}_{counter}");
        if !existing.contains(candidate.as_str()) {
            return candidate;
        }
        counter += 1;
    }
}

/// Cut `source` down to the bounds in `dims` and build the new layer,
/// named uniquely against `existing`.
pub fn apply_slice<'a>(
    source: &ImageLayer,
    dims: &DimensionSet,
    existing: impl IntoIterator<Item = &'a str>,
) -> Result<ImageLayer, SliceError> {
    let ranges = dims.all_half_open_ranges();
    debug!("slicing {} with {ranges:?}", source.name);
    let data = source.data.slice(&ranges)?;

    let name = unique_name(&source.name, existing);
    info!(
        "{name}: {:?} -> {:?} ({})",
        source.data.shape(),
        data.shape(),
        data.dtype()
    );
    let metadata = SliceMetadata {
        source_relation: SOURCE_RELATION.to_owned(),
        original_name: source.name.clone(),
        original_shape: source.data.shape().to_vec(),
        sliced_shape: data.shape().to_vec(),
        slice_bounds: ranges,
    };
    Ok(ImageLayer {
        name,
        data,
        axis_names: source.axis_names.clone(),
        display: source.display,
        metadata: Some(metadata),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::array::ArrayData;
    use ndarray::{ArrayD, IxDyn};

    #[test]
    fn name_without_collision() {
        assert_eq!(unique_name("img", ["other"]), "img_sliced");
    }

    #[test]
    fn name_collisions_count_up_from_one() {
        assert_eq!(unique_name("img", ["img_sliced", "img_sliced_1"]), "img_sliced_2");
        assert_eq!(unique_name("img", ["img_sliced", "img_sliced_2"]), "img_sliced_1");
    }

    fn layer(shape: &[usize]) -> ImageLayer {
        ImageLayer::new("img", ArrayData::F32(ArrayD::zeros(IxDyn(shape))))
            .with_axis_names(vec!["c".into(), "y".into(), "x".into()])
    }

    #[test]
    fn end_to_end_shape_and_metadata() {
        let source = layer(&[3, 100, 100]);
        let mut dims = DimensionSet::from_shape(&[3, 100, 100], None).unwrap();
        dims.set_bounds(1, "10", "59").unwrap();
        dims.set_bounds(2, "20", "79").unwrap();

        let sliced = apply_slice(&source, &dims, ["img"]).unwrap();
        assert_eq!(sliced.name, "img_sliced");
        assert_eq!(sliced.data.shape(), &[3, 50, 60]);
        assert_eq!(sliced.axis_names, source.axis_names);
        let metadata = sliced.metadata.unwrap();
        assert_eq!(metadata.source_relation, "sliced");
        assert_eq!(metadata.original_name, "img");
        assert_eq!(metadata.original_shape, vec![3, 100, 100]);
        assert_eq!(metadata.sliced_shape, vec![3, 50, 60]);
        assert_eq!(metadata.slice_bounds, vec![(0, 3), (10, 60), (20, 80)]);
    }

    #[test]
    fn inverted_bounds_fail_at_apply() {
        let source = layer(&[10, 10, 10]);
        let mut dims = DimensionSet::from_shape(&[10, 10, 10], None).unwrap();
        // half-open (5, 5)
        dims.set_bounds(0, "5", "4").unwrap();
        assert_eq!(dims.all_half_open_ranges()[0], (5, 5));
        assert_eq!(apply_slice(&source, &dims, ["img"]), Err(SliceError::EmptySlice));
    }

    #[test]
    fn single_index_is_not_empty() {
        let source = layer(&[10, 10, 10]);
        let mut dims = DimensionSet::from_shape(&[10, 10, 10], None).unwrap();
        dims.set_bounds(0, "5", "5").unwrap();
        let sliced = apply_slice(&source, &dims, ["img"]).unwrap();
        assert_eq!(sliced.data.shape(), &[1, 10, 10]);
    }
}
