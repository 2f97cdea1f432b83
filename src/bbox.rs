//! Map a polygon's bounding box onto the two trailing spatial axes.

use log::debug;

use crate::{
    dims::DimensionSet,
    error::CropError,
    host::{ArrayLike, ShapeLike},
};

/// Fewer vertices than this are not treated as a rectangle or polygon.
pub const MIN_VERTICES: usize = 4;

/// Inclusive index extent of a polygon along x (last axis) and y
/// (second to last axis).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBoxExtent {
    pub min_x: i64,
    pub max_x: i64,
    pub min_y: i64,
    pub max_y: i64,
}

impl BoundingBoxExtent {
    /// Extent of `(y, x)` points, each extremum truncated toward zero.
    fn of_points(points: &[[f64; 2]]) -> Self {
        let (min_y, max_y, min_x, max_x) = points.iter().fold(
            (f64::INFINITY, f64::NEG_INFINITY, f64::INFINITY, f64::NEG_INFINITY),
            |(min_y, max_y, min_x, max_x), &[y, x]| {
                (min_y.min(y), max_y.max(y), min_x.min(x), max_x.max(x))
            },
        );
        Self {
            min_x: min_x as i64,
            max_x: max_x as i64,
            min_y: min_y as i64,
            max_y: max_y as i64,
        }
    }

    fn spans_more_than_one_unit(&self) -> bool {
        self.max_x.abs_diff(self.min_x) > 1 && self.max_y.abs_diff(self.min_y) > 1
    }

    /// Clamp x into the last axis and y into the second to last axis of
    /// `shape`.
    pub fn clamp_to(self, shape: &[usize]) -> Result<Self, CropError> {
        let [.., ny, nx] = shape else {
            return Err(CropError::MissingSpatialAxes { found: shape.len() });
        };
        let clamp = |v: i64, len: usize| v.clamp(0, (len as i64 - 1).max(0));
        Ok(Self {
            min_x: clamp(self.min_x, *nx),
            max_x: clamp(self.max_x, *nx),
            min_y: clamp(self.min_y, *ny),
            max_y: clamp(self.max_y, *ny),
        })
    }
}

/// The trailing `(y, x)` pair of every vertex.
fn spatial_points(vertices: &[Vec<f64>]) -> Result<Vec<[f64; 2]>, CropError> {
    if vertices.len() < MIN_VERTICES {
        return Err(CropError::InsufficientVertices { found: vertices.len() });
    }
    vertices
        .iter()
        .enumerate()
        .map(|(index, v)| match v.as_slice() {
            [.., y, x] => Ok([*y, *x]),
            _ => Err(CropError::MalformedVertex { index, components: v.len() }),
        })
        .collect()
}

/// Bounding box of `shape` in data coordinates, before clamping.
///
/// If the shape has a world-to-data transform its result is used, but only
/// when it spans more than one unit on both axes; a failing or degenerate
/// transform falls back to the raw vertex extent.
pub fn extent_of(shape: &dyn ShapeLike) -> Result<BoundingBoxExtent, CropError> {
    let points = spatial_points(shape.vertices())?;
    let raw = BoundingBoxExtent::of_points(&points);

    match shape.world_to_data(&points) {
        None => Ok(raw),
        Some(Ok(data_points)) if data_points.iter().flatten().any(|v| !v.is_finite()) => {
            debug!("non-finite transformed points, using raw {raw:?}");
            Ok(raw)
        }
        Some(Ok(data_points)) if !data_points.is_empty() => {
            let transformed = BoundingBoxExtent::of_points(&data_points);
            if transformed.spans_more_than_one_unit() {
                Ok(transformed)
            } else {
                debug!("degenerate transformed extent {transformed:?}, using raw {raw:?}");
                Ok(raw)
            }
        }
        Some(Ok(_)) => Ok(raw),
        Some(Err(err)) => {
            debug!("{err}, using raw coordinates");
            Ok(raw)
        }
    }
}

/// Set the last two spatial axes of `dims` to the bounding box of `shape`,
/// clamped to `target`'s shape. Returns the extent that was applied.
///
/// On error no axis is modified.
pub fn crop_from_shape(
    dims: &mut DimensionSet,
    shape: Option<&dyn ShapeLike>,
    target: Option<&dyn ArrayLike>,
) -> Result<BoundingBoxExtent, CropError> {
    let shape = shape.ok_or(CropError::NoShapeSelected)?;
    let extent = extent_of(shape)?;
    let target = target.ok_or(CropError::NoTargetArray)?;
    let extent = extent.clamp_to(target.shape())?;

    let (y_axis, x_axis) = dims.crop_axes().ok_or(CropError::MissingSpatialAxes {
        found: dims.spatial_axes().len(),
    })?;
    // crop_axes only returns indices that exist
    if let Ok(axis) = dims.get_mut(y_axis) {
        axis.set_clamped(extent.min_y, extent.max_y);
    }
    if let Ok(axis) = dims.get_mut(x_axis) {
        axis.set_clamped(extent.min_x, extent.max_x);
    }
    debug!(
        "crop applied from shape: x=[{}, {}], y=[{}, {}]",
        extent.min_x, extent.max_x, extent.min_y, extent.max_y
    );
    Ok(extent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::TransformError, host::Polygon};

    fn square() -> Polygon {
        "0,0; 0,10; 10,10; 10,0".parse().unwrap()
    }

    #[test]
    fn square_in_20x20() {
        let mut dims = DimensionSet::from_shape(&[20, 20], None).unwrap();
        let target = [20usize, 20];
        let extent = crop_from_shape(&mut dims, Some(&square()), Some(&Shape(&target))).unwrap();
        assert_eq!(
            extent,
            BoundingBoxExtent { min_x: 0, max_x: 10, min_y: 0, max_y: 10 }
        );
        assert_eq!(dims.get(0).unwrap().bounds(), (0, 10));
        assert_eq!(dims.get(1).unwrap().bounds(), (0, 10));
    }

    struct Shape<'a>(&'a [usize]);

    impl ArrayLike for Shape<'_> {
        fn shape(&self) -> &[usize] {
            self.0
        }
    }

    #[test]
    fn three_vertices_are_rejected() {
        let mut dims = DimensionSet::from_shape(&[20, 20], None).unwrap();
        dims.set_bounds(0, "2", "3").unwrap();
        let before = dims.clone();
        let triangle: Polygon = "0,0; 0,10; 10,10".parse().unwrap();
        let err = crop_from_shape(&mut dims, Some(&triangle), Some(&Shape(&[20, 20]))).unwrap_err();
        assert_eq!(err, CropError::InsufficientVertices { found: 3 });
        assert_eq!(dims, before);
    }

    #[test]
    fn y_and_x_come_from_the_last_two_components() {
        let mut dims = DimensionSet::from_shape(&[3, 1, 50, 40], None).unwrap();
        let polygon: Polygon = "2,0,5,7; 2,0,5,30; 2,0,25,30; 2,0,25,7".parse().unwrap();
        crop_from_shape(&mut dims, Some(&polygon), Some(&Shape(&[3, 1, 50, 40]))).unwrap();
        assert_eq!(dims.all_half_open_ranges(), vec![(0, 3), (0, 1), (5, 26), (7, 31)]);
    }

    #[test]
    fn extents_are_truncated_and_clamped() {
        let mut dims = DimensionSet::from_shape(&[30, 20], None).unwrap();
        let polygon: Polygon = "-3.7,2.9; -3.7,25.5; 12.9,25.5; 12.9,2.9".parse().unwrap();
        let extent = crop_from_shape(&mut dims, Some(&polygon), Some(&Shape(&[30, 20]))).unwrap();
        // -3.7 truncates to -3 and then clamps to 0, 25 clamps to 19
        assert_eq!(extent, BoundingBoxExtent { min_x: 2, max_x: 19, min_y: 0, max_y: 12 });
    }

    #[test]
    fn missing_inputs_and_axes() {
        let mut dims = DimensionSet::from_shape(&[1, 20, 1], None).unwrap();
        let square = square();
        assert_eq!(
            crop_from_shape(&mut dims, None, Some(&Shape(&[1, 20, 1]))),
            Err(CropError::NoShapeSelected)
        );
        assert_eq!(
            crop_from_shape(&mut dims, Some(&square), None),
            Err(CropError::NoTargetArray)
        );
        assert_eq!(
            crop_from_shape(&mut dims, Some(&square), Some(&Shape(&[1, 20, 1]))),
            Err(CropError::MissingSpatialAxes { found: 1 })
        );
    }

    #[test]
    fn short_vertex_is_malformed() {
        let polygon = Polygon::new(vec![vec![0.0, 0.0], vec![1.0], vec![2.0, 2.0], vec![3.0, 3.0]]);
        assert_eq!(
            extent_of(&polygon),
            Err(CropError::MalformedVertex { index: 1, components: 1 })
        );
    }

    #[test]
    fn transformed_extent_is_preferred() {
        let polygon = square().with_transform(|points| {
            Ok(points.iter().map(|[y, x]| [y * 0.5 + 2.0, x * 0.5 + 1.0]).collect())
        });
        let extent = extent_of(&polygon).unwrap();
        assert_eq!(extent, BoundingBoxExtent { min_x: 1, max_x: 6, min_y: 2, max_y: 7 });
    }

    #[test]
    fn degenerate_or_failing_transform_falls_back() {
        let raw = BoundingBoxExtent { min_x: 0, max_x: 10, min_y: 0, max_y: 10 };

        let collapsing =
            square().with_transform(|points| Ok(points.iter().map(|_| [1.0, 1.0]).collect()));
        assert_eq!(extent_of(&collapsing), Ok(raw));

        let nan = square()
            .with_transform(|points| Ok(points.iter().map(|_| [f64::NAN, f64::NAN]).collect()));
        assert_eq!(extent_of(&nan), Ok(raw));

        let infinite = square()
            .with_transform(|points| Ok(points.iter().map(|[y, x]| [y / 0.0, *x]).collect()));
        assert_eq!(extent_of(&infinite), Ok(raw));

        let failing = square().with_transform(|_| Err(TransformError("singular matrix".into())));
        assert_eq!(extent_of(&failing), Ok(raw));
    }

    #[test]
    fn huge_transformed_coordinates_clamp_to_the_target() {
        let polygon = square().with_transform(|points| {
            Ok(points.iter().map(|[y, x]| [(y - 5.0) * 1e300, (x - 5.0) * 1e300]).collect())
        });
        let extent = extent_of(&polygon).unwrap();
        assert_eq!((extent.min_x, extent.max_x), (i64::MIN, i64::MAX));

        let mut dims = DimensionSet::from_shape(&[20, 30], None).unwrap();
        crop_from_shape(&mut dims, Some(&polygon), Some(&Shape(&[20, 30]))).unwrap();
        assert_eq!(dims.all_half_open_ranges(), vec![(0, 20), (0, 30)]);
    }
}
