//! What the slicing code needs from whoever holds the arrays and shapes,
//! plus a small in-process layer list implementing it.

use std::{collections::BTreeSet, fmt, str::FromStr};

use serde::Serialize;

use crate::{
    array::ArrayData,
    error::{ParsePolygonError, TransformError},
};

/// Anything with a shape and, optionally, one name per axis.
pub trait ArrayLike {
    fn shape(&self) -> &[usize];

    fn axis_names(&self) -> Option<&[String]> {
        None
    }
}

/// A drawn or selected polygon.
pub trait ShapeLike {
    /// Vertex coordinates; the last two components of each are `(y, x)`.
    fn vertices(&self) -> &[Vec<f64>];

    /// Map `(y, x)` points from world to data coordinates. `None` when the
    /// shape carries no transform.
    fn world_to_data(
        &self,
        _points: &[[f64; 2]],
    ) -> Option<Result<Vec<[f64; 2]>, TransformError>> {
        None
    }
}

impl ArrayLike for ArrayData {
    fn shape(&self) -> &[usize] {
        ArrayData::shape(self)
    }
}

/// Record attached to a layer produced by slicing another one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SliceMetadata {
    pub source_relation: String,
    pub original_name: String,
    pub original_shape: Vec<usize>,
    pub sliced_shape: Vec<usize>,
    pub slice_bounds: Vec<(usize, usize)>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplaySettings {
    /// Values above this quantile saturate in the preview.
    pub quantile: f32,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self { quantile: 0.99 }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageLayer {
    pub name: String,
    pub data: ArrayData,
    pub axis_names: Option<Vec<String>>,
    pub display: DisplaySettings,
    pub metadata: Option<SliceMetadata>,
}

impl ImageLayer {
    pub fn new(name: impl Into<String>, data: ArrayData) -> Self {
        Self {
            name: name.into(),
            data,
            axis_names: None,
            display: DisplaySettings::default(),
            metadata: None,
        }
    }

    pub fn with_axis_names(mut self, names: Vec<String>) -> Self {
        self.axis_names = Some(names);
        self
    }
}

impl ArrayLike for ImageLayer {
    fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    fn axis_names(&self) -> Option<&[String]> {
        self.axis_names.as_deref()
    }
}

pub type CoordTransform =
    Box<dyn Fn(&[[f64; 2]]) -> Result<Vec<[f64; 2]>, TransformError> + Send + Sync>;

pub struct Polygon {
    vertices: Vec<Vec<f64>>,
    transform: Option<CoordTransform>,
}

impl Polygon {
    pub fn new(vertices: Vec<Vec<f64>>) -> Self {
        Self {
            vertices,
            transform: None,
        }
    }

    /// Axis-aligned rectangle with corners `(y0, x0)` and `(y1, x1)`,
    /// prefixed by `leading` coordinates on every vertex.
    pub fn rectangle(leading: &[f64], (y0, x0): (f64, f64), (y1, x1): (f64, f64)) -> Self {
        let vertex = |y: f64, x: f64| {
            let mut v = leading.to_vec();
            v.extend([y, x]);
            v
        };
        Self::new(vec![vertex(y0, x0), vertex(y0, x1), vertex(y1, x1), vertex(y1, x0)])
    }

    /// Rectangle dragged between plot points `(x, y)` on a plot whose y axis
    /// points up, with row `r` drawn at `y = -r`. Stored in row/column
    /// coordinates.
    pub fn plot_rectangle(leading: &[f64], from: [f64; 2], to: [f64; 2]) -> Self {
        Self::rectangle(leading, (-from[1], from[0]), (-to[1], to[0]))
    }

    pub fn with_transform(
        mut self,
        transform: impl Fn(&[[f64; 2]]) -> Result<Vec<[f64; 2]>, TransformError>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        self.transform = Some(Box::new(transform));
        self
    }
}

impl fmt::Debug for Polygon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Polygon")
            .field("vertices", &self.vertices)
            .field("transform", &self.transform.is_some())
            .finish()
    }
}

impl ShapeLike for Polygon {
    fn vertices(&self) -> &[Vec<f64>] {
        &self.vertices
    }

    fn world_to_data(
        &self,
        points: &[[f64; 2]],
    ) -> Option<Result<Vec<[f64; 2]>, TransformError>> {
        self.transform.as_ref().map(|transform| transform(points))
    }
}

/// `"y,x;y,x;..."`, each vertex may carry extra leading components.
impl FromStr for Polygon {
    type Err = ParsePolygonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let vertices = s
            .split(';')
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .enumerate()
            .map(|(vertex, text)| {
                text.split(',')
                    .map(|c| {
                        c.trim().parse::<f64>().map_err(|_| ParsePolygonError::BadCoordinate {
                            vertex,
                            text: c.trim().to_owned(),
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect::<Result<Vec<_>, _>>()?;
        if vertices.is_empty() {
            return Err(ParsePolygonError::Empty);
        }
        Ok(Polygon::new(vertices))
    }
}

#[derive(Debug, Default)]
pub struct ShapesLayer {
    pub name: String,
    pub shapes: Vec<Polygon>,
    pub selected: BTreeSet<usize>,
}

impl ShapesLayer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Add a shape and make it the only selected one.
    pub fn add_selected(&mut self, shape: Polygon) -> usize {
        self.shapes.push(shape);
        let idx = self.shapes.len() - 1;
        self.selected.clear();
        self.selected.insert(idx);
        idx
    }

    /// First selected shape, by index.
    pub fn first_selected(&self) -> Option<&Polygon> {
        self.selected.iter().find_map(|&idx| self.shapes.get(idx))
    }
}

/// The layer list: image layers and shapes layers in insertion order, with
/// names unique across both.
#[derive(Debug, Default)]
pub struct Workspace {
    images: Vec<ImageLayer>,
    shapes: Vec<ShapesLayer>,
}

impl Workspace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.images
            .iter()
            .map(|l| l.name.as_str())
            .chain(self.shapes.iter().map(|l| l.name.as_str()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names().any(|n| n == name)
    }

    /// Insert `layer`, suffixing its name with ` [n]` if it is taken.
    pub fn add_image(&mut self, mut layer: ImageLayer) -> String {
        layer.name = self.free_name(&layer.name);
        let name = layer.name.clone();
        self.images.push(layer);
        name
    }

    pub fn add_shapes(&mut self, mut layer: ShapesLayer) -> String {
        layer.name = self.free_name(&layer.name);
        let name = layer.name.clone();
        self.shapes.push(layer);
        name
    }

    fn free_name(&self, wanted: &str) -> String {
        if !self.contains(wanted) {
            return wanted.to_owned();
        }
        (1..)
            .map(|n| format!("{wanted} [{n}]"))
            .find(|candidate| !self.contains(candidate))
            .unwrap_or_else(|| wanted.to_owned())
    }

    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.images.len() + self.shapes.len();
        self.images.retain(|l| l.name != name);
        self.shapes.retain(|l| l.name != name);
        before != self.images.len() + self.shapes.len()
    }

    pub fn images(&self) -> &[ImageLayer] {
        &self.images
    }

    pub fn image(&self, name: &str) -> Option<&ImageLayer> {
        self.images.iter().find(|l| l.name == name)
    }

    pub fn image_mut(&mut self, name: &str) -> Option<&mut ImageLayer> {
        self.images.iter_mut().find(|l| l.name == name)
    }

    pub fn shapes_layers(&self) -> &[ShapesLayer] {
        &self.shapes
    }

    pub fn shapes_layer_mut(&mut self, name: &str) -> Option<&mut ShapesLayer> {
        self.shapes.iter_mut().find(|l| l.name == name)
    }

    /// The first selected shape of the first shapes layer that has both
    /// shapes and a selection.
    pub fn selected_shape(&self) -> Option<&Polygon> {
        self.shapes
            .iter()
            .filter(|layer| !layer.shapes.is_empty() && !layer.selected.is_empty())
            .find_map(ShapesLayer::first_selected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{ArrayD, IxDyn};

    fn layer(name: &str) -> ImageLayer {
        ImageLayer::new(name, ArrayData::U8(ArrayD::zeros(IxDyn(&[2, 2]))))
    }

    #[test]
    fn parse_polygon() {
        let polygon: Polygon = "0,0; 0,10; 10,10; 3,10,0".parse().unwrap();
        assert_eq!(polygon.vertices().len(), 4);
        assert_eq!(polygon.vertices()[3], vec![3.0, 10.0, 0.0]);
        assert!(polygon.world_to_data(&[[0.0, 0.0]]).is_none());

        assert_eq!("".parse::<Polygon>().unwrap_err(), ParsePolygonError::Empty);
        assert_eq!(
            "1,2;3,x".parse::<Polygon>().unwrap_err(),
            ParsePolygonError::BadCoordinate { vertex: 1, text: "x".into() }
        );
    }

    #[test]
    fn rectangle_vertices_carry_leading_coordinates() {
        let rect = Polygon::rectangle(&[2.0], (1.0, 5.0), (4.0, 9.0));
        assert_eq!(rect.vertices()[2], vec![2.0, 4.0, 9.0]);
    }

    #[test]
    fn plot_rectangle_is_stored_as_rows_and_columns() {
        let rect = Polygon::plot_rectangle(&[1.0], [2.0, -5.0], [30.0, -6.5]);
        assert_eq!(rect.vertices()[0], vec![1.0, 5.0, 2.0]);
        assert_eq!(rect.vertices()[2], vec![1.0, 6.5, 30.0]);
        assert!(rect.world_to_data(&[[0.0, 0.0]]).is_none());
    }

    #[test]
    fn names_stay_unique() {
        let mut ws = Workspace::new();
        assert_eq!(ws.add_image(layer("img")), "img");
        assert_eq!(ws.add_image(layer("img")), "img [1]");
        assert_eq!(ws.add_shapes(ShapesLayer::new("img")), "img [2]");
        assert!(ws.remove("img [1]"));
        assert!(!ws.contains("img [1]"));
    }

    #[test]
    fn selected_shape_skips_layers_without_selection() {
        let mut ws = Workspace::new();
        let mut idle = ShapesLayer::new("idle");
        idle.shapes.push(Polygon::rectangle(&[], (0.0, 0.0), (1.0, 1.0)));
        ws.add_shapes(idle);
        assert!(ws.selected_shape().is_none());

        let mut active = ShapesLayer::new("active");
        active.add_selected(Polygon::rectangle(&[], (0.0, 0.0), (5.0, 6.0)));
        ws.add_shapes(active);
        let shape = ws.selected_shape().unwrap();
        assert_eq!(shape.vertices()[2], vec![5.0, 6.0]);
    }
}
