//! State behind the slicing panel, and the commands its buttons and fields
//! invoke. Holds no UI types so it can be driven from tests.

use std::path::Path;

use log::{info, warn};

use crate::{
    bbox::{self, BoundingBoxExtent},
    common::{ArgEndianess, SaveFormat},
    dims::DimensionSet,
    error::{AxisError, CropError, SaveError, SliceError},
    host::{ArrayLike, ImageLayer, ShapeLike, Workspace},
    save,
    slice::apply_slice,
};

#[derive(Debug, Default)]
pub struct SlicePanel {
    layer: Option<String>,
    dims: DimensionSet,
}

impl SlicePanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected_layer(&self) -> Option<&str> {
        self.layer.as_deref()
    }

    pub fn dims(&self) -> &DimensionSet {
        &self.dims
    }

    fn current<'w>(&self, workspace: &'w Workspace) -> Result<&'w ImageLayer, SliceError> {
        let name = self.layer.as_deref().ok_or(SliceError::NoLayerSelected)?;
        workspace
            .image(name)
            .ok_or_else(|| SliceError::LayerNotFound(name.to_owned()))
    }

    /// Make `name` the active layer and rebuild the axis controls for it.
    /// `None` clears the selection.
    pub fn select_layer(
        &mut self,
        workspace: &Workspace,
        name: Option<&str>,
    ) -> Result<(), SliceError> {
        let Some(name) = name else {
            self.layer = None;
            self.dims.clear();
            return Ok(());
        };
        let layer = workspace
            .image(name)
            .ok_or_else(|| SliceError::LayerNotFound(name.to_owned()))?;
        let dims = DimensionSet::from_shape(layer.shape(), layer.axis_names())?;
        // swap both at once so the controls never outlive their array
        self.dims = dims;
        self.layer = Some(name.to_owned());
        info!("selected {name}: {:?}", layer.shape());
        Ok(())
    }

    /// Follow layer insertions and removals: drop a selection whose layer is
    /// gone, and pick the first image layer when nothing is selected.
    pub fn sync(&mut self, workspace: &Workspace) {
        if let Some(name) = &self.layer
            && workspace.image(name).is_none()
        {
            info!("{name} was removed");
            self.layer = None;
            self.dims.clear();
        }
        if self.layer.is_none()
            && let Some(first) = workspace.images().first()
        {
            let first = first.name.clone();
            if let Err(e) = self.select_layer(workspace, Some(&first)) {
                warn!("could not select {first}: {e}");
            }
        }
    }

    pub fn set_bounds(
        &mut self,
        axis: usize,
        lower_text: &str,
        upper_text: &str,
    ) -> Result<(), AxisError> {
        self.dims.set_bounds(axis, lower_text, upper_text)
    }

    pub fn reset(&mut self) {
        self.dims.reset_all();
    }

    pub fn can_apply(&self) -> bool {
        self.layer.is_some() && !self.dims.is_empty()
    }

    pub fn can_crop(&self, workspace: &Workspace) -> bool {
        self.can_apply() && workspace.selected_shape().is_some()
    }

    /// Set the two trailing spatial axes from the selected shape in
    /// `workspace`, clamped to the active layer.
    pub fn crop_from_shape(
        &mut self,
        workspace: &Workspace,
    ) -> Result<BoundingBoxExtent, CropError> {
        let shape = workspace.selected_shape().map(|s| s as &dyn ShapeLike);
        let target = self.current(workspace).ok().map(|l| l as &dyn ArrayLike);
        let res = bbox::crop_from_shape(&mut self.dims, shape, target);
        if let Err(e) = &res {
            warn!("{e}");
        }
        res
    }

    fn sliced(&self, workspace: &Workspace) -> Result<ImageLayer, SliceError> {
        let source = self.current(workspace)?;
        apply_slice(source, &self.dims, workspace.names())
    }

    /// Slice the active layer and add the result to `workspace`. Returns the
    /// new layer's name. An empty slice adds nothing.
    pub fn apply(&self, workspace: &mut Workspace) -> Result<String, SliceError> {
        let layer = self.sliced(workspace).inspect_err(|e| warn!("not applied: {e}"))?;
        Ok(workspace.add_image(layer))
    }

    /// Slice the active layer and write it straight to `path`, with a
    /// metadata sidecar next to it.
    pub fn save(
        &self,
        workspace: &Workspace,
        path: &Path,
        format: SaveFormat,
        endianess: ArgEndianess,
    ) -> Result<(), SaveError> {
        let layer = self.sliced(workspace)?;
        save::save_array(&layer.data, path, format, endianess)?;
        if let Some(metadata) = &layer.metadata {
            save::write_metadata_sidecar(path, metadata);
        }
        Ok(())
    }
}
