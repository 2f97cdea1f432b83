//! Loading arrays from `.npy` and `.mrc` files.

use std::path::Path;

use log::{debug, info};
use mrc::{MrcMmap, MrcView};
use ndarray::{ArrayD, IxDyn};
use ndarray_npy::{ReadNpyError, read_npy};
use num_complex::{Complex32, Complex64};

use crate::{
    array::ArrayData,
    error::LoadError,
    host::ImageLayer,
};

// adapted from the docs of the mrc crate
pub struct Volume3D<'a> {
    view: MrcView<'a>,
    nx: usize,
    ny: usize,
    nz: usize,
}

impl<'a> Volume3D<'a> {
    pub fn new(view: MrcView<'a>) -> Self {
        let (nx, ny, nz) = view.dimensions();
        Self { view, nx, ny, nz }
    }

    /// Shape in axis order, slowest axis first.
    pub fn shape(&self) -> [usize; 3] {
        [self.nz, self.ny, self.nx]
    }

    pub fn to_array(&self) -> Result<ArrayD<i16>, LoadError> {
        let ints = self.view.data.as_i16_slice()?;
        debug!("len of slice: {}", ints.len());
        Ok(ArrayD::from_shape_vec(IxDyn(&self.shape()), ints.to_vec())?)
    }
}

pub fn read_mrc(path: &Path) -> Result<ArrayData, LoadError> {
    let data = MrcMmap::open(path)?;
    let volume = Volume3D::new(data.read_view()?);
    let [nz, ny, nx] = volume.shape();
    info!("dimensions: {nz}x{ny}x{nx}");
    Ok(ArrayData::I16(volume.to_array()?))
}

/// Read a `.npy` file of any supported element type.
pub fn read_npy_any(path: &Path) -> Result<ArrayData, LoadError> {
    // read_npy checks the header descriptor against the requested element
    // type, so try them in turn
    macro_rules! try_dtype {
        ($variant:ident, $t:ty) => {
            match read_npy::<_, ArrayD<$t>>(path) {
                Ok(arr) => return Ok(ArrayData::$variant(arr)),
                Err(ReadNpyError::WrongDescriptor(_)) => {}
                Err(e) => return Err(e.into()),
            }
        };
    }
    try_dtype!(U8, u8);
    try_dtype!(U16, u16);
    try_dtype!(I16, i16);
    try_dtype!(I32, i32);
    try_dtype!(I64, i64);
    try_dtype!(F32, f32);
    try_dtype!(F64, f64);
    try_dtype!(C32, Complex32);
    try_dtype!(C64, Complex64);
    Err(LoadError::UnsupportedDtype(path.to_owned()))
}

/// Load an image layer, named after the file stem.
pub fn load_layer(path: &Path) -> Result<ImageLayer, LoadError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "array".to_owned());

    let layer = match ext.as_deref() {
        Some("npy") => ImageLayer::new(name, read_npy_any(path)?),
        Some("mrc") => ImageLayer::new(name, read_mrc(path)?)
            .with_axis_names(["z", "y", "x"].map(String::from).to_vec()),
        _ => return Err(LoadError::UnsupportedExtension(path.to_owned())),
    };
    info!(
        "loaded {} from {path:?}: {:?} {}",
        layer.name,
        layer.data.shape(),
        layer.data.dtype()
    );
    Ok(layer)
}
