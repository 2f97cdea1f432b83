use std::{
    error::Error,
    fs,
    path::{Path, PathBuf},
};

use clap::Parser;
use indicatif::MultiProgress;
use indicatif_log_bridge::LogWrapper;
use log::{info, warn};
use slice_anything::{
    ArgEndianess, DimensionSet, Polygon, SaveFormat, ShapeLike,
    bbox::crop_from_shape,
    error::SliceError,
    export::export_planes,
    host::ArrayLike,
    read::load_layer,
    save::{save_array, write_metadata_sidecar},
    slice::apply_slice,
};

#[derive(Parser, Debug)]
#[command(version, about = "Cut a rectangular region out of an n-dimensional array")]
struct Args {
    /// Input array: a `.npy` file or a 16bit `.mrc` stack
    input: PathBuf,
    /// Output file, or a directory to put `<name>_sliced.<ext>` into
    dest: PathBuf,
    /// Inclusive bounds per axis, `lower:upper`, comma separated. Leave a
    /// side empty (or give `:`) to keep the full extent on that side.
    #[arg(short, long, value_delimiter = ',', allow_hyphen_values = true)]
    bounds: Vec<String>,
    /// Axis names, comma separated; ignored unless there is one per axis
    #[arg(long, value_delimiter = ',')]
    axis_names: Option<Vec<String>>,
    /// Crop the last two spatial axes to the bounding box of this polygon,
    /// given as `y,x;y,x;...` (at least 4 vertices)
    #[arg(short, long, allow_hyphen_values = true)]
    polygon: Option<String>,
    /// Output format; taken from the extension of `dest` if not given
    #[arg(short, long, value_enum)]
    format: Option<SaveFormat>,
    /// Byte order of TIFF output
    #[arg(long, value_enum, default_value = "native")]
    endianess: ArgEndianess,
    /// Write every 2D plane as its own TIFF into the `dest` directory
    #[arg(long)]
    planes: bool,
}

fn split_bounds(text: &str) -> (&str, &str) {
    text.split_once(':').unwrap_or((text, ""))
}

fn existing_stems(dir: &Path) -> Result<Vec<String>, std::io::Error> {
    let mut stems = Vec::new();
    for entry in fs::read_dir(dir)? {
        if let Some(stem) = entry?.path().file_stem() {
            stems.push(stem.to_string_lossy().into_owned());
        }
    }
    Ok(stems)
}

fn main() -> Result<(), Box<dyn Error + Sync + Send>> {
    let env = env_logger::Env::default().filter_or("RUST_LOG", "info");
    let logger = env_logger::Builder::from_env(env).build();
    let level = logger.filter();
    let multi_progress = MultiProgress::new();
    LogWrapper::new(multi_progress.clone(), logger).try_init()?;
    log::set_max_level(level);

    let args = Args::parse();

    let mut layer = load_layer(&args.input)?;
    if let Some(names) = args.axis_names {
        layer = layer.with_axis_names(names);
    }

    let mut dims = DimensionSet::from_shape(layer.shape(), layer.axis_names())?;
    for (axis, text) in args.bounds.iter().enumerate() {
        let (lower, upper) = split_bounds(text);
        dims.set_bounds(axis, lower, upper)?;
    }

    if let Some(text) = &args.polygon {
        let polygon: Polygon = text.parse()?;
        let shape = Some(&polygon as &dyn ShapeLike);
        match crop_from_shape(&mut dims, shape, Some(&layer as &dyn ArrayLike)) {
            Ok(extent) => info!("cropping to {extent:?}"),
            Err(e) => warn!("{e}, keeping the axis bounds as they were"),
        }
    }

    for axis in dims.axes() {
        info!("{}: {}..={} of {}", axis.name(), axis.lower(), axis.upper(), axis.size());
    }

    let dest_is_dir = args.planes || args.dest.is_dir();
    let mut existing = vec![layer.name.clone()];
    if dest_is_dir && args.dest.is_dir() {
        existing.extend(existing_stems(&args.dest)?);
    }

    let sliced = match apply_slice(&layer, &dims, existing.iter().map(String::as_str)) {
        Ok(sliced) => sliced,
        Err(SliceError::EmptySlice) => {
            warn!("slice is empty, nothing written");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    if args.planes {
        let dest_dir = args.dest.join(&sliced.name);
        export_planes(&sliced.data, &dest_dir, args.endianess, &multi_progress)?;
        if let Some(metadata) = &sliced.metadata {
            write_metadata_sidecar(&dest_dir.join("metadata.json"), metadata);
        }
        return Ok(());
    }

    let format = args
        .format
        .or_else(|| (!dest_is_dir).then(|| SaveFormat::from_path(&args.dest)).flatten())
        .unwrap_or(SaveFormat::Npy);
    let out_path = if dest_is_dir {
        args.dest.join(format!("{}.{}", sliced.name, format.extension()))
    } else {
        args.dest.clone()
    };

    save_array(&sliced.data, &out_path, format, args.endianess)?;
    if let Some(metadata) = &sliced.metadata {
        write_metadata_sidecar(&out_path, metadata);
    }

    Ok(())
}
