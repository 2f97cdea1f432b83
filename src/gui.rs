use std::{
    error::Error,
    path::{Path, PathBuf},
};

use clap::Parser;
use eframe::egui::{
    self, Button, Color32, ComboBox, Slider, TextEdit, TextureHandle, TextureOptions, vec2,
};
use egui_plot::{Line, Plot, PlotImage, PlotPoint};
use log::{error, info};
use slice_anything::{
    ArgEndianess, Polygon, SaveFormat, ShapesLayer, SlicePanel, Workspace,
    error::SliceError,
    read::load_layer,
    render::render_to_rgb,
    slice::unique_name,
};

#[derive(Parser, Debug)]
struct Args {
    /// Arrays to open: `.npy` files or 16bit `.mrc` stacks
    paths: Vec<PathBuf>,
}

const SHAPES_LAYER: &str = "Shapes";

enum Status {
    Info(String),
    Error(String),
}

#[derive(Debug, Clone, PartialEq)]
struct PreviewKey {
    layer: String,
    plane: Vec<usize>,
    quantile: f32,
}

struct Preview {
    key: PreviewKey,
    texture: TextureHandle,
    rows: usize,
    cols: usize,
}

struct SliceApp {
    workspace: Workspace,
    panel: SlicePanel,
    // text of the lower/upper fields, one pair per axis
    bound_texts: Vec<(String, String)>,
    plane_position: Vec<usize>,
    preview: Option<Preview>,
    shapes_layer: Option<String>,
    drag_start: Option<PlotPoint>,
    save_format: SaveFormat,
    endianess: ArgEndianess,
    status: Option<Status>,
}

fn main() -> Result<(), Box<dyn Error>> {
    let env = env_logger::Env::default().filter_or("RUST_LOG", "info");
    env_logger::init_from_env(env);

    let args = Args::parse();
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1280.0, 900.0]),
        ..Default::default()
    };

    let mut app = SliceApp::new();
    for path in &args.paths {
        app.load(path);
    }

    eframe::run_native(
        "Slice anything",
        options,
        Box::new(|_cc| Ok(Box::new(app))),
    )?;

    Ok(())
}

/// Closed rectangle through two opposite corners `[x, y]`.
fn outline([x0, y0]: [f64; 2], [x1, y1]: [f64; 2]) -> Vec<[f64; 2]> {
    vec![[x0, y0], [x1, y0], [x1, y1], [x0, y1], [x0, y0]]
}

impl eframe::App for SliceApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::SidePanel::left("slice_controls")
            .min_width(340.0)
            .show(ctx, |ui| self.controls(ui));
        egui::CentralPanel::default().show(ctx, |ui| self.preview(ui));
    }
}

impl SliceApp {
    fn new() -> Self {
        Self {
            workspace: Workspace::new(),
            panel: SlicePanel::new(),
            bound_texts: Vec::new(),
            plane_position: Vec::new(),
            preview: None,
            shapes_layer: None,
            drag_start: None,
            save_format: SaveFormat::Tiff,
            endianess: ArgEndianess::Native,
            status: None,
        }
    }

    fn load(&mut self, path: &Path) {
        match load_layer(path) {
            Ok(layer) => {
                let name = self.workspace.add_image(layer);
                self.status = Some(Status::Info(format!("loaded {name}")));
                self.panel.sync(&self.workspace);
            }
            Err(e) => {
                error!("could not load {path:?}: {e}");
                let msg = format!("could not load {}: {e}", path.display());
                self.status = Some(Status::Error(msg));
            }
        }
        self.sync_texts();
    }

    fn select(&mut self, name: Option<&str>) {
        if let Err(e) = self.panel.select_layer(&self.workspace, name) {
            self.status = Some(Status::Error(e.to_string()));
        }
        self.plane_position.clear();
        self.sync_texts();
    }

    /// Show the model's (clamped) bounds in the text fields.
    fn sync_texts(&mut self) {
        self.bound_texts = self
            .panel
            .dims()
            .axes()
            .iter()
            .map(|axis| (axis.lower().to_string(), axis.upper().to_string()))
            .collect();
    }

    fn controls(&mut self, ui: &mut egui::Ui) {
        if ui.button("Load...").clicked()
            && let Some(path) = rfd::FileDialog::new()
                .add_filter("arrays", &["npy", "mrc"])
                .pick_file()
        {
            self.load(&path);
        }
        ui.separator();

        let names: Vec<String> = self.workspace.images().iter().map(|l| l.name.clone()).collect();
        let mut selected = self.panel.selected_layer().map(str::to_owned);
        ComboBox::from_label("Image layer")
            .selected_text(selected.as_deref().unwrap_or("Select an image layer..."))
            .show_ui(ui, |ui| {
                for name in &names {
                    ui.selectable_value(&mut selected, Some(name.clone()), name.as_str());
                }
            });
        if selected.as_deref() != self.panel.selected_layer() {
            self.select(selected.as_deref());
        }

        match self.panel.selected_layer().and_then(|name| self.workspace.image(name)) {
            Some(layer) => {
                ui.label(format!("Shape: {:?} ({})", layer.data.shape(), layer.data.dtype()))
            }
            None => ui.label("No layer selected"),
        };
        ui.separator();

        let mut commit = None;
        egui::Grid::new("axis_bounds").striped(true).show(ui, |ui| {
            let axes = self.panel.dims().axes().iter();
            for (axis, (lower, upper)) in axes.zip(self.bound_texts.iter_mut()) {
                ui.label(axis.name());
                let lo = ui.add(TextEdit::singleline(lower).desired_width(60.0));
                ui.label("to");
                let hi = ui.add(TextEdit::singleline(upper).desired_width(60.0));
                ui.label(format!("[{}]", axis.size()));
                ui.end_row();
                if lo.lost_focus() || hi.lost_focus() {
                    commit = Some(axis.index());
                }
            }
        });
        if let Some(axis) = commit {
            let (lower, upper) = self.bound_texts[axis].clone();
            if let Err(e) = self.panel.set_bounds(axis, &lower, &upper) {
                self.status = Some(Status::Error(e.to_string()));
            }
            self.sync_texts();
        }
        ui.separator();

        let can_apply = self.panel.can_apply();
        let can_crop = self.panel.can_crop(&self.workspace);
        let (mut apply, mut reset, mut crop, mut save) = (false, false, false, false);
        ui.horizontal(|ui| {
            apply = ui.add_enabled(can_apply, Button::new("Apply Slice")).clicked();
            reset = ui.add_enabled(can_apply, Button::new("Reset")).clicked();
            crop = ui
                .add_enabled(can_crop, Button::new("Apply Crop from Shape"))
                .on_hover_text("Apply crop area from the rectangle drawn on the preview")
                .clicked();
        });
        ui.horizontal(|ui| {
            ComboBox::from_label("Format")
                .selected_text(self.save_format.to_string())
                .show_ui(ui, |ui| {
                    for format in SaveFormat::ALL {
                        ui.selectable_value(&mut self.save_format, format, format.to_string());
                    }
                });
            ComboBox::from_label("Byte order")
                .selected_text(format!("{:?}", self.endianess))
                .show_ui(ui, |ui| {
                    ui.selectable_value(&mut self.endianess, ArgEndianess::Native, "Native");
                    ui.selectable_value(&mut self.endianess, ArgEndianess::Big, "Big");
                });
            save = ui.add_enabled(can_apply, Button::new("Save...")).clicked();
        });

        if apply {
            self.apply();
        }
        if reset {
            self.panel.reset();
            self.sync_texts();
        }
        if crop {
            match self.panel.crop_from_shape(&self.workspace) {
                Ok(extent) => {
                    self.status = Some(Status::Info(format!(
                        "Crop applied from shape: X=[{}, {}], Y=[{}, {}]",
                        extent.min_x, extent.max_x, extent.min_y, extent.max_y
                    )));
                }
                Err(e) => self.status = Some(Status::Error(e.to_string())),
            }
            self.sync_texts();
        }
        if save {
            self.save();
        }

        ui.separator();
        match &self.status {
            Some(Status::Info(msg)) => {
                ui.label(msg);
            }
            Some(Status::Error(msg)) => {
                ui.colored_label(Color32::LIGHT_RED, msg);
            }
            None => {}
        }
    }

    fn apply(&mut self) {
        self.status = Some(match self.panel.apply(&mut self.workspace) {
            Ok(name) => Status::Info(format!("created {name}")),
            Err(SliceError::EmptySlice) => {
                Status::Info("slice is empty, nothing created".to_owned())
            }
            Err(e) => Status::Error(e.to_string()),
        });
    }

    fn save(&mut self) {
        let format = self.save_format;
        let suggested = self
            .panel
            .selected_layer()
            .map(|name| unique_name(name, self.workspace.names()))
            .unwrap_or_else(|| "sliced".to_owned());
        let Some(path) = rfd::FileDialog::new()
            .add_filter(format.to_string(), format.extensions())
            .set_file_name(format!("{suggested}.{}", format.extension()))
            .save_file()
        else {
            return;
        };
        // synchronous, like every other panel action
        self.status = Some(match self.panel.save(&self.workspace, &path, format, self.endianess) {
            Ok(()) => {
                info!("saved {path:?}");
                Status::Info(format!("saved {}", path.display()))
            }
            Err(e) => Status::Error(format!("could not save {}: {e}", path.display())),
        });
    }

    fn add_rectangle(&mut self, from: PlotPoint, to: PlotPoint) {
        let leading: Vec<f64> = self.plane_position.iter().map(|&p| p as f64).collect();
        let rectangle = Polygon::plot_rectangle(&leading, [from.x, from.y], [to.x, to.y]);

        let layer_name = match &self.shapes_layer {
            Some(name) if self.workspace.shapes_layer_mut(name).is_some() => name.clone(),
            _ => {
                let name = self.workspace.add_shapes(ShapesLayer::new(SHAPES_LAYER));
                self.shapes_layer = Some(name.clone());
                name
            }
        };
        if let Some(layer) = self.workspace.shapes_layer_mut(&layer_name) {
            layer.add_selected(rectangle);
        }
        self.status = Some(Status::Info("rectangle drawn".to_owned()));
    }

    fn preview(&mut self, ui: &mut egui::Ui) {
        let Some(name) = self.panel.selected_layer().map(str::to_owned) else {
            ui.label("No layer selected");
            return;
        };
        let Some(layer) = self.workspace.image(&name) else {
            return;
        };

        let leading = layer.data.leading_shape().to_vec();
        let axis_names: Vec<String> =
            self.panel.dims().axes().iter().map(|a| a.name().to_owned()).collect();
        let mut quantile = layer.display.quantile;

        self.plane_position.resize(leading.len(), 0);
        ui.horizontal_wrapped(|ui| {
            for (k, &len) in leading.iter().enumerate() {
                // 1-indexed position in the UI:
                let mut slider_value = self.plane_position[k] + 1;
                let label = axis_names.get(k).cloned().unwrap_or_default();
                ui.add(Slider::new(&mut slider_value, 1..=len).text(label));
                self.plane_position[k] = slider_value - 1;
            }
            ui.add(Slider::new(&mut quantile, 0.5..=1.0).text("contrast quantile"));
        });
        if let Some(layer) = self.workspace.image_mut(&name) {
            layer.display.quantile = quantile;
        }

        let key = PreviewKey {
            layer: name.clone(),
            plane: self.plane_position.clone(),
            quantile,
        };
        if self.preview.as_ref().map(|p| &p.key) != Some(&key)
            && let Some(layer) = self.workspace.image(&name)
        {
            let plane = layer.data.plane(&self.plane_position);
            let image = render_to_rgb(&plane, quantile);
            self.preview = Some(Preview {
                key,
                texture: ui.ctx().load_texture("preview", image, TextureOptions::NEAREST),
                rows: plane.rows(),
                cols: plane.cols(),
            });
        }
        let Some(preview) = &self.preview else {
            return;
        };

        let (rows, cols) = (preview.rows as f64, preview.cols as f64);
        let texture_id = preview.texture.id();
        let crop = self.panel.dims().crop_axes().and_then(|(y, x)| {
            let dims = self.panel.dims();
            Some((dims.get(y)?.bounds(), dims.get(x)?.bounds()))
        });
        let drag_start = self.drag_start;

        let plot = Plot::new("preview")
            .data_aspect(1.0)
            .allow_drag(false)
            .allow_boxed_zoom(false);
        let response = plot.show(ui, |plot_ui| {
            plot_ui.image(PlotImage::new(
                "preview_image",
                texture_id,
                PlotPoint::new(cols / 2.0, -rows / 2.0),
                vec2(cols as f32, rows as f32),
            ));
            if let Some(((y0, y1), (x0, x1))) = crop {
                let (y0, y1) = (-(y0 as f64), -(y1 as f64 + 1.0));
                let (x0, x1) = (x0 as f64, x1 as f64 + 1.0);
                plot_ui.line(
                    Line::new("crop", outline([x0, y0], [x1, y1]))
                        .color(Color32::YELLOW),
                );
            }
            let pointer = plot_ui.pointer_coordinate();
            if let (Some(from), Some(to)) = (drag_start, pointer) {
                plot_ui.line(
                    Line::new("selection", outline([from.x, from.y], [to.x, to.y]))
                        .color(Color32::LIGHT_BLUE),
                );
            }
            pointer
        });

        let pointer = response.inner;
        if response.response.drag_started() {
            self.drag_start = pointer;
        }
        if response.response.drag_stopped()
            && let (Some(from), Some(to)) = (self.drag_start.take(), pointer)
        {
            self.add_rectangle(from, to);
        }
    }
}
