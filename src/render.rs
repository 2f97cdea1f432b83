//! Grayscale preview images of a single plane.

use eframe::egui::ColorImage;

use crate::array::PlaneData;

fn get_quantile(data: &[f32], q: f32) -> f32 {
    let mut data: Vec<f32> = data.iter().copied().filter(|v| v.is_finite()).collect();
    if data.is_empty() {
        return 0.0;
    }
    data.sort_by(|a, b| a.total_cmp(b));

    let idx_for_q: usize = ((data.len() as f32 * q) as usize).min(data.len() - 1);

    data[idx_for_q]
}

/// Gray levels of a plane, scaled so that `vmin` is black and the `quantile`
/// value (and anything above it) is white.
pub fn to_gray(data: &[f32], quantile: f32) -> Vec<u8> {
    let vmin = data
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(f32::INFINITY, f32::min);
    let vmax_quantiled = get_quantile(data, quantile);

    if !vmin.is_finite() || vmax_quantiled <= vmin {
        return vec![0; data.len()];
    }
    let scale = 255.0 / (vmax_quantiled - vmin);
    data.iter()
        .map(|v| ((v - vmin) * scale).clamp(0.0, 255.0) as u8)
        .collect()
}

pub fn render_to_rgb(plane: &PlaneData, quantile: f32) -> ColorImage {
    let gray = to_gray(&plane.to_f32(), quantile);
    let rgba: Vec<u8> = gray.iter().flat_map(|&c| [c, c, c, 255]).collect();
    ColorImage::from_rgba_unmultiplied([plane.cols(), plane.rows()], &rgba)
}
