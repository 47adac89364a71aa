// src/visualisation.rs

use plotters::prelude::*;
use std::path::Path;

use crate::error::{ModelError, ModelResult};
use crate::model::ModelSnapshot;
use crate::scalar_field::Profile;

fn plot_err<E: std::fmt::Display>(e: E) -> ModelError {
    ModelError::Plot(e.to_string())
}

/// Map g_z to a blue–white–red colour using the frame's own min/max,
/// so weak anomalies are still visible.
///
/// lo maps to blue, hi maps to red, midpoint to white.
fn value_to_color(v: f64, lo: f64, hi: f64) -> RGBColor {
    // Protect against lo ≈ hi (e.g. no sources)
    let (lo, hi) = if !lo.is_finite() || !hi.is_finite() || (hi - lo).abs() < 1e-12 {
        (lo.min(0.0) - 1.0, hi.max(0.0) + 1.0)
    } else {
        (lo, hi)
    };

    let x = ((v - lo) / (hi - lo)).clamp(0.0, 1.0);

    let r = (255.0 * x) as u8;
    let b = (255.0 * (1.0 - x)) as u8;
    let g = (255.0 * (1.0 - (2.0 * (x - 0.5).abs()))).clamp(0.0, 255.0) as u8;

    RGBColor(r, g, b)
}

/// Cell edges around each node: midpoints between nodes, endpoints at the ends.
fn node_edges(axis: &[f64]) -> Vec<f64> {
    let n = axis.len();
    let mut e = Vec::with_capacity(n + 1);
    e.push(axis[0]);
    for k in 1..n {
        e.push(0.5 * (axis[k - 1] + axis[k]));
    }
    e.push(axis[n - 1]);
    e
}

/// Padded y-range for a line plot.
fn padded_range(values: &[f64]) -> (f64, f64) {
    let mut y_min = f64::INFINITY;
    let mut y_max = f64::NEG_INFINITY;
    for &v in values {
        if v.is_finite() {
            y_min = y_min.min(v);
            y_max = y_max.max(v);
        }
    }

    if !y_min.is_finite() || !y_max.is_finite() {
        (-1.0, 1.0)
    } else if (y_max - y_min).abs() < 1e-12 {
        // flat profile (e.g. no sources); open a window around it
        let delta = if y_max.abs() < 1e-12 { 1.0 } else { 0.1 * y_max.abs() };
        (y_min - delta, y_max + delta)
    } else {
        let margin = 0.1 * (y_max - y_min);
        (y_min - margin, y_max + margin)
    }
}

/// Save the g_z map as a PNG in physical coordinates, with source markers.
pub fn save_anomaly_map(snapshot: &ModelSnapshot, path: &Path, show_mesh: bool) -> ModelResult<()> {
    let field = &snapshot.field;
    let grid = &field.grid;
    let (lo, hi) = field.min_max().unwrap_or((-1.0, 1.0));

    let ex = node_edges(grid.xs());
    let ey = node_edges(grid.ys());
    let (x0, x1) = (ex[0], ex[ex.len() - 1]);
    let (y0, y1) = (ey[0], ey[ey.len() - 1]);

    let caption = match snapshot.kernel_size {
        Some(k) => format!("g_z anomaly [mGal], smoothed {k}x{k}: {lo:.3} .. {hi:.3}"),
        None => format!("g_z anomaly [mGal]: {lo:.3} .. {hi:.3}"),
    };

    let root = BitMapBackend::new(path, (900, 800)).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let mut chart = ChartBuilder::on(&root)
        .margin(30)
        .caption(caption, ("sans-serif", 20))
        .x_label_area_size(45)
        .y_label_area_size(60)
        .build_cartesian_2d(x0..x1, y0..y1)
        .map_err(plot_err)?;

    // One coloured rectangle per node
    chart
        .draw_series((0..grid.ny()).flat_map(|j| {
            let ex = &ex;
            let ey = &ey;
            (0..grid.nx()).map(move |i| {
                let color = value_to_color(field.get(i, j), lo, hi);
                Rectangle::new([(ex[i], ey[j]), (ex[i + 1], ey[j + 1])], color.filled())
            })
        }))
        .map_err(plot_err)?;

    let mut mesh = chart.configure_mesh();
    mesh.x_desc("X (m)")
        .y_desc("Y (m)")
        .axis_desc_style(("sans-serif", 15))
        .light_line_style(BLACK.mix(0.15));
    if !show_mesh {
        mesh.disable_mesh();
    }
    mesh.draw().map_err(plot_err)?;

    // Source markers + labels
    let visible: Vec<_> = snapshot
        .sources
        .iter()
        .filter(|s| grid.contains(s.x, s.y))
        .collect();
    chart
        .draw_series(
            visible
                .iter()
                .map(|s| Circle::new((s.x, s.y), 4, BLACK.filled())),
        )
        .map_err(plot_err)?;
    let dx = 0.01 * (x1 - x0);
    chart
        .draw_series(visible.iter().map(|s| {
            Text::new(
                format!("{} (z={:.0} m, ρ={:.0})", s.name, s.z, s.rho),
                (s.x + dx, s.y + dx),
                ("sans-serif", 12).into_font().color(&BLACK),
            )
        }))
        .map_err(plot_err)?;

    root.present().map_err(plot_err)?;
    Ok(())
}

/// Plot g_z along the profile row.
pub fn save_profile_plot(profile: &Profile, path: &Path, show_mesh: bool) -> ModelResult<()> {
    if profile.x.len() < 2 {
        return Ok(()); // nothing to plot
    }

    let (y_min, y_max) = padded_range(&profile.values);
    let x_min = profile.x[0];
    let x_max = profile.x[profile.x.len() - 1];

    let root = BitMapBackend::new(path, (1024, 500)).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let mut chart = ChartBuilder::on(&root)
        .margin(20)
        .caption(
            format!("g_z profile along X (Y = {:.1} m)", profile.y),
            ("sans-serif", 24),
        )
        .set_left_and_bottom_label_area_size(60)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)
        .map_err(plot_err)?;

    let mut mesh = chart.configure_mesh();
    mesh.x_desc("X (m)")
        .y_desc("g_z (mGal)")
        .label_style(("sans-serif", 14))
        .axis_desc_style(("sans-serif", 16));
    if !show_mesh {
        mesh.disable_mesh();
    }
    mesh.draw().map_err(plot_err)?;

    chart
        .draw_series(LineSeries::new(
            profile.x.iter().zip(&profile.values).map(|(&x, &v)| (x, v)),
            RED.stroke_width(2),
        ))
        .map_err(plot_err)?;

    root.present().map_err(plot_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colour_ramp_endpoints() {
        assert_eq!(value_to_color(-2.0, -2.0, 2.0), RGBColor(0, 0, 255));
        assert_eq!(value_to_color(2.0, -2.0, 2.0), RGBColor(255, 0, 0));
        let mid = value_to_color(0.0, -2.0, 2.0);
        assert!(mid.1 > 250, "midpoint should be near white, got {mid:?}");
    }

    #[test]
    fn flat_frame_does_not_divide_by_zero() {
        let c = value_to_color(0.0, 0.0, 0.0);
        // 0 sits in the middle of the widened [-1, 1] window
        assert!(c.1 > 250);
    }

    #[test]
    fn edges_bracket_every_node() {
        let e = node_edges(&[0.0, 2.0, 3.0]);
        assert_eq!(e, vec![0.0, 1.0, 2.5, 3.0]);
    }

    #[test]
    fn padded_range_opens_flat_window() {
        assert_eq!(padded_range(&[0.0, 0.0]), (-1.0, 1.0));
        let (lo, hi) = padded_range(&[1.0, 3.0]);
        assert!((lo - 0.8).abs() < 1e-12 && (hi - 3.2).abs() < 1e-12);
    }
}
