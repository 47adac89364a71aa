// src/config.rs

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::error::{ModelError, ModelResult};
use crate::grid::{AxisSpec, Grid2D};
use crate::smoothing::{validate_kernel, DEFAULT_KERNEL_SIZE};

/// Sphere radius (m) shared by all sources in the smoothed multi-source model.
pub const DEFAULT_SPHERE_RADIUS: f64 = 20.0;

/// Radius (m) suggested for the single-sphere model.
pub const SINGLE_SPHERE_RADIUS: f64 = 100.0;

/// Named starting points for a model configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    /// Many small spheres on a tight 800 m window, box-smoothed.
    Smoothed,
    /// One sphere on a wide 2 km window, raw analytic field.
    SingleSphere,
}

impl Preset {
    pub fn from_arg(s: &str) -> Option<Self> {
        match s {
            "smoothed" | "multi" => Some(Self::Smoothed),
            "single" | "sphere" => Some(Self::SingleSphere),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Smoothed => "smoothed",
            Self::SingleSphere => "single",
        }
    }
}

/// Everything the engine needs besides the sources themselves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub x_axis: AxisSpec,
    pub y_axis: AxisSpec,
    /// Radius (m) applied to every source.
    pub sphere_radius: f64,
    /// Box-filter size; `None` leaves the field unsmoothed.
    pub smoothing: Option<usize>,
    /// The profile is the grid row nearest this Y (m).
    pub profile_y: f64,
    /// Draw a dashed mesh on the rendered plots.
    pub show_mesh: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self::from_preset(Preset::Smoothed)
    }
}

impl ModelConfig {
    pub fn from_preset(preset: Preset) -> Self {
        match preset {
            Preset::Smoothed => Self {
                x_axis: AxisSpec::new(-400.0, 400.0, 200),
                y_axis: AxisSpec::new(-400.0, 400.0, 200),
                sphere_radius: DEFAULT_SPHERE_RADIUS,
                smoothing: Some(DEFAULT_KERNEL_SIZE),
                profile_y: 0.0,
                show_mesh: true,
            },
            Preset::SingleSphere => Self {
                x_axis: AxisSpec::new(-1000.0, 1000.0, 100),
                y_axis: AxisSpec::new(-1000.0, 1000.0, 100),
                sphere_radius: SINGLE_SPHERE_RADIUS,
                smoothing: None,
                profile_y: 0.0,
                show_mesh: true,
            },
        }
    }

    /// Load a config from JSON; omitted fields take the smoothed-preset defaults.
    pub fn from_json_file(path: &Path) -> ModelResult<Self> {
        let file = File::open(path)?;
        let cfg: Self = serde_json::from_reader(BufReader::new(file))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> ModelResult<()> {
        self.x_axis.validate("x")?;
        self.y_axis.validate("y")?;
        if !self.sphere_radius.is_finite() || self.sphere_radius < 0.0 {
            return Err(ModelError::validation(
                "sphere_radius",
                self.sphere_radius.to_string(),
            ));
        }
        if !self.profile_y.is_finite() {
            return Err(ModelError::validation("profile_y", self.profile_y.to_string()));
        }
        if let Some(k) = self.smoothing {
            validate_kernel(k, self.x_axis.count, self.y_axis.count)?;
        }
        Ok(())
    }

    pub fn grid(&self) -> ModelResult<Grid2D> {
        Grid2D::from_specs(&self.x_axis, &self.y_axis)
    }
}

/// Provenance written next to each run's outputs.
#[derive(Serialize)]
pub struct RunConfig {
    pub model: ModelConfig,
    pub n_sources: usize,
    pub run: RunInfo,
}

#[derive(Serialize)]
pub struct RunInfo {
    pub binary: String,
    pub preset: String,
    pub run_id: String,
}

impl RunConfig {
    pub fn write_to_dir(&self, out_dir: &Path) -> ModelResult<()> {
        let path = out_dir.join("config.json");
        let file = File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }
}
