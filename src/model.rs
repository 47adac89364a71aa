// src/model.rs
//
// The forward-modelling pipeline:
//
//   sources -> evaluate (g_z, mGal) -> optional box smoothing -> snapshot
//
// A run produces an immutable `ModelSnapshot` (grid + field + profile). The
// `ForwardModel` keeps the most recent one behind an `Arc`; a new run
// replaces it wholesale, so readers holding the old `Arc` never see a
// half-written field. Interpolation before the first run is `StaleCache`.

use std::sync::Arc;
use tracing::{debug, info};

use crate::config::ModelConfig;
use crate::error::{parse_finite, ModelError, ModelResult};
use crate::gravity::evaluate;
use crate::sampler::sample;
use crate::scalar_field::{Profile, ScalarField2D};
use crate::smoothing::smooth;
use crate::source::{Source, SourceRegistry};

/// Result of one model run. Never mutated after construction.
#[derive(Debug, Clone)]
pub struct ModelSnapshot {
    pub field: ScalarField2D,
    pub profile: Profile,
    /// Sources as they were when the run started.
    pub sources: Vec<Source>,
    pub sphere_radius: f64,
    pub kernel_size: Option<usize>,
}

/// Short numeric digest of a run, one line per item when printed.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub source_count: usize,
    pub grid_shape: (usize, usize),
    pub kernel_size: Option<usize>,
    pub min: f64,
    pub max: f64,
}

impl std::fmt::Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "sources          : {}", self.source_count)?;
        writeln!(f, "grid size        : {} x {}", self.grid_shape.0, self.grid_shape.1)?;
        match self.kernel_size {
            Some(k) => writeln!(f, "smoothing kernel : {k} x {k}")?,
            None => writeln!(f, "smoothing kernel : off")?,
        }
        write!(f, "g_z range (mGal) : [{:.4}, {:.4}]", self.min, self.max)
    }
}

impl ModelSnapshot {
    /// Bilinear g_z (mGal) at (x, y); `DomainMiss` outside the grid.
    pub fn sample(&self, x: f64, y: f64) -> ModelResult<f64> {
        sample(&self.field, x, y)
    }

    pub fn summary(&self) -> RunSummary {
        let (min, max) = self.field.min_max().unwrap_or((0.0, 0.0));
        RunSummary {
            source_count: self.sources.len(),
            grid_shape: (self.field.grid.nx(), self.field.grid.ny()),
            kernel_size: self.kernel_size,
            min,
            max,
        }
    }
}

/// Run the whole pipeline for `sources` under `config`.
pub fn run_model(sources: &[Source], config: &ModelConfig) -> ModelResult<ModelSnapshot> {
    config.validate()?;
    let grid = config.grid()?;

    let raw = evaluate(sources, &grid, config.sphere_radius);
    let field = match config.smoothing {
        Some(k) => smooth(&raw, k)?,
        None => raw,
    };
    let profile = field.profile_nearest(config.profile_y);

    if let Some((k, v)) = field.peak() {
        let i = k % grid.nx();
        let j = k / grid.nx();
        debug!(x = grid.xs()[i], y = grid.ys()[j], gz_mgal = v, "field peak");
    }

    Ok(ModelSnapshot {
        field,
        profile,
        sources: sources.to_vec(),
        sphere_radius: config.sphere_radius,
        kernel_size: config.smoothing,
    })
}

/// Owns the source registry, the configuration and the last run.
#[derive(Debug, Default)]
pub struct ForwardModel {
    config: ModelConfig,
    registry: SourceRegistry,
    last: Option<Arc<ModelSnapshot>>,
}

impl ForwardModel {
    pub fn new(config: ModelConfig) -> ModelResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            registry: SourceRegistry::new(),
            last: None,
        })
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Swap the configuration. The previous snapshot stays valid for sampling
    /// until the next run.
    pub fn set_config(&mut self, config: ModelConfig) -> ModelResult<()> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut SourceRegistry {
        &mut self.registry
    }

    /// Evaluate, smooth and cache. On error the previous snapshot is kept.
    pub fn run(&mut self) -> ModelResult<Arc<ModelSnapshot>> {
        let snap = Arc::new(run_model(self.registry.list(), &self.config)?);
        let s = snap.summary();
        info!(
            sources = s.source_count,
            nx = s.grid_shape.0,
            ny = s.grid_shape.1,
            kernel = ?s.kernel_size,
            min = s.min,
            max = s.max,
            "model run complete"
        );
        self.last = Some(Arc::clone(&snap));
        Ok(snap)
    }

    /// Most recent run, if any.
    pub fn snapshot(&self) -> Option<Arc<ModelSnapshot>> {
        self.last.clone()
    }

    /// Interpolate the last run at (x, y).
    pub fn sample(&self, x: f64, y: f64) -> ModelResult<f64> {
        let snap = self.last.as_ref().ok_or(ModelError::StaleCache)?;
        snap.sample(x, y)
    }

    /// Parse query text, then interpolate.
    pub fn sample_text(&self, x: &str, y: &str) -> ModelResult<f64> {
        let snap = self.last.as_ref().ok_or(ModelError::StaleCache)?;
        let xq = parse_finite("query x", x)?;
        let yq = parse_finite("query y", y)?;
        snap.sample(xq, yq)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Preset;
    use crate::source::SourceInput;

    fn small_config() -> ModelConfig {
        let mut cfg = ModelConfig::from_preset(Preset::Smoothed);
        cfg.x_axis.count = 41;
        cfg.y_axis.count = 41;
        cfg.smoothing = Some(5);
        cfg
    }

    #[test]
    fn sampling_before_any_run_is_stale() {
        let model = ForwardModel::new(small_config()).unwrap();
        assert!(matches!(model.sample(0.0, 0.0), Err(ModelError::StaleCache)));
        assert!(matches!(model.sample_text("0", "0"), Err(ModelError::StaleCache)));
        assert!(model.snapshot().is_none());
    }

    #[test]
    fn run_caches_snapshot_for_sampling() {
        let mut model = ForwardModel::new(small_config()).unwrap();
        model
            .registry_mut()
            .add_input(&SourceInput::new("", "0", "0", "60", "500"))
            .unwrap();
        let snap = model.run().unwrap();
        let v = model.sample(0.0, 0.0).unwrap();
        assert_eq!(v, snap.sample(0.0, 0.0).unwrap());
        assert!(v > 0.0);
        assert!(matches!(model.sample(401.0, 0.0), Err(ModelError::DomainMiss { .. })));
        assert!(matches!(
            model.sample_text("abc", "0"),
            Err(ModelError::Validation { .. })
        ));
    }

    #[test]
    fn new_run_replaces_snapshot_but_old_arc_survives() {
        let mut model = ForwardModel::new(small_config()).unwrap();
        let first = model.run().unwrap();
        assert!(first.field.data.iter().all(|&v| v == 0.0));

        model.registry_mut().add(Source::new("a", 0.0, 0.0, 50.0, 300.0));
        let second = model.run().unwrap();
        assert!(second.field.sum() > 0.0);
        assert!(Arc::ptr_eq(&second, &model.snapshot().unwrap()));
        // the earlier snapshot is untouched
        assert!(first.field.data.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn rejected_config_keeps_previous_snapshot() {
        let mut model = ForwardModel::new(small_config()).unwrap();
        model.run().unwrap();
        let mut bad = small_config();
        bad.smoothing = Some(4);
        assert!(model.set_config(bad).is_err());
        assert!(model.snapshot().is_some());
    }

    #[test]
    fn summary_reports_shape_and_kernel() {
        let mut model = ForwardModel::new(small_config()).unwrap();
        model.registry_mut().add(Source::new("a", 0.0, 0.0, 50.0, -300.0));
        let s = model.run().unwrap().summary();
        assert_eq!(s.source_count, 1);
        assert_eq!(s.grid_shape, (41, 41));
        assert_eq!(s.kernel_size, Some(5));
        assert!(s.min < 0.0 && s.max <= 0.0);
        assert!(s.to_string().contains("5 x 5"));
    }
}
