// src/grid.rs

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// Linearly spaced axis definition: `count` points from `min` to `max` inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisSpec {
    pub min: f64,
    pub max: f64,
    pub count: usize,
}

impl AxisSpec {
    pub fn new(min: f64, max: f64, count: usize) -> Self {
        Self { min, max, count }
    }

    pub fn validate(&self, name: &str) -> ModelResult<()> {
        if !self.min.is_finite() || !self.max.is_finite() {
            return Err(ModelError::InvalidGrid(format!(
                "{name}-axis bounds must be finite (got {}..{})",
                self.min, self.max
            )));
        }
        if self.count < 2 {
            return Err(ModelError::InvalidGrid(format!(
                "{name}-axis needs at least 2 points (got {})",
                self.count
            )));
        }
        if self.max <= self.min {
            return Err(ModelError::InvalidGrid(format!(
                "{name}-axis max ({}) must exceed min ({})",
                self.max, self.min
            )));
        }
        Ok(())
    }

    /// Axis values; endpoints are hit exactly.
    pub fn values(&self) -> Vec<f64> {
        let n = self.count;
        if n < 2 {
            return vec![self.min; n];
        }
        let span = self.max - self.min;
        let last = (n - 1) as f64;
        (0..n)
            .map(|i| {
                if i == n - 1 {
                    self.max
                } else {
                    self.min + span * (i as f64) / last
                }
            })
            .collect()
    }
}

/// Regular rectangular mesh of surface observation points.
///
/// Stores the two 1D axes; node (i, j) sits at (x[i], y[j]). This is the
/// Cartesian product a meshgrid would expand, without the duplication.
/// Field data on this grid is row-major: row j holds all x for y[j].
///
/// Axes are only reachable through the checked constructors, so every
/// grid has at least 2 finite, non-decreasing values per axis.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid2D {
    x: Vec<f64>,
    y: Vec<f64>,
}

impl Grid2D {
    /// Build a grid from two axis specs.
    pub fn from_specs(x: &AxisSpec, y: &AxisSpec) -> ModelResult<Self> {
        x.validate("x")?;
        y.validate("y")?;
        Ok(Self {
            x: x.values(),
            y: y.values(),
        })
    }

    /// Build a grid from explicit axis values.
    ///
    /// Axes must be finite, non-decreasing and hold at least 2 values.
    /// Repeated values are accepted; the sampler treats the resulting
    /// zero-width cells as a special case.
    pub fn from_axes(x: Vec<f64>, y: Vec<f64>) -> ModelResult<Self> {
        check_axis("x", &x)?;
        check_axis("y", &y)?;
        Ok(Self { x, y })
    }

    /// X axis values (m).
    pub fn xs(&self) -> &[f64] {
        &self.x
    }

    /// Y axis values (m).
    pub fn ys(&self) -> &[f64] {
        &self.y
    }

    #[inline]
    pub fn nx(&self) -> usize {
        self.x.len()
    }

    #[inline]
    pub fn ny(&self) -> usize {
        self.y.len()
    }

    /// Total number of nodes.
    pub fn n_nodes(&self) -> usize {
        self.nx() * self.ny()
    }

    /// Convert (i, j) indices to a flat index into a 1D array.
    #[inline]
    pub fn idx(&self, i: usize, j: usize) -> usize {
        debug_assert!(i < self.nx() && j < self.ny());
        j * self.nx() + i
    }

    /// Physical coordinates of node (i, j).
    #[inline]
    pub fn node(&self, i: usize, j: usize) -> (f64, f64) {
        (self.x[i], self.y[j])
    }

    /// True if (x, y) lies inside the closed rectangle spanned by the axes.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        let (x0, x1) = (self.x[0], self.x[self.nx() - 1]);
        let (y0, y1) = (self.y[0], self.y[self.ny() - 1]);
        x0 <= x && x <= x1 && y0 <= y && y <= y1
    }
}

fn check_axis(name: &str, axis: &[f64]) -> ModelResult<()> {
    if axis.len() < 2 {
        return Err(ModelError::InvalidGrid(format!(
            "{name}-axis needs at least 2 points (got {})",
            axis.len()
        )));
    }
    if axis.iter().any(|v| !v.is_finite()) {
        return Err(ModelError::InvalidGrid(format!(
            "{name}-axis contains non-finite values"
        )));
    }
    if axis.windows(2).any(|w| w[1] < w[0]) {
        return Err(ModelError::InvalidGrid(format!(
            "{name}-axis must be sorted ascending"
        )));
    }
    Ok(())
}
