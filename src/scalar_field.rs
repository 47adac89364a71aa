// src/scalar_field.rs

use crate::grid::Grid2D;

/// Scalar field (g_z in mGal) defined on a 2D observation grid.
/// Row-major: `data[grid.idx(i, j)]` is the value at (x[i], y[j]).
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarField2D {
    pub grid: Grid2D,
    pub data: Vec<f64>,
}

/// One row of a field, taken along X at a fixed Y.
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub y: f64,
    pub x: Vec<f64>,
    pub values: Vec<f64>,
}

impl ScalarField2D {
    /// All-zero field on the given grid.
    pub fn zeros(grid: Grid2D) -> Self {
        let n = grid.n_nodes();
        Self {
            grid,
            data: vec![0.0; n],
        }
    }

    #[inline]
    pub fn idx(&self, i: usize, j: usize) -> usize {
        self.grid.idx(i, j)
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[self.idx(i, j)]
    }

    /// Row j as a slice (all x at y[j]).
    pub fn row(&self, j: usize) -> &[f64] {
        let nx = self.grid.nx();
        &self.data[j * nx..(j + 1) * nx]
    }

    /// Index of the row whose y is nearest `y0`. Ties go to the higher index.
    pub fn nearest_row(&self, y0: f64) -> usize {
        let mut best = 0;
        let mut best_d = f64::INFINITY;
        for (j, &y) in self.grid.ys().iter().enumerate() {
            let d = (y - y0).abs();
            if d <= best_d {
                best = j;
                best_d = d;
            }
        }
        best
    }

    /// Profile along X through the row nearest `y0`.
    pub fn profile_nearest(&self, y0: f64) -> Profile {
        let j = self.nearest_row(y0);
        Profile {
            y: self.grid.ys()[j],
            x: self.grid.xs().to_vec(),
            values: self.row(j).to_vec(),
        }
    }

    /// (min, max) over finite values; `None` if there are none.
    pub fn min_max(&self) -> Option<(f64, f64)> {
        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        for &v in &self.data {
            if v.is_finite() {
                lo = lo.min(v);
                hi = hi.max(v);
            }
        }
        if lo.is_finite() && hi.is_finite() {
            Some((lo, hi))
        } else {
            None
        }
    }

    /// Flat index and value of the largest |g_z|.
    pub fn peak(&self) -> Option<(usize, f64)> {
        self.data
            .iter()
            .copied()
            .enumerate()
            .filter(|(_, v)| v.is_finite())
            .fold(None, |acc: Option<(usize, f64)>, (k, v)| match acc {
                Some((_, best)) if best.abs() >= v.abs() => acc,
                _ => Some((k, v)),
            })
    }

    pub fn sum(&self) -> f64 {
        self.data.iter().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_field() -> ScalarField2D {
        // 3 x-nodes, 4 y-nodes, value = 10*j + i
        let grid = Grid2D::from_axes(vec![0.0, 1.0, 2.0], vec![-1.5, -0.5, 0.5, 1.5]).unwrap();
        let mut f = ScalarField2D::zeros(grid);
        for j in 0..4 {
            for i in 0..3 {
                let k = f.idx(i, j);
                f.data[k] = (10 * j + i) as f64;
            }
        }
        f
    }

    #[test]
    fn zeros_matches_grid_shape() {
        let grid = Grid2D::from_axes(vec![0.0, 1.0], vec![0.0, 1.0, 2.0]).unwrap();
        let f = ScalarField2D::zeros(grid);
        assert_eq!(f.data.len(), 6);
        assert!(f.data.iter().all(|&v| v == 0.0));
        assert_eq!(f.min_max(), Some((0.0, 0.0)));
    }

    #[test]
    fn rows_are_x_slices() {
        let f = small_field();
        assert_eq!(f.row(2), &[20.0, 21.0, 22.0]);
        assert_eq!(f.get(1, 3), 31.0);
    }

    #[test]
    fn profile_picks_nearest_row_with_ties_going_up() {
        let f = small_field();
        // y = -0.5 and 0.5 are equally close to 0 -> the higher index (2)
        let p = f.profile_nearest(0.0);
        assert_eq!(p.y, 0.5);
        assert_eq!(p.values, vec![20.0, 21.0, 22.0]);
        assert_eq!(f.nearest_row(-1.4), 0);
        assert_eq!(f.nearest_row(100.0), 3);
    }

    #[test]
    fn peak_is_largest_magnitude() {
        let mut f = small_field();
        f.data[4] = -100.0;
        assert_eq!(f.peak(), Some((4, -100.0)));
    }
}
