// src/gravity.rs
//
// Vertical gravity anomaly g_z of buried homogeneous spheres.
//
// For a sphere of radius R and density contrast Δρ whose centre sits at
// depth z below an observation point offset (dx, dy) horizontally:
//
//   g_z = (4/3) π G Δρ R^3 · z / r^3,   r = sqrt(dx^2 + dy^2 + z^2)
//
// i.e. the field of a point mass M = (4/3)πR^3Δρ. Contributions of several
// sources are summed (linear superposition). Output is in mGal.
//
// Singularity policy: r == 0 exactly is replaced by R_EPSILON before the
// division. This is a numerical guard, not physics; results at such points
// are meaningless. With z == 0 the numerator is also 0, so the guard only
// prevents NaN.

use rayon::prelude::*;
use std::f64::consts::PI;
use tracing::debug;

use crate::grid::Grid2D;
use crate::scalar_field::ScalarField2D;
use crate::source::Source;

/// Newtonian gravitational constant (m^3 kg^-1 s^-2).
pub const G: f64 = 6.674e-11;

/// 1 mGal = 1e-5 m/s^2.
pub const SI_TO_MGAL: f64 = 1e5;

/// Distance substituted for r == 0.
pub const R_EPSILON: f64 = 1e-6;

/// Below this many nodes the row loop stays sequential.
const PAR_MIN_NODES: usize = 4096;

/// Distance with the r == 0 guard applied.
#[inline]
pub fn safe_distance(r: f64) -> f64 {
    if r == 0.0 {
        R_EPSILON
    } else {
        r
    }
}

/// Mass-like prefactor (4/3) π G Δρ R^3, in SI.
#[inline]
pub fn sphere_prefactor(rho: f64, radius: f64) -> f64 {
    (4.0 / 3.0) * PI * G * rho * radius.powi(3)
}

/// g_z (m/s^2) of one sphere at horizontal offset (dx, dy) and depth `dz`.
#[inline]
pub fn sphere_gz_si(dx: f64, dy: f64, dz: f64, rho: f64, radius: f64) -> f64 {
    let r = safe_distance((dx * dx + dy * dy + dz * dz).sqrt());
    sphere_prefactor(rho, radius) * dz / (r * r * r)
}

/// Analytic profile of a single sphere, in mGal, at horizontal distance `h`.
pub fn sphere_profile_mgal(h: f64, depth: f64, rho: f64, radius: f64) -> f64 {
    sphere_prefactor(rho, radius) * depth / (h * h + depth * depth).powf(1.5) * SI_TO_MGAL
}

/// Sum of all source contributions (SI) at one surface point.
#[inline]
fn gz_at(x: f64, y: f64, sources: &[Source], radius: f64) -> f64 {
    let mut acc = 0.0;
    for s in sources {
        acc += sphere_gz_si(x - s.x, y - s.y, s.z, s.rho, radius);
    }
    acc
}

/// Superposed g_z field (mGal) of `sources` on `grid`.
///
/// An empty source list yields an all-zero field of the grid's shape.
/// `radius` is shared by every source; `radius <= 0` is the caller's problem.
pub fn evaluate(sources: &[Source], grid: &Grid2D, radius: f64) -> ScalarField2D {
    let mut field = ScalarField2D::zeros(grid.clone());
    if sources.is_empty() {
        return field;
    }

    let nx = grid.nx();
    let xs = grid.xs();
    let ys = grid.ys();

    let fill_row = |(j, row): (usize, &mut [f64])| {
        let y = ys[j];
        for (i, out) in row.iter_mut().enumerate() {
            *out = gz_at(xs[i], y, sources, radius) * SI_TO_MGAL;
        }
    };

    if grid.n_nodes() >= PAR_MIN_NODES {
        field.data.par_chunks_mut(nx).enumerate().for_each(fill_row);
    } else {
        field.data.chunks_mut(nx).enumerate().for_each(fill_row);
    }

    debug!(
        nx,
        ny = grid.ny(),
        n_sources = sources.len(),
        radius,
        "evaluated g_z field"
    );
    field
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::AxisSpec;

    fn grid(n: usize, half: f64) -> Grid2D {
        let a = AxisSpec::new(-half, half, n);
        Grid2D::from_specs(&a, &a).unwrap()
    }

    #[test]
    fn on_axis_value_matches_closed_form() {
        // x = 0 is a node for odd counts
        let g = grid(11, 500.0);
        let s = Source::new("s", 0.0, 0.0, 300.0, 400.0);
        let f = evaluate(&[s], &g, 100.0);

        let expected = (4.0 / 3.0) * PI * G * 400.0 * 100.0_f64.powi(3) / (300.0 * 300.0) * SI_TO_MGAL;
        let got = f.get(5, 5);
        assert!(
            ((got - expected) / expected).abs() < 1e-12,
            "on-axis g_z {got} vs closed form {expected}"
        );
    }

    #[test]
    fn empty_source_list_gives_zero_field() {
        let g = grid(7, 10.0);
        let f = evaluate(&[], &g, 20.0);
        assert_eq!(f.data.len(), 49);
        assert!(f.data.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn negative_contrast_flips_sign() {
        let g = grid(5, 100.0);
        let pos = evaluate(&[Source::new("a", 0.0, 0.0, 50.0, 250.0)], &g, 20.0);
        let neg = evaluate(&[Source::new("a", 0.0, 0.0, 50.0, -250.0)], &g, 20.0);
        for (p, n) in pos.data.iter().zip(&neg.data) {
            assert!(*p > 0.0);
            assert_eq!(*p, -*n);
        }
    }

    #[test]
    fn zero_distance_is_guarded() {
        assert_eq!(safe_distance(0.0), R_EPSILON);
        assert_eq!(safe_distance(3.0), 3.0);
        // source at the surface directly under a node: finite, zero numerator
        let v = sphere_gz_si(0.0, 0.0, 0.0, 1000.0, 20.0);
        assert!(v.is_finite());
        assert_eq!(v, 0.0);
    }

    #[test]
    fn parallel_and_sequential_paths_agree() {
        // 70x70 = 4900 nodes takes the rayon path; compare against point-wise evaluation.
        let g = grid(70, 700.0);
        let sources = [
            Source::new("a", 120.0, -80.0, 90.0, 300.0),
            Source::new("b", -200.0, 150.0, 200.0, -150.0),
        ];
        let f = evaluate(&sources, &g, 20.0);
        for &(i, j) in &[(0usize, 0usize), (13, 57), (69, 69), (35, 2)] {
            let (x, y) = g.node(i, j);
            let direct = gz_at(x, y, &sources, 20.0) * SI_TO_MGAL;
            assert_eq!(f.get(i, j), direct);
        }
    }

    #[test]
    fn profile_helper_agrees_with_grid_formula() {
        let h = 250.0;
        let a = sphere_profile_mgal(h, 300.0, 400.0, 100.0);
        let b = sphere_gz_si(h, 0.0, 300.0, 400.0, 100.0) * SI_TO_MGAL;
        assert!(((a - b) / b).abs() < 1e-12);
    }
}
