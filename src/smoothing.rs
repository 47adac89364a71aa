// src/smoothing.rs
//
// k x k mean (box) filter with "same" output size and symmetric boundary
// extension: outside the grid the field is mirrored about the edge, edge
// sample included (... b a | a b c ... x y z | z y ...). Not zero-padded,
// so the border does not darken.
//
// The box kernel is separable, so it is applied as a horizontal pass then a
// vertical pass, each weighting k samples by 1/k.
//
// This is a cosmetic low-pass step; it is not derived from the physics.

use rayon::prelude::*;
use tracing::debug;

use crate::error::{ModelError, ModelResult};
use crate::scalar_field::ScalarField2D;

/// Kernel size used when none is configured.
pub const DEFAULT_KERNEL_SIZE: usize = 21;

/// Check that a k x k kernel is usable on an nx x ny field.
pub fn validate_kernel(size: usize, nx: usize, ny: usize) -> ModelResult<()> {
    let reason = if size == 0 {
        Some("kernel size must be positive".to_string())
    } else if size % 2 == 0 {
        Some("kernel size must be odd so the window is centred".to_string())
    } else if size > nx || size > ny {
        Some(format!("kernel does not fit in a {nx} x {ny} field"))
    } else {
        None
    };
    match reason {
        Some(reason) => Err(ModelError::InvalidKernel { size, reason }),
        None => Ok(()),
    }
}

/// Mirror an out-of-range index back into 0..n (half-sample symmetric).
/// Valid for offsets up to n on either side.
#[inline]
fn reflect(idx: isize, n: usize) -> usize {
    let n = n as isize;
    if idx < 0 {
        (-idx - 1) as usize
    } else if idx >= n {
        (2 * n - idx - 1) as usize
    } else {
        idx as usize
    }
}

/// Box-filter `field` with a `kernel_size` x `kernel_size` mean kernel.
pub fn smooth(field: &ScalarField2D, kernel_size: usize) -> ModelResult<ScalarField2D> {
    let nx = field.grid.nx();
    let ny = field.grid.ny();
    validate_kernel(kernel_size, nx, ny)?;

    let half = (kernel_size / 2) as isize;
    let w = 1.0 / kernel_size as f64;

    // Horizontal pass
    let mut tmp = vec![0.0; nx * ny];
    tmp.par_chunks_mut(nx).enumerate().for_each(|(j, out)| {
        let row = field.row(j);
        for (i, o) in out.iter_mut().enumerate() {
            let c = i as isize;
            let mut acc = 0.0;
            for d in -half..=half {
                acc += row[reflect(c + d, nx)];
            }
            *o = acc * w;
        }
    });

    // Vertical pass
    let mut out = ScalarField2D::zeros(field.grid.clone());
    out.data.par_chunks_mut(nx).enumerate().for_each(|(j, out_row)| {
        let c = j as isize;
        for d in -half..=half {
            let src = reflect(c + d, ny) * nx;
            for (i, o) in out_row.iter_mut().enumerate() {
                *o += tmp[src + i];
            }
        }
        for o in out_row.iter_mut() {
            *o *= w;
        }
    });

    debug!(kernel_size, nx, ny, "smoothed field");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Grid2D;

    fn field_from(nx: usize, ny: usize, f: impl Fn(usize, usize) -> f64) -> ScalarField2D {
        let xs = (0..nx).map(|i| i as f64).collect();
        let ys = (0..ny).map(|j| j as f64).collect();
        let mut out = ScalarField2D::zeros(Grid2D::from_axes(xs, ys).unwrap());
        for j in 0..ny {
            for i in 0..nx {
                let k = out.idx(i, j);
                out.data[k] = f(i, j);
            }
        }
        out
    }

    /// Direct 2D convolution with explicit k*k weights and mirrored indices.
    fn reference_box(field: &ScalarField2D, k: usize) -> Vec<f64> {
        let nx = field.grid.nx();
        let ny = field.grid.ny();
        let h = (k / 2) as isize;
        let w = 1.0 / (k * k) as f64;
        let mut out = vec![0.0; nx * ny];
        for j in 0..ny {
            for i in 0..nx {
                let mut acc = 0.0;
                for dj in -h..=h {
                    for di in -h..=h {
                        let ii = reflect(i as isize + di, nx);
                        let jj = reflect(j as isize + dj, ny);
                        acc += w * field.get(ii, jj);
                    }
                }
                out[j * nx + i] = acc;
            }
        }
        out
    }

    #[test]
    fn reflect_mirrors_including_edge_sample() {
        assert_eq!(reflect(-1, 5), 0);
        assert_eq!(reflect(-2, 5), 1);
        assert_eq!(reflect(5, 5), 4);
        assert_eq!(reflect(6, 5), 3);
        assert_eq!(reflect(3, 5), 3);
    }

    #[test]
    fn constant_field_is_unchanged() {
        let f = field_from(9, 7, |_, _| 3.25);
        let s = smooth(&f, 5).unwrap();
        for v in &s.data {
            assert!((v - 3.25).abs() < 1e-12, "got {v}");
        }
    }

    #[test]
    fn separable_passes_match_direct_convolution() {
        let f = field_from(12, 9, |i, j| ((i * 7 + j * 13) % 11) as f64 - 4.0);
        let s = smooth(&f, 5).unwrap();
        let r = reference_box(&f, 5);
        for (a, b) in s.data.iter().zip(&r) {
            assert!((a - b).abs() < 1e-12, "{a} vs {b}");
        }
    }

    #[test]
    fn edge_is_not_darkened() {
        // a field that is 1 everywhere except a far interior spike stays 1 at corners
        let f = field_from(15, 15, |i, j| if i == 7 && j == 7 { 10.0 } else { 1.0 });
        let s = smooth(&f, 3).unwrap();
        assert!((s.get(0, 0) - 1.0).abs() < 1e-12);
        assert!((s.get(14, 0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn kernel_size_one_is_identity() {
        let f = field_from(4, 3, |i, j| (i + 10 * j) as f64);
        let s = smooth(&f, 1).unwrap();
        assert_eq!(s.data, f.data);
    }

    #[test]
    fn invalid_kernels_are_rejected() {
        let f = field_from(10, 6, |_, _| 0.0);
        for k in [0usize, 4, 7, 11] {
            assert!(
                matches!(smooth(&f, k), Err(ModelError::InvalidKernel { size, .. }) if size == k),
                "kernel {k} should be rejected"
            );
        }
        assert!(smooth(&f, 5).is_ok());
    }
}
