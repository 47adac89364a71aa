// src/sampler.rs
//
// Bilinear interpolation of a scalar field stored on a regular grid.
//
// Cell lookup: for each axis take the rightmost node <= query, clamped to
// len-2 so a query sitting exactly on the last node still has a right
// neighbour. Corners:
//
//   Q12 (i, j+1) ---- Q22 (i+1, j+1)
//    |                  |
//   Q11 (i, j)   ---- Q21 (i+1, j)
//
// Queries outside [axis.min, axis.max] on either axis are a domain miss,
// never extrapolated and never reported as 0.

use crate::error::{ModelError, ModelResult};
use crate::scalar_field::ScalarField2D;

/// Lower index of the cell enclosing `q` on a sorted axis (len >= 2).
#[inline]
fn cell_index(axis: &[f64], q: f64) -> usize {
    // number of nodes <= q, minus one = rightmost node <= q
    let k = axis.partition_point(|&v| v <= q);
    k.saturating_sub(1).min(axis.len() - 2)
}

/// Interpolated value of `field` at (xq, yq).
///
/// Returns `DomainMiss` outside the grid and `Validation` for NaN/inf queries.
/// On a node the stored value is returned exactly. If the enclosing cell has
/// zero width on either axis (repeated axis values) the lower-left corner
/// value is returned as is.
pub fn sample(field: &ScalarField2D, xq: f64, yq: f64) -> ModelResult<f64> {
    if !xq.is_finite() {
        return Err(ModelError::validation("query x", xq.to_string()));
    }
    if !yq.is_finite() {
        return Err(ModelError::validation("query y", yq.to_string()));
    }

    let grid = &field.grid;
    if field.data.len() != grid.n_nodes() {
        return Err(ModelError::InvalidGrid(format!(
            "field holds {} values for a {}x{} grid",
            field.data.len(),
            grid.nx(),
            grid.ny()
        )));
    }
    if !grid.contains(xq, yq) {
        return Err(ModelError::DomainMiss { x: xq, y: yq });
    }

    let (xs, ys) = (grid.xs(), grid.ys());
    let i = cell_index(xs, xq);
    let j = cell_index(ys, yq);

    let (x1, x2) = (xs[i], xs[i + 1]);
    let (y1, y2) = (ys[j], ys[j + 1]);

    let q11 = field.get(i, j);
    let q21 = field.get(i + 1, j);
    let q12 = field.get(i, j + 1);
    let q22 = field.get(i + 1, j + 1);

    if x2 == x1 || y2 == y1 {
        return Ok(q11);
    }

    let tx = (xq - x1) / (x2 - x1);
    let ty = (yq - y1) / (y2 - y1);

    Ok(q11 * (1.0 - tx) * (1.0 - ty)
        + q21 * tx * (1.0 - ty)
        + q12 * (1.0 - tx) * ty
        + q22 * tx * ty)
}
