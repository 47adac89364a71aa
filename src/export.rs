// src/export.rs
//
// Plain-text writers for run outputs:
//  - field.csv    x,y,gz_mgal for every node (x fastest, then y)
//  - profile.csv  x,gz_mgal along the profile row
//  - queries.csv  x,y,gz_mgal for interpolation queries ("outside" on a domain miss)

use std::fs::{create_dir_all, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{ModelError, ModelResult};
use crate::scalar_field::{Profile, ScalarField2D};

/// One interpolation request and what came back.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRow {
    pub x: f64,
    pub y: f64,
    /// `None` when the point was outside the grid.
    pub gz_mgal: Option<f64>,
}

impl QueryRow {
    /// Fold a sampling result into a row. Only `DomainMiss` is absorbed.
    pub fn from_result(x: f64, y: f64, r: ModelResult<f64>) -> ModelResult<Self> {
        match r {
            Ok(v) => Ok(Self { x, y, gz_mgal: Some(v) }),
            Err(ModelError::DomainMiss { .. }) => Ok(Self { x, y, gz_mgal: None }),
            Err(e) => Err(e),
        }
    }
}

fn ensure_parent_dir(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }
    Ok(())
}

pub fn write_field_csv(path: &Path, field: &ScalarField2D) -> ModelResult<()> {
    ensure_parent_dir(path)?;
    let grid = &field.grid;
    if field.data.len() != grid.n_nodes() {
        return Err(ModelError::InvalidGrid(format!(
            "field length mismatch: got {}, expected {} (nx*ny)",
            field.data.len(),
            grid.n_nodes()
        )));
    }

    let mut w = BufWriter::new(File::create(path)?);
    writeln!(w, "x_m,y_m,gz_mgal")?;
    for j in 0..grid.ny() {
        for i in 0..grid.nx() {
            let (x, y) = grid.node(i, j);
            writeln!(w, "{:.6},{:.6},{:.10e}", x, y, field.get(i, j))?;
        }
    }
    w.flush()?;
    Ok(())
}

pub fn write_profile_csv(path: &Path, profile: &Profile) -> ModelResult<()> {
    ensure_parent_dir(path)?;
    let mut w = BufWriter::new(File::create(path)?);
    writeln!(w, "# profile at y = {:.6} m", profile.y)?;
    writeln!(w, "x_m,gz_mgal")?;
    for (x, v) in profile.x.iter().zip(&profile.values) {
        writeln!(w, "{:.6},{:.10e}", x, v)?;
    }
    w.flush()?;
    Ok(())
}

pub fn write_queries_csv(path: &Path, rows: &[QueryRow]) -> ModelResult<()> {
    ensure_parent_dir(path)?;
    let mut w = BufWriter::new(File::create(path)?);
    writeln!(w, "x_m,y_m,gz_mgal")?;
    for r in rows {
        match r.gz_mgal {
            Some(v) => writeln!(w, "{:.6},{:.6},{:.10e}", r.x, r.y, v)?,
            None => writeln!(w, "{:.6},{:.6},outside", r.x, r.y)?,
        }
    }
    w.flush()?;
    Ok(())
}
