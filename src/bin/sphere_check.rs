// src/bin/sphere_check.rs
//
// Single-sphere sanity check against the closed-form profile:
//   Sphere: R = 100 m, Δρ = 400 kg/m^3, centre depth z = 300 m, at the origin
//   Grid:   ±1000 m, 101 x 101 nodes (so x = 0 and y = 0 are nodes), no smoothing
//
// Analytic profile along y = 0:
//   g(x) = (4/3)π G Δρ R^3 z / (x^2 + z^2)^{3/2}   [x 1e5 -> mGal]
//
// Run:
//   cargo run --release --bin sphere_check
//
// Output:
//   out/sphere_check/profile_vs_analytic.csv

use std::fs::{create_dir_all, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use gravfwd::config::{ModelConfig, Preset};
use gravfwd::gravity::sphere_profile_mgal;
use gravfwd::grid::AxisSpec;
use gravfwd::model::run_model;
use gravfwd::source::Source;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let radius = 100.0;
    let drho = 400.0;
    let depth = 300.0;

    let mut cfg = ModelConfig::from_preset(Preset::SingleSphere);
    cfg.x_axis = AxisSpec::new(-1000.0, 1000.0, 101);
    cfg.y_axis = AxisSpec::new(-1000.0, 1000.0, 101);
    cfg.sphere_radius = radius;
    cfg.smoothing = None;

    let sources = [Source::new("sphere", 0.0, 0.0, depth, drho)];
    let snap = run_model(&sources, &cfg)?;
    let profile = &snap.profile;

    let out_dir = Path::new("out").join("sphere_check");
    create_dir_all(&out_dir)?;
    let mut w = BufWriter::new(File::create(out_dir.join("profile_vs_analytic.csv"))?);
    writeln!(w, "x_m,gz_model_mgal,gz_analytic_mgal,rel_err")?;

    let mut max_rel: f64 = 0.0;
    for (&x, &g) in profile.x.iter().zip(&profile.values) {
        // profile row sits at y = profile.y, which is 0 for an odd node count
        let h = (x * x + profile.y * profile.y).sqrt();
        let exact = sphere_profile_mgal(h, depth, drho, radius);
        let rel = ((g - exact) / exact).abs();
        max_rel = max_rel.max(rel);
        writeln!(w, "{:.6},{:.16e},{:.16e},{:.3e}", x, g, exact, rel)?;
    }
    w.flush()?;

    let peak = sphere_profile_mgal(0.0, depth, drho, radius);
    println!("profile row y = {} m", profile.y);
    println!("analytic peak  = {:.6} mGal", peak);
    println!("max rel. error = {:.3e}", max_rel);
    if max_rel > 1e-10 {
        eprintln!("WARNING: profile deviates from the closed form more than expected");
    }
    println!("Wrote out/sphere_check/profile_vs_analytic.csv");
    Ok(())
}
