// src/main.rs
//
// Command-line driver for gravity forward modelling.
//
// Outputs are written to `runs/` (or the directory given via `out=`) and
// are not committed to version control.
//
// Examples:
//
//   cargo run --release -- src=dome:0:0:120:-300 src=:150:80:60:450
//       -> two spheres (second one auto-named p2), 200x200 grid over
//          ±400 m, 21x21 box smoothing, map + profile at Y=0.
//
//   cargo run --release -- single radius=100 drho=400 z0=300
//       -> one sphere at the origin on a ±1 km grid, no smoothing.
//
//   cargo run --release -- src=a:0:0:50:300 kernel=11 query=10,20 query=500,0
//       -> interpolate g_z at two points; the second lies outside the grid.
//
// Typical outputs (per run directory):
//   runs/<run_id>/
//     ├── config.json
//     ├── field.csv
//     ├── profile.csv
//     ├── queries.csv       (if any query= was given)
//     ├── anomaly_map.png
//     └── profile.png

use std::env;
use std::error::Error;
use std::fs::create_dir_all;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use gravfwd::config::{ModelConfig, Preset, RunConfig, RunInfo};
use gravfwd::error::{parse_finite, ModelError, ModelResult};
use gravfwd::export::{write_field_csv, write_profile_csv, write_queries_csv, QueryRow};
use gravfwd::model::ForwardModel;
use gravfwd::source::{Source, SourceInput, SourceRegistry};
use gravfwd::visualisation::{save_anomaly_map, save_profile_plot};

fn print_usage() {
    eprintln!(
        r#"Usage:
  cargo run -- [smoothed|single] [src=NAME:X:Y:Z:RHO]...
             [radius=M] [kernel=K|smooth=off] [profile_y=M]
             [nx=N] [ny=N] [xmin=M] [xmax=M] [ymin=M] [ymax=M]
             [drho=KG_M3] [z0=M]            (single preset, no src=)
             [query=X,Y]... [config=FILE.json]
             [out=DIR] [run=RUN_ID] [nomesh] [noplot]

Notes:
  - Depth Z is positive downward; RHO is the density contrast in kg/m^3.
  - A blank NAME becomes p<N>, N being the 1-based position in the list.
  - Output g_z is in mGal. Queries outside the grid are reported as such, not as 0.
  - Any argument that fails to parse aborts the run before anything is written.
  - RUST_LOG=debug shows per-run numbers (peak location, timings).
"#
    );
}

fn sanitize_run_id(s: &str) -> String {
    s.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

fn default_run_id(preset: Preset, n_sources: usize) -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_else(|_| std::time::Duration::from_secs(0));
    let ts = format!("{}{:03}", now.as_secs(), now.subsec_millis());
    format!("{}_{}_{}src", ts, preset.as_str(), n_sources)
}

fn unique_run_dir(out_root: &str, run_id: &str) -> PathBuf {
    let base = PathBuf::from(out_root);
    let mut dir = base.join(run_id);
    if !dir.exists() {
        return dir;
    }
    for k in 1..1000 {
        let cand = base.join(format!("{}_{}", run_id, k));
        if !cand.exists() {
            dir = cand;
            break;
        }
    }
    dir
}

/// Parse `X,Y`.
fn parse_query(v: &str) -> ModelResult<(f64, f64)> {
    let (xs, ys) = v
        .split_once(',')
        .ok_or_else(|| ModelError::validation("query (X,Y)", v))?;
    Ok((parse_finite("query x", xs)?, parse_finite("query y", ys)?))
}

/// Parse a node count or kernel size.
fn parse_count(key: &str, v: &str) -> ModelResult<usize> {
    v.trim()
        .parse::<usize>()
        .map_err(|_| ModelError::validation(key, v))
}

/// Parse `smooth=on|off` (also 1/0, true/false) into a kernel setting.
fn parse_smooth(v: &str) -> ModelResult<Option<usize>> {
    let t = v.trim();
    if t.eq_ignore_ascii_case("off") || t == "0" || t.eq_ignore_ascii_case("false") {
        Ok(None)
    } else if t.eq_ignore_ascii_case("on") || t == "1" || t.eq_ignore_ascii_case("true") {
        Ok(Some(gravfwd::smoothing::DEFAULT_KERNEL_SIZE))
    } else {
        Err(ModelError::validation("smooth (on/off)", v))
    }
}

/// Build the registry from `NAME:X:Y:Z:RHO` specs, in order.
/// The first spec that fails to parse aborts the whole list.
fn registry_from_specs(specs: &[String]) -> ModelResult<SourceRegistry> {
    let mut registry = SourceRegistry::new();
    for spec in specs {
        let input = SourceInput::from_colon_spec(spec)?;
        registry.add_input(&input)?;
    }
    Ok(registry)
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let argv: Vec<String> = env::args().collect();

    let mut preset: Preset = Preset::Smoothed;
    let mut source_specs: Vec<String> = Vec::new();
    let mut queries: Vec<(f64, f64)> = Vec::new();

    // Optional overrides
    let mut config_path: Option<PathBuf> = None;
    let mut radius_override: Option<f64> = None;
    let mut kernel_override: Option<Option<usize>> = None;
    let mut profile_y_override: Option<f64> = None;
    let mut nx_override: Option<usize> = None;
    let mut ny_override: Option<usize> = None;
    let mut xmin_override: Option<f64> = None;
    let mut xmax_override: Option<f64> = None;
    let mut ymin_override: Option<f64> = None;
    let mut ymax_override: Option<f64> = None;
    let mut drho: f64 = 400.0;
    let mut z0: f64 = 300.0;
    let mut show_mesh: Option<bool> = None;
    let mut plots = true;

    // Output controls
    let mut out_root_override: Option<String> = None;
    let mut run_id_override: Option<String> = None;

    for arg in argv.iter().skip(1) {
        if arg == "-h" || arg == "--help" || arg == "help" {
            print_usage();
            return Ok(());
        }

        if let Some(p) = Preset::from_arg(arg) {
            preset = p;
            continue;
        }
        if arg == "noplot" {
            plots = false;
            continue;
        }
        if arg == "nomesh" {
            show_mesh = Some(false);
            continue;
        }

        if let Some(v) = arg.strip_prefix("src=") {
            source_specs.push(v.to_string());
            continue;
        }
        if let Some(v) = arg.strip_prefix("query=") {
            queries.push(parse_query(v)?);
            continue;
        }
        if let Some(v) = arg.strip_prefix("config=") {
            config_path = Some(PathBuf::from(v));
            continue;
        }

        if let Some(v) = arg.strip_prefix("smooth=") {
            kernel_override = Some(parse_smooth(v)?);
            continue;
        }
        if let Some(v) = arg.strip_prefix("kernel=") {
            kernel_override = Some(Some(parse_count("kernel", v)?));
            continue;
        }
        if let Some(v) = arg.strip_prefix("nx=") {
            nx_override = Some(parse_count("nx", v)?);
            continue;
        }
        if let Some(v) = arg.strip_prefix("ny=") {
            ny_override = Some(parse_count("ny", v)?);
            continue;
        }

        if let Some(v) = arg.strip_prefix("radius=") {
            radius_override = Some(parse_finite("radius", v)?);
            continue;
        }
        if let Some(v) = arg.strip_prefix("profile_y=") {
            profile_y_override = Some(parse_finite("profile_y", v)?);
            continue;
        }
        if let Some(v) = arg.strip_prefix("xmin=") {
            xmin_override = Some(parse_finite("xmin", v)?);
            continue;
        }
        if let Some(v) = arg.strip_prefix("xmax=") {
            xmax_override = Some(parse_finite("xmax", v)?);
            continue;
        }
        if let Some(v) = arg.strip_prefix("ymin=") {
            ymin_override = Some(parse_finite("ymin", v)?);
            continue;
        }
        if let Some(v) = arg.strip_prefix("ymax=") {
            ymax_override = Some(parse_finite("ymax", v)?);
            continue;
        }
        if let Some(v) = arg.strip_prefix("drho=") {
            drho = parse_finite("drho", v)?;
            continue;
        }
        if let Some(v) = arg.strip_prefix("z0=") {
            z0 = parse_finite("z0", v)?;
            continue;
        }

        if let Some(v) = arg.strip_prefix("out=") {
            out_root_override = Some(v.to_string());
            continue;
        }
        if let Some(v) = arg.strip_prefix("run=") {
            run_id_override = Some(v.to_string());
            continue;
        }

        print_usage();
        return Err(format!("unknown argument '{arg}'").into());
    }

    // -------- configuration --------
    let mut cfg = match &config_path {
        Some(p) => ModelConfig::from_json_file(p)?,
        None => ModelConfig::from_preset(preset),
    };
    if let Some(r) = radius_override {
        cfg.sphere_radius = r;
    }
    if let Some(k) = kernel_override {
        cfg.smoothing = k;
    }
    if let Some(y) = profile_y_override {
        cfg.profile_y = y;
    }
    if let Some(n) = nx_override {
        cfg.x_axis.count = n;
    }
    if let Some(n) = ny_override {
        cfg.y_axis.count = n;
    }
    if let Some(v) = xmin_override {
        cfg.x_axis.min = v;
    }
    if let Some(v) = xmax_override {
        cfg.x_axis.max = v;
    }
    if let Some(v) = ymin_override {
        cfg.y_axis.min = v;
    }
    if let Some(v) = ymax_override {
        cfg.y_axis.max = v;
    }
    if let Some(m) = show_mesh {
        cfg.show_mesh = m;
    }

    let mut model = ForwardModel::new(cfg)?;

    // -------- sources --------
    *model.registry_mut() = registry_from_specs(&source_specs)?;
    if model.registry().is_empty() && preset == Preset::SingleSphere {
        model
            .registry_mut()
            .add(Source::new("sphere", 0.0, 0.0, z0, drho));
    }

    // -------- output directory setup --------
    let out_root = out_root_override.unwrap_or_else(|| "runs".to_string());
    create_dir_all(&out_root)?;

    let mut run_id = run_id_override.unwrap_or_else(|| default_run_id(preset, model.registry().len()));
    run_id = sanitize_run_id(&run_id);

    let run_dir = unique_run_dir(&out_root, &run_id);
    create_dir_all(&run_dir)?;

    let run_config = RunConfig {
        model: model.config().clone(),
        n_sources: model.registry().len(),
        run: RunInfo {
            binary: "gravfwd".to_string(),
            preset: preset.as_str().to_string(),
            run_id: run_id.clone(),
        },
    };
    run_config.write_to_dir(&run_dir)?;

    println!("--- gravfwd run config ---");
    println!("run_dir: {}", run_dir.to_string_lossy());
    println!("preset:  {}", preset.as_str());
    let c = model.config();
    println!(
        "grid:    x=[{}, {}] n={}  y=[{}, {}] n={}",
        c.x_axis.min, c.x_axis.max, c.x_axis.count, c.y_axis.min, c.y_axis.max, c.y_axis.count
    );
    println!("radius:  {} m", c.sphere_radius);
    for (k, s) in model.registry().list().iter().enumerate() {
        println!(
            "src[{k}]: {:<10} x={:.1} y={:.1} z={:.1} rho={:.1}",
            s.name, s.x, s.y, s.z, s.rho
        );
    }
    println!("--------------------------");

    // -------- run --------
    let snap = model.run()?;
    println!("{}", snap.summary());

    write_field_csv(&run_dir.join("field.csv"), &snap.field)?;
    write_profile_csv(&run_dir.join("profile.csv"), &snap.profile)?;

    if !queries.is_empty() {
        let mut rows = Vec::with_capacity(queries.len());
        for &(x, y) in &queries {
            let row = QueryRow::from_result(x, y, model.sample(x, y))?;
            match row.gz_mgal {
                Some(v) => println!("g_z({x}, {y}) = {v:.4} mGal"),
                None => println!("g_z({x}, {y}) : outside the model grid"),
            }
            rows.push(row);
        }
        write_queries_csv(&run_dir.join("queries.csv"), &rows)?;
    }

    if plots {
        let show = model.config().show_mesh;
        render(&snap, &run_dir, show);
    } else {
        info!("plot rendering skipped (noplot)");
    }

    println!("Done. Outputs in {}", run_dir.to_string_lossy());
    Ok(())
}

/// Plot failures are reported but do not fail the run; the CSVs are already on disk.
fn render(snap: &gravfwd::model::ModelSnapshot, run_dir: &Path, show_mesh: bool) {
    if let Err(e) = save_anomaly_map(snap, &run_dir.join("anomaly_map.png"), show_mesh) {
        warn!("could not render anomaly map: {e}");
    }
    if let Err(e) = save_profile_plot(&snap.profile, &run_dir.join("profile.png"), show_mesh) {
        warn!("could not render profile: {e}");
    }
}
