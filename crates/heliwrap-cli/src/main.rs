//! heliwrap CLI - conformal helix curves over tubular meshes.
//!
//! Loads a surface mesh and its medial-axis skeleton, recenters both to
//! the skeleton root, fits a smooth curve through the skeleton, and
//! generates a family of helices that hug the mesh surface.

use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;

use heliwrap_core::{
    fit, generate_family, FitSettings, HelixCurve, HelixFamilySettings, HelixSpec, Winding,
};
use heliwrap_raytrace::Bvh;

#[derive(Parser)]
#[command(name = "heliwrap")]
#[command(about = "Conformal helix curves over tubular meshes", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a helix family from a mesh and its skeleton
    Generate {
        /// Surface mesh file (.stl or .obj)
        mesh: PathBuf,
        /// Skeleton .cg text file (e.g. StarLab MCF skeletonization output)
        skeleton: PathBuf,
        /// Points in the first-pass denoised curve
        #[arg(long, default_value_t = 10)]
        samples: usize,
        /// Spline polynomial order for both fitting passes
        #[arg(long, default_value_t = 3)]
        order: usize,
        /// Number of start angles (2x this many curves are generated)
        #[arg(long, default_value_t = 8)]
        count: usize,
        /// Arc length per full rotation
        #[arg(long, default_value_t = 200.0)]
        pitch: f64,
        /// Radial bias beyond the conformal surface distance
        #[arg(long, default_value_t = 5.0)]
        offset: f64,
        /// Directory for the generated curve files
        #[arg(long, default_value = "curves")]
        out_dir: PathBuf,
        /// Also write the recentered mesh to this STL path
        #[arg(long)]
        save_centered: Option<PathBuf>,
    },
    /// Print statistics about a mesh/skeleton pair
    Info {
        /// Surface mesh file (.stl or .obj)
        mesh: PathBuf,
        /// Skeleton .cg text file
        skeleton: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            mesh,
            skeleton,
            samples,
            order,
            count,
            pitch,
            offset,
            out_dir,
            save_centered,
        } => run_generate(
            &mesh,
            &skeleton,
            FitSettings { samples, order },
            HelixFamilySettings {
                count,
                pitch,
                radial_offset: offset,
            },
            &out_dir,
            save_centered.as_deref(),
        ),
        Commands::Info { mesh, skeleton } => run_info(&mesh, &skeleton),
    }
}

/// One entry of the output manifest.
#[derive(Serialize)]
struct CurveRecord {
    file: String,
    points: usize,
    spec: HelixSpec,
}

fn run_generate(
    mesh_path: &std::path::Path,
    skeleton_path: &std::path::Path,
    fit_settings: FitSettings,
    family_settings: HelixFamilySettings,
    out_dir: &std::path::Path,
    save_centered: Option<&std::path::Path>,
) -> Result<()> {
    let mut mesh = heliwrap_mesh::load_mesh(mesh_path)
        .with_context(|| format!("loading mesh {}", mesh_path.display()))?;
    let mut skeleton = heliwrap_skeleton::load_skeleton(skeleton_path)
        .with_context(|| format!("loading skeleton {}", skeleton_path.display()))?;

    // Move mesh and skeleton to a common origin at the skeleton root.
    let d = skeleton.root_offset();
    skeleton.translate(&d);
    mesh.translate(&d);
    if let Some(path) = save_centered {
        heliwrap_mesh::save_stl(path, &mesh)
            .with_context(|| format!("writing centered mesh {}", path.display()))?;
        println!("Wrote centered mesh to {}", path.display());
    }

    let curve = fit(&skeleton.vertices, &fit_settings).context("fitting skeleton curve")?;
    println!(
        "Fitted curve: {} samples from {} skeleton vertices",
        curve.len(),
        skeleton.vertices.len()
    );

    let bvh = Bvh::build(&mesh);
    println!("Built BVH over {} triangles", bvh.num_triangles());

    let family = generate_family(&curve, &bvh, &family_settings);

    fs::create_dir_all(out_dir)
        .with_context(|| format!("creating output directory {}", out_dir.display()))?;

    let mut manifest = Vec::new();
    let mut failures = 0usize;
    for (k, (spec, result)) in family.into_iter().enumerate() {
        let name = curve_file_name(k, family_settings.count, &spec);
        match result {
            Ok(helix) => {
                let path = out_dir.join(&name);
                fs::write(&path, curve_text(&helix))
                    .with_context(|| format!("writing {}", path.display()))?;
                manifest.push(CurveRecord {
                    file: name,
                    points: helix.points.len(),
                    spec,
                });
            }
            Err(err) => {
                failures += 1;
                eprintln!("curve {name}: {err}");
            }
        }
    }

    let manifest_path = out_dir.join("manifest.json");
    fs::write(&manifest_path, serde_json::to_string_pretty(&manifest)?)
        .with_context(|| format!("writing {}", manifest_path.display()))?;

    println!(
        "Wrote {} curves to {} ({} failed)",
        manifest.len(),
        out_dir.display(),
        failures
    );
    Ok(())
}

/// File name for curve `k` of the family: `pos<i>.txt` for forward
/// windings, `neg<i>.txt` for reverse, with `i` the start-angle index.
fn curve_file_name(k: usize, count: usize, spec: &HelixSpec) -> String {
    let i = k % count.max(1);
    match spec.winding {
        Winding::Forward => format!("pos{i}.txt"),
        Winding::Reverse => format!("neg{i}.txt"),
    }
}

/// Serialize a helix as whitespace-separated `x y z` lines.
fn curve_text(helix: &HelixCurve) -> String {
    let mut out = String::with_capacity(helix.points.len() * 32);
    for p in &helix.points {
        let _ = writeln!(out, "{} {} {}", p.x, p.y, p.z);
    }
    out
}

fn run_info(mesh_path: &std::path::Path, skeleton_path: &std::path::Path) -> Result<()> {
    let mesh = heliwrap_mesh::load_mesh(mesh_path)
        .with_context(|| format!("loading mesh {}", mesh_path.display()))?;
    let skeleton = heliwrap_skeleton::load_skeleton(skeleton_path)
        .with_context(|| format!("loading skeleton {}", skeleton_path.display()))?;

    println!("Mesh: {}", mesh_path.display());
    println!("  vertices:  {}", mesh.num_vertices());
    println!("  triangles: {}", mesh.num_triangles());
    if let Some(aabb) = mesh.aabb() {
        println!(
            "  bounds:    [{:.3}, {:.3}, {:.3}] .. [{:.3}, {:.3}, {:.3}]",
            aabb.min.x, aabb.min.y, aabb.min.z, aabb.max.x, aabb.max.y, aabb.max.z
        );
    }

    println!("Skeleton: {}", skeleton_path.display());
    println!("  vertices: {}", skeleton.vertices.len());
    println!("  edges:    {}", skeleton.edges.len());
    let d = skeleton.root_offset();
    println!("  root offset: ({:.3}, {:.3}, {:.3})", d.x, d.y, d.z);
    Ok(())
}
