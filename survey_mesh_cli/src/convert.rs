use std::{
    fs::File,
    io::{BufWriter, Write},
};

use anyhow::{Context, Ok, Result};
use log::{debug, info, warn};
use survey_mesh::{Diagnostics, IndexedTri, Vertex3};

use crate::{
    agd::{self, TopologyPoint},
    args::{Config, Elevation, OutputFormat},
    ply,
    progress::ConsoleProgressBar,
    projection,
    utils::measure_time,
};

/// The stages of a conversion shown by the progress bar.
const NUM_STAGES: usize = 4;

/// A triangulated surface over projected survey points.
#[derive(Clone, Debug, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<Vertex3>,
    /// Counter-clockwise triangles indexing into `vertices`.
    pub triangles: Vec<IndexedTri>,
    pub diagnostics: Diagnostics,
}

/// Converts the AGD file of `config` into a mesh file.
pub fn run(config: &Config) -> Result<()> {
    if !config.input.exists() {
        return Err(anyhow::Error::msg(format!(
            "Input file '{}' does not exist",
            config.input.display()
        )));
    }

    if config.progress {
        println!("Converting AGD file: {}", config.input.display());
        println!("Output file: {}", config.output.display());
        println!("Output format: {}", config.format);
        println!("Using elevation: {}", config.elevation);
        println!();
        println!("Loading AGD file...");
    }

    let points = agd::load_topology_data(&config.input)?;

    if config.progress {
        println!("Loaded {} topology points", points.len());
        println!();
    }

    if points.is_empty() {
        return Err(anyhow::Error::msg(format!(
            "No valid topology points found in '{}'",
            config.input.display()
        )));
    }

    let mut bar = config.progress.then(ConsoleProgressBar::stderr);
    if config.progress {
        println!("Starting {} conversion...", config.format);
    }

    let mesh = build_mesh(&points, config.elevation, bar.as_mut())?;

    match config.format {
        OutputFormat::Ply => write_ply_file(config, &mesh, bar.as_mut())?,
    }

    match bar.as_mut() {
        Some(bar) => bar.complete(Some(&format!(
            "PLY file saved: {}",
            config.output.display()
        ))),
        None => println!("Successfully exported PLY file: {}", config.output.display()),
    }

    Ok(())
}

/// Projects the points and triangulates them in the plane.
pub fn build_mesh<W: Write>(
    points: &[TopologyPoint],
    elevation: Elevation,
    mut bar: Option<&mut ConsoleProgressBar<W>>,
) -> Result<Mesh> {
    if let Some(bar) = bar.as_deref_mut() {
        bar.update(0, NUM_STAGES, Some("Finding reference point"));
    }
    let (ref_lat, ref_lon) = projection::reference_point(points)?;
    debug!("Reference point: ({ref_lat}, {ref_lon})");

    if let Some(bar) = bar.as_deref_mut() {
        bar.update(1, NUM_STAGES, Some("Converting to EPSG:4326 coordinates"));
    }
    let vertices = match bar.as_deref_mut() {
        Some(bar) => {
            let mut sink = |current: usize, total: usize| {
                bar.update(
                    1,
                    NUM_STAGES,
                    Some(&format!("Converting to EPSG:4326 ({current}/{total})")),
                );
            };
            projection::project(points, elevation, Some(&mut sink))
        }
        None => projection::project(points, elevation, None),
    };

    if let Some(bar) = bar.as_deref_mut() {
        bar.update(2, NUM_STAGES, Some("Starting Delaunay triangulation..."));
    }
    let (result, time) = measure_time(|| match bar.as_deref_mut() {
        Some(bar) => {
            let mut sink =
                |current: usize, total: usize, message: &str| bar.update(current, total, Some(message));
            survey_mesh::triangulate(&vertices, Some(&mut sink))
        }
        None => survey_mesh::triangulate(&vertices, None),
    });
    let result = result.context("Triangulation failed")?;
    if result.diagnostics.degenerate_tris > 0 {
        debug!(
            "{} near degenerate triangles kept",
            result.diagnostics.degenerate_tris
        );
    }
    info!(
        "Triangulated {} vertices into {} triangles in {} μs",
        vertices.len(),
        result.triangles.len(),
        time
    );

    if !result.diagnostics.is_clean() {
        warn!(
            "{} duplicate and {} skipped points, {} zero area and {} unresolved triangles dropped",
            result.diagnostics.duplicate_vertices,
            result.diagnostics.skipped_vertices,
            result.diagnostics.dropped_degenerate_tris,
            result.diagnostics.unresolved_tris
        );
    }

    Ok(Mesh {
        vertices,
        triangles: result.triangles,
        diagnostics: result.diagnostics,
    })
}

fn write_ply_file<W: Write>(
    config: &Config,
    mesh: &Mesh,
    mut bar: Option<&mut ConsoleProgressBar<W>>,
) -> Result<()> {
    if let Some(bar) = bar.as_deref_mut() {
        bar.update(3, NUM_STAGES, Some("Writing PLY file"));
    }

    let file = File::create(&config.output)
        .with_context(|| format!("Cannot create output file '{}'", config.output.display()))?;
    let mut writer = BufWriter::new(file);

    let written = match bar {
        Some(bar) => {
            let mut sink = |message: &str| bar.update(3, NUM_STAGES, Some(message));
            ply::write_ply(&mut writer, &mesh.vertices, &mesh.triangles, Some(&mut sink))
        }
        None => ply::write_ply(&mut writer, &mesh.vertices, &mesh.triangles, None),
    };

    written
        .and_then(|()| writer.flush().map_err(anyhow::Error::from))
        .with_context(|| format!("Cannot write PLY file '{}'", config.output.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(latitude: f64, longitude: f64, existing: f64, proposed: f64) -> TopologyPoint {
        TopologyPoint {
            latitude,
            longitude,
            existing_elevation: existing,
            proposed_elevation: proposed,
            cut_fill: existing - proposed,
            code: "TOPO".to_string(),
            comments: String::new(),
        }
    }

    fn site() -> Vec<TopologyPoint> {
        vec![
            point(30.2670, -97.7430, 150.0, 149.0),
            point(30.2670, -97.7420, 150.5, 149.5),
            point(30.2680, -97.7420, 151.0, 150.0),
            point(30.2680, -97.7430, 150.8, 149.8),
            point(30.2677, -97.7426, 150.4, 149.2),
        ]
    }

    #[test]
    fn test_build_mesh() {
        let mesh = build_mesh::<Vec<u8>>(&site(), Elevation::Proposed, None).unwrap();

        assert_eq!(mesh.vertices.len(), 5);
        assert_eq!(mesh.vertices[4], [-97.7426, 30.2677, 149.2]);
        assert_eq!(mesh.triangles.len(), 4);
        assert!(mesh.diagnostics.is_clean());
        assert!(mesh.triangles.iter().all(|tri| tri.contains(&4)));
    }

    #[test]
    fn test_build_mesh_reports_every_stage() {
        let mut bar = ConsoleProgressBar::new(Vec::new());
        build_mesh(&site(), Elevation::Existing, Some(&mut bar)).unwrap();

        let text = String::from_utf8(bar.into_inner()).unwrap();
        assert!(text.contains("(0/4) - Finding reference point"));
        assert!(text.contains("(1/4) - Converting to EPSG:4326 (5/5)"));
        assert!(text.contains("(2/4) - Starting Delaunay triangulation..."));
        assert!(text.contains("(100/100) - Delaunay triangulation complete - 4 triangles"));
    }

    #[test]
    fn test_build_mesh_of_nothing_fails() {
        assert!(build_mesh::<Vec<u8>>(&[], Elevation::Existing, None).is_err());
    }

    #[test]
    fn test_run_writes_ply() {
        let dir = std::env::temp_dir().join(format!("survey_mesh_cli_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let input = dir.join("site.agd");
        let output = dir.join("site.ply");

        let mut agd = String::from("Latitude,Longitude,Existing,Proposed,CutFill,Code,Comments\n");
        for p in site() {
            agd.push_str(&format!(
                "{},{},{},{},,{},\n",
                p.latitude, p.longitude, p.existing_elevation, p.proposed_elevation, p.code
            ));
        }
        std::fs::write(&input, agd).unwrap();

        let config = Config {
            input,
            output: output.clone(),
            format: OutputFormat::Ply,
            elevation: Elevation::Existing,
            progress: false,
        };
        run(&config).unwrap();

        let ply = std::fs::read_to_string(&output).unwrap();
        assert!(ply.contains("element vertex 5\n"));
        assert!(ply.contains("element face 4\n"));
        assert!(ply.contains("-97.742600 30.267700 150.400000\n"));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_run_rejects_missing_input() {
        let config = Config {
            input: "does/not/exist.agd".into(),
            output: "unused.ply".into(),
            format: OutputFormat::Ply,
            elevation: Elevation::Existing,
            progress: false,
        };

        let err = run(&config).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }
}
