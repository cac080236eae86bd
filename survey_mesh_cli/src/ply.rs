use std::io::Write;

use anyhow::{Ok, Result};
use survey_mesh::{IndexedTri, Vertex3};

/// Elements between two progress reports.
const REPORT_INTERVAL: usize = 1000;

/// Writes an ASCII PLY mesh with EPSG:4326 coordinates.
///
/// `progress` receives a message every thousand vertices and faces.
pub fn write_ply<W: Write>(
    writer: &mut W,
    vertices: &[Vertex3],
    triangles: &[IndexedTri],
    mut progress: Option<&mut dyn FnMut(&str)>,
) -> Result<()> {
    writeln!(writer, "ply")?;
    writeln!(writer, "format ascii 1.0")?;
    writeln!(writer, "comment Coordinate system: EPSG:4326 (WGS84)")?;
    writeln!(writer, "comment X = Longitude (decimal degrees)")?;
    writeln!(writer, "comment Y = Latitude (decimal degrees)")?;
    writeln!(writer, "comment Z = Elevation (meters)")?;
    writeln!(writer, "element vertex {}", vertices.len())?;
    writeln!(writer, "property float x")?;
    writeln!(writer, "property float y")?;
    writeln!(writer, "property float z")?;
    writeln!(writer, "element face {}", triangles.len())?;
    writeln!(writer, "property list uchar int vertex_indices")?;
    writeln!(writer, "end_header")?;

    for (idx, [x, y, z]) in vertices.iter().enumerate() {
        writeln!(writer, "{x:.6} {y:.6} {z:.6}")?;

        if idx % REPORT_INTERVAL == 0 || idx == vertices.len() - 1 {
            if let Some(progress) = progress.as_deref_mut() {
                progress(&format!(
                    "Writing PLY file - vertices ({}/{})",
                    idx + 1,
                    vertices.len()
                ));
            }
        }
    }

    for (idx, [i, j, k]) in triangles.iter().enumerate() {
        writeln!(writer, "3 {i} {j} {k}")?;

        if idx % REPORT_INTERVAL == 0 || idx == triangles.len() - 1 {
            if let Some(progress) = progress.as_deref_mut() {
                progress(&format!(
                    "Writing PLY file - faces ({}/{})",
                    idx + 1,
                    triangles.len()
                ));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_ply() {
        let vertices = vec![
            [-97.743057, 30.267153, 150.25],
            [-97.74299, 30.267201, 150.1],
            [-97.7431, 30.26725, 151.0],
        ];
        let triangles = vec![[0, 1, 2]];
        let mut messages = Vec::new();
        let mut sink = |message: &str| messages.push(message.to_string());

        let mut out = Vec::new();
        write_ply(&mut out, &vertices, &triangles, Some(&mut sink)).unwrap();
        let text = String::from_utf8(out).unwrap();

        let expected = "\
ply
format ascii 1.0
comment Coordinate system: EPSG:4326 (WGS84)
comment X = Longitude (decimal degrees)
comment Y = Latitude (decimal degrees)
comment Z = Elevation (meters)
element vertex 3
property float x
property float y
property float z
element face 1
property list uchar int vertex_indices
end_header
-97.743057 30.267153 150.250000
-97.742990 30.267201 150.100000
-97.743100 30.267250 151.000000
3 0 1 2
";
        assert_eq!(text, expected);
        assert_eq!(
            messages,
            vec![
                "Writing PLY file - vertices (1/3)",
                "Writing PLY file - vertices (3/3)",
                "Writing PLY file - faces (1/1)",
            ]
        );
    }

    #[test]
    fn test_empty_mesh_has_a_header() {
        let mut out = Vec::new();
        write_ply(&mut out, &[], &[], None).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("element vertex 0\n"));
        assert!(text.ends_with("end_header\n"));
    }
}
