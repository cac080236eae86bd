//! # survey_mesh
//!
//! 2D Delaunay triangulation of scattered survey points `(x, y, elevation)` via the incremental
//! Bowyer-Watson algorithm. The elevation is carried along, the triangulation happens in the
//! xy-plane.
//!
//! ```
//! let points = vec![
//!     [0.0, 0.0, 101.2],
//!     [1.0, 0.0, 101.5],
//!     [1.0, 1.0, 100.9],
//!     [0.0, 1.0, 101.1],
//! ];
//!
//! let result = survey_mesh::triangulate(&points, None).unwrap();
//! assert_eq!(result.triangles.len(), 2);
//! ```
#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::missing_const_for_fn)]

pub use node::VertexNode;
pub use triangulation::{Diagnostics, Stage, Triangulation, TriangulationResult};
pub use utils::types::{IndexedTri, Vertex3, VertexIdx};

pub mod node;
pub mod predicates;
pub mod triangulation;
pub mod trids;
mod utils;

/// Triangulates `points` with a fresh [`Triangulation`].
///
/// Each returned triple indexes into `points`. See [`Triangulation::triangulate`].
pub fn triangulate(
    points: &[Vertex3],
    progress: Option<&mut dyn FnMut(usize, usize, &str)>,
) -> anyhow::Result<TriangulationResult> {
    Triangulation::new().triangulate(points, progress)
}
