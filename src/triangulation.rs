use std::{collections::HashMap, time::Instant};

use crate::{
    predicates::{
        approx_eq_2d, in_circle_2d, is_point_in_circumcircle, orient_2d, Circumcircle, Triangle,
    },
    trids::{
        tri_data_structure::TriDataStructure,
        tri_iterator::{Edge, TriIterator},
    },
    utils::types::{IndexedTri, TriIteratorIdx, Vertex3, VertexIdx},
    VertexNode,
};
use anyhow::{Ok, Result};
use log::{debug, error, trace, warn};
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};

/// The number of units a run reports to its progress sink.
pub const PROGRESS_TOTAL: usize = 100;

/// The phases of a run, in order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Stage {
    #[default]
    Idle,
    Bootstrapping,
    Inserting,
    Purging,
    IndexResolution,
    Done,
}

/// Anomalies of a run. None of them fail the run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Diagnostics {
    /// Input vertices that coincide with an earlier vertex in the plane and were not inserted.
    pub duplicate_vertices: usize,
    /// Input vertices that no circumcircle contained, so there was no cavity to insert them into.
    pub skipped_vertices: usize,
    /// Output triangles whose circumcircle determinant is below [`crate::predicates::EPSILON`].
    /// They are kept, but were never invalidated during insertion.
    pub degenerate_tris: usize,
    /// Output candidates with exactly collinear vertices, i.e. zero area, that were dropped.
    pub dropped_degenerate_tris: usize,
    /// Triangles dropped because one of their vertices did not resolve to an input index.
    pub unresolved_tris: usize,
}

impl Diagnostics {
    /// True if every input vertex made it into the triangulation and nothing was dropped.
    pub const fn is_clean(&self) -> bool {
        self.duplicate_vertices == 0
            && self.skipped_vertices == 0
            && self.dropped_degenerate_tris == 0
            && self.unresolved_tris == 0
    }
}

/// The output of a run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TriangulationResult {
    /// Counter-clockwise index triples into the input vertices.
    pub triangles: Vec<IndexedTri>,
    pub diagnostics: Diagnostics,
}

/// Forwards milestones to the caller's sink, if there is one.
struct Progress<'a> {
    sink: Option<&'a mut dyn FnMut(usize, usize, &str)>,
}

impl Progress<'_> {
    fn report<F: FnOnce() -> String>(&mut self, current: usize, message: F) {
        if let Some(sink) = self.sink.as_deref_mut() {
            sink(current, PROGRESS_TOTAL, &message());
        }
    }
}

/// Scratch buffers of the cavity computation, reused across insertions.
#[derive(Default)]
struct Cavity {
    bad_tris: Vec<TriIteratorIdx>,
    edge_counts: HashMap<Edge, usize>,
    boundary: Vec<Edge>,
}

/// Computes the super-triangle of a point set, ignoring elevation.
///
/// The bounding box is enlarged by `2 * max(width, height)` to every side but the top corner,
/// which sits centered above the box. Returns `None` if all vertices share the same position.
pub fn super_triangle(vertices: &[Vertex3]) -> Option<[Vertex3; 3]> {
    let mut min = [f64::INFINITY, f64::INFINITY];
    let mut max = [f64::NEG_INFINITY, f64::NEG_INFINITY];

    for v in vertices {
        min[0] = min[0].min(v[0]);
        min[1] = min[1].min(v[1]);
        max[0] = max[0].max(v[0]);
        max[1] = max[1].max(v[1]);
    }

    let width = max[0] - min[0];
    let height = max[1] - min[1];
    let margin = width.max(height) * 2.0;

    if margin <= 0.0 {
        return None;
    }

    Some([
        [min[0] - margin, min[1] - margin, 0.0],
        [max[0] + margin, min[1] - margin, 0.0],
        [(min[0] + max[0]) / 2.0, max[1] + margin, 0.0],
    ])
}

/// A 2D Delaunay triangulation of 3D survey points via Bowyer-Watson insertion.
///
/// Elevation is carried along but plays no role in the triangulation.
///
/// ```
/// use survey_mesh::Triangulation;
///
/// let vertices = vec![
///     [0.0, 0.0, 10.2],
///     [-0.5, 1.0, 10.4],
///     [0.0, 2.5, 11.0],
///     [2.0, 3.0, 11.3],
///     [4.0, 2.5, 10.9],
///     [5.0, 1.5, 10.1],
///     [4.5, 0.5, 9.8],
///     [2.5, -0.5, 9.9],
///     [1.5, 1.5, 10.5],
///     [3.0, 1.0, 10.0],
/// ];
///
/// let mut triangulation = Triangulation::new();
/// let result = triangulation.triangulate(&vertices, None).unwrap();
///
/// assert!(!result.triangles.is_empty());
/// assert!(result.diagnostics.is_clean());
/// assert_eq!(triangulation.is_delaunay_p(), 1.0);
/// ```
pub struct Triangulation {
    pub tds: TriDataStructure,
    vertices: Vec<Vertex3>,
    super_vertices: [Vertex3; 3],
    triangles: Vec<IndexedTri>,
    stage: Stage,
    /// Vertices that are part of the triangulation, in insertion order.
    pub used_vertices: Vec<VertexIdx>,
    /// Vertices that are not part of the triangulation, due to an earlier coinciding vertex.
    duplicate_vertices: Vec<VertexIdx>,
    /// Vertices that are not part of the triangulation, due to an empty cavity.
    skipped_vertices: Vec<VertexIdx>,
    diagnostics: Diagnostics,
    time_bootstrapping: u128,
    time_scanning: u128,
    time_retriangulating: u128,
    time_finalizing: u128,
}

impl Default for Triangulation {
    fn default() -> Self {
        Self::new()
    }
}

impl Triangulation {
    pub const fn new() -> Self {
        Self {
            tds: TriDataStructure::new(),
            vertices: Vec::new(),
            super_vertices: [[0.0; 3]; 3],
            triangles: Vec::new(),
            stage: Stage::Idle,
            used_vertices: Vec::new(),
            duplicate_vertices: Vec::new(),
            skipped_vertices: Vec::new(),
            diagnostics: Diagnostics {
                duplicate_vertices: 0,
                skipped_vertices: 0,
                degenerate_tris: 0,
                dropped_degenerate_tris: 0,
                unresolved_tris: 0,
            },
            time_bootstrapping: 0,
            time_scanning: 0,
            time_retriangulating: 0,
            time_finalizing: 0,
        }
    }

    /// Triangulates `vertices` and returns the triangles as indices into `vertices`.
    ///
    /// Vertices are inserted strictly in the given order. Fewer than three vertices yield an empty
    /// result. Non-finite coordinates are rejected.
    ///
    /// `progress` is called with `(current, total, message)` at the start, every tenth vertex,
    /// the purge, the index resolution and the end of the run. It is not kept afterwards.
    pub fn triangulate(
        &mut self,
        vertices: &[Vertex3],
        progress: Option<&mut dyn FnMut(usize, usize, &str)>,
    ) -> Result<TriangulationResult> {
        self.reset();
        let mut progress = Progress { sink: progress };

        if vertices.len() < 3 {
            debug!(
                "Needs at least 3 vertices to triangulate, got {}",
                vertices.len()
            );
            self.stage = Stage::Done;
            return Ok(TriangulationResult::default());
        }

        if let Some(idx) = vertices
            .iter()
            .position(|v| v.iter().any(|c| !c.is_finite()))
        {
            return Err(anyhow::Error::msg(format!(
                "Vertex {idx} has a non-finite coordinate: {:?}",
                vertices[idx]
            )));
        }

        progress.report(0, || "Initializing Delaunay triangulation...".to_string());

        self.vertices = vertices.to_vec();
        if !self.bootstrap() {
            warn!("All vertices share the same position, there is nothing to triangulate");
            self.stage = Stage::Done;
            progress.report(PROGRESS_TOTAL, || {
                "Delaunay triangulation complete - 0 triangles".to_string()
            });
            return Ok(TriangulationResult::default());
        }

        progress.report(5, || "Processing points...".to_string());

        self.stage = Stage::Inserting;
        let num_vertices = self.vertices.len();
        debug!("Inserting {num_vertices} vertices");

        let mut cavity = Cavity::default();
        for v_idx in 0..num_vertices {
            self.insert_vertex(v_idx, &mut cavity)?;

            if v_idx % 10 == 0 || v_idx == num_vertices - 1 {
                let num_tris = self.tds.num_tris();
                progress.report(5 + v_idx * 85 / num_vertices, || {
                    format!(
                        "Processing point {}/{} - {} triangles",
                        v_idx + 1,
                        num_vertices,
                        num_tris
                    )
                });
            }
        }

        let now = Instant::now();
        self.triangles = self.finalize(&mut progress);
        self.time_finalizing = now.elapsed().as_micros();

        self.diagnostics.duplicate_vertices = self.duplicate_vertices.len();
        self.diagnostics.skipped_vertices = self.skipped_vertices.len();
        self.stage = Stage::Done;

        progress.report(PROGRESS_TOTAL, || {
            format!(
                "Delaunay triangulation complete - {} triangles",
                self.triangles.len()
            )
        });

        debug!(
            "Triangulated {} vertices into {} triangles: {:?}",
            num_vertices,
            self.triangles.len(),
            self.diagnostics
        );
        self.log_time();

        Ok(TriangulationResult {
            triangles: self.triangles.clone(),
            diagnostics: self.diagnostics,
        })
    }

    fn reset(&mut self) {
        self.tds.clear();
        self.vertices.clear();
        self.super_vertices = [[0.0; 3]; 3];
        self.triangles.clear();
        self.stage = Stage::Idle;
        self.used_vertices.clear();
        self.duplicate_vertices.clear();
        self.skipped_vertices.clear();
        self.diagnostics = Diagnostics::default();
        self.time_bootstrapping = 0;
        self.time_scanning = 0;
        self.time_retriangulating = 0;
        self.time_finalizing = 0;
    }

    /// Seeds the working set with the super-triangle. Returns `false` if there is none.
    fn bootstrap(&mut self) -> bool {
        self.stage = Stage::Bootstrapping;
        let now = Instant::now();

        let Some(super_vertices) = super_triangle(&self.vertices) else {
            return false;
        };
        self.super_vertices = super_vertices;

        let nodes = [
            VertexNode::Super(0),
            VertexNode::Super(1),
            VertexNode::Super(2),
        ];
        let circle = self.circle_of(nodes);
        self.tds.add_tri(nodes, circle);

        self.time_bootstrapping = now.elapsed().as_micros();
        trace!(
            "Super triangle {:?} inserted in {:.4} µs",
            self.super_vertices,
            self.time_bootstrapping
        );
        true
    }

    /// Inserts the input vertex `v_idx`, i.e. removes every triangle whose circumcircle contains
    /// it and connects the boundary of the resulting cavity to it.
    fn insert_vertex(&mut self, v_idx: VertexIdx, cavity: &mut Cavity) -> Result<()> {
        let v = self.vertices[v_idx];

        if let Some(&first) = self
            .used_vertices
            .iter()
            .find(|&&u_idx| approx_eq_2d(&self.vertices[u_idx], &v))
        {
            warn!("Vertex {v_idx} coincides with vertex {first}, skipping it");
            self.duplicate_vertices.push(v_idx);
            return Ok(());
        }

        let now = Instant::now();
        cavity.bad_tris.clear();
        cavity.bad_tris.extend(
            self.tds
                .tris()
                .filter(|tri| is_point_in_circumcircle(&v, tri.circumcircle().as_ref()))
                .map(|tri| tri.idx()),
        );
        self.time_scanning += now.elapsed().as_micros();

        if cavity.bad_tris.is_empty() {
            warn!("No circumcircle contains vertex {v_idx}, skipping it");
            self.skipped_vertices.push(v_idx);
            return Ok(());
        }

        let now = Instant::now();

        // an edge is on the cavity boundary iff exactly one bad triangle has it
        cavity.edge_counts.clear();
        for &tri_idx in &cavity.bad_tris {
            for edge in self.tds.get_tri(tri_idx)?.edges() {
                *cavity.edge_counts.entry(edge.key()).or_insert(0) += 1;
            }
        }

        cavity.boundary.clear();
        for &tri_idx in &cavity.bad_tris {
            for edge in self.tds.get_tri(tri_idx)?.edges() {
                if cavity.edge_counts.get(&edge.key()) == Some(&1) {
                    cavity.boundary.push(edge);
                }
            }
        }

        for &tri_idx in &cavity.bad_tris {
            self.tds.remove_tri(tri_idx)?;
        }

        let node = VertexNode::Casual(v_idx);
        for edge in &cavity.boundary {
            let nodes = [edge.from, edge.to, node];
            let circle = self.circle_of(nodes);
            if circle.is_none() {
                trace!("Degenerate triangle {} -> {} -> {}", nodes[0], nodes[1], nodes[2]);
            }
            self.tds.add_tri(nodes, circle);
        }

        self.used_vertices.push(v_idx);
        self.time_retriangulating += now.elapsed().as_micros();

        trace!(
            "Inserted vertex {v_idx}: {} bad triangles, {} boundary edges",
            cavity.bad_tris.len(),
            cavity.boundary.len()
        );
        Ok(())
    }

    /// Purges the super-triangle and resolves the remaining triangles to input indices.
    fn finalize(&mut self, progress: &mut Progress<'_>) -> Vec<IndexedTri> {
        self.stage = Stage::Purging;
        progress.report(90, || "Removing super triangle...".to_string());

        let super_vertices = self.super_vertices;
        let kept: Vec<[VertexNode; 3]> = self
            .tds
            .tris()
            .filter(|tri| !tri.is_super())
            .map(|tri| tri.nodes())
            .filter(|&nodes| !self.triangle_of(nodes).contains_any_vertex(&super_vertices))
            .collect();

        debug!(
            "Purged {} of {} triangles connected to the super triangle",
            self.tds.num_tris() - kept.len(),
            self.tds.num_tris()
        );

        self.stage = Stage::IndexResolution;
        progress.report(95, || "Converting to indices...".to_string());

        let mut triangles = Vec::with_capacity(kept.len());
        for nodes in kept {
            let Some([i, j, k]) = self.resolve_tri(nodes) else {
                warn!(
                    "Dropping triangle {} -> {} -> {}, a vertex does not resolve to an input index",
                    nodes[0], nodes[1], nodes[2]
                );
                self.diagnostics.unresolved_tris += 1;
                continue;
            };

            let [a, b, c] = [i, j, k].map(|idx| self.vertices[idx]);
            let orientation = orient_2d(&a, &b, &c);

            if orientation == 0.0 {
                warn!("Dropping zero area triangle [{i}, {j}, {k}]");
                self.diagnostics.dropped_degenerate_tris += 1;
                continue;
            }

            if Triangle::new(a, b, c).is_degenerate() {
                debug!("Keeping near degenerate triangle [{i}, {j}, {k}]");
                self.diagnostics.degenerate_tris += 1;
            }

            if orientation > 0.0 {
                triangles.push([i, j, k]);
            } else {
                triangles.push([i, k, j]);
            }
        }

        triangles
    }

    /// Resolves a node to the index of its input vertex.
    ///
    /// Coinciding input vertices are never inserted twice, so a casual node always refers to the
    /// first input vertex at its position.
    pub fn resolve_index(&self, node: VertexNode) -> Option<VertexIdx> {
        node.idx().filter(|&idx| idx < self.vertices.len())
    }

    fn resolve_tri(&self, nodes: [VertexNode; 3]) -> Option<IndexedTri> {
        let [n0, n1, n2] = nodes;
        Some([
            self.resolve_index(n0)?,
            self.resolve_index(n1)?,
            self.resolve_index(n2)?,
        ])
    }

    /// The coordinates of a node.
    pub fn node_vertex(&self, node: VertexNode) -> Vertex3 {
        match node {
            VertexNode::Casual(idx) => self.vertices[idx],
            VertexNode::Super(idx) => self.super_vertices[idx],
        }
    }

    fn triangle_of(&self, nodes: [VertexNode; 3]) -> Triangle {
        let [n0, n1, n2] = nodes;
        Triangle::new(
            self.node_vertex(n0),
            self.node_vertex(n1),
            self.node_vertex(n2),
        )
    }

    fn circle_of(&self, nodes: [VertexNode; 3]) -> Option<Circumcircle> {
        self.triangle_of(nodes).circumcircle()
    }

    /// Check if an output triangle has a used vertex strictly inside its circumcircle.
    fn violates_delaunay(&self, tri: &IndexedTri) -> bool {
        let [a, b, c] = tri.map(|idx| self.vertices[idx]);

        self.used_vertices.iter().any(|&v_idx| {
            // skip the vertices of the triangle itself
            if tri.contains(&v_idx) {
                return false;
            }
            in_circle_2d(&a, &b, &c, &self.vertices[v_idx]) > 0.0
        })
    }

    /// Check if the output is Delaunay, i.e. no used vertex lies strictly inside the circumcircle
    /// of an output triangle.
    ///
    /// Returns if the validation is valid and the share of non-violating triangles.
    pub fn is_delaunay(&self) -> Result<(bool, f64)> {
        if self.stage != Stage::Done {
            return Err(anyhow::Error::msg(
                "Cannot validate a triangulation that has not been computed!",
            ));
        }

        if self.triangles.is_empty() {
            return Ok((true, 1.0));
        }

        let mut num_violated_tris = 0;
        for tri in &self.triangles {
            if self.violates_delaunay(tri) {
                error!("Vertex in circumcircle of triangle {tri:?}");
                num_violated_tris += 1;
            }
        }

        Ok((
            num_violated_tris == 0,
            1.0 - num_violated_tris as f64 / self.triangles.len() as f64,
        ))
    }

    /// Checks the Delaunay property in a parallel manner using `rayon`s `par_iter()`.
    ///
    /// Returns the share of non-violating triangles.
    #[must_use]
    pub fn is_delaunay_p(&self) -> f64 {
        if self.triangles.is_empty() {
            return 1.0;
        }

        let num_violated_tris = self
            .triangles
            .par_iter()
            .filter(|tri| self.violates_delaunay(tri))
            .count();

        1.0 - num_violated_tris as f64 / self.triangles.len() as f64
    }

    /// Checks the working set and the output for structural errors.
    pub fn is_sound(&self) -> bool {
        if !self.tds.is_sound() {
            error!("Triangulation data structure is not sound!");
            return false;
        }

        let num_vertices = self.vertices.len();
        let bad_tri = self.triangles.iter().find(|[i, j, k]| {
            i == j || j == k || k == i || [i, j, k].iter().any(|&&idx| idx >= num_vertices)
        });

        match bad_tri {
            Some(tri) => {
                error!("Output triangle {tri:?} has repeated or out of range indices");
                false
            }
            None => true,
        }
    }

    /// The output triangles of the last run.
    pub fn triangles(&self) -> &[IndexedTri] {
        &self.triangles
    }

    pub fn vertices(&self) -> &[Vertex3] {
        &self.vertices
    }

    /// The corners of the super-triangle of the last run.
    pub const fn super_vertices(&self) -> &[Vertex3; 3] {
        &self.super_vertices
    }

    pub const fn stage(&self) -> Stage {
        self.stage
    }

    pub const fn diagnostics(&self) -> Diagnostics {
        self.diagnostics
    }

    pub const fn tds(&self) -> &TriDataStructure {
        &self.tds
    }

    /// The number of output triangles.
    pub fn num_tris(&self) -> usize {
        self.triangles.len()
    }

    /// The number of live triangles in the working set, including the ones at the super-triangle.
    pub const fn num_all_tris(&self) -> usize {
        self.tds.num_tris()
    }

    /// The live working set triangles, including the ones at the super-triangle.
    pub fn working_tris(&self) -> impl Iterator<Item = TriIterator<'_>> + '_ {
        self.tds.tris()
    }

    pub fn num_used_vertices(&self) -> usize {
        self.used_vertices.len()
    }

    pub fn num_duplicate_vertices(&self) -> usize {
        self.duplicate_vertices.len()
    }

    pub fn num_skipped_vertices(&self) -> usize {
        self.skipped_vertices.len()
    }

    fn log_time(&self) {
        debug!("-------------------------------------------");
        debug!("Time elapsed:");
        debug!("Bootstrap computed in {} μs", self.time_bootstrapping);
        debug!("Scans computed in {} μs", self.time_scanning);
        debug!("Cavities computed in {} μs", self.time_retriangulating);
        debug!("Finalization computed in {} μs", self.time_finalizing);
    }
}
