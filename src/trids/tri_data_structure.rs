use std::collections::HashMap;

use super::tri_iterator::{Edge, TriIterator};
use crate::{predicates::Circumcircle, utils::types::TriIteratorIdx, VertexNode};

use anyhow::{Ok as HowOk, Result as HowResult};

/// The working set of triangles during insertion.
///
/// Triangles live in slots of an arena. Removing a triangle only flags its slot and pushes it
/// onto a free list; the next added triangle reuses the most recently freed slot.
///
/// ```ignore
/// slot:     0        1        2        3
/// nodes: [a b c]  [d e f]  [- - -]  [g h i]
/// alive:   true     true    false     true
/// free:  [2]
/// ```
#[derive(Debug, Default)]
pub struct TriDataStructure {
    pub(crate) tri_nodes: Vec<[VertexNode; 3]>,
    /// Cached circumcircle per slot, `None` for degenerate triangles.
    pub(crate) circumcircles: Vec<Option<Circumcircle>>,
    pub(crate) alive: Vec<bool>,
    free_slots: Vec<TriIteratorIdx>,
    pub num_tris: usize,
    /// The number of removed triangles whose slots have not been reused yet.
    pub num_deleted_tris: usize,
}

impl TriDataStructure {
    pub const fn new() -> Self {
        Self {
            tri_nodes: Vec::new(),
            circumcircles: Vec::new(),
            alive: Vec::new(),
            free_slots: Vec::new(),
            num_tris: 0,
            num_deleted_tris: 0,
        }
    }

    /// Drop all triangles but keep the allocations.
    pub fn clear(&mut self) {
        self.tri_nodes.clear();
        self.circumcircles.clear();
        self.alive.clear();
        self.free_slots.clear();
        self.num_tris = 0;
        self.num_deleted_tris = 0;
    }

    /// Add a triangle and retrieve its slot index.
    pub fn add_tri(
        &mut self,
        nodes: [VertexNode; 3],
        circumcircle: Option<Circumcircle>,
    ) -> TriIteratorIdx {
        self.num_tris += 1;

        if let Some(idx) = self.free_slots.pop() {
            self.tri_nodes[idx] = nodes;
            self.circumcircles[idx] = circumcircle;
            self.alive[idx] = true;
            self.num_deleted_tris -= 1;
            return idx;
        }

        self.tri_nodes.push(nodes);
        self.circumcircles.push(circumcircle);
        self.alive.push(true);

        self.tri_nodes.len() - 1
    }

    /// Remove a live triangle, its slot becomes free for reuse.
    pub fn remove_tri(&mut self, idx: TriIteratorIdx) -> HowResult<()> {
        if !self.is_alive(idx) {
            return Err(anyhow::Error::msg(format!(
                "Cannot remove triangle {idx}, it is out of bounds or already removed!"
            )));
        }

        self.alive[idx] = false;
        self.free_slots.push(idx);
        self.num_tris -= 1;
        self.num_deleted_tris += 1;

        HowOk(())
    }

    pub fn get_tri(&self, idx: TriIteratorIdx) -> HowResult<TriIterator<'_>> {
        if !self.is_alive(idx) {
            return Err(anyhow::Error::msg(format!(
                "Triangle {idx} is out of bounds or removed!"
            )));
        }

        HowOk(TriIterator::new(self, idx))
    }

    pub fn is_alive(&self, idx: TriIteratorIdx) -> bool {
        self.alive.get(idx).copied().unwrap_or(false)
    }

    /// Iterate the live triangles in slot order.
    pub fn tris(&self) -> impl Iterator<Item = TriIterator<'_>> + '_ {
        self.alive
            .iter()
            .enumerate()
            .filter(|(_, &alive)| alive)
            .map(move |(idx, _)| TriIterator::new(self, idx))
    }

    pub const fn num_tris(&self) -> usize {
        self.num_tris
    }

    /// The number of live triangles with at least one super-triangle corner.
    pub fn num_super_tris(&self) -> usize {
        self.tris().filter(|tri| tri.is_super()).count()
    }

    /// Checks the structural soundness of the working set.
    ///
    /// Every live triangle has three distinct nodes, every edge is shared by at most two
    /// triangles and the counters agree with the slot flags.
    pub fn is_sound(&self) -> bool {
        let num_alive = self.alive.iter().filter(|&&alive| alive).count();
        if num_alive != self.num_tris || self.alive.len() != self.num_tris + self.num_deleted_tris {
            log::error!(
                "Triangle counters out of sync: {} alive, {} counted, {} deleted",
                num_alive,
                self.num_tris,
                self.num_deleted_tris
            );
            return false;
        }

        let mut edge_counts: HashMap<Edge, usize> = HashMap::new();

        for tri in self.tris() {
            let [n0, n1, n2] = tri.nodes();
            if n0 == n1 || n1 == n2 || n2 == n0 {
                log::error!("Triangle with repeated node: {tri}");
                return false;
            }

            for edge in tri.edges() {
                *edge_counts.entry(edge.key()).or_insert(0) += 1;
            }
        }

        match edge_counts.iter().find(|(_, &count)| count > 2) {
            Some((edge, count)) => {
                log::error!("Edge {edge} is shared by {count} triangles");
                false
            }
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predicates::circumcircle;

    const A: VertexNode = VertexNode::Casual(0);
    const B: VertexNode = VertexNode::Casual(1);
    const C: VertexNode = VertexNode::Casual(2);
    const D: VertexNode = VertexNode::Casual(3);

    fn unit_circle() -> Option<Circumcircle> {
        circumcircle(&[0.0, 0.0, 0.0], &[1.0, 0.0, 0.0], &[0.0, 1.0, 0.0])
    }

    #[test]
    fn test_removed_slots_are_reused_lifo() {
        let mut tds = TriDataStructure::new();
        let t0 = tds.add_tri([A, B, C], unit_circle());
        let t1 = tds.add_tri([A, C, D], None);
        let t2 = tds.add_tri([B, C, D], None);

        tds.remove_tri(t0).unwrap();
        tds.remove_tri(t2).unwrap();
        assert_eq!(tds.num_tris(), 1);
        assert_eq!(tds.num_deleted_tris, 2);

        assert_eq!(tds.add_tri([A, B, D], None), t2);
        assert_eq!(tds.add_tri([A, B, C], None), t0);
        assert_eq!(tds.num_deleted_tris, 0);
        assert_eq!(tds.tris().map(|tri| tri.idx()).collect::<Vec<_>>(), vec![t0, t1, t2]);
        assert!(tds.is_sound());
    }

    #[test]
    fn test_remove_twice_fails() {
        let mut tds = TriDataStructure::new();
        let t0 = tds.add_tri([A, B, C], unit_circle());

        assert!(tds.remove_tri(t0).is_ok());
        assert!(tds.remove_tri(t0).is_err());
        assert!(tds.remove_tri(42).is_err());
        assert!(tds.get_tri(t0).is_err());
    }

    #[test]
    fn test_overused_edge_is_unsound() {
        let mut tds = TriDataStructure::new();
        tds.add_tri([A, B, C], None);
        tds.add_tri([B, A, D], None);
        assert!(tds.is_sound());

        tds.add_tri([A, B, VertexNode::Super(0)], None);
        assert!(!tds.is_sound());
    }

    #[test]
    fn test_clear() {
        let mut tds = TriDataStructure::new();
        tds.add_tri([A, B, VertexNode::Super(2)], None);
        assert_eq!(tds.num_super_tris(), 1);

        tds.clear();
        assert_eq!(tds.num_tris(), 0);
        assert_eq!(tds.tris().count(), 0);
    }
}
