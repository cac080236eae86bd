use core::fmt;

use crate::{predicates::Circumcircle, utils::types::TriIteratorIdx, VertexNode};

use super::tri_data_structure::TriDataStructure;

/// An edge between two nodes, directed as it appears in its triangle.
#[derive(PartialEq, Eq, Hash, Copy, Clone, Debug)]
pub struct Edge {
    pub from: VertexNode,
    pub to: VertexNode,
}

impl Edge {
    pub const fn new(from: VertexNode, to: VertexNode) -> Self {
        Self { from, to }
    }

    /// The undirected identity of this edge, i.e. `ab` and `ba` share the same key.
    pub fn key(&self) -> Self {
        if self.from <= self.to {
            *self
        } else {
            Self::new(self.to, self.from)
        }
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -- {}", self.from, self.to)
    }
}

#[derive(Clone, Copy)]
pub struct TriIterator<'a> {
    pub tds: &'a TriDataStructure,
    pub idx: usize,
}

impl<'a> TriIterator<'a> {
    pub const fn new(tds: &'a TriDataStructure, idx: TriIteratorIdx) -> Self {
        Self { tds, idx }
    }

    /// Returns the index of this.
    pub const fn idx(&self) -> TriIteratorIdx {
        self.idx
    }

    /// Get the nodes of this triangle.
    pub fn nodes(&self) -> [VertexNode; 3] {
        self.tds.tri_nodes[self.idx]
    }

    /// Get the edges `n0n1`, `n1n2` and `n2n0` of this triangle.
    pub fn edges(&self) -> [Edge; 3] {
        let [n0, n1, n2] = self.nodes();
        [Edge::new(n0, n1), Edge::new(n1, n2), Edge::new(n2, n0)]
    }

    /// The cached circumcircle, `None` if the triangle is degenerate.
    pub fn circumcircle(&self) -> Option<Circumcircle> {
        self.tds.circumcircles[self.idx]
    }

    /// Check if one of the nodes is a super-triangle corner.
    pub fn is_super(&self) -> bool {
        self.nodes().iter().any(|node| node.is_super())
    }
}

impl fmt::Display for TriIterator<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [n0, n1, n2] = self.nodes();
        write!(f, "Triangle {}: {} -> {} -> {}", self.idx(), n0, n1, n2)
    }
}
