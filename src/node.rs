use crate::utils::types::{SuperVertexIdx, VertexIdx};
use core::fmt;

/// A vertex node of the working triangulation.
///
/// A `casual node` has an index into the input vertex list.
///
/// A `super node` is one of the three synthetic corners of the bounding super-triangle. It never
/// shows up in the output.
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Copy, Clone, Debug)]
pub enum VertexNode {
    /// A node that has an index into the input vertex list.
    Casual(VertexIdx),
    /// A corner of the super-triangle, numbered `0..3`.
    Super(SuperVertexIdx),
}

impl VertexNode {
    /// Get the input index of the node.
    pub const fn idx(&self) -> Option<VertexIdx> {
        match self {
            VertexNode::Casual(idx) => Some(*idx),
            VertexNode::Super(_) => None,
        }
    }

    /// Check if the node is a super-triangle corner.
    pub const fn is_super(&self) -> bool {
        matches!(self, VertexNode::Super(_))
    }
}

impl fmt::Display for VertexNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VertexNode::Casual(v_idx) => write!(f, "Casual({v_idx})"),
            VertexNode::Super(s_idx) => write!(f, "Super({s_idx})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_casual_nodes_sort_before_super_nodes() {
        let mut nodes = vec![
            VertexNode::Super(1),
            VertexNode::Casual(7),
            VertexNode::Super(0),
            VertexNode::Casual(2),
        ];
        nodes.sort_unstable();

        assert_eq!(
            nodes,
            vec![
                VertexNode::Casual(2),
                VertexNode::Casual(7),
                VertexNode::Super(0),
                VertexNode::Super(1),
            ]
        );
        assert_eq!(nodes[0].idx(), Some(2));
        assert_eq!(nodes[3].idx(), None);
        assert!(nodes[3].is_super());
        assert_eq!(nodes[2].to_string(), "Super(0)");
    }
}
