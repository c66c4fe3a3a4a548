use crate::{Error, Result};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};

/// Dense node identifier. Nodes are the range `0..node_count`.
pub type NodeId = u32;

/// Node or edge type label.
pub type TypeId = u16;

#[derive(Debug, Clone, Default)]
struct NodeData {
    node_type: Option<TypeId>,
}

#[derive(Debug, Clone)]
struct EdgeData {
    weight: Option<f32>,
    edge_type: Option<TypeId>,
}

/// One outgoing edge as seen by the walk sampler.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Destination node.
    pub node: NodeId,
    /// Edge weight; 1.0 when the edge carries none.
    pub weight: f32,
    /// Edge type, if the edge carries one.
    pub edge_type: Option<TypeId>,
}

/// A directed graph over a dense integer node range, read by the walk sampler.
///
/// Uses petgraph's directed graph internally; node IDs are the petgraph node
/// indices, fixed at construction so walks and embedding tables can address
/// nodes as plain array rows.
///
/// Edge weights are stored as given; whether they must be strictly positive
/// depends on the run configuration, so [`WalkGraph::validate_positive_weights`]
/// is checked at pipeline start rather than on insertion.
///
/// # Example
///
/// ```rust
/// use wander_core::WalkGraph;
///
/// let mut graph = WalkGraph::with_nodes(3);
/// graph.add_edge(0, 1).unwrap();
/// graph.add_weighted_edge(1, 2, 2.5).unwrap();
///
/// assert_eq!(graph.node_count(), 3);
/// assert_eq!(graph.edge_count(), 2);
/// assert_eq!(graph.out_degree(1), 1);
/// ```
#[derive(Debug, Clone)]
pub struct WalkGraph {
    graph: DiGraph<NodeData, EdgeData>,
    has_edge_weights: bool,
    has_node_types: bool,
    has_edge_types: bool,
}

impl WalkGraph {
    /// Create a graph with `nodes` nodes and no edges.
    pub fn with_nodes(nodes: usize) -> Self {
        let mut graph = DiGraph::with_capacity(nodes, nodes);
        for _ in 0..nodes {
            graph.add_node(NodeData::default());
        }
        Self {
            graph,
            has_edge_weights: false,
            has_node_types: false,
            has_edge_types: false,
        }
    }

    fn index(&self, node: NodeId) -> Result<NodeIndex> {
        let idx = node as usize;
        if idx >= self.graph.node_count() {
            return Err(Error::NodeOutOfRange {
                node,
                nodes: self.graph.node_count(),
            });
        }
        Ok(NodeIndex::new(idx))
    }

    /// Add an unweighted, untyped directed edge.
    pub fn add_edge(&mut self, src: NodeId, dst: NodeId) -> Result<()> {
        self.add_edge_full(src, dst, None, None)
    }

    /// Add a weighted directed edge.
    ///
    /// The weight is stored as given; positivity is enforced at run start
    /// when edge weight usage is enabled.
    pub fn add_weighted_edge(&mut self, src: NodeId, dst: NodeId, weight: f32) -> Result<()> {
        self.add_edge_full(src, dst, Some(weight), None)
    }

    /// Add a directed edge with optional weight and edge type.
    pub fn add_edge_full(
        &mut self,
        src: NodeId,
        dst: NodeId,
        weight: Option<f32>,
        edge_type: Option<TypeId>,
    ) -> Result<()> {
        let src_idx = self.index(src)?;
        let dst_idx = self.index(dst)?;
        self.has_edge_weights |= weight.is_some();
        self.has_edge_types |= edge_type.is_some();
        self.graph.add_edge(src_idx, dst_idx, EdgeData { weight, edge_type });
        Ok(())
    }

    /// Assign a type label to a node.
    pub fn set_node_type(&mut self, node: NodeId, node_type: TypeId) -> Result<()> {
        let idx = self.index(node)?;
        self.graph[idx].node_type = Some(node_type);
        self.has_node_types = true;
        Ok(())
    }

    /// Type label of a node, if assigned.
    pub fn node_type(&self, node: NodeId) -> Option<TypeId> {
        self.graph
            .node_weight(NodeIndex::new(node as usize))
            .and_then(|d| d.node_type)
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of directed edges.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Out-degree of a node. O(d).
    pub fn out_degree(&self, node: NodeId) -> usize {
        self.graph
            .edges(NodeIndex::new(node as usize))
            .count()
    }

    /// Iterate outgoing edges of a node. O(d).
    pub fn neighbors(&self, node: NodeId) -> impl Iterator<Item = Neighbor> + '_ {
        self.graph.edges(NodeIndex::new(node as usize)).map(|e| Neighbor {
            node: e.target().index() as NodeId,
            weight: e.weight().weight.unwrap_or(1.0),
            edge_type: e.weight().edge_type,
        })
    }

    /// Whether any edge carries a weight.
    pub fn has_edge_weights(&self) -> bool {
        self.has_edge_weights
    }

    /// Whether any node carries a type label.
    pub fn has_node_types(&self) -> bool {
        self.has_node_types
    }

    /// Whether any edge carries a type label.
    pub fn has_edge_types(&self) -> bool {
        self.has_edge_types
    }

    /// Check that every stored edge weight is strictly positive.
    ///
    /// Called before any walk when a run enables edge weight usage.
    pub fn validate_positive_weights(&self) -> Result<()> {
        for edge in self.graph.edge_references() {
            if let Some(w) = edge.weight().weight {
                if !(w > 0.0) {
                    return Err(Error::NonPositiveEdgeWeight {
                        src: edge.source().index() as NodeId,
                        dst: edge.target().index() as NodeId,
                        weight: w,
                    });
                }
            }
        }
        Ok(())
    }

    /// Compute statistics about the graph.
    pub fn stats(&self) -> WalkGraphStats {
        let node_count = self.node_count();
        let edge_count = self.edge_count();
        let avg_out_degree = if node_count > 0 {
            edge_count as f64 / node_count as f64
        } else {
            0.0
        };
        WalkGraphStats {
            node_count,
            edge_count,
            avg_out_degree,
            has_edge_weights: self.has_edge_weights,
            has_node_types: self.has_node_types,
            has_edge_types: self.has_edge_types,
        }
    }
}

/// Statistics about a walk graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalkGraphStats {
    /// Number of nodes.
    pub node_count: usize,
    /// Number of directed edges.
    pub edge_count: usize,
    /// Average out-degree.
    pub avg_out_degree: f64,
    /// Whether any edge carries a weight.
    pub has_edge_weights: bool,
    /// Whether any node carries a type label.
    pub has_node_types: bool,
    /// Whether any edge carries a type label.
    pub has_edge_types: bool,
}
