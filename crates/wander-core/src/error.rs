use thiserror::Error;

/// Errors that can occur in wander-core.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Node ID outside the graph's dense range.
    #[error("node {node} out of range for graph with {nodes} nodes")]
    NodeOutOfRange { node: u32, nodes: usize },
    /// Edge weight usage is enabled but an edge carries a non-positive weight.
    #[error("edge {src} -> {dst} has non-positive weight {weight}")]
    NonPositiveEdgeWeight { src: u32, dst: u32, weight: f32 },
    /// A node type bias was requested on a graph without node types.
    #[error("node type bias requested but the graph has no node types")]
    MissingNodeTypes,
    /// An edge type bias was requested on a graph without edge types.
    #[error("edge type bias requested but the graph has no edge types")]
    MissingEdgeTypes,
    /// A walk parameter is outside its valid domain.
    #[error("walk parameter `{name}` must be {requirement}, got {value}")]
    InvalidWalkParameter {
        name: &'static str,
        requirement: &'static str,
        value: f64,
    },
}

/// Result type alias for wander-core.
pub type Result<T> = std::result::Result<T, Error>;
