use thiserror::Error;

/// Errors that can occur in wander-embed.
///
/// The three variants are deliberately disjoint: configuration problems are
/// caught by validation before any walk is generated, graph constraints are
/// checked against the configuration right after, and resource failures can
/// only arise while allocating embedding tables.
#[derive(Error, Debug)]
pub enum Error {
    /// A parameter is outside its valid domain. Raised before any work begins.
    #[error("invalid configuration: {0}")]
    Config(String),
    /// The graph violates a requirement of the selected configuration.
    #[error("graph constraint violated: {0}")]
    GraphConstraint(String),
    /// Embedding table allocation failed (RAM or mapped file).
    #[error("embedding table allocation failed: {0}")]
    Resource(#[from] std::io::Error),
}

/// Result type alias for wander-embed.
pub type Result<T> = std::result::Result<T, Error>;
