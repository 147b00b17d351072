// ============================================================================
// Error types
// ============================================================================
//
// Configuration paths (catalog loading/compiling) use anyhow with context.
// The enums below cover conditions callers are expected to match on.

use thiserror::Error;

use crate::syntax::NodeId;

/// Errors raised by the batch rewriter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RewriteError {
    /// Two replacement pairs target the same original node.
    #[error("node {0} is targeted by more than one replacement pair")]
    DuplicateTarget(NodeId),

    #[error("rewritten tree is malformed: {0}")]
    Tree(#[from] TreeError),
}

/// Errors raised while assembling a [`crate::syntax::SyntaxTree`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("tree has no root node")]
    Empty,

    #[error("{open} node(s) were started but never finished")]
    Unclosed { open: usize },

    #[error("finish_node called without a matching start_node")]
    UnbalancedFinish,

    #[error("a second root node was added after the tree root was closed")]
    MultipleRoots,
}
