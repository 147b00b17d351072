// ============================================================================
// async-pattern-core - Library Interface
// ============================================================================
//
// Classifies method symbols against a catalog of legacy asynchronous
// programming patterns (APM, EAP, TAP, thread offloading, GUI dispatch) and
// applies batched structural rewrites to syntax trees.
//
// Parsing and symbol resolution belong to the front end, which implements
// `symbol::MethodSymbol` and builds trees with `syntax::TreeBuilder`.

pub mod catalog;
pub mod classifier;
pub mod error;
pub mod locator;
pub mod project;
pub mod qualifier;
pub mod rewriter;
pub mod symbol;
pub mod syntax;

#[cfg(test)]
pub(crate) mod test_support;

pub use catalog::{PatternCatalog, PatternFamily, PatternTag};
pub use classifier::{Classification, Classifier};
pub use error::{RewriteError, TreeError};
pub use locator::locate_declaration;
pub use project::{Project, ProjectType};
pub use qualifier::{Invocation, MethodDeclaration};
pub use rewriter::{rewrite, rewrite_with_stats, ReplacementPair, RewriteStats};
pub use symbol::{MethodIdentity, MethodInfo, MethodSymbol, Parameter};
pub use syntax::{Field, NodeId, SyntaxKind, SyntaxNode, SyntaxTree, TreeBuilder};
