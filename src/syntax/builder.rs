//! Event-style builder for [`SyntaxTree`]
//!
//! Front ends (and the rewriter) emit `start` / `token` / `finish` events in
//! document order. Misuse is recorded and reported once by [`TreeBuilder::finish`],
//! so event chains stay free of intermediate `Result`s.

use super::{Field, NodeData, NodeId, SyntaxKind, SyntaxTree};
use crate::error::TreeError;

#[derive(Debug, Default)]
pub struct TreeBuilder {
    nodes: Vec<NodeData>,
    stack: Vec<NodeId>,
    root: Option<NodeId>,
    error: Option<TreeError>,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens an interior node.
    pub fn start_node(&mut self, kind: SyntaxKind) -> &mut Self {
        self.start_with(None, kind)
    }

    /// Opens an interior node occupying `field` in its parent.
    pub fn start_field(&mut self, field: Field, kind: SyntaxKind) -> &mut Self {
        self.start_with(Some(field), kind)
    }

    /// Adds a leaf.
    pub fn token(&mut self, kind: SyntaxKind, text: impl Into<String>) -> &mut Self {
        self.token_with(None, kind, text.into())
    }

    /// Adds a leaf occupying `field` in its parent.
    pub fn field_token(&mut self, field: Field, kind: SyntaxKind, text: impl Into<String>) -> &mut Self {
        self.token_with(Some(field), kind, text.into())
    }

    /// Closes the innermost open node.
    pub fn finish_node(&mut self) -> &mut Self {
        if self.stack.pop().is_none() && self.error.is_none() {
            self.error = Some(TreeError::UnbalancedFinish);
        }
        self
    }

    pub fn finish(self) -> Result<SyntaxTree, TreeError> {
        if let Some(err) = self.error {
            return Err(err);
        }
        if !self.stack.is_empty() {
            return Err(TreeError::Unclosed { open: self.stack.len() });
        }
        let root = self.root.ok_or(TreeError::Empty)?;
        Ok(SyntaxTree::from_parts(self.nodes, root))
    }

    pub(crate) fn start_with(&mut self, field: Option<Field>, kind: SyntaxKind) -> &mut Self {
        if let Some(id) = self.push(field, kind, None) {
            self.stack.push(id);
        }
        self
    }

    pub(crate) fn token_with(&mut self, field: Option<Field>, kind: SyntaxKind, text: String) -> &mut Self {
        self.push(field, kind, Some(text));
        self
    }

    fn push(&mut self, field: Option<Field>, kind: SyntaxKind, text: Option<String>) -> Option<NodeId> {
        if self.error.is_some() {
            return None;
        }
        let parent = self.stack.last().copied();
        if parent.is_none() && self.root.is_some() {
            self.error = Some(TreeError::MultipleRoots);
            return None;
        }

        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(NodeData {
            kind,
            field,
            text,
            parent,
            children: Vec::new(),
        });
        match parent {
            Some(parent) => self.nodes[parent.index()].children.push(id),
            None => self.root = Some(id),
        }
        Some(id)
    }
}
