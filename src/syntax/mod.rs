// ============================================================================
// Syntax arena - read-only view over front-end syntax trees
// ============================================================================
//
// Front ends lower their trees into a `SyntaxTree`: a flat arena of nodes
// addressed by `NodeId`. Leaves carry their source text (trivia included), so
// the rendering of any node is the byte-exact concatenation of its leaves.
//
// `SyntaxNode` is a cheap `(tree, id)` handle. Equality is identity: two
// handles are equal iff they point into the same tree at the same index.

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

mod builder;

pub use builder::TreeBuilder;

/// Index of a node inside its arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Node kind discriminant.
///
/// Only the shapes the qualifier and locator inspect are spelled out; anything
/// else a front end produces maps to `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SyntaxKind {
    CompilationUnit,
    NamespaceDeclaration,
    ClassDeclaration,
    MethodDeclaration,
    ConstructorDeclaration,
    PropertyDeclaration,
    AttributeList,
    Attribute,
    Modifier,
    ParameterList,
    Parameter,
    PredefinedType,
    IdentifierName,
    GenericName,
    QualifiedName,
    ArrayType,
    Block,
    ExpressionStatement,
    ReturnStatement,
    LocalDeclaration,
    InvocationExpression,
    MemberAccessExpression,
    ArgumentList,
    Argument,
    BinaryExpression,
    AssignmentExpression,
    AwaitExpression,
    LambdaExpression,
    ObjectCreationExpression,
    Identifier,
    Keyword,
    Operator,
    Punctuation,
    Literal,
    Other,
}

/// Role of a node inside its parent (a labelled child slot).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Field {
    Name,
    ReturnType,
    Type,
    ParameterList,
    Body,
    Expression,
    ArgumentList,
    Left,
    Operator,
    Right,
}

#[derive(Debug, Clone)]
pub(crate) struct NodeData {
    pub(crate) kind: SyntaxKind,
    pub(crate) field: Option<Field>,
    /// Present on leaves only.
    pub(crate) text: Option<String>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
}

/// Arena holding one syntax tree.
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    nodes: Vec<NodeData>,
    root: NodeId,
}

impl SyntaxTree {
    pub(crate) fn from_parts(nodes: Vec<NodeData>, root: NodeId) -> Self {
        Self { nodes, root }
    }

    pub fn root(&self) -> SyntaxNode<'_> {
        SyntaxNode { tree: self, id: self.root }
    }

    /// Handle for `id`, if it lies inside this arena.
    pub fn node(&self, id: NodeId) -> Option<SyntaxNode<'_>> {
        (id.index() < self.nodes.len()).then_some(SyntaxNode { tree: self, id })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Full source rendering of the tree.
    pub fn text(&self) -> String {
        self.root().text()
    }

    fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.index()]
    }
}

/// Handle to a node of a [`SyntaxTree`].
#[derive(Clone, Copy)]
pub struct SyntaxNode<'t> {
    tree: &'t SyntaxTree,
    id: NodeId,
}

impl<'t> SyntaxNode<'t> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn tree(&self) -> &'t SyntaxTree {
        self.tree
    }

    pub fn kind(&self) -> SyntaxKind {
        self.tree.data(self.id).kind
    }

    pub fn field(&self) -> Option<Field> {
        self.tree.data(self.id).field
    }

    pub fn is_token(&self) -> bool {
        self.tree.data(self.id).text.is_some()
    }

    /// Text of a leaf; `None` for interior nodes.
    pub fn token_text(&self) -> Option<&'t str> {
        self.tree.data(self.id).text.as_deref()
    }

    /// Source rendering of this node, trivia included.
    pub fn text(&self) -> String {
        if let Some(text) = self.token_text() {
            return text.to_string();
        }
        let mut out = String::new();
        for node in self.descendants() {
            if let Some(text) = node.token_text() {
                out.push_str(text);
            }
        }
        out
    }

    /// Rendering without surrounding whitespace trivia.
    pub fn trimmed_text(&self) -> String {
        self.text().trim().to_string()
    }

    pub fn is_method_declaration(&self) -> bool {
        self.kind() == SyntaxKind::MethodDeclaration
    }

    pub fn is_binary_expression(&self) -> bool {
        self.kind() == SyntaxKind::BinaryExpression
    }

    pub fn is_invocation(&self) -> bool {
        self.kind() == SyntaxKind::InvocationExpression
    }

    pub fn parent(&self) -> Option<SyntaxNode<'t>> {
        self.tree
            .data(self.id)
            .parent
            .map(|id| SyntaxNode { tree: self.tree, id })
    }

    pub fn children(&self) -> impl Iterator<Item = SyntaxNode<'t>> + 't {
        let tree = self.tree;
        tree.data(self.id)
            .children
            .iter()
            .map(move |&id| SyntaxNode { tree, id })
    }

    pub fn children_of_kind(&self, kind: SyntaxKind) -> impl Iterator<Item = SyntaxNode<'t>> + 't {
        self.children().filter(move |child| child.kind() == kind)
    }

    /// First child labelled with `field`.
    pub fn child_by_field(&self, field: Field) -> Option<SyntaxNode<'t>> {
        self.children().find(|child| child.field() == Some(field))
    }

    /// Enclosing nodes, nearest first. Does not include `self`.
    pub fn ancestors(&self) -> impl Iterator<Item = SyntaxNode<'t>> + 't {
        std::iter::successors(self.parent(), |node| node.parent())
    }

    /// Nodes below `self` in document (pre-)order. Does not include `self`.
    pub fn descendants(&self) -> Descendants<'t> {
        let tree = self.tree;
        let stack = tree.data(self.id).children.iter().rev().copied().collect();
        Descendants { tree, stack }
    }

    /// True when `self` is `other` or lies below it.
    pub fn is_within(&self, other: &SyntaxNode<'_>) -> bool {
        if !std::ptr::eq(self.tree, other.tree) {
            return false;
        }
        self.id == other.id || self.ancestors().any(|node| node.id == other.id)
    }

    /// Rendering framed by blank lines, for log output.
    pub fn to_log(&self) -> String {
        format!("\n\n{}\n\n", self.text())
    }
}

impl PartialEq for SyntaxNode<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.tree, other.tree) && self.id == other.id
    }
}

impl Eq for SyntaxNode<'_> {}

impl Hash for SyntaxNode<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::ptr::hash(self.tree, state);
        self.id.hash(state);
    }
}

impl fmt::Debug for SyntaxNode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyntaxNode")
            .field("id", &self.id)
            .field("kind", &self.kind())
            .field("text", &self.text())
            .finish()
    }
}

impl fmt::Display for SyntaxNode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}

/// Pre-order iterator returned by [`SyntaxNode::descendants`].
pub struct Descendants<'t> {
    tree: &'t SyntaxTree,
    stack: Vec<NodeId>,
}

impl<'t> Iterator for Descendants<'t> {
    type Item = SyntaxNode<'t>;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.tree.data(id).children.iter().rev().copied());
        Some(SyntaxNode { tree: self.tree, id })
    }
}
