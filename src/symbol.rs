// ============================================================================
// Method symbols - the code model seam
// ============================================================================
//
// The compiler front end owns symbols; this crate only reads them through
// `MethodSymbol`. `MethodInfo` is a plain owned implementation for front ends
// that lower their data eagerly (and for tests).

use serde::{Deserialize, Serialize};

use crate::syntax::SyntaxNode;

/// Return types starting with this prefix are Task-returning.
pub const TASK_TYPE_PREFIX: &str = "System.Threading.Tasks.Task";

/// Declared parameter of a method symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    /// Type rendering, e.g. `System.AsyncCallback` or `object`
    pub type_name: String,
}

impl Parameter {
    pub fn new(name: &str, type_name: &str) -> Self {
        Self {
            name: name.to_string(),
            type_name: type_name.to_string(),
        }
    }

    pub fn simple_type_name(&self) -> &str {
        simple_type_name(&self.type_name)
    }
}

/// Read-only view of a method symbol supplied by the front end.
pub trait MethodSymbol {
    /// Display rendering: qualified name plus parameter list,
    /// e.g. `Foo.Bar.EndDownload(System.IAsyncResult)`.
    fn identity(&self) -> &str;

    fn returns_void(&self) -> bool;

    /// Full rendering of the return type, e.g. `System.Threading.Tasks.Task<string>`.
    fn return_type(&self) -> &str;

    fn parameters(&self) -> &[Parameter];

    /// Declaring syntax nodes in provider order; empty for metadata-only symbols.
    fn declaring_nodes(&self) -> Vec<SyntaxNode<'_>>;

    fn declaring_node_count(&self) -> usize {
        self.declaring_nodes().len()
    }

    fn returns_task(&self) -> bool {
        !self.returns_void() && self.return_type().starts_with(TASK_TYPE_PREFIX)
    }

    fn method_identity(&self) -> MethodIdentity {
        MethodIdentity::parse(self.identity())
    }
}

impl<S: MethodSymbol + ?Sized> MethodSymbol for &S {
    fn identity(&self) -> &str {
        (**self).identity()
    }

    fn returns_void(&self) -> bool {
        (**self).returns_void()
    }

    fn return_type(&self) -> &str {
        (**self).return_type()
    }

    fn parameters(&self) -> &[Parameter] {
        (**self).parameters()
    }

    fn declaring_nodes(&self) -> Vec<SyntaxNode<'_>> {
        (**self).declaring_nodes()
    }

    fn declaring_node_count(&self) -> usize {
        (**self).declaring_node_count()
    }
}

/// Owned method symbol.
#[derive(Debug, Clone, Default)]
pub struct MethodInfo<'t> {
    pub identity: String,
    pub returns_void: bool,
    pub return_type: String,
    pub parameters: Vec<Parameter>,
    pub declaring_nodes: Vec<SyntaxNode<'t>>,
}

impl<'t> MethodInfo<'t> {
    /// `returns_void` is derived from the return type rendering.
    pub fn new(identity: &str, return_type: &str) -> Self {
        Self {
            identity: identity.to_string(),
            returns_void: matches!(return_type, "void" | "System.Void"),
            return_type: return_type.to_string(),
            parameters: Vec::new(),
            declaring_nodes: Vec::new(),
        }
    }

    pub fn with_parameter(mut self, name: &str, type_name: &str) -> Self {
        self.parameters.push(Parameter::new(name, type_name));
        self
    }

    pub fn with_declaration(mut self, node: SyntaxNode<'t>) -> Self {
        self.declaring_nodes.push(node);
        self
    }
}

impl MethodSymbol for MethodInfo<'_> {
    fn identity(&self) -> &str {
        &self.identity
    }

    fn returns_void(&self) -> bool {
        self.returns_void
    }

    fn return_type(&self) -> &str {
        &self.return_type
    }

    fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    fn declaring_nodes(&self) -> Vec<SyntaxNode<'_>> {
        self.declaring_nodes.clone()
    }

    fn declaring_node_count(&self) -> usize {
        self.declaring_nodes.len()
    }
}

// ============================================================================
// MethodIdentity - structured view of an identity rendering
// ============================================================================

/// `namespace` / `containing_type` / `member` split of an identity rendering.
///
/// Generic argument lists are stripped from the type and member parts; the
/// parameter list (if any) is kept verbatim in `signature`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodIdentity {
    pub namespace: String,
    pub containing_type: String,
    pub member: String,
    pub signature: String,
}

impl MethodIdentity {
    pub fn parse(rendering: &str) -> Self {
        let rendering = rendering.trim();
        let (name_part, signature) = match find_top_level(rendering, '(') {
            Some(pos) => (&rendering[..pos], &rendering[pos..]),
            None => (rendering, ""),
        };

        let mut segments = split_top_level(name_part, '.');
        let member = segments.pop().map(strip_generic_args).unwrap_or_default();
        let containing_type = segments.pop().map(strip_generic_args).unwrap_or_default();

        Self {
            namespace: segments.join("."),
            containing_type: containing_type.to_string(),
            member: member.to_string(),
            signature: signature.to_string(),
        }
    }

    /// `namespace.Type.Member`, skipping empty parts.
    pub fn qualified_name(&self) -> String {
        [
            self.namespace.as_str(),
            self.containing_type.as_str(),
            self.member.as_str(),
        ]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(".")
    }
}

/// Simple name of a type rendering: no namespace, no generic arguments.
///
/// `System.Threading.Tasks.Task<string>` → `Task`, `System.IAsyncResult` → `IAsyncResult`.
pub fn simple_type_name(type_name: &str) -> &str {
    let base = type_name.trim();
    let base = base.split('<').next().unwrap_or(base);
    base.rsplit('.').next().unwrap_or(base)
}

/// Byte offset of the first `needle` outside `<...>` nesting.
fn find_top_level(text: &str, needle: char) -> Option<usize> {
    let mut depth = 0usize;
    for (i, ch) in text.char_indices() {
        match ch {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            c if c == needle && depth == 0 => return Some(i),
            _ => {}
        }
    }
    None
}

/// Splits on `sep` outside `<...>` nesting.
///
/// A doubled separator keeps the second one on the next part, so
/// `Foo.Bar..ctor` splits into `Foo`, `Bar`, `.ctor`.
fn split_top_level(text: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, ch) in text.char_indices() {
        match ch {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            c if c == sep && depth == 0 => {
                if i == start && !parts.is_empty() {
                    continue;
                }
                parts.push(&text[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    if start < text.len() {
        parts.push(&text[start..]);
    }
    parts
}

fn strip_generic_args(segment: &str) -> &str {
    segment.split('<').next().unwrap_or(segment).trim()
}
