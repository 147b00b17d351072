// ============================================================================
// Syntax qualifier - declaration-level and call-site predicates
// ============================================================================
//
// Facts the resolved symbol cannot answer: source modifiers, attributes and
// the declared parameter shape live on the declaration syntax; the EAP
// convention is recognised from the call site's enclosing method.
//
// All text comparisons ignore surrounding whitespace trivia.

use crate::syntax::{Field, SyntaxKind, SyntaxNode};

/// Typed view over a `MethodDeclaration` node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MethodDeclaration<'t>(SyntaxNode<'t>);

impl<'t> MethodDeclaration<'t> {
    pub fn cast(node: SyntaxNode<'t>) -> Option<Self> {
        node.is_method_declaration().then_some(Self(node))
    }

    pub fn syntax(&self) -> SyntaxNode<'t> {
        self.0
    }

    pub fn name(&self) -> Option<String> {
        self.0.child_by_field(Field::Name).map(|n| n.trimmed_text())
    }

    pub fn modifiers(&self) -> impl Iterator<Item = SyntaxNode<'t>> + 't {
        self.0.children_of_kind(SyntaxKind::Modifier)
    }

    /// Modifier list as written, e.g. `public static async`.
    pub fn modifiers_text(&self) -> String {
        self.modifiers()
            .map(|m| m.text())
            .collect::<String>()
            .trim()
            .to_string()
    }

    pub fn return_type(&self) -> Option<SyntaxNode<'t>> {
        self.0.child_by_field(Field::ReturnType)
    }

    pub fn return_type_text(&self) -> String {
        self.return_type().map(|n| n.trimmed_text()).unwrap_or_default()
    }

    pub fn attribute_lists(&self) -> impl Iterator<Item = SyntaxNode<'t>> + 't {
        self.0.children_of_kind(SyntaxKind::AttributeList)
    }

    pub fn parameter_list(&self) -> Option<SyntaxNode<'t>> {
        self.0.child_by_field(Field::ParameterList)
    }

    pub fn parameters(&self) -> Vec<SyntaxNode<'t>> {
        self.parameter_list()
            .map(|list| list.children_of_kind(SyntaxKind::Parameter).collect())
            .unwrap_or_default()
    }

    pub fn body(&self) -> Option<SyntaxNode<'t>> {
        self.0.child_by_field(Field::Body)
    }

    /// Declared `async`, or declared to return some `Task`.
    pub fn is_async(&self) -> bool {
        self.modifiers_text().contains("async") || self.return_type_text().contains("Task")
    }

    /// Carries a `[TestMethod]` attribute.
    pub fn is_test_method(&self) -> bool {
        self.attribute_lists().any(|list| {
            list.children_of_kind(SyntaxKind::Attribute)
                .any(|attr| attr.text().contains("TestMethod"))
        })
    }

    /// Event handler shape: some parameter type ends with `EventArgs`.
    pub fn has_event_args_parameter(&self) -> bool {
        self.parameters()
            .iter()
            .any(|param| parameter_type_text(param).is_some_and(|ty| ty.ends_with("EventArgs")))
    }

    /// Callback shape of APM / ThreadPool: exactly one `object` parameter.
    pub fn has_object_state_parameter(&self) -> bool {
        match self.parameters().as_slice() {
            [only] => parameter_type_text(only).as_deref() == Some("object"),
            _ => false,
        }
    }

    pub fn returns_void(&self) -> bool {
        self.return_type_text() == "void"
    }
}

fn parameter_type_text(param: &SyntaxNode<'_>) -> Option<String> {
    param.child_by_field(Field::Type).map(|ty| ty.trimmed_text())
}

/// Typed view over an `InvocationExpression` node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Invocation<'t>(SyntaxNode<'t>);

impl<'t> Invocation<'t> {
    pub fn cast(node: SyntaxNode<'t>) -> Option<Self> {
        node.is_invocation().then_some(Self(node))
    }

    pub fn syntax(&self) -> SyntaxNode<'t> {
        self.0
    }

    /// The invoked member expression, e.g. `client.DownloadStringAsync`.
    pub fn expression(&self) -> Option<SyntaxNode<'t>> {
        self.0.child_by_field(Field::Expression)
    }

    pub fn enclosing_methods(&self) -> impl Iterator<Item = MethodDeclaration<'t>> + 't {
        self.0.ancestors().filter_map(MethodDeclaration::cast)
    }

    /// Event-based Asynchronous Pattern call: an `XAsync` call inside a method
    /// that also touches some `XCompleted` member in a binary expression.
    pub fn is_eap(&self) -> bool {
        let calls_async = self
            .expression()
            .is_some_and(|expr| expr.trimmed_text().to_lowercase().ends_with("async"));
        if !calls_async {
            return false;
        }

        self.enclosing_methods().any(|method| {
            method
                .syntax()
                .descendants()
                .filter(|node| node.is_binary_expression())
                .filter_map(|binary| binary.child_by_field(Field::Left))
                .any(|left| left.trimmed_text().to_lowercase().ends_with("completed"))
        })
    }
}
