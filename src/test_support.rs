//! Fixture helpers shared by unit tests: emit C#-shaped syntax through the
//! tree builder with realistic trivia.

use crate::syntax::{Field, SyntaxKind, SyntaxTree, TreeBuilder};

#[derive(Debug, Clone, Copy)]
pub(crate) struct Decl<'a> {
    pub attributes: &'a [&'a str],
    pub modifiers: &'a [&'a str],
    pub return_type: &'a str,
    pub name: &'a str,
    /// `(type, name)` pairs
    pub parameters: &'a [(&'a str, &'a str)],
}

impl Default for Decl<'_> {
    fn default() -> Self {
        Self {
            attributes: &[],
            modifiers: &[],
            return_type: "void",
            name: "Run",
            parameters: &[],
        }
    }
}

pub(crate) fn type_kind(text: &str) -> SyntaxKind {
    match text {
        "void" | "object" | "string" | "int" | "bool" => SyntaxKind::PredefinedType,
        t if t.ends_with("[]") => SyntaxKind::ArrayType,
        t if t.contains('<') => SyntaxKind::GenericName,
        t if t.contains('.') => SyntaxKind::QualifiedName,
        _ => SyntaxKind::IdentifierName,
    }
}

/// `class <name> { ... }` as the tree root.
pub(crate) fn class(name: &str, members: impl FnOnce(&mut TreeBuilder)) -> SyntaxTree {
    let mut b = TreeBuilder::new();
    b.start_node(SyntaxKind::CompilationUnit)
        .start_node(SyntaxKind::ClassDeclaration)
        .token(SyntaxKind::Keyword, "class ")
        .field_token(Field::Name, SyntaxKind::Identifier, name)
        .token(SyntaxKind::Punctuation, " {\n");
    members(&mut b);
    b.token(SyntaxKind::Punctuation, "}\n")
        .finish_node()
        .finish_node();
    b.finish().unwrap()
}

pub(crate) fn method(b: &mut TreeBuilder, decl: &Decl<'_>, body: impl FnOnce(&mut TreeBuilder)) {
    b.start_node(SyntaxKind::MethodDeclaration);
    for attribute in decl.attributes {
        b.start_node(SyntaxKind::AttributeList)
            .token(SyntaxKind::Punctuation, "[")
            .field_token(Field::Name, SyntaxKind::Attribute, *attribute)
            .token(SyntaxKind::Punctuation, "]\n")
            .finish_node();
    }
    for modifier in decl.modifiers {
        b.token(SyntaxKind::Modifier, format!("{modifier} "));
    }
    b.field_token(Field::ReturnType, type_kind(decl.return_type), format!("{} ", decl.return_type))
        .field_token(Field::Name, SyntaxKind::Identifier, decl.name)
        .start_field(Field::ParameterList, SyntaxKind::ParameterList)
        .token(SyntaxKind::Punctuation, "(");
    for (i, (ty, name)) in decl.parameters.iter().enumerate() {
        if i > 0 {
            b.token(SyntaxKind::Punctuation, ", ");
        }
        b.start_node(SyntaxKind::Parameter)
            .field_token(Field::Type, type_kind(ty), format!("{ty} "))
            .field_token(Field::Name, SyntaxKind::Identifier, *name)
            .finish_node();
    }
    b.token(SyntaxKind::Punctuation, ")\n")
        .finish_node()
        .start_field(Field::Body, SyntaxKind::Block)
        .token(SyntaxKind::Punctuation, "{\n");
    body(b);
    b.token(SyntaxKind::Punctuation, "}\n")
        .finish_node()
        .finish_node();
}

/// `<target>();`
pub(crate) fn invocation_statement(b: &mut TreeBuilder, target: &str) {
    b.start_node(SyntaxKind::ExpressionStatement);
    invocation(b, target);
    b.token(SyntaxKind::Punctuation, ";\n").finish_node();
}

pub(crate) fn invocation(b: &mut TreeBuilder, target: &str) {
    b.start_node(SyntaxKind::InvocationExpression)
        .field_token(Field::Expression, SyntaxKind::MemberAccessExpression, target)
        .start_field(Field::ArgumentList, SyntaxKind::ArgumentList)
        .token(SyntaxKind::Punctuation, "(")
        .token(SyntaxKind::Punctuation, ")")
        .finish_node()
        .finish_node();
}

/// `<left> <op> <right>;`
pub(crate) fn binary_statement(b: &mut TreeBuilder, left: &str, op: &str, right: &str) {
    b.start_node(SyntaxKind::ExpressionStatement)
        .start_node(SyntaxKind::BinaryExpression)
        .field_token(Field::Left, SyntaxKind::MemberAccessExpression, left)
        .field_token(Field::Operator, SyntaxKind::Operator, format!(" {op} "))
        .field_token(Field::Right, SyntaxKind::IdentifierName, right)
        .finish_node()
        .token(SyntaxKind::Punctuation, ";\n")
        .finish_node();
}

/// Standalone expression tree, used as a replacement subtree.
pub(crate) fn expression(kind: SyntaxKind, text: &str) -> SyntaxTree {
    let mut b = TreeBuilder::new();
    b.token(kind, text);
    b.finish().unwrap()
}
