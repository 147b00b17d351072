// ============================================================================
// Batch rewriter - single-pass multi-replace over a syntax arena
// ============================================================================
//
// Replacements are keyed by the old node's `NodeId` and resolved during ONE
// traversal of the root, so nested or neighbouring targets never observe a
// tree already changed by another replacement.
//
// - a replaced node is swapped for a deep copy of its new subtree; nodes
//   below it (old or new) are not looked up again
// - pairs whose old node is outside `root` are no-ops
// - two pairs naming the same old node reject the whole call
//
// The input tree is never touched; a fresh arena is returned.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use tracing::debug;

use crate::error::RewriteError;
use crate::syntax::{Field, SyntaxNode, SyntaxTree, TreeBuilder};

/// Old node and the subtree that replaces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplacementPair<'o, 'n> {
    pub old: SyntaxNode<'o>,
    pub new: SyntaxNode<'n>,
}

impl<'o, 'n> ReplacementPair<'o, 'n> {
    pub fn new(old: SyntaxNode<'o>, new: SyntaxNode<'n>) -> Self {
        Self { old, new }
    }
}

/// Counters reported by [`rewrite_with_stats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RewriteStats {
    pub applied: usize,
    /// Pairs whose old node was not reached under `root`.
    pub skipped: usize,
}

/// Returns a copy of `root`'s subtree with every pair's old node replaced.
///
/// The output root has no parent, so it carries no `Field` label even when
/// `root` occupied one in its own tree.
pub fn rewrite(root: SyntaxNode<'_>, pairs: &[ReplacementPair<'_, '_>]) -> Result<SyntaxTree, RewriteError> {
    rewrite_with_stats(root, pairs).map(|(tree, _)| tree)
}

pub fn rewrite_with_stats(
    root: SyntaxNode<'_>,
    pairs: &[ReplacementPair<'_, '_>],
) -> Result<(SyntaxTree, RewriteStats), RewriteError> {
    let mut seen = HashSet::with_capacity(pairs.len());
    for pair in pairs {
        if !seen.insert(pair.old) {
            return Err(RewriteError::DuplicateTarget(pair.old.id()));
        }
    }

    // Only old nodes from root's arena can be reached by the traversal.
    let replacements: HashMap<_, _> = pairs
        .iter()
        .filter(|pair| same_tree(pair.old, root))
        .map(|pair| (pair.old.id(), pair.new))
        .collect();

    let mut builder = TreeBuilder::new();
    let mut applied = HashSet::new();
    let mut stack = vec![Step::Enter {
        node: root,
        field: None,
        lookup: true,
    }];

    while let Some(step) = stack.pop() {
        let (node, field, lookup) = match step {
            Step::Exit => {
                builder.finish_node();
                continue;
            }
            Step::Enter { node, field, lookup } => (node, field, lookup),
        };

        if lookup {
            if let Some(new) = replacements.get(&node.id()) {
                applied.insert(node.id());
                stack.push(Step::Enter {
                    node: *new,
                    field,
                    lookup: false,
                });
                continue;
            }
        }

        if let Some(text) = node.token_text() {
            builder.token_with(field, node.kind(), text.to_string());
            continue;
        }
        builder.start_with(field, node.kind());
        stack.push(Step::Exit);
        let children: Vec<_> = node.children().collect();
        stack.extend(children.into_iter().rev().map(|child| Step::Enter {
            node: child,
            field: child.field(),
            lookup,
        }));
    }

    for pair in pairs {
        if !same_tree(pair.old, root) || !applied.contains(&pair.old.id()) {
            debug!(node = %pair.old.id(), "replacement target not reached:{}", pair.old.to_log());
        }
    }
    let stats = RewriteStats {
        applied: applied.len(),
        skipped: pairs.len() - applied.len(),
    };
    debug!(applied = stats.applied, skipped = stats.skipped, "batch rewrite finished");

    Ok((builder.finish()?, stats))
}

enum Step<'t> {
    /// `lookup` is false below a replacement: its nodes are copied as-is.
    Enter {
        node: SyntaxNode<'t>,
        field: Option<Field>,
        lookup: bool,
    },
    Exit,
}

fn same_tree(node: SyntaxNode<'_>, root: SyntaxNode<'_>) -> bool {
    std::ptr::eq(node.tree(), root.tree())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::SyntaxKind;
    use crate::test_support::{binary_statement, class, expression, invocation_statement, method, Decl};

    fn client() -> SyntaxTree {
        class("Client", |b| {
            method(b, &Decl { name: "Start", ..Decl::default() }, |b| {
                binary_statement(b, "client.DownloadStringCompleted", "+=", "OnDownloaded");
                invocation_statement(b, "client.DownloadStringAsync");
            });
        })
    }

    fn first(tree: &SyntaxTree, kind: SyntaxKind) -> SyntaxNode<'_> {
        tree.root().descendants().find(|n| n.kind() == kind).unwrap()
    }

    #[test]
    fn test_disjoint_pairs_are_both_replaced() {
        let tree = client();
        let binary = first(&tree, SyntaxKind::BinaryExpression);
        let call = first(&tree, SyntaxKind::InvocationExpression);

        let new_binary = expression(SyntaxKind::LocalDeclaration, "var text");
        let new_call = expression(SyntaxKind::AwaitExpression, "await client.DownloadStringTaskAsync()");

        let rewritten = rewrite(
            tree.root(),
            &[
                ReplacementPair::new(binary, new_binary.root()),
                ReplacementPair::new(call, new_call.root()),
            ],
        )
        .unwrap();

        let expected = tree
            .text()
            .replace("client.DownloadStringCompleted += OnDownloaded", "var text")
            .replace("client.DownloadStringAsync()", "await client.DownloadStringTaskAsync()");
        assert_eq!(rewritten.text(), expected);
        assert!(rewritten.text().contains("var text;\nawait client.DownloadStringTaskAsync();\n"));
    }

    #[test]
    fn test_input_is_untouched() {
        let tree = client();
        let before = tree.text();
        let call = first(&tree, SyntaxKind::InvocationExpression);
        let new_call = expression(SyntaxKind::AwaitExpression, "await Task.Delay(1)");

        let rewritten = rewrite(tree.root(), &[ReplacementPair::new(call, new_call.root())]).unwrap();
        assert_ne!(rewritten.text(), before);
        assert_eq!(tree.text(), before);
    }

    #[test]
    fn test_duplicate_old_node_is_rejected() {
        let tree = client();
        let call = first(&tree, SyntaxKind::InvocationExpression);
        let a = expression(SyntaxKind::AwaitExpression, "await A()");
        let b = expression(SyntaxKind::AwaitExpression, "await B()");

        let err = rewrite(
            tree.root(),
            &[ReplacementPair::new(call, a.root()), ReplacementPair::new(call, b.root())],
        )
        .unwrap_err();
        assert_eq!(err, RewriteError::DuplicateTarget(call.id()));
    }

    #[test]
    fn test_nested_targets_use_outer_replacement() {
        let tree = client();
        let method_node = first(&tree, SyntaxKind::MethodDeclaration);
        let call = first(&tree, SyntaxKind::InvocationExpression);
        let new_method = expression(SyntaxKind::MethodDeclaration, "void Start() { }\n");
        let new_call = expression(SyntaxKind::AwaitExpression, "await X()");

        let (rewritten, stats) = rewrite_with_stats(
            tree.root(),
            &[
                ReplacementPair::new(call, new_call.root()),
                ReplacementPair::new(method_node, new_method.root()),
            ],
        )
        .unwrap();

        assert_eq!(rewritten.text(), "class Client {\nvoid Start() { }\n}\n");
        assert_eq!(stats, RewriteStats { applied: 1, skipped: 1 });
    }

    #[test]
    fn test_target_outside_root_is_noop() {
        let tree = client();
        let other = client();
        let call_elsewhere = first(&other, SyntaxKind::InvocationExpression);
        let new_call = expression(SyntaxKind::AwaitExpression, "await X()");

        let (rewritten, stats) =
            rewrite_with_stats(tree.root(), &[ReplacementPair::new(call_elsewhere, new_call.root())]).unwrap();
        assert_eq!(rewritten.text(), tree.text());
        assert_eq!(stats, RewriteStats { applied: 0, skipped: 1 });

        // sibling of the rewritten subtree
        let block = first(&tree, SyntaxKind::Block);
        let binary = first(&tree, SyntaxKind::BinaryExpression);
        let call = first(&tree, SyntaxKind::InvocationExpression);
        let (partial, stats) =
            rewrite_with_stats(binary.parent().unwrap(), &[ReplacementPair::new(call, new_call.root())]).unwrap();
        assert_eq!(partial.text(), "client.DownloadStringCompleted += OnDownloaded;\n");
        assert_eq!(stats.skipped, 1);
        assert!(block.text().contains(&partial.text()));
    }

    #[test]
    fn test_subtree_output_root_has_no_field() {
        let tree = client();
        let body = tree
            .root()
            .descendants()
            .find(|n| n.field() == Some(Field::Body))
            .unwrap();

        let rewritten = rewrite(body, &[]).unwrap();
        assert_eq!(rewritten.root().kind(), SyntaxKind::Block);
        assert_eq!(rewritten.root().field(), None);
        assert_eq!(rewritten.text(), body.text());
    }

    #[test]
    fn test_root_itself_can_be_replaced() {
        let tree = client();
        let replacement = expression(SyntaxKind::CompilationUnit, "// empty\n");
        let rewritten = rewrite(tree.root(), &[ReplacementPair::new(tree.root(), replacement.root())]).unwrap();
        assert_eq!(rewritten.text(), "// empty\n");
        assert_eq!(rewritten.len(), 1);
    }

    #[test]
    fn test_replacement_keeps_field_label() {
        let tree = client();
        let call = first(&tree, SyntaxKind::InvocationExpression);
        let target = call.child_by_field(Field::Expression).unwrap();
        let new_target = expression(SyntaxKind::MemberAccessExpression, "client.DownloadStringTaskAsync");

        let rewritten = rewrite(tree.root(), &[ReplacementPair::new(target, new_target.root())]).unwrap();
        let new_call = first(&rewritten, SyntaxKind::InvocationExpression);
        assert_eq!(
            new_call.child_by_field(Field::Expression).unwrap().text(),
            "client.DownloadStringTaskAsync"
        );
        assert!(new_call.parent().is_some());
    }

    #[test]
    fn test_replacement_from_same_tree_is_copied_once() {
        let tree = client();
        let binary = first(&tree, SyntaxKind::BinaryExpression);
        let call = first(&tree, SyntaxKind::InvocationExpression);

        // swap the two expressions using nodes of the original tree
        let (rewritten, stats) = rewrite_with_stats(
            tree.root(),
            &[ReplacementPair::new(binary, call), ReplacementPair::new(call, binary)],
        )
        .unwrap();
        assert_eq!(stats.applied, 2);
        assert!(rewritten
            .text()
            .contains("client.DownloadStringAsync();\nclient.DownloadStringCompleted += OnDownloaded;\n"));
    }
}
