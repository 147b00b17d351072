//! Declaration locator
//!
//! Picks the method declaration of a symbol among its declaring nodes. Partial
//! methods have several; the first one in provider order wins and carries no
//! further meaning.

use crate::qualifier::MethodDeclaration;
use crate::symbol::MethodSymbol;

/// First declaring node shaped like a method declaration, if any.
///
/// Metadata-only symbols and symbols declared by other shapes (properties,
/// lambdas, ...) yield `None`.
pub fn locate_declaration<S: MethodSymbol + ?Sized>(method: &S) -> Option<MethodDeclaration<'_>> {
    method
        .declaring_nodes()
        .into_iter()
        .find_map(MethodDeclaration::cast)
}
