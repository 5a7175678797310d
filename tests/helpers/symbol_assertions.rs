//! Symbol assertion helpers for HIR tests.

use dresolve::hir::{Symbol, TemplateArgument};
use dresolve::syntax::NodeId;

/// Assert exactly one result and return it.
pub fn assert_single(found: &[Symbol]) -> &Symbol {
    assert_eq!(found.len(), 1, "expected exactly one result, got {:?}", found);
    &found[0]
}

/// Assert the result declares `node`.
pub fn assert_defined_by(symbol: &Symbol, node: NodeId) {
    assert_eq!(
        symbol.definition_node(),
        Some(node),
        "expected {:?} to be declared by {:?}",
        symbol,
        node
    );
}

/// The type a member or bound parameter stands for.
pub fn type_of(symbol: &Symbol) -> Option<&Symbol> {
    symbol.strip_members()
}

/// The type bound to `parameter` in the symbol's deduced bindings.
pub fn deduced_type(symbol: &Symbol, parameter: NodeId) -> Option<Symbol> {
    symbol
        .deduced()
        .and_then(|d| d.get(parameter))
        .and_then(|tp| tp.base.as_deref())
        .cloned()
}

/// The items of a tuple bound to `parameter`.
pub fn deduced_tuple(symbol: &Symbol, parameter: NodeId) -> Option<Vec<TemplateArgument>> {
    match deduced_type(symbol, parameter).map(|s| s.kind) {
        Some(dresolve::hir::SymbolKind::Tuple(items)) => Some(items),
        _ => None,
    }
}
