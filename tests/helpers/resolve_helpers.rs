//! Helpers for building caches and running queries against them.

use dresolve::hir::{ResolutionContext, Symbol, resolve_identifier, resolve_type};
use dresolve::project::ParseCache;
use dresolve::syntax::{AstBuilder, BasicType, NodeId, StmtId, TypeDecl};

pub fn int() -> TypeDecl {
    TypeDecl::Basic(BasicType::Int)
}

pub fn basic(ty: BasicType) -> Symbol {
    Symbol::primitive(ty)
}

/// Builds a cache from `build`, which declares into a fresh builder and
/// returns the scope queries should start from.
pub fn cache_with<F>(build: F) -> (ParseCache, NodeId)
where
    F: FnOnce(&mut AstBuilder) -> NodeId,
{
    let mut b = AstBuilder::new();
    let scope = build(&mut b);
    (ParseCache::new(b.finish()), scope)
}

/// Resolves `name` from `scope`, asserting the scope stack is left balanced.
pub fn resolve_name(cache: &ParseCache, scope: NodeId, statement: Option<StmtId>, name: &str) -> Vec<Symbol> {
    let mut ctxt = ResolutionContext::new(cache, scope, statement);
    let depth = ctxt.depth();
    let found = resolve_identifier(name, &mut ctxt);
    assert_eq!(ctxt.depth(), depth, "scope stack unbalanced after resolving '{}'", name);
    found
}

/// Resolves a type declaration from `scope`.
pub fn resolve_decl(cache: &ParseCache, scope: NodeId, decl: &TypeDecl) -> Vec<Symbol> {
    let mut ctxt = ResolutionContext::new(cache, scope, None);
    let depth = ctxt.depth();
    let found = resolve_type(decl, &mut ctxt);
    assert_eq!(ctxt.depth(), depth, "scope stack unbalanced after resolving '{}'", decl);
    found
}
