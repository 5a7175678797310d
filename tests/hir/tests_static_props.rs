//! Built-in property tests: resolution through member access, constant
//! values and listing.

use dresolve::hir::{
    EvalError, Evaluator, ResolutionContext, Symbol, SymbolKind, SymbolValue, list_properties, resolve_type, try_resolve_property,
};
use dresolve::project::ParseCache;
use dresolve::syntax::{AstBuilder, BasicType, Expr, TypeDecl};

use crate::helpers::resolve_helpers::*;
use crate::helpers::symbol_assertions::*;

/// Fails the test if any expression gets evaluated.
struct Forbidden;

impl Evaluator for Forbidden {
    fn evaluate_value(&self, expr: &Expr, _: &mut ResolutionContext<'_>) -> Result<SymbolValue, EvalError> {
        panic!("unexpected evaluation of {}", expr);
    }

    fn evaluate_type(&self, expr: &Expr, _: &mut ResolutionContext<'_>) -> Option<Symbol> {
        panic!("unexpected type evaluation of {}", expr);
    }
}

fn empty_module() -> (ParseCache, dresolve::syntax::NodeId) {
    cache_with(|b| b.module("app"))
}

#[test]
fn test_fixed_array_length_needs_no_evaluation() {
    let (cache, m) = empty_module();
    let mut ctxt = ResolutionContext::new(&cache, m, None).with_evaluator(&Forbidden);
    let five = Symbol::fixed_array(Some(basic(BasicType::Int)), 5);

    let length = try_resolve_property(&mut ctxt, &five, "length").expect("length is a property of arrays");
    let member = length.as_member().expect("properties resolve to members");
    assert_eq!(member.constant, Some(SymbolValue::int(5)));
    assert_eq!(type_of(&length), Some(&basic(BasicType::Int)));
}

#[test]
fn test_property_reached_through_variable() {
    let mut b = AstBuilder::new();
    let m = b.module("app");
    b.variable(m, "buffer", Some(TypeDecl::Basic(BasicType::Ubyte).fixed_array(Expr::int(16))), None);
    let cache = ParseCache::new(b.finish());

    let found = resolve_decl(&cache, m, &TypeDecl::dotted("buffer.length"));
    let member = assert_single(&found).as_member().expect("member");
    assert_eq!(member.constant.as_ref().and_then(SymbolValue::as_int), Some(16));
}

#[test]
fn test_primitive_bounds_through_type_access() {
    let (cache, m) = empty_module();
    let mut ctxt = ResolutionContext::new(&cache, m, None);
    let decl = TypeDecl::Basic(BasicType::Short).member("max");
    let found = resolve_type(&decl, &mut ctxt);
    let max = assert_single(&found);
    assert_eq!(type_of(max), Some(&basic(BasicType::Short)));
    let value = max.as_member().and_then(|m| m.constant.as_ref()).and_then(SymbolValue::as_int);
    assert_eq!(value, Some(i16::MAX as i128));
}

#[test]
fn test_associative_length_falls_back_to_ulong() {
    let (cache, m) = empty_module();
    let mut ctxt = ResolutionContext::new(&cache, m, None);
    let aa = Symbol::assoc_array(Some(Symbol::string()), Some(basic(BasicType::Int)));

    let length = try_resolve_property(&mut ctxt, &aa, "length").expect("length");
    assert_eq!(type_of(&length), Some(&basic(BasicType::Ulong)));
    assert!(ctxt.errors().is_empty());
}

#[test]
fn test_associative_length_prefers_declared_size_t() {
    let mut b = AstBuilder::new();
    let m = b.module("app");
    b.alias(m, "size_t", TypeDecl::Basic(BasicType::Uint));
    let cache = ParseCache::new(b.finish());
    let mut ctxt = ResolutionContext::new(&cache, m, None);
    let aa = Symbol::assoc_array(Some(Symbol::string()), Some(basic(BasicType::Int)));

    let length = try_resolve_property(&mut ctxt, &aa, "length").expect("length");
    // The alias resolves through to its target, tagged with the alias.
    let ty = type_of(&length).expect("typed");
    assert_eq!(ty.kind, SymbolKind::Primitive(BasicType::Uint));
    assert_eq!(ty.alias_tags().count(), 1);
}

#[test]
fn test_listing_respects_static_only() {
    let (cache, _) = empty_module();
    let array = Symbol::array(Some(basic(BasicType::Int)));

    let names = |static_only| -> Vec<String> {
        list_properties(cache.ast(), &array, static_only)
            .into_iter()
            .map(|d| d.name.to_string())
            .collect()
    };
    let all = names(false);
    assert!(all.iter().any(|n| n == "sizeof"));
    assert!(all.iter().any(|n| n == "length"));
    assert!(all.iter().any(|n| n == "dup"));

    let static_only = names(true);
    assert!(static_only.iter().any(|n| n == "sizeof"));
    assert!(!static_only.iter().any(|n| n == "length"));
}

#[test]
fn test_unknown_property_is_not_found() {
    let (cache, m) = empty_module();
    let mut ctxt = ResolutionContext::new(&cache, m, None);
    assert!(try_resolve_property(&mut ctxt, &basic(BasicType::Int), "length").is_none());
}
