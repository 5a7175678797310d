//! Type resolution tests: aliases, member chains, UFCS, opDispatch,
//! foreach variables, `typeof(return)` and tuple indexing.

use dresolve::hir::{
    AggregateKind, ResolutionContext, ResolutionError, ResolutionOptions, Symbol, SymbolKind, SymbolTag,
    resolve_identifier, resolve_type,
};
use dresolve::base::constants::MAX_BASE_RESOLUTION_DEPTH;
use dresolve::project::ParseCache;
use dresolve::syntax::{
    AstBuilder, BasicType, ClassKind, Expr, ForeachAggregate, TemplateArg, TemplateParameterKind, TypeDecl,
    TypeOfTarget,
};

use crate::helpers::resolve_helpers::*;
use crate::helpers::symbol_assertions::*;

// =============================================================================
// ALIASES
// =============================================================================

#[test]
fn test_alias_cycle_terminates() {
    let mut b = AstBuilder::new();
    let m = b.module("app");
    let a = b.alias(m, "A", TypeDecl::ident("B"));
    b.alias(m, "B", TypeDecl::ident("C"));
    b.alias(m, "C", TypeDecl::ident("A"));
    let cache = ParseCache::new(b.finish());

    let mut ctxt = ResolutionContext::new(&cache, m, None);
    let found = resolve_identifier("A", &mut ctxt);
    let symbol = assert_single(&found);
    assert!(matches!(symbol.kind, SymbolKind::Alias { node, base: None } if node == a));
    assert_eq!(ctxt.depth(), 1);
    assert!(ctxt.guard().is_idle());
}

#[test]
fn test_alias_chain_reaches_target() {
    let (cache, m) = cache_with(|b| {
        let m = b.module("app");
        b.alias(m, "Outer", TypeDecl::ident("Inner"));
        b.alias(m, "Inner", TypeDecl::Basic(BasicType::Long).pointer());
        m
    });
    let found = resolve_name(&cache, m, None, "Outer");
    let symbol = assert_single(&found);
    assert_eq!(symbol.kind, SymbolKind::Pointer(Some(Box::new(basic(BasicType::Long)))));
    assert_eq!(symbol.alias_tags().count(), 2);
}

#[test]
fn test_alias_to_overloads_keeps_every_overload() {
    let (cache, m) = cache_with(|b| {
        let m = b.module("app");
        let first = b.method(m, "over", Some(int()));
        b.parameter(first, "x", int());
        let second = b.method(m, "over", Some(int()));
        b.parameter(second, "x", TypeDecl::Basic(BasicType::Double));
        b.alias(m, "both", TypeDecl::ident("over"));
        m
    });
    let found = resolve_name(&cache, m, None, "both");
    assert_eq!(found.len(), 2);
    assert!(found.iter().all(|s| s.is_member() && s.base().is_none()));
}

// =============================================================================
// MEMBER CHAINS
// =============================================================================

#[test]
fn test_dotted_chain_through_variable_types() {
    let mut b = AstBuilder::new();
    let m = b.module("app");
    let engine = b.aggregate(m, ClassKind::Struct, "Engine");
    let power = b.variable(engine, "power", Some(TypeDecl::Basic(BasicType::Float)), None);
    let car = b.aggregate(m, ClassKind::Struct, "Car");
    b.variable(car, "engine", Some(TypeDecl::ident("Engine")), None);
    b.variable(m, "car", Some(TypeDecl::ident("Car")), None);
    let cache = ParseCache::new(b.finish());

    let found = resolve_decl(&cache, m, &TypeDecl::dotted("car.engine.power"));
    let symbol = assert_single(&found);
    assert_defined_by(symbol, power);
    assert_eq!(type_of(symbol), Some(&basic(BasicType::Float)));
}

#[test]
fn test_ufcs_call_on_primitive_receiver() {
    let mut b = AstBuilder::new();
    let m = b.module("app");
    let square = b.method(m, "square", Some(int()));
    b.parameter(square, "x", int());
    b.variable(m, "n", Some(int()), None);
    let cache = ParseCache::new(b.finish());

    let found = resolve_decl(&cache, m, &TypeDecl::dotted("n.square"));
    let symbol = assert_single(&found);
    assert_defined_by(symbol, square);
    assert!(symbol.has_tag(&SymbolTag::Ufcs));
    assert!(symbol.receiver().is_some());
}

#[test]
fn test_op_dispatch_fallback() {
    let mut b = AstBuilder::new();
    let m = b.module("app");
    let proxy = b.aggregate(m, ClassKind::Struct, "Proxy");
    let dispatch = b.method(proxy, "opDispatch", Some(TypeDecl::Basic(BasicType::Bool)));
    b.template_parameter(
        dispatch,
        "name",
        TemplateParameterKind::Value {
            ty: TypeDecl::Basic(BasicType::Char).array(),
            specialization: None,
            default: None,
        },
    );
    b.variable(m, "p", Some(TypeDecl::ident("Proxy")), None);
    let cache = ParseCache::new(b.finish());

    let found = resolve_decl(&cache, m, &TypeDecl::dotted("p.whatever"));
    let symbol = assert_single(&found);
    assert_defined_by(symbol, dispatch);
    assert!(symbol.has_tag(&SymbolTag::OpDispatch("whatever".into())));
    assert_eq!(type_of(symbol), Some(&basic(BasicType::Bool)));
}

#[test]
fn test_member_chain_on_template_instance() {
    let mut b = AstBuilder::new();
    let m = b.module("app");
    let list = b.class(m, "List", vec![]);
    b.template_parameter(list, "T", TemplateParameterKind::plain_type());
    b.method(list, "front", Some(TypeDecl::ident("T")));
    let cache = ParseCache::new(b.finish());

    let decl = TypeDecl::instance("List", vec![TemplateArg::Type(TypeDecl::Basic(BasicType::Dchar))]).member("front");
    let found = resolve_decl(&cache, m, &decl);
    assert_eq!(type_of(assert_single(&found)), Some(&basic(BasicType::Dchar)));
}

#[test]
fn test_enum_member_type_is_the_enum() {
    let mut b = AstBuilder::new();
    let m = b.module("app");
    let color = b.enumeration(m, "Color", Some(TypeDecl::Basic(BasicType::Ubyte)));
    b.enum_value(color, "Red", None);
    let cache = ParseCache::new(b.finish());

    let found = resolve_decl(&cache, m, &TypeDecl::dotted("Color.Red"));
    let base = assert_single(&found).base().cloned();
    assert!(matches!(base.map(|s| s.kind), Some(SymbolKind::Enum { node, base: Some(ub) }) if node == color && *ub == basic(BasicType::Ubyte)));
}

// =============================================================================
// INFERRED TYPES
// =============================================================================

#[test]
fn test_foreach_over_array_and_assoc_array() {
    let mut b = AstBuilder::new();
    let m = b.module("app");
    b.variable(m, "values", Some(TypeDecl::Basic(BasicType::Double).array()), None);
    b.variable(
        m,
        "table",
        Some(int().assoc_array(TypeDecl::Basic(BasicType::Char).array())),
        None,
    );
    let f = b.method(m, "f", None);
    let body = b.body(f);
    let (_, array_loop, _) = b.foreach(
        body,
        &[("i", None), ("v", None)],
        ForeachAggregate::Expr(Expr::ident("values")),
        false,
    );
    let in_array = b.expression(array_loop, Expr::ident("v"));
    let (_, table_loop, _) = b.foreach(
        body,
        &[("k", None), ("e", None)],
        ForeachAggregate::Expr(Expr::ident("table")),
        false,
    );
    let in_table = b.expression(table_loop, Expr::ident("k"));
    let cache = ParseCache::new(b.finish());

    let v = resolve_name(&cache, f, Some(in_array), "v");
    assert_eq!(type_of(assert_single(&v)), Some(&basic(BasicType::Double)));
    let i = resolve_name(&cache, f, Some(in_array), "i");
    assert_eq!(type_of(assert_single(&i)), Some(&basic(BasicType::Ulong)));
    let k = resolve_name(&cache, f, Some(in_table), "k");
    assert_eq!(type_of(assert_single(&k)), Some(&Symbol::array(Some(basic(BasicType::Char)))));
    let e = resolve_name(&cache, f, Some(in_table), "e");
    assert_eq!(type_of(assert_single(&e)), Some(&basic(BasicType::Int)));
}

#[test]
fn test_foreach_over_range_and_numeric_interval() {
    let mut b = AstBuilder::new();
    let m = b.module("app");
    let range = b.aggregate(m, ClassKind::Struct, "Range");
    b.method(range, "front", Some(TypeDecl::Basic(BasicType::Wchar)));
    b.variable(m, "r", Some(TypeDecl::ident("Range")), None);
    let f = b.method(m, "f", None);
    let body = b.body(f);
    let (_, range_loop, _) = b.foreach(body, &[("c", None)], ForeachAggregate::Expr(Expr::ident("r")), false);
    let in_range = b.expression(range_loop, Expr::ident("c"));
    let (_, count_loop, _) = b.foreach(
        body,
        &[("n", None)],
        ForeachAggregate::Range(Expr::int(0), Expr::int(10)),
        false,
    );
    let in_count = b.expression(count_loop, Expr::ident("n"));
    let cache = ParseCache::new(b.finish());

    let c = resolve_name(&cache, f, Some(in_range), "c");
    assert_eq!(type_of(assert_single(&c)), Some(&basic(BasicType::Wchar)));
    let n = resolve_name(&cache, f, Some(in_count), "n");
    assert_eq!(type_of(assert_single(&n)), Some(&basic(BasicType::Int)));
}

#[test]
fn test_typeof_return_uses_first_non_null_return() {
    let mut b = AstBuilder::new();
    let m = b.module("app");
    let f = b.method(m, "make", None);
    let body = b.body(f);
    b.declare_local(body, "copy", Some(TypeDecl::TypeOf(TypeOfTarget::Return)), None);
    b.return_statement(body, Some(Expr::Literal(dresolve::syntax::Literal::Null)));
    let last = b.return_statement(body, Some(Expr::string("done")));
    let cache = ParseCache::new(b.finish());

    let found = resolve_name(&cache, f, Some(last), "copy");
    assert_eq!(type_of(assert_single(&found)), Some(&Symbol::string()));
    let make = resolve_name(&cache, m, None, "make");
    assert_eq!(type_of(assert_single(&make)), Some(&Symbol::string()));
}

#[test]
fn test_auto_variable_takes_initializer_type() {
    let (cache, m) = cache_with(|b| {
        let m = b.module("app");
        b.variable(m, "sum", None, Some(Expr::binary(dresolve::syntax::BinaryOp::Add, Expr::int(1), Expr::int(2))));
        m
    });
    let found = resolve_name(&cache, m, None, "sum");
    assert_eq!(type_of(assert_single(&found)), Some(&basic(BasicType::Int)));
}

/// Members nested through `base()` until one has no base type.
fn base_chain(symbol: &Symbol) -> Vec<&Symbol> {
    std::iter::successors(Some(symbol), |s| s.base()).take(64).collect()
}

#[test]
fn test_self_typed_variable_stops_at_base_depth_cap() {
    let mut b = AstBuilder::new();
    let m = b.module("app");
    let x = b.variable(
        m,
        "x",
        Some(TypeDecl::TypeOf(TypeOfTarget::Expr(Box::new(Expr::ident("x"))))),
        None,
    );
    let cache = ParseCache::new(b.finish());
    let mut ctxt = ResolutionContext::new(&cache, m, None);

    let found = resolve_identifier("x", &mut ctxt);
    assert!(ctxt.guard().is_idle());
    assert_eq!(ctxt.depth(), 1);

    let chain = base_chain(assert_single(&found));
    assert!(chain.len() > 1, "x should resolve its own type at least once");
    assert!(chain.len() <= MAX_BASE_RESOLUTION_DEPTH as usize + 1, "{} levels", chain.len());
    for level in &chain {
        assert_defined_by(level, x);
    }
    let innermost = chain.last().expect("chain is never empty");
    assert!(innermost.base().is_none());
}

#[test]
fn test_mutually_inferred_variables_terminate() {
    let mut b = AstBuilder::new();
    let m = b.module("app");
    b.variable(m, "a", None, Some(Expr::ident("b")));
    b.variable(m, "b", None, Some(Expr::ident("a")));
    let cache = ParseCache::new(b.finish());
    let mut ctxt = ResolutionContext::new(&cache, m, None);

    let found = resolve_identifier("a", &mut ctxt);
    assert!(ctxt.guard().is_idle());
    assert_eq!(ctxt.depth(), 1);

    let chain = base_chain(assert_single(&found));
    assert!(chain.len() <= 2 * (MAX_BASE_RESOLUTION_DEPTH as usize + 1), "{} levels", chain.len());
    assert!(chain.last().is_some_and(|s| s.base().is_none()));
}

// =============================================================================
// TUPLES
// =============================================================================

fn tuple_holder() -> (ParseCache, dresolve::syntax::NodeId) {
    cache_with(|b| {
        let m = b.module("app");
        let holder = b.aggregate(m, ClassKind::Struct, "Holder");
        b.template_parameter(holder, "Ts", TemplateParameterKind::Tuple);
        b.variable(holder, "second", Some(TypeDecl::ident("Ts").fixed_array(Expr::int(1))), None);
        b.variable(holder, "missing", Some(TypeDecl::ident("Ts").fixed_array(Expr::int(5))), None);
        m
    })
}

fn holder_of_int_and_char() -> TypeDecl {
    TypeDecl::instance(
        "Holder",
        vec![
            TemplateArg::Type(int()),
            TemplateArg::Type(TypeDecl::Basic(BasicType::Char)),
        ],
    )
}

#[test]
fn test_tuple_index_selects_element_type() {
    let (cache, m) = tuple_holder();
    let found = resolve_decl(&cache, m, &holder_of_int_and_char().member("second"));
    assert_eq!(type_of(assert_single(&found)), Some(&basic(BasicType::Char)));
}

#[test]
fn test_tuple_index_out_of_range_logs_error() {
    let (cache, m) = tuple_holder();
    let mut ctxt = ResolutionContext::new(&cache, m, None);
    let found = resolve_type(&holder_of_int_and_char().member("missing"), &mut ctxt);
    assert!(found.iter().all(|s| s.base().is_none()));
    let logged = ctxt.errors().iter().any(|e| {
        matches!(e, ResolutionError::NothingFound { detail: Some(d), .. } if d.contains("tuple only has 2 items"))
    });
    assert!(logged, "expected a tuple range error, got {:?}", ctxt.errors());
}

// =============================================================================
// OPTIONS
// =============================================================================

#[test]
fn test_base_classes_suppressed_by_option() {
    let (cache, m) = cache_with(|b| {
        let m = b.module("app");
        b.class(m, "Base", vec![]);
        b.class(m, "Derived", vec![TypeDecl::ident("Base")]);
        m
    });

    let found = resolve_name(&cache, m, None, "Derived");
    let agg = assert_single(&found).as_aggregate().cloned();
    assert!(agg.is_some_and(|a| a.kind == AggregateKind::Class && a.base_class.is_some()));

    let mut ctxt = ResolutionContext::new(&cache, m, None).with_options(ResolutionOptions::DONT_RESOLVE_BASE_CLASSES);
    let found = resolve_identifier("Derived", &mut ctxt);
    assert!(assert_single(&found).as_aggregate().is_some_and(|a| a.base_class.is_none()));
}

#[test]
fn test_base_types_suppressed_by_option() {
    let (cache, m) = cache_with(|b| {
        let m = b.module("app");
        b.variable(m, "v", Some(int()), None);
        m
    });
    let mut ctxt = ResolutionContext::new(&cache, m, None).with_options(ResolutionOptions::DONT_RESOLVE_BASE_TYPES);
    let found = resolve_identifier("v", &mut ctxt);
    let symbol = assert_single(&found);
    assert!(symbol.is_member());
    assert!(symbol.base().is_none());
}
