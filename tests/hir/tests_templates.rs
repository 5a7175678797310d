//! Template deduction tests: call-site deduction, constraints,
//! specialization ordering and tuple capture.

use dresolve::hir::{
    OptionOverrides, ResolutionContext, ResolutionError, ResolutionOptions, Symbol, TemplateArgument, deduce_call,
    resolve_call, resolve_overloads, resolve_type, select_single,
};
use dresolve::project::ParseCache;
use dresolve::syntax::{AstBuilder, BasicType, ClassKind, Expr, IsOp, NodeId, TemplateArg, TemplateParameterKind, TypeDecl};

use crate::helpers::resolve_helpers::*;
use crate::helpers::symbol_assertions::*;

fn t() -> TypeDecl {
    TypeDecl::ident("T")
}

/// Overloads named `name` as method references, ready for call deduction.
fn overloads(ctxt: &mut ResolutionContext<'_>, name: &str) -> Vec<Symbol> {
    let references = OptionOverrides::new()
        .enable(ResolutionOptions::RETURN_METHOD_REFERENCES_ONLY | ResolutionOptions::NO_TEMPLATE_PARAMETER_DEDUCTION);
    ctxt.with_overrides(references, |ctxt| resolve_overloads(name, ctxt))
        .unwrap_or_default()
}

/// `T name(T)(T x)`, optionally constrained and specialized.
fn identity(b: &mut AstBuilder, module: NodeId, name: &str, specialization: Option<TypeDecl>) -> (NodeId, NodeId) {
    let f = b.method(module, name, Some(t()));
    let kind = match specialization {
        Some(spec) => TemplateParameterKind::specialized(spec),
        None => TemplateParameterKind::plain_type(),
    };
    let param = b.template_parameter(f, "T", kind);
    b.parameter(f, "x", t());
    (f, param)
}

// =============================================================================
// CALL-SITE DEDUCTION
// =============================================================================

#[test]
fn test_deduces_type_from_call_argument() {
    let mut b = AstBuilder::new();
    let m = b.module("app");
    let (foo, param) = identity(&mut b, m, "foo", None);
    let cache = ParseCache::new(b.finish());
    let mut ctxt = ResolutionContext::new(&cache, m, None);

    let candidates = overloads(&mut ctxt, "foo");
    let found = deduce_call(&mut ctxt, candidates, &[], &[Some(basic(BasicType::Int))]);
    let symbol = assert_single(&found);
    assert_defined_by(symbol, foo);
    assert_eq!(deduced_type(symbol, param), Some(basic(BasicType::Int)));
    assert_eq!(type_of(symbol), Some(&basic(BasicType::Int)));
    assert_eq!(ctxt.depth(), 1);
}

#[test]
fn test_tuple_parameter_captures_remaining_arguments_in_order() {
    let mut b = AstBuilder::new();
    let m = b.module("app");
    let a = b.aggregate(m, ClassKind::Struct, "A");
    let bb = b.aggregate(m, ClassKind::Struct, "B");
    let c = b.aggregate(m, ClassKind::Struct, "C");
    let f = b.method(m, "f", Some(TypeDecl::Basic(BasicType::Void)));
    let tuple = b.template_parameter(f, "T", TemplateParameterKind::Tuple);
    b.parameter(f, "x", t());
    let cache = ParseCache::new(b.finish());
    let mut ctxt = ResolutionContext::new(&cache, m, None);

    let args: Vec<Option<Symbol>> = ["A", "B", "C"]
        .iter()
        .map(|name| resolve_name(&cache, m, None, name).into_iter().next())
        .collect();
    let candidates = overloads(&mut ctxt, "f");
    let found = deduce_call(&mut ctxt, candidates, &[], &args);
    let captured = deduced_tuple(assert_single(&found), tuple).unwrap_or_default();
    let nodes: Vec<_> = captured
        .iter()
        .filter_map(TemplateArgument::as_type)
        .filter_map(Symbol::definition_node)
        .collect();
    assert_eq!(nodes, vec![a, bb, c]);
}

#[test]
fn test_explicit_arguments_precede_deduction() {
    let mut b = AstBuilder::new();
    let m = b.module("app");
    let (_, param) = identity(&mut b, m, "conv", None);
    let cache = ParseCache::new(b.finish());
    let mut ctxt = ResolutionContext::new(&cache, m, None);

    let candidates = overloads(&mut ctxt, "conv");
    let explicit = [TemplateArgument::Type(basic(BasicType::Long))];
    let found = deduce_call(&mut ctxt, candidates, &explicit, &[Some(basic(BasicType::Int))]);
    assert_eq!(deduced_type(assert_single(&found), param), Some(basic(BasicType::Long)));

    // `long` does not narrow to `int`.
    let candidates = overloads(&mut ctxt, "conv");
    let explicit = [TemplateArgument::Type(basic(BasicType::Int))];
    assert!(deduce_call(&mut ctxt, candidates, &explicit, &[Some(basic(BasicType::Long))]).is_empty());
}

// =============================================================================
// CONSTRAINTS
// =============================================================================

#[test]
fn test_false_constraint_excludes_overload() {
    let mut b = AstBuilder::new();
    let m = b.module("app");
    let (ints, _) = identity(&mut b, m, "pick", None);
    b.constraint(ints, Expr::is_type(t(), IsOp::Equal, int()));
    let (doubles, _) = identity(&mut b, m, "pick", None);
    b.constraint(doubles, Expr::is_type(t(), IsOp::Equal, TypeDecl::Basic(BasicType::Double)));
    let cache = ParseCache::new(b.finish());
    let mut ctxt = ResolutionContext::new(&cache, m, None);

    let chosen = resolve_call(&mut ctxt, &Expr::ident("pick").call(vec![Expr::int(3)]));
    assert_eq!(chosen, Some(ints));
}

/// Constraints that fail to evaluate exclude the overload rather than
/// surfacing an error. This mirrors long-standing behaviour and is not a
/// claim about the language.
#[test]
fn test_unevaluable_constraint_excludes_overload() {
    let mut b = AstBuilder::new();
    let m = b.module("app");
    let (broken, _) = identity(&mut b, m, "guess", None);
    b.constraint(broken, Expr::ident("undefinedTrait"));
    let (plain, _) = identity(&mut b, m, "guess", None);
    let cache = ParseCache::new(b.finish());
    let mut ctxt = ResolutionContext::new(&cache, m, None);

    let chosen = resolve_call(&mut ctxt, &Expr::ident("guess").call(vec![Expr::int(3)]));
    assert_eq!(chosen, Some(plain));
    assert_ne!(chosen, Some(broken));
}

// =============================================================================
// SPECIALIZATION ORDERING
// =============================================================================

#[test]
fn test_specialized_overload_wins_without_ambiguity() {
    let mut b = AstBuilder::new();
    let m = b.module("app");
    identity(&mut b, m, "f", None);
    let (specialized, _) = identity(&mut b, m, "f", Some(int()));
    let cache = ParseCache::new(b.finish());
    let mut ctxt = ResolutionContext::new(&cache, m, None);

    let chosen = resolve_call(&mut ctxt, &Expr::ident("f").call(vec![Expr::int(5)]));
    assert_eq!(chosen, Some(specialized));
    assert!(
        !ctxt
            .errors()
            .iter()
            .any(|e| matches!(e, ResolutionError::AmbiguousSpecialization { .. }))
    );
}

#[test]
fn test_equally_specialized_overloads_are_reported() {
    let mut b = AstBuilder::new();
    let m = b.module("app");
    identity(&mut b, m, "g", None);
    identity(&mut b, m, "g", None);
    let cache = ParseCache::new(b.finish());
    let mut ctxt = ResolutionContext::new(&cache, m, None);

    let candidates = overloads(&mut ctxt, "g");
    let found = deduce_call(&mut ctxt, candidates, &[], &[Some(basic(BasicType::Int))]);
    assert_eq!(found.len(), 2);
    assert!(select_single(&mut ctxt, found, "g").is_none());
    assert!(
        ctxt.errors()
            .iter()
            .any(|e| matches!(e, ResolutionError::AmbiguousSpecialization { overloads, .. } if overloads.len() == 2))
    );
}

// =============================================================================
// DIAGNOSTICS
// =============================================================================

#[test]
fn test_rejected_argument_names_the_parameter() {
    let mut b = AstBuilder::new();
    let m = b.module("app");
    let buf = b.aggregate(m, ClassKind::Struct, "Buf");
    let n = b.template_parameter(
        buf,
        "N",
        TemplateParameterKind::Value {
            ty: int(),
            specialization: None,
            default: None,
        },
    );
    let cache = ParseCache::new(b.finish());
    let mut ctxt = ResolutionContext::new(&cache, m, None);

    let decl = TypeDecl::instance("Buf", vec![TemplateArg::Type(TypeDecl::Basic(BasicType::Double))]);
    assert!(resolve_type(&decl, &mut ctxt).is_empty());
    let reported = ctxt.errors().iter().any(|e| {
        matches!(e, ResolutionError::TemplateParameterDeduction { parameter, parameter_name, .. }
            if *parameter == n && parameter_name == "N")
    });
    assert!(reported, "{:?}", ctxt.errors());
}
