//! Context tests: frame discipline, option layering, idempotence,
//! cancellation and concurrent queries over one shared cache.

use dresolve::hir::{OptionOverrides, ResolutionContext, ResolutionOptions, resolve_identifier, resolve_type};
use dresolve::project::{self, ParseCache};
use dresolve::syntax::{AstBuilder, NodeId, TemplateArg, TemplateParameterKind, TypeDecl};
use tokio_util::sync::CancellationToken;

use crate::helpers::resolve_helpers::*;
use crate::helpers::symbol_assertions::*;

/// A small module with templates, aliases and inheritance, enough to make
/// resolution push and pop several frames.
fn fixture() -> (ParseCache, NodeId, NodeId) {
    let mut b = AstBuilder::new();
    let m = b.module("app");
    let list = b.class(m, "List", vec![]);
    b.template_parameter(list, "T", TemplateParameterKind::plain_type());
    b.variable(list, "head", Some(TypeDecl::ident("T")), None);
    b.class(m, "Base", vec![]);
    b.class(m, "Derived", vec![TypeDecl::ident("Base")]);
    b.alias(m, "Ints", TypeDecl::instance("List", vec![TemplateArg::Type(int())]));
    let first = b.variable(m, "first", Some(TypeDecl::dotted("Ints.head")), None);
    (ParseCache::new(b.finish()), m, first)
}

#[test]
fn test_resolution_is_idempotent() {
    let (cache, m, _) = fixture();
    let mut ctxt = ResolutionContext::new(&cache, m, None);
    let first = resolve_identifier("first", &mut ctxt);
    let again = resolve_identifier("first", &mut ctxt);
    assert_eq!(first, again);

    let mut fresh = ResolutionContext::new(&cache, m, None);
    assert_eq!(first, resolve_identifier("first", &mut fresh));
}

#[test]
fn test_frames_balance_after_every_query() {
    let (cache, m, _) = fixture();
    let mut ctxt = ResolutionContext::new(&cache, m, None);
    for name in ["first", "Ints", "Derived", "List", "missing"] {
        resolve_identifier(name, &mut ctxt);
        assert_eq!(ctxt.depth(), 1, "after '{}'", name);
        assert!(ctxt.guard().is_idle(), "after '{}'", name);
    }
    resolve_type(&TypeDecl::dotted("Ints.head"), &mut ctxt);
    assert_eq!(ctxt.depth(), 1);
}

#[test]
fn test_root_frame_is_never_popped() {
    let (cache, m, _) = fixture();
    let mut ctxt = ResolutionContext::new(&cache, m, None);
    assert!(ctxt.pop().is_none());
    assert_eq!(ctxt.depth(), 1);
    assert_eq!(ctxt.current_scope(), m);
}

#[test]
fn test_overrides_layer_and_unwind() {
    let (cache, m, _) = fixture();
    let mut ctxt = ResolutionContext::new(&cache, m, None).with_options(ResolutionOptions::DONT_RESOLVE_ALIASES);

    let outer = OptionOverrides::new().enable(ResolutionOptions::DONT_RESOLVE_BASE_CLASSES);
    let inner = OptionOverrides::new().disable(ResolutionOptions::DONT_RESOLVE_ALIASES);
    let seen = ctxt
        .with_overrides(outer, |ctxt| {
            let outer_options = ctxt.options();
            let inner_options = ctxt.with_overrides(inner, |ctxt| ctxt.options());
            (outer_options, inner_options)
        })
        .expect("not cancelled");

    assert_eq!(
        seen.0,
        ResolutionOptions::DONT_RESOLVE_ALIASES | ResolutionOptions::DONT_RESOLVE_BASE_CLASSES
    );
    assert_eq!(seen.1, Some(ResolutionOptions::DONT_RESOLVE_BASE_CLASSES));
    assert_eq!(ctxt.options(), ResolutionOptions::DONT_RESOLVE_ALIASES);
}

#[test]
fn test_cancelled_query_returns_nothing() {
    let (cache, m, _) = fixture();
    let token = CancellationToken::new();
    let mut ctxt = ResolutionContext::new(&cache, m, None).with_cancellation(token.clone());
    assert!(!resolve_identifier("first", &mut ctxt).is_empty());

    token.cancel();
    let mut ctxt = ResolutionContext::new(&cache, m, None).with_cancellation(token);
    assert!(resolve_identifier("Derived", &mut ctxt).is_empty());
    assert!(resolve_type(&TypeDecl::dotted("Ints.head"), &mut ctxt).is_empty());
    assert_eq!(ctxt.depth(), 1);
    assert!(ctxt.errors().is_empty());
}

#[test]
fn test_concurrent_queries_share_one_cache() {
    let (cache, m, first) = fixture();
    let shared = project::shared(cache);
    let expected = {
        let guard = shared.read();
        resolve_name(&guard, m, None, "first")
    };
    assert_defined_by(assert_single(&expected), first);

    std::thread::scope(|s| {
        for _ in 0..4 {
            let shared = &shared;
            let expected = &expected;
            s.spawn(move || {
                let guard = shared.read();
                let mut ctxt = ResolutionContext::new(&guard, m, None);
                for _ in 0..16 {
                    assert_eq!(&resolve_identifier("first", &mut ctxt), expected);
                }
            });
        }
    });
}
