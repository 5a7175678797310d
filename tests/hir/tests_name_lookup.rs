//! Name lookup tests: scope walking, locals, imports, mixins, visibility.

use dresolve::hir::{MemberFilter, ResolutionContext, enumerate, lookup};
use dresolve::syntax::{AstBuilder, ClassKind, Expr, TypeDecl, Visibility};

use crate::helpers::resolve_helpers::*;
use crate::helpers::symbol_assertions::*;

// =============================================================================
// SCOPE WALK
// =============================================================================

#[test]
fn test_innermost_declaration_shadows_outer() {
    let mut b = AstBuilder::new();
    let m = b.module("app");
    b.variable(m, "x", Some(int()), None);
    let c = b.class(m, "C", vec![]);
    let inner = b.variable(c, "x", Some(TypeDecl::Basic(dresolve::syntax::BasicType::Double)), None);
    let f = b.method(c, "f", None);
    let cache = dresolve::project::ParseCache::new(b.finish());

    let mut ctxt = ResolutionContext::new(&cache, f, None);
    let found = lookup(&mut ctxt, "x", MemberFilter::ALL);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].node, inner);
}

#[test]
fn test_locals_visible_only_after_declaration() {
    let mut b = AstBuilder::new();
    let m = b.module("app");
    let f = b.method(m, "f", None);
    let body = b.body(f);
    let before = b.expression(body, Expr::ident("y"));
    let (_, y) = b.declare_local(body, "y", Some(int()), None);
    let after = b.expression(body, Expr::ident("y"));
    let cache = dresolve::project::ParseCache::new(b.finish());

    assert!(resolve_name(&cache, f, Some(before), "y").is_empty());
    let found = resolve_name(&cache, f, Some(after), "y");
    assert_defined_by(assert_single(&found), y);
}

#[test]
fn test_filter_restricts_kinds() {
    let (cache, m) = cache_with(|b| {
        let m = b.module("app");
        b.method(m, "thing", None);
        m
    });
    let mut ctxt = ResolutionContext::new(&cache, m, None);
    assert!(lookup(&mut ctxt, "thing", MemberFilter::VARIABLES | MemberFilter::TYPES).is_empty());
    assert_eq!(lookup(&mut ctxt, "thing", MemberFilter::METHODS).len(), 1);
}

#[test]
fn test_enumerate_lists_every_visible_declaration() {
    let (cache, f) = cache_with(|b| {
        let m = b.module("app");
        b.variable(m, "a", Some(int()), None);
        b.class(m, "B", vec![]);
        b.method(m, "f", None)
    });
    let mut ctxt = ResolutionContext::new(&cache, f, None);
    let names: Vec<_> = enumerate(&mut ctxt, MemberFilter::ALL)
        .into_iter()
        .map(|d| cache.ast().node(d.node).name.clone())
        .collect();
    assert!(names.iter().any(|n| n == "a"));
    assert!(names.iter().any(|n| n == "B"));
    assert!(names.iter().any(|n| n == "f"));
}

// =============================================================================
// IMPORTS
// =============================================================================

#[test]
fn test_import_exposes_public_members_only() {
    let mut b = AstBuilder::new();
    let lib = b.module("lib");
    let open = b.variable(lib, "open", Some(int()), None);
    let secret = b.variable(lib, "secret", Some(int()), None);
    b.set_visibility(secret, Visibility::Private);
    let app = b.module("app");
    b.import(app, "lib");
    let cache = dresolve::project::ParseCache::new(b.finish());

    let found = resolve_name(&cache, app, None, "open");
    assert_defined_by(assert_single(&found), open);
    assert!(resolve_name(&cache, app, None, "secret").is_empty());
}

#[test]
fn test_selective_import_binds_renamed_symbol() {
    let mut b = AstBuilder::new();
    let lib = b.module("std.conv");
    let to = b.method(lib, "to", Some(int()));
    let app = b.module("app");
    let import = b.import(app, "std.conv");
    b.import_symbol(import, "convert", "to");
    let cache = dresolve::project::ParseCache::new(b.finish());

    let found = resolve_name(&cache, app, None, "convert");
    let symbol = assert_single(&found);
    assert_defined_by(symbol, to);
    assert!(resolve_name(&cache, app, None, "to").is_empty());
}

#[test]
fn test_public_import_is_transitive() {
    let mut b = AstBuilder::new();
    let core = b.module("core");
    let deep = b.class(core, "Deep", vec![]);
    let middle = b.module("middle");
    b.import_with(middle, "core", true, false);
    // cyclic import back into the re-exporting module
    b.import(core, "middle");
    let app = b.module("app");
    b.import(app, "middle");
    let cache = dresolve::project::ParseCache::new(b.finish());

    let found = resolve_name(&cache, app, None, "Deep");
    assert_defined_by(assert_single(&found), deep);
}

#[test]
fn test_module_alias_and_qualified_access() {
    let mut b = AstBuilder::new();
    let stdio = b.module("std.stdio");
    let writeln = b.method(stdio, "writeln", None);
    let app = b.module("app");
    b.module_alias(app, "io", "std.stdio");
    let cache = dresolve::project::ParseCache::new(b.finish());

    let via_alias = resolve_decl(&cache, app, &TypeDecl::dotted("io.writeln"));
    assert_defined_by(assert_single(&via_alias), writeln);
    let via_package = resolve_decl(&cache, app, &TypeDecl::dotted("std.stdio.writeln"));
    assert_defined_by(assert_single(&via_package), writeln);
}

// =============================================================================
// MIXINS AND INHERITANCE
// =============================================================================

#[test]
fn test_mixin_members_are_spliced_in() {
    let mut b = AstBuilder::new();
    let m = b.module("app");
    let mix = b.mixin_template(m, "Counter");
    let count = b.variable(mix, "count", Some(int()), None);
    let s = b.aggregate(m, ClassKind::Struct, "S");
    b.template_mixin(s, "", TypeDecl::ident("Counter"));
    let f = b.method(s, "bump", None);
    let cache = dresolve::project::ParseCache::new(b.finish());

    let found = resolve_name(&cache, f, None, "count");
    assert_defined_by(assert_single(&found), count);
    let member = resolve_decl(&cache, m, &TypeDecl::dotted("S.count"));
    assert_defined_by(assert_single(&member), count);
}

#[test]
fn test_inherited_members_respect_protection() {
    let mut b = AstBuilder::new();
    let lib = b.module("lib");
    let base = b.class(lib, "Base", vec![]);
    let guarded = b.variable(base, "guarded", Some(int()), None);
    b.set_visibility(guarded, Visibility::Protected);
    let app = b.module("app");
    b.import(app, "lib");
    let derived = b.class(app, "Derived", vec![TypeDecl::ident("Base")]);
    let f = b.method(derived, "f", None);
    let cache = dresolve::project::ParseCache::new(b.finish());

    let found = resolve_name(&cache, f, None, "guarded");
    assert_defined_by(assert_single(&found), guarded);
    assert!(resolve_decl(&cache, app, &TypeDecl::dotted("Derived.guarded")).is_empty());
}
