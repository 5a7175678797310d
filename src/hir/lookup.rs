//! NameLookup: collect the declarations visible under a name.
//!
//! Lookup walks outward from the current scope one layer at a time:
//!
//! ```text
//! method locals (declared before the caret) → parameters → template params
//!   → block members (+ mixed-in members)
//!   → inherited members (classes and interfaces)
//!   → imports of the block (+ implicit `object`)
//!   → enclosing block ...
//! ```
//!
//! The first layer producing a match wins. Results are declarations, not
//! types; see [`resolve`](super::resolve) for turning them into symbols.

use std::ops::BitOr;

use rustc_hash::FxHashSet;

use crate::syntax::{Node, NodeId, NodeKind, StmtKind, Visibility};

use super::context::ResolutionContext;
use super::resolve;
use super::symbols::{Symbol, SymbolKind};

// ============================================================================
// FILTER
// ============================================================================

/// Which kinds of declarations a lookup may return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemberFilter(u8);

impl MemberFilter {
    pub const IMPORTS: Self = Self(1 << 0);
    pub const VARIABLES: Self = Self(1 << 1);
    pub const METHODS: Self = Self(1 << 2);
    pub const TYPES: Self = Self(1 << 3);
    pub const KEYWORDS: Self = Self(1 << 4);
    pub const ALL: Self = Self(0b1_1111);

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    pub fn accepts(self, node: &Node) -> bool {
        let wanted = match &node.kind {
            NodeKind::Variable { is_alias: true, .. } => Self::TYPES | Self::VARIABLES,
            NodeKind::Variable { .. } | NodeKind::EnumValue { .. } => Self::VARIABLES,
            NodeKind::EponymousTemplate { .. } => Self::TYPES | Self::VARIABLES,
            NodeKind::Method { .. } => Self::METHODS,
            NodeKind::Aggregate { .. }
            | NodeKind::Enum { .. }
            | NodeKind::TemplateParameter(_)
            | NodeKind::TemplateMixin { .. } => Self::TYPES,
            NodeKind::Module | NodeKind::ImportSymbol { .. } | NodeKind::ModuleAlias { .. } => {
                Self::IMPORTS
            }
            NodeKind::Import { .. } => return false,
        };
        self.contains(wanted)
    }
}

impl BitOr for MemberFilter {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// A visible declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub node: NodeId,
    /// The mixin or template instance through which the declaration is
    /// reached; its deduced bindings apply when resolving the node.
    pub instance: Option<Symbol>,
}

impl Declaration {
    fn direct(node: NodeId) -> Self {
        Self { node, instance: None }
    }
}

// ============================================================================
// SCAN STATE
// ============================================================================

/// How the scanned block relates to the querying scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
    /// The query sits inside the block.
    Lexical,
    /// Reached through the base-class chain of an enclosing class.
    Inherited,
    /// A member selected from outside: `a.b`, imported module members.
    External,
}

struct Scan<'n> {
    name: Option<&'n str>,
    filter: MemberFilter,
    querying_module: NodeId,
    found: Vec<Declaration>,
    visited_modules: FxHashSet<NodeId>,
    visited_blocks: FxHashSet<NodeId>,
}

impl<'n> Scan<'n> {
    fn new(ctxt: &ResolutionContext<'_>, name: Option<&'n str>, filter: MemberFilter) -> Self {
        Self {
            name,
            filter,
            querying_module: ctxt.ast().module_of(ctxt.current_scope()),
            found: Vec::new(),
            visited_modules: FxHashSet::default(),
            visited_blocks: FxHashSet::default(),
        }
    }

    fn matches(&self, node: &Node) -> bool {
        self.name.is_none_or(|n| node.name == n) && self.filter.accepts(node)
    }

    fn push(&mut self, node: NodeId, instance: Option<&Symbol>) {
        if !self.found.iter().any(|d| d.node == node) {
            self.found.push(Declaration {
                node,
                instance: instance.cloned(),
            });
        }
    }

    /// In name mode the first non-empty layer ends the walk.
    fn done(&self) -> bool {
        self.name.is_some() && !self.found.is_empty()
    }
}

// ============================================================================
// PUBLIC API
// ============================================================================

/// Declarations named `name` visible from the current scope and statement.
pub fn lookup(ctxt: &mut ResolutionContext<'_>, name: &str, filter: MemberFilter) -> Vec<Declaration> {
    let mut scan = Scan::new(ctxt, Some(name), filter);
    walk_scopes(ctxt, &mut scan);
    tracing::trace!("[LOOKUP] '{}' -> {} declaration(s)", name, scan.found.len());
    scan.found
}

/// Every declaration visible from the current scope, innermost first.
pub fn enumerate(ctxt: &mut ResolutionContext<'_>, filter: MemberFilter) -> Vec<Declaration> {
    let mut scan = Scan::new(ctxt, None, filter);
    walk_scopes(ctxt, &mut scan);
    scan.found
}

/// Members named `name` of an aggregate, enum or module symbol, including
/// mixed-in and inherited members.
pub fn search_members(
    ctxt: &mut ResolutionContext<'_>,
    owner: &Symbol,
    name: &str,
    filter: MemberFilter,
) -> Vec<Declaration> {
    let mut scan = Scan::new(ctxt, Some(name), filter);
    match &owner.kind {
        SymbolKind::Aggregate(agg) => {
            let instance = (!agg.deduced.is_empty()).then_some(owner);
            scan_block(ctxt, &mut scan, agg.node, Access::External, instance);
            if !scan.done() {
                scan_mixins(ctxt, &mut scan, agg.node);
            }
            if !scan.done() {
                scan_bases(ctxt, &mut scan, owner, Access::External);
            }
        }
        SymbolKind::Enum { node, .. } => scan_block(ctxt, &mut scan, *node, Access::External, None),
        SymbolKind::Module(module) => scan_module(ctxt, &mut scan, *module),
        _ => {}
    }
    scan.found
}

// ============================================================================
// SCOPE WALK
// ============================================================================

fn walk_scopes(ctxt: &mut ResolutionContext<'_>, scan: &mut Scan<'_>) {
    let ast = ctxt.ast();
    let mut scope = Some(ctxt.current_scope());
    while let Some(id) = scope {
        if ctxt.is_cancelled() {
            tracing::debug!("[LOOKUP] cancelled");
            scan.found.clear();
            return;
        }
        let node = ast.node(id);

        if node.is_method() {
            scan_locals(ctxt, scan, id);
            for &param in node.method_parameters() {
                if scan.matches(ast.node(param)) {
                    scan.push(param, None);
                }
            }
        }
        if !scan.done() {
            scan_block(ctxt, scan, id, Access::Lexical, None);
        }
        if !scan.done() {
            scan_mixins(ctxt, scan, id);
        }
        if !scan.done() {
            if let NodeKind::Aggregate { kind, .. } = node.kind {
                if matches!(kind, crate::syntax::ClassKind::Class | crate::syntax::ClassKind::Interface) {
                    scan_inherited(ctxt, scan, id);
                }
            }
        }
        if !scan.done() {
            scan_imports(ctxt, scan, id);
        }
        if scan.done() {
            return;
        }
        scope = node.parent;
    }
}

/// Block-local declarations preceding the current statement.
fn scan_locals(ctxt: &mut ResolutionContext<'_>, scan: &mut Scan<'_>, method: NodeId) {
    let ast = ctxt.ast();
    let Some(current) = ctxt.current_statement().filter(|&s| ast.statement(s).owner == method) else {
        return;
    };
    let caret = ast.statement(current).span.start;
    let mut path = Some(current);
    let mut came_from_child = false;
    while let Some(sid) = path {
        let stmt = ast.statement(sid);
        match &stmt.kind {
            StmtKind::Block(children) => {
                for &child in children {
                    let child_stmt = ast.statement(child);
                    if !child_stmt.span.starts_before(caret) {
                        break;
                    }
                    match &child_stmt.kind {
                        StmtKind::Declaration(nodes) => {
                            for &n in nodes {
                                if scan.matches(ast.node(n)) {
                                    scan.push(n, None);
                                }
                            }
                        }
                        StmtKind::Mixin(mixin) => scan_mixin_instance(ctxt, scan, *mixin),
                        _ => {}
                    }
                }
            }
            StmtKind::Foreach { variables, .. } if came_from_child => {
                for &n in variables {
                    if scan.matches(ast.node(n)) {
                        scan.push(n, None);
                    }
                }
            }
            _ => {}
        }
        came_from_child = true;
        path = stmt.parent;
    }
}

// ============================================================================
// BLOCK MEMBERS
// ============================================================================

fn is_accessible(ctxt: &ResolutionContext<'_>, scan: &Scan<'_>, node: NodeId, access: Access) -> bool {
    if access == Access::Lexical {
        return true;
    }
    let ast = ctxt.ast();
    let cache = ctxt.cache();
    let declaring_module = ast.module_of(node);
    let same_module = declaring_module == scan.querying_module;
    match ast.node(node).attributes.visibility {
        Visibility::Public => true,
        Visibility::Private => same_module,
        Visibility::Package => {
            same_module || cache.package_of(declaring_module) == cache.package_of(scan.querying_module)
        }
        Visibility::Protected => same_module || access == Access::Inherited,
    }
}

/// Direct members of `block`, its import bindings and template parameters.
fn scan_block(
    ctxt: &mut ResolutionContext<'_>,
    scan: &mut Scan<'_>,
    block: NodeId,
    access: Access,
    instance: Option<&Symbol>,
) {
    let ast = ctxt.ast();
    let node = ast.node(block);
    for &child in &node.children {
        let child_node = ast.node(child);
        match &child_node.kind {
            NodeKind::Import { .. } if access == Access::Lexical => {
                for &binding in &child_node.children {
                    if scan.matches(ast.node(binding)) {
                        scan.push(binding, None);
                    }
                }
            }
            NodeKind::Import { .. } => {}
            NodeKind::TemplateMixin { .. } if child_node.name.is_empty() => {}
            _ => {
                if scan.matches(child_node) && is_accessible(ctxt, scan, child, access) {
                    scan.push(child, instance);
                }
            }
        }
    }
    if access == Access::Lexical {
        for &param in &node.template_parameters {
            if scan.matches(ast.node(param)) {
                scan.push(param, None);
            }
        }
    }
}

/// Members spliced in by `mixin` declarations of `block`.
fn scan_mixins(ctxt: &mut ResolutionContext<'_>, scan: &mut Scan<'_>, block: NodeId) {
    let ast = ctxt.ast();
    for &child in &ast.node(block).children {
        if matches!(ast.node(child).kind, NodeKind::TemplateMixin { .. }) {
            scan_mixin_instance(ctxt, scan, child);
        }
    }
}

fn scan_mixin_instance(ctxt: &mut ResolutionContext<'_>, scan: &mut Scan<'_>, mixin: NodeId) {
    let Some(instance) = resolve::mixin_instance(ctxt, mixin) else {
        return;
    };
    let Some(template) = instance.as_aggregate().map(|a| a.node) else {
        return;
    };
    if !scan.visited_blocks.insert(template) {
        return;
    }
    let ast = ctxt.ast();
    for &member in &ast.node(template).children {
        let member_node = ast.node(member);
        if matches!(member_node.kind, NodeKind::TemplateMixin { .. }) {
            if !member_node.name.is_empty() && scan.matches(member_node) {
                scan.push(member, Some(&instance));
            }
            scan_mixin_instance_within(ctxt, scan, member, &instance);
        } else if scan.matches(member_node) {
            scan.push(member, Some(&instance));
        }
    }
    scan.visited_blocks.remove(&template);
}

/// A mixin nested inside a mixin template resolves with the outer
/// instance's bindings in scope.
fn scan_mixin_instance_within(
    ctxt: &mut ResolutionContext<'_>,
    scan: &mut Scan<'_>,
    mixin: NodeId,
    outer: &Symbol,
) {
    let deduced = outer.deduced().cloned().unwrap_or_default();
    let scope = ctxt.ast().parent(mixin).unwrap_or(mixin);
    let frame = super::context::ContextFrame::new(scope).with_deduced(deduced);
    ctxt.with_frame(frame, |ctxt| scan_mixin_instance(ctxt, scan, mixin));
}

// ============================================================================
// INHERITANCE
// ============================================================================

fn scan_inherited(ctxt: &mut ResolutionContext<'_>, scan: &mut Scan<'_>, class: NodeId) {
    // Resolving the class's own base list looks names up from inside it.
    if ctxt.guard().is_resolving(class) {
        return;
    }
    let Some(symbol) = resolve::handle_node_match(ctxt, class, None) else {
        return;
    };
    scan_bases(ctxt, scan, &symbol, Access::Inherited);
}

fn scan_bases(ctxt: &mut ResolutionContext<'_>, scan: &mut Scan<'_>, owner: &Symbol, access: Access) {
    let Some(agg) = owner.as_aggregate() else {
        return;
    };
    let bases = agg.base_class.iter().map(|b| b.as_ref()).chain(agg.interfaces.iter());
    for base in bases {
        let Some(base_agg) = base.as_aggregate() else {
            continue;
        };
        if !scan.visited_blocks.insert(base_agg.node) {
            continue;
        }
        let instance = (!base_agg.deduced.is_empty()).then_some(base);
        let member_access = if access == Access::Inherited { Access::Inherited } else { Access::External };
        scan_block(ctxt, scan, base_agg.node, member_access, instance);
        if !scan.done() {
            scan_mixins(ctxt, scan, base_agg.node);
        }
        if !scan.done() {
            scan_bases(ctxt, scan, base, access);
        }
        if scan.done() {
            return;
        }
    }
}

// ============================================================================
// IMPORTS
// ============================================================================

/// Whole-module imports declared in `block` (and `object` for modules).
fn scan_imports(ctxt: &mut ResolutionContext<'_>, scan: &mut Scan<'_>, block: NodeId) {
    let ast = ctxt.ast();
    let cache = ctxt.cache();
    let node = ast.node(block);
    let mut targets: Vec<NodeId> = node
        .children
        .iter()
        .filter_map(|&child| {
            let child_node = ast.node(child);
            match &child_node.kind {
                NodeKind::Import {
                    module,
                    is_static: false,
                    ..
                } if child_node.children.is_empty() => cache.module(module),
                _ => None,
            }
        })
        .collect();
    if matches!(node.kind, NodeKind::Module) {
        if let Some(object) = cache.object_module().filter(|&o| o != block) {
            targets.push(object);
        }
    }
    for module in targets {
        if ctxt.is_cancelled() {
            return;
        }
        scan_module(ctxt, scan, module);
    }
}

/// Externally visible members of `module`, following its public imports.
fn scan_module(ctxt: &mut ResolutionContext<'_>, scan: &mut Scan<'_>, module: NodeId) {
    if !scan.visited_modules.insert(module) {
        return;
    }
    scan_block(ctxt, scan, module, Access::External, None);
    let ast = ctxt.ast();
    let cache = ctxt.cache();
    for &child in &ast.node(module).children {
        let child_node = ast.node(child);
        let NodeKind::Import {
            module: target,
            is_public: true,
            ..
        } = &child_node.kind
        else {
            continue;
        };
        if child_node.children.is_empty() {
            if let Some(target) = cache.module(target) {
                scan_module(ctxt, scan, target);
            }
        } else {
            for &binding in &child_node.children {
                if scan.matches(ast.node(binding)) {
                    scan.push(binding, None);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::ParseCache;
    use crate::syntax::{AstBuilder, BasicType, Expr, TypeDecl};

    fn int() -> Option<TypeDecl> {
        Some(TypeDecl::Basic(BasicType::Int))
    }

    fn names(ctxt: &ResolutionContext<'_>, decls: &[Declaration]) -> Vec<String> {
        decls.iter().map(|d| ctxt.ast().node(d.node).name.to_string()).collect()
    }

    #[test]
    fn test_inner_scope_hides_outer() {
        let mut b = AstBuilder::new();
        let m = b.module("m");
        let outer = b.variable(m, "x", int(), None);
        let c = b.class(m, "C", vec![]);
        let inner = b.variable(c, "x", int(), None);
        let f = b.method(c, "f", None);
        let cache = ParseCache::new(b.finish());

        let mut ctxt = ResolutionContext::new(&cache, f, None);
        let found = lookup(&mut ctxt, "x", MemberFilter::ALL);
        assert_eq!(found, vec![Declaration::direct(inner)]);

        let mut ctxt = ResolutionContext::new(&cache, m, None);
        assert_eq!(lookup(&mut ctxt, "x", MemberFilter::ALL), vec![Declaration::direct(outer)]);
    }

    #[test]
    fn test_locals_after_caret_are_invisible() {
        let mut b = AstBuilder::new();
        let m = b.module("m");
        let f = b.method(m, "f", None);
        let body = b.body(f);
        let (_, before) = b.declare_local(body, "a", int(), None);
        let here = b.expression(body, Expr::ident("a"));
        b.declare_local(body, "b", int(), None);
        let cache = ParseCache::new(b.finish());

        let mut ctxt = ResolutionContext::new(&cache, f, Some(here));
        assert_eq!(lookup(&mut ctxt, "a", MemberFilter::ALL), vec![Declaration::direct(before)]);
        assert!(lookup(&mut ctxt, "b", MemberFilter::ALL).is_empty());
    }

    #[test]
    fn test_filter_excludes_kinds() {
        let mut b = AstBuilder::new();
        let m = b.module("m");
        b.method(m, "f", None);
        let cache = ParseCache::new(b.finish());

        let mut ctxt = ResolutionContext::new(&cache, m, None);
        assert!(lookup(&mut ctxt, "f", MemberFilter::TYPES | MemberFilter::VARIABLES).is_empty());
        assert_eq!(lookup(&mut ctxt, "f", MemberFilter::METHODS).len(), 1);
    }

    #[test]
    fn test_parameters_and_template_parameters_are_visible() {
        let mut b = AstBuilder::new();
        let m = b.module("m");
        let f = b.method(m, "f", None);
        let t = b.template_parameter(f, "T", crate::syntax::TemplateParameterKind::plain_type());
        let p = b.parameter(f, "value", TypeDecl::ident("T"));
        let cache = ParseCache::new(b.finish());

        let mut ctxt = ResolutionContext::new(&cache, f, None);
        assert_eq!(lookup(&mut ctxt, "T", MemberFilter::ALL), vec![Declaration::direct(t)]);
        assert_eq!(lookup(&mut ctxt, "value", MemberFilter::ALL), vec![Declaration::direct(p)]);
    }

    #[test]
    fn test_enumerate_lists_every_layer() {
        let mut b = AstBuilder::new();
        let m = b.module("m");
        b.variable(m, "g", int(), None);
        let c = b.class(m, "C", vec![]);
        b.variable(c, "field", int(), None);
        let cache = ParseCache::new(b.finish());

        let mut ctxt = ResolutionContext::new(&cache, c, None);
        let all = enumerate(&mut ctxt, MemberFilter::ALL);
        assert_eq!(names(&ctxt, &all), vec!["field", "g", "C"]);
    }
}
