//! Member access: what `owner.name` resolves to.
//!
//! Aggregates, enums and modules are searched for declared members first.
//! Built-in properties (`.length`, `.sizeof`, ...) come next, then an
//! aggregate's `opDispatch`, and finally free functions taking the owner as
//! first argument (uniform function call syntax).

use crate::base::constants::OP_DISPATCH;
use crate::syntax::TemplateArg;

use super::context::ResolutionContext;
use super::lookup::{self, MemberFilter};
use super::options::ResolutionOptions;
use super::resolve;
use super::static_props;
use super::symbols::{Symbol, SymbolKind, SymbolTag};
use super::templates;
use super::values::{SymbolValue, TemplateArgument};

/// `owner.name` or `owner.name!(args)`, template arguments deduced.
pub fn member_access(
    ctxt: &mut ResolutionContext<'_>,
    owner: &Symbol,
    name: &str,
    template_args: Option<&[TemplateArg]>,
    ufcs: bool,
) -> Vec<Symbol> {
    let found = resolve_further(ctxt, name, owner, ufcs);
    match template_args {
        Some(args) => {
            let given = templates::pre_resolve_arguments(ctxt, args);
            templates::deduce_and_filter(ctxt, found, &given, false)
        }
        None if ctxt.options().contains(ResolutionOptions::NO_TEMPLATE_PARAMETER_DEDUCTION) => found,
        None => templates::deduce_and_filter(ctxt, found, &[], false),
    }
}

/// Every symbol `name` may denote as a member of `owner`, before template
/// deduction. `Ambiguous` owners are searched candidate by candidate.
pub fn resolve_further(ctxt: &mut ResolutionContext<'_>, name: &str, owner: &Symbol, ufcs: bool) -> Vec<Symbol> {
    let mut found = Vec::new();
    for candidate in owner.clone().into_candidates() {
        if ctxt.is_cancelled() {
            return Vec::new();
        }
        found.extend(members_of(ctxt, name, &candidate, ufcs));
    }
    tracing::trace!("[RESOLVE] member '{}' -> {} candidate(s)", name, found.len());
    found
}

fn members_of(ctxt: &mut ResolutionContext<'_>, name: &str, receiver: &Symbol, ufcs: bool) -> Vec<Symbol> {
    let Some(target) = receiver.strip_members().cloned() else {
        return Vec::new();
    };
    let owner = dereferenced(target.clone());

    let mut found = match &owner.kind {
        SymbolKind::Aggregate(_) | SymbolKind::Enum { .. } | SymbolKind::Module(_) => {
            let declarations = lookup::search_members(ctxt, &owner, name, MemberFilter::ALL);
            let tag_receiver = matches!(owner.kind, SymbolKind::Aggregate(_));
            resolve::handle_declarations(ctxt, &declarations)
                .into_iter()
                .map(|s| if tag_receiver && s.is_member() { with_receiver(s, receiver) } else { s })
                .collect()
        }
        SymbolKind::Package(path) => package_member(ctxt, path, name).into_iter().collect(),
        _ => Vec::new(),
    };
    if !found.is_empty() {
        return found;
    }
    if let Some(property) = static_props::try_resolve(ctxt, &target, name) {
        return vec![property];
    }
    if matches!(owner.kind, SymbolKind::Aggregate(_)) {
        found = op_dispatch(ctxt, &owner, name, receiver);
    }
    if found.is_empty() && ufcs && !matches!(owner.kind, SymbolKind::Module(_) | SymbolKind::Package(_)) {
        found = ufcs_candidates(ctxt, name, receiver);
    }
    found
}

/// Members of `p.x` are looked up in what `p` points to.
fn dereferenced(mut symbol: Symbol) -> Symbol {
    while let SymbolKind::Pointer(Some(base)) = symbol.kind {
        symbol = *base;
    }
    symbol
}

fn with_receiver(symbol: Symbol, receiver: &Symbol) -> Symbol {
    symbol.with_tag(SymbolTag::Receiver(Box::new(receiver.clone())))
}

fn package_member(ctxt: &ResolutionContext<'_>, path: &str, name: &str) -> Option<Symbol> {
    let qualified = format!("{path}.{name}");
    let cache = ctxt.cache();
    if let Some(module) = cache.module(&qualified) {
        return Some(Symbol::new(SymbolKind::Module(module)).with_origin(module));
    }
    cache
        .package(&qualified)
        .map(|_| Symbol::new(SymbolKind::Package(qualified.into())))
}

/// `opDispatch!"name"` for members the aggregate does not declare.
fn op_dispatch(ctxt: &mut ResolutionContext<'_>, owner: &Symbol, name: &str, receiver: &Symbol) -> Vec<Symbol> {
    let declarations = lookup::search_members(ctxt, owner, OP_DISPATCH, MemberFilter::ALL);
    if declarations.is_empty() {
        return Vec::new();
    }
    let overloads = resolve::handle_declarations(ctxt, &declarations);
    let given = [TemplateArgument::Value(SymbolValue::Str(name.into()))];
    let found: Vec<Symbol> = templates::deduce_and_filter(ctxt, overloads, &given, true)
        .into_iter()
        .map(|s| with_receiver(s.with_tag(SymbolTag::OpDispatch(name.into())), receiver))
        .collect();
    tracing::debug!("[RESOLVE] opDispatch!\"{}\" -> {} candidate(s)", name, found.len());
    found
}

/// Free functions named `name` whose first parameter accepts the receiver.
fn ufcs_candidates(ctxt: &mut ResolutionContext<'_>, name: &str, receiver: &Symbol) -> Vec<Symbol> {
    let Some(first) = receiver.strip_members().cloned() else {
        return Vec::new();
    };
    let ast = ctxt.ast();
    let references_only = ctxt.options().contains(ResolutionOptions::RETURN_METHOD_REFERENCES_ONLY);
    let mut found = Vec::new();
    for declaration in lookup::lookup(ctxt, name, MemberFilter::METHODS) {
        let method = ast.node(declaration.node);
        if method.method_parameters().is_empty()
            || !templates::parameter_accepts(ctxt, declaration.node, 0, &first)
        {
            continue;
        }
        let Some(symbol) = resolve::handle_node_match(ctxt, declaration.node, declaration.instance.as_ref()) else {
            continue;
        };
        let symbol = with_receiver(symbol.with_tag(SymbolTag::Ufcs), receiver);
        if method.template_parameters.is_empty() || references_only {
            found.push(symbol);
        } else {
            found.extend(templates::deduce_call(ctxt, vec![symbol], &[], &[]));
        }
    }
    found
}
