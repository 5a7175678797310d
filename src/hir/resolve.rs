//! TypeResolver: turn type declarations and identifiers into symbols.
//!
//! [`resolve_type`] is the entry point for declarations as written in
//! source; [`resolve_identifier`] for a bare name. Both find declarations
//! through [`lookup`](super::lookup) and convert each one with
//! [`handle_node_match`], which is where base types, aliases, base classes
//! and template bindings get attached.
//!
//! Recursion is bounded per query by the context's
//! [`RecursionGuard`](super::context::RecursionGuard): a node re-entered
//! more than [`MAX_BASE_RESOLUTION_DEPTH`] times loses its base type, more
//! than [`MAX_NODE_RESOLUTION_DEPTH`] times resolves shallowly, and an alias
//! reached again while it is being resolved stays unresolved.

use crate::base::constants::{
    MAX_BASE_RESOLUTION_DEPTH, MAX_NODE_RESOLUTION_DEPTH, OP_APPLY, OP_APPLY_REVERSE, RANGE_BACK, RANGE_FRONT, SIZE_T,
};
use crate::syntax::{
    ArrayKey, Ast, BasicType, ClassKind, Expr, ForeachAggregate, NodeId, NodeKind, StmtId, StmtKind, TemplateParameterKind,
    TypeDecl, TypeOfTarget,
};

use super::context::{ContextFrame, ResolutionContext};
use super::diagnostics::ResolutionError;
use super::lookup::{self, Declaration, MemberFilter};
use super::members;
use super::options::{OptionOverrides, ResolutionOptions};
use super::symbols::{
    AggregateKind, DeducedTypeDictionary, Definition, DelegateSymbol, Symbol, SymbolKind, SymbolTag,
    TemplateParameterSymbol,
};
use super::templates;
use super::values::SymbolValue;

// ============================================================================
// ENTRY POINTS
// ============================================================================

/// Resolve a type declaration in the current scope. An empty result means
/// nothing was found; several results are overloads the caller did not
/// narrow down.
pub fn resolve_type(decl: &TypeDecl, ctxt: &mut ResolutionContext<'_>) -> Vec<Symbol> {
    if ctxt.is_cancelled() {
        return Vec::new();
    }
    match decl {
        TypeDecl::Basic(t) => vec![Symbol::primitive(*t)],
        TypeDecl::Identifier {
            name,
            template_args: None,
        } => resolve_identifier(name, ctxt),
        TypeDecl::Identifier {
            name,
            template_args: Some(args),
        } => {
            let overloads = resolve_overloads(name, ctxt);
            let lone = (overloads.len() == 1).then(|| overloads[0].clone());
            let given = templates::pre_resolve_arguments(ctxt, args);
            let found = templates::deduce_and_filter(ctxt, overloads, &given, false);
            if found.is_empty() {
                let mismatch = lone.and_then(|overload| templates::deduction_failure(ctxt, &overload, &given));
                match mismatch {
                    Some(error) if ctxt.guard().is_idle() && !ctxt.is_cancelled() => ctxt.log_error(error),
                    _ => report_missing(ctxt, &decl.to_string()),
                }
            }
            found
        }
        TypeDecl::Member {
            inner,
            name,
            template_args,
        } => {
            let owners = resolve_type(inner, ctxt);
            let mut found = Vec::new();
            for owner in owners.into_iter().flat_map(Symbol::into_candidates) {
                found.extend(members::member_access(ctxt, &owner, name, template_args.as_deref(), true));
            }
            if found.is_empty() {
                report_missing(ctxt, &decl.to_string());
            }
            found
        }
        TypeDecl::Pointer(inner) => resolve_type(inner, ctxt)
            .into_iter()
            .map(|base| Symbol::pointer(Some(base)))
            .collect(),
        TypeDecl::Array { element, key } => resolve_array(ctxt, element, key),
        TypeDecl::Delegate {
            return_type,
            parameters,
            is_function,
        } => {
            let return_type = resolve_single(return_type, ctxt).map(Box::new);
            let parameters = parameters.iter().filter_map(|p| resolve_single(p, ctxt)).collect();
            vec![Symbol::new(SymbolKind::Delegate(DelegateSymbol {
                return_type,
                parameters,
                is_function: *is_function,
            }))]
        }
        TypeDecl::TypeOf(TypeOfTarget::Return) => enclosing_return_type(ctxt).into_iter().collect(),
        TypeDecl::TypeOf(TypeOfTarget::Expr(expr)) => ctxt
            .evaluator()
            .evaluate_type(expr, ctxt)
            .map(|t| t.strip_members().cloned().unwrap_or(t))
            .into_iter()
            .collect(),
        TypeDecl::Modified { modifier, inner } => resolve_type(inner, ctxt)
            .into_iter()
            .map(|s| s.with_modifier(*modifier))
            .collect(),
    }
}

/// [`resolve_type`] collapsed to one symbol, `Ambiguous` for overloads.
pub fn resolve_single(decl: &TypeDecl, ctxt: &mut ResolutionContext<'_>) -> Option<Symbol> {
    Symbol::from_candidates(resolve_type(decl, ctxt))
}

/// Resolve a bare identifier, consulting the context memo first.
pub fn resolve_identifier(name: &str, ctxt: &mut ResolutionContext<'_>) -> Vec<Symbol> {
    if let Some(hit) = ctxt.cached(name) {
        tracing::trace!("[RESOLVE] memo hit for '{}'", name);
        return hit;
    }
    let overloads = resolve_overloads(name, ctxt);
    let results = if ctxt.options().contains(ResolutionOptions::NO_TEMPLATE_PARAMETER_DEDUCTION) {
        overloads
    } else {
        templates::deduce_and_filter(ctxt, overloads, &[], false)
    };
    if ctxt.is_cancelled() {
        return Vec::new();
    }
    if results.is_empty() {
        report_missing(ctxt, name);
    }
    ctxt.remember(name, &results);
    results
}

/// Every declaration named `name` visible here, converted to symbols
/// without template deduction. Falls back to modules and packages of the
/// parse cache.
pub fn resolve_overloads(name: &str, ctxt: &mut ResolutionContext<'_>) -> Vec<Symbol> {
    let declarations = lookup::lookup(ctxt, name, MemberFilter::ALL);
    let mut found = handle_declarations(ctxt, &declarations);
    if declarations.is_empty() {
        let cache = ctxt.cache();
        if let Some(module) = cache.module(name) {
            found.push(Symbol::new(SymbolKind::Module(module)).with_origin(module));
        } else if cache.package(name).is_some() {
            found.push(Symbol::new(SymbolKind::Package(name.into())));
        }
    }
    found
}

/// Top-level failures are logged; nested ones are expected and silent.
fn report_missing(ctxt: &mut ResolutionContext<'_>, subject: &str) {
    if ctxt.guard().is_idle() && !ctxt.is_cancelled() {
        ctxt.log_error(ResolutionError::nothing_found(subject, None));
    }
}

/// Convert lookup results into symbols. Alias and import results that
/// stand for several overloads are flattened.
pub fn handle_declarations(ctxt: &mut ResolutionContext<'_>, declarations: &[Declaration]) -> Vec<Symbol> {
    let mut found = Vec::new();
    for declaration in declarations {
        if ctxt.is_cancelled() {
            return Vec::new();
        }
        if let Some(symbol) = handle_node_match(ctxt, declaration.node, declaration.instance.as_ref()) {
            found.extend(symbol.into_candidates());
        }
    }
    found
}

// ============================================================================
// NODE HANDLING
// ============================================================================

/// Convert one declaration into a symbol. `instance` is the templated
/// aggregate or mixin the declaration was reached through; its bindings are
/// in scope while the declaration resolves.
pub fn handle_node_match(ctxt: &mut ResolutionContext<'_>, node: NodeId, instance: Option<&Symbol>) -> Option<Symbol> {
    let bindings = instance.and_then(Symbol::deduced).cloned().unwrap_or_default();
    handle_node_with(ctxt, node, &bindings)
}

struct Visit {
    node: NodeId,
    options: ResolutionOptions,
    /// Resolve variable types, return types and enum bases.
    resolve_base: bool,
    follow_aliases: bool,
    resolve_base_classes: bool,
    deduced: DeducedTypeDictionary,
}

pub(crate) fn handle_node_with(
    ctxt: &mut ResolutionContext<'_>,
    node: NodeId,
    bindings: &DeducedTypeDictionary,
) -> Option<Symbol> {
    let ast = ctxt.ast();
    let options = ctxt.options();
    let deduced = attach_deduced(ctxt, node, bindings);

    let depth = ctxt.guard_mut().enter(node);
    let shallow = depth > MAX_NODE_RESOLUTION_DEPTH;
    if shallow {
        tracing::debug!("[RESOLVE] '{}' exceeds node resolution depth", ast.node(node).name);
    }
    let within_base_depth = depth <= MAX_BASE_RESOLUTION_DEPTH && !shallow;
    let visit = Visit {
        node,
        options,
        resolve_base: within_base_depth && !options.contains(ResolutionOptions::DONT_RESOLVE_BASE_TYPES),
        follow_aliases: within_base_depth && !options.contains(ResolutionOptions::DONT_RESOLVE_ALIASES),
        resolve_base_classes: within_base_depth && !options.contains(ResolutionOptions::DONT_RESOLVE_BASE_CLASSES),
        deduced,
    };
    let frame = declaration_frame(ast, node).with_deduced(bindings.clone());
    let result = ctxt.with_frame(frame, |ctxt| visit_node(ctxt, &visit)).flatten();
    ctxt.guard_mut().leave(node);
    result
}

/// The frame a declaration resolves in: its own scope for blocks, the
/// parent's otherwise, positioned at the declaring statement for locals.
pub(crate) fn declaration_frame(ast: &Ast, node: NodeId) -> ContextFrame {
    let n = ast.node(node);
    let scope = if n.is_block() { node } else { n.parent.unwrap_or(node) };
    ContextFrame::new(scope).at_statement(declaring_statement(ast, node))
}

fn declaring_statement(ast: &Ast, node: NodeId) -> Option<StmtId> {
    let parent = ast.node(node).parent?;
    let NodeKind::Method { body: Some(body), .. } = &ast.node(parent).kind else {
        return None;
    };
    ast.statements_in(*body)
        .into_iter()
        .find(|&s| match &ast.statement(s).kind {
            StmtKind::Declaration(nodes) => nodes.contains(&node),
            StmtKind::Foreach { variables, .. } => variables.contains(&node),
            StmtKind::Mixin(mixin) => *mixin == node,
            _ => false,
        })
}

fn self_bound(parameter: NodeId) -> TemplateParameterSymbol {
    TemplateParameterSymbol::with_type(
        parameter,
        Symbol::template_parameter(TemplateParameterSymbol::unbound(parameter)),
    )
}

fn is_self_bound(symbol: &TemplateParameterSymbol) -> bool {
    symbol
        .base
        .as_deref()
        .and_then(Symbol::as_template_parameter)
        .is_some_and(|tp| tp.parameter == symbol.parameter && !tp.is_bound())
}

/// Template slots of `node` plus the bindings it is resolved under. Inside
/// the declaration's own body its parameters are "invisible": bound to the
/// enclosing bindings, or to themselves when there are none.
fn attach_deduced(ctxt: &ResolutionContext<'_>, node: NodeId, bindings: &DeducedTypeDictionary) -> DeducedTypeDictionary {
    let ast = ctxt.ast();
    let mut deduced = DeducedTypeDictionary::for_parameters(&ast.node(node).template_parameters);
    deduced.merge_missing(bindings);
    if !ctxt.is_in_scope_hierarchy(node) {
        return deduced;
    }
    for symbol in ctxt.deduced_parameters_in_hierarchy() {
        let owner = ast.parent(symbol.parameter);
        if owner.is_some_and(|o| ast.is_ancestor_or_self(o, node)) && !deduced.is_satisfied(symbol.parameter) {
            deduced.set(symbol);
        }
    }
    for &param in &ast.node(node).template_parameters {
        if !deduced.is_satisfied(param) {
            deduced.set(self_bound(param));
        }
    }
    deduced
}

fn visit_node(ctxt: &mut ResolutionContext<'_>, v: &Visit) -> Option<Symbol> {
    let ast = ctxt.ast();
    let node = ast.node(v.node);
    let symbol = match &node.kind {
        NodeKind::Variable {
            is_alias: true, ty, ..
        } => match ty {
            Some(target) => alias_symbol(ctxt, v, target),
            None => unresolved_alias(v.node),
        },
        NodeKind::Variable { ty, initializer, .. } => {
            let base = if v.resolve_base {
                variable_type(ctxt, v.node, ty.as_ref(), initializer.as_ref())
            } else {
                None
            };
            member(v, base)
        }
        NodeKind::Method { .. } => {
            let base = if v.resolve_base && !v.options.contains(ResolutionOptions::RETURN_METHOD_REFERENCES_ONLY) {
                return_type_in_frame(ctxt, v.node)
            } else {
                None
            };
            member(v, base)
        }
        NodeKind::EnumValue { .. } => {
            let base = match node.parent {
                Some(enumeration) if v.resolve_base => {
                    if ast.node(enumeration).name.is_empty() {
                        enum_base_type(ctxt, enumeration)
                    } else {
                        handle_node_with(ctxt, enumeration, &DeducedTypeDictionary::new())
                    }
                }
                _ => None,
            };
            member(v, base)
        }
        NodeKind::Aggregate {
            kind,
            is_mixin,
            base_classes,
        } => aggregate_symbol(ctxt, v, *kind, *is_mixin, base_classes),
        NodeKind::EponymousTemplate { .. } => {
            let mut symbol = Symbol::aggregate(AggregateKind::EponymousTemplate, v.node);
            if let Some(slot) = symbol.deduced_mut() {
                *slot = v.deduced.clone();
            }
            symbol
        }
        NodeKind::Enum { .. } => {
            let base = if v.resolve_base { enum_base_type(ctxt, v.node) } else { None };
            Symbol::new(SymbolKind::Enum {
                node: v.node,
                base: base.map(Box::new),
            })
            .with_origin(v.node)
        }
        NodeKind::Module => Symbol::new(SymbolKind::Module(v.node)).with_origin(v.node),
        NodeKind::TemplateParameter(_) => {
            let bound = ctxt
                .deduced_parameter(v.node)
                .or_else(|| v.deduced.get(v.node))
                .filter(|b| !is_self_bound(b))
                .cloned();
            Symbol::template_parameter(bound.unwrap_or_else(|| TemplateParameterSymbol::unbound(v.node)))
        }
        NodeKind::ImportSymbol { module, target } => {
            let module = ctxt.cache().module(module)?;
            let owner = Symbol::new(SymbolKind::Module(module)).with_origin(module);
            let declarations = lookup::search_members(ctxt, &owner, target, MemberFilter::ALL);
            let found = handle_declarations(ctxt, &declarations)
                .into_iter()
                .map(|s| s.with_tag(SymbolTag::Alias(v.node)))
                .collect();
            Symbol::from_candidates(found)?
        }
        NodeKind::ModuleAlias { module } => {
            let module = ctxt.cache().module(module)?;
            Symbol::new(SymbolKind::Module(module))
                .with_origin(module)
                .with_tag(SymbolTag::Alias(v.node))
        }
        NodeKind::TemplateMixin { .. } => mixin_instance(ctxt, v.node)?,
        NodeKind::Import { .. } => return None,
    };
    tracing::trace!("[RESOLVE] '{}' -> {}", node.name, symbol.display(ast));
    Some(symbol)
}

fn member(v: &Visit, base: Option<Symbol>) -> Symbol {
    let mut symbol = Symbol::member(Definition::Node(v.node), base);
    if let Some(slot) = symbol.deduced_mut() {
        *slot = v.deduced.clone();
    }
    symbol
}

fn unresolved_alias(node: NodeId) -> Symbol {
    Symbol::new(SymbolKind::Alias { node, base: None }).with_origin(node)
}

fn alias_symbol(ctxt: &mut ResolutionContext<'_>, v: &Visit, target: &TypeDecl) -> Symbol {
    if !v.follow_aliases {
        return unresolved_alias(v.node);
    }
    if !ctxt.guard_mut().begin_resolving(v.node) {
        tracing::debug!("[RESOLVE] alias cycle through '{}'", ctxt.ast().node(v.node).name);
        return unresolved_alias(v.node);
    }
    let overrides = OptionOverrides::new().enable(ResolutionOptions::RETURN_METHOD_REFERENCES_ONLY);
    let targets = ctxt
        .with_overrides(overrides, |ctxt| resolve_type(target, ctxt))
        .unwrap_or_default();
    ctxt.guard_mut().end_resolving(v.node);

    let tagged = targets
        .into_iter()
        .map(|t| t.with_tag(SymbolTag::Alias(v.node)))
        .collect();
    Symbol::from_candidates(tagged).unwrap_or_else(|| unresolved_alias(v.node))
}

fn aggregate_symbol(
    ctxt: &mut ResolutionContext<'_>,
    v: &Visit,
    kind: ClassKind,
    is_mixin: bool,
    base_classes: &[TypeDecl],
) -> Symbol {
    let aggregate_kind = match (kind, is_mixin) {
        (ClassKind::Template, true) => AggregateKind::MixinTemplate,
        (ClassKind::Template, false) => AggregateKind::Template,
        (ClassKind::Struct, _) => AggregateKind::Struct,
        (ClassKind::Union, _) => AggregateKind::Union,
        (ClassKind::Class, _) => AggregateKind::Class,
        (ClassKind::Interface, _) => AggregateKind::Interface,
    };
    let mut symbol = Symbol::aggregate(aggregate_kind, v.node);
    let resolve_bases = aggregate_kind.is_class_like() && !base_classes.is_empty() && v.resolve_base_classes;
    let (base_class, interfaces) = if resolve_bases && ctxt.guard_mut().begin_resolving(v.node) {
        let bases = resolve_base_classes(ctxt, kind, base_classes);
        ctxt.guard_mut().end_resolving(v.node);
        bases
    } else {
        (None, Vec::new())
    };
    if let SymbolKind::Aggregate(agg) = &mut symbol.kind {
        agg.base_class = base_class.map(Box::new);
        agg.interfaces = interfaces;
        agg.deduced = v.deduced.clone();
    }
    symbol
}

/// The first listed base of a class may be a class; everything else is an
/// interface.
fn resolve_base_classes(
    ctxt: &mut ResolutionContext<'_>,
    kind: ClassKind,
    base_classes: &[TypeDecl],
) -> (Option<Symbol>, Vec<Symbol>) {
    let mut base_class = None;
    let mut interfaces = Vec::new();
    for (i, decl) in base_classes.iter().enumerate() {
        let Some(base) = resolve_type(decl, ctxt).into_iter().find(|s| s.as_aggregate().is_some()) else {
            tracing::debug!("[RESOLVE] base '{}' not found", decl);
            continue;
        };
        let is_class = base.as_aggregate().is_some_and(|a| a.kind == AggregateKind::Class);
        if i == 0 && kind == ClassKind::Class && is_class {
            base_class = Some(base);
        } else {
            interfaces.push(base);
        }
    }
    (base_class, interfaces)
}

fn enum_base_type(ctxt: &mut ResolutionContext<'_>, enumeration: NodeId) -> Option<Symbol> {
    match &ctxt.ast().node(enumeration).kind {
        NodeKind::Enum { base: Some(base) } => resolve_single(base, ctxt),
        _ => Some(Symbol::primitive(BasicType::Int)),
    }
}

// ============================================================================
// VARIABLES AND METHODS
// ============================================================================

fn variable_type(
    ctxt: &mut ResolutionContext<'_>,
    node: NodeId,
    ty: Option<&TypeDecl>,
    initializer: Option<&Expr>,
) -> Option<Symbol> {
    if let Some(ty) = ty {
        return resolve_single(ty, ctxt);
    }
    if let Some(initializer) = initializer {
        let inferred = ctxt.evaluator().evaluate_type(initializer, ctxt)?;
        return Some(inferred.strip_members().cloned().unwrap_or(inferred));
    }
    foreach_variable_type(ctxt, node)
}

/// The declared return type of `method`, or the type of its first
/// non-null `return`; `void` when the body returns nothing.
pub fn method_return_type(ctxt: &mut ResolutionContext<'_>, method: NodeId) -> Option<Symbol> {
    ctxt.with_frame(ContextFrame::new(method), |ctxt| return_type_in_frame(ctxt, method))
        .flatten()
}

fn return_type_in_frame(ctxt: &mut ResolutionContext<'_>, method: NodeId) -> Option<Symbol> {
    let ast = ctxt.ast();
    let NodeKind::Method { return_type, body, .. } = &ast.node(method).kind else {
        return None;
    };
    if let Some(return_type) = return_type {
        return resolve_single(return_type, ctxt);
    }
    let body = (*body)?;
    let returned = ast
        .statements_in(body)
        .into_iter()
        .find_map(|s| match &ast.statement(s).kind {
            StmtKind::Return(Some(expr)) if !expr.is_null() => Some((s, expr)),
            _ => None,
        });
    let Some((statement, expr)) = returned else {
        return Some(Symbol::primitive(BasicType::Void));
    };
    let frame = ContextFrame::new(method).at_statement(Some(statement));
    ctxt.with_frame(frame, |ctxt| ctxt.evaluator().evaluate_type(expr, ctxt))
        .flatten()
        .map(|t| t.strip_members().cloned().unwrap_or(t))
}

fn enclosing_return_type(ctxt: &mut ResolutionContext<'_>) -> Option<Symbol> {
    let ast = ctxt.ast();
    let method = ast
        .self_and_ancestors(ctxt.current_scope())
        .find(|&n| ast.node(n).is_method())?;
    method_return_type(ctxt, method)
}

/// The type a `foreach` header variable takes from the iterated aggregate.
fn foreach_variable_type(ctxt: &mut ResolutionContext<'_>, variable: NodeId) -> Option<Symbol> {
    let ast = ctxt.ast();
    let statement = declaring_statement(ast, variable)?;
    let StmtKind::Foreach {
        variables,
        aggregate,
        is_reverse,
        ..
    } = &ast.statement(statement).kind
    else {
        return None;
    };
    let index = variables.iter().position(|&v| v == variable)?;
    let count = variables.len();
    match aggregate {
        ForeachAggregate::Range(lower, _) => Some(
            ctxt.evaluator()
                .evaluate_type(lower, ctxt)
                .and_then(|t| t.strip_members().cloned())
                .unwrap_or_else(|| Symbol::primitive(BasicType::Int)),
        ),
        ForeachAggregate::Expr(expr) => {
            let iterated = ctxt.evaluator().evaluate_type(expr, ctxt)?;
            let iterated = iterated.strip_members()?.clone();
            iteration_type(ctxt, &iterated, index, count, *is_reverse)
        }
    }
}

fn size_type(ctxt: &mut ResolutionContext<'_>) -> Symbol {
    resolve_overloads(SIZE_T, ctxt)
        .into_iter()
        .next()
        .unwrap_or_else(|| Symbol::primitive(BasicType::Ulong))
}

fn iteration_type(
    ctxt: &mut ResolutionContext<'_>,
    iterated: &Symbol,
    index: usize,
    count: usize,
    is_reverse: bool,
) -> Option<Symbol> {
    let is_key = count == 2 && index == 0;
    match &iterated.kind {
        SymbolKind::Array { element, .. } | SymbolKind::Pointer(element) => {
            if is_key {
                Some(size_type(ctxt))
            } else {
                element.as_deref().cloned()
            }
        }
        SymbolKind::AssociativeArray { key, value } => {
            if is_key {
                key.as_deref().cloned()
            } else {
                value.as_deref().cloned()
            }
        }
        SymbolKind::Aggregate(_) => {
            let apply = if is_reverse { OP_APPLY_REVERSE } else { OP_APPLY };
            if let Some(ty) = op_apply_parameter(ctxt, iterated, apply, index, count) {
                return Some(ty);
            }
            let accessor = if is_reverse { RANGE_BACK } else { RANGE_FRONT };
            members::resolve_further(ctxt, accessor, iterated, false)
                .into_iter()
                .find_map(|m| m.strip_members().cloned())
        }
        _ => None,
    }
}

/// Parameter `index` of the delegate `opApply` takes, when its arity
/// matches the number of loop variables.
fn op_apply_parameter(
    ctxt: &mut ResolutionContext<'_>,
    owner: &Symbol,
    name: &str,
    index: usize,
    count: usize,
) -> Option<Symbol> {
    let ast = ctxt.ast();
    for declaration in lookup::search_members(ctxt, owner, name, MemberFilter::METHODS) {
        let method = ast.node(declaration.node);
        let Some(&callback) = method.method_parameters().first() else {
            continue;
        };
        let Some(TypeDecl::Delegate { parameters, .. }) = ast.node(callback).declared_type() else {
            continue;
        };
        if parameters.len() != count {
            continue;
        }
        let deduced = owner.deduced().cloned().unwrap_or_default();
        let frame = ContextFrame::new(declaration.node).with_deduced(deduced);
        return ctxt
            .with_frame(frame, |ctxt| resolve_single(&parameters[index], ctxt))
            .flatten();
    }
    None
}

// ============================================================================
// ARRAYS
// ============================================================================

fn resolve_array(ctxt: &mut ResolutionContext<'_>, element: &TypeDecl, key: &ArrayKey) -> Vec<Symbol> {
    let elements = resolve_type(element, ctxt);
    match key {
        ArrayKey::None => elements.into_iter().map(|e| Symbol::array(Some(e))).collect(),
        ArrayKey::Expr(length) => sized(ctxt, elements, length),
        ArrayKey::Type(key) => {
            // `T[N]` with an identifier `N` arrives as a type key.
            let keys = resolve_type(key, ctxt);
            match keys.first() {
                Some(k) if is_value_like(ctxt.ast(), k) => sized(ctxt, elements, &Expr::Type((**key).clone())),
                Some(k) => elements
                    .into_iter()
                    .map(|e| Symbol::assoc_array(Some(k.clone()), Some(e)))
                    .collect(),
                None => elements
                    .into_iter()
                    .map(|e| Symbol::assoc_array(None, Some(e)))
                    .collect(),
            }
        }
    }
}

fn is_value_like(ast: &Ast, symbol: &Symbol) -> bool {
    match &symbol.kind {
        SymbolKind::Member(_) => true,
        SymbolKind::TemplateParameter(tp) => {
            tp.value.is_some()
                || matches!(
                    ast.node(tp.parameter).template_parameter_kind(),
                    Some(TemplateParameterKind::Value { .. })
                )
        }
        _ => false,
    }
}

/// `element[length]`: a fixed array, an associative array when `length`
/// names a type, or an item of a tuple `element`.
fn sized(ctxt: &mut ResolutionContext<'_>, elements: Vec<Symbol>, length: &Expr) -> Vec<Symbol> {
    let mut out = Vec::new();
    for element in elements {
        let evaluated = ctxt.evaluator().evaluate_value(length, ctxt);
        if let Some(SymbolKind::Tuple(items)) = element.strip_members().map(|s| &s.kind) {
            let item = evaluated
                .ok()
                .and_then(|v| v.as_int())
                .and_then(|i| usize::try_from(i).ok())
                .and_then(|i| items.get(i));
            match item {
                Some(item) => out.extend(item.as_type().cloned()),
                None => ctxt.log_error(ResolutionError::nothing_found_because(
                    length.to_string(),
                    None,
                    format!("tuple only has {} items", items.len()),
                )),
            }
            continue;
        }
        let symbol = match evaluated {
            Ok(SymbolValue::Type(key)) => Symbol::assoc_array(Some(*key), Some(element)),
            Ok(value) => match value.as_int() {
                Some(n) => match u64::try_from(n) {
                    Ok(n) => Symbol::fixed_array(Some(element), n),
                    Err(_) => {
                        let reason = if n < 0 { "negative array length" } else { "array length too large" };
                        ctxt.log_error(ResolutionError::nothing_found_because(length.to_string(), None, reason));
                        Symbol::array(Some(element))
                    }
                },
                None => Symbol::array(Some(element)),
            },
            Err(err) => {
                tracing::trace!("[RESOLVE] array length {} unknown: {}", length, err);
                Symbol::array(Some(element))
            }
        };
        out.push(symbol);
    }
    out
}

// ============================================================================
// MIXINS
// ============================================================================

/// The mixin template instance a `mixin Foo!(args);` declaration splices in.
pub fn mixin_instance(ctxt: &mut ResolutionContext<'_>, mixin: NodeId) -> Option<Symbol> {
    let ast = ctxt.ast();
    let NodeKind::TemplateMixin { target } = &ast.node(mixin).kind else {
        return None;
    };
    if !ctxt.guard_mut().begin_resolving(mixin) {
        return None;
    }
    let frame = declaration_frame(ast, mixin);
    let found = ctxt
        .with_frame(frame, |ctxt| resolve_type(target, ctxt))
        .unwrap_or_default();
    ctxt.guard_mut().end_resolving(mixin);
    found
        .into_iter()
        .find(|s| s.as_aggregate().is_some_and(|a| a.kind == AggregateKind::MixinTemplate))
}
