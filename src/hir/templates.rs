//! TemplateDeductionEngine: bind template arguments and filter overloads.
//!
//! Every overload a lookup produces passes through here before it reaches
//! the caller:
//!
//! ```text
//! explicit arguments → parameter binding (defaults, tuples, `this`)
//!   → [call sites] argument-type deduction
//!   → specialization checks → constraint filter
//!   → most-specialized selection → eponymous / implicit-property expansion
//! ```
//!
//! Overloads that fail any step are discarded silently. Only
//! [`select_single`] reports problems, and only when the caller needs
//! exactly one result.

use crate::syntax::{ArrayKey, Expr, NodeId, NodeKind, TemplateArg, TemplateParameterKind, TypeDecl};

use super::compare;
use super::context::{ContextFrame, ResolutionContext};
use super::diagnostics::ResolutionError;
use super::resolve;
use super::symbols::{
    AggregateKind, DeducedTypeDictionary, Definition, Symbol, SymbolKind, SymbolTag, TemplateParameterSymbol,
};
use super::values::{SymbolValue, TemplateArgument};

// ============================================================================
// ARGUMENTS
// ============================================================================

/// Turn syntactic template arguments into resolved ones.
///
/// Type arguments resolving to several overloads use the first; arguments
/// naming constants are folded to their value. Expressions that cannot be
/// folded become symbolic placeholders.
pub fn pre_resolve_arguments(ctxt: &mut ResolutionContext<'_>, args: &[TemplateArg]) -> Vec<TemplateArgument> {
    args.iter()
        .map(|arg| match arg {
            TemplateArg::Type(decl) => pre_resolve_type(ctxt, decl),
            TemplateArg::Value(expr) => match ctxt.evaluator().evaluate_value(expr, ctxt) {
                Ok(SymbolValue::Type(ty)) => TemplateArgument::Type(*ty),
                Ok(value) => TemplateArgument::Value(value),
                Err(err) => {
                    tracing::debug!("[TEMPLATES] argument {} kept symbolic: {}", expr, err);
                    TemplateArgument::Value(SymbolValue::Symbolic(expr.to_string().into()))
                }
            },
        })
        .collect()
}

fn pre_resolve_type(ctxt: &mut ResolutionContext<'_>, decl: &TypeDecl) -> TemplateArgument {
    let mut results = resolve::resolve_type(decl, ctxt);
    if results.len() > 1 {
        tracing::trace!("[TEMPLATES] argument {} has {} overloads, using the first", decl, results.len());
    }
    if results.is_empty() {
        return TemplateArgument::Unresolved(decl.to_string().into());
    }
    let first = results.swap_remove(0);
    if !first.is_member() {
        return TemplateArgument::Type(first);
    }
    // A constant named where a type was expected.
    match ctxt.evaluator().evaluate_value(&Expr::Type(decl.clone()), ctxt) {
        Ok(SymbolValue::Type(ty)) => TemplateArgument::Type(*ty),
        Ok(value) => TemplateArgument::Value(value),
        Err(err) => {
            tracing::debug!("[TEMPLATES] could not evaluate {}: {}", decl, err);
            TemplateArgument::Type(first)
        }
    }
}

// ============================================================================
// PUBLIC API
// ============================================================================

/// Bind `given` to each overload's template parameters and keep the
/// overloads that accept them.
///
/// At call sites (`is_call_site`) surplus arguments and parameters left for
/// argument-type deduction are tolerated.
pub fn deduce_and_filter(
    ctxt: &mut ResolutionContext<'_>,
    overloads: Vec<Symbol>,
    given: &[TemplateArgument],
    is_call_site: bool,
) -> Vec<Symbol> {
    let mut survivors = Vec::new();
    for overload in overloads.into_iter().flat_map(Symbol::into_candidates) {
        if ctxt.is_cancelled() {
            return Vec::new();
        }
        if let Some(symbol) = deduce_overload(ctxt, overload, given, is_call_site) {
            survivors.push(symbol);
        }
    }
    let survivors = filter_by_constraints(ctxt, survivors);
    let survivors = most_specialized(ctxt, survivors);
    survivors.into_iter().flat_map(|s| expand(ctxt, s)).collect()
}

/// Select the method overloads a call with `arguments` can bind to,
/// deducing template parameters from argument types where needed.
///
/// `None` arguments have an unknown type and match any parameter.
pub fn deduce_call(
    ctxt: &mut ResolutionContext<'_>,
    overloads: Vec<Symbol>,
    explicit: &[TemplateArgument],
    arguments: &[Option<Symbol>],
) -> Vec<Symbol> {
    let ast = ctxt.ast();
    let mut survivors = Vec::new();
    for overload in overloads.into_iter().flat_map(Symbol::into_candidates) {
        if ctxt.is_cancelled() {
            return Vec::new();
        }
        let Some(method) = overload.definition_node().filter(|&n| ast.node(n).is_method()) else {
            continue;
        };
        let mut args = arguments.to_vec();
        if overload.has_tag(&SymbolTag::Ufcs) {
            let receiver = overload.receiver().and_then(Symbol::strip_members).cloned();
            args.insert(0, receiver);
        }

        let params = &ast.node(method).template_parameters;
        let mut deduced = DeducedTypeDictionary::for_parameters(params);
        if let Some(outer) = overload.deduced() {
            deduced.merge_missing(outer);
        }
        if !deduce_parameters(ctxt, method, &mut deduced, explicit, &overload, false, false) {
            continue;
        }
        if !match_arguments(ctxt, method, &mut deduced, &args) {
            tracing::trace!("[TEMPLATES] {} rejects the call arguments", ast.node(method).name);
            continue;
        }
        apply_defaults(ctxt, method, &mut deduced);
        if !deduced.all_satisfied() || !specializations_hold(ctxt, method, &mut deduced) {
            tracing::trace!("[TEMPLATES] {} left parameters undeduced", ast.node(method).name);
            continue;
        }
        survivors.push(instantiate(ctxt, &overload, method, &deduced));
    }
    let survivors = filter_by_constraints(ctxt, survivors);
    most_specialized(ctxt, survivors)
}

/// The single remaining overload. Logs NothingFound or
/// AmbiguousSpecialization otherwise.
pub fn select_single(ctxt: &mut ResolutionContext<'_>, mut overloads: Vec<Symbol>, subject: &str) -> Option<Symbol> {
    match overloads.len() {
        0 => {
            ctxt.log_error(ResolutionError::nothing_found(subject, None));
            None
        }
        1 => overloads.pop(),
        _ => {
            ctxt.log_error(ResolutionError::ambiguous_specialization(subject, overloads));
            None
        }
    }
}

/// Whether parameter `index` of `method` accepts an argument of type
/// `argument`, deducing into a scratch dictionary.
pub(crate) fn parameter_accepts(ctxt: &mut ResolutionContext<'_>, method: NodeId, index: usize, argument: &Symbol) -> bool {
    let ast = ctxt.ast();
    let node = ast.node(method);
    let Some(&param) = node.method_parameters().get(index) else {
        return false;
    };
    let Some(decl) = ast.node(param).declared_type() else {
        return true;
    };
    if tuple_parameter_named(ctxt, method, decl).is_some() {
        return true;
    }
    let mut scratch = DeducedTypeDictionary::for_parameters(&node.template_parameters);
    match_parameter(ctxt, method, decl, argument, &mut scratch)
}

// ============================================================================
// PARAMETER BINDING
// ============================================================================

fn deduce_overload(
    ctxt: &mut ResolutionContext<'_>,
    overload: Symbol,
    given: &[TemplateArgument],
    is_call_site: bool,
) -> Option<Symbol> {
    // Template parameters stand for whatever they are bound to.
    if let SymbolKind::TemplateParameter(tp) = &overload.kind {
        return match tp.base.as_deref() {
            Some(base) if !given.is_empty() => deduce_overload(ctxt, base.clone(), given, is_call_site),
            _ => given.is_empty().then_some(overload),
        };
    }

    let ast = ctxt.ast();
    let Some(node) = overload.definition_node() else {
        return given.is_empty().then_some(overload);
    };
    let params = &ast.node(node).template_parameters;
    if params.is_empty() || !declares_template(&overload) {
        return (given.is_empty() || is_call_site).then_some(overload);
    }
    // Function templates referenced without arguments wait for the call.
    if given.is_empty() && ast.node(node).is_method() {
        return Some(overload);
    }

    let mut deduced = overload
        .deduced()
        .cloned()
        .unwrap_or_else(|| DeducedTypeDictionary::for_parameters(params));
    for &param in params {
        if !deduced.contains(param) {
            deduced.declare(param);
        }
    }
    if given.is_empty() && deduced.all_satisfied() {
        return Some(overload);
    }
    if !given.is_empty() {
        for &param in params {
            deduced.clear(param);
        }
    }

    if !deduce_parameters(ctxt, node, &mut deduced, given, &overload, is_call_site, true) {
        return None;
    }
    if !is_call_site && !deduced.all_satisfied() {
        tracing::trace!("[TEMPLATES] {} left parameters unbound", ast.node(node).name);
        return None;
    }
    if !specializations_hold(ctxt, node, &mut deduced) {
        return None;
    }
    Some(with_deduced(ctxt, overload, node, deduced))
}

/// Only symbols that own their declaration's template parameters are
/// instantiated; a variable of type `Foo!int` is not itself a template.
fn declares_template(symbol: &Symbol) -> bool {
    match &symbol.kind {
        SymbolKind::Aggregate(_) => true,
        SymbolKind::Member(member) => !member.deduced.is_empty(),
        _ => false,
    }
}

fn with_deduced(ctxt: &mut ResolutionContext<'_>, mut overload: Symbol, node: NodeId, deduced: DeducedTypeDictionary) -> Symbol {
    if overload.is_member() {
        return instantiate(ctxt, &overload, node, &deduced);
    }
    if let Some(slot) = overload.deduced_mut() {
        *slot = deduced;
    }
    overload
}

/// Re-resolve `node` under `deduced`, keeping the overload's provenance.
fn instantiate(ctxt: &mut ResolutionContext<'_>, overload: &Symbol, node: NodeId, deduced: &DeducedTypeDictionary) -> Symbol {
    let mut symbol = resolve::handle_node_with(ctxt, node, deduced).unwrap_or_else(|| overload.clone());
    for tag in &overload.tags {
        if !symbol.tags.contains(tag) {
            symbol.tags.push(tag.clone());
        }
    }
    symbol
}

/// Walk the template parameters of `owner` binding `given` in order.
fn deduce_parameters(
    ctxt: &mut ResolutionContext<'_>,
    owner: NodeId,
    deduced: &mut DeducedTypeDictionary,
    given: &[TemplateArgument],
    overload: &Symbol,
    is_call_site: bool,
    use_defaults: bool,
) -> bool {
    let ast = ctxt.ast();
    let mut next = 0;
    for &param in &ast.node(owner).template_parameters {
        let Some(kind) = ast.node(param).template_parameter_kind() else {
            continue;
        };
        let kind = match kind {
            TemplateParameterKind::This(inner) => {
                if let Some(receiver) = overload.receiver().and_then(Symbol::strip_members) {
                    deduced.set(TemplateParameterSymbol::with_type(param, receiver.clone()));
                    continue;
                }
                inner.as_ref()
            }
            other => other,
        };
        if matches!(kind, TemplateParameterKind::Tuple) {
            let rest = given.get(next..).unwrap_or_default().to_vec();
            next = given.len();
            deduced.set(TemplateParameterSymbol::with_type(param, Symbol::tuple(rest)));
            continue;
        }
        match given.get(next) {
            Some(arg) => {
                next += 1;
                if !bind_argument(ctxt, param, kind, arg, deduced) {
                    return false;
                }
            }
            None if use_defaults && !deduced.is_satisfied(param) => {
                default_for(ctxt, owner, param, kind, deduced);
            }
            None => {}
        }
    }
    if next < given.len() && !is_call_site {
        tracing::trace!("[TEMPLATES] {} given too many arguments", ast.node(owner).name);
        return false;
    }
    true
}

fn bind_argument(
    ctxt: &mut ResolutionContext<'_>,
    param: NodeId,
    kind: &TemplateParameterKind,
    arg: &TemplateArgument,
    deduced: &mut DeducedTypeDictionary,
) -> bool {
    match try_bind(ctxt, param, kind, arg, deduced) {
        Ok(()) => true,
        Err(mismatch) => {
            tracing::trace!("[TEMPLATES] {}", mismatch);
            false
        }
    }
}

fn try_bind(
    ctxt: &ResolutionContext<'_>,
    param: NodeId,
    kind: &TemplateParameterKind,
    arg: &TemplateArgument,
    deduced: &mut DeducedTypeDictionary,
) -> Result<(), ResolutionError> {
    let bound = match (kind, arg) {
        (_, TemplateArgument::Unresolved(_)) => None,
        (TemplateParameterKind::Type { .. }, _) => arg
            .as_type()
            .map(|ty| TemplateParameterSymbol::with_type(param, ty.clone())),
        (TemplateParameterKind::Value { .. }, TemplateArgument::Value(value)) if !matches!(value, SymbolValue::Type(_)) => {
            Some(TemplateParameterSymbol::with_value(param, value.clone()))
        }
        (TemplateParameterKind::Value { .. }, _) => None,
        (TemplateParameterKind::Alias { .. }, _) => match arg.as_type() {
            Some(ty) => Some(TemplateParameterSymbol::with_type(param, ty.clone())),
            None => arg.as_value().map(|v| TemplateParameterSymbol::with_value(param, v.clone())),
        },
        (TemplateParameterKind::This(inner), _) => return try_bind(ctxt, param, inner, arg, deduced),
        (TemplateParameterKind::Tuple, _) => None,
    };
    match bound {
        Some(symbol) => {
            deduced.set(symbol);
            Ok(())
        }
        None => Err(ResolutionError::deduction(
            param,
            ctxt.ast().node(param).name.clone(),
            Some(arg.clone()),
            "argument does not fit the parameter kind",
        )),
    }
}

/// The first explicit argument `overload` rejects, for reporting when a
/// lone template cannot be instantiated. `None` when the arguments bind
/// and the failure lies elsewhere (specializations, constraints).
pub(crate) fn deduction_failure(
    ctxt: &ResolutionContext<'_>,
    overload: &Symbol,
    given: &[TemplateArgument],
) -> Option<ResolutionError> {
    let ast = ctxt.ast();
    let node = overload.definition_node()?;
    let params = &ast.node(node).template_parameters;
    let mut scratch = DeducedTypeDictionary::for_parameters(params);
    for (&param, arg) in params.iter().zip(given) {
        let kind = ast.node(param).template_parameter_kind()?;
        if matches!(kind, TemplateParameterKind::Tuple | TemplateParameterKind::This(_)) {
            return None;
        }
        if let Err(mismatch) = try_bind(ctxt, param, kind, arg, &mut scratch) {
            return Some(mismatch);
        }
    }
    None
}

/// Bind the default of `param`, evaluated with the earlier bindings in scope.
fn default_for(
    ctxt: &mut ResolutionContext<'_>,
    owner: NodeId,
    param: NodeId,
    kind: &TemplateParameterKind,
    deduced: &mut DeducedTypeDictionary,
) {
    let frame = ContextFrame::new(owner).with_deduced(deduced.clone());
    let bound = ctxt
        .with_frame(frame, |ctxt| match kind {
            TemplateParameterKind::Type { default: Some(decl), .. }
            | TemplateParameterKind::Alias {
                default: Some(TemplateArg::Type(decl)),
                ..
            } => resolve::resolve_type(decl, ctxt)
                .into_iter()
                .next()
                .map(|ty| TemplateParameterSymbol::with_type(param, ty)),
            TemplateParameterKind::Value { default: Some(expr), .. }
            | TemplateParameterKind::Alias {
                default: Some(TemplateArg::Value(expr)),
                ..
            } => ctxt
                .evaluator()
                .evaluate_value(expr, ctxt)
                .ok()
                .map(|value| TemplateParameterSymbol::with_value(param, value)),
            _ => None,
        })
        .flatten();
    if let Some(symbol) = bound {
        deduced.set(symbol);
    }
}

fn apply_defaults(ctxt: &mut ResolutionContext<'_>, owner: NodeId, deduced: &mut DeducedTypeDictionary) {
    let ast = ctxt.ast();
    for &param in &ast.node(owner).template_parameters {
        if deduced.is_satisfied(param) {
            continue;
        }
        let kind = match ast.node(param).template_parameter_kind() {
            Some(TemplateParameterKind::This(inner)) => inner.as_ref(),
            Some(TemplateParameterKind::Tuple) => {
                deduced.set(TemplateParameterSymbol::with_type(param, Symbol::tuple(Vec::new())));
                continue;
            }
            Some(kind) => kind,
            None => continue,
        };
        default_for(ctxt, owner, param, kind, deduced);
    }
}

/// Check every bound parameter of `owner` against its specialization.
/// Specializations may bind further parameters (`T : U[]`).
fn specializations_hold(ctxt: &mut ResolutionContext<'_>, owner: NodeId, deduced: &mut DeducedTypeDictionary) -> bool {
    let ast = ctxt.ast();
    for &param in &ast.node(owner).template_parameters {
        let kind = match ast.node(param).template_parameter_kind() {
            Some(TemplateParameterKind::This(inner)) => inner.as_ref(),
            Some(kind) => kind,
            None => continue,
        };
        let Some(bound) = deduced.get(param).cloned() else {
            continue;
        };
        let holds = match kind {
            TemplateParameterKind::Type {
                specialization: Some(spec),
                ..
            }
            | TemplateParameterKind::Alias {
                specialization: Some(spec),
                ..
            } => match bound.base.as_deref() {
                Some(ty) => type_matches_specialization(ctxt, owner, spec, ty, deduced),
                None => false,
            },
            TemplateParameterKind::Value {
                specialization: Some(spec),
                ..
            } => {
                let frame = ContextFrame::new(owner).with_deduced(deduced.clone());
                let expected = ctxt.with_frame(frame, |ctxt| ctxt.evaluator().evaluate_value(spec, ctxt));
                match (expected, bound.value.as_ref()) {
                    (Some(Ok(expected)), Some(value)) => value.same_value(&expected),
                    _ => false,
                }
            }
            _ => true,
        };
        if !holds {
            tracing::trace!(
                "[TEMPLATES] {}",
                ResolutionError::deduction(param, ast.node(param).name.clone(), bound.as_argument(), "specialization does not match")
            );
            return false;
        }
    }
    true
}

fn type_matches_specialization(
    ctxt: &mut ResolutionContext<'_>,
    owner: NodeId,
    spec: &TypeDecl,
    ty: &Symbol,
    deduced: &mut DeducedTypeDictionary,
) -> bool {
    let frame = ContextFrame::new(owner).with_deduced(deduced.clone());
    let expected = ctxt
        .with_frame(frame, |ctxt| resolve::resolve_type(spec, ctxt))
        .unwrap_or_default();
    expected
        .iter()
        .any(|e| compare::is_implicitly_convertible_deducing(ty, e, deduced))
}

// ============================================================================
// ARGUMENT-TYPE DEDUCTION
// ============================================================================

fn tuple_parameter_named(ctxt: &ResolutionContext<'_>, owner: NodeId, decl: &TypeDecl) -> Option<NodeId> {
    let ast = ctxt.ast();
    let name = decl.as_plain_identifier()?;
    ast.node(owner).template_parameters.iter().copied().find(|&p| {
        let node = ast.node(p);
        node.name == *name && matches!(node.template_parameter_kind(), Some(TemplateParameterKind::Tuple))
    })
}

fn value_parameter_named(ctxt: &ResolutionContext<'_>, owner: NodeId, name: &str) -> Option<NodeId> {
    let ast = ctxt.ast();
    ast.node(owner).template_parameters.iter().copied().find(|&p| {
        let node = ast.node(p);
        node.name == name && matches!(node.template_parameter_kind(), Some(TemplateParameterKind::Value { .. }))
    })
}

/// Match call argument types against the function parameters of `method`.
fn match_arguments(
    ctxt: &mut ResolutionContext<'_>,
    method: NodeId,
    deduced: &mut DeducedTypeDictionary,
    args: &[Option<Symbol>],
) -> bool {
    let ast = ctxt.ast();
    let parameters = ast.node(method).method_parameters();
    for (i, &param) in parameters.iter().enumerate() {
        let param_node = ast.node(param);
        let Some(decl) = param_node.declared_type() else {
            continue;
        };
        if let Some(tuple) = tuple_parameter_named(ctxt, method, decl) {
            let rest = args
                .get(i..)
                .unwrap_or_default()
                .iter()
                .map(|arg| match arg {
                    Some(ty) => TemplateArgument::Type(ty.strip_members().cloned().unwrap_or_else(|| ty.clone())),
                    None => TemplateArgument::Unresolved("?".into()),
                })
                .collect();
            deduced.set(TemplateParameterSymbol::with_type(tuple, Symbol::tuple(rest)));
            return true;
        }
        match args.get(i) {
            None if param_node.initializer().is_some() => {}
            None => return false,
            Some(None) => {}
            Some(Some(arg)) => {
                if !match_parameter(ctxt, method, decl, arg, deduced) {
                    return false;
                }
            }
        }
    }
    args.len() <= parameters.len()
}

/// Match one argument type against a parameter type pattern.
fn match_parameter(
    ctxt: &mut ResolutionContext<'_>,
    owner: NodeId,
    decl: &TypeDecl,
    arg: &Symbol,
    deduced: &mut DeducedTypeDictionary,
) -> bool {
    let Some(arg) = arg.strip_members() else {
        return true;
    };
    match decl {
        TypeDecl::Modified { inner, .. } => match_parameter(ctxt, owner, inner, arg, deduced),
        TypeDecl::Identifier {
            name,
            template_args: Some(pattern),
        } => match_instance(ctxt, owner, name, pattern, arg, deduced),
        TypeDecl::Array {
            element,
            key: ArrayKey::Expr(length),
        } => match (length.as_ref(), &arg.kind) {
            (
                Expr::Identifier(name),
                SymbolKind::Array {
                    element: Some(arg_element),
                    fixed_length: Some(n),
                },
            ) if value_parameter_named(ctxt, owner, name).is_some() => {
                bind_length(ctxt, owner, name, *n, deduced) && match_parameter(ctxt, owner, element, arg_element, deduced)
            }
            _ => match_resolved(ctxt, owner, decl, arg, deduced),
        },
        TypeDecl::Array {
            element,
            key: ArrayKey::Type(key),
        } => match (key.as_plain_identifier(), &arg.kind) {
            (
                Some(name),
                SymbolKind::Array {
                    element: Some(arg_element),
                    fixed_length: Some(n),
                },
            ) if value_parameter_named(ctxt, owner, name).is_some() => {
                bind_length(ctxt, owner, name, *n, deduced) && match_parameter(ctxt, owner, element, arg_element, deduced)
            }
            _ => match_resolved(ctxt, owner, decl, arg, deduced),
        },
        _ => match_resolved(ctxt, owner, decl, arg, deduced),
    }
}

fn bind_length(ctxt: &ResolutionContext<'_>, owner: NodeId, name: &str, length: u64, deduced: &mut DeducedTypeDictionary) -> bool {
    let Some(param) = value_parameter_named(ctxt, owner, name) else {
        return false;
    };
    let value = SymbolValue::size(length);
    match deduced.get(param).and_then(|b| b.value.as_ref()) {
        Some(existing) => existing.same_value(&value),
        None => {
            deduced.set(TemplateParameterSymbol::with_value(param, value));
            true
        }
    }
}

/// Resolve the pattern with the current bindings; unbound parameters in it
/// are bound by the conversion check.
fn match_resolved(
    ctxt: &mut ResolutionContext<'_>,
    owner: NodeId,
    decl: &TypeDecl,
    arg: &Symbol,
    deduced: &mut DeducedTypeDictionary,
) -> bool {
    let frame = ContextFrame::new(owner).with_deduced(deduced.clone());
    let expected = ctxt
        .with_frame(frame, |ctxt| resolve::resolve_type(decl, ctxt))
        .unwrap_or_default();
    match expected.first() {
        Some(expected) => compare::is_implicitly_convertible_deducing(arg, expected, deduced),
        None => true,
    }
}

/// `Foo!(T)` against an instance of `Foo`: match pattern arguments against
/// the instance's bindings in parameter order.
fn match_instance(
    ctxt: &mut ResolutionContext<'_>,
    owner: NodeId,
    name: &str,
    pattern: &[TemplateArg],
    arg: &Symbol,
    deduced: &mut DeducedTypeDictionary,
) -> bool {
    let ast = ctxt.ast();
    let Some(instance) = arg.as_aggregate() else {
        return false;
    };
    let template = ast.node(instance.node);
    if template.name != name {
        return false;
    }
    for (pattern_arg, &param) in pattern.iter().zip(&template.template_parameters) {
        let Some(bound) = instance.deduced.get(param).cloned() else {
            return false;
        };
        let ok = match (pattern_arg, bound.base.as_deref(), bound.value.as_ref()) {
            (TemplateArg::Type(td), Some(ty), _) => match_parameter(ctxt, owner, td, ty, deduced),
            (TemplateArg::Type(td), None, Some(value)) => match td.as_plain_identifier() {
                Some(n) => bind_value_named(ctxt, owner, n, value, deduced),
                None => false,
            },
            (TemplateArg::Value(Expr::Identifier(n)), _, Some(value)) => bind_value_named(ctxt, owner, n, value, deduced),
            _ => true,
        };
        if !ok {
            return false;
        }
    }
    true
}

fn bind_value_named(
    ctxt: &ResolutionContext<'_>,
    owner: NodeId,
    name: &str,
    value: &SymbolValue,
    deduced: &mut DeducedTypeDictionary,
) -> bool {
    let Some(param) = value_parameter_named(ctxt, owner, name) else {
        return true;
    };
    match deduced.get(param).and_then(|b| b.value.as_ref()) {
        Some(existing) => existing.same_value(value),
        None => {
            deduced.set(TemplateParameterSymbol::with_value(param, value.clone()));
            true
        }
    }
}

// ============================================================================
// FILTERING
// ============================================================================

/// Drop overloads whose constraint is false or cannot be evaluated.
fn filter_by_constraints(ctxt: &mut ResolutionContext<'_>, overloads: Vec<Symbol>) -> Vec<Symbol> {
    let ast = ctxt.ast();
    overloads
        .into_iter()
        .filter(|overload| {
            let Some(node) = overload.definition_node() else {
                return true;
            };
            let Some(constraint) = ast.node(node).constraint.as_ref() else {
                return true;
            };
            let deduced = overload.deduced().cloned().unwrap_or_default();
            let frame = ContextFrame::new(node).with_deduced(deduced);
            match ctxt.with_frame(frame, |ctxt| ctxt.evaluator().evaluate_value(constraint, ctxt)) {
                Some(Ok(value)) => value.truthiness() == Some(true),
                Some(Err(err)) => {
                    tracing::debug!("[TEMPLATES] constraint of {} not evaluable: {}", ast.node(node).name, err);
                    false
                }
                None => false,
            }
        })
        .collect()
}

/// Per-parameter rank: tuples below plain parameters below specialized ones.
fn specialization_rank(ctxt: &ResolutionContext<'_>, symbol: &Symbol) -> Vec<u8> {
    let ast = ctxt.ast();
    let Some(node) = symbol.definition_node() else {
        return Vec::new();
    };
    ast.node(node)
        .template_parameters
        .iter()
        .map(|&p| match ast.node(p).template_parameter_kind() {
            Some(TemplateParameterKind::Tuple) => 0,
            Some(kind) if kind.has_specialization() => 2,
            _ => 1,
        })
        .collect()
}

fn dominates(a: &[u8], b: &[u8]) -> bool {
    let mut strictly = false;
    for (x, y) in a.iter().zip(b) {
        if x < y {
            return false;
        }
        strictly |= x > y;
    }
    strictly
}

/// Keep the overloads no other overload is more specialized than.
/// Equally specialized overloads all stay.
fn most_specialized(ctxt: &ResolutionContext<'_>, overloads: Vec<Symbol>) -> Vec<Symbol> {
    if overloads.len() < 2 {
        return overloads;
    }
    let ranks: Vec<Vec<u8>> = overloads.iter().map(|o| specialization_rank(ctxt, o)).collect();
    overloads
        .into_iter()
        .enumerate()
        .filter(|(i, _)| !ranks.iter().enumerate().any(|(j, r)| j != *i && dominates(r, &ranks[*i])))
        .map(|(_, o)| o)
        .collect()
}

// ============================================================================
// EXPANSION
// ============================================================================

/// Eponymous templates become their member; templates with a same-named
/// member become that member.
fn expand(ctxt: &mut ResolutionContext<'_>, symbol: Symbol) -> Vec<Symbol> {
    let Some(agg) = symbol.as_aggregate() else {
        return vec![symbol];
    };
    if !agg.deduced.all_satisfied() {
        return vec![symbol];
    }
    let (node, kind) = (agg.node, agg.kind);
    let deduced = agg.deduced.clone();
    match kind {
        AggregateKind::EponymousTemplate => vec![eponymous_member(ctxt, node, deduced).unwrap_or(symbol)],
        AggregateKind::Template => {
            let ast = ctxt.ast();
            let name = &ast.node(node).name;
            let implicit: Vec<NodeId> = ast
                .node(node)
                .children
                .iter()
                .copied()
                .filter(|&c| ast.node(c).name == *name)
                .collect();
            let found: Vec<Symbol> = implicit
                .into_iter()
                .filter_map(|member| resolve::handle_node_with(ctxt, member, &deduced))
                .flat_map(Symbol::into_candidates)
                .collect();
            if found.is_empty() { vec![symbol] } else { found }
        }
        _ => vec![symbol],
    }
}

fn eponymous_member(ctxt: &mut ResolutionContext<'_>, node: NodeId, deduced: DeducedTypeDictionary) -> Option<Symbol> {
    let ast = ctxt.ast();
    let eponymous = ast.node(node);
    let NodeKind::EponymousTemplate { ty, initializer } = &eponymous.kind else {
        return None;
    };
    let frame = ContextFrame::new(node).with_deduced(deduced.clone());
    let base = ctxt
        .with_frame(frame, |ctxt| match (ty, initializer) {
            (Some(ty), _) => resolve::resolve_type(ty, ctxt).into_iter().next(),
            (None, Some(init)) => ctxt.evaluator().evaluate_type(init, ctxt),
            (None, None) => None,
        })
        .flatten();
    if ty.is_none() && initializer.is_none() {
        ctxt.log_error(ResolutionError::nothing_found_because(
            eponymous.name.clone(),
            Some(node),
            "Can't deduce type from empty initializer",
        ));
    }
    let mut member = Symbol::member(Definition::Node(node), base).with_origin(node);
    if let Some(slot) = member.deduced_mut() {
        *slot = deduced;
    }
    Some(member)
}
