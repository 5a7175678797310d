//! Evaluator: constant folding and expression typing.
//!
//! The resolver treats evaluation as a collaborator behind the
//! [`Evaluator`] trait: it asks for the value of constraints, constant
//! template arguments and array sizes, and for the type of initializers
//! and `typeof` operands. [`ConstEvaluator`] is the implementation every
//! [`ResolutionContext`] starts with.

use smol_str::SmolStr;
use thiserror::Error;

use crate::base::constants::MAX_EVALUATION_DEPTH;
use crate::syntax::{BasicType, BinaryOp, Expr, IsOp, Literal, NodeId, NodeKind, TypeDecl, UnaryOp};

use super::compare;
use super::context::ResolutionContext;
use super::lookup::{self, Declaration, MemberFilter};
use super::members;
use super::options::{OptionOverrides, ResolutionOptions};
use super::resolve;
use super::static_props::{self, PropertyOwner};
use super::symbols::{Definition, Symbol, SymbolKind};
use super::templates;
use super::values::SymbolValue;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("`{0}` is not a compile-time constant")]
    NotConstant(String),

    #[error("operator `{op}` cannot be applied to `{lhs}` and `{rhs}`")]
    InvalidOperands {
        op: &'static str,
        lhs: String,
        rhs: String,
    },

    #[error("division by zero")]
    DivisionByZero,

    #[error("`{0}` could not be resolved")]
    Unresolved(String),

    #[error("constant initializer depends on itself")]
    Recursion,
}

/// Expression evaluation, as the resolver sees it.
pub trait Evaluator: Send + Sync {
    /// Fold `expr` to a constant in the current scope.
    fn evaluate_value(&self, expr: &Expr, ctxt: &mut ResolutionContext<'_>) -> Result<SymbolValue, EvalError>;

    /// The static type of `expr` in the current scope.
    fn evaluate_type(&self, expr: &Expr, ctxt: &mut ResolutionContext<'_>) -> Option<Symbol>;
}

/// Reference evaluator over literals, constants and deduced parameters.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConstEvaluator;

impl Evaluator for ConstEvaluator {
    fn evaluate_value(&self, expr: &Expr, ctxt: &mut ResolutionContext<'_>) -> Result<SymbolValue, EvalError> {
        let value = value_of(expr, ctxt);
        tracing::trace!("[EVAL] {} = {:?}", expr, value);
        value
    }

    fn evaluate_type(&self, expr: &Expr, ctxt: &mut ResolutionContext<'_>) -> Option<Symbol> {
        type_of(expr, ctxt)
    }
}

// ============================================================================
// VALUES
// ============================================================================

fn literal_value(literal: &Literal) -> SymbolValue {
    match literal {
        Literal::Int { value, ty } => SymbolValue::Int { value: *value, ty: *ty },
        Literal::Float { value, ty } => SymbolValue::Float { value: *value, ty: *ty },
        Literal::Bool(b) => SymbolValue::Bool(*b),
        Literal::Char(c) => SymbolValue::Char(*c),
        Literal::Str(s) => SymbolValue::Str(s.clone()),
        Literal::Null => SymbolValue::Null,
    }
}

fn value_of(expr: &Expr, ctxt: &mut ResolutionContext<'_>) -> Result<SymbolValue, EvalError> {
    match expr {
        Expr::Literal(literal) => Ok(literal_value(literal)),
        Expr::Identifier(name) => identifier_value(name, ctxt),
        Expr::TemplateInstance { .. } | Expr::Type(_) => {
            let symbol = type_of(expr, ctxt).ok_or_else(|| EvalError::Unresolved(expr.to_string()))?;
            symbol_value(symbol, ctxt)
        }
        Expr::Member { base, name } => member_value(expr, base, name, ctxt),
        Expr::Binary { op, lhs, rhs } => binary_value(*op, lhs, rhs, ctxt),
        Expr::Unary { op, operand } => {
            let value = value_of(operand, ctxt)?;
            match op {
                UnaryOp::Not => truth(&value).map(|b| SymbolValue::Bool(!b)),
                UnaryOp::Neg => match value {
                    SymbolValue::Int { value, ty } => Ok(SymbolValue::Int { value: -value, ty }),
                    SymbolValue::Float { value, ty } => Ok(SymbolValue::Float { value: -value, ty }),
                    other => Err(EvalError::InvalidOperands {
                        op: "-",
                        lhs: String::new(),
                        rhs: other.to_string(),
                    }),
                },
            }
        }
        Expr::ArrayLiteral(items) => items
            .iter()
            .map(|item| value_of(item, ctxt))
            .collect::<Result<Vec<_>, _>>()
            .map(SymbolValue::Array),
        Expr::Is { ty, test } => Ok(SymbolValue::Bool(is_expression(ty, test.as_ref(), ctxt))),
        Expr::Index { base, index } => {
            let base = value_of(base, ctxt)?;
            let index = value_of(index, ctxt)?;
            let position = index.as_int().and_then(|i| usize::try_from(i).ok());
            let element = match (&base, position) {
                (SymbolValue::Array(items), Some(i)) => items.get(i).cloned(),
                (SymbolValue::Str(s), Some(i)) => s.chars().nth(i).map(SymbolValue::Char),
                _ => None,
            };
            element.ok_or_else(|| EvalError::InvalidOperands {
                op: "[]",
                lhs: base.to_string(),
                rhs: index.to_string(),
            })
        }
        Expr::Call { .. } | Expr::New(_) => Err(EvalError::NotConstant(expr.to_string())),
    }
}

fn truth(value: &SymbolValue) -> Result<bool, EvalError> {
    value
        .truthiness()
        .ok_or_else(|| EvalError::NotConstant(value.to_string()))
}

/// The value a resolved symbol stands for: a known constant, an eponymous
/// constant template, or the type itself.
fn symbol_value(symbol: Symbol, ctxt: &mut ResolutionContext<'_>) -> Result<SymbolValue, EvalError> {
    if let Some(member) = symbol.as_member() {
        if let Some(constant) = &member.constant {
            return Ok(constant.clone());
        }
        if let Definition::Node(node) = member.definition {
            let instance = (!member.deduced.is_empty()).then(|| symbol.clone());
            return declaration_value(&Declaration { node, instance }, ctxt);
        }
    }
    Ok(SymbolValue::Type(Box::new(symbol)))
}

fn identifier_value(name: &SmolStr, ctxt: &mut ResolutionContext<'_>) -> Result<SymbolValue, EvalError> {
    let declarations = lookup::lookup(ctxt, name, MemberFilter::ALL);
    match declarations.first() {
        Some(declaration) => declaration_value(declaration, ctxt),
        None => Err(EvalError::Unresolved(name.to_string())),
    }
}

fn declaration_value(declaration: &Declaration, ctxt: &mut ResolutionContext<'_>) -> Result<SymbolValue, EvalError> {
    let ast = ctxt.ast();
    let node = ast.node(declaration.node);
    match &node.kind {
        NodeKind::TemplateParameter(_) => {
            let bound = ctxt
                .deduced_parameter(declaration.node)
                .or_else(|| {
                    declaration
                        .instance
                        .as_ref()
                        .and_then(|i| i.deduced())
                        .and_then(|d| d.get(declaration.node))
                })
                .cloned();
            match bound {
                Some(tps) => match (tps.value, tps.base) {
                    (Some(value), _) => Ok(value),
                    (None, Some(base)) => Ok(SymbolValue::Type(base)),
                    (None, None) => Err(EvalError::NotConstant(node.name.to_string())),
                },
                None => Err(EvalError::NotConstant(node.name.to_string())),
            }
        }
        NodeKind::Variable {
            is_alias: false,
            initializer: Some(initializer),
            ..
        } if node.attributes.is_const => constant_initializer(declaration, initializer, ctxt),
        NodeKind::EponymousTemplate {
            initializer: Some(initializer),
            ..
        } => constant_initializer(declaration, initializer, ctxt),
        NodeKind::EnumValue { .. } => enum_member_value(declaration, ctxt),
        NodeKind::Variable { is_alias: false, .. } | NodeKind::Method { .. } => {
            Err(EvalError::NotConstant(node.name.to_string()))
        }
        _ => resolve::handle_declarations(ctxt, std::slice::from_ref(declaration))
            .into_iter()
            .next()
            .map(|symbol| SymbolValue::Type(Box::new(symbol)))
            .ok_or_else(|| EvalError::Unresolved(node.name.to_string())),
    }
}

fn constant_initializer(
    declaration: &Declaration,
    initializer: &Expr,
    ctxt: &mut ResolutionContext<'_>,
) -> Result<SymbolValue, EvalError> {
    let node = declaration.node;
    let depth = ctxt.guard_mut().enter(node);
    let result = if depth > MAX_EVALUATION_DEPTH {
        tracing::debug!("[EVAL] {:?} exceeds evaluation depth", node);
        Err(EvalError::Recursion)
    } else {
        let mut frame = resolve::declaration_frame(ctxt.ast(), node);
        if let Some(deduced) = declaration.instance.as_ref().and_then(Symbol::deduced) {
            frame.deduced = deduced.clone();
        }
        ctxt.with_frame(frame, |ctxt| value_of(initializer, ctxt))
            .unwrap_or_else(|| Err(EvalError::NotConstant(initializer.to_string())))
    };
    ctxt.guard_mut().leave(node);
    result
}

/// Enum members count up from the previous member, starting at 0.
fn enum_member_value(declaration: &Declaration, ctxt: &mut ResolutionContext<'_>) -> Result<SymbolValue, EvalError> {
    let ast = ctxt.ast();
    let target = declaration.node;
    let Some(enumeration) = ast.parent(target) else {
        return Err(EvalError::Unresolved(ast.node(target).name.to_string()));
    };
    let mut previous: Option<SymbolValue> = None;
    for &member in &ast.node(enumeration).children {
        let NodeKind::EnumValue { initializer } = &ast.node(member).kind else {
            continue;
        };
        let value = match (initializer, previous) {
            (Some(init), _) => constant_initializer(&Declaration { node: member, instance: None }, init, ctxt)?,
            (None, Some(SymbolValue::Int { value, ty })) => SymbolValue::Int { value: value + 1, ty },
            (None, Some(other)) => {
                return Err(EvalError::InvalidOperands {
                    op: "+",
                    lhs: other.to_string(),
                    rhs: "1".into(),
                });
            }
            (None, None) => SymbolValue::int(0),
        };
        if member == target {
            return Ok(value);
        }
        previous = Some(value);
    }
    Err(EvalError::Unresolved(ast.node(target).name.to_string()))
}

fn member_value(
    expr: &Expr,
    base: &Expr,
    name: &str,
    ctxt: &mut ResolutionContext<'_>,
) -> Result<SymbolValue, EvalError> {
    if let Ok(owner) = value_of(base, ctxt) {
        if let Some(value) = static_props::try_evaluate(ctxt.ast(), PropertyOwner::Value(&owner), name) {
            return Ok(value);
        }
    }
    let symbol = type_of(expr, ctxt).ok_or_else(|| EvalError::Unresolved(expr.to_string()))?;
    symbol_value(symbol, ctxt)
}

fn binary_value(op: BinaryOp, lhs: &Expr, rhs: &Expr, ctxt: &mut ResolutionContext<'_>) -> Result<SymbolValue, EvalError> {
    match op {
        BinaryOp::And => {
            if !truth(&value_of(lhs, ctxt)?)? {
                return Ok(SymbolValue::Bool(false));
            }
            truth(&value_of(rhs, ctxt)?).map(SymbolValue::Bool)
        }
        BinaryOp::Or => {
            if truth(&value_of(lhs, ctxt)?)? {
                return Ok(SymbolValue::Bool(true));
            }
            truth(&value_of(rhs, ctxt)?).map(SymbolValue::Bool)
        }
        _ => {
            let l = value_of(lhs, ctxt)?;
            let r = value_of(rhs, ctxt)?;
            fold(op, l, r)
        }
    }
}

fn integral_type(value: &SymbolValue) -> BasicType {
    match value {
        SymbolValue::Int { ty, .. } | SymbolValue::Float { ty, .. } => *ty,
        SymbolValue::Char(_) => BasicType::Char,
        SymbolValue::Bool(_) => BasicType::Bool,
        _ => BasicType::Int,
    }
}

/// Usual arithmetic conversions, reduced to size ranking.
fn promote(a: BasicType, b: BasicType) -> BasicType {
    if a.is_floating_point() || b.is_floating_point() {
        return match (a.is_floating_point(), b.is_floating_point()) {
            (true, true) if b.size_of() > a.size_of() => b,
            (true, _) => a,
            _ => b,
        };
    }
    let widen = |t: BasicType| if t.size_of().unwrap_or(4) < 4 { BasicType::Int } else { t };
    let (a, b) = (widen(a), widen(b));
    if b.size_of() > a.size_of() { b } else { a }
}

fn fold(op: BinaryOp, l: SymbolValue, r: SymbolValue) -> Result<SymbolValue, EvalError> {
    if !l.is_final() || !r.is_final() {
        return Err(EvalError::NotConstant(format!("{l} {} {r}", op.symbol())));
    }
    let invalid = |l: &SymbolValue, r: &SymbolValue| EvalError::InvalidOperands {
        op: op.symbol(),
        lhs: l.to_string(),
        rhs: r.to_string(),
    };
    match op {
        BinaryOp::Eq => return Ok(SymbolValue::Bool(l.same_value(&r))),
        BinaryOp::Ne => return Ok(SymbolValue::Bool(!l.same_value(&r))),
        BinaryOp::Concat => {
            return match (l, r) {
                (SymbolValue::Str(a), SymbolValue::Str(b)) => Ok(SymbolValue::Str(SmolStr::new(format!("{a}{b}")))),
                (SymbolValue::Array(mut a), SymbolValue::Array(b)) => {
                    a.extend(b);
                    Ok(SymbolValue::Array(a))
                }
                (l, r) => Err(invalid(&l, &r)),
            };
        }
        _ => {}
    }

    if op.is_comparison() {
        let ordering = match (&l, &r) {
            (SymbolValue::Str(a), SymbolValue::Str(b)) => a.partial_cmp(b),
            _ => match (l.as_float(), r.as_float()) {
                (Some(a), Some(b)) => a.partial_cmp(&b),
                _ => None,
            },
        };
        let ordering = ordering.ok_or_else(|| invalid(&l, &r))?;
        let result = match op {
            BinaryOp::Lt => ordering.is_lt(),
            BinaryOp::Le => ordering.is_le(),
            BinaryOp::Gt => ordering.is_gt(),
            _ => ordering.is_ge(),
        };
        return Ok(SymbolValue::Bool(result));
    }

    let ty = promote(integral_type(&l), integral_type(&r));
    if ty.is_floating_point() {
        let (a, b) = l.as_float().zip(r.as_float()).ok_or_else(|| invalid(&l, &r))?;
        let value = match op {
            BinaryOp::Add => a + b,
            BinaryOp::Sub => a - b,
            BinaryOp::Mul => a * b,
            BinaryOp::Div => a / b,
            BinaryOp::Rem => a % b,
            _ => return Err(invalid(&l, &r)),
        };
        return Ok(SymbolValue::Float { value, ty });
    }

    let (a, b) = l.as_int().zip(r.as_int()).ok_or_else(|| invalid(&l, &r))?;
    let value = match op {
        BinaryOp::Add => a.checked_add(b),
        BinaryOp::Sub => a.checked_sub(b),
        BinaryOp::Mul => a.checked_mul(b),
        BinaryOp::Div | BinaryOp::Rem if b == 0 => return Err(EvalError::DivisionByZero),
        BinaryOp::Div => a.checked_div(b),
        BinaryOp::Rem => a.checked_rem(b),
        _ => None,
    }
    .ok_or_else(|| invalid(&l, &r))?;
    Ok(SymbolValue::Int { value, ty })
}

fn is_expression(ty: &TypeDecl, test: Option<&(IsOp, TypeDecl)>, ctxt: &mut ResolutionContext<'_>) -> bool {
    let Some(subject) = Symbol::from_candidates(resolve::resolve_type(ty, ctxt)) else {
        return false;
    };
    let Some((op, other)) = test else {
        return true;
    };
    let Some(other) = Symbol::from_candidates(resolve::resolve_type(other, ctxt)) else {
        return false;
    };
    let subject = subject.strip_members().unwrap_or(&subject);
    let other = other.strip_members().unwrap_or(&other);
    match op {
        IsOp::Equal => compare::is_equal(subject, other),
        IsOp::Convertible => compare::is_implicitly_convertible(subject, other),
    }
}

// ============================================================================
// TYPES
// ============================================================================

fn literal_type(literal: &Literal) -> Symbol {
    match literal {
        Literal::Int { ty, .. } | Literal::Float { ty, .. } => Symbol::primitive(*ty),
        Literal::Bool(_) => Symbol::primitive(BasicType::Bool),
        Literal::Char(_) => Symbol::primitive(BasicType::Char),
        Literal::Str(_) => Symbol::string(),
        Literal::Null => Symbol::pointer(None),
    }
}

fn type_of(expr: &Expr, ctxt: &mut ResolutionContext<'_>) -> Option<Symbol> {
    if ctxt.is_cancelled() {
        return None;
    }
    match expr {
        Expr::Literal(literal) => Some(literal_type(literal)),
        Expr::Identifier(name) => Symbol::from_candidates(resolve::resolve_identifier(name, ctxt)),
        Expr::TemplateInstance { name, args } => {
            let decl = TypeDecl::Identifier {
                name: name.clone(),
                template_args: Some(args.clone()),
            };
            Symbol::from_candidates(resolve::resolve_type(&decl, ctxt))
        }
        Expr::Member { base, name } => {
            let owner = type_of(base, ctxt)?;
            Symbol::from_candidates(members::member_access(ctxt, &owner, name, None, true))
        }
        Expr::Call { callee, args } => call_type(callee, args, ctxt),
        Expr::Index { base, index } => index_type(base, index, ctxt),
        Expr::Binary { op, lhs, rhs } => match op {
            _ if op.is_comparison() => Some(Symbol::primitive(BasicType::Bool)),
            BinaryOp::And | BinaryOp::Or => Some(Symbol::primitive(BasicType::Bool)),
            BinaryOp::Concat => type_of(lhs, ctxt),
            _ => {
                let l = type_of(lhs, ctxt)?;
                let r = type_of(rhs, ctxt);
                let primitive = |s: &Symbol| match s.strip_members().map(|s| &s.kind) {
                    Some(SymbolKind::Primitive(t)) => Some(*t),
                    _ => None,
                };
                match (primitive(&l), r.as_ref().and_then(primitive)) {
                    (Some(a), Some(b)) => Some(Symbol::primitive(promote(a, b))),
                    _ => l.strip_members().cloned(),
                }
            }
        },
        Expr::Unary { op: UnaryOp::Not, .. } | Expr::Is { .. } => Some(Symbol::primitive(BasicType::Bool)),
        Expr::Unary { operand, .. } => type_of(operand, ctxt).map(|t| t.strip_members().cloned().unwrap_or(t)),
        Expr::ArrayLiteral(items) => {
            let element = items.first().and_then(|item| type_of(item, ctxt));
            Some(Symbol::array(element.map(|e| e.strip_members().cloned().unwrap_or(e))))
        }
        Expr::Type(decl) | Expr::New(decl) => Symbol::from_candidates(resolve::resolve_type(decl, ctxt)),
    }
}

fn index_type(base: &Expr, index: &Expr, ctxt: &mut ResolutionContext<'_>) -> Option<Symbol> {
    let owner = type_of(base, ctxt)?;
    let owner = owner.strip_members()?;
    match &owner.kind {
        SymbolKind::Array { element, .. } | SymbolKind::Pointer(element) => element.as_deref().cloned(),
        SymbolKind::AssociativeArray { value, .. } => value.as_deref().cloned(),
        SymbolKind::Tuple(items) => {
            let position = value_of(index, ctxt).ok()?.as_int()?;
            let item = items.get(usize::try_from(position).ok()?)?;
            item.as_type().cloned()
        }
        _ => None,
    }
}

/// What calling a non-method yields: constructed aggregates and delegate
/// return types.
fn callable_result(callee: &Symbol) -> Option<Symbol> {
    let target = callee.strip_members()?;
    match &target.kind {
        SymbolKind::Aggregate(_) => Some(target.clone()),
        SymbolKind::Delegate(dg) => dg.return_type.as_deref().cloned(),
        _ => None,
    }
}

fn is_method(ctxt: &ResolutionContext<'_>, symbol: &Symbol) -> bool {
    symbol
        .as_member()
        .and_then(|m| m.definition.node())
        .is_some_and(|n| ctxt.ast().node(n).is_method())
}

fn call_type(callee: &Expr, args: &[Expr], ctxt: &mut ResolutionContext<'_>) -> Option<Symbol> {
    let arguments: Vec<Option<Symbol>> = args.iter().map(|a| type_of(a, ctxt)).collect();
    let references_only = OptionOverrides::new()
        .enable(ResolutionOptions::RETURN_METHOD_REFERENCES_ONLY | ResolutionOptions::NO_TEMPLATE_PARAMETER_DEDUCTION);

    let (overloads, explicit) = match callee {
        Expr::Identifier(name) => {
            let found = ctxt.with_overrides(references_only, |ctxt| resolve::resolve_overloads(name, ctxt));
            (found.unwrap_or_default(), Vec::new())
        }
        Expr::TemplateInstance { name, args } => {
            let found = ctxt.with_overrides(references_only, |ctxt| resolve::resolve_overloads(name, ctxt));
            let explicit = templates::pre_resolve_arguments(ctxt, args);
            (found.unwrap_or_default(), explicit)
        }
        Expr::Member { base, name } => {
            let owner = type_of(base, ctxt)?;
            let found = ctxt.with_overrides(references_only, |ctxt| members::resolve_further(ctxt, name, &owner, true));
            (found.unwrap_or_default(), Vec::new())
        }
        other => return callable_result(&type_of(other, ctxt)?),
    };

    let (methods, others): (Vec<Symbol>, Vec<Symbol>) = overloads.into_iter().partition(|o| is_method(ctxt, o));
    if methods.is_empty() {
        let first = others.into_iter().next()?;
        return callable_result(&first);
    }
    let candidates = templates::deduce_call(ctxt, methods, &explicit, &arguments);
    let chosen = templates::select_single(ctxt, candidates, &callee.to_string())?;
    chosen.as_member().and_then(|m| m.base.as_deref().cloned())
}

/// Declaration node of the method a call resolves to; used by tests and
/// consumers that want the chosen overload rather than its result type.
pub fn resolve_call(ctxt: &mut ResolutionContext<'_>, call: &Expr) -> Option<NodeId> {
    let Expr::Call { callee, args } = call else {
        return None;
    };
    let arguments: Vec<Option<Symbol>> = args.iter().map(|a| type_of(a, ctxt)).collect();
    let references_only = OptionOverrides::new()
        .enable(ResolutionOptions::RETURN_METHOD_REFERENCES_ONLY | ResolutionOptions::NO_TEMPLATE_PARAMETER_DEDUCTION);
    let (name, explicit) = match callee.as_ref() {
        Expr::Identifier(name) => (name.clone(), Vec::new()),
        Expr::TemplateInstance { name, args } => (name.clone(), templates::pre_resolve_arguments(ctxt, args)),
        _ => return None,
    };
    let overloads = ctxt
        .with_overrides(references_only, |ctxt| resolve::resolve_overloads(&name, ctxt))
        .unwrap_or_default();
    let candidates = templates::deduce_call(ctxt, overloads, &explicit, &arguments);
    templates::select_single(ctxt, candidates, &name)?.definition_node()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::ParseCache;
    use crate::syntax::AstBuilder;

    fn eval(cache: &ParseCache, scope: NodeId, expr: &Expr) -> Result<SymbolValue, EvalError> {
        let mut ctxt = ResolutionContext::new(cache, scope, None);
        ConstEvaluator.evaluate_value(expr, &mut ctxt)
    }

    #[test]
    fn test_arithmetic_and_comparison() {
        let mut b = AstBuilder::new();
        let m = b.module("m");
        let cache = ParseCache::new(b.finish());

        let sum = Expr::binary(BinaryOp::Add, Expr::int(2), Expr::binary(BinaryOp::Mul, Expr::int(3), Expr::int(4)));
        assert_eq!(eval(&cache, m, &sum), Ok(SymbolValue::int(14)));

        let less = Expr::binary(BinaryOp::Lt, Expr::int(1), Expr::int(2));
        assert_eq!(eval(&cache, m, &less), Ok(SymbolValue::Bool(true)));

        let div = Expr::binary(BinaryOp::Div, Expr::int(1), Expr::int(0));
        assert_eq!(eval(&cache, m, &div), Err(EvalError::DivisionByZero));
    }

    #[test]
    fn test_manifest_constants_and_enum_members() {
        let mut b = AstBuilder::new();
        let m = b.module("m");
        b.constant(m, "N", Expr::int(5));
        b.constant(m, "M", Expr::binary(BinaryOp::Add, Expr::ident("N"), Expr::int(1)));
        let e = b.enumeration(m, "Color", None);
        b.enum_value(e, "Red", None);
        b.enum_value(e, "Green", Some(Expr::int(10)));
        b.enum_value(e, "Blue", None);
        let cache = ParseCache::new(b.finish());

        assert_eq!(eval(&cache, m, &Expr::ident("M")), Ok(SymbolValue::int(6)));
        assert_eq!(eval(&cache, m, &Expr::ident("Color").member("Red")), Ok(SymbolValue::int(0)));
        assert_eq!(eval(&cache, m, &Expr::ident("Color").member("Blue")), Ok(SymbolValue::int(11)));
    }

    #[test]
    fn test_self_referential_constant_is_reported() {
        let mut b = AstBuilder::new();
        let m = b.module("m");
        b.constant(m, "A", Expr::ident("B"));
        b.constant(m, "B", Expr::ident("A"));
        let cache = ParseCache::new(b.finish());

        assert_eq!(eval(&cache, m, &Expr::ident("A")), Err(EvalError::Recursion));
    }

    #[test]
    fn test_non_constant_variable() {
        let mut b = AstBuilder::new();
        let m = b.module("m");
        b.variable(m, "x", Some(TypeDecl::Basic(BasicType::Int)), Some(Expr::int(1)));
        let cache = ParseCache::new(b.finish());

        assert!(matches!(eval(&cache, m, &Expr::ident("x")), Err(EvalError::NotConstant(_))));
    }

    #[test]
    fn test_string_concat_and_length() {
        let mut b = AstBuilder::new();
        let m = b.module("m");
        let cache = ParseCache::new(b.finish());

        let joined = Expr::binary(BinaryOp::Concat, Expr::string("ab"), Expr::string("cd"));
        assert_eq!(eval(&cache, m, &joined.clone()), Ok(SymbolValue::Str("abcd".into())));
        assert_eq!(eval(&cache, m, &joined.member("length")), Ok(SymbolValue::int(4)));
    }

    #[test]
    fn test_is_expressions() {
        let mut b = AstBuilder::new();
        let m = b.module("m");
        b.alias(m, "Int", TypeDecl::Basic(BasicType::Int));
        let cache = ParseCache::new(b.finish());

        let same = Expr::is_type(TypeDecl::ident("Int"), IsOp::Equal, TypeDecl::Basic(BasicType::Int));
        assert_eq!(eval(&cache, m, &same), Ok(SymbolValue::Bool(true)));
        let widening = Expr::is_type(TypeDecl::Basic(BasicType::Int), IsOp::Convertible, TypeDecl::Basic(BasicType::Long));
        assert_eq!(eval(&cache, m, &widening), Ok(SymbolValue::Bool(true)));
        let unknown = Expr::Is {
            ty: TypeDecl::ident("Missing"),
            test: None,
        };
        assert_eq!(eval(&cache, m, &unknown), Ok(SymbolValue::Bool(false)));
    }

    #[test]
    fn test_expression_types() {
        let mut b = AstBuilder::new();
        let m = b.module("m");
        let cache = ParseCache::new(b.finish());
        let mut ctxt = ResolutionContext::new(&cache, m, None);

        let ty = |ctxt: &mut ResolutionContext<'_>, e: &Expr| ConstEvaluator.evaluate_type(e, ctxt);
        assert_eq!(ty(&mut ctxt, &Expr::string("x")), Some(Symbol::string()));
        assert_eq!(
            ty(&mut ctxt, &Expr::binary(BinaryOp::Eq, Expr::int(1), Expr::int(1))),
            Some(Symbol::primitive(BasicType::Bool))
        );
        let long = Expr::Literal(Literal::Int {
            value: 1,
            ty: BasicType::Long,
        });
        assert_eq!(
            ty(&mut ctxt, &Expr::binary(BinaryOp::Add, Expr::int(1), long)),
            Some(Symbol::primitive(BasicType::Long))
        );
    }
}
