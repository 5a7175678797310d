//! ResultComparer: structural equality and implicit convertibility of
//! resolved symbols.
//!
//! Both predicates are pure. Convertibility into an unbound template
//! parameter binds it in a caller-supplied [`DeducedTypeDictionary`].

use crate::syntax::BasicType;

use super::symbols::{
    DeducedTypeDictionary, Definition, Symbol, SymbolKind, TemplateParameterSymbol,
};
use super::values::TemplateArgument;

// ============================================================================
// PRIMITIVE WIDENING
// ============================================================================

/// Lossless implicit widenings `(from, to)`. The table is antisymmetric.
pub const IMPLICIT_WIDENING: &[(BasicType, BasicType)] = {
    use BasicType::*;
    &[
        (Bool, Int),
        (Bool, Long),
        (Byte, Short),
        (Byte, Int),
        (Byte, Long),
        (Ubyte, Short),
        (Ubyte, Ushort),
        (Ubyte, Int),
        (Ubyte, Uint),
        (Ubyte, Long),
        (Ubyte, Ulong),
        (Short, Int),
        (Short, Long),
        (Ushort, Int),
        (Ushort, Uint),
        (Ushort, Long),
        (Ushort, Ulong),
        (Int, Long),
        (Uint, Long),
        (Uint, Ulong),
        (Long, Cent),
        (Ulong, Ucent),
        (Char, Wchar),
        (Char, Dchar),
        (Wchar, Dchar),
        (Float, Double),
        (Float, Real),
        (Double, Real),
    ]
};

pub fn is_primitive_implicitly_convertible(from: BasicType, to: BasicType) -> bool {
    from == to || IMPLICIT_WIDENING.contains(&(from, to))
}

// ============================================================================
// EQUALITY
// ============================================================================

fn option_equal(a: Option<&Symbol>, b: Option<&Symbol>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => is_equal(a, b),
        _ => false,
    }
}

/// Structural type equality.
///
/// Template parameters compare by their bound type. Aggregates compare by
/// declaration only; their deduced bindings are not compared.
pub fn is_equal(a: &Symbol, b: &Symbol) -> bool {
    if let (SymbolKind::TemplateParameter(x), SymbolKind::TemplateParameter(y)) = (&a.kind, &b.kind) {
        if x.parameter == y.parameter {
            return option_equal(x.base.as_deref(), y.base.as_deref());
        }
    }
    let a = match &a.kind {
        SymbolKind::TemplateParameter(tp) => match tp.base.as_deref() {
            Some(base) => base,
            None => return false,
        },
        _ => a,
    };
    let b = match &b.kind {
        SymbolKind::TemplateParameter(tp) => match tp.base.as_deref() {
            Some(base) => base,
            None => return false,
        },
        _ => b,
    };

    match (&a.kind, &b.kind) {
        (SymbolKind::Primitive(x), SymbolKind::Primitive(y)) => x == y,
        (SymbolKind::Pointer(x), SymbolKind::Pointer(y)) => option_equal(x.as_deref(), y.as_deref()),
        (SymbolKind::Array { element: x, .. }, SymbolKind::Array { element: y, .. }) => {
            option_equal(x.as_deref(), y.as_deref())
        }
        (
            SymbolKind::AssociativeArray { key: k1, value: v1 },
            SymbolKind::AssociativeArray { key: k2, value: v2 },
        ) => option_equal(k1.as_deref(), k2.as_deref()) && option_equal(v1.as_deref(), v2.as_deref()),
        (SymbolKind::Delegate(x), SymbolKind::Delegate(y)) => {
            x.is_function == y.is_function
                && option_equal(x.return_type.as_deref(), y.return_type.as_deref())
                && x.parameters.len() == y.parameters.len()
                && x.parameters.iter().zip(&y.parameters).all(|(p, q)| is_equal(p, q))
        }
        (SymbolKind::Aggregate(x), SymbolKind::Aggregate(y)) => x.node == y.node,
        (SymbolKind::Enum { node: x, .. }, SymbolKind::Enum { node: y, .. })
        | (SymbolKind::Alias { node: x, .. }, SymbolKind::Alias { node: y, .. }) => x == y,
        (SymbolKind::Module(x), SymbolKind::Module(y)) => x == y,
        (SymbolKind::Package(x), SymbolKind::Package(y)) => x == y,
        (SymbolKind::Member(x), SymbolKind::Member(y)) => match (&x.definition, &y.definition) {
            (Definition::Node(p), Definition::Node(q)) => p == q,
            (Definition::Synthetic(p), Definition::Synthetic(q)) => p.name == q.name,
            _ => false,
        },
        (SymbolKind::Tuple(x), SymbolKind::Tuple(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(p, q)| arguments_equal(p, q))
        }
        _ => false,
    }
}

/// Equality of template arguments; symbolic values match anything.
pub fn arguments_equal(a: &TemplateArgument, b: &TemplateArgument) -> bool {
    match (a, b) {
        (TemplateArgument::Unresolved(_), _) | (_, TemplateArgument::Unresolved(_)) => false,
        (TemplateArgument::Value(v), _) | (_, TemplateArgument::Value(v)) if !v.is_final() => true,
        _ => match (a.as_type(), b.as_type()) {
            (Some(x), Some(y)) => is_equal(x, y),
            (None, None) => match (a.as_value(), b.as_value()) {
                (Some(x), Some(y)) => x.same_value(y),
                _ => false,
            },
            _ => false,
        },
    }
}

// ============================================================================
// CONVERTIBILITY
// ============================================================================

/// Whether a value of type `from` converts implicitly to `to`.
///
/// An unbound template parameter target accepts any type.
pub fn is_implicitly_convertible(from: &Symbol, to: &Symbol) -> bool {
    let mut scratch = DeducedTypeDictionary::new();
    is_implicitly_convertible_deducing(from, to, &mut scratch)
}

/// As [`is_implicitly_convertible`], binding unbound template parameters
/// of `to` in `deduced`. A parameter already bound there must match.
pub fn is_implicitly_convertible_deducing(
    from: &Symbol,
    to: &Symbol,
    deduced: &mut DeducedTypeDictionary,
) -> bool {
    let is_variable = from.is_member();
    let Some(source) = from.strip_members() else {
        return is_equal(from, to);
    };

    if let SymbolKind::TemplateParameter(tp) = &to.kind {
        if tp.base.is_none() && tp.value.is_none() {
            return bind(source, tp.parameter, deduced);
        }
    }
    let Some(target) = to.strip_members() else {
        return false;
    };

    match (&source.kind, &target.kind) {
        (SymbolKind::Primitive(x), SymbolKind::Primitive(y)) => is_primitive_implicitly_convertible(*x, *y),
        (SymbolKind::Aggregate(_), SymbolKind::Aggregate(y)) => derives_from(source, y.node),
        (SymbolKind::Enum { node: x, .. }, SymbolKind::Enum { node: y, .. }) => x == y,
        (SymbolKind::Enum { base, .. }, _) => base
            .as_deref()
            .is_some_and(|base| is_implicitly_convertible_deducing(base, target, deduced)),
        (SymbolKind::Delegate(_), SymbolKind::Delegate(_)) => is_equal(source, target),
        (SymbolKind::Array { element: x, .. }, SymbolKind::Array { element: y, fixed_length }) => {
            let length_fits = match (fixed_length, &source.kind) {
                (None, _) => true,
                (Some(n), SymbolKind::Array { fixed_length: m, .. }) => m == &Some(*n),
                _ => false,
            };
            length_fits && convertible_option(x.as_deref(), y.as_deref(), deduced)
        }
        (
            SymbolKind::AssociativeArray { key: k1, value: v1 },
            SymbolKind::AssociativeArray { key: k2, value: v2 },
        ) => {
            convertible_option(k1.as_deref(), k2.as_deref(), deduced)
                && convertible_option(v1.as_deref(), v2.as_deref(), deduced)
        }
        (SymbolKind::Pointer(x), SymbolKind::Pointer(y)) => match y.as_deref() {
            Some(Symbol {
                kind: SymbolKind::Primitive(BasicType::Void),
                ..
            }) => true,
            Some(y) => x.as_deref().is_some_and(|x| match y.kind {
                SymbolKind::TemplateParameter(_) => is_implicitly_convertible_deducing(x, y, deduced),
                _ => is_equal(x, y),
            }),
            None => x.is_none(),
        },
        // A string literal converts to a character pointer.
        (SymbolKind::Array { .. }, SymbolKind::Pointer(Some(pointee))) => {
            !is_variable
                && source.is_string()
                && matches!(pointee.kind, SymbolKind::Primitive(t) if t.is_character())
        }
        (SymbolKind::Tuple(x), SymbolKind::Tuple(y)) => {
            x.len() == y.len()
                && x.iter().zip(y).all(|(p, q)| match (p.as_type(), q.as_type()) {
                    (Some(p), Some(q)) => is_implicitly_convertible_deducing(p, q, deduced),
                    _ => arguments_equal(p, q),
                })
        }
        _ => is_equal(source, target),
    }
}

fn convertible_option(from: Option<&Symbol>, to: Option<&Symbol>, deduced: &mut DeducedTypeDictionary) -> bool {
    match (from, to) {
        (None, None) => true,
        (Some(from), Some(to)) => is_implicitly_convertible_deducing(from, to, deduced),
        _ => false,
    }
}

fn bind(source: &Symbol, parameter: crate::syntax::NodeId, deduced: &mut DeducedTypeDictionary) -> bool {
    match deduced.get(parameter) {
        Some(existing) => existing.base.as_deref().is_none_or(|bound| is_equal(source, bound)),
        None => {
            deduced.set(TemplateParameterSymbol::with_type(parameter, source.clone()));
            true
        }
    }
}

/// Walks base classes and interfaces looking for `target`.
fn derives_from(symbol: &Symbol, target: crate::syntax::NodeId) -> bool {
    let Some(agg) = symbol.as_aggregate() else {
        return false;
    };
    agg.node == target
        || agg.base_class.as_deref().is_some_and(|b| derives_from(b, target))
        || agg.interfaces.iter().any(|i| derives_from(i, target))
}
