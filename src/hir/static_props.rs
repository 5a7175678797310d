//! StaticPropertyTable: built-in properties synthesized per owner type.
//!
//! The registry is built once per process. Each owner category has its own
//! table; the generic table applies to every type on top of it.

use std::sync::{Arc, LazyLock};

use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use crate::base::constants::{SIZE_T, STRING, TYPE_INFO_CLASS};
use crate::syntax::{Ast, BasicType, NodeKind, TemplateParameterKind, TypeModifier};

use super::context::ResolutionContext;
use super::resolve;
use super::symbols::{
    Definition, DelegateSymbol, Symbol, SymbolKind, SyntheticDecl, SyntheticParameter,
};
use super::values::SymbolValue;

// ============================================================================
// OWNERS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OwnerCategory {
    Generic,
    Integral,
    FloatingPoint,
    AggregateType,
    Array,
    AssociativeArray,
    Delegate,
    TypeTuple,
}

/// What a property is accessed on: a type or a known value.
#[derive(Debug, Clone, Copy)]
pub enum PropertyOwner<'s> {
    Type(&'s Symbol),
    Value(&'s SymbolValue),
}

/// Peel aliases and pointers, then member wrappers. An unbound tuple
/// parameter stays as it is.
fn looked_up_type<'s>(ast: &Ast, symbol: &'s Symbol) -> Option<&'s Symbol> {
    fn peel(mut t: &Symbol) -> &Symbol {
        loop {
            match &t.kind {
                SymbolKind::Alias { base: Some(b), .. } | SymbolKind::Pointer(Some(b)) => t = b,
                _ => return t,
            }
        }
    }
    let t = peel(symbol);
    if let SymbolKind::TemplateParameter(tp) = &t.kind {
        if tp.base.is_none() && is_tuple_parameter(ast, tp.parameter) {
            return Some(t);
        }
    }
    t.strip_members().map(peel)
}

fn is_tuple_parameter(ast: &Ast, parameter: crate::syntax::NodeId) -> bool {
    match &ast.node(parameter).kind {
        NodeKind::TemplateParameter(TemplateParameterKind::Tuple) => true,
        NodeKind::TemplateParameter(TemplateParameterKind::This(inner)) => {
            matches!(inner.as_ref(), TemplateParameterKind::Tuple)
        }
        _ => false,
    }
}

/// Category of an already looked-up type; `None` for types without
/// category-specific properties.
pub fn owner_category(ast: &Ast, symbol: &Symbol) -> Option<OwnerCategory> {
    match &symbol.kind {
        SymbolKind::Array { .. } => Some(OwnerCategory::Array),
        SymbolKind::AssociativeArray { .. } => Some(OwnerCategory::AssociativeArray),
        SymbolKind::Delegate(_) => Some(OwnerCategory::Delegate),
        SymbolKind::Primitive(t) if t.is_integral() => Some(OwnerCategory::Integral),
        SymbolKind::Primitive(t) if t.is_floating_point() => Some(OwnerCategory::FloatingPoint),
        SymbolKind::Aggregate(_) => Some(OwnerCategory::AggregateType),
        SymbolKind::Tuple(_) => Some(OwnerCategory::TypeTuple),
        SymbolKind::TemplateParameter(tp) if is_tuple_parameter(ast, tp.parameter) => {
            Some(OwnerCategory::TypeTuple)
        }
        _ => None,
    }
}

fn value_category(ast: &Ast, value: &SymbolValue) -> Option<OwnerCategory> {
    match value {
        SymbolValue::Int { ty, .. } | SymbolValue::Float { ty, .. } => {
            owner_category(ast, &Symbol::primitive(*ty))
        }
        SymbolValue::Bool(_) | SymbolValue::Char(_) => Some(OwnerCategory::Integral),
        SymbolValue::Str(_) | SymbolValue::Array(_) => Some(OwnerCategory::Array),
        SymbolValue::Type(t) => looked_up_type(ast, t).and_then(|t| owner_category(ast, t)),
        SymbolValue::Null | SymbolValue::Symbolic(_) => None,
    }
}

// ============================================================================
// PROPERTY INFO
// ============================================================================

/// Result types that do not depend on the owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FixedType {
    Basic(BasicType),
    SizeT,
    String,
    TypeInfoClass,
    VoidPointer,
}

type TypeGetter = fn(&Symbol) -> Option<Symbol>;
type ValueGetter = fn(PropertyOwner<'_>) -> Option<SymbolValue>;
type ParameterGetter = fn(&Symbol) -> Vec<SyntheticParameter>;

#[derive(Clone)]
pub struct PropertyInfo {
    pub name: &'static str,
    pub description: &'static str,
    pub requires_instance: bool,
    fixed_type: Option<FixedType>,
    type_getter: Option<TypeGetter>,
    value_getter: Option<ValueGetter>,
    parameters: Option<ParameterGetter>,
}

impl std::fmt::Debug for PropertyInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PropertyInfo")
            .field("name", &self.name)
            .field("requires_instance", &self.requires_instance)
            .finish_non_exhaustive()
    }
}

impl PropertyInfo {
    const fn new(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            description,
            requires_instance: false,
            fixed_type: None,
            type_getter: None,
            value_getter: None,
            parameters: None,
        }
    }

    /// Typed as the owner itself (`T.init`, `T.max`).
    const fn reflecting(name: &'static str, description: &'static str) -> Self {
        Self::new(name, description).computed(reflect)
    }

    const fn fixed(name: &'static str, description: &'static str, ty: FixedType) -> Self {
        let mut info = Self::new(name, description);
        info.fixed_type = Some(ty);
        info
    }

    const fn computed(mut self, getter: TypeGetter) -> Self {
        self.type_getter = Some(getter);
        self
    }

    const fn instance_only(mut self) -> Self {
        self.requires_instance = true;
        self
    }

    const fn valued(mut self, getter: ValueGetter) -> Self {
        self.value_getter = Some(getter);
        self
    }

    const fn method(mut self, parameters: ParameterGetter) -> Self {
        self.parameters = Some(parameters);
        self
    }

    /// Declaration stand-in for `owner`.
    pub fn declaration(&self, owner: &Symbol) -> SyntheticDecl {
        SyntheticDecl {
            name: SmolStr::new_static(self.name),
            description: self.description,
            requires_instance: self.requires_instance,
            parameters: self.parameters.map(|getter| getter(owner)),
        }
    }
}

// ============================================================================
// GETTERS
// ============================================================================

fn reflect(t: &Symbol) -> Option<Symbol> {
    Some(t.clone())
}

fn element_of(t: &Symbol) -> Option<&Symbol> {
    match &t.kind {
        SymbolKind::Array { element, .. } => element.as_deref(),
        _ => None,
    }
}

fn key_of(t: &Symbol) -> Option<&Symbol> {
    match &t.kind {
        SymbolKind::AssociativeArray { key, .. } => key.as_deref(),
        _ => None,
    }
}

fn value_of(t: &Symbol) -> Option<&Symbol> {
    match &t.kind {
        SymbolKind::AssociativeArray { value, .. } => value.as_deref(),
        _ => None,
    }
}

fn immutable_copy(t: &Symbol) -> Option<Symbol> {
    let element = element_of(t)?.clone().with_modifier(TypeModifier::Immutable);
    Some(Symbol::array(Some(element)))
}

fn array_pointer(t: &Symbol) -> Option<Symbol> {
    Some(Symbol::pointer(element_of(t).cloned()))
}

fn keys(t: &Symbol) -> Option<Symbol> {
    Some(Symbol::array(key_of(t).cloned()))
}

fn values(t: &Symbol) -> Option<Symbol> {
    Some(Symbol::array(value_of(t).cloned()))
}

fn iteration_delegate(result: Option<Symbol>) -> Option<Symbol> {
    Some(Symbol::new(SymbolKind::Delegate(DelegateSymbol {
        return_type: result.map(Box::new),
        parameters: Vec::new(),
        is_function: false,
    })))
}

fn by_key(t: &Symbol) -> Option<Symbol> {
    iteration_delegate(keys(t))
}

fn by_value(t: &Symbol) -> Option<Symbol> {
    iteration_delegate(values(t))
}

fn aa_value(t: &Symbol) -> Option<Symbol> {
    value_of(t).cloned()
}

fn function_pointer(t: &Symbol) -> Option<Symbol> {
    match &t.kind {
        SymbolKind::Delegate(dg) => Some(Symbol::new(SymbolKind::Delegate(DelegateSymbol {
            is_function: true,
            ..dg.clone()
        }))),
        _ => None,
    }
}

fn aa_get_parameters(t: &Symbol) -> Vec<SyntheticParameter> {
    vec![
        SyntheticParameter {
            name: SmolStr::new_static("key"),
            ty: key_of(t).cloned(),
            is_lazy: false,
        },
        SyntheticParameter {
            name: SmolStr::new_static("defaultValue"),
            ty: value_of(t).cloned(),
            is_lazy: true,
        },
    ]
}

fn aa_remove_parameters(t: &Symbol) -> Vec<SyntheticParameter> {
    vec![SyntheticParameter {
        name: SmolStr::new_static("key"),
        ty: key_of(t).cloned(),
        is_lazy: false,
    }]
}

/// Peel members and aliases, keeping pointers.
fn owner_type<'s>(owner: PropertyOwner<'s>) -> Option<&'s Symbol> {
    let t = match owner {
        PropertyOwner::Type(t) => t,
        PropertyOwner::Value(SymbolValue::Type(t)) => t,
        PropertyOwner::Value(_) => return None,
    };
    t.strip_members()
}

fn size_of(t: &Symbol) -> Option<u64> {
    match &t.kind {
        SymbolKind::Primitive(p) => p.size_of(),
        SymbolKind::Pointer(_) | SymbolKind::Delegate(_) | SymbolKind::AssociativeArray { .. } => Some(8),
        SymbolKind::Array {
            element: Some(element),
            fixed_length: Some(n),
        } => size_of(element.strip_members()?).and_then(|s| s.checked_mul(*n)),
        // ptr + length
        SymbolKind::Array { fixed_length: None, .. } => Some(16),
        SymbolKind::Enum { base: Some(base), .. } => size_of(base),
        _ => None,
    }
}

fn size_value(owner: PropertyOwner<'_>) -> Option<SymbolValue> {
    let size = match owner {
        PropertyOwner::Value(SymbolValue::Int { ty, .. } | SymbolValue::Float { ty, .. }) => ty.size_of(),
        PropertyOwner::Value(SymbolValue::Bool(_)) => Some(1),
        _ => size_of(owner_type(owner)?),
    }?;
    Some(SymbolValue::Int {
        value: i128::from(size),
        ty: BasicType::Uint,
    })
}

fn length_value(owner: PropertyOwner<'_>) -> Option<SymbolValue> {
    let length = match owner {
        PropertyOwner::Value(SymbolValue::Array(items)) => items.len(),
        PropertyOwner::Value(SymbolValue::Str(s)) => s.len(),
        _ => {
            let mut t = owner_type(owner)?;
            while let SymbolKind::Pointer(Some(base)) = &t.kind {
                t = base.strip_members()?;
            }
            match &t.kind {
                SymbolKind::Array {
                    fixed_length: Some(n), ..
                } => usize::try_from(*n).ok()?,
                _ => return None,
            }
        }
    };
    Some(SymbolValue::int(length as i128))
}

fn tuple_length_value(owner: PropertyOwner<'_>) -> Option<SymbolValue> {
    match &owner_type(owner)?.kind {
        SymbolKind::Tuple(items) => Some(SymbolValue::size(items.len() as u64)),
        _ => None,
    }
}

fn integral_of(owner: PropertyOwner<'_>) -> Option<BasicType> {
    match owner {
        PropertyOwner::Value(SymbolValue::Int { ty, .. }) => Some(*ty),
        PropertyOwner::Value(SymbolValue::Bool(_)) => Some(BasicType::Bool),
        PropertyOwner::Value(SymbolValue::Char(_)) => Some(BasicType::Char),
        _ => match owner_type(owner)?.kind {
            SymbolKind::Primitive(t) => Some(t),
            _ => None,
        },
    }
}

fn integral_range(ty: BasicType) -> Option<(i128, i128)> {
    Some(match ty {
        BasicType::Bool => (0, 1),
        BasicType::Byte => (i8::MIN.into(), i8::MAX.into()),
        BasicType::Ubyte | BasicType::Char => (0, u8::MAX.into()),
        BasicType::Short => (i16::MIN.into(), i16::MAX.into()),
        BasicType::Ushort | BasicType::Wchar => (0, u16::MAX.into()),
        BasicType::Int => (i32::MIN.into(), i32::MAX.into()),
        BasicType::Uint => (0, u32::MAX.into()),
        BasicType::Dchar => (0, 0x10_FFFF),
        BasicType::Long => (i64::MIN.into(), i64::MAX.into()),
        BasicType::Ulong => (0, u64::MAX.into()),
        BasicType::Cent => (i128::MIN, i128::MAX),
        _ => return None,
    })
}

fn max_value(owner: PropertyOwner<'_>) -> Option<SymbolValue> {
    let ty = integral_of(owner)?;
    let (_, max) = integral_range(ty)?;
    Some(SymbolValue::Int { value: max, ty })
}

fn min_value(owner: PropertyOwner<'_>) -> Option<SymbolValue> {
    let ty = integral_of(owner)?;
    let (min, _) = integral_range(ty)?;
    Some(SymbolValue::Int { value: min, ty })
}

fn floating_of(owner: PropertyOwner<'_>) -> Option<BasicType> {
    match owner {
        PropertyOwner::Value(SymbolValue::Float { ty, .. }) => Some(*ty),
        _ => match owner_type(owner)?.kind {
            SymbolKind::Primitive(t) if t.is_floating_point() => Some(t),
            _ => None,
        },
    }
}

fn infinity_value(owner: PropertyOwner<'_>) -> Option<SymbolValue> {
    let ty = floating_of(owner)?;
    Some(SymbolValue::Float {
        value: f64::INFINITY,
        ty,
    })
}

fn nan_value(owner: PropertyOwner<'_>) -> Option<SymbolValue> {
    let ty = floating_of(owner)?;
    Some(SymbolValue::Float { value: f64::NAN, ty })
}

// ============================================================================
// REGISTRY
// ============================================================================

type Table = IndexMap<&'static str, PropertyInfo>;

struct Registry {
    generic: Table,
    categories: FxHashMap<OwnerCategory, Table>,
}

fn table(entries: impl IntoIterator<Item = PropertyInfo>) -> Table {
    entries.into_iter().map(|p| (p.name, p)).collect()
}

impl Registry {
    fn build() -> Self {
        use FixedType::*;
        use PropertyInfo as P;

        let generic = table([
            P::reflecting("init", "A type's or variable's static initializer expression"),
            P::fixed("sizeof", "Size of a type or variable in bytes", Basic(BasicType::Uint)).valued(size_value),
            P::fixed("alignof", "Variable offset", Basic(BasicType::Uint)).instance_only(),
            P::fixed("mangleof", "String representing the ‘mangled’ representation of the type", String),
            P::fixed("stringof", "String representing the source representation of the type", String),
        ]);

        let integral = table([
            P::reflecting("max", "Maximum value").valued(max_value),
            P::reflecting("min", "Minimum value").valued(min_value),
        ]);

        let floating = table([
            P::reflecting("infinity", "Infinity value").valued(infinity_value),
            P::reflecting("nan", "Not-a-Number value").valued(nan_value),
            P::fixed("dig", "Number of decimal digits of precision", Basic(BasicType::Int)),
            P::reflecting("epsilon", "Smallest increment to the value 1"),
            P::fixed("mant_dig", "Number of bits in mantissa", Basic(BasicType::Int)),
            P::fixed(
                "max_10_exp",
                "Maximum int value such that 10^max_10_exp is representable",
                Basic(BasicType::Int),
            ),
            P::fixed(
                "max_exp",
                "Maximum int value such that 2^max_exp-1 is representable",
                Basic(BasicType::Int),
            ),
            P::fixed(
                "min_10_exp",
                "Minimum int value such that 10^min_10_exp is representable",
                Basic(BasicType::Int),
            ),
            P::fixed(
                "min_exp",
                "Minimum int value such that 2^min_exp-1 is representable",
                Basic(BasicType::Int),
            ),
            P::reflecting("min_normal", "Smallest representable normalized value"),
            P::reflecting("re", "Real part").instance_only(),
            P::reflecting("im", "Imaginary part").instance_only(),
        ]);

        let array = table([
            P::fixed("length", "Array length", Basic(BasicType::Int))
                .instance_only()
                .valued(length_value),
            P::reflecting(
                "dup",
                "Create a dynamic array of the same size and copy the contents of the array into it.",
            )
            .instance_only(),
            P::new("idup", "Creates immutable copy of the array")
                .computed(immutable_copy)
                .instance_only(),
            P::reflecting(
                "reverse",
                "Reverses in place the order of the elements in the array. Returns the array.",
            )
            .instance_only(),
            P::reflecting(
                "sort",
                "Sorts in place the order of the elements in the array. Returns the array.",
            )
            .instance_only(),
            P::new("ptr", "Returns pointer to the array")
                .computed(array_pointer)
                .instance_only(),
        ]);

        // Associative arrays start from the array table.
        let mut associative = array.clone();
        for info in [
            P::fixed(
                "length",
                "Returns number of values in the associative array. Unlike for dynamic arrays, it is read-only.",
                SizeT,
            )
            .instance_only(),
            P::new(
                "keys",
                "Returns dynamic array, the elements of which are the keys in the associative array.",
            )
            .computed(keys)
            .instance_only(),
            P::new(
                "values",
                "Returns dynamic array, the elements of which are the values in the associative array.",
            )
            .computed(values)
            .instance_only(),
            P::reflecting(
                "rehash",
                "Reorganizes the associative array in place so that lookups are more efficient.",
            )
            .instance_only(),
            P::new(
                "byKey",
                "Returns a delegate suitable for use as an aggregate to a foreach statement iterating over the keys.",
            )
            .computed(by_key)
            .instance_only(),
            P::new(
                "byValue",
                "Returns a delegate suitable for use as an aggregate to a foreach statement iterating over the values.",
            )
            .computed(by_value)
            .instance_only(),
            P::new(
                "get",
                "Looks up key; if it exists returns corresponding value else evaluates and returns defaultValue.",
            )
            .computed(aa_value)
            .method(aa_get_parameters)
            .instance_only(),
            P::fixed(
                "remove",
                "Removes key from the associative array; returns whether it existed.",
                Basic(BasicType::Bool),
            )
            .method(aa_remove_parameters)
            .instance_only(),
        ] {
            associative.insert(info.name, info);
        }

        let tuple = table([P::fixed("length", "Returns number of values in the type tuple.", SizeT)
            .instance_only()
            .valued(tuple_length_value)]);

        let delegate = table([
            P::fixed(
                "ptr",
                "The .ptr property of a delegate will return the frame pointer value as a void*.",
                VoidPointer,
            )
            .instance_only(),
            P::new(
                "funcptr",
                "The .funcptr property of a delegate will return the function pointer value as a function type.",
            )
            .computed(function_pointer)
            .instance_only(),
        ]);

        let aggregate = table([P::fixed(
            "classinfo",
            "Information about the dynamic type of the class",
            TypeInfoClass,
        )
        .instance_only()]);

        let mut categories = FxHashMap::default();
        categories.insert(OwnerCategory::Integral, integral);
        categories.insert(OwnerCategory::FloatingPoint, floating);
        categories.insert(OwnerCategory::Array, array);
        categories.insert(OwnerCategory::AssociativeArray, associative);
        categories.insert(OwnerCategory::TypeTuple, tuple);
        categories.insert(OwnerCategory::Delegate, delegate);
        categories.insert(OwnerCategory::AggregateType, aggregate);

        tracing::debug!("[PROPS] built static property registry");
        Self { generic, categories }
    }

    fn category(&self, category: OwnerCategory) -> Option<&Table> {
        match category {
            OwnerCategory::Generic => Some(&self.generic),
            other => self.categories.get(&other),
        }
    }
}

static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::build);

// ============================================================================
// PUBLIC API
// ============================================================================

/// The property `name` for an owner of `category`: the generic table is
/// consulted first, then the category's own table.
pub fn lookup(category: Option<OwnerCategory>, name: &str) -> Option<&'static PropertyInfo> {
    let registry = &*REGISTRY;
    registry.generic.get(name).or_else(|| {
        category
            .and_then(|c| registry.category(c))
            .and_then(|t| t.get(name))
    })
}

/// Every property available on `symbol`. `static_only` leaves out those
/// that need an instance.
pub fn list_properties(ast: &Ast, symbol: &Symbol, static_only: bool) -> Vec<SyntheticDecl> {
    let Some(owner) = looked_up_type(ast, symbol) else {
        return Vec::new();
    };
    let registry = &*REGISTRY;
    let specific = owner_category(ast, owner).and_then(|c| registry.category(c));
    registry
        .generic
        .values()
        .chain(specific.into_iter().flat_map(|t| t.values()))
        .filter(|p| !static_only || !p.requires_instance)
        .map(|p| p.declaration(owner))
        .collect()
}

fn resolve_fixed(ctxt: &mut ResolutionContext<'_>, ty: FixedType) -> Option<Symbol> {
    // Silent lookup: a missing runtime alias falls back to the builtin.
    let named = |ctxt: &mut ResolutionContext<'_>, name: &str| resolve::resolve_overloads(name, ctxt).into_iter().next();
    match ty {
        FixedType::Basic(t) => Some(Symbol::primitive(t)),
        FixedType::VoidPointer => Some(Symbol::pointer(Some(Symbol::primitive(BasicType::Void)))),
        FixedType::SizeT => {
            named(ctxt, SIZE_T).or_else(|| Some(Symbol::primitive(BasicType::Ulong)))
        }
        FixedType::String => named(ctxt, STRING).or_else(|| Some(Symbol::string())),
        FixedType::TypeInfoClass => {
            let object = ctxt.cache().object_module()?;
            ctxt.with_scope(object, None, |ctxt| named(ctxt, TYPE_INFO_CLASS))
                .flatten()
        }
    }
}

/// Resolve `owner.name` to a synthesized member, with its type and, where
/// it is known without evaluation, its constant value.
pub fn try_resolve(ctxt: &mut ResolutionContext<'_>, owner: &Symbol, name: &str) -> Option<Symbol> {
    let ast = ctxt.ast();
    let looked_up = looked_up_type(ast, owner)?;
    let info = lookup(owner_category(ast, looked_up), name)?;

    let base = match (info.fixed_type, info.type_getter) {
        (Some(fixed), _) => resolve_fixed(ctxt, fixed),
        (None, Some(getter)) => getter(looked_up),
        (None, None) => None,
    };
    let constant = info.value_getter.and_then(|getter| getter(PropertyOwner::Type(owner)));
    tracing::trace!("[PROPS] {}.{} -> constant {:?}", owner.display(ast), name, constant);

    let definition = Definition::Synthetic(Arc::new(info.declaration(looked_up)));
    let mut member = Symbol::member(definition, base);
    if let SymbolKind::Member(m) = &mut member.kind {
        m.constant = constant;
    }
    Some(member)
}

/// The constant value of `owner.name`, when the property defines one.
pub fn try_evaluate(ast: &Ast, owner: PropertyOwner<'_>, name: &str) -> Option<SymbolValue> {
    let category = match owner {
        PropertyOwner::Type(t) => looked_up_type(ast, t).and_then(|t| owner_category(ast, t)),
        PropertyOwner::Value(v) => value_category(ast, v),
    };
    let getter = lookup(category, name)?.value_getter?;
    getter(owner)
}
