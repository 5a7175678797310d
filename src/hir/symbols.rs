//! SymbolModel: resolved types and symbols.
//!
//! A [`Symbol`] is a closed [`SymbolKind`] plus provenance: the syntax node
//! that produced it, an optional type modifier, and [`SymbolTag`]s recording
//! how the result was reached (through an alias, via UFCS, ...).
//!
//! Symbols are plain values, created fresh by every resolution call.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use smol_str::SmolStr;

use crate::syntax::{Ast, BasicType, NodeId, TypeModifier};

use super::values::{SymbolValue, TemplateArgument};

// ============================================================================
// DEDUCED TEMPLATE PARAMETERS
// ============================================================================

/// A template parameter, optionally bound to a type or a constant.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateParameterSymbol {
    /// The declaring parameter node; identity, never the name.
    pub parameter: NodeId,
    pub base: Option<Box<Symbol>>,
    pub value: Option<SymbolValue>,
}

impl TemplateParameterSymbol {
    pub fn unbound(parameter: NodeId) -> Self {
        Self {
            parameter,
            base: None,
            value: None,
        }
    }

    pub fn with_type(parameter: NodeId, ty: Symbol) -> Self {
        Self {
            parameter,
            base: Some(Box::new(ty)),
            value: None,
        }
    }

    pub fn with_value(parameter: NodeId, value: SymbolValue) -> Self {
        let base = value.represented_type().map(Box::new);
        Self {
            parameter,
            base,
            value: Some(value),
        }
    }

    pub fn is_bound(&self) -> bool {
        self.base.is_some() || self.value.is_some()
    }

    pub fn as_argument(&self) -> Option<TemplateArgument> {
        match (&self.value, &self.base) {
            (Some(v), _) => Some(TemplateArgument::Value(v.clone())),
            (None, Some(b)) => Some(TemplateArgument::Type(b.as_ref().clone())),
            (None, None) => None,
        }
    }
}

/// Deduced bindings keyed by parameter identity, in declaration order.
///
/// A slot present with `None` is a declared but not yet deduced parameter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeducedTypeDictionary {
    entries: IndexMap<NodeId, Option<TemplateParameterSymbol>>,
}

impl DeducedTypeDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty slots for each of `parameters`.
    pub fn for_parameters(parameters: &[NodeId]) -> Self {
        Self {
            entries: parameters.iter().map(|&p| (p, None)).collect(),
        }
    }

    pub fn declare(&mut self, parameter: NodeId) {
        self.entries.entry(parameter).or_insert(None);
    }

    pub fn contains(&self, parameter: NodeId) -> bool {
        self.entries.contains_key(&parameter)
    }

    pub fn get(&self, parameter: NodeId) -> Option<&TemplateParameterSymbol> {
        self.entries.get(&parameter).and_then(Option::as_ref)
    }

    pub fn is_satisfied(&self, parameter: NodeId) -> bool {
        self.get(parameter).is_some_and(TemplateParameterSymbol::is_bound)
    }

    pub fn all_satisfied(&self) -> bool {
        self.entries
            .values()
            .all(|slot| slot.as_ref().is_some_and(TemplateParameterSymbol::is_bound))
    }

    /// Bind a parameter, returning the previous binding.
    pub fn set(&mut self, symbol: TemplateParameterSymbol) -> Option<TemplateParameterSymbol> {
        self.entries.insert(symbol.parameter, Some(symbol)).flatten()
    }

    pub fn clear(&mut self, parameter: NodeId) {
        if let Some(slot) = self.entries.get_mut(&parameter) {
            *slot = None;
        }
    }

    pub fn bound(&self) -> impl Iterator<Item = &TemplateParameterSymbol> {
        self.entries.values().flatten()
    }

    pub fn parameters(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.entries.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copy bindings from `other` into slots that are absent or unbound here.
    pub fn merge_missing(&mut self, other: &DeducedTypeDictionary) {
        for symbol in other.bound() {
            if !self.is_satisfied(symbol.parameter) {
                self.set(symbol.clone());
            }
        }
    }
}

impl FromIterator<TemplateParameterSymbol> for DeducedTypeDictionary {
    fn from_iter<I: IntoIterator<Item = TemplateParameterSymbol>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|s| (s.parameter, Some(s))).collect(),
        }
    }
}

// ============================================================================
// MEMBERS
// ============================================================================

/// A parameter of a synthesized method such as `aa.get(key, default)`.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticParameter {
    pub name: SmolStr,
    pub ty: Option<Symbol>,
    pub is_lazy: bool,
}

/// A declaration with no syntax behind it (built-in properties).
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticDecl {
    pub name: SmolStr,
    pub description: &'static str,
    /// `v.length` needs a value; `T.sizeof` does not.
    pub requires_instance: bool,
    /// Present for synthesized methods.
    pub parameters: Option<Vec<SyntheticParameter>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Definition {
    Node(NodeId),
    Synthetic(Arc<SyntheticDecl>),
}

impl Definition {
    pub fn node(&self) -> Option<NodeId> {
        match self {
            Definition::Node(id) => Some(*id),
            Definition::Synthetic(_) => None,
        }
    }
}

/// A variable, method, enum member or property, with its resolved type.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberSymbol {
    pub definition: Definition,
    pub base: Option<Box<Symbol>>,
    pub deduced: DeducedTypeDictionary,
    /// Known constant value, e.g. `.length` of a fixed-size array.
    pub constant: Option<SymbolValue>,
}

// ============================================================================
// TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateKind {
    Struct,
    Union,
    Class,
    Interface,
    Template,
    MixinTemplate,
    EponymousTemplate,
}

impl AggregateKind {
    pub fn is_class_like(self) -> bool {
        matches!(self, AggregateKind::Class | AggregateKind::Interface)
    }

    pub fn is_template(self) -> bool {
        matches!(
            self,
            AggregateKind::Template | AggregateKind::MixinTemplate | AggregateKind::EponymousTemplate
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AggregateSymbol {
    pub kind: AggregateKind,
    pub node: NodeId,
    pub base_class: Option<Box<Symbol>>,
    pub interfaces: Vec<Symbol>,
    pub deduced: DeducedTypeDictionary,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DelegateSymbol {
    pub return_type: Option<Box<Symbol>>,
    pub parameters: Vec<Symbol>,
    /// `function` pointer rather than `delegate`.
    pub is_function: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SymbolKind {
    Primitive(BasicType),
    Pointer(Option<Box<Symbol>>),
    Array {
        element: Option<Box<Symbol>>,
        fixed_length: Option<u64>,
    },
    AssociativeArray {
        key: Option<Box<Symbol>>,
        value: Option<Box<Symbol>>,
    },
    Delegate(DelegateSymbol),
    Aggregate(AggregateSymbol),
    Enum {
        node: NodeId,
        base: Option<Box<Symbol>>,
    },
    /// An alias whose target was not (or could not be) resolved.
    Alias {
        node: NodeId,
        base: Option<Box<Symbol>>,
    },
    Module(NodeId),
    /// Dotted package path.
    Package(SmolStr),
    Member(MemberSymbol),
    TemplateParameter(TemplateParameterSymbol),
    Ambiguous(Vec<Symbol>),
    Tuple(Vec<TemplateArgument>),
}

/// Provenance attached to a result.
#[derive(Debug, Clone, PartialEq)]
pub enum SymbolTag {
    /// The result was reached through this alias declaration.
    Alias(NodeId),
    /// The value the member was accessed on.
    Receiver(Box<Symbol>),
    /// A free function called with member syntax.
    Ufcs,
    /// Produced by `opDispatch` for this member name.
    OpDispatch(SmolStr),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub kind: SymbolKind,
    pub origin: Option<NodeId>,
    pub modifier: Option<TypeModifier>,
    pub tags: Vec<SymbolTag>,
}

impl From<SymbolKind> for Symbol {
    fn from(kind: SymbolKind) -> Self {
        Symbol::new(kind)
    }
}

impl Symbol {
    pub fn new(kind: SymbolKind) -> Self {
        Self {
            kind,
            origin: None,
            modifier: None,
            tags: Vec::new(),
        }
    }

    pub fn primitive(ty: BasicType) -> Self {
        Self::new(SymbolKind::Primitive(ty))
    }

    /// `immutable(char)[]`
    pub fn string() -> Self {
        let element = Symbol::primitive(BasicType::Char).with_modifier(TypeModifier::Immutable);
        Self::array(Some(element))
    }

    pub fn pointer(base: Option<Symbol>) -> Self {
        Self::new(SymbolKind::Pointer(base.map(Box::new)))
    }

    pub fn array(element: Option<Symbol>) -> Self {
        Self::new(SymbolKind::Array {
            element: element.map(Box::new),
            fixed_length: None,
        })
    }

    pub fn fixed_array(element: Option<Symbol>, length: u64) -> Self {
        Self::new(SymbolKind::Array {
            element: element.map(Box::new),
            fixed_length: Some(length),
        })
    }

    pub fn assoc_array(key: Option<Symbol>, value: Option<Symbol>) -> Self {
        Self::new(SymbolKind::AssociativeArray {
            key: key.map(Box::new),
            value: value.map(Box::new),
        })
    }

    pub fn member(definition: Definition, base: Option<Symbol>) -> Self {
        let origin = definition.node();
        Self {
            origin,
            ..Self::new(SymbolKind::Member(MemberSymbol {
                definition,
                base: base.map(Box::new),
                deduced: DeducedTypeDictionary::new(),
                constant: None,
            }))
        }
    }

    pub fn aggregate(kind: AggregateKind, node: NodeId) -> Self {
        Self {
            origin: Some(node),
            ..Self::new(SymbolKind::Aggregate(AggregateSymbol {
                kind,
                node,
                base_class: None,
                interfaces: Vec::new(),
                deduced: DeducedTypeDictionary::new(),
            }))
        }
    }

    pub fn template_parameter(symbol: TemplateParameterSymbol) -> Self {
        Self {
            origin: Some(symbol.parameter),
            ..Self::new(SymbolKind::TemplateParameter(symbol))
        }
    }

    pub fn tuple(items: Vec<TemplateArgument>) -> Self {
        Self::new(SymbolKind::Tuple(items))
    }

    pub fn with_origin(mut self, node: NodeId) -> Self {
        self.origin = Some(node);
        self
    }

    pub fn with_modifier(mut self, modifier: TypeModifier) -> Self {
        self.modifier = Some(modifier);
        self
    }

    pub fn with_tag(mut self, tag: SymbolTag) -> Self {
        self.tags.push(tag);
        self
    }

    // ========================================================================
    // CANDIDATE LISTS
    // ========================================================================

    /// Collapse a candidate list: none, the single result, or `Ambiguous`.
    pub fn from_candidates(mut candidates: Vec<Symbol>) -> Option<Symbol> {
        match candidates.len() {
            0 => None,
            1 => candidates.pop(),
            _ => Some(Symbol::new(SymbolKind::Ambiguous(candidates))),
        }
    }

    /// Dissolve `Ambiguous` back into its candidates.
    pub fn into_candidates(self) -> Vec<Symbol> {
        match self.kind {
            SymbolKind::Ambiguous(items) => items,
            _ => vec![self],
        }
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn alias_tags(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.tags.iter().filter_map(|t| match t {
            SymbolTag::Alias(node) => Some(*node),
            _ => None,
        })
    }

    pub fn receiver(&self) -> Option<&Symbol> {
        self.tags.iter().find_map(|t| match t {
            SymbolTag::Receiver(r) => Some(r.as_ref()),
            _ => None,
        })
    }

    pub fn has_tag(&self, tag: &SymbolTag) -> bool {
        self.tags.contains(tag)
    }

    /// The wrapped or underlying type, one level down.
    pub fn base(&self) -> Option<&Symbol> {
        match &self.kind {
            SymbolKind::Pointer(base)
            | SymbolKind::Enum { base, .. }
            | SymbolKind::Alias { base, .. }
            | SymbolKind::Array { element: base, .. }
            | SymbolKind::AssociativeArray { value: base, .. } => base.as_deref(),
            SymbolKind::Member(m) => m.base.as_deref(),
            SymbolKind::TemplateParameter(tp) => tp.base.as_deref(),
            _ => None,
        }
    }

    /// Unwrap members, resolved aliases and bound template parameters down
    /// to the type they stand for. An unbound template parameter is returned
    /// as is; a member or alias without a base yields `None`.
    pub fn strip_members(&self) -> Option<&Symbol> {
        let mut current = self;
        loop {
            match &current.kind {
                SymbolKind::Member(m) => current = m.base.as_deref()?,
                SymbolKind::Alias { base, .. } => current = base.as_deref()?,
                SymbolKind::TemplateParameter(tp) => match tp.base.as_deref() {
                    Some(base) => current = base,
                    None => return Some(current),
                },
                _ => return Some(current),
            }
        }
    }

    /// The declaration this symbol stands for, if any.
    pub fn definition_node(&self) -> Option<NodeId> {
        match &self.kind {
            SymbolKind::Aggregate(a) => Some(a.node),
            SymbolKind::Enum { node, .. } | SymbolKind::Alias { node, .. } => Some(*node),
            SymbolKind::Module(node) => Some(*node),
            SymbolKind::Member(m) => m.definition.node(),
            SymbolKind::TemplateParameter(tp) => Some(tp.parameter),
            _ => None,
        }
    }

    pub fn deduced(&self) -> Option<&DeducedTypeDictionary> {
        match &self.kind {
            SymbolKind::Aggregate(a) => Some(&a.deduced),
            SymbolKind::Member(m) => Some(&m.deduced),
            _ => None,
        }
    }

    pub fn deduced_mut(&mut self) -> Option<&mut DeducedTypeDictionary> {
        match &mut self.kind {
            SymbolKind::Aggregate(a) => Some(&mut a.deduced),
            SymbolKind::Member(m) => Some(&mut m.deduced),
            _ => None,
        }
    }

    pub fn as_aggregate(&self) -> Option<&AggregateSymbol> {
        match &self.kind {
            SymbolKind::Aggregate(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_member(&self) -> Option<&MemberSymbol> {
        match &self.kind {
            SymbolKind::Member(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_template_parameter(&self) -> Option<&TemplateParameterSymbol> {
        match &self.kind {
            SymbolKind::TemplateParameter(tp) => Some(tp),
            _ => None,
        }
    }

    pub fn is_member(&self) -> bool {
        matches!(self.kind, SymbolKind::Member(_))
    }

    /// An array of characters.
    pub fn is_string(&self) -> bool {
        match &self.kind {
            SymbolKind::Array {
                element: Some(element),
                ..
            } => matches!(element.kind, SymbolKind::Primitive(t) if t.is_character()),
            _ => false,
        }
    }

    /// Human-readable rendering; node names come from `ast`.
    pub fn display<'a>(&'a self, ast: &'a Ast) -> SymbolDisplay<'a> {
        SymbolDisplay { symbol: self, ast }
    }
}

// ============================================================================
// DISPLAY
// ============================================================================

pub struct SymbolDisplay<'a> {
    symbol: &'a Symbol,
    ast: &'a Ast,
}

impl SymbolDisplay<'_> {
    fn nested(&self, symbol: Option<&Symbol>, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match symbol {
            Some(s) => write!(f, "{}", s.display(self.ast)),
            None => f.write_str("?"),
        }
    }

    fn argument(&self, arg: &TemplateArgument, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match arg {
            TemplateArgument::Type(t) => write!(f, "{}", t.display(self.ast)),
            TemplateArgument::Value(v) => write!(f, "{v}"),
            TemplateArgument::Unresolved(text) => f.write_str(text),
        }
    }
}

impl fmt::Display for SymbolDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(m) = self.symbol.modifier {
            write!(f, "{}(", m.keyword())?;
        }
        let name = |node: NodeId| self.ast.node(node).name.clone();
        match &self.symbol.kind {
            SymbolKind::Primitive(t) => write!(f, "{t}")?,
            SymbolKind::Pointer(base) => {
                self.nested(base.as_deref(), f)?;
                f.write_str("*")?;
            }
            SymbolKind::Array {
                element,
                fixed_length,
            } => {
                self.nested(element.as_deref(), f)?;
                match fixed_length {
                    Some(n) => write!(f, "[{n}]")?,
                    None => f.write_str("[]")?,
                }
            }
            SymbolKind::AssociativeArray { key, value } => {
                self.nested(value.as_deref(), f)?;
                f.write_str("[")?;
                self.nested(key.as_deref(), f)?;
                f.write_str("]")?;
            }
            SymbolKind::Delegate(d) => {
                self.nested(d.return_type.as_deref(), f)?;
                f.write_str(if d.is_function { " function(" } else { " delegate(" })?;
                for (i, p) in d.parameters.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    self.nested(Some(p), f)?;
                }
                f.write_str(")")?;
            }
            SymbolKind::Aggregate(a) => {
                f.write_str(&name(a.node))?;
                let bound: Vec<_> = a.deduced.bound().collect();
                if !bound.is_empty() {
                    f.write_str("!(")?;
                    for (i, tp) in bound.iter().enumerate() {
                        if i > 0 {
                            f.write_str(", ")?;
                        }
                        match tp.as_argument() {
                            Some(arg) => self.argument(&arg, f)?,
                            None => f.write_str("?")?,
                        }
                    }
                    f.write_str(")")?;
                }
            }
            SymbolKind::Enum { node, .. }
            | SymbolKind::Alias { node, .. }
            | SymbolKind::Module(node) => f.write_str(&name(*node))?,
            SymbolKind::Package(path) => f.write_str(path)?,
            SymbolKind::Member(m) => match &m.definition {
                Definition::Node(node) => f.write_str(&name(*node))?,
                Definition::Synthetic(decl) => f.write_str(&decl.name)?,
            },
            SymbolKind::TemplateParameter(tp) => match tp.base.as_deref() {
                Some(base) => self.nested(Some(base), f)?,
                None => f.write_str(&name(tp.parameter))?,
            },
            SymbolKind::Ambiguous(items) => write!(f, "<{} candidates>", items.len())?,
            SymbolKind::Tuple(items) => {
                f.write_str("(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    self.argument(item, f)?;
                }
                f.write_str(")")?;
            }
        }
        if self.symbol.modifier.is_some() {
            f.write_str(")")?;
        }
        Ok(())
    }
}
