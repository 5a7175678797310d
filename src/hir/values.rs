//! Compile-time values and template arguments.

use std::fmt;

use smol_str::SmolStr;

use crate::syntax::BasicType;

use super::symbols::Symbol;

/// A constant produced by evaluation or attached to a deduced parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum SymbolValue {
    Int { value: i128, ty: BasicType },
    Float { value: f64, ty: BasicType },
    Bool(bool),
    Char(char),
    Str(SmolStr),
    Array(Vec<SymbolValue>),
    /// A type used where a value was expected (`is(T)`, type arguments).
    Type(Box<Symbol>),
    Null,
    /// Not a compile-time constant; carries the source text it stands for.
    Symbolic(SmolStr),
}

impl SymbolValue {
    pub fn int(value: i128) -> Self {
        SymbolValue::Int {
            value,
            ty: BasicType::Int,
        }
    }

    pub fn size(value: u64) -> Self {
        SymbolValue::Int {
            value: value as i128,
            ty: BasicType::Ulong,
        }
    }

    /// Symbolic placeholders match any argument during deduction.
    pub fn is_final(&self) -> bool {
        !matches!(self, SymbolValue::Symbolic(_))
    }

    /// `Some(true)` for non-zero/non-null values, `None` when unknown.
    pub fn truthiness(&self) -> Option<bool> {
        match self {
            SymbolValue::Int { value, .. } => Some(*value != 0),
            SymbolValue::Float { value, .. } => Some(*value != 0.0),
            SymbolValue::Bool(b) => Some(*b),
            SymbolValue::Char(c) => Some(*c != '\0'),
            SymbolValue::Str(_) | SymbolValue::Array(_) | SymbolValue::Type(_) => Some(true),
            SymbolValue::Null => Some(false),
            SymbolValue::Symbolic(_) => None,
        }
    }

    pub fn as_int(&self) -> Option<i128> {
        match self {
            SymbolValue::Int { value, .. } => Some(*value),
            SymbolValue::Bool(b) => Some(i128::from(*b)),
            SymbolValue::Char(c) => Some(i128::from(u32::from(*c))),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            SymbolValue::Float { value, .. } => Some(*value),
            other => other.as_int().map(|v| v as f64),
        }
    }

    /// The type a value of this kind has.
    pub fn represented_type(&self) -> Option<Symbol> {
        match self {
            SymbolValue::Int { ty, .. } | SymbolValue::Float { ty, .. } => Some(Symbol::primitive(*ty)),
            SymbolValue::Bool(_) => Some(Symbol::primitive(BasicType::Bool)),
            SymbolValue::Char(_) => Some(Symbol::primitive(BasicType::Char)),
            SymbolValue::Str(_) => Some(Symbol::string()),
            SymbolValue::Array(items) => {
                let element = items.first().and_then(SymbolValue::represented_type);
                Some(Symbol::fixed_array(element, items.len() as u64))
            }
            SymbolValue::Type(ty) => Some(ty.as_ref().clone()),
            SymbolValue::Null | SymbolValue::Symbolic(_) => None,
        }
    }

    /// Value equality with numeric widening; symbolic values never compare equal.
    pub fn same_value(&self, other: &SymbolValue) -> bool {
        match (self, other) {
            (SymbolValue::Symbolic(_), _) | (_, SymbolValue::Symbolic(_)) => false,
            (SymbolValue::Float { .. }, _) | (_, SymbolValue::Float { .. }) => {
                matches!((self.as_float(), other.as_float()), (Some(a), Some(b)) if a == b)
            }
            (SymbolValue::Array(a), SymbolValue::Array(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.same_value(y))
            }
            (SymbolValue::Str(a), SymbolValue::Str(b)) => a == b,
            (SymbolValue::Null, SymbolValue::Null) => true,
            (SymbolValue::Type(a), SymbolValue::Type(b)) => super::compare::is_equal(a, b),
            _ => matches!((self.as_int(), other.as_int()), (Some(a), Some(b)) if a == b),
        }
    }
}

impl fmt::Display for SymbolValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SymbolValue::Int { value, .. } => write!(f, "{value}"),
            SymbolValue::Float { value, .. } => write!(f, "{value}"),
            SymbolValue::Bool(b) => write!(f, "{b}"),
            SymbolValue::Char(c) => write!(f, "'{c}'"),
            SymbolValue::Str(s) => write!(f, "\"{s}\""),
            SymbolValue::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            SymbolValue::Type(_) => f.write_str("<type>"),
            SymbolValue::Null => f.write_str("null"),
            SymbolValue::Symbolic(text) => f.write_str(text),
        }
    }
}

/// A pre-resolved template argument.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateArgument {
    Type(Symbol),
    Value(SymbolValue),
    /// A type argument that did not resolve; never matches a parameter.
    Unresolved(SmolStr),
}

impl TemplateArgument {
    /// The argument viewed as a type, if it denotes one.
    pub fn as_type(&self) -> Option<&Symbol> {
        match self {
            TemplateArgument::Type(ty) => Some(ty),
            TemplateArgument::Value(SymbolValue::Type(ty)) => Some(ty),
            _ => None,
        }
    }

    pub fn as_value(&self) -> Option<&SymbolValue> {
        match self {
            TemplateArgument::Value(v) => Some(v),
            _ => None,
        }
    }
}
