//! Type declaration syntax.

use std::fmt;

use smol_str::SmolStr;

use super::expr::Expr;

// ============================================================================
// BASIC TYPES
// ============================================================================

/// Built-in type keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BasicType {
    Void,
    Bool,
    Byte,
    Ubyte,
    Short,
    Ushort,
    Int,
    Uint,
    Long,
    Ulong,
    Cent,
    Ucent,
    Float,
    Double,
    Real,
    Char,
    Wchar,
    Dchar,
}

impl BasicType {
    pub const ALL: [BasicType; 18] = [
        BasicType::Void,
        BasicType::Bool,
        BasicType::Byte,
        BasicType::Ubyte,
        BasicType::Short,
        BasicType::Ushort,
        BasicType::Int,
        BasicType::Uint,
        BasicType::Long,
        BasicType::Ulong,
        BasicType::Cent,
        BasicType::Ucent,
        BasicType::Float,
        BasicType::Double,
        BasicType::Real,
        BasicType::Char,
        BasicType::Wchar,
        BasicType::Dchar,
    ];

    pub fn keyword(self) -> &'static str {
        match self {
            BasicType::Void => "void",
            BasicType::Bool => "bool",
            BasicType::Byte => "byte",
            BasicType::Ubyte => "ubyte",
            BasicType::Short => "short",
            BasicType::Ushort => "ushort",
            BasicType::Int => "int",
            BasicType::Uint => "uint",
            BasicType::Long => "long",
            BasicType::Ulong => "ulong",
            BasicType::Cent => "cent",
            BasicType::Ucent => "ucent",
            BasicType::Float => "float",
            BasicType::Double => "double",
            BasicType::Real => "real",
            BasicType::Char => "char",
            BasicType::Wchar => "wchar",
            BasicType::Dchar => "dchar",
        }
    }

    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.keyword() == keyword)
    }

    pub fn is_integral(self) -> bool {
        matches!(
            self,
            BasicType::Bool
                | BasicType::Byte
                | BasicType::Ubyte
                | BasicType::Short
                | BasicType::Ushort
                | BasicType::Int
                | BasicType::Uint
                | BasicType::Long
                | BasicType::Ulong
                | BasicType::Cent
                | BasicType::Ucent
                | BasicType::Char
                | BasicType::Wchar
                | BasicType::Dchar
        )
    }

    pub fn is_floating_point(self) -> bool {
        matches!(self, BasicType::Float | BasicType::Double | BasicType::Real)
    }

    pub fn is_character(self) -> bool {
        matches!(self, BasicType::Char | BasicType::Wchar | BasicType::Dchar)
    }

    /// Storage size in bytes; `None` for `void`.
    pub fn size_of(self) -> Option<u64> {
        Some(match self {
            BasicType::Void => return None,
            BasicType::Bool | BasicType::Byte | BasicType::Ubyte | BasicType::Char => 1,
            BasicType::Short | BasicType::Ushort | BasicType::Wchar => 2,
            BasicType::Int | BasicType::Uint | BasicType::Float | BasicType::Dchar => 4,
            BasicType::Long | BasicType::Ulong | BasicType::Double => 8,
            BasicType::Real => 10,
            BasicType::Cent | BasicType::Ucent => 16,
        })
    }
}

impl fmt::Display for BasicType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Type constructors applied to an inner type, e.g. `const(int)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeModifier {
    Const,
    Immutable,
    Shared,
    Inout,
}

impl TypeModifier {
    pub fn keyword(self) -> &'static str {
        match self {
            TypeModifier::Const => "const",
            TypeModifier::Immutable => "immutable",
            TypeModifier::Shared => "shared",
            TypeModifier::Inout => "inout",
        }
    }
}

// ============================================================================
// TYPE DECLARATIONS
// ============================================================================

/// A template argument as written: either a type or a value expression.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateArg {
    Type(TypeDecl),
    Value(Expr),
}

/// What sits between the brackets of an array declaration.
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayKey {
    /// `T[]`
    None,
    /// `V[K]` with a type key: associative array.
    Type(Box<TypeDecl>),
    /// `T[n]` with an expression: fixed size, or an index into a tuple.
    Expr(Box<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeOfTarget {
    Return,
    Expr(Box<Expr>),
}

/// Type syntax as supplied by the parser.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeDecl {
    Basic(BasicType),
    /// First segment of a (possibly dotted) chain, e.g. `Foo` or `Foo!(int)`.
    Identifier {
        name: SmolStr,
        template_args: Option<Vec<TemplateArg>>,
    },
    /// A further chain segment: `inner.name` or `inner.name!(args)`.
    Member {
        inner: Box<TypeDecl>,
        name: SmolStr,
        template_args: Option<Vec<TemplateArg>>,
    },
    Pointer(Box<TypeDecl>),
    Array {
        element: Box<TypeDecl>,
        key: ArrayKey,
    },
    /// `R delegate(P...)` or `R function(P...)`.
    Delegate {
        return_type: Box<TypeDecl>,
        parameters: Vec<TypeDecl>,
        is_function: bool,
    },
    TypeOf(TypeOfTarget),
    Modified {
        modifier: TypeModifier,
        inner: Box<TypeDecl>,
    },
}

impl TypeDecl {
    pub fn ident(name: &str) -> Self {
        TypeDecl::Identifier {
            name: name.into(),
            template_args: None,
        }
    }

    pub fn instance(name: &str, args: Vec<TemplateArg>) -> Self {
        TypeDecl::Identifier {
            name: name.into(),
            template_args: Some(args),
        }
    }

    /// Build a dotted chain `a.b.c`.
    pub fn dotted(path: &str) -> Self {
        let mut segments = path.split('.');
        let first = Self::ident(segments.next().unwrap_or_default());
        segments.fold(first, |inner, name| inner.member(name))
    }

    pub fn member(self, name: &str) -> Self {
        TypeDecl::Member {
            inner: Box::new(self),
            name: name.into(),
            template_args: None,
        }
    }

    pub fn pointer(self) -> Self {
        TypeDecl::Pointer(Box::new(self))
    }

    pub fn array(self) -> Self {
        TypeDecl::Array {
            element: Box::new(self),
            key: ArrayKey::None,
        }
    }

    pub fn fixed_array(self, length: Expr) -> Self {
        TypeDecl::Array {
            element: Box::new(self),
            key: ArrayKey::Expr(Box::new(length)),
        }
    }

    pub fn assoc_array(self, key: TypeDecl) -> Self {
        TypeDecl::Array {
            element: Box::new(self),
            key: ArrayKey::Type(Box::new(key)),
        }
    }

    pub fn modified(self, modifier: TypeModifier) -> Self {
        TypeDecl::Modified {
            modifier,
            inner: Box::new(self),
        }
    }

    /// The identifier named by a plain single-segment declaration.
    pub fn as_plain_identifier(&self) -> Option<&SmolStr> {
        match self {
            TypeDecl::Identifier {
                name,
                template_args: None,
            } => Some(name),
            _ => None,
        }
    }

    /// Whether any identifier in this declaration satisfies `pred`.
    pub fn mentions(&self, pred: &dyn Fn(&str) -> bool) -> bool {
        match self {
            TypeDecl::Basic(_) | TypeDecl::TypeOf(_) => false,
            TypeDecl::Identifier {
                name,
                template_args,
            } => {
                pred(name)
                    || template_args
                        .iter()
                        .flatten()
                        .any(|arg| matches!(arg, TemplateArg::Type(t) if t.mentions(pred)))
            }
            TypeDecl::Member { inner, .. } => inner.mentions(pred),
            TypeDecl::Pointer(inner) | TypeDecl::Modified { inner, .. } => inner.mentions(pred),
            TypeDecl::Array { element, key } => {
                element.mentions(pred) || matches!(key, ArrayKey::Type(k) if k.mentions(pred))
            }
            TypeDecl::Delegate {
                return_type,
                parameters,
                ..
            } => return_type.mentions(pred) || parameters.iter().any(|p| p.mentions(pred)),
        }
    }
}

fn write_args(f: &mut fmt::Formatter<'_>, args: &Option<Vec<TemplateArg>>) -> fmt::Result {
    let Some(args) = args else { return Ok(()) };
    f.write_str("!(")?;
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        match arg {
            TemplateArg::Type(t) => write!(f, "{t}")?,
            TemplateArg::Value(e) => write!(f, "{e}")?,
        }
    }
    f.write_str(")")
}

impl fmt::Display for TypeDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDecl::Basic(t) => write!(f, "{t}"),
            TypeDecl::Identifier {
                name,
                template_args,
            } => {
                f.write_str(name)?;
                write_args(f, template_args)
            }
            TypeDecl::Member {
                inner,
                name,
                template_args,
            } => {
                write!(f, "{inner}.{name}")?;
                write_args(f, template_args)
            }
            TypeDecl::Pointer(inner) => write!(f, "{inner}*"),
            TypeDecl::Array { element, key } => match key {
                ArrayKey::None => write!(f, "{element}[]"),
                ArrayKey::Type(k) => write!(f, "{element}[{k}]"),
                ArrayKey::Expr(e) => write!(f, "{element}[{e}]"),
            },
            TypeDecl::Delegate {
                return_type,
                parameters,
                is_function,
            } => {
                let kw = if *is_function { "function" } else { "delegate" };
                write!(f, "{return_type} {kw}(")?;
                for (i, p) in parameters.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{p}")?;
                }
                f.write_str(")")
            }
            TypeDecl::TypeOf(TypeOfTarget::Return) => f.write_str("typeof(return)"),
            TypeDecl::TypeOf(TypeOfTarget::Expr(e)) => write!(f, "typeof({e})"),
            TypeDecl::Modified { modifier, inner } => write!(f, "{}({inner})", modifier.keyword()),
        }
    }
}
