//! Expression syntax.
//!
//! The resolver never interprets expressions itself; it hands them to an
//! [`Evaluator`](crate::hir::Evaluator) for values and types.

use std::fmt;

use smol_str::SmolStr;

use super::types::{BasicType, TemplateArg, TypeDecl};

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int { value: i128, ty: BasicType },
    Float { value: f64, ty: BasicType },
    Bool(bool),
    Char(char),
    Str(SmolStr),
    Null,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Concat,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Concat => "~",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq
                | BinaryOp::Ne
                | BinaryOp::Lt
                | BinaryOp::Le
                | BinaryOp::Gt
                | BinaryOp::Ge
                | BinaryOp::And
                | BinaryOp::Or
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
}

/// The comparison inside `is(T == U)` / `is(T : U)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsOp {
    Equal,
    Convertible,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Literal),
    Identifier(SmolStr),
    TemplateInstance {
        name: SmolStr,
        args: Vec<TemplateArg>,
    },
    Member {
        base: Box<Expr>,
        name: SmolStr,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    Index {
        base: Box<Expr>,
        index: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    ArrayLiteral(Vec<Expr>),
    Is {
        ty: TypeDecl,
        test: Option<(IsOp, TypeDecl)>,
    },
    /// A type in expression position, e.g. the `int` of `int.max`.
    Type(TypeDecl),
    New(TypeDecl),
}

impl Expr {
    pub fn int(value: i128) -> Self {
        Expr::Literal(Literal::Int {
            value,
            ty: BasicType::Int,
        })
    }

    pub fn string(value: &str) -> Self {
        Expr::Literal(Literal::Str(value.into()))
    }

    pub fn ident(name: &str) -> Self {
        Expr::Identifier(name.into())
    }

    pub fn member(self, name: &str) -> Self {
        Expr::Member {
            base: Box::new(self),
            name: name.into(),
        }
    }

    pub fn call(self, args: Vec<Expr>) -> Self {
        Expr::Call {
            callee: Box::new(self),
            args,
        }
    }

    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn not(self) -> Self {
        Expr::Unary {
            op: UnaryOp::Not,
            operand: Box::new(self),
        }
    }

    pub fn is_type(ty: TypeDecl, op: IsOp, other: TypeDecl) -> Self {
        Expr::Is {
            ty,
            test: Some((op, other)),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Expr::Literal(Literal::Null))
    }
}

fn write_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

impl fmt::Display for TemplateArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateArg::Type(t) => write!(f, "{t}"),
            TemplateArg::Value(e) => write!(f, "{e}"),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal(lit) => match lit {
                Literal::Int { value, .. } => write!(f, "{value}"),
                Literal::Float { value, .. } => write!(f, "{value}"),
                Literal::Bool(b) => write!(f, "{b}"),
                Literal::Char(c) => write!(f, "'{c}'"),
                Literal::Str(s) => write!(f, "\"{s}\""),
                Literal::Null => f.write_str("null"),
            },
            Expr::Identifier(name) => f.write_str(name),
            Expr::TemplateInstance { name, args } => {
                write!(f, "{name}!(")?;
                write_list(f, args)?;
                f.write_str(")")
            }
            Expr::Member { base, name } => write!(f, "{base}.{name}"),
            Expr::Call { callee, args } => {
                write!(f, "{callee}(")?;
                write_list(f, args)?;
                f.write_str(")")
            }
            Expr::Index { base, index } => write!(f, "{base}[{index}]"),
            Expr::Binary { op, lhs, rhs } => write!(f, "{lhs} {} {rhs}", op.symbol()),
            Expr::Unary { op, operand } => match op {
                UnaryOp::Not => write!(f, "!{operand}"),
                UnaryOp::Neg => write!(f, "-{operand}"),
            },
            Expr::ArrayLiteral(items) => {
                f.write_str("[")?;
                write_list(f, items)?;
                f.write_str("]")
            }
            Expr::Is { ty, test } => match test {
                None => write!(f, "is({ty})"),
                Some((IsOp::Equal, other)) => write!(f, "is({ty} == {other})"),
                Some((IsOp::Convertible, other)) => write!(f, "is({ty} : {other})"),
            },
            Expr::Type(ty) => write!(f, "{ty}"),
            Expr::New(ty) => write!(f, "new {ty}"),
        }
    }
}
