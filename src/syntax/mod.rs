//! Syntax: the read-only declaration tree the resolver works on.
//!
//! Parsing is not part of this crate. Trees arrive already built, either
//! from a parser front end or from [`AstBuilder`].

mod ast;
mod builder;
mod expr;
mod stmt;
mod types;

pub use ast::{
    Ast, Attributes, ClassKind, Node, NodeId, NodeKind, TemplateParameterKind, Visibility,
};
pub use builder::AstBuilder;
pub use expr::{BinaryOp, Expr, IsOp, Literal, UnaryOp};
pub use stmt::{ForeachAggregate, Statement, StmtId, StmtKind};
pub use types::{ArrayKey, BasicType, TemplateArg, TypeDecl, TypeModifier, TypeOfTarget};

// Re-export Position and Span from base for convenience
pub use crate::base::{Position, Span};
