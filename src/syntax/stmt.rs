//! Statement syntax inside method bodies.

use std::fmt;

use crate::base::Span;

use super::ast::NodeId;
use super::expr::Expr;

/// Index of a statement in the [`Ast`](super::Ast) arena.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StmtId(u32);

impl StmtId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for StmtId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StmtId({})", self.0)
    }
}

/// What a `foreach` iterates over.
#[derive(Debug, Clone, PartialEq)]
pub enum ForeachAggregate {
    Expr(Expr),
    /// `foreach (i; lower .. upper)`
    Range(Expr, Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    Block(Vec<StmtId>),
    /// Local declarations; the declared nodes are owned by the method.
    Declaration(Vec<NodeId>),
    Expression(Expr),
    Return(Option<Expr>),
    If {
        condition: Expr,
        then_branch: StmtId,
        else_branch: Option<StmtId>,
    },
    While {
        condition: Expr,
        body: StmtId,
    },
    Foreach {
        variables: Vec<NodeId>,
        aggregate: ForeachAggregate,
        body: Option<StmtId>,
        is_reverse: bool,
    },
    /// `mixin Foo!(args);` inside a function body.
    Mixin(NodeId),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub kind: StmtKind,
    pub parent: Option<StmtId>,
    /// The method whose body contains this statement.
    pub owner: NodeId,
    pub span: Span,
}

impl Statement {
    /// Directly nested statements, in source order.
    pub fn sub_statements(&self) -> Vec<StmtId> {
        match &self.kind {
            StmtKind::Block(children) => children.clone(),
            StmtKind::If {
                then_branch,
                else_branch,
                ..
            } => std::iter::once(*then_branch).chain(*else_branch).collect(),
            StmtKind::While { body, .. } => vec![*body],
            StmtKind::Foreach { body, .. } => body.iter().copied().collect(),
            StmtKind::Declaration(_)
            | StmtKind::Expression(_)
            | StmtKind::Return(_)
            | StmtKind::Mixin(_) => Vec::new(),
        }
    }
}
