//! Declaration tree arena.
//!
//! Nodes reference their parent by [`NodeId`]. A parent is always
//! allocated before its children, so every upward walk strictly decreases
//! the index and terminates at a root (a module).

use std::fmt;

use smol_str::SmolStr;

use crate::base::Span;

use super::expr::Expr;
use super::stmt::{Statement, StmtId};
use super::types::{TemplateArg, TypeDecl};

// ============================================================================
// IDS
// ============================================================================

/// Index of a declaration node in the [`Ast`] arena.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

// ============================================================================
// ATTRIBUTES
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Visibility {
    #[default]
    Public,
    Private,
    Package,
    Protected,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Attributes {
    pub visibility: Visibility,
    pub is_static: bool,
    /// `const`, `immutable` or a manifest `enum` constant.
    pub is_const: bool,
}

// ============================================================================
// NODE KINDS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassKind {
    Struct,
    Union,
    Class,
    Interface,
    Template,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TemplateParameterKind {
    Type {
        specialization: Option<TypeDecl>,
        default: Option<TypeDecl>,
    },
    Value {
        ty: TypeDecl,
        specialization: Option<Expr>,
        default: Option<Expr>,
    },
    Alias {
        specialization: Option<TypeDecl>,
        default: Option<TemplateArg>,
    },
    /// `T...`
    Tuple,
    /// `this T`, deduced from the receiver of a member call.
    This(Box<TemplateParameterKind>),
}

impl TemplateParameterKind {
    pub fn plain_type() -> Self {
        TemplateParameterKind::Type {
            specialization: None,
            default: None,
        }
    }

    pub fn specialized(specialization: TypeDecl) -> Self {
        TemplateParameterKind::Type {
            specialization: Some(specialization),
            default: None,
        }
    }

    /// Whether the parameter constrains its argument to a concrete pattern.
    pub fn has_specialization(&self) -> bool {
        match self {
            TemplateParameterKind::Type { specialization, .. }
            | TemplateParameterKind::Alias { specialization, .. } => specialization.is_some(),
            TemplateParameterKind::Value { specialization, .. } => specialization.is_some(),
            TemplateParameterKind::Tuple => false,
            TemplateParameterKind::This(inner) => inner.has_specialization(),
        }
    }

    pub fn has_default(&self) -> bool {
        match self {
            TemplateParameterKind::Type { default, .. } => default.is_some(),
            TemplateParameterKind::Value { default, .. } => default.is_some(),
            TemplateParameterKind::Alias { default, .. } => default.is_some(),
            TemplateParameterKind::Tuple => false,
            TemplateParameterKind::This(inner) => inner.has_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Root of a module; `name` is the fully qualified dotted module name.
    Module,
    Aggregate {
        kind: ClassKind,
        is_mixin: bool,
        base_classes: Vec<TypeDecl>,
    },
    Enum {
        base: Option<TypeDecl>,
    },
    EnumValue {
        initializer: Option<Expr>,
    },
    /// Variables, parameters and `alias` declarations.
    Variable {
        ty: Option<TypeDecl>,
        initializer: Option<Expr>,
        is_alias: bool,
    },
    Method {
        return_type: Option<TypeDecl>,
        parameters: Vec<NodeId>,
        body: Option<StmtId>,
    },
    /// `enum Foo(T) = ...;` / `alias Foo(T) = ...;`
    EponymousTemplate {
        ty: Option<TypeDecl>,
        initializer: Option<Expr>,
    },
    TemplateParameter(TemplateParameterKind),
    /// `import a.b;` Selective bindings and module aliases are children.
    Import {
        module: SmolStr,
        is_public: bool,
        is_static: bool,
    },
    /// `import a.b : target;` or `import a.b : name = target;`
    ImportSymbol {
        module: SmolStr,
        target: SmolStr,
    },
    /// `import name = a.b;`
    ModuleAlias {
        module: SmolStr,
    },
    /// `mixin Foo!(args) [name];`
    TemplateMixin {
        target: TypeDecl,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub name: SmolStr,
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub span: Span,
    pub attributes: Attributes,
    pub children: Vec<NodeId>,
    pub template_parameters: Vec<NodeId>,
    pub constraint: Option<Expr>,
}

impl Node {
    /// Whether this node opens a lexical scope of its own.
    pub fn is_block(&self) -> bool {
        matches!(
            self.kind,
            NodeKind::Module
                | NodeKind::Aggregate { .. }
                | NodeKind::Enum { .. }
                | NodeKind::Method { .. }
                | NodeKind::EponymousTemplate { .. }
        )
    }

    pub fn is_alias(&self) -> bool {
        matches!(self.kind, NodeKind::Variable { is_alias: true, .. })
    }

    pub fn is_method(&self) -> bool {
        matches!(self.kind, NodeKind::Method { .. })
    }

    pub fn method_parameters(&self) -> &[NodeId] {
        match &self.kind {
            NodeKind::Method { parameters, .. } => parameters,
            _ => &[],
        }
    }

    pub fn template_parameter_kind(&self) -> Option<&TemplateParameterKind> {
        match &self.kind {
            NodeKind::TemplateParameter(kind) => Some(kind),
            _ => None,
        }
    }

    /// Declared type of a variable or parameter.
    pub fn declared_type(&self) -> Option<&TypeDecl> {
        match &self.kind {
            NodeKind::Variable { ty, .. } | NodeKind::EponymousTemplate { ty, .. } => ty.as_ref(),
            _ => None,
        }
    }

    pub fn initializer(&self) -> Option<&Expr> {
        match &self.kind {
            NodeKind::Variable { initializer, .. }
            | NodeKind::EponymousTemplate { initializer, .. }
            | NodeKind::EnumValue { initializer } => initializer.as_ref(),
            _ => None,
        }
    }
}

// ============================================================================
// ARENA
// ============================================================================

/// Immutable syntax supplied by the parser: declarations and statements.
#[derive(Debug, Clone, Default)]
pub struct Ast {
    pub(crate) nodes: Vec<Node>,
    pub(crate) statements: Vec<Statement>,
}

impl Ast {
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn statement(&self, id: StmtId) -> &Statement {
        &self.statements[id.index()]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).map(NodeId::new)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    /// `id` followed by each of its ancestors up to the root.
    pub fn self_and_ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(Some(id), move |&n| self.parent(n))
    }

    pub fn is_ancestor_or_self(&self, ancestor: NodeId, node: NodeId) -> bool {
        self.self_and_ancestors(node).any(|n| n == ancestor)
    }

    /// The module root containing `id`.
    pub fn module_of(&self, id: NodeId) -> NodeId {
        self.self_and_ancestors(id).last().unwrap_or(id)
    }

    /// The innermost block node enclosing `id` (itself if it is a block).
    pub fn enclosing_block(&self, id: NodeId) -> NodeId {
        self.self_and_ancestors(id)
            .find(|&n| self.node(n).is_block())
            .unwrap_or(id)
    }

    /// Breadth-first walk over every statement below `root`, inclusive.
    pub fn statements_in(&self, root: StmtId) -> Vec<StmtId> {
        let mut queue = std::collections::VecDeque::from([root]);
        let mut out = Vec::new();
        while let Some(id) = queue.pop_front() {
            out.push(id);
            queue.extend(self.statement(id).sub_statements());
        }
        out
    }

    pub(crate) fn alloc_node(&mut self, node: Node) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        debug_assert!(node.parent.is_none_or(|p| p.index() < id.index()));
        self.nodes.push(node);
        id
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    pub(crate) fn alloc_statement(&mut self, statement: Statement) -> StmtId {
        let id = StmtId::new(self.statements.len());
        self.statements.push(statement);
        id
    }

    pub(crate) fn statement_mut(&mut self, id: StmtId) -> &mut Statement {
        &mut self.statements[id.index()]
    }
}
