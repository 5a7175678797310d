//! Programmatic construction of syntax trees.
//!
//! Stands in for the parser: every node and statement gets a fresh line, so
//! creation order is source order.

use smol_str::SmolStr;

use crate::base::Span;

use super::ast::{Ast, Attributes, ClassKind, Node, NodeId, NodeKind, TemplateParameterKind, Visibility};
use super::expr::Expr;
use super::stmt::{ForeachAggregate, Statement, StmtId, StmtKind};
use super::types::TypeDecl;

#[derive(Debug, Default)]
pub struct AstBuilder {
    ast: Ast,
    next_line: usize,
}

impl AstBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn finish(self) -> Ast {
        self.ast
    }

    fn next_span(&mut self) -> Span {
        let line = self.next_line;
        self.next_line += 1;
        Span::lines(line, line)
    }

    fn alloc(&mut self, parent: Option<NodeId>, name: &str, kind: NodeKind) -> NodeId {
        let span = self.next_span();
        let id = self.ast.alloc_node(Node {
            name: SmolStr::new(name),
            kind,
            parent,
            span,
            attributes: Attributes::default(),
            children: Vec::new(),
            template_parameters: Vec::new(),
            constraint: None,
        });
        let mut cursor = parent;
        while let Some(p) = cursor {
            let node = self.ast.node_mut(p);
            node.span.cover(span);
            cursor = node.parent;
        }
        id
    }

    /// Allocate a declaration and register it as a member of `parent`.
    pub fn add(&mut self, parent: NodeId, name: &str, kind: NodeKind) -> NodeId {
        let id = self.alloc(Some(parent), name, kind);
        self.ast.node_mut(parent).children.push(id);
        id
    }

    // ========================================================================
    // DECLARATIONS
    // ========================================================================

    pub fn module(&mut self, name: &str) -> NodeId {
        self.alloc(None, name, NodeKind::Module)
    }

    pub fn aggregate(&mut self, parent: NodeId, kind: ClassKind, name: &str) -> NodeId {
        self.add(
            parent,
            name,
            NodeKind::Aggregate {
                kind,
                is_mixin: false,
                base_classes: Vec::new(),
            },
        )
    }

    pub fn class(&mut self, parent: NodeId, name: &str, bases: Vec<TypeDecl>) -> NodeId {
        self.add(
            parent,
            name,
            NodeKind::Aggregate {
                kind: ClassKind::Class,
                is_mixin: false,
                base_classes: bases,
            },
        )
    }

    pub fn interface(&mut self, parent: NodeId, name: &str, bases: Vec<TypeDecl>) -> NodeId {
        self.add(
            parent,
            name,
            NodeKind::Aggregate {
                kind: ClassKind::Interface,
                is_mixin: false,
                base_classes: bases,
            },
        )
    }

    pub fn mixin_template(&mut self, parent: NodeId, name: &str) -> NodeId {
        self.add(
            parent,
            name,
            NodeKind::Aggregate {
                kind: ClassKind::Template,
                is_mixin: true,
                base_classes: Vec::new(),
            },
        )
    }

    pub fn variable(
        &mut self,
        parent: NodeId,
        name: &str,
        ty: Option<TypeDecl>,
        initializer: Option<Expr>,
    ) -> NodeId {
        self.add(
            parent,
            name,
            NodeKind::Variable {
                ty,
                initializer,
                is_alias: false,
            },
        )
    }

    /// A manifest constant: `enum name = initializer;`
    pub fn constant(&mut self, parent: NodeId, name: &str, initializer: Expr) -> NodeId {
        let id = self.variable(parent, name, None, Some(initializer));
        self.set_const(id);
        id
    }

    pub fn alias(&mut self, parent: NodeId, name: &str, target: TypeDecl) -> NodeId {
        self.add(
            parent,
            name,
            NodeKind::Variable {
                ty: Some(target),
                initializer: None,
                is_alias: true,
            },
        )
    }

    pub fn method(&mut self, parent: NodeId, name: &str, return_type: Option<TypeDecl>) -> NodeId {
        self.add(
            parent,
            name,
            NodeKind::Method {
                return_type,
                parameters: Vec::new(),
                body: None,
            },
        )
    }

    /// Append a function parameter to `method`.
    pub fn parameter(&mut self, method: NodeId, name: &str, ty: TypeDecl) -> NodeId {
        let id = self.alloc(
            Some(method),
            name,
            NodeKind::Variable {
                ty: Some(ty),
                initializer: None,
                is_alias: false,
            },
        );
        if let NodeKind::Method { parameters, .. } = &mut self.ast.node_mut(method).kind {
            parameters.push(id);
        }
        id
    }

    /// Append a template parameter to any declaration.
    pub fn template_parameter(
        &mut self,
        owner: NodeId,
        name: &str,
        kind: TemplateParameterKind,
    ) -> NodeId {
        let id = self.alloc(Some(owner), name, NodeKind::TemplateParameter(kind));
        self.ast.node_mut(owner).template_parameters.push(id);
        id
    }

    pub fn constraint(&mut self, owner: NodeId, constraint: Expr) {
        self.ast.node_mut(owner).constraint = Some(constraint);
    }

    pub fn enumeration(&mut self, parent: NodeId, name: &str, base: Option<TypeDecl>) -> NodeId {
        self.add(parent, name, NodeKind::Enum { base })
    }

    pub fn enum_value(&mut self, enumeration: NodeId, name: &str, initializer: Option<Expr>) -> NodeId {
        self.add(enumeration, name, NodeKind::EnumValue { initializer })
    }

    pub fn eponymous_template(
        &mut self,
        parent: NodeId,
        name: &str,
        ty: Option<TypeDecl>,
        initializer: Option<Expr>,
    ) -> NodeId {
        self.add(parent, name, NodeKind::EponymousTemplate { ty, initializer })
    }

    pub fn import(&mut self, parent: NodeId, module: &str) -> NodeId {
        self.import_with(parent, module, false, false)
    }

    pub fn import_with(&mut self, parent: NodeId, module: &str, is_public: bool, is_static: bool) -> NodeId {
        self.add(
            parent,
            "",
            NodeKind::Import {
                module: module.into(),
                is_public,
                is_static,
            },
        )
    }

    /// Selective binding `name = target` on an import declaration.
    pub fn import_symbol(&mut self, import: NodeId, name: &str, target: &str) -> NodeId {
        let module = match &self.ast.node(import).kind {
            NodeKind::Import { module, .. } => module.clone(),
            _ => SmolStr::default(),
        };
        self.add(
            import,
            name,
            NodeKind::ImportSymbol {
                module,
                target: target.into(),
            },
        )
    }

    pub fn module_alias(&mut self, parent: NodeId, name: &str, module: &str) -> NodeId {
        self.add(parent, name, NodeKind::ModuleAlias { module: module.into() })
    }

    /// `mixin target [name];` Pass an empty name for an anonymous mixin.
    pub fn template_mixin(&mut self, parent: NodeId, name: &str, target: TypeDecl) -> NodeId {
        self.add(parent, name, NodeKind::TemplateMixin { target })
    }

    pub fn set_visibility(&mut self, node: NodeId, visibility: Visibility) {
        self.ast.node_mut(node).attributes.visibility = visibility;
    }

    pub fn set_static(&mut self, node: NodeId) {
        self.ast.node_mut(node).attributes.is_static = true;
    }

    pub fn set_const(&mut self, node: NodeId) {
        self.ast.node_mut(node).attributes.is_const = true;
    }

    // ========================================================================
    // STATEMENTS
    // ========================================================================

    fn alloc_statement(&mut self, parent: Option<StmtId>, owner: NodeId, kind: StmtKind) -> StmtId {
        let span = self.next_span();
        let id = self.ast.alloc_statement(Statement {
            kind,
            parent,
            owner,
            span,
        });
        if let Some(p) = parent {
            if let StmtKind::Block(children) = &mut self.ast.statement_mut(p).kind {
                children.push(id);
            }
        }
        id
    }

    /// Create the body block of `method`.
    pub fn body(&mut self, method: NodeId) -> StmtId {
        let id = self.alloc_statement(None, method, StmtKind::Block(Vec::new()));
        if let NodeKind::Method { body, .. } = &mut self.ast.node_mut(method).kind {
            *body = Some(id);
        }
        id
    }

    pub fn statement(&mut self, block: StmtId, kind: StmtKind) -> StmtId {
        let owner = self.ast.statement(block).owner;
        self.alloc_statement(Some(block), owner, kind)
    }

    pub fn nested_block(&mut self, block: StmtId) -> StmtId {
        self.statement(block, StmtKind::Block(Vec::new()))
    }

    pub fn expression(&mut self, block: StmtId, expr: Expr) -> StmtId {
        self.statement(block, StmtKind::Expression(expr))
    }

    pub fn return_statement(&mut self, block: StmtId, expr: Option<Expr>) -> StmtId {
        self.statement(block, StmtKind::Return(expr))
    }

    /// Declare a block-local variable; returns the statement and the node.
    pub fn declare_local(
        &mut self,
        block: StmtId,
        name: &str,
        ty: Option<TypeDecl>,
        initializer: Option<Expr>,
    ) -> (StmtId, NodeId) {
        let owner = self.ast.statement(block).owner;
        let node = self.alloc(
            Some(owner),
            name,
            NodeKind::Variable {
                ty,
                initializer,
                is_alias: false,
            },
        );
        let stmt = self.statement(block, StmtKind::Declaration(vec![node]));
        self.ast.node_mut(node).span = self.ast.statement(stmt).span;
        (stmt, node)
    }

    /// `mixin target;` inside a body.
    pub fn mixin_statement(&mut self, block: StmtId, target: TypeDecl) -> (StmtId, NodeId) {
        let owner = self.ast.statement(block).owner;
        let node = self.alloc(Some(owner), "", NodeKind::TemplateMixin { target });
        let stmt = self.statement(block, StmtKind::Mixin(node));
        (stmt, node)
    }

    /// `if (condition) { ... }`; returns the then-block.
    pub fn if_then(&mut self, block: StmtId, condition: Expr) -> StmtId {
        let owner = self.ast.statement(block).owner;
        let if_stmt = self.statement(
            block,
            StmtKind::If {
                condition,
                then_branch: StmtId::new(0),
                else_branch: None,
            },
        );
        let then_block = self.alloc_statement(Some(if_stmt), owner, StmtKind::Block(Vec::new()));
        if let StmtKind::If { then_branch, .. } = &mut self.ast.statement_mut(if_stmt).kind {
            *then_branch = then_block;
        }
        then_block
    }

    /// `foreach (vars; aggregate) { ... }`; returns the loop statement, its
    /// body block and the declared iteration variables.
    pub fn foreach(
        &mut self,
        block: StmtId,
        variables: &[(&str, Option<TypeDecl>)],
        aggregate: ForeachAggregate,
        is_reverse: bool,
    ) -> (StmtId, StmtId, Vec<NodeId>) {
        let owner = self.ast.statement(block).owner;
        let nodes: Vec<NodeId> = variables
            .iter()
            .map(|(name, ty)| {
                self.alloc(
                    Some(owner),
                    name,
                    NodeKind::Variable {
                        ty: ty.clone(),
                        initializer: None,
                        is_alias: false,
                    },
                )
            })
            .collect();
        let stmt = self.statement(
            block,
            StmtKind::Foreach {
                variables: nodes.clone(),
                aggregate,
                body: None,
                is_reverse,
            },
        );
        let body_block = self.alloc_statement(Some(stmt), owner, StmtKind::Block(Vec::new()));
        if let StmtKind::Foreach { body, .. } = &mut self.ast.statement_mut(stmt).kind {
            *body = Some(body_block);
        }
        (stmt, body_block, nodes)
    }
}
