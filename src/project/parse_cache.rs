//! The collection of parsed modules available to a query.

use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use crate::base::constants::OBJECT_MODULE;
use crate::syntax::{Ast, NodeId, NodeKind};

/// A package in the module hierarchy (`std` in `std.stdio`).
#[derive(Debug, Clone, Default)]
pub struct Package {
    pub name: SmolStr,
    /// Fully qualified dotted path; empty for the root package.
    pub path: SmolStr,
    modules: FxHashMap<SmolStr, NodeId>,
    packages: FxHashMap<SmolStr, Package>,
}

impl Package {
    pub fn module(&self, name: &str) -> Option<NodeId> {
        self.modules.get(name).copied()
    }

    pub fn subpackage(&self, name: &str) -> Option<&Package> {
        self.packages.get(name)
    }

    pub fn is_root(&self) -> bool {
        self.path.is_empty()
    }

    fn insert(&mut self, segments: &[&str], module: NodeId) {
        match segments {
            [] => {}
            [leaf] => {
                self.modules.insert(SmolStr::new(leaf), module);
            }
            [head, rest @ ..] => {
                let path = if self.path.is_empty() {
                    SmolStr::new(head)
                } else {
                    SmolStr::from(format!("{}.{head}", self.path))
                };
                self.packages
                    .entry(SmolStr::new(head))
                    .or_insert_with(|| Package {
                        name: SmolStr::new(head),
                        path,
                        ..Package::default()
                    })
                    .insert(rest, module);
            }
        }
    }
}

/// Parsed modules indexed by fully qualified name.
///
/// Owns the syntax arena; read-only while queries run.
#[derive(Debug, Clone, Default)]
pub struct ParseCache {
    ast: Ast,
    modules: IndexMap<SmolStr, NodeId>,
    root: Package,
}

impl ParseCache {
    pub fn new(ast: Ast) -> Self {
        let mut cache = Self {
            ast,
            ..Self::default()
        };
        cache.reindex();
        cache
    }

    /// Rebuild the module and package index from the arena's module roots.
    pub fn reindex(&mut self) {
        self.modules.clear();
        self.root = Package::default();
        for id in self.ast.node_ids() {
            let node = self.ast.node(id);
            if node.parent.is_none() && matches!(node.kind, NodeKind::Module) {
                let segments: Vec<&str> = node.name.split('.').collect();
                self.root.insert(&segments, id);
                self.modules.insert(node.name.clone(), id);
            }
        }
        tracing::debug!("[CACHE] indexed {} modules", self.modules.len());
    }

    pub fn ast(&self) -> &Ast {
        &self.ast
    }

    pub fn module(&self, qualified_name: &str) -> Option<NodeId> {
        self.modules.get(qualified_name).copied()
    }

    pub fn modules(&self) -> impl Iterator<Item = (&SmolStr, NodeId)> {
        self.modules.iter().map(|(name, id)| (name, *id))
    }

    pub fn root_package(&self) -> &Package {
        &self.root
    }

    /// Look up a package by dotted path; `""` is the root package.
    pub fn package(&self, path: &str) -> Option<&Package> {
        if path.is_empty() {
            return Some(&self.root);
        }
        path.split('.')
            .try_fold(&self.root, |pkg, segment| pkg.subpackage(segment))
    }

    /// The implicitly imported runtime module, if loaded.
    pub fn object_module(&self) -> Option<NodeId> {
        self.module(OBJECT_MODULE)
    }

    /// Dotted package path of a module, e.g. `pack` for `pack.B`.
    pub fn package_of(&self, module: NodeId) -> &str {
        let name = self.ast.node(module).name.as_str();
        name.rsplit_once('.').map_or("", |(pkg, _)| pkg)
    }
}
