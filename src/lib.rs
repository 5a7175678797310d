//! # dresolve-base
//!
//! Semantic core for D source analysis: name lookup, type resolution,
//! template argument deduction and type compatibility over an already
//! parsed declaration tree.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! hir       → Lookup, resolution, template deduction, static properties
//!   ↓
//! project   → ParseCache: modules and packages by qualified name
//!   ↓
//! syntax    → Declaration tree, type declarations, expressions, statements
//!   ↓
//! base      → Primitives (Position, Span) and engine constants
//! ```

// ============================================================================
// MODULES (dependency order: base → syntax → project → hir)
// ============================================================================

/// Foundation types: Position, Span, constants
pub mod base;

/// Syntax: declaration tree, TypeDecl, Expr, statements
pub mod syntax;

/// Project management: parse cache, package tree
pub mod project;

/// High-level IR: symbols, lookup, resolution, deduction
pub mod hir;

// Re-export foundation types
pub use base::{Position, Span};
