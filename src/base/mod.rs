//! Foundation types for the resolver.
//!
//! - [`Position`], [`Span`] - line/column locations carried by syntax nodes
//! - [`constants`] - recursion caps and well-known member/module names
//!
//! This module has NO dependencies on other crate modules.

pub mod constants;
mod position;

pub use position::{Position, Span};
