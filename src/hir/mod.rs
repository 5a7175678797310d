//! High-level IR (HIR): symbol resolution over the declaration tree.
//!
//! Every query runs against a [`ResolutionContext`]: a stack of scopes over
//! a read-only [`ParseCache`](crate::project::ParseCache), the resolution
//! options in force, deduced template bindings and the errors logged so far.
//!
//! ## Key Types
//!
//! - [`Symbol`] - a resolved type, member, module or template parameter
//! - [`ResolutionContext`] - the scope stack a query runs in
//! - [`Declaration`] - a lookup hit, before conversion to a symbol
//! - [`Evaluator`] - the compile-time evaluation hook ([`ConstEvaluator`])
//! - [`ResolutionError`] - what a failed query logged
//!
//! ## Layers
//!
//! ```text
//! resolve_type(decl) / resolve_identifier(name)
//!     │
//!     ▼
//! lookup(name)              ← visible declarations, innermost layer first
//!     │
//!     ▼
//! handle_node_match(node)   ← declaration → symbol, bases attached
//!     │
//!     ▼
//! deduce_and_filter         ← template arguments, constraints, specialization
//!     │
//!     ▼
//! members / static_props    ← `a.b`, built-in properties, UFCS
//! ```

mod compare;
mod context;
mod diagnostics;
mod eval;
mod lookup;
mod members;
mod options;
mod resolve;
mod static_props;
mod symbols;
mod templates;
mod values;

pub use compare::{
    IMPLICIT_WIDENING, arguments_equal, is_equal, is_implicitly_convertible, is_implicitly_convertible_deducing,
    is_primitive_implicitly_convertible,
};
pub use context::{ContextFrame, RecursionGuard, ResolutionContext};
pub use diagnostics::ResolutionError;
pub use eval::{ConstEvaluator, EvalError, Evaluator, resolve_call};
pub use lookup::{Declaration, MemberFilter, enumerate, lookup, search_members};
pub use members::{member_access, resolve_further};
pub use options::{OptionOverrides, ResolutionOptions};
pub use resolve::{
    handle_declarations, handle_node_match, method_return_type, mixin_instance, resolve_identifier,
    resolve_overloads, resolve_single, resolve_type,
};
pub use static_props::{
    OwnerCategory, PropertyInfo, PropertyOwner, list_properties, owner_category, try_evaluate,
    try_resolve as try_resolve_property,
};
pub use symbols::{
    AggregateKind, AggregateSymbol, DeducedTypeDictionary, Definition, DelegateSymbol, MemberSymbol,
    Symbol, SymbolKind, SymbolTag, SyntheticDecl, SyntheticParameter, TemplateParameterSymbol,
};
pub use templates::{deduce_and_filter, deduce_call, pre_resolve_arguments, select_single};
pub use values::{SymbolValue, TemplateArgument};
