//! Engine-wide constants.

// ============================================================================
// RECURSION CAPS
// ============================================================================

/// Maximum nesting of base-type resolution for a single declaration node
/// within one query (alias re-resolution, variable and return types).
pub const MAX_BASE_RESOLUTION_DEPTH: u32 = 4;

/// Maximum nesting of general node resolution for a single declaration node
/// within one query. Beyond this a node resolves without any base type.
pub const MAX_NODE_RESOLUTION_DEPTH: u32 = 10;

/// Maximum nesting of constant evaluation in the reference evaluator.
pub const MAX_EVALUATION_DEPTH: u32 = 32;

// ============================================================================
// WELL-KNOWN NAMES
// ============================================================================

/// Catch-all member consulted when an aggregate lacks a requested member.
pub const OP_DISPATCH: &str = "opDispatch";

/// Aggregate members driving `foreach` iteration.
pub const OP_APPLY: &str = "opApply";
pub const OP_APPLY_REVERSE: &str = "opApplyReverse";
pub const RANGE_FRONT: &str = "front";
pub const RANGE_BACK: &str = "back";

/// Module implicitly imported into every other module.
pub const OBJECT_MODULE: &str = "object";

/// Aliases declared in the runtime's `object` module, with built-in fallbacks.
pub const SIZE_T: &str = "size_t";
pub const STRING: &str = "string";
pub const TYPE_INFO_CLASS: &str = "TypeInfo_Class";
