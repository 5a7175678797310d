//! ScopeContext: the per-query resolution state.
//!
//! A [`ResolutionContext`] lives for exactly one query (a hover, a
//! completion request, ...). It owns:
//!
//! - the stack of [`ContextFrame`]s (lexical scope, statement, option
//!   overrides, deduced template bindings),
//! - the [`RecursionGuard`] threaded through every recursive resolution step,
//! - a memo of identifier results,
//! - the error log,
//! - the cancellation token polled at frame pushes and overload loops.
//!
//! Nothing here is shared between queries.

use rustc_hash::{FxHashMap, FxHashSet};
use smol_str::SmolStr;
use tokio_util::sync::CancellationToken;

use crate::base::Position;
use crate::project::ParseCache;
use crate::syntax::{Ast, NodeId, StmtId};

use super::diagnostics::ResolutionError;
use super::eval::{ConstEvaluator, Evaluator};
use super::options::{OptionOverrides, ResolutionOptions};
use super::symbols::{DeducedTypeDictionary, Symbol, TemplateParameterSymbol};

static CONST_EVALUATOR: ConstEvaluator = ConstEvaluator;

// ============================================================================
// FRAMES
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ContextFrame {
    /// Innermost declaration enclosing the query position.
    pub scope: NodeId,
    /// Statement the query sits at; locals declared later are invisible.
    pub statement: Option<StmtId>,
    pub overrides: OptionOverrides,
    pub deduced: DeducedTypeDictionary,
}

impl ContextFrame {
    pub fn new(scope: NodeId) -> Self {
        Self {
            scope,
            statement: None,
            overrides: OptionOverrides::default(),
            deduced: DeducedTypeDictionary::default(),
        }
    }

    pub fn at_statement(mut self, statement: Option<StmtId>) -> Self {
        self.statement = statement;
        self
    }

    pub fn with_overrides(mut self, overrides: OptionOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn with_deduced(mut self, deduced: DeducedTypeDictionary) -> Self {
        self.deduced = deduced;
        self
    }
}

// ============================================================================
// RECURSION GUARD
// ============================================================================

/// Per-query recursion bookkeeping, keyed by declaration node.
#[derive(Debug, Default)]
pub struct RecursionGuard {
    resolving: FxHashSet<NodeId>,
    depth: FxHashMap<NodeId, u32>,
}

impl RecursionGuard {
    /// Mark `node` as being resolved. `false` if it already is.
    pub fn begin_resolving(&mut self, node: NodeId) -> bool {
        self.resolving.insert(node)
    }

    pub fn end_resolving(&mut self, node: NodeId) {
        self.resolving.remove(&node);
    }

    pub fn is_resolving(&self, node: NodeId) -> bool {
        self.resolving.contains(&node)
    }

    /// Count one more nested visit of `node`; returns the new depth.
    pub fn enter(&mut self, node: NodeId) -> u32 {
        let depth = self.depth.entry(node).or_insert(0);
        *depth += 1;
        *depth
    }

    pub fn leave(&mut self, node: NodeId) {
        if let Some(depth) = self.depth.get_mut(&node) {
            *depth -= 1;
            if *depth == 0 {
                self.depth.remove(&node);
            }
        }
    }

    pub fn depth(&self, node: NodeId) -> u32 {
        self.depth.get(&node).copied().unwrap_or(0)
    }

    /// No resolution is in flight.
    pub fn is_idle(&self) -> bool {
        self.resolving.is_empty() && self.depth.is_empty()
    }
}

// ============================================================================
// CONTEXT
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum MemoAnchor {
    Statement(StmtId),
    Block(NodeId),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct MemoKey {
    anchor: MemoAnchor,
    options: ResolutionOptions,
    query: SmolStr,
}

pub struct ResolutionContext<'a> {
    cache: &'a ParseCache,
    evaluator: &'a dyn Evaluator,
    frames: Vec<ContextFrame>,
    default_options: ResolutionOptions,
    errors: Vec<ResolutionError>,
    memo: FxHashMap<MemoKey, Vec<Symbol>>,
    guard: RecursionGuard,
    cancel: CancellationToken,
}

impl<'a> ResolutionContext<'a> {
    /// A context positioned at `scope`, optionally at `statement` inside it.
    pub fn new(cache: &'a ParseCache, scope: NodeId, statement: Option<StmtId>) -> Self {
        Self {
            cache,
            evaluator: &CONST_EVALUATOR,
            frames: vec![ContextFrame::new(scope).at_statement(statement)],
            default_options: ResolutionOptions::NONE,
            errors: Vec::new(),
            memo: FxHashMap::default(),
            guard: RecursionGuard::default(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_evaluator(mut self, evaluator: &'a dyn Evaluator) -> Self {
        self.evaluator = evaluator;
        self
    }

    pub fn with_options(mut self, options: ResolutionOptions) -> Self {
        self.default_options = options;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn cache(&self) -> &'a ParseCache {
        self.cache
    }

    pub fn ast(&self) -> &'a Ast {
        self.cache.ast()
    }

    pub fn evaluator(&self) -> &'a dyn Evaluator {
        self.evaluator
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn guard(&self) -> &RecursionGuard {
        &self.guard
    }

    pub fn guard_mut(&mut self) -> &mut RecursionGuard {
        &mut self.guard
    }

    // ========================================================================
    // STACK
    // ========================================================================

    pub fn push(&mut self, scope: NodeId, statement: Option<StmtId>) {
        self.push_frame(ContextFrame::new(scope).at_statement(statement));
    }

    pub fn push_frame(&mut self, frame: ContextFrame) {
        tracing::trace!("[CONTEXT] push {:?} (depth {})", frame.scope, self.frames.len() + 1);
        self.frames.push(frame);
    }

    /// Pop the top frame. The frame the context was created with stays.
    pub fn pop(&mut self) -> Option<ContextFrame> {
        if self.frames.len() > 1 {
            self.frames.pop()
        } else {
            None
        }
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn current_frame(&self) -> &ContextFrame {
        // The root frame is never popped.
        &self.frames[self.frames.len() - 1]
    }

    pub fn current_scope(&self) -> NodeId {
        self.current_frame().scope
    }

    pub fn current_statement(&self) -> Option<StmtId> {
        self.current_frame().statement
    }

    /// Position of the current statement, if any.
    pub fn caret(&self) -> Option<Position> {
        self.current_statement()
            .map(|s| self.ast().statement(s).span.start)
    }

    /// Peek at the frame `depth` entries below the top (0 is the top).
    pub fn frame_at_depth(&self, depth: usize) -> Option<&ContextFrame> {
        self.frames.iter().rev().nth(depth)
    }

    /// Run `f` with `frame` pushed; `None` without running when cancelled.
    pub fn with_frame<R>(&mut self, frame: ContextFrame, f: impl FnOnce(&mut Self) -> R) -> Option<R> {
        if self.is_cancelled() {
            tracing::debug!("[CONTEXT] cancelled before entering {:?}", frame.scope);
            return None;
        }
        let depth = self.frames.len();
        self.push_frame(frame);
        let result = f(self);
        self.frames.truncate(depth);
        Some(result)
    }

    pub fn with_scope<R>(
        &mut self,
        scope: NodeId,
        statement: Option<StmtId>,
        f: impl FnOnce(&mut Self) -> R,
    ) -> Option<R> {
        self.with_frame(ContextFrame::new(scope).at_statement(statement), f)
    }

    /// Run `f` in the current scope with `overrides` layered on top.
    pub fn with_overrides<R>(&mut self, overrides: OptionOverrides, f: impl FnOnce(&mut Self) -> R) -> Option<R> {
        let top = self.current_frame();
        let frame = ContextFrame::new(top.scope)
            .at_statement(top.statement)
            .with_overrides(top.overrides.then(overrides));
        self.with_frame(frame, f)
    }

    // ========================================================================
    // OPTIONS
    // ========================================================================

    pub fn default_options(&self) -> ResolutionOptions {
        self.default_options
    }

    pub fn set_default_options(&mut self, options: ResolutionOptions) {
        self.default_options = options;
    }

    /// Effective options: the context default merged with the top frame.
    pub fn options(&self) -> ResolutionOptions {
        self.current_frame().overrides.apply(self.default_options)
    }

    // ========================================================================
    // DEDUCED PARAMETERS
    // ========================================================================

    /// Bindings of the top frame and of every frame below it whose scope
    /// lexically encloses the frame above.
    pub fn deduced_parameters_in_hierarchy(&self) -> Vec<TemplateParameterSymbol> {
        let ast = self.ast();
        let mut out: Vec<TemplateParameterSymbol> = Vec::new();
        let mut inner: Option<&ContextFrame> = None;
        for frame in self.frames.iter().rev() {
            if let Some(inner) = inner {
                if !ast.is_ancestor_or_self(frame.scope, inner.scope) {
                    break;
                }
            }
            for symbol in frame.deduced.bound() {
                if !out.iter().any(|s| s.parameter == symbol.parameter) {
                    out.push(symbol.clone());
                }
            }
            inner = Some(frame);
        }
        out
    }

    /// The innermost binding of `parameter` anywhere on the stack.
    pub fn deduced_parameter(&self, parameter: NodeId) -> Option<&TemplateParameterSymbol> {
        self.frames
            .iter()
            .rev()
            .find_map(|f| f.deduced.get(parameter).filter(|s| s.is_bound()))
    }

    /// Whether `node` encloses (or is) the current scope.
    pub fn is_in_scope_hierarchy(&self, node: NodeId) -> bool {
        self.ast().is_ancestor_or_self(node, self.current_scope())
    }

    // ========================================================================
    // MEMO
    // ========================================================================

    fn memo_key(&self, query: &str) -> Option<MemoKey> {
        if !self.guard.is_idle() || self.frames.iter().any(|f| !f.deduced.is_empty()) {
            return None;
        }
        let anchor = match self.current_statement() {
            Some(stmt) => MemoAnchor::Statement(stmt),
            None => MemoAnchor::Block(self.current_scope()),
        };
        Some(MemoKey {
            anchor,
            options: self.options(),
            query: SmolStr::new(query),
        })
    }

    pub fn cached(&self, query: &str) -> Option<Vec<Symbol>> {
        let key = self.memo_key(query)?;
        self.memo.get(&key).cloned()
    }

    pub fn remember(&mut self, query: &str, results: &[Symbol]) {
        if let Some(key) = self.memo_key(query) {
            self.memo.insert(key, results.to_vec());
        }
    }

    // ========================================================================
    // ERRORS
    // ========================================================================

    pub fn log_error(&mut self, error: ResolutionError) {
        tracing::debug!("[CONTEXT] {error}");
        self.errors.push(error);
    }

    pub fn errors(&self) -> &[ResolutionError] {
        &self.errors
    }

    pub fn take_errors(&mut self) -> Vec<ResolutionError> {
        std::mem::take(&mut self.errors)
    }

    /// `true` for exactly one result; otherwise logs NothingFound or Ambiguity.
    pub fn check_for_single_result(&mut self, results: &[Symbol], subject: &str, origin: Option<NodeId>) -> bool {
        match results.len() {
            1 => true,
            0 => {
                self.log_error(ResolutionError::nothing_found(subject, origin));
                false
            }
            _ => {
                self.log_error(ResolutionError::ambiguity(subject, origin, results.to_vec()));
                false
            }
        }
    }
}
