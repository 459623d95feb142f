//! The `Analyzer` capability interface (spec.md §3/§9): the engine drives
//! this trait and remains oblivious to what it actually tracks. Callers
//! (ValueFlow, Lifetime, ...) are out of scope — this crate only specifies
//! and consumes the interface, the same way `kirin_interpreter::Interpreter`
//! only specifies the capability set a `Dialect` implementation is driven
//! through.

use smallvec::SmallVec;

use crate::action::Action;
use crate::token::TokenId;
use crate::token::TokenList;

/// Direction an analysis token update is being driven in. FDTE only ever
/// passes `Forward` — the variant exists because `Analyzer` is the same
/// trait a sibling backward engine (out of scope) would drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
}

bitflags::bitflags! {
    /// Flags modifying how `assume` should record a path assumption.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct AssumeFlags: u8 {
        /// Don't surface this assumption as a diagnostic-relevant event.
        const QUIET    = 1 << 0;
        /// The assumption holds unconditionally, not just along this path.
        const ABSOLUTE = 1 << 1;
        /// The assumption concerns container emptiness (range-for).
        const CONTAINER_EMPTY = 1 << 2;
    }
}

/// Small-vector of candidate integer values: `evaluate` returns 0, 1, or a
/// handful of candidates, never a large set.
pub type Candidates = SmallVec<[i64; 4]>;

/// The symbolic-state collaborator the engine drives forward. Must be
/// `Clone` because speculative forks value-copy the `Traversal` they run
/// in — a fork's `Analyzer` state must diverge independently of its parent
/// (spec.md §3 "Lifecycle").
pub trait Analyzer: Clone {
    /// Candidate integer values `tok` can take (empty = unknown).
    fn evaluate(&self, tokens: &TokenList, tok: TokenId, ctx: Option<TokenId>) -> Candidates;

    /// Specialized query for range-for: is the iterated container empty?
    fn evaluate_container_empty(&self, tokens: &TokenList, tok: TokenId) -> Candidates;

    /// Classify what `tok` does to tracked state, without committing it.
    fn analyze(&self, tokens: &TokenList, tok: TokenId, direction: Direction) -> Action;

    /// Commit the effect of `action` at `tok`. Must not be called while the
    /// driving `Traversal` is `analyze_only`.
    fn update(&mut self, tokens: &TokenList, tok: TokenId, action: Action, direction: Direction);

    /// Hook fired at scope entry / traversal start.
    fn update_state(&mut self, tokens: &TokenList, tok: TokenId);

    /// Hook fired when the Range Driver is about to descend into a scope
    /// ending at `end_block`. Returns whether a speculative fork into this
    /// scope is warranted.
    fn update_scope(&mut self, tokens: &TokenList, end_block: TokenId, is_modified: bool) -> bool;

    /// Record a path assumption: `tok` evaluates to `result` along this path.
    fn assume(&mut self, tokens: &TokenList, tok: TokenId, result: bool, flags: AssumeFlags);

    /// Downgrade precision from *Known* to *Possible*. `false` means the
    /// Analyzer refuses to continue at reduced precision.
    fn lower_to_possible(&mut self) -> bool;

    /// Downgrade precision from *Possible* (or *Known*) to *Inconclusive*.
    fn lower_to_inconclusive(&mut self) -> bool;

    /// Is this Analyzer tracking a value under a path condition (as opposed
    /// to unconditionally)?
    fn is_conditional(&self) -> bool;

    /// Should the engine stop forward progress rather than guess both sides
    /// of `cond_tok`?
    fn stop_on_condition(&self, tokens: &TokenList, cond_tok: TokenId) -> bool;

    /// Cooperative bail: the Analyzer may declare itself invalid at any
    /// point; the engine treats this as an immediate bail.
    fn invalid(&self) -> bool;
}
