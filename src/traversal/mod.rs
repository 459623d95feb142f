//! The `Traversal` state machine (spec.md §2/§3): one `Traversal` per public
//! entry, forked (value-copied) for every speculative sub-analysis. Split
//! across sub-modules the way spec.md §2 splits the engine into four
//! cooperating sub-parts.

pub(crate) mod branch_ctrl;
pub(crate) mod bridge;
pub(crate) mod expr_walker;
pub(crate) mod loop_ctrl;
pub(crate) mod range_driver;

use crate::action::Action;
use crate::analyzer::Analyzer;
use crate::error::EngineError;
use crate::logger::ErrorLogger;
use crate::settings::Settings;
use crate::terminate::Terminate;
use crate::token::{TokenId, TokenList};

/// Internal three-valued control token (spec.md §3). Never observed by
/// callers — entry points collapse it into `(Action, Terminate)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Progress {
    Continue,
    Break,
    Skip,
}

pub(crate) type PResult = Result<Progress, EngineError>;

pub struct Traversal<'a, A: Analyzer> {
    pub(crate) analyzer: A,
    pub(crate) tokens: &'a TokenList,
    pub(crate) logger: &'a dyn ErrorLogger,
    pub(crate) settings: &'a Settings<'a>,
    pub(crate) actions: Action,
    pub(crate) analyze_only: bool,
    pub(crate) analyze_terminate: bool,
    pub(crate) terminate: Terminate,
    pub(crate) loop_ends: Vec<TokenId>,
    pub(crate) branch_count: u32,
}

impl<'a, A: Analyzer> Traversal<'a, A> {
    pub(crate) fn new(
        analyzer: A,
        tokens: &'a TokenList,
        logger: &'a dyn ErrorLogger,
        settings: &'a Settings<'a>,
    ) -> Self {
        Self {
            analyzer,
            tokens,
            logger,
            settings,
            actions: Action::empty(),
            analyze_only: false,
            analyze_terminate: false,
            terminate: Terminate::None,
            loop_ends: Vec::new(),
            branch_count: 0,
        }
    }

    /// "`terminate` ... only writable via `Break(t)` and only when `t != None
    /// && (!analyzeOnly || analyzeTerminate)`" (spec.md §3).
    pub(crate) fn brk(&mut self, t: Terminate) -> Progress {
        if !t.is_none() && (!self.analyze_only || self.analyze_terminate) {
            self.terminate = t;
        }
        Progress::Break
    }

    pub(crate) fn bail(&mut self) -> Progress {
        self.brk(Terminate::Bail)
    }

    /// Value-copy this `Traversal` for a speculative sub-analysis: fresh
    /// `actions`/`terminate`, an independent `loop_ends` stack carried over
    /// (the fork is still nested inside any enclosing loop), and a cloned
    /// `Analyzer` that diverges independently of the parent (spec.md §3
    /// "Lifecycle" — forks never share mutable state with their parent).
    pub(crate) fn fork(&self, analyze_only: bool) -> Self {
        Self {
            analyzer: self.analyzer.clone(),
            tokens: self.tokens,
            logger: self.logger,
            settings: self.settings,
            actions: Action::empty(),
            analyze_only,
            analyze_terminate: self.analyze_terminate,
            terminate: Terminate::None,
            loop_ends: self.loop_ends.clone(),
            branch_count: self.branch_count,
        }
    }

    /// Runs `body` with `end_block` pushed onto `loop_ends`, popping it
    /// exactly once when `body` returns — including when `body` short
    /// circuits internally via `?`. This is the Rust rendition of the
    /// source's `OnExit` scope guard (spec.md §5): a persistent `Drop`-based
    /// guard can't coexist with the `&mut self` calls `body` needs to make on
    /// every other field, so the guarantee is given by structuring the call
    /// instead of by a field-borrowing destructor.
    pub(crate) fn with_loop_end<T>(
        &mut self,
        end_block: TokenId,
        body: impl FnOnce(&mut Self) -> T,
    ) -> T {
        self.loop_ends.push(end_block);
        let result = body(self);
        self.loop_ends.pop();
        result
    }

    pub fn actions(&self) -> Action {
        self.actions
    }

    pub fn terminate(&self) -> Terminate {
        self.terminate
    }

    pub fn analyzer(&self) -> &A {
        &self.analyzer
    }

    pub fn into_analyzer(self) -> A {
        self.analyzer
    }

    /// The opening `{` of a scope given its closing `}` (`link()`'s inverse
    /// direction in practice, since the builder links both braces).
    pub(crate) fn body_open(&self, end_block: TokenId) -> TokenId {
        self.tokens.link(end_block).unwrap_or(end_block)
    }

    pub(crate) fn body_start(&self, end_block: TokenId) -> TokenId {
        self.tokens.next(self.body_open(end_block)).unwrap_or(end_block)
    }
}
