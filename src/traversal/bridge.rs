//! Analyzer Bridge (spec.md §4.5): the only place the engine calls into
//! `Analyzer::update`/`update_state`/`update_scope`, and the only place
//! `actions`/`terminate` get written from a freshly observed `Action`.

use super::{Progress, Traversal};
use crate::action::Action;
use crate::analyzer::{Analyzer, Direction};
use crate::terminate::Terminate;
use crate::token::TokenId;

impl<'a, A: Analyzer> Traversal<'a, A> {
    /// `update(tok, action)` (spec.md §4.5).
    pub(crate) fn update_action(&mut self, tok: TokenId, action: Action) -> Progress {
        self.actions |= action;
        if !action.is_none() && !self.analyze_only {
            self.analyzer
                .update(self.tokens, tok, action, Direction::Forward);
        }
        if action.is_inconclusive() && !self.analyzer.lower_to_inconclusive() {
            return self.brk(Terminate::Inconclusive);
        }
        if action.is_invalid() {
            return self.brk(Terminate::Modified);
        }
        if action.is_write() && !action.is_read() {
            return self.brk(Terminate::Modified);
        }
        Progress::Continue
    }

    /// `update(tok)`: classify `tok` then commit it (spec.md §4.5, the
    /// one-argument overload used throughout the Range/Expression walkers).
    pub(crate) fn update(&mut self, tok: TokenId) -> Progress {
        let action = self.analyzer.analyze(self.tokens, tok, Direction::Forward);
        self.update_action(tok, action)
    }

    /// Flip to analyze-only and report whether `actions` already reflects a
    /// modification — callers use the result to decide whether to signal
    /// `Conditional` (spec.md §4.5).
    pub(crate) fn stop_updates(&mut self) -> bool {
        self.analyze_only = true;
        self.actions.is_modified()
    }

    /// Run an analyze-only fork over `[start, end)`, returning its resulting
    /// `Action` without mutating `self`. Used by the Loop Controller's
    /// `analyzeScope`/`analyzeRecursive` pre-computation step (spec.md §4.4)
    /// and the Branch Controller's `checkBranch` probe (spec.md §4.3).
    pub(crate) fn analyze_range(&self, start: TokenId, end: TokenId, depth: i32) -> Action {
        let mut probe = self.fork(true);
        let _ = probe.update_range(start, end, depth);
        probe.actions
    }

    /// Like [`Self::analyze_range`] but for a single expression (AST
    /// recursion only, no structural dispatch).
    pub(crate) fn analyze_expression(&self, expr: TokenId) -> Action {
        let mut probe = self.fork(true);
        let _ = probe.traverse_recursive(expr, 0);
        probe.actions
    }

    /// `updateScope(endBlock)`: a real (mutating) descent into a scope body
    /// `(link(endBlock), endBlock)`, decrementing `depth`.
    pub(crate) fn update_scope(&mut self, end_block: TokenId, depth: i32) -> super::PResult {
        let open = self.tokens.link(end_block).unwrap_or(end_block);
        let body_start = self.tokens.next(open).unwrap_or(end_block);
        self.update_range(body_start, end_block, depth)
    }

    pub(crate) fn update_state(&mut self, tok: TokenId) {
        self.analyzer.update_state(self.tokens, tok);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::{AssumeFlags, Candidates};
    use crate::logger::{Diagnostic, ErrorLogger};
    use crate::settings::{NoEscapes, Settings};
    use crate::token::{TokenList, TokenListBuilder};

    #[derive(Debug, Clone)]
    struct NullAnalyzer;

    impl Analyzer for NullAnalyzer {
        fn evaluate(&self, _tokens: &TokenList, _tok: TokenId, _ctx: Option<TokenId>) -> Candidates {
            Candidates::new()
        }
        fn evaluate_container_empty(&self, _tokens: &TokenList, _tok: TokenId) -> Candidates {
            Candidates::new()
        }
        fn analyze(&self, _tokens: &TokenList, _tok: TokenId, _direction: Direction) -> Action {
            Action::empty()
        }
        fn update(&mut self, _tokens: &TokenList, _tok: TokenId, _action: Action, _direction: Direction) {}
        fn update_state(&mut self, _tokens: &TokenList, _tok: TokenId) {}
        fn update_scope(&mut self, _tokens: &TokenList, _end_block: TokenId, _is_modified: bool) -> bool {
            false
        }
        fn assume(&mut self, _tokens: &TokenList, _tok: TokenId, _result: bool, _flags: AssumeFlags) {}
        fn lower_to_possible(&mut self) -> bool {
            true
        }
        fn lower_to_inconclusive(&mut self) -> bool {
            true
        }
        fn is_conditional(&self) -> bool {
            false
        }
        fn stop_on_condition(&self, _tokens: &TokenList, _cond_tok: TokenId) -> bool {
            false
        }
        fn invalid(&self) -> bool {
            false
        }
    }

    struct NoopLogger;
    impl ErrorLogger for NoopLogger {
        fn report(&self, _diagnostic: &Diagnostic) {}
    }

    #[test]
    fn stop_updates_is_idempotent() {
        let tokens = TokenListBuilder::new().build();
        let lib = NoEscapes;
        let settings = Settings::new(&lib, 0);
        let logger = NoopLogger;
        let mut traversal = Traversal::new(NullAnalyzer, &tokens, &logger, &settings);

        let first = traversal.stop_updates();
        let first_analyze_only = traversal.analyze_only;
        let second = traversal.stop_updates();
        let second_analyze_only = traversal.analyze_only;

        assert_eq!(first, second);
        assert_eq!(first_analyze_only, second_analyze_only);
        assert!(traversal.analyze_only);
    }
}
