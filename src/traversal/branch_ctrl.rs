//! Branch Controller (spec.md §4.3): the `if`/`else` arm protocol —
//! condition evaluation, per-arm escape classification, per-arm traversal
//! policy (real descent / probe / fork / inner-return-scope probe), dead-arm
//! `Terminate` selection, and the inconclusive/modified merge.

use super::{PResult, Progress, Traversal};
use crate::analyzer::{Analyzer, AssumeFlags};
use crate::astutils;
use crate::branch::Branch;
use crate::scope::ScopeKind;
use crate::terminate::Terminate;
use crate::token::TokenId;

impl<'a, A: Analyzer> Traversal<'a, A> {
    /// Entry point from the Range Driver for an `if (` token.
    pub(crate) fn handle_if(&mut self, if_tok: TokenId, depth: i32) -> PResult {
        let Some(cond) = self.tokens.cond_tok(if_tok) else {
            return Ok(Progress::Continue);
        };

        let (p, _) = self.traverse_recursive(cond, 0);
        if p == Progress::Break {
            return Ok(Progress::Break);
        }

        let Some(then_scope) = self.tokens.scope_by_header(if_tok, ScopeKind::If) else {
            return Ok(Progress::Continue);
        };
        let Some(then_end) = self.tokens.scope_body_end(then_scope) else {
            return Ok(Progress::Continue);
        };

        let mut else_end = None;
        if let Some(else_kw) = self.tokens.next(then_end) {
            if self.tokens.str_is(else_kw, "else") {
                if let Some(open) = self.tokens.next(else_kw) {
                    if let Some(scope) = self.tokens.scope(open) {
                        else_end = self.tokens.scope_body_end(scope);
                    }
                }
            }
        }

        let (then_check, else_check) = self.eval_cond(cond);
        if !then_check
            && !else_check
            && self.analyzer.stop_on_condition(self.tokens, cond)
            && self.stop_updates()
        {
            return Ok(self.brk(Terminate::Conditional));
        }

        let mut then_branch = Branch::new(Some(then_end));
        then_branch.check = then_check;
        let then_open = self.tokens.next(self.body_open(then_end)).unwrap_or(then_end);
        let (esc, esc_unknown) =
            astutils::classify_escape_scope(self.tokens, self.settings, then_open, then_end);
        then_branch.escape = esc;
        then_branch.escape_unknown = esc_unknown;

        let mut else_branch = else_end.map(|end| {
            let mut b = Branch::new(Some(end));
            b.check = else_check;
            b
        });
        if let (Some(end), Some(b)) = (else_end, else_branch.as_mut()) {
            let open = self.tokens.next(self.body_open(end)).unwrap_or(end);
            let (esc, esc_unknown) =
                astutils::classify_escape_scope(self.tokens, self.settings, open, end);
            b.escape = esc;
            b.escape_unknown = esc_unknown;
        }

        let mut bail = false;
        if self.process_arm(&mut then_branch, else_check, depth, &mut bail)? == Progress::Break {
            return Ok(Progress::Break);
        }
        if let Some(b) = else_branch.as_mut() {
            if self.process_arm(b, then_check, depth, &mut bail)? == Progress::Break {
                return Ok(Progress::Break);
            }
        }

        if then_branch.active {
            self.actions |= then_branch.action;
        }
        if let Some(b) = &else_branch {
            if b.active {
                self.actions |= b.action;
            }
        }
        if bail {
            return Ok(self.bail());
        }

        if let Some(else_branch) = &else_branch {
            if then_branch.is_dead() && else_branch.is_dead() {
                if then_branch.is_modified() && else_branch.is_modified() {
                    return Ok(self.brk(Terminate::Modified));
                }
                if then_branch.is_conclusive_escape() && else_branch.is_conclusive_escape() {
                    return Ok(self.brk(Terminate::Escape));
                }
                return Ok(self.bail());
            }
        } else if then_branch.is_escape() {
            // Step 7: conditional escape with no `else`. A statically-taken
            // `then` that conclusively escapes already broke out of
            // `process_arm`'s real descent above, so only the
            // not-statically-taken cases reach here.
            if then_branch.escape_unknown {
                if !self.analyzer.lower_to_inconclusive() {
                    return Ok(self.bail());
                }
            } else if self.analyzer.is_conditional() && self.stop_updates() {
                return Ok(self.brk(Terminate::Conditional));
            } else {
                self.analyzer
                    .assume(self.tokens, cond, false, AssumeFlags::empty());
            }
            return Ok(Progress::Continue);
        }

        let any_inconclusive = then_branch.is_inconclusive()
            || else_branch.as_ref().is_some_and(Branch::is_inconclusive);
        if any_inconclusive {
            if !self.analyzer.lower_to_inconclusive() {
                return Ok(self.bail());
            }
        } else {
            let any_modified =
                then_branch.is_modified() || else_branch.as_ref().is_some_and(Branch::is_modified);
            if any_modified {
                if else_branch.is_none() && self.analyzer.is_conditional() {
                    self.stop_updates();
                }
                if !self.analyzer.lower_to_possible() {
                    return Ok(self.bail());
                }
                let else_modified = else_branch.as_ref().is_some_and(Branch::is_modified);
                self.analyzer
                    .assume(self.tokens, cond, else_modified, AssumeFlags::empty());
            }
        }

        Ok(Progress::Continue)
    }

    /// `checkBranch` + the real-descent path: step 5 of spec.md §4.3.
    fn process_arm(
        &mut self,
        branch: &mut Branch,
        other_taken: bool,
        depth: i32,
        bail: &mut bool,
    ) -> PResult {
        let Some(end_block) = branch.end_block else {
            return Ok(Progress::Continue);
        };

        if branch.check {
            branch.active = true;
            let before = self.actions;
            let p = self.update_scope(end_block, depth - 1)?;
            branch.action = self.actions & !before;
            return Ok(p);
        }

        if other_taken {
            return Ok(Progress::Continue);
        }

        let body_start = self.tokens.next(self.body_open(end_block)).unwrap_or(end_block);
        let probed = self.analyze_range(body_start, end_block, depth - 1);
        branch.action = probed;

        if self
            .analyzer
            .update_scope(self.tokens, end_block, probed.is_modified())
        {
            let mut fork = self.fork(false);
            let _ = fork.update_scope(end_block, depth - 1);
            branch.action |= fork.actions;
            branch.active = true;
        } else if !branch.is_conclusive_escape()
            && astutils::has_inner_return_scope(self.tokens, body_start, end_block)
        {
            let mut probe = self.fork(true);
            probe.analyze_terminate = true;
            let _ = probe.update_scope(end_block, depth - 1);
            if !probe.terminate.is_none() {
                branch.escape = true;
                branch.escape_unknown = false;
            }
        }

        if astutils::has_goto(self.tokens, body_start, end_block) {
            *bail = true;
        }

        Ok(Progress::Continue)
    }
}
