//! Loop Controller (spec.md §4.4): `updateLoop`'s twelve-step protocol for
//! pre-test (`while`/`for`) and post-test (`do`) loops.

use super::{PResult, Progress, Traversal};
use crate::action::Action;
use crate::analyzer::{Analyzer, AssumeFlags};
use crate::astutils;
use crate::terminate::Terminate;
use crate::token::TokenId;

impl<'a, A: Analyzer> Traversal<'a, A> {
    /// `updateLoop(endToken, endBlock, condTok, initTok?, stepTok?, exit)`.
    /// `header_tok` is the `while`/`for`/`do` keyword; `end_token` bounds the
    /// range a surviving fork continues into after the loop (spec.md §4.4
    /// step 11).
    pub(crate) fn handle_loop(
        &mut self,
        header_tok: TokenId,
        end_block: TokenId,
        end_token: TokenId,
        exit: bool,
        depth: i32,
    ) -> PResult {
        let Some(cond) = self.tokens.cond_tok(header_tok) else {
            return Ok(Progress::Continue);
        };
        let init = self.tokens.init_tok(header_tok);
        let step = self.tokens.step_tok(header_tok);

        if let Some(init) = init {
            let (p, _) = self.traverse_recursive(init, 0);
            if p == Progress::Break {
                return Ok(Progress::Break);
            }
        }

        let is_do_while = self.tokens.precedes(end_block, Some(cond));
        let eval_ctx = if is_do_while {
            self.tokens.previous(end_block)
        } else {
            None
        };
        let (then_, else_) = self.eval_cond_ctx(cond, eval_ctx);

        // Step 3: exit-as-dead-do-while.
        if exit && else_ {
            let body_start = self.body_start(end_block);
            if astutils::has_jump(self.tokens, body_start, end_block) {
                if !self.analyzer.lower_to_possible() {
                    return Ok(self.bail());
                }
                if self.analyzer.is_conditional() && self.stop_updates() {
                    return Ok(self.brk(Terminate::Conditional));
                }
            }
            return Ok(Progress::Continue);
        }

        let body_start = self.body_start(end_block);
        let body_analysis = self.analyze_range(body_start, end_block, depth - 1);
        let cond_analysis = self.analyze_expression(cond);
        let step_analysis = step.map(|s| self.analyze_expression(s)).unwrap_or(Action::empty());
        let all_analysis = body_analysis | cond_analysis | step_analysis;
        self.actions |= all_analysis;

        // Step 5: degenerate `do { } while (false)`.
        if else_
            && is_do_while
            && (self.tokens.has_known_int_value(cond)
                || (!body_analysis.is_modified()
                    && !cond_analysis.is_modified()
                    && cond_analysis.is_read()))
        {
            let p = self.update_scope(end_block, depth - 1)?;
            if p == Progress::Break {
                return Ok(Progress::Break);
            }
            let (p, _) = self.traverse_recursive(cond, 0);
            return Ok(p);
        }

        // Step 6: precision lowering.
        if all_analysis.is_inconclusive() {
            if !self.analyzer.lower_to_inconclusive() {
                return Ok(self.bail());
            }
        } else if all_analysis.is_modified() || (exit && all_analysis.is_idempotent()) {
            if !self.analyzer.lower_to_possible() {
                return Ok(self.bail());
            }
        }

        // Step 7: condition re-evaluation.
        if !(is_do_while && (body_analysis.is_modified() || body_analysis.is_idempotent())) {
            let (p, _) = self.traverse_recursive(cond, 0);
            if p == Progress::Break {
                return Ok(Progress::Break);
            }
        }

        // Step 8: ambiguous-and-unknown-taken.
        if !then_
            && !else_
            && self.analyzer.stop_on_condition(self.tokens, cond)
            && self.stop_updates()
        {
            return Ok(self.brk(Terminate::Conditional));
        }

        // Step 9: loop never executes.
        if else_ && !is_do_while {
            return Ok(Progress::Continue);
        }

        // Step 10: the then/do-while descent.
        if then_ || is_do_while {
            if exit {
                self.analyzer.assume(
                    self.tokens,
                    cond,
                    true,
                    AssumeFlags::QUIET | AssumeFlags::ABSOLUTE,
                );
            }
            let p = self.with_loop_end(end_block, |t| {
                let mut progress = t.update_range(body_start, end_block, depth - 1)?;
                if progress != Progress::Break {
                    if let Some(step) = step {
                        let (sp, _) = t.traverse_recursive(step, 0);
                        if sp == Progress::Break {
                            progress = Progress::Break;
                        }
                    }
                }
                if progress != Progress::Break {
                    let (cp, _) = t.traverse_recursive(cond, 0);
                    if cp == Progress::Break {
                        progress = Progress::Break;
                    }
                }
                Ok(progress)
            })?;
            if p == Progress::Break {
                return Ok(Progress::Break);
            }
            if all_analysis.is_modified()
                && self.reenters_loop(cond, step, body_start, end_block)
            {
                return Ok(self.bail());
            }
            if all_analysis.is_incremental() {
                return Ok(self.bail());
            }
            return Ok(Progress::Continue);
        }

        // Step 11: modified body, unknown condition — fork-list path.
        if all_analysis.is_modified() {
            let approved = self.analyzer.update_scope(self.tokens, end_block, true);
            if !approved {
                if !self.analyzer.is_conditional() {
                    return Ok(self.bail());
                }
                if self.stop_updates() {
                    return Ok(self.brk(Terminate::Conditional));
                }
                self.analyzer
                    .assume(self.tokens, cond, false, AssumeFlags::empty());
                return Ok(Progress::Continue);
            }

            let mut fork = self.fork(false);
            fork.analyzer
                .assume(fork.tokens, cond, false, AssumeFlags::QUIET);
            let fork_progress = fork.with_loop_end(end_block, |t| {
                let mut progress = t.update_range(body_start, end_block, depth - 1)?;
                if progress != Progress::Break {
                    if let Some(step) = step {
                        let (sp, _) = t.traverse_recursive(step, 0);
                        if sp == Progress::Break {
                            progress = Progress::Break;
                        }
                    }
                }
                if progress != Progress::Break {
                    let (cp, _) = t.traverse_recursive(cond, 0);
                    if cp == Progress::Break {
                        progress = Progress::Break;
                    }
                }
                Ok(progress)
            })?;
            let mut fork_continue = true;
            if fork_progress == Progress::Break || fork.actions.is_modified() {
                fork_continue = false;
            }

            // Open Question (spec.md §9): the source re-checks
            // `all_analysis.is_modified()` here even though it is
            // loop-invariant inside this branch — kept literal rather than
            // collapsed into `!fork_continue`, per the instruction not to
            // guess at a simplification.
            if all_analysis.is_modified() || !fork_continue {
                if !self.analyzer.is_conditional() {
                    return Ok(self.bail());
                }
                if self.stop_updates() {
                    return Ok(self.brk(Terminate::Conditional));
                }
            }
            self.analyzer
                .assume(self.tokens, cond, false, AssumeFlags::empty());

            if fork_continue && !fork.actions.is_incremental() {
                self.actions |= fork.actions;
                self.analyzer = fork.analyzer;
                self.loop_ends = fork.loop_ends;
                self.branch_count = fork.branch_count;
                return self.update_range(end_block, end_token, depth);
            }
            return Ok(Progress::Continue);
        }

        // Step 12: body non-modifying, condition unknown — walk inner loop once.
        let p = self.with_loop_end(end_block, |t| {
            let mut progress = t.update_range(body_start, end_block, depth - 1)?;
            if progress != Progress::Break {
                if let Some(step) = step {
                    let (sp, _) = t.traverse_recursive(step, 0);
                    if sp == Progress::Break {
                        progress = Progress::Break;
                    }
                }
            }
            if progress != Progress::Break {
                let (cp, _) = t.traverse_recursive(cond, 0);
                if cp == Progress::Break {
                    progress = Progress::Break;
                }
            }
            Ok(progress)
        })?;
        Ok(p)
    }

    /// Range-based `for (x : v)` (spec.md §4.1, §4.4 "range-based";
    /// `Analyzer::evaluate_container_empty`). `header_tok` is the `for`
    /// keyword; its `condTok` is the `:` token, whose `astOperand2` is the
    /// iterated container expression.
    pub(crate) fn handle_range_for(
        &mut self,
        header_tok: TokenId,
        end_block: TokenId,
        depth: i32,
    ) -> PResult {
        let Some(colon) = self.tokens.cond_tok(header_tok) else {
            return Ok(Progress::Continue);
        };
        let Some(container) = self.tokens.ast_operand2(colon) else {
            return Ok(Progress::Continue);
        };

        let (p, _) = self.traverse_recursive(container, 0);
        if p == Progress::Break {
            return Ok(Progress::Break);
        }

        // `[1]` means the Analyzer reports the container known empty: the
        // body never runs and the loop contributes no actions.
        let result = self.analyzer.evaluate_container_empty(self.tokens, container);
        if result.is_empty() {
            self.analyzer
                .assume(self.tokens, container, false, AssumeFlags::CONTAINER_EMPTY);
        } else if result[0] != 0 {
            return Ok(Progress::Continue);
        }

        let body_start = self.body_start(end_block);
        let body_analysis = self.analyze_range(body_start, end_block, depth - 1);
        self.actions |= body_analysis;
        if body_analysis.is_inconclusive() {
            if !self.analyzer.lower_to_inconclusive() {
                return Ok(self.bail());
            }
        } else if body_analysis.is_modified() {
            if !self.analyzer.lower_to_possible() {
                return Ok(self.bail());
            }
        }

        self.with_loop_end(end_block, |t| t.update_range(body_start, end_block, depth - 1))
    }

    fn eval_cond_ctx(&self, cond: TokenId, ctx: Option<TokenId>) -> (bool, bool) {
        let values = self.analyzer.evaluate(self.tokens, cond, ctx);
        let then_ = values.iter().any(|&v| v != 0);
        let else_ = values.iter().any(|&v| v == 0);
        (then_, else_)
    }

    /// `reentersLoop`: is the loop assumed to re-enter with the condition
    /// holding again?
    fn reenters_loop(
        &self,
        cond: TokenId,
        step: Option<TokenId>,
        body_start: TokenId,
        body_end: TokenId,
    ) -> bool {
        let vars = astutils::collect_variables(self.tokens, cond);
        if let Some(s) = step {
            if astutils::expr_writes_to_vars(self.tokens, s, &vars) {
                return true;
            }
        }
        if astutils::expression_changed(self.tokens, &vars, body_start, body_end) {
            return true;
        }
        if astutils::expr_contains_write(self.tokens, cond) {
            return true;
        }
        let mut fork = self.fork(true);
        let _ = fork.update_range(body_start, body_end, 0);
        let (then_, _) = fork.eval_cond(cond);
        then_
    }
}
