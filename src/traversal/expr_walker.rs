//! Expression Walker (spec.md §4.2): recursive AST walk with
//! language-correct evaluation order, plus the leaf dispatch table for
//! control-escaping constructs (`asm`, `goto`, `setjmp`/`longjmp`,
//! `continue`, `return`/`throw`, escape-function calls, unevaluated
//! contexts, ternary/short-circuit delegation, lambdas, class-scope braces).

use super::{Progress, Traversal};
use crate::analyzer::{Analyzer, Direction};
use crate::astutils;
use crate::terminate::Terminate;
use crate::token::TokenId;

/// Outcome of the leaf-dispatch pre-check (spec.md §4.2 `traverseTok`):
/// either the node is one of the special shapes and is fully handled here
/// (including any children it chooses to walk itself), or it is an ordinary
/// node and `traverse_recursive` should fall back to the generic
/// operand-order recursion followed by `F(tok)`.
enum Dispatch {
    Handled(Progress, Option<TokenId>),
    Generic,
}

impl<'a, A: Analyzer> Traversal<'a, A> {
    /// `traverseRecursive(tok, F, traverseUnknown, recursion)`. Returns the
    /// resulting `Progress` plus an optional "jump to" hint (`*out` in the
    /// source), used by `continue`, unevaluated contexts, short-circuit
    /// delegation, and lambdas to tell the caller where to resume.
    pub(crate) fn traverse_recursive(
        &mut self,
        tok: TokenId,
        recursion: u32,
    ) -> (Progress, Option<TokenId>) {
        if recursion >= 10_000 {
            return (Progress::Skip, None);
        }
        match self.traverse_tok(tok, recursion + 1) {
            Dispatch::Handled(p, out) => (p, out),
            Dispatch::Generic => {
                let op1 = self.tokens.ast_operand1(tok);
                let op2 = self.tokens.ast_operand2(tok);
                let swap = self.tokens.is_assignment_op(tok)
                    || astutils::is_function_call(self.tokens, tok)
                    || op2.is_none();
                let (first, second) = if swap { (op2, op1) } else { (op1, op2) };
                for operand in [first, second].into_iter().flatten() {
                    let (p, out) = self.traverse_recursive(operand, recursion + 1);
                    match p {
                        Progress::Break => return (Progress::Break, out),
                        Progress::Skip => return (Progress::Skip, out),
                        Progress::Continue => {}
                    }
                }
                (self.update(tok), None)
            }
        }
    }

    fn traverse_tok(&mut self, tok: TokenId, recursion: u32) -> Dispatch {
        let lex = self.tokens.lexeme(tok).to_string();

        if lex == "asm" || lex == "goto" {
            return Dispatch::Handled(self.bail(), None);
        }

        if lex == "setjmp" || lex == "longjmp" {
            if let Some(args) = self
                .tokens
                .ast_operand2(tok)
                .or_else(|| self.tokens.ast_operand1(tok))
            {
                let (p, _) = self.traverse_recursive(args, recursion);
                if p == Progress::Break {
                    return Dispatch::Handled(Progress::Break, None);
                }
            }
            return Dispatch::Handled(self.bail(), None);
        }

        if lex == "continue" {
            return match self.loop_ends.last().copied() {
                None => Dispatch::Handled(self.brk(Terminate::Escape), None),
                Some(end) => Dispatch::Handled(Progress::Skip, Some(end)),
            };
        }

        if lex == "return" || lex == "throw" {
            for operand in [self.tokens.ast_operand2(tok), self.tokens.ast_operand1(tok)]
                .into_iter()
                .flatten()
            {
                let (p, _) = self.traverse_recursive(operand, recursion);
                if p == Progress::Break {
                    return Dispatch::Handled(Progress::Break, None);
                }
            }
            return Dispatch::Handled(self.brk(Terminate::Escape), None);
        }

        if let Some(call) = astutils::escape_function_call(self.tokens, self.settings, tok) {
            if let Some(args) = self.tokens.ast_operand2(call) {
                let (p, _) = self.traverse_recursive(args, recursion);
                if p == Progress::Break {
                    return Dispatch::Handled(Progress::Break, None);
                }
            }
            return Dispatch::Handled(self.brk(Terminate::Escape), None);
        }

        if self.tokens.is_unevaluated_context(tok) {
            return Dispatch::Handled(Progress::Skip, self.tokens.link(tok));
        }

        if matches!(lex.as_str(), "?" | "&&" | "||")
            && self.tokens.ast_operand1(tok).is_some()
            && self.tokens.ast_operand2(tok).is_some()
        {
            let p = self.traverse_conditional(tok);
            return match p {
                Progress::Break => Dispatch::Handled(Progress::Break, None),
                _ => Dispatch::Handled(Progress::Skip, self.tokens.next_after_ast_rightmost_leaf(tok)),
            };
        }

        if self.tokens.is_lambda_start(tok) {
            let end = self.tokens.link(tok).unwrap_or(tok);
            let modifies = self.analyze_range(tok, end, 0).is_modified();
            if modifies {
                return Dispatch::Handled(self.bail(), None);
            }
            return Dispatch::Handled(Progress::Skip, self.tokens.next(end));
        }

        if lex == "{" {
            if let Some(scope) = self.tokens.scope(tok) {
                if self.tokens.scope_kind(scope).is_class_or_struct() {
                    return Dispatch::Handled(Progress::Skip, self.tokens.link(tok));
                }
            }
        }

        Dispatch::Generic
    }

    /// `traverseConditional`: the short-circuit/ternary walker. Both-false
    /// (ambiguous) is *never* optimized into "skip both" — per spec.md §9
    /// it is treated as both-taken unless the Analyzer asks to stop.
    fn traverse_conditional(&mut self, tok: TokenId) -> Progress {
        let action = self.analyzer.analyze(self.tokens, tok, Direction::Forward);
        if !action.is_none() {
            return self.update_action(tok, action);
        }

        let cond = self.tokens.ast_operand1(tok).unwrap_or(tok);
        let (mut then, mut els) = self.eval_cond(cond);
        if !then && !els {
            if self.analyzer.stop_on_condition(self.tokens, cond) && self.stop_updates() {
                return Progress::Continue;
            }
            then = true;
            els = true;
        }

        let lex = self.tokens.lexeme(tok).to_string();
        let rhs = self.tokens.ast_operand2(tok);
        match lex.as_str() {
            "?" => {
                if let Some(colon) = rhs {
                    if then {
                        if let Some(then_expr) = self.tokens.ast_operand1(colon) {
                            let (p, _) = self.traverse_recursive(then_expr, 0);
                            if p == Progress::Break {
                                return Progress::Break;
                            }
                        }
                    }
                    if els {
                        if let Some(else_expr) = self.tokens.ast_operand2(colon) {
                            let (p, _) = self.traverse_recursive(else_expr, 0);
                            if p == Progress::Break {
                                return Progress::Break;
                            }
                        }
                    }
                }
            }
            "&&" => {
                if then {
                    if let Some(r) = rhs {
                        let (p, _) = self.traverse_recursive(r, 0);
                        if p == Progress::Break {
                            return Progress::Break;
                        }
                    }
                }
            }
            "||" => {
                if els {
                    if let Some(r) = rhs {
                        let (p, _) = self.traverse_recursive(r, 0);
                        if p == Progress::Break {
                            return Progress::Break;
                        }
                    }
                }
            }
            _ => {}
        }
        Progress::Continue
    }

    /// `evalCond`: `then = exists v in V. v != 0`, `else = exists v in V. v
    /// == 0`; an empty candidate set is "unknown" (`(false, false)`).
    pub(crate) fn eval_cond(&self, cond: TokenId) -> (bool, bool) {
        let values = self.analyzer.evaluate(self.tokens, cond, None);
        let then = values.iter().any(|&v| v != 0);
        let els = values.iter().any(|&v| v == 0);
        (then, els)
    }
}
