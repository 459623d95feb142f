//! Range Driver (spec.md §4.1): `updateRange(start, end, depth)`. Iterates
//! tokens between two endpoints, dispatching by structural shape to the
//! Expression Walker and the Branch/Loop Controller.

use super::{PResult, Progress, Traversal};
use crate::action::Action;
use crate::analyzer::{Analyzer, AssumeFlags};
use crate::astutils;
use crate::error::EngineError;
use crate::logger::MAX_BRANCHES_DIAGNOSTIC;
use crate::scope::{ScopeId, ScopeKind};
use crate::terminate::Terminate;
use crate::token::TokenId;

impl<'a, A: Analyzer> Traversal<'a, A> {
    pub(crate) fn update_range(&mut self, start: TokenId, end: TokenId, depth: i32) -> PResult {
        if depth < 0 {
            return Ok(self.bail());
        }

        let mut tok = start;
        let mut prev_index: Option<u32> = None;

        loop {
            if !self.tokens.precedes(tok, Some(end)) {
                return Ok(Progress::Continue);
            }

            let idx = self.tokens.index(tok);
            if let Some(prev) = prev_index {
                if idx <= prev {
                    return Err(EngineError::Internal { token: tok });
                }
            }
            prev_index = Some(idx);

            // Skip regions: casts and template argument lists.
            if self.tokens.str_is(tok, "(")
                && self.tokens.is_cast(tok)
                && self.tokens.ast_operand2(tok).is_none()
            {
                match self.tokens.link(tok).and_then(|close| self.tokens.next(close)) {
                    Some(n) => {
                        tok = n;
                        continue;
                    }
                    None => return Ok(Progress::Continue),
                }
            }
            if self.tokens.str_is(tok, "<") && !self.tokens.is_binary_op(tok) {
                if let Some(close) = self.tokens.link(tok) {
                    match self.tokens.next(close) {
                        Some(n) => {
                            tok = n;
                            continue;
                        }
                        None => return Ok(Progress::Continue),
                    }
                }
            }

            // Assignment lift.
            if let Some(assign) = astutils::assign_expr(self.tokens, tok) {
                let (p, _) = self.traverse_recursive(assign, 0);
                if p == Progress::Break {
                    return Ok(Progress::Break);
                }
                match self.tokens.next_after_ast_rightmost_leaf(assign) {
                    Some(n) => {
                        tok = n;
                        continue;
                    }
                    None => return Ok(Progress::Continue),
                }
            }

            // Mid-loop bailout: landed directly on a loop's own opening
            // brace without having gone through the header dispatch below.
            // Exempt range-for: its body is always walked through
            // `handle_range_for`, never by resuming mid-structure.
            if self.tokens.str_is(tok, "{") {
                if let Some(scope) = self.tokens.scope(tok) {
                    let kind = self.tokens.scope_kind(scope);
                    let is_range_for = self.is_range_for_scope(scope);
                    if kind.is_loop()
                        && !is_range_for
                        && self.body_open(self.tokens.scope_body_end(scope).unwrap_or(tok)) == tok
                    {
                        return Ok(self.bail());
                    }
                }
            }

            // Loop-header semicolons, reached when resuming mid-header.
            if self.tokens.str_is(tok, ";") {
                if let Some(parent) = self.tokens.ast_parent(tok) {
                    let lex = self.tokens.lexeme(parent);
                    if lex == "for" || lex == "while" {
                        let kind = if lex == "for" { ScopeKind::For } else { ScopeKind::While };
                        if let Some(scope) = self.tokens.scope_by_header(parent, kind) {
                            if let Some(end_block) = self.tokens.scope_body_end(scope) {
                                let p = self.handle_loop(parent, end_block, end, true, depth)?;
                                if p == Progress::Break {
                                    return Ok(Progress::Break);
                                }
                                tok = end_block;
                                continue;
                            }
                        }
                    }
                }
            }

            // `break`.
            if self.tokens.str_is(tok, "break") {
                if let Some(target) = astutils::find_next_token_from_break(self.tokens, tok) {
                    if !self.tokens.precedes(target, Some(end)) && target != end {
                        return Ok(self.brk(Terminate::Escape));
                    }
                    if !self.analyzer.lower_to_possible() {
                        return Ok(self.bail());
                    }
                    tok = target;
                    continue;
                }
            }

            // Labels / `case` / `default`: join points.
            if self.tokens.str_is(tok, "case") || self.tokens.str_is(tok, "default") || self.is_goto_label(tok) {
                if !self.analyzer.lower_to_possible() {
                    return Ok(self.bail());
                }
            }

            // `}` closing a structured scope.
            if self.tokens.str_is(tok, "}") {
                if let Some(scope) = self.tokens.scope(tok) {
                    let kind = self.tokens.scope_kind(scope);
                    match kind {
                        ScopeKind::Do
                        | ScopeKind::For
                        | ScopeKind::While
                        | ScopeKind::If
                        | ScopeKind::Else
                        | ScopeKind::Switch => {
                            if let Some(cond) = self.tokens.cond_tok_from_end(tok) {
                                if kind.is_loop() || !self.tokens.has_known_int_value(cond) {
                                    if !self.analyzer.lower_to_possible() {
                                        return Ok(self.bail());
                                    }
                                } else {
                                    let known = self.tokens.known_int_value(cond) != 0;
                                    let in_else = kind != ScopeKind::If;
                                    if known == in_else {
                                        return Ok(self.brk(Terminate::Escape));
                                    }
                                }

                                if kind.is_loop() {
                                    if let Some(step) = self.tokens.step_tok_from_end(tok) {
                                        let (p, _) = self.traverse_recursive(step, 0);
                                        if p == Progress::Break {
                                            return Ok(Progress::Break);
                                        }
                                    }
                                    let (p, _) = self.traverse_recursive(cond, 0);
                                    if p == Progress::Break {
                                        return Ok(Progress::Break);
                                    }
                                }

                                let assume_true = kind == ScopeKind::If;
                                self.analyzer
                                    .assume(self.tokens, cond, assume_true, AssumeFlags::QUIET);

                                if kind == ScopeKind::If {
                                    if let Some(else_kw) = self.tokens.next(tok) {
                                        if self.tokens.str_is(else_kw, "else") {
                                            if let Some(open) = self.tokens.next(else_kw) {
                                                if let Some(escope) = self.tokens.scope(open) {
                                                    if let Some(eend) = self.tokens.scope_body_end(escope) {
                                                        tok = eend;
                                                        continue;
                                                    }
                                                }
                                            }
                                        }
                                    }
                                } else if kind == ScopeKind::Do {
                                    if let Some(t) = self.skip_do_while_tail(tok) {
                                        tok = t;
                                        continue;
                                    }
                                }
                            }
                        }
                        ScopeKind::Try | ScopeKind::Catch => {
                            if !self.analyzer.lower_to_possible() {
                                return Ok(self.bail());
                            }
                        }
                        ScopeKind::Lambda => {
                            return Ok(self.brk(Terminate::Escape));
                        }
                        _ => {}
                    }
                }
            }

            // `if|while|for (`.
            let lex = self.tokens.lexeme(tok).to_string();
            if (lex == "if" || lex == "while" || lex == "for")
                && self.tokens.next(tok).is_some_and(|p| self.tokens.str_is(p, "("))
            {
                if self.settings.max_forward_branches != 0
                    && self.branch_count >= self.settings.max_forward_branches
                {
                    self.logger.report(&MAX_BRANCHES_DIAGNOSTIC);
                    return Ok(self.bail());
                }
                self.branch_count += 1;

                if lex == "if" {
                    let resume = self.if_construct_end(tok);
                    let p = self.handle_if(tok, depth)?;
                    if p == Progress::Break {
                        return Ok(Progress::Break);
                    }
                    if let Some(r) = resume {
                        tok = r;
                        continue;
                    }
                    return Ok(Progress::Continue);
                }
                let kind = if lex == "for" { ScopeKind::For } else { ScopeKind::While };
                if let Some(scope) = self.tokens.scope_by_header(tok, kind) {
                    if let Some(end_block) = self.tokens.scope_body_end(scope) {
                        let p = if lex == "for" && self.is_range_for_scope(scope) {
                            self.handle_range_for(tok, end_block, depth)?
                        } else {
                            self.handle_loop(tok, end_block, end, false, depth)?
                        };
                        if p == Progress::Break {
                            return Ok(Progress::Break);
                        }
                        tok = end_block;
                        continue;
                    }
                }
            }

            // `try {`.
            if lex == "try" {
                if let Some(t) = self.handle_try(tok, depth)? {
                    tok = t;
                    continue;
                }
                return Ok(Progress::Break);
            }

            // `do {`.
            if lex == "do" {
                if let Some(scope) = self.tokens.scope_by_header(tok, ScopeKind::Do) {
                    if let Some(end_block) = self.tokens.scope_body_end(scope) {
                        let p = self.handle_loop(tok, end_block, end, false, depth)?;
                        if p == Progress::Break {
                            return Ok(Progress::Break);
                        }
                        tok = end_block;
                        continue;
                    }
                }
            }

            // `assert` / `ASSERT`.
            if lex == "assert" || lex == "ASSERT" {
                if let Some(paren) = self.tokens.next(tok) {
                    if self.tokens.is_call_expr_paren(paren) {
                        if let Some(cond) = self
                            .tokens
                            .ast_operand2(paren)
                            .or_else(|| self.tokens.ast_operand1(paren))
                        {
                            let (then_, else_) = self.eval_cond(cond);
                            if else_ && !then_ {
                                return Ok(self.brk(Terminate::Escape));
                            }
                            if !then_ && !else_ {
                                self.analyzer.assume(
                                    self.tokens,
                                    cond,
                                    true,
                                    AssumeFlags::QUIET | AssumeFlags::ABSOLUTE,
                                );
                            }
                            let (p, _) = self.traverse_recursive(cond, 0);
                            if p == Progress::Break {
                                return Ok(Progress::Break);
                            }
                        }
                    }
                }
            }

            // `switch (`: selector only, bodies are not analyzed here.
            if lex == "switch" {
                if let Some(cond) = self.tokens.cond_tok(tok) {
                    let (p, _) = self.traverse_recursive(cond, 0);
                    if p == Progress::Break {
                        return Ok(Progress::Break);
                    }
                }
                self.actions |= Action::WRITE;
                return Ok(self.bail());
            }

            // Function call at its leftmost leaf.
            if self.tokens.ast_operand1(tok).is_none() && self.tokens.ast_operand2(tok).is_none() {
                if let Some(call) = astutils::call_expr(self.tokens, tok) {
                    if let Some(callee) = self.tokens.ast_operand1(call) {
                        let (p, _) = self.traverse_recursive(callee, 0);
                        if p == Progress::Break {
                            return Ok(Progress::Break);
                        }
                    }
                    if let (Some(args), Some(close)) =
                        (self.tokens.ast_operand2(call), self.tokens.link(call))
                    {
                        let p = self.update_range(args, close, depth)?;
                        if p == Progress::Break {
                            return Ok(Progress::Break);
                        }
                    }
                    let p = self.update(call);
                    if p == Progress::Break {
                        return Ok(Progress::Break);
                    }
                    match self.tokens.next(call) {
                        Some(n) => {
                            tok = n;
                            continue;
                        }
                        None => return Ok(Progress::Continue),
                    }
                }
            }

            // Otherwise: generic token update, following any jump hint.
            let (p, hint) = self.traverse_recursive(tok, 0);
            if p == Progress::Break {
                return Ok(Progress::Break);
            }
            let next = match hint {
                Some(h) => h,
                None => match self.tokens.next(tok) {
                    Some(n) => n,
                    None => return Ok(Progress::Continue),
                },
            };

            // Self-loop guard.
            if next == start {
                return Ok(self.brk(Terminate::Escape));
            }
            tok = next;
        }
    }

    /// The final `}` of an `if`'s full construct (its `else` if present,
    /// otherwise its own `then` body) — where the Range Driver resumes after
    /// the Branch Controller has fully walked both arms.
    fn if_construct_end(&self, if_tok: TokenId) -> Option<TokenId> {
        let then_scope = self.tokens.scope_by_header(if_tok, ScopeKind::If)?;
        let then_end = self.tokens.scope_body_end(then_scope)?;
        let else_kw = self.tokens.next(then_end)?;
        if !self.tokens.str_is(else_kw, "else") {
            return Some(then_end);
        }
        let open = self.tokens.next(else_kw)?;
        let escope = self.tokens.scope(open)?;
        self.tokens.scope_body_end(escope).or(Some(then_end))
    }

    /// `} while ( cond ) ;` tail following a `do` scope's closing brace.
    fn skip_do_while_tail(&self, do_end: TokenId) -> Option<TokenId> {
        let while_kw = self.tokens.next(do_end)?;
        if !self.tokens.str_is(while_kw, "while") {
            return None;
        }
        let paren = self.tokens.next(while_kw)?;
        let close = self.tokens.link(paren)?;
        let semi = self.tokens.next(close)?;
        if self.tokens.str_is(semi, ";") {
            self.tokens.next(semi)
        } else {
            Some(semi)
        }
    }

    fn is_goto_label(&self, tok: TokenId) -> bool {
        self.tokens.is_control_flow_keyword(tok)
            && self.tokens.next(tok).is_some_and(|n| self.tokens.str_is(n, ":"))
    }

    /// Is `scope` a `for` scope whose header's condTok is the range-for `:`
    /// rather than an ordinary boolean condition?
    fn is_range_for_scope(&self, scope: ScopeId) -> bool {
        self.tokens.scope_kind(scope) == ScopeKind::For
            && self
                .tokens
                .scope_header(scope)
                .and_then(|h| self.tokens.cond_tok(h))
                .is_some_and(|c| self.tokens.str_is(c, ":"))
    }

    /// `try { ... } catch (...) { ... }...`: fork the try body and each
    /// catch body, merging `actions`; bail if any fork modified state or
    /// terminated. Returns the resume token on success.
    fn handle_try(&mut self, try_tok: TokenId, depth: i32) -> Result<Option<TokenId>, EngineError> {
        let open = self.tokens.next(try_tok).ok_or(EngineError::Internal { token: try_tok })?;
        let scope = match self.tokens.scope(open) {
            Some(s) => s,
            None => return Ok(Some(self.tokens.next(try_tok).unwrap_or(try_tok))),
        };
        let try_end = match self.tokens.scope_body_end(scope) {
            Some(e) => e,
            None => return Ok(Some(open)),
        };

        let mut bail = false;
        let mut fork = self.fork(false);
        let body_start = self.body_start(try_end);
        fork.update_range(body_start, try_end, depth - 1)?;
        if !fork.terminate.is_none() || fork.actions.is_modified() {
            bail = true;
        }
        self.actions |= fork.actions;

        let mut cursor = try_end;
        while let Some(catch_kw) = self.tokens.next(cursor) {
            if !self.tokens.str_is(catch_kw, "catch") {
                break;
            }
            let Some(paren) = self.tokens.next(catch_kw) else { break };
            let Some(close) = self.tokens.link(paren) else { break };
            let Some(copen) = self.tokens.next(close) else { break };
            let Some(cscope) = self.tokens.scope(copen) else { break };
            let Some(cend) = self.tokens.scope_body_end(cscope) else { break };

            let mut cfork = self.fork(false);
            let cbody_start = self.body_start(cend);
            cfork.update_range(cbody_start, cend, depth - 1)?;
            if !cfork.terminate.is_none() || cfork.actions.is_modified() {
                bail = true;
            }
            self.actions |= cfork.actions;
            cursor = cend;
        }

        if bail {
            self.bail();
            return Ok(None);
        }
        Ok(self.tokens.next(cursor))
    }
}
