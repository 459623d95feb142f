//! Structural AST-shape helpers (`astutils.cpp` in `original_source`):
//! `assignExpr`, `callExpr`, `hasGoto`, `findNextTokenFromBreak`, variable-
//! change detection, ... These interpret AST *shape*, the same job the
//! token/AST builder collaborator already does (spec.md §1) — the engine
//! only reads the shape back through `TokenList`, never re-derives C/C++
//! grammar from raw lexemes.

use smallvec::SmallVec;

use crate::settings::Settings;
use crate::token::{TokenId, TokenList, VariableId};

/// Candidate variables touched by a sub-expression; rarely more than a few.
pub type VarSet = SmallVec<[VariableId; 8]>;

pub fn is_function_call(tokens: &TokenList, tok: TokenId) -> bool {
    tokens.str_is(tok, "(")
        && tokens.is_call_expr_paren(tok)
        && tokens.is_binary_op(tok)
        && !tokens.is_cast(tok)
}

/// Walk up while `tok` is the LHS of its parent; succeed the moment an
/// assignment-op parent is reached (spec.md §4.1 "Assignment lift").
pub fn assign_expr(tokens: &TokenList, tok: TokenId) -> Option<TokenId> {
    let mut cur = tok;
    while let Some(parent) = tokens.ast_parent(cur) {
        if tokens.is_assignment_op(parent) {
            return Some(parent);
        }
        if !tokens.ast_is_lhs(cur) {
            return None;
        }
        cur = parent;
    }
    None
}

/// Highest AST ancestor of `tok` still on a call spine (chained calls,
/// `obj.method(...)`), per spec.md §4.1 "Function call (identified by
/// `callExpr`)".
pub fn call_expr(tokens: &TokenList, tok: TokenId) -> Option<TokenId> {
    let mut cur = tok;
    let mut found = None;
    while let Some(parent) = tokens.ast_parent(cur) {
        if is_function_call(tokens, parent) {
            found = Some(parent);
            cur = parent;
            continue;
        }
        if tokens.ast_is_lhs(cur) {
            cur = parent;
            continue;
        }
        break;
    }
    found
}

pub fn has_goto(tokens: &TokenList, start: TokenId, end: TokenId) -> bool {
    let mut tok = start;
    loop {
        if tokens.str_is(tok, "goto") {
            return true;
        }
        if tok == end {
            return false;
        }
        match tokens.next(tok) {
            Some(n) if tokens.precedes(n, Some(end)) || n == end => tok = n,
            _ => return false,
        }
    }
}

pub fn has_jump(tokens: &TokenList, start: TokenId, end: TokenId) -> bool {
    let mut tok = start;
    loop {
        if tokens.str_is(tok, "goto") || tokens.str_is(tok, "break") {
            return true;
        }
        if tok == end {
            return false;
        }
        match tokens.next(tok) {
            Some(n) if tokens.precedes(n, Some(end)) || n == end => tok = n,
            _ => return false,
        }
    }
}

/// `findNextTokenFromBreak`: the end of the nearest enclosing loop/`switch`.
pub fn find_next_token_from_break(tokens: &TokenList, break_tok: TokenId) -> Option<TokenId> {
    let scope = tokens.scope(break_tok)?;
    let target = tokens.enclosing_loop_or_switch(scope)?;
    tokens.scope_body_end(target)
}

/// Is `tok` a name immediately applied to a call classified as an escape
/// function by `settings.library`? Returns the call paren if so.
pub fn escape_function_call(
    tokens: &TokenList,
    settings: &Settings,
    tok: TokenId,
) -> Option<TokenId> {
    let paren = tokens.next(tok)?;
    if tokens.is_call_expr_paren(paren) && settings.library.is_escape_function(tokens.lexeme(tok))
    {
        Some(paren)
    } else {
        None
    }
}

fn collect_variables_into(tokens: &TokenList, tok: TokenId, out: &mut VarSet) {
    if let Some(v) = tokens.variable(tok) {
        if !out.contains(&v) {
            out.push(v);
        }
    }
    if let Some(op1) = tokens.ast_operand1(tok) {
        collect_variables_into(tokens, op1, out);
    }
    if let Some(op2) = tokens.ast_operand2(tok) {
        collect_variables_into(tokens, op2, out);
    }
}

pub fn collect_variables(tokens: &TokenList, expr: TokenId) -> VarSet {
    let mut out = VarSet::new();
    collect_variables_into(tokens, expr, &mut out);
    out
}

fn ast_contains_variable(tokens: &TokenList, tok: TokenId, var: VariableId) -> bool {
    if tokens.variable(tok) == Some(var) {
        return true;
    }
    tokens
        .ast_operand1(tok)
        .is_some_and(|op| ast_contains_variable(tokens, op, var))
        || tokens
            .ast_operand2(tok)
            .is_some_and(|op| ast_contains_variable(tokens, op, var))
}

/// Does evaluating `expr` itself perform a write (assignment or flagged
/// increment/decrement) anywhere in its subtree? Used by `reentersLoop` to
/// test whether the condition mutates a variable.
pub fn expr_contains_write(tokens: &TokenList, expr: TokenId) -> bool {
    if tokens.is_assignment_op(expr) || tokens.is_variable_write(expr) {
        return true;
    }
    tokens
        .ast_operand1(expr)
        .is_some_and(|op| expr_contains_write(tokens, op))
        || tokens
            .ast_operand2(expr)
            .is_some_and(|op| expr_contains_write(tokens, op))
}

/// `isEscapeScope`: does `[open, close]` unconditionally escape (`return`/
/// `throw`/escape-call as its last statement), or only possibly (one of
/// those appears somewhere inside, but not demonstrably on every path)?
/// Returns `(escape, escape_unknown)`. A full must-escape analysis belongs
/// to the symbol-database/scope-classifier collaborator (out of scope,
/// spec.md §1); this is a conservative structural approximation the engine
/// can compute itself from the token stream alone.
pub fn classify_escape_scope(
    tokens: &TokenList,
    settings: &Settings,
    open: TokenId,
    close: TokenId,
) -> (bool, bool) {
    let conclusive = tokens.previous(close).is_some_and(|last| {
        tokens.str_is(last, "return")
            || tokens.str_is(last, "throw")
            || tokens
                .ast_parent(last)
                .is_some_and(|p| tokens.str_is(p, "return") || tokens.str_is(p, "throw"))
    });
    if conclusive {
        return (true, false);
    }
    let mut tok = open;
    loop {
        if tokens.str_is(tok, "return") || tokens.str_is(tok, "throw") || tokens.str_is(tok, "goto")
        {
            return (true, true);
        }
        if escape_function_call(tokens, settings, tok).is_some() {
            return (true, true);
        }
        if tok == close {
            break;
        }
        match tokens.next(tok) {
            Some(n) => tok = n,
            None => break,
        }
    }
    (false, false)
}

/// Does `[start, end]` contain a `return`/`throw` anywhere, making it worth
/// an `analyzeTerminate` probe to learn whether some path escapes?
pub fn has_inner_return_scope(tokens: &TokenList, start: TokenId, end: TokenId) -> bool {
    let mut tok = start;
    loop {
        if tokens.str_is(tok, "return") || tokens.str_is(tok, "throw") {
            return true;
        }
        if tok == end {
            return false;
        }
        match tokens.next(tok) {
            Some(n) => tok = n,
            None => return false,
        }
    }
}

/// Does `expr`'s subtree write to any variable in `vars`, anywhere below an
/// assignment-op or flagged write node? Used by `reentersLoop` to check
/// whether a `for` loop's step expression touches the condition's variables.
pub fn expr_writes_to_vars(tokens: &TokenList, expr: TokenId, vars: &[VariableId]) -> bool {
    let writes_here = (tokens.is_assignment_op(expr)
        && tokens
            .ast_operand1(expr)
            .is_some_and(|lhs| vars.iter().any(|&v| ast_contains_variable(tokens, lhs, v))))
        || (tokens.is_variable_write(expr)
            && tokens.variable(expr).is_some_and(|v| vars.contains(&v)));
    writes_here
        || tokens
            .ast_operand1(expr)
            .is_some_and(|op| expr_writes_to_vars(tokens, op, vars))
        || tokens
            .ast_operand2(expr)
            .is_some_and(|op| expr_writes_to_vars(tokens, op, vars))
}

/// `findExpressionChanged`/`isVariableChanged`: does any token in `[start,
/// end)` write to one of `vars`?
pub fn expression_changed(
    tokens: &TokenList,
    vars: &[VariableId],
    start: TokenId,
    end: TokenId,
) -> bool {
    let mut tok = start;
    loop {
        if tokens.is_assignment_op(tok) {
            if let Some(lhs) = tokens.ast_operand1(tok) {
                if vars.iter().any(|&v| ast_contains_variable(tokens, lhs, v)) {
                    return true;
                }
            }
        }
        if tokens.is_variable_write(tok) {
            if let Some(v) = tokens.variable(tok) {
                if vars.contains(&v) {
                    return true;
                }
            }
        }
        if tok == end || !tokens.precedes(tok, Some(end)) {
            return false;
        }
        match tokens.next(tok) {
            Some(n) => tok = n,
            None => return false,
        }
    }
}
