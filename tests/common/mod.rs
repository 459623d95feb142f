//! Shared test fixtures: a hand-built `TokenList` assembler plus a reference
//! `Analyzer` that tracks one variable's possible values.

use std::cell::RefCell;
use std::rc::Rc;

use fdte::{
    Action, AssumeFlags, Candidates, Direction, EscapeLibrary, NoEscapes, ScopeKind, Settings,
    TokenFlags, TokenId, TokenList, TokenListBuilder, VariableId,
};

pub const TRACKED: VariableId = VariableId(0);

/// Tracks one variable's candidate integer values and records whether it was
/// written. `known` fixes the value `evaluate` reports for `TRACKED`
/// (`None` = unknown). `visited` is shared (`Rc<RefCell<_>>`) so a clone kept
/// by the test can still inspect commit order after the owned Analyzer is
/// consumed by `forward_range`/`forward_expression`.
#[derive(Debug, Clone)]
pub struct TrackingAnalyzer {
    pub known: Option<i64>,
    pub writes_seen: u32,
    pub reads_seen: u32,
    pub last_assume: Option<(bool, AssumeFlags)>,
    pub fork_scopes: bool,
    pub conditional: bool,
    pub is_invalid: bool,
    /// Fixes the container-emptiness query's result: `Some(true)` means
    /// "known empty" (`[1]`), `Some(false)` means "known non-empty" (`[0]`).
    pub container_empty: Option<bool>,
    pub visited: Rc<RefCell<Vec<TokenId>>>,
}

impl TrackingAnalyzer {
    pub fn new(known: Option<i64>) -> Self {
        Self {
            known,
            writes_seen: 0,
            reads_seen: 0,
            last_assume: None,
            fork_scopes: false,
            conditional: false,
            is_invalid: false,
            container_empty: None,
            visited: Rc::new(RefCell::new(Vec::new())),
        }
    }
}

impl fdte::Analyzer for TrackingAnalyzer {
    fn evaluate(&self, tokens: &TokenList, tok: TokenId, _ctx: Option<TokenId>) -> Candidates {
        let mut out = Candidates::new();
        if tokens.variable(tok) == Some(TRACKED) {
            if let Some(v) = self.known {
                out.push(v);
            }
        } else if tokens.has_known_int_value(tok) {
            out.push(tokens.known_int_value(tok));
        }
        out
    }

    fn evaluate_container_empty(&self, _tokens: &TokenList, _tok: TokenId) -> Candidates {
        let mut out = Candidates::new();
        match self.container_empty {
            Some(true) => out.push(1),
            Some(false) => out.push(0),
            None => {}
        }
        out
    }

    fn analyze(&self, tokens: &TokenList, tok: TokenId, _direction: Direction) -> Action {
        if tokens.str_is(tok, "++") || tokens.str_is(tok, "--") {
            // Read-modify-write: carries `READ` too, so the Bridge's
            // pure-write immediate break doesn't fire on a plain increment.
            Action::WRITE | Action::READ | Action::MODIFIED
        } else if tokens.is_variable_write(tok) || tokens.is_assignment_op(tok) {
            Action::WRITE | Action::MODIFIED
        } else if tokens.variable(tok).is_some() {
            Action::READ
        } else {
            Action::empty()
        }
    }

    fn update(&mut self, _tokens: &TokenList, tok: TokenId, action: Action, _direction: Direction) {
        if action.is_write() {
            self.writes_seen += 1;
        }
        if action.is_read() {
            self.reads_seen += 1;
        }
        self.visited.borrow_mut().push(tok);
    }

    fn update_state(&mut self, _tokens: &TokenList, _tok: TokenId) {}

    fn update_scope(&mut self, _tokens: &TokenList, _end_block: TokenId, _is_modified: bool) -> bool {
        self.fork_scopes
    }

    fn assume(&mut self, _tokens: &TokenList, _tok: TokenId, result: bool, flags: AssumeFlags) {
        self.last_assume = Some((result, flags));
    }

    fn lower_to_possible(&mut self) -> bool {
        true
    }

    fn lower_to_inconclusive(&mut self) -> bool {
        true
    }

    fn is_conditional(&self) -> bool {
        self.conditional
    }

    fn stop_on_condition(&self, _tokens: &TokenList, _cond_tok: TokenId) -> bool {
        false
    }

    fn invalid(&self) -> bool {
        self.is_invalid
    }
}

pub fn settings<'a>(library: &'a dyn EscapeLibrary) -> Settings<'a> {
    Settings::new(library, 0)
}

pub fn no_escapes() -> NoEscapes {
    NoEscapes
}

/// `if (c) { x = 1; } else { x = 2; } y = x;` with `c` unknown.
pub fn build_if_else() -> (TokenList, TokenId, TokenId) {
    let mut b = TokenListBuilder::new();
    let if_kw = b.push("if");
    let lp = b.push("(");
    let c = b.push("c");
    b.variable(c, TRACKED);
    let rp = b.push(")");
    b.link(lp, rp);
    b.header(if_kw, Some(c), None, None);

    let then_open = b.push("{");
    let x1 = b.push("x");
    let eq1 = b.push("=");
    let one = b.push("1");
    b.known_int_value(one, 1);
    b.ast_operand1(eq1, x1);
    b.ast_operand2(eq1, one);
    b.flag(eq1, TokenFlags::ASSIGNMENT_OP);
    let semi1 = b.push(";");
    let then_close = b.push("}");
    b.link(then_open, then_close);
    b.scope_with_header(ScopeKind::If, then_open, then_close, None, Some(if_kw));

    let else_kw = b.push("else");
    let else_open = b.push("{");
    let x2 = b.push("x");
    let eq2 = b.push("=");
    let two = b.push("2");
    b.known_int_value(two, 2);
    b.ast_operand1(eq2, x2);
    b.ast_operand2(eq2, two);
    b.flag(eq2, TokenFlags::ASSIGNMENT_OP);
    let semi2 = b.push(";");
    let else_close = b.push("}");
    b.link(else_open, else_close);
    b.scope(ScopeKind::Else, else_open, else_close, None);

    let y = b.push("y");
    let eq3 = b.push("=");
    let x3 = b.push("x");
    b.ast_operand1(eq3, y);
    b.ast_operand2(eq3, x3);
    b.flag(eq3, TokenFlags::ASSIGNMENT_OP);
    let semi3 = b.push(";");
    let _ = (semi1, semi2, semi3, rp);

    let end = b.push("__end__");
    let tokens = b.build();
    (tokens, if_kw, end)
}

/// `if (p) return; use(p);` — then-arm conclusively escapes, no `else`.
pub fn build_if_return() -> (TokenList, TokenId, TokenId) {
    let mut b = TokenListBuilder::new();
    let if_kw = b.push("if");
    let lp = b.push("(");
    let p = b.push("p");
    b.variable(p, TRACKED);
    let rp = b.push(")");
    b.link(lp, rp);
    b.header(if_kw, Some(p), None, None);

    let open = b.push("{");
    let ret = b.push("return");
    let semi = b.push(";");
    let close = b.push("}");
    b.link(open, close);
    b.scope_with_header(ScopeKind::If, open, close, None, Some(if_kw));
    let _ = (ret, semi);

    let use_name = b.push("use");
    let call_lp = b.push("(");
    let arg = b.push("p");
    b.variable(arg, TRACKED);
    let call_rp = b.push(")");
    b.link(call_lp, call_rp);
    b.ast_operand1(call_lp, use_name);
    b.ast_operand2(call_lp, arg);
    b.flag(call_lp, TokenFlags::CALL_EXPR);
    b.flag(call_lp, TokenFlags::BINARY_OP);
    let _semi2 = b.push(";");

    let end = b.push("__end__");
    let tokens = b.build();
    (tokens, if_kw, end)
}

/// `do { f(); } while (0);` — `else` of cond holds, straightlined.
pub fn build_do_while_false() -> (TokenList, TokenId, TokenId) {
    let mut b = TokenListBuilder::new();
    let do_kw = b.push("do");
    let open = b.push("{");
    let f = b.push("f");
    let call_lp = b.push("(");
    let call_rp = b.push(")");
    b.link(call_lp, call_rp);
    b.ast_operand1(call_lp, f);
    b.flag(call_lp, TokenFlags::CALL_EXPR);
    b.flag(call_lp, TokenFlags::BINARY_OP);
    let semi = b.push(";");
    let close = b.push("}");
    b.link(open, close);
    let while_kw = b.push("while");
    let wlp = b.push("(");
    let zero = b.push("0");
    b.known_int_value(zero, 0);
    let wrp = b.push(")");
    b.link(wlp, wrp);
    let wsemi = b.push(";");
    b.scope_with_header(ScopeKind::Do, open, close, None, Some(do_kw));
    b.header(do_kw, Some(zero), None, None);
    let _ = (semi, wsemi);

    let end = b.push("__end__");
    let tokens = b.build();
    (tokens, do_kw, end)
}

/// `while (i < n) { ++i; }` — condition unknown, body writes the variable the
/// condition reads; the loop lowers to `Possible` then bails in the
/// unapproved fork-list path (no scope-fork Analyzer ever approves here).
pub fn build_while_reenter() -> (TokenList, TokenId, TokenId) {
    let mut b = TokenListBuilder::new();
    let while_kw = b.push("while");
    let lp = b.push("(");
    let i_cond = b.push("i");
    b.variable(i_cond, VariableId(1));
    let lt = b.push("<");
    let n_cond = b.push("n");
    b.variable(n_cond, VariableId(2));
    b.ast_operand1(lt, i_cond);
    b.ast_operand2(lt, n_cond);
    let rp = b.push(")");
    b.link(lp, rp);
    b.header(while_kw, Some(lt), None, None);

    let open = b.push("{");
    let incr = b.push("++");
    let i_body = b.push("i");
    b.variable(i_body, TRACKED);
    b.ast_operand1(incr, i_body);
    b.flag(incr, TokenFlags::VARIABLE_WRITE);
    let semi = b.push(";");
    let close = b.push("}");
    b.link(open, close);
    b.scope_with_header(ScopeKind::While, open, close, None, Some(while_kw));
    let _ = semi;

    let end = b.push("__end__");
    let tokens = b.build();
    (tokens, while_kw, end)
}

/// `for (e : container) { w = 1; }` with the container reported empty — the
/// body (an assignment that would otherwise show up as `Write`) is never
/// walked.
pub fn build_range_for_empty() -> (TokenList, TokenId, TokenId) {
    let mut b = TokenListBuilder::new();
    let for_kw = b.push("for");
    let lp = b.push("(");
    let e = b.push("e");
    let colon = b.push(":");
    let container = b.push("container");
    b.ast_operand1(colon, e);
    b.ast_operand2(colon, container);
    let rp = b.push(")");
    b.link(lp, rp);
    b.header(for_kw, Some(colon), None, None);

    let open = b.push("{");
    let w = b.push("w");
    let eq = b.push("=");
    let one = b.push("1");
    b.known_int_value(one, 1);
    b.ast_operand1(eq, w);
    b.ast_operand2(eq, one);
    b.flag(eq, TokenFlags::ASSIGNMENT_OP);
    let semi = b.push(";");
    let close = b.push("}");
    b.link(open, close);
    b.scope_with_header(ScopeKind::For, open, close, None, Some(for_kw));
    let _ = semi;

    let end = b.push("__end__");
    let tokens = b.build();
    (tokens, for_kw, end)
}

/// `switch (x) { }` — selector walked, then a bailout.
pub fn build_switch() -> (TokenList, TokenId, TokenId) {
    let mut b = TokenListBuilder::new();
    let switch_kw = b.push("switch");
    let lp = b.push("(");
    let x = b.push("x");
    b.variable(x, TRACKED);
    let rp = b.push(")");
    b.link(lp, rp);
    b.header(switch_kw, Some(x), None, None);

    let open = b.push("{");
    let close = b.push("}");
    b.link(open, close);
    b.scope_with_header(ScopeKind::Switch, open, close, None, Some(switch_kw));

    let end = b.push("__end__");
    let tokens = b.build();
    (tokens, switch_kw, end)
}

/// `a = b;` — for the assignment evaluation-order round-trip law. Returns
/// `(tokens, start, end, a, b)`.
pub fn build_assignment() -> (TokenList, TokenId, TokenId, TokenId, TokenId) {
    let mut b = TokenListBuilder::new();
    let a = b.push("a");
    b.variable(a, VariableId(1));
    let eq = b.push("=");
    let bb = b.push("b");
    b.variable(bb, VariableId(2));
    b.ast_operand1(eq, a);
    b.ast_operand2(eq, bb);
    b.flag(eq, TokenFlags::ASSIGNMENT_OP);
    let semi = b.push(";");
    let _ = semi;

    let end = b.push("__end__");
    let tokens = b.build();
    (tokens, a, end, a, bb)
}

/// `p && q` — for the short-circuit suppression round-trip law. Returns the
/// root `&&` token plus `q`'s leaf token so the test can assert it was never
/// delivered to the Analyzer.
pub fn build_short_circuit() -> (TokenList, TokenId, TokenId) {
    let mut b = TokenListBuilder::new();
    let p = b.push("p");
    b.variable(p, TRACKED);
    let and = b.push("&&");
    let q = b.push("q");
    b.variable(q, VariableId(3));
    b.ast_operand1(and, p);
    b.ast_operand2(and, q);

    let tokens = b.build();
    (tokens, and, q)
}
