//! The token/AST data model the engine walks.
//!
//! A real caller (a C/C++-like front end, out of scope for this crate) owns
//! the token stream and its AST overlay. The engine only ever *observes* it.
//! Rust has no cheap safe equivalent of a mutable doubly-linked list of
//! `Token*` with back-references into an AST and a scope tree, so tokens are
//! modeled as arena-indexed handles (`TokenId`) resolved against a
//! `TokenList`, the same way `kirin_ir` resolves `SSAValue`/`Block` handles
//! against a `StageInfo`.

use crate::scope::{ScopeId, ScopeKind, ScopeList};
use rustc_hash::FxHashMap;
use std::fmt;

/// Handle into a [`TokenList`]. Stands in for a raw `Token*`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TokenId(u32);

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

bitflags::bitflags! {
    /// Boolean predicates attached to a token (`isAssignmentOp`, `isCast`, ...).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct TokenFlags: u16 {
        const ASSIGNMENT_OP      = 1 << 0;
        const CAST               = 1 << 1;
        const CONTROL_FLOW_KEYWORD = 1 << 2;
        const BINARY_OP          = 1 << 3;
        const INCOMPLETE_VAR     = 1 << 4;
        /// Set together with `known_int_value` below.
        const HAS_KNOWN_INT_VALUE = 1 << 5;
        /// Marks a `(` as a call application rather than a grouping/cast paren.
        const CALL_EXPR          = 1 << 6;
        /// The subtree rooted here is inside `sizeof`/`decltype`/... and is
        /// never actually evaluated at runtime.
        const UNEVALUATED_CONTEXT = 1 << 7;
        /// Marks the token that opens a lambda expression (its `link()` is
        /// the lambda's closing brace).
        const LAMBDA_START       = 1 << 8;
        /// Marks a token as writing to `variable()` outside of a plain `=`
        /// assignment (e.g. `++`, `--`, pass-by-mutable-reference).
        const VARIABLE_WRITE     = 1 << 9;
    }
}

/// A variable reference observed at a token (opaque identity for the engine).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VariableId(pub u32);

/// The condition/init/step sub-expressions of an `if`/`while`/`for`/`do`
/// header, keyed by the header's leading keyword token. Deriving these from
/// raw AST shape is the token/AST builder's job (out of scope for this
/// crate, spec.md §1); the engine only ever reads them back.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderParts {
    pub cond: Option<TokenId>,
    pub init: Option<TokenId>,
    pub step: Option<TokenId>,
}

#[derive(Debug, Clone)]
pub(crate) struct TokenData {
    pub lexeme: String,
    pub link: Option<TokenId>,
    pub ast_operand1: Option<TokenId>,
    pub ast_operand2: Option<TokenId>,
    pub ast_parent: Option<TokenId>,
    pub scope: Option<ScopeId>,
    pub flags: TokenFlags,
    pub known_int_value: i64,
    pub variable: Option<VariableId>,
}

impl TokenData {
    fn new(lexeme: impl Into<String>) -> Self {
        Self {
            lexeme: lexeme.into(),
            link: None,
            ast_operand1: None,
            ast_operand2: None,
            ast_parent: None,
            scope: None,
            flags: TokenFlags::empty(),
            known_int_value: 0,
            variable: None,
        }
    }
}

/// The token arena. Tokens are addressed by `index` order, which is the
/// engine's notion of textual order (`tok.index() < end.index()` etc).
pub struct TokenList {
    pub(crate) tokens: Vec<TokenData>,
    pub(crate) scopes: ScopeList,
    pub(crate) header_parts: FxHashMap<TokenId, HeaderParts>,
}

impl TokenList {
    pub fn builder() -> TokenListBuilder {
        TokenListBuilder::new()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Monotonically increasing position; the Range Driver's progress guard
    /// relies on this being a total order matching textual order.
    pub fn index(&self, tok: TokenId) -> u32 {
        tok.0
    }

    pub fn lexeme(&self, tok: TokenId) -> &str {
        &self.tokens[tok.0 as usize].lexeme
    }

    pub fn str_is(&self, tok: TokenId, s: &str) -> bool {
        self.lexeme(tok) == s
    }

    pub fn link(&self, tok: TokenId) -> Option<TokenId> {
        self.tokens[tok.0 as usize].link
    }

    pub fn ast_operand1(&self, tok: TokenId) -> Option<TokenId> {
        self.tokens[tok.0 as usize].ast_operand1
    }

    pub fn ast_operand2(&self, tok: TokenId) -> Option<TokenId> {
        self.tokens[tok.0 as usize].ast_operand2
    }

    pub fn ast_parent(&self, tok: TokenId) -> Option<TokenId> {
        self.tokens[tok.0 as usize].ast_parent
    }

    /// Walk up `astParent` links to the top of this token's AST tree.
    pub fn ast_top(&self, tok: TokenId) -> TokenId {
        let mut cur = tok;
        while let Some(parent) = self.ast_parent(cur) {
            cur = parent;
        }
        cur
    }

    /// Is `tok` the left-hand-side child of its AST parent?
    pub fn ast_is_lhs(&self, tok: TokenId) -> bool {
        match self.ast_parent(tok) {
            Some(parent) => self.ast_operand1(parent) == Some(tok),
            None => false,
        }
    }

    pub fn scope(&self, tok: TokenId) -> Option<ScopeId> {
        self.tokens[tok.0 as usize].scope
    }

    pub fn scope_kind(&self, scope: ScopeId) -> ScopeKind {
        self.scopes.kind(scope)
    }

    pub fn scope_body_end(&self, scope: ScopeId) -> Option<TokenId> {
        self.scopes.body_end(scope)
    }

    pub fn scope_parent(&self, scope: ScopeId) -> Option<ScopeId> {
        self.scopes.parent(scope)
    }

    pub fn scope_header(&self, scope: ScopeId) -> Option<TokenId> {
        self.scopes.header(scope)
    }

    pub fn scope_by_header(&self, header: TokenId, kind: ScopeKind) -> Option<ScopeId> {
        self.scopes.find_by_header(header, kind)
    }

    /// Nearest enclosing scope (including `scope` itself) classified as a
    /// loop or a `switch`, used by `break`'s `findNextTokenFromBreak`.
    pub fn enclosing_loop_or_switch(&self, scope: ScopeId) -> Option<ScopeId> {
        let mut cur = Some(scope);
        while let Some(id) = cur {
            let kind = self.scope_kind(id);
            if kind.is_loop() || kind == ScopeKind::Switch {
                return Some(id);
            }
            cur = self.scope_parent(id);
        }
        None
    }

    /// The condition/init/step of an `if`/`while`/`for`/`do` header, keyed by
    /// its leading keyword token.
    pub fn header_parts(&self, keyword: TokenId) -> Option<&HeaderParts> {
        self.header_parts.get(&keyword)
    }

    pub fn cond_tok(&self, keyword: TokenId) -> Option<TokenId> {
        self.header_parts(keyword).and_then(|h| h.cond)
    }

    pub fn init_tok(&self, keyword: TokenId) -> Option<TokenId> {
        self.header_parts(keyword).and_then(|h| h.init)
    }

    pub fn step_tok(&self, keyword: TokenId) -> Option<TokenId> {
        self.header_parts(keyword).and_then(|h| h.step)
    }

    /// `getCondTokFromEnd`/`getStepTokFromEnd`: re-derive header parts from
    /// the scope's closing `}`.
    pub fn cond_tok_from_end(&self, end: TokenId) -> Option<TokenId> {
        let scope = self.scope(end)?;
        self.cond_tok(self.scope_header(scope)?)
    }

    pub fn step_tok_from_end(&self, end: TokenId) -> Option<TokenId> {
        let scope = self.scope(end)?;
        self.step_tok(self.scope_header(scope)?)
    }

    pub fn is_call_expr_paren(&self, tok: TokenId) -> bool {
        self.tokens[tok.0 as usize].flags.contains(TokenFlags::CALL_EXPR)
    }

    pub fn is_unevaluated_context(&self, tok: TokenId) -> bool {
        self.tokens[tok.0 as usize]
            .flags
            .contains(TokenFlags::UNEVALUATED_CONTEXT)
    }

    pub fn is_lambda_start(&self, tok: TokenId) -> bool {
        self.tokens[tok.0 as usize]
            .flags
            .contains(TokenFlags::LAMBDA_START)
    }

    pub fn is_variable_write(&self, tok: TokenId) -> bool {
        self.tokens[tok.0 as usize]
            .flags
            .contains(TokenFlags::VARIABLE_WRITE)
    }

    pub fn is_assignment_op(&self, tok: TokenId) -> bool {
        self.tokens[tok.0 as usize]
            .flags
            .contains(TokenFlags::ASSIGNMENT_OP)
    }

    pub fn is_cast(&self, tok: TokenId) -> bool {
        self.tokens[tok.0 as usize].flags.contains(TokenFlags::CAST)
    }

    pub fn is_control_flow_keyword(&self, tok: TokenId) -> bool {
        self.tokens[tok.0 as usize]
            .flags
            .contains(TokenFlags::CONTROL_FLOW_KEYWORD)
    }

    pub fn is_binary_op(&self, tok: TokenId) -> bool {
        self.tokens[tok.0 as usize]
            .flags
            .contains(TokenFlags::BINARY_OP)
    }

    pub fn is_incomplete_var(&self, tok: TokenId) -> bool {
        self.tokens[tok.0 as usize]
            .flags
            .contains(TokenFlags::INCOMPLETE_VAR)
    }

    pub fn has_known_int_value(&self, tok: TokenId) -> bool {
        self.tokens[tok.0 as usize]
            .flags
            .contains(TokenFlags::HAS_KNOWN_INT_VALUE)
    }

    pub fn known_int_value(&self, tok: TokenId) -> i64 {
        self.tokens[tok.0 as usize].known_int_value
    }

    pub fn variable(&self, tok: TokenId) -> Option<VariableId> {
        self.tokens[tok.0 as usize].variable
    }

    /// `tok.index() < end.index()` with `end` possibly absent (run to EOF).
    pub fn precedes(&self, tok: TokenId, end: Option<TokenId>) -> bool {
        match end {
            Some(end) => tok.0 < end.0,
            None => (tok.0 as usize) < self.tokens.len(),
        }
    }

    /// The token one position after `tok`, if any.
    pub fn next(&self, tok: TokenId) -> Option<TokenId> {
        let n = tok.0 + 1;
        if (n as usize) < self.tokens.len() {
            Some(TokenId(n))
        } else {
            None
        }
    }

    pub fn previous(&self, tok: TokenId) -> Option<TokenId> {
        if tok.0 == 0 {
            None
        } else {
            Some(TokenId(tok.0 - 1))
        }
    }

    pub fn at(&self, tok: TokenId, offset: i32) -> Option<TokenId> {
        let idx = tok.0 as i64 + offset as i64;
        if idx < 0 || idx as usize >= self.tokens.len() {
            None
        } else {
            Some(TokenId(idx as u32))
        }
    }

    /// The token immediately after the rightmost leaf of `tok`'s AST subtree.
    pub fn next_after_ast_rightmost_leaf(&self, tok: TokenId) -> Option<TokenId> {
        let mut rightmost = tok;
        loop {
            let candidate = self
                .ast_operand2(rightmost)
                .or(self.ast_operand1(rightmost));
            match candidate {
                Some(child) if child.0 > rightmost.0 => rightmost = child,
                _ => break,
            }
        }
        // A linked bracket (call args, casts) can extend past the AST leaf.
        if let Some(link) = self.link(rightmost) {
            if link.0 > rightmost.0 {
                rightmost = link;
            }
        }
        self.next(rightmost)
    }
}

/// Builder used by callers (and tests) to assemble a `TokenList`. The core
/// engine never constructs tokens itself — it only observes them.
pub struct TokenListBuilder {
    tokens: Vec<TokenData>,
    scopes: ScopeList,
    header_parts: FxHashMap<TokenId, HeaderParts>,
}

impl TokenListBuilder {
    pub fn new() -> Self {
        Self {
            tokens: Vec::new(),
            scopes: ScopeList::new(),
            header_parts: FxHashMap::default(),
        }
    }

    pub fn push(&mut self, lexeme: impl Into<String>) -> TokenId {
        let id = TokenId(self.tokens.len() as u32);
        self.tokens.push(TokenData::new(lexeme));
        id
    }

    pub fn link(&mut self, a: TokenId, b: TokenId) -> &mut Self {
        self.tokens[a.0 as usize].link = Some(b);
        self.tokens[b.0 as usize].link = Some(a);
        self
    }

    pub fn ast_operand1(&mut self, tok: TokenId, operand: TokenId) -> &mut Self {
        self.tokens[tok.0 as usize].ast_operand1 = Some(operand);
        self.tokens[operand.0 as usize].ast_parent = Some(tok);
        self
    }

    pub fn ast_operand2(&mut self, tok: TokenId, operand: TokenId) -> &mut Self {
        self.tokens[tok.0 as usize].ast_operand2 = Some(operand);
        self.tokens[operand.0 as usize].ast_parent = Some(tok);
        self
    }

    pub fn flag(&mut self, tok: TokenId, flag: TokenFlags) -> &mut Self {
        self.tokens[tok.0 as usize].flags.insert(flag);
        self
    }

    pub fn known_int_value(&mut self, tok: TokenId, value: i64) -> &mut Self {
        self.tokens[tok.0 as usize].known_int_value = value;
        self.tokens[tok.0 as usize]
            .flags
            .insert(TokenFlags::HAS_KNOWN_INT_VALUE);
        self
    }

    pub fn variable(&mut self, tok: TokenId, var: VariableId) -> &mut Self {
        self.tokens[tok.0 as usize].variable = Some(var);
        self
    }

    /// Open a scope of `kind` whose body runs `[open, close]`, with `close`
    /// as its `bodyEnd`. Returns the `ScopeId` so callers can chain (e.g. an
    /// `if` scope followed by an `else` scope).
    pub fn scope(
        &mut self,
        kind: ScopeKind,
        open: TokenId,
        close: TokenId,
        parent: Option<ScopeId>,
    ) -> ScopeId {
        self.scope_with_header(kind, open, close, parent, None)
    }

    /// Like [`Self::scope`], additionally recording the `if`/`while`/`for`/
    /// `do`/`switch` keyword token this scope's header hangs off.
    pub fn scope_with_header(
        &mut self,
        kind: ScopeKind,
        open: TokenId,
        close: TokenId,
        parent: Option<ScopeId>,
        header: Option<TokenId>,
    ) -> ScopeId {
        let id = self.scopes.push(kind, close, parent, header);
        for i in open.0..=close.0 {
            self.tokens[i as usize].scope = Some(id);
        }
        id
    }

    /// Record the condition/init/step sub-expressions of an `if`/`while`/
    /// `for`/`do` header, keyed by its leading keyword token.
    pub fn header(
        &mut self,
        keyword: TokenId,
        cond: Option<TokenId>,
        init: Option<TokenId>,
        step: Option<TokenId>,
    ) -> &mut Self {
        self.header_parts
            .insert(keyword, HeaderParts { cond, init, step });
        self
    }

    pub fn build(self) -> TokenList {
        TokenList {
            tokens: self.tokens,
            scopes: self.scopes,
            header_parts: self.header_parts,
        }
    }
}

impl Default for TokenListBuilder {
    fn default() -> Self {
        Self::new()
    }
}
