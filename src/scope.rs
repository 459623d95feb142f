//! Scope classification (`If`, `Else`, `For`, ..., `Class`), the Rust
//! rendition of `symboldatabase.h`'s `Scope`/`ScopeType`.

use crate::token::TokenId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeKind {
    If,
    Else,
    For,
    While,
    Do,
    Switch,
    Try,
    Catch,
    Lambda,
    Class,
    Other,
}

impl ScopeKind {
    pub fn is_loop(self) -> bool {
        matches!(self, ScopeKind::Do | ScopeKind::For | ScopeKind::While)
    }

    pub fn is_class_or_struct(self) -> bool {
        matches!(self, ScopeKind::Class)
    }
}

struct ScopeData {
    kind: ScopeKind,
    body_end: TokenId,
    parent: Option<ScopeId>,
    /// The `if`/`while`/`for`/`do`/`switch` keyword token this scope's header
    /// hangs off, if any (`None` for `Else`/`Try`/`Catch`/`Lambda`/`Class`).
    header: Option<TokenId>,
}

pub(crate) struct ScopeList {
    scopes: Vec<ScopeData>,
}

impl ScopeList {
    pub fn new() -> Self {
        Self { scopes: Vec::new() }
    }

    pub fn push(
        &mut self,
        kind: ScopeKind,
        body_end: TokenId,
        parent: Option<ScopeId>,
        header: Option<TokenId>,
    ) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(ScopeData {
            kind,
            body_end,
            parent,
            header,
        });
        id
    }

    pub fn kind(&self, id: ScopeId) -> ScopeKind {
        self.scopes[id.0 as usize].kind
    }

    pub fn body_end(&self, id: ScopeId) -> Option<TokenId> {
        Some(self.scopes[id.0 as usize].body_end)
    }

    pub fn parent(&self, id: ScopeId) -> Option<ScopeId> {
        self.scopes[id.0 as usize].parent
    }

    pub fn header(&self, id: ScopeId) -> Option<TokenId> {
        self.scopes[id.0 as usize].header
    }

    /// Linear scan for the scope directly opened by `header` whose `kind`
    /// matches `kind` (an `if` keyword opens exactly one `If` scope and,
    /// separately, may be recorded as the `header` of a sibling `Else`
    /// scope — the `kind` filter disambiguates).
    pub fn find_by_header(&self, header: TokenId, kind: ScopeKind) -> Option<ScopeId> {
        self.scopes
            .iter()
            .position(|s| s.header == Some(header) && s.kind == kind)
            .map(|i| ScopeId(i as u32))
    }
}
