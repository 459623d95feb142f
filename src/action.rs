//! The `Action` bit-set (spec.md §3). Composition is union (`|`), which is
//! associative, commutative, and idempotent for free on a bitset — verified
//! in `tests/invariants.rs` rather than just asserted here.

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Action: u16 {
        const READ          = 1 << 0;
        const WRITE         = 1 << 1;
        const MODIFIED      = 1 << 2;
        const INCONCLUSIVE  = 1 << 3;
        const INVALID       = 1 << 4;
        const IDEMPOTENT    = 1 << 5;
        const INCREMENTAL   = 1 << 6;
    }
}

impl Action {
    pub fn is_none(self) -> bool {
        self.is_empty()
    }

    pub fn is_read(self) -> bool {
        self.contains(Action::READ)
    }

    pub fn is_write(self) -> bool {
        self.contains(Action::WRITE)
    }

    pub fn is_modified(self) -> bool {
        self.contains(Action::MODIFIED)
    }

    pub fn is_inconclusive(self) -> bool {
        self.contains(Action::INCONCLUSIVE)
    }

    pub fn is_invalid(self) -> bool {
        self.contains(Action::INVALID)
    }

    pub fn is_idempotent(self) -> bool {
        self.contains(Action::IDEMPOTENT)
    }

    pub fn is_incremental(self) -> bool {
        self.contains(Action::INCREMENTAL)
    }
}
