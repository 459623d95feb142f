//! Configuration consumed by the engine (spec.md §6): the escape-function
//! classifier and the forward-branch limit, plus the cooperative external
//! termination flag from spec.md §5.

use std::sync::atomic::{AtomicBool, Ordering};

/// The "library-database that classifies escape functions" (out of scope as
/// an implementation, §1) — the engine only consumes this interface.
pub trait EscapeLibrary {
    /// Is a call to `name` equivalent in control-flow effect to a
    /// `return`/`throw` (e.g. `exit`, `abort`)?
    fn is_escape_function(&self, name: &str) -> bool;
}

/// An `EscapeLibrary` that never classifies anything as an escape function.
/// Useful for callers/tests that don't care about library-based escapes.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoEscapes;

impl EscapeLibrary for NoEscapes {
    fn is_escape_function(&self, _name: &str) -> bool {
        false
    }
}

pub struct Settings<'a> {
    pub library: &'a dyn EscapeLibrary,
    /// 0 = unlimited.
    pub max_forward_branches: u32,
    terminated: &'a AtomicBool,
}

impl<'a> Settings<'a> {
    pub fn new(library: &'a dyn EscapeLibrary, max_forward_branches: u32) -> Self {
        static NOT_TERMINATED: AtomicBool = AtomicBool::new(false);
        Self {
            library,
            max_forward_branches,
            terminated: &NOT_TERMINATED,
        }
    }

    pub fn with_terminated_flag(mut self, flag: &'a AtomicBool) -> Self {
        self.terminated = flag;
        self
    }

    pub fn terminated(&self) -> bool {
        self.terminated.load(Ordering::Relaxed)
    }
}
