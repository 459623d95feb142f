//! The one diagnostic the engine ever emits (spec.md §6/§7): the
//! branch-limit information report. `ErrorLogger` is a trait object the
//! caller plugs a sink into, mirroring `original_source`'s
//! `ErrorLogger& errorLogger` collaborator parameter.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Information,
}

#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub id: &'static str,
    pub message: &'static str,
}

pub const MAX_BRANCHES_DIAGNOSTIC: Diagnostic = Diagnostic {
    severity: Severity::Information,
    id: "normalCheckLevelMaxBranches",
    message: "Limiting analysis of branches. Use --check-level=exhaustive to analyze all branches.",
};

pub trait ErrorLogger {
    fn report(&self, diagnostic: &Diagnostic);
}

/// Default sink: forwards the one allowed diagnostic through `tracing`,
/// the same structured-logging crate `surrealdb` uses at this scale.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingErrorLogger;

impl ErrorLogger for TracingErrorLogger {
    fn report(&self, diagnostic: &Diagnostic) {
        tracing::info!(id = diagnostic.id, message = diagnostic.message, "fdte diagnostic");
    }
}
