use crate::token::TokenId;

/// Failure modes that propagate to the caller untouched (spec.md §7),
/// distinct from `Terminate` (which is a *decision*, not an error).
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The cyclic-AST guard fired: a token's index did not strictly increase
    /// within a straight run of the Range Driver.
    #[error("cyclic forward analysis at token {token}")]
    Internal { token: TokenId },
    /// `Settings::terminated()` was observed set; only raised from the
    /// expression entry point (and, as an additive safety net, from the
    /// range entry point — see SPEC_FULL.md §5).
    #[error("analysis terminated externally")]
    Terminated,
}
