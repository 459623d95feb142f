//! Public entry points (spec.md §6): the only way a caller drives the engine.

use crate::action::Action;
use crate::analyzer::Analyzer;
use crate::error::EngineError;
use crate::logger::ErrorLogger;
use crate::settings::Settings;
use crate::terminate::Terminate;
use crate::token::{TokenId, TokenList};
use crate::traversal::Traversal;

/// `forwardRange`: walk `[start, end)`. Primes the Analyzer with
/// `updateState(start)`; an `analyzer.invalid()` Analyzer bails immediately.
pub fn forward_range<A: Analyzer>(
    start: TokenId,
    end: TokenId,
    analyzer: A,
    tokens: &TokenList,
    logger: &dyn ErrorLogger,
    settings: &Settings,
) -> Result<(Action, Terminate), EngineError> {
    if settings.terminated() {
        return Err(EngineError::Terminated);
    }
    let mut traversal = Traversal::new(analyzer, tokens, logger, settings);
    if traversal.analyzer().invalid() {
        return Ok((Action::empty(), Terminate::Bail));
    }
    traversal.update_state(start);
    traversal.update_range(start, end, i32::MAX)?;
    Ok((traversal.actions(), traversal.terminate()))
}

/// `forwardExpression`: walk a single expression rooted at `start` (AST
/// recursion only, no structural dispatch). Polls `Settings::terminated()`.
pub fn forward_expression<A: Analyzer>(
    start: TokenId,
    analyzer: A,
    tokens: &TokenList,
    logger: &dyn ErrorLogger,
    settings: &Settings,
) -> Result<(Action, Terminate), EngineError> {
    if settings.terminated() {
        return Err(EngineError::Terminated);
    }
    let mut traversal = Traversal::new(analyzer, tokens, logger, settings);
    if traversal.analyzer().invalid() {
        return Ok((Action::empty(), Terminate::Bail));
    }
    traversal.update_state(start);
    traversal.traverse_recursive(start, 0);
    Ok((traversal.actions(), traversal.terminate()))
}
