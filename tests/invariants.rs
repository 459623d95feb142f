//! Invariants and round-trip laws (spec.md §8).

mod common;

use common::{
    build_assignment, build_if_else, build_range_for_empty, build_short_circuit, no_escapes,
    settings, TrackingAnalyzer,
};
use fdte::{forward_expression, forward_range, Action};

#[test]
fn action_union_is_associative_commutative_idempotent() {
    let a = Action::READ;
    let b = Action::WRITE;
    let c = Action::MODIFIED;
    assert_eq!((a | b) | c, a | (b | c));
    assert_eq!(a | b, b | a);
    assert_eq!(a | a, a);
}

#[test]
fn forward_range_is_deterministic_across_identical_analyzer_state() {
    // Speculative forks never share mutable state with their parent, so two
    // runs seeded with an observationally-equal Analyzer must agree.
    let (tokens, start, end) = build_if_else();
    let lib = no_escapes();
    let s = settings(&lib);
    let first = fdte::forward_range(
        start,
        end,
        TrackingAnalyzer::new(None),
        &tokens,
        &fdte::TracingErrorLogger,
        &s,
    )
    .unwrap();
    let second = fdte::forward_range(
        start,
        end,
        TrackingAnalyzer::new(None),
        &tokens,
        &fdte::TracingErrorLogger,
        &s,
    )
    .unwrap();
    assert_eq!(first, second);
}

#[test]
fn stop_updates_is_idempotent() {
    // `Traversal::stop_updates` is `pub(crate)` and unreachable from an
    // integration test; its literal idempotency is unit-tested alongside its
    // definition in `src/traversal/bridge.rs`. Here we check the externally
    // observable corollary: a conditional Analyzer whose escaping `if` arm
    // triggers `stop_updates` behaves identically across repeated runs, i.e.
    // the flip to analyze-only never leaks a different outcome on replay.
    let (tokens, start, end) = common::build_if_return();
    let lib = no_escapes();
    let s = settings(&lib);
    let mut analyzer = TrackingAnalyzer::new(None);
    analyzer.conditional = true;
    let first = forward_range(start, end, analyzer.clone(), &tokens, &fdte::TracingErrorLogger, &s).unwrap();
    let second = forward_range(start, end, analyzer, &tokens, &fdte::TracingErrorLogger, &s).unwrap();
    assert_eq!(first, second);
}

#[test]
fn actions_returned_equal_union_of_observed_actions() {
    let (tokens, start, end) = build_if_else();
    let lib = no_escapes();
    let s = settings(&lib);
    let analyzer = TrackingAnalyzer::new(None);
    let (action, _terminate) =
        fdte::forward_range(start, end, analyzer, &tokens, &fdte::TracingErrorLogger, &s).unwrap();
    assert!(action.is_write() || action.is_none());
}

#[test]
fn assignment_evaluates_rhs_strictly_before_lhs() {
    let (tokens, start, end, a, b) = build_assignment();
    let lib = no_escapes();
    let s = settings(&lib);
    let analyzer = TrackingAnalyzer::new(None);
    let visited = analyzer.visited.clone();
    forward_range(start, end, analyzer, &tokens, &fdte::TracingErrorLogger, &s).unwrap();
    let visited = visited.borrow();
    let a_pos = visited.iter().position(|&t| t == a).expect("a was visited");
    let b_pos = visited.iter().position(|&t| t == b).expect("b was visited");
    assert!(b_pos < a_pos, "expected b delivered before a, got {:?}", *visited);
}

#[test]
fn short_circuit_suppresses_the_right_operand() {
    let (tokens, root, q) = build_short_circuit();
    let lib = no_escapes();
    let s = settings(&lib);
    let analyzer = TrackingAnalyzer::new(Some(0));
    let visited = analyzer.visited.clone();
    forward_expression(root, analyzer, &tokens, &fdte::TracingErrorLogger, &s).unwrap();
    assert!(!visited.borrow().contains(&q));
}

#[test]
fn range_for_with_empty_container_delivers_no_body_tokens() {
    let (tokens, start, end) = build_range_for_empty();
    let lib = no_escapes();
    let s = settings(&lib);
    let mut analyzer = TrackingAnalyzer::new(None);
    analyzer.container_empty = Some(true);
    let visited = analyzer.visited.clone();
    let (action, _terminate) =
        forward_range(start, end, analyzer, &tokens, &fdte::TracingErrorLogger, &s).unwrap();
    assert!(action.is_none());
    assert!(visited.borrow().is_empty());
}
