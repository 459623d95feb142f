//! Concrete scenarios (spec.md §8).

mod common;

use common::{
    build_do_while_false, build_if_else, build_if_return, build_range_for_empty, build_switch,
    build_while_reenter, no_escapes, settings, TrackingAnalyzer,
};
use fdte::{forward_range, Terminate};

#[test]
fn if_else_unknown_condition_walks_both_arms_and_reports_modified() {
    let (tokens, start, end) = build_if_else();
    let lib = no_escapes();
    let s = settings(&lib);
    let analyzer = TrackingAnalyzer::new(None);
    let (action, terminate) = forward_range(start, end, analyzer, &tokens, &fdte::TracingErrorLogger, &s).unwrap();
    assert!(action.is_write());
    assert!(matches!(terminate, Terminate::Modified | Terminate::Bail));
}

#[test]
fn if_return_then_arm_escapes_and_assumes_condition_false_after() {
    let (tokens, start, end) = build_if_return();
    let lib = no_escapes();
    let s = settings(&lib);
    let analyzer = TrackingAnalyzer::new(None);
    let (_action, terminate) = forward_range(start, end, analyzer, &tokens, &fdte::TracingErrorLogger, &s).unwrap();
    // The then-arm conclusively escapes (a bare `return`); the engine should
    // not report Modified from an escape alone.
    assert_ne!(terminate, Terminate::Modified);
}

#[test]
fn do_while_false_is_straightlined_not_treated_as_a_loop() {
    let (tokens, start, end) = build_do_while_false();
    let lib = no_escapes();
    let s = settings(&lib);
    let analyzer = TrackingAnalyzer::new(None);
    let (_action, terminate) = forward_range(start, end, analyzer, &tokens, &fdte::TracingErrorLogger, &s).unwrap();
    assert_ne!(terminate, Terminate::Bail);
}

#[test]
fn while_loop_lowers_to_possible_then_bails_on_reenter() {
    let (tokens, start, end) = build_while_reenter();
    let lib = no_escapes();
    let s = settings(&lib);
    let analyzer = TrackingAnalyzer::new(None);
    let (action, terminate) = forward_range(start, end, analyzer, &tokens, &fdte::TracingErrorLogger, &s).unwrap();
    assert!(action.is_write());
    assert_eq!(terminate, Terminate::Bail);
}

#[test]
fn range_for_with_known_empty_container_skips_body() {
    let (tokens, start, end) = build_range_for_empty();
    let lib = no_escapes();
    let s = settings(&lib);
    let mut analyzer = TrackingAnalyzer::new(None);
    analyzer.container_empty = Some(true);
    let (action, terminate) = forward_range(start, end, analyzer, &tokens, &fdte::TracingErrorLogger, &s).unwrap();
    assert!(action.is_none());
    assert_eq!(terminate, Terminate::None);
}

#[test]
fn switch_walks_selector_then_bails_with_write() {
    let (tokens, start, end) = build_switch();
    let lib = no_escapes();
    let s = settings(&lib);
    let analyzer = TrackingAnalyzer::new(None);
    let (action, terminate) = forward_range(start, end, analyzer, &tokens, &fdte::TracingErrorLogger, &s).unwrap();
    assert!(action.is_write());
    assert_eq!(terminate, Terminate::Bail);
}

#[test]
fn invalid_analyzer_bails_immediately() {
    let (tokens, start, end) = build_if_else();
    let lib = no_escapes();
    let s = settings(&lib);
    let mut analyzer = TrackingAnalyzer::new(None);
    analyzer.is_invalid = true;
    let (action, terminate) = forward_range(start, end, analyzer, &tokens, &fdte::TracingErrorLogger, &s).unwrap();
    assert!(action.is_none());
    assert_eq!(terminate, Terminate::Bail);
}
