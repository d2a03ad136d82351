// src/tests/router_tests/scrape_tests.rs

use crate::errors::ServerError;
use crate::responses::error_to_response;
use crate::router::handle;
use crate::tests::utils::{make_db, request, test_state};
use std::sync::atomic::Ordering;

#[test]
fn second_trigger_while_running_conflicts() {
    let state = test_state(make_db("scrape_conflict"));
    state.running.store(true, Ordering::SeqCst);

    let err = handle(request("POST", "/scrape"), &state).unwrap_err();
    assert!(matches!(err, ServerError::Conflict(_)));
    assert_eq!(error_to_response(err).status().as_u16(), 409);

    // The in-flight run still owns the flag.
    assert!(state.running.load(Ordering::SeqCst));
}

#[test]
fn malformed_agency_override_is_rejected() {
    let state = test_state(make_db("scrape_bad_agency"));

    let err = handle(request("POST", "/scrape?agency=not%20a%20url"), &state).unwrap_err();

    match err {
        ServerError::BadRequest(msg) => assert!(msg.contains("not a url")),
        other => panic!("expected BadRequest, got {other:?}"),
    }
    assert!(!state.running.load(Ordering::SeqCst));
}
