// src/tests/router_tests/health_tests.rs

use crate::errors::ServerError;
use crate::responses::error_to_response;
use crate::router::handle;
use crate::tests::utils::{body_json, make_db, request, test_state};

#[test]
fn health_reports_ok() {
    let state = test_state(make_db("health"));

    let mut resp = handle(request("GET", "/health"), &state).unwrap();

    assert_eq!(resp.status().as_u16(), 200);
    assert_eq!(body_json(&mut resp)["status"], "ok");
}

#[test]
fn unknown_route_is_a_json_404() {
    let state = test_state(make_db("unknown_route"));

    let err = handle(request("GET", "/dashboard"), &state).unwrap_err();
    assert!(matches!(err, ServerError::NotFound));

    let mut resp = error_to_response(err);
    assert_eq!(resp.status().as_u16(), 404);
    assert_eq!(body_json(&mut resp)["error"], "Not Found");
}

#[test]
fn wrong_method_is_not_routed() {
    let state = test_state(make_db("wrong_method"));

    let err = handle(request("GET", "/scrape"), &state).unwrap_err();
    assert!(matches!(err, ServerError::NotFound));
}
