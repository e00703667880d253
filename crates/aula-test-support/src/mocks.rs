//! httpmock endpoints for the authentication flow.
//!
//! Every helper mounts under the `/api` prefix returned by [`api_base`], so a
//! client configured with that base URL exercises the same path joining as in
//! production.

use httpmock::prelude::*;
use httpmock::Mock;
use serde_json::{Value, json};

use crate::fixtures::token_pair_json;

/// API base URL for a mock server, including the `/api` prefix.
#[must_use]
pub fn api_base(server: &MockServer) -> String {
    format!("{}/api", server.base_url())
}

/// `POST /api/auth/login/` accepting one credential pair.
pub fn mock_login<'a>(
    server: &'a MockServer,
    username: &str,
    password: &str,
    access: &str,
    refresh: &str,
) -> Mock<'a> {
    let credentials = json!({"username": username, "password": password});
    let tokens = token_pair_json(access, refresh);
    server.mock(move |when, then| {
        when.method(POST)
            .path("/api/auth/login/")
            .json_body(credentials);
        then.status(200).json_body(tokens);
    })
}

/// `GET /api/auth/profile/` answering only for `bearer`.
pub fn mock_profile<'a>(server: &'a MockServer, bearer: &str, profile: Value) -> Mock<'a> {
    let authorization = format!("Bearer {bearer}");
    server.mock(move |when, then| {
        when.method(GET)
            .path("/api/auth/profile/")
            .header("authorization", authorization);
        then.status(200).json_body(profile);
    })
}

/// `POST /api/auth/refresh/` exchanging `refresh` for a new access token.
pub fn mock_refresh<'a>(server: &'a MockServer, refresh: &str, access: &str) -> Mock<'a> {
    let body = json!({"refresh": refresh});
    let grant = json!({"access": access});
    server.mock(move |when, then| {
        when.method(POST)
            .path("/api/auth/refresh/")
            .json_body(body);
        then.status(200).json_body(grant);
    })
}

/// `POST /api/auth/refresh/` rejecting `refresh` as expired.
pub fn mock_refresh_rejected<'a>(server: &'a MockServer, refresh: &str) -> Mock<'a> {
    let body = json!({"refresh": refresh});
    server.mock(move |when, then| {
        when.method(POST)
            .path("/api/auth/refresh/")
            .json_body(body);
        then.status(401).json_body(json!({
            "detail": "Token is invalid or expired",
            "code": "token_not_valid"
        }));
    })
}
