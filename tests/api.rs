//! End-to-end behaviour of the request pipeline through the real router.

mod common;

use axum::http::{header, Method, StatusCode};
use common::{TestClient, CSRF_COOKIE, SESSION_COOKIE};
use serde_json::json;
use todo_api::db::{todos, users};

#[tokio::test]
async fn health_runs_on_standard_chain_only() {
    let mut client = TestClient::new().await;
    let response = client.get("/health").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["status"], "healthy");
    assert_eq!(response.headers[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
    assert_eq!(response.headers[header::X_FRAME_OPTIONS], "deny");
    assert_eq!(
        response.headers[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "http://localhost:3000"
    );
    assert!(response.set_cookie(SESSION_COOKIE).is_none());
    assert!(response.set_cookie(CSRF_COOKIE).is_none());
}

#[tokio::test]
async fn csrf_token_endpoint_matches_cookie() {
    let mut client = TestClient::new().await;
    let response = client.get("/api/csrf-token").await;

    assert_eq!(response.status, StatusCode::OK);
    let token = response.json()["csrf_token"].as_str().unwrap().to_string();
    assert!(!token.is_empty());
    assert_eq!(response.set_cookie(CSRF_COOKIE).as_deref(), Some(token.as_str()));

    let raw = response
        .headers
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .find(|v| v.starts_with("csrf_token="))
        .unwrap();
    assert!(raw.contains("HttpOnly"));
    assert!(raw.contains("Secure"));
    assert!(raw.contains("Path=/"));

    // A second call reuses the cookie instead of issuing a new one.
    let again = client.get("/api/csrf-token").await;
    assert_eq!(again.json()["csrf_token"], token.as_str());
    assert!(again.set_cookie(CSRF_COOKIE).is_none());
}

#[tokio::test]
async fn signup_returns_uuid_and_email() {
    let mut client = TestClient::new().await;
    client.prime_csrf().await;

    let response = client.signup("Ann", "ann@example.com", "longenough").await;
    assert_eq!(response.status, StatusCode::OK);

    let body = response.json();
    assert!(!body["uuid"].as_str().unwrap().is_empty());
    assert_eq!(body["email"], "ann@example.com");
    assert_eq!(body["flash"], "Your signup was successful. Please log in.");
}

#[tokio::test]
async fn duplicate_signup_is_a_field_error() {
    let mut client = TestClient::new().await;
    client.prime_csrf().await;

    client.signup("Ann", "ann@example.com", "longenough").await;
    let response = client.signup("Ann", "ann@example.com", "longenough").await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json()["email"], "Email address is already in use");
}

#[tokio::test]
async fn invalid_signup_never_reaches_storage() {
    let mut client = TestClient::new().await;
    client.prime_csrf().await;

    let response = client.signup("", "not-an-email", "short").await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let body = response.json();
    assert_eq!(body["name"], "This field cannot be blank");
    assert_eq!(body["email"], "This field must be a valid email address");
    assert_eq!(body["password"], "This field must be at least 8 characters long");

    let found = users::authenticate(&client.state.db, "not-an-email", "short")
        .await
        .unwrap();
    assert!(found.is_none());
}

#[tokio::test]
async fn login_rotates_session_token() {
    let mut client = TestClient::new().await;
    client.prime_csrf().await;
    client.signup("Ann", "ann@example.com", "longenough").await;

    // Give the client an anonymous session first.
    client.cookies.insert(SESSION_COOKIE.into(), "planted-by-attacker".into());
    let before = client.cookie(SESSION_COOKIE);

    let response = client.login("ann@example.com", "longenough").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["email"], "ann@example.com");
    assert_eq!(response.json()["flash"], "Login successful!");

    let after = response.set_cookie(SESSION_COOKIE).expect("session cookie issued");
    assert_ne!(Some(after.clone()), before);

    let session = client.get("/api/user/session").await.json();
    assert_eq!(session["authenticated"], true);
}

#[tokio::test]
async fn session_info_reports_the_logged_in_user() {
    let mut client = TestClient::new().await;
    assert_eq!(
        client.get("/api/user/session").await.json(),
        json!({ "authenticated": false })
    );

    client.prime_csrf().await;
    let uuid = client.signup("Ann", "ann@example.com", "longenough").await.json()["uuid"].clone();
    client.login("ann@example.com", "longenough").await;

    let session = client.get("/api/user/session").await.json();
    assert_eq!(
        session,
        json!({
            "authenticated": true,
            "user_id": uuid,
            "name": "Ann",
            "email": "ann@example.com"
        })
    );
}

#[tokio::test]
async fn relogin_invalidates_the_previous_token() {
    let mut client = TestClient::logged_in().await;
    let first = client.cookie(SESSION_COOKIE).unwrap();

    client.login("ann@example.com", "longenough").await;
    let second = client.cookie(SESSION_COOKIE).unwrap();
    assert_ne!(first, second);

    // Replaying the old token gets an anonymous session.
    client.cookies.insert(SESSION_COOKIE.into(), first);
    let response = client.get("/api/todo").await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn wrong_password_is_401_without_rotation() {
    let mut client = TestClient::logged_in().await;
    let before = client.cookie(SESSION_COOKIE);

    let response = client.login("ann@example.com", "wrong-password").await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.json()["non_field_errors"],
        json!(["Email or password is incorrect"])
    );
    assert!(response.set_cookie(SESSION_COOKIE).is_none());
    assert_eq!(client.cookie(SESSION_COOKIE), before);
}

#[tokio::test]
async fn unknown_email_looks_like_wrong_password() {
    let mut client = TestClient::new().await;
    client.prime_csrf().await;

    let response = client.login("nobody@example.com", "longenough").await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.json(),
        json!({ "non_field_errors": ["Email or password is incorrect"] })
    );
}

#[tokio::test]
async fn logout_rotates_token_and_forgets_user() {
    let mut client = TestClient::logged_in().await;
    let before = client.cookie(SESSION_COOKIE).unwrap();

    let response = client.post("/api/user/logout", json!({})).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["flash"], "You've been logged out successfully!");

    let after = response.set_cookie(SESSION_COOKIE).expect("session cookie issued");
    assert_ne!(after, before);

    let session = client.get("/api/user/session").await.json();
    assert_eq!(session["authenticated"], false);
    assert_eq!(client.get("/api/todo").await.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn protected_route_without_session_is_401_and_handler_skipped() {
    let mut client = TestClient::new().await;
    client.prime_csrf().await;

    let response = client.post("/api/todo", json!({ "body": "sneaky" })).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.json(),
        json!({
            "status": "401 Unauthorized",
            "message": "You must be logged in to access this resource"
        })
    );
    assert!(todos::all(&client.state.db).await.unwrap().is_empty());
}

#[tokio::test]
async fn protected_responses_are_not_cacheable() {
    let mut client = TestClient::logged_in().await;
    let response = client.get("/api/todo").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.headers[header::CACHE_CONTROL], "no-store");
}

#[tokio::test]
async fn missing_csrf_value_is_rejected_before_handler() {
    let mut client = TestClient::logged_in().await;
    client.send_csrf = false;

    let response = client.post("/api/todo", json!({ "body": "forged" })).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.json()["status"], "403 Forbidden");
    assert!(todos::all(&client.state.db).await.unwrap().is_empty());
}

#[tokio::test]
async fn mismatched_csrf_value_is_rejected() {
    let mut client = TestClient::logged_in().await;
    client.send_csrf = false;

    let response = client
        .request(Method::POST, "/api/todo", Some(json!({ "body": "forged", "csrf_token": "guess" })))
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert!(todos::all(&client.state.db).await.unwrap().is_empty());
}

#[tokio::test]
async fn csrf_value_in_json_body_is_accepted() {
    let mut client = TestClient::logged_in().await;
    client.send_csrf = false;
    let token = client.cookie(CSRF_COOKIE).unwrap();

    let response = client
        .request(Method::POST, "/api/todo", Some(json!({ "body": "legit", "csrf_token": token })))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["body"], "legit");
}

#[tokio::test]
async fn post_without_any_csrf_cookie_is_rejected_but_gets_one() {
    let mut client = TestClient::new().await;

    let response = client.signup("Ann", "ann@example.com", "longenough").await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert!(response.set_cookie(CSRF_COOKIE).is_some());

    // With the freshly issued cookie echoed back, the retry goes through.
    let retry = client.signup("Ann", "ann@example.com", "longenough").await;
    assert_eq!(retry.status, StatusCode::OK);
}

#[tokio::test]
async fn deleted_user_session_is_demoted() {
    let mut client = TestClient::logged_in().await;
    let user_id = client.get("/api/user/session").await.json()["user_id"]
        .as_str()
        .unwrap()
        .to_string();

    users::delete(&client.state.db, &user_id).await.unwrap();

    let response = client.get("/api/todo").await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let session = client.get("/api/user/session").await.json();
    assert_eq!(session["authenticated"], false);
    assert!(session.get("user_id").is_none());
}

#[tokio::test]
async fn todo_crud_through_the_pipeline() {
    let mut client = TestClient::logged_in().await;

    let created = client.post("/api/todo", json!({ "body": "buy milk" })).await;
    assert_eq!(created.status, StatusCode::OK);
    assert_eq!(created.json()["flash"], "Todo has been created.");
    let id = created.json()["id"].as_str().unwrap().to_string();

    let updated = client
        .request(Method::PUT, &format!("/api/todo/{id}"), Some(json!({ "body": "buy oat milk" })))
        .await;
    assert_eq!(updated.json()["body"], "buy oat milk");

    let toggled = client
        .request(Method::PATCH, &format!("/api/todo/{id}/toggle"), None)
        .await;
    assert_eq!(toggled.json()["done"], true);

    let viewed = client.get(&format!("/api/todo/{id}")).await;
    assert_eq!(viewed.json()["body"], "buy oat milk");

    let deleted = client
        .request(Method::DELETE, &format!("/api/todo/{id}"), None)
        .await;
    assert_eq!(deleted.status, StatusCode::OK);

    let missing = client.get(&format!("/api/todo/{id}")).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    assert_eq!(missing.body, "Not Found");
}

#[tokio::test]
async fn blank_todo_is_rejected_with_field_error() {
    let mut client = TestClient::logged_in().await;

    let response = client.post("/api/todo", json!({ "body": "  " })).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json(), json!({ "body": "This field cannot be blank" }));
}

#[tokio::test]
async fn unknown_path_is_404_not_401() {
    let mut client = TestClient::new().await;
    let response = client.get("/api/nope").await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.headers[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
    assert!(response.set_cookie(SESSION_COOKIE).is_none());
}

#[tokio::test]
async fn mistyped_body_is_a_uniform_400() {
    let mut client = TestClient::logged_in().await;

    let response = client.post("/api/todo", json!({ "body": 5 })).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json(), json!({ "error": "Bad request" }));
    assert!(todos::all(&client.state.db).await.unwrap().is_empty());

    let response = client.post("/api/user/login", json!(["not", "an", "object"])).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json(), json!({ "error": "Bad request" }));
}
