use bookshelf::{CollectionsExt, User};
use serde_json::{json, Value};

use crate::support::{dune, start_server, PASSWORD};

#[tokio::test]
async fn health_check() {
    let server = start_server().await;

    let resp = server.client.get(server.url("/health")).send().await.unwrap();
    assert_eq!(resp.status(), 200);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["ok"], true);
}

#[tokio::test]
async fn signup_then_login() {
    let server = start_server().await;

    let resp = server.signup("ann@example.com").await;
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "Sign up");

    let resp = server.login("ann@example.com", PASSWORD).await;
    assert_eq!(resp.status(), 200);

    let body: Value = resp.json().await.unwrap();
    assert!(!body["userId"].as_str().unwrap().is_empty());
    assert!(!body["token"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn duplicate_signup_is_rejected() {
    let server = start_server().await;
    assert_eq!(server.signup("ann@example.com").await.status(), 200);

    let resp = server.signup("ann@example.com").await;
    assert_eq!(resp.status(), 400);
    assert_eq!(resp.text().await.unwrap(), "Email already exists");

    let users = server.store.collection::<User>().all().unwrap();
    assert_eq!(users.len(), 1);
}

#[tokio::test]
async fn login_rejects_malformed_input() {
    let server = start_server().await;

    let resp = server.login("not-an-email", PASSWORD).await;
    assert_eq!(resp.status(), 400);
    assert_eq!(resp.text().await.unwrap(), "Invalid email or password");

    let resp = server.login("ann@example.com", "").await;
    assert_eq!(resp.status(), 400);

    let resp = server
        .client
        .post(server.url("/api/auth/login"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn login_with_unknown_email_or_wrong_password() {
    let server = start_server().await;
    server.signup("ann@example.com").await;

    let resp = server.login("bob@example.com", PASSWORD).await;
    assert_eq!(resp.status(), 401);
    assert_eq!(resp.text().await.unwrap(), "Wrong email");

    let resp = server.login("ann@example.com", "wrong").await;
    assert_eq!(resp.status(), 401);
    assert_eq!(resp.text().await.unwrap(), "Wrong pass");
}

#[tokio::test]
async fn protected_routes_need_a_valid_token() {
    let server = start_server().await;

    let resp = server
        .client
        .delete(server.url("/api/books/some-id"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    let resp = server.post_book("garbage.token.value", dune("Dune"), None).await;
    assert_eq!(resp.status(), 401);

    let resp = server
        .client
        .post(server.url("/api/books/some-id/rating"))
        .header("authorization", "Basic dXNlcjpwdw==")
        .json(&json!({ "rating": 4 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    assert!(server.books().await.is_empty());
}
