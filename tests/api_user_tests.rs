//! 用户 API 集成测试

use axum::http::StatusCode;
use serde_json::json;

mod common;
use common::{
    assert_unauthorized, create_test_app, empty_request, json_request, register,
    register_and_login, send,
};

fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

#[tokio::test]
async fn test_register_returns_public_fields() {
    let (app, _) = create_test_app();

    let body = register(&app, "A@X.com", "Alice", "longenough1").await;

    assert!(body["id"].is_string());
    assert_eq!(body["email"], "a@x.com");
    assert_eq!(body["name"], "Alice");
    assert!(body["created_at"].is_string());
    assert!(body.get("password_hash").is_none());
    assert!(body.get("pwd").is_none());
}

#[tokio::test]
async fn test_register_itemizes_validation_errors() {
    let (app, _) = create_test_app();

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/user",
            json!({ "email": "not-an-email", "name": "Al", "pwd": "short" }),
            None,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 400);
    assert_eq!(body["message"], "Bad Request");
    assert_eq!(
        body["errors"],
        json!([
            "invalid email",
            "name must be at least 3 characters",
            "password must be at least 8 characters"
        ])
    );
}

#[tokio::test]
async fn test_padded_short_name_is_bad_request() {
    let (app, _) = create_test_app();

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/user",
            json!({ "email": "a@x.com", "name": "  a  ", "pwd": "longenough1" }),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"], json!(["name must be at least 3 characters"]));

    let (id, token) = register_and_login(&app, "b@x.com", "Bob", "longenough2").await;
    let (status, body) = send(
        &app,
        json_request("PATCH", &format!("/user/{}", id), json!({ "name": "     " }), Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"], json!(["name must be at least 3 characters"]));

    let (_, body) = send(
        &app,
        empty_request("GET", &format!("/user/{}", id), Some(&bearer(&token))),
    )
    .await;
    assert_eq!(body["name"], "Bob");
}

#[tokio::test]
async fn test_register_missing_field_is_bad_request() {
    let (app, _) = create_test_app();

    let (status, body) = send(
        &app,
        json_request("POST", "/user", json!({ "email": "a@x.com", "name": "Alice" }), None),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 400);
    assert_eq!(body["errors"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_register_duplicate_email_conflicts() {
    let (app, _) = create_test_app();
    register(&app, "a@x.com", "Alice", "longenough1").await;

    // 大小写不同视为同一邮箱
    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/user",
            json!({ "email": "A@x.com", "name": "Another", "pwd": "longenough2" }),
            None,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], 409);
    assert_eq!(body["errors"], json!(["email already registered"]));
}

#[tokio::test]
async fn test_list_users_requires_token() {
    let (app, _) = create_test_app();
    register(&app, "a@x.com", "Alice", "longenough1").await;

    let (status, body) = send(&app, empty_request("GET", "/user", None)).await;
    assert_unauthorized(status, &body);
}

#[tokio::test]
async fn test_list_users() {
    let (app, _) = create_test_app();
    let (_, token) = register_and_login(&app, "a@x.com", "Alice", "longenough1").await;
    register(&app, "b@x.com", "Bob", "longenough2").await;

    let (status, body) = send(&app, empty_request("GET", "/user", Some(&bearer(&token)))).await;

    assert_eq!(status, StatusCode::OK);
    let users = body.as_array().unwrap();
    assert_eq!(users.len(), 2);
    assert!(users.iter().all(|u| u.get("password_hash").is_none()));
}

#[tokio::test]
async fn test_get_user() {
    let (app, _) = create_test_app();
    let (_, token) = register_and_login(&app, "a@x.com", "Alice", "longenough1").await;
    let bob = register(&app, "b@x.com", "Bob", "longenough2").await;
    let bob_id = bob["id"].as_str().unwrap();

    let (status, body) = send(
        &app,
        empty_request("GET", &format!("/user/{}", bob_id), Some(&bearer(&token))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Bob");

    let (status, body) = send(
        &app,
        empty_request(
            "GET",
            "/user/00000000-0000-0000-0000-000000000000",
            Some(&bearer(&token)),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], 404);

    let (status, body) = send(
        &app,
        empty_request("GET", "/user/not-a-uuid", Some(&bearer(&token))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"], json!(["invalid user id"]));
}

#[tokio::test]
async fn test_update_own_account() {
    let (app, _) = create_test_app();
    let (id, token) = register_and_login(&app, "a@x.com", "Alice", "longenough1").await;

    let (status, body) = send(
        &app,
        json_request("PATCH", &format!("/user/{}", id), json!({ "name": "Alicia" }), Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Alicia");
    assert_eq!(body["email"], "a@x.com");

    let (status, body) = send(
        &app,
        json_request("PATCH", &format!("/user/{}", id), json!({ "name": "Al" }), Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"], json!(["name must be at least 3 characters"]));

    let (status, body) = send(
        &app,
        json_request("PATCH", &format!("/user/{}", id), json!({}), Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"], json!(["nothing to update"]));
}

#[tokio::test]
async fn test_modify_other_account_forbidden() {
    let (app, _) = create_test_app();
    let (_, token) = register_and_login(&app, "a@x.com", "Alice", "longenough1").await;
    let bob = register(&app, "b@x.com", "Bob", "longenough2").await;
    let bob_id = bob["id"].as_str().unwrap();

    let (status, body) = send(
        &app,
        json_request(
            "PATCH",
            &format!("/user/{}", bob_id),
            json!({ "name": "Mallory" }),
            Some(&token),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], 403);

    let (status, _) = send(
        &app,
        empty_request("DELETE", &format!("/user/{}", bob_id), Some(&bearer(&token))),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // 目标账户保持不变
    let (status, body) = send(
        &app,
        empty_request("GET", &format!("/user/{}", bob_id), Some(&bearer(&token))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Bob");
}

#[tokio::test]
async fn test_delete_own_account() {
    let (app, _) = create_test_app();
    let (id, token) = register_and_login(&app, "a@x.com", "Alice", "longenough1").await;

    let (status, body) = send(
        &app,
        empty_request("DELETE", &format!("/user/{}", id), Some(&bearer(&token))),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_null());

    let (status, _) = send(
        &app,
        empty_request("GET", &format!("/user/{}", id), Some(&bearer(&token))),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // 邮箱释放后可以重新注册
    register(&app, "a@x.com", "Alice", "longenough1").await;
}

#[tokio::test]
async fn test_mutations_require_token() {
    let (app, _) = create_test_app();
    let (id, _) = register_and_login(&app, "a@x.com", "Alice", "longenough1").await;

    let (status, body) = send(
        &app,
        json_request("PATCH", &format!("/user/{}", id), json!({ "name": "Alicia" }), None),
    )
    .await;
    assert_unauthorized(status, &body);

    let (status, body) = send(&app, empty_request("DELETE", &format!("/user/{}", id), None)).await;
    assert_unauthorized(status, &body);
}
