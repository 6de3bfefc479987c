mod support;

use axum::http::{StatusCode, header};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::json;

use support::{
    PASSWORD, TINY_PNG, TestApp, body_json, body_text, empty_request, json_request,
    multipart_request, session_cookie,
};

#[tokio::test]
async fn login_sets_session_and_me_reports_identity() {
    let app = TestApp::new().await;

    let cookie = app.login("alice").await;
    let response = app
        .send(empty_request("GET", "/api/auth/me", Some(&cookie)))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["username"], "alice");
    assert_eq!(body["role"], "user");
    assert_eq!(body["id"], app.alice.id.to_string());
}

#[tokio::test]
async fn login_rejects_wrong_password() {
    let app = TestApp::new().await;

    let response = app
        .send(json_request(
            "POST",
            "/api/auth/login",
            None,
            json!({ "username": "alice", "password": "not-it" }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(session_cookie(&response).is_none());

    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "invalid_credentials");
    assert_eq!(body["error"]["message"], "Invalid username or password");
}

#[tokio::test]
async fn login_requires_both_fields() {
    let app = TestApp::new().await;

    let response = app
        .send(json_request(
            "POST",
            "/api/auth/login",
            None,
            json!({ "username": "alice" }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn repeated_logins_are_throttled_per_username() {
    let app = TestApp::with_login_limit(2).await;
    let bad = json!({ "username": "alice", "password": "wrong-password" });

    for _ in 0..2 {
        let response = app
            .send(json_request("POST", "/api/auth/login", None, bad.clone()))
            .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    let response = app
        .send(json_request("POST", "/api/auth/login", None, bad))
        .await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers().contains_key(header::RETRY_AFTER));
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "rate_limited");

    // Another account still gets through.
    app.login("bob").await;
}

#[tokio::test]
async fn api_requires_a_session() {
    let app = TestApp::new().await;

    for uri in ["/api/auth/me", "/api/admin/users", "/api/user/posts"] {
        let response = app.send(empty_request("GET", uri, None)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "unauthorized");
    }
}

#[tokio::test]
async fn forged_cookies_are_ignored() {
    let app = TestApp::new().await;

    let response = app
        .send(empty_request(
            "GET",
            "/api/auth/me",
            Some("session={\"id\":\"00000000-0000-0000-0000-000000000000\",\"role\":\"admin\",\"username\":\"x\"}"),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn roles_gate_their_api_prefixes() {
    let app = TestApp::new().await;
    let admin = app.login("admin").await;
    let alice = app.login("alice").await;

    let response = app
        .send(empty_request("GET", "/api/admin/users", Some(&alice)))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .send(empty_request("GET", "/api/user/posts", Some(&admin)))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .send(empty_request("GET", "/api/admin/users", Some(&admin)))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body.as_array().map(Vec::len), Some(3));
}

#[tokio::test]
async fn logout_clears_the_cookie() {
    let app = TestApp::new().await;
    let cookie = app.login("alice").await;

    let response = app
        .send(empty_request("POST", "/api/auth/logout", Some(&cookie)))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let cleared = response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .any(|value| value.starts_with("session=") && value.contains("Max-Age=0"));
    assert!(cleared);

    let body = body_json(response).await;
    assert_eq!(body["message"], "Logged out");
}

#[tokio::test]
async fn admin_manages_users() {
    let app = TestApp::new().await;
    let admin = app.login("admin").await;

    let response = app
        .send(json_request(
            "POST",
            "/api/admin/users",
            Some(&admin),
            json!({ "username": "carol", "role": "user" }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let carol = body_json(response).await;
    assert_eq!(carol["username"], "carol");
    assert!(carol.get("password_hash").is_none());
    let carol_id = carol["id"].as_str().expect("id").to_string();

    // New accounts start with the default password.
    app.login("carol").await;

    let response = app
        .send(json_request(
            "POST",
            "/api/admin/users",
            Some(&admin),
            json!({ "username": "carol", "role": "admin" }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app
        .send(json_request(
            "PATCH",
            &format!("/api/admin/users/{carol_id}"),
            Some(&admin),
            json!({ "role": "admin" }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["role"], "admin");

    let response = app
        .send(json_request(
            "PATCH",
            &format!("/api/admin/users/{carol_id}"),
            Some(&admin),
            json!({}),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .send(empty_request(
            "DELETE",
            &format!("/api/admin/users/{carol_id}"),
            Some(&admin),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .send(empty_request(
            "GET",
            &format!("/api/admin/users/{carol_id}"),
            Some(&admin),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn demoted_or_deleted_accounts_lose_their_sessions() {
    let app = TestApp::new().await;
    let admin = app.login("admin").await;

    let response = app
        .send(json_request(
            "POST",
            "/api/admin/users",
            Some(&admin),
            json!({ "username": "dora", "role": "admin" }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let dora_id = body_json(response).await["id"]
        .as_str()
        .expect("id")
        .to_string();
    let dora = app.login("dora").await;

    let response = app
        .send(empty_request("GET", "/api/admin/users", Some(&dora)))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .send(json_request(
            "PATCH",
            &format!("/api/admin/users/{dora_id}"),
            Some(&admin),
            json!({ "role": "user" }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    // Same cookie, current role.
    let response = app
        .send(empty_request("GET", "/api/admin/users", Some(&dora)))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let response = app
        .send(empty_request("GET", "/dashboard/admin", Some(&dora)))
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let response = app
        .send(empty_request("GET", "/api/auth/me", Some(&dora)))
        .await;
    assert_eq!(body_json(response).await["role"], "user");

    let response = app
        .send(empty_request(
            "DELETE",
            &format!("/api/admin/users/{dora_id}"),
            Some(&admin),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    for uri in ["/api/auth/me", "/api/user/posts"] {
        let response = app.send(empty_request("GET", uri, Some(&dora))).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");
    }
}

#[tokio::test]
async fn change_password_checks_current_password() {
    let app = TestApp::new().await;
    let cookie = app.login("bob").await;

    let response = app
        .send(json_request(
            "POST",
            "/api/auth/password",
            Some(&cookie),
            json!({ "current_password": "nope-nope", "new_password": "fresh-secret" }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .send(json_request(
            "POST",
            "/api/auth/password",
            Some(&cookie),
            json!({ "current_password": PASSWORD, "new_password": "123" }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .send(json_request(
            "POST",
            "/api/auth/password",
            Some(&cookie),
            json!({ "current_password": PASSWORD, "new_password": "fresh-secret" }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await["message"],
        "Password updated successfully"
    );

    let response = app
        .send(json_request(
            "POST",
            "/api/auth/login",
            None,
            json!({ "username": "bob", "password": "fresh-secret" }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn uploaded_images_are_served_back() {
    let app = TestApp::new().await;
    let cookie = app.login("alice").await;

    let response = app
        .send(multipart_request(
            "/api/upload",
            Some(&cookie),
            "photo.png",
            "image/png",
            &TINY_PNG,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let stored = body_json(response).await;
    assert_eq!(stored["width"], 1);
    assert_eq!(stored["height"], 1);
    assert_eq!(stored["content_type"], "image/png");
    let url = stored["url"].as_str().expect("url").to_string();
    assert!(url.starts_with("/images/post-images/"), "{url}");
    assert_eq!(app.blobs.len().await, 1);

    let response = app.send(empty_request("GET", &url, None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok()),
        Some("image/png")
    );
}

#[tokio::test]
async fn upload_names_and_types_follow_the_file_signature() {
    let app = TestApp::new().await;
    let cookie = app.login("alice").await;

    let mut polyglot = TINY_PNG.to_vec();
    polyglot.extend_from_slice(b"<script>alert(document.cookie)</script>");

    let response = app
        .send(multipart_request(
            "/api/upload",
            Some(&cookie),
            "evil.html",
            "image/png",
            &polyglot,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let stored = body_json(response).await;
    assert_eq!(stored["content_type"], "image/png");
    let url = stored["url"].as_str().expect("url").to_string();
    assert!(url.ends_with(".png"), "{url}");

    let response = app.send(empty_request("GET", &url, None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(
        headers.get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok()),
        Some("image/png")
    );
    assert_eq!(
        headers
            .get(header::X_CONTENT_TYPE_OPTIONS)
            .and_then(|v| v.to_str().ok()),
        Some("nosniff")
    );
}

#[tokio::test]
async fn markup_declared_as_an_image_is_rejected() {
    let app = TestApp::new().await;
    let cookie = app.login("alice").await;

    let response = app
        .send(multipart_request(
            "/api/upload",
            Some(&cookie),
            "photo.png",
            "image/png",
            b"<html><script>alert(1)</script></html>",
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["error"]["message"],
        "File must be an image"
    );
    assert_eq!(app.blobs.len().await, 0);
}

#[tokio::test]
async fn uploads_reject_non_images() {
    let app = TestApp::new().await;
    let cookie = app.login("alice").await;

    let response = app
        .send(multipart_request(
            "/api/upload",
            Some(&cookie),
            "notes.txt",
            "text/plain",
            b"hello",
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"]["code"], "upload_error");
    assert_eq!(app.blobs.len().await, 0);
}

#[tokio::test]
async fn uploads_require_a_session() {
    let app = TestApp::new().await;

    let response = app
        .send(multipart_request(
            "/api/upload",
            None,
            "photo.png",
            "image/png",
            &TINY_PNG,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn base64_uploads_accept_data_uris() {
    let app = TestApp::new().await;
    let cookie = app.login("admin").await;
    let data = format!("data:image/png;base64,{}", STANDARD.encode(TINY_PNG));

    let response = app
        .send(json_request(
            "POST",
            "/api/upload/base64",
            Some(&cookie),
            json!({ "data": data }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let stored = body_json(response).await;
    assert!(stored["name"].as_str().expect("name").ends_with(".png"));
}

#[tokio::test]
async fn unknown_images_are_not_found() {
    let app = TestApp::new().await;

    let response = app
        .send(empty_request("GET", "/images/post-images/missing.png", None))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .send(empty_request("GET", "/images/other-bucket/missing.png", None))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn healthz_reports_no_content() {
    let app = TestApp::new().await;
    let response = app.send(empty_request("GET", "/healthz", None)).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn dashboards_redirect_anonymous_visitors() {
    let app = TestApp::new().await;

    for uri in ["/", "/dashboard/admin", "/dashboard/user"] {
        let response = app.send(empty_request("GET", uri, None)).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{uri}");
        assert_eq!(
            response
                .headers()
                .get(header::LOCATION)
                .and_then(|v| v.to_str().ok()),
            Some("/login")
        );
    }
}

#[tokio::test]
async fn dashboards_follow_the_role() {
    let app = TestApp::new().await;
    let admin = app.login("admin").await;
    let alice = app.login("alice").await;

    let response = app.send(empty_request("GET", "/", Some(&admin))).await;
    assert_eq!(
        response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok()),
        Some("/dashboard/admin")
    );

    let response = app
        .send(empty_request("GET", "/dashboard/admin", Some(&alice)))
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let response = app
        .send(empty_request("GET", "/dashboard/admin", Some(&admin)))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("alice"));
    assert!(html.contains("bob"));

    let response = app
        .send(empty_request("GET", "/dashboard/user", Some(&alice)))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn login_form_issues_cookie_and_redirects() {
    let app = TestApp::new().await;

    let response = app.send(empty_request("GET", "/login", None)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/login")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(axum::body::Body::from(format!(
            "username=alice&password={PASSWORD}"
        )))
        .expect("request");
    let response = app.send(request).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok()),
        Some("/dashboard/user")
    );
    assert!(session_cookie(&response).is_some());

    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/login")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(axum::body::Body::from("username=alice&password=wrong-one"))
        .expect("request");
    let response = app.send(request).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(body_text(response).await.contains("Invalid username or password"));
}
