mod common;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
};
use common::{admin_cookie, app, create_test_db, guest_cookie, question, quiz, send};
use quizbook::{models::OptionKey, names};
use tower::ServiceExt;

#[tokio::test]
async fn admin_routes_reject_anonymous_visitors() {
    let app = app(create_test_db().await);
    let guest = guest_cookie();

    let cases = [
        (Method::GET, names::NEW_QUIZ_URL.to_string()),
        (Method::GET, names::edit_quiz_url("first")),
        (Method::DELETE, names::delete_quiz_url("first")),
        (Method::GET, names::ADMIN_BOOKS_URL.to_string()),
        (Method::GET, names::NEW_BOOK_URL.to_string()),
        (Method::DELETE, names::delete_book_url("guide-2024")),
    ];

    for (method, uri) in cases {
        let resp = send(&app, method, &uri, Some(&guest), None).await;
        assert_eq!(
            resp.status(),
            StatusCode::FORBIDDEN,
            "expected FORBIDDEN for {uri}",
        );
    }
}

#[tokio::test]
async fn admin_routes_reject_regular_accounts() {
    let db = create_test_db().await;
    let id = db
        .create_user("player@example.com", "secret-password", false)
        .await
        .expect("create user");
    let session = db.create_user_session(id).await.expect("create session");
    let app = app(db);

    let cookie = format!("{}={session}", names::USER_SESSION_COOKIE_NAME);
    let resp = send(&app, Method::GET, names::NEW_QUIZ_URL, Some(&cookie), None).await;

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admin_routes_accept_admin_sessions() {
    let db = create_test_db().await;
    let cookie = admin_cookie(&db).await;
    let app = app(db);

    for uri in [names::NEW_QUIZ_URL, names::ADMIN_BOOKS_URL, names::NEW_BOOK_URL] {
        let resp = send(&app, Method::GET, uri, Some(&cookie), None).await;
        assert_eq!(resp.status(), StatusCode::OK, "expected OK for {uri}");
    }
}

#[tokio::test]
async fn deleting_an_unknown_quiz_is_not_found() {
    let db = create_test_db().await;
    let cookie = admin_cookie(&db).await;
    let app = app(db);

    let resp = send(
        &app,
        Method::DELETE,
        &names::delete_quiz_url("missing"),
        Some(&cookie),
        None,
    )
    .await;

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn admin_can_delete_a_quiz() {
    let db = create_test_db().await;
    db.insert_quiz(&quiz("first", None, vec![question(1, &[OptionKey::A])]))
        .await
        .expect("insert quiz");
    let cookie = admin_cookie(&db).await;
    let app = app(db.clone());

    let resp = send(
        &app,
        Method::DELETE,
        &names::delete_quiz_url("first"),
        Some(&cookie),
        None,
    )
    .await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert!(db.get_quiz("first").await.expect("query").is_none());
}

#[tokio::test]
async fn state_changing_requests_need_the_htmx_header() {
    let app = app(create_test_db().await);

    let req = Request::builder()
        .method(Method::POST)
        .uri(names::LOGIN_URL)
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from("email=a%40b.c&password=secret"))
        .expect("request build should succeed");
    let resp = app.oneshot(req).await.expect("router should respond");

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}
