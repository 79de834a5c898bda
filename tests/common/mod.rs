#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Method, Request},
    response::Response,
    Router,
};
use http_body_util::BodyExt;
use quizbook::{
    db::Db,
    gateway::{ChatGateway, DEFAULT_GATEWAY_URL},
    models::{OptionKey, Options, Question, Quiz},
    names, router,
    services::{auth::AuthService, extraction::ExtractionService},
    AppState,
};
use tower::ServiceExt;
use ulid::Ulid;

pub const ADMIN_EMAIL: &str = "admin@example.com";

pub async fn create_test_db() -> Db {
    use std::sync::atomic::{AtomicU32, Ordering};
    static COUNTER: AtomicU32 = AtomicU32::new(0);
    let id = COUNTER.fetch_add(1, Ordering::SeqCst);
    let path =
        std::env::temp_dir().join(format!("quizbook_test_{}_{}.db", std::process::id(), id));
    // Clean up leftover file from previous runs
    let _ = std::fs::remove_file(&path);
    let url = format!("file:{}", path.display());
    Db::new(url, None)
        .await
        .expect("failed to create test database")
}

pub fn app(db: Db) -> Router {
    router(AppState {
        auth: AuthService::new(db.clone(), vec![ADMIN_EMAIL.to_string()]),
        extraction: ExtractionService::new(
            ChatGateway::new(DEFAULT_GATEWAY_URL.to_string(), None),
            "quiz-model".to_string(),
            "book-model".to_string(),
        ),
        db,
        secure_cookies: false,
    })
}

pub fn question(id: u32, correct: &[OptionKey]) -> Question {
    Question {
        id,
        question: format!("Question {id}"),
        options: Options {
            a: "Option A".to_string(),
            b: "Option B".to_string(),
            c: "Option C".to_string(),
            d: "Option D".to_string(),
        },
        correct_answers: correct.iter().copied().collect(),
    }
}

pub fn quiz(slug: &str, required: Option<&str>, questions: Vec<Question>) -> Quiz {
    Quiz {
        slug: slug.to_string(),
        title: "Test quiz".to_string(),
        subtitle: format!("Subtitle {slug}"),
        year: 2024,
        page: 1,
        questions,
        required_quiz_slug: required.map(str::to_string),
    }
}

pub fn guest_cookie() -> String {
    format!("{}={}", names::GUEST_COOKIE_NAME, Ulid::new())
}

/// A logged-in admin's session cookie.
pub async fn admin_cookie(db: &Db) -> String {
    let id = db
        .create_user(ADMIN_EMAIL, "secret-password", true)
        .await
        .expect("create admin");
    let session = db.create_user_session(id).await.expect("create session");
    format!("{}={session}", names::USER_SESSION_COOKIE_NAME)
}

pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    cookie: Option<&str>,
    form: Option<&str>,
) -> Response {
    let mut req = Request::builder()
        .method(method)
        .uri(uri)
        .header("HX-Request", "true");
    if let Some(cookie) = cookie {
        req = req.header("cookie", cookie);
    }
    let body = match form {
        Some(form) => {
            req = req.header("content-type", "application/x-www-form-urlencoded");
            Body::from(form.to_string())
        }
        None => Body::empty(),
    };

    app.clone()
        .oneshot(req.body(body).expect("request build should succeed"))
        .await
        .expect("router should respond")
}

pub async fn body_text(resp: Response) -> String {
    let bytes = resp
        .into_body()
        .collect()
        .await
        .expect("body should be readable")
        .to_bytes();
    String::from_utf8(bytes.to_vec()).expect("body should be utf-8")
}

/// `name=value` of the first `Set-Cookie` header setting `name`.
pub fn set_cookie(resp: &Response, name: &str) -> Option<String> {
    resp.headers()
        .get_all("set-cookie")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.split(';').next())
        .find(|pair| pair.starts_with(&format!("{name}=")))
        .map(str::to_string)
}

const MULTIPART_BOUNDARY: &str = "quizbook-test-boundary";

/// Post an editor form as `multipart/form-data`, optionally with an `image` part.
pub async fn send_multipart(
    app: &Router,
    uri: &str,
    cookie: &str,
    fields: &[(&str, &str)],
    image: Option<(&str, Vec<u8>)>,
) -> Response {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{MULTIPART_BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((content_type, bytes)) = image {
        body.extend_from_slice(
            format!(
                "--{MULTIPART_BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"page\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(&bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{MULTIPART_BOUNDARY}--\r\n").as_bytes());

    let req = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("HX-Request", "true")
        .header("cookie", cookie)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={MULTIPART_BOUNDARY}"),
        )
        .body(Body::from(body))
        .expect("request build should succeed");

    app.clone()
        .oneshot(req)
        .await
        .expect("router should respond")
}

/// The markup of an error toast, as editors show validation failures.
pub fn error_toast(message: &str) -> String {
    format!(r#"<article class="toast toast-error" role="status">{message}</article>"#)
}
