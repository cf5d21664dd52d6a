//! Test fixtures and utilities for integration tests
//! Provides an in-memory database, a recording mailer, upload directories and
//! helpers for cookies and form bodies.
#![allow(dead_code)]

use actix_web::{
    body::MessageBody,
    cookie::Cookie,
    dev::{ServiceFactory, ServiceRequest, ServiceResponse},
    http::header,
    test, web, App,
};
use async_trait::async_trait;
use blog_service::{
    config::Config,
    db::{create_pool, run_migrations, user_repo},
    middleware::{flash::read_flashes, FlashMessage, SessionMiddleware},
    models::User,
    routes::configure_routes,
    security::hash_password,
    services::{HtmlRenderer, Mailer},
    AppError, AppState,
};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

pub const BASE_URL: &str = "http://localhost";

// ============================================
// Mail
// ============================================

#[derive(Debug, Clone)]
pub struct SentMail {
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

/// Mailer that keeps every message in memory, or fails every send
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<SentMail>>,
    fail: bool,
}

impl RecordingMailer {
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> blog_service::Result<()> {
        if self.fail {
            return Err(AppError::Email("connection refused".to_string()));
        }
        self.sent.lock().unwrap().push(SentMail {
            recipient: recipient.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}

// ============================================
// Application Setup
// ============================================

pub struct TestContext {
    pub state: AppState,
    pub mailer: Arc<RecordingMailer>,
    pub uploads: TempDir,
}

pub async fn setup() -> TestContext {
    setup_with_mailer(RecordingMailer::default()).await
}

pub async fn setup_with_mailer(mailer: RecordingMailer) -> TestContext {
    let uploads = tempfile::tempdir().expect("upload dir");

    let mut config = Config::default();
    config.database.url = "sqlite::memory:".to_string();
    config.app.public_url = Some(BASE_URL.to_string());
    config.uploads.profile_pics_dir = uploads.path().join("profile_pics");

    let pool = create_pool(&config.database.url, 1)
        .await
        .expect("in-memory pool");
    run_migrations(&pool).await.expect("migrations");

    let mailer = Arc::new(mailer);
    let state = AppState::new(
        pool,
        config,
        mailer.clone(),
        Arc::new(HtmlRenderer::default()),
    );

    TestContext {
        state,
        mailer,
        uploads,
    }
}

/// The application as served by main, minus request logging
pub fn app(
    state: AppState,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(web::Data::new(state.clone()))
        .wrap(SessionMiddleware::new(state.sessions.clone()))
        .configure(configure_routes)
}

// ============================================
// Test Data
// ============================================

pub async fn create_user(state: &AppState, username: &str, email: &str, password: &str) -> User {
    let hash = hash_password(password).expect("hash");
    user_repo::create_user(&state.db, username, email, &hash)
        .await
        .expect("create user")
}

/// Session cookie as issued by a successful login
pub fn session_cookie(state: &AppState, user_id: i64) -> Cookie<'static> {
    state.sessions.login(user_id, false).expect("session cookie")
}

// ============================================
// Responses
// ============================================

pub fn location<B>(resp: &ServiceResponse<B>) -> String {
    resp.headers()
        .get(header::LOCATION)
        .expect("Location header")
        .to_str()
        .unwrap()
        .to_string()
}

pub fn response_cookie<B>(resp: &ServiceResponse<B>, name: &str) -> Option<Cookie<'static>> {
    resp.response()
        .cookies()
        .find(|c| c.name() == name)
        .map(|c| c.into_owned())
}

/// Flash messages a redirect leaves for the next page
pub fn flashes<B>(resp: &ServiceResponse<B>) -> Vec<FlashMessage> {
    match response_cookie(resp, "blog_flash") {
        Some(cookie) => read_flashes(&test::TestRequest::default().cookie(cookie).to_http_request()),
        None => Vec::new(),
    }
}

pub fn flash_texts<B>(resp: &ServiceResponse<B>) -> Vec<String> {
    flashes(resp).into_iter().map(|f| f.message).collect()
}

pub async fn body_text(resp: ServiceResponse<impl MessageBody>) -> String {
    let bytes = test::read_body(resp).await;
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}

// ============================================
// Multipart
// ============================================

pub const BOUNDARY: &str = "----blogtestboundary";

/// multipart/form-data body with text fields and an optional file part
pub fn multipart_body(fields: &[(&str, &str)], file: Option<(&str, &str, &[u8])>) -> (String, Vec<u8>) {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((name, filename, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    (format!("multipart/form-data; boundary={BOUNDARY}"), body)
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::DynamicImage::ImageRgb8(image::RgbImage::new(width, height));
    let mut out = std::io::Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png).expect("encode png");
    out.into_inner()
}
