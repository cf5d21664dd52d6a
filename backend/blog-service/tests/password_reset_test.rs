/// Integration tests for the emailed password reset flow
mod common;

use actix_web::{http::StatusCode, test};
use blog_service::db::user_repo;
use blog_service::security::verify_password;
use common::fixtures::{self, body_text, flash_texts, location, RecordingMailer, BASE_URL};

fn reset_path_from(body: &str) -> String {
    let prefix = format!("{}/resetpassword/", BASE_URL);
    let start = body.find(&prefix).expect("reset link in mail");
    let link: String = body[start..]
        .chars()
        .take_while(|c| !c.is_whitespace())
        .collect();
    link.trim_start_matches(BASE_URL).to_string()
}

#[actix_web::test]
async fn test_full_reset_flow() {
    let ctx = fixtures::setup().await;
    let app = test::init_service(fixtures::app(ctx.state.clone())).await;
    let alice = fixtures::create_user(&ctx.state, "alice", "alice@x.com", "old-pw").await;

    let req = test::TestRequest::post()
        .uri("/resetpassword")
        .set_form([("email", "alice@x.com")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/login");
    assert_eq!(
        flash_texts(&resp),
        vec!["An email has been sent to you with instructions for resetting the password"]
    );

    let sent = ctx.mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].recipient, "alice@x.com");
    assert_eq!(sent[0].subject, "Password Reset Request");
    let reset_path = reset_path_from(&sent[0].body);

    let req = test::TestRequest::get().uri(&reset_path).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    // Mismatched confirmation keeps the old password
    let req = test::TestRequest::post()
        .uri(&reset_path)
        .set_form([("password", "new-pw"), ("confirm_password", "other")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_text(resp).await.contains("Field must be equal to password."));

    let req = test::TestRequest::post()
        .uri(&reset_path)
        .set_form([("password", "new-pw"), ("confirm_password", "new-pw")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/login");
    assert_eq!(
        flash_texts(&resp),
        vec!["Password updated for alice, you can now login"]
    );

    let user = user_repo::find_by_id(&ctx.state.db, alice.id)
        .await
        .unwrap()
        .unwrap();
    assert!(verify_password("new-pw", &user.password_hash));
    assert!(!verify_password("old-pw", &user.password_hash));

    let req = test::TestRequest::post()
        .uri("/login")
        .set_form([("username", "alice"), ("password", "new-pw")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/home");
}

#[actix_web::test]
async fn test_unknown_email_rejected() {
    let ctx = fixtures::setup().await;
    let app = test::init_service(fixtures::app(ctx.state.clone())).await;

    let req = test::TestRequest::post()
        .uri("/resetpassword")
        .set_form([("email", "nobody@x.com")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_text(resp).await.contains("No account with that email"));
    assert!(ctx.mailer.sent().is_empty());
}

#[actix_web::test]
async fn test_invalid_token_redirects_to_request_page() {
    let ctx = fixtures::setup().await;
    let app = test::init_service(fixtures::app(ctx.state.clone())).await;
    let alice = fixtures::create_user(&ctx.state, "alice", "alice@x.com", "pw").await;

    // A session token is signed with the same key but has the wrong purpose
    let session = fixtures::session_cookie(&ctx.state, alice.id);
    for token in ["garbage", session.value()] {
        let req = test::TestRequest::get()
            .uri(&format!("/resetpassword/{}", token))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(location(&resp), "/resetpassword");
        assert_eq!(flash_texts(&resp), vec!["That is an Invalid or Expired Token"]);
    }

    let req = test::TestRequest::post()
        .uri("/resetpassword/garbage")
        .set_form([("password", "x"), ("confirm_password", "x")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(location(&resp), "/resetpassword");

    let user = user_repo::find_by_id(&ctx.state.db, alice.id)
        .await
        .unwrap()
        .unwrap();
    assert!(verify_password("pw", &user.password_hash));
}

#[actix_web::test]
async fn test_token_for_deleted_user_is_invalid() {
    let ctx = fixtures::setup().await;
    let app = test::init_service(fixtures::app(ctx.state.clone())).await;

    let token = ctx.state.tokens.issue_reset_token(4242).unwrap();
    let req = test::TestRequest::get()
        .uri(&format!("/resetpassword/{}", token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(location(&resp), "/resetpassword");
}

#[actix_web::test]
async fn test_mail_failure_keeps_user_on_form() {
    let ctx = fixtures::setup_with_mailer(RecordingMailer::failing()).await;
    let app = test::init_service(fixtures::app(ctx.state.clone())).await;
    fixtures::create_user(&ctx.state, "alice", "alice@x.com", "pw").await;

    let req = test::TestRequest::post()
        .uri("/resetpassword")
        .set_form([("email", "alice@x.com")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_text(resp)
        .await
        .contains("We could not send the reset email. Please try again later."));
}

#[actix_web::test]
async fn test_signed_in_users_cannot_request_reset() {
    let ctx = fixtures::setup().await;
    let app = test::init_service(fixtures::app(ctx.state.clone())).await;
    let alice = fixtures::create_user(&ctx.state, "alice", "alice@x.com", "pw").await;

    let req = test::TestRequest::post()
        .uri("/resetpassword")
        .cookie(fixtures::session_cookie(&ctx.state, alice.id))
        .set_form([("email", "alice@x.com")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/home");
    assert!(ctx.mailer.sent().is_empty());
}
