/// Password reset by emailed token
///
/// POST /resetpassword mails a link carrying a signed, expiring token.
/// The token page accepts a new password while the token verifies.
use actix_web::{web, HttpRequest, HttpResponse};
use serde_json::json;

use crate::app_state::AppState;
use crate::db::user_repo;
use crate::error::Result;
use crate::handlers::{external_base_url, RequestContext};
use crate::middleware::flash::FlashMessage;
use crate::middleware::session::DEFAULT_LANDING;
use crate::models::User;
use crate::security::hash_password;
use crate::services::email_service::password_reset_message;
use crate::validators::{self, FieldErrors, RequestResetForm, ResetPasswordForm};

pub const RESET_EMAIL_SENT: &str =
    "An email has been sent to you with instructions for resetting the password";
pub const RESET_EMAIL_FAILED: &str = "We could not send the reset email. Please try again later.";
pub const INVALID_TOKEN: &str = "That is an Invalid or Expired Token";

fn render_request_form(
    ctx: RequestContext,
    state: &AppState,
    form: &RequestResetForm,
    errors: &FieldErrors,
) -> Result<HttpResponse> {
    ctx.render(
        state,
        "resetRequest.html",
        json!({ "title": "Reset Password", "form": form, "errors": errors }),
    )
}

fn render_token_form(
    ctx: RequestContext,
    state: &AppState,
    errors: &FieldErrors,
) -> Result<HttpResponse> {
    ctx.render(
        state,
        "resetToken.html",
        json!({ "title": "Reset Password", "errors": errors }),
    )
}

/// Resolve a reset token to its user; `None` for bad, expired or orphaned tokens
async fn user_for_token(state: &AppState, token: &str) -> Result<Option<User>> {
    match state.tokens.verify_reset_token(token) {
        Some(user_id) => Ok(user_repo::find_by_id(&state.db, user_id).await?),
        None => Ok(None),
    }
}

fn invalid_token(mut ctx: RequestContext) -> HttpResponse {
    ctx.flash(FlashMessage::danger(INVALID_TOKEN));
    ctx.redirect("/resetpassword")
}

/// GET /resetpassword
pub async fn request_reset_form(
    state: web::Data<AppState>,
    ctx: RequestContext,
) -> Result<HttpResponse> {
    if ctx.is_authenticated() {
        return Ok(ctx.redirect(DEFAULT_LANDING));
    }
    render_request_form(ctx, &state, &RequestResetForm::default(), &FieldErrors::new())
}

/// POST /resetpassword
pub async fn request_reset(
    state: web::Data<AppState>,
    mut ctx: RequestContext,
    req: HttpRequest,
    form: web::Form<RequestResetForm>,
) -> Result<HttpResponse> {
    if ctx.is_authenticated() {
        return Ok(ctx.redirect(DEFAULT_LANDING));
    }
    let mut form = form.into_inner();
    form.normalize();

    if let Err(errors) = validators::validate_reset_request(&state.db, &form).await? {
        return render_request_form(ctx, &state, &form, &errors);
    }

    let Some(user) = user_repo::find_by_email(&state.db, &form.email).await? else {
        let mut errors = FieldErrors::new();
        errors.add("email", validators::NO_ACCOUNT_FOR_EMAIL);
        return render_request_form(ctx, &state, &form, &errors);
    };

    let token = state.tokens.issue_reset_token(user.id)?;
    let link = format!("{}/resetpassword/{}", external_base_url(&state, &req), token);
    let (subject, body) = password_reset_message(&link);

    if let Err(e) = state.mailer.send(&user.email, &subject, &body).await {
        tracing::error!(user_id = user.id, error = %e, "failed to send password reset email");
        ctx.flash(FlashMessage::danger(RESET_EMAIL_FAILED));
        return render_request_form(ctx, &state, &form, &FieldErrors::new());
    }

    tracing::info!(user_id = user.id, "password reset email sent");
    ctx.flash(FlashMessage::info(RESET_EMAIL_SENT));
    Ok(ctx.redirect("/login"))
}

/// GET /resetpassword/{token}
pub async fn reset_token_form(
    state: web::Data<AppState>,
    ctx: RequestContext,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    if ctx.is_authenticated() {
        return Ok(ctx.redirect(DEFAULT_LANDING));
    }
    if user_for_token(&state, &path).await?.is_none() {
        return Ok(invalid_token(ctx));
    }
    render_token_form(ctx, &state, &FieldErrors::new())
}

/// POST /resetpassword/{token}
pub async fn reset_password(
    state: web::Data<AppState>,
    mut ctx: RequestContext,
    path: web::Path<String>,
    form: web::Form<ResetPasswordForm>,
) -> Result<HttpResponse> {
    if ctx.is_authenticated() {
        return Ok(ctx.redirect(DEFAULT_LANDING));
    }
    let Some(user) = user_for_token(&state, &path).await? else {
        return Ok(invalid_token(ctx));
    };

    let errors = validators::field_errors(&form.0);
    if !errors.is_empty() {
        return render_token_form(ctx, &state, &errors);
    }

    let password_hash = hash_password(&form.password)?;
    let user = user_repo::update_password(&state.db, user.id, &password_hash).await?;
    tracing::info!(user_id = user.id, "password reset completed");

    ctx.flash(FlashMessage::success(format!(
        "Password updated for {}, you can now login",
        user.username
    )));
    Ok(ctx.redirect("/login"))
}
