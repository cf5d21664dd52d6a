/// Registration, login and logout
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;

use crate::app_state::AppState;
use crate::db::{is_unique_violation, user_repo};
use crate::error::Result;
use crate::handlers::RequestContext;
use crate::middleware::flash::FlashMessage;
use crate::middleware::session::{landing_page, DEFAULT_LANDING};
use crate::security::{hash_password, verify_password};
use crate::validators::{self, FieldErrors, LoginForm, RegistrationForm};

pub const LOGIN_FAILED: &str = "Login unsuccessful. Please check username and password";

#[derive(Debug, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

fn render_register(
    ctx: RequestContext,
    state: &AppState,
    form: &RegistrationForm,
    errors: &FieldErrors,
) -> Result<HttpResponse> {
    ctx.render(
        state,
        "register.html",
        json!({ "title": "Register", "form": form, "errors": errors }),
    )
}

fn render_login(
    ctx: RequestContext,
    state: &AppState,
    form: &LoginForm,
    errors: &FieldErrors,
) -> Result<HttpResponse> {
    ctx.render(
        state,
        "login.html",
        json!({ "title": "Login", "form": form, "errors": errors }),
    )
}

/// GET /register
pub async fn register_form(state: web::Data<AppState>, ctx: RequestContext) -> Result<HttpResponse> {
    if ctx.is_authenticated() {
        return Ok(ctx.redirect(DEFAULT_LANDING));
    }
    render_register(ctx, &state, &RegistrationForm::default(), &FieldErrors::new())
}

/// POST /register
pub async fn register(
    state: web::Data<AppState>,
    mut ctx: RequestContext,
    form: web::Form<RegistrationForm>,
) -> Result<HttpResponse> {
    if ctx.is_authenticated() {
        return Ok(ctx.redirect(DEFAULT_LANDING));
    }
    let mut form = form.into_inner();
    form.normalize();

    if let Err(errors) = validators::validate_registration(&state.db, &form).await? {
        return render_register(ctx, &state, &form, &errors);
    }

    let password_hash = hash_password(&form.password)?;
    let user = match user_repo::create_user(&state.db, &form.username, &form.email, &password_hash).await {
        Ok(user) => user,
        Err(e) if is_unique_violation(&e) => {
            // Lost a race with a concurrent registration
            let errors = validators::validate_registration(&state.db, &form)
                .await?
                .err()
                .unwrap_or_else(|| {
                    let mut errors = FieldErrors::new();
                    errors.add("username", validators::USERNAME_TAKEN);
                    errors
                });
            return render_register(ctx, &state, &form, &errors);
        }
        Err(e) => return Err(e.into()),
    };

    tracing::info!(user_id = user.id, username = %user.username, "user registered");
    ctx.flash(FlashMessage::success(format!(
        "Account Created for {}, you can now login",
        user.username
    )));
    Ok(ctx.redirect("/login"))
}

/// GET /login
pub async fn login_form(state: web::Data<AppState>, ctx: RequestContext) -> Result<HttpResponse> {
    if ctx.is_authenticated() {
        return Ok(ctx.redirect(DEFAULT_LANDING));
    }
    render_login(ctx, &state, &LoginForm::default(), &FieldErrors::new())
}

/// POST /login
pub async fn login(
    state: web::Data<AppState>,
    mut ctx: RequestContext,
    query: web::Query<NextQuery>,
    form: web::Form<LoginForm>,
) -> Result<HttpResponse> {
    if ctx.is_authenticated() {
        return Ok(ctx.redirect(DEFAULT_LANDING));
    }
    let form = form.into_inner();

    let errors = validators::field_errors(&form);
    if !errors.is_empty() {
        return render_login(ctx, &state, &form, &errors);
    }

    let user = user_repo::find_by_username(&state.db, &form.username).await?;
    let user = match user {
        Some(user) if verify_password(&form.password, &user.password_hash) => user,
        _ => {
            tracing::info!(username = %form.username, "login failed");
            ctx.flash(FlashMessage::danger(LOGIN_FAILED));
            return render_login(ctx, &state, &form, &FieldErrors::new());
        }
    };

    let cookie = state.sessions.login(user.id, form.remember())?;
    let destination = landing_page(query.next.as_deref());

    let mut response = ctx.redirect_builder(&destination);
    response.cookie(cookie);
    Ok(response.finish())
}

/// GET /logout
pub async fn logout(state: web::Data<AppState>, mut ctx: RequestContext) -> HttpResponse {
    if let Some(user_id) = ctx.user_id() {
        tracing::info!(user_id, "user logged out");
    }
    ctx.flash(FlashMessage::info("You are now logged out"));

    let mut response = ctx.redirect_builder(DEFAULT_LANDING);
    response.cookie(state.sessions.logout());
    response.finish()
}
