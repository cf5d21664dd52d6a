use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::app_state::AppState;
use crate::db::{comment_repo, post_repo};
use crate::error::{AppError, Result};
use crate::handlers::RequestContext;
use crate::middleware::flash::FlashMessage;
use crate::middleware::AuthenticatedUser;
use crate::validators::{self, CommentForm, FieldErrors};

fn render_comment_form(
    ctx: RequestContext,
    state: &AppState,
    post_id: i64,
    form: &CommentForm,
    errors: &FieldErrors,
) -> Result<HttpResponse> {
    ctx.render(
        state,
        "comment.html",
        json!({
            "title": "Comment",
            "post_id": post_id,
            "form": form,
            "errors": errors,
        }),
    )
}

async fn ensure_post_exists(state: &AppState, post_id: i64) -> Result<()> {
    post_repo::find_by_id(&state.db, post_id)
        .await?
        .map(|_| ())
        .ok_or_else(|| AppError::not_found(format!("post {}", post_id)))
}

/// GET /comment/{post_id}
pub async fn comment_form(
    state: web::Data<AppState>,
    ctx: RequestContext,
    _user: AuthenticatedUser,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let post_id = path.into_inner();
    ensure_post_exists(&state, post_id).await?;
    render_comment_form(ctx, &state, post_id, &CommentForm::default(), &FieldErrors::new())
}

/// POST /comment/{post_id}
pub async fn create_comment(
    state: web::Data<AppState>,
    mut ctx: RequestContext,
    user: AuthenticatedUser,
    path: web::Path<i64>,
    form: web::Form<CommentForm>,
) -> Result<HttpResponse> {
    let post_id = path.into_inner();
    ensure_post_exists(&state, post_id).await?;
    let form = form.into_inner();

    let errors = validators::field_errors(&form);
    if !errors.is_empty() {
        return render_comment_form(ctx, &state, post_id, &form, &errors);
    }

    let comment = comment_repo::create_comment(&state.db, user.0, post_id, &form.comment).await?;
    tracing::info!(comment_id = comment.id, post_id, user_id = user.0, "comment added");

    ctx.flash(FlashMessage::success("Comment has been added"));
    Ok(ctx.redirect(&format!("/post/{}", post_id)))
}
