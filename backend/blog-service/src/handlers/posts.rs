/// Post handlers - create, view, update and delete posts
use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::app_state::AppState;
use crate::db::{comment_repo, post_repo};
use crate::error::{AppError, Result};
use crate::handlers::RequestContext;
use crate::middleware::flash::FlashMessage;
use crate::middleware::{can_mutate, check_post_deletion, check_post_update, AuthenticatedUser};
use crate::models::Post;
use crate::validators::{self, FieldErrors, PostForm};

fn render_post_form(
    ctx: RequestContext,
    state: &AppState,
    legend: &str,
    form: &PostForm,
    errors: &FieldErrors,
) -> Result<HttpResponse> {
    ctx.render(
        state,
        "newPost.html",
        json!({
            "title": legend,
            "legend": legend,
            "form": form,
            "errors": errors,
        }),
    )
}

async fn load_post(state: &AppState, post_id: i64) -> Result<Post> {
    post_repo::find_by_id(&state.db, post_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("post {}", post_id)))
}

/// GET /newpost
pub async fn new_post_form(
    state: web::Data<AppState>,
    ctx: RequestContext,
    _user: AuthenticatedUser,
) -> Result<HttpResponse> {
    render_post_form(ctx, &state, "Create New Post", &PostForm::default(), &FieldErrors::new())
}

/// POST /newpost
pub async fn create_post(
    state: web::Data<AppState>,
    mut ctx: RequestContext,
    user: AuthenticatedUser,
    form: web::Form<PostForm>,
) -> Result<HttpResponse> {
    let form = form.into_inner();

    let errors = validators::field_errors(&form);
    if !errors.is_empty() {
        return render_post_form(ctx, &state, "Create New Post", &form, &errors);
    }

    let post = post_repo::create_post(&state.db, user.0, &form.title, &form.content).await?;
    tracing::info!(post_id = post.id, user_id = user.0, "post created");

    ctx.flash(FlashMessage::success("Post has been created"));
    Ok(ctx.redirect("/home"))
}

/// A post with its comments
/// GET /post/{id}
pub async fn get_post(
    state: web::Data<AppState>,
    ctx: RequestContext,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let post_id = path.into_inner();

    let post = post_repo::find_with_author(&state.db, post_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("post {}", post_id)))?;
    let comments = comment_repo::find_comments_by_post(&state.db, post_id).await?;
    let can_edit = can_mutate(ctx.user_id(), post.user_id);

    ctx.render(
        &state,
        "post.html",
        json!({
            "title": post.title,
            "post": post,
            "comments": comments,
            "can_edit": can_edit,
        }),
    )
}

/// GET /post/{id}/update
pub async fn update_post_form(
    state: web::Data<AppState>,
    ctx: RequestContext,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let post = load_post(&state, path.into_inner()).await?;
    check_post_update(ctx.user_id(), &post)?;

    let form = PostForm {
        title: post.title,
        content: post.content,
    };
    render_post_form(ctx, &state, "Update Post", &form, &FieldErrors::new())
}

/// POST /post/{id}/update
pub async fn update_post(
    state: web::Data<AppState>,
    mut ctx: RequestContext,
    path: web::Path<i64>,
    form: web::Form<PostForm>,
) -> Result<HttpResponse> {
    let post = load_post(&state, path.into_inner()).await?;
    check_post_update(ctx.user_id(), &post)?;
    let form = form.into_inner();

    let errors = validators::field_errors(&form);
    if !errors.is_empty() {
        return render_post_form(ctx, &state, "Update Post", &form, &errors);
    }

    post_repo::update_post(&state.db, post.id, &form.title, &form.content)
        .await?
        .ok_or_else(|| AppError::not_found(format!("post {}", post.id)))?;
    tracing::info!(post_id = post.id, "post updated");

    ctx.flash(FlashMessage::success("Your post has been updated"));
    Ok(ctx.redirect(&format!("/post/{}", post.id)))
}

/// Delete a post and its comments
/// GET or POST /post/{id}/delete
pub async fn delete_post(
    state: web::Data<AppState>,
    mut ctx: RequestContext,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let post = load_post(&state, path.into_inner()).await?;
    check_post_deletion(ctx.user_id(), &post)?;

    if !post_repo::delete_post_cascade(&state.db, post.id).await? {
        return Err(AppError::not_found(format!("post {}", post.id)));
    }
    tracing::info!(post_id = post.id, "post deleted");

    ctx.flash(FlashMessage::success("Your post has been deleted"));
    Ok(ctx.redirect("/home"))
}
