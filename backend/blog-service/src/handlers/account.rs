/// Profile page and per-user post listing
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use futures_util::TryStreamExt;
use serde_json::json;

use crate::app_state::AppState;
use crate::db::{is_unique_violation, post_repo, user_repo};
use crate::error::{AppError, Result};
use crate::handlers::{PageQuery, RequestContext};
use crate::middleware::flash::FlashMessage;
use crate::middleware::AuthenticatedUser;
use crate::models::User;
use crate::services::image_processing::{
    remove_profile_picture, save_profile_picture, ImageProcessingError,
};
use crate::validators::{self, AccountForm, FieldErrors, UploadedPicture};

const MAX_TEXT_FIELD_BYTES: usize = 64 * 1024;

fn profile_image_url(user: &User) -> String {
    format!("/static/profile_pics/{}", user.image_file)
}

fn render_account(
    ctx: RequestContext,
    state: &AppState,
    user: &User,
    form: &AccountForm,
    errors: &FieldErrors,
) -> Result<HttpResponse> {
    ctx.render(
        state,
        "account.html",
        json!({
            "title": "Account",
            "image": profile_image_url(user),
            "form": form,
            "errors": errors,
        }),
    )
}

async fn load_current_user(state: &AppState, user_id: i64) -> Result<User> {
    user_repo::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| AppError::LoginRequired {
            next: "/account".to_string(),
        })
}

/// Collect the multipart account form, capping every part's size
async fn read_account_form(mut payload: Multipart, max_upload_bytes: usize) -> Result<AccountForm> {
    let mut form = AccountForm::default();

    while let Some(mut field) = payload.try_next().await? {
        let name = field.name().unwrap_or_default().to_string();
        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .map(str::to_string);

        let limit = if name == "picture" {
            max_upload_bytes
        } else {
            MAX_TEXT_FIELD_BYTES
        };

        let mut bytes = Vec::new();
        while let Some(chunk) = field.try_next().await? {
            if bytes.len() + chunk.len() > limit {
                return Err(ImageProcessingError::FileSizeTooLarge(bytes.len() + chunk.len(), limit).into());
            }
            bytes.extend_from_slice(&chunk);
        }

        match name.as_str() {
            "username" | "email" => {
                let value = String::from_utf8(bytes)
                    .map_err(|_| AppError::BadRequest(format!("Field {} is not valid UTF-8", name)))?;
                if name == "username" {
                    form.username = value;
                } else {
                    form.email = value;
                }
            }
            "picture" => {
                // Browsers send an empty part when no file was chosen
                form.picture = match filename {
                    Some(filename) if !filename.is_empty() && !bytes.is_empty() => {
                        Some(UploadedPicture { filename, bytes })
                    }
                    _ => None,
                };
            }
            _ => {}
        }
    }

    form.normalize();
    Ok(form)
}

/// GET /account
pub async fn account_form(
    state: web::Data<AppState>,
    ctx: RequestContext,
    user: AuthenticatedUser,
) -> Result<HttpResponse> {
    let user = load_current_user(&state, user.0).await?;
    let form = AccountForm {
        username: user.username.clone(),
        email: user.email.clone(),
        picture: None,
    };
    render_account(ctx, &state, &user, &form, &FieldErrors::new())
}

/// POST /account (multipart: username, email, picture)
pub async fn update_account(
    state: web::Data<AppState>,
    mut ctx: RequestContext,
    user: AuthenticatedUser,
    payload: Multipart,
) -> Result<HttpResponse> {
    let user = load_current_user(&state, user.0).await?;
    let form = read_account_form(payload, state.config.uploads.max_upload_bytes).await?;

    if let Err(errors) = validators::validate_account_update(&state.db, user.id, &form).await? {
        return render_account(ctx, &state, &user, &form, &errors);
    }

    let image_file = match &form.picture {
        Some(picture) => Some(
            save_profile_picture(
                &state.config.uploads.profile_pics_dir,
                &picture.filename,
                picture.bytes.clone(),
            )
            .await?,
        ),
        None => None,
    };

    let updated = user_repo::update_profile(
        &state.db,
        user.id,
        &form.username,
        &form.email,
        image_file.as_deref(),
    )
    .await;

    if updated.is_err() {
        if let Some(file_name) = &image_file {
            remove_profile_picture(&state.config.uploads.profile_pics_dir, file_name).await;
        }
    }

    match updated {
        Ok(updated) => {
            tracing::info!(user_id = updated.id, "account updated");
        }
        Err(e) if is_unique_violation(&e) => {
            let errors = validators::validate_account_update(&state.db, user.id, &form)
                .await?
                .err()
                .unwrap_or_default();
            return render_account(ctx, &state, &user, &form, &errors);
        }
        Err(e) => return Err(e.into()),
    }

    ctx.flash(FlashMessage::success("Your account has been updated"));
    Ok(ctx.redirect("/account"))
}

/// Posts written by one user
/// GET /user/{username}
pub async fn user_posts(
    state: web::Data<AppState>,
    ctx: RequestContext,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let username = path.into_inner();
    let page = query.page()?;

    let user = user_repo::find_by_username(&state.db, &username)
        .await?
        .ok_or_else(|| AppError::not_found(format!("user {}", username)))?;

    let posts =
        post_repo::find_posts_by_user(&state.db, user.id, page, state.config.pagination.per_page)
            .await?;
    if posts.is_out_of_range() {
        return Err(AppError::not_found(format!("page {}", page)));
    }

    ctx.render(
        &state,
        "user.html",
        json!({
            "title": user.username,
            "user": user,
            "posts": posts.items,
            "pagination": posts.navigation(),
        }),
    )
}
