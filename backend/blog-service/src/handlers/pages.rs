use actix_web::{web, HttpResponse, Responder};
use serde::Serialize;
use serde_json::json;

use crate::app_state::AppState;
use crate::db::post_repo;
use crate::error::{AppError, Result};
use crate::handlers::{PageQuery, RequestContext};

/// Paginated listing of all posts, newest first
/// GET / and GET /home
pub async fn home(
    state: web::Data<AppState>,
    ctx: RequestContext,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let page = query.page()?;
    let posts = post_repo::list_posts(&state.db, page, state.config.pagination.per_page).await?;
    if posts.is_out_of_range() {
        return Err(AppError::not_found(format!("page {}", page)));
    }

    ctx.render(
        &state,
        "home.html",
        json!({
            "posts": posts.items,
            "pagination": posts.navigation(),
        }),
    )
}

/// GET /about
pub async fn about(state: web::Data<AppState>, ctx: RequestContext) -> Result<HttpResponse> {
    ctx.render(&state, "about.html", json!({ "title": "About" }))
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    database: String,
}

/// Liveness plus a database ping
/// GET /health
pub async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let db_status = match sqlx::query("SELECT 1").fetch_one(&state.db).await {
        Ok(_) => "healthy",
        Err(e) => {
            tracing::warn!("Health check database ping failed: {}", e);
            "unhealthy"
        }
    };

    let body = HealthResponse {
        status: if db_status == "healthy" { "ok" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: db_status.to_string(),
    };

    if db_status == "healthy" {
        HttpResponse::Ok().json(body)
    } else {
        HttpResponse::ServiceUnavailable().json(body)
    }
}
