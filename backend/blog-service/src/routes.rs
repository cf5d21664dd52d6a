//! Route configuration
//!
//! Every page answers GET; forms also accept POST on the same path.

use crate::handlers::{account, auth, comments, pages, password_reset, posts};
use actix_web::web;

/// Configure all routes for the application
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg
        // Public pages
        .route("/", web::get().to(pages::home))
        .route("/home", web::get().to(pages::home))
        .route("/about", web::get().to(pages::about))
        .route("/health", web::get().to(pages::health_check))
        // Authentication
        .service(
            web::resource("/register")
                .route(web::get().to(auth::register_form))
                .route(web::post().to(auth::register)),
        )
        .service(
            web::resource("/login")
                .route(web::get().to(auth::login_form))
                .route(web::post().to(auth::login)),
        )
        .route("/logout", web::get().to(auth::logout))
        // Account
        .service(
            web::resource("/account")
                .route(web::get().to(account::account_form))
                .route(web::post().to(account::update_account)),
        )
        .route("/user/{username}", web::get().to(account::user_posts))
        // Posts
        .service(
            web::resource("/newpost")
                .route(web::get().to(posts::new_post_form))
                .route(web::post().to(posts::create_post)),
        )
        .route("/post/{id}", web::get().to(posts::get_post))
        .service(
            web::resource("/post/{id}/update")
                .route(web::get().to(posts::update_post_form))
                .route(web::post().to(posts::update_post)),
        )
        .service(
            web::resource("/post/{id}/delete")
                .route(web::get().to(posts::delete_post))
                .route(web::post().to(posts::delete_post)),
        )
        // Comments
        .service(
            web::resource("/comment/{post_id}")
                .route(web::get().to(comments::comment_form))
                .route(web::post().to(comments::create_comment)),
        )
        // Password reset
        .service(
            web::resource("/resetpassword")
                .route(web::get().to(password_reset::request_reset_form))
                .route(web::post().to(password_reset::request_reset)),
        )
        .service(
            web::resource("/resetpassword/{token}")
                .route(web::get().to(password_reset::reset_token_form))
                .route(web::post().to(password_reset::reset_password)),
        );
}
