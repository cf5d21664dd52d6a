use actix_web::{error::ResponseError, http::header, http::StatusCode, HttpResponse};
use thiserror::Error;

use crate::middleware::flash::{self, FlashMessage};
use crate::services::image_processing::ImageProcessingError;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Login required")]
    LoginRequired { next: String },

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Image error: {0}")]
    Image(#[from] ImageProcessingError),

    #[error("Token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("Email error: {0}")]
    Email(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn not_found(what: impl Into<String>) -> Self {
        AppError::NotFound(what.into())
    }

    /// Message shown to the client. Server-side failures never expose details.
    fn public_message(&self) -> String {
        match self {
            AppError::NotFound(_) => "The requested page could not be found.".to_string(),
            AppError::Forbidden(msg) | AppError::BadRequest(msg) => msg.clone(),
            AppError::Image(ImageProcessingError::IoError(_))
            | AppError::Image(ImageProcessingError::ProcessingError(_)) => {
                "The picture could not be stored.".to_string()
            }
            AppError::Image(e) => e.to_string(),
            AppError::LoginRequired { .. } => "Please log in to access this page.".to_string(),
            AppError::Database(_)
            | AppError::Token(_)
            | AppError::Email(_)
            | AppError::Render(_)
            | AppError::Internal(_) => "Internal server error".to_string(),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::LoginRequired { .. } => StatusCode::FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Image(ImageProcessingError::IoError(_))
            | AppError::Image(ImageProcessingError::ProcessingError(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::Image(_) => StatusCode::BAD_REQUEST,
            AppError::Database(_)
            | AppError::Token(_)
            | AppError::Email(_)
            | AppError::Render(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();

        if let AppError::LoginRequired { next } = self {
            let location = format!("/login?next={}", urlencoding::encode(next));
            let notice = FlashMessage::info(self.public_message());
            return HttpResponse::Found()
                .insert_header((header::LOCATION, location))
                .cookie(flash::flash_cookie(&[notice]))
                .finish();
        }

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        HttpResponse::build(status)
            .content_type("text/html; charset=utf-8")
            .body(format!(
                "<!DOCTYPE html>\n<html><head><title>{code}</title></head>\
                 <body><h1>{code}</h1><p>{message}</p></body></html>\n",
                code = status,
                message = crate::services::render::escape_html(&self.public_message()),
            ))
    }
}

impl From<lettre::error::Error> for AppError {
    fn from(error: lettre::error::Error) -> Self {
        AppError::Email(error.to_string())
    }
}

impl From<lettre::transport::smtp::Error> for AppError {
    fn from(error: lettre::transport::smtp::Error) -> Self {
        AppError::Email(error.to_string())
    }
}

impl From<actix_multipart::MultipartError> for AppError {
    fn from(error: actix_multipart::MultipartError) -> Self {
        AppError::BadRequest(format!("Malformed form submission: {}", error))
    }
}
