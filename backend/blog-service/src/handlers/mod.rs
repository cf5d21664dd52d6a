/// HTTP handlers for blog-service
///
/// - pages: home listing, about, health
/// - auth: register, login, logout
/// - account: profile update and per-user listing
/// - posts / comments: content creation and owner-only mutation
/// - password_reset: emailed reset tokens
pub mod account;
pub mod auth;
pub mod comments;
pub mod pages;
pub mod password_reset;
pub mod posts;

use actix_web::{
    dev::Payload, http::header, FromRequest, HttpRequest, HttpResponse, HttpResponseBuilder,
};
use futures_util::future::{ready, Ready};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::app_state::AppState;
use crate::error::{AppError, Result};
use crate::middleware::flash::{clear_flash_cookie, flash_cookie, read_flashes, FlashMessage};
use crate::middleware::session::current_identity;

/// Per-request view state: who is signed in and which flash messages to show.
///
/// Messages left by the previous response are shown by `render`; messages
/// added during this request travel with `redirect`.
pub struct RequestContext {
    user_id: Option<i64>,
    incoming: Vec<FlashMessage>,
    pending: Vec<FlashMessage>,
}

impl RequestContext {
    pub fn user_id(&self) -> Option<i64> {
        self.user_id
    }

    pub fn is_authenticated(&self) -> bool {
        self.user_id.is_some()
    }

    pub fn flash(&mut self, message: FlashMessage) {
        self.pending.push(message);
    }

    /// Render `view` with the flash messages and signed-in user merged into `context`
    pub fn render(self, state: &AppState, view: &str, context: Value) -> Result<HttpResponse> {
        let has_incoming = !self.incoming.is_empty();
        let messages: Vec<FlashMessage> = self.incoming.into_iter().chain(self.pending).collect();

        let mut context = match context {
            Value::Object(map) => map,
            Value::Null => serde_json::Map::new(),
            other => {
                let mut map = serde_json::Map::new();
                map.insert("content".to_string(), other);
                map
            }
        };
        context.insert("messages".to_string(), json!(messages));
        context.insert("current_user_id".to_string(), json!(self.user_id));

        let html = state.renderer.render(view, &Value::Object(context))?;

        let mut builder = HttpResponse::Ok();
        builder.content_type("text/html; charset=utf-8");
        if has_incoming {
            builder.cookie(clear_flash_cookie());
        }
        Ok(builder.body(html))
    }

    /// 302 to `location` carrying any undisplayed flash messages
    pub fn redirect_builder(self, location: &str) -> HttpResponseBuilder {
        let messages: Vec<FlashMessage> = self.incoming.into_iter().chain(self.pending).collect();

        let mut builder = HttpResponse::Found();
        builder.insert_header((header::LOCATION, location.to_string()));
        if !messages.is_empty() {
            builder.cookie(flash_cookie(&messages));
        }
        builder
    }

    pub fn redirect(self, location: &str) -> HttpResponse {
        self.redirect_builder(location).finish()
    }
}

impl FromRequest for RequestContext {
    type Error = actix_web::Error;
    type Future = Ready<std::result::Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(Ok(RequestContext {
            user_id: current_identity(req),
            incoming: read_flashes(req),
            pending: Vec::new(),
        }))
    }
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

impl PageQuery {
    /// Requested page; unparsable values mean page 1, pages below 1 do not exist
    pub fn page(&self) -> Result<i64> {
        let page = self
            .page
            .as_deref()
            .and_then(|p| p.trim().parse::<i64>().ok())
            .unwrap_or(1);
        if page < 1 {
            return Err(AppError::not_found(format!("page {}", page)));
        }
        Ok(page)
    }
}

/// Absolute base URL for links sent outside the site
pub fn external_base_url(state: &AppState, req: &HttpRequest) -> String {
    match &state.config.app.public_url {
        Some(url) => url.clone(),
        None => {
            let info = req.connection_info();
            format!("{}://{}", info.scheme(), info.host())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(page: Option<&str>) -> PageQuery {
        PageQuery {
            page: page.map(str::to_string),
        }
    }

    #[test]
    fn test_page_query() {
        assert_eq!(query(None).page().unwrap(), 1);
        assert_eq!(query(Some("abc")).page().unwrap(), 1);
        assert_eq!(query(Some("3")).page().unwrap(), 3);
        assert!(matches!(query(Some("0")).page(), Err(AppError::NotFound(_))));
        assert!(matches!(query(Some("-2")).page(), Err(AppError::NotFound(_))));
    }
}
