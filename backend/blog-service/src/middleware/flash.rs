/// One-shot flash messages carried between requests in a cookie.
///
/// A handler that redirects stores its messages in the `blog_flash` cookie;
/// the next rendered page shows them and clears the cookie. The value is hex
/// encoded JSON so it survives cookie encoding untouched.
use actix_web::cookie::{Cookie, SameSite};
use actix_web::HttpRequest;
use serde::{Deserialize, Serialize};

pub const FLASH_COOKIE: &str = "blog_flash";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashMessage {
    pub category: String,
    pub message: String,
}

impl FlashMessage {
    pub fn new(category: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new("success", message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new("info", message)
    }

    pub fn danger(message: impl Into<String>) -> Self {
        Self::new("danger", message)
    }
}

fn encode_messages(messages: &[FlashMessage]) -> String {
    match serde_json::to_vec(messages) {
        Ok(json) => hex::encode(json),
        Err(e) => {
            tracing::warn!("Failed to encode flash messages: {}", e);
            String::new()
        }
    }
}

fn decode_messages(value: &str) -> Vec<FlashMessage> {
    hex::decode(value)
        .ok()
        .and_then(|json| serde_json::from_slice(&json).ok())
        .unwrap_or_default()
}

/// Cookie carrying `messages` to the next request
pub fn flash_cookie(messages: &[FlashMessage]) -> Cookie<'static> {
    Cookie::build(FLASH_COOKIE, encode_messages(messages))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .finish()
}

/// Cookie that deletes any pending flash messages
pub fn clear_flash_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::build(FLASH_COOKIE, "").path("/").finish();
    cookie.make_removal();
    cookie
}

/// Messages left for this request by the previous response
pub fn read_flashes(req: &HttpRequest) -> Vec<FlashMessage> {
    req.cookie(FLASH_COOKIE)
        .map(|cookie| decode_messages(cookie.value()))
        .unwrap_or_default()
}
