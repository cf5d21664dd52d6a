/// Cookie session middleware
///
/// The `blog_session` cookie holds a session-purpose token. The middleware
/// verifies it on every request and stores the user id in request
/// extensions, where the `CurrentUser` and `AuthenticatedUser` extractors
/// pick it up.
use actix_web::{
    cookie::{time::Duration, Cookie, SameSite},
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    Error, FromRequest, HttpMessage, HttpRequest,
};
use futures_util::future::{ready, LocalBoxFuture, Ready};
use std::rc::Rc;

use crate::config::SecurityConfig;
use crate::error::AppError;
use crate::security::{TokenPurpose, TokenService};

pub const SESSION_COOKIE: &str = "blog_session";

/// Where users land after login when no usable `next` is given
pub const DEFAULT_LANDING: &str = "/home";

/// Verified user id stored in request extensions
#[derive(Debug, Clone, Copy)]
struct SessionIdentity(i64);

/// Issues and reads session cookies
#[derive(Clone)]
pub struct SessionManager {
    tokens: TokenService,
    session_ttl_secs: i64,
    remember_ttl_secs: i64,
    secure: bool,
}

impl SessionManager {
    pub fn new(tokens: TokenService, security: &SecurityConfig) -> Self {
        Self {
            tokens,
            session_ttl_secs: security.session_ttl_secs,
            remember_ttl_secs: security.remember_ttl_secs,
            secure: security.secure_cookies,
        }
    }

    /// Session cookie for `user_id`.
    ///
    /// With `remember` the cookie persists for the remember TTL; otherwise it
    /// is a browser-session cookie whose token expires after the session TTL.
    pub fn login(&self, user_id: i64, remember: bool) -> crate::error::Result<Cookie<'static>> {
        let ttl = if remember {
            self.remember_ttl_secs
        } else {
            self.session_ttl_secs
        };
        let token = self.tokens.issue(TokenPurpose::Session, user_id, ttl)?;

        let mut builder = Cookie::build(SESSION_COOKIE, token)
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure);
        if remember {
            builder = builder.max_age(Duration::seconds(self.remember_ttl_secs));
        }

        tracing::info!(user_id, remember, "user logged in");
        Ok(builder.finish())
    }

    /// Cookie that ends the session
    pub fn logout(&self) -> Cookie<'static> {
        let mut cookie = Cookie::build(SESSION_COOKIE, "")
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure)
            .finish();
        cookie.make_removal();
        cookie
    }

    /// User id carried by a session cookie value
    pub fn identify(&self, token: &str) -> Option<i64> {
        self.tokens.verify(TokenPurpose::Session, token)
    }
}

/// True for same-site paths such as `/account?x=1`.
///
/// Rejects absolute URLs, scheme-relative `//host`, backslash variants
/// browsers treat as `//`, and control characters (browsers drop TAB/CR/LF
/// from `Location`, so `/\t/host` becomes `//host`).
pub fn is_safe_next(next: &str) -> bool {
    next.starts_with('/')
        && !next.starts_with("//")
        && !next.contains('\\')
        && !next.chars().any(char::is_control)
}

/// Post-login destination
pub fn landing_page(next: Option<&str>) -> String {
    match next {
        Some(next) if is_safe_next(next) => next.to_string(),
        _ => DEFAULT_LANDING.to_string(),
    }
}

/// Session middleware factory
pub struct SessionMiddleware {
    sessions: SessionManager,
}

impl SessionMiddleware {
    pub fn new(sessions: SessionManager) -> Self {
        Self { sessions }
    }
}

impl<S, B> Transform<S, ServiceRequest> for SessionMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = SessionMiddlewareService<S>;
    type Future = std::future::Ready<std::result::Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(SessionMiddlewareService {
            service: Rc::new(service),
            sessions: self.sessions.clone(),
        }))
    }
}

pub struct SessionMiddlewareService<S> {
    service: Rc<S>,
    sessions: SessionManager,
}

impl<S, B> Service<ServiceRequest> for SessionMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, std::result::Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let sessions = self.sessions.clone();

        Box::pin(async move {
            // Copy the cookie out first; the cookie jar borrow must be gone
            // before extensions_mut()
            let token = req.cookie(SESSION_COOKIE).map(|c| c.value().to_string());

            if let Some(token) = token.filter(|t| !t.is_empty()) {
                match sessions.identify(&token) {
                    Some(user_id) => {
                        req.extensions_mut().insert(SessionIdentity(user_id));
                    }
                    None => tracing::debug!("Ignoring invalid session cookie"),
                }
            }

            service.call(req).await
        })
    }
}

/// User id verified by `SessionMiddleware` for this request
pub fn current_identity(req: &HttpRequest) -> Option<i64> {
    req.extensions().get::<SessionIdentity>().map(|id| id.0)
}

/// The signed-in user, if any
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser(pub Option<i64>);

impl CurrentUser {
    pub fn id(&self) -> Option<i64> {
        self.0
    }

    pub fn is_authenticated(&self) -> bool {
        self.0.is_some()
    }
}

impl FromRequest for CurrentUser {
    type Error = Error;
    type Future = Ready<std::result::Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(Ok(CurrentUser(current_identity(req))))
    }
}

/// Signed-in user id; anonymous requests are sent to the login page
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser(pub i64);

impl FromRequest for AuthenticatedUser {
    type Error = AppError;
    type Future = Ready<std::result::Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        match current_identity(req) {
            Some(user_id) => ready(Ok(AuthenticatedUser(user_id))),
            None => {
                let next = req
                    .uri()
                    .path_and_query()
                    .map(|pq| pq.as_str().to_string())
                    .unwrap_or_else(|| req.path().to_string());
                ready(Err(AppError::LoginRequired { next }))
            }
        }
    }
}
