/// HTTP middleware and request guards for blog-service
///
/// Cookie-carried sessions, one-shot flash messages and ownership checks for
/// post mutation.
pub mod flash;
pub mod permissions;
pub mod session;

pub use flash::FlashMessage;
pub use permissions::*;
pub use session::{AuthenticatedUser, CurrentUser, SessionManager, SessionMiddleware};
