/// Collaborators reached by the handlers through narrow interfaces:
/// view rendering, outgoing mail and profile picture storage.
pub mod email_service;
pub mod image_processing;
pub mod render;

pub use email_service::{Mailer, SmtpMailer};
pub use image_processing::{save_profile_picture, ImageProcessingError};
pub use render::{HtmlRenderer, Renderer};
