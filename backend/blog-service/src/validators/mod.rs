/// Form definitions and validation for blog-service
///
/// Field rules come from `validator` derives. Checks that need the database
/// (uniqueness, account lookup) run afterwards and only for fields that
/// passed their own rules. Every check reports into `FieldErrors`, a map of
/// field name to messages shown next to the re-rendered form.
use crate::db::user_repo;
use crate::error::Result;
use crate::services::image_processing::{picture_extension, ALLOWED_EXTENSIONS};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::collections::BTreeMap;
use validator::{Validate, ValidationErrors};

pub const REQUIRED: &str = "This field is required.";
pub const USERNAME_TAKEN: &str = "Username already exists. Please choose a different one";
pub const EMAIL_TAKEN: &str = "E-mail already exists. Please choose a different one";
pub const NO_ACCOUNT_FOR_EMAIL: &str = "No account with that email";

/// Outcome of validating a submitted form
pub type Validation = std::result::Result<(), FieldErrors>;

/// Field name to error messages
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn get(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn into_result(self) -> Validation {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl From<ValidationErrors> for FieldErrors {
    fn from(errors: ValidationErrors) -> Self {
        let mut out = FieldErrors::new();
        for (field, field_errors) in errors.field_errors() {
            for error in field_errors.iter() {
                let message = error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid value ({})", error.code));
                out.add(&field.to_string(), message);
            }
        }
        out
    }
}

/// Run the derived field rules of `form`
pub fn field_errors<T: Validate>(form: &T) -> FieldErrors {
    form.validate().map(|_| FieldErrors::new()).unwrap_or_else(FieldErrors::from)
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
#[serde(default)]
pub struct RegistrationForm {
    #[validate(length(min = 2, max = 20, message = "Field must be between 2 and 20 characters long."))]
    pub username: String,

    #[validate(
        email(message = "Invalid email address."),
        length(max = 100, message = "Field cannot be longer than 100 characters.")
    )]
    pub email: String,

    #[serde(skip_serializing)]
    #[validate(length(min = 1, message = "This field is required."))]
    pub password: String,

    #[serde(skip_serializing, alias = "confirmPassword")]
    #[validate(
        length(min = 1, message = "This field is required."),
        must_match(other = "password", message = "Field must be equal to password.")
    )]
    pub confirm_password: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
#[serde(default)]
pub struct LoginForm {
    #[validate(length(min = 2, max = 20, message = "Field must be between 2 and 20 characters long."))]
    pub username: String,

    #[serde(skip_serializing)]
    #[validate(length(min = 1, message = "This field is required."))]
    pub password: String,

    /// Checkbox; present when ticked
    pub remember: Option<String>,
}

impl RegistrationForm {
    /// Trim identity fields so validation sees what gets stored
    pub fn normalize(&mut self) {
        self.username = self.username.trim().to_string();
        self.email = self.email.trim().to_lowercase();
    }
}

impl LoginForm {
    pub fn remember(&self) -> bool {
        matches!(
            self.remember.as_deref(),
            Some(v) if !v.is_empty() && v != "false" && v != "0"
        )
    }
}

/// An uploaded file as received from the browser
#[derive(Debug, Clone)]
pub struct UploadedPicture {
    pub filename: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Default, Serialize, Validate)]
pub struct AccountForm {
    #[validate(length(min = 2, max = 20, message = "Field must be between 2 and 20 characters long."))]
    pub username: String,

    #[validate(
        email(message = "Invalid email address."),
        length(max = 100, message = "Field cannot be longer than 100 characters.")
    )]
    pub email: String,

    #[serde(skip)]
    pub picture: Option<UploadedPicture>,
}

impl AccountForm {
    pub fn normalize(&mut self) {
        self.username = self.username.trim().to_string();
        self.email = self.email.trim().to_lowercase();
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
#[serde(default)]
pub struct PostForm {
    #[validate(length(min = 1, max = 100, message = "Title must be between 1 and 100 characters long."))]
    pub title: String,

    #[validate(length(min = 1, message = "This field is required."))]
    pub content: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
#[serde(default)]
pub struct CommentForm {
    #[validate(length(min = 1, message = "This field is required."))]
    pub comment: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
#[serde(default)]
pub struct RequestResetForm {
    #[validate(
        email(message = "Invalid email address."),
        length(max = 100, message = "Field cannot be longer than 100 characters.")
    )]
    pub email: String,
}

impl RequestResetForm {
    pub fn normalize(&mut self) {
        self.email = self.email.trim().to_lowercase();
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
#[serde(default)]
pub struct ResetPasswordForm {
    #[serde(skip_serializing)]
    #[validate(length(min = 1, message = "This field is required."))]
    pub password: String,

    #[serde(skip_serializing, alias = "confirmPassword")]
    #[validate(
        length(min = 1, message = "This field is required."),
        must_match(other = "password", message = "Field must be equal to password.")
    )]
    pub confirm_password: String,
}

/// Field rules plus username/email uniqueness
pub async fn validate_registration(pool: &SqlitePool, form: &RegistrationForm) -> Result<Validation> {
    let mut errors = field_errors(form);

    if !errors.has("username") && user_repo::find_by_username(pool, &form.username).await?.is_some() {
        errors.add("username", USERNAME_TAKEN);
    }
    if !errors.has("email") && user_repo::find_by_email(pool, &form.email).await?.is_some() {
        errors.add("email", EMAIL_TAKEN);
    }

    Ok(errors.into_result())
}

/// Field rules, picture type and uniqueness against every other user
pub async fn validate_account_update(
    pool: &SqlitePool,
    user_id: i64,
    form: &AccountForm,
) -> Result<Validation> {
    let mut errors = field_errors(form);

    if let Some(picture) = &form.picture {
        if picture_extension(&picture.filename).is_none() {
            errors.add(
                "picture",
                format!(
                    "File does not have an approved extension: {}",
                    ALLOWED_EXTENSIONS.join(", ")
                ),
            );
        }
    }

    if !errors.has("username")
        && user_repo::find_by_username_excluding(pool, &form.username, user_id)
            .await?
            .is_some()
    {
        errors.add("username", USERNAME_TAKEN);
    }
    if !errors.has("email")
        && user_repo::find_by_email_excluding(pool, &form.email, user_id)
            .await?
            .is_some()
    {
        errors.add("email", EMAIL_TAKEN);
    }

    Ok(errors.into_result())
}

/// Field rules plus an existing account for the email
pub async fn validate_reset_request(pool: &SqlitePool, form: &RequestResetForm) -> Result<Validation> {
    let mut errors = field_errors(form);

    if !errors.has("email") && user_repo::find_by_email(pool, &form.email).await?.is_none() {
        errors.add("email", NO_ACCOUNT_FOR_EMAIL);
    }

    Ok(errors.into_result())
}
