/// User repository - handles all database operations for users
use crate::models::User;
use sqlx::SqlitePool;

const USER_COLUMNS: &str = "id, username, email, image_file, password_hash";

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Create a new user in the database
pub async fn create_user(
    pool: &SqlitePool,
    username: &str,
    email: &str,
    password_hash: &str,
) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        r#"
        INSERT INTO users (username, email, password_hash)
        VALUES (?, ?, ?)
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(username.trim())
    .bind(normalize_email(email))
    .bind(password_hash)
    .fetch_one(pool)
    .await
}

/// Find a user by ID
pub async fn find_by_id(pool: &SqlitePool, id: i64) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Find a user by username
pub async fn find_by_username(pool: &SqlitePool, username: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?"))
        .bind(username.trim())
        .fetch_optional(pool)
        .await
}

/// Find a user by email
pub async fn find_by_email(pool: &SqlitePool, email: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?"))
        .bind(normalize_email(email))
        .fetch_optional(pool)
        .await
}

/// Find another user holding `username`, ignoring the user with `exclude_id`
pub async fn find_by_username_excluding(
    pool: &SqlitePool,
    username: &str,
    exclude_id: i64,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE username = ? AND id <> ?"
    ))
    .bind(username.trim())
    .bind(exclude_id)
    .fetch_optional(pool)
    .await
}

/// Find another user holding `email`, ignoring the user with `exclude_id`
pub async fn find_by_email_excluding(
    pool: &SqlitePool,
    email: &str,
    exclude_id: i64,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE email = ? AND id <> ?"
    ))
    .bind(normalize_email(email))
    .bind(exclude_id)
    .fetch_optional(pool)
    .await
}

/// Update username, email and, when given, the profile picture
pub async fn update_profile(
    pool: &SqlitePool,
    user_id: i64,
    username: &str,
    email: &str,
    image_file: Option<&str>,
) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        r#"
        UPDATE users
        SET username = ?, email = ?, image_file = COALESCE(?, image_file)
        WHERE id = ?
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(username.trim())
    .bind(normalize_email(email))
    .bind(image_file)
    .bind(user_id)
    .fetch_one(pool)
    .await
}

/// Update a user's password
pub async fn update_password(
    pool: &SqlitePool,
    user_id: i64,
    new_password_hash: &str,
) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        r#"
        UPDATE users
        SET password_hash = ?
        WHERE id = ?
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(new_password_hash)
    .bind(user_id)
    .fetch_one(pool)
    .await
}
