use crate::models::{Comment, CommentWithAuthor};
use sqlx::{Sqlite, SqlitePool, Transaction};

/// Create a comment on an existing post.
///
/// The foreign key rejects comments on posts that do not exist.
pub async fn create_comment(
    pool: &SqlitePool,
    user_id: i64,
    post_id: i64,
    content: &str,
) -> Result<Comment, sqlx::Error> {
    sqlx::query_as::<_, Comment>(
        r#"
        INSERT INTO comments (content, user_id, post_id)
        VALUES (?, ?, ?)
        RETURNING id, content, user_id, post_id
        "#,
    )
    .bind(content)
    .bind(user_id)
    .bind(post_id)
    .fetch_one(pool)
    .await
}

/// Comments on a post in the order they were written
pub async fn find_comments_by_post(
    pool: &SqlitePool,
    post_id: i64,
) -> Result<Vec<CommentWithAuthor>, sqlx::Error> {
    sqlx::query_as::<_, CommentWithAuthor>(
        r#"
        SELECT c.id, c.content, c.user_id, c.post_id,
               u.username AS author_username, u.image_file AS author_image
        FROM comments c
        JOIN users u ON u.id = c.user_id
        WHERE c.post_id = ?
        ORDER BY c.id ASC
        "#,
    )
    .bind(post_id)
    .fetch_all(pool)
    .await
}

/// Delete every comment on a post as part of a larger transaction
pub async fn delete_by_post(
    tx: &mut Transaction<'_, Sqlite>,
    post_id: i64,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM comments WHERE post_id = ?")
        .bind(post_id)
        .execute(&mut **tx)
        .await?;

    Ok(result.rows_affected())
}

pub async fn count_by_post(pool: &SqlitePool, post_id: i64) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE post_id = ?")
        .bind(post_id)
        .fetch_one(pool)
        .await
}
