/// Post repository - handles all database operations for posts
use crate::db::comment_repo;
use crate::models::{Page, Post, PostWithAuthor};
use chrono::Utc;
use sqlx::SqlitePool;

const POST_WITH_AUTHOR: &str = r#"
    SELECT p.id, p.title, p.created_at, p.content, p.user_id,
           u.username AS author_username, u.image_file AS author_image
    FROM posts p
    JOIN users u ON u.id = p.user_id
"#;

/// Create a new post owned by `user_id`
pub async fn create_post(
    pool: &SqlitePool,
    user_id: i64,
    title: &str,
    content: &str,
) -> Result<Post, sqlx::Error> {
    sqlx::query_as::<_, Post>(
        r#"
        INSERT INTO posts (title, created_at, content, user_id)
        VALUES (?, ?, ?, ?)
        RETURNING id, title, created_at, content, user_id
        "#,
    )
    .bind(title)
    .bind(Utc::now())
    .bind(content)
    .bind(user_id)
    .fetch_one(pool)
    .await
}

/// Find post by ID
pub async fn find_by_id(pool: &SqlitePool, post_id: i64) -> Result<Option<Post>, sqlx::Error> {
    sqlx::query_as::<_, Post>(
        "SELECT id, title, created_at, content, user_id FROM posts WHERE id = ?",
    )
    .bind(post_id)
    .fetch_optional(pool)
    .await
}

/// Find post by ID together with its author's name and picture
pub async fn find_with_author(
    pool: &SqlitePool,
    post_id: i64,
) -> Result<Option<PostWithAuthor>, sqlx::Error> {
    sqlx::query_as::<_, PostWithAuthor>(&format!("{POST_WITH_AUTHOR} WHERE p.id = ?"))
        .bind(post_id)
        .fetch_optional(pool)
        .await
}

/// Rows to skip; saturates so absurd page numbers just land past the end
fn offset(page: i64, per_page: i64) -> i64 {
    (page.max(1) - 1).saturating_mul(per_page)
}

/// List all posts, newest first
pub async fn list_posts(
    pool: &SqlitePool,
    page: i64,
    per_page: i64,
) -> Result<Page<PostWithAuthor>, sqlx::Error> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts")
        .fetch_one(pool)
        .await?;

    let items = sqlx::query_as::<_, PostWithAuthor>(&format!(
        "{POST_WITH_AUTHOR} ORDER BY p.id DESC LIMIT ? OFFSET ?"
    ))
    .bind(per_page)
    .bind(offset(page, per_page))
    .fetch_all(pool)
    .await?;

    Ok(Page::new(items, page, per_page, total))
}

/// List posts written by one user, newest first
pub async fn find_posts_by_user(
    pool: &SqlitePool,
    user_id: i64,
    page: i64,
    per_page: i64,
) -> Result<Page<PostWithAuthor>, sqlx::Error> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts WHERE user_id = ?")
        .bind(user_id)
        .fetch_one(pool)
        .await?;

    let items = sqlx::query_as::<_, PostWithAuthor>(&format!(
        "{POST_WITH_AUTHOR} WHERE p.user_id = ? ORDER BY p.id DESC LIMIT ? OFFSET ?"
    ))
    .bind(user_id)
    .bind(per_page)
    .bind(offset(page, per_page))
    .fetch_all(pool)
    .await?;

    Ok(Page::new(items, page, per_page, total))
}

/// Update title and content. The owner and creation time never change.
pub async fn update_post(
    pool: &SqlitePool,
    post_id: i64,
    title: &str,
    content: &str,
) -> Result<Option<Post>, sqlx::Error> {
    sqlx::query_as::<_, Post>(
        r#"
        UPDATE posts
        SET title = ?, content = ?
        WHERE id = ?
        RETURNING id, title, created_at, content, user_id
        "#,
    )
    .bind(title)
    .bind(content)
    .bind(post_id)
    .fetch_optional(pool)
    .await
}

/// Delete a post and its comments in one transaction.
///
/// Returns `false` when the post did not exist.
pub async fn delete_post_cascade(pool: &SqlitePool, post_id: i64) -> Result<bool, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let comments_deleted = comment_repo::delete_by_post(&mut tx, post_id).await?;

    let result = sqlx::query("DELETE FROM posts WHERE id = ?")
        .bind(post_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    tracing::debug!(post_id, comments_deleted, "post deleted");

    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{comment_repo, test_pool, user_repo};

    #[test]
    fn test_offset_saturates() {
        assert_eq!(offset(1, 3), 0);
        assert_eq!(offset(0, 3), 0);
        assert_eq!(offset(3, 3), 6);
        assert_eq!(offset(i64::MAX, 3), i64::MAX);
    }

    #[tokio::test]
    async fn test_list_posts_newest_first() {
        let pool = test_pool().await;
        let user = user_repo::create_user(&pool, "alice", "alice@x.com", "hash")
            .await
            .unwrap();

        for i in 1..=4 {
            create_post(&pool, user.id, &format!("Post {}", i), "body")
                .await
                .unwrap();
        }

        let first = list_posts(&pool, 1, 3).await.unwrap();
        assert_eq!(first.total, 4);
        assert_eq!(first.pages(), 2);
        let titles: Vec<_> = first.items.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["Post 4", "Post 3", "Post 2"]);
        assert_eq!(first.items[0].author_username, "alice");

        let second = list_posts(&pool, 2, 3).await.unwrap();
        assert_eq!(second.items.len(), 1);
        assert_eq!(second.items[0].title, "Post 1");

        let beyond = list_posts(&pool, 3, 3).await.unwrap();
        assert!(beyond.is_out_of_range());
    }

    #[tokio::test]
    async fn test_posts_by_user_filters_owner() {
        let pool = test_pool().await;
        let alice = user_repo::create_user(&pool, "alice", "alice@x.com", "hash")
            .await
            .unwrap();
        let bob = user_repo::create_user(&pool, "bob", "bob@x.com", "hash")
            .await
            .unwrap();

        create_post(&pool, alice.id, "A", "a").await.unwrap();
        create_post(&pool, bob.id, "B", "b").await.unwrap();

        let page = find_posts_by_user(&pool, bob.id, 1, 3).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].title, "B");
    }

    #[tokio::test]
    async fn test_update_keeps_owner_and_timestamp() {
        let pool = test_pool().await;
        let alice = user_repo::create_user(&pool, "alice", "alice@x.com", "hash")
            .await
            .unwrap();
        let post = create_post(&pool, alice.id, "Old", "old").await.unwrap();

        let updated = update_post(&pool, post.id, "New", "new").await.unwrap().unwrap();
        assert_eq!(updated.title, "New");
        assert_eq!(updated.user_id, alice.id);
        assert_eq!(updated.created_at, post.created_at);

        assert!(update_post(&pool, post.id + 1, "x", "y").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_owner_change_rejected_by_storage() {
        let pool = test_pool().await;
        let alice = user_repo::create_user(&pool, "alice", "alice@x.com", "hash")
            .await
            .unwrap();
        let bob = user_repo::create_user(&pool, "bob", "bob@x.com", "hash")
            .await
            .unwrap();
        let post = create_post(&pool, alice.id, "Mine", "body").await.unwrap();

        let result = sqlx::query("UPDATE posts SET user_id = ? WHERE id = ?")
            .bind(bob.id)
            .bind(post.id)
            .execute(&pool)
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_delete_cascades_comments() {
        let pool = test_pool().await;
        let alice = user_repo::create_user(&pool, "alice", "alice@x.com", "hash")
            .await
            .unwrap();
        let post = create_post(&pool, alice.id, "Title", "body").await.unwrap();
        comment_repo::create_comment(&pool, alice.id, post.id, "one").await.unwrap();
        comment_repo::create_comment(&pool, alice.id, post.id, "two").await.unwrap();

        assert!(delete_post_cascade(&pool, post.id).await.unwrap());
        assert!(find_by_id(&pool, post.id).await.unwrap().is_none());
        assert_eq!(comment_repo::count_by_post(&pool, post.id).await.unwrap(), 0);

        assert!(!delete_post_cascade(&pool, post.id).await.unwrap());
    }
}
