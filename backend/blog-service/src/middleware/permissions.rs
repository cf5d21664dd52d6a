/// Ownership-based permission checks for posts.
///
/// Only the author of a post may change or remove it. Anonymous actors are
/// always denied.
use crate::error::{AppError, Result};
use crate::models::Post;

/// True when `actor` is present and owns the resource
pub fn can_mutate(actor: Option<i64>, owner_id: i64) -> bool {
    actor == Some(owner_id)
}

/// Check if a user owns a post
pub fn check_post_ownership(actor: Option<i64>, post: &Post) -> Result<()> {
    if can_mutate(actor, post.user_id) {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "You don't have permission to modify this post".to_string(),
        ))
    }
}

/// Verify user has access to update a post
pub fn check_post_update(actor: Option<i64>, post: &Post) -> Result<()> {
    check_post_ownership(actor, post)
}

/// Verify user has access to delete a post
pub fn check_post_deletion(actor: Option<i64>, post: &Post) -> Result<()> {
    check_post_ownership(actor, post)
}
