// Post Store - posts and comments, each owned by its author
//
// Ownership checks happen in the interaction layer; this store only
// performs the mutations.

use std::sync::Arc;
use tracing::info;

use crate::core::{current_time_millis, CommentId, PostId, UserId};
use crate::error::{AppError, AppResult};
use crate::infrastructure::database::{is_foreign_key_violation, SocialDatabase};
use crate::models::{
    Comment, CommentUpdate, NewComment, NewPost, Page, PageWindow, Post, PostUpdate,
};

/// Column list shared with the feed query; expects `posts p` joined to `users u`.
pub(crate) const POST_SELECT: &str = r#"
    SELECT p.id, p.author_id, u.username AS author_username, p.title, p.content,
           p.created_at, p.updated_at,
           (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id) AS comments_count,
           (SELECT COUNT(*) FROM likes l WHERE l.post_id = p.id) AS likes_count
    FROM posts p
    JOIN users u ON u.id = p.author_id
"#;

const COMMENT_SELECT: &str = r#"
    SELECT c.id, c.post_id, c.author_id, u.username AS author_username, c.content,
           c.created_at, c.updated_at
    FROM comments c
    JOIN users u ON u.id = c.author_id
"#;

pub struct PostStore {
    db: Arc<SocialDatabase>,
}

impl PostStore {
    pub fn new(db: Arc<SocialDatabase>) -> Self {
        Self { db }
    }

    pub async fn create_post(&self, author: UserId, new_post: NewPost) -> AppResult<Post> {
        let errors = new_post.validate();
        if !errors.is_empty() {
            return Err(AppError::Validation(errors.join(", ")));
        }

        let id = PostId::new(self.db.next_id());
        let now = current_time_millis();
        sqlx::query(
            "INSERT INTO posts (id, author_id, title, content, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(id)
        .bind(author)
        .bind(&new_post.title)
        .bind(&new_post.content)
        .bind(now)
        .bind(now)
        .execute(&self.db.pool)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                AppError::NotFound(format!("User {} not found", author))
            } else {
                AppError::from(e)
            }
        })?;

        info!(post_id = %id, author = %author, "post created");
        self.get_post(id).await
    }

    pub async fn find_post(&self, id: PostId) -> AppResult<Option<Post>> {
        let sql = format!("{} WHERE p.id = ?", POST_SELECT);
        let post = sqlx::query_as::<_, Post>(&sql)
            .bind(id)
            .fetch_optional(&self.db.pool)
            .await?;
        Ok(post)
    }

    pub async fn get_post(&self, id: PostId) -> AppResult<Post> {
        self.find_post(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Post {} not found", id)))
    }

    /// All posts newest first, optionally filtered by a case-insensitive
    /// substring of title or content.
    pub async fn list_posts(
        &self,
        search: Option<&str>,
        window: PageWindow,
    ) -> AppResult<Page<Post>> {
        let pattern = search
            .map(str::trim)
            .filter(|term| !term.is_empty())
            .map(|term| format!("%{}%", escape_like(term)));

        let filter = "WHERE (? IS NULL OR p.title LIKE ? ESCAPE '\\' OR p.content LIKE ? ESCAPE '\\')";

        let count_sql = format!("SELECT COUNT(*) FROM posts p {}", filter);
        let count: i64 = sqlx::query_scalar(&count_sql)
            .bind(&pattern)
            .bind(&pattern)
            .bind(&pattern)
            .fetch_one(&self.db.pool)
            .await?;

        let sql = format!(
            "{} {} ORDER BY p.created_at DESC, p.id DESC LIMIT ? OFFSET ?",
            POST_SELECT, filter
        );
        let posts = sqlx::query_as::<_, Post>(&sql)
            .bind(&pattern)
            .bind(&pattern)
            .bind(&pattern)
            .bind(window.limit())
            .bind(window.offset())
            .fetch_all(&self.db.pool)
            .await?;

        Ok(window.into_page(count.max(0) as u64, posts))
    }

    pub async fn update_post(&self, id: PostId, update: PostUpdate) -> AppResult<Post> {
        let errors = update.validate();
        if !errors.is_empty() {
            return Err(AppError::Validation(errors.join(", ")));
        }

        let result = sqlx::query(
            r#"
            UPDATE posts
            SET title = COALESCE(?, title),
                content = COALESCE(?, content),
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&update.title)
        .bind(&update.content)
        .bind(current_time_millis())
        .bind(id)
        .execute(&self.db.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Post {} not found", id)));
        }
        info!(post_id = %id, "post updated");
        self.get_post(id).await
    }

    /// Deletes the post together with its likes and comments in one
    /// transaction.
    pub async fn delete_post(&self, id: PostId) -> AppResult<()> {
        let mut tx = self.db.pool.begin().await?;

        let likes = sqlx::query("DELETE FROM likes WHERE post_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        let comments = sqlx::query("DELETE FROM comments WHERE post_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        let deleted = sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if deleted == 0 {
            tx.rollback().await?;
            return Err(AppError::NotFound(format!("Post {} not found", id)));
        }

        tx.commit().await?;
        info!(post_id = %id, likes, comments, "post deleted");
        Ok(())
    }

    pub async fn create_comment(
        &self,
        author: UserId,
        new_comment: NewComment,
    ) -> AppResult<Comment> {
        let errors = new_comment.validate();
        if !errors.is_empty() {
            return Err(AppError::Validation(errors.join(", ")));
        }

        let id = CommentId::new(self.db.next_id());
        let now = current_time_millis();
        sqlx::query(
            "INSERT INTO comments (id, post_id, author_id, content, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(id)
        .bind(new_comment.post)
        .bind(author)
        .bind(&new_comment.content)
        .bind(now)
        .bind(now)
        .execute(&self.db.pool)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                AppError::NotFound(format!("Post {} not found", new_comment.post))
            } else {
                AppError::from(e)
            }
        })?;

        info!(comment_id = %id, post_id = %new_comment.post, author = %author, "comment created");
        self.get_comment(id).await
    }

    pub async fn get_comment(&self, id: CommentId) -> AppResult<Comment> {
        let sql = format!("{} WHERE c.id = ?", COMMENT_SELECT);
        sqlx::query_as::<_, Comment>(&sql)
            .bind(id)
            .fetch_optional(&self.db.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Comment {} not found", id)))
    }

    /// Comments oldest first, optionally limited to one post
    pub async fn list_comments(
        &self,
        post: Option<PostId>,
        window: PageWindow,
    ) -> AppResult<Page<Comment>> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM comments c WHERE (? IS NULL OR c.post_id = ?)",
        )
        .bind(post)
        .bind(post)
        .fetch_one(&self.db.pool)
        .await?;

        let sql = format!(
            "{} WHERE (? IS NULL OR c.post_id = ?) ORDER BY c.created_at ASC, c.id ASC LIMIT ? OFFSET ?",
            COMMENT_SELECT
        );
        let comments = sqlx::query_as::<_, Comment>(&sql)
            .bind(post)
            .bind(post)
            .bind(window.limit())
            .bind(window.offset())
            .fetch_all(&self.db.pool)
            .await?;

        Ok(window.into_page(count.max(0) as u64, comments))
    }

    pub async fn update_comment(&self, id: CommentId, update: CommentUpdate) -> AppResult<Comment> {
        let errors = update.validate();
        if !errors.is_empty() {
            return Err(AppError::Validation(errors.join(", ")));
        }

        let result = sqlx::query("UPDATE comments SET content = ?, updated_at = ? WHERE id = ?")
            .bind(&update.content)
            .bind(current_time_millis())
            .bind(id)
            .execute(&self.db.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Comment {} not found", id)));
        }
        info!(comment_id = %id, "comment updated");
        self.get_comment(id).await
    }

    pub async fn delete_comment(&self, id: CommentId) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM comments WHERE id = ?")
            .bind(id)
            .execute(&self.db.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Comment {} not found", id)));
        }
        info!(comment_id = %id, "comment deleted");
        Ok(())
    }
}

fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::{post_by, register, Fixture};

    fn window(page: u32, page_size: u32) -> PageWindow {
        PageWindow { page, page_size }
    }

    #[tokio::test]
    async fn test_create_and_update_post() {
        let fx = Fixture::new().await;
        let alice = register(&fx, "alice").await;

        let post = post_by(&fx, &alice, "Hello").await;
        assert_eq!(post.author, alice.id);
        assert_eq!(post.author_username, "alice");
        assert_eq!(post.comments_count, 0);

        let updated = fx
            .posts
            .update_post(
                post.id,
                PostUpdate {
                    title: Some("Hello again".to_string()),
                    content: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.title, "Hello again");
        assert_eq!(updated.content, post.content);
        assert!(updated.updated_at >= post.updated_at);
    }

    #[tokio::test]
    async fn test_delete_cascades_comments_and_likes() {
        let fx = Fixture::new().await;
        let alice = register(&fx, "alice").await;
        let bob = register(&fx, "bob").await;
        let post = post_by(&fx, &alice, "Doomed").await;

        let comment = fx
            .posts
            .create_comment(
                bob.id,
                NewComment {
                    post: post.id,
                    content: "nice".to_string(),
                },
            )
            .await
            .unwrap();
        fx.likes.like(bob.id, &post).await.unwrap();
        assert_eq!(fx.posts.get_post(post.id).await.unwrap().likes_count, 1);

        fx.posts.delete_post(post.id).await.unwrap();

        assert!(fx.posts.find_post(post.id).await.unwrap().is_none());
        assert!(matches!(
            fx.posts.get_comment(comment.id).await,
            Err(AppError::NotFound(_))
        ));
        assert_eq!(fx.likes.like_count(post.id).await.unwrap(), 0);
        assert!(matches!(
            fx.posts.delete_post(post.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_list_posts_search_and_paging() {
        let fx = Fixture::new().await;
        let alice = register(&fx, "alice").await;
        for title in ["Rust tips", "Gardening", "More rust", "100% cotton"] {
            post_by(&fx, &alice, title).await;
        }

        let page = fx.posts.list_posts(None, window(1, 3)).await.unwrap();
        assert_eq!(page.count, 4);
        assert!(page.has_next);
        assert_eq!(page.results[0].title, "100% cotton");

        let page = fx.posts.list_posts(Some("RUST"), window(1, 10)).await.unwrap();
        let titles: Vec<&str> = page.results.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["More rust", "Rust tips"]);

        let page = fx.posts.list_posts(Some("%"), window(1, 10)).await.unwrap();
        assert_eq!(page.count, 1);
    }

    #[tokio::test]
    async fn test_comment_on_missing_post() {
        let fx = Fixture::new().await;
        let alice = register(&fx, "alice").await;

        let err = fx
            .posts
            .create_comment(
                alice.id,
                NewComment {
                    post: PostId::new(404),
                    content: "hello?".to_string(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_list_comments_for_post() {
        let fx = Fixture::new().await;
        let alice = register(&fx, "alice").await;
        let first = post_by(&fx, &alice, "one").await;
        let second = post_by(&fx, &alice, "two").await;

        for (post, text) in [(&first, "a"), (&second, "b"), (&first, "c")] {
            fx.posts
                .create_comment(
                    alice.id,
                    NewComment {
                        post: post.id,
                        content: text.to_string(),
                    },
                )
                .await
                .unwrap();
        }

        let page = fx.posts.list_comments(Some(first.id), window(1, 10)).await.unwrap();
        let texts: Vec<&str> = page.results.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(texts, vec!["a", "c"]);
        assert_eq!(fx.posts.list_comments(None, window(1, 10)).await.unwrap().count, 3);
        assert_eq!(fx.posts.get_post(first.id).await.unwrap().comments_count, 2);
    }
}
