use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pgsql_libs::DbPool;
use sqlx::{query, query_as, types::Json, FromRow};
use uuid::Uuid;

use crate::error::StoreError;

use super::model::{
    Comment, NewComment, NewPost, Post, Reaction, ReactionCounts, ReactionOutcome,
};

/// Persistence seam for the post aggregate. Comments live inside their post,
/// so removing a post removes its comments in the same write.
#[async_trait]
pub trait PostStore: Send + Sync {
    async fn ping(&self) -> Result<(), StoreError>;

    /// All posts, newest `created_at` first.
    async fn list_posts(&self) -> Result<Vec<Post>, StoreError>;

    async fn create_post(&self, new_post: NewPost) -> Result<Post, StoreError>;

    async fn find_post(&self, post_id: Uuid) -> Result<Option<Post>, StoreError>;

    /// Replaces `content` when `owner` still owns the post.
    async fn update_content(
        &self,
        post_id: Uuid,
        owner: Uuid,
        content: String,
    ) -> Result<Option<Post>, StoreError>;

    /// Deletes the post when `owner` still owns it. Returns whether a row went away.
    async fn delete_post(&self, post_id: Uuid, owner: Uuid) -> Result<bool, StoreError>;

    /// Appends `user_id` to the reaction set and bumps its counter in one
    /// atomic step, unless the user is already in the set.
    async fn add_reaction(
        &self,
        post_id: Uuid,
        user_id: Uuid,
        reaction: Reaction,
    ) -> Result<ReactionOutcome, StoreError>;

    async fn push_comment(
        &self,
        post_id: Uuid,
        new_comment: NewComment,
    ) -> Result<Option<Comment>, StoreError>;

    async fn edit_comment(
        &self,
        post_id: Uuid,
        comment_id: Uuid,
        text: String,
    ) -> Result<Option<Comment>, StoreError>;

    async fn remove_comment(&self, post_id: Uuid, comment_id: Uuid) -> Result<bool, StoreError>;
}

const POST_COLUMNS: &str = "id, content, image_url, likes, dislikes, liked_by, disliked_by, \
                            comments, created_by, created_at, updated_at";

#[derive(FromRow)]
struct PostRow {
    id: Uuid,
    content: Option<String>,
    image_url: Option<String>,
    likes: i64,
    dislikes: i64,
    liked_by: Vec<Uuid>,
    disliked_by: Vec<Uuid>,
    comments: Json<Vec<Comment>>,
    created_by: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        Post {
            id: row.id,
            content: row.content,
            image_url: row.image_url,
            likes: row.likes,
            dislikes: row.dislikes,
            liked_by: row.liked_by,
            disliked_by: row.disliked_by,
            comments: row.comments.0,
            created_by: row.created_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(FromRow)]
struct CountsRow {
    likes: i64,
    dislikes: i64,
}

#[derive(FromRow)]
struct CommentsRow {
    comments: Json<Vec<Comment>>,
}

pub struct PgPostStore {
    db_pool: DbPool,
}

impl PgPostStore {
    pub fn new(db_pool: DbPool) -> Self {
        Self { db_pool }
    }

    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations").run(&self.db_pool).await?;
        Ok(())
    }

    fn reaction_statement(reaction: Reaction) -> String {
        let (counter, set) = match reaction {
            Reaction::Like => ("likes", "liked_by"),
            Reaction::Dislike => ("dislikes", "disliked_by"),
        };

        format!(
            r#"
            UPDATE posts
            SET {counter} = {counter} + 1,
                {set} = array_append({set}, $2),
                updated_at = clock_timestamp()
            WHERE id = $1 AND NOT ($2 = ANY({set}))
            RETURNING likes, dislikes
            "#
        )
    }
}

#[async_trait]
impl PostStore for PgPostStore {
    async fn ping(&self) -> Result<(), StoreError> {
        query("SELECT 1;").execute(&self.db_pool).await?;
        Ok(())
    }

    async fn list_posts(&self) -> Result<Vec<Post>, StoreError> {
        let statement = format!("SELECT {POST_COLUMNS} FROM posts ORDER BY created_at DESC");
        let rows: Vec<PostRow> = query_as(&statement).fetch_all(&self.db_pool).await?;
        Ok(rows.into_iter().map(Post::from).collect())
    }

    async fn create_post(&self, new_post: NewPost) -> Result<Post, StoreError> {
        let statement = format!(
            r#"
            INSERT INTO posts (id, content, image_url, created_by)
            VALUES ($1, $2, $3, $4)
            RETURNING {POST_COLUMNS}
            "#
        );

        let row: PostRow = query_as(&statement)
            .bind(Uuid::new_v4())
            .bind(new_post.content)
            .bind(new_post.image_url)
            .bind(new_post.created_by)
            .fetch_one(&self.db_pool)
            .await?;
        Ok(row.into())
    }

    async fn find_post(&self, post_id: Uuid) -> Result<Option<Post>, StoreError> {
        let statement = format!("SELECT {POST_COLUMNS} FROM posts WHERE id = $1");
        let row: Option<PostRow> = query_as(&statement)
            .bind(post_id)
            .fetch_optional(&self.db_pool)
            .await?;
        Ok(row.map(Post::from))
    }

    async fn update_content(
        &self,
        post_id: Uuid,
        owner: Uuid,
        content: String,
    ) -> Result<Option<Post>, StoreError> {
        let statement = format!(
            r#"
            UPDATE posts
            SET content = $3, updated_at = clock_timestamp()
            WHERE id = $1 AND created_by = $2
            RETURNING {POST_COLUMNS}
            "#
        );

        let row: Option<PostRow> = query_as(&statement)
            .bind(post_id)
            .bind(owner)
            .bind(content)
            .fetch_optional(&self.db_pool)
            .await?;
        Ok(row.map(Post::from))
    }

    async fn delete_post(&self, post_id: Uuid, owner: Uuid) -> Result<bool, StoreError> {
        let result = query("DELETE FROM posts WHERE id = $1 AND created_by = $2")
            .bind(post_id)
            .bind(owner)
            .execute(&self.db_pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn add_reaction(
        &self,
        post_id: Uuid,
        user_id: Uuid,
        reaction: Reaction,
    ) -> Result<ReactionOutcome, StoreError> {
        let statement = Self::reaction_statement(reaction);
        let applied: Option<CountsRow> = query_as(&statement)
            .bind(post_id)
            .bind(user_id)
            .fetch_optional(&self.db_pool)
            .await?;

        if let Some(row) = applied {
            return Ok(ReactionOutcome::Applied(ReactionCounts {
                likes: row.likes,
                dislikes: row.dislikes,
            }));
        }

        let exists = query("SELECT 1 FROM posts WHERE id = $1")
            .bind(post_id)
            .fetch_optional(&self.db_pool)
            .await?
            .is_some();

        Ok(if exists {
            ReactionOutcome::AlreadyDone
        } else {
            ReactionOutcome::NotFound
        })
    }

    async fn push_comment(
        &self,
        post_id: Uuid,
        new_comment: NewComment,
    ) -> Result<Option<Comment>, StoreError> {
        let comment = Comment::new(new_comment, Utc::now());

        let result = query(
            r#"
            UPDATE posts
            SET comments = comments || $2, updated_at = clock_timestamp()
            WHERE id = $1
            "#,
        )
        .bind(post_id)
        .bind(Json(vec![comment.clone()]))
        .execute(&self.db_pool)
        .await?;

        Ok((result.rows_affected() > 0).then_some(comment))
    }

    async fn edit_comment(
        &self,
        post_id: Uuid,
        comment_id: Uuid,
        text: String,
    ) -> Result<Option<Comment>, StoreError> {
        let mut tx = self.db_pool.begin().await?;

        let row: Option<CommentsRow> =
            query_as("SELECT comments FROM posts WHERE id = $1 FOR UPDATE")
                .bind(post_id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some(CommentsRow { comments: Json(mut comments) }) = row else {
            return Ok(None);
        };

        let Some(comment) = comments.iter_mut().find(|comment| comment.id == comment_id) else {
            return Ok(None);
        };
        comment.text = text;
        comment.updated_at = Utc::now();
        let edited = comment.clone();

        query("UPDATE posts SET comments = $2, updated_at = clock_timestamp() WHERE id = $1")
            .bind(post_id)
            .bind(Json(comments))
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(Some(edited))
    }

    async fn remove_comment(&self, post_id: Uuid, comment_id: Uuid) -> Result<bool, StoreError> {
        let mut tx = self.db_pool.begin().await?;

        let row: Option<CommentsRow> =
            query_as("SELECT comments FROM posts WHERE id = $1 FOR UPDATE")
                .bind(post_id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some(CommentsRow { comments: Json(mut comments) }) = row else {
            return Ok(false);
        };

        let before = comments.len();
        comments.retain(|comment| comment.id != comment_id);
        if comments.len() == before {
            return Ok(false);
        }

        query("UPDATE posts SET comments = $2, updated_at = clock_timestamp() WHERE id = $1")
            .bind(post_id)
            .bind(Json(comments))
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(true)
    }
}
