use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::StoreError;

use super::{
    model::{Comment, NewComment, NewPost, Post, Reaction, ReactionOutcome},
    query::PostStore,
};

#[derive(Default)]
struct MemoryState {
    /// Insertion order.
    posts: Vec<Post>,
    last_tick: Option<DateTime<Utc>>,
}

impl MemoryState {
    /// Wall clock, nudged forward so two reads never return the same instant.
    fn tick(&mut self) -> DateTime<Utc> {
        let mut now = Utc::now();
        if let Some(last) = self.last_tick {
            if now <= last {
                now = last + Duration::microseconds(1);
            }
        }
        self.last_tick = Some(now);
        now
    }

    fn post_mut(&mut self, post_id: Uuid) -> Option<&mut Post> {
        self.posts.iter_mut().find(|post| post.id == post_id)
    }
}

/// Process-local post store. Every operation runs under one write lock, so
/// reactions and comment edits are atomic per call.
#[derive(Default)]
pub struct MemoryPostStore {
    state: RwLock<MemoryState>,
}

impl MemoryPostStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.posts.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl PostStore for MemoryPostStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn list_posts(&self) -> Result<Vec<Post>, StoreError> {
        let state = self.state.read().await;
        let mut posts: Vec<Post> = state.posts.iter().rev().cloned().collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(posts)
    }

    async fn create_post(&self, new_post: NewPost) -> Result<Post, StoreError> {
        let mut state = self.state.write().await;
        let now = state.tick();
        let post = Post::new(new_post, now);
        state.posts.push(post.clone());
        Ok(post)
    }

    async fn find_post(&self, post_id: Uuid) -> Result<Option<Post>, StoreError> {
        let state = self.state.read().await;
        Ok(state.posts.iter().find(|post| post.id == post_id).cloned())
    }

    async fn update_content(
        &self,
        post_id: Uuid,
        owner: Uuid,
        content: String,
    ) -> Result<Option<Post>, StoreError> {
        let mut state = self.state.write().await;
        let now = state.tick();
        let Some(post) = state.post_mut(post_id).filter(|post| post.is_owned_by(owner)) else {
            return Ok(None);
        };
        post.content = Some(content);
        post.updated_at = now;
        Ok(Some(post.clone()))
    }

    async fn delete_post(&self, post_id: Uuid, owner: Uuid) -> Result<bool, StoreError> {
        let mut state = self.state.write().await;
        let before = state.posts.len();
        state
            .posts
            .retain(|post| !(post.id == post_id && post.is_owned_by(owner)));
        Ok(state.posts.len() < before)
    }

    async fn add_reaction(
        &self,
        post_id: Uuid,
        user_id: Uuid,
        reaction: Reaction,
    ) -> Result<ReactionOutcome, StoreError> {
        let mut state = self.state.write().await;
        let now = state.tick();
        let Some(post) = state.post_mut(post_id) else {
            return Ok(ReactionOutcome::NotFound);
        };

        Ok(match post.apply_reaction(user_id, reaction, now) {
            Some(counts) => ReactionOutcome::Applied(counts),
            None => ReactionOutcome::AlreadyDone,
        })
    }

    async fn push_comment(
        &self,
        post_id: Uuid,
        new_comment: NewComment,
    ) -> Result<Option<Comment>, StoreError> {
        let mut state = self.state.write().await;
        let now = state.tick();
        let Some(post) = state.post_mut(post_id) else {
            return Ok(None);
        };

        let comment = Comment::new(new_comment, now);
        post.comments.push(comment.clone());
        post.updated_at = now;
        Ok(Some(comment))
    }

    async fn edit_comment(
        &self,
        post_id: Uuid,
        comment_id: Uuid,
        text: String,
    ) -> Result<Option<Comment>, StoreError> {
        let mut state = self.state.write().await;
        let now = state.tick();
        Ok(state
            .post_mut(post_id)
            .and_then(|post| post.edit_comment(comment_id, text, now)))
    }

    async fn remove_comment(&self, post_id: Uuid, comment_id: Uuid) -> Result<bool, StoreError> {
        let mut state = self.state.write().await;
        let now = state.tick();
        Ok(state
            .post_mut(post_id)
            .and_then(|post| post.remove_comment(comment_id, now))
            .is_some())
    }
}
