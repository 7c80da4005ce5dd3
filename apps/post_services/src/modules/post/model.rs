use std::borrow::Cow;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub text: String,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub content: Option<String>,
    pub image_url: Option<String>,
    pub likes: i64,
    pub dislikes: i64,
    pub liked_by: Vec<Uuid>,
    pub disliked_by: Vec<Uuid>,
    pub comments: Vec<Comment>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reaction {
    Like,
    Dislike,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionCounts {
    pub likes: i64,
    pub dislikes: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionOutcome {
    Applied(ReactionCounts),
    AlreadyDone,
    NotFound,
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub content: String,
    pub image_url: Option<String>,
    pub created_by: Uuid,
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub text: String,
    pub created_by: Uuid,
}

impl Comment {
    pub fn new(new_comment: NewComment, now: DateTime<Utc>) -> Self {
        Comment {
            id: Uuid::new_v4(),
            text: new_comment.text,
            created_by: new_comment.created_by,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Post {
    pub fn new(new_post: NewPost, now: DateTime<Utc>) -> Self {
        Post {
            id: Uuid::new_v4(),
            content: Some(new_post.content),
            image_url: new_post.image_url,
            likes: 0,
            dislikes: 0,
            liked_by: Vec::new(),
            disliked_by: Vec::new(),
            comments: Vec::new(),
            created_by: new_post.created_by,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.created_by == user_id
    }

    pub fn counts(&self) -> ReactionCounts {
        ReactionCounts {
            likes: self.likes,
            dislikes: self.dislikes,
        }
    }

    pub fn has_reacted(&self, user_id: Uuid, reaction: Reaction) -> bool {
        match reaction {
            Reaction::Like => self.liked_by.contains(&user_id),
            Reaction::Dislike => self.disliked_by.contains(&user_id),
        }
    }

    /// Records `reaction` for `user_id` unless already present. The counter
    /// and its set always move together.
    pub fn apply_reaction(
        &mut self,
        user_id: Uuid,
        reaction: Reaction,
        now: DateTime<Utc>,
    ) -> Option<ReactionCounts> {
        if self.has_reacted(user_id, reaction) {
            return None;
        }

        match reaction {
            Reaction::Like => {
                self.likes += 1;
                self.liked_by.push(user_id);
            }
            Reaction::Dislike => {
                self.dislikes += 1;
                self.disliked_by.push(user_id);
            }
        }
        self.updated_at = now;
        Some(self.counts())
    }

    pub fn comment(&self, comment_id: Uuid) -> Option<&Comment> {
        self.comments.iter().find(|comment| comment.id == comment_id)
    }

    pub fn edit_comment(
        &mut self,
        comment_id: Uuid,
        text: String,
        now: DateTime<Utc>,
    ) -> Option<Comment> {
        let comment = self
            .comments
            .iter_mut()
            .find(|comment| comment.id == comment_id)?;
        comment.text = text;
        comment.updated_at = now;
        let edited = comment.clone();
        self.updated_at = now;
        Some(edited)
    }

    pub fn remove_comment(&mut self, comment_id: Uuid, now: DateTime<Utc>) -> Option<Comment> {
        let index = self
            .comments
            .iter()
            .position(|comment| comment.id == comment_id)?;
        self.updated_at = now;
        Some(self.comments.remove(index))
    }
}

impl Reaction {
    pub fn label(self) -> &'static str {
        match self {
            Reaction::Like => "like",
            Reaction::Dislike => "dislike",
        }
    }
}

fn validate_not_blank(text: &str) -> Result<(), ValidationError> {
    if text.trim().is_empty() {
        return Err(ValidationError::new("blank").with_message(Cow::Borrowed("Comment text is required")));
    }
    Ok(())
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct CommentRequest {
    #[serde(default)]
    #[validate(
        required(message = "Comment text is required"),
        custom(function = "validate_not_blank")
    )]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePostRequest {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PostMessageResponse {
    pub message: String,
    pub post: Post,
}

#[derive(Debug, Serialize)]
pub struct CommentMessageResponse {
    pub message: String,
    pub comment: Comment,
}
